//! Ingestion helpers
//!
//! Turns producer output into `MeasurementStore::record` calls. Two line
//! formats are understood:
//!
//! - CSV, file order: `patientId,value,label,timestamp`
//! - CSV, stream order: `patientId,timestamp,label,data` (`data` may end in `%`)
//! - labeled: `Patient ID: 1, Timestamp: 1714748468033, Label: Saturation, Data: 95%`
//!
//! Bad lines are logged and counted, never fatal.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use walkdir::WalkDir;

use crate::error::{MonitorError, Result};
use crate::health::{MeasurementKind, MeasurementStore, PatientId};

/// One parsed producer line
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedMeasurement {
    pub patient_id: PatientId,
    pub kind: MeasurementKind,
    pub value: f64,
    pub timestamp_millis: i64,
}

/// Counters from loading a file or directory
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub files: usize,
    pub recorded: usize,
    pub rejected: usize,
}

/// Parse a single line in either supported format
pub fn parse_line(line: &str) -> Result<ParsedMeasurement> {
    let trimmed = line.trim();
    let parts: Vec<&str> = trimmed.split(',').map(str::trim).collect();
    if parts.len() != 4 {
        return Err(MonitorError::parse(line, "expected 4 comma-separated fields"));
    }

    if parts[0].contains(':') {
        parse_labeled(line, &parts)
    } else {
        parse_csv(line, &parts)
    }
}

fn parse_csv(line: &str, parts: &[&str]) -> Result<ParsedMeasurement> {
    let (value, timestamp) = match (looks_like_epoch(parts[1]), looks_like_epoch(parts[3])) {
        (true, false) => (parts[3], parts[1]),
        (true, true) => {
            return Err(MonitorError::parse(
                line,
                "both value and timestamp look like epoch millis",
            ))
        }
        (false, _) => (parts[1], parts[3]),
    };

    Ok(ParsedMeasurement {
        patient_id: parse_patient(line, parts[0])?,
        value: parse_value(line, value.trim_end_matches('%'))?,
        kind: MeasurementKind::from_label(parts[2]),
        timestamp_millis: parse_timestamp(line, timestamp)?,
    })
}

/// Epoch millis have at least 12 digits for any date after 1973
fn looks_like_epoch(s: &str) -> bool {
    s.len() >= 12 && s.bytes().all(|b| b.is_ascii_digit())
}

fn parse_labeled(line: &str, parts: &[&str]) -> Result<ParsedMeasurement> {
    Ok(ParsedMeasurement {
        patient_id: parse_patient(line, labeled_field(line, parts[0], "Patient ID")?)?,
        timestamp_millis: parse_timestamp(line, labeled_field(line, parts[1], "Timestamp")?)?,
        kind: MeasurementKind::from_label(labeled_field(line, parts[2], "Label")?),
        value: parse_value(
            line,
            labeled_field(line, parts[3], "Data")?.trim_end_matches('%'),
        )?,
    })
}

/// `"Name: value"` -> `"value"`, checking the name
fn labeled_field<'a>(line: &str, part: &'a str, name: &str) -> Result<&'a str> {
    let (key, value) = part
        .split_once(':')
        .ok_or_else(|| MonitorError::parse(line, format!("missing '{name}:'")))?;
    if key.trim() != name {
        return Err(MonitorError::parse(
            line,
            format!("expected field '{name}', found '{}'", key.trim()),
        ));
    }
    Ok(value.trim())
}

fn parse_patient(line: &str, s: &str) -> Result<PatientId> {
    s.parse::<i32>()
        .map(PatientId)
        .map_err(|e| MonitorError::parse(line, format!("bad patient id {s:?}: {e}")))
}

fn parse_value(line: &str, s: &str) -> Result<f64> {
    s.trim()
        .parse::<f64>()
        .map_err(|e| MonitorError::parse(line, format!("bad value {s:?}: {e}")))
}

fn parse_timestamp(line: &str, s: &str) -> Result<i64> {
    s.parse::<i64>()
        .map_err(|e| MonitorError::parse(line, format!("bad timestamp {s:?}: {e}")))
}

/// Parse and record one line
pub fn ingest_line(store: &MeasurementStore, line: &str) -> Result<()> {
    let parsed = parse_line(line)?;
    store.record(
        parsed.patient_id,
        parsed.kind,
        parsed.value,
        parsed.timestamp_millis,
    )
}

/// Load one file, or every `*.txt` file below a directory
pub fn load_path(path: &Path, store: &MeasurementStore) -> Result<IngestReport> {
    let mut report = IngestReport::default();

    if path.is_file() {
        load_file(path, store, &mut report)?;
        return Ok(report);
    }

    if !path.is_dir() {
        return Err(MonitorError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} does not exist", path.display()),
        )));
    }

    let mut files: Vec<_> = WalkDir::new(path)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "txt"))
        .map(|entry| entry.into_path())
        .collect();
    files.sort();

    for file in files {
        if let Err(e) = load_file(&file, store, &mut report) {
            tracing::warn!("failed to read {}: {}", file.display(), e);
        }
    }

    tracing::info!(
        files = report.files,
        recorded = report.recorded,
        rejected = report.rejected,
        "ingestion finished"
    );
    Ok(report)
}

fn load_file(path: &Path, store: &MeasurementStore, report: &mut IngestReport) -> Result<()> {
    let mut reader = BufReader::new(File::open(path)?);
    report.files += 1;

    let mut buf = Vec::new();
    let mut number = 0;
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        number += 1;

        // A corrupt line is rejected on its own, the rest of the file still loads
        let line = match std::str::from_utf8(&buf) {
            Ok(line) => line.trim(),
            Err(e) => {
                report.rejected += 1;
                tracing::warn!("{}:{}: not valid UTF-8: {}", path.display(), number, e);
                continue;
            }
        };
        if line.is_empty() {
            continue;
        }

        match ingest_line(store, line) {
            Ok(()) => report.recorded += 1,
            Err(e) => {
                report.rejected += 1;
                tracing::warn!("{}:{}: {}", path.display(), number, e);
            }
        }
    }
    Ok(())
}
