//! Loading producer output from disk

use anyhow::Result;
use std::sync::Arc;
use tempfile::TempDir;
use vitals_monitor::engine::{CollectingSink, EvaluationEngine};
use vitals_monitor::health::{MeasurementKind, MeasurementStore, PatientId};
use vitals_monitor::ingest::{load_path, IngestReport};
use vitals_monitor::DetectorThresholds;

#[test]
fn test_load_single_file() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("output.txt");
    std::fs::write(
        &path,
        "10,-0.34656395320945643,ECG,1714748468033\n\
         10,0.12,ECG,1714748468034\n\
         \n\
         10,not-a-number,ECG,1714748468035\n\
         11,96.0,Saturation,1714748468033\n",
    )?;

    let store = MeasurementStore::new();
    let report = load_path(&path, &store)?;
    assert_eq!(
        report,
        IngestReport {
            files: 1,
            recorded: 3,
            rejected: 1
        }
    );

    let window = store.range(PatientId(10), 1714748468033, 1714748468034);
    assert_eq!(window.len(), 2);
    let first = window.oldest_first().into_vec().remove(0);
    assert_eq!(first.value, -0.34656395320945643);
    assert_eq!(first.kind, MeasurementKind::HeartRateProxy);
    Ok(())
}

#[test]
fn test_invalid_utf8_line_does_not_stop_the_file() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("output.txt");
    let mut content = b"1,97.0,Saturation,1000\n".to_vec();
    content.extend_from_slice(b"1,9\xff7.0,Saturation,2000\n");
    content.extend_from_slice(b"1,96.0,Saturation,3000\n");
    std::fs::write(&path, content)?;

    let store = MeasurementStore::new();
    let report = load_path(&path, &store)?;
    assert_eq!(
        report,
        IngestReport {
            files: 1,
            recorded: 2,
            rejected: 1
        }
    );
    assert_eq!(store.measurement_count(PatientId(1)), 2);
    Ok(())
}

#[test]
fn test_stream_order_lines_feed_detectors() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("stream.txt");
    std::fs::write(
        &path,
        "7,1714748468033,Saturation,90%\n\
         7,1714748469033,Saturation,91%\n",
    )?;

    let store = Arc::new(MeasurementStore::new());
    load_path(&path, &store)?;
    let window = store.range(PatientId(7), 1714748468033, 1714748469033);
    let values: Vec<f64> = window.oldest_first().iter().map(|m| m.value).collect();
    assert_eq!(values, vec![90.0, 91.0]);

    let sink = Arc::new(CollectingSink::new());
    let engine = EvaluationEngine::with_standard_detectors(
        store,
        sink.clone(),
        &DetectorThresholds::default(),
    );
    engine.evaluate(PatientId(7), 1714748469033)?;
    assert!(sink
        .alerts()
        .iter()
        .any(|a| a.condition.to_string() == "Low Saturation Alert"));
    Ok(())
}

#[test]
fn test_load_directory_only_reads_txt() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let nested = temp_dir.path().join("saturation");
    std::fs::create_dir_all(&nested)?;

    std::fs::write(
        temp_dir.path().join("pressure.txt"),
        "Patient ID: 3, Timestamp: 1000, Label: SystolicPressure, Data: 85.0\n",
    )?;
    std::fs::write(
        nested.join("saturation.txt"),
        "Patient ID: 3, Timestamp: 2000, Label: Saturation, Data: 90%\n",
    )?;
    std::fs::write(temp_dir.path().join("notes.md"), "3,1.0,Saturation,5\n")?;

    let store = Arc::new(MeasurementStore::new());
    let report = load_path(temp_dir.path(), &store)?;
    assert_eq!(report.files, 2);
    assert_eq!(report.recorded, 2);
    assert_eq!(store.measurement_count(PatientId(3)), 2);

    // loaded data drives the detectors like live data
    let sink = Arc::new(CollectingSink::new());
    let engine = EvaluationEngine::with_standard_detectors(
        store,
        sink.clone(),
        &DetectorThresholds::default(),
    );
    engine.evaluate(PatientId(3), 2_000)?;
    let conditions: Vec<String> = sink
        .alerts()
        .iter()
        .map(|a| a.condition.to_string())
        .collect();
    assert!(conditions.contains(&"Hypotensive Hypoxemia Alert".to_string()));
    assert!(conditions.contains(&"Low Saturation Alert".to_string()));
    Ok(())
}

#[test]
fn test_missing_path_is_an_error() {
    let store = MeasurementStore::new();
    assert!(load_path(std::path::Path::new("/no/such/vitals"), &store).is_err());
}
