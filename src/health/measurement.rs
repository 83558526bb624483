use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::MonitorError;

/// Patient identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatientId(pub i32);

impl fmt::Display for PatientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for PatientId {
    fn from(id: i32) -> Self {
        PatientId(id)
    }
}

/// What a measurement measures
///
/// Only the first four kinds are read by the detectors. Anything else the
/// producer sends is kept as `Other` so it is stored, not rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MeasurementKind {
    SystolicPressure,
    DiastolicPressure,
    Saturation,
    HeartRateProxy,
    Other(String),
}

impl MeasurementKind {
    /// Lenient label parsing, never fails
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "SystolicPressure" => MeasurementKind::SystolicPressure,
            "DiastolicPressure" => MeasurementKind::DiastolicPressure,
            "Saturation" => MeasurementKind::Saturation,
            // the simulator publishes its heart-rate channel as ECG
            "HeartRateProxy" | "ECG" => MeasurementKind::HeartRateProxy,
            other => MeasurementKind::Other(other.to_string()),
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, MeasurementKind::Other(_))
    }
}

impl fmt::Display for MeasurementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeasurementKind::SystolicPressure => f.write_str("SystolicPressure"),
            MeasurementKind::DiastolicPressure => f.write_str("DiastolicPressure"),
            MeasurementKind::Saturation => f.write_str("Saturation"),
            MeasurementKind::HeartRateProxy => f.write_str("HeartRateProxy"),
            MeasurementKind::Other(label) => f.write_str(label),
        }
    }
}

/// Strict parsing: only the kinds the detectors understand
impl FromStr for MeasurementKind {
    type Err = MonitorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match MeasurementKind::from_label(s) {
            MeasurementKind::Other(label) => Err(MonitorError::UnknownKind(label)),
            kind => Ok(kind),
        }
    }
}

impl From<String> for MeasurementKind {
    fn from(label: String) -> Self {
        MeasurementKind::from_label(&label)
    }
}

impl From<&str> for MeasurementKind {
    fn from(label: &str) -> Self {
        MeasurementKind::from_label(label)
    }
}

impl From<MeasurementKind> for String {
    fn from(kind: MeasurementKind) -> Self {
        kind.to_string()
    }
}

/// A single timestamped reading, immutable once recorded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub patient_id: PatientId,
    pub kind: MeasurementKind,
    pub value: f64,
    pub timestamp_millis: i64,
}

impl Measurement {
    pub fn new(
        patient_id: PatientId,
        kind: MeasurementKind,
        value: f64,
        timestamp_millis: i64,
    ) -> Self {
        Self {
            patient_id,
            kind,
            value,
            timestamp_millis,
        }
    }
}
