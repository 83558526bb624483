//! Error types
//!
//! One error enum for the library surface. Detector panics are not errors:
//! they are contained by the evaluation engine and only show up in logs.

use thiserror::Error;

use crate::health::{MeasurementKind, PatientId};

/// Library error type
#[derive(Error, Debug)]
pub enum MonitorError {
    /// `evaluate` called without a patient identifier
    #[error("Precondition violated: {0}")]
    PreconditionViolation(String),

    /// Non-finite measurement value, dropped at ingestion
    #[error("Invalid measurement for patient {patient_id} ({kind}): value {value} is not finite")]
    InvalidMeasurement {
        patient_id: PatientId,
        kind: MeasurementKind,
        value: f64,
    },

    /// Ingestion line that could not be parsed
    #[error("Cannot parse line {line:?}: {reason}")]
    Parse { line: String, reason: String },

    /// Label rejected by strict kind parsing
    #[error("Unknown measurement kind: {0}")]
    UnknownKind(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Library result type
pub type Result<T> = std::result::Result<T, MonitorError>;

impl MonitorError {
    pub(crate) fn parse(line: &str, reason: impl Into<String>) -> Self {
        MonitorError::Parse {
            line: line.to_string(),
            reason: reason.into(),
        }
    }
}
