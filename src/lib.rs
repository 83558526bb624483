//! Vitals Monitor
//!
//! A time-indexed measurement store and a battery of clinical alert
//! detectors that read it.

pub mod config;
pub mod detect;
pub mod engine;
pub mod error;
pub mod health;
pub mod ingest;

pub use detect::{Detector, DetectorThresholds};
pub use engine::{AlertSink, EvaluationEngine, EvaluationSummary};
pub use error::{MonitorError, Result};
pub use health::{Alert, AlertCondition, Measurement, MeasurementKind, MeasurementStore, PatientId};
