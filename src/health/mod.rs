//! Health data model and storage
//!
//! Measurements, the per-patient measurement store and alert values.

pub mod alert;
pub mod measurement;
pub mod store;

pub use alert::{Alert, AlertCondition, AlertPriority, PressureKind, TrendDirection};
pub use measurement::{Measurement, MeasurementKind, PatientId};
pub use store::{MeasurementStore, Window};
