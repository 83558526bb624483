use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use super::measurement::{Measurement, MeasurementKind, PatientId};
use crate::error::{MonitorError, Result};

/// Append-only measurements of one patient
#[derive(Debug, Default)]
struct PatientRecord {
    measurements: RwLock<Vec<Measurement>>,
}

/// In-memory measurement store, shared between producers and evaluators
///
/// The outer map lock is only held long enough to find or create a record;
/// every patient then has its own lock, so ingesting for one patient never
/// blocks evaluation of another.
#[derive(Debug, Default)]
pub struct MeasurementStore {
    patients: RwLock<HashMap<PatientId, Arc<PatientRecord>>>,
}

impl MeasurementStore {
    /// Create new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a measurement, creating the patient record on first sight
    ///
    /// Non-finite values are rejected and leave the store untouched.
    pub fn record(
        &self,
        patient_id: PatientId,
        kind: impl Into<MeasurementKind>,
        value: f64,
        timestamp_millis: i64,
    ) -> Result<()> {
        let kind = kind.into();
        if !value.is_finite() {
            tracing::warn!(
                patient = %patient_id,
                kind = %kind,
                value,
                "dropping non-finite measurement"
            );
            return Err(MonitorError::InvalidMeasurement {
                patient_id,
                kind,
                value,
            });
        }

        let record = self.record_for(patient_id);
        record.measurements.write().push(Measurement::new(
            patient_id,
            kind,
            value,
            timestamp_millis,
        ));
        Ok(())
    }

    /// All measurements of a patient with timestamp in `[start, end]`
    ///
    /// Unknown patients and empty ranges give an empty window.
    pub fn range(&self, patient_id: PatientId, start: i64, end: i64) -> Window {
        if start > end {
            return Window::default();
        }

        // Clone the Arc so the map lock is released before the record is read
        let record = match self.patients.read().get(&patient_id) {
            Some(record) => Arc::clone(record),
            None => return Window::default(),
        };

        let measurements = record
            .measurements
            .read()
            .iter()
            .filter(|m| m.timestamp_millis >= start && m.timestamp_millis <= end)
            .cloned()
            .collect();

        Window { measurements }
    }

    /// Snapshot of patient ids with at least one measurement
    pub fn list_patients(&self) -> BTreeSet<PatientId> {
        self.patients.read().keys().copied().collect()
    }

    /// Number of stored measurements for a patient
    pub fn measurement_count(&self, patient_id: PatientId) -> usize {
        self.patients
            .read()
            .get(&patient_id)
            .map(|record| record.measurements.read().len())
            .unwrap_or_default()
    }

    fn record_for(&self, patient_id: PatientId) -> Arc<PatientRecord> {
        if let Some(record) = self.patients.read().get(&patient_id) {
            return Arc::clone(record);
        }

        let mut patients = self.patients.write();
        let record = patients.entry(patient_id).or_insert_with(|| {
            tracing::debug!(patient = %patient_id, "creating patient record");
            Arc::new(PatientRecord::default())
        });
        Arc::clone(record)
    }
}

/// Read-only snapshot of a patient's measurements over a time range
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Window {
    measurements: Vec<Measurement>,
}

impl Window {
    /// Keep only measurements of one kind
    pub fn of_kind(self, kind: &MeasurementKind) -> Self {
        Self {
            measurements: self
                .measurements
                .into_iter()
                .filter(|m| &m.kind == kind)
                .collect(),
        }
    }

    /// Oldest first; equal timestamps keep insertion order
    pub fn oldest_first(mut self) -> Self {
        self.measurements.sort_by_key(|m| m.timestamp_millis);
        self
    }

    /// Newest first; equal timestamps keep insertion order
    pub fn newest_first(mut self) -> Self {
        self.measurements
            .sort_by_key(|m| std::cmp::Reverse(m.timestamp_millis));
        self
    }

    pub fn len(&self) -> usize {
        self.measurements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.measurements.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Measurement> {
        self.measurements.iter()
    }

    pub fn as_slice(&self) -> &[Measurement] {
        &self.measurements
    }

    pub fn into_vec(self) -> Vec<Measurement> {
        self.measurements
    }
}

impl IntoIterator for Window {
    type Item = Measurement;
    type IntoIter = std::vec::IntoIter<Measurement>;

    fn into_iter(self) -> Self::IntoIter {
        self.measurements.into_iter()
    }
}

impl<'a> IntoIterator for &'a Window {
    type Item = &'a Measurement;
    type IntoIter = std::slice::Iter<'a, Measurement>;

    fn into_iter(self) -> Self::IntoIter {
        self.measurements.iter()
    }
}
