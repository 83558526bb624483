//! Evaluation engine
//!
//! Runs every registered detector for a patient and forwards the alerts to
//! the sink. A detector that panics is logged and skipped; the remaining
//! detectors still run.

pub mod sink;

pub use sink::{AlertSink, CollectingSink, JsonLinesSink, TracingSink};

use parking_lot::RwLock;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use crate::detect::{Detector, DetectorThresholds};
use crate::error::{MonitorError, Result};
use crate::health::{MeasurementStore, PatientId};

/// Outcome of one `evaluate` call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvaluationSummary {
    /// Alerts forwarded to the sink
    pub alerts: usize,
    /// Detectors that panicked and were skipped
    pub faults: usize,
}

impl EvaluationSummary {
    fn merge(&mut self, other: EvaluationSummary) {
        self.alerts += other.alerts;
        self.faults += other.faults;
    }
}

pub struct EvaluationEngine {
    /// Measurement store, read-only from here
    store: Arc<MeasurementStore>,
    /// Receives every alert
    sink: Arc<dyn AlertSink>,
    /// Registered detectors, run in registration order
    detectors: RwLock<Vec<Arc<dyn Detector>>>,
}

impl EvaluationEngine {
    /// Engine with no detectors
    pub fn new(store: Arc<MeasurementStore>, sink: Arc<dyn AlertSink>) -> Self {
        Self {
            store,
            sink,
            detectors: RwLock::new(Vec::new()),
        }
    }

    /// Engine with the four standard detectors
    pub fn with_standard_detectors(
        store: Arc<MeasurementStore>,
        sink: Arc<dyn AlertSink>,
        thresholds: &DetectorThresholds,
    ) -> Self {
        let engine = Self::new(store, sink);
        for detector in thresholds.standard_detectors() {
            engine.register_boxed(detector);
        }
        engine
    }

    pub fn register_detector<D: Detector + 'static>(&self, detector: D) {
        self.register_boxed(Box::new(detector));
    }

    pub fn register_boxed(&self, detector: Box<dyn Detector>) {
        tracing::debug!(detector = detector.name(), "registering detector");
        self.detectors.write().push(Arc::from(detector));
    }

    pub fn detector_names(&self) -> Vec<&'static str> {
        self.detectors.read().iter().map(|d| d.name()).collect()
    }

    pub fn store(&self) -> &Arc<MeasurementStore> {
        &self.store
    }

    /// Evaluate one patient at `now` (epoch millis)
    ///
    /// Fails only when no patient id is given, before any detector runs.
    pub fn evaluate(
        &self,
        patient_id: impl Into<Option<PatientId>>,
        now: i64,
    ) -> Result<EvaluationSummary> {
        let patient_id = patient_id.into().ok_or_else(|| {
            MonitorError::PreconditionViolation("evaluate requires a patient id".to_string())
        })?;

        // Snapshot so registration never waits on a running evaluation
        let detectors: Vec<Arc<dyn Detector>> = self.detectors.read().clone();

        let mut summary = EvaluationSummary::default();
        for detector in detectors {
            let result = catch_unwind(AssertUnwindSafe(|| {
                detector.evaluate(patient_id, &self.store, now)
            }));

            match result {
                Ok(alerts) => {
                    summary.alerts += alerts.len();
                    for alert in alerts {
                        self.sink.accept(alert);
                    }
                }
                Err(payload) => {
                    summary.faults += 1;
                    tracing::error!(
                        detector = detector.name(),
                        patient = %patient_id,
                        "detector failed: {}",
                        panic_message(payload.as_ref())
                    );
                }
            }
        }

        tracing::debug!(
            patient = %patient_id,
            alerts = summary.alerts,
            faults = summary.faults,
            "evaluation finished"
        );
        Ok(summary)
    }

    /// Evaluate every known patient, in ascending id order
    pub fn evaluate_all(&self, now: i64) -> EvaluationSummary {
        let mut total = EvaluationSummary::default();
        for patient_id in self.store.list_patients() {
            if let Ok(summary) = self.evaluate(patient_id, now) {
                total.merge(summary);
            }
        }
        total
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
