//! Alert detectors
//!
//! Every detector is an independent rule family. It reads a window of one
//! patient's measurements and returns the alerts it finds, in the order it
//! found them. Detectors never write to the store and never call each other.

pub mod blood_pressure;
pub mod cardiac;
pub mod compound;
pub mod saturation;

pub use blood_pressure::{BloodPressureDetector, BloodPressureThresholds, PressureBounds};
pub use cardiac::{CardiacRhythmDetector, CardiacThresholds};
pub use compound::{CompoundThresholds, HypotensiveHypoxemiaDetector};
pub use saturation::{SaturationDetector, SaturationThresholds};

use serde::{Deserialize, Serialize};

use crate::health::{Alert, MeasurementStore, PatientId, Window};

pub const MINUTE_MILLIS: i64 = 60_000;
pub const HOUR_MILLIS: i64 = 60 * MINUTE_MILLIS;
pub const DAY_MILLIS: i64 = 24 * HOUR_MILLIS;

/// A clinical rule evaluated against the measurement store
///
/// Implementations must be deterministic for a given store state and `now`.
pub trait Detector: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Evaluate the rule for one patient at time `now` (epoch millis)
    fn evaluate(&self, patient_id: PatientId, store: &MeasurementStore, now: i64) -> Vec<Alert>;
}

/// Limits for every built-in detector, defaulting to the clinical constants
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorThresholds {
    pub blood_pressure: BloodPressureThresholds,
    pub saturation: SaturationThresholds,
    pub cardiac: CardiacThresholds,
    pub compound: CompoundThresholds,
}

impl DetectorThresholds {
    /// The four standard detectors, built from these limits
    pub fn standard_detectors(&self) -> Vec<Box<dyn Detector>> {
        vec![
            Box::new(BloodPressureDetector::new(self.blood_pressure.clone())),
            Box::new(SaturationDetector::new(self.saturation.clone())),
            Box::new(CardiacRhythmDetector::new(self.cardiac.clone())),
            Box::new(HypotensiveHypoxemiaDetector::new(self.compound.clone())),
        ]
    }
}

/// Measurements in `[now - span, now]`
pub(crate) fn lookback(
    store: &MeasurementStore,
    patient_id: PatientId,
    now: i64,
    span_millis: i64,
) -> Window {
    store.range(patient_id, now.saturating_sub(span_millis), now)
}
