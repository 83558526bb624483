//! Hypotensive hypoxemia: low systolic pressure and low saturation seen in
//! the same 10-minute window. The two readings need not coincide.

use serde::{Deserialize, Serialize};

use super::{lookback, Detector, MINUTE_MILLIS};
use crate::health::{Alert, AlertCondition, MeasurementKind, MeasurementStore, PatientId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompoundThresholds {
    pub window_millis: i64,
    pub systolic_below: f64,
    pub saturation_below: f64,
}

impl Default for CompoundThresholds {
    fn default() -> Self {
        Self {
            window_millis: 10 * MINUTE_MILLIS,
            systolic_below: 90.0,
            saturation_below: 92.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct HypotensiveHypoxemiaDetector {
    thresholds: CompoundThresholds,
}

impl HypotensiveHypoxemiaDetector {
    pub fn new(thresholds: CompoundThresholds) -> Self {
        Self { thresholds }
    }
}

impl Detector for HypotensiveHypoxemiaDetector {
    fn name(&self) -> &'static str {
        "hypotensive-hypoxemia"
    }

    fn evaluate(&self, patient_id: PatientId, store: &MeasurementStore, now: i64) -> Vec<Alert> {
        let window = lookback(store, patient_id, now, self.thresholds.window_millis);

        let low_pressure = window.iter().any(|m| {
            m.kind == MeasurementKind::SystolicPressure && m.value < self.thresholds.systolic_below
        });
        let low_saturation = window.iter().any(|m| {
            m.kind == MeasurementKind::Saturation && m.value < self.thresholds.saturation_below
        });

        if low_pressure && low_saturation {
            vec![Alert::new(
                patient_id,
                AlertCondition::HypotensiveHypoxemia,
                now,
            )]
        } else {
            Vec::new()
        }
    }
}
