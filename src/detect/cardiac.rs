//! Cardiac rhythm rules over the last hour of heart-rate proxy samples
//!
//! - **abnormal rate**: one alert per sample outside `[low, high]`
//! - **irregular beat**: the first pair of consecutive samples whose spacing
//!   differs from the mean spacing by more than `irregular_tolerance` of
//!   that mean; stamped at the later sample

use serde::{Deserialize, Serialize};

use super::{lookback, Detector, HOUR_MILLIS};
use crate::health::{
    Alert, AlertCondition, Measurement, MeasurementKind, MeasurementStore, PatientId,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CardiacThresholds {
    pub window_millis: i64,
    pub low_rate: f64,
    pub high_rate: f64,
    /// Allowed deviation from the mean interval, as a fraction of it
    pub irregular_tolerance: f64,
}

impl Default for CardiacThresholds {
    fn default() -> Self {
        Self {
            window_millis: HOUR_MILLIS,
            low_rate: 50.0,
            high_rate: 100.0,
            irregular_tolerance: 0.1,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CardiacRhythmDetector {
    thresholds: CardiacThresholds,
}

/// Mean spacing of chronologically ordered samples, `None` below two samples
fn mean_interval(samples: &[Measurement]) -> Option<f64> {
    if samples.len() < 2 {
        return None;
    }
    let total: i64 = samples
        .windows(2)
        .map(|pair| pair[1].timestamp_millis - pair[0].timestamp_millis)
        .sum();
    Some(total as f64 / (samples.len() - 1) as f64)
}

impl CardiacRhythmDetector {
    pub fn new(thresholds: CardiacThresholds) -> Self {
        Self { thresholds }
    }

    fn is_abnormal(&self, rate: f64) -> bool {
        rate < self.thresholds.low_rate || rate > self.thresholds.high_rate
    }

    fn first_irregular<'a>(&self, samples: &'a [Measurement]) -> Option<&'a Measurement> {
        let average = mean_interval(samples)?;
        let allowed = self.thresholds.irregular_tolerance * average;

        samples
            .windows(2)
            .find(|pair| {
                let interval = (pair[1].timestamp_millis - pair[0].timestamp_millis) as f64;
                (interval - average).abs() > allowed
            })
            .map(|pair| &pair[1])
    }
}

impl Detector for CardiacRhythmDetector {
    fn name(&self) -> &'static str {
        "cardiac-rhythm"
    }

    fn evaluate(&self, patient_id: PatientId, store: &MeasurementStore, now: i64) -> Vec<Alert> {
        let samples = lookback(store, patient_id, now, self.thresholds.window_millis)
            .of_kind(&MeasurementKind::HeartRateProxy)
            .oldest_first();
        if samples.is_empty() {
            return Vec::new();
        }

        let mut alerts: Vec<Alert> = samples
            .iter()
            .filter(|m| self.is_abnormal(m.value))
            .map(|m| Alert::new(patient_id, AlertCondition::AbnormalHeartRate, m.timestamp_millis))
            .collect();

        if let Some(m) = self.first_irregular(samples.as_slice()) {
            alerts.push(Alert::new(
                patient_id,
                AlertCondition::IrregularBeat,
                m.timestamp_millis,
            ));
        }

        alerts
    }
}
