//! Blood-oxygen saturation rules over the last 10 minutes
//!
//! Both rules scan chronologically and stop at their first hit.

use serde::{Deserialize, Serialize};

use super::{lookback, Detector, MINUTE_MILLIS};
use crate::health::{
    Alert, AlertCondition, Measurement, MeasurementKind, MeasurementStore, PatientId,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaturationThresholds {
    pub window_millis: i64,
    /// Readings strictly below this are low
    pub low: f64,
    /// Percentage drop between consecutive readings that counts as rapid
    pub rapid_drop_percent: f64,
}

impl Default for SaturationThresholds {
    fn default() -> Self {
        Self {
            window_millis: 10 * MINUTE_MILLIS,
            low: 92.0,
            rapid_drop_percent: 5.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SaturationDetector {
    thresholds: SaturationThresholds,
}

/// Percentage fall from `prev` to `curr`; zero when `prev` is zero
fn drop_percent(prev: f64, curr: f64) -> f64 {
    if prev == 0.0 {
        return 0.0;
    }
    100.0 * (prev - curr) / prev
}

impl SaturationDetector {
    pub fn new(thresholds: SaturationThresholds) -> Self {
        Self { thresholds }
    }

    fn first_low<'a>(&self, readings: &'a [Measurement]) -> Option<&'a Measurement> {
        readings.iter().find(|m| m.value < self.thresholds.low)
    }

    fn first_rapid_drop<'a>(&self, readings: &'a [Measurement]) -> Option<&'a Measurement> {
        readings
            .windows(2)
            .find(|pair| {
                drop_percent(pair[0].value, pair[1].value) >= self.thresholds.rapid_drop_percent
            })
            .map(|pair| &pair[1])
    }
}

impl Detector for SaturationDetector {
    fn name(&self) -> &'static str {
        "oxygen-saturation"
    }

    fn evaluate(&self, patient_id: PatientId, store: &MeasurementStore, now: i64) -> Vec<Alert> {
        let readings = lookback(store, patient_id, now, self.thresholds.window_millis)
            .of_kind(&MeasurementKind::Saturation)
            .oldest_first();
        let readings = readings.as_slice();

        let mut alerts = Vec::new();
        if let Some(m) = self.first_low(readings) {
            alerts.push(Alert::new(
                patient_id,
                AlertCondition::LowSaturation,
                m.timestamp_millis,
            ));
        }
        if let Some(m) = self.first_rapid_drop(readings) {
            alerts.push(Alert::new(
                patient_id,
                AlertCondition::RapidOxygenDrop,
                m.timestamp_millis,
            ));
        }
        alerts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const P: PatientId = PatientId(3);
    const NOW: i64 = 1_700_000_000_000;

    #[test]
    fn test_drop_percent_guards_zero() {
        assert_eq!(drop_percent(0.0, 50.0), 0.0);
        assert_eq!(drop_percent(100.0, 95.0), 5.0);
        assert!(drop_percent(90.0, 95.0) < 0.0);
    }

    #[test]
    fn test_only_first_low_reading_alerts() {
        let store = MeasurementStore::new();
        store.record(P, MeasurementKind::Saturation, 91.5, NOW - 3_000).unwrap();
        store.record(P, MeasurementKind::Saturation, 91.0, NOW - 2_000).unwrap();
        store.record(P, MeasurementKind::Saturation, 90.9, NOW - 1_000).unwrap();

        let alerts = SaturationDetector::default().evaluate(P, &store, NOW);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].condition, AlertCondition::LowSaturation);
        assert_eq!(alerts[0].timestamp_millis, NOW - 3_000);
    }

    #[test]
    fn test_ninety_two_is_not_low() {
        let store = MeasurementStore::new();
        store.record(P, MeasurementKind::Saturation, 92.0, NOW - 1_000).unwrap();
        assert!(SaturationDetector::default().evaluate(P, &store, NOW).is_empty());
    }

    #[test]
    fn test_rapid_drop_is_stamped_at_later_reading() {
        let store = MeasurementStore::new();
        // recorded out of order on purpose
        store.record(P, MeasurementKind::Saturation, 97.0, NOW - 1_000).unwrap();
        store.record(P, MeasurementKind::Saturation, 98.0, NOW - 5_000).unwrap();
        store.record(P, MeasurementKind::Saturation, 92.0, NOW - 500).unwrap();

        let alerts = SaturationDetector::default().evaluate(P, &store, NOW);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].condition, AlertCondition::RapidOxygenDrop);
        assert_eq!(alerts[0].timestamp_millis, NOW - 500);
    }

    #[test]
    fn test_exact_five_percent_counts_as_rapid() {
        let store = MeasurementStore::new();
        store.record(P, MeasurementKind::Saturation, 100.0, NOW - 2_000).unwrap();
        store.record(P, MeasurementKind::Saturation, 95.0, NOW - 1_000).unwrap();

        let alerts = SaturationDetector::default().evaluate(P, &store, NOW);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].condition, AlertCondition::RapidOxygenDrop);
    }

    #[test]
    fn test_zero_reading_does_not_divide() {
        let store = MeasurementStore::new();
        store.record(P, MeasurementKind::Saturation, 0.0, NOW - 2_000).unwrap();
        store.record(P, MeasurementKind::Saturation, 0.0, NOW - 1_000).unwrap();

        let alerts = SaturationDetector::default().evaluate(P, &store, NOW);
        // low, but never a rapid drop
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].condition, AlertCondition::LowSaturation);
    }

    #[test]
    fn test_old_readings_are_outside_window() {
        let store = MeasurementStore::new();
        store.record(P, MeasurementKind::Saturation, 80.0, NOW - 10 * MINUTE_MILLIS - 1).unwrap();
        assert!(SaturationDetector::default().evaluate(P, &store, NOW).is_empty());
    }
}
