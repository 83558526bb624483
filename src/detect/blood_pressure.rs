//! Blood-pressure rules
//!
//! Systolic and diastolic channels are checked independently over the last
//! 24 hours:
//!
//! - **critical threshold**: one alert per reading strictly above `high` or
//!   strictly below `low`, stamped with the reading's time
//! - **trend**: the newest `trend_samples` readings all step up (or all step
//!   down) by more than `trend_step`; at most one alert per channel, stamped
//!   with `now`

use serde::{Deserialize, Serialize};

use super::{lookback, Detector, DAY_MILLIS};
use crate::health::{
    Alert, AlertCondition, MeasurementKind, MeasurementStore, PatientId, PressureKind,
    TrendDirection, Window,
};

/// Inclusive normal range; values on the bounds do not alert
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PressureBounds {
    pub high: f64,
    pub low: f64,
}

impl PressureBounds {
    fn is_critical(&self, value: f64) -> bool {
        value > self.high || value < self.low
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BloodPressureThresholds {
    pub window_millis: i64,
    pub systolic: PressureBounds,
    pub diastolic: PressureBounds,
    /// Minimum change between consecutive readings to count as a trend step
    pub trend_step: f64,
    /// How many of the newest readings make up a trend
    pub trend_samples: usize,
}

impl Default for BloodPressureThresholds {
    fn default() -> Self {
        Self {
            window_millis: DAY_MILLIS,
            systolic: PressureBounds {
                high: 180.0,
                low: 90.0,
            },
            diastolic: PressureBounds {
                high: 120.0,
                low: 60.0,
            },
            trend_step: 10.0,
            trend_samples: 3,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BloodPressureDetector {
    thresholds: BloodPressureThresholds,
}

impl BloodPressureDetector {
    pub fn new(thresholds: BloodPressureThresholds) -> Self {
        Self { thresholds }
    }

    fn check_channel(
        &self,
        patient_id: PatientId,
        pressure: PressureKind,
        window: Window,
        now: i64,
        alerts: &mut Vec<Alert>,
    ) {
        let (kind, bounds) = match pressure {
            PressureKind::Systolic => (MeasurementKind::SystolicPressure, self.thresholds.systolic),
            PressureKind::Diastolic => {
                (MeasurementKind::DiastolicPressure, self.thresholds.diastolic)
            }
        };

        let readings = window.of_kind(&kind).oldest_first();

        for m in readings.iter().filter(|m| bounds.is_critical(m.value)) {
            alerts.push(Alert::new(
                patient_id,
                AlertCondition::CriticalPressure { pressure },
                m.timestamp_millis,
            ));
        }

        let newest: Vec<f64> = readings
            .newest_first()
            .iter()
            .take(self.thresholds.trend_samples)
            .map(|m| m.value)
            .collect();

        if let Some(direction) = self.trend(&newest) {
            alerts.push(Alert::new(
                patient_id,
                AlertCondition::PressureTrend {
                    pressure,
                    direction,
                },
                now,
            ));
        }
    }

    /// `newest` is ordered newest to oldest
    fn trend(&self, newest: &[f64]) -> Option<TrendDirection> {
        if newest.len() < self.thresholds.trend_samples.max(2) {
            return None;
        }

        let step = self.thresholds.trend_step;
        // pairs are (newer, older)
        let increasing = newest.windows(2).all(|pair| pair[0] - pair[1] > step);
        let decreasing = newest.windows(2).all(|pair| pair[1] - pair[0] > step);

        if increasing {
            Some(TrendDirection::Increasing)
        } else if decreasing {
            Some(TrendDirection::Decreasing)
        } else {
            None
        }
    }
}

impl Detector for BloodPressureDetector {
    fn name(&self) -> &'static str {
        "blood-pressure"
    }

    fn evaluate(&self, patient_id: PatientId, store: &MeasurementStore, now: i64) -> Vec<Alert> {
        let window = lookback(store, patient_id, now, self.thresholds.window_millis);
        let mut alerts = Vec::new();

        self.check_channel(
            patient_id,
            PressureKind::Systolic,
            window.clone(),
            now,
            &mut alerts,
        );
        self.check_channel(patient_id, PressureKind::Diastolic, window, now, &mut alerts);

        alerts
    }
}
