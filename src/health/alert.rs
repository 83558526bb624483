use serde::{Deserialize, Serialize};
use std::fmt;

use super::measurement::PatientId;

/// Which blood-pressure channel a pressure alert is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PressureKind {
    Systolic,
    Diastolic,
}

impl fmt::Display for PressureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PressureKind::Systolic => f.write_str("Systolic"),
            PressureKind::Diastolic => f.write_str("Diastolic"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrendDirection {
    Increasing,
    Decreasing,
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrendDirection::Increasing => f.write_str("Increasing"),
            TrendDirection::Decreasing => f.write_str("Decreasing"),
        }
    }
}

/// Clinical condition an alert reports
///
/// `Display` gives the human-readable condition text, e.g.
/// `"Critical Systolic Pressure Alert"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AlertCondition {
    CriticalPressure { pressure: PressureKind },
    PressureTrend {
        pressure: PressureKind,
        direction: TrendDirection,
    },
    LowSaturation,
    RapidOxygenDrop,
    AbnormalHeartRate,
    IrregularBeat,
    HypotensiveHypoxemia,
}

impl AlertCondition {
    /// Priority an alert gets unless the detector says otherwise
    pub fn default_priority(&self) -> AlertPriority {
        match self {
            AlertCondition::CriticalPressure { .. }
            | AlertCondition::RapidOxygenDrop
            | AlertCondition::HypotensiveHypoxemia => AlertPriority::Urgent,
            _ => AlertPriority::Normal,
        }
    }
}

impl fmt::Display for AlertCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertCondition::CriticalPressure { pressure } => {
                write!(f, "Critical {pressure} Pressure Alert")
            }
            AlertCondition::PressureTrend {
                pressure,
                direction,
            } => write!(f, "{pressure} Pressure {direction} Trend Alert"),
            AlertCondition::LowSaturation => f.write_str("Low Saturation Alert"),
            AlertCondition::RapidOxygenDrop => f.write_str("Rapid Blood Oxygen Drop Alert"),
            AlertCondition::AbnormalHeartRate => f.write_str("Abnormal Heart Rate Alert"),
            AlertCondition::IrregularBeat => f.write_str("Irregular Beat Alert"),
            AlertCondition::HypotensiveHypoxemia => f.write_str("Hypotensive Hypoxemia Alert"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertPriority {
    #[default]
    Normal,
    Urgent,
}

/// A finished alert, handed to the sink and then dropped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub patient_id: PatientId,
    pub condition: AlertCondition,
    pub timestamp_millis: i64,
    pub priority: AlertPriority,
}

impl Alert {
    pub fn new(patient_id: PatientId, condition: AlertCondition, timestamp_millis: i64) -> Self {
        Self {
            patient_id,
            condition,
            timestamp_millis,
            priority: condition.default_priority(),
        }
    }

    pub fn with_priority(mut self, priority: AlertPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn is_urgent(&self) -> bool {
        self.priority == AlertPriority::Urgent
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} for patient {} at {}",
            self.condition, self.patient_id, self.timestamp_millis
        )
    }
}
