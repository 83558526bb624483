//! Alert sinks
//!
//! A sink receives every finished alert exactly once. Sinks are synchronous
//! and must not fail from the engine's point of view; a sink that can fail
//! deals with the failure itself.

use parking_lot::Mutex;
use std::io::Write;

use crate::health::Alert;

/// Consumer of finished alerts
pub trait AlertSink: Send + Sync {
    fn accept(&self, alert: Alert);
}

/// Any `Fn(Alert)` closure is a sink
impl<F> AlertSink for F
where
    F: Fn(Alert) + Send + Sync,
{
    fn accept(&self, alert: Alert) {
        self(alert)
    }
}

/// Writes each alert to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl AlertSink for TracingSink {
    fn accept(&self, alert: Alert) {
        if alert.is_urgent() {
            tracing::warn!(
                patient = %alert.patient_id,
                condition = %alert.condition,
                timestamp = alert.timestamp_millis,
                "urgent alert"
            );
        } else {
            tracing::info!(
                patient = %alert.patient_id,
                condition = %alert.condition,
                timestamp = alert.timestamp_millis,
                "alert"
            );
        }
    }
}

/// Keeps alerts in memory, in arrival order
#[derive(Debug, Default)]
pub struct CollectingSink {
    alerts: Mutex<Vec<Alert>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything received so far
    pub fn alerts(&self) -> Vec<Alert> {
        self.alerts.lock().clone()
    }

    /// Drain everything received so far
    pub fn take(&self) -> Vec<Alert> {
        std::mem::take(&mut *self.alerts.lock())
    }

    pub fn len(&self) -> usize {
        self.alerts.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.lock().is_empty()
    }
}

impl AlertSink for CollectingSink {
    fn accept(&self, alert: Alert) {
        self.alerts.lock().push(alert);
    }
}

/// One JSON object per line
pub struct JsonLinesSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl<W: Write + Send> AlertSink for JsonLinesSink<W> {
    fn accept(&self, alert: Alert) {
        let line = match serde_json::to_string(&alert) {
            Ok(line) => line,
            Err(e) => {
                tracing::error!("failed to serialize alert: {}", e);
                return;
            }
        };

        let mut writer = self.writer.lock();
        if let Err(e) = writeln!(writer, "{line}").and_then(|_| writer.flush()) {
            tracing::error!(patient = %alert.patient_id, "failed to write alert: {}", e);
        }
    }
}
