//! Telemetry sink — periodic gauges, write-only.

use std::collections::HashMap;
use std::sync::Mutex;

/// Observational gauge sink. Never read back by the engine.
pub trait Telemetry: Send + Sync {
    fn gauge(&self, name: &str, value: f64);
}

/// Telemetry stand-in when no sink is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTelemetry;

impl Telemetry for NoopTelemetry {
    fn gauge(&self, _name: &str, _value: f64) {}
}

/// Captures the latest value per gauge; used in tests.
#[derive(Debug, Default)]
pub struct MemoryTelemetry {
    gauges: Mutex<HashMap<String, f64>>,
}

impl MemoryTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.gauges.lock().ok()?.get(name).copied()
    }
}

impl Telemetry for MemoryTelemetry {
    fn gauge(&self, name: &str, value: f64) {
        if let Ok(mut gauges) = self.gauges.lock() {
            gauges.insert(name.to_string(), value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_value_per_gauge() {
        let sink = MemoryTelemetry::new();
        sink.gauge("trend.rsi", 42.0);
        sink.gauge("trend.rsi", 55.0);
        assert_eq!(sink.get("trend.rsi"), Some(55.0));
        assert_eq!(sink.get("trend.atr"), None);
    }
}
