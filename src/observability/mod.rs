//! Observability subsystem
//!
//! Structured JSON logging, typed lifecycle events and monotonic counters.
//! Observability is read-only: a failure to log never changes the outcome of
//! the operation being logged.
//!
//! ```ignore
//! use plandb::observability::{log_event, Event, MetricsRegistry};
//!
//! log_event(Event::PlanCreated, &[("plan_id", "p1")]);
//!
//! let metrics = MetricsRegistry::new();
//! metrics.increment_plans_created();
//! ```

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};

/// Log an event at its default severity.
pub fn log_event(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}

#[cfg(test)]
mod tests {
    use super::logger::capture_log;
    use super::*;

    #[test]
    fn test_log_event_uses_event_severity() {
        let event = Event::RecordCorrupt;
        let line = capture_log(event.severity(), event.as_str(), &[("key", "p1")]);
        let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["event"], "RECORD_CORRUPT");
        assert_eq!(parsed["severity"], "ERROR");
    }

    #[test]
    fn test_log_event_does_not_panic() {
        log_event(Event::BootStart, &[]);
        log_event(Event::PlanCreated, &[("plan_id", "p1")]);
    }
}
