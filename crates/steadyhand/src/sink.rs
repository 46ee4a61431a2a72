//! Fire-and-forget interaction notifications.
//!
//! Engines notify every registered [`InteractionSink`] after each public
//! operation. A sink that fails is logged and skipped; it never changes the
//! outcome of the interaction.

use crate::result::SteadyResult;
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tracing::{info, warn};

/// How an operation ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EventOutcome {
    /// Completed normally
    Succeeded,
    /// Reached a soft-fail path (timed-out click, Tab fallback)
    SoftFailed,
    /// Raised an error
    Failed {
        /// Rendered error chain
        message: String,
    },
}

/// One finished interaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionEvent {
    /// Operation name
    pub operation: String,
    /// Locator or other subject
    pub locator: String,
    /// Outcome
    #[serde(flatten)]
    pub outcome: EventOutcome,
    /// Wall time of the operation
    pub elapsed: Duration,
}

impl InteractionEvent {
    /// Create an event
    #[must_use]
    pub fn new(
        operation: impl Into<String>,
        locator: impl Into<String>,
        outcome: EventOutcome,
        elapsed: Duration,
    ) -> Self {
        Self {
            operation: operation.into(),
            locator: locator.into(),
            outcome,
            elapsed,
        }
    }

    /// Whether the operation raised an error
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self.outcome, EventOutcome::Failed { .. })
    }
}

/// Receiver of interaction notifications
pub trait InteractionSink: Send + Sync {
    /// Record one event. Errors are logged by the caller and ignored.
    fn record(&self, event: &InteractionEvent) -> SteadyResult<()>;
}

/// Deliver `event` to every sink, swallowing sink failures
pub fn notify_all(sinks: &[std::sync::Arc<dyn InteractionSink>], event: &InteractionEvent) {
    for sink in sinks {
        if let Err(err) = sink.record(event) {
            warn!(operation = %event.operation, error = %err, "interaction sink failed");
        }
    }
}

/// Sink that writes each event to the `tracing` log
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl InteractionSink for TracingSink {
    fn record(&self, event: &InteractionEvent) -> SteadyResult<()> {
        let elapsed_ms = event.elapsed.as_millis() as u64;
        match &event.outcome {
            EventOutcome::Succeeded => {
                info!(operation = %event.operation, locator = %event.locator, elapsed_ms, "ok");
            }
            EventOutcome::SoftFailed => {
                warn!(operation = %event.operation, locator = %event.locator, elapsed_ms, "soft-failed");
            }
            EventOutcome::Failed { message } => {
                warn!(operation = %event.operation, locator = %event.locator, elapsed_ms, %message, "failed");
            }
        }
        Ok(())
    }
}

/// Sink that keeps events in memory (report assembly, tests)
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<InteractionEvent>>,
}

impl MemorySink {
    /// Create an empty sink
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of recorded events
    #[must_use]
    pub fn events(&self) -> Vec<InteractionEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Events serialized as a JSON array
    pub fn to_json(&self) -> SteadyResult<String> {
        Ok(serde_json::to_string_pretty(&self.events())?)
    }
}

impl InteractionSink for MemorySink {
    fn record(&self, event: &InteractionEvent) -> SteadyResult<()> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::result::SteadyError;
    use std::sync::Arc;

    struct BrokenSink;

    impl InteractionSink for BrokenSink {
        fn record(&self, _event: &InteractionEvent) -> SteadyResult<()> {
            Err(SteadyError::InvalidState {
                message: "report writer closed".into(),
            })
        }
    }

    fn event(outcome: EventOutcome) -> InteractionEvent {
        InteractionEvent::new("click", "#save", outcome, Duration::from_millis(120))
    }

    #[test]
    fn test_memory_sink_records_in_order() {
        let sink = MemorySink::new();
        sink.record(&event(EventOutcome::Succeeded)).unwrap();
        sink.record(&event(EventOutcome::SoftFailed)).unwrap();
        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].outcome, EventOutcome::SoftFailed);
    }

    #[test]
    fn test_broken_sink_does_not_stop_delivery() {
        let memory = Arc::new(MemorySink::new());
        let sinks: Vec<Arc<dyn InteractionSink>> = vec![Arc::new(BrokenSink), memory.clone()];
        notify_all(&sinks, &event(EventOutcome::Succeeded));
        assert_eq!(memory.events().len(), 1);
    }

    #[test]
    fn test_event_json_shape() {
        let sink = MemorySink::new();
        sink.record(&event(EventOutcome::Failed {
            message: "boom".into(),
        }))
        .unwrap();
        let json = sink.to_json().unwrap();
        assert!(json.contains("\"status\": \"failed\""));
        assert!(json.contains("\"message\": \"boom\""));
        assert!(event(EventOutcome::Failed { message: String::new() }).is_failure());
    }
}
