//! Simulation events and the reporter seam.
//!
//! The engine never renders anything itself. After every mutation it hands an
//! [`Event`] to a [`Reporter`]; console output, JSON streams and test
//! recorders are all reporters.
//!
//! Within one step the order is fixed:
//!
//! 1. [`Event::StepStarted`]
//! 2. [`Event::ProcessCompleted`] or [`Event::ProcessBlocked`]
//! 3. [`Event::DeadlockChecked`]
//! 4. [`Event::StateSnapshot`]

use crate::detector::DeadlockReport;
use crate::id::{ProcessId, ResourceId};
use crate::sim::RunSummary;
use crate::snapshot::GraphSnapshot;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

/// A simulation event. Step-scoped events carry the 1-based step number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    /// State of the freshly built graph, before the first step.
    InitialState { snapshot: GraphSnapshot },

    StepStarted {
        step: u64,
        process: ProcessId,
    },
    ProcessCompleted {
        step: u64,
        process: ProcessId,
        acquired: Vec<ResourceId>,
    },
    ProcessBlocked {
        step: u64,
        process: ProcessId,
        blocking: Vec<ResourceId>,
    },
    DeadlockChecked {
        step: u64,
        report: DeadlockReport,
    },
    StateSnapshot {
        step: u64,
        snapshot: GraphSnapshot,
    },

    /// The pass is over.
    PassFinished { summary: RunSummary },
}

/// Discriminant tag for event types, used for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    InitialState,
    StepStarted,
    ProcessCompleted,
    ProcessBlocked,
    DeadlockChecked,
    StateSnapshot,
    PassFinished,
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::InitialState { .. } => EventKind::InitialState,
            Event::StepStarted { .. } => EventKind::StepStarted,
            Event::ProcessCompleted { .. } => EventKind::ProcessCompleted,
            Event::ProcessBlocked { .. } => EventKind::ProcessBlocked,
            Event::DeadlockChecked { .. } => EventKind::DeadlockChecked,
            Event::StateSnapshot { .. } => EventKind::StateSnapshot,
            Event::PassFinished { .. } => EventKind::PassFinished,
        }
    }

    /// Step number, for step-scoped events.
    pub fn step(&self) -> Option<u64> {
        match self {
            Event::StepStarted { step, .. }
            | Event::ProcessCompleted { step, .. }
            | Event::ProcessBlocked { step, .. }
            | Event::DeadlockChecked { step, .. }
            | Event::StateSnapshot { step, .. } => Some(*step),
            Event::InitialState { .. } | Event::PassFinished { .. } => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Reporter
// ---------------------------------------------------------------------------

/// Receives events read-only, in emission order.
pub trait Reporter {
    fn report(&mut self, event: &Event);
}

/// Records every event.
impl Reporter for Vec<Event> {
    fn report(&mut self, event: &Event) {
        self.push(event.clone());
    }
}

impl<R: Reporter + ?Sized> Reporter for &mut R {
    fn report(&mut self, event: &Event) {
        (**self).report(event);
    }
}

impl<R: Reporter + ?Sized> Reporter for Box<R> {
    fn report(&mut self, event: &Event) {
        (**self).report(event);
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn report(&mut self, _event: &Event) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started(step: u64) -> Event {
        Event::StepStarted {
            step,
            process: ProcessId(0),
        }
    }

    #[test]
    fn vec_records_in_order() {
        let mut events: Vec<Event> = Vec::new();
        events.report(&started(1));
        events.report(&started(2));
        assert_eq!(events, vec![started(1), started(2)]);
    }

    #[test]
    fn step_numbers() {
        assert_eq!(started(3).step(), Some(3));
        assert_eq!(
            Event::PassFinished {
                summary: RunSummary::default()
            }
            .step(),
            None
        );
    }

    #[test]
    fn json_is_tagged() {
        let json = serde_json::to_string(&started(1)).unwrap();
        assert!(json.contains("\"event\":\"step_started\""), "{json}");
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(back, started(1));
    }

    #[test]
    fn boxed_reporter_forwards() {
        let mut boxed: Box<dyn Reporter> = Box::new(NullReporter);
        boxed.report(&started(1));
    }
}
