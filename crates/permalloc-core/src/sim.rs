//! Simulation state, per-step outcomes and the pass summary.

use crate::detector::DeadlockReport;
use crate::id::{ProcessId, ResourceId};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Simulation state
// ---------------------------------------------------------------------------

/// Mutable counters tracked by the simulation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimState {
    /// Number of steps executed so far. Step numbers reported to the
    /// reporter start at 1.
    pub step: u64,

    /// Number of steps whose deadlock check came back positive.
    pub deadlocked_steps: u64,
}

impl SimState {
    pub fn new() -> Self {
        Self::default()
    }
}

// ---------------------------------------------------------------------------
// Step outcome
// ---------------------------------------------------------------------------

/// Result of one acquisition attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Acquisition {
    /// Every required resource was free; all are now allocated to the process.
    Completed { acquired: Vec<ResourceId> },
    /// At least one required resource was already allocated.
    Blocked {
        /// Required resources that were allocated (edges now Blocked).
        blocking: Vec<ResourceId>,
        /// Required resources that were free (edges left Requested).
        pending: Vec<ResourceId>,
    },
}

impl Acquisition {
    pub fn is_completed(&self) -> bool {
        matches!(self, Acquisition::Completed { .. })
    }
}

/// Everything that happened during one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub step: u64,
    pub process: ProcessId,
    pub acquisition: Acquisition,
    pub deadlock: DeadlockReport,
}

// ---------------------------------------------------------------------------
// Run summary
// ---------------------------------------------------------------------------

/// Result of a full pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Steps executed (one per process).
    pub steps: u64,
    /// Processes that completed, in creation order.
    pub completed: Vec<ProcessId>,
    /// Processes left blocked, in creation order.
    pub blocked: Vec<ProcessId>,
    /// Steps at which a deadlock was reported.
    pub deadlocked_steps: u64,
    /// Hash of the final state.
    pub state_hash: u64,
}

// ---------------------------------------------------------------------------
// State hash
// ---------------------------------------------------------------------------

/// A simple deterministic hash of simulation state for comparing runs.
///
/// Uses FNV-1a (64-bit) for speed and simplicity. Not cryptographic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateHash(pub u64);

impl StateHash {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;

    pub fn new() -> Self {
        Self(Self::FNV_OFFSET)
    }

    /// Feed bytes into the hash.
    pub fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= b as u64;
            self.0 = self.0.wrapping_mul(Self::FNV_PRIME);
        }
    }

    pub fn write_u64(&mut self, v: u64) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_u32(&mut self, v: u32) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_u8(&mut self, v: u8) {
        self.write(&[v]);
    }

    pub fn finish(self) -> u64 {
        self.0
    }
}

impl Default for StateHash {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sim_state_starts_at_zero() {
        let state = SimState::new();
        assert_eq!(state.step, 0);
        assert_eq!(state.deadlocked_steps, 0);
    }

    #[test]
    fn state_hash_deterministic() {
        let mut h1 = StateHash::new();
        h1.write_u64(42);
        h1.write_u32(7);

        let mut h2 = StateHash::new();
        h2.write_u64(42);
        h2.write_u32(7);

        assert_eq!(h1.finish(), h2.finish());
    }

    #[test]
    fn state_hash_order_matters() {
        let mut h1 = StateHash::new();
        h1.write_u8(1);
        h1.write_u8(2);

        let mut h2 = StateHash::new();
        h2.write_u8(2);
        h2.write_u8(1);

        assert_ne!(h1.finish(), h2.finish());
    }

    #[test]
    fn acquisition_completed_flag() {
        assert!(Acquisition::Completed { acquired: vec![] }.is_completed());
        assert!(
            !Acquisition::Blocked {
                blocking: vec![ResourceId(0)],
                pending: vec![],
            }
            .is_completed()
        );
    }
}
