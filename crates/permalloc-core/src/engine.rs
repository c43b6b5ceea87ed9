//! The execution engine: owns the resource graph and runs the single ordered
//! pass over all processes.
//!
//! # Architecture
//!
//! A [`Simulation`] owns:
//! - A [`ResourceGraph`] (processes, resources, typed edges)
//! - A [`SimState`] (step counter, deadlock tally)
//! - The execution order, fixed when the simulation is created
//!
//! # Execution order
//!
//! Processes run in ascending order of their request-edge count. The sort is
//! stable, so ties keep creation order (ascending id).
//!
//! # Per-step pipeline
//!
//! Each [`Simulation::step`] runs:
//! 1. **Collect** -- the process's required resources (request destinations)
//! 2. **Acquire** -- succeeds iff none of them is allocated right now
//! 3. **Update** -- Acquired edges + completion, or Blocked/Requested edges
//! 4. **Detect** -- advisory deadlock check over the wait-for relation
//! 5. **Report** -- outcome event, deadlock event, full snapshot
//!
//! A blocked process is never retried and allocations are never released.

use crate::builder::{BuildError, GraphBuilder, GraphConfig};
use crate::detector::{self, DeadlockReport};
use crate::event::{Event, Reporter};
use crate::graph::{EdgeKind, EdgeStatus, GraphError, ResourceGraph};
use crate::id::{NodeRef, ProcessId, ResourceId};
use crate::rng::SimRng;
use crate::sim::{Acquisition, RunSummary, SimState, StateHash, StepOutcome};
use crate::snapshot::GraphSnapshot;

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

/// The simulation context. Everything the builder produced and the engine
/// mutates lives here; there is no global state.
#[derive(Debug, Clone)]
pub struct Simulation {
    /// The resource graph.
    pub graph: ResourceGraph,

    /// Step counter and tallies.
    pub sim_state: SimState,

    /// Processes in execution order.
    order: Vec<ProcessId>,

    /// Index into `order` of the next process to run.
    cursor: usize,
}

impl Simulation {
    /// Wrap a populated graph. The execution order is computed here, from the
    /// realized request counts.
    pub fn new(graph: ResourceGraph) -> Self {
        let order = execution_order(&graph);
        tracing::debug!(processes = order.len(), "execution order fixed");
        Self {
            graph,
            sim_state: SimState::new(),
            order,
            cursor: 0,
        }
    }

    /// Generate a random graph from `config` and wrap it.
    pub fn generate(config: GraphConfig, rng: &mut SimRng) -> Result<Self, BuildError> {
        let graph = GraphBuilder::new(config)?.build(rng)?;
        Ok(Self::new(graph))
    }

    /// Processes in the order they run (or ran).
    pub fn execution_order(&self) -> &[ProcessId] {
        &self.order
    }

    /// The process the next [`step`](Self::step) will run, if any.
    pub fn next_process(&self) -> Option<ProcessId> {
        self.order.get(self.cursor).copied()
    }

    /// Whether every process has had its single attempt.
    pub fn is_finished(&self) -> bool {
        self.cursor >= self.order.len()
    }

    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot::capture(&self.graph)
    }

    /// Run the deadlock check against the current state.
    pub fn detect_deadlock(&self) -> DeadlockReport {
        detector::detect(&self.graph)
    }

    /// Emit the state of the graph before the first step.
    pub fn report_initial_state<R: Reporter + ?Sized>(&self, reporter: &mut R) {
        reporter.report(&Event::InitialState {
            snapshot: self.snapshot(),
        });
    }

    // -----------------------------------------------------------------------
    // Stepping
    // -----------------------------------------------------------------------

    /// Execute the next process. Returns `Ok(None)` once the pass is over.
    ///
    /// Errors are state conflicts (double allocation or completion) and
    /// indicate a broken invariant; the pass should be abandoned.
    pub fn step<R: Reporter + ?Sized>(
        &mut self,
        reporter: &mut R,
    ) -> Result<Option<StepOutcome>, GraphError> {
        let Some(process) = self.next_process() else {
            return Ok(None);
        };
        self.cursor += 1;
        self.sim_state.step += 1;
        let step = self.sim_state.step;

        reporter.report(&Event::StepStarted { step, process });

        let required = self.graph.required_resources(process);
        let acquisition = self.attempt_acquisition(process, &required)?;

        match &acquisition {
            Acquisition::Completed { acquired } => {
                tracing::debug!(step, %process, acquired = acquired.len(), "process completed");
                reporter.report(&Event::ProcessCompleted {
                    step,
                    process,
                    acquired: acquired.clone(),
                });
            }
            Acquisition::Blocked { blocking, .. } => {
                tracing::debug!(step, %process, blocking = ?blocking, "process blocked");
                reporter.report(&Event::ProcessBlocked {
                    step,
                    process,
                    blocking: blocking.clone(),
                });
            }
        }

        let deadlock = self.detect_deadlock();
        if deadlock.deadlocked {
            self.sim_state.deadlocked_steps += 1;
        }
        reporter.report(&Event::DeadlockChecked {
            step,
            report: deadlock.clone(),
        });
        reporter.report(&Event::StateSnapshot {
            step,
            snapshot: self.snapshot(),
        });

        Ok(Some(StepOutcome {
            step,
            process,
            acquisition,
            deadlock,
        }))
    }

    /// All-or-nothing acquisition of `required` for `process`.
    fn attempt_acquisition(
        &mut self,
        process: ProcessId,
        required: &[ResourceId],
    ) -> Result<Acquisition, GraphError> {
        let (blocking, pending): (Vec<ResourceId>, Vec<ResourceId>) = required
            .iter()
            .partition(|&&r| self.graph.is_allocated(r));

        if !blocking.is_empty() {
            for &resource in required {
                let status = if self.graph.is_allocated(resource) {
                    EdgeStatus::Blocked
                } else {
                    EdgeStatus::Requested
                };
                self.graph.set_request_status(process, resource, status)?;
            }
            return Ok(Acquisition::Blocked { blocking, pending });
        }

        for &resource in required {
            self.graph
                .set_request_status(process, resource, EdgeStatus::Acquired)?;
            self.graph.allocate(resource)?;
        }
        self.graph.complete(process)?;
        Ok(Acquisition::Completed {
            acquired: required.to_vec(),
        })
    }

    /// Run the remaining pass to the end.
    ///
    /// Emits the initial state first when no step has run yet, and
    /// [`Event::PassFinished`] last.
    pub fn run<R: Reporter + ?Sized>(&mut self, reporter: &mut R) -> Result<RunSummary, GraphError> {
        if self.sim_state.step == 0 {
            self.report_initial_state(reporter);
        }
        while self.step(reporter)?.is_some() {}

        let summary = self.summary();
        tracing::info!(
            steps = summary.steps,
            completed = summary.completed.len(),
            blocked = summary.blocked.len(),
            deadlocked_steps = summary.deadlocked_steps,
            "pass finished"
        );
        reporter.report(&Event::PassFinished {
            summary: summary.clone(),
        });
        Ok(summary)
    }

    /// Summary of the pass so far. Processes that have not run yet count as
    /// neither completed nor blocked.
    pub fn summary(&self) -> RunSummary {
        let ran = &self.order[..self.cursor];
        let mut completed = Vec::new();
        let mut blocked = Vec::new();
        for proc in self.graph.processes() {
            if proc.is_completed() {
                completed.push(proc.id);
            } else if ran.contains(&proc.id) {
                blocked.push(proc.id);
            }
        }
        RunSummary {
            steps: self.sim_state.step,
            completed,
            blocked,
            deadlocked_steps: self.sim_state.deadlocked_steps,
            state_hash: self.state_hash(),
        }
    }

    // -----------------------------------------------------------------------
    // State hash
    // -----------------------------------------------------------------------

    /// Deterministic hash over node flags, edges and the step counter.
    pub fn state_hash(&self) -> u64 {
        let mut h = StateHash::new();
        h.write_u64(self.sim_state.step);
        for res in self.graph.resources() {
            h.write_u32(res.id.0);
            h.write_u8(res.is_allocated() as u8);
        }
        for proc in self.graph.processes() {
            h.write_u32(proc.id.0);
            h.write_u8(proc.is_completed() as u8);
        }
        for (_, edge) in self.graph.edges() {
            hash_node(&mut h, edge.from);
            hash_node(&mut h, edge.to);
            h.write_u8(match edge.kind {
                EdgeKind::Assignment => 0,
                EdgeKind::Request => 1,
            });
            h.write_u8(edge.status as u8);
        }
        h.finish()
    }
}

fn hash_node(h: &mut StateHash, node: NodeRef) {
    match node {
        NodeRef::Process(p) => {
            h.write_u8(b'P');
            h.write_u32(p.0);
        }
        NodeRef::Resource(r) => {
            h.write_u8(b'R');
            h.write_u32(r.0);
        }
    }
}

/// Processes sorted by ascending request count, ties in creation order.
pub fn execution_order(graph: &ResourceGraph) -> Vec<ProcessId> {
    let mut order: Vec<ProcessId> = graph.processes().iter().map(|p| p.id).collect();
    order.sort_by_key(|&p| graph.request_count(p));
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventKind, NullReporter};
    use crate::test_utils::*;

    #[test]
    fn order_by_request_count_then_id() {
        let graph = graph_with_requests(3, &[&[0, 1, 2], &[0], &[1, 2], &[2]]);
        assert_eq!(execution_order(&graph), vec![p(1), p(3), p(2), p(0)]);
    }

    #[test]
    fn acquisition_marks_edges_and_completes() {
        let mut sim = Simulation::new(graph_with_requests(2, &[&[0, 1]]));
        let outcome = sim.step(&mut NullReporter).unwrap().unwrap();
        assert_eq!(outcome.step, 1);
        assert_eq!(
            outcome.acquisition,
            Acquisition::Completed {
                acquired: vec![r(0), r(1)]
            }
        );
        assert!(sim.graph.is_completed(p(0)));
        assert!(sim.graph.is_allocated(r(0)));
        assert!(sim.graph.is_allocated(r(1)));
        assert!(
            sim.graph
                .edges()
                .all(|(_, e)| e.status == EdgeStatus::Acquired)
        );
    }

    #[test]
    fn blocked_marks_only_allocated_edges_blocked() {
        // P0 takes R0. P1 wants R1 then R0: R1 stays Requested, R0 Blocked.
        let mut sim = Simulation::new(graph_with_requests(2, &[&[0], &[1, 0]]));
        sim.step(&mut NullReporter).unwrap();
        let outcome = sim.step(&mut NullReporter).unwrap().unwrap();
        assert_eq!(outcome.process, p(1));
        assert_eq!(
            outcome.acquisition,
            Acquisition::Blocked {
                blocking: vec![r(0)],
                pending: vec![r(1)],
            }
        );
        let g = &sim.graph;
        let status = |from: ProcessId, to: ResourceId| {
            g.edge(g.edge_between(from.into(), to.into()).unwrap())
                .unwrap()
                .status
        };
        assert_eq!(status(p(1), r(0)), EdgeStatus::Blocked);
        assert_eq!(status(p(1), r(1)), EdgeStatus::Requested);
        assert!(!g.is_completed(p(1)));
        assert!(!g.is_allocated(r(1)));
    }

    #[test]
    fn blocked_process_is_never_retried() {
        let mut sim = Simulation::new(graph_with_requests(1, &[&[0], &[0], &[0]]));
        let summary = sim.run(&mut NullReporter).unwrap();
        assert_eq!(summary.steps, 3);
        assert_eq!(summary.completed, vec![p(0)]);
        assert_eq!(summary.blocked, vec![p(1), p(2)]);
        assert!(sim.is_finished());
        assert!(sim.step(&mut NullReporter).unwrap().is_none());
        assert_eq!(sim.sim_state.step, 3);
    }

    #[test]
    fn empty_requirement_completes_immediately() {
        let mut sim = Simulation::new(ResourceGraph::new(0, 2));
        let outcome = sim.step(&mut NullReporter).unwrap().unwrap();
        assert_eq!(outcome.acquisition, Acquisition::Completed { acquired: vec![] });
        assert!(sim.graph.is_completed(p(0)));
    }

    #[test]
    fn step_event_order() {
        let mut sim = Simulation::new(graph_with_requests(1, &[&[0]]));
        let mut events: Vec<Event> = Vec::new();
        sim.step(&mut events).unwrap();
        let kinds: Vec<EventKind> = events.iter().map(|e| e.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::StepStarted,
                EventKind::ProcessCompleted,
                EventKind::DeadlockChecked,
                EventKind::StateSnapshot,
            ]
        );
    }

    #[test]
    fn run_brackets_steps_with_initial_and_finished() {
        let (_, events) = run_recorded(graph_with_requests(1, &[&[0], &[0]]));
        assert_eq!(events.first().map(|e| e.kind()), Some(EventKind::InitialState));
        assert_eq!(events.last().map(|e| e.kind()), Some(EventKind::PassFinished));
        let steps = events
            .iter()
            .filter(|e| e.kind() == EventKind::StepStarted)
            .count();
        assert_eq!(steps, 2);
    }

    #[test]
    fn run_after_manual_step_skips_initial_state() {
        let mut sim = Simulation::new(graph_with_requests(1, &[&[0], &[0]]));
        sim.step(&mut NullReporter).unwrap();
        let mut events: Vec<Event> = Vec::new();
        let summary = sim.run(&mut events).unwrap();
        assert_eq!(summary.steps, 2);
        assert_eq!(events[0].kind(), EventKind::StepStarted);
    }

    #[test]
    fn summary_before_run_is_empty() {
        let sim = Simulation::new(graph_with_requests(1, &[&[0]]));
        let summary = sim.summary();
        assert_eq!(summary.steps, 0);
        assert!(summary.completed.is_empty());
        assert!(summary.blocked.is_empty());
    }

    #[test]
    fn state_hash_tracks_progress() {
        let mut sim = Simulation::new(graph_with_requests(1, &[&[0]]));
        let before = sim.state_hash();
        sim.step(&mut NullReporter).unwrap();
        assert_ne!(before, sim.state_hash());
    }

    #[test]
    fn generate_rejects_bad_config() {
        let config = GraphConfig::new(1, 1).with_max_requests(0);
        assert_eq!(
            Simulation::generate(config, &mut SimRng::new(1)).unwrap_err(),
            BuildError::Config(crate::builder::ConfigError::ZeroMaxRequests)
        );
    }

    #[test]
    fn copied_graph_runs_like_original() {
        let graph = graph_with_requests(2, &[&[0, 1], &[1]]);
        let mut original = Simulation::new(graph.clone());
        let mut copy = Simulation::new(graph);
        let a = original.run(&mut NullReporter).unwrap();
        let b = copy.run(&mut NullReporter).unwrap();
        assert_eq!(a, b);
        assert_eq!(b.completed, vec![p(1)]);
    }

    #[test]
    fn externally_allocated_resource_blocks() {
        let mut graph = graph_with_requests(1, &[&[0]]);
        graph.allocate(r(0)).unwrap();
        let mut sim = Simulation::new(graph);
        let outcome = sim.step(&mut NullReporter).unwrap().unwrap();
        assert!(!outcome.acquisition.is_completed());
    }

    #[test]
    fn completed_process_rerun_is_state_conflict() {
        let mut graph = graph_with_requests(0, &[&[]]);
        graph.complete(p(0)).unwrap();
        let mut sim = Simulation::new(graph);
        assert_eq!(
            sim.step(&mut NullReporter).unwrap_err(),
            GraphError::ProcessAlreadyCompleted(p(0))
        );
    }
}
