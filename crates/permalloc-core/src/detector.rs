//! Deadlock detection over a wait-for relation.
//!
//! The wait-for relation maps every incomplete process to the allocated
//! resources it still requires. To walk from a resource to the process
//! holding it, the owner is taken to be the first completed process (in
//! creation order) whose request edges include that resource. Assignment
//! edges are never consulted.
//!
//! Because owners are always completed and completed processes never wait,
//! the stock owner rule cannot close a cycle on graphs produced by the
//! engine. [`WaitForGraph::find_cycle`] accepts any owner resolver, which is
//! how the traversal itself is exercised.
//!
//! The check is advisory: the engine reports it but never acts on it.

use crate::graph::ResourceGraph;
use crate::id::{ProcessId, ResourceId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Outcome of one deadlock check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadlockReport {
    pub deadlocked: bool,
    /// Processes on the circular wait, in traversal order. Empty when
    /// `deadlocked` is false.
    pub cycle: Vec<ProcessId>,
}

impl DeadlockReport {
    fn from_cycle(cycle: Option<Vec<ProcessId>>) -> Self {
        match cycle {
            Some(cycle) => Self {
                deadlocked: true,
                cycle,
            },
            None => Self::default(),
        }
    }
}

/// Incomplete process -> allocated resources it is waiting on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WaitForGraph {
    waits: BTreeMap<ProcessId, Vec<ResourceId>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Visited,
}

struct Frame {
    process: ProcessId,
    next: usize,
}

impl WaitForGraph {
    /// Derive the wait-for relation from the current allocation state.
    pub fn from_graph(graph: &ResourceGraph) -> Self {
        let mut waits = BTreeMap::new();
        for proc in graph.processes().iter().filter(|p| !p.is_completed()) {
            let waiting: Vec<ResourceId> = graph
                .required_resources(proc.id)
                .into_iter()
                .filter(|&r| graph.is_allocated(r))
                .collect();
            if !waiting.is_empty() {
                waits.insert(proc.id, waiting);
            }
        }
        Self { waits }
    }

    /// Record that `process` waits on `resources`. An empty list removes it.
    pub fn insert(&mut self, process: ProcessId, resources: Vec<ResourceId>) {
        if resources.is_empty() {
            self.waits.remove(&process);
        } else {
            self.waits.insert(process, resources);
        }
    }

    pub fn len(&self) -> usize {
        self.waits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waits.is_empty()
    }

    pub fn contains(&self, process: ProcessId) -> bool {
        self.waits.contains_key(&process)
    }

    /// Resources `process` waits on; empty if it is not waiting.
    pub fn waiting_on(&self, process: ProcessId) -> &[ResourceId] {
        self.waits.get(&process).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Waiting processes in ascending id order.
    pub fn processes(&self) -> impl Iterator<Item = ProcessId> + '_ {
        self.waits.keys().copied()
    }

    /// Depth-first cycle search with an explicit stack.
    ///
    /// From each waiting process, every resource it waits on is resolved to
    /// an owner with `owner_of`; the search continues into that owner. An
    /// owner already on the stack closes a cycle. Unresolvable resources end
    /// their branch. Returns the processes on the first cycle found.
    pub fn find_cycle<F>(&self, mut owner_of: F) -> Option<Vec<ProcessId>>
    where
        F: FnMut(ResourceId) -> Option<ProcessId>,
    {
        let mut marks: HashMap<ProcessId, Mark> = HashMap::new();
        let mut stack: Vec<Frame> = Vec::new();

        for start in self.processes() {
            if marks.contains_key(&start) {
                continue;
            }
            marks.insert(start, Mark::Visiting);
            stack.push(Frame {
                process: start,
                next: 0,
            });

            while let Some(frame) = stack.last_mut() {
                let waiting = self.waiting_on(frame.process);
                let Some(&resource) = waiting.get(frame.next) else {
                    marks.insert(frame.process, Mark::Visited);
                    stack.pop();
                    continue;
                };
                frame.next += 1;

                let Some(owner) = owner_of(resource) else {
                    continue;
                };
                match marks.get(&owner) {
                    Some(Mark::Visiting) => {
                        let from = stack
                            .iter()
                            .position(|f| f.process == owner)
                            .unwrap_or(0);
                        return Some(stack[from..].iter().map(|f| f.process).collect());
                    }
                    Some(Mark::Visited) => {}
                    None => {
                        marks.insert(owner, Mark::Visiting);
                        stack.push(Frame {
                            process: owner,
                            next: 0,
                        });
                    }
                }
            }
        }
        None
    }
}

/// Resource -> owning process under the completed-requester rule.
///
/// Walks completed processes in creation order; the first one whose request
/// edges include a resource owns it.
pub fn resource_owners(graph: &ResourceGraph) -> HashMap<ResourceId, ProcessId> {
    let mut owners = HashMap::new();
    for proc in graph.processes().iter().filter(|p| p.is_completed()) {
        for resource in graph.required_resources(proc.id) {
            owners.entry(resource).or_insert(proc.id);
        }
    }
    owners
}

/// The owner of a single resource, if any.
pub fn resolve_owner(graph: &ResourceGraph, resource: ResourceId) -> Option<ProcessId> {
    graph
        .processes()
        .iter()
        .filter(|p| p.is_completed())
        .find(|p| graph.required_resources(p.id).contains(&resource))
        .map(|p| p.id)
}

/// Check the current state of `graph` for a circular wait.
pub fn detect(graph: &ResourceGraph) -> DeadlockReport {
    let wait_for = WaitForGraph::from_graph(graph);
    if wait_for.is_empty() {
        return DeadlockReport::default();
    }
    let owners = resource_owners(graph);
    let report = DeadlockReport::from_cycle(wait_for.find_cycle(|r| owners.get(&r).copied()));
    if report.deadlocked {
        tracing::warn!(cycle = ?report.cycle, "circular wait detected");
    }
    report
}
