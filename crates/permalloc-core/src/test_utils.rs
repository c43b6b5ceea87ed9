//! Shared test helpers for integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use crate::builder::{GraphBuilder, GraphConfig};
use crate::engine::Simulation;
use crate::event::Event;
use crate::graph::ResourceGraph;
use crate::id::*;
use crate::rng::SimRng;

// ===========================================================================
// Id shorthands
// ===========================================================================

pub fn p(i: u32) -> ProcessId {
    ProcessId(i)
}

pub fn r(i: u32) -> ResourceId {
    ResourceId(i)
}

// ===========================================================================
// Graph constructors
// ===========================================================================

/// Build a graph by hand: `requests[i]` lists the resource ids process `i`
/// requests, in edge order. No assignment edges are added.
pub fn graph_with_requests(resources: u32, requests: &[&[u32]]) -> ResourceGraph {
    let mut graph = ResourceGraph::new(resources, requests.len() as u32);
    for (i, wanted) in requests.iter().enumerate() {
        for &res in wanted.iter() {
            graph
                .add_request(ProcessId(i as u32), ResourceId(res))
                .expect("hand-built request edge");
        }
    }
    graph
}

/// Like [`graph_with_requests`], but also assigns `assignments[i]` to
/// process `i`.
pub fn graph_with_assignments(
    resources: u32,
    assignments: &[u32],
    requests: &[&[u32]],
) -> ResourceGraph {
    let mut graph = graph_with_requests(resources, requests);
    for (i, &res) in assignments.iter().enumerate() {
        graph
            .add_assignment(ResourceId(res), ProcessId(i as u32))
            .expect("hand-built assignment edge");
    }
    graph
}

/// Generate a random graph with the default request bound.
pub fn random_graph(resources: u32, processes: u32, seed: u64) -> ResourceGraph {
    GraphBuilder::new(GraphConfig::new(resources, processes))
        .expect("default config is valid")
        .build(&mut SimRng::new(seed))
        .expect("fresh graph accepts every drawn edge")
}

// ===========================================================================
// Running
// ===========================================================================

/// Run a full pass over `graph`, returning the finished simulation and the
/// recorded event trace.
pub fn run_recorded(graph: ResourceGraph) -> (Simulation, Vec<Event>) {
    let mut sim = Simulation::new(graph);
    let mut events = Vec::new();
    sim.run(&mut events).expect("single pass never conflicts");
    (sim, events)
}

/// Seeded end-to-end run: generate, simulate, record.
pub fn run_seeded(resources: u32, processes: u32, seed: u64) -> (Simulation, Vec<Event>) {
    run_recorded(random_graph(resources, processes, seed))
}
