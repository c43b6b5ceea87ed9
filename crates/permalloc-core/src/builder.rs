//! Random topology generation.
//!
//! Builds a [`ResourceGraph`] from a [`GraphConfig`] and an explicitly passed
//! [`SimRng`]. The draw sequence is fixed, so a seed reproduces the same edge
//! set on every platform:
//!
//! 1. one assignment draw per process (skipped entirely when there are no
//!    resources),
//! 2. per process, one draw for the request count `k` in `1..=max_requests`
//!    followed by `k` resource draws. Draws that repeat an existing pair are
//!    dropped, so the realized request count may be lower than `k`.

use crate::graph::{GraphError, ResourceGraph};
use crate::id::{ProcessId, ResourceId};
use crate::rng::SimRng;
use serde::{Deserialize, Serialize};

/// Default upper bound for the per-process request draw.
pub const DEFAULT_MAX_REQUESTS: u32 = 3;

/// Largest accepted `max_requests`. Each process performs up to this many
/// resource draws.
pub const MAX_REQUESTS_LIMIT: u32 = 1024;

/// Errors from validating a [`GraphConfig`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("max_requests must be at least 1")]
    ZeroMaxRequests,
    #[error("max_requests {max_requests} exceeds the limit of {MAX_REQUESTS_LIMIT}")]
    TooManyRequests { max_requests: u32 },
}

/// Errors from generating a graph.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The builder produced an edge the graph refused. A builder bug.
    #[error("graph construction failed: {0}")]
    Graph(#[from] GraphError),
}

/// Sizes and limits for a generated graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Number of resource nodes.
    pub resources: u32,
    /// Number of process nodes.
    pub processes: u32,
    /// Upper bound of the request-count draw.
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,
}

fn default_max_requests() -> u32 {
    DEFAULT_MAX_REQUESTS
}

impl GraphConfig {
    pub fn new(resources: u32, processes: u32) -> Self {
        Self {
            resources,
            processes,
            max_requests: DEFAULT_MAX_REQUESTS,
        }
    }

    pub fn with_max_requests(mut self, max_requests: u32) -> Self {
        self.max_requests = max_requests;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_requests == 0 {
            return Err(ConfigError::ZeroMaxRequests);
        }
        if self.max_requests > MAX_REQUESTS_LIMIT {
            return Err(ConfigError::TooManyRequests {
                max_requests: self.max_requests,
            });
        }
        Ok(())
    }
}

/// Generates random process/resource topologies.
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    config: GraphConfig,
}

impl GraphBuilder {
    /// Create a builder. Fails if the config is invalid.
    pub fn new(config: GraphConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Build a fully populated graph, drawing from `rng`.
    pub fn build(&self, rng: &mut SimRng) -> Result<ResourceGraph, GraphError> {
        let GraphConfig {
            resources,
            processes,
            max_requests,
        } = self.config;
        let mut graph = ResourceGraph::new(resources, processes);

        if resources > 0 {
            for i in 0..processes {
                let resource = ResourceId(rng.below(resources));
                graph.add_assignment(resource, ProcessId(i))?;
            }
        }

        for i in 0..processes {
            let process = ProcessId(i);
            let wanted = rng.range_inclusive(1, max_requests);
            if resources == 0 {
                continue;
            }
            for _ in 0..wanted {
                let resource = ResourceId(rng.below(resources));
                if graph.has_edge(process.into(), resource.into()) {
                    continue;
                }
                graph.add_request(process, resource)?;
            }
            tracing::trace!(
                %process,
                wanted,
                realized = graph.request_count(process),
                "requests drawn"
            );
        }

        tracing::debug!(
            resources,
            processes,
            edges = graph.edge_count(),
            "resource graph built"
        );
        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{EdgeKind, EdgeStatus};
    use crate::id::NodeRef;
    use std::collections::HashSet;

    fn build(resources: u32, processes: u32, seed: u64) -> ResourceGraph {
        GraphBuilder::new(GraphConfig::new(resources, processes))
            .unwrap()
            .build(&mut SimRng::new(seed))
            .unwrap()
    }

    #[test]
    fn zero_max_requests_rejected() {
        let config = GraphConfig::new(2, 2).with_max_requests(0);
        assert_eq!(
            GraphBuilder::new(config).unwrap_err(),
            ConfigError::ZeroMaxRequests
        );
    }

    #[test]
    fn oversized_max_requests_rejected() {
        let config = GraphConfig::new(3, 1).with_max_requests(4_000_000_000);
        assert_eq!(
            config.validate().unwrap_err(),
            ConfigError::TooManyRequests {
                max_requests: 4_000_000_000
            }
        );
        let at_limit = GraphConfig::new(3, 1).with_max_requests(MAX_REQUESTS_LIMIT);
        assert!(GraphBuilder::new(at_limit).is_ok());
    }

    #[test]
    fn build_at_limit_keeps_requests_distinct() {
        let config = GraphConfig::new(3, 4).with_max_requests(MAX_REQUESTS_LIMIT);
        let graph = GraphBuilder::new(config)
            .unwrap()
            .build(&mut SimRng::new(8))
            .unwrap();
        for proc in graph.processes() {
            assert!(graph.request_count(proc.id) <= 3);
        }
    }

    #[test]
    fn creates_dense_node_ids() {
        let graph = build(4, 3, 1);
        let rids: Vec<u32> = graph.resources().iter().map(|r| r.id.0).collect();
        let pids: Vec<u32> = graph.processes().iter().map(|p| p.id.0).collect();
        assert_eq!(rids, vec![0, 1, 2, 3]);
        assert_eq!(pids, vec![0, 1, 2]);
    }

    #[test]
    fn every_process_gets_one_assignment() {
        let graph = build(5, 20, 42);
        for proc in graph.processes() {
            assert!(graph.assigned_resource(proc.id).is_some());
        }
        let assignments = graph
            .edges()
            .filter(|(_, e)| e.kind == EdgeKind::Assignment)
            .count();
        assert_eq!(assignments, 20);
    }

    #[test]
    fn request_counts_within_bounds() {
        let graph = build(10, 50, 7);
        for proc in graph.processes() {
            let n = graph.request_count(proc.id);
            assert!((1..=3).contains(&n), "{} has {n} requests", proc.id);
        }
    }

    #[test]
    fn single_resource_caps_requests_at_one() {
        let graph = build(1, 10, 3);
        for proc in graph.processes() {
            assert_eq!(graph.request_count(proc.id), 1);
        }
    }

    #[test]
    fn no_duplicate_pairs() {
        let graph = build(3, 40, 11);
        let mut seen = HashSet::new();
        for (_, edge) in graph.edges() {
            assert!(seen.insert((edge.from, edge.to)), "duplicate {edge:?}");
        }
    }

    #[test]
    fn edges_start_in_initial_status() {
        let graph = build(6, 6, 5);
        for (_, edge) in graph.edges() {
            assert_eq!(edge.status, edge.kind.initial_status());
            match edge.kind {
                EdgeKind::Assignment => {
                    assert!(matches!(edge.from, NodeRef::Resource(_)));
                    assert_eq!(edge.status, EdgeStatus::Assigned);
                }
                EdgeKind::Request => {
                    assert!(matches!(edge.from, NodeRef::Process(_)));
                    assert_eq!(edge.status, EdgeStatus::Requested);
                }
            }
        }
    }

    #[test]
    fn zero_resources_yields_edge_free_graph() {
        let graph = build(0, 5, 9);
        assert_eq!(graph.process_count(), 5);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn zero_processes_yields_resources_only() {
        let graph = build(4, 0, 9);
        assert_eq!(graph.resource_count(), 4);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn same_seed_same_edges() {
        let a = build(8, 12, 2024);
        let b = build(8, 12, 2024);
        let ea: Vec<_> = a.edges().map(|(_, e)| e.clone()).collect();
        let eb: Vec<_> = b.edges().map(|(_, e)| e.clone()).collect();
        assert_eq!(ea, eb);
    }

    #[test]
    fn request_count_draw_consumed_without_resources() {
        // With zero resources the k draw still happens, once per process.
        let mut rng = SimRng::new(17);
        GraphBuilder::new(GraphConfig::new(0, 4))
            .unwrap()
            .build(&mut rng)
            .unwrap();
        let mut expected = SimRng::new(17);
        for _ in 0..4 {
            expected.next_u64();
        }
        assert_eq!(rng, expected);
    }
}
