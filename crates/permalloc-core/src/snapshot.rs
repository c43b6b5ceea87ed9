//! Read-only snapshots of graph state for reporters.
//!
//! All types are owned copies -- no references into the graph -- so a
//! reporter can keep, serialize or diff them freely.

use crate::graph::{EdgeKind, EdgeStatus, ResourceGraph};
use crate::id::{NodeRef, ProcessId, ResourceId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSnapshot {
    pub id: ResourceId,
    pub allocated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessSnapshot {
    pub id: ProcessId,
    pub completed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeSnapshot {
    pub from: NodeRef,
    pub to: NodeRef,
    pub kind: EdgeKind,
    pub status: EdgeStatus,
}

/// Full state of the graph at one moment: every resource, every process and
/// every edge, each in creation order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub resources: Vec<ResourceSnapshot>,
    pub processes: Vec<ProcessSnapshot>,
    pub edges: Vec<EdgeSnapshot>,
}

impl GraphSnapshot {
    pub fn capture(graph: &ResourceGraph) -> Self {
        Self {
            resources: graph
                .resources()
                .iter()
                .map(|r| ResourceSnapshot {
                    id: r.id,
                    allocated: r.is_allocated(),
                })
                .collect(),
            processes: graph
                .processes()
                .iter()
                .map(|p| ProcessSnapshot {
                    id: p.id,
                    completed: p.is_completed(),
                })
                .collect(),
            edges: graph
                .edges()
                .map(|(_, e)| EdgeSnapshot {
                    from: e.from,
                    to: e.to,
                    kind: e.kind,
                    status: e.status,
                })
                .collect(),
        }
    }

    pub fn allocated_count(&self) -> usize {
        self.resources.iter().filter(|r| r.allocated).count()
    }

    /// Edges currently in `status`.
    pub fn edges_with_status(&self, status: EdgeStatus) -> impl Iterator<Item = &EdgeSnapshot> {
        self.edges.iter().filter(move |e| e.status == status)
    }
}
