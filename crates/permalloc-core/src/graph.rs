use crate::id::*;
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use std::collections::HashMap;
use std::fmt;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur during graph operations.
///
/// The two state-conflict variants are invariant violations: the single-pass
/// engine never allocates or completes twice, so seeing one means a bug.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("resource {0} is already allocated")]
    ResourceAlreadyAllocated(ResourceId),
    #[error("process {0} is already completed")]
    ProcessAlreadyCompleted(ProcessId),
    #[error("process not found: {0}")]
    UnknownProcess(ProcessId),
    #[error("resource not found: {0}")]
    UnknownResource(ResourceId),
    #[error("edge {from} -> {to} already exists")]
    DuplicateEdge { from: NodeRef, to: NodeRef },
    #[error("process {0} already has an assignment edge")]
    AlreadyAssigned(ProcessId),
    #[error("process {process} has no request edge to {resource}")]
    MissingRequestEdge {
        process: ProcessId,
        resource: ResourceId,
    },
}

// ---------------------------------------------------------------------------
// Nodes
// ---------------------------------------------------------------------------

/// A process node. `completed` flips false -> true at most once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Process {
    pub id: ProcessId,
    completed: bool,
}

impl Process {
    pub fn new(id: ProcessId) -> Self {
        Self {
            id,
            completed: false,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Mark the process as completed.
    pub fn mark_completed(&mut self) -> Result<(), GraphError> {
        if self.completed {
            return Err(GraphError::ProcessAlreadyCompleted(self.id));
        }
        self.completed = true;
        Ok(())
    }
}

/// A resource node. Allocation is permanent: `allocated` never returns to
/// false within a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub id: ResourceId,
    allocated: bool,
}

impl Resource {
    pub fn new(id: ResourceId) -> Self {
        Self {
            id,
            allocated: false,
        }
    }

    pub fn is_allocated(&self) -> bool {
        self.allocated
    }

    /// Allocate the resource.
    pub fn allocate(&mut self) -> Result<(), GraphError> {
        if self.allocated {
            return Err(GraphError::ResourceAlreadyAllocated(self.id));
        }
        self.allocated = true;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Edges
// ---------------------------------------------------------------------------

/// What an edge records. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    /// Resource -> process, recorded at build time.
    Assignment,
    /// Process -> resource the process needs to complete.
    Request,
}

/// Current state of an edge. Only this changes during simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeStatus {
    Assigned,
    Requested,
    Acquired,
    Blocked,
}

impl EdgeKind {
    /// Status a freshly created edge of this kind starts in.
    pub fn initial_status(self) -> EdgeStatus {
        match self {
            EdgeKind::Assignment => EdgeStatus::Assigned,
            EdgeKind::Request => EdgeStatus::Requested,
        }
    }
}

impl fmt::Display for EdgeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EdgeStatus::Assigned => "ASSIGNED",
            EdgeStatus::Requested => "REQUESTED",
            EdgeStatus::Acquired => "ACQUIRED",
            EdgeStatus::Blocked => "BLOCKED",
        };
        f.write_str(s)
    }
}

/// Per-edge data stored in the resource graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub from: NodeRef,
    pub to: NodeRef,
    pub kind: EdgeKind,
    pub status: EdgeStatus,
}

/// Edge lists for a single process.
#[derive(Debug, Clone, Default)]
struct ProcessAdjacency {
    /// Incoming assignment edge (resource -> process), if any.
    assignment: Option<EdgeId>,
    /// Outgoing request edges in insertion order.
    requests: Vec<EdgeId>,
}

// ---------------------------------------------------------------------------
// ResourceGraph
// ---------------------------------------------------------------------------

/// The resource allocation graph: a fixed set of processes and resources
/// joined by an append-only list of typed edges.
///
/// Nodes are stored densely by id. Edges live in a `SlotMap`; since nothing
/// is ever removed, slot order is insertion order. The graph lives for one
/// run only; reporters see [`GraphSnapshot`](crate::snapshot::GraphSnapshot)s.
#[derive(Debug, Clone)]
pub struct ResourceGraph {
    processes: Vec<Process>,
    resources: Vec<Resource>,
    edges: SlotMap<EdgeId, Edge>,
    adjacency: Vec<ProcessAdjacency>,
    /// (from, to) -> edge, for duplicate checks and status updates.
    index: HashMap<(NodeRef, NodeRef), EdgeId>,
}

impl ResourceGraph {
    /// Create a graph with `resource_count` resources and `process_count`
    /// processes and no edges.
    pub fn new(resource_count: u32, process_count: u32) -> Self {
        Self {
            processes: (0..process_count).map(|i| Process::new(ProcessId(i))).collect(),
            resources: (0..resource_count)
                .map(|i| Resource::new(ResourceId(i)))
                .collect(),
            edges: SlotMap::with_key(),
            adjacency: vec![ProcessAdjacency::default(); process_count as usize],
            index: HashMap::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------------

    /// Add an assignment edge `resource -> process`.
    pub fn add_assignment(
        &mut self,
        resource: ResourceId,
        process: ProcessId,
    ) -> Result<EdgeId, GraphError> {
        self.check_resource(resource)?;
        self.check_process(process)?;
        if self.adjacency[process.index()].assignment.is_some() {
            return Err(GraphError::AlreadyAssigned(process));
        }
        let edge = self.insert_edge(resource.into(), process.into(), EdgeKind::Assignment)?;
        self.adjacency[process.index()].assignment = Some(edge);
        Ok(edge)
    }

    /// Add a request edge `process -> resource`.
    pub fn add_request(
        &mut self,
        process: ProcessId,
        resource: ResourceId,
    ) -> Result<EdgeId, GraphError> {
        self.check_process(process)?;
        self.check_resource(resource)?;
        let edge = self.insert_edge(process.into(), resource.into(), EdgeKind::Request)?;
        self.adjacency[process.index()].requests.push(edge);
        Ok(edge)
    }

    fn insert_edge(
        &mut self,
        from: NodeRef,
        to: NodeRef,
        kind: EdgeKind,
    ) -> Result<EdgeId, GraphError> {
        if self.has_edge(from, to) {
            return Err(GraphError::DuplicateEdge { from, to });
        }
        let edge = self.edges.insert(Edge {
            from,
            to,
            kind,
            status: kind.initial_status(),
        });
        self.index.insert((from, to), edge);
        tracing::trace!(%from, %to, ?kind, "edge added");
        Ok(edge)
    }

    fn check_process(&self, process: ProcessId) -> Result<(), GraphError> {
        if process.index() < self.processes.len() {
            Ok(())
        } else {
            Err(GraphError::UnknownProcess(process))
        }
    }

    fn check_resource(&self, resource: ResourceId) -> Result<(), GraphError> {
        if resource.index() < self.resources.len() {
            Ok(())
        } else {
            Err(GraphError::UnknownResource(resource))
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn process_count(&self) -> usize {
        self.processes.len()
    }

    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Processes in creation order.
    pub fn processes(&self) -> &[Process] {
        &self.processes
    }

    /// Resources in creation order.
    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    /// Edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &Edge)> {
        self.edges.iter()
    }

    pub fn process(&self, id: ProcessId) -> Option<&Process> {
        self.processes.get(id.index())
    }

    pub fn resource(&self, id: ResourceId) -> Option<&Resource> {
        self.resources.get(id.index())
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id)
    }

    pub fn is_completed(&self, process: ProcessId) -> bool {
        self.process(process).is_some_and(Process::is_completed)
    }

    pub fn is_allocated(&self, resource: ResourceId) -> bool {
        self.resource(resource).is_some_and(Resource::is_allocated)
    }

    /// Whether any edge (of either kind) joins `from` to `to`.
    pub fn has_edge(&self, from: NodeRef, to: NodeRef) -> bool {
        self.index.contains_key(&(from, to))
    }

    pub fn edge_between(&self, from: NodeRef, to: NodeRef) -> Option<EdgeId> {
        self.index.get(&(from, to)).copied()
    }

    /// Destinations of the process's request edges, in insertion order.
    pub fn required_resources(&self, process: ProcessId) -> Vec<ResourceId> {
        let Some(adj) = self.adjacency.get(process.index()) else {
            return Vec::new();
        };
        adj.requests
            .iter()
            .filter_map(|&e| self.edges.get(e))
            .filter_map(|edge| edge.to.as_resource())
            .collect()
    }

    /// Number of request edges leaving the process.
    pub fn request_count(&self, process: ProcessId) -> usize {
        self.adjacency
            .get(process.index())
            .map_or(0, |adj| adj.requests.len())
    }

    /// The resource on the process's assignment edge, if it has one.
    pub fn assigned_resource(&self, process: ProcessId) -> Option<ResourceId> {
        let edge = self.adjacency.get(process.index())?.assignment?;
        self.edges.get(edge)?.from.as_resource()
    }

    // -----------------------------------------------------------------------
    // Simulation-time mutation
    // -----------------------------------------------------------------------

    /// Allocate a resource. Fails if it is unknown or already allocated.
    pub fn allocate(&mut self, resource: ResourceId) -> Result<(), GraphError> {
        self.resources
            .get_mut(resource.index())
            .ok_or(GraphError::UnknownResource(resource))?
            .allocate()
    }

    /// Mark a process completed. Fails if it is unknown or already completed.
    pub fn complete(&mut self, process: ProcessId) -> Result<(), GraphError> {
        self.processes
            .get_mut(process.index())
            .ok_or(GraphError::UnknownProcess(process))?
            .mark_completed()
    }

    /// Set the status of the request edge `process -> resource`.
    pub fn set_request_status(
        &mut self,
        process: ProcessId,
        resource: ResourceId,
        status: EdgeStatus,
    ) -> Result<(), GraphError> {
        let missing = GraphError::MissingRequestEdge { process, resource };
        let id = self
            .edge_between(process.into(), resource.into())
            .ok_or_else(|| missing.clone())?;
        match self.edges.get_mut(id) {
            Some(edge) if edge.kind == EdgeKind::Request => {
                edge.status = status;
                Ok(())
            }
            _ => Err(missing),
        }
    }
}
