use serde::{Deserialize, Serialize};
use slotmap::new_key_type;
use std::fmt;

new_key_type! {
    /// Identifies an edge in the resource graph.
    pub struct EdgeId;
}

/// Identifies a process node. Ids are dense, `0..process_count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProcessId(pub u32);

/// Identifies a resource node. Ids are dense, `0..resource_count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResourceId(pub u32);

impl ProcessId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl ResourceId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}", self.0)
    }
}

/// A node in the resource graph: either a process or a resource.
///
/// Identity is the pair (variant, id), so `Process(0)` and `Resource(0)` are
/// distinct nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NodeRef {
    Process(ProcessId),
    Resource(ResourceId),
}

impl NodeRef {
    pub fn as_process(self) -> Option<ProcessId> {
        match self {
            NodeRef::Process(p) => Some(p),
            NodeRef::Resource(_) => None,
        }
    }

    pub fn as_resource(self) -> Option<ResourceId> {
        match self {
            NodeRef::Resource(r) => Some(r),
            NodeRef::Process(_) => None,
        }
    }
}

impl From<ProcessId> for NodeRef {
    fn from(p: ProcessId) -> Self {
        NodeRef::Process(p)
    }
}

impl From<ResourceId> for NodeRef {
    fn from(r: ResourceId) -> Self {
        NodeRef::Resource(r)
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeRef::Process(p) => p.fmt(f),
            NodeRef::Resource(r) => r.fmt(f),
        }
    }
}
