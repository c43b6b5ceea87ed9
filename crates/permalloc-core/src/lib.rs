//! Permalloc Core -- a permanent resource allocation simulator with deadlock
//! detection.
//!
//! Processes request resources; once a resource is allocated it is never
//! released. The engine runs a single ordered pass over all processes and,
//! after every step, checks the current allocation state for a circular wait.
//!
//! # Pass Pipeline
//!
//! A [`engine::Simulation`] owns the [`graph::ResourceGraph`] and a step
//! counter. Each call to [`engine::Simulation::step`] executes the next
//! process in the execution order:
//!
//! 1. **Collect** -- gather the destinations of the process's request edges.
//! 2. **Acquire** -- all-or-nothing acquisition against the allocated flags.
//! 3. **Update** -- mark request edges Acquired, or Blocked/Requested.
//! 4. **Detect** -- build the wait-for relation and search for a cycle.
//! 5. **Report** -- hand events and a full snapshot to the [`event::Reporter`].
//!
//! # Key Types
//!
//! - [`graph::ResourceGraph`] -- processes, resources and typed edges.
//! - [`builder::GraphBuilder`] -- seeded random topology generation.
//! - [`detector::WaitForGraph`] -- wait-for relation and cycle search.
//! - [`engine::Simulation`] -- execution order and per-step acquisition.
//! - [`rng::SimRng`] -- SplitMix64, deterministic across platforms.
//! - [`snapshot::GraphSnapshot`] -- owned, read-only view for reporters.

pub mod builder;
pub mod detector;
pub mod engine;
pub mod event;
pub mod graph;
pub mod id;
pub mod rng;
pub mod sim;
pub mod snapshot;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
