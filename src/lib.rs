//! Constraint-propagating wave function collapse over a 3D grid of tile prototypes
//!
//! A catalog of prototypes (mesh, rotation, weight and per-face neighbour
//! lists) is solved into one prototype per grid cell. Each step collapses the
//! lowest-entropy cell by a weighted draw and propagates the adjacency
//! constraints to a fixed point; runs are reproducible from their seed.

#![forbid(unsafe_code)]

/// Solver core: domains, boundary pass, propagation, engine and run driver
pub mod algorithm;
/// Prototype definitions and catalog loading
pub mod catalog;
/// Input/output operations and error handling
pub mod io;
/// Entropy and weighted sampling
pub mod math;
/// Grid storage and neighbour directions
pub mod spatial;

pub use io::error::{Result, WfcError};
