//! Spatial data structures for the 3D solver grid
//!
//! This module contains:
//! - The six neighbour directions and their data-format ordering
//! - Grid storage, coordinates and bounds-checked access

/// Neighbour directions
pub mod direction;
/// Grid storage and addressing
pub mod grid;

pub use direction::Direction;
pub use grid::{Cell, Coord, Grid, GridSize};
