//! Prototype definitions and the validated catalog built from them

/// JSON catalog loading
pub mod loader;
/// Prototype, rotation and layer tag types
pub mod prototype;
/// Validated catalog with compiled adjacency
pub mod store;

pub use prototype::{LayerConstraint, Prototype, PrototypeDef, Rotation};
pub use store::{Catalog, CatalogOptions, SymmetryPolicy};
