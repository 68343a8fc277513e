/// Fixed-size bitset used for cell domains and compiled adjacency
pub mod bitset;
/// Edge and layer restrictions applied before the first collapse
pub mod boundary;
/// Observe, collapse and propagate state machine over one grid
pub mod engine;
/// Run orchestration: batch, stepped, retried and parallel runs
pub mod executor;
/// Placement records read from collapsed grids
pub mod projection;
/// Work-queue constraint propagation
pub mod propagation;
/// Seeded cell and prototype selection
pub mod selection;
