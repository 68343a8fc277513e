//! Solver constants and runtime configuration defaults

// Default values for configurable parameters
/// Fixed seed for reproducible generation
pub const DEFAULT_SEED: u64 = 42;

/// Default grid dimensions (x, y, z), y is vertical
pub const DEFAULT_GRID_SIZE: [usize; 3] = [8, 3, 8];

/// Prototype id standing for open space around the grid
pub const DEFAULT_VOID_PROTOTYPE: &str = "p-1";

/// Seeds tried per run before giving up on contradictions
pub const DEFAULT_MAX_ATTEMPTS: usize = 10;

/// Distance between cell origins when placing meshes
pub const DEFAULT_CELL_SPACING: f32 = 2.0;

// Safety limit to prevent excessive memory allocation
/// Maximum allowed grid dimension along any axis
pub const MAX_GRID_DIMENSION: usize = 512;
/// Maximum number of cells in one grid, each holding its own domain
pub const MAX_GRID_CELLS: usize = 1 << 21;

/// Entropies closer than this are treated as tied during cell selection
pub const ENTROPY_TIE_TOLERANCE: f64 = 1e-9;

// Progress bar display settings
/// Threshold for switching to batch progress mode
pub const MAX_INDIVIDUAL_PROGRESS_BARS: usize = 5;
/// Width of progress bars in characters
pub const PROGRESS_BAR_WIDTH: u16 = 30;

// Output settings
/// Suffix added to the catalog stem for the placement file
pub const OUTPUT_SUFFIX: &str = "_placements";
/// Suffix added to the catalog stem for the PNG preview
pub const PREVIEW_SUFFIX: &str = "_preview";
/// Suffix added to the catalog stem for the GIF visualization
pub const VISUALIZATION_SUFFIX: &str = "_visualization";
/// Side length in pixels of one grid column in preview images
pub const PREVIEW_CELL_PIXELS: u32 = 8;
/// Delay between GIF animation frames
pub const GIF_FRAME_DELAY_MS: u32 = 20;
/// Minimum frame delay that viewers reliably support (in milliseconds)
pub const VIEWER_MIN_FRAME_DELAY_MS: u32 = 50;
