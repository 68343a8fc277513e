//! Top-down PNG previews of solved grids
//!
//! Each `(x, z)` column becomes one square of `PREVIEW_CELL_PIXELS` pixels,
//! coloured by the highest non-void prototype in that column and shaded
//! brighter the higher it sits.

use image::{Rgba, RgbaImage};
use std::path::Path;

use crate::algorithm::projection::PlacementRecord;
use crate::catalog::Catalog;
use crate::io::configuration::PREVIEW_CELL_PIXELS;
use crate::io::error::{Result, WfcError, invalid_parameter};
use crate::spatial::grid::{Coord, GridSize};

const TRANSPARENT: [u8; 4] = [0, 0, 0, 0];

/// Colour per catalog index, derived from mesh names
///
/// Prototypes sharing a mesh share a colour, so rotated variants read as
/// one material in previews.
#[derive(Clone, Debug)]
pub struct Palette {
    colors: Vec<[u8; 4]>,
    void: Option<usize>,
    empty_color: [u8; 4],
}

impl Palette {
    /// Build the palette for a catalog, leaving the void prototype transparent
    pub fn from_catalog(catalog: &Catalog, void_id: &str) -> Self {
        let void = catalog.index_of(void_id);
        let colors: Vec<[u8; 4]> = catalog
            .iter()
            .map(|prototype| mesh_color(prototype.mesh_name()))
            .collect();

        // Undecided columns use the average of all solid colours
        let solid: Vec<&[u8; 4]> = colors
            .iter()
            .enumerate()
            .filter(|&(index, _)| Some(index) != void)
            .map(|(_, color)| color)
            .collect();
        let empty_color = if solid.is_empty() {
            [128, 128, 128, 255]
        } else {
            let count = solid.len() as u32;
            let mut sums = [0_u32; 3];
            for color in &solid {
                for (sum, &channel) in sums.iter_mut().zip(color.iter()) {
                    *sum += u32::from(channel);
                }
            }
            let [r, g, b] = sums.map(|sum| (sum / count) as u8);
            [r, g, b, 96]
        };

        Self {
            colors,
            void,
            empty_color,
        }
    }

    /// Colour of a catalog index, `None` for unknown indices
    pub fn color(&self, index: usize) -> Option<[u8; 4]> {
        if self.is_void(index) {
            return Some(TRANSPARENT);
        }
        self.colors.get(index).copied()
    }

    /// The index is the void prototype
    pub fn is_void(&self, index: usize) -> bool {
        self.void == Some(index)
    }

    /// Colour used for columns with nothing decided yet
    pub const fn empty_color(&self) -> [u8; 4] {
        self.empty_color
    }
}

/// Stable colour from a mesh name using an FNV-1a hash
fn mesh_color(mesh_name: &str) -> [u8; 4] {
    let hash = mesh_name
        .bytes()
        .fold(0xcbf2_9ce4_8422_2325_u64, |hash, byte| {
            (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
        });
    let [r, g, b, ..] = hash.to_le_bytes();
    // Keep colours away from black so shading stays visible
    [64 + r % 192, 64 + g % 192, 64 + b % 192, 255]
}

/// What a column shows: its highest solid prototype and that cell's layer
pub type Column = Option<(usize, usize)>;

/// Column contents for a grid given a prototype per cell in flat order
///
/// `cells[x + y * size.x + z * size.x * size.y]` holds the collapsed
/// prototype of each cell, `None` while undecided.
pub fn top_down_columns(size: GridSize, cells: &[Option<usize>], palette: &Palette) -> Vec<Column> {
    let mut columns = vec![None; size.x * size.z];
    for (index, cell) in cells.iter().enumerate() {
        let Some(prototype) = *cell else {
            continue;
        };
        if palette.is_void(prototype) {
            continue;
        }
        let x = index % size.x;
        let y = (index / size.x) % size.y;
        let z = index / (size.x * size.y);
        if let Some(column) = columns.get_mut(x + z * size.x)
            && column.is_none_or(|(_, top)| y >= top)
        {
            *column = Some((prototype, y));
        }
    }
    columns
}

/// Flat per-cell prototypes from placement records
pub fn cells_from_placements(size: GridSize, placements: &[PlacementRecord]) -> Vec<Option<usize>> {
    let mut cells = vec![None; size.cell_count()];
    for record in placements {
        let Coord { x, y, z } = record.position;
        if let Some(cell) = cells.get_mut(x + y * size.x + z * size.x * size.y) {
            *cell = Some(record.prototype);
        }
    }
    cells
}

/// Render columns as an image, X to the right and Z downwards
///
/// # Errors
///
/// Returns an error if a column names a prototype the palette lacks
pub fn render_top_down(size: GridSize, columns: &[Column], palette: &Palette) -> Result<RgbaImage> {
    let scale = PREVIEW_CELL_PIXELS;
    let mut img = RgbaImage::new(size.x as u32 * scale, size.z as u32 * scale);
    let layers = size.y.max(1) as f32;

    for z in 0..size.z {
        for x in 0..size.x {
            let color = match columns.get(x + z * size.x).copied().flatten() {
                None => palette.empty_color(),
                Some((prototype, y)) => {
                    let base = palette.color(prototype).ok_or_else(|| {
                        invalid_parameter("prototype", &prototype, &"not in the preview palette")
                    })?;
                    shade(base, (y as f32 + 1.0) / layers)
                }
            };

            for dy in 0..scale {
                for dx in 0..scale {
                    img.put_pixel(x as u32 * scale + dx, z as u32 * scale + dy, Rgba(color));
                }
            }
        }
    }

    Ok(img)
}

fn shade(color: [u8; 4], height: f32) -> [u8; 4] {
    let factor = 0.45_f32.mul_add(height, 0.55);
    let [r, g, b, a] = color;
    let scaled = |channel: u8| (f32::from(channel) * factor).round().min(255.0) as u8;
    [scaled(r), scaled(g), scaled(b), a]
}

/// Save a top-down preview of placement records as PNG
///
/// # Errors
///
/// Returns an error if:
/// - There is nothing to draw
/// - The parent directory cannot be created
/// - The image cannot be saved to the specified path
pub fn export_preview(
    size: GridSize,
    placements: &[PlacementRecord],
    palette: &Palette,
    output_path: &Path,
) -> Result<()> {
    if placements.is_empty() {
        return Err(invalid_parameter(
            "preview",
            &output_path.display(),
            &"no cells have been collapsed",
        ));
    }

    let cells = cells_from_placements(size, placements);
    let columns = top_down_columns(size, &cells, palette);
    let img = render_top_down(size, &columns, palette)?;

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| WfcError::FileSystem {
            path: parent.to_path_buf(),
            operation: "create directory",
            source: e,
        })?;
    }

    img.save(output_path).map_err(|e| WfcError::ImageExport {
        path: output_path.to_path_buf(),
        source: e,
    })?;

    Ok(())
}
