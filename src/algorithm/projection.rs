//! Read finished or intermediate grids into placement records

use serde::Serialize;

use crate::catalog::{Catalog, Rotation};
use crate::io::error::{Result, invariant_violation};
use crate::spatial::grid::{Coord, Grid};

/// One mesh to place: a collapsed cell and the prototype it holds
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PlacementRecord {
    /// Cell coordinates
    pub position: Coord,
    /// Id of the chosen prototype
    pub prototype_id: String,
    /// Mesh to instantiate
    pub mesh_name: String,
    /// Quarter turns about the vertical axis
    pub rotation: Rotation,
    /// Catalog index of the prototype
    #[serde(skip)]
    pub prototype: usize,
}

impl PlacementRecord {
    /// Yaw in degrees, `rotation * 90`
    pub const fn yaw_degrees(&self) -> u16 {
        self.rotation.degrees()
    }

    /// Position in world units for cells `spacing` apart
    pub fn world_position(&self, spacing: f32) -> [f32; 3] {
        [
            self.position.x as f32 * spacing,
            self.position.y as f32 * spacing,
            self.position.z as f32 * spacing,
        ]
    }
}

/// Snapshot of a grid split by cell status
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Projection {
    /// Collapsed cells in flat order
    pub placements: Vec<PlacementRecord>,
    /// Cells with more than one candidate left
    pub undetermined: Vec<Coord>,
    /// Cells with no candidate left
    pub contradicted: Vec<Coord>,
}

impl Projection {
    /// Every cell is collapsed
    pub fn is_complete(&self) -> bool {
        self.undetermined.is_empty() && self.contradicted.is_empty()
    }
}

/// Project every cell of a grid, collapsed or not
pub fn project(grid: &Grid, catalog: &Catalog) -> Projection {
    let mut projection = Projection::default();

    for cell in grid.cells() {
        match cell.domain.count() {
            0 => projection.contradicted.push(cell.coord),
            1 => {
                let placed = cell
                    .domain
                    .only()
                    .and_then(|index| Some((index, catalog.get(index)?)));
                if let Some((index, prototype)) = placed {
                    projection.placements.push(PlacementRecord {
                        position: cell.coord,
                        prototype_id: prototype.id().to_string(),
                        mesh_name: prototype.mesh_name().to_string(),
                        rotation: prototype.rotation(),
                        prototype: index,
                    });
                }
            }
            _ => projection.undetermined.push(cell.coord),
        }
    }

    projection
}

/// Project a grid that must be fully collapsed
///
/// # Errors
///
/// Returns `InvariantViolation` naming a cell that is not collapsed,
/// preferring contradicted cells
pub fn project_final(grid: &Grid, catalog: &Catalog) -> Result<Vec<PlacementRecord>> {
    let projection = project(grid, catalog);
    if let Some(coord) = projection.contradicted.first() {
        return Err(invariant_violation(&format!(
            "cell {coord} has no prototype left"
        )));
    }
    if let Some(coord) = projection.undetermined.first() {
        return Err(invariant_violation(&format!(
            "cell {coord} is not collapsed"
        )));
    }
    Ok(projection.placements)
}
