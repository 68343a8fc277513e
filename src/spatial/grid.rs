//! Dense 3D cell storage with bounds-checked addressing
//!
//! Every cell holds a domain: the prototypes still possible there. Domains
//! live in one standard-layout `Array3` of shape `(z, y, x)`, so the flat
//! offset of `(x, y, z)` is `x + y * size.x + z * size.x * size.y` and the
//! propagation loop walks memory in order.

use std::fmt;
use std::str::FromStr;

use ndarray::Array3;
use serde::Serialize;

use crate::algorithm::bitset::DomainSet;
use crate::catalog::Catalog;
use crate::io::configuration::{MAX_GRID_CELLS, MAX_GRID_DIMENSION};
use crate::io::error::{Result, WfcError, invalid_parameter};
use crate::spatial::direction::Direction;

/// Integer cell coordinates, y is vertical
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Coord {
    /// Position along X
    pub x: usize,
    /// Position along Y (layer)
    pub y: usize,
    /// Position along Z
    pub z: usize,
}

impl Coord {
    /// Create coordinates from components
    pub const fn new(x: usize, y: usize, z: usize) -> Self {
        Self { x, y, z }
    }

    /// Components as `[x, y, z]`
    pub const fn to_array(self) -> [usize; 3] {
        [self.x, self.y, self.z]
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Grid dimensions in cells
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct GridSize {
    /// Cells along X
    pub x: usize,
    /// Cells along Y (layers)
    pub y: usize,
    /// Cells along Z
    pub z: usize,
}

impl GridSize {
    /// Create dimensions from components
    pub const fn new(x: usize, y: usize, z: usize) -> Self {
        Self { x, y, z }
    }

    /// Components as `[x, y, z]`
    pub const fn to_array(self) -> [usize; 3] {
        [self.x, self.y, self.z]
    }

    /// Total number of cells
    pub const fn cell_count(self) -> usize {
        self.x * self.y * self.z
    }

    /// Test whether coordinates fall inside the grid
    pub const fn contains(self, coord: Coord) -> bool {
        coord.x < self.x && coord.y < self.y && coord.z < self.z
    }

    /// Check every dimension is non-zero and within `MAX_GRID_DIMENSION`,
    /// and the whole grid within `MAX_GRID_CELLS`
    ///
    /// # Errors
    ///
    /// Returns an error naming the first offending dimension, or `size` when
    /// only the total is too large
    pub fn validate(self) -> Result<()> {
        for (axis, extent) in [("size.x", self.x), ("size.y", self.y), ("size.z", self.z)] {
            if extent == 0 {
                return Err(invalid_parameter(axis, &extent, &"must be at least 1"));
            }
            if extent > MAX_GRID_DIMENSION {
                return Err(invalid_parameter(
                    axis,
                    &extent,
                    &format!("must not exceed {MAX_GRID_DIMENSION}"),
                ));
            }
        }
        // Axes are bounded above, so the product cannot overflow
        if self.cell_count() > MAX_GRID_CELLS {
            return Err(invalid_parameter(
                "size",
                &self,
                &format!(
                    "{} cells exceed the limit of {MAX_GRID_CELLS}",
                    self.cell_count()
                ),
            ));
        }
        Ok(())
    }
}

impl From<[usize; 3]> for GridSize {
    fn from(value: [usize; 3]) -> Self {
        Self::new(value[0], value[1], value[2])
    }
}

impl fmt::Display for GridSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.x, self.y, self.z)
    }
}

impl FromStr for GridSize {
    type Err = WfcError;

    /// Parse `XxYxZ`, for example `8x3x8`
    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.trim().split(['x', 'X']).collect();
        let &[x, y, z] = parts.as_slice() else {
            return Err(invalid_parameter(
                "size",
                &s,
                &"expected three dimensions written as XxYxZ",
            ));
        };

        let parse = |part: &str| {
            part.trim()
                .parse::<usize>()
                .map_err(|e| invalid_parameter("size", &s, &e))
        };

        let size = Self::new(parse(x)?, parse(y)?, parse(z)?);
        size.validate()?;
        Ok(size)
    }
}

/// Read-only view of one cell
#[derive(Clone, Copy, Debug)]
pub struct Cell<'a> {
    /// Where the cell sits
    pub coord: Coord,
    /// Prototypes still possible here
    pub domain: &'a DomainSet,
}

impl Cell<'_> {
    /// Exactly one prototype remains
    pub fn is_collapsed(&self) -> bool {
        self.domain.count() == 1
    }

    /// No prototype remains
    pub fn is_contradicted(&self) -> bool {
        self.domain.is_empty()
    }
}

/// Dense grid of per-cell domains for one solver run
#[derive(Debug, Clone)]
pub struct Grid {
    size: GridSize,
    domains: Array3<DomainSet>,
    prototype_count: usize,
}

impl Grid {
    /// Allocate a grid with every prototype possible in every cell
    ///
    /// # Errors
    ///
    /// Returns an error if a dimension is zero or too large, or the catalog
    /// holds no prototypes
    pub fn new(size: GridSize, catalog: &Catalog) -> Result<Self> {
        size.validate()?;
        if catalog.is_empty() {
            return Err(invalid_parameter(
                "catalog",
                &0,
                &"at least one prototype is required",
            ));
        }

        let prototype_count = catalog.len();
        let domains = Array3::from_elem((size.z, size.y, size.x), DomainSet::all(prototype_count));

        Ok(Self {
            size,
            domains,
            prototype_count,
        })
    }

    /// Grid dimensions
    pub const fn size(&self) -> GridSize {
        self.size
    }

    /// Number of prototypes each domain spans
    pub const fn prototype_count(&self) -> usize {
        self.prototype_count
    }

    /// Total number of cells
    pub const fn cell_count(&self) -> usize {
        self.size.cell_count()
    }

    /// Bounds-checked cell access
    ///
    /// # Errors
    ///
    /// Returns `OutOfBounds` if the coordinates fall outside the grid
    pub fn cell_at(&self, coord: Coord) -> Result<Cell<'_>> {
        let domain = self.domain(coord)?;
        Ok(Cell { coord, domain })
    }

    /// Bounds-checked domain access
    ///
    /// # Errors
    ///
    /// Returns `OutOfBounds` if the coordinates fall outside the grid
    pub fn domain(&self, coord: Coord) -> Result<&DomainSet> {
        self.domains
            .get([coord.z, coord.y, coord.x])
            .ok_or_else(|| self.out_of_bounds(coord))
    }

    /// Bounds-checked mutable domain access for solver passes
    ///
    /// Callers narrowing a domain to empty are responsible for reporting the
    /// contradiction.
    ///
    /// # Errors
    ///
    /// Returns `OutOfBounds` if the coordinates fall outside the grid
    pub fn domain_mut(&mut self, coord: Coord) -> Result<&mut DomainSet> {
        let size = self.size;
        self.domains
            .get_mut([coord.z, coord.y, coord.x])
            .ok_or(WfcError::OutOfBounds {
                coord: coord.to_array(),
                size: size.to_array(),
            })
    }

    /// Adjacent cell in a direction, `None` past the grid edge
    pub fn neighbor(&self, coord: Coord, direction: Direction) -> Option<Coord> {
        if !self.size.contains(coord) {
            return None;
        }
        let [dx, dy, dz] = direction.offset();
        let neighbour = Coord::new(
            coord.x.checked_add_signed(dx)?,
            coord.y.checked_add_signed(dy)?,
            coord.z.checked_add_signed(dz)?,
        );
        self.size.contains(neighbour).then_some(neighbour)
    }

    /// Flat offset `x + y * size.x + z * size.x * size.y`
    pub const fn flat_index(&self, coord: Coord) -> Option<usize> {
        if !self.size.contains(coord) {
            return None;
        }
        Some(coord.x + coord.y * self.size.x + coord.z * self.size.x * self.size.y)
    }

    /// Coordinates for a flat offset
    pub const fn coord_at(&self, index: usize) -> Option<Coord> {
        if index >= self.size.cell_count() {
            return None;
        }
        let layer = self.size.x * self.size.y;
        Some(Coord::new(
            index % self.size.x,
            (index % layer) / self.size.x,
            index / layer,
        ))
    }

    /// Every coordinate in flat order
    pub fn coords(&self) -> impl Iterator<Item = Coord> + '_ {
        (0..self.cell_count()).filter_map(|index| self.coord_at(index))
    }

    /// Every cell in flat order
    pub fn cells(&self) -> impl Iterator<Item = Cell<'_>> + '_ {
        self.domains
            .indexed_iter()
            .map(|((z, y, x), domain)| Cell {
                coord: Coord::new(x, y, z),
                domain,
            })
    }

    /// Every cell holds exactly one prototype
    pub fn is_collapsed(&self) -> bool {
        self.domains.iter().all(|domain| domain.count() == 1)
    }

    /// Number of cells holding exactly one prototype
    pub fn collapsed_count(&self) -> usize {
        self.domains
            .iter()
            .filter(|domain| domain.count() == 1)
            .count()
    }

    fn out_of_bounds(&self, coord: Coord) -> WfcError {
        WfcError::OutOfBounds {
            coord: coord.to_array(),
            size: self.size.to_array(),
        }
    }
}
