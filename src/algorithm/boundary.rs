//! One-shot pass restricting edge and layer cells before any collapse
//!
//! Every cell gets a list of removal batches. A batch is applied whole or
//! not at all, and it is skipped when it would leave the cell with no
//! prototypes, so the pass never produces a contradiction by itself and a
//! second pass changes nothing.

use crate::algorithm::bitset::DomainSet;
use crate::catalog::{Catalog, LayerConstraint, Prototype};
use crate::io::error::Result;
use crate::spatial::direction::Direction;
use crate::spatial::grid::{Coord, Grid};

/// Summary of one boundary pass
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BoundaryReport {
    /// Cells whose domain shrank
    pub cells_narrowed: usize,
    /// Prototype removals across all cells
    pub prototypes_removed: usize,
    /// Batches skipped because they would have emptied a domain
    pub batches_skipped: usize,
}

/// Restrict edge cells to void-compatible prototypes and apply layer tags
///
/// For each direction that leaves the grid, prototypes whose compatible set
/// in that direction lacks `void_id` are removed. Prototypes confined to the
/// bottom or top layer are removed elsewhere, and prototypes barred from a
/// layer are removed on it. Does not propagate.
///
/// # Errors
///
/// Returns `UnknownPrototype` if `void_id` is not in the catalog
pub fn apply_boundary_constraints(
    grid: &mut Grid,
    catalog: &Catalog,
    void_id: &str,
) -> Result<BoundaryReport> {
    let void = catalog.require(void_id)?;
    let top = grid.size().y.saturating_sub(1);
    let mut report = BoundaryReport::default();

    let coords: Vec<Coord> = grid.coords().collect();
    for coord in coords {
        let batches = removal_batches(grid, catalog, coord, void, top)?;
        let domain = grid.domain_mut(coord)?;
        let before = domain.count();

        for batch in &batches {
            let remaining = domain.count() - domain.intersection(batch).count();
            if remaining == 0 {
                report.batches_skipped += 1;
                continue;
            }
            domain.subtract(batch);
        }

        let removed = before - domain.count();
        if removed > 0 {
            report.cells_narrowed += 1;
            report.prototypes_removed += removed;
        }
    }

    log::debug!(
        "Boundary pass narrowed {} cells, removed {} candidates, skipped {} batches",
        report.cells_narrowed,
        report.prototypes_removed,
        report.batches_skipped
    );
    Ok(report)
}

fn removal_batches(
    grid: &Grid,
    catalog: &Catalog,
    coord: Coord,
    void: usize,
    top: usize,
) -> Result<Vec<DomainSet>> {
    let domain = grid.domain(coord)?;
    let mut batches = Vec::new();

    for direction in Direction::ALL {
        if grid.neighbor(coord, direction).is_some() {
            continue;
        }
        batches.push(batch_where(domain, catalog, |p| {
            !p.compatible(direction).contains(void)
        }));
    }

    if coord.y > 0 {
        batches.push(batch_where(domain, catalog, |p| {
            p.constrain_to() == Some(LayerConstraint::Bottom)
        }));
    }
    if coord.y < top {
        batches.push(batch_where(domain, catalog, |p| {
            p.constrain_to() == Some(LayerConstraint::Top)
        }));
    }
    if coord.y == 0 {
        batches.push(batch_where(domain, catalog, |p| {
            p.constrain_from() == Some(LayerConstraint::Bottom)
        }));
    }
    if coord.y == top {
        batches.push(batch_where(domain, catalog, |p| {
            p.constrain_from() == Some(LayerConstraint::Top)
        }));
    }

    batches.retain(|batch| !batch.is_empty());
    Ok(batches)
}

/// Members of `domain` whose prototype matches `remove`
fn batch_where(
    domain: &DomainSet,
    catalog: &Catalog,
    remove: impl Fn(&Prototype) -> bool,
) -> DomainSet {
    DomainSet::from_indices(
        domain.capacity(),
        domain
            .iter()
            .filter(|&index| catalog.get(index).is_some_and(&remove)),
    )
}
