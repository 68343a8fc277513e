use bitvec::prelude::*;
use std::collections::VecDeque;

use crate::catalog::Catalog;
use crate::spatial::direction::Direction;
use crate::spatial::grid::{Coord, Grid};

/// Result of running the work queue to a fixed point
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PropagationOutcome {
    /// Every queued cell was processed and no domain emptied
    Settled {
        /// Cells whose domain shrank, in the order they first shrank
        narrowed: Vec<Coord>,
    },
    /// A domain became empty; the queue was dropped at that point
    Contradiction {
        /// Cell whose domain emptied
        coord: Coord,
    },
}

/// Work-queue arc consistency over the six-neighbour lattice
///
/// Holds its buffers between calls so repeated propagation on one grid does
/// not reallocate. A cell is queued at most once at a time.
#[derive(Clone, Debug)]
pub struct Propagator {
    queue: VecDeque<Coord>,
    queued: BitVec,
    narrowed: Vec<Coord>,
    narrowed_mark: BitVec,
}

impl Propagator {
    /// Create a propagator for a grid with `cell_count` cells
    pub fn new(cell_count: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            queued: bitvec![0; cell_count],
            narrowed: Vec::new(),
            narrowed_mark: bitvec![0; cell_count],
        }
    }

    /// Queue a cell whose domain changed, skipping cells already queued
    pub fn enqueue(&mut self, grid: &Grid, coord: Coord) {
        let Some(index) = grid.flat_index(coord) else {
            return;
        };
        if self.queued.get(index).as_deref() == Some(&true) {
            return;
        }
        self.queued.set(index, true);
        self.queue.push_back(coord);
    }

    /// Queue every cell in flat order
    pub fn enqueue_all(&mut self, grid: &Grid) {
        for coord in grid.coords() {
            self.enqueue(grid, coord);
        }
    }

    /// Number of cells waiting to be processed
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Run the queue until no domain changes or one becomes empty
    ///
    /// For each popped cell, every neighbour's domain is intersected with the
    /// union of compatible prototypes over the popped cell's domain. A
    /// neighbour that shrank is queued in turn.
    pub fn propagate(&mut self, grid: &mut Grid, catalog: &Catalog) -> PropagationOutcome {
        while let Some(coord) = self.queue.pop_front() {
            if let Some(index) = grid.flat_index(coord) {
                self.queued.set(index, false);
            }

            let Ok(source) = grid.domain(coord).cloned() else {
                continue;
            };

            for direction in Direction::ALL {
                let Some(neighbour) = grid.neighbor(coord, direction) else {
                    continue;
                };
                let allowed = catalog.allowed_neighbours(&source, direction);

                let Ok(domain) = grid.domain_mut(neighbour) else {
                    continue;
                };
                let before = domain.count();
                domain.intersect_with(&allowed);
                let after = domain.count();

                if after == before {
                    continue;
                }

                self.mark_narrowed(grid, neighbour);
                if after == 0 {
                    self.reset();
                    return PropagationOutcome::Contradiction { coord: neighbour };
                }
                self.enqueue(grid, neighbour);
            }
        }

        let narrowed = std::mem::take(&mut self.narrowed);
        self.narrowed_mark.fill(false);
        PropagationOutcome::Settled { narrowed }
    }

    /// Record a cell that shrank outside the queue, such as a collapse
    pub fn mark_narrowed(&mut self, grid: &Grid, coord: Coord) {
        let Some(index) = grid.flat_index(coord) else {
            return;
        };
        if self.narrowed_mark.get(index).as_deref() == Some(&true) {
            return;
        }
        self.narrowed_mark.set(index, true);
        self.narrowed.push(coord);
    }

    fn reset(&mut self) {
        self.queue.clear();
        self.queued.fill(false);
        self.narrowed.clear();
        self.narrowed_mark.fill(false);
    }
}

/// Test whether every pair of collapsed neighbours is mutually compatible
///
/// Undecided cells are skipped. Used to check finished grids.
pub fn is_adjacency_sound(grid: &Grid, catalog: &Catalog) -> bool {
    grid.coords().all(|coord| {
        let Some(here) = grid.domain(coord).ok().and_then(|d| d.only()) else {
            return true;
        };
        let Some(prototype) = catalog.get(here) else {
            return false;
        };
        Direction::ALL.into_iter().all(|direction| {
            grid.neighbor(coord, direction)
                .and_then(|n| grid.domain(n).ok())
                .and_then(|d| d.only())
                .is_none_or(|there| prototype.compatible(direction).contains(there))
        })
    })
}
