use ndarray::Array3;
use std::collections::BTreeMap;

use crate::algorithm::bitset::DomainSet;
use crate::algorithm::propagation::{PropagationOutcome, Propagator};
use crate::algorithm::selection::{
    RandomSelector, choose_prototype, domain_entropy, select_lowest_entropy,
};
use crate::catalog::{Catalog, Prototype};
use crate::io::error::{Result, invalid_parameter};
use crate::spatial::grid::{Coord, Grid};

/// A cell whose domain emptied, and the collapse step that caused it
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Contradiction {
    /// Cell left without any prototype
    pub coord: Coord,
    /// Number of collapses performed when it was found, 0 before the first
    pub step: usize,
}

/// One successful collapse and everything propagation changed
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CollapseEvent {
    /// Cell that was collapsed
    pub coord: Coord,
    /// Catalog index chosen for it
    pub prototype: usize,
    /// Cells whose domain shrank, the collapsed cell first
    pub narrowed: Vec<Coord>,
    /// Cells that reached a single prototype in this step, with that prototype
    pub newly_collapsed: Vec<(Coord, usize)>,
}

/// Outcome of one `iterate` call
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StepResult {
    /// A cell collapsed and propagation settled
    Progressed(CollapseEvent),
    /// Every cell holds exactly one prototype
    Collapsed,
    /// A domain emptied; the run cannot finish
    Contradiction(Contradiction),
}

impl StepResult {
    /// The run has reached a terminal state
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Progressed(_))
    }
}

/// Lifecycle of an engine
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineState {
    /// Created, nothing collapsed yet
    Ready,
    /// At least one collapse happened and cells remain undecided
    Iterating,
    /// Every cell holds exactly one prototype
    Collapsed,
    /// A domain emptied
    Contradiction(Contradiction),
}

/// Observe-collapse-propagate loop over one grid
///
/// Owns the grid and the run's random selector. Terminal states are sticky:
/// once `Collapsed` or `Contradiction` is reached, `iterate` keeps returning
/// it without touching the grid. There is no backtracking; a failed run is
/// retried with a fresh engine and another seed.
#[derive(Clone, Debug)]
pub struct ConstraintEngine<'c> {
    catalog: &'c Catalog,
    grid: Grid,
    selector: RandomSelector,
    propagator: Propagator,
    /// Cached weighted entropy per cell, shape `(z, y, x)`
    entropy: Array3<f64>,
    state: EngineState,
    collapse_count: usize,
    collapsed_cells: usize,
}

impl<'c> ConstraintEngine<'c> {
    /// Wrap a prepared grid
    ///
    /// A grid that already holds an empty domain starts in the
    /// `Contradiction` state at step 0.
    pub fn new(grid: Grid, catalog: &'c Catalog, selector: RandomSelector) -> Self {
        let size = grid.size();
        let mut entropy = Array3::zeros((size.z, size.y, size.x));
        let mut empty = None;
        for cell in grid.cells() {
            if let Some(slot) = entropy.get_mut([cell.coord.z, cell.coord.y, cell.coord.x]) {
                *slot = domain_entropy(cell.domain, catalog);
            }
            if empty.is_none() && cell.is_contradicted() {
                empty = Some(cell.coord);
            }
        }

        let state = empty.map_or(EngineState::Ready, |coord| {
            EngineState::Contradiction(Contradiction { coord, step: 0 })
        });

        Self {
            catalog,
            propagator: Propagator::new(grid.cell_count()),
            collapsed_cells: grid.collapsed_count(),
            grid,
            selector,
            entropy,
            state,
            collapse_count: 0,
        }
    }

    /// Run exactly one observe, collapse and propagate cycle
    pub fn iterate(&mut self) -> StepResult {
        match self.state {
            EngineState::Collapsed => return StepResult::Collapsed,
            EngineState::Contradiction(contradiction) => {
                return StepResult::Contradiction(contradiction);
            }
            EngineState::Ready | EngineState::Iterating => {}
        }

        let Some(coord) = select_lowest_entropy(&self.grid, &self.entropy, &mut self.selector)
        else {
            self.state = EngineState::Collapsed;
            log::debug!("Grid collapsed after {} steps", self.collapse_count);
            return StepResult::Collapsed;
        };

        let chosen = self
            .grid
            .domain(coord)
            .ok()
            .and_then(|domain| choose_prototype(domain, self.catalog, &mut self.selector));
        let Some(prototype) = chosen else {
            return StepResult::Contradiction(self.record_contradiction(coord));
        };

        let capacity = self.grid.prototype_count();
        if let Ok(domain) = self.grid.domain_mut(coord) {
            *domain = DomainSet::single(capacity, prototype);
        }
        log::trace!(
            "Collapsed {coord} to '{}'",
            self.catalog.get(prototype).map_or("?", Prototype::id)
        );

        self.propagator.mark_narrowed(&self.grid, coord);
        self.propagator.enqueue(&self.grid, coord);
        let outcome = self.propagator.propagate(&mut self.grid, self.catalog);
        self.collapse_count += 1;

        match outcome {
            PropagationOutcome::Settled { narrowed } => {
                self.state = EngineState::Iterating;
                let newly_collapsed = self.refresh(&narrowed);
                StepResult::Progressed(CollapseEvent {
                    coord,
                    prototype,
                    narrowed,
                    newly_collapsed,
                })
            }
            PropagationOutcome::Contradiction { coord } => {
                StepResult::Contradiction(self.record_contradiction(coord))
            }
        }
    }

    /// Propagate from every cell until nothing changes
    ///
    /// Used after the boundary pass, which narrows domains without
    /// propagating. Returns the contradiction if one is found, including one
    /// recorded earlier.
    pub fn settle(&mut self) -> Option<Contradiction> {
        if let EngineState::Contradiction(contradiction) = self.state {
            return Some(contradiction);
        }

        self.propagator.enqueue_all(&self.grid);
        match self.propagator.propagate(&mut self.grid, self.catalog) {
            PropagationOutcome::Settled { narrowed } => {
                let _ = self.refresh(&narrowed);
                log::debug!("Settling narrowed {} cells", narrowed.len());
                None
            }
            PropagationOutcome::Contradiction { coord } => Some(self.record_contradiction(coord)),
        }
    }

    /// Remove one prototype from one cell and propagate the change
    ///
    /// Banning a prototype the cell no longer holds changes nothing. Returns
    /// the contradiction the ban caused, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The id is not in the catalog
    /// - The coordinates are outside the grid
    /// - The grid is already fully collapsed
    pub fn ban(&mut self, coord: Coord, id: &str) -> Result<Option<Contradiction>> {
        let index = self.catalog.require(id)?;
        match self.state {
            EngineState::Contradiction(contradiction) => return Ok(Some(contradiction)),
            EngineState::Collapsed => {
                return Err(invalid_parameter(
                    "ban",
                    &id,
                    &"the grid is already fully collapsed",
                ));
            }
            EngineState::Ready | EngineState::Iterating => {}
        }

        let domain = self.grid.domain_mut(coord)?;
        if !domain.remove(index) {
            return Ok(None);
        }
        if domain.is_empty() {
            return Ok(Some(self.record_contradiction(coord)));
        }

        self.propagator.mark_narrowed(&self.grid, coord);
        self.propagator.enqueue(&self.grid, coord);
        match self.propagator.propagate(&mut self.grid, self.catalog) {
            PropagationOutcome::Settled { narrowed } => {
                let _ = self.refresh(&narrowed);
                Ok(None)
            }
            PropagationOutcome::Contradiction { coord } => {
                Ok(Some(self.record_contradiction(coord)))
            }
        }
    }

    /// Every cell holds exactly one prototype
    pub fn is_collapsed(&self) -> bool {
        self.collapsed_cells == self.grid.cell_count()
    }

    /// Prototypes still possible at a cell, keyed by id
    ///
    /// # Errors
    ///
    /// Returns `OutOfBounds` if the coordinates fall outside the grid
    pub fn possibilities(&self, coord: Coord) -> Result<BTreeMap<&'c str, &'c Prototype>> {
        let catalog = self.catalog;
        let domain = self.grid.domain(coord)?;
        Ok(domain
            .iter()
            .filter_map(|index| catalog.get(index))
            .map(|prototype| (prototype.id(), prototype))
            .collect())
    }

    /// Current grid
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Give up the engine and keep its grid
    pub fn into_grid(self) -> Grid {
        self.grid
    }

    /// Catalog this engine draws prototypes from
    pub const fn catalog(&self) -> &'c Catalog {
        self.catalog
    }

    /// Lifecycle state
    pub const fn state(&self) -> EngineState {
        self.state
    }

    /// Collapses performed so far
    pub const fn collapse_count(&self) -> usize {
        self.collapse_count
    }

    /// Cells currently holding exactly one prototype
    pub const fn collapsed_cells(&self) -> usize {
        self.collapsed_cells
    }

    /// Cached entropy of a cell
    pub fn entropy(&self, coord: Coord) -> Option<f64> {
        self.entropy.get([coord.z, coord.y, coord.x]).copied()
    }

    /// Refresh cached entropies and return cells that became single
    fn refresh(&mut self, narrowed: &[Coord]) -> Vec<(Coord, usize)> {
        let mut newly_collapsed = Vec::new();
        for &coord in narrowed {
            let Ok(domain) = self.grid.domain(coord) else {
                continue;
            };
            if let Some(slot) = self.entropy.get_mut([coord.z, coord.y, coord.x]) {
                *slot = domain_entropy(domain, self.catalog);
            }
            if let Some(prototype) = domain.only() {
                newly_collapsed.push((coord, prototype));
            }
        }
        self.collapsed_cells += newly_collapsed.len();
        newly_collapsed
    }

    /// Enter the terminal contradiction state
    ///
    /// Propagation stops at the first empty domain without reporting what it
    /// narrowed, so the collapsed cell count is taken from the grid.
    fn record_contradiction(&mut self, coord: Coord) -> Contradiction {
        let contradiction = Contradiction {
            coord,
            step: self.collapse_count,
        };
        self.collapsed_cells = self.grid.collapsed_count();
        self.state = EngineState::Contradiction(contradiction);
        log::warn!(
            "Contradiction at {coord} after {} collapses",
            self.collapse_count
        );
        contradiction
    }
}
