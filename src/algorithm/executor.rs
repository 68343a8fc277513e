use rayon::prelude::*;
use std::time::{Duration, Instant};

use crate::algorithm::boundary::apply_boundary_constraints;
use crate::algorithm::engine::{ConstraintEngine, Contradiction, EngineState, StepResult};
use crate::algorithm::projection::{PlacementRecord, Projection, project, project_final};
use crate::algorithm::selection::RandomSelector;
use crate::catalog::Catalog;
use crate::io::configuration::{DEFAULT_GRID_SIZE, DEFAULT_VOID_PROTOTYPE};
use crate::io::error::{Result, invalid_parameter};
use crate::spatial::grid::{Coord, Grid, GridSize};

/// Run parameters shared by every seed a driver runs
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunConfig {
    /// Grid dimensions
    pub size: GridSize,
    /// Prototype id standing for open space past the grid edge
    pub void_id: String,
    /// Propagate the boundary pass to a fixed point before collapsing
    pub settle_boundaries: bool,
    /// Stop a batch run after this many collapses
    pub max_steps: Option<usize>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            size: GridSize::from(DEFAULT_GRID_SIZE),
            void_id: DEFAULT_VOID_PROTOTYPE.to_string(),
            settle_boundaries: true,
            max_steps: None,
        }
    }
}

/// How a run ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every cell holds exactly one prototype
    Collapsed,
    /// A domain emptied
    Contradiction(Contradiction),
    /// `max_steps` was reached first
    StepLimit,
}

impl RunOutcome {
    /// Short label used in exported documents
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Collapsed => "collapsed",
            Self::Contradiction(_) => "contradiction",
            Self::StepLimit => "step_limit",
        }
    }

    /// The run produced a complete grid
    pub const fn is_collapsed(&self) -> bool {
        matches!(self, Self::Collapsed)
    }
}

/// Result of one run
#[derive(Clone, Debug)]
pub struct RunReport {
    /// Seed the run's generator started from
    pub seed: u64,
    /// Grid dimensions
    pub size: GridSize,
    /// How the run ended
    pub outcome: RunOutcome,
    /// One record per collapsed cell in flat order
    pub placements: Vec<PlacementRecord>,
    /// Cells left with more than one candidate
    pub undetermined: Vec<Coord>,
    /// Collapses performed
    pub steps: usize,
    /// Wall-clock time from preparation to the final projection
    pub elapsed: Duration,
}

/// Progress of one step as reported to observers
#[derive(Clone, Copy, Debug)]
pub struct StepEvent<'a> {
    /// Seed of the run the step belongs to
    pub seed: u64,
    /// Collapses performed so far
    pub step: usize,
    /// What `iterate` returned
    pub result: &'a StepResult,
    /// Cells holding exactly one prototype
    pub collapsed_cells: usize,
    /// Cells in the grid
    pub cell_count: usize,
}

/// Receives run lifecycle notifications
///
/// Every method defaults to doing nothing.
pub trait RunObserver {
    /// Called once the grid is prepared, before the first step
    fn on_start(&mut self, _seed: u64, _grid: &Grid) {}
    /// Called after every `iterate`
    fn on_step(&mut self, _event: &StepEvent<'_>) {}
    /// Called with the final report
    fn on_finish(&mut self, _report: &RunReport) {}
}

/// Observer that ignores every notification
#[derive(Clone, Copy, Debug, Default)]
pub struct NilObserver;

impl RunObserver for NilObserver {}

impl<O: RunObserver + ?Sized> RunObserver for &mut O {
    fn on_start(&mut self, seed: u64, grid: &Grid) {
        (**self).on_start(seed, grid);
    }

    fn on_step(&mut self, event: &StepEvent<'_>) {
        (**self).on_step(event);
    }

    fn on_finish(&mut self, report: &RunReport) {
        (**self).on_finish(report);
    }
}

impl<O: RunObserver> RunObserver for Option<O> {
    fn on_start(&mut self, seed: u64, grid: &Grid) {
        if let Some(observer) = self {
            observer.on_start(seed, grid);
        }
    }

    fn on_step(&mut self, event: &StepEvent<'_>) {
        if let Some(observer) = self {
            observer.on_step(event);
        }
    }

    fn on_finish(&mut self, report: &RunReport) {
        if let Some(observer) = self {
            observer.on_finish(report);
        }
    }
}

/// Forwards notifications to two observers in turn
#[derive(Debug)]
pub struct Both<A, B>(pub A, pub B);

impl<A: RunObserver, B: RunObserver> RunObserver for Both<A, B> {
    fn on_start(&mut self, seed: u64, grid: &Grid) {
        self.0.on_start(seed, grid);
        self.1.on_start(seed, grid);
    }

    fn on_step(&mut self, event: &StepEvent<'_>) {
        self.0.on_step(event);
        self.1.on_step(event);
    }

    fn on_finish(&mut self, report: &RunReport) {
        self.0.on_finish(report);
        self.1.on_finish(report);
    }
}

/// Prepares and runs solver instances against one catalog
///
/// Each run gets its own grid and generator; the catalog is only read, so
/// one driver can run many seeds in parallel.
#[derive(Clone, Debug)]
pub struct Driver<'c> {
    catalog: &'c Catalog,
    config: RunConfig,
}

impl<'c> Driver<'c> {
    /// Create a driver after checking the configuration against the catalog
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A grid dimension is zero or too large
    /// - The void id is not in the catalog
    pub fn new(catalog: &'c Catalog, config: RunConfig) -> Result<Self> {
        config.size.validate()?;
        catalog.require(&config.void_id)?;
        Ok(Self { catalog, config })
    }

    /// Run configuration
    pub const fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Catalog shared by every run
    pub const fn catalog(&self) -> &'c Catalog {
        self.catalog
    }

    /// Build a fresh engine: full grid, boundary pass, optional settling
    ///
    /// A contradiction found while settling is kept in the engine state and
    /// surfaces on the first `iterate`.
    ///
    /// # Errors
    ///
    /// Returns an error if the grid cannot be allocated
    pub fn prepare(&self, seed: u64) -> Result<ConstraintEngine<'c>> {
        let mut grid = Grid::new(self.config.size, self.catalog)?;
        apply_boundary_constraints(&mut grid, self.catalog, &self.config.void_id)?;

        let mut engine = ConstraintEngine::new(grid, self.catalog, RandomSelector::new(seed));
        if self.config.settle_boundaries
            && let Some(contradiction) = engine.settle()
        {
            log::warn!(
                "Seed {seed}: boundary constraints are unsatisfiable at {}",
                contradiction.coord
            );
        }
        Ok(engine)
    }

    /// Iterate one seed to a terminal state and project the result
    ///
    /// # Errors
    ///
    /// Returns an error if preparation fails or the final grid breaks a
    /// solver invariant
    pub fn run(&self, seed: u64, observer: &mut impl RunObserver) -> Result<RunReport> {
        let started = Instant::now();
        let mut engine = self.prepare(seed)?;
        observer.on_start(seed, engine.grid());

        let outcome = loop {
            if self
                .config
                .max_steps
                .is_some_and(|limit| engine.collapse_count() >= limit)
            {
                break RunOutcome::StepLimit;
            }

            let result = engine.iterate();
            observer.on_step(&StepEvent {
                seed,
                step: engine.collapse_count(),
                result: &result,
                collapsed_cells: engine.collapsed_cells(),
                cell_count: engine.grid().cell_count(),
            });

            match result {
                StepResult::Progressed(_) => {}
                StepResult::Collapsed => break RunOutcome::Collapsed,
                StepResult::Contradiction(contradiction) => {
                    break RunOutcome::Contradiction(contradiction);
                }
            }
        };

        let report = build_report(seed, &engine, outcome, started)?;
        observer.on_finish(&report);
        Ok(report)
    }

    /// Start a run driven one step at a time by the caller
    ///
    /// # Errors
    ///
    /// Returns an error if preparation fails
    pub fn start_stepped(&self, seed: u64) -> Result<SteppedRun<'c>> {
        let started = Instant::now();
        let engine = self.prepare(seed)?;
        Ok(SteppedRun {
            engine,
            seed,
            started,
        })
    }

    /// Run consecutive seeds until one does not contradict
    ///
    /// Attempt `n` uses `seed + n`. Returns the first report that is not a
    /// contradiction, or the last attempt's report if all contradict.
    ///
    /// # Errors
    ///
    /// Returns an error if `max_attempts` is zero or a run fails
    pub fn run_with_retries(
        &self,
        seed: u64,
        max_attempts: usize,
        observer: &mut impl RunObserver,
    ) -> Result<RunReport> {
        if max_attempts == 0 {
            return Err(invalid_parameter(
                "attempts",
                &max_attempts,
                &"at least one attempt is required",
            ));
        }

        let mut attempt_seed = seed;
        let mut attempt = 1;
        loop {
            let report = self.run(attempt_seed, observer)?;
            if !matches!(report.outcome, RunOutcome::Contradiction(_)) || attempt >= max_attempts
            {
                return Ok(report);
            }
            let next_seed = attempt_seed.wrapping_add(1);
            log::warn!(
                "Seed {attempt_seed} contradicted (attempt {attempt}/{max_attempts}), retrying with seed {next_seed}"
            );
            attempt_seed = next_seed;
            attempt += 1;
        }
    }

    /// Solve independent regions in parallel, one seed per region
    ///
    /// `make_observer` is called once per region with its index and seed.
    /// Reports come back in seed order.
    ///
    /// # Errors
    ///
    /// Returns the first error any region produced
    pub fn run_regions<O, F>(
        &self,
        seeds: &[u64],
        max_attempts: usize,
        make_observer: F,
    ) -> Result<Vec<RunReport>>
    where
        O: RunObserver,
        F: Fn(usize, u64) -> O + Sync,
    {
        let reports = seeds
            .par_iter()
            .enumerate()
            .map(|(index, &seed)| {
                let mut observer = make_observer(index, seed);
                self.run_with_retries(seed, max_attempts, &mut observer)
            })
            .collect::<Result<Vec<_>>>()?;

        let collapsed = reports
            .iter()
            .filter(|report| report.outcome.is_collapsed())
            .count();
        log::info!("{collapsed}/{} regions collapsed", reports.len());
        Ok(reports)
    }
}

/// State of one step of a stepped run
#[derive(Clone, Debug)]
pub struct StepSnapshot {
    /// Collapses performed so far
    pub step: usize,
    /// What `iterate` returned
    pub result: StepResult,
    /// Projection of the grid after the step
    pub projection: Projection,
}

/// A run advanced by explicit ticks, for paced display
#[derive(Clone, Debug)]
pub struct SteppedRun<'c> {
    engine: ConstraintEngine<'c>,
    seed: u64,
    started: Instant,
}

impl<'c> SteppedRun<'c> {
    /// Perform one iterate and project the intermediate grid
    pub fn tick(&mut self) -> StepSnapshot {
        let result = self.engine.iterate();
        StepSnapshot {
            step: self.engine.collapse_count(),
            result,
            projection: project(self.engine.grid(), self.engine.catalog()),
        }
    }

    /// The run reached `Collapsed` or `Contradiction`
    pub const fn is_finished(&self) -> bool {
        matches!(
            self.engine.state(),
            EngineState::Collapsed | EngineState::Contradiction(_)
        )
    }

    /// Engine being stepped
    pub const fn engine(&self) -> &ConstraintEngine<'c> {
        &self.engine
    }

    /// Stop stepping and report; an unfinished run reports `StepLimit`
    ///
    /// # Errors
    ///
    /// Returns an error if the final grid breaks a solver invariant
    pub fn finish(self) -> Result<RunReport> {
        let outcome = match self.engine.state() {
            EngineState::Collapsed => RunOutcome::Collapsed,
            EngineState::Contradiction(contradiction) => RunOutcome::Contradiction(contradiction),
            EngineState::Ready | EngineState::Iterating => RunOutcome::StepLimit,
        };
        build_report(self.seed, &self.engine, outcome, self.started)
    }
}

fn build_report(
    seed: u64,
    engine: &ConstraintEngine<'_>,
    outcome: RunOutcome,
    started: Instant,
) -> Result<RunReport> {
    let grid = engine.grid();
    let (placements, undetermined) = if outcome.is_collapsed() {
        (project_final(grid, engine.catalog())?, Vec::new())
    } else {
        let projection = project(grid, engine.catalog());
        (projection.placements, projection.undetermined)
    };

    let elapsed = started.elapsed();
    log::info!(
        "Seed {seed}: {} after {} steps in {:.2?} ({} placements)",
        outcome.label(),
        engine.collapse_count(),
        elapsed,
        placements.len()
    );

    Ok(RunReport {
        seed,
        size: grid.size(),
        outcome,
        placements,
        undetermined,
        steps: engine.collapse_count(),
        elapsed,
    })
}
