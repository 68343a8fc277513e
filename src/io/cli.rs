//! Command-line interface for solving a prototype catalog into placements

use crate::algorithm::executor::{Both, Driver, RunConfig, RunOutcome, RunReport};
use crate::catalog::{Catalog, CatalogOptions, SymmetryPolicy};
use crate::io::configuration::{
    DEFAULT_GRID_SIZE, DEFAULT_MAX_ATTEMPTS, DEFAULT_SEED, DEFAULT_VOID_PROTOTYPE,
    GIF_FRAME_DELAY_MS, OUTPUT_SUFFIX, PREVIEW_SUFFIX, VISUALIZATION_SUFFIX,
};
use crate::io::error::{Result, invalid_parameter};
use crate::io::export::export_reports;
use crate::io::image::{Palette, export_preview};
use crate::io::progress::ProgressManager;
use crate::io::visualization::VisualizationCapture;
use crate::spatial::grid::GridSize;
use clap::Parser;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "collapse3d")]
#[command(
    author,
    version,
    about = "Solve a 3D tile catalog into mesh placements by wave function collapse"
)]
/// Command-line arguments for the solver
// CLI tools commonly need multiple boolean flags for various features and user preferences
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    /// Prototype catalog JSON file
    #[arg(value_name = "CATALOG")]
    pub catalog: PathBuf,

    /// Random seed for reproducible generation
    #[arg(short, long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Grid dimensions as XxYxZ, Y is vertical
    #[arg(long, default_value_t = GridSize::from(DEFAULT_GRID_SIZE))]
    pub size: GridSize,

    /// Prototype id standing for open space around the grid
    #[arg(long, default_value = DEFAULT_VOID_PROTOTYPE)]
    pub void_id: String,

    /// Seeds tried per region before giving up on contradictions
    #[arg(short, long, default_value_t = DEFAULT_MAX_ATTEMPTS)]
    pub attempts: usize,

    /// Independent regions solved in parallel
    #[arg(short, long, default_value_t = 1)]
    pub regions: usize,

    /// Stop each run after this many collapses
    #[arg(long)]
    pub max_steps: Option<usize>,

    /// Skip propagating the boundary pass before the first collapse
    #[arg(long)]
    pub no_settle: bool,

    /// Drop one-sided neighbour declarations instead of rejecting the catalog
    #[arg(long)]
    pub repair_asymmetry: bool,

    /// Catalog rotations use the legacy turning convention
    #[arg(long)]
    pub legacy_rotation: bool,

    /// Placement JSON path (defaults to <catalog>_placements.json)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Write a top-down PNG preview next to the output
    #[arg(short, long)]
    pub preview: bool,

    /// Write an animated GIF of the collapse order
    #[arg(short, long)]
    pub visualize: bool,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Check if progress should be displayed
    pub const fn should_show_progress(&self) -> bool {
        !self.quiet
    }

    /// Catalog build options selected by flags
    pub const fn catalog_options(&self) -> CatalogOptions {
        CatalogOptions {
            symmetry: if self.repair_asymmetry {
                SymmetryPolicy::Intersect
            } else {
                SymmetryPolicy::Strict
            },
            legacy_rotation: self.legacy_rotation,
        }
    }

    /// Run configuration selected by flags
    pub fn run_config(&self) -> RunConfig {
        RunConfig {
            size: self.size,
            void_id: self.void_id.clone(),
            settle_boundaries: !self.no_settle,
            max_steps: self.max_steps,
        }
    }

    /// Base seed of each region, spaced so retries never overlap
    pub fn region_seeds(&self) -> Vec<u64> {
        let stride = self.attempts.max(1) as u64;
        (0..self.regions as u64)
            .map(|region| self.seed.wrapping_add(region.wrapping_mul(stride)))
            .collect()
    }

    /// Where placements are written
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| sibling_path(&self.catalog, OUTPUT_SUFFIX, "json"))
    }

    /// Where the preview image is written
    pub fn preview_path(&self) -> PathBuf {
        sibling_path(&self.output_path(), PREVIEW_SUFFIX, "png")
    }

    /// Where the visualization is written
    pub fn visualization_path(&self) -> PathBuf {
        sibling_path(&self.output_path(), VISUALIZATION_SUFFIX, "gif")
    }
}

/// `<dir>/<stem><suffix>.<extension>` for a path
fn sibling_path(path: &Path, suffix: &str, extension: &str) -> PathBuf {
    let stem = path.file_stem().unwrap_or_default();
    let name = format!("{}{suffix}.{extension}", stem.to_string_lossy());

    if let Some(parent) = path.parent() {
        parent.join(name)
    } else {
        PathBuf::from(name)
    }
}

/// Orchestrates one invocation: load, solve, export
pub struct Runner {
    cli: Cli,
    progress_manager: Option<ProgressManager>,
}

impl Runner {
    /// Create a runner for parsed arguments
    pub fn new(cli: Cli) -> Self {
        let progress_manager = cli.should_show_progress().then(ProgressManager::new);

        Self {
            cli,
            progress_manager,
        }
    }

    /// Solve the catalog and write every requested output
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The catalog cannot be read or is invalid
    /// - The run configuration does not fit the catalog
    /// - Writing any output fails
    pub fn process(&mut self) -> Result<Vec<RunReport>> {
        if self.cli.regions == 0 {
            return Err(invalid_parameter(
                "regions",
                &self.cli.regions,
                &"at least one region is required",
            ));
        }

        let catalog = Catalog::from_path(&self.cli.catalog, &self.cli.catalog_options())?;
        let driver = Driver::new(&catalog, self.cli.run_config())?;
        let palette = Palette::from_catalog(&catalog, &self.cli.void_id);
        let seeds = self.cli.region_seeds();

        if let Some(ref mut pm) = self.progress_manager {
            pm.initialize(seeds.len());
        }

        let reports = if let [seed] = seeds.as_slice() {
            let progress = self.progress_manager.as_ref().map(|pm| pm.observer(0));
            let capture = self
                .cli
                .visualize
                .then(|| VisualizationCapture::new(palette.clone()));
            let mut observer = Both(progress, capture);
            let report = driver.run_with_retries(*seed, self.cli.attempts, &mut observer)?;

            if let Both(_, Some(capture)) = &observer {
                capture.export_gif(&self.cli.visualization_path(), GIF_FRAME_DELAY_MS)?;
            }
            vec![report]
        } else {
            if self.cli.visualize {
                log::warn!("Visualization is only captured for single-region runs");
            }
            let progress = self.progress_manager.as_ref();
            driver.run_regions(&seeds, self.cli.attempts, |index, _seed| {
                progress.map(|pm| pm.observer(index))
            })?
        };

        if let Some(ref pm) = self.progress_manager {
            pm.finish();
        }

        for report in &reports {
            if let RunOutcome::Contradiction(contradiction) = report.outcome {
                log::warn!(
                    "Seed {} ended in a contradiction at {} after {} steps",
                    report.seed,
                    contradiction.coord,
                    contradiction.step
                );
            }
        }

        export_reports(&reports, &self.cli.output_path())?;

        if self.cli.preview {
            let base = self.cli.preview_path();
            for (index, report) in reports.iter().enumerate() {
                if report.placements.is_empty() {
                    log::warn!("Seed {}: nothing collapsed, no preview written", report.seed);
                    continue;
                }
                let path = if reports.len() == 1 {
                    base.clone()
                } else {
                    sibling_path(&base, &format!("_{index}"), "png")
                };
                export_preview(report.size, &report.placements, &palette, &path)?;
            }
        }

        Ok(reports)
    }
}
