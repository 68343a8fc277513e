//! Multi-run progress tracking with automatic batching for many regions

use crate::algorithm::engine::StepResult;
use crate::algorithm::executor::{RunObserver, RunOutcome, RunReport, StepEvent};
use crate::io::configuration::{MAX_INDIVIDUAL_PROGRESS_BARS, PROGRESS_BAR_WIDTH};
use crate::spatial::grid::Grid;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::LazyLock;

static PROGRESS_STYLE: LazyLock<ProgressStyle> = LazyLock::new(|| {
    ProgressStyle::default_bar()
        .template(&format!(
            "{{msg}} [{{bar:{PROGRESS_BAR_WIDTH}.cyan/blue}}] {{prefix}}"
        ))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏ ")
});

static BATCH_STYLE: LazyLock<ProgressStyle> = LazyLock::new(|| {
    ProgressStyle::default_bar()
        .template("[{elapsed_precise}] Regions: [{bar:40.cyan/blue}] {pos}/{len}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
});

/// Coordinates progress display for one or many runs
///
/// Shows one bar per run for small batches. Larger batches add a batch bar
/// and share the individual bars between runs.
pub struct ProgressManager {
    multi_progress: MultiProgress,
    batch_bar: Option<ProgressBar>,
    run_bars: Vec<ProgressBar>,
}

impl Default for ProgressManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressManager {
    /// Create a new progress manager
    pub fn new() -> Self {
        Self {
            multi_progress: MultiProgress::new(),
            batch_bar: None,
            run_bars: Vec::new(),
        }
    }

    /// Initialize progress bars based on how many runs will execute
    pub fn initialize(&mut self, run_count: usize) {
        // Switch to batch mode for many regions to avoid terminal spam
        if run_count > MAX_INDIVIDUAL_PROGRESS_BARS + 1 {
            let batch_bar = ProgressBar::new(run_count as u64);
            batch_bar.set_style(BATCH_STYLE.clone());
            self.batch_bar = Some(self.multi_progress.add(batch_bar));
        }

        let bars_to_create = run_count.min(MAX_INDIVIDUAL_PROGRESS_BARS);
        for _ in 0..bars_to_create {
            let pb = ProgressBar::new(0);
            pb.set_style(PROGRESS_STYLE.clone());
            self.run_bars.push(self.multi_progress.add(pb));
        }
    }

    /// Observer driving the bar assigned to run `index`
    pub fn observer(&self, index: usize) -> RunProgress {
        let bar = self
            .run_bars
            .get(index % self.run_bars.len().max(1))
            .cloned();
        RunProgress {
            bar,
            batch_bar: self.batch_bar.clone(),
        }
    }

    /// Clean up all progress displays
    pub fn finish(&self) {
        if let Some(ref batch_bar) = self.batch_bar {
            if let Some(length) = batch_bar.length() {
                batch_bar.set_position(length);
            }
            batch_bar.finish_with_message("All regions processed");
        }
        if let Err(e) = self.multi_progress.clear() {
            log::debug!("Could not clear progress display: {e}");
        }
    }
}

/// Progress bar handle for one run
///
/// Cheap to clone and safe to move to another thread.
#[derive(Clone, Debug)]
pub struct RunProgress {
    bar: Option<ProgressBar>,
    batch_bar: Option<ProgressBar>,
}

impl RunObserver for RunProgress {
    fn on_start(&mut self, seed: u64, grid: &Grid) {
        if let Some(ref bar) = self.bar {
            bar.set_length(grid.cell_count() as u64);
            bar.set_position(grid.collapsed_count() as u64);
            bar.set_message(String::new());
            bar.set_prefix(format!("seed {seed}"));
        }
    }

    fn on_step(&mut self, event: &StepEvent<'_>) {
        if let Some(ref bar) = self.bar {
            bar.set_position(event.collapsed_cells as u64);
            let width = event.cell_count.to_string().len();
            let mark = match event.result {
                StepResult::Contradiction(_) => "✗ ",
                StepResult::Progressed(_) | StepResult::Collapsed => "",
            };
            bar.set_message(format!(
                "{mark}{:>width$}/{}",
                event.collapsed_cells, event.cell_count
            ));
        }
    }

    fn on_finish(&mut self, report: &RunReport) {
        if let Some(ref bar) = self.bar {
            let status = match report.outcome {
                RunOutcome::Collapsed => format!("✓ seed {}", report.seed),
                RunOutcome::Contradiction(c) => format!("✗ seed {} at {}", report.seed, c.coord),
                RunOutcome::StepLimit => format!("… seed {}", report.seed),
            };
            bar.set_prefix(status);
        }
        // Contradicted attempts are retried, so only count final successes here
        if let Some(ref batch_bar) = self.batch_bar
            && !matches!(report.outcome, RunOutcome::Contradiction(_))
        {
            batch_bar.inc(1);
        }
    }
}
