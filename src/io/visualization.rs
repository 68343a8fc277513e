//! Step capture and GIF generation for solver visualization

use image::{Delay, Frame};
use std::path::Path;

use crate::algorithm::engine::StepResult;
use crate::algorithm::executor::{RunObserver, StepEvent};
use crate::io::configuration::VIEWER_MIN_FRAME_DELAY_MS;
use crate::io::error::{Result, WfcError, invalid_parameter};
use crate::io::image::{Palette, render_top_down, top_down_columns};
use crate::spatial::grid::{Coord, Grid, GridSize};

/// A cell reaching a single prototype during a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellPlacement {
    /// Cell coordinates
    pub coord: Coord,
    /// Catalog index the cell collapsed to
    pub prototype: usize,
    /// Collapse step it happened in, 0 for cells decided before the first step
    pub step: usize,
}

/// Records collapses during a run to replay them as an animation
///
/// Restarts on every `on_start`, so with retries only the last attempt is
/// kept.
#[derive(Debug, Clone)]
pub struct VisualizationCapture {
    palette: Palette,
    size: Option<GridSize>,
    placements: Vec<CellPlacement>,
}

impl VisualizationCapture {
    /// Create an empty capture drawing with `palette`
    pub const fn new(palette: Palette) -> Self {
        Self {
            palette,
            size: None,
            placements: Vec::new(),
        }
    }

    /// Returns all recorded placement events
    pub fn placements(&self) -> &[CellPlacement] {
        &self.placements
    }

    /// Returns the total number of placement events
    pub const fn placement_count(&self) -> usize {
        self.placements.len()
    }

    /// Export the captured steps as a GIF with automatic frame skipping
    ///
    /// One frame is drawn per collapse step. Requested delays below what
    /// viewers support are raised to `VIEWER_MIN_FRAME_DELAY_MS` and steps are
    /// skipped to keep the apparent animation speed.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No run was captured
    /// - File system operations fail
    /// - GIF encoding fails
    pub fn export_gif(&self, output_path: &Path, frame_delay_ms: u32) -> Result<()> {
        let Some(size) = self.size else {
            return Err(invalid_parameter(
                "visualization",
                &"empty",
                &"no run was captured",
            ));
        };

        let frame_delay_ms = frame_delay_ms.max(1);
        let effective_delay_ms = frame_delay_ms.max(VIEWER_MIN_FRAME_DELAY_MS);
        let skip_factor = if frame_delay_ms < VIEWER_MIN_FRAME_DELAY_MS {
            VIEWER_MIN_FRAME_DELAY_MS.div_ceil(frame_delay_ms) as usize
        } else {
            1
        };

        let frames = self.generate_frames(size, effective_delay_ms, skip_factor)?;

        if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| WfcError::FileSystem {
                path: parent.to_path_buf(),
                operation: "create directory",
                source: e,
            })?;
        }

        let file = std::fs::File::create(output_path).map_err(|e| WfcError::FileSystem {
            path: output_path.to_path_buf(),
            operation: "create file",
            source: e,
        })?;

        let mut encoder = image::codecs::gif::GifEncoder::new(file);
        encoder
            .encode_frames(frames)
            .map_err(|e| WfcError::ImageExport {
                path: output_path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    fn generate_frames(
        &self,
        size: GridSize,
        delay_ms: u32,
        skip_factor: usize,
    ) -> Result<Vec<Frame>> {
        let mut cells = vec![None; size.cell_count()];
        let mut frames = Vec::new();
        let mut pending = 0_usize;
        let mut current_step = None;

        for placement in &self.placements {
            if current_step.is_some_and(|step| step != placement.step) {
                pending += 1;
                if pending % skip_factor == 0 {
                    frames.push(self.render_frame(size, &cells, delay_ms)?);
                }
            }
            current_step = Some(placement.step);

            let Coord { x, y, z } = placement.coord;
            if let Some(cell) = cells.get_mut(x + y * size.x + z * size.x * size.y) {
                *cell = Some(placement.prototype);
            }
        }

        frames.push(self.render_frame(size, &cells, delay_ms)?);

        // Final frame displays longer for better visibility
        if let Some(last_frame_img) = frames.last().map(|f| f.buffer().clone()) {
            frames.push(Frame::from_parts(
                last_frame_img,
                0,
                0,
                Delay::from_numer_denom_ms(delay_ms * 25, 1),
            ));
        }

        Ok(frames)
    }

    fn render_frame(&self, size: GridSize, cells: &[Option<usize>], delay_ms: u32) -> Result<Frame> {
        let columns = top_down_columns(size, cells, &self.palette);
        let img = render_top_down(size, &columns, &self.palette)?;
        Ok(Frame::from_parts(
            img,
            0,
            0,
            Delay::from_numer_denom_ms(delay_ms, 1),
        ))
    }
}

impl RunObserver for VisualizationCapture {
    fn on_start(&mut self, _seed: u64, grid: &Grid) {
        self.size = Some(grid.size());
        self.placements.clear();
        for cell in grid.cells() {
            if let Some(prototype) = cell.domain.only() {
                self.placements.push(CellPlacement {
                    coord: cell.coord,
                    prototype,
                    step: 0,
                });
            }
        }
    }

    fn on_step(&mut self, event: &StepEvent<'_>) {
        if let StepResult::Progressed(collapse) = event.result {
            for &(coord, prototype) in &collapse.newly_collapsed {
                self.placements.push(CellPlacement {
                    coord,
                    prototype,
                    step: event.step,
                });
            }
        }
    }
}
