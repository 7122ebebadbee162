//! Per-stage grid snapshots and animated GIF export

use std::path::Path;

use image::{Delay, Frame, RgbaImage};

use crate::analysis::palette::ColorPalette;
use crate::io::configuration::{
    MAX_SNAPSHOT_FRAMES, SNAPSHOT_PIXEL_SIZE, VIEWER_MIN_FRAME_DELAY_MS,
};
use crate::io::error::{AlgorithmError, Result};
use crate::io::image::render_pattern_outlines;
use crate::spatial::grid::Grid;

// GIF frame delays are stored as 16-bit centiseconds
const MAX_GIF_DELAY_MS: u32 = u16::MAX as u32 * 10;

/// Captures rendered frames of optimizer stages
///
/// At most `max_frames` evenly spaced frames are kept. Once the limit is
/// exceeded every other kept frame is dropped and the capture stride doubles.
/// The most recent capture is always retained so the animation ends on the
/// final grid.
#[derive(Debug, Clone)]
pub struct SnapshotCapture {
    palette: ColorPalette,
    pixel_size: u32,
    max_frames: usize,
    stride: usize,
    captured: usize,
    frames: Vec<RgbaImage>,
    latest: Option<RgbaImage>,
}

impl SnapshotCapture {
    /// Create a capture rendering with the given palette
    pub fn new(palette: ColorPalette) -> Self {
        Self::with_pixel_size(palette, SNAPSHOT_PIXEL_SIZE)
    }

    /// Create a capture with a custom cell size in output pixels
    pub fn with_pixel_size(palette: ColorPalette, pixel_size: u32) -> Self {
        Self {
            palette,
            pixel_size: pixel_size.max(1),
            max_frames: MAX_SNAPSHOT_FRAMES,
            stride: 1,
            captured: 0,
            frames: Vec::new(),
            latest: None,
        }
    }

    /// Replace the number of evenly spaced frames kept, at least 2
    #[must_use]
    pub fn with_frame_limit(mut self, max_frames: usize) -> Self {
        self.max_frames = max_frames.max(2);
        self
    }

    /// Render the current grid, keeping it if it falls on the stride
    pub fn capture(&mut self, grid: &Grid) {
        let frame = render_pattern_outlines(grid, &self.palette, self.pixel_size);
        if self.captured % self.stride == 0 {
            self.frames.push(frame);
            self.latest = None;
            if self.frames.len() > self.max_frames {
                self.thin();
            }
        } else {
            self.latest = Some(frame);
        }
        self.captured += 1;
    }

    // Keep captures on the doubled stride
    fn thin(&mut self) {
        if self.frames.len() % 2 == 0 {
            self.latest = self.frames.last().cloned();
        }
        let mut position = 0;
        self.frames.retain(|_| {
            let keep = position % 2 == 0;
            position += 1;
            keep
        });
        self.stride = self.stride.saturating_mul(2);
    }

    /// Number of frames held, including the latest capture
    pub fn frame_count(&self) -> usize {
        self.frames.len() + usize::from(self.latest.is_some())
    }

    /// Held frames in stage order, ending with the latest capture
    pub fn frames(&self) -> impl Iterator<Item = &RgbaImage> {
        self.frames.iter().chain(self.latest.as_ref())
    }

    /// Export the captured frames as a GIF with automatic frame skipping
    ///
    /// Frames are dropped when the requested delay is below what viewers
    /// display reliably, so the animation keeps its apparent speed.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No frames were captured
    /// - File system operations fail
    /// - GIF encoding fails
    pub fn export_gif(&self, output_path: &Path, frame_delay_ms: u32) -> Result<()> {
        if self.frame_count() == 0 {
            return Err(AlgorithmError::InvalidSourceData {
                reason: "No stage snapshots captured for visualization".to_string(),
            });
        }

        let frame_delay_ms = frame_delay_ms.clamp(1, MAX_GIF_DELAY_MS);
        let effective_delay_ms = frame_delay_ms.max(VIEWER_MIN_FRAME_DELAY_MS);
        let skip_factor = if frame_delay_ms < VIEWER_MIN_FRAME_DELAY_MS {
            VIEWER_MIN_FRAME_DELAY_MS.div_ceil(frame_delay_ms) as usize
        } else {
            1
        };

        let frames = self.generate_frames(effective_delay_ms, skip_factor);

        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AlgorithmError::FileSystem {
                path: parent.to_path_buf(),
                operation: "create directory",
                source: e,
            })?;
        }

        let file = std::fs::File::create(output_path).map_err(|e| AlgorithmError::FileSystem {
            path: output_path.to_path_buf(),
            operation: "create file",
            source: e,
        })?;

        let mut encoder = image::codecs::gif::GifEncoder::new(file);
        encoder
            .encode_frames(frames)
            .map_err(|e| AlgorithmError::ImageExport {
                path: output_path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    fn generate_frames(&self, delay_ms: u32, skip_factor: usize) -> Vec<Frame> {
        let delay = Delay::from_numer_denom_ms(delay_ms, 1);
        let held: Vec<&RgbaImage> = self.frames().collect();
        let mut frames: Vec<Frame> = held
            .iter()
            .step_by(skip_factor.max(1))
            .map(|img| Frame::from_parts((*img).clone(), 0, 0, delay))
            .collect();

        // The final stage is always shown and held longer
        if let Some(last) = held.last() {
            if (held.len() - 1) % skip_factor.max(1) != 0 {
                frames.push(Frame::from_parts((*last).clone(), 0, 0, delay));
            }
            frames.push(Frame::from_parts(
                (*last).clone(),
                0,
                0,
                Delay::from_numer_denom_ms(delay_ms.saturating_mul(25).min(MAX_GIF_DELAY_MS), 1),
            ));
        }

        frames
    }
}
