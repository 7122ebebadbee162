//! Command-line interface for batch optimization of PNG pixel art

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Parser;
use tracing::{info, warn};

use crate::algorithm::annealing::{OptimizerConfig, PatternOptimizer};
use crate::algorithm::cost::CostWeights;
use crate::algorithm::temperature::TemperatureParameters;
use crate::analysis::palette::{Rgba, parse_hex};
use crate::analysis::statistics::GridStatistics;
use crate::io::configuration::{
    DEFAULT_COOLING_RATE, DEFAULT_MAX_ITERATIONS, DEFAULT_PATTERN_WEIGHT, DEFAULT_SEED,
    DEFAULT_SINGLE_PENALTY, DEFAULT_TRANSITION_WEIGHT, GIF_FRAME_DELAY_MS, PATTERNS_SUFFIX,
    SNAPSHOTS_SUFFIX, STATISTICS_SUFFIX, VISUALIZATION_SUFFIX,
};
use crate::io::encoding::{RunReport, write_patterns, write_statistics};
use crate::io::error::{Result, io_error};
use crate::io::image::{PixelMap, export_pattern_visualization};
use crate::io::progress::ProgressManager;
use crate::io::visualization::SnapshotCapture;

#[derive(Parser, Debug, Clone)]
#[command(name = "pixelruns")]
#[command(
    author,
    version,
    about = "Compress pixel art into horizontal runs, vertical runs and single pixels"
)]
/// Command-line arguments for the pattern optimizer
// CLI tools commonly need multiple boolean flags for various features and user preferences
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    /// Input PNG file or directory to process
    #[arg(value_name = "TARGET")]
    pub target: PathBuf,

    /// Random seed for reproducible optimization
    #[arg(short, long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,

    /// Process files even if output exists
    #[arg(short, long)]
    pub no_skip: bool,

    /// Write a PNG with every pattern outlined by shape
    #[arg(short, long)]
    pub visualize: bool,

    /// Write an animated GIF with one frame per temperature stage
    #[arg(short = 'g', long)]
    pub snapshots: bool,

    /// Cost per pattern
    #[arg(long, default_value_t = DEFAULT_PATTERN_WEIGHT)]
    pub pattern_weight: f64,

    /// Extra cost per single-pixel pattern
    #[arg(long, default_value_t = DEFAULT_SINGLE_PENALTY)]
    pub single_penalty: f64,

    /// Cost per boundary between two patterns
    #[arg(long, default_value_t = DEFAULT_TRANSITION_WEIGHT)]
    pub transition_weight: f64,

    /// Cooling factor between temperature stages
    #[arg(short, long, default_value_t = DEFAULT_COOLING_RATE)]
    pub alpha: f64,

    /// Maximum iterations per temperature stage
    #[arg(short = 'i', long, default_value_t = DEFAULT_MAX_ITERATIONS)]
    pub max_iterations: usize,

    /// Log optimizer progress to stderr
    #[arg(long)]
    pub verbose: bool,

    /// Treat every source pixel as one art pixel
    #[arg(long)]
    pub no_detect_scale: bool,

    /// Only optimize pixels of this colour (#rrggbb or #rgb)
    #[arg(long, value_name = "HEX", value_parser = parse_color)]
    pub single_color: Option<Rgba>,
}

fn parse_color(text: &str) -> std::result::Result<Rgba, String> {
    parse_hex(text).ok_or_else(|| format!("expected #rrggbb or #rgb, got '{text}'"))
}

impl Cli {
    /// Check if existing output files should be skipped
    pub const fn skip_existing(&self) -> bool {
        !self.no_skip
    }

    /// Check if progress should be displayed
    pub const fn should_show_progress(&self) -> bool {
        !self.quiet
    }

    /// Optimizer configuration described by the flags
    pub fn optimizer_config(&self) -> OptimizerConfig {
        let defaults = TemperatureParameters::default();
        OptimizerConfig {
            cost_weights: CostWeights {
                pattern_weight: self.pattern_weight,
                single_penalty: self.single_penalty,
                transition_weight: self.transition_weight,
            },
            temperature: TemperatureParameters {
                alpha: self.alpha,
                max_iterations: self.max_iterations,
                min_iterations: defaults.min_iterations.min(self.max_iterations),
                ..defaults
            },
            seed: self.seed,
            ..OptimizerConfig::default()
        }
    }
}

/// Orchestrates batch processing of PNG files with progress tracking
pub struct FileProcessor {
    cli: Cli,
    progress_manager: Option<ProgressManager>,
}

impl FileProcessor {
    /// Create a new file processor with the given CLI arguments
    pub fn new(cli: Cli) -> Self {
        let progress_manager = cli.should_show_progress().then(ProgressManager::new);

        Self {
            cli,
            progress_manager,
        }
    }

    /// Process files according to CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if target validation or file processing fails
    pub fn process(&mut self) -> Result<()> {
        self.cli.optimizer_config().validate()?;
        let files = self.collect_files()?;

        if files.is_empty() {
            return Ok(());
        }

        if let Some(ref mut pm) = self.progress_manager {
            pm.initialize(files.len());
        }

        for (index, file) in files.iter().enumerate() {
            self.process_file(file, index)?;
        }

        if let Some(ref mut pm) = self.progress_manager {
            pm.finish();
        }

        Ok(())
    }

    /// PNG files selected by the target, minus those already processed
    ///
    /// # Errors
    ///
    /// Returns an error if the target is neither a PNG file nor a directory
    pub fn collect_files(&self) -> Result<Vec<PathBuf>> {
        if self.cli.target.is_file() {
            if !is_png(&self.cli.target) {
                return Err(io_error("Target file must be a PNG image"));
            }
            if self.should_process_file(&self.cli.target) {
                Ok(vec![self.cli.target.clone()])
            } else {
                Ok(vec![])
            }
        } else if self.cli.target.is_dir() {
            let mut files = Vec::new();
            for entry in std::fs::read_dir(&self.cli.target)? {
                let path = entry?.path();
                if is_png(&path) && !is_generated(&path) && self.should_process_file(&path) {
                    files.push(path);
                }
            }
            files.sort();
            Ok(files)
        } else {
            Err(io_error("Target must be a PNG file or directory"))
        }
    }

    fn should_process_file(&self, input_path: &Path) -> bool {
        if !self.cli.skip_existing() {
            return true;
        }

        if output_path(input_path, PATTERNS_SUFFIX).exists() {
            warn!("Skipping {} (output exists)", input_path.display());
            false
        } else {
            true
        }
    }

    fn process_file(&mut self, input_path: &Path, index: usize) -> Result<()> {
        let start_time = Instant::now();

        if let Some(ref mut pm) = self.progress_manager {
            pm.start_file(index, input_path);
        }

        let mut source = PixelMap::from_png_file(input_path, !self.cli.no_detect_scale)?;
        if let Some(color) = self.cli.single_color {
            source = source.retain_color(color)?;
        }
        let grid = source.to_grid()?;
        let original = GridStatistics::calculate(&grid);
        info!(
            "Loaded {}: {}x{} art pixels (scale {}), {} colours, {} pixels",
            input_path.display(),
            source.width,
            source.height,
            source.scale,
            source.palette.len(),
            source.pixels.len()
        );

        let config = self.cli.optimizer_config();
        let mut optimizer = PatternOptimizer::new(grid, config)?;
        if self.cli.snapshots {
            optimizer.enable_snapshots(SnapshotCapture::new(source.palette.clone()));
        }

        while let Some(report) = optimizer.execute_stage() {
            if let Some(ref mut pm) = self.progress_manager {
                pm.update_stage(index, report.stage, report.total_stages, report.pattern_count);
            }
        }

        if let Some(capture) = optimizer.snapshots() {
            capture.export_gif(&output_path(input_path, SNAPSHOTS_SUFFIX), GIF_FRAME_DELAY_MS)?;
        }

        let (best, stats) = optimizer.finish();
        let optimized = GridStatistics::calculate(&best);

        write_patterns(&best, &source.palette, &output_path(input_path, PATTERNS_SUFFIX))?;
        write_statistics(
            &RunReport {
                source: input_path,
                config: &config,
                annealing: &stats,
                original,
                optimized,
            },
            &output_path(input_path, STATISTICS_SUFFIX),
        )?;

        if self.cli.visualize {
            export_pattern_visualization(
                &best,
                &source.palette,
                &output_path(input_path, VISUALIZATION_SUFFIX),
            )?;
        }

        if let Some(ref mut pm) = self.progress_manager {
            pm.complete_file(index, best.len());
        }
        info!(
            "{}: {} -> {} patterns ({:.0}% fewer) in {:.2}s",
            input_path.display(),
            original.total_patterns,
            optimized.total_patterns,
            optimized.reduction_from(&original) * 100.0,
            start_time.elapsed().as_secs_f64()
        );

        Ok(())
    }
}

fn is_png(path: &Path) -> bool {
    path.extension().and_then(|s| s.to_str()) == Some("png")
}

// Renderings written next to their source must not be picked up as inputs
fn is_generated(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(VISUALIZATION_SUFFIX))
}

/// Sibling of `input_path` named `<stem><suffix>`
pub fn output_path(input_path: &Path, suffix: &str) -> PathBuf {
    let stem = input_path.file_stem().unwrap_or_default();
    let output_name = format!("{}{suffix}", stem.to_string_lossy());

    if let Some(parent) = input_path.parent() {
        parent.join(output_name)
    } else {
        PathBuf::from(output_name)
    }
}
