//! Text encoding of optimized patterns and JSON run statistics

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::algorithm::annealing::{AnnealingStats, OptimizerConfig};
use crate::analysis::palette::ColorPalette;
use crate::analysis::statistics::GridStatistics;
use crate::io::error::{AlgorithmError, Result};
use crate::spatial::grid::Grid;
use crate::spatial::pattern::{ColorIndex, Pattern};

/// One pattern as written to the pattern file
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct EncodedPattern {
    /// Anchor column
    pub x: i32,
    /// Anchor row
    pub y: i32,
    /// Colour index
    pub color_index: ColorIndex,
    /// Shape code: 0 single, 1 horizontal, 2 vertical
    pub pattern_type: u8,
    /// Run length
    pub size: u32,
}

impl From<&Pattern> for EncodedPattern {
    fn from(pattern: &Pattern) -> Self {
        Self {
            x: pattern.min_x(),
            y: pattern.min_y(),
            color_index: pattern.color(),
            pattern_type: pattern.pattern_type().code(),
            size: pattern.size(),
        }
    }
}

impl fmt::Display for EncodedPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{},{}",
            self.x, self.y, self.color_index, self.pattern_type, self.size
        )
    }
}

/// Encoded patterns sorted by row, then column, then colour
pub fn encode_grid(grid: &Grid) -> Vec<EncodedPattern> {
    let mut encoded: Vec<EncodedPattern> = grid.patterns().map(EncodedPattern::from).collect();
    encoded.sort_by_key(|pattern| (pattern.y, pattern.x, pattern.color_index));
    encoded
}

/// Colour map followed by one encoded pattern per line
pub fn format_patterns_output(grid: &Grid, palette: &ColorPalette) -> String {
    let mut lines = vec!["Color Map:".to_string()];
    for (index, _) in palette.entries() {
        if let Some(hex) = palette.hex(index) {
            lines.push(format!("{index}: {hex}"));
        }
    }
    lines.push(String::new());
    lines.push("Encoded Pixel Data:".to_string());
    lines.extend(encode_grid(grid).iter().map(ToString::to_string));
    lines.join("\n")
}

/// Everything written to the statistics file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport<'a> {
    /// Source image
    pub source: &'a Path,
    /// Parameters of the run
    pub config: &'a OptimizerConfig,
    /// Annealing totals
    pub annealing: &'a AnnealingStats,
    /// Grid before optimization
    pub original: GridStatistics,
    /// Grid after optimization
    pub optimized: GridStatistics,
}

/// Write the pattern file
///
/// # Errors
///
/// Returns an error if the file cannot be written
pub fn write_patterns(grid: &Grid, palette: &ColorPalette, output_path: &Path) -> Result<()> {
    ensure_parent(output_path)?;
    fs::write(output_path, format_patterns_output(grid, palette)).map_err(|e| {
        AlgorithmError::FileSystem {
            path: output_path.to_path_buf(),
            operation: "write patterns",
            source: e,
        }
    })
}

/// Write the statistics file as pretty-printed JSON
///
/// # Errors
///
/// Returns an error if:
/// - The report cannot be serialized
/// - The file cannot be written
pub fn write_statistics(report: &RunReport<'_>, output_path: &Path) -> Result<()> {
    let json =
        serde_json::to_string_pretty(report).map_err(|e| AlgorithmError::Serialization {
            path: output_path.to_path_buf(),
            source: e,
        })?;
    ensure_parent(output_path)?;
    fs::write(output_path, json).map_err(|e| AlgorithmError::FileSystem {
        path: output_path.to_path_buf(),
        operation: "write statistics",
        source: e,
    })
}

fn ensure_parent(path: &Path) -> Result<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    fs::create_dir_all(parent).map_err(|e| AlgorithmError::FileSystem {
        path: PathBuf::from(parent),
        operation: "create directory",
        source: e,
    })
}
