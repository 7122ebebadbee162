//! Per-file stage progress with automatic batching for large sets

use std::path::Path;
use std::sync::LazyLock;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use crate::io::configuration::MAX_INDIVIDUAL_PROGRESS_BARS;

/// Display state of one file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileState {
    /// File name shown next to the bar
    pub name: String,
    /// Stages completed
    pub stage: usize,
    /// Stages in the schedule, 0 until calibrated
    pub total_stages: usize,
    /// Live patterns after the latest stage
    pub patterns: usize,
    /// Whether the file is done
    pub finished: bool,
}

impl FileState {
    /// Text shown after the bar
    pub fn message(&self) -> String {
        let width = self.total_stages.to_string().len();
        format!(
            "{:>width$}/{} stages, {} patterns",
            self.stage, self.total_stages, self.patterns
        )
    }

    /// Text shown before the bar
    pub fn label(&self) -> String {
        if self.finished {
            format!("✓ {}", self.name)
        } else {
            self.name.clone()
        }
    }
}

/// Coordinates progress display for batch operations
///
/// Small batches get one bar per file; large batches get a batch bar plus a
/// rolling window of the most recent files.
pub struct ProgressManager {
    multi_progress: MultiProgress,
    batch_bar: Option<ProgressBar>,
    file_bars: Vec<ProgressBar>,
    file_states: Vec<FileState>,
}

impl Default for ProgressManager {
    fn default() -> Self {
        Self::new()
    }
}

static STAGE_STYLE: LazyLock<ProgressStyle> = LazyLock::new(|| {
    ProgressStyle::default_bar()
        .template("{prefix} [{bar:30.cyan/blue}] {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏ ")
});

static BATCH_STYLE: LazyLock<ProgressStyle> = LazyLock::new(|| {
    ProgressStyle::default_bar()
        .template("[{elapsed_precise}] Files: [{bar:40.cyan/blue}] {pos}/{len}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
});

impl ProgressManager {
    /// Create a new progress manager
    pub fn new() -> Self {
        Self {
            multi_progress: MultiProgress::new(),
            batch_bar: None,
            file_bars: Vec::new(),
            file_states: Vec::new(),
        }
    }

    /// Create bars for `file_count` files
    pub fn initialize(&mut self, file_count: usize) {
        // Switch to batch mode for large file sets to avoid terminal spam
        if file_count > MAX_INDIVIDUAL_PROGRESS_BARS + 1 {
            let batch_bar = ProgressBar::new(file_count as u64);
            batch_bar.set_style(BATCH_STYLE.clone());
            self.batch_bar = Some(self.multi_progress.add(batch_bar));
        }

        for _ in 0..file_count.min(MAX_INDIVIDUAL_PROGRESS_BARS) {
            let bar = ProgressBar::new(0);
            bar.set_style(STAGE_STYLE.clone());
            self.file_bars.push(self.multi_progress.add(bar));
        }
    }

    /// Register a file before its optimization starts
    pub fn start_file(&mut self, index: usize, path: &Path) {
        let name = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        if index >= self.file_states.len() {
            self.file_states.resize(index + 1, FileState::default());
        }
        if let Some(state) = self.file_states.get_mut(index) {
            *state = FileState {
                name,
                ..FileState::default()
            };
        }
        self.update_bars();
    }

    /// Report a finished stage
    pub fn update_stage(&mut self, index: usize, stage: usize, total_stages: usize, patterns: usize) {
        if let Some(state) = self.file_states.get_mut(index) {
            state.stage = stage;
            state.total_stages = total_stages;
            state.patterns = patterns;
        }
        self.update_bars();
    }

    /// Mark a file as done and advance the batch bar
    pub fn complete_file(&mut self, index: usize, patterns: usize) {
        if let Some(ref batch_bar) = self.batch_bar {
            batch_bar.inc(1);
        }
        if let Some(state) = self.file_states.get_mut(index) {
            state.stage = state.total_stages;
            state.patterns = patterns;
            state.finished = true;
        }
        self.update_bars();
    }

    /// Display state of a file
    pub fn file_state(&self, index: usize) -> Option<&FileState> {
        self.file_states.get(index)
    }

    /// Clean up all progress displays
    pub fn finish(&self) {
        if let Some(ref batch_bar) = self.batch_bar {
            batch_bar.finish_with_message("All files processed");
        }
        let _ = self.multi_progress.clear();
    }

    // Show the most recent files in the available bars
    fn update_bars(&self) {
        let active: Vec<&FileState> = self
            .file_states
            .iter()
            .filter(|state| !state.name.is_empty())
            .collect();
        let start = active.len().saturating_sub(MAX_INDIVIDUAL_PROGRESS_BARS);
        let visible = active.get(start..).unwrap_or(&[]);

        for (bar, state) in self.file_bars.iter().zip(visible) {
            bar.set_length(state.total_stages as u64);
            bar.set_position(state.stage as u64);
            bar.set_message(state.message());
            bar.set_prefix(state.label());
        }

        for bar in self.file_bars.iter().skip(visible.len()) {
            bar.set_length(0);
            bar.set_position(0);
            bar.set_message(String::new());
            bar.set_prefix(String::new());
        }
    }
}
