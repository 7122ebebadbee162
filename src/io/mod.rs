//! Input/output, configuration and error handling

/// Command-line interface and batch file processing
pub mod cli;
/// Tuning constants and defaults
pub mod configuration;
/// Pattern text encoding and statistics export
pub mod encoding;
/// Error types shared by the whole crate
pub mod error;
/// PNG loading and pattern outline rendering
pub mod image;
/// Terminal progress display
pub mod progress;
/// Stage snapshot capture and GIF export
pub mod visualization;
