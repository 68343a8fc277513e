//! Input/output: command line, configuration, errors and file exports

/// Command-line interface and run orchestration
pub mod cli;
/// Constants and defaults
pub mod configuration;
/// Error types and helpers
pub mod error;
/// JSON placement export
pub mod export;
/// Top-down PNG previews
pub mod image;
/// Terminal progress bars
pub mod progress;
/// GIF capture of the collapse order
pub mod visualization;
