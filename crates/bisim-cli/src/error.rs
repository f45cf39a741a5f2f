//! CLI error types with associated exit codes.
//!
//! [`CliError`] is the top-level error type for the `bisim` binary. Every
//! variant maps to a stable exit code via [`CliError::exit_code`]:
//!
//! - Exit code **2** — input failure: an input could not be read or parsed,
//!   or asked for a comparison the engine cannot perform.
//! - Exit code **1** — logical failure: the comparison ran to completion and
//!   the documents differ.

use std::fmt;
use std::path::PathBuf;

/// All error conditions that the `bisim` CLI can produce.
///
/// Use [`CliError::exit_code`] to obtain the exit code associated with each
/// variant. [`CliError::message`] returns the human-readable error string
/// that should be printed to stderr before exiting.
#[derive(Debug)]
pub enum CliError {
    // --- Exit code 2: input failures ---
    /// A file argument could not be found on the filesystem.
    FileNotFound {
        /// The path that was not found.
        path: PathBuf,
    },

    /// The process lacks permission to read a file.
    PermissionDenied {
        /// The path that could not be read.
        path: PathBuf,
    },

    /// A generic I/O error while reading an input file.
    IoError {
        /// The path being read.
        path: PathBuf,
        /// The underlying I/O error message.
        detail: String,
    },

    /// An input file is not valid JSON.
    ParseError {
        /// The path being parsed.
        path: PathBuf,
        /// The parser's error message, with line and column.
        detail: String,
    },

    /// The comparison engine rejected the input (no decomposition strategy
    /// applied to some value).
    Unsupported {
        /// The engine's error message.
        detail: String,
    },

    // --- Exit code 1: logical failures ---
    /// The comparison completed and found mismatches.
    ///
    /// The report has already been printed; this variant exists so `main`
    /// can call `process::exit(1)` cleanly.
    MismatchesFound,
}

impl CliError {
    /// Returns the process exit code for this error.
    ///
    /// - `2` — input failure (file not found, parse error, etc.).
    /// - `1` — logical failure (the documents differ).
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::FileNotFound { .. }
            | Self::PermissionDenied { .. }
            | Self::IoError { .. }
            | Self::ParseError { .. }
            | Self::Unsupported { .. } => 2,

            Self::MismatchesFound => 1,
        }
    }

    /// Returns a human-readable error message suitable for printing to stderr.
    pub fn message(&self) -> String {
        match self {
            Self::FileNotFound { path } => {
                format!("error: file not found: {}", path.display())
            }
            Self::PermissionDenied { path } => {
                format!("error: permission denied: {}", path.display())
            }
            Self::IoError { path, detail } => {
                format!("error: I/O error reading {}: {detail}", path.display())
            }
            Self::ParseError { path, detail } => {
                format!("error: invalid JSON in {}: {detail}", path.display())
            }
            Self::Unsupported { detail } => {
                format!("error: {detail}")
            }
            Self::MismatchesFound => "error: documents differ".to_owned(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

impl std::error::Error for CliError {}
