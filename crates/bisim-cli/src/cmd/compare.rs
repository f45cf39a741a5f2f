//! The `compare` subcommand: deep structural comparison of two JSON files.

use std::io::ErrorKind;
use std::path::Path;

use bisim_core::{ValueArena, deeply_equal, render};

use crate::error::CliError;

/// Loads both documents, compares them, and prints the report to stdout.
///
/// Returns [`CliError::MismatchesFound`] when the documents differ, so the
/// process exits with code 1 after the report is printed.
pub fn run(expected: &Path, actual: &Path, json: bool) -> Result<(), CliError> {
    let expected_doc = load_json(expected)?;
    let actual_doc = load_json(actual)?;

    let mut arena = ValueArena::new();
    let e = arena.from_json(&expected_doc);
    let a = arena.from_json(&actual_doc);

    let comparison = deeply_equal(&arena, e, a).map_err(|err| CliError::Unsupported {
        detail: err.to_string(),
    })?;

    if json {
        let text =
            serde_json::to_string_pretty(&comparison).map_err(|err| CliError::Unsupported {
                detail: format!("cannot serialize the comparison result: {err}"),
            })?;
        println!("{text}");
    } else {
        print!("{}", render::report(&comparison));
    }

    if comparison.matched {
        Ok(())
    } else {
        Err(CliError::MismatchesFound)
    }
}

fn load_json(path: &Path) -> Result<serde_json::Value, CliError> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return Err(CliError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        Err(err) if err.kind() == ErrorKind::PermissionDenied => {
            return Err(CliError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        Err(err) => {
            return Err(CliError::IoError {
                path: path.to_path_buf(),
                detail: err.to_string(),
            });
        }
    };
    serde_json::from_str(&text).map_err(|err| CliError::ParseError {
        path: path.to_path_buf(),
        detail: err.to_string(),
    })
}
