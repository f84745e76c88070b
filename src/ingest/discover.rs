// src/ingest/discover.rs

use anyhow::{Context, Result};
use glob::{glob_with, MatchOptions, Pattern};
use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
};
use tracing::{debug, warn};

pub const DEFAULT_PATTERNS: [&str; 3] = ["**/*.fits", "**/*.fit", "**/*.fts"];

/// Expand inputs into a sorted, de-duplicated list of files.
///
/// Directories are searched with `patterns` (case-insensitive); plain file
/// paths are taken as given. Inputs that do not exist are skipped.
pub fn discover_files<P: AsRef<Path>>(inputs: &[P], patterns: &[String]) -> Result<Vec<PathBuf>> {
    let options = MatchOptions {
        case_sensitive: false,
        ..MatchOptions::new()
    };
    let mut found = BTreeSet::new();

    for input in inputs {
        let input = input.as_ref();
        if input.is_file() {
            found.insert(input.to_path_buf());
            continue;
        }
        if !input.is_dir() {
            warn!(input = %input.display(), "input does not exist, skipping");
            continue;
        }
        for pattern in patterns {
            let full = format!("{}/{}", Pattern::escape(&input.to_string_lossy()), pattern);
            let entries = glob_with(&full, options)
                .with_context(|| format!("invalid glob pattern '{}'", full))?;
            for entry in entries {
                match entry {
                    Ok(path) if path.is_file() => {
                        found.insert(path);
                    }
                    Ok(_) => {}
                    Err(e) => debug!(error = %e, "unreadable path during discovery"),
                }
            }
        }
    }

    Ok(found.into_iter().collect())
}
