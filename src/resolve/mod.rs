//! Per-file field resolution.
//!
//! [`Engine::resolve`] takes one file's [`HeaderFields`](crate::fits::HeaderFields)
//! through identity injection, header aliasing, coercion, defaults,
//! computed rules and the required-field audit, producing a
//! [`Resolution`].

pub mod engine;
pub mod fields;
pub mod rules;

pub use crate::geometry::AbortReason;
pub use engine::Engine;
pub use fields::{FieldRecord, FieldsInfo};
pub use rules::{RuleContext, RuleFn, RuleRegistry};

use std::{
    fs, io,
    path::{Path, PathBuf},
};

/// File-level facts injected into `file_name`, `file_path` and `file_size`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileIdentity {
    pub name: String,
    pub path: PathBuf,
    pub size: Option<u64>,
}

impl FileIdentity {
    pub fn new(path: impl Into<PathBuf>, size: Option<u64>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { name, path, size }
    }

    /// Absolute path and size of an existing file.
    pub fn from_path(path: &Path) -> io::Result<Self> {
        let abs = fs::canonicalize(path)?;
        let size = fs::metadata(&abs)?.len();
        Ok(Self::new(abs, Some(size)))
    }

    /// File name without its FITS extension.
    pub fn stem(&self) -> &str {
        let lower = self.name.to_ascii_lowercase();
        for ext in [".fits", ".fit", ".fts"] {
            if lower.ends_with(ext) {
                return &self.name[..self.name.len() - ext.len()];
            }
        }
        &self.name
    }
}

/// A fully resolved record and the required fields it still lacks.
#[derive(Debug, Clone)]
pub struct ResolvedRecord {
    pub fields: FieldsInfo,
    pub missing: Vec<String>,
}

impl ResolvedRecord {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Outcome of resolving one file.
#[derive(Debug, Clone)]
pub enum Resolution {
    Resolved(ResolvedRecord),
    Aborted(AbortReason),
}

impl Resolution {
    pub fn record(&self) -> Option<&ResolvedRecord> {
        match self {
            Resolution::Resolved(r) => Some(r),
            Resolution::Aborted(_) => None,
        }
    }
}
