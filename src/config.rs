// src/config.rs

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    fits::{FitsHeaderReader, HduSelector},
    ingest::DEFAULT_PATTERNS,
    output::OutputFormat,
    resolve::Engine,
    schema::{self, AliasTable, SchemaTable},
};

/// Run settings, read from YAML. Every field is optional.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Schema resource; the built-in ObsCore schema when absent.
    pub schema: Option<PathBuf>,
    /// Alias resource; the built-in aliases when absent.
    pub aliases: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub format: OutputFormat,
    pub hdu: Option<usize>,
    pub hdu_name: Option<String>,
    pub merge_primary: bool,
    pub access_url_base: Option<String>,
    pub workers: usize,
    pub patterns: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema: None,
            aliases: None,
            output: None,
            format: OutputFormat::default(),
            hdu: None,
            hdu_name: None,
            merge_primary: false,
            access_url_base: None,
            workers: 0,
            patterns: DEFAULT_PATTERNS.iter().map(|p| p.to_string()).collect(),
        }
    }
}

impl Config {
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        // an empty document deserialises to unit, not a map
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).context("parsing config")
    }

    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_yaml_str(&text).with_context(|| format!("in config {}", path.display()))
    }

    pub fn hdu_selector(&self) -> Result<HduSelector> {
        match (self.hdu, &self.hdu_name) {
            (Some(_), Some(_)) => bail!("hdu and hdu_name are mutually exclusive"),
            (Some(i), None) => Ok(HduSelector::Index(i)),
            (None, Some(name)) => Ok(HduSelector::Name(name.clone())),
            (None, None) => Ok(HduSelector::default()),
        }
    }

    pub fn load_schema(&self) -> Result<SchemaTable> {
        match &self.schema {
            Some(path) => schema::load_schema(path),
            None => schema::builtin_schema(),
        }
    }

    pub fn load_aliases(&self) -> Result<AliasTable> {
        match &self.aliases {
            Some(path) => schema::load_aliases(path),
            None => schema::builtin_aliases(),
        }
    }

    pub fn header_reader(&self) -> Result<FitsHeaderReader> {
        Ok(FitsHeaderReader::new(self.hdu_selector()?, self.merge_primary))
    }

    pub fn engine(&self) -> Result<Engine> {
        let engine = Engine::new(self.load_schema()?, self.load_aliases()?)
            .with_access_url_base(self.access_url_base.clone());
        Ok(engine)
    }
}
