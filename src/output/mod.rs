//! Record sinks. Resolved records are handed over one at a time; nothing
//! upstream touches storage.

pub mod columnar;
pub mod jsonl;

pub use columnar::ParquetSink;
pub use jsonl::JsonlSink;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{self, BufWriter},
    path::Path,
};

use crate::{resolve::FieldsInfo, schema::SchemaTable};

/// Accepts completed records. `finish` must be called once at the end.
pub trait RecordSink: Send {
    fn write(&mut self, record: &FieldsInfo) -> Result<()>;
    fn finish(&mut self) -> Result<()>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Jsonl,
    Parquet,
}

/// Open the sink for `format`. JSON lines go to stdout without a path.
pub fn open_sink(
    format: OutputFormat,
    path: Option<&Path>,
    schema: &SchemaTable,
) -> Result<Box<dyn RecordSink>> {
    match (format, path) {
        (OutputFormat::Jsonl, Some(p)) => {
            let file = File::create(p)
                .with_context(|| format!("creating output file {}", p.display()))?;
            Ok(Box::new(JsonlSink::new(BufWriter::new(file))))
        }
        (OutputFormat::Jsonl, None) => Ok(Box::new(JsonlSink::new(io::stdout()))),
        (OutputFormat::Parquet, Some(p)) => Ok(Box::new(ParquetSink::create(p, schema)?)),
        (OutputFormat::Parquet, None) => bail!("parquet output needs an output path"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::builtin_schema;

    #[test]
    fn parquet_requires_a_path() -> Result<()> {
        let schema = builtin_schema()?;
        assert!(open_sink(OutputFormat::Parquet, None, &schema).is_err());
        Ok(())
    }

    #[test]
    fn format_names() -> Result<()> {
        let f: OutputFormat = serde_yaml::from_str("parquet")?;
        assert_eq!(f, OutputFormat::Parquet);
        assert_eq!(OutputFormat::default(), OutputFormat::Jsonl);
        Ok(())
    }
}
