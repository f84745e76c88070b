// src/schema/load.rs

use anyhow::{bail, Context, Result};
use csv::{ReaderBuilder, Trim};
use std::{fs, io::Cursor, path::Path};
use tracing::{debug, instrument};

use super::types::{DefaultValue, SchemaEntry, SchemaTable};

/// First cell of the optional line that re-declares the column names.
pub const COLUMNS_MARKER: &str = "COLUMNS";

const DEFAULT_COLUMNS: [&str; 4] = ["key", "datatype", "required", "default"];

/// One non-comment, non-blank record of a resource file.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ResourceLine {
    pub line: u64,
    pub cells: Vec<String>,
}

/// Split a comma-separated resource into records, dropping `#` comments and
/// blank lines. Field counts are not checked here.
pub(crate) fn read_resource_lines(contents: &str, source: &str) -> Result<Vec<ResourceLine>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .comment(Some(b'#'))
        .trim(Trim::All)
        .from_reader(Cursor::new(contents.as_bytes()));

    let mut lines = Vec::new();
    for result in rdr.records() {
        let record = result.with_context(|| format!("reading {}", source))?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let cells: Vec<String> = record.iter().map(str::to_string).collect();

        if cells.iter().all(|c| c.is_empty()) {
            continue;
        }
        // indented comments are not caught by the reader
        if cells[0].starts_with('#') {
            continue;
        }
        lines.push(ResourceLine { line, cells });
    }
    Ok(lines)
}

/// Positions of the known columns within a record.
#[derive(Debug, Clone, PartialEq)]
struct ColumnLayout {
    count: usize,
    key: usize,
    datatype: usize,
    required: Option<usize>,
    default: Option<usize>,
}

impl ColumnLayout {
    fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        let find = |aliases: &[&str]| {
            names.iter().position(|n| {
                let n = n.as_ref().trim();
                aliases.iter().any(|a| n.eq_ignore_ascii_case(a))
            })
        };
        let key = find(&["key", "name", "canonical_key"]);
        let datatype = find(&["datatype", "type", "ty"]);
        let (Some(key), Some(datatype)) = (key, datatype) else {
            bail!(
                "column override must name a key and a datatype column, got {:?}",
                names.iter().map(AsRef::as_ref).collect::<Vec<_>>()
            );
        };
        Ok(Self {
            count: names.len(),
            key,
            datatype,
            required: find(&["required"]),
            default: find(&["default"]),
        })
    }
}

fn parse_required(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "1" | "required" => Some(true),
        "false" | "no" | "n" | "0" | "optional" | "" => Some(false),
        _ => None,
    }
}

/// Parse schema resource text. Lines with the wrong number of cells or an
/// unreadable required flag are skipped.
#[instrument(level = "debug", skip(contents, source), fields(source = %source))]
pub fn parse_schema(contents: &str, source: &str) -> Result<SchemaTable> {
    let mut layout = ColumnLayout::from_names(&DEFAULT_COLUMNS[..])?;
    let mut entries = Vec::new();
    let mut seen_data = false;

    for ResourceLine { line, cells } in read_resource_lines(contents, source)? {
        if cells[0].eq_ignore_ascii_case(COLUMNS_MARKER) {
            if seen_data {
                debug!(line, "column override after data, skipped");
            } else {
                layout = ColumnLayout::from_names(&cells[1..])
                    .with_context(|| format!("{} line {}", source, line))?;
                debug!(line, columns = layout.count, "column override");
            }
            continue;
        }
        seen_data = true;

        if cells.len() != layout.count {
            debug!(
                line,
                expected = layout.count,
                found = cells.len(),
                "schema line has wrong field count, skipped"
            );
            continue;
        }

        let name = cells[layout.key].clone();
        if name.is_empty() {
            debug!(line, "schema line has empty key, skipped");
            continue;
        }
        let required = match layout.required.map(|i| parse_required(&cells[i])) {
            None => false,
            Some(Some(flag)) => flag,
            Some(None) => {
                debug!(line, key = %name, "unreadable required flag, skipped");
                continue;
            }
        };
        let default = layout
            .default
            .map(|i| DefaultValue::parse(&cells[i]))
            .unwrap_or(DefaultValue::NoDefault);

        entries.push(SchemaEntry {
            name,
            ty: cells[layout.datatype].clone(),
            required,
            default,
        });
    }

    debug!(fields = entries.len(), "parsed schema");
    Ok(SchemaTable::from_entries(entries))
}

/// Load a schema resource from disk.
pub fn load_schema<P: AsRef<Path>>(path: P) -> Result<SchemaTable> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading schema {}", path.display()))?;
    parse_schema(&contents, &path.display().to_string())
}
