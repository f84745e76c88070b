// src/schema/types.rs

use std::{collections::HashMap, sync::Arc};

use crate::process::{coerce, CoercionError, Datatype, FieldValue};

/// Literal marking a field that has no default.
pub const NO_DEFAULT: &str = "NODEFAULT";
/// Literal marking a field that is filled by a computed rule.
pub const COMPUTE: &str = "COMPUTE";

/// What the schema says to do when the header has no value for a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefaultValue {
    NoDefault,
    Compute,
    Literal(String),
}

impl DefaultValue {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() || raw == "-" || raw.eq_ignore_ascii_case(NO_DEFAULT) {
            DefaultValue::NoDefault
        } else if raw.eq_ignore_ascii_case(COMPUTE) {
            DefaultValue::Compute
        } else {
            DefaultValue::Literal(raw.to_string())
        }
    }

    pub fn literal(&self) -> Option<&str> {
        match self {
            DefaultValue::Literal(s) => Some(s),
            _ => None,
        }
    }
}

/// A single field definition as parsed from the schema resource.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaEntry {
    pub name: String,
    /// Datatype tag as written; an unknown tag only fails when coerced.
    pub ty: String,
    pub required: bool,
    pub default: DefaultValue,
}

impl SchemaEntry {
    pub fn datatype(&self) -> Result<Datatype, CoercionError> {
        self.ty.parse()
    }

    pub fn coerce(&self, raw: &str) -> Result<FieldValue, CoercionError> {
        coerce(raw, &self.ty)
    }

    /// Coerced default literal, or `None` for the no-default/compute sentinels.
    pub fn default_value(&self) -> Option<Result<FieldValue, CoercionError>> {
        self.default.literal().map(|lit| self.coerce(lit))
    }
}

/// Immutable, ordered table of canonical fields.
#[derive(Debug, Clone, Default)]
pub struct SchemaTable {
    entries: Vec<SchemaEntry>,
    index: Arc<HashMap<String, usize>>,
}

impl SchemaTable {
    /// Build from entries in order. A repeated name replaces the earlier
    /// definition but keeps its position.
    pub fn from_entries(entries: impl IntoIterator<Item = SchemaEntry>) -> Self {
        let mut ordered: Vec<SchemaEntry> = Vec::new();
        let mut index = HashMap::new();
        for entry in entries {
            match index.get(&entry.name) {
                Some(&pos) => ordered[pos] = entry,
                None => {
                    index.insert(entry.name.clone(), ordered.len());
                    ordered.push(entry);
                }
            }
        }
        Self {
            entries: ordered,
            index: Arc::new(index),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&SchemaEntry> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SchemaEntry> {
        self.entries.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    pub(crate) fn index(&self) -> &Arc<HashMap<String, usize>> {
        &self.index
    }
}
