// src/resolve/fields.rs

use serde::{ser::SerializeMap, Serialize, Serializer};
use std::{collections::HashMap, sync::Arc};

use crate::{
    process::FieldValue,
    schema::{SchemaEntry, SchemaTable},
};

/// One schema field during a file's pass.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRecord {
    entry: SchemaEntry,
    source_key: Option<String>,
    source_value: Option<String>,
    value: Option<FieldValue>,
}

impl FieldRecord {
    pub fn new(entry: SchemaEntry) -> Self {
        Self {
            entry,
            source_key: None,
            source_value: None,
            value: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.entry.name
    }

    pub fn entry(&self) -> &SchemaEntry {
        &self.entry
    }

    pub fn value(&self) -> Option<&FieldValue> {
        self.value.as_ref()
    }

    pub fn is_set(&self) -> bool {
        self.value.is_some()
    }

    /// Header keyword and raw value this field was aliased from.
    pub fn source(&self) -> Option<(&str, &str)> {
        self.source_key.as_deref().zip(self.source_value.as_deref())
    }

    /// Attach a raw header pair unless one is already attached.
    pub fn attach(&mut self, key: &str, value: &str) -> bool {
        if self.source_key.is_some() {
            return false;
        }
        self.source_key = Some(key.to_string());
        self.source_value = Some(value.to_string());
        true
    }

    /// Set the value unless one is already set. Returns whether it was set.
    pub fn resolve(&mut self, value: FieldValue) -> bool {
        if self.value.is_some() {
            return false;
        }
        self.value = Some(value);
        true
    }
}

/// Ordered canonical key → [`FieldRecord`] for one file.
///
/// The key set is fixed at construction from the schema; only values and
/// attached sources change afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldsInfo {
    records: Vec<FieldRecord>,
    index: Arc<HashMap<String, usize>>,
}

impl FieldsInfo {
    pub fn from_schema(schema: &SchemaTable) -> Self {
        Self {
            records: schema.iter().cloned().map(FieldRecord::new).collect(),
            index: Arc::clone(schema.index()),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn get(&self, name: &str) -> Option<&FieldRecord> {
        self.position(name).map(|i| &self.records[i])
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut FieldRecord> {
        self.position(name).map(move |i| &mut self.records[i])
    }

    pub fn value(&self, name: &str) -> Option<&FieldValue> {
        self.get(name).and_then(FieldRecord::value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldRecord> {
        self.records.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut FieldRecord> {
        self.records.iter_mut()
    }

    pub(crate) fn record_mut(&mut self, pos: usize) -> &mut FieldRecord {
        &mut self.records[pos]
    }

    /// Names of required fields without a value, in schema order.
    pub fn missing_required(&self) -> Vec<String> {
        self.records
            .iter()
            .filter(|r| r.entry.required && !r.is_set())
            .map(|r| r.name().to_string())
            .collect()
    }
}

impl Serialize for FieldsInfo {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.records.len()))?;
        for record in &self.records {
            map.serialize_entry(record.name(), &record.value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::DefaultValue;

    fn schema() -> SchemaTable {
        SchemaTable::from_entries(["obs_id", "s_ra", "calib_level"].map(|name| SchemaEntry {
            name: name.into(),
            ty: if name == "calib_level" { "integer" } else { "string" }.into(),
            required: name != "s_ra",
            default: DefaultValue::NoDefault,
        }))
    }

    #[test]
    fn keys_follow_schema_order() {
        let fields = FieldsInfo::from_schema(&schema());
        let names: Vec<_> = fields.iter().map(FieldRecord::name).collect();
        assert_eq!(names, vec!["obs_id", "s_ra", "calib_level"]);
        assert!(fields.get("missing").is_none());
    }

    #[test]
    fn values_are_never_overwritten() {
        let mut fields = FieldsInfo::from_schema(&schema());
        let rec = fields.get_mut("calib_level").unwrap();
        assert!(rec.resolve(FieldValue::Integer(3)));
        assert!(!rec.resolve(FieldValue::Integer(1)));
        assert_eq!(fields.value("calib_level"), Some(&FieldValue::Integer(3)));
    }

    #[test]
    fn first_attached_source_wins() {
        let mut fields = FieldsInfo::from_schema(&schema());
        let rec = fields.get_mut("obs_id").unwrap();
        assert!(rec.attach("OBS_ID", "a"));
        assert!(!rec.attach("OBSID", "b"));
        assert_eq!(rec.source(), Some(("OBS_ID", "a")));
    }

    #[test]
    fn missing_required_in_order() {
        let mut fields = FieldsInfo::from_schema(&schema());
        assert_eq!(fields.missing_required(), vec!["obs_id", "calib_level"]);
        fields
            .get_mut("obs_id")
            .unwrap()
            .resolve(FieldValue::String("x".into()));
        assert_eq!(fields.missing_required(), vec!["calib_level"]);
    }

    #[test]
    fn serializes_as_ordered_map_with_nulls() -> anyhow::Result<()> {
        let mut fields = FieldsInfo::from_schema(&schema());
        fields
            .get_mut("calib_level")
            .unwrap()
            .resolve(FieldValue::Integer(3));
        assert_eq!(
            serde_json::to_string(&fields)?,
            r#"{"obs_id":null,"s_ra":null,"calib_level":3}"#
        );
        Ok(())
    }
}
