// src/schema/arrow.rs

use arrow::datatypes::{DataType, Field as ArrowField, Schema as ArrowSchema, TimeUnit};
use std::sync::Arc;

use super::types::SchemaEntry;
use super::SchemaTable;
use crate::process::Datatype;

/// Map a schema datatype tag onto an Arrow DataType.
///
/// - integer → Int64
/// - double  → Float64
/// - date    → Timestamp(µs), no zone
/// - string and unknown tags → Utf8
pub fn map_to_arrow_type(entry: &SchemaEntry) -> DataType {
    match entry.datatype() {
        Ok(Datatype::Integer) => DataType::Int64,
        Ok(Datatype::Double) => DataType::Float64,
        Ok(Datatype::Date) => DataType::Timestamp(TimeUnit::Microsecond, None),
        Ok(Datatype::String) | Err(_) => DataType::Utf8,
    }
}

/// Build an ArrowSchema (inside an Arc) with one column per schema field.
pub fn build_arrow_schema(schema: &SchemaTable) -> Arc<ArrowSchema> {
    let fields: Vec<ArrowField> = schema
        .iter()
        .map(|entry| {
            // required fields may still be missing after resolution
            ArrowField::new(&entry.name, map_to_arrow_type(entry), true)
        })
        .collect();

    Arc::new(ArrowSchema::new(fields))
}
