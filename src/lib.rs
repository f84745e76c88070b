//! ObsCore metadata extraction for FITS images.
//!
//! Header cards are aliased onto a canonical schema, coerced to typed
//! values, completed from defaults and computed rules (plate scale, pixel
//! type, tangent-plane footprint, ...) and audited for required fields.

pub mod config;
pub mod fits;
pub mod geometry;
pub mod ingest;
pub mod output;
pub mod process;
pub mod resolve;
pub mod schema;
pub mod wcs;

pub use config::Config;
pub use resolve::{Engine, FieldsInfo, Resolution};
pub use schema::{AliasTable, SchemaTable};

#[cfg(test)]
pub(crate) mod test_support;
