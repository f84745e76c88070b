pub mod alias;
pub mod arrow;
pub mod load;
pub mod types;

pub use alias::{load_aliases, parse_aliases, AliasTable};
pub use arrow::{build_arrow_schema, map_to_arrow_type};
pub use load::{load_schema, parse_schema};
pub use types::{DefaultValue, SchemaEntry, SchemaTable};

use anyhow::Result;

const BUILTIN_SCHEMA: &str = include_str!("../../resources/obscore_schema.csv");
const BUILTIN_ALIASES: &str = include_str!("../../resources/header_aliases.csv");

/// The ObsCore schema shipped with the crate.
pub fn builtin_schema() -> Result<SchemaTable> {
    parse_schema(BUILTIN_SCHEMA, "builtin obscore_schema.csv")
}

/// The header alias table shipped with the crate.
pub fn builtin_aliases() -> Result<AliasTable> {
    parse_aliases(BUILTIN_ALIASES, "builtin header_aliases.csv")
}
