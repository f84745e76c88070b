pub mod convert;
pub mod date_parser;

pub use convert::{coerce, CoercionError, Datatype, FieldValue};
