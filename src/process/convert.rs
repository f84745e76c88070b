// src/process/convert.rs

use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};
use std::{fmt, str::FromStr};
use thiserror::Error;

use crate::process::date_parser;

/// The scalar types a schema field can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Datatype {
    Integer,
    Double,
    String,
    Date,
}

impl Datatype {
    pub fn as_str(&self) -> &'static str {
        match self {
            Datatype::Integer => "integer",
            Datatype::Double => "double",
            Datatype::String => "string",
            Datatype::Date => "date",
        }
    }

    /// Convert a raw header or default literal into a typed value.
    pub fn coerce(&self, raw: &str) -> Result<FieldValue, CoercionError> {
        let fail = || CoercionError::Conversion {
            value: raw.to_string(),
            datatype: *self,
        };
        match self {
            Datatype::Integer => raw
                .trim()
                .parse::<i64>()
                .map(FieldValue::Integer)
                .map_err(|_| fail()),
            Datatype::Double => {
                // FITS allows Fortran style exponents: 1.5D-03
                let cleaned = raw.trim().replace(['D', 'd'], "E");
                cleaned
                    .parse::<f64>()
                    .map(FieldValue::Double)
                    .map_err(|_| fail())
            }
            Datatype::String => Ok(FieldValue::String(raw.to_string())),
            Datatype::Date => date_parser::parse_fits_date(raw)
                .map(FieldValue::Date)
                .ok_or_else(fail),
        }
    }
}

impl fmt::Display for Datatype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Datatype {
    type Err = CoercionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "integer" => Ok(Datatype::Integer),
            "double" => Ok(Datatype::Double),
            "string" => Ok(Datatype::String),
            "date" => Ok(Datatype::Date),
            _ => Err(CoercionError::UnknownDatatype { tag: s.to_string() }),
        }
    }
}

/// Field-local conversion failures. Neither is fatal to a file.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoercionError {
    #[error("cannot convert {value:?} to {datatype}")]
    Conversion { value: String, datatype: Datatype },
    #[error("unknown datatype {tag:?}")]
    UnknownDatatype { tag: String },
}

/// A resolved, typed field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Integer(i64),
    Double(f64),
    String(String),
    Date(NaiveDateTime),
}

impl FieldValue {
    pub fn datatype(&self) -> Datatype {
        match self {
            FieldValue::Integer(_) => Datatype::Integer,
            FieldValue::Double(_) => Datatype::Double,
            FieldValue::String(_) => Datatype::String,
            FieldValue::Date(_) => Datatype::Date,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(i) => Some(*i as f64),
            FieldValue::Double(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Re-express this value as `target`, going through its canonical literal.
    pub fn conform(self, target: Datatype) -> Result<FieldValue, CoercionError> {
        if self.datatype() == target {
            return Ok(self);
        }
        target.coerce(&self.to_string())
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Integer(i) => write!(f, "{}", i),
            // shortest representation that parses back to the same f64
            FieldValue::Double(d) => write!(f, "{}", d),
            FieldValue::String(s) => f.write_str(s),
            FieldValue::Date(dt) => f.write_str(&date_parser::format_fits_date(dt)),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Integer(i) => serializer.serialize_i64(*i),
            FieldValue::Double(d) => serializer.serialize_f64(*d),
            FieldValue::String(s) => serializer.serialize_str(s),
            FieldValue::Date(dt) => serializer.serialize_str(&date_parser::format_fits_date(dt)),
        }
    }
}

/// Coerce `raw` using a datatype tag as written in the schema resource.
pub fn coerce(raw: &str, datatype: &str) -> Result<FieldValue, CoercionError> {
    datatype.parse::<Datatype>()?.coerce(raw)
}
