//! FITS header access.
//!
//! The resolution engine only sees [`HeaderFields`]; where they come from is
//! behind the [`HeaderSource`] trait. [`header::FitsHeaderReader`] is the
//! on-disk implementation.

pub mod header;

pub use header::{FitsHeaderReader, HduSelector};

use std::{collections::HashMap, io, path::Path};
use thiserror::Error;

use crate::process::Datatype;

/// Ordered header keyword → raw value string for one header unit.
///
/// Keywords are stored upper case. Inserting an existing keyword replaces
/// its value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeaderFields {
    cards: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl HeaderFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into().trim().to_ascii_uppercase();
        let value = value.into();
        match self.index.get(&key) {
            Some(&pos) => self.cards[pos].1 = value,
            None => {
                self.index.insert(key.clone(), self.cards.len());
                self.cards.push((key, value));
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.index
            .get(&key.to_ascii_uppercase())
            .map(|&i| self.cards[i].1.as_str())
    }

    /// Value parsed as a double, `None` when absent or unparseable.
    pub fn f64(&self, key: &str) -> Option<f64> {
        self.get(key)
            .and_then(|v| Datatype::Double.coerce(v).ok())
            .and_then(|v| v.as_f64())
    }

    /// Value parsed as an integer, `None` when absent or unparseable.
    pub fn i64(&self, key: &str) -> Option<i64> {
        self.get(key)
            .and_then(|v| Datatype::Integer.coerce(v).ok())
            .and_then(|v| v.as_i64())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(&key.to_ascii_uppercase())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cards.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Append every card of `other`, replacing values of shared keywords.
    pub fn merge(&mut self, other: HeaderFields) {
        for (k, v) in other.cards {
            self.insert(k, v);
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for HeaderFields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = HeaderFields::new();
        for (k, v) in iter {
            fields.insert(k, v);
        }
        fields
    }
}

/// Why a file's header could not be read. The caller skips the file.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("not a FITS file: first card is {0:?}")]
    NotFits(String),
    #[error("header unit {0} is truncated")]
    Truncated(usize),
    #[error("header unit {0} not found")]
    HduNotFound(String),
    #[error("invalid keyword {keyword}={value:?}")]
    InvalidKeyword { keyword: String, value: String },
}

/// Produces the header of the designated unit of a file.
pub trait HeaderSource: Send + Sync {
    fn read_header(&self, path: &Path) -> Result<HeaderFields, DecodeError>;
}
