//! Pixel → sky transforms.
//!
//! The geometry rules only use [`TransformFactory`] and [`SkyTransform`];
//! [`tan::TanTransformFactory`] provides the gnomonic projection.

pub mod tan;

pub use tan::{TanTransform, TanTransformFactory};

use thiserror::Error;

use crate::fits::HeaderFields;

/// Celestial position in degrees.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct SkyCoord {
    pub ra: f64,
    pub dec: f64,
}

impl SkyCoord {
    pub fn new(ra: f64, dec: f64) -> Self {
        Self { ra, dec }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum WcsError {
    #[error("missing keyword {0}")]
    MissingKeyword(String),
    #[error("invalid keyword {keyword}={value:?}")]
    InvalidKeyword { keyword: String, value: String },
    #[error("unsupported projection {ctype1:?}/{ctype2:?}")]
    UnsupportedProjection { ctype1: String, ctype2: String },
}

/// Maps 1-based FITS pixel coordinates to the sky.
pub trait SkyTransform {
    /// `None` when the pixel has no valid sky position.
    fn pixel_to_sky(&self, x: f64, y: f64) -> Option<SkyCoord>;
}

/// Builds a transform from a header's geometric keywords.
pub trait TransformFactory: Send + Sync {
    fn build(&self, header: &HeaderFields) -> Result<Box<dyn SkyTransform>, WcsError>;
}
