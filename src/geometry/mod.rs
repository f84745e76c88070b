//! Values derived from header geometry: plate scale, pixel type, filter
//! resolution, the reference-pixel coordinate and the image footprint.

pub mod coords;
pub mod footprint;
pub mod pixtype;
pub mod resolution;
pub mod scale;

pub use coords::{reference_coordinate, Projection};
pub use footprint::{Corner, Footprint, SpatialBounds};
pub use pixtype::{pixel_type, UNKNOWN_PIXTYPE};
pub use resolution::filter_resolution;
pub use scale::{plate_scale, plate_scale_from_header};

use thiserror::Error;

/// Conditions that end resolution of the whole file.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AbortReason {
    #[error("unsupported projection {ctype:?} in {keyword}")]
    UnsupportedProjection { keyword: String, ctype: String },
}
