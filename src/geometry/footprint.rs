// src/geometry/footprint.rs

use tracing::debug;

use super::{AbortReason, Projection};
use crate::fits::HeaderFields;
use crate::wcs::{SkyCoord, SkyTransform, TransformFactory, WcsError};

/// Image corners, counter-clockwise from pixel (1, 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Corner {
    LowerLeft,
    UpperLeft,
    UpperRight,
    LowerRight,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::LowerLeft,
        Corner::UpperLeft,
        Corner::UpperRight,
        Corner::LowerRight,
    ];

    fn index(self) -> usize {
        self as usize
    }

    /// 1-based pixel position of this corner.
    pub fn pixel(self, naxis1: f64, naxis2: f64) -> (f64, f64) {
        match self {
            Corner::LowerLeft => (1.0, 1.0),
            Corner::UpperLeft => (1.0, naxis2),
            Corner::UpperRight => (naxis1, naxis2),
            Corner::LowerRight => (naxis1, 1.0),
        }
    }
}

/// Transform each corner; a failed corner is `None`.
pub fn corner_coordinates(
    transform: &dyn SkyTransform,
    naxis1: f64,
    naxis2: f64,
) -> [Option<SkyCoord>; 4] {
    Corner::ALL.map(|corner| {
        let (x, y) = corner.pixel(naxis1, naxis2);
        transform.pixel_to_sky(x, y)
    })
}

/// Per-axis extremes of the footprint, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialBounds {
    pub ra_min: f64,
    pub ra_max: f64,
    pub dec_min: f64,
    pub dec_max: f64,
}

/// Sky positions of all four image corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Footprint {
    corners: [SkyCoord; 4],
}

impl Footprint {
    pub fn new(corners: [SkyCoord; 4]) -> Self {
        Self { corners }
    }

    /// All or nothing: any missing corner means no footprint.
    pub fn from_corners(corners: [Option<SkyCoord>; 4]) -> Option<Self> {
        let [a, b, c, d] = corners;
        Some(Self::new([a?, b?, c?, d?]))
    }

    /// Build the transform from `header` and project the corners.
    ///
    /// `Ok(None)` when inputs are missing (including `CTYPE2`) or a corner
    /// fails to transform; an unsupported projection aborts.
    pub fn compute(
        header: &HeaderFields,
        transforms: &dyn TransformFactory,
    ) -> Result<Option<Self>, AbortReason> {
        if Projection::from_header(header)?.is_none() {
            return Ok(None);
        }
        if !header.contains("CTYPE2") {
            debug!("footprint needs CTYPE2");
            return Ok(None);
        }
        let (Some(naxis1), Some(naxis2)) = (header.i64("NAXIS1"), header.i64("NAXIS2")) else {
            debug!("footprint needs NAXIS1 and NAXIS2");
            return Ok(None);
        };
        if naxis1 < 1 || naxis2 < 1 {
            debug!(naxis1, naxis2, "footprint needs positive axis sizes");
            return Ok(None);
        }

        let transform = match transforms.build(header) {
            Ok(t) => t,
            Err(WcsError::UnsupportedProjection { ctype2, .. }) => {
                return Err(AbortReason::UnsupportedProjection {
                    keyword: "CTYPE2".to_string(),
                    ctype: ctype2,
                })
            }
            Err(e) => {
                debug!(error = %e, "no transform for footprint");
                return Ok(None);
            }
        };

        let corners = corner_coordinates(transform.as_ref(), naxis1 as f64, naxis2 as f64);
        let footprint = Self::from_corners(corners);
        if footprint.is_none() {
            debug!(?corners, "corner transform failed, footprint unavailable");
        }
        Ok(footprint)
    }

    pub fn corner(&self, corner: Corner) -> SkyCoord {
        self.corners[corner.index()]
    }

    pub fn corners(&self) -> &[SkyCoord; 4] {
        &self.corners
    }

    /// Plain min/max per axis. Footprints straddling RA 0°/360° get a
    /// bounding box spanning the whole seam.
    pub fn bounds(&self) -> SpatialBounds {
        let ras = self.corners.map(|c| c.ra);
        let decs = self.corners.map(|c| c.dec);
        SpatialBounds {
            ra_min: ras.into_iter().fold(f64::INFINITY, f64::min),
            ra_max: ras.into_iter().fold(f64::NEG_INFINITY, f64::max),
            dec_min: decs.into_iter().fold(f64::INFINITY, f64::min),
            dec_max: decs.into_iter().fold(f64::NEG_INFINITY, f64::max),
        }
    }

    /// STC-S polygon, e.g. `POLYGON ICRS 53.1 -27.8 ...`.
    pub fn region(&self, frame: &str) -> String {
        let mut out = format!("POLYGON {}", frame);
        for c in &self.corners {
            out.push_str(&format!(" {:.8} {:.8}", c.ra, c.dec));
        }
        out
    }
}
