use super::AbortReason;
use crate::fits::HeaderFields;
use crate::wcs::{
    tan::{DEC_TAN, RA_TAN},
    SkyCoord,
};

/// The two tangent-plane axis orders that can be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    /// `CTYPE1 = 'RA---TAN'`: `CRVAL1` is right ascension.
    RaTan,
    /// `CTYPE1 = 'DEC--TAN'`: `CRVAL1` is declination.
    DecTan,
}

impl Projection {
    /// `Ok(None)` without `CTYPE1`; any other projection aborts the file.
    pub fn from_header(header: &HeaderFields) -> Result<Option<Self>, AbortReason> {
        match header.get("CTYPE1") {
            None => Ok(None),
            Some(RA_TAN) => Ok(Some(Projection::RaTan)),
            Some(DEC_TAN) => Ok(Some(Projection::DecTan)),
            Some(other) => Err(AbortReason::UnsupportedProjection {
                keyword: "CTYPE1".to_string(),
                ctype: other.to_string(),
            }),
        }
    }
}

/// Celestial coordinate of the reference pixel, taken from `CRVAL1/2` in the
/// order `CTYPE1` declares.
pub fn reference_coordinate(header: &HeaderFields) -> Result<Option<SkyCoord>, AbortReason> {
    let Some(projection) = Projection::from_header(header)? else {
        return Ok(None);
    };
    let (Some(v1), Some(v2)) = (header.f64("CRVAL1"), header.f64("CRVAL2")) else {
        return Ok(None);
    };
    Ok(Some(match projection {
        Projection::RaTan => SkyCoord::new(v1, v2),
        Projection::DecTan => SkyCoord::new(v2, v1),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(ctype1: &str) -> HeaderFields {
        [("CTYPE1", ctype1), ("CRVAL1", "53.25"), ("CRVAL2", "-27.78")]
            .into_iter()
            .collect()
    }

    #[test]
    fn ra_first() {
        assert_eq!(
            reference_coordinate(&header("RA---TAN")),
            Ok(Some(SkyCoord::new(53.25, -27.78)))
        );
    }

    #[test]
    fn dec_first() {
        assert_eq!(
            reference_coordinate(&header("DEC--TAN")),
            Ok(Some(SkyCoord::new(-27.78, 53.25)))
        );
    }

    #[test]
    fn other_projections_abort() {
        for ctype in ["RA---SIN", "GLON-TAN", "RA---TAN-SIP", ""] {
            assert_eq!(
                reference_coordinate(&header(ctype)),
                Err(AbortReason::UnsupportedProjection {
                    keyword: "CTYPE1".into(),
                    ctype: ctype.into()
                })
            );
        }
    }

    #[test]
    fn missing_inputs_are_a_no_op() {
        let no_ctype: HeaderFields = [("CRVAL1", "1"), ("CRVAL2", "2")].into_iter().collect();
        assert_eq!(reference_coordinate(&no_ctype), Ok(None));
        let no_crval: HeaderFields = [("CTYPE1", "RA---TAN")].into_iter().collect();
        assert_eq!(reference_coordinate(&no_crval), Ok(None));
    }
}
