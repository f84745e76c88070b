// src/wcs/tan.rs

use std::f64::consts::PI;

use super::{SkyCoord, SkyTransform, TransformFactory, WcsError};
use crate::fits::HeaderFields;

pub const RA_TAN: &str = "RA---TAN";
pub const DEC_TAN: &str = "DEC--TAN";

/// Gnomonic projection with the native pole at the reference point
/// (`LONPOLE` = 180°). Distortion terms are ignored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TanTransform {
    crpix: [f64; 2],
    /// (longitude, latitude) of the reference point, degrees
    crval: [f64; 2],
    /// pixel offset → intermediate world coordinate per axis, degrees
    matrix: [[f64; 2]; 2],
    /// 0 when axis 1 carries right ascension, 1 when the axes are swapped
    lon_axis: usize,
}

impl TanTransform {
    pub fn new(crpix: [f64; 2], crval: [f64; 2], matrix: [[f64; 2]; 2], lon_axis: usize) -> Self {
        Self {
            crpix,
            crval,
            matrix,
            lon_axis,
        }
    }

    /// Read `CTYPEi`, `CRPIXi`, `CRVALi`, `CUNITi` and the linear part
    /// (`CDi_j`, else `PCi_j`·`CDELTi`, else `CDELTi` with `CROTA2`).
    pub fn from_header(header: &HeaderFields) -> Result<Self, WcsError> {
        let ctype1 = header.get("CTYPE1").unwrap_or_default();
        let ctype2 = header.get("CTYPE2").unwrap_or_default();
        let lon_axis = match (ctype1, ctype2) {
            (RA_TAN, DEC_TAN) => 0,
            (DEC_TAN, RA_TAN) => 1,
            _ => {
                return Err(WcsError::UnsupportedProjection {
                    ctype1: ctype1.to_string(),
                    ctype2: ctype2.to_string(),
                })
            }
        };

        let units = [unit_scale(header, 1)?, unit_scale(header, 2)?];
        let crpix = [required(header, "CRPIX1")?, required(header, "CRPIX2")?];
        let raw_crval = [
            required(header, "CRVAL1")? * units[0],
            required(header, "CRVAL2")? * units[1],
        ];
        let mut matrix = linear_part(header)?;
        for (row, scale) in matrix.iter_mut().zip(units) {
            row[0] *= scale;
            row[1] *= scale;
        }

        let crval = if lon_axis == 0 {
            raw_crval
        } else {
            [raw_crval[1], raw_crval[0]]
        };
        Ok(Self::new(crpix, crval, matrix, lon_axis))
    }
}

impl SkyTransform for TanTransform {
    fn pixel_to_sky(&self, x: f64, y: f64) -> Option<SkyCoord> {
        let dx = x - self.crpix[0];
        let dy = y - self.crpix[1];
        let w1 = self.matrix[0][0] * dx + self.matrix[0][1] * dy;
        let w2 = self.matrix[1][0] * dx + self.matrix[1][1] * dy;
        let (xi, eta) = if self.lon_axis == 0 { (w1, w2) } else { (w2, w1) };

        // native spherical coordinates
        let r = xi.hypot(eta).to_radians();
        let phi = xi.atan2(-eta);
        let theta = 1.0f64.atan2(r);

        // rotate to celestial, phi_p = 180°
        let (alpha_p, delta_p) = (self.crval[0].to_radians(), self.crval[1].to_radians());
        let dphi = phi - PI;
        let (sin_t, cos_t) = theta.sin_cos();
        let (sin_dp, cos_dp) = delta_p.sin_cos();

        let sin_dec = sin_t * sin_dp + cos_t * cos_dp * dphi.cos();
        let num = -cos_t * dphi.sin();
        let den = sin_t * cos_dp - cos_t * sin_dp * dphi.cos();

        let ra = (alpha_p + num.atan2(den)).to_degrees().rem_euclid(360.0);
        let dec = sin_dec.clamp(-1.0, 1.0).asin().to_degrees();

        (ra.is_finite() && dec.is_finite()).then(|| SkyCoord::new(ra, dec))
    }
}

/// Default [`TransformFactory`]: only `RA---TAN`/`DEC--TAN` pairs.
#[derive(Debug, Default, Clone, Copy)]
pub struct TanTransformFactory;

impl TransformFactory for TanTransformFactory {
    fn build(&self, header: &HeaderFields) -> Result<Box<dyn SkyTransform>, WcsError> {
        Ok(Box::new(TanTransform::from_header(header)?))
    }
}

fn required(header: &HeaderFields, key: &str) -> Result<f64, WcsError> {
    match header.get(key) {
        None => Err(WcsError::MissingKeyword(key.to_string())),
        Some(raw) => header.f64(key).ok_or_else(|| WcsError::InvalidKeyword {
            keyword: key.to_string(),
            value: raw.to_string(),
        }),
    }
}

fn optional(header: &HeaderFields, key: &str) -> Result<Option<f64>, WcsError> {
    if header.contains(key) {
        required(header, key).map(Some)
    } else {
        Ok(None)
    }
}

/// Degrees per unit of `CUNITi`; absent means degrees.
fn unit_scale(header: &HeaderFields, axis: usize) -> Result<f64, WcsError> {
    let key = format!("CUNIT{}", axis);
    match header.get(&key).map(|u| u.trim().to_ascii_lowercase()) {
        None => Ok(1.0),
        Some(u) => match u.as_str() {
            "" | "deg" => Ok(1.0),
            "arcmin" => Ok(1.0 / 60.0),
            "arcsec" => Ok(1.0 / 3600.0),
            "rad" => Ok(180.0 / PI),
            _ => Err(WcsError::InvalidKeyword {
                keyword: key,
                value: u,
            }),
        },
    }
}

fn linear_part(header: &HeaderFields) -> Result<[[f64; 2]; 2], WcsError> {
    const CD: [[&str; 2]; 2] = [["CD1_1", "CD1_2"], ["CD2_1", "CD2_2"]];
    const PC: [[&str; 2]; 2] = [["PC1_1", "PC1_2"], ["PC2_1", "PC2_2"]];

    if CD.iter().flatten().any(|k| header.contains(k)) {
        let mut m = [[0.0; 2]; 2];
        for (i, row) in CD.iter().enumerate() {
            for (j, key) in row.iter().enumerate() {
                m[i][j] = optional(header, key)?.unwrap_or(0.0);
            }
        }
        return Ok(m);
    }

    let cdelt = [required(header, "CDELT1")?, required(header, "CDELT2")?];
    if PC.iter().flatten().any(|k| header.contains(k)) {
        let mut m = [[0.0; 2]; 2];
        for (i, row) in PC.iter().enumerate() {
            for (j, key) in row.iter().enumerate() {
                let identity = if i == j { 1.0 } else { 0.0 };
                m[i][j] = cdelt[i] * optional(header, key)?.unwrap_or(identity);
            }
        }
        return Ok(m);
    }

    let rho = optional(header, "CROTA2")?.unwrap_or(0.0).to_radians();
    let (sin_r, cos_r) = rho.sin_cos();
    Ok([
        [cdelt[0] * cos_r, -cdelt[1] * sin_r],
        [cdelt[0] * sin_r, cdelt[1] * cos_r],
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(cards: &[(&str, &str)]) -> HeaderFields {
        cards.iter().copied().collect()
    }

    fn nircam_like() -> HeaderFields {
        header(&[
            ("CTYPE1", RA_TAN),
            ("CTYPE2", DEC_TAN),
            ("CRPIX1", "1024.5"),
            ("CRPIX2", "1024.5"),
            ("CRVAL1", "53.25"),
            ("CRVAL2", "-27.78"),
            ("CD1_1", "-8.8E-06"),
            ("CD1_2", "0.0"),
            ("CD2_1", "0.0"),
            ("CD2_2", "8.8E-06"),
        ])
    }

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    #[test]
    fn reference_pixel_maps_to_reference_value() {
        let t = TanTransform::from_header(&nircam_like()).unwrap();
        let c = t.pixel_to_sky(1024.5, 1024.5).unwrap();
        assert!(close(c.ra, 53.25, 1e-12));
        assert!(close(c.dec, -27.78, 1e-12));
    }

    #[test]
    fn north_up_east_left() {
        let t = TanTransform::from_header(&nircam_like()).unwrap();
        let right = t.pixel_to_sky(2048.0, 1024.5).unwrap();
        let up = t.pixel_to_sky(1024.5, 2048.0).unwrap();
        // +x goes west (RA decreases), +y goes north
        assert!(right.ra < 53.25);
        assert!(up.dec > -27.78);
        // small offsets match the linear approximation
        let expected_dec = -27.78 + 1023.5 * 8.8e-6;
        assert!(close(up.dec, expected_dec, 1e-7));
        let expected_ra = 53.25 - 1023.5 * 8.8e-6 / (-27.78f64).to_radians().cos();
        assert!(close(right.ra, expected_ra, 1e-6));
    }

    #[test]
    fn swapped_axes() {
        let mut h = nircam_like();
        h.insert("CTYPE1", DEC_TAN);
        h.insert("CTYPE2", RA_TAN);
        h.insert("CRVAL1", "-27.78");
        h.insert("CRVAL2", "53.25");
        let t = TanTransform::from_header(&h).unwrap();
        let c = t.pixel_to_sky(1024.5, 1024.5).unwrap();
        assert!(close(c.ra, 53.25, 1e-12));
        assert!(close(c.dec, -27.78, 1e-12));
        // axis 1 now runs along declination
        let moved = t.pixel_to_sky(2048.0, 1024.5).unwrap();
        assert!(moved.dec < -27.78);
    }

    #[test]
    fn ra_wraps_into_range() {
        let mut h = nircam_like();
        h.insert("CRVAL1", "0.0");
        let t = TanTransform::from_header(&h).unwrap();
        let east = t.pixel_to_sky(1.0, 1024.5).unwrap();
        let west = t.pixel_to_sky(2048.0, 1024.5).unwrap();
        assert!(east.ra > 0.0 && east.ra < 1.0);
        assert!(west.ra > 359.0 && west.ra < 360.0);
    }

    #[test]
    fn pc_cdelt_and_crota_agree_with_cd() {
        let cd = TanTransform::from_header(&nircam_like()).unwrap();
        let pc = TanTransform::from_header(&header(&[
            ("CTYPE1", RA_TAN),
            ("CTYPE2", DEC_TAN),
            ("CRPIX1", "1024.5"),
            ("CRPIX2", "1024.5"),
            ("CRVAL1", "53.25"),
            ("CRVAL2", "-27.78"),
            ("CDELT1", "-8.8E-06"),
            ("CDELT2", "8.8E-06"),
            ("PC1_1", "1.0"),
        ]))
        .unwrap();
        let rot = TanTransform::from_header(&header(&[
            ("CTYPE1", RA_TAN),
            ("CTYPE2", DEC_TAN),
            ("CRPIX1", "1024.5"),
            ("CRPIX2", "1024.5"),
            ("CRVAL1", "3195.0"),
            ("CRVAL2", "-1666.8"),
            ("CDELT1", "-5.28E-04"),
            ("CDELT2", "5.28E-04"),
            ("CROTA2", "0.0"),
            ("CUNIT1", "arcmin"),
            ("CUNIT2", "arcmin"),
        ]))
        .unwrap();
        for t in [pc, rot] {
            let a = cd.pixel_to_sky(1.0, 1.0).unwrap();
            let b = t.pixel_to_sky(1.0, 1.0).unwrap();
            assert!(close(a.ra, b.ra, 1e-9), "{:?} vs {:?}", a, b);
            assert!(close(a.dec, b.dec, 1e-9));
        }
    }

    #[test]
    fn rejects_other_projections_and_missing_keywords() {
        let mut h = nircam_like();
        h.insert("CTYPE1", "RA---SIN");
        assert!(matches!(
            TanTransform::from_header(&h),
            Err(WcsError::UnsupportedProjection { .. })
        ));

        let h = header(&[("CTYPE1", RA_TAN), ("CTYPE2", DEC_TAN), ("CRPIX1", "1")]);
        assert_eq!(
            TanTransform::from_header(&h).unwrap_err(),
            WcsError::MissingKeyword("CRPIX2".into())
        );

        let mut h = nircam_like();
        h.insert("CD1_1", "abc");
        assert!(matches!(
            TanTransform::from_header(&h),
            Err(WcsError::InvalidKeyword { .. })
        ));
    }
}
