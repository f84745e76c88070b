use crate::fits::HeaderFields;

pub const CD_KEYWORDS: [&str; 4] = ["CD1_1", "CD1_2", "CD2_1", "CD2_2"];

/// Plate scale in arcsec/pixel from the `CD` matrix
/// `[cd1_1, cd1_2, cd2_1, cd2_2]`:
/// `3600 · sqrt(cd1_1² + cd1_2² + cd2_1² + cd2_2²/2)`.
/// Only the last term is halved.
pub fn plate_scale(cd: [f64; 4]) -> f64 {
    let [a, b, c, d] = cd;
    3600.0 * (a * a + b * b + c * c + d * d / 2.0).sqrt()
}

/// `None` unless all four `CD` keywords parse.
pub fn plate_scale_from_header(header: &HeaderFields) -> Option<f64> {
    let mut cd = [0.0; 4];
    for (slot, key) in cd.iter_mut().zip(CD_KEYWORDS) {
        *slot = header.f64(key)?;
    }
    Some(plate_scale(cd))
}
