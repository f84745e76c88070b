use once_cell::sync::Lazy;
use std::collections::HashMap;

/// PSF FWHM in arcsec for the JWST NIRCam and MIRI imaging filters.
static FILTER_RESOLUTION: Lazy<HashMap<&'static str, f64>> = Lazy::new(|| {
    HashMap::from([
        // NIRCam short wavelength
        ("F070W", 0.023),
        ("F090W", 0.030),
        ("F115W", 0.037),
        ("F140M", 0.046),
        ("F150W", 0.049),
        ("F150W2", 0.045),
        ("F162M", 0.053),
        ("F164N", 0.054),
        ("F182M", 0.060),
        ("F187N", 0.061),
        ("F200W", 0.064),
        ("F210M", 0.068),
        ("F212N", 0.069),
        // NIRCam long wavelength
        ("F250M", 0.082),
        ("F277W", 0.088),
        ("F300M", 0.097),
        ("F322W2", 0.096),
        ("F323N", 0.106),
        ("F335M", 0.109),
        ("F356W", 0.114),
        ("F360M", 0.118),
        ("F405N", 0.132),
        ("F410M", 0.133),
        ("F430M", 0.139),
        ("F444W", 0.140),
        ("F460M", 0.151),
        ("F466N", 0.152),
        ("F470N", 0.154),
        ("F480M", 0.157),
        // MIRI
        ("F560W", 0.207),
        ("F770W", 0.269),
        ("F1000W", 0.328),
        ("F1130W", 0.375),
        ("F1280W", 0.420),
        ("F1500W", 0.488),
        ("F1800W", 0.591),
        ("F2100W", 0.674),
        ("F2550W", 0.803),
    ])
});

/// Spatial resolution (arcsec) for a named filter, case-insensitive.
pub fn filter_resolution(filter: &str) -> Option<f64> {
    FILTER_RESOLUTION
        .get(filter.trim().to_ascii_uppercase().as_str())
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(filter_resolution("F444W"), Some(0.140));
        assert_eq!(filter_resolution(" f200w "), Some(0.064));
        assert_eq!(filter_resolution("F1000W"), Some(0.328));
    }

    #[test]
    fn unknown_filter() {
        assert_eq!(filter_resolution("CLEAR"), None);
        assert_eq!(filter_resolution(""), None);
    }
}
