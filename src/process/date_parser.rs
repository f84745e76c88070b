use chrono::{NaiveDate, NaiveDateTime};

/// `DATE-OBS` style timestamp; `%.f` reads and prints nothing when the
/// fraction is absent or zero.
const FITS_DATETIME: &str = "%Y-%m-%dT%H:%M:%S%.f";
const FITS_DATE: &str = "%Y-%m-%d";

/// Parse `"YYYY-MM-DDThh:mm:ss[.sss]"` or a bare `"YYYY-MM-DD"` (midnight).
/// A trailing zone designator is rejected.
pub fn parse_fits_date(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    NaiveDateTime::parse_from_str(s, FITS_DATETIME)
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, FITS_DATE)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Canonical literal for a timestamp, readable by [`parse_fits_date`].
pub fn format_fits_date(dt: &NaiveDateTime) -> String {
    dt.format(FITS_DATETIME).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_and_fractional_timestamps() {
        let dt = parse_fits_date("2022-07-14T12:34:56").unwrap();
        assert_eq!(format_fits_date(&dt), "2022-07-14T12:34:56");

        let dt = parse_fits_date(" 2022-07-14T12:34:56.250 ").unwrap();
        assert_eq!(format_fits_date(&dt), "2022-07-14T12:34:56.250");
    }

    #[test]
    fn bare_date_is_midnight() {
        let dt = parse_fits_date("2023-01-02").unwrap();
        assert_eq!(format_fits_date(&dt), "2023-01-02T00:00:00");
    }

    #[test]
    fn rejects_zone_designator_and_garbage() {
        assert!(parse_fits_date("2022-07-14T12:34:56Z").is_none());
        assert!(parse_fits_date("2022/07/14 12:34:56").is_none());
        assert!(parse_fits_date("").is_none());
    }
}
