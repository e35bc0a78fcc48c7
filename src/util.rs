// Utility helpers for parsing and basic statistics.
//
// All the lenient CSV cell handling lives here so the loader can decide,
// per policy, what to do when a helper returns `None`.
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use num_format::{Locale, ToFormattedString};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Trim a cell and treat empty text as missing.
pub fn non_empty(s: Option<&str>) -> Option<&str> {
    let s = s?.trim();
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Parse a numeric cell.
///
/// Whole numbers exported as floats (`"12.0"`) are common, so this parses
/// to `f64`; thousands separators are not expected in the Berlin exports.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let v = non_empty(s)?.parse::<f64>().ok()?;
    if v.is_finite() {
        Some(v)
    } else {
        None
    }
}

/// Parse a year cell. Accepts `2021` as well as `2021.0`.
pub fn parse_i32_safe(s: Option<&str>) -> Option<i32> {
    let s = non_empty(s)?;
    if let Ok(v) = s.parse::<i32>() {
        return Some(v);
    }
    let f = s.parse::<f64>().ok()?;
    if f.fract() == 0.0 && f >= i32::MIN as f64 && f <= i32::MAX as f64 {
        Some(f as i32)
    } else {
        None
    }
}

/// Parse a non-negative count. Negative or fractional values are rejected.
pub fn parse_count_safe(s: Option<&str>) -> Option<u64> {
    let s = non_empty(s)?;
    if let Ok(v) = s.parse::<u64>() {
        return Some(v);
    }
    let f = s.parse::<f64>().ok()?;
    if f.fract() == 0.0 && f >= 0.0 && f <= u64::MAX as f64 {
        Some(f as u64)
    } else {
        None
    }
}

/// Parse a timestamp cell. RFC 3339 values keep their wall-clock time and
/// drop the offset; a bare date means midnight.
pub fn parse_datetime_safe(s: Option<&str>) -> Option<NaiveDateTime> {
    let s = non_empty(s)?;
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Arithmetic mean. An empty slice has no mean, so this returns NaN and the
/// caller decides how to show it.
pub fn mean(v: &[f64]) -> f64 {
    if v.is_empty() {
        return f64::NAN;
    }
    let sum: f64 = v.iter().copied().sum();
    sum / v.len() as f64
}

/// Percentage of `part` in `total`, or `None` when the total is zero.
pub fn share_pct(part: f64, total: f64) -> Option<f64> {
    if total == 0.0 || !total.is_finite() || !part.is_finite() {
        return None;
    }
    Some(part / total * 100.0)
}

pub fn format_number(n: f64, decimals: usize) -> String {
    if !n.is_finite() {
        return "undefined".to_string();
    }
    let neg = n.is_sign_negative() && n != 0.0;
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    // num-format inserts the thousands separators into the integer part.
    let int_val: u64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        res.push('.');
        res.push_str(frac);
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}

/// Render an optional percentage, `undefined` when there is none.
pub fn format_pct(p: Option<f64>) -> String {
    match p {
        Some(v) => format!("{}%", format_number(v, 1)),
        None => "undefined".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn parses_numbers_leniently() {
        assert_eq!(parse_f64_safe(Some(" 120 ")), Some(120.0));
        assert_eq!(parse_f64_safe(Some("-5")), Some(-5.0));
        assert_eq!(parse_f64_safe(Some("")), None);
        assert_eq!(parse_f64_safe(Some("abc")), None);
        assert_eq!(parse_f64_safe(Some("NaN")), None);
        assert_eq!(parse_f64_safe(None), None);
    }

    #[test]
    fn parses_years_written_as_floats() {
        assert_eq!(parse_i32_safe(Some("2021")), Some(2021));
        assert_eq!(parse_i32_safe(Some("2021.0")), Some(2021));
        assert_eq!(parse_i32_safe(Some("2021.5")), None);
    }

    #[test]
    fn rejects_negative_counts() {
        assert_eq!(parse_count_safe(Some("17")), Some(17));
        assert_eq!(parse_count_safe(Some("17.0")), Some(17));
        assert_eq!(parse_count_safe(Some("-1")), None);
    }

    #[test]
    fn parses_common_timestamp_shapes() {
        let dt = parse_datetime_safe(Some("2021-03-06 14:05:09")).unwrap();
        assert_eq!((dt.year(), dt.hour()), (2021, 14));

        let dt = parse_datetime_safe(Some("2021-03-06T14:05:09.250")).unwrap();
        assert_eq!(dt.minute(), 5);

        let dt = parse_datetime_safe(Some("2021-03-06T23:30:00+01:00")).unwrap();
        assert_eq!(dt.hour(), 23);

        let dt = parse_datetime_safe(Some("2021-03-06")).unwrap();
        assert_eq!(dt.hour(), 0);

        assert!(parse_datetime_safe(Some("yesterday")).is_none());
    }

    #[test]
    fn mean_of_nothing_is_nan() {
        assert!(mean(&[]).is_nan());
        assert_eq!(mean(&[120.0, 180.0]), 150.0);
    }

    #[test]
    fn share_over_zero_total_is_undefined() {
        assert_eq!(share_pct(60.0, 100.0), Some(60.0));
        assert_eq!(share_pct(0.0, 0.0), None);
        assert_eq!(format_pct(None), "undefined");
        assert_eq!(format_pct(Some(60.0)), "60.0%");
    }

    #[test]
    fn formats_with_separators() {
        assert_eq!(format_number(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_number(-42.0, 1), "-42.0");
        assert_eq!(format_number(f64::NAN, 1), "undefined");
        assert_eq!(format_int(9855), "9,855");
    }
}
