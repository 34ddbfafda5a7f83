// Utility helpers for parsing, field derivation and basic statistics.
//
// Everything that turns loose spreadsheet text into typed values lives here,
// so the loader and the reports can assume clean fields.
use crate::types::ImpactCategory;
use num_format::{Locale, ToFormattedString};
use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Ordering;

// Plant-type prefix (PLTS, PLTM, ...), dash, province code, dash.
static PROVINCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"PL[TSM]+-([A-Z]+)-").expect("province pattern is valid"));

static IMPACT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"High|Medium|Low").expect("impact pattern is valid"));

/// Parse a string-like value into `f64` while being forgiving about
/// formatting issues that are common in spreadsheet exports.
///
/// - Trims whitespace.
/// - Rejects values that contain alphabetic characters (except an exponent).
/// - Strips thousands separators like `","`. Every comma is treated as a
///   separator, so decimal-comma text (`"1,5"`, common in Indonesian-locale
///   exports) reads as `15`, not `1.5`. Spreadsheet sources are unaffected
///   because numeric cells arrive as numbers.
/// - Returns `None` for anything that cannot be safely parsed.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if s
        .chars()
        .any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E')
    {
        return None;
    }
    let s = s.replace(',', "");
    s.parse::<f64>().ok()
}

/// Province code embedded in a project id, e.g. `PLTS-NTT-001` -> `NTT`.
///
/// The search is unanchored; ids that do not carry the pattern yield `None`.
pub fn extract_province(project_id: &str) -> Option<String> {
    PROVINCE_RE
        .captures(project_id)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// First case-sensitive `High`/`Medium`/`Low` found in an impact rating.
pub fn extract_impact_category(rating: &str) -> Option<ImpactCategory> {
    IMPACT_RE
        .find(rating)
        .and_then(|m| ImpactCategory::from_label(m.as_str()))
}

/// CO2 reduction per kWh. Zero, missing or non-finite energy output gives
/// `NaN` instead of an infinite ratio.
pub fn co2_efficiency(co2_reduction: f64, energy_output: f64) -> f64 {
    if energy_output == 0.0 || !energy_output.is_finite() {
        return f64::NAN;
    }
    co2_reduction / energy_output
}

/// Arithmetic mean over the non-`NaN` values; `NaN` when nothing remains.
pub fn average(v: &[f64]) -> f64 {
    let (sum, count) = v
        .iter()
        .filter(|x| !x.is_nan())
        .fold((0.0, 0usize), |(s, c), x| (s + x, c + 1));
    if count == 0 {
        return f64::NAN;
    }
    sum / count as f64
}

/// Descending order with `NaN` always last. Used with stable sorts so equal
/// values keep their input order.
pub fn cmp_desc_nan_last(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimals plus locale-aware thousands separators (`1,234,567.89`).
    // Undefined values render as `n/a` so tables keep their shape.
    if !n.is_finite() {
        return "n/a".to_string();
    }
    let neg = n.is_sign_negative() && n != 0.0;
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    // Beyond i64 range there is no sensible grouped rendering.
    let Ok(int_val) = int_part.parse::<i64>() else {
        return "n/a".to_string();
    };
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        if decimals > 0 {
            res.push('.');
            res.push_str(frac);
        }
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn province_is_extracted_from_known_prefixes() {
        assert_eq!(extract_province("PLTS-NTT-001").as_deref(), Some("NTT"));
        assert_eq!(extract_province("PLTM-JATIM-12").as_deref(), Some("JATIM"));
        assert_eq!(extract_province("ID/PLTS-SULS-7").as_deref(), Some("SULS"));
    }

    #[test]
    fn province_is_none_when_pattern_missing() {
        assert_eq!(extract_province("PLTB-NTT-001"), None);
        assert_eq!(extract_province("PLTS-ntt-001"), None);
        assert_eq!(extract_province("PLTS-NTT"), None);
        assert_eq!(extract_province(""), None);
    }

    #[test]
    fn impact_category_takes_first_case_sensitive_match() {
        assert_eq!(
            extract_impact_category("Impact: Medium (was High)"),
            Some(ImpactCategory::Medium)
        );
        assert_eq!(extract_impact_category("Low"), Some(ImpactCategory::Low));
        assert_eq!(extract_impact_category("high"), None);
        assert_eq!(extract_impact_category(""), None);
    }

    #[test]
    fn efficiency_is_a_plain_ratio() {
        assert_eq!(co2_efficiency(900.0, 300.0), 3.0);
        assert_eq!(co2_efficiency(0.0, 50.0), 0.0);
    }

    #[test]
    fn efficiency_with_zero_energy_is_nan() {
        assert!(co2_efficiency(100.0, 0.0).is_nan());
        assert!(co2_efficiency(0.0, 0.0).is_nan());
        assert!(co2_efficiency(100.0, f64::NAN).is_nan());
    }

    #[test]
    fn parse_accepts_separators_and_rejects_text() {
        assert_eq!(parse_f64_safe(Some(" 1,250.5 ")), Some(1250.5));
        assert_eq!(parse_f64_safe(Some("1e3")), Some(1000.0));
        assert_eq!(parse_f64_safe(Some("abc")), None);
        assert_eq!(parse_f64_safe(Some("")), None);
        assert_eq!(parse_f64_safe(None), None);
    }

    #[test]
    fn average_skips_nan() {
        assert_eq!(average(&[1.0, f64::NAN, 3.0]), 2.0);
        assert!(average(&[f64::NAN]).is_nan());
        assert!(average(&[]).is_nan());
    }

    #[test]
    fn descending_sort_puts_nan_last() {
        let mut v = vec![1.0, f64::NAN, 3.0, 2.0];
        v.sort_by(|a, b| cmp_desc_nan_last(*a, *b));
        assert_eq!(&v[..3], &[3.0, 2.0, 1.0]);
        assert!(v[3].is_nan());
    }

    #[test]
    fn numbers_are_grouped_and_nan_is_marked() {
        assert_eq!(format_number(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_number(-0.5, 1), "-0.5");
        assert_eq!(format_number(42.0, 0), "42");
        assert_eq!(format_number(f64::NAN, 2), "n/a");
        assert_eq!(format_int(9855u64), "9,855");
    }

    #[test]
    fn numbers_beyond_i64_are_not_shown_as_zero() {
        assert_eq!(format_number(1e19, 0), "n/a");
        assert_eq!(format_number(-1e19, 2), "n/a");
        assert_eq!(format_number(9.0e18, 0), "9,000,000,000,000,000,000");
    }

    #[test]
    fn comma_is_always_a_thousands_separator() {
        assert_eq!(parse_f64_safe(Some("1,5")), Some(15.0));
        assert_eq!(parse_f64_safe(Some("12,500")), Some(12500.0));
    }
}
