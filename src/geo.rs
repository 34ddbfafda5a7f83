// Static province -> (latitude, longitude) table used to place projects on
// the map. Read-only for the lifetime of the process.
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Map centre and zoom used by the exported GeoJSON viewer hint.
pub const MAP_CENTER: (f64, f64) = (-2.0, 117.0);
pub const MAP_ZOOM: u8 = 4;

static PROVINCE_COORDS: Lazy<HashMap<&'static str, (f64, f64)>> = Lazy::new(|| {
    HashMap::from([
        ("NTT", (-10.1772, 123.607)),
        ("NTB", (-8.652, 117.361)),
        ("JATIM", (-7.536, 112.238)),
        ("SUMUT", (2.1154, 99.5451)),
        ("KALB", (0.1322, 111.096)),
        ("PAPU", (-4.2699, 138.08)),
        ("SULS", (-3.6688, 119.974)),
        ("SULU", (1.4306, 120.654)),
        ("ACHD", (4.6951, 96.7494)),
        ("JABW", (-6.9175, 107.6191)),
    ])
});

/// Coordinates of a province code, `None` for codes outside the table.
pub fn province_coordinates(code: &str) -> Option<(f64, f64)> {
    PROVINCE_COORDS.get(code).copied()
}

pub fn is_mapped(code: &str) -> bool {
    PROVINCE_COORDS.contains_key(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_resolve() {
        assert_eq!(province_coordinates("NTT"), Some((-10.1772, 123.607)));
        assert_eq!(province_coordinates("JABW"), Some((-6.9175, 107.6191)));
        assert!(is_mapped("SULU"));
    }

    #[test]
    fn unknown_codes_do_not_resolve() {
        assert_eq!(province_coordinates("BALI"), None);
        assert_eq!(province_coordinates(""), None);
        assert_eq!(province_coordinates("ntt"), None);
        assert!(!is_mapped("DKI"));
    }
}
