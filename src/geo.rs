// Pincode and city coordinate resolution.
//
// The exports carry an Indian postal pincode (and sometimes a city name)
// instead of real coordinates, so geocoding is a fixed-table lookup with a
// fallback chain: pincode -> city -> Mumbai center. The chain is total;
// callers can rely on always getting a coordinate pair back.
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// Mumbai center, the terminal fallback for everything unresolvable.
pub const DEFAULT_COORDS: (f64, f64) = (19.0760, 72.8777);

static PINCODE_COORDS: Lazy<HashMap<&'static str, (f64, f64)>> = Lazy::new(|| {
    HashMap::from([
        ("400078", (19.1011, 72.8376)),
        ("410206", (19.0330, 73.0297)),
        ("401105", (19.3000, 72.8500)),
        ("360001", (22.3039, 70.8022)),
        ("421301", (19.2333, 73.1333)),
        ("400003", (18.9500, 72.8333)),
        ("401303", (19.7000, 72.7667)),
        ("400705", (19.0330, 73.0150)),
        ("421204", (19.2167, 73.1500)),
        ("400072", (19.1667, 72.8333)),
        ("400092", (19.1167, 72.9167)),
        ("400104", (19.1667, 72.8667)),
        ("400607", (19.2167, 72.9667)),
        ("400089", (19.1333, 72.8167)),
        ("400701", (19.0330, 73.0667)),
        ("400602", (19.2167, 72.9833)),
        ("401101", (19.3000, 72.8667)),
        ("400065", (19.0667, 72.8833)),
        ("400601", (19.1950, 72.9770)),
        ("400706", (19.0330, 73.0297)),
        ("400101", (19.0760, 72.8777)),
        ("421202", (19.2403, 73.1305)),
        ("833214", (22.8000, 85.3333)),
    ])
});

static CITY_COORDS: Lazy<HashMap<&'static str, (f64, f64)>> = Lazy::new(|| {
    HashMap::from([
        ("Mumbai", (19.0760, 72.8777)),
        ("Thane", (19.2183, 72.9781)),
        ("Navi Mumbai", (19.0330, 73.0297)),
        ("Rajkot", (22.3039, 70.8022)),
        ("Kalyan", (19.2403, 73.1305)),
        ("Dombivli", (19.2133, 73.0833)),
        ("Mira Bhayandar", (19.2952, 72.8544)),
        ("Virar", (19.4657, 72.8114)),
        ("Adai", (19.0330, 73.0297)),
        ("Vashi", (19.0771, 72.9986)),
        ("Sion", (19.0400, 72.8600)),
        ("Ambdiha", (22.8000, 85.3333)),
    ])
});

static PINCODE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{6}").unwrap());

/// Which rung of the fallback chain produced a coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordSource {
    Pincode,
    City,
    Default,
}

/// Extract the first 6-digit run from a raw pincode-ish field. The exports
/// mix bare pincodes with strings like "Thane, 400601".
pub fn extract_pincode(raw: &str) -> Option<String> {
    PINCODE_RE.find(raw).map(|m| m.as_str().to_string())
}

pub fn pincode_coords(pincode: &str) -> Option<(f64, f64)> {
    PINCODE_COORDS.get(pincode).copied()
}

pub fn city_coords(city: &str) -> Option<(f64, f64)> {
    CITY_COORDS.get(city).copied()
}

/// Resolve coordinates for a row: pincode table, then city table, then
/// `DEFAULT_COORDS`. Never fails.
pub fn locate(pincode: Option<&str>, city: Option<&str>) -> (f64, f64, CoordSource) {
    if let Some((lat, lon)) = pincode.and_then(pincode_coords) {
        return (lat, lon, CoordSource::Pincode);
    }
    if let Some((lat, lon)) = city.and_then(city_coords) {
        return (lat, lon, CoordSource::City);
    }
    (DEFAULT_COORDS.0, DEFAULT_COORDS.1, CoordSource::Default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_six_digit_runs() {
        assert_eq!(extract_pincode("400601"), Some("400601".to_string()));
        assert_eq!(extract_pincode("Thane, 400601"), Some("400601".to_string()));
        assert_eq!(extract_pincode("Thane West"), None);
        assert_eq!(extract_pincode("4006"), None);
    }

    #[test]
    fn fallback_chain_order() {
        let (lat, lon, src) = locate(Some("400601"), Some("Rajkot"));
        assert_eq!((lat, lon), (19.1950, 72.9770));
        assert_eq!(src, CoordSource::Pincode);

        let (lat, lon, src) = locate(Some("999999"), Some("Thane"));
        assert_eq!((lat, lon), (19.2183, 72.9781));
        assert_eq!(src, CoordSource::City);

        let (lat, lon, src) = locate(None, Some("Atlantis"));
        assert_eq!((lat, lon), DEFAULT_COORDS);
        assert_eq!(src, CoordSource::Default);

        let (.., src) = locate(None, None);
        assert_eq!(src, CoordSource::Default);
    }
}
