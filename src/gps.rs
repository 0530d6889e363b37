use exif::Rational;

use crate::constants::GPS_PRECISION_DENOMINATOR;

/// Encode a value as a micro-degree EXIF rational (num/1_000_000).
pub fn to_rational(value: f64) -> Rational {
    Rational {
        num: (value * f64::from(GPS_PRECISION_DENOMINATOR)).round() as u32,
        denom: GPS_PRECISION_DENOMINATOR,
    }
}

/// Decompose a non-negative decimal degree value into degrees, minutes and
/// seconds, each encoded as a micro-degree rational.
///
/// Degrees and minutes are truncated, the remainder lands in seconds. For
/// values a hair below a whole minute the seconds component can round to
/// exactly 60; no carry into minutes is applied.
pub fn to_dms(value: f64) -> [Rational; 3] {
    let degrees = value.trunc();
    let minutes = ((value - degrees) * 60.0).trunc();
    let seconds = (value - degrees - minutes / 60.0) * 3600.0;
    [to_rational(degrees), to_rational(minutes), to_rational(seconds)]
}

/// Hemisphere reference for a signed latitude.
pub fn latitude_ref(lat: f64) -> &'static str {
    if lat >= 0.0 {
        "N"
    } else {
        "S"
    }
}

/// Hemisphere reference for a signed longitude.
pub fn longitude_ref(lon: f64) -> &'static str {
    if lon >= 0.0 {
        "E"
    } else {
        "W"
    }
}
