//! Great-circle helpers over plain latitude/longitude pairs in degrees.
//!
//! These are stateless: they never touch live decoder state and accept
//! whatever coordinates the caller supplies, decoded or not.

// Inherent float math covers std builds; the trait supplies sin/cos/sqrt
// through libm everywhere else.
#[allow(unused_imports)]
use num_traits::Float;

/// Mean Earth radius used for the great-circle arc, meters.
pub const EARTH_RADIUS_METERS: f64 = 6_372_795.0;

const CARDINALS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

/// Great-circle distance between two points in meters.
pub fn distance_between(lat1: f64, long1: f64, lat2: f64, long2: f64) -> f64 {
    let delta = (long1 - long2).to_radians();
    let sdlong = delta.sin();
    let cdlong = delta.cos();
    let lat1 = lat1.to_radians();
    let lat2 = lat2.to_radians();
    let slat1 = lat1.sin();
    let clat1 = lat1.cos();
    let slat2 = lat2.sin();
    let clat2 = lat2.cos();
    let delta = (clat1 * slat2) - (slat1 * clat2 * cdlong);
    let delta = (delta * delta + (clat2 * sdlong) * (clat2 * sdlong)).sqrt();
    let denom = (slat1 * slat2) + (clat1 * clat2 * cdlong);
    delta.atan2(denom) * EARTH_RADIUS_METERS
}

/// Initial bearing from the first point to the second, degrees in `[0,360)`.
pub fn course_to(lat1: f64, long1: f64, lat2: f64, long2: f64) -> f64 {
    let dlon = (long2 - long1).to_radians();
    let lat1 = lat1.to_radians();
    let lat2 = lat2.to_radians();
    let a1 = dlon.sin() * lat2.cos();
    let a2 = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
    let course = a1.atan2(a2);
    let course = if course < 0.0 {
        course + 2.0 * core::f64::consts::PI
    } else {
        course
    };
    course.to_degrees()
}

/// Nearest of the 16 compass points for a bearing in degrees.
pub fn cardinal(course: f64) -> &'static str {
    let sector = ((course + 11.25) / 22.5) as usize;
    CARDINALS[sector % 16]
}
