//! Spherical-earth geodesy on `(lon, lat)` coordinates in degrees.
//!
//! Coordinates follow the `geo` convention: `x` is the longitude, `y` the latitude.

use geo::{HaversineDistance, Point};
use geo_types::Coord;

/// Mean earth radius in metres used for destination points.
pub const EARTH_RADIUS: f64 = 6_371e3;

/// Maps any longitude onto `[-180, 180)`.
///
/// Equivalent to `((lon + 540) mod 360) - 180` with a euclidean modulo, so large
/// negative inputs wrap the same way as positive ones.
pub fn normalize_longitude(lon: f64) -> f64 {
    let lon = (lon + 540.).rem_euclid(360.) - 180.;
    // rem_euclid may round up to the modulus for tiny negative inputs
    if lon >= 180. { lon - 360. } else { lon }
}

/// Destination reached from `start` after travelling `distance` metres along the
/// great circle with initial `bearing` (degrees clockwise from north).
///
/// Formulation after <http://www.movable-type.co.uk/scripts/latlong.html>.
pub fn destination_point(start: Coord, distance: f64, bearing: f64) -> Coord {
    let lat1 = start.y.to_radians();
    let lon1 = start.x.to_radians();
    let bearing = bearing.to_radians();
    let angular_distance = distance / EARTH_RADIUS;

    let sin_lat2 =
        lat1.sin() * angular_distance.cos() + lat1.cos() * angular_distance.sin() * bearing.cos();
    let lat2 = sin_lat2.clamp(-1., 1.).asin();

    let y = bearing.sin() * angular_distance.sin() * lat1.cos();
    let x = angular_distance.cos() - lat1.sin() * lat2.sin();
    let lon2 = lon1 + y.atan2(x);

    Coord {
        x: normalize_longitude(lon2.to_degrees()),
        y: lat2.to_degrees(),
    }
}

/// Great-circle distance in metres between two coordinates.
pub fn distance(a: Coord, b: Coord) -> f64 {
    Point::from(a).haversine_distance(&Point::from(b))
}
