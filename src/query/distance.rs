//! Great-circle helpers on a spherical Earth.

use geo::{BoundingRect, LineString, Polygon, Translate};

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Haversine distance in meters between two `(lat, lng)` points given in degrees.
pub fn haversine_m(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lng2 - lng1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.clamp(0.0, 1.0).sqrt().asin()
}

/// Point reached from `(lat, lng)` after `distance_m` meters along `bearing_deg`.
/// Returns `(lat, lng)` in degrees, longitude normalised to [-180, 180).
pub fn destination(lat: f64, lng: f64, bearing_deg: f64, distance_m: f64) -> (f64, f64) {
    let phi1 = lat.to_radians();
    let lambda1 = lng.to_radians();
    let theta = bearing_deg.to_radians();
    let delta = distance_m / EARTH_RADIUS_M;

    let phi2 = (phi1.sin() * delta.cos() + phi1.cos() * delta.sin() * theta.cos()).asin();
    let lambda2 = lambda1
        + (theta.sin() * delta.sin() * phi1.cos()).atan2(delta.cos() - phi1.sin() * phi2.sin());

    let lng2 = (lambda2.to_degrees() + 540.0).rem_euclid(360.0) - 180.0;
    (phi2.to_degrees(), lng2)
}

/// Closed polygon with `vertices` corners approximating the circle of `radius_m`
/// around `(lng, lat)`. Coordinates are `(x = lng, y = lat)`.
///
/// Longitudes stay continuous from one vertex to the next, so a circle that
/// crosses the antimeridian extends past ±180. The boundary of a circle
/// enclosing a pole is unrolled over three turns of longitude and closed along
/// the pole's latitude.
pub fn circle_polygon(lng: f64, lat: f64, radius_m: f64, vertices: usize) -> Polygon<f64> {
    if vertices == 0 {
        return Polygon::new(LineString::new(vec![]), vec![]);
    }

    let mut ring: Vec<(f64, f64)> = Vec::with_capacity(3 * vertices + 4);
    for i in 0..=vertices {
        let bearing = 360.0 * i as f64 / vertices as f64;
        let (y, x) = destination(lat, lng, bearing, radius_m);
        let x = match ring.last() {
            Some(&(prev, _)) => unwrap_lng(x, prev),
            None => x,
        };
        ring.push((x, y));
    }

    let (first_x, first_y) = ring[0];
    let winding = ring[vertices].0 - first_x;
    ring.pop();

    if winding.abs() > 180.0 {
        let turn = 360.0 * winding.signum();
        let boundary = ring.clone();
        for k in 1..3 {
            let offset = turn * k as f64;
            ring.extend(boundary.iter().map(|&(x, y)| (x + offset, y)));
        }

        let end_x = first_x + 3.0 * turn;
        let pole = if lat >= 0.0 { 90.0 } else { -90.0 };
        ring.push((end_x, first_y));
        ring.push((end_x, pole));
        ring.push((first_x, pole));
    }
    ring.push((first_x, first_y));

    Polygon::new(LineString::from(ring), vec![])
}

/// The circle as query shapes in [-180, 180] longitude space: the continuous
/// polygon plus a copy shifted by 360° for every side that runs past ±180.
/// A polar cap becomes a single shape whose longitude range strictly contains
/// [-180, 180], so no meridian lies on its edge.
pub fn circle_shapes(lng: f64, lat: f64, radius_m: f64, vertices: usize) -> Vec<Polygon<f64>> {
    let polygon = circle_polygon(lng, lat, radius_m, vertices);
    let Some(rect) = polygon.bounding_rect() else {
        return vec![polygon];
    };

    if rect.max().x - rect.min().x >= 360.0 {
        let turns = ((-720.0 - rect.min().x) / 360.0).ceil();
        return vec![polygon.translate(360.0 * turns, 0.0)];
    }

    let mut shapes = Vec::with_capacity(2);
    if rect.min().x < -180.0 {
        shapes.push(polygon.translate(360.0, 0.0));
    }
    if rect.max().x > 180.0 {
        shapes.push(polygon.translate(-360.0, 0.0));
    }
    shapes.push(polygon);
    shapes
}

/// `lng` shifted by whole turns to lie within 180° of `reference`.
fn unwrap_lng(lng: f64, reference: f64) -> f64 {
    lng + 360.0 * ((reference - lng) / 360.0).round()
}
