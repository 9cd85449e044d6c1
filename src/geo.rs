//! Great-circle distance and proximity ranking.
//!
//! Haversine on a spherical Earth (mean radius 6371 km). Accuracy is within
//! ~0.5% of the ellipsoid, which is more than enough for ordering schools
//! by distance.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

const DEG: f64 = PI / 180.0;

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A point on the sphere in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

/// A payload plus its computed distance from a reference point.
#[derive(Debug, Clone, Serialize)]
pub struct Ranked<T> {
    #[serde(flatten)]
    pub item: T,
    pub distance_km: f64,
}

/// Great-circle distance between two points, in kilometers.
///
/// Uses the angular-difference form of the haversine, so the ±180° seam and
/// antipodal pairs behave correctly. Total over all finite inputs:
/// out-of-range coordinates yield a number, never a panic. Range checks
/// belong to the callers at the boundary.
pub fn haversine_km(a: Coordinate, b: Coordinate) -> f64 {
    let dlat = (b.lat - a.lat) * DEG;
    let dlon = (b.lon - a.lon) * DEG;

    let h = (dlat / 2.0).sin().powi(2)
        + (a.lat * DEG).cos() * (b.lat * DEG).cos() * (dlon / 2.0).sin().powi(2);

    // Rounding can push h a hair past 1.0 near antipodes; clamp before asin.
    let c = 2.0 * h.sqrt().clamp(0.0, 1.0).asin();
    EARTH_RADIUS_KM * c
}

/// Rank items ascending by distance from `reference`.
///
/// `coord_of` extracts each item's position; everything else about the item
/// is carried through untouched. The sort is stable, so items at equal
/// distance keep their input order. `total_cmp` keeps the comparison total
/// even if a non-finite coordinate slipped past boundary validation.
pub fn rank<T>(
    reference: Coordinate,
    items: Vec<T>,
    coord_of: impl Fn(&T) -> Coordinate,
) -> Vec<Ranked<T>> {
    let mut ranked: Vec<Ranked<T>> = items
        .into_iter()
        .map(|item| {
            let distance_km = haversine_km(reference, coord_of(&item));
            Ranked { item, distance_km }
        })
        .collect();
    ranked.sort_by(|x, y| x.distance_km.total_cmp(&y.distance_km));
    ranked
}
