//! WGS84 coordinates and distance filtering.
//!
//! Distances are geodesic on the WGS84 ellipsoid.

use std::cmp::Ordering;
use std::fmt;

use ::geo::{Distance, Geodesic, Point};
use serde::{Deserialize, Serialize};

/// A WGS84 latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees, positive north.
    pub latitude: f64,
    /// Longitude in degrees, positive east.
    pub longitude: f64,
}

impl Coordinate {
    /// Create a coordinate.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Geodesic distance to `other` in kilometres.
    #[must_use]
    pub fn distance_km(&self, other: &Coordinate) -> f64 {
        distance_km(*self, *other)
    }

    fn to_point(self) -> Point<f64> {
        Point::new(self.longitude, self.latitude)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.latitude, self.longitude)
    }
}

/// An axis-aligned latitude/longitude box, bounds inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Southern edge.
    pub min_latitude: f64,
    /// Northern edge.
    pub max_latitude: f64,
    /// Western edge.
    pub min_longitude: f64,
    /// Eastern edge.
    pub max_longitude: f64,
}

/// Plausible extent of mainland Singapore and its road network.
pub const SINGAPORE: BoundingBox = BoundingBox {
    min_latitude: 1.2,
    max_latitude: 1.5,
    min_longitude: 103.6,
    max_longitude: 104.1,
};

impl BoundingBox {
    /// Check whether `coord` lies inside the box.
    #[must_use]
    pub fn contains(&self, coord: Coordinate) -> bool {
        (self.min_latitude..=self.max_latitude).contains(&coord.latitude)
            && (self.min_longitude..=self.max_longitude).contains(&coord.longitude)
    }
}

/// Geodesic distance between two coordinates in kilometres.
#[must_use]
pub fn distance_km(a: Coordinate, b: Coordinate) -> f64 {
    Geodesic::distance(a.to_point(), b.to_point()) / 1000.0
}

/// An item paired with its distance from a search centre.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ranked<T> {
    /// The matched item.
    pub item: T,
    /// Distance from the centre in kilometres.
    pub distance_km: f64,
}

/// Split `items` by distance from `centre`.
///
/// Returns every item strictly closer than `radius_km`, nearest first, and
/// the single nearest item regardless of radius. The nearest item is `None`
/// only when `items` is empty.
pub fn filter_within_radius<T, I, F>(
    centre: Coordinate,
    radius_km: f64,
    items: I,
    coord_of: F,
) -> (Vec<Ranked<T>>, Option<Ranked<T>>)
where
    T: Clone,
    I: IntoIterator<Item = T>,
    F: Fn(&T) -> Coordinate,
{
    let mut ranked: Vec<Ranked<T>> = items
        .into_iter()
        .map(|item| {
            let distance_km = distance_km(centre, coord_of(&item));
            Ranked { item, distance_km }
        })
        .collect();

    ranked.sort_by(|a, b| {
        a.distance_km
            .partial_cmp(&b.distance_km)
            .unwrap_or(Ordering::Equal)
    });

    let nearest = ranked.first().cloned();
    ranked.retain(|r| r.distance_km < radius_km);
    (ranked, nearest)
}
