//! SVY21 (EPSG:3414) projected coordinates.
//!
//! SVY21 is a transverse Mercator projection on the WGS84 ellipsoid centred
//! on 1°22'N 103°50'E. HDB carpark data is published in it, so carpark
//! searches convert between it and WGS84.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::spatial::Coordinate;

const SEMI_MAJOR_AXIS: f64 = 6_378_137.0;
const FLATTENING: f64 = 1.0 / 298.257_223_563;
const ORIGIN_LATITUDE: f64 = 1.366_666;
const ORIGIN_LONGITUDE: f64 = 103.833_333;
const FALSE_NORTHING: f64 = 38_744.572;
const FALSE_EASTING: f64 = 28_001.642;
const SCALE_FACTOR: f64 = 1.0;

/// A point in the SVY21 grid, in metres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Svy21 {
    /// Grid easting (the `x_coord` column in HDB data).
    pub easting: f64,
    /// Grid northing (the `y_coord` column in HDB data).
    pub northing: f64,
}

struct Ellipsoid {
    b: f64,
    e2: f64,
    a0: f64,
    a2: f64,
    a4: f64,
    a6: f64,
}

impl Ellipsoid {
    fn wgs84() -> Self {
        let a = SEMI_MAJOR_AXIS;
        let f = FLATTENING;
        let e2 = 2.0 * f - f * f;
        let e4 = e2 * e2;
        let e6 = e4 * e2;
        Self {
            b: a * (1.0 - f),
            e2,
            a0: 1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0,
            a2: 3.0 / 8.0 * (e2 + e4 / 4.0 + 15.0 * e6 / 128.0),
            a4: 15.0 / 256.0 * (e4 + 3.0 * e6 / 4.0),
            a6: 35.0 * e6 / 3072.0,
        }
    }

    /// Meridian arc length from the equator to `lat_deg`.
    fn meridian_distance(&self, lat_deg: f64) -> f64 {
        let lat = lat_deg.to_radians();
        SEMI_MAJOR_AXIS
            * (self.a0 * lat - self.a2 * (2.0 * lat).sin() + self.a4 * (4.0 * lat).sin()
                - self.a6 * (6.0 * lat).sin())
    }

    /// Radius of curvature in the meridian.
    fn rho(&self, sin2_lat: f64) -> f64 {
        SEMI_MAJOR_AXIS * (1.0 - self.e2) / (1.0 - self.e2 * sin2_lat).powf(1.5)
    }

    /// Radius of curvature in the prime vertical.
    fn nu(&self, sin2_lat: f64) -> f64 {
        SEMI_MAJOR_AXIS / (1.0 - self.e2 * sin2_lat).sqrt()
    }
}

impl Svy21 {
    /// Create a grid point.
    #[must_use]
    pub const fn new(easting: f64, northing: f64) -> Self {
        Self { easting, northing }
    }

    /// Project a WGS84 coordinate onto the SVY21 grid.
    #[must_use]
    #[allow(clippy::many_single_char_names, clippy::similar_names)]
    pub fn from_wgs84(coord: Coordinate) -> Self {
        let ell = Ellipsoid::wgs84();
        let lat = coord.latitude.to_radians();
        let sin_lat = lat.sin();
        let sin2 = sin_lat * sin_lat;
        let cos_lat = lat.cos();
        let cos2 = cos_lat * cos_lat;
        let cos3 = cos2 * cos_lat;
        let cos4 = cos3 * cos_lat;
        let cos5 = cos4 * cos_lat;
        let cos6 = cos5 * cos_lat;
        let cos7 = cos6 * cos_lat;

        let rho = ell.rho(sin2);
        let v = ell.nu(sin2);
        let psi = v / rho;
        let psi2 = psi * psi;
        let psi3 = psi2 * psi;
        let psi4 = psi3 * psi;
        let t = lat.tan();
        let t2 = t * t;
        let t4 = t2 * t2;
        let t6 = t4 * t2;

        let w = (coord.longitude - ORIGIN_LONGITUDE).to_radians();
        let w2 = w * w;
        let w4 = w2 * w2;
        let w6 = w4 * w2;
        let w8 = w6 * w2;

        let m = ell.meridian_distance(coord.latitude);
        let m0 = ell.meridian_distance(ORIGIN_LATITUDE);

        let n1 = w2 / 2.0 * v * sin_lat * cos_lat;
        let n2 = w4 / 24.0 * v * sin_lat * cos3 * (4.0 * psi2 + psi - t2);
        let n3 = w6 / 720.0
            * v
            * sin_lat
            * cos5
            * (8.0 * psi4 * (11.0 - 24.0 * t2) - 28.0 * psi3 * (1.0 - 6.0 * t2)
                + psi2 * (1.0 - 32.0 * t2)
                - psi * 2.0 * t2
                + t4);
        let n4 = w8 / 40320.0 * v * sin_lat * cos7 * (1385.0 - 3111.0 * t2 + 543.0 * t4 - t6);
        let northing = FALSE_NORTHING + SCALE_FACTOR * (m - m0 + n1 + n2 + n3 + n4);

        let e1 = w2 / 6.0 * cos2 * (psi - t2);
        let e2 = w4 / 120.0
            * cos4
            * (4.0 * psi3 * (1.0 - 6.0 * t2) + psi2 * (1.0 + 8.0 * t2) - psi * 2.0 * t2 + t4);
        let e3 = w6 / 5040.0 * cos6 * (61.0 - 479.0 * t2 + 179.0 * t4 - t6);
        let easting = FALSE_EASTING + SCALE_FACTOR * v * w * cos_lat * (1.0 + e1 + e2 + e3);

        Self { easting, northing }
    }

    /// Convert this grid point back to WGS84.
    #[must_use]
    #[allow(clippy::many_single_char_names, clippy::similar_names)]
    pub fn to_wgs84(&self) -> Coordinate {
        let ell = Ellipsoid::wgs84();
        let a = SEMI_MAJOR_AXIS;
        let b = ell.b;

        let n_prime = self.northing - FALSE_NORTHING;
        let m0 = ell.meridian_distance(ORIGIN_LATITUDE);
        let m_prime = m0 + n_prime / SCALE_FACTOR;

        let n = (a - b) / (a + b);
        let n2 = n * n;
        let n3 = n2 * n;
        let n4 = n2 * n2;
        let g = a * (1.0 - n) * (1.0 - n2) * (1.0 + 9.0 * n2 / 4.0 + 225.0 * n4 / 64.0) * (PI / 180.0);
        let sigma = m_prime * PI / (180.0 * g);

        // Footpoint latitude.
        let lat_f = sigma
            + (3.0 * n / 2.0 - 27.0 * n3 / 32.0) * (2.0 * sigma).sin()
            + (21.0 * n2 / 16.0 - 55.0 * n4 / 32.0) * (4.0 * sigma).sin()
            + (151.0 * n3 / 96.0) * (6.0 * sigma).sin()
            + (1097.0 * n4 / 512.0) * (8.0 * sigma).sin();

        let sin_f = lat_f.sin();
        let sin2_f = sin_f * sin_f;
        let rho = ell.rho(sin2_f);
        let v = ell.nu(sin2_f);
        let psi = v / rho;
        let psi2 = psi * psi;
        let psi3 = psi2 * psi;
        let psi4 = psi3 * psi;
        let sec_f = 1.0 / lat_f.cos();
        let t = lat_f.tan();
        let t2 = t * t;
        let t4 = t2 * t2;
        let t6 = t4 * t2;

        let e_prime = self.easting - FALSE_EASTING;
        let x = e_prime / (SCALE_FACTOR * v);
        let x2 = x * x;
        let x3 = x2 * x;
        let x5 = x3 * x2;
        let x7 = x5 * x2;

        let lat_factor = t / (SCALE_FACTOR * rho);
        let lat1 = lat_factor * (e_prime * x / 2.0);
        let lat2 = lat_factor
            * (e_prime * x3 / 24.0)
            * (-4.0 * psi2 + 9.0 * psi * (1.0 - t2) + 12.0 * t2);
        let lat3 = lat_factor
            * (e_prime * x5 / 720.0)
            * (8.0 * psi4 * (11.0 - 24.0 * t2) - 12.0 * psi3 * (21.0 - 71.0 * t2)
                + 15.0 * psi2 * (15.0 - 98.0 * t2 + 15.0 * t4)
                + 180.0 * psi * (5.0 * t2 - 3.0 * t4)
                + 360.0 * t4);
        let lat4 = lat_factor
            * (e_prime * x7 / 40320.0)
            * (1385.0 - 3633.0 * t2 + 4095.0 * t4 + 1575.0 * t6);
        let latitude = (lat_f - lat1 + lat2 - lat3 + lat4).to_degrees();

        let lon1 = x * sec_f;
        let lon2 = x3 * sec_f / 6.0 * (psi + 2.0 * t2);
        let lon3 = x5 * sec_f / 120.0
            * (-4.0 * psi3 * (1.0 - 6.0 * t2) + psi2 * (9.0 - 68.0 * t2) + 72.0 * psi * t2
                + 24.0 * t4);
        let lon4 = x7 * sec_f / 5040.0 * (61.0 + 662.0 * t2 + 1320.0 * t4 + 720.0 * t6);
        let longitude = (ORIGIN_LONGITUDE.to_radians() + lon1 - lon2 + lon3 - lon4).to_degrees();

        Coordinate::new(latitude, longitude)
    }

    /// Straight-line grid distance to `other` in metres.
    #[must_use]
    pub fn planar_distance_m(&self, other: &Svy21) -> f64 {
        (self.easting - other.easting).hypot(self.northing - other.northing)
    }
}
