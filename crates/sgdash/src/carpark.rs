//! HDB carparks: static locations joined with live lot availability.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::io::Read;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::feed::types::{CarparkAvailability, LotInfo};
use crate::spatial::Coordinate;
use crate::svy21::Svy21;

/// Default search radius around a point, in metres.
pub const DEFAULT_RADIUS_M: f64 = 500.0;

/// A row of the HDB carpark information dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarparkInfo {
    /// Carpark number, e.g. `ACB`.
    #[serde(rename = "car_park_no")]
    pub carpark_number: String,
    /// Street address.
    #[serde(default)]
    pub address: String,
    /// SVY21 easting in metres.
    pub x_coord: f64,
    /// SVY21 northing in metres.
    pub y_coord: f64,
}

impl CarparkInfo {
    /// Position in SVY21.
    #[must_use]
    pub fn svy21(&self) -> Svy21 {
        Svy21::new(self.x_coord, self.y_coord)
    }
}

/// A carpark near a search point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearbyCarpark {
    /// The carpark record.
    pub info: CarparkInfo,
    /// Its WGS84 position.
    pub location: Coordinate,
    /// Planar distance from the search point in metres.
    pub distance_m: f64,
}

/// Lot counts for one lot type, parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LotAvailability {
    /// Upper-cased lot type code.
    pub lot_type: String,
    /// Readable lot type.
    pub type_name: &'static str,
    /// Lots free.
    pub available: u32,
    /// Lots in total.
    pub total: u32,
}

impl LotAvailability {
    fn from_lot(lot: &LotInfo) -> Self {
        let lot_type = lot.lot_type.to_uppercase();
        Self {
            type_name: lot_type_name(&lot_type),
            lot_type,
            available: lot.available(),
            total: lot.total(),
        }
    }

    /// Share of free lots in percent, 0 when the carpark reports no lots.
    #[must_use]
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            f64::from(self.available) / f64::from(self.total) * 100.0
        }
    }
}

/// A nearby carpark with whatever availability the live feed reported.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CarparkStatus {
    /// Location and distance.
    pub carpark: NearbyCarpark,
    /// Per lot type counts; empty when the feed has no entry.
    pub lots: Vec<LotAvailability>,
    /// Last update time as sent upstream.
    pub updated: Option<String>,
}

/// Readable name of an HDB lot type code.
#[must_use]
pub fn lot_type_name(code: &str) -> &'static str {
    match code.to_uppercase().as_str() {
        "C" => "Cars",
        "H" => "Heavy vehicles",
        "S" => "Motorcycles with side car",
        "Y" => "Motorcycles",
        _ => "Unknown",
    }
}

/// The HDB carpark directory.
#[derive(Debug, Clone, Default)]
pub struct CarparkDirectory {
    carparks: Vec<CarparkInfo>,
}

impl CarparkDirectory {
    /// Wrap already-parsed records.
    #[must_use]
    pub fn new(carparks: Vec<CarparkInfo>) -> Self {
        Self { carparks }
    }

    /// Parse the dataset CSV. Columns other than the four used are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Csv`] on a malformed row.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::Reader::from_reader(reader);
        let carparks = rdr.deserialize().collect::<std::result::Result<Vec<CarparkInfo>, _>>()?;
        debug!("Loaded {} carparks", carparks.len());
        Ok(Self { carparks })
    }

    /// Number of carparks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.carparks.len()
    }

    /// Whether the directory is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.carparks.is_empty()
    }

    /// Carparks within `radius_m` of `centre` (inclusive), nearest first.
    #[must_use]
    pub fn nearby(&self, centre: Coordinate, radius_m: f64) -> Vec<NearbyCarpark> {
        let origin = Svy21::from_wgs84(centre);
        let mut found: Vec<NearbyCarpark> = self
            .carparks
            .iter()
            .filter_map(|cp| {
                let pos = cp.svy21();
                let distance_m = origin.planar_distance_m(&pos);
                (distance_m <= radius_m).then(|| NearbyCarpark {
                    info: cp.clone(),
                    location: pos.to_wgs84(),
                    distance_m,
                })
            })
            .collect();
        found.sort_by(|a, b| a.distance_m.partial_cmp(&b.distance_m).unwrap_or(Ordering::Equal));
        found
    }
}

/// Attach live availability to `nearby`, matching carpark numbers without
/// regard to case.
#[must_use]
pub fn join_availability<'a>(
    nearby: Vec<NearbyCarpark>,
    availability: impl IntoIterator<Item = &'a CarparkAvailability>,
) -> Vec<CarparkStatus> {
    let lookup: HashMap<String, &CarparkAvailability> = availability
        .into_iter()
        .map(|a| (a.carpark_number.to_uppercase(), a))
        .collect();

    nearby
        .into_iter()
        .map(|carpark| {
            let entry = lookup.get(&carpark.info.carpark_number.to_uppercase());
            CarparkStatus {
                lots: entry
                    .map(|a| a.carpark_info.iter().map(LotAvailability::from_lot).collect())
                    .unwrap_or_default(),
                updated: entry.map(|a| a.update_datetime.clone()),
                carpark,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
car_park_no,address,x_coord,y_coord,car_park_type,type_of_parking_system
ACB,BLK 270/271 ALBERT CENTRE BASEMENT CAR PARK,30314.7936,31490.4942,BASEMENT CAR PARK,ELECTRONIC PARKING
ACM,BLK 98A ALJUNIED CRESCENT,33758.4143,33695.5198,MULTI-STOREY CAR PARK,ELECTRONIC PARKING
ORIGIN,SVY21 ORIGIN,28001.642,38744.572,SURFACE CAR PARK,COUPON PARKING
";

    fn directory() -> CarparkDirectory {
        CarparkDirectory::from_csv_reader(CSV.as_bytes()).unwrap()
    }

    fn availability(number: &str, total: &str, free: &str) -> CarparkAvailability {
        CarparkAvailability {
            carpark_number: number.to_string(),
            update_datetime: "2024-05-01T14:00:00".to_string(),
            carpark_info: vec![LotInfo {
                lot_type: "c".to_string(),
                total_lots: total.to_string(),
                lots_available: free.to_string(),
            }],
        }
    }

    #[test]
    fn test_parse_ignores_extra_columns() {
        let dir = directory();
        assert_eq!(dir.len(), 3);
        assert_eq!(dir.carparks[0].carpark_number, "ACB");
        assert!((dir.carparks[1].x_coord - 33_758.4143).abs() < 1e-9);
    }

    #[test]
    fn test_nearby_at_origin() {
        let centre = Coordinate::new(1.366_666, 103.833_333);
        let nearby = directory().nearby(centre, 50.0);
        assert_eq!(nearby.len(), 1);
        assert_eq!(nearby[0].info.carpark_number, "ORIGIN");
        assert!(nearby[0].distance_m < 1.0);
        assert!((nearby[0].location.latitude - 1.366_666).abs() < 1e-5);
    }

    #[test]
    fn test_nearby_sorted_and_inclusive() {
        let dir = directory();
        let acb = dir.carparks[0].svy21().to_wgs84();
        let all = dir.nearby(acb, 100_000.0);
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].info.carpark_number, "ACB");
        assert!(all.windows(2).all(|w| w[0].distance_m <= w[1].distance_m));

        let exact = all[1].distance_m;
        let bounded = dir.nearby(acb, exact);
        assert_eq!(bounded.len(), 2);
    }

    #[test]
    fn test_join_is_case_insensitive() {
        let nearby = directory().nearby(Coordinate::new(1.366_666, 103.833_333), 50.0);
        let feed = [availability("origin", "100", "25")];
        let joined = join_availability(nearby, &feed);

        assert_eq!(joined.len(), 1);
        let lots = &joined[0].lots;
        assert_eq!(lots.len(), 1);
        assert_eq!(lots[0].lot_type, "C");
        assert_eq!(lots[0].type_name, "Cars");
        assert_eq!(lots[0].available, 25);
        assert!((lots[0].percentage() - 25.0).abs() < f64::EPSILON);
        assert_eq!(joined[0].updated.as_deref(), Some("2024-05-01T14:00:00"));
    }

    #[test]
    fn test_join_without_feed_entry() {
        let nearby = directory().nearby(Coordinate::new(1.366_666, 103.833_333), 50.0);
        let joined = join_availability(nearby, &[]);
        assert!(joined[0].lots.is_empty());
        assert!(joined[0].updated.is_none());
    }

    #[test]
    fn test_unparseable_counts_are_zero() {
        let lot = LotAvailability::from_lot(&availability("X", "n/a", "").carpark_info[0]);
        assert_eq!(lot.total, 0);
        assert_eq!(lot.available, 0);
        assert!(lot.percentage().abs() < f64::EPSILON);
    }

    #[test]
    fn test_lot_type_names() {
        assert_eq!(lot_type_name("y"), "Motorcycles");
        assert_eq!(lot_type_name("H"), "Heavy vehicles");
        assert_eq!(lot_type_name(""), "Unknown");
    }
}
