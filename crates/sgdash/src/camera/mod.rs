//! Traffic camera reference table.
//!
//! Maps each camera ID to its installed position and a short description.
//! The built-in table is a snapshot; a CSV file can replace it at runtime.

mod locations;

use std::collections::btree_map::{self, BTreeMap};
use std::fmt;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use regex::RegexBuilder;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, error};

use crate::error::{Error, Result};
use crate::spatial::{self, Coordinate, Ranked, SINGAPORE};

pub use locations::SNAPSHOT_DATE;

/// Camera used when no table file can be found.
pub const FALLBACK_CAMERA: (u32, f64, f64, &str) = (2701, 1.447_023_728, 103.771_654_3, "Causeway");

/// A single camera installation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraLocation {
    /// Camera ID as used by the traffic images feed.
    pub id: u32,
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
    /// Where the camera points.
    pub description: String,
}

impl CameraLocation {
    /// Build a location from its parts.
    #[must_use]
    pub fn new(id: u32, latitude: f64, longitude: f64, description: impl Into<String>) -> Self {
        Self {
            id,
            latitude,
            longitude,
            description: description.into(),
        }
    }

    /// The camera position.
    #[must_use]
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// Value side of the JSON export, keyed by ID.
#[derive(Debug, Serialize, Deserialize)]
struct JsonEntry {
    latitude: f64,
    longitude: f64,
    description: String,
}

/// JSON object entries in document order, repeated keys included.
#[derive(Debug)]
struct JsonEntries(Vec<(u32, JsonEntry)>);

impl<'de> Deserialize<'de> for JsonEntries {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = JsonEntries;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object keyed by camera ID")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut map: A,
            ) -> std::result::Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<u32, JsonEntry>()? {
                    entries.push(entry);
                }
                Ok(JsonEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CsvRow {
    #[serde(rename = "ID")]
    id: u32,
    #[serde(rename = "Lat")]
    latitude: f64,
    #[serde(rename = "Lon")]
    longitude: f64,
    #[serde(rename = "Description")]
    description: String,
}

/// A problem found by [`CameraTable::validate`].
#[derive(Debug, Clone, PartialEq)]
pub enum Violation {
    /// ID 0 is not a camera.
    ZeroId,
    /// Position falls outside Singapore.
    OutOfBounds {
        /// Offending camera.
        id: u32,
        /// Its recorded position.
        coordinate: Coordinate,
    },
    /// Description is blank.
    EmptyDescription(u32),
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroId => write!(f, "camera id 0 is not valid"),
            Self::OutOfBounds { id, coordinate } => {
                write!(f, "camera {id} at ({coordinate}) is outside Singapore")
            }
            Self::EmptyDescription(id) => write!(f, "camera {id} has an empty description"),
        }
    }
}

/// Camera locations keyed by ID, iterated in ascending ID order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CameraTable {
    cameras: BTreeMap<u32, CameraLocation>,
}

impl CameraTable {
    /// The built-in table.
    #[must_use]
    pub fn snapshot() -> Self {
        let cameras = locations::CAMERA_LOCATIONS
            .iter()
            .map(|&(id, lat, lon, desc)| (id, CameraLocation::new(id, lat, lon, desc)))
            .collect();
        Self { cameras }
    }

    /// Build a table, rejecting repeated IDs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateCamera`] on the first repeated ID.
    pub fn from_records(records: impl IntoIterator<Item = CameraLocation>) -> Result<Self> {
        let mut cameras = BTreeMap::new();
        for record in records {
            match cameras.entry(record.id) {
                btree_map::Entry::Occupied(_) => return Err(Error::DuplicateCamera(record.id)),
                btree_map::Entry::Vacant(slot) => {
                    slot.insert(record);
                }
            }
        }
        Ok(Self { cameras })
    }

    /// Look up a camera by ID.
    #[must_use]
    pub fn get(&self, id: u32) -> Option<&CameraLocation> {
        self.cameras.get(&id)
    }

    /// Look up a camera by ID, failing when it is absent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownCamera`].
    pub fn require(&self, id: u32) -> Result<&CameraLocation> {
        self.get(id).ok_or(Error::UnknownCamera(id))
    }

    /// All cameras in ascending ID order.
    pub fn iter(&self) -> impl Iterator<Item = &CameraLocation> {
        self.cameras.values()
    }

    /// All IDs in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.cameras.keys().copied()
    }

    /// Number of cameras.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cameras.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cameras.is_empty()
    }

    /// Every rule the table breaks; empty when it is sound.
    #[must_use]
    pub fn validate(&self) -> Vec<Violation> {
        let mut violations = Vec::new();
        for camera in self.iter() {
            if camera.id == 0 {
                violations.push(Violation::ZeroId);
            }
            if !SINGAPORE.contains(camera.coordinate()) {
                violations.push(Violation::OutOfBounds {
                    id: camera.id,
                    coordinate: camera.coordinate(),
                });
            }
            if camera.description.trim().is_empty() {
                violations.push(Violation::EmptyDescription(camera.id));
            }
        }
        violations
    }

    /// Cameras whose description matches `pattern`, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Pattern`] when `pattern` is not a valid regex.
    pub fn search(&self, pattern: &str) -> Result<Vec<&CameraLocation>> {
        let re = RegexBuilder::new(pattern).case_insensitive(true).build()?;
        Ok(self.iter().filter(|c| re.is_match(&c.description)).collect())
    }

    /// The camera closest to `centre`.
    #[must_use]
    pub fn nearest(&self, centre: Coordinate) -> Option<Ranked<&CameraLocation>> {
        spatial::filter_within_radius(centre, 0.0, self.iter(), |c| c.coordinate()).1
    }

    /// Cameras strictly closer than `radius_km` to `centre`, nearest first.
    #[must_use]
    pub fn within_radius(&self, centre: Coordinate, radius_km: f64) -> Vec<Ranked<&CameraLocation>> {
        spatial::filter_within_radius(centre, radius_km, self.iter(), |c| c.coordinate()).0
    }

    /// Serialize as a JSON object keyed by camera ID.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        let map: BTreeMap<u32, JsonEntry> = self
            .iter()
            .map(|c| {
                (
                    c.id,
                    JsonEntry {
                        latitude: c.latitude,
                        longitude: c.longitude,
                        description: c.description.clone(),
                    },
                )
            })
            .collect();
        Ok(serde_json::to_string_pretty(&map)?)
    }

    /// Parse the format written by [`to_json`](Self::to_json).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] on malformed input, including non-numeric keys,
    /// or [`Error::DuplicateCamera`] when a key repeats.
    pub fn from_json(json: &str) -> Result<Self> {
        let JsonEntries(entries) = serde_json::from_str(json)?;
        Self::from_records(
            entries
                .into_iter()
                .map(|(id, e)| CameraLocation::new(id, e.latitude, e.longitude, e.description)),
        )
    }

    /// Write the table as CSV with header `ID,Lat,Lon,Description`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Csv`] on write failure.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        for c in self.iter() {
            wtr.serialize(CsvRow {
                id: c.id,
                latitude: c.latitude,
                longitude: c.longitude,
                description: c.description.clone(),
            })?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// The table as a CSV string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Csv`] on write failure.
    pub fn to_csv(&self) -> Result<String> {
        let mut buf = Vec::new();
        self.write_csv(&mut buf)?;
        String::from_utf8(buf).map_err(|e| Error::internal(e.to_string()))
    }

    /// Read a table from CSV with header `ID,Lat,Lon,Description`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Csv`] on malformed rows or
    /// [`Error::DuplicateCamera`] on repeated IDs.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::Reader::from_reader(reader);
        let mut records = Vec::new();
        for row in rdr.deserialize() {
            let row: CsvRow = row?;
            records.push(CameraLocation::new(
                row.id,
                row.latitude,
                row.longitude,
                row.description,
            ));
        }
        Self::from_records(records)
    }

    /// Load a CSV table, falling back to the single Causeway camera when the
    /// file does not exist.
    ///
    /// # Errors
    ///
    /// Returns any error other than a missing file.
    pub fn load_csv_or_fallback(path: &Path) -> Result<Self> {
        match File::open(path) {
            Ok(file) => {
                let table = Self::from_csv_reader(file)?;
                debug!("Loaded {} cameras from {}", table.len(), path.display());
                Ok(table)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                error!("Camera table {} not found, using fallback", path.display());
                Ok(Self::fallback())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// The one-camera table used when nothing else is available.
    #[must_use]
    pub fn fallback() -> Self {
        let (id, lat, lon, desc) = FALLBACK_CAMERA;
        let mut cameras = BTreeMap::new();
        cameras.insert(id, CameraLocation::new(id, lat, lon, desc));
        Self { cameras }
    }
}

impl<'a> IntoIterator for &'a CameraTable {
    type Item = &'a CameraLocation;
    type IntoIter = btree_map::Values<'a, u32, CameraLocation>;

    fn into_iter(self) -> Self::IntoIter {
        self.cameras.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    #[allow(clippy::float_cmp)]
    fn test_snapshot_known_camera() {
        let table = CameraTable::snapshot();
        let cam = table.get(1001).unwrap();
        assert_eq!(cam.latitude, 1.295_313_32);
        assert_eq!(cam.longitude, 103.871_146);
        assert_eq!(cam.description, "ECP/MCE/KPE instersection");
    }

    #[test]
    fn test_snapshot_size_and_order() {
        let table = CameraTable::snapshot();
        assert_eq!(table.len(), locations::CAMERA_LOCATIONS.len());
        assert!(table.len() > 80);
        let ids: Vec<u32> = table.ids().collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn test_snapshot_ids_unique_and_positive() {
        let mut seen = HashSet::new();
        for &(id, ..) in locations::CAMERA_LOCATIONS {
            assert!(id > 0);
            assert!(seen.insert(id), "duplicate id {id}");
        }
    }

    #[test]
    fn test_snapshot_is_valid() {
        let violations = CameraTable::snapshot().validate();
        assert!(violations.is_empty(), "{violations:?}");
    }

    #[test]
    fn test_snapshot_within_bounds() {
        for cam in &CameraTable::snapshot() {
            assert!((1.2..=1.5).contains(&cam.latitude), "{}", cam.id);
            assert!((103.6..=104.1).contains(&cam.longitude), "{}", cam.id);
            assert!(!cam.description.is_empty());
        }
    }

    #[test]
    fn test_get_missing() {
        let table = CameraTable::snapshot();
        assert!(table.get(1).is_none());
        assert!(matches!(table.require(1), Err(Error::UnknownCamera(1))));
    }

    #[test]
    fn test_validate_reports_every_problem() {
        let table = CameraTable::from_records([
            CameraLocation::new(0, 1.3, 103.8, "zero"),
            CameraLocation::new(5, 51.5, -0.1, " "),
        ])
        .unwrap();
        let violations = table.validate();
        assert_eq!(violations.len(), 3);
        assert!(violations.contains(&Violation::ZeroId));
        assert!(violations.contains(&Violation::EmptyDescription(5)));
    }

    #[test]
    fn test_duplicate_rejected() {
        let err = CameraTable::from_records([
            CameraLocation::new(7, 1.3, 103.8, "a"),
            CameraLocation::new(7, 1.31, 103.81, "b"),
        ])
        .unwrap_err();
        assert!(matches!(err, Error::DuplicateCamera(7)));
    }

    #[test]
    fn test_json_round_trip() {
        let table = CameraTable::snapshot();
        let json = table.to_json().unwrap();
        let parsed = CameraTable::from_json(&json).unwrap();
        assert_eq!(parsed, table);
    }

    #[test]
    fn test_json_keys_are_strings() {
        let json = CameraTable::snapshot().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(
            value["1001"]["description"],
            serde_json::json!("ECP/MCE/KPE instersection")
        );
    }

    #[test]
    fn test_csv_round_trip() {
        let table = CameraTable::snapshot();
        let csv = table.to_csv().unwrap();
        assert!(csv.starts_with("ID,Lat,Lon,Description\n"));
        let parsed = CameraTable::from_csv_reader(csv.as_bytes()).unwrap();
        assert_eq!(parsed, table);
    }

    #[test]
    fn test_csv_duplicate_rejected() {
        let csv = "ID,Lat,Lon,Description\n1,1.3,103.8,a\n1,1.3,103.8,b\n";
        assert!(matches!(
            CameraTable::from_csv_reader(csv.as_bytes()),
            Err(Error::DuplicateCamera(1))
        ));
    }

    #[test]
    fn test_json_duplicate_rejected() {
        let json = r#"{
            "7": {"latitude": 1.3, "longitude": 103.8, "description": "a"},
            "7": {"latitude": 1.3, "longitude": 103.8, "description": "b"}
        }"#;
        assert!(matches!(
            CameraTable::from_json(json),
            Err(Error::DuplicateCamera(7))
        ));
    }

    #[test]
    fn test_json_non_numeric_key_rejected() {
        let json = r#"{"cam": {"latitude": 1.3, "longitude": 103.8, "description": "a"}}"#;
        assert!(matches!(CameraTable::from_json(json), Err(Error::Json(_))));
    }

    #[test]
    #[allow(clippy::float_cmp)]
    fn test_load_missing_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let table = CameraTable::load_csv_or_fallback(&dir.path().join("absent.csv")).unwrap();
        assert_eq!(table.len(), 1);
        let cam = table.get(2701).unwrap();
        assert_eq!(cam.latitude, 1.447_023_728);
        assert_eq!(cam.longitude, 103.771_654_3);
        assert_eq!(cam.description, "Causeway");
    }

    #[test]
    fn test_load_csv_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cams.csv");
        std::fs::write(&path, "ID,Lat,Lon,Description\n42,1.3,103.8,Test cam\n").unwrap();
        let table = CameraTable::load_csv_or_fallback(&path).unwrap();
        assert_eq!(table.get(42).unwrap().description, "Test cam");
    }

    #[test]
    fn test_load_malformed_csv_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        std::fs::write(&path, "ID,Lat,Lon,Description\nabc,1.3,103.8,x\n").unwrap();
        assert!(matches!(
            CameraTable::load_csv_or_fallback(&path),
            Err(Error::Csv(_))
        ));
    }

    #[test]
    fn test_search_case_insensitive() {
        let table = CameraTable::snapshot();
        let hits = table.search("causeway").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, 2701);
        assert!(table.search("^PIE").unwrap().len() > 5);
        assert!(matches!(table.search("("), Err(Error::Pattern(_))));
    }

    #[test]
    fn test_nearest_and_radius() {
        let table = CameraTable::snapshot();
        let causeway = Coordinate::new(1.447_023_728, 103.771_654_3);

        let nearest = table.nearest(causeway).unwrap();
        assert_eq!(nearest.item.id, 2701);
        assert!(nearest.distance_km < 1e-6);

        let nearby = table.within_radius(causeway, 1.0);
        assert!(nearby.iter().any(|r| r.item.id == 2702));
        assert!(nearby.iter().all(|r| r.distance_km < 1.0));
        assert!(nearby.windows(2).all(|w| w[0].distance_km <= w[1].distance_km));
    }

    #[test]
    fn test_empty_table() {
        let table = CameraTable::default();
        assert!(table.is_empty());
        assert!(table.nearest(Coordinate::new(1.3, 103.8)).is_none());
    }
}
