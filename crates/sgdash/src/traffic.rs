//! LTA traffic speed bands.

use serde::{Deserialize, Serialize};

/// Speed band ranges in km/h, indexed by `band - 1`.
///
/// Band 8 is open-ended upstream; 100 km/h caps it so a midpoint exists.
const BAND_RANGES: [(u32, u32); 8] = [
    (0, 9),
    (10, 19),
    (20, 29),
    (30, 39),
    (40, 49),
    (50, 59),
    (60, 69),
    (70, 100),
];

/// A DataMall speed band, 1 (crawling) to 8 (free flowing).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct SpeedBand(u8);

impl SpeedBand {
    /// Wrap a raw band number, rejecting anything outside 1..=8.
    #[must_use]
    pub fn new(band: u8) -> Option<Self> {
        (1..=8).contains(&band).then_some(Self(band))
    }

    /// The raw band number.
    #[must_use]
    pub fn get(self) -> u8 {
        self.0
    }

    /// Speed range `(min, max)` in km/h.
    #[must_use]
    pub fn range(self) -> (u32, u32) {
        BAND_RANGES[usize::from(self.0 - 1)]
    }

    /// Midpoint of the speed range in km/h.
    #[must_use]
    pub fn midpoint(self) -> f64 {
        let (min, max) = self.range();
        f64::from(min + max) / 2.0
    }
}

impl TryFrom<u8> for SpeedBand {
    type Error = String;

    fn try_from(band: u8) -> Result<Self, Self::Error> {
        Self::new(band).ok_or_else(|| format!("speed band {band} is outside 1..=8"))
    }
}

impl From<SpeedBand> for u8 {
    fn from(band: SpeedBand) -> Self {
        band.0
    }
}

impl std::fmt::Display for SpeedBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (min, max) = self.range();
        if self.0 == 8 {
            write!(f, "band {} ({min}+ km/h)", self.0)
        } else {
            write!(f, "band {} ({min}-{max} km/h)", self.0)
        }
    }
}

/// Average midpoint speed across `bands`, or `None` when empty.
#[must_use]
pub fn average_speed(bands: &[SpeedBand]) -> Option<f64> {
    if bands.is_empty() {
        return None;
    }
    let total: f64 = bands.iter().map(|b| b.midpoint()).sum();
    #[allow(clippy::cast_precision_loss)]
    Some(total / bands.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_bands() {
        for band in 1..=8 {
            assert!(SpeedBand::new(band).is_some());
        }
        assert!(SpeedBand::new(0).is_none());
        assert!(SpeedBand::new(9).is_none());
    }

    #[test]
    fn test_ranges() {
        assert_eq!(SpeedBand::new(1).unwrap().range(), (0, 9));
        assert_eq!(SpeedBand::new(4).unwrap().range(), (30, 39));
        assert_eq!(SpeedBand::new(8).unwrap().range(), (70, 100));
    }

    #[test]
    fn test_midpoints() {
        assert!((SpeedBand::new(1).unwrap().midpoint() - 4.5).abs() < f64::EPSILON);
        assert!((SpeedBand::new(5).unwrap().midpoint() - 44.5).abs() < f64::EPSILON);
        assert!((SpeedBand::new(8).unwrap().midpoint() - 85.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_display() {
        assert_eq!(SpeedBand::new(2).unwrap().to_string(), "band 2 (10-19 km/h)");
        assert_eq!(SpeedBand::new(8).unwrap().to_string(), "band 8 (70+ km/h)");
    }

    #[test]
    fn test_deserialize_rejects_out_of_range() {
        assert!(serde_json::from_str::<SpeedBand>("3").is_ok());
        assert!(serde_json::from_str::<SpeedBand>("0").is_err());
        assert!(serde_json::from_str::<SpeedBand>("12").is_err());
    }

    #[test]
    fn test_average_speed() {
        let bands = [SpeedBand::new(1).unwrap(), SpeedBand::new(8).unwrap()];
        assert!((average_speed(&bands).unwrap() - 44.75).abs() < f64::EPSILON);
        assert!(average_speed(&[]).is_none());
    }
}
