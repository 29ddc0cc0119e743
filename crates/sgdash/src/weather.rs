//! Realtime weather readings and wind classification.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::feed::types::RealtimeData;

/// Realtime endpoints with a station/reading layout sgdash understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RealtimeEndpoint {
    /// Air temperature in degrees Celsius.
    AirTemperature,
    /// Rainfall in millimetres.
    Rainfall,
    /// Relative humidity in percent.
    RelativeHumidity,
    /// Wind speed, reported in knots.
    WindSpeed,
}

impl RealtimeEndpoint {
    /// Every supported endpoint.
    pub const ALL: [RealtimeEndpoint; 4] = [
        Self::AirTemperature,
        Self::Rainfall,
        Self::RelativeHumidity,
        Self::WindSpeed,
    ];

    /// URL path segment under the realtime API base.
    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::AirTemperature => "air-temperature",
            Self::Rainfall => "rainfall",
            Self::RelativeHumidity => "relative-humidity",
            Self::WindSpeed => "wind-speed",
        }
    }
}

impl FromStr for RealtimeEndpoint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|e| e.path() == s)
            .ok_or_else(|| Error::UnsupportedEndpoint(s.to_string()))
    }
}

impl fmt::Display for RealtimeEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// One station's value in a [`ReadingSummary`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationValue {
    /// Station name, or its ID when the station list omits it.
    pub name: String,
    /// Raw value as sent upstream.
    pub value: serde_json::Value,
}

/// The latest reading set of a realtime endpoint, condensed for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadingSummary {
    /// Display unit, e.g. `°C`, `mm` or `%`.
    pub unit: String,
    /// When the readings were taken.
    pub timestamp: Option<DateTime<FixedOffset>>,
    /// Mean of the numeric values, `None` when there are none.
    pub average: Option<f64>,
    /// Per-station values sorted by name, case-insensitively.
    pub stations: Vec<StationValue>,
}

impl ReadingSummary {
    /// Summarise the first (latest) reading set in `data`.
    #[must_use]
    pub fn from_data(data: &RealtimeData) -> Self {
        let unit = normalize_unit(&data.reading_unit);
        let Some(latest) = data.readings.first() else {
            return Self {
                unit,
                timestamp: None,
                average: None,
                stations: Vec::new(),
            };
        };

        let names: HashMap<&str, &str> = data
            .stations
            .iter()
            .map(|s| (s.id.as_str(), s.name.as_str()))
            .collect();

        let values: Vec<f64> = latest.data.iter().filter_map(|r| numeric(&r.value)).collect();
        #[allow(clippy::cast_precision_loss)]
        let average =
            (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64);

        let mut stations: Vec<StationValue> = latest
            .data
            .iter()
            .map(|r| StationValue {
                name: names
                    .get(r.station_id.as_str())
                    .map_or_else(|| r.station_id.clone(), |n| (*n).to_string()),
                value: r.value.clone(),
            })
            .collect();
        stations.sort_by_key(|s| s.name.to_lowercase());

        Self {
            unit,
            timestamp: Some(latest.timestamp),
            average,
            stations,
        }
    }

    /// Format a value with this summary's unit; Celsius hugs the number.
    #[must_use]
    pub fn format_value(&self, value: f64) -> String {
        if self.unit == "°C" {
            format!("{value:.1}{}", self.unit)
        } else {
            format!("{value:.1} {}", self.unit)
        }
    }
}

fn numeric(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Map upstream unit labels to display form.
#[must_use]
pub fn normalize_unit(unit: &str) -> String {
    match unit.to_lowercase().as_str() {
        "percentage" => "%".to_string(),
        "deg code" | "deg c" | "degc" => "°C".to_string(),
        _ => unit.to_string(),
    }
}

/// Convert knots to km/h, rounded to one decimal place.
#[must_use]
pub fn knots_to_kmh(knots: f64) -> f64 {
    (knots * 1.852 * 10.0).round() / 10.0
}

/// Beaufort wind force classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[allow(missing_docs)]
#[repr(u8)]
pub enum Beaufort {
    Calm = 0,
    LightAir,
    LightBreeze,
    GentleBreeze,
    ModerateBreeze,
    FreshBreeze,
    StrongBreeze,
    NearGale,
    Gale,
    StrongGale,
    Storm,
    ViolentStorm,
    Hurricane,
}

/// Lower bound in km/h of each class, in force order.
const BEAUFORT_LOWER_KMH: [(f64, Beaufort); 13] = [
    (0.0, Beaufort::Calm),
    (1.0, Beaufort::LightAir),
    (6.0, Beaufort::LightBreeze),
    (12.0, Beaufort::GentleBreeze),
    (20.0, Beaufort::ModerateBreeze),
    (29.0, Beaufort::FreshBreeze),
    (39.0, Beaufort::StrongBreeze),
    (50.0, Beaufort::NearGale),
    (62.0, Beaufort::Gale),
    (75.0, Beaufort::StrongGale),
    (89.0, Beaufort::Storm),
    (103.0, Beaufort::ViolentStorm),
    (118.0, Beaufort::Hurricane),
];

impl Beaufort {
    /// Classify a wind speed in km/h. Negative or NaN speeds have no class.
    #[must_use]
    pub fn from_kmh(speed: f64) -> Option<Self> {
        if speed.is_nan() || speed < 0.0 {
            return None;
        }
        BEAUFORT_LOWER_KMH
            .iter()
            .rev()
            .find(|(lower, _)| speed >= *lower)
            .map(|(_, class)| *class)
    }

    /// Force number, 0 to 12.
    #[must_use]
    pub fn force(self) -> u8 {
        self as u8
    }

    /// Conventional English name.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::Calm => "Calm",
            Self::LightAir => "Light Air",
            Self::LightBreeze => "Light Breeze",
            Self::GentleBreeze => "Gentle Breeze",
            Self::ModerateBreeze => "Moderate Breeze",
            Self::FreshBreeze => "Fresh Breeze",
            Self::StrongBreeze => "Strong Breeze",
            Self::NearGale => "Near Gale",
            Self::Gale => "Gale",
            Self::StrongGale => "Strong Gale",
            Self::Storm => "Storm",
            Self::ViolentStorm => "Violent Storm",
            Self::Hurricane => "Hurricane",
        }
    }
}

impl fmt::Display for Beaufort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}
