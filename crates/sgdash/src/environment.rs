//! Air quality, heat stress, UV exposure, forecasts and flood alerts.
//!
//! The feed types in [`crate::feed::types`] carry these readings as sent
//! upstream. This module classifies them into the published bands and
//! condenses each payload into what a reader wants to see.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::feed::types::{
    AreaForecast, DailyForecastData, FloodAlert, FloodAlertsResponse, GeneralForecast, PsiData,
    Region, TwoHourForecastResponse, UvData, WbgtData,
};
use crate::spatial::Coordinate;

/// Reading key of the 24-hour PSI.
pub const PSI_KEY: &str = "psi_twenty_four_hourly";

/// Pollutants reported alongside PSI, in display order.
pub const POLLUTANTS: [Pollutant; 7] = [
    Pollutant::new(PSI_KEY, "24H Mean PSI", ""),
    Pollutant::new("pm25_twenty_four_hourly", "24H Mean PM2.5", "µg/m³"),
    Pollutant::new("pm10_twenty_four_hourly", "24H Mean PM10", "µg/m³"),
    Pollutant::new("so2_twenty_four_hourly", "24H Mean Sulphur Dioxide", "µg/m³"),
    Pollutant::new("co_eight_hour_max", "8H Mean Carbon Monoxide", "mg/m³"),
    Pollutant::new("o3_eight_hour_max", "8H Mean Ozone", "µg/m³"),
    Pollutant::new("no2_one_hour_max", "1H Max Nitrogen Dioxide", "µg/m³"),
];

/// PSI reporting regions, in display order.
pub const PSI_REGIONS: [&str; 5] = ["north", "south", "east", "west", "central"];

/// A pollutant reading key with its label and unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pollutant {
    /// Reading key, e.g. `pm25_twenty_four_hourly`.
    pub key: &'static str,
    /// Display label.
    pub label: &'static str,
    /// Unit; empty for PSI, which is an index.
    pub unit: &'static str,
}

impl Pollutant {
    const fn new(key: &'static str, label: &'static str, unit: &'static str) -> Self {
        Self { key, label, unit }
    }

    /// The known pollutant with this reading key.
    #[must_use]
    pub fn by_key(key: &str) -> Option<Self> {
        POLLUTANTS.into_iter().find(|p| p.key == key)
    }
}

/// Classify `value` against inclusive upper bounds; anything above the last
/// bound gets `top`. Negative or NaN values have no class.
fn classify<T: Copy>(value: f64, bounds: &[(f64, T)], top: T, inclusive: bool) -> Option<T> {
    if value.is_nan() || value < 0.0 {
        return None;
    }
    let class = bounds
        .iter()
        .find(|(upper, _)| if inclusive { value <= *upper } else { value < *upper })
        .map_or(top, |(_, class)| *class);
    Some(class)
}

/// Pollutant Standards Index bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[allow(missing_docs)]
pub enum PsiBand {
    Good,
    Moderate,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
}

const PSI_UPPER: [(f64, PsiBand); 4] = [
    (50.0, PsiBand::Good),
    (100.0, PsiBand::Moderate),
    (200.0, PsiBand::Unhealthy),
    (300.0, PsiBand::VeryUnhealthy),
];

impl PsiBand {
    /// Band of a PSI value; bounds are inclusive, so 50 is still good.
    #[must_use]
    pub fn from_psi(value: f64) -> Option<Self> {
        classify(value, &PSI_UPPER, Self::Hazardous, true)
    }

    /// Published band name.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Good => "Good",
            Self::Moderate => "Moderate",
            Self::Unhealthy => "Unhealthy",
            Self::VeryUnhealthy => "Very Unhealthy",
            Self::Hazardous => "Hazardous",
        }
    }
}

impl fmt::Display for PsiBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Heat stress levels by wet-bulb globe temperature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[allow(missing_docs)]
pub enum HeatStress {
    Low,
    Moderate,
    High,
    VeryHigh,
    Extreme,
}

const WBGT_UPPER: [(f64, HeatStress); 4] = [
    (28.0, HeatStress::Low),
    (30.0, HeatStress::Moderate),
    (32.0, HeatStress::High),
    (34.0, HeatStress::VeryHigh),
];

impl HeatStress {
    /// Level of a WBGT in °C; each level starts at its lower bound, so
    /// 28.0 is already moderate.
    #[must_use]
    pub fn from_wbgt(value: f64) -> Option<Self> {
        classify(value, &WBGT_UPPER, Self::Extreme, false)
    }

    /// Display name.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Moderate => "Moderate",
            Self::High => "High",
            Self::VeryHigh => "Very High",
            Self::Extreme => "Extreme",
        }
    }
}

impl fmt::Display for HeatStress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// UV index exposure categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[allow(missing_docs)]
pub enum UvBand {
    Low,
    Moderate,
    High,
    VeryHigh,
    Extreme,
}

const UV_UPPER: [(f64, UvBand); 4] = [
    (3.0, UvBand::Low),
    (6.0, UvBand::Moderate),
    (8.0, UvBand::High),
    (11.0, UvBand::VeryHigh),
];

impl UvBand {
    /// Category of a UV index: 0-2 low, 3-5 moderate, 6-7 high, 8-10 very
    /// high, 11 and above extreme.
    #[must_use]
    pub fn from_index(value: f64) -> Option<Self> {
        classify(value, &UV_UPPER, Self::Extreme, false)
    }

    /// Display name.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Moderate => "Moderate",
            Self::High => "High",
            Self::VeryHigh => "Very High",
            Self::Extreme => "Extreme",
        }
    }
}

impl fmt::Display for UvBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One pollutant value in a region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PollutantValue {
    /// Which pollutant.
    pub pollutant: Pollutant,
    /// Reported value.
    pub value: f64,
}

/// PSI and pollutant readings of one region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionAirQuality {
    /// Region name.
    pub region: String,
    /// 24-hour PSI, when reported.
    pub psi: Option<f64>,
    /// Band of `psi`.
    pub band: Option<PsiBand>,
    /// Every known pollutant reported for the region, in display order.
    pub pollutants: Vec<PollutantValue>,
}

/// The latest PSI update, per region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PsiSummary {
    /// When the update was published.
    pub updated: Option<DateTime<FixedOffset>>,
    /// Regions in [`PSI_REGIONS`] order, then any others by name.
    pub regions: Vec<RegionAirQuality>,
}

impl PsiSummary {
    /// Summarise the latest item, or `None` when there is none.
    #[must_use]
    pub fn from_data(data: &PsiData) -> Option<Self> {
        let latest = data.items.first()?;

        let mut names: Vec<&str> = latest
            .readings
            .values()
            .flat_map(|by_region| by_region.keys().map(String::as_str))
            .collect();
        names.sort_by(|a, b| region_order(a, b));
        names.dedup();

        let regions = names
            .into_iter()
            .map(|region| {
                let value_of = |key: &str| {
                    latest
                        .readings
                        .get(key)
                        .and_then(|by_region| by_region.get(region))
                        .copied()
                };
                let psi = value_of(PSI_KEY);
                RegionAirQuality {
                    region: region.to_string(),
                    psi,
                    band: psi.and_then(PsiBand::from_psi),
                    pollutants: POLLUTANTS
                        .into_iter()
                        .filter_map(|pollutant| {
                            value_of(pollutant.key).map(|value| PollutantValue { pollutant, value })
                        })
                        .collect(),
                }
            })
            .collect();

        Some(Self {
            updated: latest.updated_timestamp,
            regions,
        })
    }

    /// The region with this name.
    #[must_use]
    pub fn region(&self, name: &str) -> Option<&RegionAirQuality> {
        self.regions.iter().find(|r| r.region.eq_ignore_ascii_case(name))
    }
}

fn region_order(a: &str, b: &str) -> Ordering {
    let rank = |r: &str| PSI_REGIONS.iter().position(|known| *known == r);
    match (rank(a), rank(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// A UV index value at one hour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UvReading {
    /// Start of the hour.
    pub hour: DateTime<FixedOffset>,
    /// Index value.
    pub value: f64,
    /// Category of `value`.
    pub band: Option<UvBand>,
}

/// Today's UV index so far.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UvSummary {
    /// Most recent hour.
    pub latest: UvReading,
    /// Highest hour so far; the earliest one on ties.
    pub peak: UvReading,
    /// Every hour in time order.
    pub hours: Vec<UvReading>,
}

impl UvSummary {
    /// Summarise the latest record, or `None` when it has no hours.
    #[must_use]
    pub fn from_data(data: &UvData) -> Option<Self> {
        let record = data.records.first()?;
        let mut hours: Vec<UvReading> = record
            .index
            .iter()
            .map(|h| UvReading {
                hour: h.hour,
                value: h.value,
                band: UvBand::from_index(h.value),
            })
            .collect();
        hours.sort_by_key(|h| h.hour);

        let latest = *hours.last()?;
        let peak = hours
            .iter()
            .copied()
            .reduce(|best, h| if h.value > best.value { h } else { best })?;
        Some(Self { latest, peak, hours })
    }
}

/// WBGT at one station with its heat stress level.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationHeat {
    /// Station name.
    pub name: String,
    /// WBGT in °C.
    pub wbgt: f64,
    /// Level computed from `wbgt`.
    pub level: Option<HeatStress>,
    /// Level as labelled upstream.
    pub upstream_level: String,
    /// Station position, when sent.
    pub location: Option<Coordinate>,
}

/// The latest WBGT record across stations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WbgtSummary {
    /// When the record was updated.
    pub updated: Option<DateTime<FixedOffset>>,
    /// Stations sorted by name, case-insensitively.
    pub stations: Vec<StationHeat>,
}

impl WbgtSummary {
    /// Summarise the latest record, or `None` when there is none.
    #[must_use]
    pub fn from_data(data: &WbgtData) -> Option<Self> {
        let record = data.records.first()?;
        let mut stations: Vec<StationHeat> = record
            .item
            .readings
            .iter()
            .map(|r| StationHeat {
                name: r.station.name.clone(),
                wbgt: r.wbgt,
                level: HeatStress::from_wbgt(r.wbgt),
                upstream_level: r.heat_stress.clone(),
                location: r.location.map(|l| Coordinate::new(l.latitude, l.longitude)),
            })
            .collect();
        stations.sort_by_key(|s| s.name.to_lowercase());

        Some(Self {
            updated: record.updated_timestamp,
            stations,
        })
    }

    /// The station with the highest WBGT.
    #[must_use]
    pub fn hottest(&self) -> Option<&StationHeat> {
        self.stations
            .iter()
            .max_by(|a, b| a.wbgt.total_cmp(&b.wbgt))
    }
}

/// The latest 2-hour forecast, per area.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TwoHourOutlook {
    /// When the forecast was issued.
    pub issued: DateTime<FixedOffset>,
    /// Covered period, when sent.
    pub valid_from: Option<DateTime<FixedOffset>>,
    /// End of the covered period, when sent.
    pub valid_to: Option<DateTime<FixedOffset>>,
    /// Forecasts sorted by area name.
    pub areas: Vec<AreaForecast>,
    #[serde(skip)]
    positions: Vec<Region>,
}

impl TwoHourOutlook {
    /// Condense the latest item, or `None` when there is none.
    #[must_use]
    pub fn from_response(response: &TwoHourForecastResponse) -> Option<Self> {
        let latest = response.items.first()?;
        let mut areas = latest.forecasts.clone();
        areas.sort_by(|a, b| a.area.cmp(&b.area));

        Some(Self {
            issued: latest.timestamp,
            valid_from: latest.valid_period.as_ref().map(|p| p.start),
            valid_to: latest.valid_period.as_ref().map(|p| p.end),
            areas,
            positions: response.area_metadata.clone(),
        })
    }

    /// The forecast for an area, matched case-insensitively.
    #[must_use]
    pub fn for_area(&self, name: &str) -> Option<&AreaForecast> {
        let name = name.trim();
        self.areas.iter().find(|a| a.area.eq_ignore_ascii_case(name))
    }

    /// The forecast of the area whose label is closest to `point`, with the
    /// distance in km.
    #[must_use]
    pub fn nearest(&self, point: Coordinate) -> Option<(&AreaForecast, f64)> {
        self.positions
            .iter()
            .filter_map(|region| {
                let forecast = self.for_area(&region.name)?;
                Some((forecast, point.distance_km(&region.label_location)))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }
}

/// The latest island-wide 24-hour outlook.
#[must_use]
pub fn daily_outlook(data: &DailyForecastData) -> Option<&GeneralForecast> {
    data.records.first().map(|r| &r.general)
}

impl FloodAlert {
    /// One-line description: `area (level) - message`, with missing parts
    /// left out. Blank alerts give `None`.
    #[must_use]
    pub fn summary(&self) -> Option<String> {
        match self {
            Self::Text(text) => {
                let text = text.trim();
                (!text.is_empty()).then(|| text.to_string())
            }
            Self::Detail(detail) => {
                let present = |s: &Option<String>| {
                    s.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
                };
                let area = present(&detail.area);
                let level = present(&detail.level);
                let message = present(&detail.message);
                if area.is_none() && level.is_none() && message.is_none() {
                    return None;
                }

                let mut line = area.unwrap_or_else(|| "Unknown Area".to_string());
                if let Some(level) = level {
                    line.push_str(&format!(" ({level})"));
                }
                if let Some(message) = message {
                    line.push_str(&format!(" - {message}"));
                }
                Some(line)
            }
        }
    }
}

/// Descriptions of the flood alerts in the latest item.
#[must_use]
pub fn active_flood_alerts(response: &FloodAlertsResponse) -> Vec<String> {
    response
        .items
        .first()
        .map(|item| item.alerts.iter().filter_map(FloodAlert::summary).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::types::FloodAlertDetail;

    fn psi() -> PsiData {
        serde_json::from_str(
            r#"{
                "regionMetadata": [
                    {"name": "west", "labelLocation": {"latitude": 1.35735, "longitude": 103.7}},
                    {"name": "east", "labelLocation": {"latitude": 1.35735, "longitude": 103.94}}
                ],
                "items": [
                    {
                        "date": "2024-07-16",
                        "updatedTimestamp": "2024-07-16T14:01:01+08:00",
                        "readings": {
                            "psi_twenty_four_hourly": {"west": 51, "east": 47, "central": 50, "north": 101, "south": 49},
                            "pm25_twenty_four_hourly": {"west": 15, "east": 12, "central": 14, "north": 16, "south": 13},
                            "co_eight_hour_max": {"west": 0.4, "east": 0.5},
                            "o3_sub_index": {"west": 9}
                        }
                    },
                    {
                        "updatedTimestamp": "2024-07-16T13:01:01+08:00",
                        "readings": {"psi_twenty_four_hourly": {"west": 400}}
                    }
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_psi_band_boundaries() {
        assert_eq!(PsiBand::from_psi(0.0), Some(PsiBand::Good));
        assert_eq!(PsiBand::from_psi(50.0), Some(PsiBand::Good));
        assert_eq!(PsiBand::from_psi(51.0), Some(PsiBand::Moderate));
        assert_eq!(PsiBand::from_psi(100.0), Some(PsiBand::Moderate));
        assert_eq!(PsiBand::from_psi(101.0), Some(PsiBand::Unhealthy));
        assert_eq!(PsiBand::from_psi(200.0), Some(PsiBand::Unhealthy));
        assert_eq!(PsiBand::from_psi(201.0), Some(PsiBand::VeryUnhealthy));
        assert_eq!(PsiBand::from_psi(300.0), Some(PsiBand::VeryUnhealthy));
        assert_eq!(PsiBand::from_psi(301.0), Some(PsiBand::Hazardous));
        assert_eq!(PsiBand::from_psi(1200.0), Some(PsiBand::Hazardous));
    }

    #[test]
    fn test_psi_band_fractional_values_fall_into_next_band() {
        assert_eq!(PsiBand::from_psi(50.5), Some(PsiBand::Moderate));
        assert_eq!(PsiBand::from_psi(300.2), Some(PsiBand::Hazardous));
    }

    #[test]
    fn test_bands_reject_invalid() {
        assert_eq!(PsiBand::from_psi(-1.0), None);
        assert_eq!(PsiBand::from_psi(f64::NAN), None);
        assert_eq!(HeatStress::from_wbgt(f64::NAN), None);
        assert_eq!(UvBand::from_index(-0.5), None);
    }

    #[test]
    fn test_heat_stress_boundaries() {
        assert_eq!(HeatStress::from_wbgt(25.0), Some(HeatStress::Low));
        assert_eq!(HeatStress::from_wbgt(27.9), Some(HeatStress::Low));
        assert_eq!(HeatStress::from_wbgt(28.0), Some(HeatStress::Moderate));
        assert_eq!(HeatStress::from_wbgt(30.0), Some(HeatStress::High));
        assert_eq!(HeatStress::from_wbgt(31.99), Some(HeatStress::High));
        assert_eq!(HeatStress::from_wbgt(32.0), Some(HeatStress::VeryHigh));
        assert_eq!(HeatStress::from_wbgt(34.0), Some(HeatStress::Extreme));
        assert_eq!(HeatStress::from_wbgt(40.0), Some(HeatStress::Extreme));
    }

    #[test]
    fn test_uv_band_boundaries() {
        assert_eq!(UvBand::from_index(0.0), Some(UvBand::Low));
        assert_eq!(UvBand::from_index(2.0), Some(UvBand::Low));
        assert_eq!(UvBand::from_index(3.0), Some(UvBand::Moderate));
        assert_eq!(UvBand::from_index(7.0), Some(UvBand::High));
        assert_eq!(UvBand::from_index(8.0), Some(UvBand::VeryHigh));
        assert_eq!(UvBand::from_index(11.0), Some(UvBand::Extreme));
    }

    #[test]
    fn test_band_labels() {
        assert_eq!(PsiBand::VeryUnhealthy.to_string(), "Very Unhealthy");
        assert_eq!(HeatStress::VeryHigh.to_string(), "Very High");
        assert_eq!(UvBand::Extreme.to_string(), "Extreme");
    }

    #[test]
    fn test_psi_summary_orders_regions_and_classifies() {
        let summary = PsiSummary::from_data(&psi()).unwrap();

        let names: Vec<_> = summary.regions.iter().map(|r| r.region.as_str()).collect();
        assert_eq!(names, ["north", "south", "east", "west", "central"]);
        assert_eq!(
            summary.updated.unwrap().to_rfc3339(),
            "2024-07-16T14:01:01+08:00"
        );

        let north = summary.region("North").unwrap();
        assert_eq!(north.psi, Some(101.0));
        assert_eq!(north.band, Some(PsiBand::Unhealthy));
        assert_eq!(summary.region("central").unwrap().band, Some(PsiBand::Good));
        assert_eq!(summary.region("west").unwrap().band, Some(PsiBand::Moderate));
    }

    #[test]
    fn test_psi_summary_keeps_known_pollutants_in_order() {
        let summary = PsiSummary::from_data(&psi()).unwrap();
        let west = summary.region("west").unwrap();
        let keys: Vec<_> = west.pollutants.iter().map(|p| p.pollutant.key).collect();
        assert_eq!(
            keys,
            [PSI_KEY, "pm25_twenty_four_hourly", "co_eight_hour_max"]
        );
        assert_eq!(west.pollutants[2].pollutant.unit, "mg/m³");
    }

    #[test]
    fn test_psi_summary_without_items() {
        let data: PsiData = serde_json::from_str(r#"{"regionMetadata": [], "items": []}"#).unwrap();
        assert!(PsiSummary::from_data(&data).is_none());
    }

    #[test]
    fn test_pollutant_lookup() {
        assert_eq!(Pollutant::by_key("o3_eight_hour_max").unwrap().unit, "µg/m³");
        assert!(Pollutant::by_key("o3_sub_index").is_none());
    }

    #[test]
    fn test_uv_summary_latest_and_peak() {
        let data: UvData = serde_json::from_str(
            r#"{"records": [{
                "date": "2024-07-16",
                "updatedTimestamp": "2024-07-16T15:00:00+08:00",
                "index": [
                    {"hour": "2024-07-16T15:00:00+08:00", "value": 6},
                    {"hour": "2024-07-16T13:00:00+08:00", "value": 9},
                    {"hour": "2024-07-16T14:00:00+08:00", "value": 9},
                    {"hour": "2024-07-16T07:00:00+08:00", "value": 0}
                ]
            }]}"#,
        )
        .unwrap();

        let summary = UvSummary::from_data(&data).unwrap();
        assert_eq!(summary.hours.len(), 4);
        assert!((summary.latest.value - 6.0).abs() < f64::EPSILON);
        assert_eq!(summary.latest.band, Some(UvBand::High));
        assert_eq!(summary.peak.hour.to_rfc3339(), "2024-07-16T13:00:00+08:00");
        assert_eq!(summary.peak.band, Some(UvBand::VeryHigh));
    }

    #[test]
    fn test_uv_summary_without_hours() {
        let data: UvData = serde_json::from_str(r#"{"records": [{"index": []}]}"#).unwrap();
        assert!(UvSummary::from_data(&data).is_none());
    }

    #[test]
    fn test_wbgt_summary() {
        let data: WbgtData = serde_json::from_str(
            r#"{"records": [{
                "updatedTimestamp": "2024-07-16T14:15:00+08:00",
                "item": {"readings": [
                    {"station": {"id": "S128", "name": "Bishan Street"},
                     "location": {"latitude": "1.354825", "longtitude": "103.852219"},
                     "wbgt": "31.2", "heatStress": "Moderate"},
                    {"station": {"id": "S104", "name": "admiralty"},
                     "location": {"latitude": "1.44387", "longitude": "103.78538"},
                     "wbgt": "27.5", "heatStress": "Low"}
                ]}
            }]}"#,
        )
        .unwrap();

        let summary = WbgtSummary::from_data(&data).unwrap();
        let names: Vec<_> = summary.stations.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["admiralty", "Bishan Street"]);
        assert_eq!(summary.stations[0].level, Some(HeatStress::Low));
        assert_eq!(summary.stations[1].level, Some(HeatStress::High));
        assert_eq!(summary.stations[1].upstream_level, "Moderate");

        let bishan = summary.stations[1].location.unwrap();
        assert!((bishan.longitude - 103.852_219).abs() < 1e-9);
        assert_eq!(summary.hottest().unwrap().name, "Bishan Street");
    }

    fn two_hour() -> TwoHourForecastResponse {
        serde_json::from_str(
            r#"{
                "area_metadata": [
                    {"name": "Ang Mo Kio", "label_location": {"latitude": 1.375, "longitude": 103.839}},
                    {"name": "Bedok", "label_location": {"latitude": 1.321, "longitude": 103.924}},
                    {"name": "Clementi", "label_location": {"latitude": 1.315, "longitude": 103.76}}
                ],
                "items": [{
                    "update_timestamp": "2024-07-16T14:08:52+08:00",
                    "timestamp": "2024-07-16T14:00:00+08:00",
                    "valid_period": {"start": "2024-07-16T14:00:00+08:00", "end": "2024-07-16T16:00:00+08:00"},
                    "forecasts": [
                        {"area": "Bedok", "forecast": "Partly Cloudy (Day)"},
                        {"area": "Ang Mo Kio", "forecast": "Thundery Showers"},
                        {"area": "Clementi", "forecast": "Light Rain"}
                    ]
                }],
                "api_info": {"status": "healthy"}
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_two_hour_outlook_sorted_with_period() {
        let outlook = TwoHourOutlook::from_response(&two_hour()).unwrap();
        let areas: Vec<_> = outlook.areas.iter().map(|a| a.area.as_str()).collect();
        assert_eq!(areas, ["Ang Mo Kio", "Bedok", "Clementi"]);
        assert_eq!(
            outlook.valid_to.unwrap().to_rfc3339(),
            "2024-07-16T16:00:00+08:00"
        );
    }

    #[test]
    fn test_two_hour_outlook_area_lookup() {
        let outlook = TwoHourOutlook::from_response(&two_hour()).unwrap();
        assert_eq!(
            outlook.for_area(" bedok ").unwrap().forecast,
            "Partly Cloudy (Day)"
        );
        assert!(outlook.for_area("Tuas").is_none());
    }

    #[test]
    fn test_two_hour_outlook_nearest_area() {
        let outlook = TwoHourOutlook::from_response(&two_hour()).unwrap();
        // Clementi MRT.
        let (forecast, km) = outlook.nearest(Coordinate::new(1.3151, 103.7652)).unwrap();
        assert_eq!(forecast.area, "Clementi");
        assert!(km < 1.0);
    }

    #[test]
    fn test_two_hour_outlook_without_items() {
        let resp: TwoHourForecastResponse = serde_json::from_str(r#"{"items": []}"#).unwrap();
        assert!(TwoHourOutlook::from_response(&resp).is_none());
    }

    #[test]
    fn test_daily_outlook() {
        let data: DailyForecastData = serde_json::from_str(
            r#"{"records": [{
                "date": "2024-07-16",
                "updatedTimestamp": "2024-07-16T11:47:42+08:00",
                "general": {
                    "temperature": {"low": 25, "high": 34, "unit": "Degrees Celsius"},
                    "relativeHumidity": {"low": 55, "high": 95, "unit": "Percentage"},
                    "forecast": {"code": "TL", "text": "Thundery Showers"},
                    "validPeriod": {"start": "2024-07-16T12:00:00+08:00", "end": "2024-07-17T12:00:00+08:00", "text": "12 PM 16 Jul to 12 PM 17 Jul"},
                    "wind": {"speed": {"low": 10, "high": 20}, "direction": "SSE"}
                }
            }]}"#,
        )
        .unwrap();

        let general = daily_outlook(&data).unwrap();
        assert_eq!(general.forecast.text, "Thundery Showers");
        assert!((general.temperature.high - 34.0).abs() < f64::EPSILON);
        assert!((general.relative_humidity.low - 55.0).abs() < f64::EPSILON);
        assert_eq!(general.wind.direction, "SSE");
    }

    #[test]
    fn test_flood_alert_summary_forms() {
        let full = FloodAlert::Detail(FloodAlertDetail {
            area: Some("Jalan Boon Lay".to_string()),
            level: Some("High".to_string()),
            message: Some("Avoid the area".to_string()),
        });
        assert_eq!(
            full.summary().as_deref(),
            Some("Jalan Boon Lay (High) - Avoid the area")
        );

        let no_area = FloodAlert::Detail(FloodAlertDetail {
            message: Some("Flash floods".to_string()),
            ..FloodAlertDetail::default()
        });
        assert_eq!(no_area.summary().as_deref(), Some("Unknown Area - Flash floods"));

        assert!(FloodAlert::Detail(FloodAlertDetail::default()).summary().is_none());
        assert!(FloodAlert::Text("  ".to_string()).summary().is_none());
    }

    #[test]
    fn test_active_flood_alerts_accepts_alternate_shapes() {
        let resp: FloodAlertsResponse = serde_json::from_str(
            r#"{"items": [{"flood_alerts": [
                "Bukit Timah Road flooded",
                {"location": "Orchard Road", "severity": "Moderate", "description": "Water level 75%"}
            ]}]}"#,
        )
        .unwrap();

        assert_eq!(
            active_flood_alerts(&resp),
            vec![
                "Bukit Timah Road flooded".to_string(),
                "Orchard Road (Moderate) - Water level 75%".to_string(),
            ]
        );
    }

    #[test]
    fn test_no_flood_alerts() {
        let resp: FloodAlertsResponse = serde_json::from_str(r#"{"items": [{"alerts": []}]}"#).unwrap();
        assert!(active_flood_alerts(&resp).is_empty());
        let resp: FloodAlertsResponse = serde_json::from_str(r#"{"items": []}"#).unwrap();
        assert!(active_flood_alerts(&resp).is_empty());
    }
}
