//! Response bodies of the upstream APIs.
//!
//! Only the fields sgdash reads are modelled; serde ignores the rest.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, Serialize};

use crate::spatial::Coordinate;
use crate::traffic::SpeedBand;

// === Data.gov.sg v1: traffic images ===

/// `GET {data_gov}/transport/traffic-images`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TrafficImagesResponse {
    /// Usually a single item holding every camera.
    #[serde(default)]
    pub items: Vec<TrafficImagesItem>,
}

/// One timestamped set of camera images.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TrafficImagesItem {
    /// When the set was assembled.
    pub timestamp: DateTime<FixedOffset>,
    /// Cameras in the set.
    #[serde(default)]
    pub cameras: Vec<CameraFeed>,
}

/// One camera's latest image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraFeed {
    /// When the image was taken (Singapore time).
    pub timestamp: DateTime<FixedOffset>,
    /// Image URL.
    pub image: String,
    /// Camera position as reported by the feed.
    pub location: Coordinate,
    /// Camera ID as a string of digits.
    pub camera_id: String,
    /// Image properties.
    pub image_metadata: ImageMetadata,
}

/// Image properties reported alongside a camera feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageMetadata {
    /// Height in pixels.
    pub height: u32,
    /// Width in pixels.
    pub width: u32,
    /// MD5 digest of the image, used upstream as a change marker.
    pub md5: String,
}

impl CameraFeed {
    /// The camera ID as a number, when it is one.
    #[must_use]
    pub fn numeric_id(&self) -> Option<u32> {
        self.camera_id.parse().ok()
    }
}

impl TrafficImagesResponse {
    /// All cameras across items.
    pub fn cameras(&self) -> impl Iterator<Item = &CameraFeed> {
        self.items.iter().flat_map(|item| item.cameras.iter())
    }
}

// === Data.gov.sg v1: taxi availability ===

/// `GET {data_gov}/transport/taxi-availability` (GeoJSON).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TaxiAvailability {
    /// Features; the first one carries all positions.
    #[serde(default)]
    pub features: Vec<TaxiFeature>,
}

/// A GeoJSON feature holding taxi positions.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TaxiFeature {
    /// Positions as a multipoint.
    pub geometry: TaxiGeometry,
    /// Timestamp and count.
    pub properties: TaxiProperties,
}

/// GeoJSON multipoint geometry, `[lon, lat]` pairs.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TaxiGeometry {
    /// Raw `[lon, lat]` pairs.
    #[serde(default)]
    pub coordinates: Vec<Vec<f64>>,
}

/// Properties of a taxi feature.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TaxiProperties {
    /// When the positions were sampled.
    pub timestamp: DateTime<FixedOffset>,
    /// Number of taxis reported.
    pub taxi_count: u32,
}

impl TaxiAvailability {
    /// Taxi positions from the first feature, swapped into lat/lon order.
    ///
    /// Malformed pairs are skipped.
    #[must_use]
    pub fn positions(&self) -> Vec<Coordinate> {
        self.features
            .first()
            .map(|f| {
                f.geometry
                    .coordinates
                    .iter()
                    .filter(|pair| pair.len() >= 2)
                    .map(|pair| Coordinate::new(pair[1], pair[0]))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Reported taxi count and timestamp, when any feature exists.
    #[must_use]
    pub fn summary(&self) -> Option<&TaxiProperties> {
        self.features.first().map(|f| &f.properties)
    }
}

// === Data.gov.sg v1: carpark availability ===

/// `GET {data_gov}/transport/carpark-availability`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CarparkAvailabilityResponse {
    /// Usually a single item.
    #[serde(default)]
    pub items: Vec<CarparkAvailabilityItem>,
}

/// One timestamped set of carpark lot counts.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CarparkAvailabilityItem {
    /// Per-carpark data.
    #[serde(default)]
    pub carpark_data: Vec<CarparkAvailability>,
}

/// Lot availability for one carpark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarparkAvailability {
    /// HDB carpark number, e.g. `HE12`.
    pub carpark_number: String,
    /// Local time of the last update, without offset.
    #[serde(default)]
    pub update_datetime: String,
    /// Counts per lot type.
    #[serde(default)]
    pub carpark_info: Vec<LotInfo>,
}

/// Lot counts for one lot type. Upstream sends numbers as strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotInfo {
    /// Lot type: `C` car, `Y` motorcycle, `H` heavy vehicle.
    pub lot_type: String,
    /// Total lots as sent.
    pub total_lots: String,
    /// Available lots as sent.
    pub lots_available: String,
}

impl LotInfo {
    /// Total lots, 0 when unparseable.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.total_lots.trim().parse().unwrap_or(0)
    }

    /// Available lots, 0 when unparseable.
    #[must_use]
    pub fn available(&self) -> u32 {
        self.lots_available.trim().parse().unwrap_or(0)
    }
}

impl CarparkAvailabilityResponse {
    /// All carparks across items.
    pub fn carparks(&self) -> impl Iterator<Item = &CarparkAvailability> {
        self.items.iter().flat_map(|item| item.carpark_data.iter())
    }
}

// === Data.gov.sg v2: realtime weather ===

/// `GET {realtime}/{endpoint}` envelope, shared by every v2 endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeResponse<T = RealtimeData> {
    /// 0 on success.
    pub code: i64,
    /// Present on success.
    #[serde(default = "Option::default")]
    pub data: Option<T>,
    /// Present on failure.
    #[serde(default)]
    pub error_msg: Option<String>,
}

/// Stations and readings of a realtime endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeData {
    /// Weather stations.
    #[serde(default)]
    pub stations: Vec<Station>,
    /// Reading sets, latest first.
    #[serde(default)]
    pub readings: Vec<ReadingSet>,
    /// Unit of the values, e.g. `deg C` or `mm`.
    #[serde(default)]
    pub reading_unit: String,
}

/// A weather station.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Station {
    /// Station ID, e.g. `S109`.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Station position.
    pub location: Coordinate,
}

/// Readings taken at one timestamp.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReadingSet {
    /// When the readings were taken.
    pub timestamp: DateTime<FixedOffset>,
    /// One value per station.
    #[serde(default)]
    pub data: Vec<StationReading>,
}

/// A single station's value.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationReading {
    /// Station ID.
    pub station_id: String,
    /// Raw value; numeric for the supported endpoints but not guaranteed.
    pub value: serde_json::Value,
}

// === Data.gov.sg v2: air quality and exposure indices ===

/// `GET {realtime}/psi` payload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PsiData {
    /// The five reporting regions and where to label them.
    #[serde(default)]
    pub region_metadata: Vec<Region>,
    /// Hourly updates, latest first.
    #[serde(default)]
    pub items: Vec<PsiItem>,
}

/// A named region with a label position.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Region {
    /// `north`, `south`, `east`, `west` or `central` for PSI; a town for
    /// forecasts.
    pub name: String,
    /// Where the region's label goes on a map.
    #[serde(alias = "labelLocation")]
    pub label_location: Coordinate,
}

/// One hourly PSI update.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PsiItem {
    /// When the readings were published.
    #[serde(default)]
    pub updated_timestamp: Option<DateTime<FixedOffset>>,
    /// Pollutant key, e.g. `psi_twenty_four_hourly`, to region to value.
    #[serde(default)]
    pub readings: BTreeMap<String, BTreeMap<String, f64>>,
}

/// `GET {realtime}/uv` payload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UvData {
    /// Daily records, latest first.
    #[serde(default)]
    pub records: Vec<UvRecord>,
}

/// Today's hourly UV index values.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UvRecord {
    /// When the record was last updated.
    #[serde(default)]
    pub updated_timestamp: Option<DateTime<FixedOffset>>,
    /// One value per hour so far.
    #[serde(default)]
    pub index: Vec<UvHour>,
}

/// The UV index for one hour.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UvHour {
    /// Start of the hour.
    pub hour: DateTime<FixedOffset>,
    /// Index value.
    #[serde(deserialize_with = "f64_or_string")]
    pub value: f64,
}

/// `GET {realtime}/weather?api=wbgt` payload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WbgtData {
    /// Records, latest first.
    #[serde(default)]
    pub records: Vec<WbgtRecord>,
}

/// One WBGT update across all stations.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WbgtRecord {
    /// When the record was last updated.
    #[serde(default)]
    pub updated_timestamp: Option<DateTime<FixedOffset>>,
    /// The station readings.
    pub item: WbgtItem,
}

/// Station readings of a [`WbgtRecord`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WbgtItem {
    /// One reading per station.
    #[serde(default)]
    pub readings: Vec<WbgtReading>,
}

/// Wet-bulb globe temperature at one station.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WbgtReading {
    /// The reporting station.
    pub station: WbgtStation,
    /// Station position, when sent.
    #[serde(default)]
    pub location: Option<WbgtLocation>,
    /// WBGT in degrees Celsius, sent as a string.
    #[serde(deserialize_with = "f64_or_string")]
    pub wbgt: f64,
    /// Upstream heat stress label, e.g. `Low`.
    #[serde(default)]
    pub heat_stress: String,
}

/// A WBGT station.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WbgtStation {
    /// Station ID.
    #[serde(default)]
    pub id: String,
    /// Station name.
    pub name: String,
}

/// WBGT station position. Upstream spells the longitude key `longtitude`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct WbgtLocation {
    /// Latitude, sent as a string.
    #[serde(deserialize_with = "f64_or_string")]
    pub latitude: f64,
    /// Longitude, sent as a string.
    #[serde(alias = "longtitude", deserialize_with = "f64_or_string")]
    pub longitude: f64,
}

// === Data.gov.sg: forecasts ===

/// `GET {data_gov}/environment/2-hour-weather-forecast`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TwoHourForecastResponse {
    /// Forecast areas and their label positions.
    #[serde(default)]
    pub area_metadata: Vec<Region>,
    /// Forecast updates, latest first.
    #[serde(default)]
    pub items: Vec<TwoHourForecastItem>,
}

/// One 2-hour forecast update.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TwoHourForecastItem {
    /// When the forecast was issued.
    pub timestamp: DateTime<FixedOffset>,
    /// Period the forecast covers.
    #[serde(default)]
    pub valid_period: Option<ValidPeriod>,
    /// One forecast per area.
    #[serde(default)]
    pub forecasts: Vec<AreaForecast>,
}

/// Start and end of a forecast period.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ValidPeriod {
    /// Period start.
    pub start: DateTime<FixedOffset>,
    /// Period end.
    pub end: DateTime<FixedOffset>,
}

/// The forecast for one area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaForecast {
    /// Area name, e.g. `Ang Mo Kio`.
    pub area: String,
    /// Condition, e.g. `Partly Cloudy (Day)`.
    pub forecast: String,
}

/// `GET {realtime}/twenty-four-hr-forecast` payload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DailyForecastData {
    /// Records, latest first.
    #[serde(default)]
    pub records: Vec<DailyForecastRecord>,
}

/// One 24-hour forecast.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyForecastRecord {
    /// When the forecast was last updated.
    #[serde(default)]
    pub updated_timestamp: Option<DateTime<FixedOffset>>,
    /// Island-wide outlook.
    pub general: GeneralForecast,
}

/// Island-wide 24-hour outlook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneralForecast {
    /// Temperature range in degrees Celsius.
    pub temperature: ForecastRange,
    /// Relative humidity range in percent.
    pub relative_humidity: ForecastRange,
    /// Condition summary.
    pub forecast: ForecastText,
    /// Wind speed and direction.
    pub wind: ForecastWind,
}

/// A low-high range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastRange {
    /// Lower bound.
    #[serde(deserialize_with = "f64_or_string")]
    pub low: f64,
    /// Upper bound.
    #[serde(deserialize_with = "f64_or_string")]
    pub high: f64,
}

/// A forecast condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastText {
    /// Short code, e.g. `TL`.
    #[serde(default)]
    pub code: String,
    /// Description, e.g. `Thundery Showers`.
    pub text: String,
}

/// Forecast wind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastWind {
    /// Speed range in km/h.
    pub speed: ForecastRange,
    /// Compass direction, e.g. `SSE`.
    #[serde(default)]
    pub direction: String,
}

// === Data.gov.sg v1: flood alerts ===

/// `GET {data_gov}/environment/flood-alerts`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FloodAlertsResponse {
    /// Alert sets, latest first.
    #[serde(default)]
    pub items: Vec<FloodAlertItem>,
}

/// The alerts in force at one time.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FloodAlertItem {
    /// Active alerts; empty when there is no flooding.
    #[serde(default, alias = "flood_alerts", alias = "data")]
    pub alerts: Vec<FloodAlert>,
}

/// A flood alert, sent either as plain text or as an object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FloodAlert {
    /// Free-text alert.
    Text(String),
    /// Structured alert.
    Detail(FloodAlertDetail),
}

/// Fields of a structured flood alert.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FloodAlertDetail {
    /// Affected area.
    #[serde(default, alias = "location", alias = "name")]
    pub area: Option<String>,
    /// Severity.
    #[serde(default, alias = "severity")]
    pub level: Option<String>,
    /// Alert text.
    #[serde(default, alias = "description")]
    pub message: Option<String>,
}

// === Data.gov.sg: initiate-download datasets ===

/// `GET {datasets}/{id}/initiate-download`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiateDownloadResponse {
    /// 0 on success.
    pub code: i64,
    /// Holds the signed download URL on success.
    #[serde(default)]
    pub data: Option<InitiateDownloadData>,
    /// Reason for failure.
    #[serde(default)]
    pub error_msg: Option<String>,
}

/// Payload of a successful initiate-download call.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InitiateDownloadData {
    /// Signed URL of the dataset file.
    #[serde(default)]
    pub url: Option<String>,
}

// === LTA DataMall ===

/// The OData envelope DataMall wraps every list in.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DataMallPage<T> {
    /// Up to 500 records.
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
}

/// `GET {datamall}/BusStops`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BusStop {
    /// Five-digit stop code.
    pub bus_stop_code: String,
    /// Road the stop is on.
    pub road_name: String,
    /// Landmark description.
    pub description: String,
    /// Latitude.
    pub latitude: f64,
    /// Longitude.
    pub longitude: f64,
}

impl BusStop {
    /// Stop position.
    #[must_use]
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// `GET {datamall}/v4/TrafficSpeedBands`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeedBandRecord {
    /// Road link ID.
    #[serde(rename = "LinkID", deserialize_with = "string_or_number")]
    pub link_id: String,
    /// Road name.
    #[serde(rename = "RoadName")]
    pub road_name: String,
    /// Road category code.
    #[serde(rename = "RoadCategory", deserialize_with = "string_or_number")]
    pub road_category: String,
    /// Current band.
    #[serde(rename = "SpeedBand")]
    pub speed_band: SpeedBand,
    /// Link start latitude.
    #[serde(rename = "StartLat", deserialize_with = "f64_or_string")]
    pub start_lat: f64,
    /// Link start longitude.
    #[serde(rename = "StartLon", deserialize_with = "f64_or_string")]
    pub start_lon: f64,
    /// Link end latitude.
    #[serde(rename = "EndLat", deserialize_with = "f64_or_string")]
    pub end_lat: f64,
    /// Link end longitude.
    #[serde(rename = "EndLon", deserialize_with = "f64_or_string")]
    pub end_lon: f64,
}

impl SpeedBandRecord {
    /// Midpoint of the road link.
    #[must_use]
    pub fn midpoint(&self) -> Coordinate {
        Coordinate::new(
            (self.start_lat + self.end_lat) / 2.0,
            (self.start_lon + self.end_lon) / 2.0,
        )
    }
}

// === OneMap ===

/// `POST {onemap}/api/auth/post/getToken`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OneMapToken {
    /// Bearer token.
    pub access_token: String,
    /// Unix seconds at which the token expires.
    #[serde(deserialize_with = "i64_or_string")]
    pub expiry_timestamp: i64,
}

/// `GET {onemap}/api/common/elastic/search`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OneMapSearchResponse {
    /// Total matches across all pages.
    #[serde(default)]
    pub found: u32,
    /// Matches on the requested page.
    #[serde(default)]
    pub results: Vec<OneMapPlace>,
}

/// A geocoded place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneMapPlace {
    /// Matched place name.
    #[serde(rename = "SEARCHVAL")]
    pub name: String,
    /// Full address.
    #[serde(rename = "ADDRESS", default)]
    pub address: String,
    /// Latitude, sent as a string.
    #[serde(rename = "LATITUDE", deserialize_with = "f64_or_string")]
    pub latitude: f64,
    /// Longitude, sent as a string.
    #[serde(rename = "LONGITUDE", deserialize_with = "f64_or_string")]
    pub longitude: f64,
}

impl OneMapPlace {
    /// Place position.
    #[must_use]
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Str(String),
    Int(i64),
    Float(f64),
}

fn string_or_number<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(match Loose::deserialize(d)? {
        Loose::Str(s) => s,
        Loose::Int(i) => i.to_string(),
        Loose::Float(f) => f.to_string(),
    })
}

fn f64_or_string<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    match Loose::deserialize(d)? {
        Loose::Str(s) => s.trim().parse().map_err(serde::de::Error::custom),
        #[allow(clippy::cast_precision_loss)]
        Loose::Int(i) => Ok(i as f64),
        Loose::Float(f) => Ok(f),
    }
}

fn i64_or_string<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
    match Loose::deserialize(d)? {
        Loose::Str(s) => s.trim().parse().map_err(serde::de::Error::custom),
        Loose::Int(i) => Ok(i),
        #[allow(clippy::cast_possible_truncation)]
        Loose::Float(f) => Ok(f as i64),
    }
}
