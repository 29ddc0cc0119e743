//! CLI command definitions.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::carpark::DEFAULT_RADIUS_M;
use crate::feed::Dataset;
use crate::weather::RealtimeEndpoint;

/// A WGS84 point given on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Args)]
pub struct PointArgs {
    /// Latitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    pub lat: f64,

    /// Longitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    pub lon: f64,
}

impl From<PointArgs> for crate::spatial::Coordinate {
    fn from(p: PointArgs) -> Self {
        Self::new(p.lat, p.lon)
    }
}

/// Where to search from: a point, or a place name looked up with OneMap.
#[derive(Debug, Clone, PartialEq, Args)]
pub struct LocationArgs {
    /// Latitude in decimal degrees
    #[arg(
        long,
        allow_hyphen_values = true,
        requires = "lon",
        required_unless_present = "place"
    )]
    pub lat: Option<f64>,

    /// Longitude in decimal degrees
    #[arg(
        long,
        allow_hyphen_values = true,
        requires = "lat",
        required_unless_present = "place"
    )]
    pub lon: Option<f64>,

    /// Place name or postal code, geocoded with OneMap
    #[arg(short, long, conflicts_with_all = ["lat", "lon"])]
    pub place: Option<String>,
}

impl LocationArgs {
    /// The point given by `--lat` and `--lon`, if both were.
    #[must_use]
    pub fn point(&self) -> Option<crate::spatial::Coordinate> {
        self.lat
            .zip(self.lon)
            .map(|(lat, lon)| crate::spatial::Coordinate::new(lat, lon))
    }
}

/// Traffic camera table commands.
#[derive(Debug, Subcommand)]
pub enum CamerasCommand {
    /// List every camera
    List {
        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Show one camera
    Show {
        /// Camera ID
        id: u32,
    },

    /// Check IDs, coordinates and descriptions
    Validate,

    /// Export the table
    Export {
        /// Export format
        #[arg(short, long, value_enum, default_value = "json")]
        format: ExportFormat,

        /// Write to this file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Find cameras whose description matches a regex
    Search {
        /// Case-insensitive regular expression
        pattern: String,
    },

    /// Cameras near a point
    Nearby {
        #[command(flatten)]
        point: PointArgs,

        /// Search radius in kilometres
        #[arg(short, long, default_value_t = 1.0)]
        radius_km: f64,
    },
}

/// Live feed commands.
#[derive(Debug, Subcommand)]
pub enum FeedCommand {
    /// Latest traffic camera images
    Traffic {
        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Taxi count and positions
    Taxi {
        /// Output format
        #[arg(short, long, value_enum, default_value = "plain")]
        format: OutputFormat,
    },

    /// Realtime weather readings
    Weather {
        /// Which reading to fetch
        #[arg(value_enum)]
        endpoint: WeatherArg,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// PSI and pollutant readings per region
    Psi {
        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Today's UV index
    Uv {
        /// Output format
        #[arg(short, long, value_enum, default_value = "plain")]
        format: OutputFormat,
    },

    /// Wet-bulb globe temperature and heat stress per station
    Wbgt {
        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// 2-hour forecast per area
    Forecast {
        /// Only this area, e.g. "Ang Mo Kio"
        #[arg(short, long, conflicts_with_all = ["lat", "lon"])]
        area: Option<String>,

        /// Forecast for the area nearest this latitude
        #[arg(long, allow_hyphen_values = true, requires = "lon")]
        lat: Option<f64>,

        /// Forecast for the area nearest this longitude
        #[arg(long, allow_hyphen_values = true, requires = "lat")]
        lon: Option<f64>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Island-wide 24-hour outlook
    Outlook {
        /// Output format
        #[arg(short, long, value_enum, default_value = "plain")]
        format: OutputFormat,
    },

    /// Flood alerts in force
    Floods,

    /// HDB carpark lot availability summary
    Carparks,

    /// Average speed per road from LTA speed bands
    SpeedBands {
        /// Only roads whose name contains this text
        #[arg(short, long)]
        road: Option<String>,
    },
}

/// Proximity search commands.
#[derive(Debug, Subcommand)]
pub enum NearbyCommand {
    /// Bus stops near a point or place
    BusStops {
        #[command(flatten)]
        location: LocationArgs,

        /// Search radius in kilometres
        #[arg(short, long, default_value_t = 0.5)]
        radius_km: f64,
    },

    /// HDB carparks near a point or place, with live availability
    Carparks {
        #[command(flatten)]
        location: LocationArgs,

        /// Search radius in metres
        #[arg(short, long, default_value_t = DEFAULT_RADIUS_M)]
        radius_m: f64,
    },
}

/// Place search arguments.
#[derive(Debug, Args)]
pub struct GeocodeCommand {
    /// Place name, address or postal code
    pub query: String,

    /// Maximum number of matches to show
    #[arg(short, long, default_value = "5")]
    pub limit: usize,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Poll command arguments.
#[derive(Debug, Args)]
pub struct PollCommand {
    /// Run one cycle and exit
    #[arg(long)]
    pub once: bool,
}

/// Stored snapshot commands.
#[derive(Debug, Subcommand)]
pub enum SnapshotsCommand {
    /// Most recent snapshots
    Recent {
        /// Maximum number of results
        #[arg(short, long, default_value = "20")]
        limit: usize,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Snapshots of one camera
    Camera {
        /// Camera ID
        id: u32,

        /// Maximum number of results
        #[arg(short, long, default_value = "20")]
        limit: usize,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Database statistics
    Stats {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Apply the retention limits now
    Prune,
}

/// Dataset download arguments.
#[derive(Debug, Args)]
pub struct DatasetCommand {
    /// Dataset to fetch
    #[arg(value_enum)]
    pub name: DatasetArg,

    /// Write to this file (default: the dataset's usual file name)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Configuration management commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Dataset argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DatasetArg {
    /// ERP gantry positions
    ErpGantry,
    /// PUB drain CCTV positions
    PubCctv,
    /// HDB carpark information
    HdbCarpark,
    /// Speed camera positions
    SpeedCamera,
}

impl From<DatasetArg> for Dataset {
    fn from(arg: DatasetArg) -> Self {
        match arg {
            DatasetArg::ErpGantry => Self::ErpGantry,
            DatasetArg::PubCctv => Self::PubCctv,
            DatasetArg::HdbCarpark => Self::HdbCarpark,
            DatasetArg::SpeedCamera => Self::SpeedCamera,
        }
    }
}

/// Weather endpoint argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum WeatherArg {
    /// Air temperature
    AirTemperature,
    /// Rainfall
    Rainfall,
    /// Relative humidity
    RelativeHumidity,
    /// Wind speed
    WindSpeed,
}

impl From<WeatherArg> for RealtimeEndpoint {
    fn from(arg: WeatherArg) -> Self {
        match arg {
            WeatherArg::AirTemperature => Self::AirTemperature,
            WeatherArg::Rainfall => Self::Rainfall,
            WeatherArg::RelativeHumidity => Self::RelativeHumidity,
            WeatherArg::WindSpeed => Self::WindSpeed,
        }
    }
}

/// Camera table export format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ExportFormat {
    /// Object keyed by camera ID
    #[default]
    Json,
    /// `ID,Lat,Lon,Description` rows
    Csv,
}

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Plain,
    /// Formatted table
    Table,
    /// JSON output
    Json,
}
