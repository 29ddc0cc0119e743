//! Command-line interface for sgdash.
//!
//! This module provides the clap command tree for the `sgdash` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    CamerasCommand, ConfigCommand, DatasetArg, DatasetCommand, ExportFormat, FeedCommand,
    GeocodeCommand, LocationArgs, NearbyCommand, OutputFormat, PointArgs, PollCommand,
    SnapshotsCommand, WeatherArg,
};

/// sgdash - Singapore traffic, weather and carpark data
///
/// Look up traffic cameras, query live Data.gov.sg and LTA DataMall feeds,
/// and keep a local history of camera snapshots.
#[derive(Debug, Parser)]
#[command(name = "sgdash")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Query the traffic camera table
    #[command(subcommand)]
    Cameras(CamerasCommand),

    /// Fetch a live feed
    #[command(subcommand)]
    Feed(FeedCommand),

    /// Find bus stops or carparks near a point or place
    #[command(subcommand)]
    Nearby(NearbyCommand),

    /// Look up a place with OneMap
    Geocode(GeocodeCommand),

    /// Collect camera snapshots on an interval
    Poll(PollCommand),

    /// Inspect stored snapshots
    #[command(subcommand)]
    Snapshots(SnapshotsCommand),

    /// Download a Data.gov.sg dataset
    Dataset(DatasetCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}
