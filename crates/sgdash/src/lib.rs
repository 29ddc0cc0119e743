//! `sgdash` - Singapore traffic, weather and carpark data toolkit
//!
//! This library holds the traffic camera location table, spatial queries over
//! it, clients for the Data.gov.sg, LTA DataMall and OneMap APIs, air quality
//! and forecast summaries, and a `SQLite` store for traffic camera snapshots.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod camera;
pub mod carpark;
pub mod cli;
pub mod config;
pub mod environment;
pub mod error;
pub mod feed;
pub mod logging;
pub mod poller;
pub mod snapshot;
pub mod spatial;
pub mod storage;
pub mod svy21;
pub mod traffic;
pub mod weather;

pub use camera::{CameraLocation, CameraTable};
pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use poller::{Poller, PollerConfig};
pub use snapshot::CameraSnapshot;
pub use spatial::Coordinate;
pub use storage::{Storage, StorageStats};
