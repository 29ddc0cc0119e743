//! Upstream data feeds.
//!
//! [`ApiClient`] talks to Data.gov.sg, LTA DataMall and OneMap. The
//! [`DatasetCache`] and [`OneMapAuth`] wrappers keep slow-changing results
//! in memory.

pub mod client;
pub mod dataset;
pub mod onemap;
pub mod types;

pub use client::{paginate, ApiClient, DATAMALL_MAX_PAGES, DATAMALL_PAGE_SIZE};
pub use dataset::{Dataset, DatasetCache, DatasetSource};
pub use onemap::{OneMapAuth, PlaceSearch, TokenSource};
pub use types::{BusStop, CameraFeed, SpeedBandRecord, TrafficImagesResponse};
