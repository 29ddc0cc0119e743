//! Data.gov.sg initiate-download datasets with a time-to-live cache.
//!
//! Fetching such a dataset takes two requests: one for a signed URL, one
//! for the file. The files change rarely, so results are kept in memory
//! for a configurable TTL.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info};

use super::client::ApiClient;
use crate::error::Result;

/// Default freshness of a cached dataset.
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Datasets sgdash knows how to fetch by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dataset {
    /// ERP gantry positions (GeoJSON).
    ErpGantry,
    /// PUB drain CCTV positions (GeoJSON).
    PubCctv,
    /// HDB carpark information (CSV).
    HdbCarpark,
    /// Speed camera positions (CSV).
    SpeedCamera,
}

impl Dataset {
    /// All known datasets.
    pub const ALL: [Dataset; 4] = [
        Dataset::ErpGantry,
        Dataset::PubCctv,
        Dataset::HdbCarpark,
        Dataset::SpeedCamera,
    ];

    /// Data.gov.sg dataset ID.
    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Self::ErpGantry => "d_753090823cc9920ac41efaa6530c5893",
            Self::PubCctv => "d_1de1c45043183bec57e762d01c636eee",
            Self::HdbCarpark => "d_23f946fa557947f93a8043bbef41dd09",
            Self::SpeedCamera => "d_983804de2bc016f53e44031d85d1ec8a",
        }
    }

    /// Human-readable name for logs.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::ErpGantry => "ERP Gantry",
            Self::PubCctv => "PUB CCTV",
            Self::HdbCarpark => "HDB Carpark",
            Self::SpeedCamera => "Speed Camera",
        }
    }

    /// Suggested file name when saving to disk.
    #[must_use]
    pub fn file_name(self) -> &'static str {
        match self {
            Self::ErpGantry => "erp_gantry.geojson",
            Self::PubCctv => "pub_cctv.geojson",
            Self::HdbCarpark => "HDBCarparkInformation.csv",
            Self::SpeedCamera => "speed_camera.csv",
        }
    }
}

/// Something that can produce the bytes of a dataset.
#[async_trait]
pub trait DatasetSource: Send + Sync {
    /// Fetch the current contents of `dataset_id`.
    async fn fetch(&self, dataset_id: &str) -> Result<Vec<u8>>;
}

#[async_trait]
impl DatasetSource for ApiClient {
    async fn fetch(&self, dataset_id: &str) -> Result<Vec<u8>> {
        let url = self.initiate_download(dataset_id).await?;
        self.download(&url).await
    }
}

#[derive(Debug)]
struct CacheEntry {
    data: Arc<Vec<u8>>,
    fetched_at: Instant,
}

/// In-memory TTL cache in front of a [`DatasetSource`].
#[derive(Debug)]
pub struct DatasetCache<S> {
    source: S,
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl<S: DatasetSource> DatasetCache<S> {
    /// Wrap `source`, keeping results for `ttl`.
    #[must_use]
    pub fn new(source: S, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Return the dataset, fetching it only when missing or stale.
    ///
    /// The lock is held across the fetch so concurrent callers for a cold
    /// entry trigger a single download.
    ///
    /// # Errors
    ///
    /// Returns the source's error; a failed fetch leaves the cache untouched.
    pub async fn get(&self, dataset: Dataset) -> Result<Arc<Vec<u8>>> {
        self.get_by_id(dataset.id(), dataset.name()).await
    }

    /// Like [`get`](Self::get) for an arbitrary dataset ID.
    ///
    /// # Errors
    ///
    /// Returns the source's error.
    pub async fn get_by_id(&self, dataset_id: &str, name: &str) -> Result<Arc<Vec<u8>>> {
        let mut entries = self.entries.lock().await;

        if let Some(entry) = entries.get(dataset_id) {
            if entry.fetched_at.elapsed() < self.ttl {
                debug!("Using cached {name} data");
                return Ok(Arc::clone(&entry.data));
            }
        }

        let data = Arc::new(self.source.fetch(dataset_id).await?);
        info!("Downloaded {name} data ({} bytes)", data.len());
        entries.insert(
            dataset_id.to_string(),
            CacheEntry {
                data: Arc::clone(&data),
                fetched_at: Instant::now(),
            },
        );
        Ok(data)
    }

    /// Drop one dataset from the cache. Returns whether it was present.
    pub async fn clear(&self, dataset: Dataset) -> bool {
        let removed = self.entries.lock().await.remove(dataset.id()).is_some();
        if removed {
            debug!("Cache cleared for dataset {}", dataset.id());
        }
        removed
    }

    /// Drop every cached dataset.
    pub async fn clear_all(&self) {
        self.entries.lock().await.clear();
        debug!("All dataset caches cleared");
    }

    /// Number of datasets currently cached, fresh or not.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Whether nothing is cached.
    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}
