//! Periodic traffic-image collection.
//!
//! The [`Poller`] fetches the traffic images feed on a fixed interval,
//! stores each camera's latest image once, optionally downloads the image
//! files, and applies the retention limits after every cycle.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::camera::CameraTable;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::feed::types::TrafficImagesResponse;
use crate::feed::ApiClient;
use crate::snapshot::snapshots_from_feed;
use crate::storage::Storage;

/// Where the poller gets camera data from.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// The current traffic images feed.
    async fn traffic_images(&self) -> Result<TrafficImagesResponse>;

    /// Raw bytes of one image.
    async fn image(&self, url: &str) -> Result<Vec<u8>>;
}

#[async_trait]
impl FeedSource for ApiClient {
    async fn traffic_images(&self) -> Result<TrafficImagesResponse> {
        ApiClient::traffic_images(self).await
    }

    async fn image(&self, url: &str) -> Result<Vec<u8>> {
        self.download(url).await
    }
}

/// Poller settings.
#[derive(Debug, Clone, PartialEq)]
pub struct PollerConfig {
    /// Time between cycles.
    pub interval: Duration,
    /// Download new images here; `None` stores metadata only.
    pub image_dir: Option<PathBuf>,
    /// Keep at most this many snapshots; 0 means unlimited.
    pub max_snapshots: usize,
    /// Drop snapshots older than this.
    pub max_age: Option<Duration>,
}

impl PollerConfig {
    /// Settings from the application configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            interval: config.poll_interval(),
            image_dir: config.poll.download_images.then(|| config.image_dir()),
            max_snapshots: config.storage.max_snapshots,
            max_age: config.max_age(),
        }
    }
}

/// Apply the age and count limits in `config` to `storage`.
///
/// Returns the number of snapshots removed.
///
/// # Errors
///
/// Returns an error if the age limit is out of range or storage fails.
pub fn apply_retention(storage: &Storage, config: &PollerConfig) -> Result<usize> {
    let mut pruned = 0;
    if let Some(max_age) = config.max_age {
        let max_age = chrono::Duration::from_std(max_age)
            .map_err(|e| Error::internal(format!("max age out of range: {e}")))?;
        pruned += storage.prune_older_than(max_age)?;
    }
    if config.max_snapshots > 0 {
        pruned += storage.prune_keep_recent(config.max_snapshots)?;
    }
    Ok(pruned)
}

/// What one poll cycle did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PollReport {
    /// Cameras in the feed.
    pub cameras: usize,
    /// New snapshots stored.
    pub inserted: usize,
    /// Images already stored.
    pub duplicates: usize,
    /// Feed entries without a numeric camera ID.
    pub skipped: usize,
    /// Image files written.
    pub images_saved: usize,
    /// Snapshots removed by retention.
    pub pruned: usize,
}

/// Collects traffic camera snapshots into storage.
#[derive(Debug)]
pub struct Poller<S> {
    source: S,
    storage: Storage,
    table: CameraTable,
    config: PollerConfig,
}

impl<S: FeedSource> Poller<S> {
    /// Create a poller.
    #[must_use]
    pub fn new(source: S, storage: Storage, table: CameraTable, config: PollerConfig) -> Self {
        Self {
            source,
            storage,
            table,
            config,
        }
    }

    /// The underlying storage.
    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Run one fetch-and-store cycle.
    ///
    /// A failed image download is logged and the snapshot is stored without
    /// a content hash.
    ///
    /// # Errors
    ///
    /// Returns an error if the feed cannot be fetched or storage fails.
    pub async fn poll_once(&mut self) -> Result<PollReport> {
        let feed = self.source.traffic_images().await?;
        let (snapshots, skipped) = snapshots_from_feed(feed.cameras(), &self.table);
        let mut report = PollReport {
            cameras: feed.cameras().count(),
            skipped,
            ..PollReport::default()
        };

        let mut fresh = Vec::new();
        for snapshot in snapshots {
            if self.storage.exists(snapshot.camera_id, &snapshot.md5)? {
                report.duplicates += 1;
            } else {
                fresh.push(snapshot);
            }
        }

        if let Some(dir) = &self.config.image_dir {
            for snapshot in &mut fresh {
                match self.source.image(&snapshot.image_url).await {
                    Ok(bytes) => match snapshot.save_image(dir, &bytes) {
                        Ok(_) => report.images_saved += 1,
                        Err(e) => {
                            warn!("Image for camera {} not written: {e}", snapshot.camera_id);
                        }
                    },
                    Err(e) => warn!("Image for camera {} not saved: {e}", snapshot.camera_id),
                }
            }
        }

        let summary = self.storage.insert_batch(&fresh)?;
        report.inserted = summary.inserted;
        report.duplicates += summary.duplicates;
        report.pruned = apply_retention(&self.storage, &self.config)?;

        info!(
            cameras = report.cameras,
            inserted = report.inserted,
            duplicates = report.duplicates,
            "Poll cycle complete"
        );
        Ok(report)
    }

    /// Poll now and then every interval until `shutdown` turns `true` or its
    /// sender is dropped.
    ///
    /// Failed cycles are logged and do not stop the loop. Returns the number
    /// of cycles attempted.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> u64 {
        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut cycles = 0;

        info!(
            interval_secs = self.config.interval.as_secs(),
            "Starting traffic image poller"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                _ = ticker.tick() => {
                    cycles += 1;
                    match self.poll_once().await {
                        Ok(_) => {}
                        Err(e) if e.is_transient() => {
                            warn!("Poll cycle {cycles} failed, retrying next tick: {e}");
                        }
                        Err(e) => error!("Poll cycle {cycles} failed: {e}"),
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        debug!("Shutdown sender dropped");
                        break;
                    }
                }
            }
        }

        info!("Poller stopped after {cycles} cycles");
        cycles
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;

    struct FakeFeed {
        bodies: Mutex<Vec<Result<TrafficImagesResponse>>>,
        fetches: AtomicUsize,
        image_fails: bool,
    }

    impl FakeFeed {
        fn new(bodies: Vec<Result<TrafficImagesResponse>>) -> Self {
            Self {
                bodies: Mutex::new(bodies),
                fetches: AtomicUsize::new(0),
                image_fails: false,
            }
        }
    }

    #[async_trait]
    impl FeedSource for FakeFeed {
        async fn traffic_images(&self) -> Result<TrafficImagesResponse> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            let mut bodies = self.bodies.lock().unwrap();
            if bodies.len() > 1 {
                bodies.remove(0)
            } else {
                match bodies.first() {
                    Some(Ok(body)) => Ok(body.clone()),
                    _ => Err(Error::upstream("feed down")),
                }
            }
        }

        async fn image(&self, url: &str) -> Result<Vec<u8>> {
            if self.image_fails {
                Err(Error::upstream("image gone"))
            } else {
                Ok(url.as_bytes().to_vec())
            }
        }
    }

    fn feed(entries: &[(&str, &str)]) -> TrafficImagesResponse {
        let cameras: Vec<serde_json::Value> = entries
            .iter()
            .map(|(id, md5)| {
                serde_json::json!({
                    "timestamp": "2022-12-13T10:15:30+08:00",
                    "image": format!("https://images.example/{id}/{md5}.jpg"),
                    "location": {"latitude": 1.3, "longitude": 103.8},
                    "camera_id": id,
                    "image_metadata": {"height": 240, "width": 320, "md5": md5}
                })
            })
            .collect();
        serde_json::from_value(serde_json::json!({
            "items": [{"timestamp": "2022-12-13T10:15:40+08:00", "cameras": cameras}]
        }))
        .unwrap()
    }

    fn config() -> PollerConfig {
        PollerConfig {
            interval: Duration::from_secs(60),
            image_dir: None,
            max_snapshots: 0,
            max_age: None,
        }
    }

    fn poller(source: FakeFeed, config: PollerConfig) -> Poller<FakeFeed> {
        Poller::new(
            source,
            Storage::open_in_memory().unwrap(),
            CameraTable::snapshot(),
            config,
        )
    }

    #[tokio::test]
    async fn test_poll_once_stores_and_dedups() {
        let source = FakeFeed::new(vec![
            Ok(feed(&[("1001", "a"), ("2701", "b")])),
            Ok(feed(&[("1001", "a"), ("2701", "c"), ("cam", "d")])),
        ]);
        let mut poller = poller(source, config());

        let first = poller.poll_once().await.unwrap();
        assert_eq!(first.cameras, 2);
        assert_eq!(first.inserted, 2);
        assert_eq!(first.duplicates, 0);

        let second = poller.poll_once().await.unwrap();
        assert_eq!(second.cameras, 3);
        assert_eq!(second.inserted, 1);
        assert_eq!(second.duplicates, 1);
        assert_eq!(second.skipped, 1);
        assert_eq!(poller.storage().count().unwrap(), 3);

        let stored = poller.storage().get_by_camera(1001, 1).unwrap();
        assert_eq!(
            stored[0].description.as_deref(),
            Some("ECP/MCE/KPE instersection")
        );
    }

    #[tokio::test]
    async fn test_poll_once_saves_images() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config();
        cfg.image_dir = Some(dir.path().to_path_buf());
        let mut poller = poller(FakeFeed::new(vec![Ok(feed(&[("1001", "a")]))]), cfg);

        let report = poller.poll_once().await.unwrap();

        assert_eq!(report.images_saved, 1);
        assert!(dir.path().join("1001/2022_12_13_101530.jpg").exists());
        let stored = poller.storage().get_recent(1).unwrap();
        assert!(stored[0].content_hash.is_some());
    }

    #[tokio::test]
    async fn test_failed_image_still_stores_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config();
        cfg.image_dir = Some(dir.path().to_path_buf());
        let mut source = FakeFeed::new(vec![Ok(feed(&[("1001", "a")]))]);
        source.image_fails = true;
        let mut poller = poller(source, cfg);

        let report = poller.poll_once().await.unwrap();

        assert_eq!(report.inserted, 1);
        assert_eq!(report.images_saved, 0);
        assert!(poller.storage().get_recent(1).unwrap()[0].content_hash.is_none());
    }

    #[tokio::test]
    async fn test_unwritable_image_dir_still_stores_snapshots() {
        // A regular file where the image directory should be.
        let blocker = tempfile::NamedTempFile::new().unwrap();
        let mut cfg = config();
        cfg.image_dir = Some(blocker.path().join("images"));
        let source = FakeFeed::new(vec![Ok(feed(&[("1001", "a"), ("1002", "b")]))]);
        let mut poller = poller(source, cfg);

        let report = poller.poll_once().await.unwrap();

        assert_eq!(report.inserted, 2);
        assert_eq!(report.images_saved, 0);
        let stored = poller.storage().get_recent(2).unwrap();
        assert_eq!(stored.len(), 2);
        assert!(stored.iter().all(|s| s.content_hash.is_none()));
    }

    #[tokio::test]
    async fn test_retention_keeps_recent() {
        let mut cfg = config();
        cfg.max_snapshots = 2;
        let source = FakeFeed::new(vec![Ok(feed(&[("1001", "a"), ("1002", "b"), ("1003", "c")]))]);
        let mut poller = poller(source, cfg);

        let report = poller.poll_once().await.unwrap();

        assert_eq!(report.inserted, 3);
        assert_eq!(report.pruned, 1);
        assert_eq!(poller.storage().count().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_poll_once_propagates_feed_error() {
        let mut poller = poller(FakeFeed::new(vec![Err(Error::upstream("down"))]), config());
        assert!(poller.poll_once().await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_survives_failures_and_stops() {
        let source = FakeFeed::new(vec![Err(Error::upstream("down"))]);
        let mut poller = poller(source, config());
        let (tx, rx) = watch::channel(false);

        let stopper = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(150)).await;
            tx.send(true).unwrap();
        });

        let cycles = poller.run(rx).await;
        stopper.await.unwrap();

        // Ticks at 0s, 60s and 120s before the stop at 150s.
        assert_eq!(cycles, 3);
        assert_eq!(poller.source.fetches.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_run_stops_when_sender_dropped() {
        let mut poller = poller(FakeFeed::new(vec![Ok(feed(&[]))]), config());
        let (tx, rx) = watch::channel(false);
        drop(tx);

        let cycles = poller.run(rx).await;
        assert!(cycles <= 1);
    }

    #[test]
    fn test_config_from_app_config() {
        let mut app = Config::default();
        app.poll.download_images = true;
        app.poll.image_dir = Some(PathBuf::from("/tmp/imgs"));

        let cfg = PollerConfig::from_config(&app);
        assert_eq!(cfg.interval, Duration::from_secs(60));
        assert_eq!(cfg.image_dir, Some(PathBuf::from("/tmp/imgs")));
        assert_eq!(cfg.max_snapshots, 500_000);
        assert_eq!(cfg.max_age, Some(Duration::from_secs(14 * 24 * 3600)));
    }
}
