//! Stored camera snapshots.
//!
//! A snapshot records one image published by the traffic images feed,
//! joined with the camera's description from the reference table.

use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::camera::CameraTable;
use crate::error::{Error, Result};
use crate::feed::types::CameraFeed;

const SGT_OFFSET_SECS: i32 = 8 * 3600;

/// Singapore Standard Time, UTC+8.
#[must_use]
pub fn sgt() -> FixedOffset {
    FixedOffset::east_opt(SGT_OFFSET_SECS).unwrap_or(Utc.fix())
}

/// One image of one camera.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraSnapshot {
    /// Row ID, assigned by storage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    /// Camera that took the image.
    pub camera_id: u32,

    /// When the camera took the image.
    pub captured_at: DateTime<FixedOffset>,

    /// Image URL on the feed.
    pub image_url: String,

    /// Upstream MD5 of the image; with `camera_id` it identifies an image.
    pub md5: String,

    /// Image width in pixels.
    pub width: u32,

    /// Image height in pixels.
    pub height: u32,

    /// When sgdash saw the image.
    pub fetched_at: DateTime<Utc>,

    /// Camera description from the reference table, if the camera is known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// BLAKE3 digest of the downloaded image, when it was downloaded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
}

impl CameraSnapshot {
    /// Build a snapshot from a feed entry.
    ///
    /// Returns `None` when the feed's camera ID is not numeric.
    #[must_use]
    pub fn from_feed(feed: &CameraFeed, table: &CameraTable) -> Option<Self> {
        let camera_id = feed.numeric_id()?;
        Some(Self {
            id: None,
            camera_id,
            captured_at: feed.timestamp,
            image_url: feed.image.clone(),
            md5: feed.image_metadata.md5.clone(),
            width: feed.image_metadata.width,
            height: feed.image_metadata.height,
            fetched_at: Utc::now(),
            description: table.get(camera_id).map(|c| c.description.clone()),
            content_hash: None,
        })
    }

    /// File name for this image, from its capture time and URL extension.
    #[must_use]
    pub fn file_name(&self) -> String {
        image_file_name(&self.captured_at, &self.image_url)
    }

    /// Where this image is saved under `dir`.
    #[must_use]
    pub fn image_path(&self, dir: &Path) -> PathBuf {
        dir.join(self.camera_id.to_string()).join(self.file_name())
    }

    /// Write image bytes under `dir` and record their hash.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DirectoryCreate`] or [`Error::Io`] on failure.
    pub fn save_image(&mut self, dir: &Path, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.image_path(dir);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(&path, bytes)?;
        self.content_hash = Some(content_hash(bytes));
        debug!("Saved {} bytes to {}", bytes.len(), path.display());
        Ok(path)
    }
}

/// Snapshots of a batch of feed entries, plus how many were skipped for a
/// non-numeric camera ID. Each skipped entry is logged.
pub fn snapshots_from_feed<'a>(
    cameras: impl IntoIterator<Item = &'a CameraFeed>,
    table: &CameraTable,
) -> (Vec<CameraSnapshot>, usize) {
    let mut skipped = 0;
    let snapshots = cameras
        .into_iter()
        .filter_map(|feed| {
            let snapshot = CameraSnapshot::from_feed(feed, table);
            if snapshot.is_none() {
                warn!("Skipping camera with non-numeric id '{}'", feed.camera_id);
                skipped += 1;
            }
            snapshot
        })
        .collect();
    (snapshots, skipped)
}

/// `YYYY_MM_DD_HHMMSS.<ext>` in the timestamp's own offset. The extension
/// comes from the URL path and defaults to `jpg`.
#[must_use]
pub fn image_file_name(timestamp: &DateTime<FixedOffset>, url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let last = path.rsplit('/').next().unwrap_or(path);
    let ext = match last.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => ext,
        _ => "jpg",
    };
    format!("{}.{ext}", timestamp.format("%Y_%m_%d_%H%M%S"))
}

/// BLAKE3 hex digest of `bytes`.
#[must_use]
pub fn content_hash(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}
