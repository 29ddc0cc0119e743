//! Storage layer for sgdash.
//!
//! `SQLite`-backed history of traffic camera snapshots. Each camera image is
//! stored once, keyed by camera ID and upstream MD5.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::snapshot::{sgt, CameraSnapshot};

const SELECT_COLUMNS: &str = "SELECT id, camera_id, captured_at, image_url, md5, width, height, \
     fetched_at, description, content_hash FROM camera_snapshots";

/// Storage engine for camera snapshots.
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        // WAL lets `snapshots` queries read while a poller writes
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        migrations::initialize_schema(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory storage instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Insert a snapshot.
    ///
    /// Returns the assigned ID, or `None` when this camera image is already
    /// stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn insert(&self, snapshot: &CameraSnapshot) -> Result<Option<i64>> {
        if self.exists(snapshot.camera_id, &snapshot.md5)? {
            debug!(
                "Skipping duplicate image {} for camera {}",
                snapshot.md5, snapshot.camera_id
            );
            return Ok(None);
        }

        self.conn.execute(
            r"
            INSERT INTO camera_snapshots
                (camera_id, captured_at, image_url, md5, width, height,
                 fetched_at, description, content_hash)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ",
            params![
                snapshot.camera_id,
                to_db_time(snapshot.captured_at.with_timezone(&Utc)),
                snapshot.image_url,
                snapshot.md5,
                snapshot.width,
                snapshot.height,
                to_db_time(snapshot.fetched_at),
                snapshot.description,
                snapshot.content_hash,
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        debug!("Inserted snapshot {id} for camera {}", snapshot.camera_id);
        Ok(Some(id))
    }

    /// Insert many snapshots in one transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if any insert fails; nothing is written in that case.
    pub fn insert_batch(&mut self, snapshots: &[CameraSnapshot]) -> Result<InsertSummary> {
        let tx = self.conn.transaction()?;
        let mut summary = InsertSummary::default();
        {
            let mut exists = tx.prepare_cached(
                "SELECT COUNT(*) FROM camera_snapshots WHERE camera_id = ?1 AND md5 = ?2",
            )?;
            let mut insert = tx.prepare_cached(
                r"
                INSERT INTO camera_snapshots
                    (camera_id, captured_at, image_url, md5, width, height,
                     fetched_at, description, content_hash)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                ",
            )?;
            for s in snapshots {
                let count: i64 =
                    exists.query_row(params![s.camera_id, s.md5], |row| row.get(0))?;
                if count > 0 {
                    summary.duplicates += 1;
                    continue;
                }
                insert.execute(params![
                    s.camera_id,
                    to_db_time(s.captured_at.with_timezone(&Utc)),
                    s.image_url,
                    s.md5,
                    s.width,
                    s.height,
                    to_db_time(s.fetched_at),
                    s.description,
                    s.content_hash,
                ])?;
                summary.inserted += 1;
            }
        }
        tx.commit()?;
        Ok(summary)
    }

    /// Whether an image of `camera_id` with this MD5 is stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn exists(&self, camera_id: u32, md5: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM camera_snapshots WHERE camera_id = ?1 AND md5 = ?2",
            params![camera_id, md5],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Get a snapshot by its ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get(&self, id: i64) -> Result<Option<CameraSnapshot>> {
        let result = self
            .conn
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE id = ?1"),
                [id],
                Self::row_to_snapshot,
            )
            .optional()?;
        Ok(result)
    }

    /// Most recent snapshots across all cameras.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_recent(&self, limit: usize) -> Result<Vec<CameraSnapshot>> {
        self.query(
            &format!("{SELECT_COLUMNS} ORDER BY captured_at DESC, id DESC LIMIT ?1"),
            params![to_limit(limit)],
        )
    }

    /// Most recent snapshots of one camera.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_by_camera(&self, camera_id: u32, limit: usize) -> Result<Vec<CameraSnapshot>> {
        self.query(
            &format!(
                "{SELECT_COLUMNS} WHERE camera_id = ?1 ORDER BY captured_at DESC, id DESC LIMIT ?2"
            ),
            params![camera_id, to_limit(limit)],
        )
    }

    /// Snapshots captured within `[since, until]`, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_by_time_range(
        &self,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<CameraSnapshot>> {
        self.query(
            &format!(
                "{SELECT_COLUMNS} WHERE captured_at >= ?1 AND captured_at <= ?2 \
                 ORDER BY captured_at DESC, id DESC LIMIT ?3"
            ),
            params![to_db_time(since), to_db_time(until), to_limit(limit)],
        )
    }

    fn query(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<CameraSnapshot>> {
        let mut stmt = self.conn.prepare(sql)?;
        let snapshots = stmt
            .query_map(params, Self::row_to_snapshot)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(snapshots)
    }

    /// Count stored snapshots.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count(&self) -> Result<i64> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM camera_snapshots", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Delete a snapshot by ID.
    ///
    /// Returns `true` if a snapshot was deleted, `false` if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn delete(&self, id: i64) -> Result<bool> {
        let affected = self
            .conn
            .execute("DELETE FROM camera_snapshots WHERE id = ?1", [id])?;
        Ok(affected > 0)
    }

    /// Delete snapshots captured more than `max_age` ago.
    ///
    /// An age reaching past the earliest representable time prunes nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn prune_older_than(&self, max_age: Duration) -> Result<usize> {
        let Some(cutoff) = Utc::now().checked_sub_signed(max_age) else {
            debug!("Max age {max_age} predates any snapshot, nothing to prune");
            return Ok(0);
        };
        let cutoff = to_db_time(cutoff);
        let affected = self.conn.execute(
            "DELETE FROM camera_snapshots WHERE captured_at < ?1",
            [cutoff],
        )?;

        if affected > 0 {
            info!("Pruned {affected} old snapshots");
        }
        Ok(affected)
    }

    /// Keep only the `keep_count` most recently captured snapshots.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn prune_keep_recent(&self, keep_count: usize) -> Result<usize> {
        let affected = self.conn.execute(
            r"
            DELETE FROM camera_snapshots WHERE id NOT IN (
                SELECT id FROM camera_snapshots ORDER BY captured_at DESC, id DESC LIMIT ?1
            )
            ",
            [to_limit(keep_count)],
        )?;

        if affected > 0 {
            info!("Pruned {affected} snapshots to keep {keep_count} recent");
        }
        Ok(affected)
    }

    /// Get database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StorageStats> {
        let (total_snapshots, cameras, oldest, newest): (i64, i64, Option<String>, Option<String>) =
            self.conn.query_row(
                r"
                SELECT COUNT(*), COUNT(DISTINCT camera_id), MIN(captured_at), MAX(captured_at)
                FROM camera_snapshots
                ",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )?;

        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StorageStats {
            total_snapshots,
            cameras,
            oldest_snapshot: oldest.as_deref().and_then(from_db_time),
            newest_snapshot: newest.as_deref().and_then(from_db_time),
            db_size_bytes,
        })
    }

    fn row_to_snapshot(row: &rusqlite::Row) -> rusqlite::Result<CameraSnapshot> {
        let captured: String = row.get(2)?;
        let fetched: String = row.get(7)?;

        let captured_at = from_db_time(&captured).unwrap_or_else(|| {
            warn!("Unreadable captured_at '{captured}', using now");
            Utc::now()
        });
        let fetched_at = from_db_time(&fetched).unwrap_or_else(Utc::now);

        Ok(CameraSnapshot {
            id: Some(row.get(0)?),
            camera_id: row.get(1)?,
            captured_at: captured_at.with_timezone(&sgt()),
            image_url: row.get(3)?,
            md5: row.get(4)?,
            width: row.get(5)?,
            height: row.get(6)?,
            fetched_at,
            description: row.get(8)?,
            content_hash: row.get(9)?,
        })
    }
}

fn to_db_time(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn from_db_time(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn to_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

/// Outcome of [`Storage::insert_batch`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InsertSummary {
    /// New rows written.
    pub inserted: usize,
    /// Images already stored.
    pub duplicates: usize,
}

/// Statistics about the storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageStats {
    /// Total number of snapshots stored.
    pub total_snapshots: i64,
    /// Number of distinct cameras with at least one snapshot.
    pub cameras: i64,
    /// Capture time of the oldest snapshot.
    pub oldest_snapshot: Option<DateTime<Utc>>,
    /// Capture time of the newest snapshot.
    pub newest_snapshot: Option<DateTime<Utc>>,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_storage() -> Storage {
        Storage::open_in_memory().expect("failed to create test storage")
    }

    fn snapshot(camera_id: u32, md5: &str, captured_at: &str) -> CameraSnapshot {
        CameraSnapshot {
            id: None,
            camera_id,
            captured_at: DateTime::parse_from_rfc3339(captured_at).unwrap(),
            image_url: format!("https://images.example/{camera_id}/{md5}.jpg"),
            md5: md5.to_string(),
            width: 320,
            height: 240,
            fetched_at: Utc::now(),
            description: Some(format!("camera {camera_id}")),
            content_hash: None,
        }
    }

    fn sgt_string(t: DateTime<Utc>) -> String {
        t.with_timezone(&sgt()).to_rfc3339()
    }

    #[test]
    fn test_insert_and_get() {
        let storage = create_test_storage();
        let snap = snapshot(1001, "aaa", "2022-12-13T10:15:30+08:00");

        let id = storage.insert(&snap).unwrap().unwrap();
        let got = storage.get(id).unwrap().unwrap();

        assert_eq!(got.id, Some(id));
        assert_eq!(got.camera_id, 1001);
        assert_eq!(got.captured_at, snap.captured_at);
        assert_eq!(got.captured_at.offset().local_minus_utc(), 8 * 3600);
        assert_eq!(got.description.as_deref(), Some("camera 1001"));
    }

    #[test]
    fn test_dedup_on_camera_and_md5() {
        let storage = create_test_storage();

        assert!(storage
            .insert(&snapshot(1001, "aaa", "2022-12-13T10:15:30+08:00"))
            .unwrap()
            .is_some());
        assert!(storage
            .insert(&snapshot(1001, "aaa", "2022-12-13T10:16:30+08:00"))
            .unwrap()
            .is_none());
        // Same image hash on another camera is a different image.
        assert!(storage
            .insert(&snapshot(1002, "aaa", "2022-12-13T10:15:30+08:00"))
            .unwrap()
            .is_some());
        assert_eq!(storage.count().unwrap(), 2);
    }

    #[test]
    fn test_insert_batch_reports_duplicates() {
        let mut storage = create_test_storage();
        storage
            .insert(&snapshot(1001, "aaa", "2022-12-13T10:15:30+08:00"))
            .unwrap();

        let summary = storage
            .insert_batch(&[
                snapshot(1001, "aaa", "2022-12-13T10:15:30+08:00"),
                snapshot(1001, "bbb", "2022-12-13T10:16:30+08:00"),
                snapshot(1002, "ccc", "2022-12-13T10:16:30+08:00"),
                snapshot(1002, "ccc", "2022-12-13T10:16:30+08:00"),
            ])
            .unwrap();

        assert_eq!(
            summary,
            InsertSummary {
                inserted: 2,
                duplicates: 2
            }
        );
        assert_eq!(storage.count().unwrap(), 3);
    }

    #[test]
    fn test_get_nonexistent() {
        let storage = create_test_storage();
        assert!(storage.get(99999).unwrap().is_none());
    }

    #[test]
    fn test_get_recent_newest_first() {
        let storage = create_test_storage();
        storage
            .insert(&snapshot(1001, "a", "2022-12-13T10:00:00+08:00"))
            .unwrap();
        storage
            .insert(&snapshot(1002, "b", "2022-12-13T12:00:00+08:00"))
            .unwrap();
        storage
            .insert(&snapshot(1003, "c", "2022-12-13T11:00:00+08:00"))
            .unwrap();

        let recent = storage.get_recent(2).unwrap();
        let ids: Vec<u32> = recent.iter().map(|s| s.camera_id).collect();
        assert_eq!(ids, [1002, 1003]);
    }

    #[test]
    fn test_get_recent_with_zero_limit() {
        let storage = create_test_storage();
        storage
            .insert(&snapshot(1001, "a", "2022-12-13T10:00:00+08:00"))
            .unwrap();
        assert!(storage.get_recent(0).unwrap().is_empty());
    }

    #[test]
    fn test_get_by_camera() {
        let storage = create_test_storage();
        storage
            .insert(&snapshot(1001, "a", "2022-12-13T10:00:00+08:00"))
            .unwrap();
        storage
            .insert(&snapshot(1001, "b", "2022-12-13T10:01:00+08:00"))
            .unwrap();
        storage
            .insert(&snapshot(2701, "c", "2022-12-13T10:02:00+08:00"))
            .unwrap();

        let history = storage.get_by_camera(1001, 10).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].md5, "b");
        assert!(storage.get_by_camera(9999, 10).unwrap().is_empty());
    }

    #[test]
    fn test_get_by_time_range() {
        let storage = create_test_storage();
        storage
            .insert(&snapshot(1001, "a", "2022-12-13T10:00:00+08:00"))
            .unwrap();
        storage
            .insert(&snapshot(1001, "b", "2022-12-13T11:00:00+08:00"))
            .unwrap();

        let since = DateTime::parse_from_rfc3339("2022-12-13T02:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let until = since + Duration::hours(1);

        let hits = storage.get_by_time_range(since, until, 10).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].md5, "b");

        let none = storage
            .get_by_time_range(since - Duration::days(10), since - Duration::days(9), 10)
            .unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_delete() {
        let storage = create_test_storage();
        let id = storage
            .insert(&snapshot(1001, "a", "2022-12-13T10:00:00+08:00"))
            .unwrap()
            .unwrap();

        assert!(storage.delete(id).unwrap());
        assert!(storage.get(id).unwrap().is_none());
        assert!(!storage.delete(id).unwrap());
    }

    #[test]
    fn test_prune_older_than() {
        let storage = create_test_storage();
        let now = Utc::now();
        storage
            .insert(&snapshot(1001, "old", &sgt_string(now - Duration::days(20))))
            .unwrap();
        storage
            .insert(&snapshot(1001, "new", &sgt_string(now - Duration::hours(1))))
            .unwrap();

        assert_eq!(storage.prune_older_than(Duration::days(14)).unwrap(), 1);
        let left = storage.get_recent(10).unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].md5, "new");
    }

    #[test]
    fn test_prune_older_than_huge_age_keeps_everything() {
        let storage = create_test_storage();
        storage
            .insert(&snapshot(1001, "a", "2022-12-13T10:15:30+08:00"))
            .unwrap();

        assert_eq!(
            storage.prune_older_than(Duration::days(100_000_000)).unwrap(),
            0
        );
        assert_eq!(storage.count().unwrap(), 1);
    }

    #[test]
    fn test_prune_keep_recent() {
        let storage = create_test_storage();
        for i in 0..10 {
            storage
                .insert(&snapshot(
                    1001,
                    &format!("m{i}"),
                    &format!("2022-12-13T10:{i:02}:00+08:00"),
                ))
                .unwrap();
        }

        assert_eq!(storage.prune_keep_recent(4).unwrap(), 6);
        assert_eq!(storage.count().unwrap(), 4);
        assert_eq!(storage.get_recent(1).unwrap()[0].md5, "m9");
        assert_eq!(storage.prune_keep_recent(10).unwrap(), 0);
    }

    #[test]
    fn test_stats_empty() {
        let stats = create_test_storage().stats().unwrap();
        assert_eq!(stats.total_snapshots, 0);
        assert_eq!(stats.cameras, 0);
        assert!(stats.oldest_snapshot.is_none());
        assert!(stats.newest_snapshot.is_none());
    }

    #[test]
    fn test_stats_with_data() {
        let storage = create_test_storage();
        storage
            .insert(&snapshot(1001, "a", "2022-12-13T10:00:00+08:00"))
            .unwrap();
        storage
            .insert(&snapshot(1001, "b", "2022-12-13T12:00:00+08:00"))
            .unwrap();
        storage
            .insert(&snapshot(2701, "c", "2022-12-13T11:00:00+08:00"))
            .unwrap();

        let stats = storage.stats().unwrap();
        assert_eq!(stats.total_snapshots, 3);
        assert_eq!(stats.cameras, 2);
        assert_eq!(
            stats.oldest_snapshot.unwrap().to_rfc3339(),
            "2022-12-13T02:00:00+00:00"
        );
        assert_eq!(
            stats.newest_snapshot.unwrap().to_rfc3339(),
            "2022-12-13T04:00:00+00:00"
        );
    }

    #[test]
    fn test_content_hash_persists() {
        let storage = create_test_storage();
        let mut snap = snapshot(1001, "a", "2022-12-13T10:00:00+08:00");
        snap.content_hash = Some("abc123".to_string());

        let id = storage.insert(&snap).unwrap().unwrap();
        assert_eq!(
            storage.get(id).unwrap().unwrap().content_hash.as_deref(),
            Some("abc123")
        );
    }

    #[test]
    fn test_path() {
        let storage = create_test_storage();
        assert_eq!(storage.path().to_string_lossy(), ":memory:");
    }

    #[test]
    fn test_open_file_based_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("nested").join("snapshots.db");

        let storage = Storage::open(&db_path).unwrap();
        storage
            .insert(&snapshot(1001, "a", "2022-12-13T10:00:00+08:00"))
            .unwrap();

        assert!(db_path.exists());
        assert_eq!(storage.path(), db_path);
        assert!(storage.stats().unwrap().db_size_bytes > 0);
    }

    #[test]
    fn test_reopen_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("snapshots.db");

        {
            let storage = Storage::open(&db_path).unwrap();
            storage
                .insert(&snapshot(1001, "a", "2022-12-13T10:00:00+08:00"))
                .unwrap();
        }

        let storage = Storage::open(&db_path).unwrap();
        assert_eq!(storage.count().unwrap(), 1);
    }
}
