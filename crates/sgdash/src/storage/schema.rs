//! `SQLite` schema definitions for sgdash.

/// SQL statement to create the camera snapshots table.
///
/// `captured_at` and `fetched_at` hold UTC RFC 3339 text so that string
/// order is time order.
pub const CREATE_SNAPSHOTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS camera_snapshots (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    camera_id INTEGER NOT NULL,
    captured_at TEXT NOT NULL,
    image_url TEXT NOT NULL,
    md5 TEXT NOT NULL,
    width INTEGER NOT NULL,
    height INTEGER NOT NULL,
    fetched_at TEXT NOT NULL,
    description TEXT,
    content_hash TEXT
)
";

/// One row per camera image.
pub const CREATE_IMAGE_UNIQUE_INDEX: &str = r"
CREATE UNIQUE INDEX IF NOT EXISTS idx_snapshots_camera_md5 ON camera_snapshots(camera_id, md5)
";

/// SQL statement to create an index on capture time for recency queries.
pub const CREATE_CAPTURED_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_snapshots_captured ON camera_snapshots(captured_at DESC)
";

/// SQL statement to create an index for per-camera history.
pub const CREATE_CAMERA_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_snapshots_camera ON camera_snapshots(camera_id, captured_at DESC)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_SNAPSHOTS_TABLE,
    CREATE_IMAGE_UNIQUE_INDEX,
    CREATE_CAPTURED_INDEX,
    CREATE_CAMERA_INDEX,
    CREATE_METADATA_TABLE,
];
