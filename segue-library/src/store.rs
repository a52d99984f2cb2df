//! SQLite store of track analyses
//!
//! Keeps full feature sets across sessions so the engine's in-memory
//! cache can be warmed without decoding and analyzing every track again.

use rusqlite::{params, Connection, OptionalExtension, Row};
use segue_analysis::TrackAnalysis;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid stored features: {0}")]
    Features(#[from] serde_json::Error),
}

/// One persisted analysis
#[derive(Debug, Clone, PartialEq)]
pub struct StoredAnalysis {
    pub track_id: String,
    /// File size in bytes when analyzed, 0 if unknown
    pub file_size: u64,
    /// File modification time as Unix seconds, 0 if unknown
    pub modified_time: u64,
    pub duration_secs: f64,
    pub title: String,
    pub artist: String,
    pub features: TrackAnalysis,
    /// Unix seconds
    pub analyzed_at: u64,
}

impl StoredAnalysis {
    /// Stamp a fresh analysis with the current time
    pub fn new(track_id: &str, features: TrackAnalysis, duration_secs: f64) -> Self {
        Self {
            track_id: track_id.to_string(),
            file_size: 0,
            modified_time: 0,
            duration_secs,
            title: String::new(),
            artist: String::new(),
            features,
            analyzed_at: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
        }
    }

    /// Record size and modification time of the analyzed file
    pub fn with_fingerprint(mut self, path: &Path) -> Self {
        if let Some((size, modified)) = file_fingerprint(path) {
            self.file_size = size;
            self.modified_time = modified;
        }
        self
    }

    pub fn analyzed_at_time(&self) -> SystemTime {
        UNIX_EPOCH + std::time::Duration::from_secs(self.analyzed_at)
    }
}

/// Size and modification time (Unix seconds) of a file
pub fn file_fingerprint(path: &Path) -> Option<(u64, u64)> {
    let meta = std::fs::metadata(path).ok()?;
    let modified = meta
        .modified()
        .ok()?
        .duration_since(UNIX_EPOCH)
        .ok()?
        .as_secs();
    Some((meta.len(), modified))
}

pub struct AnalysisStore {
    conn: Connection,
}

impl AnalysisStore {
    const SCHEMA: &'static str = r#"
        CREATE TABLE IF NOT EXISTS analyses (
            id INTEGER PRIMARY KEY,
            track_id TEXT UNIQUE NOT NULL,
            file_size INTEGER NOT NULL,
            modified_time INTEGER NOT NULL,
            duration_secs REAL NOT NULL,
            title TEXT NOT NULL,
            artist TEXT NOT NULL,
            bpm REAL NOT NULL,
            camelot_key TEXT NOT NULL,
            features TEXT NOT NULL,
            analyzed_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_camelot ON analyses(camelot_key);
        CREATE INDEX IF NOT EXISTS idx_bpm ON analyses(bpm);
    "#;

    const COLUMNS: &'static str = "track_id, file_size, modified_time, duration_secs, \
                                   title, artist, features, analyzed_at";

    /// Open or create a store at the given path
    pub fn open(db_path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(db_path)?;
        conn.execute_batch(Self::SCHEMA)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing)
    #[cfg(test)]
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(Self::SCHEMA)?;
        Ok(Self { conn })
    }

    /// Insert or replace the analysis of `analysis.track_id`
    pub fn store(&self, analysis: &StoredAnalysis) -> Result<(), StoreError> {
        let features = serde_json::to_string(&analysis.features)?;
        self.conn.execute(
            r#"INSERT OR REPLACE INTO analyses
               (track_id, file_size, modified_time, duration_secs, title, artist,
                bpm, camelot_key, features, analyzed_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"#,
            params![
                analysis.track_id,
                analysis.file_size,
                analysis.modified_time,
                analysis.duration_secs,
                analysis.title,
                analysis.artist,
                analysis.features.bpm,
                analysis.features.camelot_key,
                features,
                analysis.analyzed_at,
            ],
        )?;
        Ok(())
    }

    pub fn get(&self, track_id: &str) -> Result<Option<StoredAnalysis>, StoreError> {
        let sql = format!("SELECT {} FROM analyses WHERE track_id = ?1", Self::COLUMNS);
        let row = self
            .conn
            .query_row(&sql, [track_id], RawRow::from_row)
            .optional()?;
        row.map(RawRow::into_analysis).transpose()
    }

    /// Stored analysis, unless the file changed since it was analyzed
    pub fn get_fresh(
        &self,
        track_id: &str,
        file_size: u64,
        modified_time: u64,
    ) -> Result<Option<StoredAnalysis>, StoreError> {
        Ok(self
            .get(track_id)?
            .filter(|a| a.file_size == file_size && a.modified_time == modified_time))
    }

    /// All analyses ordered by Camelot key, then BPM
    ///
    /// Rows whose features no longer parse are skipped with a warning.
    pub fn load_all(&self) -> Result<Vec<StoredAnalysis>, StoreError> {
        let sql = format!(
            "SELECT {} FROM analyses ORDER BY camelot_key ASC, bpm ASC",
            Self::COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], RawRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows
            .into_iter()
            .filter_map(|raw| {
                let track_id = raw.track_id.clone();
                match raw.into_analysis() {
                    Ok(a) => Some(a),
                    Err(e) => {
                        warn!(track_id = %track_id, error = %e, "Skipping unreadable stored analysis");
                        None
                    }
                }
            })
            .collect())
    }

    pub fn count(&self) -> Result<usize, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM analyses", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn remove(&self, track_id: &str) -> Result<bool, StoreError> {
        let affected = self
            .conn
            .execute("DELETE FROM analyses WHERE track_id = ?1", [track_id])?;
        Ok(affected > 0)
    }

    pub fn clear(&self) -> Result<(), StoreError> {
        self.conn.execute("DELETE FROM analyses", [])?;
        Ok(())
    }
}

/// Row as read, features still JSON
struct RawRow {
    track_id: String,
    file_size: u64,
    modified_time: u64,
    duration_secs: f64,
    title: String,
    artist: String,
    features: String,
    analyzed_at: u64,
}

impl RawRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            track_id: row.get(0)?,
            file_size: row.get(1)?,
            modified_time: row.get(2)?,
            duration_secs: row.get(3)?,
            title: row.get(4)?,
            artist: row.get(5)?,
            features: row.get(6)?,
            analyzed_at: row.get(7)?,
        })
    }

    fn into_analysis(self) -> Result<StoredAnalysis, StoreError> {
        Ok(StoredAnalysis {
            features: serde_json::from_str(&self.features)?,
            track_id: self.track_id,
            file_size: self.file_size,
            modified_time: self.modified_time,
            duration_secs: self.duration_secs,
            title: self.title,
            artist: self.artist,
            analyzed_at: self.analyzed_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn analysis(track_id: &str, bpm: f32, camelot: &str) -> StoredAnalysis {
        let features = TrackAnalysis {
            bpm,
            camelot_key: camelot.to_string(),
            ..TrackAnalysis::fallback()
        };
        StoredAnalysis {
            file_size: 1024000,
            modified_time: 1700000000,
            title: "Test Track".to_string(),
            artist: "Test Artist".to_string(),
            ..StoredAnalysis::new(track_id, features, 180.5)
        }
    }

    #[test]
    fn test_store_and_get() {
        let store = AnalysisStore::in_memory().unwrap();
        let original = analysis("/music/a.mp3", 128.0, "8A");
        store.store(&original).unwrap();

        let retrieved = store.get("/music/a.mp3").unwrap().unwrap();
        assert_eq!(retrieved, original);
        assert!(store.get("/music/missing.mp3").unwrap().is_none());
    }

    #[test]
    fn test_get_fresh_checks_fingerprint() {
        let store = AnalysisStore::in_memory().unwrap();
        let a = analysis("a", 128.0, "8A");
        store.store(&a).unwrap();

        assert!(store.get_fresh("a", a.file_size, a.modified_time).unwrap().is_some());
        assert!(store.get_fresh("a", 999, a.modified_time).unwrap().is_none());
        assert!(store.get_fresh("a", a.file_size, 1800000000).unwrap().is_none());
    }

    #[test]
    fn test_load_all_sorted_by_key_then_bpm() {
        let store = AnalysisStore::in_memory().unwrap();
        store.store(&analysis("t1", 130.0, "8A")).unwrap();
        store.store(&analysis("t2", 125.0, "8A")).unwrap();
        store.store(&analysis("t3", 128.0, "7A")).unwrap();

        let ids: Vec<String> = store
            .load_all()
            .unwrap()
            .into_iter()
            .map(|a| a.track_id)
            .collect();
        assert_eq!(ids, vec!["t3", "t2", "t1"]);
    }

    #[test]
    fn test_load_all_skips_corrupt_rows() {
        let store = AnalysisStore::in_memory().unwrap();
        store.store(&analysis("good", 128.0, "8A")).unwrap();
        store.store(&analysis("bad", 128.0, "9A")).unwrap();
        store
            .conn
            .execute("UPDATE analyses SET features = 'oops' WHERE track_id = 'bad'", [])
            .unwrap();

        let all = store.load_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].track_id, "good");
        assert!(matches!(store.get("bad"), Err(StoreError::Features(_))));
    }

    #[test]
    fn test_update_existing() {
        let store = AnalysisStore::in_memory().unwrap();
        let mut a = analysis("a", 128.0, "8A");
        store.store(&a).unwrap();

        a.features.bpm = 140.0;
        store.store(&a).unwrap();

        assert_eq!(store.count().unwrap(), 1);
        assert_eq!(store.get("a").unwrap().unwrap().features.bpm, 140.0);
    }

    #[test]
    fn test_remove_and_clear() {
        let store = AnalysisStore::in_memory().unwrap();
        store.store(&analysis("a", 128.0, "8A")).unwrap();
        store.store(&analysis("b", 128.0, "8A")).unwrap();

        assert!(store.remove("a").unwrap());
        assert!(!store.remove("a").unwrap());
        assert_eq!(store.count().unwrap(), 1);

        store.clear().unwrap();
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("deep").join("analyses.db");
        {
            let store = AnalysisStore::open(&path).unwrap();
            store.store(&analysis("a", 128.0, "8A")).unwrap();
        }
        let reopened = AnalysisStore::open(&path).unwrap();
        assert_eq!(reopened.count().unwrap(), 1);
    }

    #[test]
    fn test_fingerprint() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("track.wav");
        std::fs::write(&path, [0u8; 128]).unwrap();

        let (size, modified) = file_fingerprint(&path).unwrap();
        assert_eq!(size, 128);
        assert!(modified > 0);
        assert!(file_fingerprint(&dir.path().join("missing")).is_none());

        let stored = StoredAnalysis::new("t", TrackAnalysis::fallback(), 1.0).with_fingerprint(&path);
        assert_eq!(stored.file_size, 128);
    }
}
