//! SQLite catalog backend for persistent storage.

use super::{CatalogBackend, CatalogEntry, CatalogStats, NewCatalogEntry, PhotoId, Visibility};
use crate::core::scanner::MediaType;
use crate::error::CatalogError;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// SQLite-backed catalog
///
/// Uses WAL (Write-Ahead Logging) mode so a reader such as `photostat stats`
/// can run while an import is writing.
pub struct SqliteCatalog {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl SqliteCatalog {
    /// Open or create a catalog database at the given path
    pub fn open(path: &Path) -> Result<Self, CatalogError> {
        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CatalogError::OpenFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        }

        let conn = Connection::open(path).map_err(|e| CatalogError::OpenFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Self::init(conn, path.to_path_buf())
    }

    /// Open a private in-memory database, mostly for tests
    pub fn open_in_memory() -> Result<Self, CatalogError> {
        let conn = Connection::open_in_memory().map_err(|e| CatalogError::OpenFailed {
            path: PathBuf::from(":memory:"),
            reason: e.to_string(),
        })?;

        Self::init(conn, PathBuf::from(":memory:"))
    }

    fn init(conn: Connection, db_path: PathBuf) -> Result<Self, CatalogError> {
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA foreign_keys=ON;

             CREATE TABLE IF NOT EXISTS photos (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                uid TEXT NOT NULL UNIQUE,
                type TEXT NOT NULL,
                local_path TEXT NOT NULL,
                visibility TEXT NOT NULL,
                upload_flag INTEGER NOT NULL DEFAULT 0,
                orig_path TEXT,
                orig_name TEXT,
                created_at INTEGER NOT NULL
             );

             CREATE TABLE IF NOT EXISTS tags (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                photo_id INTEGER NOT NULL REFERENCES photos(id),
                UNIQUE (name, photo_id)
             );

             CREATE INDEX IF NOT EXISTS idx_tags_photo ON tags(photo_id);",
        )
        .map_err(|e| CatalogError::QueryFailed(e.to_string()))?;

        Ok(Self {
            conn: Mutex::new(conn),
            db_path,
        })
    }

    /// Path of the database file
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, CatalogError> {
        self.conn.lock().map_err(|_| CatalogError::Poisoned {
            path: self.db_path.clone(),
        })
    }
}

/// Raw column values of a `photos` row, decoded after the query returns
struct PhotoRow {
    id: i64,
    uid: String,
    media_type: String,
    local_path: String,
    visibility: String,
    upload_flag: bool,
    orig_path: Option<String>,
    orig_name: Option<String>,
    created_at: i64,
}

impl PhotoRow {
    fn into_entry(self) -> Result<CatalogEntry, CatalogError> {
        let media_type: MediaType = self.media_type.parse()?;
        let visibility: Visibility =
            self.visibility
                .parse()
                .map_err(|_| CatalogError::InvalidRow {
                    field: "visibility",
                    value: self.visibility.clone(),
                })?;
        let created_at: DateTime<Utc> = DateTime::from_timestamp(self.created_at, 0)
            .ok_or_else(|| CatalogError::InvalidRow {
                field: "created_at",
                value: self.created_at.to_string(),
            })?;

        Ok(CatalogEntry {
            id: PhotoId(self.id),
            uid: self.uid,
            media_type,
            local_path: self.local_path,
            visibility,
            original_path: self.orig_path,
            original_name: self.orig_name,
            created_at,
            upload_flag: self.upload_flag,
        })
    }
}

impl CatalogBackend for SqliteCatalog {
    fn find_by_uid(&self, uid: &str) -> Result<Option<PhotoId>, CatalogError> {
        let conn = self.lock()?;

        let result = conn.query_row("SELECT id FROM photos WHERE uid = ?", [uid], |row| {
            row.get::<_, i64>(0)
        });

        match result {
            Ok(id) => Ok(Some(PhotoId(id))),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(CatalogError::QueryFailed(e.to_string())),
        }
    }

    fn insert(&self, entry: &NewCatalogEntry) -> Result<PhotoId, CatalogError> {
        let conn = self.lock()?;

        conn.execute(
            "INSERT INTO photos
             (uid, type, local_path, visibility, upload_flag, orig_path, orig_name, created_at)
             VALUES (?, ?, ?, ?, 0, ?, ?, ?)",
            params![
                entry.uid,
                entry.media_type.as_str(),
                entry.local_path,
                entry.visibility.as_str(),
                entry.original_path,
                entry.original_name,
                entry.created_at.timestamp(),
            ],
        )
        .map_err(|e| CatalogError::QueryFailed(e.to_string()))?;

        Ok(PhotoId(conn.last_insert_rowid()))
    }

    fn tag_exists(&self, name: &str, photo_id: PhotoId) -> Result<bool, CatalogError> {
        let conn = self.lock()?;

        conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM tags WHERE name = ? AND photo_id = ?)",
            params![name, photo_id.0],
            |row| row.get::<_, bool>(0),
        )
        .map_err(|e| CatalogError::QueryFailed(e.to_string()))
    }

    fn insert_tag(&self, name: &str, photo_id: PhotoId) -> Result<(), CatalogError> {
        let conn = self.lock()?;

        conn.execute(
            "INSERT OR IGNORE INTO tags (name, photo_id) VALUES (?, ?)",
            params![name, photo_id.0],
        )
        .map_err(|e| CatalogError::QueryFailed(e.to_string()))?;

        Ok(())
    }

    fn get(&self, photo_id: PhotoId) -> Result<Option<CatalogEntry>, CatalogError> {
        let conn = self.lock()?;

        let result = conn.query_row(
            "SELECT id, uid, type, local_path, visibility, upload_flag,
                    orig_path, orig_name, created_at
             FROM photos WHERE id = ?",
            [photo_id.0],
            |row| {
                Ok(PhotoRow {
                    id: row.get(0)?,
                    uid: row.get(1)?,
                    media_type: row.get(2)?,
                    local_path: row.get(3)?,
                    visibility: row.get(4)?,
                    upload_flag: row.get(5)?,
                    orig_path: row.get(6)?,
                    orig_name: row.get(7)?,
                    created_at: row.get(8)?,
                })
            },
        );

        match result {
            Ok(row) => row.into_entry().map(Some),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(CatalogError::QueryFailed(e.to_string())),
        }
    }

    fn tags_for(&self, photo_id: PhotoId) -> Result<Vec<String>, CatalogError> {
        let conn = self.lock()?;

        let mut stmt = conn
            .prepare("SELECT name FROM tags WHERE photo_id = ? ORDER BY name")
            .map_err(|e| CatalogError::QueryFailed(e.to_string()))?;

        let names = stmt
            .query_map([photo_id.0], |row| row.get::<_, String>(0))
            .map_err(|e| CatalogError::QueryFailed(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| CatalogError::QueryFailed(e.to_string()))?;

        Ok(names)
    }

    fn stats(&self) -> Result<CatalogStats, CatalogError> {
        let conn = self.lock()?;

        let count = |sql: &str| -> Result<usize, CatalogError> {
            conn.query_row(sql, [], |row| row.get::<_, i64>(0).map(|v| v as usize))
                .map_err(|e| CatalogError::QueryFailed(e.to_string()))
        };

        Ok(CatalogStats {
            total_entries: count("SELECT COUNT(*) FROM photos")?,
            total_tags: count("SELECT COUNT(*) FROM tags")?,
            distinct_tags: count("SELECT COUNT(DISTINCT name) FROM tags")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::tests::new_entry;
    use tempfile::TempDir;

    #[test]
    fn sqlite_catalog_creates_database() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("nested").join("catalog.db");

        let catalog = SqliteCatalog::open(&db_path).unwrap();

        assert!(db_path.exists());
        assert_eq!(catalog.stats().unwrap(), CatalogStats::default());
    }

    #[test]
    fn sqlite_catalog_stores_and_retrieves() {
        let catalog = SqliteCatalog::open_in_memory().unwrap();
        let new = new_entry("20230501100000-abc123.jpg");

        let id = catalog.insert(&new).unwrap();

        assert_eq!(catalog.find_by_uid(&new.uid).unwrap(), Some(id));
        let stored = catalog.get(id).unwrap().unwrap();
        assert_eq!(stored.uid, new.uid);
        assert_eq!(stored.media_type, MediaType::Jpg);
        assert_eq!(stored.visibility, Visibility::Private);
        assert_eq!(stored.original_path.as_deref(), Some("holiday/day1"));
        assert_eq!(stored.created_at, new.created_at);
        assert!(!stored.upload_flag);
    }

    #[test]
    fn sqlite_catalog_rejects_duplicate_uid() {
        let catalog = SqliteCatalog::open_in_memory().unwrap();
        catalog.insert(&new_entry("a.jpg")).unwrap();

        assert!(catalog.insert(&new_entry("a.jpg")).is_err());
        assert_eq!(catalog.stats().unwrap().total_entries, 1);
    }

    #[test]
    fn duplicate_tag_is_ignored() {
        let catalog = SqliteCatalog::open_in_memory().unwrap();
        let id = catalog.insert(&new_entry("a.jpg")).unwrap();

        assert!(!catalog.tag_exists("holiday", id).unwrap());
        catalog.insert_tag("holiday", id).unwrap();
        catalog.insert_tag("holiday", id).unwrap();
        assert!(catalog.tag_exists("holiday", id).unwrap());

        assert_eq!(catalog.tags_for(id).unwrap(), vec!["holiday"]);
    }

    #[test]
    fn catalog_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("catalog.db");

        let id = {
            let catalog = SqliteCatalog::open(&db_path).unwrap();
            let id = catalog.insert(&new_entry("a.jpg")).unwrap();
            catalog.insert_tag("family", id).unwrap();
            id
        };

        let catalog = SqliteCatalog::open(&db_path).unwrap();
        assert_eq!(catalog.find_by_uid("a.jpg").unwrap(), Some(id));
        assert_eq!(catalog.tags_for(id).unwrap(), vec!["family"]);
    }

    #[test]
    fn missing_entry_returns_none() {
        let catalog = SqliteCatalog::open_in_memory().unwrap();
        assert!(catalog.get(PhotoId(42)).unwrap().is_none());
    }
}
