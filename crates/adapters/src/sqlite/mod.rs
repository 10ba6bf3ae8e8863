mod queries;

use std::fs;
use std::path::PathBuf;

use memeify_application::{Clock, IndexError, MediaIndex, MediaRow, NewMediaEntry, StoragePolicy};
use memeify_domain::{CompressFormat, ConsentHandle, ImageId, MediaLocation};
use rusqlite::Connection;

use crate::fs::SystemClock;
use crate::migrations::MIGRATIONS;

const DB_FILE: &str = "media.sqlite3";
const PICTURES_DIR: &str = "Pictures";

/// Media index backed by sqlite plus a storage-root directory holding the
/// actual files. Plays the part of the platform index: projection queries,
/// the pending flag, per-item write authorization with optional
/// interactive recovery, and the legacy direct-write/rescan path.
#[derive(Debug, Clone)]
pub struct SqliteMediaIndex {
    storage_root: PathBuf,
    db_path: PathBuf,
    package: String,
    policy: StoragePolicy,
}

impl SqliteMediaIndex {
    pub fn new(storage_root: PathBuf, package: String, policy: StoragePolicy) -> Self {
        let db_path = storage_root.join(DB_FILE);
        Self {
            storage_root,
            db_path,
            package,
            policy,
        }
    }

    /// App-named subdirectory of the public pictures collection, relative
    /// to the storage root.
    pub fn pictures_dir(&self) -> String {
        format!("{PICTURES_DIR}/{}", self.package)
    }

    /// Records user consent for one entry. This is what the platform's
    /// consent dialog does on "allow"; the interactive broker calls it
    /// before reporting the grant.
    pub fn grant_write(&self, handle: ConsentHandle) -> Result<(), IndexError> {
        let conn = self.open_connection()?;
        queries::insert_grant(&conn, handle.value(), &self.package).map_err(storage_error)
    }

    fn open_connection(&self) -> Result<Connection, IndexError> {
        Connection::open(&self.db_path).map_err(storage_error)
    }

    fn absolute_path(&self, relative_path: &str, display_name: &str) -> PathBuf {
        self.storage_root.join(relative_path).join(display_name)
    }

    fn ensure_writable(&self, conn: &Connection, id: i64) -> Result<(), IndexError> {
        let recovery_supported = match self.policy {
            StoragePolicy::Legacy => return Ok(()),
            StoragePolicy::Scoped { recovery_supported } => recovery_supported,
        };

        let owner = queries::owner_of(conn, id)
            .map_err(storage_error)?
            .ok_or_else(|| IndexError::Storage(format!("no media entry with id {id}")))?;

        if owner.as_deref() == Some(self.package.as_str()) {
            return Ok(());
        }
        if queries::has_grant(conn, id, &self.package).map_err(storage_error)? {
            return Ok(());
        }

        Err(IndexError::Denied {
            handle: recovery_supported.then(|| ConsentHandle::new(id)),
        })
    }
}

impl MediaIndex for SqliteMediaIndex {
    fn initialize(&self) -> Result<(), IndexError> {
        if self.storage_root.as_os_str().is_empty() {
            return Err(IndexError::Storage(
                "storage root must not be empty".to_string(),
            ));
        }
        fs::create_dir_all(&self.storage_root).map_err(io_error)?;

        let conn = self.open_connection()?;
        conn.execute_batch("PRAGMA foreign_keys=ON; PRAGMA journal_mode=WAL;")
            .map_err(storage_error)?;
        for migration in MIGRATIONS {
            conn.execute_batch(migration).map_err(storage_error)?;
        }
        Ok(())
    }

    fn policy(&self) -> StoragePolicy {
        self.policy
    }

    fn query_images(&self) -> Result<Vec<MediaRow>, IndexError> {
        let conn = self.open_connection()?;
        queries::list_visible(&conn).map_err(storage_error)
    }

    fn insert_pending(&self, entry: &NewMediaEntry) -> Result<MediaLocation, IndexError> {
        let conn = self.open_connection()?;
        let id = queries::insert_pending(&conn, entry, &self.package).map_err(storage_error)?;
        let id = ImageId::new(id).map_err(|error| IndexError::Storage(error.to_string()))?;

        Ok(MediaLocation {
            id,
            relative_path: entry.relative_path.clone(),
            display_name: entry.display_name.clone(),
        })
    }

    fn write_entry(&self, location: &MediaLocation, bytes: &[u8]) -> Result<(), IndexError> {
        let conn = self.open_connection()?;
        self.ensure_writable(&conn, location.id.get())?;

        let path = self.absolute_path(&location.relative_path, &location.display_name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        fs::write(&path, bytes).map_err(io_error)?;

        queries::set_size_and_modified(
            &conn,
            location.id.get(),
            bytes.len() as i64,
            SystemClock.now_millis(),
        )
        .map_err(storage_error)
    }

    fn finalize_entry(&self, location: &MediaLocation, size: u64) -> Result<(), IndexError> {
        let conn = self.open_connection()?;
        queries::clear_pending(&conn, location.id.get(), size as i64).map_err(storage_error)
    }

    fn delete_entry(&self, id: ImageId) -> Result<(), IndexError> {
        let conn = self.open_connection()?;
        self.ensure_writable(&conn, id.get())?;

        if let Some((relative_path, display_name)) =
            queries::entry_path(&conn, id.get()).map_err(storage_error)?
        {
            let path = self.absolute_path(&relative_path, &display_name);
            if path.exists() {
                fs::remove_file(&path).map_err(io_error)?;
            } else {
                log::warn!("backing file already missing: {}", path.display());
            }
        }

        let deleted = queries::delete_row(&conn, id.get()).map_err(storage_error)?;
        if deleted == 0 {
            return Err(IndexError::Storage(format!(
                "no media entry with id {}",
                id.get()
            )));
        }
        Ok(())
    }

    fn write_direct(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, IndexError> {
        let relative_path = self.pictures_dir();
        let path = self.absolute_path(&relative_path, file_name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        fs::write(&path, bytes).map_err(io_error)?;

        // Re-index the single written file, like a media-scanner broadcast.
        let mime_type = CompressFormat::from_path(&path).mime_type();
        let conn = self.open_connection()?;
        queries::upsert_scanned(
            &conn,
            &relative_path,
            file_name,
            mime_type,
            bytes.len() as i64,
            SystemClock.now_millis(),
        )
        .map_err(storage_error)?;

        Ok(path)
    }
}

fn storage_error(error: rusqlite::Error) -> IndexError {
    IndexError::Storage(error.to_string())
}

fn io_error(error: std::io::Error) -> IndexError {
    IndexError::Io(error.to_string())
}
