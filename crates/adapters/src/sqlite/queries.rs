use memeify_application::{MediaRow, NewMediaEntry};
use rusqlite::{params, Connection, OptionalExtension, Result};

pub fn list_visible(conn: &Connection) -> Result<Vec<MediaRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, relative_path, display_name, size, mime_type, width, height, date_modified
         FROM media
         WHERE is_pending = 0
         ORDER BY date_modified DESC, id DESC",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok(MediaRow {
            id: row.get(0)?,
            relative_path: row.get(1)?,
            display_name: row.get(2)?,
            size: row.get(3)?,
            mime_type: row.get(4)?,
            width: row.get(5)?,
            height: row.get(6)?,
            date_modified: row.get(7)?,
        })
    })?;

    rows.collect()
}

pub fn insert_pending(conn: &Connection, entry: &NewMediaEntry, owner: &str) -> Result<i64> {
    conn.execute(
        "INSERT INTO media
         (relative_path, display_name, size, mime_type, width, height,
          date_added, date_modified, is_pending, owner_package)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 1, ?9)",
        params![
            entry.relative_path,
            entry.display_name,
            entry.size as i64,
            entry.mime_type,
            entry.width,
            entry.height,
            entry.date_added,
            entry.date_modified,
            owner,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn set_size_and_modified(conn: &Connection, id: i64, size: i64, modified: i64) -> Result<()> {
    conn.execute(
        "UPDATE media SET size = ?2, date_modified = ?3 WHERE id = ?1",
        params![id, size, modified],
    )?;
    Ok(())
}

pub fn clear_pending(conn: &Connection, id: i64, size: i64) -> Result<()> {
    conn.execute(
        "UPDATE media SET is_pending = 0, size = ?2 WHERE id = ?1",
        params![id, size],
    )?;
    Ok(())
}

/// Owner of an entry: `None` when the row does not exist, `Some(None)` for
/// scanner-owned rows with no package.
pub fn owner_of(conn: &Connection, id: i64) -> Result<Option<Option<String>>> {
    conn.query_row(
        "SELECT owner_package FROM media WHERE id = ?1",
        params![id],
        |row| row.get(0),
    )
    .optional()
}

pub fn has_grant(conn: &Connection, id: i64, package: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM write_grants WHERE media_id = ?1 AND package = ?2",
        params![id, package],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub fn insert_grant(conn: &Connection, id: i64, package: &str) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO write_grants (media_id, package) VALUES (?1, ?2)",
        params![id, package],
    )?;
    Ok(())
}

pub fn entry_path(conn: &Connection, id: i64) -> Result<Option<(String, String)>> {
    conn.query_row(
        "SELECT relative_path, display_name FROM media WHERE id = ?1",
        params![id],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )
    .optional()
}

pub fn delete_row(conn: &Connection, id: i64) -> Result<usize> {
    conn.execute("DELETE FROM media WHERE id = ?1", params![id])
}

/// Index a file found on disk, the single-file rescan behind legacy saves.
pub fn upsert_scanned(
    conn: &Connection,
    relative_path: &str,
    display_name: &str,
    mime_type: &str,
    size: i64,
    modified: i64,
) -> Result<()> {
    conn.execute(
        "INSERT INTO media
         (relative_path, display_name, size, mime_type, date_added, date_modified, is_pending)
         VALUES (?1, ?2, ?3, ?4, ?5, ?5, 0)
         ON CONFLICT (relative_path, display_name) DO UPDATE SET
            size = excluded.size,
            mime_type = excluded.mime_type,
            date_modified = excluded.date_modified",
        params![relative_path, display_name, size, mime_type, modified],
    )?;
    Ok(())
}
