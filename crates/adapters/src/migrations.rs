pub const MIGRATIONS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS media (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        relative_path TEXT NOT NULL,
        display_name TEXT NOT NULL,
        size INTEGER,
        mime_type TEXT NOT NULL,
        width INTEGER,
        height INTEGER,
        date_added INTEGER NOT NULL,
        date_modified INTEGER NOT NULL,
        is_pending INTEGER NOT NULL DEFAULT 0,
        owner_package TEXT,
        UNIQUE (relative_path, display_name)
    );",
    "CREATE TABLE IF NOT EXISTS write_grants (
        media_id INTEGER NOT NULL REFERENCES media(id) ON DELETE CASCADE,
        package TEXT NOT NULL,
        UNIQUE (media_id, package)
    );",
    "CREATE INDEX IF NOT EXISTS idx_media_date_modified ON media (date_modified DESC);",
];
