//! Database connection and schema setup.

use std::path::Path;

use safeguard_database_models::StoreError;
use switchy_database::Database;
use switchy_database_connection::init_sqlite_rusqlite;

/// Default location of the `SQLite` database file.
pub const DEFAULT_DB_PATH: &str = "data/safeguard.db";

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id            TEXT PRIMARY KEY,
        email         TEXT NOT NULL UNIQUE,
        display_name  TEXT,
        created_at    TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS sessions (
        id          TEXT PRIMARY KEY,
        user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        created_at  TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS emergency_contacts (
        id            TEXT PRIMARY KEY,
        user_id       TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        name          TEXT NOT NULL,
        phone_number  TEXT NOT NULL,
        created_at    TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_contacts_user
     ON emergency_contacts (user_id, created_at)",
    "CREATE TABLE IF NOT EXISTS sos_events (
        id          TEXT PRIMARY KEY,
        user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        latitude    REAL NOT NULL,
        longitude   REAL NOT NULL,
        address     TEXT,
        created_at  TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_sos_events_user
     ON sos_events (user_id, created_at)",
    "CREATE TABLE IF NOT EXISTS crime_data (
        id           TEXT PRIMARY KEY,
        latitude     REAL NOT NULL,
        longitude    REAL NOT NULL,
        crime_type   TEXT NOT NULL,
        severity     INTEGER NOT NULL CHECK (severity BETWEEN 1 AND 5),
        description  TEXT,
        reported_at  TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_crime_data_location
     ON crime_data (latitude, longitude)",
];

/// Opens (or creates) the `SQLite` database at `path` and ensures the
/// schema exists.
///
/// # Errors
///
/// Returns [`StoreError`] if the parent directory cannot be created, the
/// database cannot be opened, or schema creation fails.
pub async fn open_db(path: &Path) -> Result<Box<dyn Database>, StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            StoreError::Database(format!("Failed to create {}: {e}", parent.display()))
        })?;
    }

    let db = init_sqlite_rusqlite(Some(path)).map_err(|e| StoreError::Database(e.to_string()))?;

    ensure_schema(db.as_ref()).await?;

    Ok(db)
}

/// Creates all tables and indexes if they don't already exist.
async fn ensure_schema(db: &dyn Database) -> Result<(), StoreError> {
    // SQLite has foreign keys off by default
    db.exec_raw("PRAGMA foreign_keys = ON")
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

    for statement in SCHEMA {
        db.exec_raw(statement)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;
    }

    log::debug!("Database schema ready");
    Ok(())
}
