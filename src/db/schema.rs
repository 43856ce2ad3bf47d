//! Catalog schema bootstrap
//!
//! Identifiers are stored as lowercase hyphenated UUID text. The gateway only
//! reads these tables; they are created here so a fresh database file is
//! usable and so tests can seed fixtures.

use rusqlite::{Connection, OptionalExtension};
use tracing::info;

use crate::types::GateError;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

const CATALOG_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS projects (
    id TEXT PRIMARY KEY NOT NULL,
    org_id TEXT
);

CREATE TABLE IF NOT EXISTS document_types (
    id TEXT PRIMARY KEY NOT NULL,
    code TEXT,
    name TEXT,
    is_active INTEGER NOT NULL DEFAULT 1,
    "order" INTEGER,
    sort_order INTEGER,
    scope TEXT,
    org_id TEXT
);

CREATE INDEX IF NOT EXISTS idx_document_types_org ON document_types(org_id);
"#;

/// Create missing tables and record the schema version
pub fn init_schema(conn: &Connection) -> Result<(), GateError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)",
        [],
    )
    .map_err(|e| GateError::Database(format!("Failed to create schema_version table: {e}")))?;

    let current: i32 = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| row.get(0))
        .optional()
        .map_err(|e| GateError::Database(format!("Failed to read schema_version: {e}")))?
        .unwrap_or(0);

    conn.execute_batch(CATALOG_SCHEMA)
        .map_err(|e| GateError::Database(format!("Failed to create catalog tables: {e}")))?;

    if current < SCHEMA_VERSION {
        info!("Catalog schema initialized at v{}", SCHEMA_VERSION);
        conn.execute("DELETE FROM schema_version", [])?;
        conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [SCHEMA_VERSION])?;
    }

    Ok(())
}
