//! Metadata schema migrations.
//!
//! Applied versions are recorded in `_migrations` together with a short
//! description, so an operator can see which schema a cache database holds.

use tokio_rusqlite::{Connection, params, rusqlite};

use super::Error;

struct Migration {
    version: i64,
    description: &'static str,
    sql: &'static str,
}

/// Ordered by version. Each migration runs in its own transaction.
const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    description: "tracked calendar urls per document",
    sql: include_str!("../../migrations/001_tracked_resources.sql"),
}];

fn apply_pending(conn: &mut rusqlite::Connection) -> Result<usize, Error> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            applied_at TEXT NOT NULL
        )",
    )?;

    let current: i64 = conn.query_row("SELECT COALESCE(MAX(version), 0) FROM _migrations", [], |row| row.get(0))?;

    let mut applied = 0;
    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        let tx = conn.transaction()?;
        tx.execute_batch(migration.sql)
            .map_err(|e| Error::MigrationFailed(format!("version {}: {e}", migration.version)))?;
        tx.execute(
            "INSERT INTO _migrations (version, description, applied_at) VALUES (?1, ?2, ?3)",
            params![migration.version, migration.description, chrono::Utc::now().to_rfc3339()],
        )?;
        tx.commit()?;

        tracing::debug!(version = migration.version, description = migration.description, "migration applied");
        applied += 1;
    }

    Ok(applied)
}

/// Bring the metadata schema up to the latest version.
///
/// Returns how many migrations were applied; zero when already current.
pub async fn run(conn: &Connection) -> Result<usize, Error> {
    conn.call(|conn| -> Result<usize, Error> { apply_pending(conn) })
        .await
        .map_err(Error::from)
}
