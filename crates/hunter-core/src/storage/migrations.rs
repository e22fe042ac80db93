//! Database schema migrations.
//!
//! Migrations are versioned and applied automatically when opening the database.
//! The `schema_version` table tracks the current migration version.

use rusqlite::{Connection, Result as SqliteResult};

/// Current schema version.
pub const SCHEMA_VERSION: i32 = 2;

/// Apply all pending migrations to bring the database to the current schema version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = get_schema_version(conn);

    if current_version < 1 {
        migrate_v1(conn)?;
    }
    if current_version < 2 {
        migrate_v2(conn)?;
    }

    Ok(())
}

fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Returns 0 if no version is set (fresh database).
pub fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row("SELECT version FROM schema_version", [], |row| {
        row.get::<_, i32>(0)
    })
    .unwrap_or_else(|e| {
        if !matches!(e, rusqlite::Error::QueryReturnedNoRows) {
            tracing::warn!("failed to read schema_version: {e}");
        }
        0
    })
}

fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

/// Migration v1: users, quest batches, quests, kv.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS users (
            id              TEXT PRIMARY KEY,
            email           TEXT NOT NULL UNIQUE,
            name            TEXT NOT NULL DEFAULT '',
            age             INTEGER NOT NULL DEFAULT 0,
            height_cm       REAL NOT NULL DEFAULT 0,
            weight_kg       REAL NOT NULL DEFAULT 0,
            activity        TEXT NOT NULL DEFAULT '',
            password_salt   TEXT NOT NULL,
            password_digest TEXT NOT NULL,
            strength        INTEGER NOT NULL DEFAULT 0,
            stamina         INTEGER NOT NULL DEFAULT 0,
            agility         INTEGER NOT NULL DEFAULT 0,
            points          INTEGER NOT NULL DEFAULT 0,
            xp              INTEGER NOT NULL DEFAULT 0,
            level           INTEGER NOT NULL DEFAULT 1,
            achievements    TEXT NOT NULL DEFAULT '[]',
            created_at      TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS quest_batches (
            id          TEXT PRIMARY KEY,
            owner_id    TEXT NOT NULL REFERENCES users(id),
            date        TEXT NOT NULL,
            start_time  TEXT NOT NULL,
            penalized   INTEGER NOT NULL DEFAULT 0,
            UNIQUE (owner_id, date)
        );

        CREATE TABLE IF NOT EXISTS quests (
            id          TEXT PRIMARY KEY,
            owner_id    TEXT NOT NULL REFERENCES users(id),
            batch_id    TEXT NOT NULL REFERENCES quest_batches(id),
            position    INTEGER NOT NULL,
            title       TEXT NOT NULL,
            completed   INTEGER NOT NULL DEFAULT 0,
            date        TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS kv (
            key   TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_quests_owner_date ON quests(owner_id, date);
        CREATE INDEX IF NOT EXISTS idx_quests_batch ON quests(batch_id);
        CREATE INDEX IF NOT EXISTS idx_users_xp ON users(xp);",
    )?;
    set_schema_version(&tx, 1)?;
    tx.commit()
}

/// Migration v2: body evaluations and re-evaluation levels.
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS evaluations (
            id          TEXT PRIMARY KEY,
            owner_id    TEXT NOT NULL REFERENCES users(id),
            height_cm   REAL NOT NULL,
            weight_kg   REAL NOT NULL,
            recorded_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_evaluations_owner ON evaluations(owner_id, recorded_at);

        ALTER TABLE users ADD COLUMN strength_level TEXT;
        ALTER TABLE users ADD COLUMN endurance_level TEXT;
        ALTER TABLE users ADD COLUMN reevaluated_at TEXT;",
    )?;
    set_schema_version(&tx, 2)?;
    tx.commit()
}
