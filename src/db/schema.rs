// src/db/schema.rs

//! Archive database schema and migrations
//!
//! Control fields are stored as key/value metadata rows (keys lower-cased,
//! as the parser produces them) instead of fixed columns, so new fields
//! need no migration.

use crate::error::{Error, Result};
use rusqlite::Connection;
use tracing::{debug, info};

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// Initialize the schema version tracking table
fn init_schema_version(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;
    Ok(())
}

/// Get the current schema version from the database
pub fn get_schema_version(conn: &Connection) -> Result<i32> {
    init_schema_version(conn)?;

    let version = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |row| row.get(0),
        )?;

    Ok(version)
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

/// Apply all pending migrations to bring the database up to date
pub fn migrate(conn: &Connection) -> Result<()> {
    let current_version = get_schema_version(conn)?;
    debug!("Current schema version: {}", current_version);

    if current_version >= SCHEMA_VERSION {
        return Ok(());
    }

    for version in (current_version + 1)..=SCHEMA_VERSION {
        info!("Applying migration to version {}", version);
        apply_migration(conn, version)?;
        set_schema_version(conn, version)?;
    }

    Ok(())
}

fn apply_migration(conn: &Connection, version: i32) -> Result<()> {
    match version {
        1 => migrate_v1(conn),
        _ => Err(Error::Config(format!("unknown schema version {}", version))),
    }
}

/// Initial schema - Version 1
///
/// - architecture, component: lookup tables (`source` and `all` seeded)
/// - suite, suite_architectures: distributions and what they build for
/// - source, binaries (+ *_metadata): packages and their control fields
/// - src_associations, bin_associations: suite membership
/// - override: per-suite component assignments
fn migrate_v1(conn: &Connection) -> Result<()> {
    debug!("Creating schema version 1");

    conn.execute_batch(
        "
        CREATE TABLE architecture (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            arch_string TEXT NOT NULL UNIQUE
        );

        INSERT INTO architecture (arch_string) VALUES ('source'), ('all');

        CREATE TABLE component (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE
        );

        INSERT INTO component (name) VALUES ('main');

        CREATE TABLE suite (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            suite_name TEXT NOT NULL UNIQUE,
            codename TEXT,
            overridesuite TEXT
        );

        CREATE INDEX idx_suite_codename ON suite(codename);

        CREATE TABLE suite_architectures (
            suite INTEGER NOT NULL,
            architecture INTEGER NOT NULL,
            PRIMARY KEY (suite, architecture),
            FOREIGN KEY (suite) REFERENCES suite(id) ON DELETE CASCADE,
            FOREIGN KEY (architecture) REFERENCES architecture(id)
        );

        CREATE TABLE source (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            source TEXT NOT NULL,
            version TEXT NOT NULL,
            maintainer TEXT,
            UNIQUE(source, version)
        );

        CREATE TABLE source_metadata (
            src_id INTEGER NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            PRIMARY KEY (src_id, key),
            FOREIGN KEY (src_id) REFERENCES source(id) ON DELETE CASCADE
        );

        CREATE TABLE src_associations (
            suite INTEGER NOT NULL,
            source INTEGER NOT NULL,
            PRIMARY KEY (suite, source),
            FOREIGN KEY (suite) REFERENCES suite(id) ON DELETE CASCADE,
            FOREIGN KEY (source) REFERENCES source(id) ON DELETE CASCADE
        );

        CREATE TABLE binaries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            package TEXT NOT NULL,
            version TEXT NOT NULL,
            architecture INTEGER NOT NULL,
            source INTEGER NOT NULL,
            component INTEGER NOT NULL,
            UNIQUE(package, version, architecture),
            FOREIGN KEY (architecture) REFERENCES architecture(id),
            FOREIGN KEY (source) REFERENCES source(id),
            FOREIGN KEY (component) REFERENCES component(id)
        );

        CREATE INDEX idx_binaries_architecture ON binaries(architecture);

        CREATE TABLE binaries_metadata (
            bin_id INTEGER NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            PRIMARY KEY (bin_id, key),
            FOREIGN KEY (bin_id) REFERENCES binaries(id) ON DELETE CASCADE
        );

        CREATE TABLE bin_associations (
            suite INTEGER NOT NULL,
            bin INTEGER NOT NULL,
            PRIMARY KEY (suite, bin),
            FOREIGN KEY (suite) REFERENCES suite(id) ON DELETE CASCADE,
            FOREIGN KEY (bin) REFERENCES binaries(id) ON DELETE CASCADE
        );

        CREATE TABLE override (
            suite INTEGER NOT NULL,
            package TEXT NOT NULL,
            type TEXT NOT NULL CHECK(type IN ('deb', 'udeb', 'dsc')),
            component INTEGER NOT NULL,
            section TEXT,
            priority TEXT,
            PRIMARY KEY (suite, package, type),
            FOREIGN KEY (suite) REFERENCES suite(id) ON DELETE CASCADE,
            FOREIGN KEY (component) REFERENCES component(id)
        );
        ",
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrate_fresh_database() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), 0);

        migrate(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), SCHEMA_VERSION);

        let arches: i64 = conn
            .query_row("SELECT COUNT(*) FROM architecture", [], |row| row.get(0))
            .unwrap();
        assert_eq!(arches, 2);
    }

    #[test]
    fn test_migrate_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        migrate(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), SCHEMA_VERSION);
    }
}
