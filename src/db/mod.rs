// src/db/mod.rs

//! SQLite archive metadata store
//!
//! Holds suites, their architectures, sources and binaries with their
//! control fields as key/value metadata, suite associations and source
//! overrides. [`ArchiveDb`] answers the analyzer's [`MetadataStore`]
//! queries; the ingestion helpers in [`archive`] fill it from parsed
//! control records.
//!
//! [`MetadataStore`]: crate::rdeps::MetadataStore

pub mod archive;
pub mod schema;
mod store;

pub use store::ArchiveDb;

use crate::error::Result;
use rusqlite::{Connection, Transaction};
use std::fs;
use std::path::Path;
use tracing::info;

/// Create (or upgrade) the archive database at `db_path`
pub fn init(db_path: &str) -> Result<()> {
    if let Some(parent) = Path::new(db_path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    info!("Initializing archive database at {}", db_path);
    let conn = open(db_path)?;
    schema::migrate(&conn)
}

/// Open an existing archive database with foreign keys enforced
pub fn open(db_path: &str) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute("PRAGMA foreign_keys = ON", [])?;
    Ok(conn)
}

/// Run `f` inside a transaction, committing only when it succeeds
pub fn transaction<T, F>(conn: &mut Connection, f: F) -> Result<T>
where
    F: FnOnce(&Transaction) -> Result<T>,
{
    let tx = conn.transaction()?;
    let value = f(&tx)?;
    tx.commit()?;
    Ok(value)
}
