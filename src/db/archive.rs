// src/db/archive.rs

//! Ingestion of suites and parsed control records
//!
//! All helpers take a plain `&Connection` so they can run inside
//! [`crate::db::transaction`].

use crate::control::{extract_component_from_section, ControlRecord};
use crate::error::{Error, Result};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

/// Override type of a package
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideType {
    Deb,
    Udeb,
    Dsc,
}

impl OverrideType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deb => "deb",
            Self::Udeb => "udeb",
            Self::Dsc => "dsc",
        }
    }
}

/// Look up an architecture id, creating the row when missing
pub fn add_architecture(conn: &Connection, arch: &str) -> Result<i64> {
    conn.execute(
        "INSERT OR IGNORE INTO architecture (arch_string) VALUES (?1)",
        [arch],
    )?;
    let id = conn.query_row(
        "SELECT id FROM architecture WHERE arch_string = ?1",
        [arch],
        |row| row.get(0),
    )?;
    Ok(id)
}

/// Look up a component id, creating the row when missing
pub fn add_component(conn: &Connection, name: &str) -> Result<i64> {
    conn.execute("INSERT OR IGNORE INTO component (name) VALUES (?1)", [name])?;
    let id = conn.query_row("SELECT id FROM component WHERE name = ?1", [name], |row| {
        row.get(0)
    })?;
    Ok(id)
}

/// Create a suite building for `architectures`
pub fn add_suite(
    conn: &Connection,
    name: &str,
    codename: Option<&str>,
    overridesuite: Option<&str>,
    architectures: &[&str],
) -> Result<i64> {
    conn.execute(
        "INSERT INTO suite (suite_name, codename, overridesuite) VALUES (?1, ?2, ?3)",
        params![name, codename, overridesuite],
    )?;
    let suite_id = conn.last_insert_rowid();

    for arch in architectures {
        let arch_id = add_architecture(conn, arch)?;
        conn.execute(
            "INSERT OR IGNORE INTO suite_architectures (suite, architecture) VALUES (?1, ?2)",
            params![suite_id, arch_id],
        )?;
    }

    debug!("Added suite {} ({} architectures)", name, architectures.len());
    Ok(suite_id)
}

/// Set the component of `package` in a suite's overrides
pub fn set_override(
    conn: &Connection,
    suite_id: i64,
    package: &str,
    kind: OverrideType,
    component: &str,
) -> Result<()> {
    let component_id = add_component(conn, component)?;
    conn.execute(
        "INSERT OR REPLACE INTO override (suite, package, type, component)
         VALUES (?1, ?2, ?3, ?4)",
        params![suite_id, package, kind.as_str(), component_id],
    )?;
    Ok(())
}

fn required<'a>(record: &'a ControlRecord, field: &str) -> Result<&'a str> {
    record
        .get(field)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::MissingFields(vec![field.to_string()]))
}

fn find_source(conn: &Connection, source: &str, version: &str) -> Result<Option<i64>> {
    let id = conn
        .query_row(
            "SELECT id FROM source WHERE source = ?1 AND version = ?2",
            [source, version],
            |row| row.get(0),
        )
        .optional()?;
    Ok(id)
}

/// Import a source descriptor into a suite
///
/// Every field becomes a metadata row. The source's component comes from
/// its `Section` (descriptors usually have none, which means `main`) and
/// is recorded as a `dsc` override of the suite.
pub fn import_source(conn: &Connection, suite_id: i64, record: &ControlRecord) -> Result<i64> {
    let source = required(record, "source")?;
    let version = required(record, "version")?;

    let src_id = match find_source(conn, source, version)? {
        Some(id) => id,
        None => {
            conn.execute(
                "INSERT INTO source (source, version, maintainer) VALUES (?1, ?2, ?3)",
                params![source, version, record.maintainer()],
            )?;
            conn.last_insert_rowid()
        }
    };

    for (key, value) in record.fields() {
        conn.execute(
            "INSERT OR REPLACE INTO source_metadata (src_id, key, value) VALUES (?1, ?2, ?3)",
            params![src_id, key, value],
        )?;
    }

    conn.execute(
        "INSERT OR IGNORE INTO src_associations (suite, source) VALUES (?1, ?2)",
        params![suite_id, src_id],
    )?;

    let (_, component) = extract_component_from_section(record.get("section").unwrap_or("main"));
    set_override(conn, suite_id, source, OverrideType::Dsc, &component)?;

    debug!("Imported source {} {}", source, version);
    Ok(src_id)
}

/// Import a binary package stanza into a suite
///
/// The owning source is taken from `Source` (with its optional version),
/// defaulting to the package's own name and version; a source row is
/// created when the archive does not know it yet.
pub fn import_binary(conn: &Connection, suite_id: i64, record: &ControlRecord) -> Result<i64> {
    let package = required(record, "package")?;
    let version = required(record, "version")?;
    let architecture = required(record, "architecture")?;

    let source = record.source().map(str::trim).unwrap_or(package);
    let source_version = record.source_version().unwrap_or(version);
    let src_id = match find_source(conn, source, source_version)? {
        Some(id) => id,
        None => {
            conn.execute(
                "INSERT INTO source (source, version) VALUES (?1, ?2)",
                params![source, source_version],
            )?;
            conn.last_insert_rowid()
        }
    };

    let (_, component) = extract_component_from_section(record.get("section").unwrap_or("main"));
    let component_id = add_component(conn, &component)?;
    let arch_id = add_architecture(conn, architecture)?;

    conn.execute(
        "INSERT INTO binaries (package, version, architecture, source, component)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![package, version, arch_id, src_id, component_id],
    )?;
    let bin_id = conn.last_insert_rowid();

    for (key, value) in record.fields() {
        conn.execute(
            "INSERT OR REPLACE INTO binaries_metadata (bin_id, key, value) VALUES (?1, ?2, ?3)",
            params![bin_id, key, value],
        )?;
    }

    conn.execute(
        "INSERT OR IGNORE INTO bin_associations (suite, bin) VALUES (?1, ?2)",
        params![suite_id, bin_id],
    )?;

    debug!("Imported binary {} {} ({})", package, version, architecture);
    Ok(bin_id)
}
