// src/db/store.rs

//! [`MetadataStore`] queries over the archive database

use crate::error::Result;
use crate::rdeps::{BinaryRow, MetadataStore, SourceRow, Suite};
use crate::version::DebVersion;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::warn;

/// Read access to an archive database
pub struct ArchiveDb {
    conn: Connection,
}

impl ArchiveDb {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Open the database at `db_path`
    pub fn open(db_path: &str) -> Result<Self> {
        Ok(Self::new(super::open(db_path)?))
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Give the connection back, e.g. to run ingestion in a transaction
    pub fn into_connection(self) -> Connection {
        self.conn
    }

    fn suite_from_row(row: &Row) -> rusqlite::Result<Suite> {
        Ok(Suite {
            id: row.get(0)?,
            name: row.get(1)?,
            codename: row.get(2)?,
            overridesuite: row.get(3)?,
        })
    }

    fn find_suite(&self, column: &str, value: &str) -> Result<Option<Suite>> {
        let sql = format!(
            "SELECT id, suite_name, codename, overridesuite FROM suite WHERE {} = ?1",
            column
        );
        let suite = self
            .conn
            .query_row(&sql, [value], Self::suite_from_row)
            .optional()?;
        Ok(suite)
    }

    /// Newest version of each source associated with a suite:
    /// name → (version, source id)
    fn newest_sources(&self, suite: &Suite) -> Result<BTreeMap<String, (String, i64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT s.id, s.source, s.version FROM source s
             JOIN src_associations sa ON sa.source = s.id
             WHERE sa.suite = ?1",
        )?;
        let rows = stmt.query_map([suite.id], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?))
        })?;

        let mut newest: BTreeMap<String, (String, i64)> = BTreeMap::new();
        for row in rows {
            let (id, source, version) = row?;
            let replace = match newest.get(&source) {
                Some((current, _)) => compare_versions(&version, current) == Ordering::Greater,
                None => true,
            };
            if replace {
                newest.insert(source, (version, id));
            }
        }
        Ok(newest)
    }
}

/// dpkg ordering, falling back to plain string order for unparseable input
fn compare_versions(a: &str, b: &str) -> Ordering {
    match (DebVersion::parse(a), DebVersion::parse(b)) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        _ => {
            warn!("Comparing unparseable versions '{}' and '{}' as text", a, b);
            a.cmp(b)
        }
    }
}

impl MetadataStore for ArchiveDb {
    fn suite_by_name(&self, name: &str) -> Result<Option<Suite>> {
        self.find_suite("suite_name", name)
    }

    fn suite_by_codename(&self, codename: &str) -> Result<Option<Suite>> {
        self.find_suite("codename", codename)
    }

    fn suite_architectures(&self, suite: &Suite) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT a.arch_string FROM suite_architectures sa
             JOIN architecture a ON sa.architecture = a.id
             WHERE sa.suite = ?1
             ORDER BY a.arch_string",
        )?;
        let arches = stmt
            .query_map([suite.id], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(arches)
    }

    fn has_architecture(&self, arch: &str) -> Result<bool> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM architecture WHERE arch_string = ?1",
                [arch],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn binaries(&self, suite: &Suite, arch: &str) -> Result<Vec<BinaryRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT b.package, s.source, c.name,
                (SELECT value FROM binaries_metadata WHERE bin_id = b.id AND key = 'depends'),
                (SELECT value FROM binaries_metadata WHERE bin_id = b.id AND key = 'provides')
             FROM binaries b
             JOIN bin_associations ba ON ba.bin = b.id AND ba.suite = ?1
             JOIN source s ON b.source = s.id
             JOIN component c ON b.component = c.id
             JOIN architecture a ON b.architecture = a.id
             WHERE a.arch_string = ?2
             ORDER BY b.package",
        )?;
        let rows = stmt
            .query_map(params![suite.id, arch], |row| {
                Ok(BinaryRow {
                    package: row.get(0)?,
                    source: row.get(1)?,
                    component: row.get(2)?,
                    depends: row.get(3)?,
                    provides: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn source_build_depends(&self, suite: &Suite, include_indep: bool) -> Result<Vec<SourceRow>> {
        let keys: &[&str] = if include_indep {
            &["build-depends", "build-depends-indep"]
        } else {
            &["build-depends"]
        };

        let mut stmt = self
            .conn
            .prepare("SELECT value FROM source_metadata WHERE src_id = ?1 AND key = ?2")?;

        let mut rows = Vec::new();
        for (source, (_, src_id)) in self.newest_sources(suite)? {
            let mut values = Vec::new();
            for key in keys {
                if let Some(value) = stmt
                    .query_row(params![src_id, key], |row| row.get::<_, String>(0))
                    .optional()?
                {
                    values.push(value);
                }
            }

            rows.push(SourceRow {
                source,
                build_depends: (!values.is_empty()).then(|| values.join(", ")),
            });
        }
        Ok(rows)
    }

    fn source_component(&self, suite: &Suite, source: &str) -> Result<Option<String>> {
        let component = self
            .conn
            .query_row(
                "SELECT c.name FROM override o
                 JOIN component c ON o.component = c.id
                 WHERE o.suite = ?1 AND o.package = ?2 AND o.type = 'dsc'",
                params![suite.id, source],
                |row| row.get(0),
            )
            .optional()?;
        Ok(component)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::{parse_control, ParseMode};
    use crate::db::{archive, schema};
    use crate::rdeps::resolve_suite;
    use crate::signing::Verification;

    fn create_test_db() -> ArchiveDb {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute("PRAGMA foreign_keys = ON", []).unwrap();
        schema::migrate(&conn).unwrap();
        ArchiveDb::new(conn)
    }

    fn import_source(db: &ArchiveDb, suite: i64, text: &str) {
        let record = parse_control(text.as_bytes(), ParseMode::Strict, Verification::Skip).unwrap();
        archive::import_source(db.conn(), suite, &record).unwrap();
    }

    #[test]
    fn test_suite_lookup_by_name_then_codename() {
        let db = create_test_db();
        archive::add_suite(db.conn(), "unstable", Some("sid"), None, &["amd64"]).unwrap();

        assert_eq!(resolve_suite(&db, "unstable").unwrap().unwrap().name, "unstable");
        assert_eq!(resolve_suite(&db, "sid").unwrap().unwrap().name, "unstable");
        assert!(resolve_suite(&db, "bookworm").unwrap().is_none());
    }

    #[test]
    fn test_suite_architectures() {
        let db = create_test_db();
        let id = archive::add_suite(db.conn(), "unstable", None, None, &["source", "amd64", "all"])
            .unwrap();
        let suite = db.suite_by_name("unstable").unwrap().unwrap();
        assert_eq!(suite.id, id);
        assert_eq!(
            db.suite_architectures(&suite).unwrap(),
            vec!["all", "amd64", "source"]
        );
        assert!(db.has_architecture("amd64").unwrap());
        assert!(!db.has_architecture("sparc").unwrap());
    }

    #[test]
    fn test_newest_source_build_depends() {
        let db = create_test_db();
        let id = archive::add_suite(db.conn(), "unstable", None, None, &["amd64"]).unwrap();
        import_source(&db, id, "Source: foo\nVersion: 1.0~rc1-1\nBuild-Depends: old-dep\n");
        import_source(
            &db,
            id,
            "Source: foo\nVersion: 1.0-1\nBuild-Depends: debhelper\nBuild-Depends-Indep: sphinx\n",
        );
        let suite = db.suite_by_name("unstable").unwrap().unwrap();

        let rows = db.source_build_depends(&suite, true).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].build_depends.as_deref(), Some("debhelper, sphinx"));

        let rows = db.source_build_depends(&suite, false).unwrap();
        assert_eq!(rows[0].build_depends.as_deref(), Some("debhelper"));
    }

    #[test]
    fn test_source_component_from_override() {
        let db = create_test_db();
        let id = archive::add_suite(db.conn(), "unstable", None, None, &["amd64"]).unwrap();
        archive::set_override(db.conn(), id, "foo", archive::OverrideType::Dsc, "non-free").unwrap();
        let suite = db.suite_by_name("unstable").unwrap().unwrap();

        assert_eq!(
            db.source_component(&suite, "foo").unwrap().as_deref(),
            Some("non-free")
        );
        assert_eq!(db.source_component(&suite, "bar").unwrap(), None);
    }
}
