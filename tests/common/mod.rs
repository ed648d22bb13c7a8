// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use poolkeeper::control::parse_stanzas;
use poolkeeper::db::{self, archive};
use poolkeeper::signing::Verification;
use tempfile::TempDir;

/// Binary package index of the test suite.
///
/// - `b` provides the virtual package `v` (its only provider)
/// - `a` depends on `v`, on amd64 only
/// - `c` depends on `b | d`
/// - `e` depends on `b`, on arm64 only
/// - `f` (Architecture: all, contrib) depends on `b`
/// - `g` has an unparseable Depends field
pub const PACKAGES: &str = "\
Package: b
Version: 1.0-1
Architecture: amd64
Provides: v

Package: b
Version: 1.0-1
Architecture: arm64
Provides: v

Package: a
Version: 2.0-1
Architecture: amd64
Depends: v

Package: c
Version: 3.0-1
Architecture: amd64
Depends: b | d

Package: c
Version: 3.0-1
Architecture: arm64
Depends: b | d

Package: d
Version: 4.0-1
Architecture: amd64

Package: e
Version: 5.0-1
Architecture: arm64
Depends: libc6, b

Package: f
Version: 6.0-1
Architecture: all
Section: contrib/misc
Depends: b

Package: g
Version: 7.0-1
Architecture: amd64
Depends: broken (((
";

/// Source descriptors of the test suite.
pub const SOURCES: &[&str] = &[
    "Source: app\nVersion: 1.0-1\nBuild-Depends: b [amd64], debhelper\nBuild-Depends-Indep: d | b\n",
    "Source: app\nVersion: 0.9-1\nBuild-Depends: debhelper\n",
    "Source: lib\nVersion: 1.0-1\nBuild-Depends: debhelper-compat (= 13)\n",
    "Source: tool\nVersion: 1.0-1\nSection: non-free/devel\nBuild-Depends: b (>= 1.0)\n",
];

/// Create an archive database holding suite `unstable` (codename `sid`,
/// architectures amd64 and arm64) filled from [`PACKAGES`] and [`SOURCES`].
///
/// Returns (TempDir, db_path) - keep the TempDir alive to prevent cleanup.
pub fn setup_archive_db() -> (TempDir, String) {
    let temp_dir = tempfile::tempdir().unwrap();
    let db_path = temp_dir
        .path()
        .join("archive.db")
        .to_str()
        .unwrap()
        .to_string();

    db::init(&db_path).unwrap();
    let mut conn = db::open(&db_path).unwrap();

    db::transaction(&mut conn, |tx| {
        let suite = archive::add_suite(
            tx,
            "unstable",
            Some("sid"),
            None,
            &["source", "all", "amd64", "arm64"],
        )?;

        for record in parse_stanzas(PACKAGES.as_bytes())? {
            archive::import_binary(tx, suite, &record)?;
        }
        for text in SOURCES {
            let record = poolkeeper::parse_dsc(text.as_bytes(), Verification::Skip)?;
            archive::import_source(tx, suite, &record)?;
        }
        Ok(())
    })
    .unwrap();

    (temp_dir, db_path)
}

/// A quilt-format source descriptor listing `files` in its Files field.
pub fn dsc_with_files(files: &[&str]) -> String {
    let mut text = String::from(
        "Format: 3.0 (quilt)\nSource: hello\nBinary: hello\nArchitecture: any\nVersion: 2.10-3\nFiles:\n",
    );
    for (i, name) in files.iter().enumerate() {
        text.push_str(&format!(" {:032x} {} {}\n", i + 1, 1000 + i, name));
    }
    text
}
