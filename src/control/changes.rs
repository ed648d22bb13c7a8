// src/control/changes.rs

//! Upload manifest (`.changes`) and source descriptor (`.dsc`) entry points

use super::parser::{parse_control, ParseMode};
use super::record::ControlRecord;
use crate::error::{Error, Result};
use crate::signing::Verification;
use std::fmt;
use std::path::Path;

/// Fields every upload manifest must carry
pub const MANDATORY_CHANGES_FIELDS: &[&str] = &[
    "Format",
    "Date",
    "Source",
    "Architecture",
    "Version",
    "Distribution",
    "Maintainer",
    "Changes",
    "Files",
];

/// Oldest and newest supported upload manifest formats
const MIN_CHANGES_FORMAT: ChangesFormat = ChangesFormat { major: 1, minor: 5 };
const MAX_CHANGES_FORMAT: ChangesFormat = ChangesFormat { major: 1, minor: 8 };
/// Checksums-* fields appeared with this format
const CHECKSUMS_CHANGES_FORMAT: ChangesFormat = ChangesFormat { major: 1, minor: 8 };

/// Parse an upload manifest and check its mandatory fields
///
/// Every missing field is reported in one [`Error::MissingFields`].
pub fn parse_changes(data: &[u8], verification: Verification<'_>) -> Result<ControlRecord> {
    let record = parse_control(data, ParseMode::Lenient, verification)?;
    check_mandatory_fields(&record)?;
    Ok(record)
}

/// Parse a source descriptor with dpkg-source blank line rules
pub fn parse_dsc(data: &[u8], verification: Verification<'_>) -> Result<ControlRecord> {
    parse_control(data, ParseMode::Strict, verification)
}

/// Read and parse a control file from disk
pub fn parse_control_file(
    path: &Path,
    dsc_file: bool,
    verification: Verification<'_>,
) -> Result<ControlRecord> {
    let data = std::fs::read(path)?;
    if dsc_file {
        parse_dsc(&data, verification)
    } else {
        parse_changes(&data, verification)
    }
}

fn check_mandatory_fields(record: &ControlRecord) -> Result<()> {
    let missing: Vec<String> = MANDATORY_CHANGES_FIELDS
        .iter()
        .filter(|name| !record.contains(name))
        .map(|name| name.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::MissingFields(missing))
    }
}

/// `Format` of an upload manifest as `major.minor`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ChangesFormat {
    pub major: u32,
    pub minor: u32,
}

impl ChangesFormat {
    pub fn parse(s: &str) -> Result<Self> {
        let unknown = || Error::UnknownChangesFormat(s.to_string());
        let (major, minor) = s.trim().split_once('.').ok_or_else(unknown)?;
        Ok(Self {
            major: major.parse().map_err(|_| unknown())?,
            minor: minor.parse().map_err(|_| unknown())?,
        })
    }

    /// Check that `field` may be read as a file list under this format
    pub fn validate_for_field(&self, field: &str) -> Result<()> {
        let unsupported = || Error::UnsupportedChangesFormat {
            format: self.to_string(),
            field: field.to_string(),
        };

        if *self < MIN_CHANGES_FORMAT || *self > MAX_CHANGES_FORMAT {
            return Err(unsupported());
        }
        if field != "files" && *self < CHECKSUMS_CHANGES_FORMAT {
            return Err(unsupported());
        }
        Ok(())
    }
}

impl fmt::Display for ChangesFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}
