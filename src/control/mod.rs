// src/control/mod.rs

//! Control record format: upload manifests, source descriptors and
//! binary package stanzas
//!
//! Parsing produces an ordered, case-insensitive field map
//! ([`ControlRecord`]). The file list extractor interprets the `Files` and
//! `Checksums-*` fields of such a record.

mod changes;
mod files;
mod parser;
mod record;

pub use changes::{
    parse_changes, parse_control_file, parse_dsc, ChangesFormat, MANDATORY_CHANGES_FIELDS,
};
pub use files::{
    build_file_list, extract_component_from_section, extract_file_list, FileEntry, FileList,
};
pub use parser::{parse_control, parse_stanzas, ParseMode};
pub use record::{ControlRecord, RAW_TEXT_KEY};
