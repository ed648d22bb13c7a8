// src/lib.rs

//! Poolkeeper: Debian-style archive metadata toolkit
//!
//! Parses the control record format used by upload manifests, source
//! descriptors and binary package stanzas, validates source descriptors
//! against their declared source format, and answers whether removing a
//! set of packages from a suite would break what remains.
//!
//! # Architecture
//!
//! - `control`: record tokenizer, typed accessors, file lists
//! - `srcformat`: per-format acceptance policies for source file lists
//! - `depends`: dependency field grammar shared by everything below
//! - `rdeps`: breakage analysis over an abstract metadata store
//! - `db`: SQLite implementation of that store plus ingestion
//! - `signing`: signature verification and signer mail addresses

pub mod config;
pub mod control;
pub mod db;
pub mod depends;
mod error;
pub mod rdeps;
pub mod signing;
pub mod srcformat;
pub mod version;

pub use config::ArchiveConfig;
pub use control::{
    build_file_list, extract_file_list, parse_changes, parse_control, parse_dsc, ControlRecord,
    FileEntry, FileList, ParseMode,
};
pub use depends::{parse_depends, parse_src_depends, Alternative, Clause, Relation};
pub use error::{Error, Result};
pub use rdeps::{
    analyze, check_reverse_depends, AnalysisOptions, BreakageOutcome, BreakageReport,
    MetadataStore, ReportStyle,
};
pub use signing::{OpenPgpVerifier, SignatureVerifier, Verification, VerifiedPayload};
pub use srcformat::{check_dsc_files, SourceFormat};
pub use version::DebVersion;
