// src/cli.rs
//! CLI definitions for poolkeeper
//!
//! Command implementations live in the `commands` module.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "poolkeeper")]
#[command(version)]
#[command(about = "Archive metadata toolkit: control records, source checks, removal breakage", long_about = None)]
pub struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the fields of a control file
    Parse {
        /// Upload manifest or source descriptor
        path: PathBuf,

        /// Parse as a source descriptor (strict blank line rules)
        #[arg(long)]
        dsc: bool,

        /// Check the signature against the configured keyrings
        #[arg(long)]
        verify: bool,
    },

    /// Validate the file list of a source descriptor against its format
    CheckDsc {
        path: PathBuf,

        #[arg(long)]
        verify: bool,
    },

    /// Create the archive database
    Init {
        /// Database path (default from config)
        #[arg(short, long)]
        db_path: Option<String>,
    },

    /// Register a suite
    AddSuite {
        name: String,

        #[arg(long)]
        codename: Option<String>,

        /// Suite whose overrides apply to this one
        #[arg(long)]
        overridesuite: Option<String>,

        /// Architectures, comma or space separated
        #[arg(short, long, default_value = "source,all")]
        architectures: String,

        #[arg(short, long)]
        db_path: Option<String>,
    },

    /// Load a source descriptor or a binary package index into a suite
    Import {
        /// Target suite (name or codename)
        #[arg(short, long)]
        suite: Option<String>,

        #[arg(value_enum)]
        kind: ImportKind,

        path: PathBuf,

        #[arg(short, long)]
        db_path: Option<String>,
    },

    /// Report what removing packages from a suite would break
    Rdeps {
        /// Binary package names to remove
        #[arg(required = true)]
        packages: Vec<String>,

        /// Suite (name or codename)
        #[arg(short, long)]
        suite: Option<String>,

        /// Architectures to check, comma or space separated (default: all of the suite's)
        #[arg(short, long)]
        architectures: Option<String>,

        /// Skip Architecture: all binaries and Build-Depends-Indep
        #[arg(long)]
        no_arch_all: bool,

        /// Indented output for cruft reports
        #[arg(long)]
        cruft: bool,

        /// Only set the exit status
        #[arg(short, long)]
        quiet: bool,

        #[arg(short, long)]
        db_path: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ImportKind {
    /// A single .dsc file
    Source,
    /// A Packages index (one stanza per binary)
    Binaries,
}

/// Split an argument list given as `a,b,c` or `a b c`
///
/// A trailing comma usually means a stray space split the list across
/// arguments, so it is rejected.
pub fn split_args(s: &str) -> Result<Vec<String>, String> {
    if !s.contains(',') {
        return Ok(s.split_whitespace().map(str::to_string).collect());
    }
    if s.ends_with(',') {
        return Err("found trailing comma, spurious space maybe?".to_string());
    }
    Ok(s.split(',').map(|part| part.trim().to_string()).collect())
}
