// src/commands.rs
//! Command handlers for the poolkeeper CLI

use crate::cli::{split_args, ImportKind};
use anyhow::{Context, Result};
use poolkeeper::control::{build_file_list, parse_control_file, parse_stanzas};
use poolkeeper::db::{self, archive, ArchiveDb};
use poolkeeper::rdeps::{check_reverse_depends, resolve_suite, AnalysisOptions, ReportStyle};
use poolkeeper::signing::{mail_addresses_for_upload, OpenPgpVerifier, Verification};
use poolkeeper::{check_dsc_files, ArchiveConfig};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::info;

fn verification<'a>(
    verify: bool,
    config: &'a ArchiveConfig,
    verifier: &'a OpenPgpVerifier,
) -> Verification<'a> {
    if verify {
        Verification::Required {
            verifier,
            keyrings: &config.signing.keyrings,
        }
    } else {
        Verification::Skip
    }
}

fn db_path<'a>(explicit: &'a Option<String>, config: &'a ArchiveConfig) -> &'a str {
    explicit.as_deref().unwrap_or(&config.archive.database)
}

fn open_db(path: &str) -> Result<ArchiveDb> {
    ArchiveDb::open(path).with_context(|| format!("cannot open archive database {}", path))
}

pub fn cmd_parse(config: &ArchiveConfig, path: &Path, dsc: bool, verify: bool) -> Result<()> {
    let verifier = OpenPgpVerifier::new();
    let record = parse_control_file(path, dsc, verification(verify, config, &verifier))
        .with_context(|| format!("cannot parse {}", path.display()))?;

    if let Some(signer) = record.signer() {
        println!("# signed by {}", signer);
        if !dsc {
            let cache = config.key_address_cache();
            let recipients = mail_addresses_for_upload(
                &config.mail.upload_recipients,
                record.maintainer().unwrap_or_default(),
                record.changed_by().unwrap_or_default(),
                signer,
                &cache,
            )?;
            println!("# notify {}", recipients.join(", "));
        }
    }
    for (name, value) in record.fields() {
        match value.split_once('\n') {
            Some((first, rest)) => {
                println!("{}: {}", name, first);
                for line in rest.lines() {
                    println!(" {}", if line.is_empty() { "." } else { line });
                }
            }
            None => println!("{}: {}", name, value),
        }
    }
    Ok(())
}

/// Returns whether the descriptor passed
pub fn cmd_check_dsc(config: &ArchiveConfig, path: &Path, verify: bool) -> Result<bool> {
    let verifier = OpenPgpVerifier::new();
    let record = parse_control_file(path, true, verification(verify, config, &verifier))
        .with_context(|| format!("cannot parse {}", path.display()))?;
    let files = build_file_list(&record, true, "files", "md5sum")?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let rejects = check_dsc_files(&name, record.format(), &files);

    for reject in &rejects {
        println!("{}", reject);
    }
    if rejects.is_empty() {
        info!("{}: {} files, format {}", name, files.len(), record.format().unwrap_or("?"));
    }
    Ok(rejects.is_empty())
}

pub fn cmd_init(config: &ArchiveConfig, explicit: &Option<String>) -> Result<()> {
    let path = db_path(explicit, config);
    db::init(path)?;
    println!("Initialized archive database at {}", path);
    Ok(())
}

pub fn cmd_add_suite(
    config: &ArchiveConfig,
    name: &str,
    codename: Option<&str>,
    overridesuite: Option<&str>,
    architectures: &str,
    explicit: &Option<String>,
) -> Result<()> {
    let arches = split_args(architectures).map_err(anyhow::Error::msg)?;
    let arch_refs: Vec<&str> = arches.iter().map(String::as_str).collect();

    let mut conn = db::open(db_path(explicit, config))?;
    db::transaction(&mut conn, |tx| {
        archive::add_suite(tx, name, codename, overridesuite, &arch_refs)
    })?;
    println!("Added suite {} ({})", name, arches.join(" "));
    Ok(())
}

pub fn cmd_import(
    config: &ArchiveConfig,
    suite: Option<&str>,
    kind: ImportKind,
    path: &Path,
    explicit: &Option<String>,
) -> Result<()> {
    let suite_name = suite.unwrap_or(&config.archive.default_suite);
    let store = open_db(db_path(explicit, config))?;
    let suite = resolve_suite(&store, suite_name)?
        .with_context(|| format!("unknown suite {}", suite_name))?;

    let data = std::fs::read(path).with_context(|| format!("cannot read {}", path.display()))?;
    let mut conn = store.into_connection();

    let count = db::transaction(&mut conn, |tx| match kind {
        ImportKind::Source => {
            let record = poolkeeper::parse_dsc(&data, Verification::Skip)?;
            archive::import_source(tx, suite.id, &record)?;
            Ok(1)
        }
        ImportKind::Binaries => {
            let records = parse_stanzas(&data)?;
            for record in &records {
                archive::import_binary(tx, suite.id, record)?;
            }
            Ok(records.len())
        }
    })?;

    println!("Imported {} record(s) into {}", count, suite.name);
    Ok(())
}

/// Returns whether the removal would break anything
#[allow(clippy::too_many_arguments)]
pub fn cmd_rdeps(
    config: &ArchiveConfig,
    packages: &[String],
    suite: Option<&str>,
    architectures: Option<&str>,
    no_arch_all: bool,
    cruft: bool,
    quiet: bool,
    explicit: &Option<String>,
) -> Result<bool> {
    let suite = suite.unwrap_or(&config.archive.default_suite);
    let architectures = architectures
        .map(split_args)
        .transpose()
        .map_err(anyhow::Error::msg)?;

    let store = open_db(db_path(explicit, config))?;
    let removals: BTreeSet<String> = packages.iter().cloned().collect();
    let options = AnalysisOptions {
        architectures,
        include_arch_all: !no_arch_all,
        quiet,
        style: if cruft {
            ReportStyle::Cruft
        } else {
            ReportStyle::Verbose
        },
    };

    let outcome =
        check_reverse_depends(&store, &removals, suite, &options, &mut std::io::stdout().lock())?;
    if !outcome.broken && !quiet {
        println!("No dependency problem found.");
    }
    Ok(outcome.broken)
}
