// src/control/parser.rs

//! Control record tokenizer
//!
//! Line grammar:
//! - `Key: value` starts a new field (key stored lower-cased)
//! - ` .` appends an intentionally blank line to the current field
//! - a line starting with whitespace continues the current field
//! - anything else is collected and reported together once the whole
//!   payload has been scanned
//!
//! In strict mode (source descriptors) a blank line is only allowed as the
//! very last line of the payload.

use super::record::ControlRecord;
use crate::error::{Error, Result};
use crate::signing::Verification;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

static SINGLE_LINE_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\S*?)\s*:\s*(.*)").unwrap());
static MULTI_LINE_FIELD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s(.*)").unwrap());
static SOURCE_HAS_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\S+)\s+\((\S+)\)$").unwrap());

/// How blank lines are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseMode {
    /// Blank lines carry no meaning and are skipped
    #[default]
    Lenient,
    /// dpkg-source rules: a blank line may only terminate the payload
    Strict,
}

/// Parse raw (optionally clear-signed) bytes into a [`ControlRecord`]
///
/// The payload handed back by `verification` is what gets tokenized; the
/// input bytes are kept verbatim as the record's raw text.
pub fn parse_control(
    data: &[u8],
    mode: ParseMode,
    verification: Verification<'_>,
) -> Result<ControlRecord> {
    let payload = verification.payload(data)?;
    let contents = String::from_utf8(payload.contents)?;

    let mut record = parse_payload(&contents, mode, String::from_utf8_lossy(data).into_owned())?;
    record.set_signer(payload.signer_fingerprint);
    Ok(record)
}

/// Parse a multi-stanza index (`Packages`, `Sources`) into one record per
/// blank-line separated paragraph
///
/// Index files are never signed; each record keeps its own paragraph as
/// raw text.
pub fn parse_stanzas(data: &[u8]) -> Result<Vec<ControlRecord>> {
    let text = String::from_utf8(data.to_vec())?;
    let mut records = Vec::new();
    let mut stanza = String::new();

    for line in text.lines().chain(std::iter::once("")) {
        if !line.is_empty() {
            stanza.push_str(line);
            stanza.push('\n');
            continue;
        }
        if !stanza.is_empty() {
            let raw = std::mem::take(&mut stanza);
            records.push(parse_payload(&raw, ParseMode::Lenient, raw.clone())?);
        }
    }

    debug!("Parsed {} stanzas", records.len());
    Ok(records)
}

/// Tokenize an already de-wrapped payload
fn parse_payload(contents: &str, mode: ParseMode, raw: String) -> Result<ControlRecord> {
    let lines: Vec<&str> = contents.lines().collect();
    if lines.is_empty() {
        return Err(Error::EmptyRecord);
    }

    let mut record = ControlRecord::new(raw);
    let mut errors = Vec::new();
    let mut current: Option<String> = None;
    let mut first_continuation = false;

    for (idx, line) in lines.iter().enumerate() {
        let index = idx + 1;

        if line.is_empty() {
            match mode {
                ParseMode::Strict if index != lines.len() => {
                    return Err(Error::InvalidDsc { line: index });
                }
                ParseMode::Strict => break,
                ParseMode::Lenient => continue,
            }
        }

        if let Some(caps) = SINGLE_LINE_FIELD.captures(line) {
            let name = caps[1].to_ascii_lowercase();
            record.insert(&name, caps[2].to_string());
            current = Some(name);
            first_continuation = true;
            continue;
        }

        let Some(field) = current.as_deref() else {
            // Continuation with no field to continue
            errors.push(line.to_string());
            continue;
        };

        if *line == " ." {
            record.append(field, "\n");
            continue;
        }

        if let Some(caps) = MULTI_LINE_FIELD.captures(line) {
            if first_continuation && record.get(field).is_some_and(|v| !v.is_empty()) {
                record.append(field, "\n");
            }
            first_continuation = false;
            record.append(field, &caps[1]);
            record.append(field, "\n");
            continue;
        }

        errors.push(line.to_string());
    }

    if let Some(source) = record.source().map(str::to_string) {
        if let Some(caps) = SOURCE_HAS_VERSION.captures(&source) {
            record.insert("source", caps[1].to_string());
            record.insert("source-version", caps[2].to_string());
        }
    }

    if !errors.is_empty() {
        return Err(Error::Format { lines: errors });
    }

    debug!("Parsed control record with {} fields", record.len());
    Ok(record)
}
