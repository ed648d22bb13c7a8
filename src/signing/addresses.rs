// src/signing/addresses.rs

//! Mail addresses of upload signers
//!
//! Signer key user IDs are listed through `gpg --with-colons` and cached
//! per fingerprint for the life of the process. The cache is an explicit
//! object so callers (and tests) can hold their own instance.

use crate::error::{Error, Result};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::{LazyLock, Mutex};
use tracing::{debug, warn};

static MAINTAINER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\S.*\S)\s*<([^>]+)>").unwrap());

/// Something that can resolve a key fingerprint to mail addresses
pub trait KeyAddressSource {
    fn addresses(&self, fingerprint: &str) -> Vec<String>;
}

/// Address source backed by `gpg --list-keys` on the archive keyrings
#[derive(Debug, Clone)]
pub struct GpgListing {
    pub program: String,
    pub keyrings: Vec<PathBuf>,
    /// Addresses in this domain are listed first
    pub preferred_domain: Option<String>,
}

impl KeyAddressSource for GpgListing {
    fn addresses(&self, fingerprint: &str) -> Vec<String> {
        let mut cmd = Command::new(&self.program);
        cmd.arg("--no-default-keyring");
        for keyring in &self.keyrings {
            cmd.arg(format!("--keyring={}", keyring.display()));
        }
        cmd.args(["--with-colons", "--list-keys", "--", fingerprint])
            .stderr(Stdio::null());

        match cmd.output() {
            Ok(output) if output.status.success() => {
                parse_gpg_listing(&output.stdout, self.preferred_domain.as_deref())
            }
            Ok(output) => {
                debug!("{} could not list key {}: {}", self.program, fingerprint, output.status);
                Vec::new()
            }
            Err(e) => {
                warn!("Failed to run {}: {}", self.program, e);
                Vec::new()
            }
        }
    }
}

/// Extract mail addresses from `gpg --with-colons` output
///
/// Only `pub` and `uid` records count; invalid, disabled and revoked user
/// IDs are skipped. User IDs that are not UTF-8 are read as Latin-1.
pub fn parse_gpg_listing(output: &[u8], preferred_domain: Option<&str>) -> Vec<String> {
    let mut addresses = Vec::new();

    for line in output.split(|b| *b == b'\n') {
        let parts: Vec<&[u8]> = line.split(|b| *b == b':').collect();
        if !matches!(parts[0], b"uid" | b"pub") {
            continue;
        }
        if matches!(parts.get(1).copied(), Some(b"i" | b"d" | b"r")) {
            continue;
        }
        let Some(uid_bytes) = parts.get(9) else {
            continue;
        };

        let uid = match std::str::from_utf8(uid_bytes) {
            Ok(uid) => uid.to_string(),
            Err(_) => uid_bytes.iter().map(|&b| b as char).collect(),
        };

        let Some(caps) = MAINTAINER_RE.captures(&uid) else {
            continue;
        };
        let address = caps[2].to_string();

        if preferred_domain.is_some_and(|domain| address.ends_with(domain)) {
            addresses.insert(0, address);
        } else {
            addresses.push(address);
        }
    }

    addresses
}

/// Process-wide memo of fingerprint -> addresses; entries never expire
pub struct KeyAddressCache {
    source: Box<dyn KeyAddressSource + Send + Sync>,
    entries: Mutex<HashMap<String, Vec<String>>>,
}

impl KeyAddressCache {
    pub fn new(source: impl KeyAddressSource + Send + Sync + 'static) -> Self {
        Self {
            source: Box::new(source),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Addresses for `fingerprint`, asking the source only on first use
    pub fn addresses(&self, fingerprint: &str) -> Vec<String> {
        {
            let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(cached) = entries.get(fingerprint) {
                return cached.clone();
            }
        }

        let resolved = self.source.addresses(fingerprint);
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(fingerprint.to_string(), resolved.clone());
        resolved
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Bare mail address out of a `Name <mail>` string
fn bare_mail(address: &str) -> String {
    match MAINTAINER_RE.captures(address) {
        Some(caps) => caps[2].to_string(),
        None => address.trim().to_string(),
    }
}

/// Recipients to contact about an upload
///
/// `rules` entries are `maintainer`, `changed_by`, `signer` or
/// `mail:<address>`; an empty list means the first three. The signer is
/// always resolved last and dropped when one of its addresses already
/// receives a copy. Duplicate bare addresses are collapsed.
pub fn mail_addresses_for_upload(
    rules: &[String],
    maintainer: &str,
    changed_by: &str,
    fingerprint: &str,
    cache: &KeyAddressCache,
) -> Result<Vec<String>> {
    let mut rules: Vec<&str> = if rules.is_empty() {
        vec!["maintainer", "changed_by", "signer"]
    } else {
        rules.iter().map(String::as_str).collect()
    };

    if let Some(pos) = rules.iter().position(|r| *r == "signer") {
        let signer = rules.remove(pos);
        rules.push(signer);
    }

    let mut addresses = Vec::new();
    let mut emails = HashSet::new();

    for rule in rules {
        let address = if let Some(fixed) = rule.strip_prefix("mail:") {
            Some(fixed.to_string())
        } else {
            match rule {
                "maintainer" => Some(maintainer.to_string()),
                "changed_by" => Some(changed_by.to_string()),
                "signer" => {
                    let signer_addresses = cache.addresses(fingerprint);
                    if signer_addresses.iter().any(|a| emails.contains(a)) {
                        None
                    } else {
                        signer_addresses.into_iter().next()
                    }
                }
                other => {
                    return Err(Error::Config(format!(
                        "Unsupported upload mail recipient rule '{}'",
                        other
                    )));
                }
            }
        };

        if let Some(address) = address {
            let mail = bare_mail(&address);
            if emails.insert(mail) {
                addresses.push(address);
            }
        }
    }

    Ok(addresses)
}
