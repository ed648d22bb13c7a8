// src/config.rs

//! Archive configuration file
//!
//! ```toml
//! [archive]
//! database = "/srv/archive/poolkeeper.db"
//! default_suite = "unstable"
//!
//! [signing]
//! keyrings = ["/srv/keyrings/uploaders.gpg"]
//! gpg = "gpg"
//!
//! [mail]
//! upload_recipients = ["maintainer", "changed_by", "signer"]
//! signer_domain = "@debian.org"
//! ```
//!
//! Every section and key is optional.

use crate::error::{Error, Result};
use crate::signing::{GpgListing, KeyAddressCache};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_DB_PATH: &str = "/var/lib/poolkeeper/archive.db";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArchiveConfig {
    #[serde(default)]
    pub archive: ArchiveSection,

    #[serde(default)]
    pub signing: SigningSection,

    #[serde(default)]
    pub mail: MailSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveSection {
    /// SQLite archive database
    #[serde(default = "default_database")]
    pub database: String,

    /// Suite used when a command does not name one
    #[serde(default = "default_suite")]
    pub default_suite: String,
}

impl Default for ArchiveSection {
    fn default() -> Self {
        Self {
            database: default_database(),
            default_suite: default_suite(),
        }
    }
}

fn default_database() -> String {
    DEFAULT_DB_PATH.to_string()
}

fn default_suite() -> String {
    "unstable".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SigningSection {
    /// Keyrings a control record signature must come from
    #[serde(default)]
    pub keyrings: Vec<PathBuf>,

    /// Program used to list key user IDs
    #[serde(default = "default_gpg")]
    pub gpg: String,
}

impl Default for SigningSection {
    fn default() -> Self {
        Self {
            keyrings: Vec::new(),
            gpg: default_gpg(),
        }
    }
}

fn default_gpg() -> String {
    "gpg".to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MailSection {
    /// `maintainer`, `changed_by`, `signer` or `mail:<address>`; empty
    /// means the first three
    #[serde(default)]
    pub upload_recipients: Vec<String>,

    /// Signer addresses ending in this are preferred
    #[serde(default)]
    pub signer_domain: Option<String>,
}

impl ArchiveConfig {
    /// Parse and validate a configuration document
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading configuration from {}", path.display());
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    /// Load from `path` when given, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Reject recipient rules nothing understands
    pub fn validate(&self) -> Result<()> {
        for rule in &self.mail.upload_recipients {
            let known = matches!(rule.as_str(), "maintainer" | "changed_by" | "signer")
                || rule.strip_prefix("mail:").is_some_and(|addr| !addr.is_empty());
            if !known {
                return Err(Error::Config(format!(
                    "Unsupported upload mail recipient rule '{}'",
                    rule
                )));
            }
        }
        Ok(())
    }

    /// `gpg` listing over the configured keyrings
    pub fn gpg_listing(&self) -> GpgListing {
        GpgListing {
            program: self.signing.gpg.clone(),
            keyrings: self.signing.keyrings.clone(),
            preferred_domain: self.mail.signer_domain.clone(),
        }
    }

    /// A fresh signer address cache backed by [`Self::gpg_listing`]
    pub fn key_address_cache(&self) -> KeyAddressCache {
        KeyAddressCache::new(self.gpg_listing())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ArchiveConfig::from_toml("").unwrap();
        assert_eq!(config, ArchiveConfig::default());
        assert_eq!(config.archive.database, DEFAULT_DB_PATH);
        assert_eq!(config.archive.default_suite, "unstable");
        assert_eq!(config.signing.gpg, "gpg");
        assert!(config.mail.upload_recipients.is_empty());
    }

    #[test]
    fn test_full_document() {
        let config = ArchiveConfig::from_toml(
            r#"
            [archive]
            database = "/tmp/archive.db"
            default_suite = "testing"

            [signing]
            keyrings = ["/srv/keyrings/a.gpg", "/srv/keyrings/b.gpg"]
            gpg = "/usr/bin/gpg2"

            [mail]
            upload_recipients = ["maintainer", "mail:archive@example.org", "signer"]
            signer_domain = "@debian.org"
            "#,
        )
        .unwrap();

        assert_eq!(config.archive.default_suite, "testing");
        assert_eq!(config.signing.keyrings.len(), 2);

        let listing = config.gpg_listing();
        assert_eq!(listing.program, "/usr/bin/gpg2");
        assert_eq!(listing.preferred_domain.as_deref(), Some("@debian.org"));
    }

    #[test]
    fn test_unknown_recipient_rule() {
        let err = ArchiveConfig::from_toml("[mail]\nupload_recipients = [\"sponsor\"]\n")
            .unwrap_err();
        assert!(matches!(err, Error::Config(msg) if msg.contains("sponsor")));

        assert!(ArchiveConfig::from_toml("[mail]\nupload_recipients = [\"mail:\"]\n").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("poolkeeper.toml");
        std::fs::write(&path, "[archive]\ndefault_suite = \"experimental\"\n").unwrap();

        let config = ArchiveConfig::load_or_default(Some(&path)).unwrap();
        assert_eq!(config.archive.default_suite, "experimental");
        assert!(ArchiveConfig::load(&dir.path().join("missing.toml")).is_err());
    }
}
