// src/control/record.rs

//! Ordered field storage for a parsed control record
//!
//! Control records are schema-less at the tokenizer level, so fields live
//! in an insertion-ordered list of `(lower-cased name, value)` pairs. The
//! typed accessors on top cover the well-known fields the rest of the
//! crate reads.

use chrono::{DateTime, FixedOffset};

/// Reserved key under which the original (possibly signed) text is kept
pub const RAW_TEXT_KEY: &str = "filecontents";

/// One parsed control record
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ControlRecord {
    fields: Vec<(String, String)>,
    raw: String,
    signer: Option<String>,
}

impl ControlRecord {
    /// Create an empty record carrying the original text
    pub fn new(raw: String) -> Self {
        Self {
            fields: Vec::new(),
            raw,
            signer: None,
        }
    }

    pub(crate) fn set_signer(&mut self, signer: Option<String>) {
        self.signer = signer;
    }

    /// Set a field, replacing the value in place when the name already exists
    pub(crate) fn insert(&mut self, name: &str, value: String) {
        let name = name.to_ascii_lowercase();
        match self.fields.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Append to the value of an existing field
    pub(crate) fn append(&mut self, name: &str, text: &str) {
        if let Some(slot) = self.fields.iter_mut().find(|(k, _)| k == name) {
            slot.1.push_str(text);
        }
    }

    /// Look up a field by (case-insensitive) name
    ///
    /// The reserved [`RAW_TEXT_KEY`] returns the original text.
    pub fn get(&self, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        if name == RAW_TEXT_KEY {
            return Some(&self.raw);
        }
        self.fields
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Whether a field is present (an empty value still counts)
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Fields in the order they appeared
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The original text, signature armor included
    pub fn raw_text(&self) -> &str {
        &self.raw
    }

    /// Fingerprint of the key that signed the record, if it was verified
    pub fn signer(&self) -> Option<&str> {
        self.signer.as_deref()
    }

    pub fn source(&self) -> Option<&str> {
        self.get("source")
    }

    /// Version split out of a `Source: name (version)` field
    pub fn source_version(&self) -> Option<&str> {
        self.get("source-version")
    }

    pub fn package(&self) -> Option<&str> {
        self.get("package")
    }

    pub fn version(&self) -> Option<&str> {
        self.get("version")
    }

    pub fn format(&self) -> Option<&str> {
        self.get("format")
    }

    pub fn maintainer(&self) -> Option<&str> {
        self.get("maintainer")
    }

    /// `Changed-By`, falling back to the maintainer
    pub fn changed_by(&self) -> Option<&str> {
        self.get("changed-by").or_else(|| self.maintainer())
    }

    /// Whitespace-separated `Architecture` values
    pub fn architectures(&self) -> Vec<&str> {
        split_words(self.get("architecture"))
    }

    /// Whitespace-separated `Distribution` values
    pub fn distributions(&self) -> Vec<&str> {
        split_words(self.get("distribution"))
    }

    /// Whitespace-separated `Binary` values (commas tolerated)
    pub fn binaries(&self) -> Vec<&str> {
        self.get("binary")
            .map(|v| {
                v.split(|c: char| c == ',' || c.is_whitespace())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Upload date parsed as RFC 2822; `None` when absent or malformed
    pub fn date(&self) -> Option<DateTime<FixedOffset>> {
        self.get("date")
            .and_then(|d| DateTime::parse_from_rfc2822(d.trim()).ok())
    }

    /// Whether a binary package record belongs to an automatic debug package
    pub fn is_in_debug_section(&self) -> bool {
        let section = self
            .get("section")
            .map(|s| s.split_once('/').map_or(s, |(_, tail)| tail))
            .unwrap_or_default();
        section == "debug" && self.get("auto-built-package") == Some("debug-symbols")
    }
}

fn split_words(value: Option<&str>) -> Vec<&str> {
    value
        .map(|v| v.split_whitespace().collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_keeps_order_and_lowercases() {
        let mut record = ControlRecord::new(String::new());
        record.insert("Source", "hello".to_string());
        record.insert("Version", "1.0".to_string());
        record.insert("SOURCE", "world".to_string());

        let fields: Vec<_> = record.fields().collect();
        assert_eq!(fields, vec![("source", "world"), ("version", "1.0")]);
        assert_eq!(record.get("Source"), Some("world"));
    }

    #[test]
    fn test_empty_value_is_present() {
        let mut record = ControlRecord::new(String::new());
        record.insert("Description", String::new());
        assert!(record.contains("description"));
        assert_eq!(record.get("description"), Some(""));
        assert!(!record.contains("files"));
    }

    #[test]
    fn test_raw_text_under_reserved_key() {
        let record = ControlRecord::new("Source: x\n".to_string());
        assert_eq!(record.get(RAW_TEXT_KEY), Some("Source: x\n"));
        assert_eq!(record.len(), 0);
    }

    #[test]
    fn test_debug_section() {
        let mut record = ControlRecord::new(String::new());
        record.insert("Section", "non-free/debug".to_string());
        assert!(!record.is_in_debug_section());
        record.insert("Auto-Built-Package", "debug-symbols".to_string());
        assert!(record.is_in_debug_section());
    }

    #[test]
    fn test_date_and_lists() {
        let mut record = ControlRecord::new(String::new());
        record.insert("Date", "Sat, 17 Oct 2026 10:00:00 +0200".to_string());
        record.insert("Architecture", "source amd64".to_string());
        record.insert("Binary", "foo, foo-doc".to_string());
        assert!(record.date().is_some());
        assert_eq!(record.architectures(), vec!["source", "amd64"]);
        assert_eq!(record.binaries(), vec!["foo", "foo-doc"]);
    }
}
