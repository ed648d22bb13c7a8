// src/control/files.rs

//! File list fields (`Files`, `Checksums-*`) of a parsed control record

use super::changes::ChangesFormat;
use super::record::ControlRecord;
use crate::error::{Error, Result};

/// One file listed in a control record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub filename: String,
    pub size: String,
    /// Name of the digest `checksum` was read as (e.g. "md5sum")
    pub digest_name: String,
    pub checksum: String,
    pub section: String,
    pub priority: String,
    /// Derived from `section`, never read from the input
    pub component: String,
}

/// Files keyed by name, in the order they were first listed
///
/// A filename listed twice keeps its first position but takes the later
/// line's values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileList {
    entries: Vec<FileEntry>,
}

impl FileList {
    fn upsert(&mut self, entry: FileEntry) {
        match self.entries.iter_mut().find(|e| e.filename == entry.filename) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    pub fn get(&self, filename: &str) -> Option<&FileEntry> {
        self.entries.iter().find(|e| e.filename == filename)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FileEntry> {
        self.entries.iter()
    }

    pub fn filenames(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.filename.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a FileList {
    type Item = &'a FileEntry;
    type IntoIter = std::slice::Iter<'a, FileEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Split a section into `(section, component)`
///
/// `contrib/net` belongs to `contrib`; a section without `/` is in `main`.
/// The section itself is returned unchanged.
pub fn extract_component_from_section(section: &str) -> (String, String) {
    match section.split_once('/') {
        Some((component, _)) => (section.to_string(), component.to_string()),
        None => (section.to_string(), "main".to_string()),
    }
}

/// Read a file list field into per-filename entries
///
/// Lines hold `checksum size section priority filename` when
/// `has_section_and_priority` is set and `checksum size filename`
/// otherwise. The list ends at the first empty line. A line with any other
/// token count fails with [`Error::FileList`] naming that line.
pub fn extract_file_list(
    record: &ControlRecord,
    field: &str,
    digest_name: &str,
    has_section_and_priority: bool,
) -> Result<FileList> {
    let value = record
        .get(field)
        .ok_or_else(|| Error::NoFilesField(field.to_string()))?;

    let mut files = FileList::default();

    for line in value.split('\n') {
        if line.is_empty() {
            break;
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        let (checksum, size, section, priority, filename) =
            match (has_section_and_priority, tokens.as_slice()) {
                (true, [checksum, size, section, priority, filename]) => {
                    (*checksum, *size, *section, *priority, *filename)
                }
                (false, [checksum, size, filename]) => (*checksum, *size, "", "", *filename),
                _ => return Err(Error::FileList(line.to_string())),
            };

        let section = if section.is_empty() { "-" } else { section };
        let priority = if priority.is_empty() { "-" } else { priority };
        let (section, component) = extract_component_from_section(section);

        files.upsert(FileEntry {
            filename: filename.to_string(),
            size: size.to_string(),
            digest_name: digest_name.to_string(),
            checksum: checksum.to_string(),
            section,
            priority: priority.to_string(),
            component,
        });
    }

    Ok(files)
}

/// File list of an upload manifest or source descriptor
///
/// Only the `files` field of an upload manifest carries section and
/// priority. For upload manifests the `Format` field is validated against
/// the requested field first.
pub fn build_file_list(
    record: &ControlRecord,
    is_dsc: bool,
    field: &str,
    digest_name: &str,
) -> Result<FileList> {
    let field = field.to_ascii_lowercase();
    if !record.contains(&field) {
        return Err(Error::NoFilesField(field));
    }

    if !is_dsc {
        let format = record
            .format()
            .ok_or_else(|| Error::UnknownChangesFormat(String::new()))?;
        ChangesFormat::parse(format)?.validate_for_field(&field)?;
    }

    let has_section_and_priority = !is_dsc && field == "files";
    extract_file_list(record, &field, digest_name, has_section_and_priority)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::parser::{parse_control, ParseMode};
    use crate::signing::Verification;

    fn record(text: &str) -> ControlRecord {
        parse_control(text.as_bytes(), ParseMode::Lenient, Verification::Skip).unwrap()
    }

    #[test]
    fn test_component_from_section() {
        assert_eq!(
            extract_component_from_section("non-free/libs"),
            ("non-free/libs".to_string(), "non-free".to_string())
        );
        assert_eq!(
            extract_component_from_section("devel"),
            ("devel".to_string(), "main".to_string())
        );
    }

    #[test]
    fn test_five_token_lines() {
        let rec = record(
            "Format: 1.8\nFiles:\n aaa 10 contrib/net optional foo_1.0.dsc\n bbb 20 devel extra foo_1.0.tar.gz\n",
        );
        let files = build_file_list(&rec, false, "files", "md5sum").unwrap();
        assert_eq!(files.len(), 2);

        let dsc = files.get("foo_1.0.dsc").unwrap();
        assert_eq!(dsc.checksum, "aaa");
        assert_eq!(dsc.digest_name, "md5sum");
        assert_eq!(dsc.size, "10");
        assert_eq!(dsc.section, "contrib/net");
        assert_eq!(dsc.component, "contrib");
        assert_eq!(dsc.priority, "optional");

        let tarball = files.get("foo_1.0.tar.gz").unwrap();
        assert_eq!(tarball.component, "main");
    }

    #[test]
    fn test_three_token_lines_default_to_dash() {
        let rec = record("Checksums-Sha256:\n ccc 30 foo_1.0.orig.tar.xz\n");
        let files = build_file_list(&rec, true, "Checksums-Sha256", "sha256").unwrap();
        let entry = files.get("foo_1.0.orig.tar.xz").unwrap();
        assert_eq!(entry.section, "-");
        assert_eq!(entry.priority, "-");
        assert_eq!(entry.component, "main");
        assert_eq!(entry.checksum, "ccc");
    }

    #[test]
    fn test_wrong_token_count_names_line() {
        let rec = record("Format: 1.8\nFiles:\n aaa 10 devel foo_1.0.dsc\n");
        let err = build_file_list(&rec, false, "files", "md5sum").unwrap_err();
        assert!(matches!(err, Error::FileList(line) if line == "aaa 10 devel foo_1.0.dsc"));
    }

    #[test]
    fn test_duplicate_filename_overwrites() {
        let rec = record("Files:\n aaa 10 foo_1.0.dsc\n bbb 11 foo_1.0.dsc\n");
        let files = extract_file_list(&rec, "files", "md5sum", false).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files.get("foo_1.0.dsc").unwrap().checksum, "bbb");
    }

    #[test]
    fn test_missing_field() {
        let rec = record("Format: 1.8\n");
        assert!(matches!(
            build_file_list(&rec, false, "files", "md5sum"),
            Err(Error::NoFilesField(_))
        ));
    }

    #[test]
    fn test_old_format_rejects_checksum_fields() {
        let rec = record("Format: 1.7\nChecksums-Sha1:\n aaa 10 foo_1.0.dsc\n");
        assert!(matches!(
            build_file_list(&rec, false, "checksums-sha1", "sha1"),
            Err(Error::UnsupportedChangesFormat { .. })
        ));
    }
}
