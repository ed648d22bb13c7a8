// src/srcformat/mod.rs

//! Source package formats and the files each one accepts
//!
//! A source descriptor's `Format` field selects a [`SourceFormat`]. Each
//! format judges the per-type file counts gathered by [`check_dsc_files`];
//! an unrecognised format string maps to [`SourceFormat::Unknown`], which
//! accepts anything.

mod validate;

pub use validate::check_dsc_files;

use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

static FORMAT_3_NATIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^3\.\d+ \(native\)$").unwrap());
static FORMAT_3_QUILT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^3\.\d+ \(quilt\)$").unwrap());

/// Kinds of files a source descriptor may list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceFileType {
    OrigTarSig,
    OrigTarGz,
    OrigTar,
    DebianDiff,
    NativeTarGz,
    NativeTar,
    DebianTar,
    MoreOrigTarSig,
    MoreOrigTar,
}

impl SourceFileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OrigTarSig => "orig_tar_sig",
            Self::OrigTarGz => "orig_tar_gz",
            Self::OrigTar => "orig_tar",
            Self::DebianDiff => "debian_diff",
            Self::NativeTarGz => "native_tar_gz",
            Self::NativeTar => "native_tar",
            Self::DebianTar => "debian_tar",
            Self::MoreOrigTarSig => "more_orig_tar_sig",
            Self::MoreOrigTar => "more_orig_tar",
        }
    }
}

impl fmt::Display for SourceFileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Occurrences of each file type in one descriptor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileTypeCounts {
    counts: HashMap<SourceFileType, usize>,
}

impl FileTypeCounts {
    pub fn add(&mut self, file_type: SourceFileType) {
        *self.counts.entry(file_type).or_default() += 1;
    }

    pub fn get(&self, file_type: SourceFileType) -> usize {
        self.counts.get(&file_type).copied().unwrap_or(0)
    }

    pub fn has(&self, file_type: SourceFileType) -> bool {
        self.get(file_type) > 0
    }
}

/// Source package format variants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// `1.0`: a native tarball, or original tarball plus diff
    One,
    /// `3.x (native)`: a single native tarball
    ThreeNative,
    /// `3.x (quilt)`: original tarball(s) plus a debian tarball
    ThreeQuilt,
    /// Anything else; judged permissively
    Unknown,
}

impl SourceFormat {
    /// Select the format named by a descriptor's `Format` field
    pub fn from_field(value: &str) -> Self {
        let value = value.trim();
        if value == "1.0" {
            Self::One
        } else if FORMAT_3_NATIVE.is_match(value) {
            Self::ThreeNative
        } else if FORMAT_3_QUILT.is_match(value) {
            Self::ThreeQuilt
        } else {
            Self::Unknown
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::One => "1.0",
            Self::ThreeNative => "3.x (native)",
            Self::ThreeQuilt => "3.x (quilt)",
            Self::Unknown => "unknown",
        }
    }

    fn requires(&self) -> &'static [SourceFileType] {
        use SourceFileType::*;
        match self {
            Self::ThreeNative => &[NativeTar],
            Self::ThreeQuilt => &[OrigTar, DebianTar],
            Self::One | Self::Unknown => &[],
        }
    }

    fn disallowed(&self) -> &'static [SourceFileType] {
        use SourceFileType::*;
        match self {
            Self::One => &[DebianTar, MoreOrigTar, MoreOrigTarSig],
            Self::ThreeNative => &[OrigTar, DebianDiff, DebianTar, MoreOrigTar],
            Self::ThreeQuilt => &[DebianDiff, NativeTar],
            Self::Unknown => &[],
        }
    }

    /// Reasons the given file counts are not acceptable for this format
    pub fn reject_msgs(&self, has: &FileTypeCounts) -> Vec<String> {
        use SourceFileType::*;

        let mut msgs = Vec::new();
        if *self == Self::Unknown {
            return msgs;
        }

        if *self == Self::One {
            if !(has.has(NativeTarGz) || (has.has(OrigTarGz) && has.has(DebianDiff))) {
                msgs.push("no .tar.gz or .orig.tar.gz+.diff.gz in 'Files' field.".to_string());
            }
            if has.has(NativeTarGz) && has.has(DebianDiff) {
                msgs.push("native package with diff makes no sense".to_string());
            }
            if has.get(OrigTarGz) != has.get(OrigTar) || has.get(NativeTarGz) != has.get(NativeTar)
            {
                msgs.push(format!("contains source files not allowed in format {}", self.name()));
            }
        }

        if !self.requires().iter().all(|t| has.has(*t)) {
            msgs.push(format!("lack of required files for format {}", self.name()));
        }

        if self.disallowed().iter().any(|t| has.has(*t)) {
            msgs.push(format!("contains source files not allowed in format {}", self.name()));
        }

        if has.has(OrigTarSig) && !has.has(OrigTar) {
            msgs.push("orig_tar_sig listed without orig_tar".to_string());
        }
        if has.get(MoreOrigTarSig) > has.get(MoreOrigTar) {
            msgs.push("more_orig_tar_sig listed without matching more_orig_tar".to_string());
        }

        msgs.dedup();
        msgs
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use SourceFileType::*;

    fn counts(types: &[SourceFileType]) -> FileTypeCounts {
        let mut has = FileTypeCounts::default();
        for t in types {
            has.add(*t);
        }
        has
    }

    #[test]
    fn test_format_lookup() {
        assert_eq!(SourceFormat::from_field("1.0"), SourceFormat::One);
        assert_eq!(SourceFormat::from_field("3.0 (native)"), SourceFormat::ThreeNative);
        assert_eq!(SourceFormat::from_field("3.0 (quilt)"), SourceFormat::ThreeQuilt);
        assert_eq!(SourceFormat::from_field("3.0 (git)"), SourceFormat::Unknown);
    }

    #[test]
    fn test_format_one_accepts_orig_and_diff() {
        let has = counts(&[OrigTarGz, OrigTar, DebianDiff]);
        assert!(SourceFormat::One.reject_msgs(&has).is_empty());
    }

    #[test]
    fn test_format_one_rejects_native_with_diff() {
        let has = counts(&[NativeTarGz, NativeTar, DebianDiff]);
        let msgs = SourceFormat::One.reject_msgs(&has);
        assert_eq!(msgs, vec!["native package with diff makes no sense"]);
    }

    #[test]
    fn test_format_one_rejects_xz() {
        let has = counts(&[OrigTar, DebianDiff]);
        let msgs = SourceFormat::One.reject_msgs(&has);
        assert!(msgs.contains(&"no .tar.gz or .orig.tar.gz+.diff.gz in 'Files' field.".to_string()));
        assert!(msgs.contains(&"contains source files not allowed in format 1.0".to_string()));
    }

    #[test]
    fn test_quilt_requirements() {
        assert!(SourceFormat::ThreeQuilt
            .reject_msgs(&counts(&[OrigTar, DebianTar]))
            .is_empty());
        assert_eq!(
            SourceFormat::ThreeQuilt.reject_msgs(&counts(&[OrigTar])),
            vec!["lack of required files for format 3.x (quilt)"]
        );
    }

    #[test]
    fn test_native_rejects_debian_tar() {
        let msgs = SourceFormat::ThreeNative.reject_msgs(&counts(&[NativeTar, DebianTar]));
        assert_eq!(msgs, vec!["contains source files not allowed in format 3.x (native)"]);
    }

    #[test]
    fn test_signature_without_tarball() {
        let msgs = SourceFormat::ThreeQuilt.reject_msgs(&counts(&[OrigTarSig, DebianTar]));
        assert!(msgs.contains(&"orig_tar_sig listed without orig_tar".to_string()));
    }

    #[test]
    fn test_unknown_accepts_anything() {
        let has = counts(&[DebianDiff, DebianTar, NativeTar]);
        assert!(SourceFormat::Unknown.reject_msgs(&has).is_empty());
    }
}
