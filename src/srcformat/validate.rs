// src/srcformat/validate.rs

//! Check the file list of a source descriptor against its format

use super::{FileTypeCounts, SourceFileType, SourceFormat};
use crate::control::FileList;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

/// `package_version.type` where type is a known source artifact suffix
static IS_SOURCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^([a-z0-9][a-z0-9.+-]+)_([A-Za-z0-9.~+-]+?)\.(orig(?:-[a-zA-Z0-9-]+)?\.tar\.(?:gz|bz2|xz)(?:\.asc)?|(?:debian\.)?tar\.(?:gz|bz2|xz)|diff\.gz)$",
    )
    .unwrap()
});

/// Suffix patterns in match order; the first hit wins, so signatures and
/// specific tarballs come before the general ones
static FILE_TYPE_LOOKUP: LazyLock<Vec<(Regex, &'static [SourceFileType])>> = LazyLock::new(|| {
    use SourceFileType::*;
    let table: [(&str, &'static [SourceFileType]); 9] = [
        (r"^orig\.tar\.(gz|bz2|xz)\.asc", &[OrigTarSig]),
        (r"^orig\.tar\.gz", &[OrigTarGz, OrigTar]),
        (r"^diff\.gz", &[DebianDiff]),
        (r"^tar\.gz", &[NativeTarGz, NativeTar]),
        (r"^debian\.tar\.(gz|bz2|xz)", &[DebianTar]),
        (r"^orig\.tar\.(gz|bz2|xz)", &[OrigTar]),
        (r"^tar\.(gz|bz2|xz)", &[NativeTar]),
        (r"^orig-.+\.tar\.(gz|bz2|xz)\.asc", &[MoreOrigTarSig]),
        (r"^orig-.+\.tar\.(gz|bz2|xz)", &[MoreOrigTar]),
    ];
    table
        .into_iter()
        .map(|(pattern, types)| (Regex::new(pattern).unwrap(), types))
        .collect()
});

/// Types that may be listed at most once
const SINGLE_OCCURRENCE: &[SourceFileType] = &[
    SourceFileType::OrigTar,
    SourceFileType::OrigTarSig,
    SourceFileType::NativeTar,
    SourceFileType::DebianTar,
    SourceFileType::DebianDiff,
];

/// Verify that a descriptor lists the files its `Format` expects
///
/// Returns every violation found, each prefixed with `dsc_name`. A file
/// that does not look like a source artifact ends the check right away.
/// An unknown format yields no format-specific violations.
pub fn check_dsc_files(dsc_name: &str, format: Option<&str>, files: &FileList) -> Vec<String> {
    let mut rejects = Vec::new();
    let mut has = FileTypeCounts::default();

    for filename in files.filenames() {
        let Some(caps) = IS_SOURCE.captures(filename) else {
            rejects.push(format!(
                "{}: {} in Files field not recognised as source.",
                dsc_name, filename
            ));
            return rejects;
        };

        let suffix = &caps[3];
        match FILE_TYPE_LOOKUP.iter().find(|(re, _)| re.is_match(suffix)) {
            Some((_, types)) => {
                for file_type in types.iter() {
                    has.add(*file_type);
                }
            }
            None => {
                rejects.push(format!("{}: unexpected source file '{}'", dsc_name, filename));
                break;
            }
        }
    }

    for file_type in SINGLE_OCCURRENCE {
        if has.get(*file_type) > 1 {
            rejects.push(format!("{}: lists multiple {}", dsc_name, file_type));
        }
    }

    let source_format = SourceFormat::from_field(format.unwrap_or_default());
    if source_format == SourceFormat::Unknown {
        debug!("{}: no checks for source format {:?}", dsc_name, format);
    }
    rejects.extend(
        source_format
            .reject_msgs(&has)
            .into_iter()
            .map(|msg| format!("{}: {}", dsc_name, msg)),
    );

    rejects
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::{extract_file_list, parse_control, ParseMode};
    use crate::signing::Verification;

    fn files(names: &[&str]) -> FileList {
        let mut text = String::from("Files:\n");
        for (i, name) in names.iter().enumerate() {
            text.push_str(&format!(" {:032x} {} {}\n", i, 100 + i, name));
        }
        let record = parse_control(text.as_bytes(), ParseMode::Lenient, Verification::Skip).unwrap();
        extract_file_list(&record, "files", "md5sum", false).unwrap()
    }

    #[test]
    fn test_quilt_package_is_clean() {
        let list = files(&[
            "hello_2.10.orig.tar.gz",
            "hello_2.10.orig.tar.gz.asc",
            "hello_2.10-3.debian.tar.xz",
        ]);
        assert!(check_dsc_files("hello_2.10-3.dsc", Some("3.0 (quilt)"), &list).is_empty());
    }

    #[test]
    fn test_multiple_orig_tarballs() {
        let list = files(&[
            "hello_2.10.orig.tar.gz",
            "hello_2.10.1.orig.tar.gz",
            "hello_2.10-3.debian.tar.xz",
        ]);
        let rejects = check_dsc_files("hello_2.10-3.dsc", Some("3.0 (quilt)"), &list);
        assert_eq!(rejects, vec!["hello_2.10-3.dsc: lists multiple orig_tar"]);
    }

    #[test]
    fn test_extra_orig_component_signature() {
        let list = files(&[
            "hello_2.10.orig.tar.xz",
            "hello_2.10.orig-docs.tar.xz",
            "hello_2.10.orig-docs.tar.xz.asc",
            "hello_2.10-3.debian.tar.xz",
        ]);
        assert!(check_dsc_files("hello.dsc", Some("3.0 (quilt)"), &list).is_empty());
    }

    #[test]
    fn test_not_a_source_file_stops_validation() {
        let list = files(&["hello_2.10.orig.tar.gz", "README", "hello_2.10.orig.tar.xz"]);
        let rejects = check_dsc_files("hello.dsc", Some("3.0 (quilt)"), &list);
        assert_eq!(
            rejects,
            vec!["hello.dsc: README in Files field not recognised as source."]
        );
    }

    #[test]
    fn test_format_one() {
        let list = files(&["hello_2.10.orig.tar.gz", "hello_2.10-3.diff.gz"]);
        assert!(check_dsc_files("hello.dsc", Some("1.0"), &list).is_empty());

        let native = files(&["hello_2.10.tar.gz", "hello_2.10-3.diff.gz"]);
        assert_eq!(
            check_dsc_files("hello.dsc", Some("1.0"), &native),
            vec!["hello.dsc: native package with diff makes no sense"]
        );
    }

    #[test]
    fn test_unknown_format_is_tolerated() {
        let list = files(&["hello_2.10.tar.xz"]);
        assert!(check_dsc_files("hello.dsc", Some("4.0 (future)"), &list).is_empty());
        assert!(check_dsc_files("hello.dsc", None, &list).is_empty());
    }
}
