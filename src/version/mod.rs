// src/version/mod.rs

//! Debian package versions
//!
//! Versions have the form `[epoch:]upstream[-revision]` and are ordered the
//! way dpkg orders them: epochs numerically, then upstream and revision by
//! alternating non-digit and digit runs. In the non-digit runs `~` sorts
//! before everything (even the end of the string) and letters sort before
//! other characters.

use crate::depends::Relation;
use crate::error::{Error, Result};
use std::cmp::Ordering;
use std::fmt;

/// A parsed Debian version
#[derive(Debug, Clone, Eq)]
pub struct DebVersion {
    pub epoch: u64,
    pub upstream: String,
    pub revision: Option<String>,
}

impl DebVersion {
    /// Parse a version string
    ///
    /// - "1.2.3" → epoch=0, upstream="1.2.3", revision=None
    /// - "2:1.2.3" → epoch=2, upstream="1.2.3", revision=None
    /// - "1.2-3-4" → epoch=0, upstream="1.2-3", revision=Some("4")
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        let invalid = || Error::InvalidVersion(s.to_string());

        let (epoch, rest) = match s.split_once(':') {
            Some((e, r)) => (e.parse::<u64>().map_err(|_| invalid())?, r),
            None => (0, s),
        };

        let (upstream, revision) = match rest.rsplit_once('-') {
            Some((u, r)) => (u, Some(r)),
            None => (rest, None),
        };

        if upstream.is_empty() || !upstream.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let upstream_ok = upstream
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '+' | '~' | '-' | ':'));
        if !upstream_ok {
            return Err(invalid());
        }
        if let Some(rev) = revision {
            let revision_ok = !rev.is_empty()
                && rev
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '+' | '~'));
            if !revision_ok {
                return Err(invalid());
            }
        }

        Ok(Self {
            epoch,
            upstream: upstream.to_string(),
            revision: revision.map(str::to_string),
        })
    }

    /// Whether this version satisfies `relation other`
    pub fn satisfies(&self, relation: Relation, other: &DebVersion) -> bool {
        let ord = self.cmp(other);
        match relation {
            Relation::Earlier => ord == Ordering::Less,
            Relation::EarlierEqual => ord != Ordering::Greater,
            Relation::Equal => ord == Ordering::Equal,
            Relation::LaterEqual => ord != Ordering::Less,
            Relation::Later => ord == Ordering::Greater,
        }
    }
}

/// Weight of one character in a non-digit run
fn order(c: Option<u8>) -> i32 {
    match c {
        Some(b'~') => -1,
        None => 0,
        Some(c) if c.is_ascii_digit() => 0,
        Some(c) if c.is_ascii_alphabetic() => c as i32,
        Some(c) => c as i32 + 256,
    }
}

/// dpkg's `verrevcmp`
fn compare_part(a: &str, b: &str) -> Ordering {
    let a = a.as_bytes();
    let b = b.as_bytes();
    let (mut i, mut j) = (0, 0);

    while i < a.len() || j < b.len() {
        while (i < a.len() && !a[i].is_ascii_digit()) || (j < b.len() && !b[j].is_ascii_digit()) {
            let ac = order(a.get(i).copied());
            let bc = order(b.get(j).copied());
            if ac != bc {
                return ac.cmp(&bc);
            }
            i += 1;
            j += 1;
        }

        while i < a.len() && a[i] == b'0' {
            i += 1;
        }
        while j < b.len() && b[j] == b'0' {
            j += 1;
        }

        let mut first_diff = Ordering::Equal;
        while i < a.len() && a[i].is_ascii_digit() && j < b.len() && b[j].is_ascii_digit() {
            if first_diff == Ordering::Equal {
                first_diff = a[i].cmp(&b[j]);
            }
            i += 1;
            j += 1;
        }
        if i < a.len() && a[i].is_ascii_digit() {
            return Ordering::Greater;
        }
        if j < b.len() && b[j].is_ascii_digit() {
            return Ordering::Less;
        }
        if first_diff != Ordering::Equal {
            return first_diff;
        }
    }

    Ordering::Equal
}

impl Ord for DebVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.epoch
            .cmp(&other.epoch)
            .then_with(|| compare_part(&self.upstream, &other.upstream))
            .then_with(|| {
                compare_part(
                    self.revision.as_deref().unwrap_or(""),
                    other.revision.as_deref().unwrap_or(""),
                )
            })
    }
}

impl PartialOrd for DebVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for DebVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl fmt::Display for DebVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.epoch > 0 {
            write!(f, "{}:", self.epoch)?;
        }
        write!(f, "{}", self.upstream)?;
        if let Some(ref revision) = self.revision {
            write!(f, "-{}", revision)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> DebVersion {
        DebVersion::parse(s).unwrap()
    }

    #[test]
    fn test_parse_simple() {
        let ver = v("1.2.3");
        assert_eq!(ver.epoch, 0);
        assert_eq!(ver.upstream, "1.2.3");
        assert_eq!(ver.revision, None);
    }

    #[test]
    fn test_parse_full() {
        let ver = v("2:1.0-rc1-3ubuntu1");
        assert_eq!(ver.epoch, 2);
        assert_eq!(ver.upstream, "1.0-rc1");
        assert_eq!(ver.revision.as_deref(), Some("3ubuntu1"));
        assert_eq!(ver.to_string(), "2:1.0-rc1-3ubuntu1");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(DebVersion::parse("").is_err());
        assert!(DebVersion::parse("x:1.0").is_err());
        assert!(DebVersion::parse("abc").is_err());
        assert!(DebVersion::parse("1.0-").is_err());
        assert!(DebVersion::parse("1.0 beta").is_err());
    }

    #[test]
    fn test_compare_epochs() {
        assert!(v("1:0.1") > v("9.9"));
    }

    #[test]
    fn test_compare_numeric_runs() {
        assert!(v("1.10") > v("1.9"));
        assert!(v("1.01") == v("1.1"));
        assert!(v("2.10-3") > v("2.10-2"));
    }

    #[test]
    fn test_tilde_sorts_first() {
        assert!(v("1.0~rc1") < v("1.0"));
        assert!(v("1.0~~") < v("1.0~"));
        assert!(v("1.0~rc1") < v("1.0~rc2"));
    }

    #[test]
    fn test_letters_before_symbols() {
        assert!(v("1.0a") < v("1.0+"));
        assert!(v("1.0") < v("1.0a"));
        assert!(v("1.0+b1") > v("1.0"));
    }

    #[test]
    fn test_satisfies() {
        assert!(v("2.0").satisfies(Relation::LaterEqual, &v("1.5")));
        assert!(!v("2.0").satisfies(Relation::Earlier, &v("2.0")));
        assert!(v("2.0").satisfies(Relation::EarlierEqual, &v("2.0")));
        assert!(v("1:1.0").satisfies(Relation::Later, &v("5.0")));
    }
}
