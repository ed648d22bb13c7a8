// src/depends.rs

//! Dependency field grammar
//!
//! A field is a comma separated list of clauses. Every clause must hold;
//! a clause is a `|` separated list of alternatives, any one of which
//! satisfies it. Each alternative is `name[:arch] [(op version)]`, and
//! source fields may also carry `[arch list]` and `<profile>` restrictions.

use crate::error::{Error, Result};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static PACKAGE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9+.\-_~]*$").unwrap());

/// `[amd64 !i386]` restriction lists in build dependencies
pub static BUILD_DEP_ARCH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[[^\]]+\]").unwrap());

/// Version relation of a versioned alternative
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    Earlier,
    EarlierEqual,
    Equal,
    LaterEqual,
    Later,
}

impl Relation {
    /// Parse an operator; legacy `<` and `>` mean `<=` and `>=`
    pub fn parse(op: &str) -> Option<Self> {
        match op {
            "<<" => Some(Self::Earlier),
            "<=" | "<" => Some(Self::EarlierEqual),
            "=" => Some(Self::Equal),
            ">=" | ">" => Some(Self::LaterEqual),
            ">>" => Some(Self::Later),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Earlier => "<<",
            Self::EarlierEqual => "<=",
            Self::Equal => "=",
            Self::LaterEqual => ">=",
            Self::Later => ">>",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One alternative of a clause
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Alternative {
    pub package: String,
    pub relation: Option<Relation>,
    pub version: Option<String>,
}

impl fmt::Display for Alternative {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.relation, &self.version) {
            (Some(rel), Some(ver)) => write!(f, "{} ({} {})", self.package, rel, ver),
            _ => f.write_str(&self.package),
        }
    }
}

/// Alternatives of which at least one must be satisfied
pub type Clause = Vec<Alternative>;

/// Parse a binary dependency field (`Depends`, `Pre-Depends`, ...)
pub fn parse_depends(text: &str) -> Result<Vec<Clause>> {
    parse_field(text, false)
}

/// Parse a source dependency field (`Build-Depends`, ...)
///
/// Architecture and build profile restrictions are accepted and dropped.
pub fn parse_src_depends(text: &str) -> Result<Vec<Clause>> {
    parse_field(text, true)
}

fn parse_field(text: &str, source: bool) -> Result<Vec<Clause>> {
    let mut clauses = Vec::new();

    for raw_clause in text.split(',') {
        if raw_clause.trim().is_empty() {
            continue;
        }

        let clause = raw_clause
            .split('|')
            .map(|alt| parse_alternative(alt, source).map_err(|reason| Error::Dependency {
                text: text.trim().to_string(),
                reason,
            }))
            .collect::<Result<Clause>>()?;
        clauses.push(clause);
    }

    Ok(clauses)
}

fn parse_alternative(raw: &str, source: bool) -> std::result::Result<Alternative, String> {
    let mut rest = raw.trim();
    if rest.is_empty() {
        return Err("empty alternative".to_string());
    }

    let name_end = rest
        .find(|c: char| c.is_whitespace() || matches!(c, '(' | '[' | '<'))
        .unwrap_or(rest.len());
    let (name, tail) = rest.split_at(name_end);
    let name = name.split_once(':').map_or(name, |(pkg, _arch)| pkg);
    if !PACKAGE_NAME.is_match(name) {
        return Err(format!("invalid package name '{}'", name));
    }
    rest = tail.trim_start();

    let mut relation = None;
    let mut version = None;
    if let Some(inner) = rest.strip_prefix('(') {
        let close = inner
            .find(')')
            .ok_or_else(|| format!("unterminated version for '{}'", name))?;
        let constraint = inner[..close].trim();
        let op_end = constraint
            .find(|c: char| !matches!(c, '<' | '>' | '='))
            .unwrap_or(constraint.len());
        let (op, ver) = constraint.split_at(op_end);
        let ver = ver.trim();
        relation = Some(
            Relation::parse(op).ok_or_else(|| format!("invalid relation '{}' for '{}'", op, name))?,
        );
        if ver.is_empty() || ver.contains(char::is_whitespace) {
            return Err(format!("invalid version '{}' for '{}'", ver, name));
        }
        version = Some(ver.to_string());
        rest = inner[close + 1..].trim_start();
    }

    while !rest.is_empty() {
        let (open, close) = match rest.as_bytes()[0] {
            b'[' if source => ('[', ']'),
            b'<' if source => ('<', '>'),
            _ => return Err(format!("unexpected '{}' after '{}'", rest, name)),
        };
        let end = rest
            .find(close)
            .ok_or_else(|| format!("unterminated '{}' restriction for '{}'", open, name))?;
        rest = rest[end + 1..].trim_start();
    }

    Ok(Alternative {
        package: name.to_string(),
        relation,
        version,
    })
}

/// Render a clause the way breakage reports print it: `a (>= 1) |b`
pub fn format_alternatives(clause: &[Alternative]) -> String {
    clause
        .iter()
        .map(|alt| alt.to_string())
        .collect::<Vec<_>>()
        .join(" |")
}

/// Remove `[arch]` restriction lists so a clause reads the same on every
/// build architecture
pub fn strip_arch_restrictions(text: &str) -> String {
    BUILD_DEP_ARCH.replace_all(text, "").into_owned()
}

/// Source packages referenced by a binary's `Built-Using` field
///
/// Each clause must be a single alternative with an exact `=` version.
pub fn parse_built_using(text: Option<&str>) -> Result<Vec<(String, String)>> {
    let Some(text) = text else {
        return Ok(Vec::new());
    };

    let invalid = |reason: &str| Error::Dependency {
        text: text.to_string(),
        reason: reason.to_string(),
    };

    let mut built_using = Vec::new();
    for clause in parse_depends(text)? {
        let [alt] = clause.as_slice() else {
            return Err(invalid("alternatives are not allowed in Built-Using"));
        };
        match (alt.relation, &alt.version) {
            (Some(Relation::Equal), Some(version)) => {
                built_using.push((alt.package.clone(), version.clone()));
            }
            _ => return Err(invalid("Built-Using must contain strict dependencies")),
        }
    }

    Ok(built_using)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(clauses: &[Clause]) -> Vec<Vec<&str>> {
        clauses
            .iter()
            .map(|c| c.iter().map(|a| a.package.as_str()).collect())
            .collect()
    }

    #[test]
    fn test_clauses_and_alternatives() {
        let clauses = parse_depends("libc6 (>= 2.36), foo | bar (<< 2.0), baz:any").unwrap();
        assert_eq!(names(&clauses), vec![vec!["libc6"], vec!["foo", "bar"], vec!["baz"]]);
        assert_eq!(clauses[0][0].relation, Some(Relation::LaterEqual));
        assert_eq!(clauses[0][0].version.as_deref(), Some("2.36"));
        assert_eq!(clauses[1][1].relation, Some(Relation::Earlier));
    }

    #[test]
    fn test_legacy_operators() {
        let clauses = parse_depends("a (< 1), b (> 2), c (>=3)").unwrap();
        assert_eq!(clauses[0][0].relation, Some(Relation::EarlierEqual));
        assert_eq!(clauses[1][0].relation, Some(Relation::LaterEqual));
        assert_eq!(clauses[2][0].version.as_deref(), Some("3"));
    }

    #[test]
    fn test_multiline_and_empty_fields() {
        assert!(parse_depends("").unwrap().is_empty());
        let clauses = parse_depends("a,\n b,\n c,").unwrap();
        assert_eq!(names(&clauses), vec![vec!["a"], vec!["b"], vec!["c"]]);
    }

    #[test]
    fn test_malformed_fields() {
        assert!(parse_depends("foo (>= 1.0").is_err());
        assert!(parse_depends("foo (~ 1.0)").is_err());
        assert!(parse_depends("foo bar").is_err());
        assert!(parse_depends("foo | , bar").is_err());
        assert!(parse_depends("foo [amd64]").is_err());
    }

    #[test]
    fn test_source_restrictions() {
        let clauses =
            parse_src_depends("debhelper-compat (= 13), libfoo-dev [linux-any] <!nocheck>").unwrap();
        assert_eq!(names(&clauses), vec![vec!["debhelper-compat"], vec!["libfoo-dev"]]);
    }

    #[test]
    fn test_strip_arch_restrictions() {
        assert_eq!(
            strip_arch_restrictions("a [amd64], b [!i386 !armel] | c"),
            "a , b  | c"
        );
    }

    #[test]
    fn test_format_alternatives() {
        let clauses = parse_depends("foo (>= 1.0) | bar").unwrap();
        assert_eq!(format_alternatives(&clauses[0]), "foo (>= 1.0) |bar");
    }

    #[test]
    fn test_built_using() {
        assert!(parse_built_using(None).unwrap().is_empty());
        assert_eq!(
            parse_built_using(Some("gcc-13 (= 13.2.0-7), glibc (= 2.37-12)")).unwrap(),
            vec![
                ("gcc-13".to_string(), "13.2.0-7".to_string()),
                ("glibc".to_string(), "2.37-12".to_string())
            ]
        );
        assert!(parse_built_using(Some("gcc-13 (>= 13)")).is_err());
        assert!(parse_built_using(Some("a (= 1) | b (= 2)")).is_err());
    }
}
