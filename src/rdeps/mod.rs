// src/rdeps/mod.rs

//! Reverse dependency breakage analysis
//!
//! Given a set of binary package names proposed for removal from a suite,
//! find every remaining binary whose `Depends` and every newest source
//! whose `Build-Depends` would no longer be satisfiable.
//!
//! The analysis reads already-ingested metadata through [`MetadataStore`]
//! and never looks at versions: a clause breaks only when every one of its
//! alternatives names a removed package.

mod report;

pub use report::{BreakageReport, ReportStyle};

use crate::depends::{
    format_alternatives, parse_depends, parse_src_depends, strip_arch_restrictions, Alternative,
};
use crate::error::{Error, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;
use tracing::{debug, info, warn};

/// Architecture-independent pseudo architecture
pub const ARCH_ALL: &str = "all";
/// Source pseudo architecture
pub const ARCH_SOURCE: &str = "source";

/// A suite as known to the metadata store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suite {
    pub id: i64,
    pub name: String,
    pub codename: Option<String>,
    /// Suite whose overrides decide source components, when not this one
    pub overridesuite: Option<String>,
}

/// One binary package of a suite on one architecture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryRow {
    pub package: String,
    pub source: String,
    pub component: String,
    pub depends: Option<String>,
    pub provides: Option<String>,
}

/// Build dependencies of the newest version of one source in a suite
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRow {
    pub source: String,
    /// `Build-Depends` (and `Build-Depends-Indep` when requested) joined
    /// with `, `
    pub build_depends: Option<String>,
}

/// Read-only queries the analyzer issues against archive metadata
pub trait MetadataStore {
    fn suite_by_name(&self, name: &str) -> Result<Option<Suite>>;

    fn suite_by_codename(&self, codename: &str) -> Result<Option<Suite>>;

    /// Architectures configured for a suite, pseudo architectures included
    fn suite_architectures(&self, suite: &Suite) -> Result<Vec<String>>;

    /// Whether the archive knows the architecture at all
    fn has_architecture(&self, arch: &str) -> Result<bool>;

    /// Every binary associated with `suite` built for `arch`
    fn binaries(&self, suite: &Suite, arch: &str) -> Result<Vec<BinaryRow>>;

    /// Build dependencies of the newest version of each source in `suite`
    fn source_build_depends(&self, suite: &Suite, include_indep: bool) -> Result<Vec<SourceRow>>;

    /// Component of a source according to the overrides of `suite`
    fn source_component(&self, suite: &Suite, source: &str) -> Result<Option<String>>;
}

/// Find a suite by name, falling back to its codename
pub fn resolve_suite<S: MetadataStore + ?Sized>(store: &S, name: &str) -> Result<Option<Suite>> {
    if let Some(suite) = store.suite_by_name(name)? {
        return Ok(Some(suite));
    }
    store.suite_by_codename(name)
}

/// Knobs for one analysis run
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    /// Architectures to check; `None` means every architecture of the suite
    pub architectures: Option<Vec<String>>,
    /// Also check `Architecture: all` binaries and `Build-Depends-Indep`
    pub include_arch_all: bool,
    /// Skip rendering the report
    pub quiet: bool,
    pub style: ReportStyle,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            architectures: None,
            include_arch_all: true,
            quiet: false,
            style: ReportStyle::Verbose,
        }
    }
}

/// Result of an analysis run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BreakageOutcome {
    /// At least one `Depends` or `Build-Depends` clause broke
    pub broken: bool,
    pub report: BreakageReport,
}

/// Run the analysis and print the report to `out` unless `options.quiet`
pub fn check_reverse_depends<S, W>(
    store: &S,
    removals: &BTreeSet<String>,
    suite: &str,
    options: &AnalysisOptions,
    out: &mut W,
) -> Result<BreakageOutcome>
where
    S: MetadataStore + ?Sized,
    W: Write + ?Sized,
{
    let outcome = analyze(store, removals, suite, options)?;
    if !options.quiet {
        outcome.report.write_to(out, options.style)?;
    }
    Ok(outcome)
}

/// Determine what removing `removals` from `suite` would break
pub fn analyze<S: MetadataStore + ?Sized>(
    store: &S,
    removals: &BTreeSet<String>,
    suite: &str,
    options: &AnalysisOptions,
) -> Result<BreakageOutcome> {
    let dbsuite =
        resolve_suite(store, suite)?.ok_or_else(|| Error::NotFound(format!("suite {}", suite)))?;
    let overridesuite = match &dbsuite.overridesuite {
        Some(name) => resolve_suite(store, name)?
            .ok_or_else(|| Error::NotFound(format!("override suite {}", name)))?,
        None => dbsuite.clone(),
    };

    let mut all_arches: BTreeSet<String> = match &options.architectures {
        Some(arches) => arches.iter().cloned().collect(),
        None => store.suite_architectures(&dbsuite)?.into_iter().collect(),
    };
    all_arches.remove(ARCH_SOURCE);
    all_arches.remove(ARCH_ALL);

    let mut rdep_architectures = all_arches.clone();
    if options.include_arch_all {
        rdep_architectures.insert(ARCH_ALL.to_string());
    }

    info!(
        "Checking reverse dependencies of {} package(s) in {} on {} architecture(s)",
        removals.len(),
        dbsuite.name,
        rdep_architectures.len()
    );

    let mut report = BreakageReport::new(all_arches);
    let mut broken = false;
    let mut expanded_virtuals = BTreeSet::new();

    for architecture in &rdep_architectures {
        if !store.has_architecture(architecture)? {
            debug!("Skipping unknown architecture {}", architecture);
            continue;
        }

        let rows = store.binaries(&dbsuite, architecture)?;
        let virtuals = removed_virtuals(&rows, removals);
        debug!(
            "{}: {} virtual package(s) lose every provider",
            architecture,
            virtuals.len()
        );

        let effective = EffectiveRemovals {
            removals,
            virtuals: &virtuals,
        };

        for row in &rows {
            if removals.contains(&row.package) {
                continue;
            }
            let Some(depends) = &row.depends else {
                continue;
            };
            let clauses = match parse_depends(depends) {
                Ok(clauses) => clauses,
                Err(e) => {
                    warn!("Error for package {}: {}", row.package, e);
                    continue;
                }
            };

            if clauses.iter().any(|clause| effective.breaks(clause)) {
                report.add_binary(
                    source_key(&row.source, &row.component),
                    &row.package,
                    architecture,
                );
                broken = true;
            }
        }

        expanded_virtuals.extend(virtuals);
    }

    let effective = EffectiveRemovals {
        removals,
        virtuals: &expanded_virtuals,
    };

    for row in store.source_build_depends(&dbsuite, options.include_arch_all)? {
        if removals.contains(&row.source) {
            continue;
        }
        let Some(build_dep) = row.build_depends else {
            continue;
        };
        let clauses = match parse_src_depends(&strip_arch_restrictions(&build_dep)) {
            Ok(clauses) => clauses,
            Err(e) => {
                warn!("Error for source {}: {}", row.source, e);
                continue;
            }
        };

        for clause in clauses.iter().filter(|clause| effective.breaks(clause)) {
            let component = store
                .source_component(&overridesuite, &row.source)?
                .unwrap_or_else(|| "main".to_string());
            report.add_build_depends(source_key(&row.source, &component), format_alternatives(clause));
            broken = true;
        }
    }

    Ok(BreakageOutcome { broken, report })
}

/// The removal set plus the virtual packages it takes away
struct EffectiveRemovals<'a> {
    removals: &'a BTreeSet<String>,
    virtuals: &'a BTreeSet<String>,
}

impl EffectiveRemovals<'_> {
    fn contains(&self, package: &str) -> bool {
        self.removals.contains(package) || self.virtuals.contains(package)
    }

    /// A clause breaks when none of its alternatives survive
    fn breaks(&self, clause: &[Alternative]) -> bool {
        !clause.is_empty() && clause.iter().all(|alt| self.contains(&alt.package))
    }
}

/// Virtual packages whose every provider on this architecture is removed
///
/// Single pass: a virtual package is not re-examined when a provider of it
/// is itself a virtual package added here.
fn removed_virtuals(rows: &[BinaryRow], removals: &BTreeSet<String>) -> BTreeSet<String> {
    let mut providers: BTreeMap<String, usize> = BTreeMap::new();

    for row in rows {
        let Some(provides) = &row.provides else {
            continue;
        };
        for virtual_pkg in provides.split(',').filter_map(provided_name) {
            if virtual_pkg == row.package {
                continue;
            }
            let count = providers.entry(virtual_pkg.to_string()).or_insert(0);
            if !removals.contains(&row.package) {
                *count += 1;
            }
        }
    }

    providers
        .into_iter()
        .filter(|(_, count)| *count == 0)
        .map(|(name, _)| name)
        .collect()
}

/// Name part of one `Provides` entry (`foo (= 1.0)` provides `foo`)
fn provided_name(entry: &str) -> Option<&str> {
    entry
        .split(|c: char| c.is_whitespace() || c == '(')
        .find(|s| !s.is_empty())
}

/// Report key for a source: bare name in `main`, `name/component` otherwise
fn source_key(source: &str, component: &str) -> String {
    if component == "main" {
        source.to_string()
    } else {
        format!("{}/{}", source, component)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(package: &str, depends: Option<&str>, provides: Option<&str>) -> BinaryRow {
        BinaryRow {
            package: package.to_string(),
            source: package.to_string(),
            component: "main".to_string(),
            depends: depends.map(str::to_string),
            provides: provides.map(str::to_string),
        }
    }

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_virtual_with_only_removed_providers() {
        let rows = vec![
            row("b", None, Some("v, b")),
            row("c", None, Some("w")),
            row("d", None, Some("w (= 1.0)")),
        ];
        assert_eq!(removed_virtuals(&rows, &set(&["b", "c"])), set(&["v"]));
    }

    #[test]
    fn test_virtual_closure_is_single_pass() {
        // The package named v1 keeps counting as a provider of v2 even
        // though v1 is removed as a virtual package in the same pass
        let rows = vec![row("b", None, Some("v1")), row("v1", None, Some("v2"))];
        assert_eq!(removed_virtuals(&rows, &set(&["b"])), set(&["v1"]));
    }

    #[test]
    fn test_clause_needs_every_alternative_removed() {
        let removals = set(&["b"]);
        let virtuals = BTreeSet::new();
        let effective = EffectiveRemovals {
            removals: &removals,
            virtuals: &virtuals,
        };
        let either = parse_depends("b | d").unwrap();
        let only = parse_depends("b").unwrap();
        assert!(!effective.breaks(&either[0]));
        assert!(effective.breaks(&only[0]));
    }

    #[test]
    fn test_source_key() {
        assert_eq!(source_key("foo", "main"), "foo");
        assert_eq!(source_key("foo", "contrib"), "foo/contrib");
    }
}
