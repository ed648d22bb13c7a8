// src/rdeps/report.rs

//! Breakage report accumulation and rendering

use super::ARCH_ALL;
use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, Write};

/// Output layout of a rendered report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportStyle {
    /// `# Broken Depends:` headers, one blank line after each section
    #[default]
    Verbose,
    /// Indented `  - broken Depends:` blocks for cruft reports
    Cruft,
}

/// What a removal would break, keyed and sorted by source
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BreakageReport {
    /// Every architecture checked, pseudo architectures excluded
    pub all_arches: BTreeSet<String>,
    /// source key → binary → architectures it breaks on
    pub depends: BTreeMap<String, BTreeMap<String, BTreeSet<String>>>,
    /// source key → broken build dependency clauses
    pub build_depends: BTreeMap<String, BTreeSet<String>>,
}

impl BreakageReport {
    pub fn new(all_arches: BTreeSet<String>) -> Self {
        Self {
            all_arches,
            ..Default::default()
        }
    }

    pub(crate) fn add_binary(&mut self, source: String, binary: &str, arch: &str) {
        self.depends
            .entry(source)
            .or_default()
            .entry(binary.to_string())
            .or_default()
            .insert(arch.to_string());
    }

    pub(crate) fn add_build_depends(&mut self, source: String, clause: String) {
        self.build_depends.entry(source).or_default().insert(clause);
    }

    pub fn is_empty(&self) -> bool {
        self.depends.is_empty() && self.build_depends.is_empty()
    }

    /// `binary`, or `binary [arch ...]` when it does not break everywhere
    fn binary_line(&self, binary: &str, arches: &BTreeSet<String>) -> String {
        if *arches == self.all_arches || arches.contains(ARCH_ALL) {
            binary.to_string()
        } else {
            let list: Vec<&str> = arches.iter().map(String::as_str).collect();
            format!("{} [{}]", binary, list.join(" "))
        }
    }

    /// Render both sections; an empty section prints nothing
    pub fn write_to<W: Write + ?Sized>(&self, out: &mut W, style: ReportStyle) -> io::Result<()> {
        if !self.depends.is_empty() {
            let blocks = self.depends.iter().map(|(source, binaries)| {
                let lines: Vec<String> = binaries
                    .iter()
                    .map(|(binary, arches)| self.binary_line(binary, arches))
                    .collect();
                (source.as_str(), lines)
            });
            write_section(out, style, "Depends", blocks)?;
        }

        if !self.build_depends.is_empty() {
            let blocks = self
                .build_depends
                .iter()
                .map(|(source, clauses)| (source.as_str(), clauses.iter().cloned().collect::<Vec<_>>()));
            write_section(out, style, "Build-Depends", blocks)?;
        }

        Ok(())
    }

    /// Rendered report as a string
    pub fn render(&self, style: ReportStyle) -> String {
        let mut buf = Vec::new();
        // Writing into a Vec cannot fail
        let _ = self.write_to(&mut buf, style);
        String::from_utf8_lossy(&buf).into_owned()
    }
}

fn write_section<'a, W, I>(out: &mut W, style: ReportStyle, what: &str, blocks: I) -> io::Result<()>
where
    W: Write + ?Sized,
    I: Iterator<Item = (&'a str, Vec<String>)>,
{
    let indent = match style {
        ReportStyle::Verbose => {
            writeln!(out, "# Broken {}:", what)?;
            ""
        }
        ReportStyle::Cruft => {
            writeln!(out, "  - broken {}:", what)?;
            "    "
        }
    };

    for (source, lines) in blocks {
        let Some((first, rest)) = lines.split_first() else {
            continue;
        };
        writeln!(out, "{}{}: {}", indent, source, first)?;
        let pad = " ".repeat(source.len() + 2);
        for line in rest {
            writeln!(out, "{}{}{}", indent, pad, line)?;
        }
    }

    if style == ReportStyle::Verbose {
        writeln!(out)?;
    }
    Ok(())
}
