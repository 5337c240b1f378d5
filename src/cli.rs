//! Output for the covtree CLI.
//!
//! Each `cmd_*` function returns its output as a `String`, making them easy
//! to test without capturing stdout.

use std::fmt::Write;

use anyhow::{anyhow, Result};

use crate::model::CoverageMetrics;
use crate::tree::CoverageTree;

fn percent(rate: f64) -> f64 {
    rate * 100.0
}

pub fn cmd_summary(tree: &CoverageTree) -> String {
    let m: &CoverageMetrics = &tree.metrics;

    let mut out = String::new();
    writeln!(out, "Parsers:    {}", tree.parser_name).unwrap();
    writeln!(out, "Files:      {}", tree.file_count()).unwrap();
    writeln!(out, "Source:     {} lines", m.total_lines).unwrap();
    writeln!(
        out,
        "Lines:      {}/{} ({:.1}%)",
        m.lines_covered,
        m.lines_valid,
        percent(m.line_rate())
    )
    .unwrap();
    if m.branches_valid > 0 {
        writeln!(
            out,
            "Branches:   {}/{} ({:.1}%)",
            m.branches_covered,
            m.branches_valid,
            percent(m.branch_rate())
        )
        .unwrap();
    }
    if m.methods_valid > 0 {
        writeln!(
            out,
            "Methods:    {}/{} ({:.1}%), {} fully covered",
            m.methods_covered,
            m.methods_valid,
            percent(m.method_rate()),
            m.methods_fully_covered
        )
        .unwrap();
    }
    out
}

/// Per-file table, ordered by path or, with `sort_by_coverage`, by line
/// rate ascending.
pub fn cmd_files(tree: &CoverageTree, sort_by_coverage: bool) -> String {
    let mut files: Vec<_> = tree.files().collect();
    files.sort_by(|a, b| a.path.cmp(&b.path));
    if sort_by_coverage {
        files.sort_by(|a, b| a.metrics.line_rate().total_cmp(&b.metrics.line_rate()));
    }

    let mut out = String::new();
    writeln!(
        out,
        "{:<60} {:>10} {:>10} {:>10} {:>8}",
        "FILE", "LINES", "BRANCHES", "METHODS", "RATE"
    )
    .unwrap();
    writeln!(out, "{}", "-".repeat(102)).unwrap();

    for f in files {
        let m = &f.metrics;
        writeln!(
            out,
            "{:<60} {:>10} {:>10} {:>10} {:>7.1}%",
            f.path,
            format!("{}/{}", m.lines_covered, m.lines_valid),
            format!("{}/{}", m.branches_covered, m.branches_valid),
            format!("{}/{}", m.methods_covered, m.methods_valid),
            percent(m.line_rate())
        )
        .unwrap();
    }
    out
}

/// Methods and uncovered lines of one file.
pub fn cmd_file(tree: &CoverageTree, path: &str) -> Result<String> {
    let id = tree
        .find_file(path)
        .ok_or_else(|| anyhow!("No coverage data for '{}'", path))?;
    let file = tree.file(id);

    let mut out = String::new();
    writeln!(out, "{} ({} lines)", file.path, file.total_lines).unwrap();

    if !file.methods.is_empty() {
        writeln!(
            out,
            "  {:<50} {:>11} {:>10} {:>10}",
            "METHOD", "SPAN", "LINES", "COMPLEXITY"
        )
        .unwrap();
        for method in &file.methods {
            let complexity = method
                .cyclomatic_complexity
                .map_or_else(|| "-".to_string(), |c| c.to_string());
            writeln!(
                out,
                "  {:<50} {:>11} {:>10} {:>10}",
                method.name,
                format!("{}-{}", method.start_line, method.end_line),
                format!("{}/{}", method.lines_covered, method.lines_valid),
                complexity
            )
            .unwrap();
        }
    }

    let uncovered: Vec<u32> = file
        .lines
        .iter()
        .filter(|(_, l)| l.is_coverable() && !l.is_covered())
        .map(|(&n, _)| n)
        .collect();
    if uncovered.is_empty() {
        writeln!(out, "  All coverable lines are covered").unwrap();
    } else {
        writeln!(out, "  Uncovered: {}", format_line_ranges(&uncovered)).unwrap();
    }
    Ok(out)
}

pub fn cmd_json(tree: &CoverageTree) -> Result<String> {
    Ok(serde_json::to_string_pretty(tree)?)
}

/// Format sorted line numbers into compact range notation, e.g. "1, 3-5, 8".
#[must_use]
pub fn format_line_ranges(lines: &[u32]) -> String {
    let mut ranges: Vec<(u32, u32)> = Vec::new();
    for &line in lines {
        match ranges.last_mut() {
            Some((_, end)) if *end + 1 == line => *end = line,
            _ => ranges.push((line, line)),
        }
    }
    ranges
        .iter()
        .map(|&(start, end)| {
            if start == end {
                start.to_string()
            } else {
                format!("{start}-{end}")
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_at;
    use crate::model::{FileCoverage, LineMetrics, ParserResult};

    fn tree() -> CoverageTree {
        let mut report = ParserResult::new("lcov", "");
        report.file_coverage.push(
            FileCoverage::new("src/a.rs".to_string())
                .with_line(1, LineMetrics::new(1))
                .with_line(2, LineMetrics::new(0))
                .with_line(3, LineMetrics::new(0))
                .with_line(5, LineMetrics::with_branches(2, 1, 2)),
        );
        build_at(&[report], 0).unwrap()
    }

    #[test]
    fn test_format_line_ranges() {
        assert_eq!(format_line_ranges(&[]), "");
        assert_eq!(format_line_ranges(&[1, 3, 4, 5, 8]), "1, 3-5, 8");
    }

    #[test]
    fn test_cmd_summary() {
        let out = cmd_summary(&tree());
        assert!(out.contains("Parsers:    lcov"));
        assert!(out.contains("Files:      1"));
        assert!(out.contains("Lines:      2/4 (50.0%)"));
        assert!(out.contains("Branches:   1/2 (50.0%)"));
        assert!(!out.contains("Methods:"));
    }

    #[test]
    fn test_cmd_files() {
        let out = cmd_files(&tree(), true);
        assert!(out.starts_with("FILE"));
        assert!(out.contains("src/a.rs"));
        assert!(out.contains("50.0%"));
    }

    #[test]
    fn test_cmd_files_ordering() {
        let mut report = ParserResult::new("lcov", "");
        report.file_coverage.push(
            FileCoverage::new("src/z.rs".to_string()).with_line(1, LineMetrics::new(0)),
        );
        report.file_coverage.push(
            FileCoverage::new("src/b.rs".to_string()).with_line(1, LineMetrics::new(3)),
        );
        let tree = build_at(&[report], 0).unwrap();

        let by_path = cmd_files(&tree, false);
        assert!(by_path.find("src/b.rs").unwrap() < by_path.find("src/z.rs").unwrap());

        let by_rate = cmd_files(&tree, true);
        assert!(by_rate.find("src/z.rs").unwrap() < by_rate.find("src/b.rs").unwrap());
    }

    #[test]
    fn test_cmd_file() {
        let out = cmd_file(&tree(), "src/a.rs").unwrap();
        assert!(out.contains("Uncovered: 2-3"));
        assert!(cmd_file(&tree(), "missing.rs").is_err());
    }

    #[test]
    fn test_cmd_json() {
        let json = cmd_json(&tree()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["parser_name"], "lcov");
        assert_eq!(value["metrics"]["lines_valid"], 4);
        assert!(value["root"]["subdirs"]["src"]["files"]["a.rs"].is_object());
    }
}
