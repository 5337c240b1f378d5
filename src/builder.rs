//! Builds a `CoverageTree` from decoded reports, merging records that refer
//! to the same file.

use std::collections::BTreeMap;

use chrono::Utc;
use tracing::{debug, warn};

use crate::aggregate::aggregate;
use crate::error::{CovtreeError, Result};
use crate::model::{FileCoverage, LineMetrics, ParserResult};
use crate::tree::{path_segments, CoverageTree};

/// Build and aggregate a tree from every record of every report.
///
/// Fails with `NoInputRecords` when the reports hold no file records at all.
pub fn build(reports: &[ParserResult]) -> Result<CoverageTree> {
    build_at(reports, Utc::now().timestamp())
}

/// Same as [`build`], with an explicit timestamp.
pub fn build_at(reports: &[ParserResult], timestamp: i64) -> Result<CoverageTree> {
    let record_count: usize = reports.iter().map(|r| r.file_coverage.len()).sum();
    if record_count == 0 {
        return Err(CovtreeError::NoInputRecords);
    }

    let mut tree = CoverageTree::new(parser_names(reports), timestamp);
    for report in reports {
        for record in &report.file_coverage {
            merge_record(&mut tree, record, &report.source_directory);
        }
    }
    debug!(
        "Merged {} records into {} files",
        record_count,
        tree.file_count()
    );

    aggregate(&mut tree);
    Ok(tree)
}

/// Distinct parser names in first-seen order.
fn parser_names(reports: &[ParserResult]) -> String {
    let mut names: Vec<&str> = Vec::new();
    for report in reports {
        let name = report.parser_name.as_str();
        if !name.is_empty() && !names.contains(&name) {
            names.push(name);
        }
    }
    names.join(", ")
}

/// Locate or create the file node for `record` and merge its lines into it.
/// Returns false when the record's path has no usable segments.
pub fn merge_record(tree: &mut CoverageTree, record: &FileCoverage, source_dir: &str) -> bool {
    let segments = path_segments(&record.path);
    let Some(id) = tree.file_entry(&segments) else {
        warn!("Skipping coverage record with empty path '{}'", record.path);
        return false;
    };

    let file = tree.file_mut(id);
    merge_lines(&mut file.lines, &record.lines);

    if file.report_path.is_empty() {
        file.report_path = record.path.clone();
    }
    if file.source_dir.is_empty() && !source_dir.is_empty() {
        file.source_dir = source_dir.to_string();
    }
    if let Some((&last, _)) = record.lines.last_key_value() {
        file.total_lines = file.total_lines.max(u64::from(last));
    }
    true
}

/// Merge `incoming` into `existing`, line by line.
///
/// - `hits` are summed; the `-1` sentinel yields to any coverable value.
/// - `covered_branches` are summed.
/// - `total_branches` is overwritten by the latest non-zero value. Reports
///   that disagree on the denominator for a line leave it at whichever
///   record was merged last.
pub fn merge_lines(existing: &mut BTreeMap<u32, LineMetrics>, incoming: &BTreeMap<u32, LineMetrics>) {
    for (&line_number, line) in incoming {
        match existing.get_mut(&line_number) {
            None => {
                existing.insert(line_number, *line);
            }
            Some(current) => {
                current.hits = merge_hits(current.hits, line.hits);
                current.covered_branches += line.covered_branches;
                if line.total_branches != 0 {
                    current.total_branches = line.total_branches;
                }
            }
        }
    }
}

fn merge_hits(a: i64, b: i64) -> i64 {
    match (a >= 0, b >= 0) {
        (true, true) => a + b,
        (true, false) => a,
        (false, true) => b,
        (false, false) => LineMetrics::NOT_COVERABLE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(entries: &[(u32, LineMetrics)]) -> BTreeMap<u32, LineMetrics> {
        entries.iter().copied().collect()
    }

    #[test]
    fn test_hits_are_summed() {
        let mut existing = lines(&[(5, LineMetrics::new(1))]);
        merge_lines(&mut existing, &lines(&[(5, LineMetrics::new(1))]));

        let mut single = BTreeMap::new();
        merge_lines(&mut single, &lines(&[(5, LineMetrics::new(2))]));

        assert_eq!(existing, single);
        assert_eq!(existing[&5].hits, 2);
    }

    #[test]
    fn test_total_branches_overwritten_not_summed() {
        let mut existing = lines(&[(10, LineMetrics::with_branches(1, 1, 2))]);
        merge_lines(&mut existing, &lines(&[(10, LineMetrics::with_branches(1, 1, 2))]));

        assert_eq!(existing[&10].total_branches, 2);
        assert_eq!(existing[&10].covered_branches, 2);
    }

    #[test]
    fn test_zero_total_branches_keeps_existing() {
        let mut existing = lines(&[(10, LineMetrics::with_branches(1, 0, 4))]);
        merge_lines(&mut existing, &lines(&[(10, LineMetrics::new(3))]));

        assert_eq!(existing[&10].total_branches, 4);
        assert_eq!(existing[&10].hits, 4);
    }

    #[test]
    fn test_sentinel_yields_to_coverable() {
        let mut existing = lines(&[
            (1, LineMetrics::not_coverable()),
            (2, LineMetrics::new(3)),
            (3, LineMetrics::not_coverable()),
        ]);
        merge_lines(
            &mut existing,
            &lines(&[
                (1, LineMetrics::new(0)),
                (2, LineMetrics::not_coverable()),
                (3, LineMetrics::not_coverable()),
            ]),
        );

        assert_eq!(existing[&1].hits, 0);
        assert_eq!(existing[&2].hits, 3);
        assert_eq!(existing[&3].hits, -1);
    }

    #[test]
    fn test_new_lines_are_inserted() {
        let mut existing = lines(&[(1, LineMetrics::new(1))]);
        merge_lines(&mut existing, &lines(&[(7, LineMetrics::new(0))]));
        assert_eq!(existing.len(), 2);
        assert_eq!(existing[&7].hits, 0);
    }

    #[test]
    fn test_build_empty_fails() {
        let result = build(&[]);
        assert!(matches!(result, Err(CovtreeError::NoInputRecords)));

        let empty_report = ParserResult::new("lcov", "");
        let result = build(&[empty_report]);
        assert!(matches!(result, Err(CovtreeError::NoInputRecords)));
    }

    #[test]
    fn test_parser_names_deduplicated() {
        let reports = vec![
            ParserResult::new("lcov", ""),
            ParserResult::new("cobertura", ""),
            ParserResult::new("lcov", ""),
        ];
        assert_eq!(parser_names(&reports), "lcov, cobertura");
    }

    #[test]
    fn test_merge_record_keeps_first_source_hint() {
        let mut tree = CoverageTree::new("test", 0);
        let record = FileCoverage::new("pkg/a.go".to_string()).with_line(12, LineMetrics::new(1));
        assert!(merge_record(&mut tree, &record, ""));
        assert!(merge_record(&mut tree, &record, "/first"));
        assert!(merge_record(&mut tree, &record, "/second"));

        let file = tree.file(tree.find_file("pkg/a.go").unwrap());
        assert_eq!(file.source_dir, "/first");
        assert_eq!(file.total_lines, 12);
        assert_eq!(file.lines[&12].hits, 3);
    }

    #[test]
    fn test_merge_record_empty_path_skipped() {
        let mut tree = CoverageTree::new("test", 0);
        let record = FileCoverage::new("./".to_string()).with_line(1, LineMetrics::new(1));
        assert!(!merge_record(&mut tree, &record, ""));
        assert_eq!(tree.file_count(), 0);
    }
}
