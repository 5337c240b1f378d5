mod common;

use common::{record, report};
use covtree::aggregate::aggregate;
use covtree::builder::build_at;
use covtree::error::CovtreeError;
use covtree::model::{CoverageMetrics, FileCoverage, LineMetrics};

#[test]
fn merge_sums_hits_across_reports() {
    let a = report("lcov", "", vec![record("pkg/a.go", &[(1, 1)])]);
    let b = report("gocover", "", vec![record("pkg/a.go", &[(1, 0)])]);
    let tree = build_at(&[a, b], 0).unwrap();

    let file = tree.file(tree.find_file("pkg/a.go").unwrap());
    assert_eq!(file.lines[&1].hits, 1);
    assert_eq!(file.metrics.lines_covered, 1);
    assert_eq!(file.metrics.lines_valid, 1);
    assert_eq!(tree.parser_name, "lcov, gocover");
}

#[test]
fn merging_twice_equals_double_hits() {
    let twice = vec![
        report("lcov", "", vec![record("src/x.c", &[(5, 1), (6, 0)])]),
        report("lcov", "", vec![record("src/x.c", &[(5, 1), (6, 0)])]),
    ];
    let once = vec![report("lcov", "", vec![record("src/x.c", &[(5, 2), (6, 0)])])];

    let merged = build_at(&twice, 0).unwrap();
    let single = build_at(&once, 0).unwrap();
    let lines_merged = &merged.file(merged.find_file("src/x.c").unwrap()).lines;
    let lines_single = &single.file(single.find_file("src/x.c").unwrap()).lines;
    assert_eq!(lines_merged, lines_single);
    assert_eq!(merged.metrics, single.metrics);
}

#[test]
fn total_branches_last_nonzero_wins() {
    let a = report(
        "cobertura",
        "",
        vec![FileCoverage::new("m.py".to_string()).with_line(10, LineMetrics::with_branches(1, 1, 2))],
    );
    let b = report(
        "cobertura",
        "",
        vec![FileCoverage::new("m.py".to_string()).with_line(10, LineMetrics::with_branches(1, 1, 2))],
    );
    let tree = build_at(&[a, b], 0).unwrap();

    let line = tree.file(tree.find_file("m.py").unwrap()).lines[&10];
    assert_eq!(line.total_branches, 2);
    assert_eq!(line.covered_branches, 2);
    assert_eq!(tree.metrics.branches_valid, 2);
}

#[test]
fn directory_metrics_equal_sum_of_children() {
    let reports = vec![report(
        "lcov",
        "",
        vec![
            record("a/one.rs", &[(1, 1), (2, 0)]),
            record("a/b/two.rs", &[(1, 3), (2, -1), (3, 0)]),
            record("a/b/three.rs", &[(1, 0)]),
            record("top.rs", &[(1, 1)]),
        ],
    )];
    let tree = build_at(&reports, 0).unwrap();

    let b = tree.dir(tree.find_dir("a/b").unwrap());
    let mut expected = CoverageMetrics::default();
    for &id in b.files.values() {
        expected += tree.file(id).metrics;
    }
    assert_eq!(b.metrics, expected);

    let a = tree.dir(tree.find_dir("a").unwrap());
    let mut expected = b.metrics;
    for &id in a.files.values() {
        expected += tree.file(id).metrics;
    }
    assert_eq!(a.metrics, expected);

    assert_eq!(tree.metrics, tree.dir(tree.root()).metrics);
    assert_eq!(tree.metrics.lines_valid, 6);
    assert_eq!(tree.metrics.lines_covered, 3);
}

#[test]
fn aggregate_is_idempotent() {
    let reports = vec![report("lcov", "", vec![record("x/y/z.go", &[(1, 1), (4, 0)])])];
    let mut tree = build_at(&reports, 0).unwrap();
    let first = tree.metrics;
    assert_eq!(aggregate(&mut tree), first);
    assert_eq!(aggregate(&mut tree), first);
}

#[test]
fn sentinel_lines_never_count_as_valid() {
    let reports = vec![report("lcov", "", vec![record("s.c", &[(1, -1), (2, -1), (3, 2)])])];
    let tree = build_at(&reports, 0).unwrap();
    assert_eq!(tree.metrics.lines_valid, 1);
    assert_eq!(tree.metrics.lines_covered, 1);
}

#[test]
fn paths_are_normalized_into_one_node() {
    let reports = vec![report(
        "lcov",
        "",
        vec![
            record("src\\lib.rs", &[(1, 1)]),
            record("./src/lib.rs", &[(1, 2)]),
            record("src//lib.rs", &[(2, 0)]),
        ],
    )];
    let tree = build_at(&reports, 0).unwrap();
    assert_eq!(tree.file_count(), 1);
    let file = tree.file(tree.find_file("src/lib.rs").unwrap());
    assert_eq!(file.lines[&1].hits, 3);
    assert_eq!(file.lines.len(), 2);
}

#[test]
fn no_records_is_an_error() {
    let reports = vec![report("lcov", "", Vec::new())];
    assert!(matches!(build_at(&reports, 0), Err(CovtreeError::NoInputRecords)));
}
