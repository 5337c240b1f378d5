mod common;

use std::path::Path;

use common::write_source;
use covtree::builder::build_at;
use covtree::error::CovtreeError;
use covtree::ingest::load_report;
use covtree::parsers::Format;

const COBERTURA: &str = r#"<?xml version="1.0" ?>
<coverage version="7.4">
  <sources><source>/home/ci/project</source></sources>
  <packages><package name="app"><classes>
    <class name="main.py" filename="app/main.py">
      <lines>
        <line number="1" hits="1"/>
        <line number="4" hits="0" branch="true" condition-coverage="50% (1/2)"/>
      </lines>
    </class>
  </classes></package></packages>
</coverage>
"#;

#[test]
fn lcov_detected_by_content() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_source(dir.path(), "report.txt", "SF:src/lib.rs\nDA:1,3\nDA:2,0\nend_of_record\n");

    let report = load_report(&path, None, None).unwrap();
    assert_eq!(report.parser_name, "lcov");
    assert_eq!(report.file_coverage.len(), 1);
    assert_eq!(report.source_directory, dir.path().display().to_string());
}

#[test]
fn cobertura_source_becomes_hint() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_source(dir.path(), "coverage.xml", COBERTURA);

    let report = load_report(&path, None, None).unwrap();
    assert_eq!(report.parser_name, "cobertura");
    assert_eq!(report.source_directory, "/home/ci/project");

    let tree = build_at(&[report], 0).unwrap();
    let file = tree.file(tree.find_file("app/main.py").unwrap());
    assert_eq!(file.source_dir, "/home/ci/project");
    assert_eq!(tree.metrics.branches_valid, 2);
    assert_eq!(tree.metrics.branches_covered, 1);
}

#[test]
fn explicit_source_dir_wins() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_source(dir.path(), "coverage.xml", COBERTURA);

    let report = load_report(&path, None, Some(Path::new("/checkout"))).unwrap();
    assert_eq!(report.source_directory, "/checkout");
}

#[test]
fn gocover_with_format_override() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_source(
        dir.path(),
        "cover.out",
        "example.com/pkg/main.go:1.1,3.10 2 5\nexample.com/pkg/main.go:5.1,6.10 1 0\n",
    );

    let report = load_report(&path, Some(Format::Gocover), None).unwrap();
    assert_eq!(report.parser_name, "gocover");
    let tree = build_at(&[report], 0).unwrap();
    assert_eq!(tree.metrics.lines_valid, 5);
    assert_eq!(tree.metrics.lines_covered, 3);
}

#[test]
fn unknown_format_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_source(dir.path(), "notes.dat", "hello world\n");
    assert!(matches!(load_report(&path, None, None), Err(CovtreeError::UnknownFormat)));
}

#[test]
fn missing_report_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = load_report(&dir.path().join("absent.info"), None, None);
    assert!(matches!(result, Err(CovtreeError::Io(_))));
}
