mod common;

use common::write_source;
use covtree::error::CovtreeError;
use covtree::resolve::resolve;

#[test]
fn absolute_path_ignores_candidates() {
    let real = tempfile::tempdir().unwrap();
    let decoy = tempfile::tempdir().unwrap();
    let target = write_source(real.path(), "lib/util.py", "x = 1\n");
    write_source(decoy.path(), "lib/util.py", "x = 2\n");

    let found = resolve(target.to_str().unwrap(), &[decoy.path().to_path_buf()]).unwrap();
    assert_eq!(found, target);
}

#[test]
fn suffix_match_recovers_ci_paths() {
    let local = tempfile::tempdir().unwrap();
    let target = write_source(local.path(), "src/app.go", "package main\n");

    let found = resolve("/ci/workspace/src/app.go", &[local.path().to_path_buf()]).unwrap();
    assert_eq!(found, target);
}

#[test]
fn direct_join_beats_suffix_match() {
    let root = tempfile::tempdir().unwrap();
    let direct = write_source(root.path(), "pkg/src/app.go", "package a\n");
    write_source(root.path(), "src/app.go", "package b\n");

    let found = resolve("pkg/src/app.go", &[root.path().to_path_buf()]).unwrap();
    assert_eq!(found, direct);
}

#[test]
fn filename_search_is_last_resort() {
    let root = tempfile::tempdir().unwrap();
    let target = write_source(root.path(), "deeply/nested/Widget.java", "class Widget {}\n");

    let found = resolve("com/example/Widget.java", &[root.path().to_path_buf()]).unwrap();
    assert_eq!(found, target);
}

#[test]
fn missing_file_is_not_found() {
    let root = tempfile::tempdir().unwrap();
    let result = resolve("nowhere/gone.rs", &[root.path().to_path_buf()]);
    assert!(matches!(result, Err(CovtreeError::PathNotFound(_))));
}
