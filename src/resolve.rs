/// Locating a report's source file on disk.
///
/// Strategies, first success wins:
///   1. The path itself, when absolute and present.
///   2. Each candidate directory joined with the path.
///   3. Suffix matching: drop leading segments one at a time and retry the
///      join. Recovers paths captured under a different build root.
///   4. A depth-first search of each candidate for the same file name,
///      checking files at each level before descending.
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::error::{CovtreeError, Result};

/// Resolve `report_path` against `candidate_dirs`.
pub fn resolve(report_path: &str, candidate_dirs: &[PathBuf]) -> Result<PathBuf> {
    let normalized = report_path.replace('\\', "/");

    if let Some(found) = absolute(report_path, &normalized) {
        debug!("Resolved {} as absolute path", report_path);
        return Ok(found);
    }

    let segments = relative_segments(&normalized);
    if segments.is_empty() {
        return Err(CovtreeError::PathNotFound(report_path.to_string()));
    }

    if let Some(found) = join_first(&segments, candidate_dirs) {
        debug!("Resolved {} by direct join", report_path);
        return Ok(found);
    }

    if let Some(found) = suffix_match(&segments, candidate_dirs) {
        debug!("Resolved {} by suffix match", report_path);
        return Ok(found);
    }

    if let Some(name) = segments.last() {
        for dir in candidate_dirs {
            if let Some(found) = find_by_name(dir, name) {
                debug!("Resolved {} by file name search", report_path);
                return Ok(found);
            }
        }
    }

    Err(CovtreeError::PathNotFound(report_path.to_string()))
}

fn absolute(original: &str, normalized: &str) -> Option<PathBuf> {
    [normalized, original]
        .into_iter()
        .map(Path::new)
        .find(|p| p.is_absolute() && p.is_file())
        .map(Path::to_path_buf)
}

/// Path segments with any root or drive prefix removed, so they can be
/// joined onto a candidate directory.
fn relative_segments(normalized: &str) -> Vec<&str> {
    let mut segments: Vec<&str> = normalized
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect();
    if segments.first().is_some_and(|s| is_drive(s)) {
        segments.remove(0);
    }
    segments
}

fn is_drive(segment: &str) -> bool {
    let bytes = segment.as_bytes();
    bytes.len() == 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

fn join(dir: &Path, segments: &[&str]) -> PathBuf {
    let mut path = dir.to_path_buf();
    path.extend(segments);
    path
}

fn join_first(segments: &[&str], candidate_dirs: &[PathBuf]) -> Option<PathBuf> {
    candidate_dirs
        .iter()
        .map(|dir| join(dir, segments))
        .find(|p| p.is_file())
}

fn suffix_match(segments: &[&str], candidate_dirs: &[PathBuf]) -> Option<PathBuf> {
    (1..segments.len()).find_map(|skip| join_first(&segments[skip..], candidate_dirs))
}

/// Depth-first search for a file called `name`. Entries are sorted so a
/// directory's files are visited before its subdirectories; unreadable
/// directories are treated as empty.
fn find_by_name(dir: &Path, name: &str) -> Option<PathBuf> {
    WalkDir::new(dir)
        .sort_by(|a, b| {
            a.file_type()
                .is_dir()
                .cmp(&b.file_type().is_dir())
                .then_with(|| a.file_name().cmp(b.file_name()))
        })
        .into_iter()
        .filter_map(|entry| entry.ok())
        .find(|entry| entry.file_type().is_file() && entry.file_name() == name)
        .map(walkdir::DirEntry::into_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "content\n").unwrap();
    }

    #[test]
    fn test_relative_segments_strip_roots() {
        assert_eq!(relative_segments("/ci/src/a.go"), vec!["ci", "src", "a.go"]);
        assert_eq!(relative_segments("C:/work/a.cs"), vec!["work", "a.cs"]);
        assert_eq!(relative_segments("./x/y.py"), vec!["x", "y.py"]);
    }

    #[test]
    fn test_direct_join() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("pkg/a.go");
        touch(&target);

        let found = resolve("pkg/a.go", &[dir.path().to_path_buf()]).unwrap();
        assert_eq!(found, target);
    }

    #[test]
    fn test_backslash_paths() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("src/main/App.java");
        touch(&target);

        let found = resolve("src\\main\\App.java", &[dir.path().to_path_buf()]).unwrap();
        assert_eq!(found, target);
    }

    #[test]
    fn test_candidates_tried_in_order() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        touch(&first.path().join("lib.rs"));
        touch(&second.path().join("lib.rs"));

        let found = resolve(
            "lib.rs",
            &[second.path().to_path_buf(), first.path().to_path_buf()],
        )
        .unwrap();
        assert_eq!(found, second.path().join("lib.rs"));
    }

    #[test]
    fn test_name_search_prefers_shallow_files() {
        let dir = tempfile::tempdir().unwrap();
        let shallow = dir.path().join("b/util.c");
        touch(&dir.path().join("a/deep/util.c"));
        touch(&shallow);
        touch(&dir.path().join("util.c"));

        let found = find_by_name(dir.path(), "util.c").unwrap();
        assert_eq!(found, dir.path().join("util.c"));

        fs::remove_file(dir.path().join("util.c")).unwrap();
        let found = find_by_name(dir.path(), "util.c").unwrap();
        // "a" sorts before "b", and is searched fully first.
        assert_eq!(found, dir.path().join("a/deep/util.c"));
        assert_ne!(found, shallow);
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let missing = PathBuf::from("/definitely/not/a/real/dir");
        assert!(find_by_name(&missing, "x.rs").is_none());
        let result = resolve("x.rs", &[missing]);
        assert!(matches!(result, Err(CovtreeError::PathNotFound(_))));
    }

    #[test]
    fn test_not_found() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("other.go"));
        let result = resolve("src/app.go", &[dir.path().to_path_buf()]);
        assert!(matches!(result, Err(CovtreeError::PathNotFound(p)) if p == "src/app.go"));
    }

    #[test]
    fn test_empty_path_not_found() {
        let dir = tempfile::tempdir().unwrap();
        assert!(resolve("", &[dir.path().to_path_buf()]).is_err());
    }
}
