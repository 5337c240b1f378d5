#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use covtree::model::{FileCoverage, LineMetrics, ParserResult};

/// A record with plain line hits and no branches.
pub fn record(path: &str, lines: &[(u32, i64)]) -> FileCoverage {
    lines
        .iter()
        .fold(FileCoverage::new(path.to_string()), |record, &(n, hits)| {
            record.with_line(n, LineMetrics::new(hits))
        })
}

pub fn report(parser: &str, source_dir: &str, records: Vec<FileCoverage>) -> ParserResult {
    let mut report = ParserResult::new(parser, source_dir);
    report.file_coverage = records;
    report
}

/// Write `content` to `root/rel`, creating parent directories.
pub fn write_source(root: &Path, rel: &str, content: &str) -> PathBuf {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, content).unwrap();
    path
}
