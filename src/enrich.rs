//! Per-file enrichment: resolve each file on disk, correct its line count,
//! and attach per-method coverage.
//!
//! Every file is handled independently. A file that cannot be resolved,
//! read, or analyzed is logged and left with the coverage it already has.

use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use crate::config::Config;
use crate::error::Result;
use crate::methods::{method_coverage, ExtractorRegistry};
use crate::resolve::resolve;
use crate::tree::{CoverageTree, FileId};

/// Counts of what happened to the files of one enrichment pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichReport {
    pub resolved: usize,
    pub unresolved: usize,
    /// Files an extractor ran on successfully.
    pub analyzed: usize,
    /// Files that were resolved but could not be read or analyzed.
    pub failed: usize,
}

pub fn enrich(tree: &mut CoverageTree, registry: &ExtractorRegistry, config: &Config) -> EnrichReport {
    let mut report = EnrichReport::default();
    let ids: Vec<FileId> = tree.file_ids().collect();

    for id in ids {
        let (path, report_path, hint) = {
            let file = tree.file(id);
            (file.path.clone(), file.report_path.clone(), file.source_dir.clone())
        };

        let resolved = match resolve(&report_path, &config.candidate_dirs(&hint)) {
            Ok(resolved) => resolved,
            Err(e) => {
                warn!("Could not locate source for {}: {}", path, e);
                report.unresolved += 1;
                continue;
            }
        };
        report.resolved += 1;

        let source = match read_source(&resolved) {
            Ok(source) => source,
            Err(e) => {
                warn!("Could not read {}: {}", resolved.display(), e);
                report.failed += 1;
                continue;
            }
        };

        update_total_lines(tree, id, source.lines().count() as u64);

        let Some(extractor) = registry.select(&resolved) else {
            debug!("No method extractor for {}", path);
            continue;
        };
        match extractor.extract(&resolved, &source) {
            Ok(methods) => {
                let file = tree.file_mut(id);
                file.methods = methods
                    .iter()
                    .map(|m| method_coverage(m, &file.lines))
                    .collect();
                report.analyzed += 1;
            }
            Err(e) => {
                warn!("Method extraction failed for {}: {}", path, e);
                report.failed += 1;
            }
        }
    }

    debug!(
        "Enriched {} files ({} unresolved, {} analyzed, {} failed)",
        report.resolved, report.unresolved, report.analyzed, report.failed
    );
    report
}

fn read_source(path: &Path) -> Result<String> {
    let bytes = fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Store the file's real line count and push the difference up through
/// every ancestor and the tree total.
fn update_total_lines(tree: &mut CoverageTree, id: FileId, actual: u64) {
    let previous = tree.file(id).total_lines;
    if previous == actual {
        return;
    }
    let delta = actual as i64 - previous as i64;

    let file = tree.file_mut(id);
    file.total_lines = actual;
    file.metrics.shift_total_lines(delta);
    for dir in tree.ancestors(id) {
        tree.dir_mut(dir).metrics.shift_total_lines(delta);
    }
    tree.metrics.shift_total_lines(delta);
}
