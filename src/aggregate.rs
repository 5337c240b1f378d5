//! Bottom-up recomputation of every node's `CoverageMetrics`.

use std::collections::BTreeMap;

use crate::model::{CoverageMetrics, LineMetrics, MethodMetrics};
use crate::tree::{CoverageTree, DirId};

/// Post-order walk from the root directory. Stores metrics on every file
/// and directory and returns the root total, which also becomes the tree's
/// top-level metrics. Running it twice yields identical results.
pub fn aggregate(tree: &mut CoverageTree) -> CoverageMetrics {
    let root = tree.root();
    let total = aggregate_dir(tree, root);
    tree.metrics = total;
    total
}

fn aggregate_dir(tree: &mut CoverageTree, id: DirId) -> CoverageMetrics {
    let mut total = CoverageMetrics::default();

    let subdirs: Vec<DirId> = tree.dir(id).subdirs.values().copied().collect();
    for sub in subdirs {
        let sub_metrics = aggregate_dir(tree, sub);
        tree.dir_mut(sub).metrics = sub_metrics;
        total += sub_metrics;
    }

    let files: Vec<_> = tree.dir(id).files.values().copied().collect();
    for file_id in files {
        let file = tree.file(file_id);
        let mut metrics = line_metrics(&file.lines);
        metrics += method_metrics(&file.methods);
        metrics.total_lines = file.total_lines;
        tree.file_mut(file_id).metrics = metrics;
        total += metrics;
    }

    tree.dir_mut(id).metrics = total;
    total
}

/// Line and branch totals for one file's line map. Sentinel lines
/// (`hits < 0`) never count as valid; branch fields are summed as-is.
pub fn line_metrics(lines: &BTreeMap<u32, LineMetrics>) -> CoverageMetrics {
    let mut metrics = CoverageMetrics::default();
    for line in lines.values() {
        if line.is_coverable() {
            metrics.lines_valid += 1;
            if line.is_covered() {
                metrics.lines_covered += 1;
            }
        }
        metrics.branches_valid += u64::from(line.total_branches);
        metrics.branches_covered += u64::from(line.covered_branches);
    }
    metrics
}

/// Method counts for an already-enriched method list.
pub fn method_metrics(methods: &[MethodMetrics]) -> CoverageMetrics {
    let mut metrics = CoverageMetrics::default();
    for method in methods.iter().filter(|m| m.is_valid()) {
        metrics.methods_valid += 1;
        if method.is_covered() {
            metrics.methods_covered += 1;
        }
        if method.is_fully_covered() {
            metrics.methods_fully_covered += 1;
        }
    }
    metrics
}
