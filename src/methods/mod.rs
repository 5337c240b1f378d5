//! Structural method extraction.
//!
//! Each extractor reports `{name, start, end, complexity}` for the methods
//! in a source file. A registry holds extractors in priority order; the
//! first one whose `supports` predicate accepts a path is used.

pub mod grammar;
pub mod heuristic;

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::Result;
use crate::model::{LineMetrics, MethodMetrics};

pub use grammar::{GrammarExtractor, GrammarLang};
pub use heuristic::HeuristicExtractor;

/// A method's structural boundaries, before coverage is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedMethod {
    pub name: String,
    /// 1-based, inclusive.
    pub start_line: u32,
    /// 1-based, inclusive.
    pub end_line: u32,
    pub complexity: Option<u32>,
}

/// Every language adapter implements this trait.
pub trait MethodExtractor {
    /// Short name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Whether this extractor handles the given file.
    fn supports(&self, path: &Path) -> bool;

    /// Extract methods from the full source text of `path`.
    fn extract(&self, path: &Path, source: &str) -> Result<Vec<ExtractedMethod>>;
}

/// Lower-cased file extension, if any.
pub(crate) fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}

/// Ordered list of extractors.
pub struct ExtractorRegistry {
    extractors: Vec<Box<dyn MethodExtractor>>,
}

impl ExtractorRegistry {
    pub fn new(extractors: Vec<Box<dyn MethodExtractor>>) -> Self {
        Self { extractors }
    }

    /// Grammar-aware adapters first, then the heuristic fallback.
    pub fn with_defaults() -> Self {
        Self::new(vec![
            Box::new(GrammarExtractor::new(GrammarLang::Rust)),
            Box::new(GrammarExtractor::new(GrammarLang::Python)),
            Box::new(GrammarExtractor::new(GrammarLang::TypeScript)),
            Box::new(GrammarExtractor::new(GrammarLang::Go)),
            Box::new(HeuristicExtractor),
        ])
    }

    /// First extractor whose predicate matches, or `None`.
    pub fn select(&self, path: &Path) -> Option<&dyn MethodExtractor> {
        self.extractors
            .iter()
            .find(|e| e.supports(path))
            .map(|e| e.as_ref())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.extractors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.extractors.is_empty()
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Apply a file's line map to an extracted method.
///
/// Lines with `hits >= 0` count as valid, `hits > 0` as covered. Branch
/// fields are summed for every line in range, sentinel or not.
pub fn method_coverage(method: &ExtractedMethod, lines: &BTreeMap<u32, LineMetrics>) -> MethodMetrics {
    let mut metrics = MethodMetrics {
        name: method.name.clone(),
        start_line: method.start_line,
        end_line: method.end_line,
        cyclomatic_complexity: method.complexity,
        lines_valid: 0,
        lines_covered: 0,
        branches_valid: 0,
        branches_covered: 0,
    };
    if method.end_line < method.start_line {
        return metrics;
    }
    for line in lines.range(method.start_line..=method.end_line).map(|(_, l)| l) {
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
