//! Uniform in-memory representation of coverage data, independent of any
//! specific report format. Decoders produce `ParserResult`s which the tree
//! builder merges into a `CoverageTree`.

use std::collections::BTreeMap;
use std::ops::AddAssign;

use serde::Serialize;

/// Compute a coverage rate, returning 0.0 when the total is zero.
#[must_use]
pub fn rate(covered: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        covered as f64 / total as f64
    }
}

/// Coverage of a single source line.
///
/// `hits == -1` marks a line that is not coverable (blank, structural).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct LineMetrics {
    pub hits: i64,
    pub covered_branches: u32,
    pub total_branches: u32,
}

impl LineMetrics {
    pub const NOT_COVERABLE: i64 = -1;

    pub fn new(hits: i64) -> Self {
        Self {
            hits,
            ..Default::default()
        }
    }

    pub fn not_coverable() -> Self {
        Self::new(Self::NOT_COVERABLE)
    }

    pub fn with_branches(hits: i64, covered_branches: u32, total_branches: u32) -> Self {
        Self {
            hits,
            covered_branches,
            total_branches,
        }
    }

    #[must_use]
    pub fn is_coverable(&self) -> bool {
        self.hits >= 0
    }

    #[must_use]
    pub fn is_covered(&self) -> bool {
        self.hits > 0
    }
}

/// Aggregated metrics attached to every node of the tree. Always derived
/// from line and method data, never authored by a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CoverageMetrics {
    pub lines_covered: u64,
    pub lines_valid: u64,
    pub branches_covered: u64,
    pub branches_valid: u64,
    pub total_lines: u64,
    pub methods_valid: u64,
    pub methods_covered: u64,
    pub methods_fully_covered: u64,
}

impl CoverageMetrics {
    #[must_use]
    pub fn line_rate(&self) -> f64 {
        rate(self.lines_covered, self.lines_valid)
    }

    #[must_use]
    pub fn branch_rate(&self) -> f64 {
        rate(self.branches_covered, self.branches_valid)
    }

    #[must_use]
    pub fn method_rate(&self) -> f64 {
        rate(self.methods_covered, self.methods_valid)
    }

    /// Shift `total_lines` by a signed delta, clamping at zero.
    pub fn shift_total_lines(&mut self, delta: i64) {
        self.total_lines = self.total_lines.saturating_add_signed(delta);
    }
}

impl AddAssign for CoverageMetrics {
    fn add_assign(&mut self, other: Self) {
        self.lines_covered += other.lines_covered;
        self.lines_valid += other.lines_valid;
        self.branches_covered += other.branches_covered;
        self.branches_valid += other.branches_valid;
        self.total_lines += other.total_lines;
        self.methods_valid += other.methods_valid;
        self.methods_covered += other.methods_covered;
        self.methods_fully_covered += other.methods_fully_covered;
    }
}

/// Coverage of one method, derived from its structural boundaries and the
/// file's line map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodMetrics {
    pub name: String,
    pub start_line: u32,
    pub end_line: u32,
    pub cyclomatic_complexity: Option<u32>,
    pub lines_valid: u64,
    pub lines_covered: u64,
    pub branches_valid: u64,
    pub branches_covered: u64,
}

impl MethodMetrics {
    /// A method counts toward totals only if it has a coverable line.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.lines_valid > 0
    }

    #[must_use]
    pub fn is_covered(&self) -> bool {
        self.is_valid() && self.lines_covered > 0
    }

    #[must_use]
    pub fn is_fully_covered(&self) -> bool {
        self.is_valid() && self.lines_covered == self.lines_valid
    }

    #[must_use]
    pub fn line_rate(&self) -> f64 {
        rate(self.lines_covered, self.lines_valid)
    }
}

/// Normalized coverage for a single source file, as emitted by a decoder.
#[derive(Debug, Clone, Default)]
pub struct FileCoverage {
    pub path: String,
    pub lines: BTreeMap<u32, LineMetrics>,
}

impl FileCoverage {
    pub fn new(path: String) -> Self {
        Self {
            path,
            ..Default::default()
        }
    }

    /// Builder-style helper, mostly for tests and decoders.
    #[must_use]
    pub fn with_line(mut self, line_number: u32, metrics: LineMetrics) -> Self {
        self.lines.insert(line_number, metrics);
        self
    }
}

/// The decoded contents of one report file.
#[derive(Debug, Clone, Default)]
pub struct ParserResult {
    pub file_coverage: Vec<FileCoverage>,
    pub parser_name: String,
    /// Resolution hint for this report's files.
    pub source_directory: String,
}

impl ParserResult {
    pub fn new(parser_name: impl Into<String>, source_directory: impl Into<String>) -> Self {
        Self {
            file_coverage: Vec::new(),
            parser_name: parser_name.into(),
            source_directory: source_directory.into(),
        }
    }
}
