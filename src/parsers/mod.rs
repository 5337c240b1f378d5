//! Report decoders. Each turns one coverage report into normalized
//! per-file records for the tree builder.

pub mod cobertura;
pub mod gocover;
pub mod lcov;

use std::borrow::Cow;
use std::path::Path;

use crate::error::{CovtreeError, Result};
use crate::model::FileCoverage;

/// Supported report formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Lcov,
    Cobertura,
    Gocover,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Lcov => "lcov",
            Format::Cobertura => "cobertura",
            Format::Gocover => "gocover",
        }
    }
}

impl std::str::FromStr for Format {
    type Err = CovtreeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lcov" => Ok(Format::Lcov),
            "cobertura" => Ok(Format::Cobertura),
            "gocover" | "go" | "coverprofile" => Ok(Format::Gocover),
            _ => Err(CovtreeError::Parse(format!(
                "Unknown format: '{}'. Supported: lcov, cobertura, gocover",
                s
            ))),
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a decoder produces for one report.
#[derive(Debug, Clone, Default)]
pub struct ParsedReport {
    pub files: Vec<FileCoverage>,
    /// Source root named inside the report itself, if the format has one.
    pub source_hint: Option<String>,
}

/// Every format decoder implements this trait.
pub trait CoverageParser {
    fn format(&self) -> Format;

    /// Whether this decoder recognizes the report, by extension or by a
    /// sniff of its first bytes.
    fn can_parse(&self, path: &Path, content: &[u8]) -> bool;

    fn parse(&self, input: &[u8]) -> Result<ParsedReport>;
}

/// The first 4KiB of a report, lossily decoded, for content sniffing.
pub(crate) fn sniff_head(content: &[u8]) -> Cow<'_, str> {
    let head_len = content.len().min(4096);
    String::from_utf8_lossy(&content[..head_len])
}

/// All decoders in detection order.
pub fn all_parsers() -> Vec<Box<dyn CoverageParser>> {
    vec![
        Box::new(lcov::LcovParser),
        Box::new(gocover::GocoverParser),
        Box::new(cobertura::CoberturaParser),
    ]
}

pub fn parser_for(format: Format) -> Box<dyn CoverageParser> {
    match format {
        Format::Lcov => Box::new(lcov::LcovParser),
        Format::Cobertura => Box::new(cobertura::CoberturaParser),
        Format::Gocover => Box::new(gocover::GocoverParser),
    }
}

/// Detect a report's format from its path and content.
pub fn detect(path: &Path, content: &[u8]) -> Option<Format> {
    all_parsers()
        .into_iter()
        .find(|p| p.can_parse(path, content))
        .map(|p| p.format())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_lcov() {
        assert_eq!(detect(Path::new("coverage.info"), b""), Some(Format::Lcov));
        let content = b"TN:test\nSF:/src/lib.rs\nDA:1,5\nend_of_record\n";
        assert_eq!(detect(Path::new("coverage.txt"), content), Some(Format::Lcov));
    }

    #[test]
    fn test_detect_cobertura() {
        let content = b"<?xml version=\"1.0\"?>\n<coverage version=\"1.0\">";
        assert_eq!(detect(Path::new("coverage.xml"), content), Some(Format::Cobertura));
    }

    #[test]
    fn test_detect_gocover() {
        let content = b"mode: set\ngithub.com/a/b/main.go:3.14,5.2 1 1\n";
        assert_eq!(detect(Path::new("cover.out"), content), Some(Format::Gocover));
    }

    #[test]
    fn test_detect_unknown() {
        assert_eq!(detect(Path::new("random.dat"), b"hello world"), None);
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("LCOV".parse::<Format>().unwrap(), Format::Lcov);
        assert_eq!("go".parse::<Format>().unwrap(), Format::Gocover);
        assert!("jacoco".parse::<Format>().is_err());
    }
}
