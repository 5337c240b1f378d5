use std::path::Path;

use tracing::info;

use crate::error::{CovtreeError, Result};
use crate::model::ParserResult;
use crate::parsers::{detect, parser_for, Format};

/// Read a report, detect its format (or use the override), and decode it.
///
/// The result's source directory is `source_dir` when given, else the root
/// named inside the report, else the report's own directory.
pub fn load_report(
    file_path: &Path,
    format_override: Option<Format>,
    source_dir: Option<&Path>,
) -> Result<ParserResult> {
    let content = std::fs::read(file_path)?;

    let format = match format_override {
        Some(format) => format,
        None => detect(file_path, &content).ok_or(CovtreeError::UnknownFormat)?,
    };

    let parsed = parser_for(format).parse(&content)?;

    let source_directory = match (source_dir, parsed.source_hint) {
        (Some(dir), _) => dir.display().to_string(),
        (None, Some(hint)) => hint,
        (None, None) => file_path
            .parent()
            .map(|p| p.display().to_string())
            .unwrap_or_default(),
    };

    info!(
        "Loaded {} ({}): {} files",
        file_path.display(),
        format,
        parsed.files.len()
    );

    Ok(ParserResult {
        file_coverage: parsed.files,
        parser_name: format.as_str().to_string(),
        source_directory,
    })
}
