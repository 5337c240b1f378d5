use thiserror::Error;

#[derive(Error, Debug)]
pub enum CovtreeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unknown coverage format")]
    UnknownFormat,

    #[error("No coverage records to process")]
    NoInputRecords,

    #[error("Source file not found: {0}")]
    PathNotFound(String),

    #[error("Method analysis failed for {path}: {reason}")]
    AnalysisFailed { path: String, reason: String },
}

pub type Result<T> = std::result::Result<T, CovtreeError>;
