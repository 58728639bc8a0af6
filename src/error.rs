//! Error types for the conversion pipeline

use thiserror::Error;

/// Failures that abort a whole conversion.
///
/// Recoverable problems (bad style declarations, unparseable colours,
/// missing images) never surface here; they are logged and the
/// conversion carries on.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("failed to parse HTML input: {0}")]
    Parse(String),

    #[error("HTML input has no <body> element")]
    MissingBody,

    #[error("failed to pack .docx output: {0}")]
    Package(String),

    #[error("failed to rewrite .docx archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ConvertError>;
