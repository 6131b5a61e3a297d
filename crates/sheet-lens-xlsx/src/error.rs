//! XLSX error types

use thiserror::Error;

/// Result type for XLSX operations
pub type XlsxResult<T> = std::result::Result<T, XlsxError>;

/// Errors that make a workbook unreadable as a whole
///
/// Problems confined to one cell never surface here; the reader records them
/// on the worksheet and moves on.
#[derive(Debug, Error)]
pub enum XlsxError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML error in {part}: {source}")]
    Xml {
        part: String,
        #[source]
        source: quick_xml::Error,
    },

    /// Not an Office Open XML package
    #[error("Invalid XLSX format: {0}")]
    InvalidFormat(String),

    /// A part the workbook cannot be read without
    #[error("Missing required part: {0}")]
    MissingPart(String),

    #[error("Core error: {0}")]
    Core(#[from] sheet_lens_core::Error),
}

impl XlsxError {
    pub(crate) fn xml(part: &str, source: quick_xml::Error) -> Self {
        XlsxError::Xml {
            part: part.to_string(),
            source,
        }
    }
}
