//! Error types for typeshift-convert.

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while routing or running a conversion.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No route exists for the (extension, target) pair.
    #[error("Unsupported conversion: {extension} to {target}")]
    Unsupported { extension: String, target: String },

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raster decode or encode failed.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// CSV read or write failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Workbook read or write failed.
    #[error("spreadsheet error: {0}")]
    Spreadsheet(String),

    /// Word-processor package could not be read or written.
    #[error("document error: {0}")]
    Document(String),

    /// PDF could not be read or written.
    #[error("PDF error: {0}")]
    Pdf(String),

    /// The pdfium shared library could not be bound.
    #[error("PDFium unavailable: {0}")]
    PdfiumUnavailable(String),

    /// The input contained nothing to convert.
    #[error("empty input: {0}")]
    Empty(String),
}

impl Error {
    /// Create an unsupported-conversion error naming both identifiers.
    pub fn unsupported(extension: impl Into<String>, target: impl Into<String>) -> Self {
        Self::Unsupported {
            extension: extension.into(),
            target: target.into(),
        }
    }

    /// Create a PDF error.
    pub fn pdf(message: impl Into<String>) -> Self {
        Self::Pdf(message.into())
    }

    /// Create a document error.
    pub fn document(message: impl Into<String>) -> Self {
        Self::Document(message.into())
    }

    /// Create a spreadsheet error.
    pub fn spreadsheet(message: impl Into<String>) -> Self {
        Self::Spreadsheet(message.into())
    }

    /// True for the user-facing routing error, false for conversion failures.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        Error::Pdf(err.to_string())
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::Document(err.to_string())
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::Document(err.to_string())
    }
}

impl From<calamine::XlsxError> for Error {
    fn from(err: calamine::XlsxError) -> Self {
        Error::Spreadsheet(err.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for Error {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        Error::Spreadsheet(err.to_string())
    }
}
