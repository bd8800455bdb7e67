//! Error types for step deck generation and CSV cleaning.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while cleaning tables or assembling decks.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to open, read or write a file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// A required resource (template, CSV, image) does not exist.
    #[error("{kind} file '{}' not found", path.display())]
    MissingResource {
        /// Human-readable resource kind, e.g. "PowerPoint template".
        kind: &'static str,
        /// Path that was looked up.
        path: PathBuf,
    },

    /// The CSV reader rejected the input.
    #[error("CSV error: {0}")]
    CsvError(String),

    /// A required CSV column is absent from the header row.
    #[error("CSV is missing the required '{0}' column")]
    MissingColumn(String),

    /// The input holds no data rows.
    #[error("{0} is empty or not properly formatted")]
    EmptyInput(String),

    /// The template deck has no slide to use as the prototype.
    #[error("Template does not contain any slides")]
    NoSlides,

    /// Processing finished without producing a single slide.
    #[error("No slides were generated")]
    NothingGenerated,

    /// A slide handle does not refer to a slide in the deck.
    #[error("Unknown slide handle: {0}")]
    UnknownSlide(usize),

    /// A shape id does not refer to a shape on the slide.
    #[error("Shape {shape} not found on slide {slide}")]
    UnknownShape {
        /// Slide handle that was searched.
        slide: usize,
        /// Shape id that was requested.
        shape: u32,
    },

    /// ZIP archive error (for PPTX).
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML parsing or writing error (for PPTX).
    #[error("XML error: {0}")]
    XmlError(String),

    /// The package structure is inconsistent (missing part, dangling relationship).
    #[error("Invalid or corrupted package: {0}")]
    PackageError(String),
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        let message = err.to_string();
        match err.into_kind() {
            csv::ErrorKind::Io(io) => Error::IoError(io),
            _ => Error::CsvError(message),
        }
    }
}

impl Error {
    /// Whether this error means a file could not be found.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::IoError(e) => e.kind() == std::io::ErrorKind::NotFound,
            Error::MissingResource { .. } => true,
            _ => false,
        }
    }
}
