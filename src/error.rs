// Error types module

use thiserror::Error;

/// Centralized error type for the stamp pipeline
///
/// Only fatal conditions live here. Missing layout signals (no content
/// blocks, no total keyword, malformed options) are handled by fallbacks
/// and never surface as errors.
#[derive(Error, Debug)]
pub enum StampError {
    /// Reading the input or writing the output failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The PDF container could not be parsed or modified
    #[error("PDF error: {0}")]
    Pdf(String),

    /// The stamp could not be rendered (font loading, degenerate canvas)
    #[error("Render error: {0}")]
    Render(String),

    /// The stamp raster could not be encoded or decoded
    #[error("Image encoding error: {0}")]
    Encode(#[from] image::ImageError),

    /// The placement report could not be serialized
    #[error("Report error: {0}")]
    Report(#[from] serde_json::Error),

    /// A page failed while being stamped
    #[error("page {page}: {source}")]
    Page {
        page: u32,
        #[source]
        source: Box<StampError>,
    },
}

impl StampError {
    /// Attach the 1-based page number to an error raised while processing it.
    pub fn on_page(self, page: u32) -> Self {
        match self {
            already @ StampError::Page { .. } => already,
            other => StampError::Page {
                page,
                source: Box::new(other),
            },
        }
    }
}

impl From<lopdf::Error> for StampError {
    fn from(err: lopdf::Error) -> Self {
        StampError::Pdf(err.to_string())
    }
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, StampError>;
