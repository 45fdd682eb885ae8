// Paidstamp library
// Marks invoice PDFs as paid with a rotated stamp next to the total

pub mod config;
pub mod constants;
pub mod document;
pub mod error;
pub mod geometry;
pub mod layout;
pub mod logging;
pub mod placement;
pub mod processor;
pub mod stamp;

pub use config::{Preset, StampOptions};
pub use document::{DocumentProvider, LopdfDocument};
pub use error::{Result, StampError};
pub use processor::{stamp_document, PageOutcome};
