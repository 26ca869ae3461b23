//! Service layer
//!
//! Codecs, file naming and progress reporting, kept out of the recolor core.

pub mod format;
pub mod io;
pub mod progress;

pub use format::OutputFormatHandler;
pub use io::{ImageIOService, SUPPORTED_INPUT_EXTENSIONS};
pub use progress::{
    ConsoleProgressReporter, NoOpProgressReporter, ProcessingStage, ProgressReporter,
    ProgressTracker, ProgressUpdate,
};
