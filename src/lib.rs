#![allow(clippy::too_many_lines)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]

//! # IMG.LY Background Recolor Library
//!
//! Replaces the uniform backdrop of ID and passport photos with a solid color.
//!
//! The backdrop color is estimated from the four corner pixels. Every pixel is
//! then classified by its luminance-weighted distance to that estimate:
//! close pixels become the target color, distant pixels are kept, and pixels
//! in between are blended and finally smoothed with a small blur.
//!
//! ## Features
//!
//! - **Pure pixel core**: [`recolor`] works on an in-memory [`Raster`], no I/O
//! - **Presets and custom colors**: white, blue and red, or any `#rrggbb`
//! - **Multi-target runs**: one decoded photo, several colors, concurrently
//! - **Format Support**: PNG, JPEG, WebP and TIFF in; PNG, JPEG, WebP, TIFF or raw RGBA out
//! - **CLI Integration**: optional command-line interface (enable with `cli` feature)
//!
//! ## Quick Start
//!
//! ```rust
//! use imgly_bgrecolor::{recolor, Raster};
//!
//! let photo = Raster::filled(4, 4, [255, 255, 255, 255])?;
//! let blue = recolor(&photo, "#2196F3")?;
//! assert_eq!(blue.pixel(0, 0), Some([33, 150, 243, 255]));
//! # Ok::<(), imgly_bgrecolor::RecolorError>(())
//! ```
//!
//! ### Every preset from encoded bytes
//!
//! ```rust,no_run
//! use imgly_bgrecolor::{recolor_from_bytes, RecolorConfig};
//!
//! # async fn example(upload: Vec<u8>) -> anyhow::Result<()> {
//! let config = RecolorConfig::default();
//! let set = recolor_from_bytes(&upload, &config).await?;
//! for (target, outcome) in set {
//!     let mut result = outcome?;
//!     result.save(format!("photo_{}.png", target.name), config.output_format, 100)?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): command-line interface and tracing subscriber setup
//! - `webp-support` (default): WebP decoding and lossless WebP output
//! - `tracing-json`: JSON log output for the CLI
//!
//! Library-only usage:
//!
//! ```toml
//! [dependencies]
//! imgly-bgrecolor = { version = "0.1", default-features = false }
//! ```

#[cfg(feature = "cli")]
pub mod cli;
pub mod color;
pub mod config;
pub mod error;
pub mod processor;
pub mod raster;
pub mod recolor;
pub mod services;
#[cfg(feature = "cli")]
pub mod tracing_config;
pub mod types;

use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt};

// Public API exports
pub use color::{Color, ColorSpec, ColorTarget, Preset, CUSTOM_TARGET_NAME};
pub use config::{OutputFormat, RecolorConfig, RecolorConfigBuilder, DEFAULT_MAX_INPUT_BYTES};
pub use error::{ErrorKind, RecolorError, Result};
pub use processor::RecolorProcessor;
pub use raster::Raster;
pub use recolor::{
    recolor, recolor_with_details, ClassMap, ClassificationStats, PixelClass, RecolorOutcome,
};
pub use services::{
    ConsoleProgressReporter, ImageIOService, NoOpProgressReporter, OutputFormatHandler,
    ProcessingStage, ProgressReporter, ProgressTracker, ProgressUpdate,
};
pub use types::{RecolorResult, RecolorSet, RecolorTimings, TimingBreakdown};

#[cfg(feature = "cli")]
pub use tracing_config::{events, init_cli_tracing, spans, TracingConfig, TracingFormat};

/// Recolor an already decoded image to every configured target
///
/// # Errors
/// - `InvalidConfig` if `config` does not validate
///
/// Per-target failures are reported inside the returned set.
pub async fn recolor_image(image: &image::DynamicImage, config: &RecolorConfig) -> Result<RecolorSet> {
    let processor = RecolorProcessor::new(config.clone())?;
    let raster = Arc::new(Raster::from_image(image)?);
    Ok(processor.process_targets(raster, &config.targets).await)
}

/// Decode image bytes and recolor them to every configured target
///
/// Suitable for uploads held in memory. The size limit of `config` applies.
pub async fn recolor_from_bytes(image_bytes: &[u8], config: &RecolorConfig) -> Result<RecolorSet> {
    let processor = RecolorProcessor::new(config.clone())?;
    let raster = Arc::new(processor.decode_bytes(image_bytes)?);
    Ok(processor.process_targets(raster, &config.targets).await)
}

/// Read an async stream and recolor it to every configured target
///
/// Reading stops one byte past the size limit, so oversized streams are
/// rejected without buffering them whole.
pub async fn recolor_from_reader<R: AsyncRead + Unpin>(
    reader: R,
    config: &RecolorConfig,
) -> Result<RecolorSet> {
    let mut buffer = Vec::new();
    reader
        .take(config.max_input_bytes.saturating_add(1))
        .read_to_end(&mut buffer)
        .await?;

    ImageIOService::check_size(buffer.len() as u64, config.max_input_bytes)?;
    recolor_from_bytes(&buffer, config).await
}
