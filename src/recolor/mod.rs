//! Background recolor pipeline
//!
//! Three passes over the pixel buffer, in order:
//!
//! 1. [`sample_background`] estimates the backdrop color from the four corners.
//! 2. [`classify_and_recolor`] measures every pixel's distance to that estimate,
//!    replaces background pixels with the target color, blends edge pixels and
//!    leaves foreground pixels alone.
//! 3. [`smooth_edges`] blurs only the blended edge pixels with a 3x3 kernel.
//!
//! The passes hold no state between calls and never log; failures are returned
//! to the caller. The input raster is never modified.

pub mod classifier;
pub mod sampler;
pub mod smoother;

pub use classifier::{
    classify_and_recolor, classify_distance, color_distance, recolor_pixel, ClassMap,
    ClassificationStats, PixelClass, BACKGROUND_THRESHOLD, EDGE_BAND, FOREGROUND_THRESHOLD,
};
pub use sampler::sample_background;
pub use smoother::{smooth_edges, KERNEL};

use crate::{
    color::{Color, ColorSpec},
    error::Result,
    raster::Raster,
};

/// Everything a single recolor call produced
#[derive(Debug, Clone)]
pub struct RecolorOutcome {
    /// Recolored and smoothed raster, same dimensions as the input
    pub raster: Raster,
    /// Backdrop color estimated from the input corners
    pub background: Color,
    /// Resolved target color
    pub target: Color,
    /// Per-pixel classification
    pub classes: ClassMap,
}

impl RecolorOutcome {
    #[must_use]
    pub fn stats(&self) -> ClassificationStats {
        self.classes.stats()
    }
}

/// Replace the background of `raster` with `target`
///
/// # Errors
/// - `InvalidColor` if `target` is malformed hex; no pixel work is done
/// - `Allocation` if an output buffer cannot be allocated
///
/// # Examples
/// ```rust
/// use imgly_bgrecolor::{recolor, Raster};
///
/// let photo = Raster::filled(4, 4, [255, 255, 255, 255])?;
/// let blue = recolor(&photo, "#2196F3")?;
/// assert_eq!(blue.pixel(2, 2), Some([33, 150, 243, 255]));
/// # Ok::<(), imgly_bgrecolor::RecolorError>(())
/// ```
pub fn recolor(raster: &Raster, target: impl Into<ColorSpec>) -> Result<Raster> {
    recolor_with_details(raster, target).map(|outcome| outcome.raster)
}

/// Like [`recolor`], additionally returning the background estimate and class map
pub fn recolor_with_details(raster: &Raster, target: impl Into<ColorSpec>) -> Result<RecolorOutcome> {
    let target = target.into().resolve()?;
    let background = sample_background(raster);
    let (recolored, classes) = classify_and_recolor(raster, target, background)?;
    let raster = smooth_edges(&recolored, &classes)?;

    Ok(RecolorOutcome {
        raster,
        background,
        target,
        classes,
    })
}
