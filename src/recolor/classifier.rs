//! Per-pixel classification against the background estimate, with recoloring

use crate::{
    color::Color,
    error::{RecolorError, Result},
    raster::{try_alloc, Raster, CHANNELS},
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Distances below this are background
pub const BACKGROUND_THRESHOLD: f64 = 35.0;

/// Width of the blended band between background and foreground
pub const EDGE_BAND: f64 = 30.0;

/// Distances at or above this are foreground
pub const FOREGROUND_THRESHOLD: f64 = BACKGROUND_THRESHOLD + EDGE_BAND;

/// Channel weights applied before squaring (red, green, blue)
const CHANNEL_WEIGHTS: [f64; 3] = [0.30, 0.59, 0.11];

/// Classification of a single pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelClass {
    Background,
    Edge,
    Foreground,
}

/// Luminance-weighted Euclidean distance between two RGB triples
///
/// A heuristic, not a calibrated color-difference metric. Identical colors
/// give 0, black against white about 171.
#[must_use]
pub fn color_distance(rgb: [u8; 3], other: Color) -> f64 {
    rgb.iter()
        .zip(other.to_array())
        .zip(CHANNEL_WEIGHTS)
        .map(|((&a, b), weight)| {
            let delta = (f64::from(a) - f64::from(b)) * weight;
            delta * delta
        })
        .sum::<f64>()
        .sqrt()
}

/// Map a distance onto the three bands
#[must_use]
pub fn classify_distance(diff: f64) -> PixelClass {
    if diff < BACKGROUND_THRESHOLD {
        PixelClass::Background
    } else if diff < FOREGROUND_THRESHOLD {
        PixelClass::Edge
    } else {
        PixelClass::Foreground
    }
}

/// Classify one pixel and compute its recolored value
#[must_use]
pub fn recolor_pixel(pixel: [u8; 4], target: Color, background: Color) -> ([u8; 4], PixelClass) {
    let [r, g, b, a] = pixel;
    let diff = color_distance([r, g, b], background);

    match classify_distance(diff) {
        PixelClass::Background => ([target.r, target.g, target.b, 255], PixelClass::Background),
        PixelClass::Edge => {
            // diff is inside [T1, T2) so the mix stays in [0, 1)
            let mix = (diff - BACKGROUND_THRESHOLD) / EDGE_BAND;
            let blend = |original: u8, replacement: u8| -> u8 {
                (f64::from(original) * mix + f64::from(replacement) * (1.0 - mix)).round() as u8
            };
            (
                [
                    blend(r, target.r),
                    blend(g, target.g),
                    blend(b, target.b),
                    blend(a, 255),
                ],
                PixelClass::Edge,
            )
        },
        PixelClass::Foreground => (pixel, PixelClass::Foreground),
    }
}

/// Number of pixels in each class
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationStats {
    pub background: usize,
    pub edge: usize,
    pub foreground: usize,
}

impl ClassificationStats {
    #[must_use]
    pub fn total(&self) -> usize {
        self.background + self.edge + self.foreground
    }

    /// Share of pixels replaced or blended, in percent
    #[must_use]
    pub fn recolored_percentage(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => (self.background + self.edge) as f64 / total as f64 * 100.0,
        }
    }
}

/// One `PixelClass` per pixel, row-major, same dimensions as its raster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassMap {
    width: u32,
    height: u32,
    classes: Vec<PixelClass>,
}

impl ClassMap {
    /// Wrap a class vector; the length must be `width * height`
    pub fn new(width: u32, height: u32, classes: Vec<PixelClass>) -> Result<Self> {
        let expected = Raster::buffer_len(width, height)? / CHANNELS;
        if classes.len() != expected {
            return Err(RecolorError::BufferSizeMismatch {
                expected,
                actual: classes.len(),
            });
        }
        Ok(Self {
            width,
            height,
            classes,
        })
    }

    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> Option<PixelClass> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.classes
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[PixelClass] {
        &self.classes
    }

    #[must_use]
    pub fn stats(&self) -> ClassificationStats {
        self.classes
            .iter()
            .fold(ClassificationStats::default(), |mut stats, class| {
                match class {
                    PixelClass::Background => stats.background += 1,
                    PixelClass::Edge => stats.edge += 1,
                    PixelClass::Foreground => stats.foreground += 1,
                }
                stats
            })
    }
}

/// Classify every pixel and produce the recolored raster plus the class map
///
/// The input is never modified. Pixels are independent of each other, so the
/// pass runs as a parallel map.
///
/// # Errors
/// - `Allocation` if the output raster or class map cannot be allocated
pub fn classify_and_recolor(
    raster: &Raster,
    target: Color,
    background: Color,
) -> Result<(Raster, ClassMap)> {
    let (width, height) = raster.dimensions();
    let source = raster.as_bytes();

    let mut data = try_alloc::<u8>(source.len(), "recolored raster")?;
    data.resize(source.len(), 0);
    let mut classes = try_alloc::<PixelClass>(raster.pixel_count(), "class map")?;
    classes.resize(raster.pixel_count(), PixelClass::Foreground);

    data.par_chunks_exact_mut(CHANNELS)
        .zip(classes.par_iter_mut())
        .zip(source.par_chunks_exact(CHANNELS))
        .for_each(|((out, class), px)| {
            if let &[r, g, b, a] = px {
                let (value, pixel_class) = recolor_pixel([r, g, b, a], target, background);
                out.copy_from_slice(&value);
                *class = pixel_class;
            }
        });

    Ok((
        Raster::from_rgba(width, height, data)?,
        ClassMap::new(width, height, classes)?,
    ))
}
