//! Result types for recolor operations

use crate::{
    color::{Color, ColorTarget},
    config::OutputFormat,
    error::{RecolorError, Result},
    raster::Raster,
    recolor::ClassificationStats,
    services::ImageIOService,
};
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Result of recoloring one image to one target color
#[derive(Debug, Clone)]
pub struct RecolorResult {
    /// Recolored and smoothed pixels
    pub raster: Raster,

    /// Color the background was replaced with
    pub target: ColorTarget,

    /// Backdrop color estimated from the input corners
    pub background: Color,

    /// Pixel counts per class
    pub stats: ClassificationStats,

    pub timings: RecolorTimings,

    /// Original input path (for logging purposes)
    pub input_path: Option<String>,
}

impl RecolorResult {
    /// Output as an RGBA `DynamicImage`
    #[must_use]
    pub fn image(&self) -> DynamicImage {
        self.raster.to_dynamic_image()
    }

    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        self.raster.dimensions()
    }

    /// Encode the result; `quality` applies to JPEG only
    pub fn to_bytes(&self, format: OutputFormat, quality: u8) -> Result<Vec<u8>> {
        match format {
            OutputFormat::Rgba8 => Ok(self.raster.as_bytes().to_vec()),
            _ => ImageIOService::encode(&self.image(), format, quality),
        }
    }

    /// Save the result and record the encode time
    pub fn save<P: AsRef<Path>>(&mut self, path: P, format: OutputFormat, quality: u8) -> Result<()> {
        let path = path.as_ref();
        let encode_start = instant::Instant::now();
        ImageIOService::save_image(&self.image(), path, format, quality)?;
        let encode_ms = encode_start.elapsed().as_millis() as u64;

        self.timings.encode_ms = Some(encode_ms);
        self.timings.total_ms += encode_ms;

        info!(
            input = self.input_path.as_deref().unwrap_or("input"),
            output = %path.display(),
            target = %self.target,
            "Processed in {:.2}s",
            self.timings.total_ms as f64 / 1000.0
        );
        Ok(())
    }

    /// One-line timing breakdown for display
    #[must_use]
    pub fn timing_summary(&self) -> String {
        self.timings.summary()
    }
}

/// Per-stage timings of one recolor run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecolorTimings {
    /// Decoding the input (absent when a raster was passed in)
    pub decode_ms: Option<u64>,

    pub sampling_ms: u64,

    pub classification_ms: u64,

    pub smoothing_ms: u64,

    /// Encoding the output (present once saved)
    pub encode_ms: Option<u64>,

    /// Total end-to-end processing time
    pub total_ms: u64,
}

impl RecolorTimings {
    fn measured_ms(&self) -> u64 {
        self.decode_ms.unwrap_or(0)
            + self.sampling_ms
            + self.classification_ms
            + self.smoothing_ms
            + self.encode_ms.unwrap_or(0)
    }

    /// Time not covered by any measured stage
    #[must_use]
    pub fn other_overhead_ms(&self) -> u64 {
        self.total_ms.saturating_sub(self.measured_ms())
    }

    /// Share of the total spent in each stage
    #[must_use]
    pub fn breakdown_percentages(&self) -> TimingBreakdown {
        if self.total_ms == 0 {
            return TimingBreakdown::default();
        }

        let total = self.total_ms as f64;
        let pct = |ms: u64| ms as f64 / total * 100.0;

        TimingBreakdown {
            decode_pct: pct(self.decode_ms.unwrap_or(0)),
            sampling_pct: pct(self.sampling_ms),
            classification_pct: pct(self.classification_ms),
            smoothing_pct: pct(self.smoothing_ms),
            encode_pct: pct(self.encode_ms.unwrap_or(0)),
            other_pct: pct(self.other_overhead_ms()),
        }
    }

    /// One-line timing breakdown for display
    #[must_use]
    pub fn summary(&self) -> String {
        let breakdown = self.breakdown_percentages();
        let mut summary = format!("Total: {}ms", self.total_ms);

        if let Some(decode_ms) = self.decode_ms {
            summary.push_str(&format!(" | Decode: {}ms ({:.1}%)", decode_ms, breakdown.decode_pct));
        }

        summary.push_str(&format!(
            " | Sample: {}ms ({:.1}%) | Classify: {}ms ({:.1}%) | Smooth: {}ms ({:.1}%)",
            self.sampling_ms,
            breakdown.sampling_pct,
            self.classification_ms,
            breakdown.classification_pct,
            self.smoothing_ms,
            breakdown.smoothing_pct
        ));

        if let Some(encode_ms) = self.encode_ms {
            summary.push_str(&format!(" | Encode: {}ms ({:.1}%)", encode_ms, breakdown.encode_pct));
        }

        // Only worth showing when noticeable
        let other_ms = self.other_overhead_ms();
        if other_ms > 5 || breakdown.other_pct > 1.0 {
            summary.push_str(&format!(" | Other: {}ms ({:.1}%)", other_ms, breakdown.other_pct));
        }

        summary
    }
}

/// Percentage breakdown of timing phases
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimingBreakdown {
    pub decode_pct: f64,
    pub sampling_pct: f64,
    pub classification_pct: f64,
    pub smoothing_pct: f64,
    pub encode_pct: f64,
    pub other_pct: f64,
}

/// Outcomes of recoloring one image to several targets, in request order
///
/// Every requested target has an entry; a failed target never hides the
/// others.
#[derive(Debug, Default)]
pub struct RecolorSet {
    entries: Vec<(ColorTarget, Result<RecolorResult>)>,
}

impl RecolorSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, target: ColorTarget, outcome: Result<RecolorResult>) {
        self.entries.push((target, outcome));
    }

    /// Outcome for the target with this name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Result<RecolorResult>> {
        self.entries
            .iter()
            .find(|(target, _)| target.name == name)
            .map(|(_, outcome)| outcome)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(ColorTarget, Result<RecolorResult>)> {
        self.entries.iter()
    }

    pub fn successes(&self) -> impl Iterator<Item = &RecolorResult> {
        self.entries.iter().filter_map(|(_, outcome)| outcome.as_ref().ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = (&ColorTarget, &RecolorError)> {
        self.entries
            .iter()
            .filter_map(|(target, outcome)| outcome.as_ref().err().map(|e| (target, e)))
    }

    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.entries.iter().all(|(_, outcome)| outcome.is_ok())
    }

    /// Mutable access to successful results, e.g. to save them
    pub fn successes_mut(&mut self) -> impl Iterator<Item = &mut RecolorResult> {
        self.entries
            .iter_mut()
            .filter_map(|(_, outcome)| outcome.as_mut().ok())
    }
}

impl IntoIterator for RecolorSet {
    type Item = (ColorTarget, Result<RecolorResult>);
    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl FromIterator<(ColorTarget, Result<RecolorResult>)> for RecolorSet {
    fn from_iter<I: IntoIterator<Item = (ColorTarget, Result<RecolorResult>)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
