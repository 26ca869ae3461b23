//! Unified recolor processor
//!
//! Wraps the recolor passes with decoding, per-stage timings, progress
//! reporting, logging and multi-target fan-out.

use crate::{
    color::ColorTarget,
    config::{OutputFormat, RecolorConfig},
    error::{RecolorError, Result},
    raster::Raster,
    recolor::{classify_and_recolor, sample_background, smooth_edges},
    services::{
        ImageIOService, NoOpProgressReporter, OutputFormatHandler, ProcessingStage,
        ProgressReporter, ProgressTracker,
    },
    types::{RecolorResult, RecolorSet, RecolorTimings},
};
use futures::future::join_all;
use image::DynamicImage;
use instant::Instant;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument, span, warn, Level};

/// Recolor processor owning a validated configuration
///
/// Cheap to clone; clones share the progress reporter.
#[derive(Clone)]
pub struct RecolorProcessor {
    config: RecolorConfig,
    reporter: Arc<dyn ProgressReporter>,
}

impl std::fmt::Debug for RecolorProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecolorProcessor")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RecolorProcessor {
    /// Create a processor after validating `config`
    ///
    /// # Examples
    /// ```rust
    /// use imgly_bgrecolor::{ColorTarget, Raster, RecolorConfig, RecolorProcessor};
    ///
    /// let processor = RecolorProcessor::new(RecolorConfig::default())?;
    /// let photo = Raster::filled(8, 8, [250, 250, 250, 255])?;
    /// let result = processor.process_raster(&photo, &ColorTarget::parse("red")?)?;
    /// assert_eq!(result.raster.pixel(4, 4), Some([255, 0, 0, 255]));
    /// # Ok::<(), imgly_bgrecolor::RecolorError>(())
    /// ```
    pub fn new(config: RecolorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            reporter: Arc::new(NoOpProgressReporter),
        })
    }

    /// Attach a progress reporter
    #[must_use]
    pub fn with_progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    #[must_use]
    pub fn config(&self) -> &RecolorConfig {
        &self.config
    }

    /// Quality setting the configuration holds for `format`
    #[must_use]
    pub fn quality_for(&self, format: OutputFormat) -> u8 {
        match format {
            OutputFormat::Jpeg => self.config.jpeg_quality,
            OutputFormat::WebP => self.config.webp_quality,
            OutputFormat::Png | OutputFormat::Tiff | OutputFormat::Rgba8 => 100,
        }
    }

    /// Recolor one raster to one target
    ///
    /// # Errors
    /// - `Allocation` if an intermediate buffer cannot be allocated
    #[instrument(
        skip(self, raster),
        fields(
            target = %target,
            dimensions = %format!("{}x{}", raster.width(), raster.height())
        )
    )]
    pub fn process_raster(&self, raster: &Raster, target: &ColorTarget) -> Result<RecolorResult> {
        let total_start = Instant::now();
        let mut tracker = ProgressTracker::new(Arc::clone(&self.reporter));
        let mut timings = RecolorTimings::default();

        let background = {
            let _span = span!(Level::DEBUG, "background_sampling").entered();
            tracker.report_stage(ProcessingStage::BackgroundSampling);
            let start = Instant::now();
            let background = sample_background(raster);
            timings.sampling_ms = start.elapsed().as_millis() as u64;
            debug!(background = %background, "Estimated background color");
            background
        };

        let (recolored, classes) = {
            let _span = span!(Level::DEBUG, "classification", target = %target.color).entered();
            tracker.report_stage(ProcessingStage::Classification);
            let start = Instant::now();
            let classified = classify_and_recolor(raster, target.color, background)
                .map_err(|e| report_failure(&tracker, e))?;
            timings.classification_ms = start.elapsed().as_millis() as u64;
            classified
        };

        let smoothed = {
            let _span = span!(Level::DEBUG, "edge_smoothing").entered();
            tracker.report_stage(ProcessingStage::EdgeSmoothing);
            let start = Instant::now();
            let smoothed = smooth_edges(&recolored, &classes)
                .map_err(|e| report_failure(&tracker, e))?;
            timings.smoothing_ms = start.elapsed().as_millis() as u64;
            smoothed
        };

        let stats = classes.stats();
        timings.total_ms = total_start.elapsed().as_millis() as u64;

        tracker.report_stage(ProcessingStage::Completed);
        tracker.report_completion(&timings);

        debug!(
            background_pixels = stats.background,
            edge_pixels = stats.edge,
            foreground_pixels = stats.foreground,
            "Recolored {:.1}% of pixels in {}ms",
            stats.recolored_percentage(),
            timings.total_ms
        );

        Ok(RecolorResult {
            raster: smoothed,
            target: target.clone(),
            background,
            stats,
            timings,
            input_path: None,
        })
    }

    /// Recolor a decoded image
    pub fn process_image(&self, image: &DynamicImage, target: &ColorTarget) -> Result<RecolorResult> {
        let raster = Raster::from_image(image)?;
        self.process_raster(&raster, target)
    }

    /// Decode encoded image bytes, enforcing `max_input_bytes`
    pub fn decode_bytes(&self, bytes: &[u8]) -> Result<Raster> {
        let mut tracker = ProgressTracker::new(Arc::clone(&self.reporter));
        tracker.report_stage(ProcessingStage::ImageLoading);
        let image = ImageIOService::load_from_bytes(bytes, self.config.max_input_bytes)
            .map_err(|e| report_failure(&tracker, e))?;
        Raster::from_image(&image)
    }

    /// Decode an image file, enforcing `max_input_bytes`
    pub fn decode_file<P: AsRef<Path>>(&self, path: P) -> Result<Raster> {
        let mut tracker = ProgressTracker::new(Arc::clone(&self.reporter));
        tracker.report_stage(ProcessingStage::ImageLoading);
        let image = ImageIOService::load_image(path, self.config.max_input_bytes)
            .map_err(|e| report_failure(&tracker, e))?;
        Raster::from_image(&image)
    }

    /// Decode and recolor encoded image bytes
    pub fn process_bytes(&self, bytes: &[u8], target: &ColorTarget) -> Result<RecolorResult> {
        let (raster, decode_ms) = timed(|| self.decode_bytes(bytes))?;
        let mut result = self.process_raster(&raster, target)?;
        record_decode(&mut result, decode_ms);
        Ok(result)
    }

    /// Decode and recolor an image file
    pub fn process_file<P: AsRef<Path>>(&self, path: P, target: &ColorTarget) -> Result<RecolorResult> {
        let path = path.as_ref();
        let (raster, decode_ms) = timed(|| self.decode_file(path))?;
        let mut result = self.process_raster(&raster, target)?;
        record_decode(&mut result, decode_ms);
        result.input_path = Some(path.display().to_string());
        Ok(result)
    }

    /// Recolor one shared raster to several targets concurrently
    ///
    /// Each target runs on a blocking worker. Every target gets an entry in
    /// the returned set, in request order, whether it succeeded or not.
    #[instrument(skip(self, raster, targets), fields(targets = targets.len()))]
    pub async fn process_targets(&self, raster: Arc<Raster>, targets: &[ColorTarget]) -> RecolorSet {
        let tasks = targets.iter().cloned().map(|target| {
            let processor = self.clone();
            let raster = Arc::clone(&raster);
            async move {
                let task_target = target.clone();
                let outcome =
                    tokio::task::spawn_blocking(move || processor.process_raster(&raster, &task_target))
                        .await
                        .unwrap_or_else(|e| {
                            Err(RecolorError::internal(format!(
                                "Recolor task for '{}' did not complete: {}",
                                target.name, e
                            )))
                        });
                (target, outcome)
            }
        });

        let set: RecolorSet = join_all(tasks).await.into_iter().collect();
        log_set_outcome(&set);
        set
    }

    /// Sequential counterpart of [`Self::process_targets`]
    pub fn process_targets_blocking(&self, raster: &Raster, targets: &[ColorTarget]) -> RecolorSet {
        let set: RecolorSet = targets
            .iter()
            .map(|target| (target.clone(), self.process_raster(raster, target)))
            .collect();
        log_set_outcome(&set);
        set
    }

    /// Decode a file once and recolor it to every configured target
    ///
    /// # Errors
    /// Decode failures abort the whole file; per-target failures are kept in
    /// the returned set.
    pub async fn process_file_targets<P: AsRef<Path>>(&self, path: P) -> Result<RecolorSet> {
        let path = path.as_ref();
        let (raster, decode_ms) = timed(|| self.decode_file(path))?;
        info!(
            path = %path.display(),
            dimensions = %format!("{}x{}", raster.width(), raster.height()),
            decode_ms,
            "Decoded input"
        );

        let mut set = self
            .process_targets(Arc::new(raster), &self.config.targets)
            .await;
        let input_path = path.display().to_string();
        for result in set.successes_mut() {
            record_decode(result, decode_ms);
            result.input_path = Some(input_path.clone());
        }
        Ok(set)
    }

    /// Where the output for `target` goes when writing into `output_dir`
    #[must_use]
    pub fn output_path(&self, input: &Path, output_dir: &Path, target: &ColorTarget) -> PathBuf {
        let format = self.config.output_format;
        if self.config.unique_output_names {
            return output_dir.join(OutputFormatHandler::unique_output_name(format));
        }
        let stem = input
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("output");
        OutputFormatHandler::output_file_name(output_dir, stem, target, format)
    }

    /// Output location for input without a file name, such as stdin
    ///
    /// Uses the download name `id_photo_{target}_{millis}.{ext}` unless
    /// unique names are configured.
    #[must_use]
    pub fn stream_output_path(&self, output_dir: &Path, target: &ColorTarget) -> PathBuf {
        let format = self.config.output_format;
        if self.config.unique_output_names {
            return output_dir.join(OutputFormatHandler::unique_output_name(format));
        }
        output_dir.join(OutputFormatHandler::download_name(
            target,
            format,
            chrono::Utc::now(),
        ))
    }

    /// Save a result in the configured output format
    pub fn save_result<P: AsRef<Path>>(&self, result: &mut RecolorResult, path: P) -> Result<()> {
        let format = self.config.output_format;
        let mut tracker = ProgressTracker::new(Arc::clone(&self.reporter));
        tracker.report_stage(ProcessingStage::FileSaving);
        result
            .save(path, format, self.quality_for(format))
            .map_err(|e| report_failure(&tracker, e))
    }

    /// Encode a result in the configured output format
    pub fn encode_result(&self, result: &RecolorResult) -> Result<Vec<u8>> {
        let format = self.config.output_format;
        let mut tracker = ProgressTracker::new(Arc::clone(&self.reporter));
        tracker.report_stage(ProcessingStage::FormatConversion);
        result
            .to_bytes(format, self.quality_for(format))
            .map_err(|e| report_failure(&tracker, e))
    }
}

fn report_failure(tracker: &ProgressTracker, error: RecolorError) -> RecolorError {
    tracker.report_error(&error.to_string());
    error
}

fn timed<T>(f: impl FnOnce() -> Result<T>) -> Result<(T, u64)> {
    let start = Instant::now();
    let value = f()?;
    Ok((value, start.elapsed().as_millis() as u64))
}

fn record_decode(result: &mut RecolorResult, decode_ms: u64) {
    result.timings.decode_ms = Some(decode_ms);
    result.timings.total_ms += decode_ms;
}

fn log_set_outcome(set: &RecolorSet) {
    for (target, error) in set.failures() {
        warn!(target = %target, error = %error, "Target failed");
    }
    debug!(
        succeeded = set.successes().count(),
        requested = set.len(),
        "Multi-target recolor finished"
    );
}
