//! Progress reporting service
//!
//! Frontends implement [`ProgressReporter`] to observe the processor; the
//! recolor passes themselves know nothing about it.

use crate::types::RecolorTimings;
use instant::Instant;
use std::sync::Arc;
use tracing::{error, info};

/// Progress stages during a recolor run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStage {
    /// Loading and decoding input image
    ImageLoading,
    /// Estimating the backdrop color from the corners
    BackgroundSampling,
    /// Classifying and recoloring pixels
    Classification,
    /// Blurring edge pixels
    EdgeSmoothing,
    /// Converting to output format
    FormatConversion,
    /// Saving result to file
    FileSaving,
    /// Processing completed
    Completed,
    /// Processing one input of a batch
    BatchItemProcessing,
}

impl ProcessingStage {
    /// Human-readable description of the stage
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            ProcessingStage::ImageLoading => "Loading input image",
            ProcessingStage::BackgroundSampling => "Sampling background color",
            ProcessingStage::Classification => "Classifying and recoloring pixels",
            ProcessingStage::EdgeSmoothing => "Smoothing edges",
            ProcessingStage::FormatConversion => "Converting output format",
            ProcessingStage::FileSaving => "Saving result",
            ProcessingStage::Completed => "Processing completed",
            ProcessingStage::BatchItemProcessing => "Processing batch item",
        }
    }

    /// Typical progress percentage when the stage starts
    #[must_use]
    pub fn progress_percentage(&self) -> u8 {
        match self {
            ProcessingStage::ImageLoading => 10,
            ProcessingStage::BackgroundSampling => 20,
            ProcessingStage::Classification => 30,
            ProcessingStage::EdgeSmoothing => 70,
            ProcessingStage::FormatConversion => 90,
            ProcessingStage::FileSaving => 95,
            ProcessingStage::Completed => 100,
            ProcessingStage::BatchItemProcessing => 50,
        }
    }
}

/// Progress update containing stage and timing information
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    pub stage: ProcessingStage,
    /// Progress percentage (0-100)
    pub progress: u8,
    pub description: String,
    /// Elapsed time since processing started (milliseconds)
    pub elapsed_ms: u64,
}

impl ProgressUpdate {
    #[must_use]
    pub fn new(stage: ProcessingStage, start_time: Instant) -> Self {
        Self::with_description(stage, stage.description().to_string(), start_time)
    }

    /// Progress update with a caller-supplied description
    #[must_use]
    pub fn with_description(stage: ProcessingStage, description: String, start_time: Instant) -> Self {
        Self {
            progress: stage.progress_percentage(),
            elapsed_ms: start_time.elapsed().as_millis() as u64,
            stage,
            description,
        }
    }
}

/// Observer of recolor progress
pub trait ProgressReporter: Send + Sync {
    /// Report a progress update
    fn report_progress(&self, update: ProgressUpdate);

    /// Report processing completion with final timings
    fn report_completion(&self, timings: &RecolorTimings);

    /// Report an error during processing
    fn report_error(&self, stage: ProcessingStage, error: &str);
}

/// Progress reporter that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpProgressReporter;

impl ProgressReporter for NoOpProgressReporter {
    fn report_progress(&self, _update: ProgressUpdate) {}

    fn report_completion(&self, _timings: &RecolorTimings) {}

    fn report_error(&self, _stage: ProcessingStage, _error: &str) {}
}

/// Progress reporter that emits `tracing` events
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleProgressReporter {
    verbose: bool,
}

impl ConsoleProgressReporter {
    /// `verbose` adds elapsed time and per-stage timings
    #[must_use]
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl ProgressReporter for ConsoleProgressReporter {
    fn report_progress(&self, update: ProgressUpdate) {
        if self.verbose {
            info!(
                "[{}%] {} ({}ms elapsed)",
                update.progress, update.description, update.elapsed_ms
            );
        } else {
            info!("[{}%] {}", update.progress, update.description);
        }
    }

    fn report_completion(&self, timings: &RecolorTimings) {
        info!("Recolor completed in {}ms", timings.total_ms);

        if self.verbose {
            info!("  {}", timings.summary());
        }
    }

    fn report_error(&self, stage: ProcessingStage, error: &str) {
        error!("Error during {}: {}", stage.description(), error);
    }
}

/// Tracks the current stage of one run and forwards updates to a reporter
pub struct ProgressTracker {
    reporter: Arc<dyn ProgressReporter>,
    start_time: Instant,
    current_stage: Option<ProcessingStage>,
}

impl ProgressTracker {
    #[must_use]
    pub fn new(reporter: Arc<dyn ProgressReporter>) -> Self {
        Self {
            reporter,
            start_time: Instant::now(),
            current_stage: None,
        }
    }

    /// Tracker that reports nowhere
    #[must_use]
    pub fn no_op() -> Self {
        Self::new(Arc::new(NoOpProgressReporter))
    }

    #[must_use]
    pub fn console(verbose: bool) -> Self {
        Self::new(Arc::new(ConsoleProgressReporter::new(verbose)))
    }

    pub fn report_stage(&mut self, stage: ProcessingStage) {
        self.current_stage = Some(stage);
        self.reporter
            .report_progress(ProgressUpdate::new(stage, self.start_time));
    }

    pub fn report_stage_with_description(&mut self, stage: ProcessingStage, description: String) {
        self.current_stage = Some(stage);
        self.reporter.report_progress(ProgressUpdate::with_description(
            stage,
            description,
            self.start_time,
        ));
    }

    pub fn report_completion(&self, timings: &RecolorTimings) {
        self.reporter.report_completion(timings);
    }

    /// Report an error against the most recent stage
    pub fn report_error(&self, error: &str) {
        let stage = self.current_stage.unwrap_or(ProcessingStage::ImageLoading);
        self.reporter.report_error(stage, error);
    }

    #[must_use]
    pub fn elapsed_ms(&self) -> u64 {
        self.start_time.elapsed().as_millis() as u64
    }

    #[must_use]
    pub fn current_stage(&self) -> Option<ProcessingStage> {
        self.current_stage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Reporter that captures everything for verification
    #[derive(Default)]
    struct TestProgressReporter {
        updates: Mutex<Vec<ProgressUpdate>>,
        completions: Mutex<Vec<RecolorTimings>>,
        errors: Mutex<Vec<(ProcessingStage, String)>>,
    }

    impl ProgressReporter for TestProgressReporter {
        fn report_progress(&self, update: ProgressUpdate) {
            self.updates.lock().unwrap().push(update);
        }

        fn report_completion(&self, timings: &RecolorTimings) {
            self.completions.lock().unwrap().push(timings.clone());
        }

        fn report_error(&self, stage: ProcessingStage, error: &str) {
            self.errors.lock().unwrap().push((stage, error.to_string()));
        }
    }

    #[test]
    fn test_stage_percentages_increase_through_a_run() {
        let run = [
            ProcessingStage::ImageLoading,
            ProcessingStage::BackgroundSampling,
            ProcessingStage::Classification,
            ProcessingStage::EdgeSmoothing,
            ProcessingStage::FormatConversion,
            ProcessingStage::FileSaving,
            ProcessingStage::Completed,
        ];
        assert!(run
            .windows(2)
            .all(|w| w[0].progress_percentage() < w[1].progress_percentage()));
        assert_eq!(ProcessingStage::Completed.progress_percentage(), 100);
    }

    #[test]
    fn test_progress_update_creation() {
        let update = ProgressUpdate::new(ProcessingStage::EdgeSmoothing, Instant::now());
        assert_eq!(update.stage, ProcessingStage::EdgeSmoothing);
        assert_eq!(update.progress, 70);
        assert_eq!(update.description, "Smoothing edges");
        assert!(update.elapsed_ms < 1000);
    }

    #[test]
    fn test_no_op_progress_reporter() {
        let reporter = NoOpProgressReporter;
        reporter.report_progress(ProgressUpdate::new(ProcessingStage::Classification, Instant::now()));
        reporter.report_completion(&RecolorTimings::default());
        reporter.report_error(ProcessingStage::Classification, "test error");
    }

    #[test]
    fn test_progress_tracker() {
        let reporter = Arc::new(TestProgressReporter::default());
        let mut tracker = ProgressTracker::new(reporter.clone());
        assert!(tracker.current_stage().is_none());

        tracker.report_stage(ProcessingStage::BackgroundSampling);
        tracker.report_stage_with_description(
            ProcessingStage::Classification,
            "Custom description".to_string(),
        );
        tracker.report_completion(&RecolorTimings::default());
        tracker.report_error("Test error message");

        let updates = reporter.updates.lock().unwrap();
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].stage, ProcessingStage::BackgroundSampling);
        assert_eq!(updates[1].description, "Custom description");

        assert_eq!(reporter.completions.lock().unwrap().len(), 1);

        let errors = reporter.errors.lock().unwrap();
        assert_eq!(
            errors.as_slice(),
            [(ProcessingStage::Classification, "Test error message".to_string())]
        );
    }

    #[test]
    fn test_progress_tracker_convenience_constructors() {
        assert!(ProgressTracker::no_op().current_stage().is_none());
        assert!(ProgressTracker::console(true).current_stage().is_none());
    }
}
