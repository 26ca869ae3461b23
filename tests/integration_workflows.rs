//! Integration tests for complete recolor workflows
//!
//! Encoded files go in, recolored files come out, and every configured
//! target is accounted for.

use image::{DynamicImage, ImageFormat, RgbImage, RgbaImage};
use imgly_bgrecolor::{
    recolor_from_bytes, recolor_image, Color, ColorTarget, ErrorKind, ImageIOService,
    OutputFormat, PixelClass, Preset, ProcessingStage, ProgressReporter, ProgressUpdate, Raster,
    RecolorConfig, RecolorError, RecolorProcessor, RecolorResult, RecolorSet, RecolorTimings,
    Result,
};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Light grey backdrop with a darker subject in the lower middle
fn create_portrait(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        let subject = x > width / 4 && x < width * 3 / 4 && y > height / 3;
        if subject {
            image::Rgba([70, 50, 40, 255])
        } else {
            image::Rgba([235, 235, 235, 255])
        }
    })
}

fn write_portrait(dir: &Path, name: &str, format: ImageFormat) -> Result<std::path::PathBuf> {
    let path = dir.join(name);
    let portrait = create_portrait(40, 30);
    match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgba8(portrait).to_rgb8().save(&path)?,
        _ => portrait.save(&path)?,
    }
    Ok(path)
}

#[derive(Default)]
struct StageRecorder {
    stages: Mutex<Vec<ProcessingStage>>,
    completions: Mutex<usize>,
}

impl ProgressReporter for StageRecorder {
    fn report_progress(&self, update: ProgressUpdate) {
        if let Ok(mut stages) = self.stages.lock() {
            stages.push(update.stage);
        }
    }

    fn report_completion(&self, _timings: &RecolorTimings) {
        if let Ok(mut completions) = self.completions.lock() {
            *completions += 1;
        }
    }

    fn report_error(&self, _stage: ProcessingStage, _error: &str) {}
}

#[test]
fn test_png_file_round_trip() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let input = write_portrait(temp_dir.path(), "passport.png", ImageFormat::Png)?;

    let processor = RecolorProcessor::new(RecolorConfig::default())?;
    let target = ColorTarget::preset(Preset::Blue);
    let mut result = processor.process_file(&input, &target)?;

    assert_eq!(result.dimensions(), (40, 30));
    assert_eq!(result.background, Color::new(235, 235, 235));
    assert!(result.timings.decode_ms.is_some());
    assert_eq!(result.input_path.as_deref(), input.to_str());

    let output = processor.output_path(&input, temp_dir.path(), &target);
    assert_eq!(output, temp_dir.path().join("passport_blue.png"));
    processor.save_result(&mut result, &output)?;
    assert!(result.timings.encode_ms.is_some());

    let saved = image::open(&output)?.to_rgba8();
    assert_eq!(saved.dimensions(), (40, 30));
    assert_eq!(saved.get_pixel(0, 0).0, [33, 150, 243, 255]);
    assert_eq!(saved.get_pixel(20, 25).0, [70, 50, 40, 255]);

    Ok(())
}

#[test]
fn test_jpeg_input_recolored_to_red() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let input = write_portrait(temp_dir.path(), "visa.jpg", ImageFormat::Jpeg)?;

    let processor = RecolorProcessor::new(RecolorConfig::default())?;
    let result = processor.process_file(&input, &ColorTarget::preset(Preset::Red))?;

    // JPEG artifacts stay well inside the background band
    assert_eq!(result.raster.pixel(0, 0), Some([255, 0, 0, 255]));
    assert!(result.stats.background > result.stats.foreground);

    Ok(())
}

#[test]
fn test_output_formats_encode() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let raster = Raster::from_rgba_image(create_portrait(16, 12))?;
    let target = ColorTarget::preset(Preset::White);

    let mut formats = vec![
        (OutputFormat::Png, "png"),
        (OutputFormat::Jpeg, "jpg"),
        (OutputFormat::Tiff, "tiff"),
    ];
    if cfg!(feature = "webp-support") {
        formats.push((OutputFormat::WebP, "webp"));
    }

    for (format, extension) in formats {
        let config = RecolorConfig::builder()
            .output_format(format)
            .jpeg_quality(80)
            .build()?;
        let processor = RecolorProcessor::new(config)?;
        let mut result = processor.process_raster(&raster, &target)?;

        let path = processor.output_path(Path::new("portrait.png"), temp_dir.path(), &target);
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some(extension));
        processor.save_result(&mut result, &path)?;

        let decoded = image::open(&path)?;
        assert_eq!((decoded.width(), decoded.height()), (16, 12));
    }

    // Raw output is exactly the pixel buffer
    let config = RecolorConfig::builder()
        .output_format(OutputFormat::Rgba8)
        .build()?;
    let processor = RecolorProcessor::new(config)?;
    let result = processor.process_raster(&raster, &target)?;
    let bytes = processor.encode_result(&result)?;
    assert_eq!(bytes, result.raster.as_bytes());

    Ok(())
}

#[tokio::test]
async fn test_all_presets_from_one_decode() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let input = write_portrait(temp_dir.path(), "applicant.png", ImageFormat::Png)?;

    let processor = RecolorProcessor::new(RecolorConfig::default())?;
    let set = processor.process_file_targets(&input).await?;

    assert_eq!(set.len(), 3);
    assert!(set.all_succeeded());

    let names: Vec<&str> = set.iter().map(|(target, _)| target.name.as_str()).collect();
    assert_eq!(names, ["white", "blue", "red"]);

    for (target, outcome) in set.iter() {
        let result = outcome.as_ref().map_err(|e| RecolorError::internal(e.to_string()))?;
        let [r, g, b] = target.color.to_array();
        assert_eq!(result.raster.pixel(0, 0), Some([r, g, b, 255]));
        assert!(result.timings.decode_ms.is_some());
        assert_eq!(result.input_path.as_deref(), input.to_str());
    }

    Ok(())
}

#[tokio::test]
async fn test_concurrent_matches_sequential() -> Result<()> {
    let raster = Arc::new(Raster::from_rgba_image(create_portrait(50, 40))?);
    let targets = vec![
        ColorTarget::preset(Preset::Red),
        ColorTarget::parse("navy=#000080")?,
        ColorTarget::parse("#98ff98")?,
    ];

    let processor = RecolorProcessor::new(RecolorConfig::default())?;
    let concurrent = processor.process_targets(Arc::clone(&raster), &targets).await;
    let sequential = processor.process_targets_blocking(&raster, &targets);

    assert_eq!(concurrent.len(), sequential.len());
    for ((left_target, left), (right_target, right)) in concurrent.iter().zip(sequential.iter()) {
        assert_eq!(left_target, right_target);
        match (left, right) {
            (Ok(left), Ok(right)) => assert_eq!(left.raster, right.raster),
            _ => panic!("every target should succeed"),
        }
    }

    Ok(())
}

#[tokio::test]
async fn test_recolor_from_bytes_with_custom_targets() -> Result<()> {
    let bytes = ImageIOService::encode(
        &DynamicImage::ImageRgba8(create_portrait(20, 20)),
        OutputFormat::Png,
        100,
    )?;

    let config = RecolorConfig::builder()
        .targets(vec![ColorTarget::new("teal", Color::new(0, 128, 128))?])
        .build()?;
    let set = recolor_from_bytes(&bytes, &config).await?;

    assert_eq!(set.len(), 1);
    let teal = set.get("teal").and_then(|outcome| outcome.as_ref().ok());
    assert_eq!(
        teal.and_then(|result| result.raster.pixel(19, 0)),
        Some([0, 128, 128, 255])
    );
    assert!(set.get("white").is_none());

    Ok(())
}

#[tokio::test]
async fn test_recolor_image_rgb_input() -> Result<()> {
    // Opaque RGB input comes back as RGBA
    let rgb = RgbImage::from_pixel(5, 5, image::Rgb([255, 255, 255]));
    let set = recolor_image(&DynamicImage::ImageRgb8(rgb), &RecolorConfig::default()).await?;

    let blue = set.get("blue").and_then(|outcome| outcome.as_ref().ok());
    assert_eq!(
        blue.map(|result| result.stats.background),
        Some(25)
    );

    Ok(())
}

#[test]
fn test_set_keeps_failures_next_to_successes() -> Result<()> {
    let processor = RecolorProcessor::new(RecolorConfig::default())?;
    let raster = Raster::filled(3, 3, [255, 255, 255, 255])?;
    let white = ColorTarget::preset(Preset::White);

    let mut set = RecolorSet::new();
    set.push(white.clone(), processor.process_raster(&raster, &white));
    set.push(
        ColorTarget::preset(Preset::Red),
        Err(RecolorError::internal("worker panicked")),
    );

    assert_eq!(set.len(), 2);
    assert!(!set.all_succeeded());
    assert_eq!(set.successes().count(), 1);

    let failures: Vec<_> = set.failures().collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0.name, "red");
    assert_eq!(failures[0].1.kind(), ErrorKind::Internal);

    let results: Vec<RecolorResult> = set
        .into_iter()
        .filter_map(|(_, outcome)| outcome.ok())
        .collect();
    assert_eq!(results[0].stats.background, 9);

    Ok(())
}

#[test]
fn test_progress_stages_in_order() -> Result<()> {
    let recorder = Arc::new(StageRecorder::default());
    let processor = RecolorProcessor::new(RecolorConfig::default())?
        .with_progress_reporter(Arc::clone(&recorder) as Arc<dyn ProgressReporter>);

    let raster = Raster::from_rgba_image(create_portrait(12, 9))?;
    let result = processor.process_raster(&raster, &ColorTarget::preset(Preset::Blue))?;
    assert!(result.stats.total() > 0);

    let stages = recorder.stages.lock().map(|s| s.clone()).unwrap_or_default();
    assert_eq!(
        stages,
        [
            ProcessingStage::BackgroundSampling,
            ProcessingStage::Classification,
            ProcessingStage::EdgeSmoothing,
            ProcessingStage::Completed,
        ]
    );
    assert_eq!(recorder.completions.lock().map(|c| *c).unwrap_or(0), 1);

    Ok(())
}

#[test]
fn test_unique_output_names() -> Result<()> {
    let config = RecolorConfig::builder().unique_output_names(true).build()?;
    let processor = RecolorProcessor::new(config)?;
    let target = ColorTarget::preset(Preset::White);
    let dir = Path::new("/tmp/out");

    let first = processor.output_path(Path::new("a.png"), dir, &target);
    let second = processor.output_path(Path::new("a.png"), dir, &target);
    assert_ne!(first, second);
    assert!(first
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with("_output.png")));

    let default = RecolorProcessor::new(RecolorConfig::default())?;
    let stream = default.stream_output_path(dir, &target);
    let name = stream.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    assert!(name.starts_with("id_photo_white_"));
    assert!(name.ends_with(".png"));

    Ok(())
}

#[test]
fn test_classes_exposed_per_pixel() -> Result<()> {
    let raster = Raster::from_rgba_image(create_portrait(8, 8))?;
    let outcome = imgly_bgrecolor::recolor_with_details(&raster, Color::new(0, 0, 0))?;
    assert_eq!(outcome.classes.get(0, 0), Some(PixelClass::Background));
    assert_eq!(outcome.classes.get(8, 0), None);
    assert_eq!(outcome.classes.dimensions(), (8, 8));
    Ok(())
}
