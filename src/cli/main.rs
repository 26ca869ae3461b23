//! Background recolor CLI tool
//!
//! Command-line interface for replacing ID photo backgrounds with solid colors.

use super::config::CliConfigBuilder;
use crate::{
    color::{ColorTarget, Preset},
    processor::RecolorProcessor,
    services::{
        ConsoleProgressReporter, ImageIOService, OutputFormatHandler, ProcessingStage,
        ProgressReporter,
    },
    tracing_config::{events, init_cli_tracing, spans, TracingFormat},
    types::RecolorSet,
};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn, Instrument};

/// Solid-color background replacement for ID photos
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "imgly-bgrecolor")]
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    /// Input image files or directories (use "-" for stdin)
    #[arg(value_name = "INPUT", required_unless_present = "list_presets")]
    pub input: Vec<String>,

    /// Output file (single input and color), directory otherwise. Use "-" for stdout.
    #[arg(short, long, value_name = "OUTPUT")]
    pub output: Option<String>,

    /// Target color: preset name, hex (#2196f3) or name=#hex. Repeatable [default: all presets]
    #[arg(short = 'c', long = "color", value_name = "COLOR")]
    pub colors: Vec<String>,

    /// Output format [default: png]
    #[arg(short, long, value_enum)]
    pub format: Option<CliOutputFormat>,

    /// JPEG quality (0-100) [default: 90]
    #[arg(long)]
    pub jpeg_quality: Option<u8>,

    /// WebP quality (0-100) [default: 85]; no effect, WebP output is lossless
    #[arg(long)]
    pub webp_quality: Option<u8>,

    /// Enable verbose logging (-v: DEBUG, -vv: TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Process directories recursively
    #[arg(short, long)]
    pub recursive: bool,

    /// File name pattern for directory inputs (e.g., "*.jpg")
    #[arg(long)]
    pub pattern: Option<String>,

    /// JSON configuration file; command-line flags take precedence
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Name outputs {uuid}_output.{ext} instead of {stem}_{color}.{ext}
    #[arg(long)]
    pub unique_names: bool,

    /// Reject inputs larger than this many MiB [default: 16]
    #[arg(long, value_name = "MB")]
    pub max_input_mb: Option<u64>,

    /// Print the color presets and exit
    #[arg(long)]
    pub list_presets: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
pub enum CliOutputFormat {
    Png,
    Jpeg,
    Webp,
    Tiff,
    Rgba8,
}

/// Where the outputs of one input go
#[derive(Debug, Clone, PartialEq, Eq)]
enum OutputTarget {
    Stdout,
    File(PathBuf),
    Directory(PathBuf),
}

pub async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.list_presets {
        list_presets();
        return Ok(());
    }

    let session_id =
        init_cli_tracing(cli.verbose, TracingFormat::Console).context("Failed to initialize tracing")?;

    CliConfigBuilder::validate_cli(&cli).context("Invalid CLI arguments")?;
    let config = CliConfigBuilder::from_cli(&cli).context("Failed to build configuration")?;

    let target_names = config
        .targets
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    info!("Input(s): {}", cli.input.join(", "));
    info!("Target color(s): {}", target_names);
    debug!(config = ?config, "Resolved configuration");

    let mut processor = RecolorProcessor::new(config).context("Failed to create recolor processor")?;
    if cli.verbose > 0 {
        processor = processor.with_progress_reporter(Arc::new(ConsoleProgressReporter::new(true)));
    }

    let start_time = Instant::now();
    let processed_count = process_inputs(&cli, &processor)
        .instrument(spans::session(&session_id, &target_names))
        .await?;

    info!(
        "Processed {} image(s) in {:.2}s",
        processed_count,
        start_time.elapsed().as_secs_f64()
    );

    Ok(())
}

fn list_presets() {
    println!("Available color presets:");
    for preset in Preset::ALL {
        println!("  {:<6} {}", preset.name(), preset.color());
    }
    println!();
    println!("Custom colors: -c '#112233' or -c navy=#000080");
}

async fn process_inputs(cli: &Cli, processor: &RecolorProcessor) -> Result<usize> {
    if cli.input.len() == 1 && cli.input.first().is_some_and(|s| s == "-") {
        return process_stdin(cli.output.as_deref(), processor).await;
    }

    let mut all_files = Vec::new();
    for input in &cli.input {
        let path = PathBuf::from(input);

        if path.is_file() {
            if ImageIOService::is_supported_format(&path) {
                all_files.push(path);
            } else {
                warn!("Skipping unsupported file: {}", path.display());
            }
        } else if path.is_dir() {
            all_files.extend(find_image_files(&path, cli.recursive, cli.pattern.as_deref())?);
        } else {
            anyhow::bail!(
                "Input path does not exist or is not accessible: {}",
                path.display()
            );
        }
    }

    if all_files.is_empty() {
        warn!("No supported image files found in the provided inputs");
        return Ok(0);
    }

    // Sort for a stable processing order
    all_files.sort();
    let file_count = all_files.len();
    info!("Found {} image file(s) to process", file_count);

    let batch_output = prepare_batch_output(cli, file_count, processor.config().targets.len())?;

    let progress_bar = if file_count > 1 {
        let pb = ProgressBar::new(file_count as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .context("Invalid progress bar template")?
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    let error_reporter = ConsoleProgressReporter::new(cli.verbose > 0);
    let mut processed_count = 0;
    let mut failed_count = 0;
    let batch_start = Instant::now();

    async {
        for input_file in &all_files {
            if let Some(ref pb) = progress_bar {
                pb.set_message(format!("Processing {}", input_file.display()));
            }

            let output = batch_output
                .clone()
                .unwrap_or_else(|| default_output_for(input_file));

            match process_single_file(processor, input_file, &output)
                .instrument(spans::file_processing(input_file))
                .await
            {
                Ok(written) => {
                    processed_count += 1;
                    debug!("Processed {} ({} output(s))", input_file.display(), written);
                },
                Err(e) => {
                    failed_count += 1;
                    error!("Failed to process {}: {:#}", input_file.display(), e);
                    error_reporter.report_error(
                        ProcessingStage::BatchItemProcessing,
                        &format!("{}: {}", input_file.display(), e),
                    );
                },
            }

            if let Some(ref pb) = progress_bar {
                pb.inc(1);
            }
        }
    }
    .instrument(spans::batch_processing(file_count))
    .await;

    if let Some(pb) = progress_bar {
        pb.finish_with_message(format!(
            "Completed! Processed: {processed_count}, Failed: {failed_count}"
        ));
    }

    if file_count > 1 {
        let total_time = batch_start.elapsed();
        info!("Batch processing summary:");
        info!("  Files processed: {}", processed_count);
        info!("  Files failed: {}", failed_count);
        info!("  Total time: {:.2}s", total_time.as_secs_f64());
        events::performance_metric("batch", total_time.as_millis() as u64);
    }

    if failed_count > 0 {
        if processed_count == 0 {
            anyhow::bail!("All {} input file(s) failed to process", failed_count);
        }
        events::warning_with_recommendation(
            &format!("Some files failed to process. Processed: {processed_count}, Failed: {failed_count}"),
            "Run with -v for per-stage details",
        );
    }

    Ok(processed_count)
}

/// Output shared by every input, or `None` to write next to each input
fn prepare_batch_output(cli: &Cli, file_count: usize, target_count: usize) -> Result<Option<OutputTarget>> {
    let Some(output) = cli.output.as_deref() else {
        return Ok(None);
    };

    if output == "-" {
        if file_count > 1 || target_count > 1 {
            anyhow::bail!("Stdout (-) output needs exactly one input and one color");
        }
        return Ok(Some(OutputTarget::Stdout));
    }

    let output_path = PathBuf::from(output);
    if file_count == 1 && target_count == 1 && !output_path.is_dir() {
        return Ok(Some(OutputTarget::File(output_path)));
    }

    if output_path.is_file() {
        anyhow::bail!(
            "Output path exists and is a file, not a directory: {}",
            output_path.display()
        );
    }
    std::fs::create_dir_all(&output_path).with_context(|| {
        format!(
            "Failed to create output directory: {}",
            output_path.display()
        )
    })?;
    Ok(Some(OutputTarget::Directory(output_path)))
}

fn default_output_for(input_file: &Path) -> OutputTarget {
    let dir = input_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    OutputTarget::Directory(dir.to_path_buf())
}

/// Recolor one file to every configured color; returns the number of outputs written
async fn process_single_file(
    processor: &RecolorProcessor,
    input_file: &Path,
    output: &OutputTarget,
) -> Result<usize> {
    let set = processor
        .process_file_targets(input_file)
        .await
        .with_context(|| format!("Failed to load {}", input_file.display()))?;

    write_outputs(processor, set, output, |dir, target| {
        processor.output_path(input_file, dir, target)
    })
}

async fn process_stdin(output: Option<&str>, processor: &RecolorProcessor) -> Result<usize> {
    let start_time = Instant::now();
    let image_data = read_stdin()?;

    match OutputFormatHandler::detect_format_from_bytes(&image_data) {
        Some(ext) => info!("Detected image format: {}", ext.to_uppercase()),
        None => warn!("Could not detect image format from stdin data"),
    }

    let raster = processor
        .decode_bytes(&image_data)
        .context("Failed to decode image from stdin")?;
    let targets = processor.config().targets.clone();

    let output = match output {
        Some("-") => {
            if targets.len() > 1 {
                anyhow::bail!("Stdout (-) output needs exactly one color");
            }
            OutputTarget::Stdout
        },
        Some(path) if targets.len() == 1 && !Path::new(path).is_dir() => OutputTarget::File(path.into()),
        Some(dir) => OutputTarget::Directory(dir.into()),
        None => OutputTarget::Directory(PathBuf::from(".")),
    };

    let set = processor.process_targets(Arc::new(raster), &targets).await;
    let written = write_outputs(processor, set, &output, |dir, target| {
        processor.stream_output_path(dir, target)
    })?;

    info!(
        "Processed stdin image in {:.2}s",
        start_time.elapsed().as_secs_f64()
    );
    Ok(written)
}

/// Save or stream every successful result; fail if any target failed
fn write_outputs<F>(
    processor: &RecolorProcessor,
    set: RecolorSet,
    output: &OutputTarget,
    path_in_dir: F,
) -> Result<usize>
where
    F: Fn(&Path, &ColorTarget) -> PathBuf,
{
    let requested = set.len();
    let mut failures = Vec::new();
    let mut written = 0;

    for (target, outcome) in set {
        let mut result = match outcome {
            Ok(result) => result,
            Err(e) => {
                events::error_with_context(&e, &format!("recolor to {}", target));
                failures.push(format!("{}: {}", target.name, e));
                continue;
            },
        };

        match output {
            OutputTarget::Stdout => {
                let bytes = processor
                    .encode_result(&result)
                    .context("Failed to encode output image")?;
                write_stdout(&bytes)?;
            },
            OutputTarget::File(path) => {
                processor
                    .save_result(&mut result, path)
                    .with_context(|| format!("Failed to save {}", path.display()))?;
            },
            OutputTarget::Directory(dir) => {
                let path = path_in_dir(dir, &target);
                processor
                    .save_result(&mut result, &path)
                    .with_context(|| format!("Failed to save {}", path.display()))?;
            },
        }

        debug!(target = %target, "{}", result.timing_summary());
        written += 1;
    }

    if !failures.is_empty() {
        anyhow::bail!(
            "{} of {} color(s) failed: {}",
            failures.len(),
            requested,
            failures.join("; ")
        );
    }

    Ok(written)
}

fn read_stdin() -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    io::stdin()
        .read_to_end(&mut buffer)
        .context("Failed to read image data from stdin")?;

    if buffer.is_empty() {
        anyhow::bail!("No data received from stdin");
    }

    Ok(buffer)
}

fn write_stdout(data: &[u8]) -> Result<()> {
    let mut stdout = io::stdout().lock();
    stdout
        .write_all(data)
        .context("Failed to write image data to stdout")?;
    stdout.flush().context("Failed to flush stdout")?;
    Ok(())
}

/// Find supported image files in a directory
fn find_image_files(dir: &Path, recursive: bool, pattern: Option<&str>) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    if recursive {
        for entry in walkdir::WalkDir::new(dir) {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type().is_file()
                && ImageIOService::is_supported_format(path)
                && matches_pattern(path, pattern)
            {
                files.push(path.to_path_buf());
            }
        }
    } else {
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type()?.is_file()
                && ImageIOService::is_supported_format(&path)
                && matches_pattern(&path, pattern)
            {
                files.push(path);
            }
        }
    }

    Ok(files)
}

/// Check if the file name matches the given glob pattern
fn matches_pattern(path: &Path, pattern: Option<&str>) -> bool {
    let Some(pat) = pattern else {
        return true;
    };
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|filename| {
            glob::Pattern::new(pat)
                .map(|p| p.matches(filename))
                .unwrap_or(false)
        })
}
