//! Configuration conversion utilities for CLI arguments

use crate::cli::main_impl::{Cli, CliOutputFormat};
use crate::{
    color::ColorTarget,
    config::{OutputFormat, RecolorConfig, RecolorConfigBuilder},
};
use anyhow::{Context, Result};

const BYTES_PER_MIB: u64 = 1024 * 1024;

/// Convert CLI arguments to a validated `RecolorConfig`
pub(crate) struct CliConfigBuilder;

impl CliConfigBuilder {
    /// Build the configuration: file (if given) or defaults, then CLI overrides
    pub(crate) fn from_cli(cli: &Cli) -> Result<RecolorConfig> {
        let base = match &cli.config {
            Some(path) => RecolorConfig::from_json_file(path)
                .with_context(|| format!("Failed to load config file {}", path.display()))?,
            None => RecolorConfig::default(),
        };

        let mut builder = RecolorConfigBuilder::from_config(base);

        if !cli.colors.is_empty() {
            let targets = cli
                .colors
                .iter()
                .map(|spec| {
                    ColorTarget::parse(spec).with_context(|| format!("Invalid color '{}'", spec))
                })
                .collect::<Result<Vec<_>>>()?;
            builder = builder.targets(targets);
        }

        if let Some(format) = cli.format {
            builder = builder.output_format(Self::output_format(format));
        }
        if let Some(quality) = cli.jpeg_quality {
            builder = builder.jpeg_quality(quality);
        }
        if let Some(quality) = cli.webp_quality {
            builder = builder.webp_quality(quality);
        }
        if let Some(mb) = cli.max_input_mb {
            let bytes = mb
                .checked_mul(BYTES_PER_MIB)
                .context("--max-input-mb is too large")?;
            builder = builder.max_input_bytes(bytes);
        }
        if cli.unique_names {
            builder = builder.unique_output_names(true);
        }
        if cli.verbose >= 2 {
            builder = builder.debug(true);
        }

        builder.build().context("Invalid configuration")
    }

    pub(crate) fn output_format(format: CliOutputFormat) -> OutputFormat {
        match format {
            CliOutputFormat::Png => OutputFormat::Png,
            CliOutputFormat::Jpeg => OutputFormat::Jpeg,
            CliOutputFormat::Webp => OutputFormat::WebP,
            CliOutputFormat::Tiff => OutputFormat::Tiff,
            CliOutputFormat::Rgba8 => OutputFormat::Rgba8,
        }
    }

    /// Validate CLI arguments the builder would otherwise clamp or ignore
    pub(crate) fn validate_cli(cli: &Cli) -> Result<()> {
        for (name, quality) in [("JPEG", cli.jpeg_quality), ("WebP", cli.webp_quality)] {
            if let Some(q) = quality.filter(|&q| q > 100) {
                anyhow::bail!("{} quality must be between 0 and 100, got {}", name, q);
            }
        }

        if let Some(pattern) = &cli.pattern {
            glob::Pattern::new(pattern)
                .with_context(|| format!("Invalid file pattern '{}'", pattern))?;
        }

        if cli.max_input_mb == Some(0) {
            anyhow::bail!("--max-input-mb must be at least 1");
        }

        Ok(())
    }
}
