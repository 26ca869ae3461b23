//! Configuration types for background recolor operations

use crate::{
    color::ColorTarget,
    error::{RecolorError, Result},
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Largest accepted encoded input, matching the upload limit of the web frontend
pub const DEFAULT_MAX_INPUT_BYTES: u64 = 16 * 1024 * 1024;

/// Output image format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// PNG, lossless with alpha
    #[default]
    Png,
    /// JPEG (alpha dropped)
    Jpeg,
    /// WebP, lossless with alpha
    WebP,
    /// TIFF with alpha channel and lossless compression
    Tiff,
    /// Raw RGBA8 pixel data (4 bytes per pixel)
    Rgba8,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Png => write!(f, "PNG"),
            Self::Jpeg => write!(f, "JPEG"),
            Self::WebP => write!(f, "WebP"),
            Self::Tiff => write!(f, "TIFF"),
            Self::Rgba8 => write!(f, "RGBA8"),
        }
    }
}

/// Configuration for background recolor operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecolorConfig {
    /// Output format
    pub output_format: OutputFormat,

    /// JPEG quality (0-100, only used for JPEG output)
    pub jpeg_quality: u8,

    /// WebP quality (0-100)
    ///
    /// Validated and stored but has no effect on output: WebP is always
    /// encoded lossless.
    pub webp_quality: u8,

    /// Colors to produce for every input, in output order
    pub targets: Vec<ColorTarget>,

    /// Reject encoded inputs larger than this many bytes
    pub max_input_bytes: u64,

    /// Name outputs `{uuid}_output.{ext}` instead of `{stem}_{target}.{ext}`
    pub unique_output_names: bool,

    /// Enable debug mode (additional logging)
    pub debug: bool,
}

impl Default for RecolorConfig {
    fn default() -> Self {
        Self {
            output_format: OutputFormat::default(),
            jpeg_quality: 90,
            webp_quality: 85,
            targets: ColorTarget::presets(),
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
            unique_output_names: false,
            debug: false,
        }
    }
}

impl RecolorConfig {
    /// Create a new configuration builder
    ///
    /// # Examples
    /// ```rust
    /// use imgly_bgrecolor::{ColorTarget, OutputFormat, RecolorConfig};
    ///
    /// let config = RecolorConfig::builder()
    ///     .output_format(OutputFormat::Jpeg)
    ///     .jpeg_quality(95)
    ///     .targets(vec![ColorTarget::parse("blue")?])
    ///     .build()?;
    /// assert_eq!(config.targets.len(), 1);
    /// # Ok::<(), imgly_bgrecolor::RecolorError>(())
    /// ```
    #[must_use]
    pub fn builder() -> RecolorConfigBuilder {
        RecolorConfigBuilder::default()
    }

    /// Parse a JSON configuration; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| RecolorError::invalid_config(format!("Malformed JSON config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| RecolorError::file_io_error("read config file", path, &e))?;
        Self::from_json_str(&json)
    }

    /// Validate all configuration parameters
    ///
    /// # Errors
    /// - JPEG or WebP quality above 100
    /// - `max_input_bytes` of zero
    /// - empty target list or duplicate target names
    pub fn validate(&self) -> Result<()> {
        if self.jpeg_quality > 100 {
            return Err(RecolorError::config_value_error(
                "JPEG quality",
                self.jpeg_quality,
                "0-100",
                Some(90),
            ));
        }

        if self.webp_quality > 100 {
            return Err(RecolorError::config_value_error(
                "WebP quality",
                self.webp_quality,
                "0-100",
                Some(85),
            ));
        }

        if self.max_input_bytes == 0 {
            return Err(RecolorError::config_value_error(
                "max input bytes",
                self.max_input_bytes,
                ">= 1",
                Some(DEFAULT_MAX_INPUT_BYTES),
            ));
        }

        if self.targets.is_empty() {
            return Err(RecolorError::invalid_config(
                "At least one target color is required",
            ));
        }

        let mut seen = HashSet::new();
        for target in &self.targets {
            if !seen.insert(target.name.as_str()) {
                return Err(RecolorError::invalid_config(format!(
                    "Duplicate target name '{}'",
                    target.name
                )));
            }
        }

        Ok(())
    }
}

/// Builder for `RecolorConfig`
#[derive(Debug, Default)]
pub struct RecolorConfigBuilder {
    config: RecolorConfig,
}

impl RecolorConfigBuilder {
    /// Start from an existing configuration, e.g. one loaded from a file
    #[must_use]
    pub fn from_config(config: RecolorConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.config.output_format = format;
        self
    }

    /// Set JPEG quality, clamped to 100
    #[must_use]
    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.config.jpeg_quality = quality.min(100);
        self
    }

    /// Set WebP quality, clamped to 100
    #[must_use]
    pub fn webp_quality(mut self, quality: u8) -> Self {
        self.config.webp_quality = quality.min(100);
        self
    }

    #[must_use]
    pub fn targets(mut self, targets: Vec<ColorTarget>) -> Self {
        self.config.targets = targets;
        self
    }

    #[must_use]
    pub fn add_target(mut self, target: ColorTarget) -> Self {
        self.config.targets.push(target);
        self
    }

    #[must_use]
    pub fn max_input_bytes(mut self, bytes: u64) -> Self {
        self.config.max_input_bytes = bytes;
        self
    }

    #[must_use]
    pub fn unique_output_names(mut self, unique: bool) -> Self {
        self.config.unique_output_names = unique;
        self
    }

    #[must_use]
    pub fn debug(mut self, debug: bool) -> Self {
        self.config.debug = debug;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<RecolorConfig> {
        let config = self.config;
        config.validate()?;
        Ok(config)
    }
}
