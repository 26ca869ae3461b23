//! Output format handling service
//!
//! Format conversion, extensions and output file naming, kept apart from the
//! recolor passes.

use crate::{color::ColorTarget, config::OutputFormat, error::Result};
use chrono::{DateTime, Utc};
use image::{DynamicImage, RgbaImage};
use std::path::{Path, PathBuf};

/// Prefix of the browser download name
pub const DOWNLOAD_NAME_PREFIX: &str = "id_photo";

/// Service for handling output format conversions and naming
pub struct OutputFormatHandler;

impl OutputFormatHandler {
    /// Convert an RGBA image to the pixel layout of the specified output format
    ///
    /// JPEG drops the alpha channel; every other format keeps RGBA.
    ///
    /// # Examples
    /// ```rust
    /// use imgly_bgrecolor::{services::OutputFormatHandler, OutputFormat};
    /// use image::RgbaImage;
    ///
    /// let rgba_image = RgbaImage::new(10, 10);
    /// let converted = OutputFormatHandler::convert_format(rgba_image, OutputFormat::Jpeg)?;
    /// assert!(!converted.color().has_alpha());
    /// # Ok::<(), imgly_bgrecolor::RecolorError>(())
    /// ```
    pub fn convert_format(rgba_image: RgbaImage, format: OutputFormat) -> Result<DynamicImage> {
        let image = DynamicImage::ImageRgba8(rgba_image);
        match format {
            OutputFormat::Jpeg => Ok(DynamicImage::ImageRgb8(image.to_rgb8())),
            OutputFormat::Png | OutputFormat::WebP | OutputFormat::Tiff | OutputFormat::Rgba8 => {
                Ok(image)
            },
        }
    }

    /// File extension for a given output format, without the dot
    ///
    /// ```rust
    /// use imgly_bgrecolor::{services::OutputFormatHandler, OutputFormat};
    ///
    /// assert_eq!(OutputFormatHandler::get_extension(OutputFormat::Png), "png");
    /// assert_eq!(OutputFormatHandler::get_extension(OutputFormat::Jpeg), "jpg");
    /// ```
    #[must_use]
    pub fn get_extension(format: OutputFormat) -> &'static str {
        match format {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpg",
            OutputFormat::WebP => "webp",
            OutputFormat::Tiff => "tiff",
            OutputFormat::Rgba8 => "raw",
        }
    }

    /// Check if a format keeps the alpha channel
    #[must_use]
    pub fn supports_transparency(format: OutputFormat) -> bool {
        !matches!(format, OutputFormat::Jpeg)
    }

    /// Recommended quality as `(default, min, max)`; `None` for lossless formats
    #[must_use]
    pub fn get_quality_range(format: OutputFormat) -> Option<(u8, u8, u8)> {
        match format {
            OutputFormat::Jpeg => Some((90, 0, 100)),
            OutputFormat::WebP => Some((85, 0, 100)),
            OutputFormat::Png | OutputFormat::Tiff | OutputFormat::Rgba8 => None,
        }
    }

    /// Sniff the container format from magic bytes
    ///
    /// Returns the canonical extension of PNG, JPEG, WebP or TIFF data.
    #[must_use]
    pub fn detect_format_from_bytes(data: &[u8]) -> Option<&'static str> {
        const SIGNATURES: [(&[u8], &str); 4] = [
            (&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A], "png"),
            (&[0xFF, 0xD8, 0xFF], "jpg"),
            (&[0x49, 0x49, 0x2A, 0x00], "tiff"),
            (&[0x4D, 0x4D, 0x00, 0x2A], "tiff"),
        ];

        if let Some((_, ext)) = SIGNATURES.iter().find(|(magic, _)| data.starts_with(magic)) {
            return Some(ext);
        }

        // RIFF....WEBP
        if data.get(0..4) == Some(b"RIFF") && data.get(8..12) == Some(b"WEBP") {
            return Some("webp");
        }

        None
    }

    /// `{stem}_{target}.{ext}`, placed in `output_dir`
    #[must_use]
    pub fn output_file_name(
        output_dir: &Path,
        input_stem: &str,
        target: &ColorTarget,
        format: OutputFormat,
    ) -> PathBuf {
        output_dir.join(format!(
            "{}_{}.{}",
            input_stem,
            target.name,
            Self::get_extension(format)
        ))
    }

    /// Collision-free `{uuid}_output.{ext}`
    #[must_use]
    pub fn unique_output_name(format: OutputFormat) -> String {
        format!(
            "{}_output.{}",
            uuid::Uuid::new_v4(),
            Self::get_extension(format)
        )
    }

    /// `id_photo_{target}_{unix millis}.{ext}`, the name offered to a downloading user
    #[must_use]
    pub fn download_name(target: &ColorTarget, format: OutputFormat, at: DateTime<Utc>) -> String {
        format!(
            "{}_{}_{}.{}",
            DOWNLOAD_NAME_PREFIX,
            target.name,
            at.timestamp_millis(),
            Self::get_extension(format)
        )
    }
}
