//! Image I/O operations service
//!
//! Decoding, encoding and file writes live here so the recolor passes never
//! touch the filesystem or a codec.

use crate::{
    config::OutputFormat,
    error::{RecolorError, Result},
    services::format::OutputFormatHandler,
};
use image::DynamicImage;
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

/// Input file extensions accepted for decoding
pub const SUPPORTED_INPUT_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "webp", "tif", "tiff"];

/// Service for handling image file input/output operations
pub struct ImageIOService;

impl ImageIOService {
    /// Check whether a file name carries one of the accepted extensions
    ///
    /// # Examples
    /// ```rust
    /// use imgly_bgrecolor::services::ImageIOService;
    ///
    /// assert!(ImageIOService::is_supported_format("portrait.JPG"));
    /// assert!(!ImageIOService::is_supported_format("portrait.gif"));
    /// ```
    #[must_use]
    pub fn is_supported_format<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                SUPPORTED_INPUT_EXTENSIONS
                    .iter()
                    .any(|supported| ext.eq_ignore_ascii_case(supported))
            })
    }

    /// Reject inputs above `limit` bytes
    pub fn check_size(size: u64, limit: u64) -> Result<()> {
        if size > limit {
            return Err(RecolorError::InputTooLarge { size, limit });
        }
        Ok(())
    }

    /// Decode an encoded image held in memory
    ///
    /// # Errors
    /// - `InputTooLarge` if `bytes` exceeds `max_bytes`
    /// - `UnsupportedFormat` if the container is not PNG, JPEG, WebP or TIFF
    /// - `Image` if the decoder rejects the data
    pub fn load_from_bytes(bytes: &[u8], max_bytes: u64) -> Result<DynamicImage> {
        Self::check_size(bytes.len() as u64, max_bytes)?;

        if OutputFormatHandler::detect_format_from_bytes(bytes).is_none() {
            return Err(RecolorError::unsupported_format(
                "input is not a PNG, JPEG, WebP or TIFF image",
            ));
        }

        Ok(image::load_from_memory(bytes)?)
    }

    /// Load an image from a file path
    ///
    /// The size limit is checked against file metadata before reading.
    /// Extension-based decoding is tried first, then content sniffing.
    pub fn load_image<P: AsRef<Path>>(path: P, max_bytes: u64) -> Result<DynamicImage> {
        let path_ref = path.as_ref();

        let metadata = std::fs::metadata(path_ref)
            .map_err(|e| RecolorError::file_io_error("read image file", path_ref, &e))?;
        Self::check_size(metadata.len(), max_bytes)?;

        match image::open(path_ref) {
            Ok(img) => Ok(img),
            Err(e) => {
                debug!(
                    path = %path_ref.display(),
                    error = %e,
                    "Extension-based decode failed, trying content detection"
                );

                let data = std::fs::read(path_ref)
                    .map_err(|io_err| RecolorError::file_io_error("read image data", path_ref, &io_err))?;

                Self::load_from_bytes(&data, max_bytes).map_err(|content_err| {
                    let extension = path_ref
                        .extension()
                        .and_then(|s| s.to_str())
                        .unwrap_or("unknown");

                    RecolorError::processing_stage_error(
                        "image loading",
                        &format!(
                            "Failed with both extension-based ({}) and content-based detection. Extension error: {}. Content error: {}",
                            extension, e, content_err
                        ),
                        Some(&format!("path: {}, size: {} bytes", path_ref.display(), data.len())),
                    )
                })
            },
        }
    }

    /// Encode an image into `format`
    ///
    /// `quality` applies to JPEG only. WebP output is lossless, so a WebP
    /// quality setting does not change the encoded bytes.
    pub fn encode(image: &DynamicImage, format: OutputFormat, quality: u8) -> Result<Vec<u8>> {
        let image = OutputFormatHandler::convert_format(image.to_rgba8(), format)?;
        let mut buffer = Vec::new();

        match format {
            OutputFormat::Png => {
                image.write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Png)?;
            },
            OutputFormat::Jpeg => {
                let rgb_image = image.to_rgb8();
                let mut encoder =
                    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality.min(100));
                encoder.encode_image(&rgb_image)?;
            },
            OutputFormat::Tiff => {
                image.write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Tiff)?;
            },
            #[cfg(feature = "webp-support")]
            OutputFormat::WebP => {
                image.write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::WebP)?;
            },
            #[cfg(not(feature = "webp-support"))]
            OutputFormat::WebP => {
                return Err(RecolorError::unsupported_format(
                    "WebP output requires the webp-support feature",
                ));
            },
            OutputFormat::Rgba8 => buffer = image.to_rgba8().into_raw(),
        }

        Ok(buffer)
    }

    /// Encode and write an image, creating parent directories as needed
    pub fn save_image<P: AsRef<Path>>(
        image: &DynamicImage,
        path: P,
        format: OutputFormat,
        quality: u8,
    ) -> Result<()> {
        let path_ref = path.as_ref();

        if let Some(parent) = path_ref.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| RecolorError::file_io_error("create output directory", parent, &e))?;
        }

        let bytes = Self::encode(image, format, quality).map_err(|e| {
            RecolorError::processing_stage_error(
                "image save",
                &format!("Failed to encode as {}: {}", format, e),
                Some(&format!("format: {}, path: {}", format, path_ref.display())),
            )
        })?;

        std::fs::write(path_ref, bytes)
            .map_err(|e| RecolorError::file_io_error("write output image", path_ref, &e))?;

        debug!(path = %path_ref.display(), %format, "Saved image");
        Ok(())
    }
}
