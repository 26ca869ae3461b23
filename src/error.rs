//! Error types for background recolor operations

use thiserror::Error;

/// Result type alias for background recolor operations
pub type Result<T> = std::result::Result<T, RecolorError>;

/// Broad failure category, used by callers to decide user-visible behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input rejected before any processing
    Input,
    /// Buffer allocation failure for the current invocation
    Resource,
    /// Out-of-range tunable in the processing configuration
    Configuration,
    /// File system or codec failure in a collaborator
    Io,
    /// Unexpected condition
    Internal,
}

/// Error types for background recolor operations
#[derive(Error, Debug)]
pub enum RecolorError {
    /// Target color could not be parsed
    #[error("Invalid color: {0}")]
    InvalidColor(String),

    /// Raster with a zero width or height
    #[error("Invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    /// Pixel buffer length does not match `width * height * 4`
    #[error("Invalid raster buffer: expected {expected} bytes, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    /// Encoded input exceeds the configured size limit
    #[error("Input too large: {size} bytes (limit: {limit} bytes)")]
    InputTooLarge { size: u64, limit: u64 },

    /// Unsupported file format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Output buffer could not be allocated
    #[error("Failed to allocate {bytes} bytes for {purpose}")]
    Allocation { bytes: usize, purpose: &'static str },

    /// Invalid configuration or parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Input/output errors (file not found, permission denied, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image decode or encode errors
    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    /// Processing failure in a collaborator stage
    #[error("Processing error: {0}")]
    Processing(String),

    /// Generic error for unexpected conditions
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RecolorError {
    /// Create a new invalid color error
    pub fn invalid_color<S: Into<String>>(msg: S) -> Self {
        Self::InvalidColor(msg.into())
    }

    /// Create a new invalid configuration error
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a new unsupported format error
    pub fn unsupported_format<S: Into<String>>(format: S) -> Self {
        Self::UnsupportedFormat(format.into())
    }

    /// Create a new processing error
    pub fn processing<S: Into<String>>(msg: S) -> Self {
        Self::Processing(msg.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }

    /// Classify this error into the failure taxonomy
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidColor(_)
            | Self::InvalidDimensions { .. }
            | Self::BufferSizeMismatch { .. }
            | Self::InputTooLarge { .. }
            | Self::UnsupportedFormat(_) => ErrorKind::Input,
            Self::Allocation { .. } => ErrorKind::Resource,
            Self::InvalidConfig(_) => ErrorKind::Configuration,
            Self::Io(_) | Self::Image(_) | Self::Processing(_) => ErrorKind::Io,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Create file I/O error with operation context
    pub fn file_io_error<P: AsRef<std::path::Path>>(
        operation: &str,
        path: P,
        error: &std::io::Error,
    ) -> Self {
        let path_display = path.as_ref().display();
        Self::Io(std::io::Error::new(
            error.kind(),
            format!("Failed to {} '{}': {}", operation, path_display, error),
        ))
    }

    /// Create configuration error with valid ranges
    pub fn config_value_error<T: std::fmt::Display>(
        parameter: &str,
        value: T,
        valid_range: &str,
        recommended: Option<T>,
    ) -> Self {
        let recommendation = match recommended {
            Some(rec) => format!(" Recommended: {}", rec),
            None => String::new(),
        };

        Self::InvalidConfig(format!(
            "Invalid {}: {} (valid range: {}).{}",
            parameter, value, valid_range, recommendation
        ))
    }

    /// Create processing error with stage context
    pub fn processing_stage_error(stage: &str, details: &str, input_info: Option<&str>) -> Self {
        let input_context = match input_info {
            Some(info) => format!(" (input: {})", info),
            None => String::new(),
        };

        Self::Processing(format!(
            "Processing failed at stage '{}'{}: {}",
            stage, input_context, details
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_error_creation() {
        let err = RecolorError::invalid_config("test config error");
        assert!(matches!(err, RecolorError::InvalidConfig(_)));

        let err = RecolorError::unsupported_format("GIF");
        assert!(matches!(err, RecolorError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_error_display() {
        let err = RecolorError::invalid_color("'zzzzzz' is not a hex color");
        assert_eq!(err.to_string(), "Invalid color: 'zzzzzz' is not a hex color");

        let err = RecolorError::InvalidDimensions {
            width: 0,
            height: 12,
        };
        assert_eq!(err.to_string(), "Invalid raster dimensions: 0x12");
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(RecolorError::invalid_color("x").kind(), ErrorKind::Input);
        assert_eq!(
            RecolorError::InvalidDimensions {
                width: 0,
                height: 0
            }
            .kind(),
            ErrorKind::Input
        );
        assert_eq!(
            RecolorError::InputTooLarge { size: 2, limit: 1 }.kind(),
            ErrorKind::Input
        );
        assert_eq!(
            RecolorError::Allocation {
                bytes: 16,
                purpose: "output raster"
            }
            .kind(),
            ErrorKind::Resource
        );
        assert_eq!(
            RecolorError::invalid_config("x").kind(),
            ErrorKind::Configuration
        );
        assert_eq!(RecolorError::internal("x").kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_enhanced_error_context() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = RecolorError::file_io_error("read image file", Path::new("/tmp/photo.jpg"), &io_error);
        let error_string = err.to_string();
        assert!(error_string.contains("read image file"));
        assert!(error_string.contains("/tmp/photo.jpg"));

        let err = RecolorError::config_value_error("JPEG quality", 150, "0-100", Some(90));
        let error_string = err.to_string();
        assert!(error_string.contains("JPEG quality"));
        assert!(error_string.contains("150"));
        assert!(error_string.contains("0-100"));
        assert!(error_string.contains("Recommended: 90"));

        let err = RecolorError::processing_stage_error(
            "image loading",
            "truncated stream",
            Some("path: photo.png"),
        );
        let error_string = err.to_string();
        assert!(error_string.contains("image loading"));
        assert!(error_string.contains("photo.png"));
    }
}
