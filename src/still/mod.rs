//! # Still Image Processing
//!
//! Decodes an uploaded image, applies one color model and returns the
//! before/after pair. Encoding back to bytes is available for display layers
//! that want a compressed image rather than raw pixels.

pub mod processor;

use std::fmt;
use std::path::Path;

use crate::error::CodecError;

pub use processor::{decode, encode, ProcessedImage, StillImageProcessor};

/// Compressed formats a processed buffer can be written as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Png,
    Jpeg { quality: u8 },
    Bmp,
}

impl OutputFormat {
    /// Usual file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg { .. } => "jpg",
            OutputFormat::Bmp => "bmp",
        }
    }

    /// Pick a format from a file extension
    pub fn from_path<P: AsRef<Path>>(path: P, jpeg_quality: u8) -> Result<Self, CodecError> {
        let extension = path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "png" => Ok(OutputFormat::Png),
            "jpg" | "jpeg" => Ok(OutputFormat::Jpeg { quality: jpeg_quality }),
            "bmp" => Ok(OutputFormat::Bmp),
            other => Err(CodecError::UnsupportedFormat {
                format: other.to_string(),
            }),
        }
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        OutputFormat::Png
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Png => f.write_str("png"),
            OutputFormat::Jpeg { quality } => write!(f, "jpeg (quality {})", quality),
            OutputFormat::Bmp => f.write_str("bmp"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_path() {
        assert_eq!(OutputFormat::from_path("out.PNG", 90).unwrap(), OutputFormat::Png);
        assert_eq!(
            OutputFormat::from_path("photo.jpeg", 70).unwrap(),
            OutputFormat::Jpeg { quality: 70 }
        );
        assert!(matches!(
            OutputFormat::from_path("clip.gif", 90),
            Err(CodecError::UnsupportedFormat { .. })
        ));
        assert!(OutputFormat::from_path("no_extension", 90).is_err());
    }
}
