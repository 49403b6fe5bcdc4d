use thiserror::Error;

/// Main error type for the dog-vision library
#[derive(Error, Debug)]
pub enum VisionError {
    #[error("Transform error: {0}")]
    Transform(#[from] TransformError),

    #[error("Image codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Live session error: {0}")]
    Session(#[from] SessionError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the color transform
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransformError {
    #[error("Invalid buffer shape: {width}x{height} RGBA needs {expected} bytes, got {actual}")]
    InvalidBufferShape {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

/// Errors raised while decoding or encoding still images
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Image decoding failed: {reason}")]
    DecodeFailed { reason: String },

    #[error("Image encoding failed ({format}): {reason}")]
    EncodeFailed { format: String, reason: String },

    #[error("Unsupported image format: {format}")]
    UnsupportedFormat { format: String },
}

/// Live session lifecycle errors
///
/// A frame that is not ready yet is never reported here; see
/// [`FrameStatus::NotReady`](crate::live::FrameStatus::NotReady).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Frame source unavailable: {source_id} - {reason}")]
    SourceUnavailable { source_id: String, reason: String },

    #[error("Switching to frame source failed: {source_id} - {reason}")]
    SourceSwitchFailed { source_id: String, reason: String },

    #[error("Cannot {operation} while session is {state}")]
    InvalidState { operation: String, state: String },

    #[error("Display sink rejected frame: {reason}")]
    SinkFailed { reason: String },
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration file: {path}")]
    ParseFailed { path: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },
}

/// Convenience type alias for Results using VisionError
pub type Result<T> = std::result::Result<T, VisionError>;

impl VisionError {
    /// Check if this error is recoverable (can be retried)
    pub fn is_recoverable(&self) -> bool {
        match self {
            // IO errors might be temporary
            Self::Io(_) => true,
            // The device may come back, or a different one may be picked
            Self::Session(SessionError::SourceUnavailable { .. }) => true,
            Self::Session(SessionError::SinkFailed { .. }) => true,
            // Transforms are deterministic and bad bytes stay bad
            _ => false,
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Codec(CodecError::DecodeFailed { .. }) => {
                "Could not load the image file. Please check it is a valid PNG, JPEG or BMP image.".to_string()
            }
            Self::Session(SessionError::SourceUnavailable { source_id, .. }) => {
                format!("Could not open frame source '{}'. Please check it exists and is accessible.", source_id)
            }
            Self::Session(SessionError::SourceSwitchFailed { source_id, .. }) => {
                format!("Could not switch to frame source '{}'. The live view has been stopped.", source_id)
            }
            Self::Config(ConfigError::FileNotFound { path }) => {
                format!("Configuration file '{}' not found.", path)
            }
            _ => self.to_string(),
        }
    }
}
