use std::fmt;

use crate::buffer::PixelBuffer;
use crate::error::Result;

/// Names a frame source: a camera device id, a directory path, ...
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceId(String);

impl SourceId {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SourceId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for SourceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Result of asking a source for its current frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    /// A new frame was copied into the target buffer.
    Ready,
    /// Nothing new yet; the target buffer is untouched.
    NotReady,
    /// The source will never produce another frame.
    Ended,
}

/// A live frame source handle
///
/// Device selection and permissions happen before a handle exists; the
/// session only reads frames and releases the handle.
pub trait FrameSource: Send {
    /// Identifier this source was acquired with
    fn id(&self) -> &SourceId;

    /// Copy the current frame into `target` if a new one is available
    ///
    /// Implementations reshape `target` when the frame size changed.
    fn read_frame(&mut self, target: &mut PixelBuffer) -> FrameStatus;

    /// Release the underlying device; called exactly once by the session
    fn release(&mut self);
}

/// Acquires frame sources by id
pub trait SourceProvider: Send {
    fn acquire(&mut self, id: &SourceId) -> Result<Box<dyn FrameSource>>;
}

/// Receives transformed frames for presentation
pub trait DisplaySink: Send {
    /// Show a transformed frame
    fn present(&mut self, frame: &PixelBuffer) -> Result<()>;

    /// Drop whatever is currently shown; called when the session stops
    fn clear(&mut self) {}
}
