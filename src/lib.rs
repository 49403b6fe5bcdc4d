//! # Dog-Vision
//!
//! See photos and live video the way a dog does.
//!
//! This library remaps the color channels of RGBA pixel buffers to simulate
//! dichromatic vision, either once for a still image or continuously for a
//! live stream of frames.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dog_vision::{ColorModel, StillImageProcessor};
//! use dog_vision::still::OutputFormat;
//!
//! # fn main() -> dog_vision::Result<()> {
//! let processor = StillImageProcessor::with_model(ColorModel::Canine);
//! let processed = processor.process_file("park.jpg")?;
//! std::fs::write("park_dog.png", processed.encode_transformed(OutputFormat::Png)?)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! The library is organized into several key modules:
//!
//! - [`buffer`] - RGBA pixel buffers
//! - [`color`] - Color models and the per-pixel transform
//! - [`still`] - One-shot processing of encoded images
//! - [`live`] - Frame sessions driven tick by tick from a live source
//! - [`config`] - Configuration management
//!
//! ## Plugging In A Camera
//!
//! Live sources only have to implement [`FrameSource`](live::FrameSource):
//!
//! ```rust,no_run
//! use dog_vision::buffer::PixelBuffer;
//! use dog_vision::live::{FrameSource, FrameStatus, SourceId};
//!
//! struct MyCamera {
//!     id: SourceId,
//! }
//!
//! impl FrameSource for MyCamera {
//!     fn id(&self) -> &SourceId {
//!         &self.id
//!     }
//!
//!     fn read_frame(&mut self, target: &mut PixelBuffer) -> FrameStatus {
//!         // Copy the device's latest RGBA frame into `target`
//!         FrameStatus::NotReady
//!     }
//!
//!     fn release(&mut self) {
//!         // Close the device
//!     }
//! }
//! ```

pub mod buffer;
pub mod color;
pub mod config;
pub mod error;
pub mod live;
pub mod still;

// Re-export commonly used types for convenience
pub use crate::{
    buffer::PixelBuffer,
    color::{transform, ColorModel, Transformer},
    config::Config,
    error::{Result, VisionError},
    live::{FrameSession, SessionDriver},
    still::{ProcessedImage, StillImageProcessor},
};
