//! # Live Frame Processing
//!
//! Continuous transform of a live frame source. A [`FrameSession`] owns the
//! source handle and its working buffers and runs one transform per tick;
//! something outside the session decides when ticks happen.
//!
//! ## Lifecycle
//!
//! ```text
//! Idle -> Initializing -> Active <-> Switching
//!              \             |          /
//!               `-------> Stopped <----'
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use dog_vision::live::{DirectoryProvider, FrameSession, LatestFrameSink, SessionDriver};
//!
//! # #[tokio::main]
//! # async fn main() -> dog_vision::Result<()> {
//! let display = LatestFrameSink::new();
//! let mut session = FrameSession::new(
//!     Box::new(DirectoryProvider::new(false)),
//!     Box::new(display.clone()),
//! );
//! session.start("frames/".into())?;
//! SessionDriver::new(30.0).run(&mut session).await?;
//! # Ok(())
//! # }
//! ```

pub mod directory;
pub mod driver;
pub mod session;
pub mod sink;
pub mod source;

pub use directory::{DirectoryProvider, ImageSequenceSource};
pub use driver::SessionDriver;
pub use session::{CancelHandle, FrameSession, SessionState, SessionStats, TickOutcome};
pub use sink::LatestFrameSink;
pub use source::{DisplaySink, FrameSource, FrameStatus, SourceId, SourceProvider};
