use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::LiveConfig;
use crate::error::{Result, SessionError, VisionError};
use crate::live::session::{FrameSession, SessionStats, TickOutcome};

/// Sink failures in a row after which the driver gives up on the session
pub const MAX_CONSECUTIVE_SINK_FAILURES: u32 = 10;

/// Drives a [`FrameSession`] from a tokio timer, standing in for a display
/// refresh callback
///
/// Each tick runs to completion before the next one is awaited. Late ticks are
/// skipped rather than bunched up.
#[derive(Debug, Clone)]
pub struct SessionDriver {
    period: Duration,
    max_frames: Option<u64>,
}

impl SessionDriver {
    /// Create a driver ticking `fps` times per second
    pub fn new(fps: f64) -> Self {
        let fps = if fps.is_finite() && fps > 0.0 { fps } else { 30.0 };
        Self {
            period: Duration::from_secs_f64(1.0 / fps),
            max_frames: None,
        }
    }

    pub fn from_config(config: &LiveConfig) -> Self {
        let mut driver = Self::new(config.fps);
        driver.max_frames = config.max_frames;
        driver
    }

    /// Stop the session once this many frames have been rendered
    pub fn with_max_frames(mut self, max_frames: u64) -> Self {
        self.max_frames = Some(max_frames);
        self
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Tick until the session stops, the source ends or the frame cap is hit
    ///
    /// A frame the sink fails to present is dropped and the session keeps
    /// running. Any error that ends the run stops the session first, so the
    /// source is always released when this returns.
    pub async fn run(&self, session: &mut FrameSession) -> Result<SessionStats> {
        info!(
            "Driving live session at {:.1} fps ({} model)",
            1.0 / self.period.as_secs_f64(),
            session.model()
        );

        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut sink_failures = 0u32;

        loop {
            ticker.tick().await;

            let outcome = match session.tick() {
                Ok(outcome) => outcome,
                Err(VisionError::Session(SessionError::SinkFailed { reason }))
                    if sink_failures + 1 < MAX_CONSECUTIVE_SINK_FAILURES =>
                {
                    sink_failures += 1;
                    warn!("Dropped frame, display sink failed: {}", reason);
                    continue;
                }
                Err(e) => {
                    session.stop();
                    return Err(e);
                }
            };

            if outcome == TickOutcome::Rendered {
                sink_failures = 0;
            }

            match outcome {
                TickOutcome::Rendered => {
                    let rendered = session.stats().frames_rendered;
                    if self.max_frames.is_some_and(|max| rendered >= max) {
                        debug!("Frame cap of {} reached", rendered);
                        session.stop();
                        break;
                    }
                }
                TickOutcome::Idle => {}
                TickOutcome::Stopped | TickOutcome::SourceEnded | TickOutcome::Inactive => break,
            }
        }

        let stats = session.stats().clone();
        info!(
            "Live session finished: {} frames over {} ticks ({} idle)",
            stats.frames_rendered, stats.ticks, stats.idle_ticks
        );
        Ok(stats)
    }
}
