use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, trace};

use crate::buffer::PixelBuffer;
use crate::color::{ColorModel, Transformer};
use crate::error::{Result, SessionError};
use crate::live::source::{DisplaySink, FrameSource, FrameStatus, SourceId, SourceProvider};

/// Lifecycle of a [`FrameSession`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    /// Source acquired, waiting for its first frame.
    Initializing,
    Active,
    /// New source acquired after a switch, waiting for its first frame.
    Switching,
    Stopped,
}

impl SessionState {
    /// Whether ticks still poll the source in this state
    pub fn is_running(&self) -> bool {
        matches!(
            self,
            SessionState::Initializing | SessionState::Active | SessionState::Switching
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Initializing => "initializing",
            SessionState::Active => "active",
            SessionState::Switching => "switching",
            SessionState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// What a single tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A frame was transformed and handed to the sink.
    Rendered,
    /// The source had nothing new; nothing was transformed.
    Idle,
    /// A cancellation request was honored on this tick.
    Stopped,
    /// The source ended and the session stopped.
    SourceEnded,
    /// The session is idle or already stopped.
    Inactive,
}

/// Cooperative stop request shared with other tasks or threads
///
/// Setting the flag never interrupts a transform in progress; the session
/// observes it at the top of its next tick.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    cancelled: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Counters kept over the life of a session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Ticks handled while the session was running
    pub ticks: u64,
    pub frames_rendered: u64,
    /// Ticks where the source had no new frame
    pub idle_ticks: u64,
    pub source_switches: u64,
}

/// Continuous transform of a live frame source
///
/// The session owns its source handle, a working buffer the source copies
/// frames into, and the output buffer handed to the sink. Both buffers are
/// reused across ticks and only reallocated when the frame size changes.
///
/// Ticks are driven from outside (a display refresh callback, a timer task,
/// ...). `tick` takes `&mut self`, so two transforms for the same session can
/// never overlap.
pub struct FrameSession {
    provider: Box<dyn SourceProvider>,
    sink: Box<dyn DisplaySink>,
    transformer: Transformer,
    state: SessionState,
    source: Option<Box<dyn FrameSource>>,
    working: Option<PixelBuffer>,
    output: Option<PixelBuffer>,
    cancel: CancelHandle,
    stats: SessionStats,
}

impl FrameSession {
    /// Create an idle session using the default (canine) model
    pub fn new(provider: Box<dyn SourceProvider>, sink: Box<dyn DisplaySink>) -> Self {
        Self::with_transformer(provider, sink, Transformer::default())
    }

    pub fn with_transformer(
        provider: Box<dyn SourceProvider>,
        sink: Box<dyn DisplaySink>,
        transformer: Transformer,
    ) -> Self {
        Self {
            provider,
            sink,
            transformer,
            state: SessionState::Idle,
            source: None,
            working: None,
            output: None,
            cancel: CancelHandle::new(),
            stats: SessionStats::default(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn model(&self) -> ColorModel {
        self.transformer.model()
    }

    /// Change the model used from the next rendered frame on
    pub fn set_model(&mut self, model: ColorModel) {
        self.transformer.set_model(model);
    }

    /// Id of the source currently held, if any
    pub fn source_id(&self) -> Option<&SourceId> {
        self.source.as_ref().map(|source| source.id())
    }

    /// Handle that requests a stop at the next tick
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Acquire `id` and begin waiting for its first frame
    pub fn start(&mut self, id: SourceId) -> Result<()> {
        if self.state != SessionState::Idle {
            return Err(self.invalid_state("start"));
        }

        self.state = SessionState::Initializing;
        debug!("Live session initializing with source '{}'", id);

        match self.provider.acquire(&id) {
            Ok(source) => {
                self.source = Some(source);
                self.working = Some(PixelBuffer::new(1, 1));
                Ok(())
            }
            Err(e) => {
                self.stop();
                Err(SessionError::SourceUnavailable {
                    source_id: id.to_string(),
                    reason: e.to_string(),
                }
                .into())
            }
        }
    }

    /// Replace the current source with `id`
    ///
    /// The previous source is released before the new one is acquired. If the
    /// new one cannot be acquired the session stops, since no source is left.
    pub fn switch_source(&mut self, id: SourceId) -> Result<()> {
        if !self.state.is_running() {
            return Err(self.invalid_state("switch source"));
        }

        self.state = SessionState::Switching;
        if let Some(mut previous) = self.source.take() {
            debug!("Releasing source '{}' for switch to '{}'", previous.id(), id);
            previous.release();
        }

        match self.provider.acquire(&id) {
            Ok(source) => {
                self.source = Some(source);
                self.stats.source_switches += 1;
                Ok(())
            }
            Err(e) => {
                self.stop();
                Err(SessionError::SourceSwitchFailed {
                    source_id: id.to_string(),
                    reason: e.to_string(),
                }
                .into())
            }
        }
    }

    /// Handle one scheduling tick
    ///
    /// At most one frame is transformed. A source with no new frame makes this
    /// a no-op; that is never an error.
    pub fn tick(&mut self) -> Result<TickOutcome> {
        if !self.state.is_running() {
            return Ok(TickOutcome::Inactive);
        }

        if self.cancel.is_cancelled() {
            debug!("Cancellation observed, stopping live session");
            self.stop();
            return Ok(TickOutcome::Stopped);
        }

        self.stats.ticks += 1;

        let status = match (self.source.as_mut(), self.working.as_mut()) {
            (Some(source), Some(working)) => source.read_frame(working),
            _ => FrameStatus::Ended,
        };

        match status {
            FrameStatus::NotReady => {
                self.stats.idle_ticks += 1;
                trace!("No frame ready on tick {}", self.stats.ticks);
                Ok(TickOutcome::Idle)
            }
            FrameStatus::Ended => {
                debug!("Frame source ended after {} frames", self.stats.frames_rendered);
                self.stop();
                Ok(TickOutcome::SourceEnded)
            }
            FrameStatus::Ready => {
                if self.state != SessionState::Active {
                    debug!("Live session {} -> active", self.state);
                    self.state = SessionState::Active;
                }
                self.render()?;
                Ok(TickOutcome::Rendered)
            }
        }
    }

    fn render(&mut self) -> Result<()> {
        let Some(working) = self.working.as_ref() else {
            return Ok(());
        };
        let output = self.output.get_or_insert_with(|| PixelBuffer::new(1, 1));

        self.transformer.apply_into(working, output)?;
        self.sink
            .present(output)
            .map_err(|e| SessionError::SinkFailed { reason: e.to_string() })?;

        self.stats.frames_rendered += 1;
        trace!(
            "Rendered frame {} ({}x{})",
            self.stats.frames_rendered,
            output.width(),
            output.height()
        );
        Ok(())
    }

    /// Stop the session, releasing the source and clearing the buffers
    ///
    /// Calling this on a stopped session does nothing.
    pub fn stop(&mut self) {
        if self.state == SessionState::Stopped {
            return;
        }

        self.cancel.cancel();
        if let Some(mut source) = self.source.take() {
            debug!("Releasing frame source '{}'", source.id());
            source.release();
        }
        self.working = None;
        self.output = None;
        self.sink.clear();

        debug!(
            "Live session stopped from {} after {} ticks, {} frames",
            self.state, self.stats.ticks, self.stats.frames_rendered
        );
        self.state = SessionState::Stopped;
    }

    fn invalid_state(&self, operation: &str) -> crate::error::VisionError {
        SessionError::InvalidState {
            operation: operation.to_string(),
            state: self.state.to_string(),
        }
        .into()
    }
}

impl Drop for FrameSession {
    fn drop(&mut self) {
        self.stop();
    }
}

impl fmt::Debug for FrameSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameSession")
            .field("state", &self.state)
            .field("model", &self.model())
            .field("source", &self.source_id())
            .field("stats", &self.stats)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, VecDeque};
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    use crate::color::transform;
    use crate::error::VisionError;

    /// Scripted frame source: each tick pops the next step
    struct ScriptedSource {
        id: SourceId,
        steps: VecDeque<Option<PixelBuffer>>,
        releases: Arc<AtomicUsize>,
    }

    impl FrameSource for ScriptedSource {
        fn id(&self) -> &SourceId {
            &self.id
        }

        fn read_frame(&mut self, target: &mut PixelBuffer) -> FrameStatus {
            match self.steps.pop_front() {
                Some(Some(frame)) => {
                    target.copy_from(&frame);
                    FrameStatus::Ready
                }
                Some(None) => FrameStatus::NotReady,
                None => FrameStatus::Ended,
            }
        }

        fn release(&mut self) {
            self.releases.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[derive(Default)]
    struct ScriptedProvider {
        scripts: HashMap<String, Vec<Option<PixelBuffer>>>,
        releases: Arc<AtomicUsize>,
    }

    impl ScriptedProvider {
        fn with(mut self, id: &str, steps: Vec<Option<PixelBuffer>>) -> Self {
            self.scripts.insert(id.to_string(), steps);
            self
        }
    }

    impl SourceProvider for ScriptedProvider {
        fn acquire(&mut self, id: &SourceId) -> Result<Box<dyn FrameSource>> {
            let steps = self.scripts.remove(id.as_str()).ok_or_else(|| {
                VisionError::from(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("no device {}", id),
                ))
            })?;
            Ok(Box::new(ScriptedSource {
                id: id.clone(),
                steps: steps.into(),
                releases: self.releases.clone(),
            }))
        }
    }

    #[derive(Clone, Default)]
    struct RecordingSink {
        frames: Arc<Mutex<Vec<PixelBuffer>>>,
        clears: Arc<AtomicUsize>,
    }

    impl DisplaySink for RecordingSink {
        fn present(&mut self, frame: &PixelBuffer) -> Result<()> {
            self.frames.lock().unwrap().push(frame.clone());
            Ok(())
        }

        fn clear(&mut self) {
            self.clears.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn red(width: u32, height: u32) -> PixelBuffer {
        PixelBuffer::new_filled(width, height, [255, 0, 0, 255])
    }

    fn session_with(provider: ScriptedProvider) -> (FrameSession, RecordingSink, Arc<AtomicUsize>) {
        let sink = RecordingSink::default();
        let releases = provider.releases.clone();
        let session = FrameSession::new(Box::new(provider), Box::new(sink.clone()));
        (session, sink, releases)
    }

    #[test]
    fn test_start_waits_for_first_frame() {
        let provider = ScriptedProvider::default().with("cam", vec![None, Some(red(2, 2))]);
        let (mut session, sink, _) = session_with(provider);

        assert_eq!(session.state(), SessionState::Idle);
        session.start("cam".into()).unwrap();
        assert_eq!(session.state(), SessionState::Initializing);

        assert_eq!(session.tick().unwrap(), TickOutcome::Idle);
        assert_eq!(session.state(), SessionState::Initializing);

        assert_eq!(session.tick().unwrap(), TickOutcome::Rendered);
        assert_eq!(session.state(), SessionState::Active);

        let frames = sink.frames.lock().unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0], transform(&red(2, 2), ColorModel::Canine).unwrap());
    }

    #[test]
    fn test_ten_idle_ticks_keep_session_active() {
        let mut steps = vec![Some(red(1, 1))];
        steps.extend(std::iter::repeat(None).take(10));
        let provider = ScriptedProvider::default().with("cam", steps);
        let (mut session, sink, _) = session_with(provider);

        session.start("cam".into()).unwrap();
        assert_eq!(session.tick().unwrap(), TickOutcome::Rendered);

        for _ in 0..10 {
            assert_eq!(session.tick().unwrap(), TickOutcome::Idle);
            assert_eq!(session.state(), SessionState::Active);
        }

        assert_eq!(sink.frames.lock().unwrap().len(), 1);
        assert_eq!(session.stats().frames_rendered, 1);
        assert_eq!(session.stats().idle_ticks, 10);
    }

    #[test]
    fn test_stop_twice_releases_once() {
        let provider = ScriptedProvider::default().with("cam", vec![Some(red(1, 1))]);
        let (mut session, sink, releases) = session_with(provider);

        session.start("cam".into()).unwrap();
        session.tick().unwrap();

        session.stop();
        session.stop();

        assert_eq!(session.state(), SessionState::Stopped);
        assert_eq!(releases.load(Ordering::SeqCst), 1);
        assert_eq!(sink.clears.load(Ordering::SeqCst), 1);
        assert_eq!(session.tick().unwrap(), TickOutcome::Inactive);
    }

    #[test]
    fn test_drop_releases_source() {
        let provider = ScriptedProvider::default().with("cam", vec![None]);
        let (mut session, _, releases) = session_with(provider);
        session.start("cam".into()).unwrap();

        drop(session);
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cancel_handle_stops_at_next_tick() {
        let provider = ScriptedProvider::default().with("cam", vec![Some(red(1, 1)), Some(red(1, 1))]);
        let (mut session, sink, releases) = session_with(provider);
        session.start("cam".into()).unwrap();
        session.tick().unwrap();

        let handle = session.cancel_handle();
        std::thread::spawn(move || handle.cancel()).join().unwrap();
        assert_eq!(session.state(), SessionState::Active);

        assert_eq!(session.tick().unwrap(), TickOutcome::Stopped);
        assert_eq!(session.state(), SessionState::Stopped);
        assert_eq!(sink.frames.lock().unwrap().len(), 1);
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unavailable_source_stops_session() {
        let (mut session, _, _) = session_with(ScriptedProvider::default());

        let err = session.start("missing".into()).unwrap_err();
        assert!(matches!(
            err,
            VisionError::Session(SessionError::SourceUnavailable { ref source_id, .. }) if source_id == "missing"
        ));
        assert_eq!(session.state(), SessionState::Stopped);
    }

    #[test]
    fn test_start_twice_is_rejected() {
        let provider = ScriptedProvider::default().with("cam", vec![]);
        let (mut session, _, _) = session_with(provider);
        session.start("cam".into()).unwrap();

        let err = session.start("cam".into()).unwrap_err();
        assert!(matches!(err, VisionError::Session(SessionError::InvalidState { .. })));
    }

    #[test]
    fn test_source_end_stops_session() {
        let provider = ScriptedProvider::default().with("clip", vec![Some(red(1, 1))]);
        let (mut session, _, releases) = session_with(provider);
        session.start("clip".into()).unwrap();

        assert_eq!(session.tick().unwrap(), TickOutcome::Rendered);
        assert_eq!(session.tick().unwrap(), TickOutcome::SourceEnded);
        assert_eq!(session.state(), SessionState::Stopped);
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_switch_source_resumes_on_new_frames() {
        let provider = ScriptedProvider::default()
            .with("front", vec![Some(red(2, 2)), Some(red(2, 2))])
            .with("back", vec![None, Some(red(4, 3))]);
        let (mut session, sink, releases) = session_with(provider);

        session.start("front".into()).unwrap();
        session.tick().unwrap();

        session.switch_source("back".into()).unwrap();
        assert_eq!(session.state(), SessionState::Switching);
        assert_eq!(releases.load(Ordering::SeqCst), 1);
        assert_eq!(session.source_id().map(SourceId::as_str), Some("back"));

        assert_eq!(session.tick().unwrap(), TickOutcome::Idle);
        assert_eq!(session.state(), SessionState::Switching);
        assert_eq!(session.tick().unwrap(), TickOutcome::Rendered);
        assert_eq!(session.state(), SessionState::Active);

        // Working buffer followed the new source's frame size
        assert_eq!(sink.frames.lock().unwrap().last().unwrap().dimensions(), (4, 3));
        assert_eq!(session.stats().source_switches, 1);
    }

    #[test]
    fn test_failed_switch_stops_session() {
        let provider = ScriptedProvider::default().with("front", vec![Some(red(1, 1))]);
        let (mut session, _, releases) = session_with(provider);
        session.start("front".into()).unwrap();
        session.tick().unwrap();

        let err = session.switch_source("back".into()).unwrap_err();
        assert!(matches!(err, VisionError::Session(SessionError::SourceSwitchFailed { .. })));
        assert_eq!(session.state(), SessionState::Stopped);
        assert_eq!(releases.load(Ordering::SeqCst), 1);

        let err = session.switch_source("front".into()).unwrap_err();
        assert!(matches!(err, VisionError::Session(SessionError::InvalidState { .. })));
    }

    #[test]
    fn test_model_change_applies_to_next_frame() {
        let provider = ScriptedProvider::default().with("cam", vec![Some(red(1, 1)), Some(red(1, 1))]);
        let (mut session, sink, _) = session_with(provider);
        session.start("cam".into()).unwrap();

        session.tick().unwrap();
        session.set_model(ColorModel::Dichromatic);
        session.tick().unwrap();

        let frames = sink.frames.lock().unwrap();
        assert_eq!(frames[0].as_bytes(), &[188, 169, 74, 255]);
        assert_eq!(frames[1].as_bytes(), &[92, 71, 0, 255]);
    }
}
