use std::sync::{Arc, Mutex};

use crate::buffer::PixelBuffer;
use crate::error::Result;
use crate::live::source::DisplaySink;

/// Keeps the most recent transformed frame for a display loop to pick up
///
/// Cloning shares the same slot, so one clone can be handed to the session
/// while the renderer holds another.
#[derive(Debug, Clone, Default)]
pub struct LatestFrameSink {
    slot: Arc<Mutex<Slot>>,
}

#[derive(Debug, Default)]
struct Slot {
    frame: Option<PixelBuffer>,
    sequence: u64,
}

impl LatestFrameSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the latest frame, if one is showing
    pub fn latest(&self) -> Option<PixelBuffer> {
        self.lock().frame.clone()
    }

    /// Number of frames presented so far; changes whenever a new frame lands
    pub fn sequence(&self) -> u64 {
        self.lock().sequence
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Slot> {
        // A panicked renderer must not take the session down with it
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl DisplaySink for LatestFrameSink {
    fn present(&mut self, frame: &PixelBuffer) -> Result<()> {
        let mut slot = self.lock();
        match slot.frame.as_mut() {
            Some(existing) => existing.copy_from(frame),
            None => slot.frame = Some(frame.clone()),
        }
        slot.sequence += 1;
        Ok(())
    }

    fn clear(&mut self) {
        self.lock().frame = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_frame_is_shared_between_clones() {
        let reader = LatestFrameSink::new();
        let mut writer = reader.clone();
        assert!(reader.latest().is_none());

        writer.present(&PixelBuffer::new_filled(2, 2, [1, 2, 3, 4])).unwrap();
        writer.present(&PixelBuffer::new_filled(3, 1, [5, 6, 7, 8])).unwrap();

        let latest = reader.latest().unwrap();
        assert_eq!(latest.dimensions(), (3, 1));
        assert_eq!(latest.get_pixel(0, 0), [5, 6, 7, 8]);
        assert_eq!(reader.sequence(), 2);

        writer.clear();
        assert!(reader.latest().is_none());
        assert_eq!(reader.sequence(), 2);
    }
}
