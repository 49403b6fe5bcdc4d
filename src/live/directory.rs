use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::buffer::PixelBuffer;
use crate::error::{Result, VisionError};
use crate::live::source::{FrameSource, FrameStatus, SourceId, SourceProvider};
use crate::still;

/// Serves a directory of still images as a live source, one frame per read
///
/// Frames are ordered by file name. A file that fails to decode is skipped
/// and that read reports `NotReady`.
pub struct ImageSequenceSource {
    id: SourceId,
    frames: Vec<PathBuf>,
    position: usize,
    loop_frames: bool,
    released: bool,
}

impl ImageSequenceSource {
    pub fn open<P: AsRef<Path>>(directory: P, loop_frames: bool) -> Result<Self> {
        let directory = directory.as_ref();

        if !directory.is_dir() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} is not a directory", directory.display()),
            )
            .into());
        }

        let mut frames = Vec::new();
        for entry in std::fs::read_dir(directory)? {
            let path = entry?.path();
            if path.is_file() && !is_hidden_file(&path) && is_supported(&path) {
                frames.push(path);
            }
        }

        if frames.is_empty() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no supported image files in {}", directory.display()),
            )
            .into());
        }

        frames.sort();
        info!("Opened frame directory {:?} with {} frames", directory, frames.len());

        Ok(Self {
            id: SourceId::new(directory.display().to_string()),
            frames,
            position: 0,
            loop_frames,
            released: false,
        })
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl FrameSource for ImageSequenceSource {
    fn id(&self) -> &SourceId {
        &self.id
    }

    fn read_frame(&mut self, target: &mut PixelBuffer) -> FrameStatus {
        if self.released {
            return FrameStatus::Ended;
        }

        if self.position >= self.frames.len() {
            if !self.loop_frames {
                return FrameStatus::Ended;
            }
            debug!("Looping frame directory {}", self.id);
            self.position = 0;
        }

        let path = &self.frames[self.position];
        self.position += 1;

        let decoded = std::fs::read(path)
            .map_err(VisionError::from)
            .and_then(|bytes| still::decode(&bytes));

        match decoded {
            Ok(frame) => {
                target.copy_from(&frame);
                FrameStatus::Ready
            }
            Err(e) => {
                warn!("Skipping unreadable frame {:?}: {}", path, e);
                FrameStatus::NotReady
            }
        }
    }

    fn release(&mut self) {
        self.released = true;
        self.frames.clear();
    }
}

/// Acquires [`ImageSequenceSource`]s, treating the source id as a directory path
#[derive(Debug, Clone, Default)]
pub struct DirectoryProvider {
    loop_frames: bool,
}

impl DirectoryProvider {
    pub fn new(loop_frames: bool) -> Self {
        Self { loop_frames }
    }
}

impl SourceProvider for DirectoryProvider {
    fn acquire(&mut self, id: &SourceId) -> Result<Box<dyn FrameSource>> {
        Ok(Box::new(ImageSequenceSource::open(id.as_str(), self.loop_frames)?))
    }
}

fn is_hidden_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

fn is_supported(path: &Path) -> bool {
    matches!(
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref(),
        Some("png") | Some("jpg") | Some("jpeg") | Some("bmp")
    )
}
