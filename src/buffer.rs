use image::{ImageBuffer, Rgba, RgbaImage};

use crate::error::TransformError;

/// Number of interleaved channels per pixel (R, G, B, A)
pub const CHANNELS: usize = 4;

/// An RGBA8 pixel buffer, row-major, top-to-bottom
///
/// This is a thin wrapper around an [`RgbaImage`] that guarantees positive
/// dimensions and a byte length of exactly `width * height * 4`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    buffer: RgbaImage,
}

impl PixelBuffer {
    /// Create a new transparent-black buffer with the given dimensions
    ///
    /// Zero-sized dimensions are bumped to 1 so the buffer stays non-empty.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            buffer: ImageBuffer::new(width.max(1), height.max(1)),
        }
    }

    /// Create a new buffer filled with the given RGBA color
    ///
    /// Like [`PixelBuffer::new`], zero-sized dimensions are bumped to 1. Use
    /// [`PixelBuffer::from_raw`] when the shape must be checked instead.
    pub fn new_filled(width: u32, height: u32, color: [u8; 4]) -> Self {
        Self {
            buffer: ImageBuffer::from_pixel(width.max(1), height.max(1), Rgba(color)),
        }
    }

    /// Create a buffer from raw interleaved RGBA bytes
    ///
    /// Fails with [`TransformError::InvalidBufferShape`] unless both dimensions
    /// are positive and `data.len() == width * height * 4`.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Self, TransformError> {
        check_shape(width, height, data.len())?;
        let actual = data.len();
        ImageBuffer::from_raw(width, height, data)
            .map(|buffer| Self { buffer })
            .ok_or(TransformError::InvalidBufferShape {
                width,
                height,
                expected: expected_len(width, height),
                actual,
            })
    }

    /// Get the width of the buffer
    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    /// Get the height of the buffer
    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    /// Get `(width, height)`
    pub fn dimensions(&self) -> (u32, u32) {
        self.buffer.dimensions()
    }

    /// Get a pixel at the given coordinates
    pub fn get_pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.buffer.get_pixel(x, y).0
    }

    /// Set a pixel at the given coordinates
    pub fn set_pixel(&mut self, x: u32, y: u32, color: [u8; 4]) {
        self.buffer.put_pixel(x, y, Rgba(color));
    }

    /// Raw interleaved bytes
    pub fn as_bytes(&self) -> &[u8] {
        self.buffer.as_raw()
    }

    /// Mutable raw interleaved bytes; the length cannot change through this view
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.buffer
    }

    /// Resize to new dimensions, discarding contents if they change
    ///
    /// Returns `true` when the backing storage was reallocated.
    pub fn reshape(&mut self, width: u32, height: u32) -> bool {
        let (width, height) = (width.max(1), height.max(1));
        if self.dimensions() == (width, height) {
            return false;
        }
        self.buffer = ImageBuffer::new(width, height);
        true
    }

    /// Copy a raw RGBA frame into this buffer, reshaping if needed
    pub fn copy_from_raw(&mut self, width: u32, height: u32, data: &[u8]) -> Result<(), TransformError> {
        check_shape(width, height, data.len())?;
        self.reshape(width, height);
        self.as_bytes_mut().copy_from_slice(data);
        Ok(())
    }

    /// Copy another buffer into this one, reshaping if needed
    pub fn copy_from(&mut self, other: &PixelBuffer) {
        self.reshape(other.width(), other.height());
        self.as_bytes_mut().copy_from_slice(other.as_bytes());
    }

    /// Get the underlying image buffer
    pub fn as_image(&self) -> &RgbaImage {
        &self.buffer
    }

    /// Consume the buffer and return the raw bytes
    pub fn into_raw(self) -> Vec<u8> {
        self.buffer.into_raw()
    }
}

/// Wraps an existing image without copying
///
/// An image with a zero dimension is rejected rather than resized.
impl TryFrom<RgbaImage> for PixelBuffer {
    type Error = TransformError;

    fn try_from(buffer: RgbaImage) -> Result<Self, Self::Error> {
        let (width, height) = buffer.dimensions();
        check_shape(width, height, buffer.as_raw().len())?;
        Ok(Self { buffer })
    }
}

impl From<PixelBuffer> for RgbaImage {
    fn from(buffer: PixelBuffer) -> Self {
        buffer.buffer
    }
}

/// Byte length a `width` x `height` RGBA buffer must have
pub fn expected_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * CHANNELS
}

/// Validate a declared shape against an actual byte length
pub fn check_shape(width: u32, height: u32, actual: usize) -> Result<(), TransformError> {
    let expected = expected_len(width, height);
    if width == 0 || height == 0 || actual != expected {
        return Err(TransformError::InvalidBufferShape {
            width,
            height,
            expected,
            actual,
        });
    }
    Ok(())
}
