use rayon::prelude::*;

use crate::buffer::{check_shape, PixelBuffer, CHANNELS};
use crate::color::ColorModel;
use crate::error::TransformError;

/// Pixel count at or above which the pixel loop runs on the rayon pool.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 16_384;

/// Applies a [`ColorModel`] to whole pixel buffers
///
/// Each pixel is mapped on its own, so the loop can run in any order or in
/// parallel without changing the result. Alpha bytes are copied unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transformer {
    model: ColorModel,
    parallel_threshold: usize,
}

impl Transformer {
    pub fn new(model: ColorModel) -> Self {
        Self {
            model,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }

    /// Set the pixel count at which work is split across threads
    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    pub fn model(&self) -> ColorModel {
        self.model
    }

    pub fn set_model(&mut self, model: ColorModel) {
        self.model = model;
    }

    /// Transform into a newly allocated buffer of identical dimensions
    pub fn apply(&self, input: &PixelBuffer) -> Result<PixelBuffer, TransformError> {
        let mut output = PixelBuffer::new(input.width(), input.height());
        self.apply_into(input, &mut output)?;
        Ok(output)
    }

    /// Transform into an existing buffer, reshaping it to match the input
    pub fn apply_into(&self, input: &PixelBuffer, output: &mut PixelBuffer) -> Result<(), TransformError> {
        check_shape(input.width(), input.height(), input.as_bytes().len())?;
        output.reshape(input.width(), input.height());
        self.map_bytes(input.as_bytes(), output.as_bytes_mut());
        Ok(())
    }

    /// Transform raw interleaved RGBA bytes with a declared shape
    pub fn apply_raw(&self, width: u32, height: u32, data: &[u8]) -> Result<Vec<u8>, TransformError> {
        check_shape(width, height, data.len())?;
        let mut output = vec![0u8; data.len()];
        self.map_bytes(data, &mut output);
        Ok(output)
    }

    fn map_bytes(&self, src: &[u8], dst: &mut [u8]) {
        let model = self.model;
        let map = |(out, px): (&mut [u8], &[u8])| {
            let [r, g, b] = model.simulate_pixel([px[0], px[1], px[2]]);
            out[0] = r;
            out[1] = g;
            out[2] = b;
            out[3] = px[3];
        };

        if src.len() / CHANNELS >= self.parallel_threshold {
            dst.par_chunks_exact_mut(CHANNELS)
                .zip(src.par_chunks_exact(CHANNELS))
                .for_each(map);
        } else {
            dst.chunks_exact_mut(CHANNELS)
                .zip(src.chunks_exact(CHANNELS))
                .for_each(map);
        }
    }
}

impl Default for Transformer {
    fn default() -> Self {
        Self::new(ColorModel::default())
    }
}

/// Transform a buffer with the given model, returning a new buffer
pub fn transform(input: &PixelBuffer, model: ColorModel) -> Result<PixelBuffer, TransformError> {
    Transformer::new(model).apply(input)
}

/// Transform a buffer into `output`, reusing its allocation when dimensions match
pub fn transform_into(
    input: &PixelBuffer,
    model: ColorModel,
    output: &mut PixelBuffer,
) -> Result<(), TransformError> {
    Transformer::new(model).apply_into(input, output)
}

/// Transform raw RGBA bytes, checking `data.len() == width * height * 4`
pub fn transform_raw(
    width: u32,
    height: u32,
    data: &[u8],
    model: ColorModel,
) -> Result<Vec<u8>, TransformError> {
    Transformer::new(model).apply_raw(width, height, data)
}
