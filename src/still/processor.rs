use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, ImageOutputFormat};
use tracing::{debug, info};

use crate::buffer::PixelBuffer;
use crate::color::{ColorModel, Transformer};
use crate::error::{CodecError, Result};
use crate::still::OutputFormat;

/// Before/after pair produced from one uploaded image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedImage {
    pub original: PixelBuffer,
    pub transformed: PixelBuffer,
    pub model: ColorModel,
}

impl ProcessedImage {
    pub fn encode_original(&self, format: OutputFormat) -> Result<Vec<u8>> {
        encode(&self.original, format)
    }

    pub fn encode_transformed(&self, format: OutputFormat) -> Result<Vec<u8>> {
        encode(&self.transformed, format)
    }

    /// Compose a split view: columns left of `split * width` come from the
    /// original, the rest from the transformed image
    pub fn comparison(&self, split: f32) -> PixelBuffer {
        let (width, height) = self.original.dimensions();
        let split_x = (split.clamp(0.0, 1.0) * width as f32).round() as u32;
        let row_bytes = width as usize * crate::buffer::CHANNELS;
        let cut = split_x as usize * crate::buffer::CHANNELS;

        let mut out = self.transformed.clone();
        let bytes = out.as_bytes_mut();
        for (dst, src) in bytes
            .chunks_exact_mut(row_bytes)
            .zip(self.original.as_bytes().chunks_exact(row_bytes))
            .take(height as usize)
        {
            dst[..cut].copy_from_slice(&src[..cut]);
        }
        out
    }
}

/// One-shot processor for uploaded still images
///
/// Decodes the bytes, runs a single transform and hands back both buffers so
/// the caller can show a before/after comparison.
#[derive(Debug, Clone, Default)]
pub struct StillImageProcessor {
    transformer: Transformer,
}

impl StillImageProcessor {
    /// Create a processor with the default (canine) model
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(model: ColorModel) -> Self {
        Self {
            transformer: Transformer::new(model),
        }
    }

    pub fn with_transformer(transformer: Transformer) -> Self {
        Self { transformer }
    }

    pub fn model(&self) -> ColorModel {
        self.transformer.model()
    }

    /// Decode `encoded` and transform it
    ///
    /// Callers are expected to have checked that the bytes claim to be an
    /// image; anything the decoder cannot read comes back as
    /// [`CodecError::DecodeFailed`].
    pub fn process(&self, encoded: &[u8]) -> Result<ProcessedImage> {
        let original = decode(encoded)?;
        debug!(
            "Decoded {}x{} image, applying {} model",
            original.width(),
            original.height(),
            self.model()
        );

        let transformed = self.transformer.apply(&original)?;

        Ok(ProcessedImage {
            original,
            transformed,
            model: self.model(),
        })
    }

    /// Read an image file from disk and process it
    pub fn process_file<P: AsRef<Path>>(&self, path: P) -> Result<ProcessedImage> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        info!("Processing {:?} ({} bytes)", path, bytes.len());
        self.process(&bytes)
    }
}

/// Decode compressed image bytes into an RGBA buffer
pub fn decode(encoded: &[u8]) -> Result<PixelBuffer> {
    if encoded.is_empty() {
        return Err(CodecError::DecodeFailed {
            reason: "no image data".to_string(),
        }
        .into());
    }

    let image = image::load_from_memory(encoded).map_err(|e| CodecError::DecodeFailed {
        reason: e.to_string(),
    })?;

    if image.width() == 0 || image.height() == 0 {
        return Err(CodecError::DecodeFailed {
            reason: "image has no pixels".to_string(),
        }
        .into());
    }

    Ok(PixelBuffer::try_from(image.to_rgba8())?)
}

/// Encode a buffer in the given format
pub fn encode(buffer: &PixelBuffer, format: OutputFormat) -> Result<Vec<u8>> {
    let rgba = DynamicImage::ImageRgba8(buffer.as_image().clone());
    let (image, output_format) = match format {
        OutputFormat::Png => (rgba, ImageOutputFormat::Png),
        OutputFormat::Bmp => (rgba, ImageOutputFormat::Bmp),
        // JPEG has no alpha channel
        OutputFormat::Jpeg { quality } => (
            DynamicImage::ImageRgb8(rgba.to_rgb8()),
            ImageOutputFormat::Jpeg(quality.clamp(1, 100)),
        ),
    };

    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), output_format)
        .map_err(|e| CodecError::EncodeFailed {
            format: format.to_string(),
            reason: e.to_string(),
        })?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VisionError;

    fn png_bytes(buffer: &PixelBuffer) -> Vec<u8> {
        encode(buffer, OutputFormat::Png).unwrap()
    }

    #[test]
    fn test_process_returns_original_and_transformed() {
        let mut source = PixelBuffer::new_filled(4, 3, [255, 0, 0, 200]);
        source.set_pixel(0, 0, [0, 0, 255, 10]);

        let processed = StillImageProcessor::new().process(&png_bytes(&source)).unwrap();

        assert_eq!(processed.model, ColorModel::Canine);
        assert_eq!(processed.original, source);
        assert_eq!(processed.transformed.dimensions(), (4, 3));
        assert_eq!(processed.transformed.get_pixel(1, 1), [188, 169, 74, 200]);
        assert_eq!(processed.transformed.get_pixel(0, 0)[3], 10);
    }

    #[test]
    fn test_model_can_be_selected() {
        let source = PixelBuffer::new_filled(1, 1, [255, 0, 0, 255]);
        let processed = StillImageProcessor::with_model(ColorModel::Dichromatic)
            .process(&png_bytes(&source))
            .unwrap();
        assert_eq!(processed.transformed.as_bytes(), &[92, 71, 0, 255]);
    }

    #[test]
    fn test_garbage_bytes_are_a_decode_error() {
        let err = StillImageProcessor::new()
            .process(b"definitely not an image")
            .unwrap_err();
        assert!(matches!(err, VisionError::Codec(CodecError::DecodeFailed { .. })));

        let err = StillImageProcessor::new().process(&[]).unwrap_err();
        assert!(matches!(err, VisionError::Codec(CodecError::DecodeFailed { .. })));
    }

    #[test]
    fn test_truncated_png_is_a_decode_error() {
        let bytes = png_bytes(&PixelBuffer::new_filled(8, 8, [1, 2, 3, 4]));
        let err = StillImageProcessor::new().process(&bytes[..bytes.len() / 2]).unwrap_err();
        assert!(matches!(err, VisionError::Codec(CodecError::DecodeFailed { .. })));
    }

    #[test]
    fn test_encoded_result_decodes_back() {
        let source = PixelBuffer::new_filled(5, 2, [10, 200, 30, 255]);
        let processed = StillImageProcessor::new().process(&png_bytes(&source)).unwrap();

        let png = processed.encode_transformed(OutputFormat::Png).unwrap();
        assert_eq!(decode(&png).unwrap(), processed.transformed);

        let jpeg = processed.encode_transformed(OutputFormat::Jpeg { quality: 80 }).unwrap();
        assert_eq!(decode(&jpeg).unwrap().dimensions(), (5, 2));
    }

    #[test]
    fn test_comparison_splits_columns() {
        let processed = ProcessedImage {
            original: PixelBuffer::new_filled(4, 2, [1, 1, 1, 255]),
            transformed: PixelBuffer::new_filled(4, 2, [9, 9, 9, 255]),
            model: ColorModel::Canine,
        };

        let half = processed.comparison(0.5);
        for y in 0..2 {
            assert_eq!(half.get_pixel(0, y), [1, 1, 1, 255]);
            assert_eq!(half.get_pixel(1, y), [1, 1, 1, 255]);
            assert_eq!(half.get_pixel(2, y), [9, 9, 9, 255]);
            assert_eq!(half.get_pixel(3, y), [9, 9, 9, 255]);
        }

        assert_eq!(processed.comparison(-1.0), processed.transformed);
        assert_eq!(processed.comparison(2.0), processed.original);
    }
}
