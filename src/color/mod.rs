//! # Color Vision Simulation
//!
//! Fixed color models and the single transform that applies them to pixel buffers.
//!
//! ## Built-in Models
//!
//! - **Dichromatic**: Vienot/Brettel/Mollon deuteranopia matrix in gamma space
//! - **Canine**: dog S/L cone responses in linear light, with rod blending in the dark
//!
//! ## Usage
//!
//! ```rust
//! use dog_vision::buffer::PixelBuffer;
//! use dog_vision::color::{transform, ColorModel};
//!
//! let red = PixelBuffer::from_raw(1, 1, vec![255, 0, 0, 255]).unwrap();
//! let seen = transform(&red, ColorModel::Dichromatic).unwrap();
//! assert_eq!(seen.as_bytes(), &[92, 71, 0, 255]);
//! ```

pub mod model;
pub mod transform;

pub use model::ColorModel;
pub use transform::{transform, transform_into, transform_raw, Transformer, DEFAULT_PARALLEL_THRESHOLD};
