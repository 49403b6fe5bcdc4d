use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Vienot/Brettel/Mollon deuteranopia matrix for sRGB under D65.
///
/// Applied directly to gamma-encoded 0..=255 values.
pub const DICHROMATIC_MATRIX: [[f64; 3]; 3] = [
    [0.360278, 0.706949, -0.067227],
    [0.278603, 0.673002, 0.048395],
    [-0.012328, 0.042811, 0.969517],
];

/// Linear RGB to dog cone/rod responses.
///
/// Rows: S-cone (~440nm), L-cone (~555nm), scotopic rod luminance (~498nm).
pub const CANINE_RESPONSE_MATRIX: [[f64; 3]; 3] = [
    [0.05, 0.22, 0.73],
    [0.68, 0.32, 0.00],
    [0.30, 0.59, 0.11],
];

/// `[l_weight, s_weight]` per display channel when rebuilding RGB from the two cones.
pub const CANINE_DISPLAY_BLEND: [[f64; 2]; 3] = [[0.8, 0.1], [0.6, 0.3], [0.0, 0.9]];

/// Display gamma used to linearize and re-encode channels.
pub const CANINE_GAMMA: f64 = 2.2;

/// ITU-R BT.709 luminance weights.
pub const BT709_LUMA: [f64; 3] = [0.2126, 0.7152, 0.0722];

/// Luminance below which rods contribute.
pub const SCOTOPIC_THRESHOLD: f64 = 0.3;
/// Slope of the rod blend factor as luminance drops below the threshold.
pub const SCOTOPIC_SLOPE: f64 = 1.3;
/// Upper bound of the rod blend factor.
pub const SCOTOPIC_MAX_BLEND: f64 = 0.4;
/// Scale applied to the rod response before blending.
pub const ROD_TINT_SCALE: f64 = 0.7;
/// Per-channel bias of the rod tint (blue-green).
pub const ROD_TINT_BIAS: [f64; 3] = [1.0, 1.2, 1.1];

/// A fixed color-vision simulation
///
/// Both variants are pure per-pixel functions with compile-time constants.
/// Neither is idempotent: feeding a model its own output does not give the
/// same image back and does not approximate anything meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorModel {
    /// Human red-green dichromacy matrix, applied in gamma space.
    Dichromatic,
    /// Two-cone plus rod approximation of dog vision, applied in linear light.
    #[default]
    Canine,
}

impl ColorModel {
    /// All available models
    pub const ALL: [ColorModel; 2] = [ColorModel::Dichromatic, ColorModel::Canine];

    /// Returns the unique name of this model
    pub fn name(&self) -> &'static str {
        match self {
            ColorModel::Dichromatic => "dichromatic",
            ColorModel::Canine => "canine",
        }
    }

    /// Returns a human-readable description of this model
    pub fn description(&self) -> &'static str {
        match self {
            ColorModel::Dichromatic => {
                "Human deuteranopia matrix (Vienot, Brettel & Mollon 1999), applied to gamma-encoded sRGB"
            }
            ColorModel::Canine => {
                "Dog S/L cone responses with low-light rod blending, computed in linearized sRGB"
            }
        }
    }

    /// Map one gamma-encoded RGB triple through this model
    #[inline]
    pub fn simulate_pixel(&self, rgb: [u8; 3]) -> [u8; 3] {
        match self {
            ColorModel::Dichromatic => dichromatic(rgb),
            ColorModel::Canine => canine(rgb),
        }
    }
}

impl fmt::Display for ColorModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ColorModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dichromatic" | "deuteranopia" => Ok(ColorModel::Dichromatic),
            "canine" | "dog" => Ok(ColorModel::Canine),
            other => Err(format!(
                "unknown color model '{}' (available: dichromatic, canine)",
                other
            )),
        }
    }
}

/// Round to nearest, ties to even, and clamp into a channel byte
///
/// Matches how a clamped byte array stores a float, so x.5 lands on the even
/// neighbour instead of always rounding up.
#[inline]
fn to_channel(value: f64) -> u8 {
    // NaN clamps to 0 through the `as` cast
    value.round_ties_even().clamp(0.0, 255.0) as u8
}

#[inline]
fn dot(row: &[f64; 3], v: [f64; 3]) -> f64 {
    row[0] * v[0] + row[1] * v[1] + row[2] * v[2]
}

fn dichromatic(rgb: [u8; 3]) -> [u8; 3] {
    let v = [rgb[0] as f64, rgb[1] as f64, rgb[2] as f64];
    let m = &DICHROMATIC_MATRIX;
    [
        to_channel(dot(&m[0], v)),
        to_channel(dot(&m[1], v)),
        to_channel(dot(&m[2], v)),
    ]
}

fn canine(rgb: [u8; 3]) -> [u8; 3] {
    let linear = rgb.map(|c| (c as f64 / 255.0).powf(CANINE_GAMMA));

    let s_cone = dot(&CANINE_RESPONSE_MATRIX[0], linear);
    let l_cone = dot(&CANINE_RESPONSE_MATRIX[1], linear);
    let rod = dot(&CANINE_RESPONSE_MATRIX[2], linear);

    let mut out = CANINE_DISPLAY_BLEND.map(|[l_weight, s_weight]| l_cone * l_weight + s_cone * s_weight);

    let luminance = dot(&BT709_LUMA, linear);
    if luminance < SCOTOPIC_THRESHOLD {
        let blend = ((SCOTOPIC_THRESHOLD - luminance) * SCOTOPIC_SLOPE).min(SCOTOPIC_MAX_BLEND);
        let tint = rod * ROD_TINT_SCALE;
        for (channel, bias) in out.iter_mut().zip(ROD_TINT_BIAS) {
            *channel = *channel * (1.0 - blend) + tint * blend * bias;
        }
    }

    out.map(|c| to_channel(c.max(0.0).powf(1.0 / CANINE_GAMMA) * 255.0))
}
