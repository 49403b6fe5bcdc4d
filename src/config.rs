use std::path::Path;
use serde::{Deserialize, Serialize};

use crate::{
    color::{ColorModel, Transformer, DEFAULT_PARALLEL_THRESHOLD},
    error::{ConfigError, Result},
    still::OutputFormat,
};

/// Main configuration for dog-vision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Size of the rayon pool used by the pixel loop
    pub processing_threads: usize,

    /// Color simulation settings
    pub filter: FilterConfig,

    /// Live session settings
    pub live: LiveConfig,

    /// Encoded output settings
    pub output: OutputConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            processing_threads: num_cpus::get(),
            filter: FilterConfig::default(),
            live: LiveConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.display().to_string() })?;

        let config: Config = toml::from_str(&content)
            .map_err(|_| ConfigError::ParseFailed { path: path.display().to_string() })?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::InvalidValue {
                key: "config".to_string(),
                value: e.to_string()
            })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.processing_threads == 0 {
            return Err(ConfigError::InvalidValue {
                key: "processing_threads".to_string(),
                value: self.processing_threads.to_string()
            }.into());
        }

        self.live.validate()?;
        self.output.validate()?;
        Ok(())
    }
}

/// Color simulation configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Which simulation to apply
    pub model: ColorModel,

    /// Pixel count at which the transform runs in parallel
    pub parallel_threshold: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            model: ColorModel::Canine,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

impl FilterConfig {
    /// Build a transformer for these settings
    pub fn transformer(&self) -> Transformer {
        Transformer::new(self.model).with_parallel_threshold(self.parallel_threshold)
    }
}

/// Live session configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveConfig {
    /// Ticks per second
    pub fps: f64,

    /// Stop after rendering this many frames
    pub max_frames: Option<u64>,

    /// Restart directory sources at the end instead of ending the session
    pub loop_frames: bool,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            fps: 30.0,
            max_frames: None,
            loop_frames: false,
        }
    }
}

impl LiveConfig {
    fn validate(&self) -> Result<()> {
        if !(self.fps > 0.0 && self.fps <= 240.0) {
            return Err(ConfigError::InvalidValue {
                key: "live.fps".to_string(),
                value: self.fps.to_string()
            }.into());
        }

        if self.max_frames == Some(0) {
            return Err(ConfigError::InvalidValue {
                key: "live.max_frames".to_string(),
                value: "0".to_string()
            }.into());
        }

        Ok(())
    }
}

/// Encoded image format names accepted in config files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormatKind {
    #[default]
    Png,
    Jpeg,
    Bmp,
}

/// Encoded output configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Format used when the output path has no recognised extension
    pub format: ImageFormatKind,

    /// JPEG quality (1-100)
    pub jpeg_quality: u8,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: ImageFormatKind::Png,
            jpeg_quality: 90,
        }
    }
}

impl OutputConfig {
    fn validate(&self) -> Result<()> {
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ConfigError::InvalidValue {
                key: "output.jpeg_quality".to_string(),
                value: self.jpeg_quality.to_string()
            }.into());
        }
        Ok(())
    }

    /// The configured default format
    pub fn output_format(&self) -> OutputFormat {
        match self.format {
            ImageFormatKind::Png => OutputFormat::Png,
            ImageFormatKind::Jpeg => OutputFormat::Jpeg { quality: self.jpeg_quality },
            ImageFormatKind::Bmp => OutputFormat::Bmp,
        }
    }

    /// Format for `path`, falling back to the configured one
    pub fn format_for<P: AsRef<Path>>(&self, path: P) -> OutputFormat {
        OutputFormat::from_path(path, self.jpeg_quality).unwrap_or_else(|_| self.output_format())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.filter.model, ColorModel::Canine);
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test_config.toml");

        let mut original_config = Config::default();
        original_config.filter.model = ColorModel::Dichromatic;
        original_config.live.max_frames = Some(120);

        original_config.save_to_file(&file_path).unwrap();
        let loaded_config = Config::from_file(&file_path).unwrap();

        assert_eq!(original_config, loaded_config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("partial.toml");
        std::fs::write(&file_path, "[filter]\nmodel = \"dichromatic\"\n").unwrap();

        let config = Config::from_file(&file_path).unwrap();
        assert_eq!(config.filter.model, ColorModel::Dichromatic);
        assert_eq!(config.filter.parallel_threshold, DEFAULT_PARALLEL_THRESHOLD);
        assert_eq!(config.live, LiveConfig::default());
    }

    #[test]
    fn test_unknown_model_fails_to_parse() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("bad.toml");
        std::fs::write(&file_path, "[filter]\nmodel = \"feline\"\n").unwrap();
        assert!(Config::from_file(&file_path).is_err());
    }

    #[test]
    fn test_invalid_fps() {
        let mut config = Config::default();
        config.live.fps = 0.0;
        assert!(config.validate().is_err());
        config.live.fps = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_jpeg_quality() {
        let mut config = Config::default();
        config.output.jpeg_quality = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_output_format_follows_extension() {
        let output = OutputConfig { format: ImageFormatKind::Bmp, jpeg_quality: 75 };
        assert_eq!(output.format_for("x.jpg"), OutputFormat::Jpeg { quality: 75 });
        assert_eq!(output.format_for("x.unknown"), OutputFormat::Bmp);
    }
}
