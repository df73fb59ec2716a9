use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::EnhanceError;

/// Default location of the persisted session configuration
pub const DEFAULT_CONFIG_FILE: &str = "session_config.json";

/// Fixed JPEG quality used for every encoded output
pub const JPEG_QUALITY: u8 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
pub enum OutputFormat {
    /// JPEG output (quality 90)
    #[serde(rename = "jpg", alias = "jpeg", alias = "JPG", alias = "JPEG")]
    #[value(name = "jpg", alias = "jpeg")]
    Jpg,
    /// Lossless PNG output
    #[serde(rename = "png", alias = "PNG")]
    #[value(name = "png")]
    Png,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Jpg => "jpg",
            OutputFormat::Png => "png",
        }
    }
}

/// Enhancement settings used by the batch driver.
///
/// Serialized as a flat JSON object with upper-case keys. Every key is
/// optional in the file: anything missing falls back to [`Default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", default)]
pub struct EnhancementConfig {
    pub sharpness_factor: f64,
    pub brightness_factor: f64,
    pub contrast_factor: f64,
    pub face_crop_padding: f64,
    pub crop_enabled: bool,
    pub max_dim: u32,
    pub format: OutputFormat,
    pub equalize_histogram: bool,
}

impl Default for EnhancementConfig {
    fn default() -> Self {
        Self {
            sharpness_factor: 1.3,
            brightness_factor: 1.05,
            contrast_factor: 1.1,
            face_crop_padding: 0.2,
            crop_enabled: true,
            max_dim: 2048,
            format: OutputFormat::Jpg,
            equalize_histogram: false,
        }
    }
}

/// Explicit overrides, typically coming from the command line.
/// `None` leaves the underlying value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub sharpness_factor: Option<f64>,
    pub brightness_factor: Option<f64>,
    pub contrast_factor: Option<f64>,
    pub face_crop_padding: Option<f64>,
    pub crop_enabled: Option<bool>,
    pub max_dim: Option<u32>,
    pub format: Option<OutputFormat>,
    pub equalize_histogram: Option<bool>,
}

impl EnhancementConfig {
    /// Build the effective configuration: defaults, then the file at `path`
    /// (when it exists), then `overrides`.
    pub fn load(path: &Path, overrides: &ConfigOverrides) -> Result<Self> {
        let mut config = if path.exists() {
            Self::from_file(path)?
        } else {
            Self::default()
        };

        config.apply_overrides(overrides);
        config.validate()?;
        Ok(config)
    }

    /// Read a configuration file. Missing keys take their default value,
    /// a malformed file is an error.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: EnhancementConfig =
            serde_json::from_str(&contents).map_err(|source| EnhanceError::Config {
                path: path.to_path_buf(),
                source,
            })?;

        Ok(config)
    }

    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(sharpness) = overrides.sharpness_factor {
            self.sharpness_factor = sharpness;
        }
        if let Some(brightness) = overrides.brightness_factor {
            self.brightness_factor = brightness;
        }
        if let Some(contrast) = overrides.contrast_factor {
            self.contrast_factor = contrast;
        }
        if let Some(padding) = overrides.face_crop_padding {
            self.face_crop_padding = padding;
        }
        if let Some(crop) = overrides.crop_enabled {
            self.crop_enabled = crop;
        }
        if let Some(max_dim) = overrides.max_dim {
            self.max_dim = max_dim;
        }
        if let Some(format) = overrides.format {
            self.format = format;
        }
        if let Some(equalize) = overrides.equalize_histogram {
            self.equalize_histogram = equalize;
        }
    }

    /// Reject values no stage can work with. Extreme but finite factors are
    /// accepted on purpose.
    pub fn validate(&self) -> Result<(), EnhanceError> {
        if self.max_dim == 0 {
            return Err(EnhanceError::InvalidConfig(
                "MAX_DIM must be greater than 0".to_string(),
            ));
        }

        for (name, value) in [
            ("SHARPNESS_FACTOR", self.sharpness_factor),
            ("BRIGHTNESS_FACTOR", self.brightness_factor),
            ("CONTRAST_FACTOR", self.contrast_factor),
        ] {
            if !value.is_finite() {
                return Err(EnhanceError::InvalidConfig(format!(
                    "{} must be a finite number, got {}",
                    name, value
                )));
            }
        }

        if !self.face_crop_padding.is_finite() || self.face_crop_padding < 0.0 {
            return Err(EnhanceError::InvalidConfig(format!(
                "FACE_CROP_PADDING must be >= 0.0, got {}",
                self.face_crop_padding
            )));
        }

        Ok(())
    }
}
