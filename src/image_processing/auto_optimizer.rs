//! Automatic enhancement settings from sample analysis
//!
//! Averages the quality metrics of a sample set and maps each average to a
//! suggested factor through fixed thresholds:
//! - soft samples get a stronger sharpening
//! - dark samples are brightened, very bright ones toned down
//! - flat samples get a contrast boost
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;

use super::metrics::MetricSample;
use crate::error::EnhanceError;

const SOFT_SHARPNESS_THRESHOLD: f64 = 250.0;
const DARK_BRIGHTNESS_THRESHOLD: f64 = 120.0;
const BRIGHT_BRIGHTNESS_THRESHOLD: f64 = 180.0;
const FLAT_CONTRAST_THRESHOLD: f64 = 50.0;
const RECOMMENDED_CROP_PADDING: f64 = 0.2;

/// Suggested settings, persisted with the same keys the batch config reads
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Recommendation {
    pub sharpness_factor: f64,
    pub brightness_factor: f64,
    pub contrast_factor: f64,
    pub face_crop_padding: f64,
    #[serde(skip)]
    pub averages: MetricSample,
    #[serde(skip)]
    pub reasoning: Vec<String>,
}

/// Arithmetic mean of each metric across the sample set
pub fn average_samples(samples: &[MetricSample]) -> Result<MetricSample, EnhanceError> {
    if samples.is_empty() {
        return Err(EnhanceError::EmptySampleSet);
    }

    let count = samples.len() as f64;
    let (sharpness, brightness, contrast) = samples.iter().fold((0.0, 0.0, 0.0), |acc, s| {
        (acc.0 + s.sharpness, acc.1 + s.brightness, acc.2 + s.contrast)
    });

    Ok(MetricSample {
        sharpness: sharpness / count,
        brightness: brightness / count,
        contrast: contrast / count,
    })
}

/// Main entry point: average the samples and derive the suggested factors
pub fn recommend(samples: &[MetricSample]) -> Result<Recommendation, EnhanceError> {
    let averages = average_samples(samples)?;
    let mut reasoning = Vec::new();

    let sharpness_factor = if averages.sharpness < SOFT_SHARPNESS_THRESHOLD {
        reasoning.push(format!(
            "Soft samples (Laplacian variance {:.2} < {}) -> strong sharpening",
            averages.sharpness, SOFT_SHARPNESS_THRESHOLD
        ));
        1.5
    } else {
        reasoning.push(format!(
            "Crisp samples (Laplacian variance {:.2}) -> light sharpening",
            averages.sharpness
        ));
        1.2
    };

    let brightness_factor = if averages.brightness < DARK_BRIGHTNESS_THRESHOLD {
        reasoning.push(format!(
            "Dark samples (mean value {:.2} < {}) -> brighten",
            averages.brightness, DARK_BRIGHTNESS_THRESHOLD
        ));
        1.2
    } else if averages.brightness > BRIGHT_BRIGHTNESS_THRESHOLD {
        reasoning.push(format!(
            "Bright samples (mean value {:.2} > {}) -> tone down",
            averages.brightness, BRIGHT_BRIGHTNESS_THRESHOLD
        ));
        0.9
    } else {
        reasoning.push(format!(
            "Balanced exposure (mean value {:.2}) -> keep brightness",
            averages.brightness
        ));
        1.0
    };

    let contrast_factor = if averages.contrast < FLAT_CONTRAST_THRESHOLD {
        reasoning.push(format!(
            "Flat samples (gray std-dev {:.2} < {}) -> boost contrast",
            averages.contrast, FLAT_CONTRAST_THRESHOLD
        ));
        1.2
    } else {
        reasoning.push(format!(
            "Enough contrast (gray std-dev {:.2}) -> keep contrast",
            averages.contrast
        ));
        1.0
    };

    Ok(Recommendation {
        sharpness_factor,
        brightness_factor,
        contrast_factor,
        face_crop_padding: RECOMMENDED_CROP_PADDING,
        averages,
        reasoning,
    })
}

impl Recommendation {
    /// Write the four suggested keys as pretty JSON, replacing any existing file
    pub fn save(&self, path: &Path) -> Result<()> {
        let json =
            serde_json::to_string_pretty(self).context("Failed to serialize recommendation")?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        fs::write(path, json)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }
}
