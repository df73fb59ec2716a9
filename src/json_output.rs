//! JSON lines output
//!
//! When the --json flag is enabled, status information is emitted as one JSON
//! object per line on stdout and every other output is suppressed.

use serde::Serialize;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::image_processing::auto_optimizer::Recommendation;
use crate::image_processing::metrics::MetricSample;

/// Last progress emission timestamp (milliseconds since epoch)
/// Used for throttling progress updates to ~25 FPS (40ms between updates)
static LAST_PROGRESS_MS: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JsonMessage {
    /// Progress update
    Progress {
        current: usize,
        total: usize,
        message: String,
    },
    /// File processing completed
    FileCompleted {
        input_path: String,
        output_paths: Vec<String>,
        processing_time_ms: u128,
    },
    /// File processing failed
    FileFailed { input_path: String, error: String },
    /// Suggested settings derived from the preview samples
    Recommendation {
        averages: MetricSample,
        sharpness_factor: f64,
        brightness_factor: f64,
        contrast_factor: f64,
        face_crop_padding: f64,
        config_path: String,
    },
    /// Processing summary
    Summary {
        total_files: usize,
        processed: usize,
        failed: usize,
        duration_secs: f64,
    },
}

impl JsonMessage {
    /// Emit JSON message to stdout
    pub fn emit(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            println!("{}", json);
        }
    }

    /// Create and emit progress message, throttled to at most one every 40ms.
    /// The final progress (current == total) is always emitted.
    pub fn progress(current: usize, total: usize, message: impl Into<String>) {
        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        let last_ms = LAST_PROGRESS_MS.load(Ordering::Relaxed);

        if now_ms.saturating_sub(last_ms) >= 40 || current == total {
            LAST_PROGRESS_MS.store(now_ms, Ordering::Relaxed);
            Self::Progress {
                current,
                total,
                message: message.into(),
            }
            .emit();
        }
    }

    /// Create and emit file completed message
    pub fn file_completed<P: AsRef<Path>>(
        input_path: &Path,
        output_paths: &[P],
        processing_time_ms: u128,
    ) {
        Self::FileCompleted {
            input_path: input_path.display().to_string(),
            output_paths: output_paths
                .iter()
                .map(|p| p.as_ref().display().to_string())
                .collect(),
            processing_time_ms,
        }
        .emit();
    }

    /// Create and emit file failed message
    pub fn file_failed(input_path: &Path, error: impl Into<String>) {
        Self::FileFailed {
            input_path: input_path.display().to_string(),
            error: error.into(),
        }
        .emit();
    }

    pub fn recommendation(recommendation: &Recommendation, config_path: &Path) {
        Self::Recommendation {
            averages: recommendation.averages,
            sharpness_factor: recommendation.sharpness_factor,
            brightness_factor: recommendation.brightness_factor,
            contrast_factor: recommendation.contrast_factor,
            face_crop_padding: recommendation.face_crop_padding,
            config_path: config_path.display().to_string(),
        }
        .emit();
    }

    /// Create and emit summary message
    pub fn summary(total_files: usize, processed: usize, failed: usize, duration_secs: f64) {
        Self::Summary {
            total_files,
            processed,
            failed,
            duration_secs,
        }
        .emit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_tags() {
        let json = serde_json::to_value(JsonMessage::FileFailed {
            input_path: "input/a.jpg".to_string(),
            error: "failed to decode".to_string(),
        })
        .unwrap();
        assert_eq!(json["type"], "file_failed");
        assert_eq!(json["input_path"], "input/a.jpg");

        let json = serde_json::to_value(JsonMessage::Summary {
            total_files: 3,
            processed: 2,
            failed: 1,
            duration_secs: 0.5,
        })
        .unwrap();
        assert_eq!(json["type"], "summary");
        assert_eq!(json["processed"], 2);
    }

    #[test]
    fn test_recommendation_message_carries_averages() {
        let json = serde_json::to_value(JsonMessage::Recommendation {
            averages: MetricSample {
                sharpness: 200.0,
                brightness: 100.0,
                contrast: 40.0,
            },
            sharpness_factor: 1.5,
            brightness_factor: 1.2,
            contrast_factor: 1.2,
            face_crop_padding: 0.2,
            config_path: "session_config.json".to_string(),
        })
        .unwrap();
        assert_eq!(json["type"], "recommendation");
        assert_eq!(json["averages"]["sharpness"], 200.0);
        assert_eq!(json["sharpness_factor"], 1.5);
    }
}
