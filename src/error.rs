use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EnhanceError {
    #[error("failed to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to encode {}: {source}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no images found in {}", dir.display())]
    EmptyInputSet { dir: PathBuf },

    #[error("cannot recommend settings from an empty sample set")]
    EmptySampleSet,

    #[error("resize failed: {0}")]
    Resize(String),

    /// Raised by [`FaceDetector`](crate::image_processing::face_detection::FaceDetector)
    /// backends that can fail at detection time. The rustface backend never does.
    #[error("face detection failed: {0}")]
    FaceDetection(String),

    #[error("failed to load face model {}: {reason}", path.display())]
    FaceModel { path: PathBuf, reason: String },

    #[error("failed to parse config file {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
