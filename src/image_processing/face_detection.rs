use anyhow::Result;
use image::RgbImage;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use super::metrics::to_gray;
use crate::error::EnhanceError;

/// Face bounding box in pixel coordinates, as reported by a detector.
///
/// Coordinates are signed because detectors may report boxes that start
/// outside the frame. They are clamped when the crop region is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceBox {
    pub top: i64,
    pub right: i64,
    pub bottom: i64,
    pub left: i64,
}

impl FaceBox {
    pub fn new(top: i64, right: i64, bottom: i64, left: i64) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    pub fn width(&self) -> i64 {
        self.right - self.left
    }

    pub fn height(&self) -> i64 {
        self.bottom - self.top
    }
}

/// Pluggable face detection backend.
///
/// Boxes are returned in detector order; callers use the first one.
pub trait FaceDetector: Send + Sync {
    fn detect(&self, img: &RgbImage) -> Result<Vec<FaceBox>, EnhanceError>;
}

/// Detector used when no face model is configured: never finds a face,
/// which turns face cropping into a no-op.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoFaceDetector;

impl FaceDetector for NoFaceDetector {
    fn detect(&self, _img: &RgbImage) -> Result<Vec<FaceBox>, EnhanceError> {
        Ok(Vec::new())
    }
}

/// Face detector backed by the `rustface` crate (SeetaFace frontal engine).
pub struct RustfaceDetector {
    model: rustface::Model,
    min_face_size: u32,
}

impl RustfaceDetector {
    /// Load a SeetaFace model file (e.g. `seeta_fd_frontal_v1.0.bin`)
    pub fn from_model_file(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| EnhanceError::FaceModel {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let model = rustface::read_model(BufReader::new(file)).map_err(|e| {
            EnhanceError::FaceModel {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        })?;

        Ok(Self {
            model,
            min_face_size: 20,
        })
    }
}

impl FaceDetector for RustfaceDetector {
    fn detect(&self, img: &RgbImage) -> Result<Vec<FaceBox>, EnhanceError> {
        let (width, height) = img.dimensions();
        if width == 0 || height == 0 {
            return Ok(Vec::new());
        }

        let gray = to_gray(img);

        let mut detector = rustface::create_detector_with_model(self.model.clone());
        detector.set_min_face_size(self.min_face_size);
        detector.set_score_thresh(2.0);
        detector.set_pyramid_scale_factor(0.8);
        detector.set_slide_window_step(4, 4);

        let faces = detector.detect(&rustface::ImageData::new(gray.as_raw(), width, height));

        Ok(faces
            .iter()
            .map(|face| {
                let bbox = face.bbox();
                let left = bbox.x() as i64;
                let top = bbox.y() as i64;
                FaceBox::new(
                    top,
                    left + bbox.width() as i64,
                    top + bbox.height() as i64,
                    left,
                )
            })
            .collect())
    }
}
