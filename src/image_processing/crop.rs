use image::{imageops, RgbImage};

use super::face_detection::{FaceBox, FaceDetector};
use crate::error::EnhanceError;

/// Crop region within the source image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Expand `face` by `padding` (fraction of the box size, per axis) and clamp
/// the result to the image bounds.
///
/// Returns `None` when the clamped region has no area, e.g. a box that lies
/// entirely outside the frame.
pub fn padded_face_region(
    face: &FaceBox,
    padding: f64,
    image_width: u32,
    image_height: u32,
) -> Option<CropRegion> {
    // Truncated towards zero; huge paddings saturate at i64::MAX
    let pad_h = (face.height() as f64 * padding) as i64;
    let pad_w = (face.width() as f64 * padding) as i64;

    let top = face.top.saturating_sub(pad_h).max(0);
    let bottom = face.bottom.saturating_add(pad_h).min(image_height as i64);
    let left = face.left.saturating_sub(pad_w).max(0);
    let right = face.right.saturating_add(pad_w).min(image_width as i64);

    if top >= bottom || left >= right {
        return None;
    }

    Some(CropRegion {
        x: left as u32,
        y: top as u32,
        width: (right - left) as u32,
        height: (bottom - top) as u32,
    })
}

/// Crop around an already detected face. Without a face, or with a face that
/// collapses to an empty region, the image is returned unchanged.
pub fn crop_to_face(img: &RgbImage, face: Option<&FaceBox>, padding: f64) -> RgbImage {
    let Some(face) = face else {
        return img.clone();
    };

    match padded_face_region(face, padding, img.width(), img.height()) {
        Some(region) => {
            imageops::crop_imm(img, region.x, region.y, region.width, region.height).to_image()
        }
        None => img.clone(),
    }
}

/// Detect faces and crop around the first one the detector reports.
pub fn crop_around_face(
    img: &RgbImage,
    padding: f64,
    detector: &dyn FaceDetector,
) -> Result<RgbImage, EnhanceError> {
    let faces = detector.detect(img)?;
    Ok(crop_to_face(img, faces.first(), padding))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    struct FixedDetector(Vec<FaceBox>);

    impl FaceDetector for FixedDetector {
        fn detect(&self, _img: &RgbImage) -> Result<Vec<FaceBox>, EnhanceError> {
            Ok(self.0.clone())
        }
    }

    struct FailingDetector;

    impl FaceDetector for FailingDetector {
        fn detect(&self, _img: &RgbImage) -> Result<Vec<FaceBox>, EnhanceError> {
            Err(EnhanceError::FaceDetection("model exploded".to_string()))
        }
    }

    fn create_test_image(width: u32, height: u32) -> RgbImage {
        ImageBuffer::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
        })
    }

    #[test]
    fn test_no_face_returns_original() {
        let img = create_test_image(64, 48);
        let cropped = crop_around_face(&img, 0.2, &FixedDetector(vec![])).unwrap();
        assert_eq!(cropped, img);
    }

    #[test]
    fn test_padding_expands_box() {
        let img = create_test_image(200, 200);
        // 40 wide, 50 tall box at (left 80, top 60)
        let face = FaceBox::new(60, 120, 110, 80);

        let cropped = crop_around_face(&img, 0.2, &FixedDetector(vec![face])).unwrap();
        // pad_h = 10, pad_w = 8
        assert_eq!(cropped.dimensions(), (56, 70));
        assert_eq!(cropped.get_pixel(0, 0), img.get_pixel(72, 50));
    }

    #[test]
    fn test_zero_padding_is_exact_box() {
        let img = create_test_image(100, 100);
        let face = FaceBox::new(10, 40, 30, 20);
        let region = padded_face_region(&face, 0.0, 100, 100).unwrap();
        assert_eq!(
            region,
            CropRegion {
                x: 20,
                y: 10,
                width: 20,
                height: 20
            }
        );

        let cropped = crop_to_face(&img, Some(&face), 0.0);
        assert_eq!(cropped.dimensions(), (20, 20));
    }

    #[test]
    fn test_padding_is_truncated() {
        // 0.3 * 15 = 4.5 -> 4
        let face = FaceBox::new(20, 35, 35, 20);
        let region = padded_face_region(&face, 0.3, 100, 100).unwrap();
        assert_eq!(region.x, 16);
        assert_eq!(region.y, 16);
        assert_eq!(region.width, 23);
        assert_eq!(region.height, 23);
    }

    #[test]
    fn test_region_clamped_to_bounds() {
        let face = FaceBox::new(-10, 70, 55, 30);
        let region = padded_face_region(&face, 0.5, 64, 48).unwrap();

        assert_eq!(region.x, 10);
        assert_eq!(region.y, 0);
        assert_eq!(region.x + region.width, 64);
        assert_eq!(region.y + region.height, 48);
    }

    #[test]
    fn test_first_face_is_used() {
        let img = create_test_image(100, 100);
        let first = FaceBox::new(0, 10, 10, 0);
        let larger = FaceBox::new(20, 90, 90, 20);

        let cropped = crop_around_face(&img, 0.0, &FixedDetector(vec![first, larger])).unwrap();
        assert_eq!(cropped.dimensions(), (10, 10));
    }

    #[test]
    fn test_degenerate_box_returns_original() {
        let img = create_test_image(50, 50);
        // Entirely outside the frame
        let face = FaceBox::new(60, 90, 80, 70);
        assert!(padded_face_region(&face, 0.2, 50, 50).is_none());

        let cropped = crop_to_face(&img, Some(&face), 0.2);
        assert_eq!(cropped, img);
    }

    #[test]
    fn test_huge_padding_covers_whole_image() {
        let img = create_test_image(100, 100);
        let face = FaceBox::new(10, 30, 30, 10);

        for padding in [1e18, f64::MAX] {
            let region = padded_face_region(&face, padding, 100, 100).unwrap();
            assert_eq!(
                region,
                CropRegion {
                    x: 0,
                    y: 0,
                    width: 100,
                    height: 100
                }
            );

            let cropped = crop_to_face(&img, Some(&face), padding);
            assert_eq!(cropped, img);
        }
    }

    #[test]
    fn test_region_always_within_bounds() {
        let (width, height) = (37u32, 23u32);
        let faces = [
            FaceBox::new(0, 37, 23, 0),
            FaceBox::new(-5, 50, 30, -8),
            FaceBox::new(5, 20, 15, 10),
            FaceBox::new(20, 36, 22, 30),
            FaceBox::new(1, 2, 2, 1),
        ];

        for face in &faces {
            for step in 0..=20 {
                let padding = step as f64 * 0.15;
                if let Some(region) = padded_face_region(face, padding, width, height) {
                    assert!(region.width > 0 && region.height > 0);
                    assert!(region.x + region.width <= width, "{:?} pad {}", face, padding);
                    assert!(region.y + region.height <= height, "{:?} pad {}", face, padding);
                }
            }
        }
    }

    #[test]
    fn test_detector_failure_propagates() {
        let img = create_test_image(10, 10);
        assert!(crop_around_face(&img, 0.2, &FailingDetector).is_err());
    }
}
