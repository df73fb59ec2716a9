//! Scalar image-quality metrics used by the preview analysis.
//!
//! All three metrics work on 0-255 intensities so their thresholds stay
//! comparable across image sizes:
//! - sharpness: variance of the Laplacian of the grayscale image
//! - brightness: mean of the HSV value channel
//! - contrast: standard deviation of the grayscale image

use image::{GrayImage, ImageBuffer, Luma, RgbImage};
use imageproc::filter::laplacian_filter;
use serde::Serialize;

/// Quality metrics of a single sample image
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricSample {
    pub sharpness: f64,
    pub brightness: f64,
    pub contrast: f64,
}

impl MetricSample {
    /// Measure all three metrics on an unmodified image
    pub fn measure(img: &RgbImage) -> Self {
        let gray = to_gray(img);
        Self {
            sharpness: laplacian_variance(&gray),
            brightness: measure_brightness(img),
            contrast: intensity_std_dev(&gray),
        }
    }
}

/// Convert to grayscale with ITU-R BT.601 weights (fixed point, rounded)
pub fn to_gray(img: &RgbImage) -> GrayImage {
    ImageBuffer::from_fn(img.width(), img.height(), |x, y| {
        let p = img.get_pixel(x, y);
        let luma = (p[0] as u32 * 19595 + p[1] as u32 * 38470 + p[2] as u32 * 7471 + 0x8000) >> 16;
        Luma([luma.min(255) as u8])
    })
}

/// Variance of the Laplacian. Higher values mean a sharper image.
pub fn measure_sharpness(img: &RgbImage) -> f64 {
    laplacian_variance(&to_gray(img))
}

/// Mean of the HSV value channel (0-255)
pub fn measure_brightness(img: &RgbImage) -> f64 {
    let pixel_count = img.width() as u64 * img.height() as u64;
    if pixel_count == 0 {
        return 0.0;
    }

    let sum: u64 = img
        .pixels()
        .map(|p| p[0].max(p[1]).max(p[2]) as u64)
        .sum();

    sum as f64 / pixel_count as f64
}

/// Standard deviation of grayscale intensities
pub fn measure_contrast(img: &RgbImage) -> f64 {
    intensity_std_dev(&to_gray(img))
}

fn laplacian_variance(gray: &GrayImage) -> f64 {
    if gray.width() == 0 || gray.height() == 0 {
        return 0.0;
    }

    let laplacian = laplacian_filter(gray);
    population_variance(laplacian.pixels().map(|p| p[0] as f64))
}

fn intensity_std_dev(gray: &GrayImage) -> f64 {
    population_variance(gray.pixels().map(|p| p[0] as f64)).sqrt()
}

/// Two-pass population variance (ddof = 0)
fn population_variance<I>(values: I) -> f64
where
    I: Iterator<Item = f64> + Clone,
{
    let (count, sum) = values
        .clone()
        .fold((0usize, 0.0f64), |(n, s), v| (n + 1, s + v));
    if count == 0 {
        return 0.0;
    }

    let mean = sum / count as f64;
    values.map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn uniform(width: u32, height: u32, color: [u8; 3]) -> RgbImage {
        ImageBuffer::from_pixel(width, height, Rgb(color))
    }

    fn checkerboard(size: u32) -> RgbImage {
        ImageBuffer::from_fn(size, size, |x, y| {
            if (x + y) % 2 == 0 {
                Rgb([0, 0, 0])
            } else {
                Rgb([255, 255, 255])
            }
        })
    }

    #[test]
    fn test_uniform_image_metrics() {
        let img = uniform(16, 16, [120, 120, 120]);
        let sample = MetricSample::measure(&img);

        assert_eq!(sample.sharpness, 0.0);
        assert_eq!(sample.contrast, 0.0);
        assert!((sample.brightness - 120.0).abs() < 1e-9);
    }

    #[test]
    fn test_brightness_uses_max_channel() {
        let img = uniform(4, 4, [255, 0, 0]);
        assert!((measure_brightness(&img) - 255.0).abs() < 1e-9);

        let img = uniform(4, 4, [10, 200, 30]);
        assert!((measure_brightness(&img) - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_gray_weights() {
        let gray = to_gray(&uniform(1, 1, [255, 255, 255]));
        assert_eq!(gray.get_pixel(0, 0)[0], 255);

        let gray = to_gray(&uniform(1, 1, [255, 0, 0]));
        // 0.299 * 255 = 76.2
        assert_eq!(gray.get_pixel(0, 0)[0], 76);
    }

    #[test]
    fn test_checkerboard_is_sharp_and_contrasted() {
        let img = checkerboard(16);
        let sample = MetricSample::measure(&img);

        assert!(sample.sharpness > 250.0, "sharpness {}", sample.sharpness);
        assert!(sample.contrast > 100.0, "contrast {}", sample.contrast);
        assert!((sample.contrast - 127.5).abs() < 1.0);
    }

    #[test]
    fn test_blurred_is_less_sharp() {
        let sharp = checkerboard(32);
        let soft: RgbImage = ImageBuffer::from_fn(32, 32, |x, _| {
            let v = (x * 8).min(255) as u8;
            Rgb([v, v, v])
        });

        assert!(measure_sharpness(&sharp) > measure_sharpness(&soft));
    }

    #[test]
    fn test_population_variance() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let variance = population_variance(values.iter().copied());
        assert!((variance - 4.0).abs() < 1e-12);
        assert_eq!(population_variance(std::iter::empty::<f64>()), 0.0);
    }
}
