use image::{GrayImage, ImageBuffer, Luma, Rgb, RgbImage};
use imageproc::contrast::equalize_histogram;

use super::metrics::to_gray;
use crate::config_file::EnhancementConfig;

/// Apply sharpness, contrast and brightness factors, in that order.
///
/// Each factor interpolates (or extrapolates) between a degenerate version of
/// the image and the image itself: 0.0 gives the degenerate image, 1.0 leaves
/// the image untouched, values above 1.0 amplify the property.
pub fn enhance(img: &RgbImage, sharpness: f64, brightness: f64, contrast: f64) -> RgbImage {
    let sharpened = apply_sharpness(img, sharpness);
    let contrasted = apply_contrast(&sharpened, contrast);
    apply_brightness(&contrasted, brightness)
}

/// Batch-mode enhancement: optional value-channel equalization, then the
/// three configured factors.
pub fn enhance_with_config(img: &RgbImage, config: &EnhancementConfig) -> RgbImage {
    if config.equalize_histogram {
        let equalized = equalize_value_channel(img);
        enhance(
            &equalized,
            config.sharpness_factor,
            config.brightness_factor,
            config.contrast_factor,
        )
    } else {
        enhance(
            img,
            config.sharpness_factor,
            config.brightness_factor,
            config.contrast_factor,
        )
    }
}

/// Sharpness: blend against a 3x3 smoothed copy
/// (kernel `[1 1 1; 1 5 1; 1 1 1] / 13`, border pixels unchanged).
pub fn apply_sharpness(img: &RgbImage, factor: f64) -> RgbImage {
    if factor == 1.0 {
        return img.clone();
    }

    let smoothed = smooth(img);
    blend(&smoothed, img, factor)
}

/// Contrast: blend against a uniform gray at the mean grayscale level
pub fn apply_contrast(img: &RgbImage, factor: f64) -> RgbImage {
    if factor == 1.0 {
        return img.clone();
    }

    let mean = mean_gray_level(img);
    let (width, height) = img.dimensions();
    let degenerate = ImageBuffer::from_pixel(width, height, Rgb([mean, mean, mean]));
    blend(&degenerate, img, factor)
}

/// Brightness: blend against black, i.e. a plain per-channel scale
pub fn apply_brightness(img: &RgbImage, factor: f64) -> RgbImage {
    if factor == 1.0 {
        return img.clone();
    }

    let (width, height) = img.dimensions();
    let mut output = RgbImage::new(width, height);

    for (x, y, pixel) in img.enumerate_pixels() {
        output.put_pixel(
            x,
            y,
            Rgb([
                clamp_channel(pixel[0] as f64 * factor),
                clamp_channel(pixel[1] as f64 * factor),
                clamp_channel(pixel[2] as f64 * factor),
            ]),
        );
    }

    output
}

/// Equalize the histogram of the HSV value channel, keeping hue and
/// saturation. Since V = max(r, g, b), every channel is rescaled by the
/// ratio between the equalized and the original value.
pub fn equalize_value_channel(img: &RgbImage) -> RgbImage {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return img.clone();
    }

    let value: GrayImage = ImageBuffer::from_fn(width, height, |x, y| {
        let p = img.get_pixel(x, y);
        Luma([p[0].max(p[1]).max(p[2])])
    });
    let equalized = equalize_histogram(&value);

    let mut output = RgbImage::new(width, height);
    for (x, y, pixel) in img.enumerate_pixels() {
        let old_v = value.get_pixel(x, y)[0];
        let new_v = equalized.get_pixel(x, y)[0];

        let out = if old_v == 0 {
            // Black has no hue: it maps to a neutral gray
            Rgb([new_v, new_v, new_v])
        } else {
            let scale = new_v as f64 / old_v as f64;
            Rgb([
                clamp_channel(pixel[0] as f64 * scale),
                clamp_channel(pixel[1] as f64 * scale),
                clamp_channel(pixel[2] as f64 * scale),
            ])
        };
        output.put_pixel(x, y, out);
    }

    output
}

/// `degenerate + factor * (img - degenerate)` per channel
fn blend(degenerate: &RgbImage, img: &RgbImage, factor: f64) -> RgbImage {
    let (width, height) = img.dimensions();
    let mut output = RgbImage::new(width, height);

    for (x, y, pixel) in img.enumerate_pixels() {
        let base = degenerate.get_pixel(x, y);
        let mut channels = [0u8; 3];
        for c in 0..3 {
            let d = base[c] as f64;
            channels[c] = clamp_channel(d + factor * (pixel[c] as f64 - d));
        }
        output.put_pixel(x, y, Rgb(channels));
    }

    output
}

fn smooth(img: &RgbImage) -> RgbImage {
    let (width, height) = img.dimensions();
    let mut output = img.clone();
    if width < 3 || height < 3 {
        return output;
    }

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let mut sums = [0u32; 3];
            for dy in 0..3 {
                for dx in 0..3 {
                    let weight = if dx == 1 && dy == 1 { 5 } else { 1 };
                    let p = img.get_pixel(x + dx - 1, y + dy - 1);
                    for c in 0..3 {
                        sums[c] += p[c] as u32 * weight;
                    }
                }
            }
            output.put_pixel(
                x,
                y,
                Rgb([
                    clamp_channel(sums[0] as f64 / 13.0),
                    clamp_channel(sums[1] as f64 / 13.0),
                    clamp_channel(sums[2] as f64 / 13.0),
                ]),
            );
        }
    }

    output
}

fn mean_gray_level(img: &RgbImage) -> u8 {
    let gray = to_gray(img);
    let count = gray.width() as u64 * gray.height() as u64;
    if count == 0 {
        return 0;
    }

    let sum: u64 = gray.pixels().map(|p| p[0] as u64).sum();
    clamp_channel(sum as f64 / count as f64)
}

fn clamp_channel(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_image() -> RgbImage {
        ImageBuffer::from_fn(16, 12, |x, y| {
            Rgb([
                (x * 15) as u8,
                (y * 20) as u8,
                ((x * 7 + y * 11) % 256) as u8,
            ])
        })
    }

    fn channel_std_dev(img: &RgbImage) -> f64 {
        let values: Vec<f64> = img.pixels().flat_map(|p| p.0).map(|v| v as f64).collect();
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64).sqrt()
    }

    #[test]
    fn test_identity_factors() {
        let img = create_test_image();
        assert_eq!(enhance(&img, 1.0, 1.0, 1.0), img);
    }

    #[test]
    fn test_contrast_applied_before_brightness() {
        let img = create_test_image();
        let expected = apply_brightness(&apply_contrast(&apply_sharpness(&img, 1.4), 1.5), 0.8);
        assert_eq!(enhance(&img, 1.4, 0.8, 1.5), expected);
    }

    #[test]
    fn test_brightness_zero_is_black() {
        let img = create_test_image();
        let black = apply_brightness(&img, 0.0);
        assert!(black.pixels().all(|p| p.0 == [0, 0, 0]));
    }

    #[test]
    fn test_brightness_scales_channels() {
        let img: RgbImage = ImageBuffer::from_pixel(2, 2, Rgb([100, 50, 200]));
        let brighter = apply_brightness(&img, 1.2);
        assert_eq!(brighter.get_pixel(0, 0).0, [120, 60, 240]);

        // Saturates instead of wrapping
        let much_brighter = apply_brightness(&img, 2.0);
        assert_eq!(much_brighter.get_pixel(0, 0).0, [200, 100, 255]);
    }

    #[test]
    fn test_contrast_zero_is_uniform_gray() {
        let img = create_test_image();
        let flat = apply_contrast(&img, 0.0);
        let first = *flat.get_pixel(0, 0);
        assert!(flat.pixels().all(|p| *p == first));
        assert_eq!(first[0], first[1]);
        assert_eq!(first[1], first[2]);
    }

    #[test]
    fn test_contrast_increase_spreads_values() {
        let img = create_test_image();
        let boosted = apply_contrast(&img, 1.5);
        let reduced = apply_contrast(&img, 0.5);

        assert!(channel_std_dev(&boosted) > channel_std_dev(&img));
        assert!(channel_std_dev(&reduced) < channel_std_dev(&img));
    }

    #[test]
    fn test_sharpness_changes_interior_only() {
        let img: RgbImage = ImageBuffer::from_fn(8, 8, |x, y| {
            if x == 4 && y == 4 {
                Rgb([255, 255, 255])
            } else {
                Rgb([0, 0, 0])
            }
        });

        let sharpened = apply_sharpness(&img, 2.0);
        // Border pixels are never filtered
        assert_eq!(sharpened.get_pixel(0, 0), img.get_pixel(0, 0));
        // The neighbour gets darker (clamped at 0), the peak stays saturated
        assert_eq!(sharpened.get_pixel(4, 4).0, [255, 255, 255]);

        let softened = apply_sharpness(&img, 0.0);
        // 255 * 5 / 13 = 98
        assert_eq!(softened.get_pixel(4, 4).0, [98, 98, 98]);
        // 255 / 13 = 20
        assert_eq!(softened.get_pixel(3, 4).0, [20, 20, 20]);
    }

    #[test]
    fn test_small_image_sharpness_is_noop() {
        let img: RgbImage = ImageBuffer::from_pixel(2, 2, Rgb([10, 20, 30]));
        assert_eq!(apply_sharpness(&img, 1.6), img);
    }

    #[test]
    fn test_equalize_stretches_value_range() {
        let img: RgbImage = ImageBuffer::from_fn(16, 16, |x, _| {
            let v = 100 + (x as u8) * 2;
            Rgb([v, v / 2, v / 4])
        });

        let equalized = equalize_value_channel(&img);
        let max_v = equalized
            .pixels()
            .map(|p| p[0].max(p[1]).max(p[2]))
            .max()
            .unwrap();
        assert_eq!(max_v, 255);

        // Hue is preserved: red stays the dominant channel
        for p in equalized.pixels() {
            assert!(p[0] >= p[1] && p[1] >= p[2]);
        }
    }

    #[test]
    fn test_enhance_with_config_uses_factors() {
        let img = create_test_image();
        let config = EnhancementConfig {
            sharpness_factor: 1.0,
            brightness_factor: 1.0,
            contrast_factor: 1.0,
            equalize_histogram: false,
            ..Default::default()
        };
        assert_eq!(enhance_with_config(&img, &config), img);

        let config = EnhancementConfig {
            brightness_factor: 0.0,
            ..config
        };
        assert!(enhance_with_config(&img, &config)
            .pixels()
            .all(|p| p.0 == [0, 0, 0]));
    }
}
