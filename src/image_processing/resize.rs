use fast_image_resize::{images::Image, FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};
use image::RgbImage;
use std::num::NonZeroU32;

use crate::error::EnhanceError;

/// Target dimensions for fitting `width` x `height` inside a
/// `max_dim` x `max_dim` box. Aspect ratio is preserved and the image is
/// never upscaled.
pub fn fit_dimensions(width: u32, height: u32, max_dim: u32) -> (u32, u32) {
    if width <= max_dim && height <= max_dim {
        return (width, height);
    }

    if width >= height {
        let scaled = (height as f64 * max_dim as f64 / width as f64).round() as u32;
        (max_dim, scaled.clamp(1, max_dim))
    } else {
        let scaled = (width as f64 * max_dim as f64 / height as f64).round() as u32;
        (scaled.clamp(1, max_dim), max_dim)
    }
}

/// Downscale so that neither side exceeds `max_dim`, using Lanczos3
/// resampling. Images already within bounds are returned unchanged.
pub fn resize_to_fit(img: &RgbImage, max_dim: u32) -> Result<RgbImage, EnhanceError> {
    let (src_width, src_height) = img.dimensions();
    let (width, height) = fit_dimensions(src_width, src_height, max_dim);

    if (width, height) == (src_width, src_height) {
        return Ok(img.clone());
    }

    resize_image(img, width, height)
}

/// Resize an image to exact dimensions using high-quality algorithm
fn resize_image(img: &RgbImage, width: u32, height: u32) -> Result<RgbImage, EnhanceError> {
    let (src_width, src_height) = img.dimensions();

    let src_width_nz = NonZeroU32::new(src_width)
        .ok_or_else(|| EnhanceError::Resize("source width is zero".to_string()))?;
    let src_height_nz = NonZeroU32::new(src_height)
        .ok_or_else(|| EnhanceError::Resize("source height is zero".to_string()))?;
    let dst_width_nz = NonZeroU32::new(width)
        .ok_or_else(|| EnhanceError::Resize("target width is zero".to_string()))?;
    let dst_height_nz = NonZeroU32::new(height)
        .ok_or_else(|| EnhanceError::Resize("target height is zero".to_string()))?;

    let src_image = Image::from_vec_u8(
        src_width_nz.get(),
        src_height_nz.get(),
        img.as_raw().clone(),
        PixelType::U8x3,
    )
    .map_err(|e| EnhanceError::Resize(e.to_string()))?;

    let mut dst_image = Image::new(dst_width_nz.get(), dst_height_nz.get(), PixelType::U8x3);

    let options =
        ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Lanczos3));
    let mut resizer = Resizer::new();
    resizer
        .resize(&src_image, &mut dst_image, &options)
        .map_err(|e| EnhanceError::Resize(e.to_string()))?;

    RgbImage::from_raw(width, height, dst_image.buffer().to_vec()).ok_or_else(|| {
        EnhanceError::Resize(format!(
            "resized buffer does not match {}x{} RGB",
            width, height
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    fn create_test_image(width: u32, height: u32) -> RgbImage {
        ImageBuffer::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
        })
    }

    #[test]
    fn test_fit_dimensions() {
        assert_eq!(fit_dimensions(4000, 3000, 2048), (2048, 1536));
        assert_eq!(fit_dimensions(3000, 4000, 2048), (1536, 2048));
        assert_eq!(fit_dimensions(5000, 5000, 1000), (1000, 1000));
        assert_eq!(fit_dimensions(800, 600, 2048), (800, 600));
        assert_eq!(fit_dimensions(2048, 100, 2048), (2048, 100));
        // Extreme aspect ratios never collapse to zero
        assert_eq!(fit_dimensions(10000, 1, 100), (100, 1));
    }

    #[test]
    fn test_within_bounds_is_unchanged() {
        let img = create_test_image(120, 80);
        let resized = resize_to_fit(&img, 200).unwrap();
        assert_eq!(resized, img);
    }

    #[test]
    fn test_landscape_downscale() {
        let img = create_test_image(400, 200);
        let resized = resize_to_fit(&img, 100).unwrap();
        assert_eq!(resized.dimensions(), (100, 50));
    }

    #[test]
    fn test_portrait_downscale() {
        let img = create_test_image(90, 300);
        let resized = resize_to_fit(&img, 150).unwrap();
        assert_eq!(resized.dimensions(), (45, 150));
    }

    #[test]
    fn test_never_grows() {
        for (w, h) in [(10, 10), (300, 20), (20, 300), (257, 256)] {
            let img = create_test_image(w, h);
            let resized = resize_to_fit(&img, 256).unwrap();
            let (rw, rh) = resized.dimensions();
            assert!(rw <= w && rh <= h);
            assert!(rw <= 256 && rh <= 256);
        }
    }

    #[test]
    fn test_uniform_color_survives_resampling() {
        let img: RgbImage = ImageBuffer::from_pixel(64, 64, Rgb([10, 120, 240]));
        let resized = resize_to_fit(&img, 16).unwrap();
        assert_eq!(resized.dimensions(), (16, 16));
        for p in resized.pixels() {
            for (c, expected) in p.0.iter().zip([10u8, 120, 240]) {
                assert!((*c as i32 - expected as i32).abs() <= 1, "{:?}", p);
            }
        }
    }
}
