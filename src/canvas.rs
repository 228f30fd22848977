use image::codecs::png::PngEncoder;
use image::imageops::{self, FilterType};
use image::{ColorType, ImageEncoder, RgbaImage};

use crate::error::ExpandError;

// Upper bound on the RGBA buffer we are willing to allocate (1 GiB).
const MAX_CANVAS_BYTES: u64 = 1 << 30;

/// Top-left position of the original inside the target canvas.
///
/// Odd differences round towards negative infinity, so the extra pixel of
/// padding lands on the right/bottom edge. Negative values mean the original
/// is larger than the canvas on that axis and gets clipped on both sides.
pub fn centered_offset(
    original_width: u32,
    original_height: u32,
    target_width: u32,
    target_height: u32,
) -> (i64, i64) {
    let x = (target_width as i64 - original_width as i64).div_euclid(2);
    let y = (target_height as i64 - original_height as i64).div_euclid(2);
    (x, y)
}

/// Places the encoded original image, unscaled and centered, on a fully
/// transparent `target_width × target_height` canvas and returns it as PNG.
///
/// Decoding and encoding run on the blocking pool.
pub async fn composite(
    original: &[u8],
    original_width: u32,
    original_height: u32,
    target_width: u32,
    target_height: u32,
) -> Result<Vec<u8>, ExpandError> {
    let original = original.to_vec();
    tokio::task::spawn_blocking(move || {
        composite_blocking(
            &original,
            original_width,
            original_height,
            target_width,
            target_height,
        )
    })
    .await
    .map_err(|e| ExpandError::CanvasUnavailable(format!("compositing task failed: {}", e)))?
}

pub fn composite_blocking(
    original: &[u8],
    original_width: u32,
    original_height: u32,
    target_width: u32,
    target_height: u32,
) -> Result<Vec<u8>, ExpandError> {
    let mut canvas = allocate_canvas(target_width, target_height)?;

    let decoded = image::load_from_memory(original)
        .map_err(|e| ExpandError::ImageDecode(e.to_string()))?;
    if original_width == 0 || original_height == 0 {
        return Err(ExpandError::ImageDecode(
            "original image has no pixels".to_string(),
        ));
    }

    let mut source = decoded.to_rgba8();
    if source.dimensions() != (original_width, original_height) {
        log::warn!(
            "⚠ Decoded image is {}x{}, expected {}x{}; scaling to the expected size",
            source.width(),
            source.height(),
            original_width,
            original_height
        );
        source = imageops::resize(&source, original_width, original_height, FilterType::Lanczos3);
    }

    let (x, y) = centered_offset(original_width, original_height, target_width, target_height);
    log::debug!(
        "🖼 Compositing {}x{} at ({}, {}) on {}x{} canvas",
        original_width,
        original_height,
        x,
        y,
        target_width,
        target_height
    );

    // Straight copy instead of blending keeps the original's pixels bit-exact.
    imageops::replace(&mut canvas, &source, x, y);

    encode_png(&canvas)
}

fn allocate_canvas(width: u32, height: u32) -> Result<RgbaImage, ExpandError> {
    if width == 0 || height == 0 {
        return Err(ExpandError::CanvasUnavailable(format!(
            "canvas of {}x{} has no area",
            width, height
        )));
    }

    let bytes = width as u128 * height as u128 * 4;
    if bytes > MAX_CANVAS_BYTES as u128 {
        return Err(ExpandError::CanvasUnavailable(format!(
            "canvas of {}x{} needs {} MB",
            width,
            height,
            bytes / 1024 / 1024
        )));
    }

    // Zero-initialized RGBA is fully transparent.
    Ok(RgbaImage::new(width, height))
}

fn encode_png(canvas: &RgbaImage) -> Result<Vec<u8>, ExpandError> {
    let mut encoded = Vec::new();
    PngEncoder::new(&mut encoded)
        .write_image(
            canvas.as_raw(),
            canvas.width(),
            canvas.height(),
            ColorType::Rgba8,
        )
        .map_err(|e| ExpandError::CanvasUnavailable(format!("PNG encoding failed: {}", e)))?;
    Ok(encoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use proptest::prelude::*;

    fn sample_image(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x % 251) as u8, (y % 241) as u8, ((x + y) % 7) as u8 * 30, 255 - (x % 3) as u8 * 100])
        })
    }

    fn png_bytes(image: &RgbaImage) -> Vec<u8> {
        encode_png(image).unwrap()
    }

    fn decode(bytes: &[u8]) -> RgbaImage {
        image::load_from_memory(bytes).unwrap().to_rgba8()
    }

    #[test]
    fn test_centered_offset() {
        assert_eq!(centered_offset(400, 300, 400, 400), (0, 50));
        assert_eq!(centered_offset(3, 3, 6, 6), (1, 1));
        assert_eq!(centered_offset(10, 10, 6, 6), (-2, -2));
        assert_eq!(centered_offset(10, 10, 5, 5), (-3, -3));
    }

    #[test]
    fn test_square_example_keeps_original_rows() {
        let original = sample_image(400, 300);
        let output = composite_blocking(&png_bytes(&original), 400, 300, 400, 400).unwrap();
        let canvas = decode(&output);

        assert_eq!(canvas.dimensions(), (400, 400));
        for (x, y, pixel) in canvas.enumerate_pixels() {
            if (50..350).contains(&y) {
                assert_eq!(pixel, original.get_pixel(x, y - 50), "pixel {},{}", x, y);
            } else {
                assert_eq!(pixel[3], 0, "pixel {},{} should be transparent", x, y);
            }
        }
    }

    #[test]
    fn test_padding_on_every_side_is_transparent() {
        let original = sample_image(5, 3);
        let output = composite_blocking(&png_bytes(&original), 5, 3, 12, 10).unwrap();
        let canvas = decode(&output);
        let (ox, oy) = centered_offset(5, 3, 12, 10);
        assert_eq!((ox, oy), (3, 3));

        for (x, y, pixel) in canvas.enumerate_pixels() {
            let inside = (3..8).contains(&x) && (3..6).contains(&y);
            if inside {
                assert_eq!(pixel, original.get_pixel(x - 3, y - 3));
            } else {
                assert_eq!(*pixel, Rgba([0, 0, 0, 0]));
            }
        }
    }

    #[test]
    fn test_semi_transparent_pixels_survive_unchanged() {
        let mut original = sample_image(2, 2);
        original.put_pixel(0, 0, Rgba([200, 10, 60, 1]));
        original.put_pixel(1, 1, Rgba([17, 99, 3, 0]));
        let output = composite_blocking(&png_bytes(&original), 2, 2, 4, 4).unwrap();
        let canvas = decode(&output);

        assert_eq!(*canvas.get_pixel(1, 1), Rgba([200, 10, 60, 1]));
        assert_eq!(*canvas.get_pixel(2, 2), Rgba([17, 99, 3, 0]));
    }

    #[test]
    fn test_smaller_target_clips_instead_of_failing() {
        let original = sample_image(10, 10);
        let output = composite_blocking(&png_bytes(&original), 10, 10, 6, 6).unwrap();
        let canvas = decode(&output);

        assert_eq!(canvas.dimensions(), (6, 6));
        assert_eq!(canvas.get_pixel(0, 0), original.get_pixel(2, 2));
        assert_eq!(canvas.get_pixel(5, 5), original.get_pixel(7, 7));
    }

    #[test]
    fn test_undecodable_source() {
        let result = composite_blocking(b"definitely not an image", 4, 4, 8, 8);
        assert!(matches!(result, Err(ExpandError::ImageDecode(_))));
    }

    #[test]
    fn test_zero_area_canvas() {
        let original = sample_image(2, 2);
        let result = composite_blocking(&png_bytes(&original), 2, 2, 0, 8);
        assert!(matches!(result, Err(ExpandError::CanvasUnavailable(_))));
    }

    #[test]
    fn test_oversized_canvas() {
        let original = sample_image(2, 2);
        let result = composite_blocking(&png_bytes(&original), 2, 2, u32::MAX, u32::MAX);
        assert!(matches!(result, Err(ExpandError::CanvasUnavailable(_))));
    }

    #[tokio::test]
    async fn test_async_composite_matches_blocking() {
        let original = png_bytes(&sample_image(7, 4));
        let expected = composite_blocking(&original, 7, 4, 16, 9).unwrap();
        let actual = composite(&original, 7, 4, 16, 9).await.unwrap();
        assert_eq!(decode(&actual), decode(&expected));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn original_is_centered_on_transparent_padding(
            w in 1u32..12,
            h in 1u32..12,
            pad_x in 0u32..9,
            pad_y in 0u32..9,
        ) {
            let original = sample_image(w, h);
            let output = composite_blocking(&png_bytes(&original), w, h, w + pad_x, h + pad_y).unwrap();
            let canvas = decode(&output);
            let (ox, oy) = (pad_x / 2, pad_y / 2);

            prop_assert_eq!(canvas.dimensions(), (w + pad_x, h + pad_y));
            for (x, y, pixel) in canvas.enumerate_pixels() {
                let inside = (ox..ox + w).contains(&x) && (oy..oy + h).contains(&y);
                if inside {
                    prop_assert_eq!(pixel, original.get_pixel(x - ox, y - oy));
                } else {
                    prop_assert_eq!(pixel[3], 0);
                }
            }
        }
    }
}
