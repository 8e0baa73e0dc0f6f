//! The fixed CLIP preprocessing pipeline.
//!
//! Stages, in order:
//! 1. Decode to BGR at native resolution
//! 2. Bilinear resize to 224×224
//! 3. Colored non-local means (h = 5 for luminance and color, 7 / 21 windows)
//! 4. Unsharp mask: `1.5 · denoised − 0.5 · gaussian(denoised, σ = 3)`
//! 5. BGR -> RGB
//!
//! Only stage 1 can fail.

use std::path::Path;
use std::time::Instant;

use ndarray::{Array3, ArrayView3};

use crate::decode::{decode_bgr, load_bgr};
use crate::error::Result;
use crate::filters::color_science::swap_red_blue_u8;
use crate::filters::noise::nl_means_colored_u8;
use crate::filters::resize::resize_bilinear_u8;
use crate::filters::sharpen::unsharp_mask_u8;

/// Side length of the square model input.
pub const TARGET_SIZE: usize = 224;

/// Constants of the transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineParams {
    pub target_width: usize,
    pub target_height: usize,
    /// NL-means strength for the L plane
    pub h_luminance: f32,
    /// NL-means strength for the a/b planes
    pub h_color: f32,
    pub template_window: usize,
    pub search_window: usize,
    pub blur_sigma: f32,
    /// Unsharp mask gain: `(1 + amount) · x − amount · blur(x)`
    pub sharpen_amount: f32,
}

impl PipelineParams {
    /// Parameters expected by CLIP ViT-B/32 style encoders.
    pub const CLIP: PipelineParams = PipelineParams {
        target_width: TARGET_SIZE,
        target_height: TARGET_SIZE,
        h_luminance: 5.0,
        h_color: 5.0,
        template_window: 7,
        search_window: 21,
        blur_sigma: 3.0,
        sharpen_amount: 0.5,
    };
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self::CLIP
    }
}

/// Preprocess the image file at `path` into a 224×224×3 RGB array.
///
/// # Errors
/// [`PreprocessError::Decode`](crate::PreprocessError::Decode) when the file
/// is missing, unreadable, corrupt, unsupported or empty.
pub fn preprocess_image(path: impl AsRef<Path>) -> Result<Array3<u8>> {
    let path = path.as_ref();
    tracing::debug!("Preprocessing: {:?}", path);
    let start = Instant::now();

    let bgr = load_bgr(path).inspect_err(|e| tracing::warn!("{}", e))?;
    tracing::trace!("  Decode: {:?} ({}x{})", start.elapsed(), bgr.dim().1, bgr.dim().0);

    let rgb = run_stages(bgr.view(), &PipelineParams::CLIP);
    tracing::debug!("Preprocessed {:?} in {:?}", path, start.elapsed());
    Ok(rgb)
}

/// Preprocess an encoded image held in memory into a 224×224×3 RGB array.
///
/// # Errors
/// [`PreprocessError::DecodeBuffer`](crate::PreprocessError::DecodeBuffer)
/// when the bytes are not a decodable, non-empty image.
pub fn preprocess_image_bytes(data: &[u8]) -> Result<Array3<u8>> {
    tracing::debug!("Preprocessing {} byte buffer", data.len());
    let start = Instant::now();

    let bgr = decode_bgr(data).inspect_err(|e| tracing::warn!("{}", e))?;
    tracing::trace!("  Decode: {:?} ({}x{})", start.elapsed(), bgr.dim().1, bgr.dim().0);

    let rgb = run_stages(bgr.view(), &PipelineParams::CLIP);
    tracing::debug!("Preprocessed buffer in {:?}", start.elapsed());
    Ok(rgb)
}

/// Stages 2-5 on an already decoded BGR image. Infallible.
pub(crate) fn run_stages(bgr: ArrayView3<u8>, params: &PipelineParams) -> Array3<u8> {
    let t = Instant::now();
    let resized = resize_bilinear_u8(bgr, params.target_width, params.target_height);
    tracing::trace!("  Resize: {:?}", t.elapsed());

    let t = Instant::now();
    let denoised = nl_means_colored_u8(
        resized.view(),
        params.h_luminance,
        params.h_color,
        params.template_window,
        params.search_window,
    );
    tracing::trace!("  Denoise: {:?}", t.elapsed());

    let t = Instant::now();
    let sharpened = unsharp_mask_u8(denoised.view(), params.blur_sigma, params.sharpen_amount);
    tracing::trace!("  Sharpen: {:?}", t.elapsed());

    swap_red_blue_u8(sharpened.view())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PreprocessError;
    use crate::filters::blur::gaussian_blur_u8;
    use crate::filters::sharpen::add_weighted_u8;
    use image::{GrayImage, Luma, Rgb, RgbImage, Rgba, RgbaImage};
    use std::io::Cursor;

    fn write_png(dir: &Path, name: &str, img: &RgbImage) -> std::path::PathBuf {
        let path = dir.join(name);
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn test_clip_params() {
        let p = PipelineParams::default();
        assert_eq!((p.target_width, p.target_height), (224, 224));
        assert_eq!((p.template_window, p.search_window), (7, 21));
        assert_eq!(p.sharpen_amount, 0.5);
    }

    #[test]
    fn test_sharpen_stage_is_weighted_sum() {
        // 1.5 · x − 0.5 · gaussian(x, 3) + 0
        let img =
            Array3::from_shape_fn((32, 32, 3), |(y, x, c)| ((x * 9 + y * 5 + c * 40) % 256) as u8);
        let p = PipelineParams::CLIP;

        let blurred = gaussian_blur_u8(img.view(), p.blur_sigma);
        let expected = add_weighted_u8(img.view(), 1.5, blurred.view(), -0.5, 0.0);
        assert_eq!(unsharp_mask_u8(img.view(), p.blur_sigma, p.sharpen_amount), expected);
    }

    #[test]
    fn test_black_wide_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "black.png", &RgbImage::new(1000, 500));

        let out = preprocess_image(&path).unwrap();
        assert_eq!(out.dim(), (224, 224, 3));
        assert!(out.is_standard_layout());
        assert!(out.iter().all(|&v| v <= 2));
    }

    #[test]
    fn test_shape_independent_of_input_size() {
        let dir = tempfile::tempdir().unwrap();
        for (i, &(w, h)) in [(17, 301), (224, 224), (50, 40)].iter().enumerate() {
            let img = RgbImage::from_fn(w, h, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 90]));
            let path = write_png(dir.path(), &format!("img{i}.png"), &img);
            assert_eq!(preprocess_image(&path).unwrap().dim(), (224, 224, 3));
        }
    }

    #[test]
    fn test_grayscale_png_gives_three_channels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gray.png");
        GrayImage::from_fn(90, 70, |x, y| Luma([((x + y) * 2) as u8])).save(&path).unwrap();

        let out = preprocess_image(&path).unwrap();
        assert_eq!(out.dim(), (224, 224, 3));
    }

    #[test]
    fn test_rgba_png_gives_three_channels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rgba.png");
        RgbaImage::from_fn(40, 100, |x, y| Rgba([x as u8 * 5, y as u8, 77, (x * 6) as u8]))
            .save(&path)
            .unwrap();

        let out = preprocess_image(&path).unwrap();
        assert_eq!(out.dim(), (224, 224, 3));
    }

    #[test]
    fn test_blue_input_ends_up_in_channel_two() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(
            dir.path(),
            "blue.png",
            &RgbImage::from_pixel(64, 48, Rgb([0, 0, 255])),
        );

        // Decoder yields BGR: blue is channel 0
        let bgr = load_bgr(&path).unwrap();
        assert_eq!(bgr[[0, 0, 0]], 255);

        let out = preprocess_image(&path).unwrap();
        assert!(out[[112, 112, 2]] > 230);
        assert!(out[[112, 112, 0]] < 25);
    }

    #[test]
    fn test_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let img = RgbImage::from_fn(120, 90, |x, y| {
            let v = ((x * 7 + y * 13) % 251) as u8;
            Rgb([v, v.wrapping_mul(3), 255 - v])
        });
        let path = write_png(dir.path(), "pattern.png", &img);

        let a = preprocess_image(&path).unwrap();
        let b = preprocess_image(&path).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_missing_file_is_decode_error() {
        let err = preprocess_image("/no/such/dir/photo.jpg").unwrap_err();
        assert!(matches!(err, PreprocessError::Decode { .. }));
    }

    #[test]
    fn test_bytes_match_file() {
        let dir = tempfile::tempdir().unwrap();
        let img = RgbImage::from_fn(80, 60, |x, y| Rgb([(x * 3) as u8, (y * 4) as u8, 128]));
        let path = write_png(dir.path(), "same.png", &img);

        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();

        assert_eq!(preprocess_image(&path).unwrap(), preprocess_image_bytes(&bytes).unwrap());
    }

    #[test]
    fn test_garbage_bytes_is_decode_error() {
        let err = preprocess_image_bytes(&[0u8; 32]).unwrap_err();
        assert!(err.is_decode());
    }
}
