//! Sharpen filters: weighted addition and unsharp mask.
//!
//! All arithmetic saturates to 0-255 (round half to even). Values never wrap.

use ndarray::{Array3, ArrayView3, Zip};

use super::blur::gaussian_blur_u8;
use super::core::saturate_u8;

/// Per-element `saturate(a * alpha + b * beta + gamma)` - u8 version.
///
/// # Panics
/// If `a` and `b` differ in shape.
pub fn add_weighted_u8(
    a: ArrayView3<u8>,
    alpha: f32,
    b: ArrayView3<u8>,
    beta: f32,
    gamma: f32,
) -> Array3<u8> {
    let mut output = Array3::<u8>::zeros(a.raw_dim());
    Zip::from(&mut output)
        .and(&a)
        .and(&b)
        .for_each(|out, &va, &vb| {
            *out = saturate_u8(va as f32 * alpha + vb as f32 * beta + gamma);
        });
    output
}

/// Apply unsharp mask - u8 version.
///
/// Computes `(1 + amount) * input - amount * blur(input)`, i.e. the input plus
/// `amount` times its high-frequency residual.
///
/// # Arguments
/// * `input` - Image with any channel count (height, width, channels)
/// * `sigma` - Gaussian blur sigma used for the mask
/// * `amount` - Residual gain (0.5 gives `1.5 * x - 0.5 * blur`)
///
/// # Returns
/// Sharpened image with the same shape
pub fn unsharp_mask_u8(input: ArrayView3<u8>, sigma: f32, amount: f32) -> Array3<u8> {
    let blurred = gaussian_blur_u8(input, sigma);
    add_weighted_u8(input, 1.0 + amount, blurred.view(), -amount, 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_weighted_saturates() {
        let a = Array3::<u8>::from_elem((1, 2, 1), 250);
        let mut b = Array3::<u8>::zeros((1, 2, 1));
        b[[0, 1, 0]] = 255;

        let result = add_weighted_u8(a.view(), 1.5, b.view(), -0.5, 0.0);

        // 375 clamps high, 247.5 rounds to even
        assert_eq!(result[[0, 0, 0]], 255);
        assert_eq!(result[[0, 1, 0]], 248);
    }

    #[test]
    fn test_add_weighted_clamps_low() {
        let a = Array3::<u8>::from_elem((1, 1, 3), 10);
        let b = Array3::<u8>::from_elem((1, 1, 3), 200);

        let result = add_weighted_u8(a.view(), 1.5, b.view(), -0.5, 0.0);
        assert!(result.iter().all(|&v| v == 0));
    }

    #[test]
    fn test_unsharp_mask_preserves_flat() {
        let img = Array3::<u8>::from_elem((10, 10, 3), 128);
        let result = unsharp_mask_u8(img.view(), 3.0, 0.5);
        assert!(result.iter().all(|&v| v == 128));
    }

    #[test]
    fn test_unsharp_mask_steepens_edge() {
        let img = Array3::from_shape_fn((8, 16, 1), |(_, x, _)| if x < 8 { 60u8 } else { 180 });

        let result = unsharp_mask_u8(img.view(), 3.0, 0.5);

        // Dark side darkens and bright side brightens next to the edge
        assert!(result[[4, 7, 0]] < 60);
        assert!(result[[4, 8, 0]] > 180);
    }
}
