//! Gaussian blur.
//!
//! Separable 2-pass convolution with reflect-101 borders. The kernel size is
//! derived from sigma (see [`gaussian_kernel_1d`]).

use ndarray::{Array3, ArrayView3};
use rayon::prelude::*;

use super::core::{gaussian_kernel_1d, reflect101, saturate_u8};

/// Apply Gaussian blur - u8 version.
///
/// Every channel is blurred independently. The intermediate pass is kept in
/// f32 and rounded once at the end.
///
/// # Arguments
/// * `input` - Image with any channel count (height, width, channels)
/// * `sigma` - Standard deviation of the Gaussian, same in both axes
///
/// # Returns
/// Blurred image with the same shape. A copy when `sigma <= 0`.
pub fn gaussian_blur_u8(input: ArrayView3<u8>, sigma: f32) -> Array3<u8> {
    let (height, width, channels) = input.dim();
    if sigma <= 0.0 || height == 0 || width == 0 {
        return input.to_owned();
    }

    let kernel = gaussian_kernel_1d(sigma);
    let half = (kernel.len() / 2) as isize;
    let row_len = width * channels;

    // Horizontal pass
    let mut temp = vec![0.0f32; height * row_len];
    temp.par_chunks_mut(row_len)
        .enumerate()
        .for_each(|(y, row)| {
            for x in 0..width {
                for c in 0..channels {
                    let mut sum = 0.0f32;
                    for (ki, &kv) in kernel.iter().enumerate() {
                        let sx = reflect101(x as isize + ki as isize - half, width);
                        sum += input[[y, sx, c]] as f32 * kv;
                    }
                    row[x * channels + c] = sum;
                }
            }
        });

    // Vertical pass
    let mut output_flat = vec![0u8; height * row_len];
    output_flat
        .par_chunks_mut(row_len)
        .enumerate()
        .for_each(|(y, row)| {
            let rows: Vec<usize> = (0..kernel.len())
                .map(|ki| reflect101(y as isize + ki as isize - half, height))
                .collect();
            for (i, out) in row.iter_mut().enumerate() {
                let sum: f32 = rows
                    .iter()
                    .zip(kernel.iter())
                    .map(|(&sy, &kv)| temp[sy * row_len + i] * kv)
                    .sum();
                *out = saturate_u8(sum);
            }
        });

    Array3::from_shape_vec((height, width, channels), output_flat)
        .expect("Shape mismatch in gaussian_blur_u8")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blur_flat_preserved() {
        let img = Array3::<u8>::from_elem((12, 9, 3), 173);
        let result = gaussian_blur_u8(img.view(), 3.0);
        assert!(result.iter().all(|&v| v == 173));
    }

    #[test]
    fn test_blur_zero_sigma_is_copy() {
        let img = Array3::from_shape_fn((4, 4, 3), |(y, x, c)| (y * 40 + x * 10 + c) as u8);
        assert_eq!(gaussian_blur_u8(img.view(), 0.0), img);
    }

    #[test]
    fn test_blur_spreads_impulse() {
        let mut img = Array3::<u8>::zeros((21, 21, 1));
        img[[10, 10, 0]] = 255;

        let result = gaussian_blur_u8(img.view(), 1.0);

        // Peak is lowered and spread to neighbors
        assert!(result[[10, 10, 0]] < 255);
        assert!(result[[10, 11, 0]] > 0);
        assert!(result[[11, 10, 0]] > 0);
        assert_eq!(result[[10, 11, 0]], result[[10, 9, 0]]);
        // Far corner untouched
        assert_eq!(result[[0, 0, 0]], 0);
    }

    #[test]
    fn test_blur_smaller_than_kernel() {
        // 19-tap kernel over a 3x3 image relies on reflect-101 wrapping
        let img = Array3::from_shape_fn((3, 3, 3), |(y, x, _)| (y * 3 + x) as u8 * 20);
        let result = gaussian_blur_u8(img.view(), 3.0);
        assert_eq!(result.dim(), (3, 3, 3));
        let max = *img.iter().max().unwrap();
        assert!(result.iter().all(|&v| v <= max));
    }
}
