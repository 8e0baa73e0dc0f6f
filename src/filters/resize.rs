//! Bilinear resampling.
//!
//! Sample positions use half-pixel centers, `src = (dst + 0.5) * scale - 0.5`,
//! with indices clamped at the image edges. No area averaging is done when
//! shrinking, matching the usual "linear" interpolation of vision libraries.

use ndarray::{Array3, ArrayView3};
use rayon::prelude::*;

use super::core::saturate_u8;

/// Source taps and fractional weight for one output coordinate.
#[derive(Debug, Clone, Copy)]
struct Tap {
    lo: usize,
    hi: usize,
    frac: f32,
}

fn compute_taps(src_len: usize, dst_len: usize) -> Vec<Tap> {
    let scale = src_len as f64 / dst_len as f64;
    (0..dst_len)
        .map(|d| {
            let pos = (d as f64 + 0.5) * scale - 0.5;
            let mut lo = pos.floor();
            let mut frac = pos - lo;
            if lo < 0.0 {
                lo = 0.0;
                frac = 0.0;
            }
            let mut lo = lo as usize;
            if lo >= src_len - 1 {
                lo = src_len - 1;
                frac = 0.0;
            }
            Tap {
                lo,
                hi: (lo + 1).min(src_len - 1),
                frac: frac as f32,
            }
        })
        .collect()
}

/// Resize an image with bilinear interpolation - u8 version.
///
/// # Arguments
/// * `input` - Image with any channel count (height, width, channels), non-empty
/// * `width` - Output width
/// * `height` - Output height
///
/// # Returns
/// Resized image (height, width, channels)
pub fn resize_bilinear_u8(input: ArrayView3<u8>, width: usize, height: usize) -> Array3<u8> {
    let (src_h, src_w, channels) = input.dim();
    if src_h == 0 || src_w == 0 || width == 0 || height == 0 {
        return Array3::zeros((height, width, channels));
    }

    let x_taps = compute_taps(src_w, width);
    let y_taps = compute_taps(src_h, height);

    let mut output_flat = vec![0u8; height * width * channels];
    output_flat
        .par_chunks_mut(width * channels)
        .enumerate()
        .for_each(|(y, row)| {
            let ty = y_taps[y];
            for (x, tx) in x_taps.iter().enumerate() {
                for c in 0..channels {
                    let top = input[[ty.lo, tx.lo, c]] as f32 * (1.0 - tx.frac)
                        + input[[ty.lo, tx.hi, c]] as f32 * tx.frac;
                    let bottom = input[[ty.hi, tx.lo, c]] as f32 * (1.0 - tx.frac)
                        + input[[ty.hi, tx.hi, c]] as f32 * tx.frac;
                    row[x * channels + c] = saturate_u8(top * (1.0 - ty.frac) + bottom * ty.frac);
                }
            }
        });

    Array3::from_shape_vec((height, width, channels), output_flat)
        .expect("Shape mismatch in resize_bilinear_u8")
}
