//! Color space conversions: BGR <-> CIELAB and channel reordering.
//!
//! ## 8-bit Lab encoding
//!
//! | Channel | Range | Encoding |
//! |---------|-------|----------|
//! | L | 0-100 | `L * 255 / 100` |
//! | a | about -127 to 127 | `a + 128` |
//! | b | about -127 to 127 | `b + 128` |
//!
//! BGR values are treated as linear light (no sRGB gamma) with the D65 white
//! point, so dark tones keep a wide spread of L values.

use ndarray::{Array3, ArrayView3};
use rayon::prelude::*;

use super::core::saturate_u8;

const WHITE_X: f32 = 0.950456;
const WHITE_Z: f32 = 1.088754;

/// CIE epsilon (216/24389) and kappa (24389/27) in their usual rounded forms.
const LAB_EPSILON: f32 = 0.008856;
const LAB_KAPPA: f32 = 903.3;

// ============================================================================
// Per-pixel conversions
// ============================================================================

#[inline]
fn lab_f(t: f32) -> f32 {
    if t > LAB_EPSILON {
        t.cbrt()
    } else {
        7.787 * t + 16.0 / 116.0
    }
}

#[inline]
fn lab_f_inv(f: f32) -> f32 {
    let cube = f * f * f;
    if cube > LAB_EPSILON {
        cube
    } else {
        (f - 16.0 / 116.0) / 7.787
    }
}

/// Convert one 8-bit linear BGR pixel to 8-bit Lab.
#[inline]
fn bgr_to_lab_pixel(b: u8, g: u8, r: u8) -> [u8; 3] {
    let r = r as f32 / 255.0;
    let g = g as f32 / 255.0;
    let b = b as f32 / 255.0;

    let x = (0.412453 * r + 0.357580 * g + 0.180423 * b) / WHITE_X;
    let y = 0.212671 * r + 0.715160 * g + 0.072169 * b;
    let z = (0.019334 * r + 0.119193 * g + 0.950227 * b) / WHITE_Z;

    let (fx, fy, fz) = (lab_f(x), lab_f(y), lab_f(z));
    let l = if y > LAB_EPSILON {
        116.0 * fy - 16.0
    } else {
        LAB_KAPPA * y
    };
    let a = 500.0 * (fx - fy);
    let bb = 200.0 * (fy - fz);

    [
        saturate_u8(l * 255.0 / 100.0),
        saturate_u8(a + 128.0),
        saturate_u8(bb + 128.0),
    ]
}

/// Convert one 8-bit Lab pixel to 8-bit linear BGR.
#[inline]
fn lab_to_bgr_pixel(l: u8, a: u8, b: u8) -> [u8; 3] {
    let l = l as f32 * 100.0 / 255.0;
    let a = a as f32 - 128.0;
    let bb = b as f32 - 128.0;

    let y = if l > LAB_KAPPA * LAB_EPSILON {
        let fy = (l + 16.0) / 116.0;
        fy * fy * fy
    } else {
        l / LAB_KAPPA
    };
    let fy = lab_f(y);
    let x = lab_f_inv(fy + a / 500.0) * WHITE_X;
    let z = lab_f_inv(fy - bb / 200.0) * WHITE_Z;

    let r = 3.240479 * x - 1.537150 * y - 0.498535 * z;
    let g = -0.969256 * x + 1.875991 * y + 0.041556 * z;
    let b = 0.055648 * x - 0.204043 * y + 1.057311 * z;

    let encode = |c: f32| saturate_u8(c.clamp(0.0, 1.0) * 255.0);
    [encode(b), encode(g), encode(r)]
}

// ============================================================================
// Image conversions
// ============================================================================

fn map_pixels_3(input: ArrayView3<u8>, f: impl Fn(u8, u8, u8) -> [u8; 3] + Sync) -> Array3<u8> {
    let (height, width, channels) = input.dim();
    assert_eq!(channels, 3, "expected a 3-channel image");

    let mut output_flat = vec![0u8; height * width * 3];
    output_flat
        .par_chunks_mut(width * 3)
        .enumerate()
        .for_each(|(y, row)| {
            for x in 0..width {
                let px = f(input[[y, x, 0]], input[[y, x, 1]], input[[y, x, 2]]);
                row[x * 3..x * 3 + 3].copy_from_slice(&px);
            }
        });

    Array3::from_shape_vec((height, width, 3), output_flat)
        .expect("Shape mismatch in color conversion")
}

/// Convert a BGR u8 image to 8-bit Lab (L, a, b channel order).
///
/// # Panics
/// If the image does not have exactly 3 channels.
pub fn bgr_to_lab_u8(input: ArrayView3<u8>) -> Array3<u8> {
    map_pixels_3(input, bgr_to_lab_pixel)
}

/// Convert an 8-bit Lab image back to BGR u8.
///
/// # Panics
/// If the image does not have exactly 3 channels.
pub fn lab_to_bgr_u8(input: ArrayView3<u8>) -> Array3<u8> {
    map_pixels_3(input, lab_to_bgr_pixel)
}

/// Swap channels 0 and 2 (BGR <-> RGB, BGRA <-> RGBA).
///
/// Values are not transformed. Images with fewer than 3 channels are copied.
/// The result is always in standard layout.
pub fn swap_red_blue_u8(input: ArrayView3<u8>) -> Array3<u8> {
    let channels = input.dim().2;
    if channels < 3 {
        return input.as_standard_layout().into_owned();
    }
    Array3::from_shape_fn(input.raw_dim(), |(y, x, c)| {
        let src = match c {
            0 => 2,
            2 => 0,
            other => other,
        };
        input[[y, x, src]]
    })
}
