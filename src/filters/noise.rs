//! Noise filters: non-local means denoising.
//!
//! Each output pixel is a weighted average of the pixels in a search window
//! around it. A candidate's weight depends on how similar the template patch
//! around it is to the template patch around the output pixel:
//!
//! `w = exp(-d / (h² · channels))`, where `d` is the mean squared difference
//! over the template window. Weights below 0.001 are dropped.
//!
//! ## Supported Formats
//!
//! - [`nl_means_u8`]: any channel count, all channels compared jointly
//! - [`nl_means_colored_u8`]: BGR, denoised in Lab space with separate
//!   strengths for luminance and chroma
//!
//! Weights are fixed-point integers and accumulation is integer, so the
//! result is identical whatever order the search offsets are reduced in.

use ndarray::{concatenate, s, Array3, ArrayView3, Axis};
use rayon::prelude::*;

use super::color_science::{bgr_to_lab_u8, lab_to_bgr_u8};
use super::core::{odd_window, reflect101};

/// Fixed-point scale for patch weights.
const WEIGHT_SCALE: f64 = (1u64 << 16) as f64;

/// Relative weight below which a candidate patch is ignored.
const WEIGHT_THRESHOLD: f64 = 0.001;

// ============================================================================
// Weight table
// ============================================================================

/// Fixed-point weights indexed by the template's sum of squared differences.
///
/// Anything past the end of the table has zero weight.
fn build_weight_table(h: f32, channels: usize, template_area: usize) -> Vec<i64> {
    let denom = h as f64 * h as f64 * channels as f64;
    let max_ssd = 255 * 255 * channels * template_area;
    // Smallest mean distance whose weight falls under the threshold
    let cutoff_dist = denom * (1.0 / WEIGHT_THRESHOLD).ln();
    let table_len = ((cutoff_dist * template_area as f64).ceil() as usize + 1).min(max_ssd + 1);

    (0..table_len)
        .map(|ssd| {
            let dist = ssd as f64 / template_area as f64;
            let w = (-dist / denom).exp();
            if w < WEIGHT_THRESHOLD {
                0
            } else {
                (w * WEIGHT_SCALE).round() as i64
            }
        })
        .collect()
}

// ============================================================================
// Accumulator
// ============================================================================

/// Weighted sums for every output pixel.
struct Accumulator {
    values: Vec<i64>,
    weights: Vec<i64>,
}

impl Accumulator {
    fn new(pixels: usize, channels: usize) -> Self {
        Accumulator {
            values: vec![0; pixels * channels],
            weights: vec![0; pixels],
        }
    }

    fn merge(mut self, other: Accumulator) -> Self {
        for (a, b) in self.values.iter_mut().zip(other.values) {
            *a += b;
        }
        for (a, b) in self.weights.iter_mut().zip(other.weights) {
            *a += b;
        }
        self
    }
}

/// Interleaved pixels padded with reflect-101 borders on both spatial axes.
struct Padded {
    data: Vec<u8>,
    width: usize,
    channels: usize,
}

impl Padded {
    fn new(input: ArrayView3<u8>, border: usize) -> Self {
        let (height, width, channels) = input.dim();
        let padded_h = height + 2 * border;
        let padded_w = width + 2 * border;
        let b = border as isize;

        let mut data = Vec::with_capacity(padded_h * padded_w * channels);
        for y in 0..padded_h {
            let sy = reflect101(y as isize - b, height);
            for x in 0..padded_w {
                let sx = reflect101(x as isize - b, width);
                data.extend((0..channels).map(|c| input[[sy, sx, c]]));
            }
        }

        Padded {
            data,
            width: padded_w,
            channels,
        }
    }

    /// Channel values of the pixel at (y, x).
    #[inline]
    fn pixel(&self, y: usize, x: usize) -> &[u8] {
        let start = (y * self.width + x) * self.channels;
        &self.data[start..start + self.channels]
    }
}

// ============================================================================
// Non-local means
// ============================================================================

/// Apply non-local means denoising - u8 version.
///
/// All channels are compared jointly (the squared difference is summed over
/// channels) and share one weight per candidate.
///
/// # Arguments
/// * `input` - Image with any channel count (height, width, channels)
/// * `h` - Filter strength. Larger removes more noise and more detail
/// * `template_window` - Patch size used for similarity (odd, typically 7)
/// * `search_window` - Neighborhood searched for similar patches (odd, typically 21)
///
/// # Returns
/// Denoised image with the same shape. A copy when `h <= 0`.
pub fn nl_means_u8(
    input: ArrayView3<u8>,
    h: f32,
    template_window: usize,
    search_window: usize,
) -> Array3<u8> {
    let (height, width, channels) = input.dim();
    if h <= 0.0 || height == 0 || width == 0 || channels == 0 {
        return input.to_owned();
    }

    let t = odd_window(template_window) / 2;
    let s = odd_window(search_window) / 2;
    let border = s + t;
    let padded = Padded::new(input, border);

    let template_side = 2 * t + 1;
    let table = build_weight_table(h, channels, template_side * template_side);

    // Squared-difference field covers every template position of every
    // output pixel: (height + 2t) x (width + 2t), anchored at padded (s, s)
    let field_h = height + 2 * t;
    let field_w = width + 2 * t;

    let offsets: Vec<(isize, isize)> = (-(s as isize)..=s as isize)
        .flat_map(|dy| (-(s as isize)..=s as isize).map(move |dx| (dy, dx)))
        .collect();

    let acc = offsets
        .par_iter()
        .fold(
            || Accumulator::new(height * width, channels),
            |mut acc, &(dy, dx)| {
                // Integral image of the squared difference for this offset
                let stride = field_w + 1;
                let mut integral = vec![0i64; (field_h + 1) * stride];
                for i in 0..field_h {
                    let py = i + s;
                    let qy = (py as isize + dy) as usize;
                    let mut row_sum = 0i64;
                    for j in 0..field_w {
                        let px = j + s;
                        let qx = (px as isize + dx) as usize;
                        let sq: i64 = padded
                            .pixel(py, px)
                            .iter()
                            .zip(padded.pixel(qy, qx))
                            .map(|(&a, &b)| {
                                let d = a as i64 - b as i64;
                                d * d
                            })
                            .sum();
                        row_sum += sq;
                        integral[(i + 1) * stride + j + 1] = integral[i * stride + j + 1] + row_sum;
                    }
                }

                for y in 0..height {
                    for x in 0..width {
                        let (y0, x0) = (y, x);
                        let (y1, x1) = (y + template_side, x + template_side);
                        let ssd = integral[y1 * stride + x1] - integral[y0 * stride + x1]
                            - integral[y1 * stride + x0]
                            + integral[y0 * stride + x0];
                        let w = table.get(ssd as usize).copied().unwrap_or(0);
                        if w == 0 {
                            continue;
                        }

                        let idx = y * width + x;
                        acc.weights[idx] += w;
                        let qy = ((y + border) as isize + dy) as usize;
                        let qx = ((x + border) as isize + dx) as usize;
                        let values = &mut acc.values[idx * channels..(idx + 1) * channels];
                        for (v, &p) in values.iter_mut().zip(padded.pixel(qy, qx)) {
                            *v += w * p as i64;
                        }
                    }
                }
                acc
            },
        )
        .reduce(|| Accumulator::new(height * width, channels), Accumulator::merge);

    // The zero offset always carries full weight, so weights are never zero
    Array3::from_shape_fn((height, width, channels), |(y, x, c)| {
        let idx = y * width + x;
        let wsum = acc.weights[idx];
        let value = (acc.values[idx * channels + c] + wsum / 2) / wsum;
        value.clamp(0, 255) as u8
    })
}

/// Apply colored non-local means denoising to a BGR u8 image.
///
/// The image is converted to Lab, treating BGR as linear (no gamma). L is
/// denoised with `h_luminance`; a and b are denoised together with `h_color`. The result is converted back to BGR.
///
/// # Arguments
/// * `input` - BGR image (height, width, 3)
/// * `h_luminance` - Filter strength for the luminance plane
/// * `h_color` - Filter strength for the chroma planes
/// * `template_window` - Patch size used for similarity (odd)
/// * `search_window` - Neighborhood searched for similar patches (odd)
///
/// # Returns
/// Denoised BGR image
///
/// # Panics
/// If the image does not have exactly 3 channels.
pub fn nl_means_colored_u8(
    input: ArrayView3<u8>,
    h_luminance: f32,
    h_color: f32,
    template_window: usize,
    search_window: usize,
) -> Array3<u8> {
    let lab = bgr_to_lab_u8(input);

    let l = nl_means_u8(lab.slice(s![.., .., 0..1]), h_luminance, template_window, search_window);
    let ab = nl_means_u8(lab.slice(s![.., .., 1..3]), h_color, template_window, search_window);

    let merged = concatenate(Axis(2), &[l.view(), ab.view()])
        .expect("Lab planes share spatial dimensions");
    lab_to_bgr_u8(merged.view())
}
