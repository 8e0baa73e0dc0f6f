//! Core utilities shared by the filters.
//!
//! - Gaussian kernel generation
//! - Reflect-101 border indexing
//! - 8-bit saturation

/// Generate a normalized 1D Gaussian kernel for 8-bit images.
///
/// The kernel size is derived from sigma as `round(sigma * 6 + 1) | 1`,
/// so sigma 3.0 gives 19 taps.
///
/// # Arguments
/// * `sigma` - Standard deviation of the Gaussian
///
/// # Returns
/// Normalized kernel, odd length. `[1.0]` for non-positive sigma.
pub fn gaussian_kernel_1d(sigma: f32) -> Vec<f32> {
    if sigma <= 0.0 {
        return vec![1.0];
    }

    let kernel_size = ((sigma as f64 * 6.0 + 1.0).round() as usize) | 1;
    let half = (kernel_size / 2) as f64;
    let scale = -0.5 / (sigma as f64 * sigma as f64);

    let weights: Vec<f64> = (0..kernel_size)
        .map(|i| {
            let x = i as f64 - half;
            (scale * x * x).exp()
        })
        .collect();

    let sum: f64 = weights.iter().sum();
    weights.iter().map(|&w| (w / sum) as f32).collect()
}

/// Map a possibly out-of-range coordinate into `0..len` by mirroring
/// without repeating the edge sample (`gfedcb|abcdefgh|gfedcba`).
#[inline]
pub fn reflect101(index: isize, len: usize) -> usize {
    if len <= 1 {
        return 0;
    }
    let last = len as isize - 1;
    let mut i = index;
    // Loops only when the overshoot exceeds the image size (tiny images)
    while i < 0 || i > last {
        if i < 0 {
            i = -i;
        }
        if i > last {
            i = 2 * last - i;
        }
    }
    i as usize
}

/// Round half to even and clamp to 0..=255.
#[inline]
pub fn saturate_u8(value: f32) -> u8 {
    value.round_ties_even().clamp(0.0, 255.0) as u8
}

/// Round a window size up to the next odd value (minimum 1).
#[inline]
pub fn odd_window(size: usize) -> usize {
    size.max(1) | 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gaussian_kernel_sigma_3() {
        let k = gaussian_kernel_1d(3.0);
        assert_eq!(k.len(), 19);

        let sum: f32 = k.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);

        // Symmetric, peak in the middle
        assert!((k[0] - k[18]).abs() < 1e-7);
        assert!(k[9] > k[8]);
    }

    #[test]
    fn test_gaussian_kernel_zero_sigma() {
        assert_eq!(gaussian_kernel_1d(0.0), vec![1.0]);
    }

    #[test]
    fn test_reflect101() {
        assert_eq!(reflect101(-1, 5), 1);
        assert_eq!(reflect101(-2, 5), 2);
        assert_eq!(reflect101(5, 5), 3);
        assert_eq!(reflect101(6, 5), 2);
        assert_eq!(reflect101(3, 5), 3);
    }

    #[test]
    fn test_reflect101_large_overshoot() {
        // Border wider than the image itself
        assert_eq!(reflect101(-5, 3), 1);
        assert_eq!(reflect101(7, 3), 1);
        assert_eq!(reflect101(-13, 1), 0);
        for i in -30..30 {
            assert!(reflect101(i, 2) < 2);
        }
    }

    #[test]
    fn test_saturate_u8() {
        assert_eq!(saturate_u8(-12.0), 0);
        assert_eq!(saturate_u8(300.0), 255);
        assert_eq!(saturate_u8(1.5), 2);
        assert_eq!(saturate_u8(2.5), 2);
        assert_eq!(saturate_u8(127.4), 127);
    }

    #[test]
    fn test_odd_window() {
        assert_eq!(odd_window(7), 7);
        assert_eq!(odd_window(8), 9);
        assert_eq!(odd_window(0), 1);
    }
}
