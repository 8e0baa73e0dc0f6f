//! Filter modules used by the preprocessing pipeline.
//!
//! ## Supported Formats
//!
//! Filters work on interleaved u8 images of shape (H, W, C):
//!
//! | Format | Shape | Type | Description |
//! |--------|-------|------|-------------|
//! | BGR8 | (H, W, 3) | u8 | Blue, green, red, 0-255 (decoder output) |
//! | RGB8 | (H, W, 3) | u8 | Red, green, blue, 0-255 (pipeline output) |
//! | Lab8 | (H, W, 3) | u8 | 8-bit CIELAB, used inside colored denoising |
//! | Planar | (H, W, 1..) | u8 | Any channel count for resize, blur, NL-means |
//!
//! ## Architecture
//!
//! - **Saturating** - All u8 results are rounded half to even and clamped to 0-255
//! - **Reflect-101 borders** - Blur and NL-means mirror without repeating the edge
//! - **Deterministic** - Parallel work never changes the output bytes
//! - **Thread-safe** - Use rayon for row / offset parallelism
//!
//! ## Filter Categories
//!
//! - **Geometry**: resize_bilinear
//! - **Noise**: nl_means, nl_means_colored
//! - **Blur**: gaussian_blur
//! - **Sharpen**: add_weighted, unsharp_mask
//! - **Color science**: bgr_to_lab, lab_to_bgr, swap_red_blue

pub mod core;
pub mod resize;
pub mod noise;
pub mod blur;
pub mod sharpen;
pub mod color_science;
