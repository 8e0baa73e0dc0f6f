//! Image decoding into BGR pixel arrays.
//!
//! Decoded images are always 8-bit, 3 channels, BGR order, shape
//! (height, width, 3). Alpha is dropped (not composited), grayscale is
//! replicated to all three channels and 16-bit samples are reduced to 8-bit.
//! The EXIF orientation tag is applied, so pixels come out upright.

use std::io::{BufRead, Cursor, Seek};
use std::path::Path;

use image::{DynamicImage, ImageDecoder, ImageReader, ImageResult};
use ndarray::Array3;

use crate::error::{PreprocessError, Result};

/// Decode the image file at `path` into a BGR array.
///
/// The format is detected from the file content first, then from the
/// extension.
pub fn load_bgr(path: &Path) -> Result<Array3<u8>> {
    let decode_err = |message: String| PreprocessError::Decode {
        path: path.to_path_buf(),
        message,
    };

    let reader = ImageReader::open(path)
        .map_err(|e| decode_err(e.to_string()))?
        .with_guessed_format()
        .map_err(|e| decode_err(format!("Cannot detect image format: {}", e)))?;
    let image = decode_upright(reader).map_err(|e| decode_err(e.to_string()))?;

    to_bgr_array(image).map_err(decode_err)
}

/// Decode an encoded image held in memory into a BGR array.
pub fn decode_bgr(bytes: &[u8]) -> Result<Array3<u8>> {
    let decode_err = |message: String| PreprocessError::DecodeBuffer { message };

    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| decode_err(format!("Cannot detect image format: {}", e)))?;
    let image = decode_upright(reader).map_err(|e| decode_err(e.to_string()))?;

    to_bgr_array(image).map_err(decode_err)
}

/// Decode and rotate / flip according to the EXIF orientation tag.
fn decode_upright<R: BufRead + Seek>(reader: ImageReader<R>) -> ImageResult<DynamicImage> {
    let mut decoder = reader.into_decoder()?;
    let orientation = decoder.orientation()?;
    let mut image = DynamicImage::from_decoder(decoder)?;
    image.apply_orientation(orientation);
    Ok(image)
}

/// Flatten a decoded image to interleaved 8-bit BGR.
fn to_bgr_array(image: DynamicImage) -> std::result::Result<Array3<u8>, String> {
    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();
    if width == 0 || height == 0 {
        return Err(format!("Image has no pixels ({}x{})", width, height));
    }

    let mut raw = rgb.into_raw();
    for px in raw.chunks_exact_mut(3) {
        px.swap(0, 2);
    }

    Array3::from_shape_vec((height as usize, width as usize, 3), raw).map_err(|e| e.to_string())
}
