//! CLIP image preprocessing
//!
//! A fixed image transform that prepares pictures for a CLIP-style vision
//! encoder, with Python bindings via PyO3.
//!
//! ## Pipeline
//! 1. **Decode** the file into an 8-bit BGR array at native resolution
//! 2. **Resize** to 224×224 (bilinear)
//! 3. **Denoise** with colored non-local means (h = 5 / 5, windows 7 / 21)
//! 4. **Sharpen** with an unsharp mask (`1.5 · x − 0.5 · gaussian(x, σ = 3)`)
//! 5. **Convert** BGR -> RGB
//!
//! ## Image Format
//! The result is always (224, 224, 3) `u8` in RGB order and standard layout.
//! Ownership moves to the caller; from Python the returned NumPy array takes
//! over the buffer without a copy.
//!
//! ## Errors
//! Decoding is the only checked failure, see [`PreprocessError`].

pub mod decode;
pub mod error;
pub mod filters;
pub mod pipeline;

pub use error::{PreprocessError, Result};
pub use pipeline::{preprocess_image, preprocess_image_bytes, PipelineParams, TARGET_SIZE};

// Python bindings (only when python feature is enabled)
#[cfg(feature = "python")]
mod python {
    use std::path::PathBuf;

    use numpy::{IntoPyArray, PyArray3};
    use pyo3::create_exception;
    use pyo3::exceptions::PyRuntimeError;
    use pyo3::prelude::*;
    use tracing_subscriber::EnvFilter;

    use crate::error::PreprocessError;
    use crate::pipeline::{self, TARGET_SIZE};

    create_exception!(
        clip_preprocess,
        DecodeError,
        PyRuntimeError,
        "Raised when the input cannot be decoded into an image."
    );

    impl From<PreprocessError> for PyErr {
        fn from(err: PreprocessError) -> PyErr {
            DecodeError::new_err(err.to_string())
        }
    }

    /// Preprocess an image file for CLIP.
    ///
    /// Returns a (224, 224, 3) uint8 RGB array. The GIL is released while the
    /// pipeline runs.
    ///
    /// Raises `DecodeError` when the file cannot be loaded as an image.
    #[pyfunction]
    pub fn preprocess_image<'py>(
        py: Python<'py>,
        image_path: PathBuf,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let result = py.allow_threads(|| pipeline::preprocess_image(&image_path))?;
        Ok(result.into_pyarray(py))
    }

    /// Preprocess an encoded image (PNG, JPEG, ...) held in a bytes object.
    #[pyfunction]
    pub fn preprocess_image_bytes<'py>(
        py: Python<'py>,
        data: &[u8],
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let result = py.allow_threads(|| pipeline::preprocess_image_bytes(data))?;
        Ok(result.into_pyarray(py))
    }

    /// Send pipeline logs to stderr.
    ///
    /// `RUST_LOG` overrides the level. Later calls are no-ops.
    #[pyfunction]
    #[pyo3(signature = (verbose=false))]
    pub fn init_logging(verbose: bool) {
        let default_level = if verbose { "debug" } else { "info" };
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init();
    }

    /// CLIP preprocessing extension module
    #[pymodule]
    pub fn clip_preprocess(m: &Bound<'_, PyModule>) -> PyResult<()> {
        m.add_function(wrap_pyfunction!(preprocess_image, m)?)?;
        m.add_function(wrap_pyfunction!(preprocess_image_bytes, m)?)?;
        m.add_function(wrap_pyfunction!(init_logging, m)?)?;

        m.add("DecodeError", m.py().get_type::<DecodeError>())?;
        m.add("TARGET_SIZE", TARGET_SIZE)?;

        Ok(())
    }
}

#[cfg(feature = "python")]
pub use python::clip_preprocess;
