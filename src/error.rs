// Error module
// Error taxonomy shared by rasters and persistence

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by raster access and image persistence.
///
/// Cancelling a picker is not an error: the picker functions return `Ok(None)`.
#[derive(Debug, Error)]
pub enum Error {
    #[error(
        "region {}x{} at ({}, {}) lies outside the {}x{} raster",
        extent.0, extent.1, x, y, bounds.0, bounds.1
    )]
    OutOfBounds {
        x: i32,
        y: i32,
        extent: (u32, u32),
        bounds: (u32, u32),
    },

    #[error("invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("failed to decode image {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to encode {} as {format}: {source}", path.display())]
    Encode {
        path: PathBuf,
        format: String,
        #[source]
        source: image::ImageError,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Out-of-bounds error for a single pixel
    pub(crate) fn pixel(x: i32, y: i32, width: u32, height: u32) -> Self {
        Error::OutOfBounds {
            x,
            y,
            extent: (1, 1),
            bounds: (width, height),
        }
    }
}
