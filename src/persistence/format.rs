// Save format module
// Supported file formats and format inference from file names

use crate::error::{Error, Result};
use image::{DynamicImage, ImageFormat};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Extensions offered by the pickers
pub const EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "bmp", "gif"];

/// Label of the picker filter
pub const FILTER_LABEL: &str = "Images *.jpg, *.jpeg, *.png, *.bmp, *.gif";

/// Formats a raster can be written as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SaveFormat {
    #[default]
    Jpg,
    Png,
    Bmp,
    Gif,
}

impl SaveFormat {
    pub const ALL: [SaveFormat; 4] = [SaveFormat::Jpg, SaveFormat::Png, SaveFormat::Bmp, SaveFormat::Gif];

    /// Upper-case format name
    pub fn name(self) -> &'static str {
        match self {
            SaveFormat::Jpg => "JPG",
            SaveFormat::Png => "PNG",
            SaveFormat::Bmp => "BMP",
            SaveFormat::Gif => "GIF",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            SaveFormat::Jpg => "jpg",
            SaveFormat::Png => "png",
            SaveFormat::Bmp => "bmp",
            SaveFormat::Gif => "gif",
        }
    }

    pub fn image_format(self) -> ImageFormat {
        match self {
            SaveFormat::Jpg => ImageFormat::Jpeg,
            SaveFormat::Png => ImageFormat::Png,
            SaveFormat::Bmp => ImageFormat::Bmp,
            SaveFormat::Gif => ImageFormat::Gif,
        }
    }

    /// Pick the format from a file name's extension.
    ///
    /// A missing or empty extension means JPG. An extension outside the
    /// supported set is rejected up front instead of reaching the encoder.
    pub fn infer(path: &Path) -> Result<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            None | Some("") => Ok(SaveFormat::Jpg),
            Some(ext) => ext.parse(),
        }
    }

    /// Reshape the pixel layout into one the encoder accepts
    pub(crate) fn prepare(self, image: DynamicImage) -> DynamicImage {
        match (self, image) {
            (SaveFormat::Png, image) => image,
            (SaveFormat::Gif, image) => DynamicImage::ImageRgba8(image.to_rgba8()),
            (SaveFormat::Jpg | SaveFormat::Bmp, DynamicImage::ImageLuma8(buffer)) => {
                DynamicImage::ImageLuma8(buffer)
            }
            (SaveFormat::Jpg | SaveFormat::Bmp, DynamicImage::ImageLuma16(buffer)) => {
                DynamicImage::ImageLuma8(DynamicImage::ImageLuma16(buffer).to_luma8())
            }
            (SaveFormat::Jpg | SaveFormat::Bmp, image) => DynamicImage::ImageRgb8(image.to_rgb8()),
        }
    }
}

impl fmt::Display for SaveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SaveFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "JPG" | "JPEG" => Ok(SaveFormat::Jpg),
            "PNG" => Ok(SaveFormat::Png),
            "BMP" => Ok(SaveFormat::Bmp),
            "GIF" => Ok(SaveFormat::Gif),
            other => Err(Error::UnsupportedFormat(other.to_string())),
        }
    }
}
