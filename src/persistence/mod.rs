// Persistence module
// Loading and saving rasters through file pickers and the image codecs

mod format;
mod picker;

pub use format::{SaveFormat, EXTENSIONS, FILTER_LABEL};
pub use picker::{DialogPicker, FilePicker, PresetPicker};

use crate::error::{Error, Result};
use crate::raster::Raster;
use image::{DynamicImage, ImageError, ImageFormat, ImageReader};
use log::{debug, info};
use std::fs::{self, File};
use std::io::{BufWriter, Cursor, Write};
use std::path::{Path, PathBuf};

/// Ask the user for an image and decode it.
///
/// Returns `Ok(None)` when the picker is cancelled. The loaded raster takes
/// the file name as display name and the file's directory as source directory.
pub fn load(picker: &dyn FilePicker, directory: &Path) -> Result<Option<Raster>> {
    let Some(path) = picker.pick_open(directory) else {
        info!("Load cancelled");
        return Ok(None);
    };
    load_path(&path).map(Some)
}

/// Decode the image file at `path`
pub fn load_path(path: &Path) -> Result<Raster> {
    let data = fs::read(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let image = decode(&data, path)?;
    let mut raster = Raster::from_dynamic_image(&image)?;

    let resolved = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    if let Some(name) = resolved.file_name() {
        raster.set_display_name(name.to_string_lossy());
    }
    if let Some(parent) = resolved.parent() {
        raster.set_source_directory(parent);
    }

    info!(
        "Loaded {} ({}x{}, {})",
        resolved.display(),
        raster.width(),
        raster.height(),
        raster.color_model()
    );
    Ok(raster)
}

/// Decode an in-memory image file
pub fn decode_bytes(data: &[u8]) -> Result<Raster> {
    let image = decode(data, Path::new("<memory>"))?;
    Raster::from_dynamic_image(&image)
}

/// Decode bytes, sniffing the format from the content and falling back to
/// the file extension
fn decode(data: &[u8], path: &Path) -> Result<DynamicImage> {
    let mut reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
    if reader.format().is_none() {
        if let Ok(format) = ImageFormat::from_path(path) {
            debug!("Content sniffing failed, using extension format {:?}", format);
            reader.set_format(format);
        }
    }
    reader.decode().map_err(|source| Error::Decode {
        path: path.to_path_buf(),
        source,
    })
}

/// Ask the user for a target file and write `raster` as `format`.
///
/// The picker is pre-filled with `source_directory/display_name`.
/// Returns the written path, or `Ok(None)` when the picker is cancelled.
pub fn save(
    raster: &Raster,
    picker: &dyn FilePicker,
    directory: &Path,
    format: SaveFormat,
) -> Result<Option<PathBuf>> {
    let Some(path) = pick_target(raster, picker, directory) else {
        return Ok(None);
    };
    write_path(raster, &path, format)?;
    Ok(Some(path))
}

/// Like [`save`], with the format inferred from the chosen file name
pub fn save_as(
    raster: &Raster,
    picker: &dyn FilePicker,
    directory: &Path,
) -> Result<Option<PathBuf>> {
    let Some(path) = pick_target(raster, picker, directory) else {
        return Ok(None);
    };
    let format = SaveFormat::infer(&path)?;
    write_path(raster, &path, format)?;
    Ok(Some(path))
}

fn pick_target(raster: &Raster, picker: &dyn FilePicker, directory: &Path) -> Option<PathBuf> {
    let suggested = raster.source_directory().join(raster.display_name());
    let picked = picker.pick_save(directory, &suggested);
    if picked.is_none() {
        info!("Save cancelled");
    }
    picked
}

/// Encode `raster` as `format` into the file at `path`
pub fn write_path(raster: &Raster, path: &Path, format: SaveFormat) -> Result<()> {
    let image = format.prepare(raster.to_dynamic_image());
    let io_error = |source: std::io::Error| Error::Io {
        path: path.to_path_buf(),
        source,
    };

    // Encode fully before touching the target so a codec failure leaves it intact
    let mut encoded = Cursor::new(Vec::new());
    image
        .write_to(&mut encoded, format.image_format())
        .map_err(|source| match source {
            ImageError::IoError(source) => io_error(source),
            source => Error::Encode {
                path: path.to_path_buf(),
                format: format.name().to_string(),
                source,
            },
        })?;

    let file = File::create(path).map_err(io_error)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(encoded.get_ref()).map_err(io_error)?;
    writer.flush().map_err(io_error)?;

    info!(
        "Saved {}x{} image as {} to {}",
        raster.width(),
        raster.height(),
        format,
        path.display()
    );
    Ok(())
}
