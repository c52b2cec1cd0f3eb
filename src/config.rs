// Configuration module
// Default metadata handed to rasters and picker dialogs

use std::path::PathBuf;

/// Name given to rasters that were not loaded from a file
pub const DEFAULT_DISPLAY_NAME: &str = "untitled";

/// Defaults used when a raster is created from scratch.
///
/// These only seed the save dialog and the viewer title; they carry no
/// other meaning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// File name suggested when saving
    pub display_name: String,
    /// Directory the pickers open in
    pub directory: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            display_name: DEFAULT_DISPLAY_NAME.to_string(),
            directory: PathBuf::from("."),
        }
    }
}

impl Settings {
    pub fn new(display_name: impl Into<String>, directory: impl Into<PathBuf>) -> Self {
        Self {
            display_name: display_name.into(),
            directory: directory.into(),
        }
    }
}
