// File picker module
// User-driven selection of the file to load or save

use super::format::{EXTENSIONS, FILTER_LABEL};
use log::debug;
use std::path::{Path, PathBuf};

/// A modal, user-driven file choice scoped to a directory.
///
/// Both methods return `None` when the user cancels.
pub trait FilePicker {
    /// Choose an existing image to open
    fn pick_open(&self, directory: &Path) -> Option<PathBuf>;

    /// Choose where to write an image; `suggested` is the pre-filled target
    fn pick_save(&self, directory: &Path, suggested: &Path) -> Option<PathBuf>;
}

/// Native file dialogs
#[derive(Debug, Clone, Copy, Default)]
pub struct DialogPicker;

impl FilePicker for DialogPicker {
    fn pick_open(&self, directory: &Path) -> Option<PathBuf> {
        debug!("Opening file dialog in {}", directory.display());
        rfd::FileDialog::new()
            .set_title("Open an image...")
            .set_directory(directory)
            .add_filter(FILTER_LABEL, &EXTENSIONS)
            .pick_file()
    }

    fn pick_save(&self, directory: &Path, suggested: &Path) -> Option<PathBuf> {
        let directory = save_directory(directory, suggested);
        debug!("Opening save dialog in {}", directory.display());
        let mut dialog = rfd::FileDialog::new()
            .set_title("Save an image...")
            .set_directory(directory)
            .add_filter(FILTER_LABEL, &EXTENSIONS);
        if let Some(name) = suggested.file_name() {
            dialog = dialog.set_file_name(name.to_string_lossy());
        }
        dialog.save_file()
    }
}

/// Directory a save dialog opens in: the suggestion's own directory when it
/// has one, `fallback` otherwise
pub(crate) fn save_directory<'a>(fallback: &'a Path, suggested: &'a Path) -> &'a Path {
    match suggested.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => fallback,
    }
}

/// Picker that answers every request with the same path, or always cancels.
///
/// Used when the path is already known, e.g. from the command line.
#[derive(Debug, Clone, Default)]
pub struct PresetPicker {
    path: Option<PathBuf>,
}

impl PresetPicker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// A picker the "user" always cancels
    pub fn cancelled() -> Self {
        Self { path: None }
    }
}

impl FilePicker for PresetPicker {
    fn pick_open(&self, _directory: &Path) -> Option<PathBuf> {
        self.path.clone()
    }

    fn pick_save(&self, _directory: &Path, _suggested: &Path) -> Option<PathBuf> {
        self.path.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_dialog_opens_next_to_the_suggestion() {
        let fallback = Path::new("/work");
        assert_eq!(
            save_directory(fallback, Path::new("/photos/a.png")),
            Path::new("/photos")
        );
        assert_eq!(save_directory(fallback, Path::new("a.png")), fallback);
    }
}
