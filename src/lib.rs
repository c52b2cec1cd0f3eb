// easel - Raster images with file persistence and a zoomable Wayland viewer
// Library root: rasters, persistence, sprites and the viewer

pub mod config;
pub mod error;
pub mod persistence;
pub mod raster;
pub mod sprite;
pub mod viewer;

pub use config::Settings;
pub use error::{Error, Result};
pub use persistence::{DialogPicker, FilePicker, PresetPicker, SaveFormat};
pub use raster::{ColorModel, Raster};
pub use sprite::Sprite;
pub use viewer::{UiThread, Zoom};
