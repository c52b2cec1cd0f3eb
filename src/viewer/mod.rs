// Viewer module
// Windows that display a raster at a chosen zoom, with a File/Display menu bar

mod font;
pub mod menu;
pub mod render;
mod ui;
mod wayland;
pub mod window;
mod zoom;

pub use menu::{MenuAction, MenuBar};
pub use ui::UiThread;
pub use window::{Transition, ViewRequest, ViewerWindow};
pub use zoom::Zoom;
