// Viewer window module
// Per-window state machine, independent of the windowing backend

use super::menu::{MenuAction, MenuBar, Rect, MENU_BAR_HEIGHT};
use super::zoom::Zoom;
use crate::error::Result;
use crate::persistence::{self, FilePicker};
use crate::raster::Raster;
use log::info;
use std::fs;
use std::sync::Arc;

/// Where new windows ask to be placed
pub const DEFAULT_POSITION: (i32, i32) = (100, 100);

/// Everything needed to open a viewer window
#[derive(Debug, Clone)]
pub struct ViewRequest {
    pub image: Arc<Raster>,
    pub title: String,
    pub zoom: Zoom,
    /// Requested top-left screen position
    pub position: (i32, i32),
}

impl ViewRequest {
    pub fn new(image: Arc<Raster>, title: impl Into<String>, zoom: Zoom) -> Self {
        Self {
            image,
            title: title.into(),
            zoom,
            position: DEFAULT_POSITION,
        }
    }
}

/// What the backend must do after an action
#[derive(Debug)]
pub enum Transition {
    /// Nothing visible changed
    Stay,
    /// Update the window title
    Retitle(String),
    /// Destroy this window and open the request in its place
    Reopen(ViewRequest),
    /// Destroy this window
    Close,
}

/// One open viewer window, in its only live state: displaying at a zoom
#[derive(Debug, Clone)]
pub struct ViewerWindow {
    image: Arc<Raster>,
    title: String,
    zoom: Zoom,
    position: (i32, i32),
    menu_bar: MenuBar,
}

impl ViewerWindow {
    pub fn new(request: ViewRequest) -> Self {
        Self {
            menu_bar: MenuBar::new(request.zoom),
            image: request.image,
            title: request.title,
            zoom: request.zoom,
            position: request.position,
        }
    }

    pub fn image(&self) -> &Raster {
        &self.image
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn zoom(&self) -> Zoom {
        self.zoom
    }

    pub fn position(&self) -> (i32, i32) {
        self.position
    }

    pub fn menu_bar(&self) -> &MenuBar {
        &self.menu_bar
    }

    pub fn menu_bar_mut(&mut self) -> &mut MenuBar {
        &mut self.menu_bar
    }

    /// Size of the image at the current zoom
    pub fn content_size(&self) -> (u32, u32) {
        self.zoom.scale(self.image.width(), self.image.height())
    }

    /// Window size: the zoomed image below the menu bar, grown so that any
    /// open drop-down stays inside the surface.
    /// Fixed once the window is created.
    pub fn window_size(&self) -> (u32, u32) {
        let (width, height) = self.content_size();
        (
            width.max(self.menu_bar.min_width()),
            (height + MENU_BAR_HEIGHT).max(self.menu_bar.min_height()),
        )
    }

    /// Where the zoomed image goes in a `width` x `height` window: centered
    /// in the area below the menu bar
    pub fn image_rect(&self, width: u32, height: u32) -> Rect {
        let (image_w, image_h) = self.content_size();
        let content_h = height.saturating_sub(MENU_BAR_HEIGHT) as i64;
        let x = (width as i64 - image_w as i64) / 2;
        let y = MENU_BAR_HEIGHT as i64 + (content_h - image_h as i64) / 2;
        Rect::new(x as i32, y as i32, image_w, image_h)
    }

    /// Carry out a menu action.
    ///
    /// Save errors are returned as-is; the window stays open either way.
    pub fn apply(&mut self, action: MenuAction, picker: &dyn FilePicker) -> Result<Transition> {
        match action {
            MenuAction::Close => {
                info!("Closing viewer '{}'", self.title);
                Ok(Transition::Close)
            }
            MenuAction::SetZoom(zoom) if zoom == self.zoom => Ok(Transition::Stay),
            MenuAction::SetZoom(zoom) => {
                info!("Zoom {} -> {} for '{}'", self.zoom, zoom, self.title);
                Ok(Transition::Reopen(ViewRequest {
                    image: Arc::clone(&self.image),
                    title: self.title.clone(),
                    zoom,
                    position: self.position,
                }))
            }
            MenuAction::SaveAs => {
                let directory = self.image.source_directory().to_path_buf();
                match persistence::save_as(&self.image, picker, &directory)? {
                    Some(path) => {
                        let absolute = fs::canonicalize(&path).unwrap_or(path);
                        self.title = absolute.display().to_string();
                        Ok(Transition::Retitle(self.title.clone()))
                    }
                    None => Ok(Transition::Stay),
                }
            }
        }
    }
}
