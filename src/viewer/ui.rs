// UI thread module
// Handle to the thread that owns the display connection and all windows

use super::wayland;
use super::window::ViewRequest;
use super::zoom::Zoom;
use crate::persistence::{DialogPicker, FilePicker};
use crate::raster::Raster;
use anyhow::{anyhow, Result};
use log::{debug, error};
use smithay_client_toolkit::reexports::calloop::channel;
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};

/// Work posted to the UI thread
#[derive(Debug)]
pub enum UiTask {
    Open(ViewRequest),
}

/// Handle to the viewer's UI thread.
///
/// `show*` calls snapshot the raster, post it and return at once. Edits
/// made to the raster afterwards are not visible in the open window; call
/// `show*` again to view the updated image.
/// Dropping the handle blocks until every window is closed.
pub struct UiThread {
    sender: Option<channel::Sender<UiTask>>,
    thread: Option<JoinHandle<Result<()>>>,
}

impl UiThread {
    /// Start the UI thread with native file dialogs
    pub fn spawn() -> Result<Self> {
        Self::spawn_with_picker(Box::new(DialogPicker))
    }

    /// Start the UI thread; `picker` serves the "Save image as..." entries
    pub fn spawn_with_picker(picker: Box<dyn FilePicker + Send>) -> Result<Self> {
        let (ready_tx, ready_rx) = mpsc::channel();
        let thread = thread::Builder::new()
            .name("easel-ui".to_string())
            .spawn(move || wayland::run(picker, ready_tx))?;

        match ready_rx.recv() {
            Ok(sender) => Ok(Self {
                sender: Some(sender),
                thread: Some(thread),
            }),
            // The thread gave up before binding its globals
            Err(_) => match thread.join() {
                Ok(Err(e)) => Err(e),
                Ok(Ok(())) => Err(anyhow!("UI thread exited before it was ready")),
                Err(_) => Err(anyhow!("UI thread panicked during startup")),
            },
        }
    }

    /// Show `raster` at full size, titled with its display name
    pub fn show(&self, raster: &Raster) -> Result<()> {
        self.show_zoomed(raster, Zoom::Full)
    }

    pub fn show_zoomed(&self, raster: &Raster, zoom: Zoom) -> Result<()> {
        self.show_titled(raster, raster.display_name(), zoom)
    }

    /// Open a window showing a snapshot of `raster` taken now
    pub fn show_titled(&self, raster: &Raster, title: &str, zoom: Zoom) -> Result<()> {
        let request = ViewRequest::new(Arc::new(raster.clone()), title, zoom);
        self.post(UiTask::Open(request))
    }

    fn post(&self, task: UiTask) -> Result<()> {
        let sender = self
            .sender
            .as_ref()
            .ok_or_else(|| anyhow!("UI thread already shut down"))?;
        debug!("Posting {}", task_name(&task));
        sender
            .send(task)
            .map_err(|_| anyhow!("UI thread is no longer running"))
    }

    /// Block until every window has been closed, then stop the thread
    pub fn wait_idle(mut self) -> Result<()> {
        self.finish()
    }

    fn finish(&mut self) -> Result<()> {
        // Closing the channel lets the loop exit once its windows are gone
        self.sender.take();
        match self.thread.take() {
            Some(thread) => thread
                .join()
                .map_err(|_| anyhow!("UI thread panicked"))?,
            None => Ok(()),
        }
    }
}

impl Drop for UiThread {
    fn drop(&mut self) {
        if let Err(e) = self.finish() {
            error!("Viewer shut down with an error: {:#}", e);
        }
    }
}

fn task_name(task: &UiTask) -> String {
    match task {
        UiTask::Open(request) => format!("open '{}' at {}", request.title, request.zoom),
    }
}
