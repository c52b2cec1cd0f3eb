// Wayland backend module
// Owns the connection and every viewer window, using smithay-client-toolkit

use super::menu::{accelerator_action, MenuAction};
use super::render::{render_window, Canvas};
use super::ui::UiTask;
use super::window::{Transition, ViewRequest, ViewerWindow};
use crate::persistence::FilePicker;
use anyhow::{anyhow, Context, Result};
use log::{debug, error, info, warn};
use smithay_client_toolkit::{
    compositor::{CompositorHandler, CompositorState},
    delegate_compositor, delegate_keyboard, delegate_output, delegate_pointer, delegate_registry,
    delegate_seat, delegate_shm, delegate_xdg_shell, delegate_xdg_window,
    output::{OutputHandler, OutputState},
    reexports::{
        calloop::{channel, EventLoop},
        calloop_wayland_source::WaylandSource,
    },
    registry::{ProvidesRegistryState, RegistryState},
    registry_handlers,
    seat::{
        keyboard::{KeyEvent, KeyboardHandler, Keysym, Modifiers},
        pointer::{PointerEvent, PointerEventKind, PointerHandler},
        Capability, SeatHandler, SeatState,
    },
    shell::{
        xdg::{
            window::{Window, WindowConfigure, WindowDecorations, WindowHandler},
            XdgShell,
        },
        WaylandSurface,
    },
    shm::{
        slot::{Buffer, SlotPool},
        Shm, ShmHandler,
    },
};
use std::sync::mpsc;
use wayland_client::{
    globals::registry_queue_init,
    protocol::{wl_keyboard, wl_output, wl_pointer, wl_seat, wl_shm, wl_surface},
    Connection, QueueHandle,
};

/// Mouse button constants
const BTN_LEFT: u32 = 272;

const APP_ID: &str = "easel";

/// One toplevel and the buffers it is drawn with
struct WindowSlot {
    state: ViewerWindow,
    window: Window,
    pool: Option<SlotPool>,
    buffer: Option<Buffer>,
    width: u32,
    height: u32,
    configured: bool,
    needs_redraw: bool,
}

impl WindowSlot {
    fn surface(&self) -> &wl_surface::WlSurface {
        self.window.wl_surface()
    }

    /// Draw the window into a fresh shm buffer and commit it
    fn draw(&mut self, shm: &Shm) {
        if !self.configured {
            return;
        }
        let (width, height) = (self.width, self.height);
        let stride = width as i32 * 4;
        let buffer_size = stride as usize * height as usize;

        if self.pool.is_none() {
            match SlotPool::new(buffer_size, shm) {
                Ok(pool) => self.pool = Some(pool),
                Err(e) => {
                    error!("Failed to create slot pool of {} bytes: {}", buffer_size, e);
                    return;
                }
            }
        }
        let Some(pool) = self.pool.as_mut() else {
            return;
        };
        if pool.len() < buffer_size {
            if let Err(e) = pool.resize(buffer_size) {
                error!("Failed to resize pool to {} bytes: {}", buffer_size, e);
                self.pool = None;
                return;
            }
        }

        let (buffer, data) = match pool.create_buffer(
            width as i32,
            height as i32,
            stride,
            wl_shm::Format::Argb8888,
        ) {
            Ok(buf) => buf,
            Err(e) => {
                error!("Failed to create buffer {}x{}: {}", width, height, e);
                return;
            }
        };

        let mut canvas = Canvas::new(data, width, height);
        render_window(&self.state, &mut canvas);

        let surface = self.window.wl_surface();
        if let Err(e) = buffer.attach_to(surface) {
            error!("Failed to attach buffer: {:?}", e);
            return;
        }
        surface.damage_buffer(0, 0, width as i32, height as i32);
        self.window.commit();

        self.buffer = Some(buffer);
        self.needs_redraw = false;
    }
}

/// Main Wayland application state
struct WaylandApp {
    registry_state: RegistryState,
    seat_state: SeatState,
    output_state: OutputState,
    shm: Shm,
    xdg_shell: XdgShell,
    compositor_state: CompositorState,
    qh: QueueHandle<Self>,

    windows: Vec<WindowSlot>,
    picker: Box<dyn FilePicker + Send>,

    // Input state
    keyboard_focus: Option<wl_surface::WlSurface>,
    modifiers: Modifiers,

    /// Set once every `UiThread` handle is gone
    tasks_closed: bool,
}

impl WaylandApp {
    /// Create a toplevel for `request`, sized to fit the zoomed image
    fn open_window(&mut self, request: ViewRequest) {
        let state = ViewerWindow::new(request);
        let (width, height) = state.window_size();
        let (x, y) = state.position();
        debug!(
            "Position hint ({}, {}) for '{}' left to the compositor",
            x,
            y,
            state.title()
        );

        let surface = self.compositor_state.create_surface(&self.qh);
        let window =
            self.xdg_shell
                .create_window(surface, WindowDecorations::RequestServer, &self.qh);
        window.set_title(state.title().to_string());
        window.set_app_id(APP_ID);
        window.set_min_size(Some((width, height)));
        window.set_max_size(Some((width, height)));
        // Initial commit triggers configure
        window.commit();

        info!(
            "Opened viewer '{}' at {} ({}x{})",
            state.title(),
            state.zoom(),
            width,
            height
        );
        self.windows.push(WindowSlot {
            state,
            window,
            pool: None,
            buffer: None,
            width,
            height,
            configured: false,
            needs_redraw: false,
        });
    }

    fn slot_index(&self, surface: &wl_surface::WlSurface) -> Option<usize> {
        self.windows.iter().position(|slot| slot.surface() == surface)
    }

    fn close_window(&mut self, index: usize) {
        let slot = self.windows.remove(index);
        if self.keyboard_focus.as_ref() == Some(slot.surface()) {
            self.keyboard_focus = None;
        }
        debug!("Destroyed viewer '{}'", slot.state.title());
    }

    /// Run a menu action and carry out the resulting transition
    fn dispatch_action(&mut self, index: usize, action: MenuAction) {
        let slot = &mut self.windows[index];
        match slot.state.apply(action, self.picker.as_ref()) {
            Ok(Transition::Stay) => slot.needs_redraw = true,
            Ok(Transition::Retitle(title)) => {
                slot.window.set_title(title);
                slot.needs_redraw = true;
            }
            Ok(Transition::Reopen(request)) => {
                self.close_window(index);
                self.open_window(request);
            }
            Ok(Transition::Close) => self.close_window(index),
            Err(e) => {
                error!("Failed to save '{}': {}", slot.state.title(), e);
                slot.needs_redraw = true;
            }
        }
    }

    fn redraw_pending(&mut self) {
        for slot in self.windows.iter_mut().filter(|slot| slot.needs_redraw) {
            slot.draw(&self.shm);
        }
    }

    fn should_exit(&self) -> bool {
        self.tasks_closed && self.windows.is_empty()
    }
}

impl CompositorHandler for WaylandApp {
    fn scale_factor_changed(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _surface: &wl_surface::WlSurface,
        _new_factor: i32,
    ) {
        debug!("Scale factor changed");
    }

    fn transform_changed(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _surface: &wl_surface::WlSurface,
        _new_transform: wl_output::Transform,
    ) {
        debug!("Transform changed");
    }

    fn frame(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        surface: &wl_surface::WlSurface,
        _time: u32,
    ) {
        if let Some(index) = self.slot_index(surface) {
            let slot = &mut self.windows[index];
            if slot.needs_redraw {
                slot.draw(&self.shm);
            }
        }
    }

    fn surface_enter(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _surface: &wl_surface::WlSurface,
        _output: &wl_output::WlOutput,
    ) {
    }

    fn surface_leave(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _surface: &wl_surface::WlSurface,
        _output: &wl_output::WlOutput,
    ) {
    }
}

impl OutputHandler for WaylandApp {
    fn output_state(&mut self) -> &mut OutputState {
        &mut self.output_state
    }

    fn new_output(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _output: wl_output::WlOutput,
    ) {
        debug!("New output detected");
    }

    fn update_output(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _output: wl_output::WlOutput,
    ) {
        debug!("Output updated");
    }

    fn output_destroyed(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _output: wl_output::WlOutput,
    ) {
        debug!("Output destroyed");
    }
}

impl WindowHandler for WaylandApp {
    fn request_close(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>, window: &Window) {
        if let Some(index) = self.slot_index(window.wl_surface()) {
            info!("Compositor closed viewer '{}'", self.windows[index].state.title());
            self.close_window(index);
        }
    }

    fn configure(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        window: &Window,
        configure: WindowConfigure,
        _serial: u32,
    ) {
        debug!("Window configured: {:?}", configure.new_size);
        let Some(index) = self.slot_index(window.wl_surface()) else {
            return;
        };
        // The window keeps the size it was created with
        let slot = &mut self.windows[index];
        slot.configured = true;
        slot.draw(&self.shm);
    }
}

impl SeatHandler for WaylandApp {
    fn seat_state(&mut self) -> &mut SeatState {
        &mut self.seat_state
    }

    fn new_seat(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>, _seat: wl_seat::WlSeat) {
        debug!("New seat");
    }

    fn new_capability(
        &mut self,
        _conn: &Connection,
        qh: &QueueHandle<Self>,
        seat: wl_seat::WlSeat,
        capability: Capability,
    ) {
        debug!("New capability: {:?}", capability);

        if capability == Capability::Keyboard {
            if let Err(e) = self.seat_state.get_keyboard(qh, &seat, None) {
                error!("Failed to get keyboard: {}", e);
            }
        }
        if capability == Capability::Pointer {
            if let Err(e) = self.seat_state.get_pointer(qh, &seat) {
                error!("Failed to get pointer: {}", e);
            }
        }
    }

    fn remove_capability(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _seat: wl_seat::WlSeat,
        _capability: Capability,
    ) {
        debug!("Capability removed");
    }

    fn remove_seat(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>, _seat: wl_seat::WlSeat) {
        debug!("Seat removed");
    }
}

impl KeyboardHandler for WaylandApp {
    fn enter(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _keyboard: &wl_keyboard::WlKeyboard,
        surface: &wl_surface::WlSurface,
        _serial: u32,
        _raw: &[u32],
        _keysyms: &[Keysym],
    ) {
        self.keyboard_focus = Some(surface.clone());
    }

    fn leave(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _keyboard: &wl_keyboard::WlKeyboard,
        surface: &wl_surface::WlSurface,
        _serial: u32,
    ) {
        if self.keyboard_focus.as_ref() == Some(surface) {
            self.keyboard_focus = None;
        }
    }

    fn press_key(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _keyboard: &wl_keyboard::WlKeyboard,
        _serial: u32,
        event: KeyEvent,
    ) {
        let Some(index) = self
            .keyboard_focus
            .as_ref()
            .and_then(|surface| self.slot_index(surface))
        else {
            return;
        };

        if event.keysym == Keysym::Escape {
            let slot = &mut self.windows[index];
            if slot.state.menu_bar().open_menu().is_some() {
                slot.state.menu_bar_mut().close();
                slot.needs_redraw = true;
            }
            return;
        }

        let primary = self.modifiers.ctrl || self.modifiers.logo;
        let action = event
            .keysym
            .key_char()
            .and_then(|key| accelerator_action(key, primary));
        if let Some(action) = action {
            debug!("Accelerator {:?} -> {:?}", event.keysym, action);
            self.windows[index].state.menu_bar_mut().close();
            self.dispatch_action(index, action);
        }
    }

    fn release_key(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _keyboard: &wl_keyboard::WlKeyboard,
        _serial: u32,
        _event: KeyEvent,
    ) {
    }

    fn update_modifiers(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _keyboard: &wl_keyboard::WlKeyboard,
        _serial: u32,
        modifiers: Modifiers,
        _layout: u32,
    ) {
        self.modifiers = modifiers;
    }
}

impl PointerHandler for WaylandApp {
    fn pointer_frame(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _pointer: &wl_pointer::WlPointer,
        events: &[PointerEvent],
    ) {
        for event in events {
            let Some(index) = self.slot_index(&event.surface) else {
                continue;
            };
            let (x, y) = event.position;
            match event.kind {
                PointerEventKind::Motion { .. } => {
                    let slot = &mut self.windows[index];
                    if slot.state.menu_bar_mut().hover(x, y) {
                        slot.needs_redraw = true;
                    }
                }
                PointerEventKind::Leave { .. } => {
                    let slot = &mut self.windows[index];
                    if slot.state.menu_bar_mut().hover(-1.0, -1.0) {
                        slot.needs_redraw = true;
                    }
                }
                PointerEventKind::Press { button, .. } if button == BTN_LEFT => {
                    let slot = &mut self.windows[index];
                    let was_open = slot.state.menu_bar().open_menu();
                    let action = slot.state.menu_bar_mut().click(x, y);
                    if was_open != slot.state.menu_bar().open_menu() {
                        slot.needs_redraw = true;
                    }
                    if let Some(action) = action {
                        debug!("Menu action {:?}", action);
                        self.dispatch_action(index, action);
                        // The window list may have changed
                        break;
                    }
                }
                _ => {}
            }
        }
    }
}

impl ShmHandler for WaylandApp {
    fn shm_state(&mut self) -> &mut Shm {
        &mut self.shm
    }
}

impl ProvidesRegistryState for WaylandApp {
    fn registry(&mut self) -> &mut RegistryState {
        &mut self.registry_state
    }

    registry_handlers![OutputState, SeatState];
}

// Delegate macros
delegate_compositor!(WaylandApp);
delegate_output!(WaylandApp);
delegate_seat!(WaylandApp);
delegate_keyboard!(WaylandApp);
delegate_pointer!(WaylandApp);
delegate_shm!(WaylandApp);
delegate_xdg_shell!(WaylandApp);
delegate_xdg_window!(WaylandApp);
delegate_registry!(WaylandApp);

/// Run the viewer event loop on the current thread.
///
/// Once the globals are bound, the task sender is handed back through
/// `ready`. Returns when every sender is dropped and no window is left open.
pub(crate) fn run(
    picker: Box<dyn FilePicker + Send>,
    ready: mpsc::Sender<channel::Sender<UiTask>>,
) -> Result<()> {
    info!("Connecting to Wayland display");
    let conn = Connection::connect_to_env().context("Failed to connect to Wayland display")?;

    let (globals, event_queue) =
        registry_queue_init(&conn).context("Failed to initialize registry")?;
    let qh = event_queue.handle();

    let compositor_state =
        CompositorState::bind(&globals, &qh).context("Failed to bind compositor")?;
    let xdg_shell = XdgShell::bind(&globals, &qh).context("Failed to bind xdg shell")?;
    let shm = Shm::bind(&globals, &qh).context("Failed to bind shm")?;

    let mut event_loop: EventLoop<WaylandApp> =
        EventLoop::try_new().context("Failed to create event loop")?;
    let handle = event_loop.handle();
    WaylandSource::new(conn.clone(), event_queue)
        .insert(handle.clone())
        .map_err(|e| anyhow!("Failed to insert Wayland source: {}", e.error))?;

    let (sender, tasks) = channel::channel::<UiTask>();
    handle
        .insert_source(tasks, |event, _, app: &mut WaylandApp| match event {
            channel::Event::Msg(UiTask::Open(request)) => app.open_window(request),
            channel::Event::Closed => {
                debug!("All viewer handles dropped");
                app.tasks_closed = true;
            }
        })
        .map_err(|e| anyhow!("Failed to insert task channel: {}", e.error))?;

    let mut app = WaylandApp {
        registry_state: RegistryState::new(&globals),
        seat_state: SeatState::new(&globals, &qh),
        output_state: OutputState::new(&globals, &qh),
        shm,
        xdg_shell,
        compositor_state,
        qh,
        windows: Vec::new(),
        picker,
        keyboard_focus: None,
        modifiers: Modifiers::default(),
        tasks_closed: false,
    };

    if ready.send(sender).is_err() {
        warn!("Viewer handle dropped before the event loop started");
        return Ok(());
    }

    info!("Starting event loop");
    while !app.should_exit() {
        event_loop
            .dispatch(None, &mut app)
            .context("Event loop dispatch failed")?;
        app.redraw_pending();
    }

    info!("All viewer windows closed");
    Ok(())
}
