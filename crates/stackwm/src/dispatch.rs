use std::mem;

use crate::config::{Action, Config, Keybind};
use crate::resize::ResizeSession;
use crate::spawn::Spawner;
use crate::state::State;
use crate::status::StatusBar;
use crate::window_system::{
    Event, Modifiers, WindowChanges, WindowId, WindowSystem, WindowSystemError, WsResult,
};

/// While a drag is in progress the dispatcher only reads motion and release
/// events; everything else waits in the window system's queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Normal,
    Resizing(ResizeSession),
}

pub struct Dispatcher<W: WindowSystem> {
    ws: W,
    state: State,
    bindings: Vec<(Keybind, Action)>,
    resize_button: u8,
    resize_modifiers: Modifiers,
    spawner: Box<dyn Spawner>,
    status: Box<dyn StatusBar>,
    mode: Mode,
    running: bool,
}

impl<W: WindowSystem> Dispatcher<W> {
    pub fn new(
        ws: W,
        config: &Config,
        spawner: Box<dyn Spawner>,
        status: Box<dyn StatusBar>,
    ) -> Self {
        let bindings = config.keybinds.get_all_bindings();
        log::info!("Loaded {} keybindings", bindings.len());

        Self {
            ws,
            state: State::new(config),
            bindings,
            resize_button: config.mouse.resize_button,
            resize_modifiers: config.resize_modifier(),
            spawner,
            status,
            mode: Mode::Normal,
            running: true,
        }
    }

    /// Installs the key and button grabs and publishes the initial status.
    pub fn setup(&mut self) -> WsResult<()> {
        log::info!("Managing root window {:#x}", self.ws.root_window());

        for (keybind, action) in &self.bindings {
            match self.ws.grab_key(keybind.keysym, keybind.modifiers) {
                Ok(()) => log::debug!("[keys] Grabbed {:?} for {:?}", keybind, action),
                Err(WindowSystemError::UnknownKeysym(sym)) => {
                    log::warn!("[keys] No keycode for keysym {:#x}, binding disabled", sym);
                }
                Err(e) => return Err(e),
            }
        }

        self.ws
            .grab_button(self.resize_button, self.resize_modifiers)?;

        self.status.repaint(&self.state.status_snapshot());
        self.ws.flush()
    }

    /// Processes events until an `exit` action runs or the display is lost.
    pub fn run(&mut self) -> WsResult<()> {
        log::info!("Entering event loop");
        while self.running {
            self.step()?;
        }
        log::info!("Event loop finished");
        Ok(())
    }

    /// Reads and handles a single event.
    pub fn step(&mut self) -> WsResult<()> {
        match self.mode {
            Mode::Normal => {
                let event = self.ws.next_event()?;
                self.dispatch(event);
            }
            Mode::Resizing(_) => match self.ws.next_drag_event() {
                Ok(event) => self.drive_resize(event),
                Err(e) => {
                    self.exit_resize();
                    return Err(e);
                }
            },
        }

        self.ws.flush()
    }

    pub fn dispatch(&mut self, event: Event) {
        log::trace!("[event] {:?}", event);

        match event {
            Event::MapRequest { window } => {
                self.state.manage(&mut self.ws, window);
                self.repaint_status();
            }
            Event::Destroyed { window } => {
                if self.state.unmanage(&mut self.ws, window) {
                    self.repaint_status();
                }
            }
            Event::KeyPress { keysym, modifiers } => self.handle_key(keysym, modifiers),
            Event::ButtonPress {
                window,
                button,
                modifiers,
                root_x,
                root_y,
            } => {
                if button == self.resize_button && modifiers.contains(self.resize_modifiers) {
                    self.enter_resize(window, root_x, root_y);
                }
            }
            Event::ConfigureRequest { window, changes } => {
                self.handle_configure_request(window, &changes);
            }
            Event::Expose { window } => {
                if self.status.surface() == Some(window) {
                    self.repaint_status();
                }
            }
            Event::Motion { .. } | Event::ButtonRelease | Event::Unrecognized => {}
        }
    }

    fn handle_key(&mut self, keysym: u32, modifiers: Modifiers) {
        let action = self
            .bindings
            .iter()
            .find(|(kb, _)| kb.keysym == keysym && kb.modifiers == modifiers)
            .map(|(_, action)| action.clone());

        match action {
            Some(action) => self.execute_action(action),
            None => log::trace!("[keys] Unbound key {:#x} {:?}", keysym, modifiers),
        }
    }

    pub fn execute_action(&mut self, action: Action) {
        log::debug!("[action] {:?}", action);

        match action {
            Action::Exit => {
                log::info!("Exit requested");
                self.running = false;
            }
            Action::Exec { program, args } => self.spawner.spawn(&program, &args),
            Action::Kill => {
                self.state.kill_focused(&mut self.ws);
            }
            Action::Focus(direction) => {
                if self.state.cycle_focus(&mut self.ws, direction).is_some() {
                    self.repaint_status();
                }
            }
            Action::Resize { direction, amount } => {
                self.state.step_resize(&mut self.ws, direction, amount);
            }
            Action::Workspace(target) => {
                let index = self.state.workspaces.resolve(target);
                if self.state.switch_workspace(&mut self.ws, index) {
                    let snapshot = self.state.status_snapshot();
                    self.status.workspace_changed(&snapshot);
                }
            }
        }
    }

    fn handle_configure_request(&mut self, window: WindowId, changes: &WindowChanges) {
        if !changes.is_empty() {
            if let Err(e) = self.ws.configure_window(window, changes) {
                log::warn!("[window] Configure request for {:#x} failed: {}", window, e);
            }
        }
        self.state.retile(&mut self.ws);
    }

    fn enter_resize(&mut self, window: WindowId, root_x: i32, root_y: i32) {
        if !self.state.registry.contains(window) {
            log::debug!("[resize] Ignoring press on unmanaged window {:#x}", window);
            return;
        }

        let origin = match self.ws.get_geometry(window) {
            Ok(geometry) => geometry,
            Err(e) => {
                log::warn!("[resize] Cannot read geometry of {:#x}: {}", window, e);
                return;
            }
        };

        match self.ws.grab_pointer() {
            Ok(true) => {
                log::debug!("[resize] Started on {:#x} from {:?}", window, origin);
                self.mode = Mode::Resizing(ResizeSession::begin(window, root_x, root_y, origin));
            }
            Ok(false) => log::warn!("[resize] Pointer grab refused"),
            Err(e) => log::warn!("[resize] Pointer grab failed: {}", e),
        }
    }

    fn drive_resize(&mut self, event: Event) {
        match event {
            Event::Motion { root_x, root_y } => {
                let Mode::Resizing(session) = &mut self.mode else {
                    return;
                };
                let window = session.window();
                if let Some(geometry) = session.motion(root_x, root_y) {
                    self.state.apply_geometry(&mut self.ws, window, geometry);
                }
            }
            Event::ButtonRelease => self.exit_resize(),
            other => log::warn!("[resize] Unexpected event during drag: {:?}", other),
        }
    }

    fn exit_resize(&mut self) {
        if let Mode::Resizing(session) = mem::replace(&mut self.mode, Mode::Normal) {
            log::debug!(
                "[resize] Finished on {:#x} at {:?}",
                session.window(),
                session.geometry()
            );
            if let Err(e) = self.ws.ungrab_pointer() {
                log::warn!("[resize] Failed to release pointer: {}", e);
            }
        }
    }

    fn repaint_status(&mut self) {
        let snapshot = self.state.status_snapshot();
        self.status.repaint(&snapshot);
    }
}

#[cfg(test)]
impl<W: WindowSystem> Dispatcher<W> {
    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn window_system(&self) -> &W {
        &self.ws
    }

    pub fn window_system_mut(&mut self) -> &mut W {
        &mut self.ws
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}
