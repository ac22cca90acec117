use std::collections::VecDeque;

use x11rb::connection::Connection;
use x11rb::errors::{ConnectionError, ReplyError};
use x11rb::protocol::xproto::{
    self, ButtonIndex, ChangeWindowAttributesAux, ConfigWindow, ConfigureRequestEvent,
    ConfigureWindowAux, ConnectionExt as _, EventMask, GrabMode, GrabStatus, InputFocus,
    KeyButMask, ModMask,
};
use x11rb::protocol::Event as XEvent;
use x11rb::rust_connection::RustConnection;
use x11rb::{CURRENT_TIME, NONE};

use crate::geometry::Rectangle;
use crate::window_system::{
    Event, Modifiers, StackMode, WindowChanges, WindowId, WindowSystem, WindowSystemError,
    WsResult,
};

impl From<ConnectionError> for WindowSystemError {
    fn from(e: ConnectionError) -> Self {
        WindowSystemError::ConnectionLost(e.to_string())
    }
}

impl From<ReplyError> for WindowSystemError {
    fn from(e: ReplyError) -> Self {
        match e {
            ReplyError::ConnectionError(e) => e.into(),
            ReplyError::X11Error(e) => WindowSystemError::Request(format!("{:?}", e.error_kind)),
        }
    }
}

/// Grabs are repeated with each of these added so bindings keep working
/// with Caps Lock or Num Lock on.
fn lock_masks() -> [u16; 4] {
    let lock = u16::from(ModMask::LOCK);
    let numlock = u16::from(ModMask::M2);
    [0, lock, numlock, lock | numlock]
}

fn mod_mask(modifiers: Modifiers) -> u16 {
    let mut mask = 0;
    if modifiers.shift {
        mask |= u16::from(ModMask::SHIFT);
    }
    if modifiers.ctrl {
        mask |= u16::from(ModMask::CONTROL);
    }
    if modifiers.alt {
        mask |= u16::from(ModMask::M1);
    }
    if modifiers.super_key {
        mask |= u16::from(ModMask::M4);
    }
    mask
}

fn modifiers_from_state(state: KeyButMask) -> Modifiers {
    let state = u16::from(state);
    let has = |flag: KeyButMask| state & u16::from(flag) != 0;
    Modifiers {
        shift: has(KeyButMask::SHIFT),
        ctrl: has(KeyButMask::CONTROL),
        alt: has(KeyButMask::MOD1),
        super_key: has(KeyButMask::MOD4),
    }
}

fn stack_mode_from_x(mode: xproto::StackMode) -> StackMode {
    if mode == xproto::StackMode::BELOW {
        StackMode::Below
    } else if mode == xproto::StackMode::TOP_IF {
        StackMode::TopIf
    } else if mode == xproto::StackMode::BOTTOM_IF {
        StackMode::BottomIf
    } else if mode == xproto::StackMode::OPPOSITE {
        StackMode::Opposite
    } else {
        StackMode::Above
    }
}

fn stack_mode_to_x(mode: StackMode) -> xproto::StackMode {
    match mode {
        StackMode::Above => xproto::StackMode::ABOVE,
        StackMode::Below => xproto::StackMode::BELOW,
        StackMode::TopIf => xproto::StackMode::TOP_IF,
        StackMode::BottomIf => xproto::StackMode::BOTTOM_IF,
        StackMode::Opposite => xproto::StackMode::OPPOSITE,
    }
}

/// Only the fields named in the request's value mask are carried over.
fn changes_from_request(e: &ConfigureRequestEvent) -> WindowChanges {
    let mask = e.value_mask;
    WindowChanges {
        x: mask.contains(ConfigWindow::X).then_some(i32::from(e.x)),
        y: mask.contains(ConfigWindow::Y).then_some(i32::from(e.y)),
        width: mask.contains(ConfigWindow::WIDTH).then_some(i32::from(e.width)),
        height: mask.contains(ConfigWindow::HEIGHT).then_some(i32::from(e.height)),
        border_width: mask
            .contains(ConfigWindow::BORDER_WIDTH)
            .then_some(i32::from(e.border_width)),
        sibling: mask.contains(ConfigWindow::SIBLING).then_some(e.sibling),
        stack_mode: mask
            .contains(ConfigWindow::STACK_MODE)
            .then(|| stack_mode_from_x(e.stack_mode)),
    }
}

/// Keysym table from the server, first column only.
struct Keymap {
    min_keycode: u8,
    keysyms_per_keycode: usize,
    keysyms: Vec<u32>,
}

impl Keymap {
    fn load(conn: &RustConnection) -> WsResult<Self> {
        let setup = conn.setup();
        let min_keycode = setup.min_keycode;
        let max_keycode = setup.max_keycode;

        let mapping = conn
            .get_keyboard_mapping(min_keycode, max_keycode - min_keycode + 1)?
            .reply()?;

        Ok(Self {
            min_keycode,
            keysyms_per_keycode: usize::from(mapping.keysyms_per_keycode).max(1),
            keysyms: mapping.keysyms,
        })
    }

    fn keysym(&self, keycode: u8) -> u32 {
        let Some(offset) = keycode.checked_sub(self.min_keycode) else {
            return 0;
        };
        let index = usize::from(offset) * self.keysyms_per_keycode;
        self.keysyms.get(index).copied().unwrap_or(0)
    }

    fn keycodes(&self, keysym: u32) -> Vec<u8> {
        self.keysyms
            .chunks(self.keysyms_per_keycode)
            .enumerate()
            .filter(|(_, syms)| syms.first() == Some(&keysym))
            .filter_map(|(i, _)| u8::try_from(i).ok())
            .filter_map(|i| self.min_keycode.checked_add(i))
            .collect()
    }
}

pub struct X11WindowSystem {
    conn: RustConnection,
    root: WindowId,
    screen_width: i32,
    screen_height: i32,
    keymap: Keymap,
    deferred: VecDeque<Event>,
}

impl X11WindowSystem {
    /// Connects to `$DISPLAY` and takes over substructure redirection on the
    /// root window.
    pub fn connect() -> WsResult<Self> {
        let (conn, screen_num) = x11rb::connect(None)
            .map_err(|e| WindowSystemError::DisplayUnavailable(e.to_string()))?;

        let screen = &conn.setup().roots[screen_num];
        let root = screen.root;
        let screen_width = i32::from(screen.width_in_pixels);
        let screen_height = i32::from(screen.height_in_pixels);

        let mask = EventMask::SUBSTRUCTURE_REDIRECT
            | EventMask::SUBSTRUCTURE_NOTIFY
            | EventMask::KEY_PRESS
            | EventMask::BUTTON_PRESS;
        conn.change_window_attributes(root, &ChangeWindowAttributesAux::new().event_mask(mask))?
            .check()
            .map_err(|e| match e {
                ReplyError::X11Error(_) => WindowSystemError::DisplayUnavailable(
                    "another window manager is already running".to_string(),
                ),
                other => other.into(),
            })?;

        let keymap = Keymap::load(&conn)?;

        log::info!(
            "Connected to X display: screen {} ({}x{}), root {:#x}",
            screen_num,
            screen_width,
            screen_height,
            root
        );

        Ok(Self {
            conn,
            root,
            screen_width,
            screen_height,
            keymap,
            deferred: VecDeque::new(),
        })
    }

    fn wait_for_event(&mut self) -> WsResult<Event> {
        let event = self.conn.wait_for_event()?;
        Ok(self.translate(event))
    }

    fn translate(&mut self, event: XEvent) -> Event {
        match event {
            XEvent::MapRequest(e) => Event::MapRequest { window: e.window },
            XEvent::DestroyNotify(e) => Event::Destroyed { window: e.window },
            XEvent::KeyPress(e) => Event::KeyPress {
                keysym: self.keymap.keysym(e.detail),
                modifiers: modifiers_from_state(e.state),
            },
            XEvent::ButtonPress(e) => Event::ButtonPress {
                window: if e.child != NONE { e.child } else { e.event },
                button: e.detail,
                modifiers: modifiers_from_state(e.state),
                root_x: i32::from(e.root_x),
                root_y: i32::from(e.root_y),
            },
            XEvent::MotionNotify(e) => Event::Motion {
                root_x: i32::from(e.root_x),
                root_y: i32::from(e.root_y),
            },
            XEvent::ButtonRelease(_) => Event::ButtonRelease,
            XEvent::ConfigureRequest(e) => Event::ConfigureRequest {
                window: e.window,
                changes: changes_from_request(&e),
            },
            XEvent::Expose(e) => Event::Expose { window: e.window },
            XEvent::MappingNotify(_) => {
                match Keymap::load(&self.conn) {
                    Ok(keymap) => {
                        log::info!("[x11] Keyboard mapping changed, reloaded");
                        self.keymap = keymap;
                    }
                    Err(e) => log::warn!("[x11] Failed to reload keyboard mapping: {}", e),
                }
                Event::Unrecognized
            }
            XEvent::Error(e) => {
                log::debug!("[x11] Request error: {:?}", e);
                Event::Unrecognized
            }
            _ => Event::Unrecognized,
        }
    }
}

impl WindowSystem for X11WindowSystem {
    fn root_window(&self) -> WindowId {
        self.root
    }

    fn screen_size(&self) -> (i32, i32) {
        (self.screen_width, self.screen_height)
    }

    fn grab_key(&mut self, keysym: u32, modifiers: Modifiers) -> WsResult<()> {
        let keycodes = self.keymap.keycodes(keysym);
        if keycodes.is_empty() {
            return Err(WindowSystemError::UnknownKeysym(keysym));
        }

        let base = mod_mask(modifiers);
        for keycode in keycodes {
            for extra in lock_masks() {
                self.conn.grab_key(
                    false,
                    self.root,
                    ModMask::from(base | extra),
                    keycode,
                    GrabMode::ASYNC,
                    GrabMode::ASYNC,
                )?;
            }
        }
        Ok(())
    }

    fn grab_button(&mut self, button: u8, modifiers: Modifiers) -> WsResult<()> {
        let base = mod_mask(modifiers);
        for extra in lock_masks() {
            self.conn.grab_button(
                true,
                self.root,
                EventMask::BUTTON_PRESS,
                GrabMode::ASYNC,
                GrabMode::ASYNC,
                NONE,
                NONE,
                ButtonIndex::from(button),
                ModMask::from(base | extra),
            )?;
        }
        Ok(())
    }

    fn grab_pointer(&mut self) -> WsResult<bool> {
        let reply = self
            .conn
            .grab_pointer(
                false,
                self.root,
                EventMask::POINTER_MOTION | EventMask::BUTTON_RELEASE,
                GrabMode::ASYNC,
                GrabMode::ASYNC,
                NONE,
                NONE,
                CURRENT_TIME,
            )?
            .reply()?;
        Ok(reply.status == GrabStatus::SUCCESS)
    }

    fn ungrab_pointer(&mut self) -> WsResult<()> {
        self.conn.ungrab_pointer(CURRENT_TIME)?;
        self.conn.flush()?;
        Ok(())
    }

    fn next_event(&mut self) -> WsResult<Event> {
        if let Some(event) = self.deferred.pop_front() {
            return Ok(event);
        }
        self.wait_for_event()
    }

    fn next_drag_event(&mut self) -> WsResult<Event> {
        loop {
            match self.wait_for_event()? {
                event @ (Event::Motion { .. } | Event::ButtonRelease) => return Ok(event),
                Event::Unrecognized => {}
                other => self.deferred.push_back(other),
            }
        }
    }

    fn get_geometry(&mut self, window: WindowId) -> WsResult<Rectangle> {
        let reply = self.conn.get_geometry(window)?.reply()?;
        Ok(Rectangle::new(
            i32::from(reply.x),
            i32::from(reply.y),
            i32::from(reply.width),
            i32::from(reply.height),
        ))
    }

    fn configure_window(&mut self, window: WindowId, changes: &WindowChanges) -> WsResult<()> {
        let mut aux = ConfigureWindowAux::new();
        if let Some(x) = changes.x {
            aux = aux.x(x);
        }
        if let Some(y) = changes.y {
            aux = aux.y(y);
        }
        if let Some(width) = changes.width {
            aux = aux.width(width.max(1) as u32);
        }
        if let Some(height) = changes.height {
            aux = aux.height(height.max(1) as u32);
        }
        if let Some(border_width) = changes.border_width {
            aux = aux.border_width(border_width.max(0) as u32);
        }
        if let Some(sibling) = changes.sibling {
            aux = aux.sibling(sibling);
        }
        if let Some(mode) = changes.stack_mode {
            aux = aux.stack_mode(stack_mode_to_x(mode));
        }

        self.conn.configure_window(window, &aux)?;
        Ok(())
    }

    fn map_window(&mut self, window: WindowId) -> WsResult<()> {
        self.conn.map_window(window)?;
        Ok(())
    }

    fn unmap_window(&mut self, window: WindowId) -> WsResult<()> {
        self.conn.unmap_window(window)?;
        Ok(())
    }

    fn raise_window(&mut self, window: WindowId) -> WsResult<()> {
        let aux = ConfigureWindowAux::new().stack_mode(xproto::StackMode::ABOVE);
        self.conn.configure_window(window, &aux)?;
        Ok(())
    }

    fn set_input_focus(&mut self, window: WindowId) -> WsResult<()> {
        self.conn
            .set_input_focus(InputFocus::POINTER_ROOT, window, CURRENT_TIME)?;
        Ok(())
    }

    fn kill_client(&mut self, window: WindowId) -> WsResult<()> {
        self.conn.kill_client(window)?;
        Ok(())
    }

    fn flush(&mut self) -> WsResult<()> {
        self.conn.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mod_mask_bits() {
        assert_eq!(mod_mask(Modifiers::NONE), 0);
        assert_eq!(mod_mask(Modifiers::ALT), u16::from(ModMask::M1));
        let ctrl_super = Modifiers {
            ctrl: true,
            ..Modifiers::SUPER
        };
        assert_eq!(
            mod_mask(ctrl_super),
            u16::from(ModMask::CONTROL) | u16::from(ModMask::M4)
        );
    }

    #[test]
    fn test_state_ignores_lock_modifiers() {
        let state = KeyButMask::MOD1 | KeyButMask::LOCK | KeyButMask::MOD2;
        assert_eq!(modifiers_from_state(state), Modifiers::ALT);
    }

    #[test]
    fn test_lock_variants_are_distinct() {
        let masks = lock_masks();
        for (i, a) in masks.iter().enumerate() {
            assert!(masks[i + 1..].iter().all(|b| a != b));
        }
    }

    #[test]
    fn test_keymap_lookup() {
        let keymap = Keymap {
            min_keycode: 8,
            keysyms_per_keycode: 2,
            keysyms: vec![0x61, 0x41, 0x62, 0x42, 0xff09, 0],
        };
        assert_eq!(keymap.keysym(8), 0x61);
        assert_eq!(keymap.keysym(10), 0xff09);
        assert_eq!(keymap.keysym(3), 0);
        assert_eq!(keymap.keysym(200), 0);
        assert_eq!(keymap.keycodes(0x62), vec![9]);
        assert!(keymap.keycodes(0x42).is_empty());
    }

    #[test]
    fn test_stack_mode_conversion() {
        for mode in [
            StackMode::Above,
            StackMode::Below,
            StackMode::TopIf,
            StackMode::BottomIf,
            StackMode::Opposite,
        ] {
            assert_eq!(stack_mode_from_x(stack_mode_to_x(mode)), mode);
        }
    }
}
