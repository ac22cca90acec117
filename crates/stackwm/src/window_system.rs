//! Boundary between the window manager core and the display server.
//!
//! The core only ever talks to the display through [`WindowSystem`], so the
//! dispatcher, tiling and resize logic run unchanged against the X11 backend
//! or the recording mock used in tests.

use thiserror::Error;

use crate::geometry::Rectangle;

pub type WindowId = u32;

#[derive(Debug, Error)]
pub enum WindowSystemError {
    #[error("cannot open display: {0}")]
    DisplayUnavailable(String),
    #[error("display connection lost: {0}")]
    ConnectionLost(String),
    #[error("request failed: {0}")]
    Request(String),
    #[error("no keycode for keysym {0:#x}")]
    UnknownKeysym(u32),
}

pub type WsResult<T> = Result<T, WindowSystemError>;

/// Modifier state of a key or button chord. Lock modifiers are never part of it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub super_key: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        ctrl: false,
        alt: false,
        shift: false,
        super_key: false,
    };

    pub const ALT: Modifiers = Modifiers {
        alt: true,
        ..Modifiers::NONE
    };

    #[cfg(test)]
    pub const SUPER: Modifiers = Modifiers {
        super_key: true,
        ..Modifiers::NONE
    };

    /// True when every modifier set in `other` is also set here.
    pub fn contains(&self, other: Modifiers) -> bool {
        (!other.ctrl || self.ctrl)
            && (!other.alt || self.alt)
            && (!other.shift || self.shift)
            && (!other.super_key || self.super_key)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StackMode {
    Above,
    Below,
    TopIf,
    BottomIf,
    Opposite,
}

/// Fields of a configure request. `None` means the field was not in the
/// requester's value mask and must be left alone.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WindowChanges {
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub border_width: Option<i32>,
    pub sibling: Option<WindowId>,
    pub stack_mode: Option<StackMode>,
}

impl WindowChanges {
    pub fn geometry(rect: Rectangle) -> Self {
        Self {
            x: Some(rect.x),
            y: Some(rect.y),
            width: Some(rect.width),
            height: Some(rect.height),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    MapRequest {
        window: WindowId,
    },
    Destroyed {
        window: WindowId,
    },
    KeyPress {
        keysym: u32,
        modifiers: Modifiers,
    },
    ButtonPress {
        window: WindowId,
        button: u8,
        modifiers: Modifiers,
        root_x: i32,
        root_y: i32,
    },
    Motion {
        root_x: i32,
        root_y: i32,
    },
    ButtonRelease,
    ConfigureRequest {
        window: WindowId,
        changes: WindowChanges,
    },
    Expose {
        window: WindowId,
    },
    Unrecognized,
}

pub trait WindowSystem {
    fn root_window(&self) -> WindowId;
    fn screen_size(&self) -> (i32, i32);

    fn grab_key(&mut self, keysym: u32, modifiers: Modifiers) -> WsResult<()>;
    fn grab_button(&mut self, button: u8, modifiers: Modifiers) -> WsResult<()>;
    /// Takes the pointer for motion and release events. `Ok(false)` means the
    /// server refused the grab.
    fn grab_pointer(&mut self) -> WsResult<bool>;
    fn ungrab_pointer(&mut self) -> WsResult<()>;

    /// Blocks for the next event, including any deferred during a drag.
    fn next_event(&mut self) -> WsResult<Event>;
    /// Blocks for the next `Motion` or `ButtonRelease`. Other events that
    /// arrive meanwhile are queued for `next_event`, never discarded.
    fn next_drag_event(&mut self) -> WsResult<Event>;

    fn get_geometry(&mut self, window: WindowId) -> WsResult<Rectangle>;
    fn configure_window(&mut self, window: WindowId, changes: &WindowChanges) -> WsResult<()>;
    fn map_window(&mut self, window: WindowId) -> WsResult<()>;
    fn unmap_window(&mut self, window: WindowId) -> WsResult<()>;
    fn raise_window(&mut self, window: WindowId) -> WsResult<()>;
    fn set_input_focus(&mut self, window: WindowId) -> WsResult<()>;
    fn kill_client(&mut self, window: WindowId) -> WsResult<()>;
    fn flush(&mut self) -> WsResult<()>;
}
