//! Pointer-drag resize.
//!
//! A session starts on a qualifying button press and lives in the dispatcher
//! as its own mode until the button is released:
//!
//! 1. The pointer position and the window's geometry are captured.
//! 2. The dispatcher grabs the pointer and from then on reads only motion and
//!    release events.
//! 3. Each motion sample grows or shrinks the window by the pointer delta,
//!    keeping its top-left corner fixed.
//! 4. Release ends the session and the grab is dropped.

use crate::geometry::Rectangle;
use crate::window_system::WindowId;

/// Width and height must both stay above this for a sample to be applied.
pub const MIN_DRAG_SIZE: i32 = 50;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResizeSession {
    window: WindowId,
    start_x: i32,
    start_y: i32,
    origin: Rectangle,
    current: Rectangle,
}

impl ResizeSession {
    pub fn begin(window: WindowId, root_x: i32, root_y: i32, origin: Rectangle) -> Self {
        Self {
            window,
            start_x: root_x,
            start_y: root_y,
            origin,
            current: origin,
        }
    }

    pub fn window(&self) -> WindowId {
        self.window
    }

    pub fn geometry(&self) -> Rectangle {
        self.current
    }

    /// Returns the new geometry when the sample is accepted.
    pub fn motion(&mut self, root_x: i32, root_y: i32) -> Option<Rectangle> {
        let width = self.origin.width + (root_x - self.start_x);
        let height = self.origin.height + (root_y - self.start_y);

        if width <= MIN_DRAG_SIZE || height <= MIN_DRAG_SIZE {
            return None;
        }

        self.current = Rectangle {
            width,
            height,
            ..self.origin
        };
        Some(self.current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drag_grows_window() {
        let mut session = ResizeSession::begin(1, 50, 50, Rectangle::new(100, 100, 200, 200));
        assert_eq!(
            session.motion(80, 70),
            Some(Rectangle::new(100, 100, 230, 220))
        );
        assert_eq!(session.geometry(), Rectangle::new(100, 100, 230, 220));
    }

    #[test]
    fn test_too_small_is_rejected() {
        let mut session = ResizeSession::begin(1, 50, 50, Rectangle::new(100, 100, 200, 200));
        session.motion(80, 70);
        assert_eq!(session.motion(-100, 70), None);
        assert_eq!(session.motion(80, -100), None);
        assert_eq!(session.geometry(), Rectangle::new(100, 100, 230, 220));
    }

    #[test]
    fn test_boundary_is_exclusive() {
        let mut session = ResizeSession::begin(1, 0, 0, Rectangle::new(0, 0, 100, 100));
        assert_eq!(session.motion(-50, 0), None);
        assert_eq!(session.motion(-49, -49), Some(Rectangle::new(0, 0, 51, 51)));
    }

    #[test]
    fn test_deltas_are_relative_to_start() {
        let mut session = ResizeSession::begin(9, 10, 10, Rectangle::new(0, 0, 300, 300));
        session.motion(110, 10);
        assert_eq!(session.motion(10, 60), Some(Rectangle::new(0, 0, 300, 350)));
        assert_eq!(session.window(), 9);
    }
}
