use stackwm_common::WorkspaceInfo;

use crate::window_system::WindowId;

#[derive(Clone, Debug, PartialEq)]
pub struct StatusSnapshot {
    pub workspaces: Vec<WorkspaceInfo>,
    pub active_workspace: usize,
    pub focused_window: Option<WindowId>,
}

/// Receives notifications for whatever renders the status bar. Nothing in the
/// core depends on what it does with them.
pub trait StatusBar {
    /// Window whose expose events should trigger a repaint, if the bar has one.
    fn surface(&self) -> Option<WindowId> {
        None
    }

    fn repaint(&mut self, snapshot: &StatusSnapshot);

    fn workspace_changed(&mut self, snapshot: &StatusSnapshot);
}

/// Used when status reporting is disabled or the IPC socket cannot be bound.
pub struct NullStatusBar;

impl StatusBar for NullStatusBar {
    fn repaint(&mut self, _snapshot: &StatusSnapshot) {}

    fn workspace_changed(&mut self, _snapshot: &StatusSnapshot) {}
}
