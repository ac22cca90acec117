use stackwm_common::WorkspaceInfo;

use crate::config::{Config, Direction, ResizeDirection};
use crate::focus::FocusCycle;
use crate::geometry::Rectangle;
use crate::layout::{tile, usable_area};
use crate::registry::{Client, ClientRegistry, RegistryError};
use crate::resize::MIN_DRAG_SIZE;
use crate::status::StatusSnapshot;
use crate::window_system::{WindowChanges, WindowId, WindowSystem};
use crate::workspace::Workspaces;

/// Everything the window manager knows, owned in one place.
///
/// Operations that touch the display take the [`WindowSystem`] as an argument
/// instead of holding on to it, so tests can build as many independent
/// states as they like.
pub struct State {
    pub registry: ClientRegistry,
    pub workspaces: Workspaces,
    focus: FocusCycle,
    focused: Option<WindowId>,
    gap: i32,
    bar_height: i32,
    master_ratio: f64,
}

impl State {
    pub fn new(config: &Config) -> Self {
        let registry = ClientRegistry::new(config.max_clients(), config.layout.removal);
        log::debug!(
            "[state] {} workspaces, up to {} clients, {:?} removal",
            config.layout.workspaces,
            registry.capacity(),
            registry.policy()
        );

        Self {
            registry,
            workspaces: Workspaces::new(config.layout.workspaces),
            focus: FocusCycle::new(),
            focused: None,
            gap: config.gap(),
            bar_height: config.bar_height(),
            master_ratio: config.layout.master_ratio,
        }
    }

    #[cfg(test)]
    pub fn current_workspace(&self) -> usize {
        self.workspaces.current()
    }

    pub fn visible_windows(&self) -> Vec<WindowId> {
        self.registry.visible_windows(self.workspaces.current())
    }

    pub fn focused_window(&self) -> Option<WindowId> {
        let index = self.focus.cursor()?;
        self.registry
            .visible(self.workspaces.current())
            .nth(index)
            .map(|c| c.window)
    }

    pub fn usable_area<W: WindowSystem>(&self, ws: &W) -> Rectangle {
        let (width, height) = ws.screen_size();
        usable_area(width, height, self.gap, self.bar_height)
    }

    /// Starts tracking `window` on the current workspace. Returns false, with
    /// nothing changed, when the window cannot be added.
    pub fn register_window<W: WindowSystem>(&mut self, ws: &mut W, window: WindowId) -> bool {
        let geometry = match ws.get_geometry(window) {
            Ok(geometry) => geometry,
            Err(e) => {
                log::warn!("[window] Not managing {:#x}: {}", window, e);
                return false;
            }
        };

        let client = Client {
            window,
            geometry,
            workspace: self.workspaces.current(),
        };

        match self.registry.insert(client) {
            Ok(()) => {
                log::debug!(
                    "[window] Managing {:#x} on workspace {} ({}/{} clients)",
                    window,
                    client.workspace,
                    self.registry.len(),
                    self.registry.capacity()
                );
                self.revalidate_focus();
                true
            }
            Err(RegistryError::AlreadyManaged(_)) => {
                log::debug!("[window] {:#x} is already managed", window);
                false
            }
            Err(e) => {
                log::warn!("[window] Not managing {:#x}: {}", window, e);
                false
            }
        }
    }

    /// Stops tracking `window`. Unknown windows are ignored.
    pub fn unregister_window(&mut self, window: WindowId) -> Option<Client> {
        let client = self.registry.remove(window)?;
        if self.registry.is_empty() {
            log::debug!("[window] Released {:#x}, no clients left", window);
        } else {
            log::debug!(
                "[window] Released {:#x} ({} clients left)",
                window,
                self.registry.len()
            );
        }
        self.revalidate_focus();
        Some(client)
    }

    /// Registers `window`, retiles and focuses it.
    pub fn manage<W: WindowSystem>(&mut self, ws: &mut W, window: WindowId) -> bool {
        let registered = self.register_window(ws, window);
        self.retile(ws);
        if registered {
            self.focus_window(ws, window);
        }
        registered
    }

    /// Unregisters `window` and retiles. When it held the focus, the client
    /// now under the cursor takes over.
    pub fn unmanage<W: WindowSystem>(&mut self, ws: &mut W, window: WindowId) -> bool {
        let was_focused = self.focused_window() == Some(window);
        if self.unregister_window(window).is_none() {
            return false;
        }
        self.retile(ws);
        if was_focused {
            self.focus_cursor(ws);
        }
        true
    }

    /// Lays out the current workspace and hides every other client.
    pub fn retile<W: WindowSystem>(&mut self, ws: &mut W) {
        let current = self.workspaces.current();
        let area = self.usable_area(ws);

        let hidden: Vec<WindowId> = self
            .registry
            .iter()
            .filter(|c| c.workspace != current)
            .map(|c| c.window)
            .collect();
        for window in hidden {
            if let Err(e) = ws.unmap_window(window) {
                log::warn!("[layout] Failed to hide {:#x}: {}", window, e);
            }
        }

        let visible = self.visible_windows();
        let tiles = tile(visible.len(), area, self.gap, self.master_ratio);

        for (&window, &geometry) in visible.iter().zip(tiles.iter()) {
            if let Some(client) = self.registry.get_mut(window) {
                client.geometry = geometry;
            }
            if let Err(e) = ws.configure_window(window, &WindowChanges::geometry(geometry)) {
                log::warn!("[layout] Failed to place {:#x}: {}", window, e);
                continue;
            }
            if let Err(e) = ws.map_window(window) {
                log::warn!("[layout] Failed to show {:#x}: {}", window, e);
            }
        }

        log::debug!(
            "[layout] Workspace {}: {} tiled, {} hidden",
            current,
            visible.len(),
            self.registry.len() - visible.len()
        );
    }

    pub fn cycle_focus<W: WindowSystem>(&mut self, ws: &mut W, direction: Direction) -> Option<WindowId> {
        let len = self.registry.count_on(self.workspaces.current());
        match direction {
            Direction::Next => self.focus.next(len),
            Direction::Prev => self.focus.prev(len),
        };
        self.focus_cursor(ws)
    }

    /// Moves the cursor to `window` and gives it the input focus.
    pub fn focus_window<W: WindowSystem>(&mut self, ws: &mut W, window: WindowId) {
        let visible = self.visible_windows();
        if let Some(index) = visible.iter().position(|&w| w == window) {
            self.focus.set(index, visible.len());
            self.focus_cursor(ws);
        }
    }

    fn focus_cursor<W: WindowSystem>(&mut self, ws: &mut W) -> Option<WindowId> {
        self.focused = self.focused_window();
        let window = self.focused?;
        if let Err(e) = ws.raise_window(window) {
            log::warn!("[focus] Failed to raise {:#x}: {}", window, e);
        }
        if let Err(e) = ws.set_input_focus(window) {
            log::warn!("[focus] Failed to focus {:#x}: {}", window, e);
        }
        log::debug!("[focus] Focused {:#x}", window);
        Some(window)
    }

    /// Keeps the cursor on the focused client wherever it moved in the
    /// ordering. Only when that client is gone is the cursor clamped.
    fn revalidate_focus(&mut self) {
        let visible = self.visible_windows();
        let position = self
            .focused
            .and_then(|focused| visible.iter().position(|&w| w == focused));

        match position {
            Some(index) => self.focus.set(index, visible.len()),
            None => {
                self.focus.revalidate(visible.len());
            }
        }
        self.focused = self.focus.cursor().and_then(|i| visible.get(i).copied());
    }

    /// Out-of-range indices are ignored and return false.
    pub fn switch_workspace<W: WindowSystem>(&mut self, ws: &mut W, index: usize) -> bool {
        if !self.workspaces.switch(index) {
            log::debug!("[workspace] Ignoring switch to invalid workspace {}", index);
            return false;
        }

        self.revalidate_focus();
        self.retile(ws);
        self.focus_cursor(ws);
        log::info!("Switched to workspace {}", index + 1);
        true
    }

    /// Grows or shrinks the focused client's height by `amount`.
    pub fn step_resize<W: WindowSystem>(
        &mut self,
        ws: &mut W,
        direction: ResizeDirection,
        amount: i32,
    ) -> Option<Rectangle> {
        let window = self.focused_window()?;
        let current = self.registry.get(window)?.geometry;
        let delta = match direction {
            ResizeDirection::Grow => amount,
            ResizeDirection::Shrink => amount.saturating_neg(),
        };

        let resized = Rectangle {
            height: current.height.saturating_add(delta),
            ..current
        };
        if resized.height <= MIN_DRAG_SIZE {
            return None;
        }

        self.apply_geometry(ws, window, resized)
    }

    /// Moves and sizes `window` and records the result for tracked clients.
    pub fn apply_geometry<W: WindowSystem>(
        &mut self,
        ws: &mut W,
        window: WindowId,
        geometry: Rectangle,
    ) -> Option<Rectangle> {
        if let Err(e) = ws.configure_window(window, &WindowChanges::geometry(geometry)) {
            log::warn!("[window] Failed to resize {:#x}: {}", window, e);
            return None;
        }
        if let Some(client) = self.registry.get_mut(window) {
            client.geometry = geometry;
        }
        Some(geometry)
    }

    pub fn kill_focused<W: WindowSystem>(&mut self, ws: &mut W) -> Option<WindowId> {
        let window = self.focused_window()?;
        if let Err(e) = ws.kill_client(window) {
            log::warn!("[window] Failed to kill {:#x}: {}", window, e);
            return None;
        }
        log::info!("Killed client {:#x}", window);
        Some(window)
    }

    pub fn status_snapshot(&self) -> StatusSnapshot {
        let workspaces = (0..self.workspaces.count())
            .map(|id| WorkspaceInfo::new(id, self.registry.count_on(id)))
            .collect();

        StatusSnapshot {
            workspaces,
            active_workspace: self.workspaces.current(),
            focused_window: self.focused_window(),
        }
    }
}
