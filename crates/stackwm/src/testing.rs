//! In-memory stand-ins for the display, the spawner and the status bar.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;

use crate::geometry::Rectangle;
use crate::spawn::Spawner;
use crate::status::{StatusBar, StatusSnapshot};
use crate::window_system::{
    Event, Modifiers, WindowChanges, WindowId, WindowSystem, WindowSystemError, WsResult,
};

pub const MOCK_ROOT: WindowId = 1 << 20;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    GrabKey(u32, Modifiers),
    GrabButton(u8, Modifiers),
    GrabPointer,
    UngrabPointer,
    Configure(WindowId, WindowChanges),
    Map(WindowId),
    Unmap(WindowId),
    Raise(WindowId),
    Focus(WindowId),
    Kill(WindowId),
}

/// Records every request and answers queries from a table of known windows.
pub struct MockWindowSystem {
    screen: (i32, i32),
    geometries: HashMap<WindowId, Rectangle>,
    mapped: HashSet<WindowId>,
    events: VecDeque<Event>,
    calls: Vec<Call>,
    focused: Option<WindowId>,
    pointer_grabbed: bool,
    pub grab_succeeds: bool,
    pub unknown_keysyms: HashSet<u32>,
}

impl MockWindowSystem {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            screen: (width, height),
            geometries: HashMap::new(),
            mapped: HashSet::new(),
            events: VecDeque::new(),
            calls: Vec::new(),
            focused: None,
            pointer_grabbed: false,
            grab_succeeds: true,
            unknown_keysyms: HashSet::new(),
        }
    }

    pub fn add_window(&mut self, window: WindowId, geometry: Rectangle) {
        self.geometries.insert(window, geometry);
    }

    pub fn push_event(&mut self, event: Event) {
        self.events.push_back(event);
    }

    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    pub fn geometry(&self, window: WindowId) -> Option<Rectangle> {
        self.geometries.get(&window).copied()
    }

    pub fn is_mapped(&self, window: WindowId) -> bool {
        self.mapped.contains(&window)
    }

    pub fn focused(&self) -> Option<WindowId> {
        self.focused
    }

    pub fn pointer_grabbed(&self) -> bool {
        self.pointer_grabbed
    }

    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    fn known(&self, window: WindowId) -> WsResult<()> {
        if self.geometries.contains_key(&window) {
            Ok(())
        } else {
            Err(WindowSystemError::Request(format!("BadWindow {:#x}", window)))
        }
    }
}

impl WindowSystem for MockWindowSystem {
    fn root_window(&self) -> WindowId {
        MOCK_ROOT
    }

    fn screen_size(&self) -> (i32, i32) {
        self.screen
    }

    fn grab_key(&mut self, keysym: u32, modifiers: Modifiers) -> WsResult<()> {
        if self.unknown_keysyms.contains(&keysym) {
            return Err(WindowSystemError::UnknownKeysym(keysym));
        }
        self.calls.push(Call::GrabKey(keysym, modifiers));
        Ok(())
    }

    fn grab_button(&mut self, button: u8, modifiers: Modifiers) -> WsResult<()> {
        self.calls.push(Call::GrabButton(button, modifiers));
        Ok(())
    }

    fn grab_pointer(&mut self) -> WsResult<bool> {
        self.calls.push(Call::GrabPointer);
        self.pointer_grabbed = self.grab_succeeds;
        Ok(self.grab_succeeds)
    }

    fn ungrab_pointer(&mut self) -> WsResult<()> {
        self.calls.push(Call::UngrabPointer);
        self.pointer_grabbed = false;
        Ok(())
    }

    fn next_event(&mut self) -> WsResult<Event> {
        self.events
            .pop_front()
            .ok_or_else(|| WindowSystemError::ConnectionLost("event queue drained".into()))
    }

    fn next_drag_event(&mut self) -> WsResult<Event> {
        let position = self
            .events
            .iter()
            .position(|e| matches!(e, Event::Motion { .. } | Event::ButtonRelease));

        position
            .and_then(|i| self.events.remove(i))
            .ok_or_else(|| WindowSystemError::ConnectionLost("no drag events left".into()))
    }

    fn get_geometry(&mut self, window: WindowId) -> WsResult<Rectangle> {
        self.known(window)?;
        Ok(self.geometries[&window])
    }

    fn configure_window(&mut self, window: WindowId, changes: &WindowChanges) -> WsResult<()> {
        self.known(window)?;
        self.calls.push(Call::Configure(window, *changes));
        if let Some(geometry) = self.geometries.get_mut(&window) {
            geometry.x = changes.x.unwrap_or(geometry.x);
            geometry.y = changes.y.unwrap_or(geometry.y);
            geometry.width = changes.width.unwrap_or(geometry.width);
            geometry.height = changes.height.unwrap_or(geometry.height);
        }
        Ok(())
    }

    fn map_window(&mut self, window: WindowId) -> WsResult<()> {
        self.known(window)?;
        self.calls.push(Call::Map(window));
        self.mapped.insert(window);
        Ok(())
    }

    fn unmap_window(&mut self, window: WindowId) -> WsResult<()> {
        self.known(window)?;
        self.calls.push(Call::Unmap(window));
        self.mapped.remove(&window);
        Ok(())
    }

    fn raise_window(&mut self, window: WindowId) -> WsResult<()> {
        self.known(window)?;
        self.calls.push(Call::Raise(window));
        Ok(())
    }

    fn set_input_focus(&mut self, window: WindowId) -> WsResult<()> {
        self.known(window)?;
        self.calls.push(Call::Focus(window));
        self.focused = Some(window);
        Ok(())
    }

    fn kill_client(&mut self, window: WindowId) -> WsResult<()> {
        self.known(window)?;
        self.calls.push(Call::Kill(window));
        Ok(())
    }

    fn flush(&mut self) -> WsResult<()> {
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Spawned {
    pub program: String,
    pub args: Vec<String>,
}

#[derive(Clone, Default)]
pub struct RecordingSpawner {
    pub spawned: Rc<RefCell<Vec<Spawned>>>,
}

impl Spawner for RecordingSpawner {
    fn spawn(&mut self, program: &str, args: &[String]) {
        self.spawned.borrow_mut().push(Spawned {
            program: program.to_string(),
            args: args.to_vec(),
        });
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum StatusNote {
    Repaint(StatusSnapshot),
    WorkspaceChanged(StatusSnapshot),
}

#[derive(Clone, Default)]
pub struct RecordingStatusBar {
    pub surface: Option<WindowId>,
    pub notes: Rc<RefCell<Vec<StatusNote>>>,
}

impl StatusBar for RecordingStatusBar {
    fn surface(&self) -> Option<WindowId> {
        self.surface
    }

    fn repaint(&mut self, snapshot: &StatusSnapshot) {
        self.notes
            .borrow_mut()
            .push(StatusNote::Repaint(snapshot.clone()));
    }

    fn workspace_changed(&mut self, snapshot: &StatusSnapshot) {
        self.notes
            .borrow_mut()
            .push(StatusNote::WorkspaceChanged(snapshot.clone()));
    }
}
