//! Tracked top-level windows.
//!
//! Clients live in a map keyed by window id; a separate id list records the
//! order used for tiling and focus cycling.

use std::collections::HashMap;

use serde::Deserialize;
use thiserror::Error;

use crate::geometry::Rectangle;
use crate::window_system::WindowId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Client {
    pub window: WindowId,
    pub geometry: Rectangle,
    pub workspace: usize,
}

/// How a removed client's slot in the cycling order is filled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalPolicy {
    /// Later clients shift down; insertion order is preserved.
    #[default]
    Stable,
    /// The last client moves into the freed slot.
    SwapWithLast,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("registry is full ({capacity} clients)")]
    Full { capacity: usize },
    #[error("cannot allocate a registry entry")]
    Allocation,
    #[error("window {0:#x} is already managed")]
    AlreadyManaged(WindowId),
}

pub struct ClientRegistry {
    clients: HashMap<WindowId, Client>,
    order: Vec<WindowId>,
    capacity: usize,
    policy: RemovalPolicy,
}

impl ClientRegistry {
    pub fn new(capacity: usize, policy: RemovalPolicy) -> Self {
        Self {
            clients: HashMap::new(),
            order: Vec::new(),
            capacity,
            policy,
        }
    }

    pub fn insert(&mut self, client: Client) -> Result<(), RegistryError> {
        if self.clients.contains_key(&client.window) {
            return Err(RegistryError::AlreadyManaged(client.window));
        }
        if self.order.len() >= self.capacity {
            return Err(RegistryError::Full {
                capacity: self.capacity,
            });
        }

        // Reserve both containers first so a failure leaves no half entry.
        self.order
            .try_reserve(1)
            .map_err(|_| RegistryError::Allocation)?;
        self.clients
            .try_reserve(1)
            .map_err(|_| RegistryError::Allocation)?;

        self.order.push(client.window);
        self.clients.insert(client.window, client);
        Ok(())
    }

    pub fn remove(&mut self, window: WindowId) -> Option<Client> {
        let client = self.clients.remove(&window)?;
        if let Some(pos) = self.order.iter().position(|&w| w == window) {
            match self.policy {
                RemovalPolicy::Stable => {
                    self.order.remove(pos);
                }
                RemovalPolicy::SwapWithLast => {
                    self.order.swap_remove(pos);
                }
            }
        }
        Some(client)
    }

    pub fn get(&self, window: WindowId) -> Option<&Client> {
        self.clients.get(&window)
    }

    pub fn get_mut(&mut self, window: WindowId) -> Option<&mut Client> {
        self.clients.get_mut(&window)
    }

    pub fn contains(&self, window: WindowId) -> bool {
        self.clients.contains_key(&window)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn policy(&self) -> RemovalPolicy {
        self.policy
    }

    /// All clients in cycling order.
    pub fn iter(&self) -> impl Iterator<Item = &Client> + '_ {
        self.order.iter().filter_map(|w| self.clients.get(w))
    }

    /// Clients on `workspace`, in cycling order.
    pub fn visible(&self, workspace: usize) -> impl Iterator<Item = &Client> + '_ {
        self.iter().filter(move |c| c.workspace == workspace)
    }

    pub fn visible_windows(&self, workspace: usize) -> Vec<WindowId> {
        self.visible(workspace).map(|c| c.window).collect()
    }

    pub fn count_on(&self, workspace: usize) -> usize {
        self.visible(workspace).count()
    }
}
