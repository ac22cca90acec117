use stackwm_common::{ipc_socket_path, IpcEvent};
use std::collections::HashMap;
use std::io::Write;
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};

use crate::status::{StatusBar, StatusSnapshot};

/// Broadcasts status events as JSON lines to every connected client.
///
/// The listener is non-blocking and only polled when there is something to
/// send, so the event loop never waits on it.
pub struct IpcServer {
    listener: UnixListener,
    socket_path: PathBuf,
    clients: HashMap<u64, UnixStream>,
    next_client_id: u64,
}

impl IpcServer {
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        Self::bind(&ipc_socket_path())
    }

    pub fn bind(socket_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        if socket_path.exists() {
            std::fs::remove_file(socket_path)?;
        }

        let listener = UnixListener::bind(socket_path)?;
        listener.set_nonblocking(true)?;

        log::info!("IPC server listening on {}", socket_path.display());

        Ok(Self {
            listener,
            socket_path: socket_path.to_path_buf(),
            clients: HashMap::new(),
            next_client_id: 0,
        })
    }

    pub fn accept_connections(&mut self) {
        loop {
            match self.listener.accept() {
                Ok((stream, _addr)) => {
                    if let Err(e) = stream.set_nonblocking(true) {
                        log::warn!("Failed to set IPC client non-blocking: {}", e);
                        continue;
                    }

                    let id = self.next_client_id;
                    self.next_client_id += 1;
                    self.clients.insert(id, stream);
                    log::info!("IPC client {} connected", id);
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => break,
                Err(e) => {
                    log::warn!("IPC accept error: {}", e);
                    break;
                }
            }
        }
    }

    pub fn broadcast(&mut self, event: &IpcEvent) {
        self.accept_connections();

        let json = match serde_json::to_string(event) {
            Ok(j) => j,
            Err(e) => {
                log::warn!("Failed to serialize IPC event: {}", e);
                return;
            }
        };

        let msg = format!("{}\n", json);
        let mut disconnected = Vec::new();

        for (&id, stream) in &mut self.clients {
            if let Err(e) = stream.write_all(msg.as_bytes()) {
                log::warn!("Failed to send to IPC client {}: {}", id, e);
                disconnected.push(id);
            }
        }

        for id in disconnected {
            self.clients.remove(&id);
            log::info!("IPC client {} disconnected", id);
        }
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }
}

impl StatusBar for IpcServer {
    fn repaint(&mut self, snapshot: &StatusSnapshot) {
        self.broadcast(&IpcEvent::State {
            workspaces: snapshot.workspaces.clone(),
            active_workspace: snapshot.active_workspace,
            focused_window: snapshot.focused_window,
        });
    }

    fn workspace_changed(&mut self, snapshot: &StatusSnapshot) {
        log::debug!(
            "[ipc] Broadcasting workspace change: active={} clients={}",
            snapshot.active_workspace,
            self.client_count()
        );
        self.broadcast(&IpcEvent::WorkspaceChanged {
            workspaces: snapshot.workspaces.clone(),
            active_workspace: snapshot.active_workspace,
        });
    }
}

impl Drop for IpcServer {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stackwm_common::WorkspaceInfo;
    use std::io::{BufRead, BufReader};

    #[test]
    fn test_broadcast_reaches_client() {
        let path = std::env::temp_dir().join(format!("stackwm-ipc-{}.sock", std::process::id()));
        let mut server = IpcServer::bind(&path).unwrap();
        let client = UnixStream::connect(&path).unwrap();

        let snapshot = StatusSnapshot {
            workspaces: vec![WorkspaceInfo::new(0, 1), WorkspaceInfo::new(1, 0)],
            active_workspace: 1,
            focused_window: None,
        };
        server.workspace_changed(&snapshot);
        assert_eq!(server.client_count(), 1);

        let mut line = String::new();
        BufReader::new(client).read_line(&mut line).unwrap();
        let event: IpcEvent = serde_json::from_str(line.trim()).unwrap();
        assert_eq!(
            event,
            IpcEvent::WorkspaceChanged {
                workspaces: snapshot.workspaces.clone(),
                active_workspace: 1,
            }
        );

        drop(server);
        assert!(!path.exists());
    }
}
