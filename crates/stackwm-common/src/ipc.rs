use serde::{Deserialize, Serialize};

/// Messages broadcast to status clients, one JSON object per line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum IpcEvent {
    #[serde(rename = "state")]
    State {
        workspaces: Vec<WorkspaceInfo>,
        active_workspace: usize,
        focused_window: Option<u32>,
    },
    #[serde(rename = "workspace")]
    WorkspaceChanged {
        workspaces: Vec<WorkspaceInfo>,
        active_workspace: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceInfo {
    pub id: usize,
    pub name: String,
    pub window_count: usize,
}

impl WorkspaceInfo {
    /// `id` is zero-based; the displayed name is one-based.
    pub fn new(id: usize, window_count: usize) -> Self {
        Self {
            id,
            name: (id + 1).to_string(),
            window_count,
        }
    }
}

pub fn ipc_socket_path() -> std::path::PathBuf {
    match std::env::var("XDG_RUNTIME_DIR") {
        Ok(runtime_dir) if !runtime_dir.is_empty() => {
            std::path::PathBuf::from(runtime_dir).join("stackwm.sock")
        }
        _ => std::path::PathBuf::from("/tmp")
            .join(format!("stackwm-{}.sock", unsafe { libc::getuid() })),
    }
}
