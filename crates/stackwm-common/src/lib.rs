pub mod ipc;
pub mod logging;
pub mod paths;

pub use ipc::{ipc_socket_path, IpcEvent, WorkspaceInfo};
pub use logging::FileLogger;
pub use paths::{config_dir, data_dir, stackwm_config_dir, stackwm_log_dir, system_config_path};
