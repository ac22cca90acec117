use std::path::PathBuf;

pub fn config_dir() -> PathBuf {
    if let Some(xdg_config) = non_empty_env("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg_config);
    }
    if let Some(home) = non_empty_env("HOME") {
        return PathBuf::from(home).join(".config");
    }
    PathBuf::from("/tmp")
}

pub fn data_dir() -> PathBuf {
    if let Some(xdg_data) = non_empty_env("XDG_DATA_HOME") {
        return PathBuf::from(xdg_data);
    }
    if let Some(home) = non_empty_env("HOME") {
        return PathBuf::from(home).join(".local").join("share");
    }
    PathBuf::from("/tmp")
}

pub fn stackwm_config_dir() -> PathBuf {
    config_dir().join("stackwm")
}

pub fn stackwm_log_dir() -> PathBuf {
    data_dir().join("stackwm").join("logs")
}

/// System-wide fallback consulted when the user has no config file.
pub fn system_config_path() -> PathBuf {
    PathBuf::from("/etc/stackwm/config.toml")
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}
