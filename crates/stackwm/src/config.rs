use serde::Deserialize;
use stackwm_common::{stackwm_config_dir, system_config_path};
use std::path::{Path, PathBuf};

use crate::registry::RemovalPolicy;
use crate::window_system::Modifiers;
use crate::workspace::WorkspaceTarget;

fn default_gap() -> i32 {
    15
}
fn default_bar_height() -> i32 {
    35
}

fn default_master_ratio() -> f64 {
    0.5
}
fn default_workspaces() -> usize {
    4
}
fn default_max_clients() -> usize {
    100
}

fn default_resize_button() -> u8 {
    1
}
fn default_resize_modifier() -> String {
    "alt".to_string()
}

fn default_ipc() -> bool {
    true
}

fn default_mod_key() -> String {
    "super".to_string()
}

pub const DEFAULT_RESIZE_STEP: i32 = 10;
pub const MAX_RESIZE_STEP: i32 = 1000;
pub const MAX_GAP: i32 = 500;
pub const MAX_BAR_HEIGHT: i32 = 500;

fn bind(key: &str, action: &str) -> KeybindEntry {
    KeybindEntry {
        key: key.to_string(),
        action: action.to_string(),
    }
}

fn default_bindings() -> Vec<KeybindEntry> {
    vec![
        bind("alt+tab", "focus next"),
        bind("alt+up", "resize grow 10"),
        bind("alt+down", "resize shrink 10"),
        bind("mod+q", "exec kitty"),
        bind("mod+t", "exec xterm"),
        bind("mod+f", "exec firefox"),
        bind("mod+r", "exec rofi -show drun"),
        bind("mod+k", "kill"),
        bind("mod+1", "workspace 1"),
        bind("mod+2", "workspace 2"),
        bind("mod+3", "workspace 3"),
        bind("mod+4", "workspace 4"),
        bind("ctrl+alt+q", "exit"),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Prev,
}

impl Direction {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "next" | "n" => Some(Direction::Next),
            "prev" | "previous" | "p" => Some(Direction::Prev),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeDirection {
    Grow,
    Shrink,
}

impl ResizeDirection {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "grow" | "+" | "up" => Some(ResizeDirection::Grow),
            "shrink" | "-" | "down" => Some(ResizeDirection::Shrink),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Exit,
    Exec { program: String, args: Vec<String> },
    Kill,
    Focus(Direction),
    Resize {
        direction: ResizeDirection,
        amount: i32,
    },
    Workspace(WorkspaceTarget),
}

impl Action {
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let (cmd, args) = match s.find(' ') {
            Some(i) => (s[..i].trim(), s[i + 1..].trim()),
            None => (s, ""),
        };

        match cmd.to_lowercase().as_str() {
            "exit" | "quit" => Some(Action::Exit),
            "exec" | "spawn" => {
                let mut words = args.split_whitespace().map(str::to_string);
                let program = words.next()?;
                Some(Action::Exec {
                    program,
                    args: words.collect(),
                })
            }
            "kill" | "kill_window" | "killactive" => Some(Action::Kill),
            "focus" | "focus_window" => {
                if args.is_empty() {
                    Some(Action::Focus(Direction::Next))
                } else {
                    Direction::parse(args).map(Action::Focus)
                }
            }
            "focus_next" => Some(Action::Focus(Direction::Next)),
            "focus_prev" => Some(Action::Focus(Direction::Prev)),
            "resize" | "resizeactive" => {
                let parts: Vec<&str> = args.split_whitespace().collect();
                let direction = ResizeDirection::parse(parts.first()?)?;
                let amount = match parts.get(1) {
                    Some(n) => n.parse::<i32>().ok()?.clamp(1, MAX_RESIZE_STEP),
                    None => DEFAULT_RESIZE_STEP,
                };
                Some(Action::Resize { direction, amount })
            }
            "workspace" | "switch_workspace" => WorkspaceTarget::parse(args).map(Action::Workspace),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct KeybindEntry {
    pub key: String,
    pub action: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub appearance: AppearanceConfig,
    pub layout: LayoutConfig,
    pub mouse: MouseConfig,
    pub status: StatusConfig,
    pub keybinds: KeybindsConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AppearanceConfig {
    #[serde(default = "default_gap")]
    pub gap: i32,
    #[serde(default = "default_bar_height")]
    pub bar_height: i32,
}

impl Default for AppearanceConfig {
    fn default() -> Self {
        Self {
            gap: default_gap(),
            bar_height: default_bar_height(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LayoutConfig {
    #[serde(default = "default_master_ratio")]
    pub master_ratio: f64,
    #[serde(default = "default_workspaces")]
    pub workspaces: usize,
    #[serde(default = "default_max_clients")]
    pub max_clients: usize,
    pub removal: RemovalPolicy,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            master_ratio: default_master_ratio(),
            workspaces: default_workspaces(),
            max_clients: default_max_clients(),
            removal: RemovalPolicy::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MouseConfig {
    #[serde(default = "default_resize_button")]
    pub resize_button: u8,
    #[serde(default = "default_resize_modifier")]
    pub resize_modifier: String,
}

impl Default for MouseConfig {
    fn default() -> Self {
        Self {
            resize_button: default_resize_button(),
            resize_modifier: default_resize_modifier(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StatusConfig {
    #[serde(default = "default_ipc")]
    pub ipc: bool,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self { ipc: default_ipc() }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct KeybindsConfig {
    #[serde(default = "default_mod_key")]
    pub mod_key: String,
    #[serde(default = "default_bindings")]
    pub bind: Vec<KeybindEntry>,
}

impl Default for KeybindsConfig {
    fn default() -> Self {
        Self {
            mod_key: default_mod_key(),
            bind: default_bindings(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Keybind {
    pub modifiers: Modifiers,
    pub keysym: u32,
}

impl KeybindsConfig {
    /// Applies one modifier token to `mods`; false if `token` is not a modifier.
    fn apply_modifier(&self, token: &str, mods: &mut Modifiers) -> bool {
        match token {
            "ctrl" | "control" => mods.ctrl = true,
            "alt" | "mod1" => mods.alt = true,
            "shift" => mods.shift = true,
            "super" | "mod4" | "logo" | "win" | "meta" => mods.super_key = true,
            "mod" => {
                let key = self.mod_key.to_lowercase();
                if key == "mod" || !self.apply_modifier(&key, mods) {
                    mods.super_key = true;
                }
            }
            _ => return false,
        }
        true
    }

    pub fn parse_modifiers(&self, chord: &str) -> Option<Modifiers> {
        let mut mods = Modifiers::NONE;
        for part in chord.split('+') {
            let part = part.trim().to_lowercase();
            if part.is_empty() || part == "none" {
                continue;
            }
            if !self.apply_modifier(&part, &mut mods) {
                return None;
            }
        }
        Some(mods)
    }

    pub fn parse_keybind(&self, bind_str: &str) -> Option<Keybind> {
        let mut modifiers = Modifiers::NONE;
        let mut key_part: Option<String> = None;

        for part in bind_str.split('+') {
            let part = part.trim().to_lowercase();
            if !self.apply_modifier(&part, &mut modifiers) {
                if key_part.is_some() {
                    return None;
                }
                key_part = Some(part);
            }
        }

        let keysym = keysym_from_name(&key_part?)?;
        Some(Keybind { modifiers, keysym })
    }

    /// Parsed bindings in table order. Entries that fail to parse are skipped.
    pub fn get_all_bindings(&self) -> Vec<(Keybind, Action)> {
        self.bind
            .iter()
            .filter_map(|entry| {
                let Some(keybind) = self.parse_keybind(&entry.key) else {
                    log::warn!("Ignoring binding with invalid key '{}'", entry.key);
                    return None;
                };
                let Some(action) = Action::parse(&entry.action) else {
                    log::warn!(
                        "Ignoring binding '{}' with invalid action '{}'",
                        entry.key,
                        entry.action
                    );
                    return None;
                };
                Some((keybind, action))
            })
            .collect()
    }
}

pub fn keysym_from_name(name: &str) -> Option<u32> {
    use xkbcommon::xkb::keysyms::*;

    let name = name.to_lowercase();
    let mut chars = name.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        // Latin-1 keysyms share their character's code point.
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            return Some(c as u32);
        }
    }

    Some(match name.as_str() {
        "return" | "enter" | "ret" => KEY_Return,
        "escape" | "esc" => KEY_Escape,
        "tab" => KEY_Tab,
        "space" | "spc" => KEY_space,
        "backspace" | "bksp" => KEY_BackSpace,
        "delete" | "del" => KEY_Delete,
        "insert" | "ins" => KEY_Insert,
        "home" => KEY_Home,
        "end" => KEY_End,
        "pageup" | "page_up" | "prior" => KEY_Page_Up,
        "pagedown" | "page_down" | "next" => KEY_Page_Down,
        "up" => KEY_Up,
        "down" => KEY_Down,
        "left" => KEY_Left,
        "right" => KEY_Right,
        "print" => KEY_Print,
        "minus" | "-" => KEY_minus,
        "equal" | "=" => KEY_equal,
        "comma" | "," => KEY_comma,
        "period" | "." => KEY_period,
        "slash" | "/" => KEY_slash,
        "semicolon" | ";" => KEY_semicolon,
        "bracketleft" | "[" => KEY_bracketleft,
        "bracketright" | "]" => KEY_bracketright,
        "grave" | "`" => KEY_grave,
        "f1" => KEY_F1,
        "f2" => KEY_F2,
        "f3" => KEY_F3,
        "f4" => KEY_F4,
        "f5" => KEY_F5,
        "f6" => KEY_F6,
        "f7" => KEY_F7,
        "f8" => KEY_F8,
        "f9" => KEY_F9,
        "f10" => KEY_F10,
        "f11" => KEY_F11,
        "f12" => KEY_F12,
        _ => return None,
    })
}

impl Config {
    /// Files tried in order: `path` alone when given, else the user config
    /// then the system config.
    pub fn candidates(path: Option<&Path>) -> Vec<PathBuf> {
        match path {
            Some(p) => vec![p.to_path_buf()],
            None => vec![
                stackwm_config_dir().join("config.toml"),
                system_config_path(),
            ],
        }
    }

    /// Loads the first readable file from [`Config::candidates`], else
    /// defaults. Unreadable files are logged and skipped.
    pub fn load(path: Option<&Path>) -> Self {
        for candidate in Self::candidates(path) {
            if !candidate.exists() {
                if path.is_some() {
                    log::warn!("Config file {} does not exist", candidate.display());
                }
                continue;
            }
            match Self::load_from_path(&candidate) {
                Ok(config) => {
                    log::info!("Loaded config from {}", candidate.display());
                    return config;
                }
                Err(e) => {
                    log::warn!("Failed to load {}: {}", candidate.display(), e);
                }
            }
        }

        log::info!("Using default configuration");
        Self::default()
    }

    pub fn load_from_path(path: &Path) -> Result<Self, String> {
        let content =
            std::fs::read_to_string(path).map_err(|e| format!("Failed to read file: {}", e))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    pub fn gap(&self) -> i32 {
        self.appearance.gap.clamp(0, MAX_GAP)
    }

    pub fn bar_height(&self) -> i32 {
        self.appearance.bar_height.clamp(0, MAX_BAR_HEIGHT)
    }

    pub fn max_clients(&self) -> usize {
        self.layout.max_clients.max(1)
    }

    pub fn resize_modifier(&self) -> Modifiers {
        match self.keybinds.parse_modifiers(&self.mouse.resize_modifier) {
            Some(mods) => mods,
            None => {
                log::warn!(
                    "Invalid resize modifier '{}', using alt",
                    self.mouse.resize_modifier
                );
                Modifiers::ALT
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xkbcommon::xkb::keysyms::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.gap(), 15);
        assert_eq!(config.bar_height(), 35);
        assert_eq!(config.layout.workspaces, 4);
        assert_eq!(config.max_clients(), 100);
        assert_eq!(config.layout.removal, RemovalPolicy::Stable);
        assert_eq!(config.mouse.resize_button, 1);
        assert_eq!(config.resize_modifier(), Modifiers::ALT);
    }

    #[test]
    fn test_default_bindings_all_parse() {
        let config = Config::default();
        let bindings = config.keybinds.get_all_bindings();
        assert_eq!(bindings.len(), config.keybinds.bind.len());

        let (alt_tab, action) = &bindings[0];
        assert_eq!(alt_tab.keysym, KEY_Tab);
        assert_eq!(alt_tab.modifiers, Modifiers::ALT);
        assert_eq!(*action, Action::Focus(Direction::Next));
    }

    #[test]
    fn test_parse_partial_toml() {
        let config = Config::parse(
            r#"
            [appearance]
            gap = 4

            [layout]
            master_ratio = 0.6
            removal = "swap_with_last"

            [keybinds]
            mod_key = "alt"
            bind = [{ key = "mod+Return", action = "exec alacritty -e htop" }]
            "#,
        )
        .unwrap();

        assert_eq!(config.gap(), 4);
        assert_eq!(config.bar_height(), 35);
        assert_eq!(config.layout.master_ratio, 0.6);
        assert_eq!(config.layout.workspaces, 4);
        assert_eq!(config.layout.removal, RemovalPolicy::SwapWithLast);

        let bindings = config.keybinds.get_all_bindings();
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].0.modifiers, Modifiers::ALT);
        assert_eq!(bindings[0].0.keysym, KEY_Return);
        assert_eq!(
            bindings[0].1,
            Action::Exec {
                program: "alacritty".to_string(),
                args: vec!["-e".to_string(), "htop".to_string()],
            }
        );
    }

    #[test]
    fn test_appearance_values_are_clamped() {
        let config = Config::parse(
            "[appearance]\ngap = 2147483647\nbar_height = -5",
        )
        .unwrap();
        assert_eq!(config.gap(), MAX_GAP);
        assert_eq!(config.bar_height(), 0);
    }

    #[test]
    fn test_candidates() {
        let explicit = Path::new("/tmp/stackwm-test.toml");
        assert_eq!(Config::candidates(Some(explicit)), vec![explicit.to_path_buf()]);

        let defaults = Config::candidates(None);
        assert_eq!(defaults.len(), 2);
        assert_eq!(defaults[0], stackwm_config_dir().join("config.toml"));
        assert_eq!(defaults[1], system_config_path());
    }

    #[test]
    fn test_invalid_toml() {
        assert!(Config::parse("[layout\nworkspaces = 3").is_err());
        assert!(Config::parse("[layout]\nremoval = \"random\"").is_err());
    }

    #[test]
    fn test_parse_keybind() {
        let keybinds = KeybindsConfig::default();

        let kb = keybinds.parse_keybind("mod+shift+1").unwrap();
        assert_eq!(kb.keysym, KEY_1);
        assert!(kb.modifiers.super_key && kb.modifiers.shift);
        assert!(!kb.modifiers.alt);

        let kb = keybinds.parse_keybind("Ctrl+Alt+Q").unwrap();
        assert_eq!(kb.keysym, KEY_q);
        assert!(kb.modifiers.ctrl && kb.modifiers.alt);

        assert!(keybinds.parse_keybind("mod+shift").is_none());
        assert!(keybinds.parse_keybind("mod+a+b").is_none());
        assert!(keybinds.parse_keybind("mod+nosuchkey").is_none());
    }

    #[test]
    fn test_invalid_entries_are_skipped() {
        let keybinds = KeybindsConfig {
            mod_key: "super".to_string(),
            bind: vec![
                bind("mod+x", "frobnicate"),
                bind("mod+", "kill"),
                bind("mod+j", "focus prev"),
            ],
        };
        let bindings = keybinds.get_all_bindings();
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].1, Action::Focus(Direction::Prev));
    }

    #[test]
    fn test_parse_actions() {
        assert_eq!(Action::parse("exit"), Some(Action::Exit));
        assert_eq!(Action::parse("kill"), Some(Action::Kill));
        assert_eq!(Action::parse("focus"), Some(Action::Focus(Direction::Next)));
        assert_eq!(
            Action::parse("resize shrink"),
            Some(Action::Resize {
                direction: ResizeDirection::Shrink,
                amount: 10
            })
        );
        assert_eq!(
            Action::parse("resize grow 25"),
            Some(Action::Resize {
                direction: ResizeDirection::Grow,
                amount: 25
            })
        );
        assert_eq!(
            Action::parse("resize grow 2147483647"),
            Some(Action::Resize {
                direction: ResizeDirection::Grow,
                amount: MAX_RESIZE_STEP
            })
        );
        assert_eq!(
            Action::parse("resize shrink -40"),
            Some(Action::Resize {
                direction: ResizeDirection::Shrink,
                amount: 1
            })
        );
        assert_eq!(
            Action::parse("workspace 2"),
            Some(Action::Workspace(WorkspaceTarget::Index(1)))
        );
        assert_eq!(Action::parse("workspace"), None);
        assert_eq!(Action::parse("exec"), None);
        assert_eq!(Action::parse("resize sideways"), None);
    }

    #[test]
    fn test_resize_modifier_fallback() {
        let mut config = Config::default();
        config.mouse.resize_modifier = "super+shift".to_string();
        assert_eq!(
            config.resize_modifier(),
            Modifiers {
                shift: true,
                ..Modifiers::SUPER
            }
        );
        config.mouse.resize_modifier = "hyper".to_string();
        assert_eq!(config.resize_modifier(), Modifiers::ALT);
    }

    #[test]
    fn test_keysym_names() {
        assert_eq!(keysym_from_name("a"), Some(KEY_a));
        assert_eq!(keysym_from_name("Z"), Some(KEY_z));
        assert_eq!(keysym_from_name("7"), Some(KEY_7));
        assert_eq!(keysym_from_name("Up"), Some(KEY_Up));
        assert_eq!(keysym_from_name("F11"), Some(KEY_F11));
        assert_eq!(keysym_from_name("é"), None);
    }
}
