//! Configuration loaded from config.toml
//!
//! Every section has serde defaults so a missing or partial file still
//! yields a working setup. Timing values mirror the settle delays the OS
//! input queue needs between synthesized events.

use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub screen: ScreenConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub grids: GridsConfig,
    #[serde(default)]
    pub element: ElementConfig,
}

// ============================================================================
// Screen
// ============================================================================

/// Fallback screen size, used when the pointer backend cannot report one
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct ScreenConfig {
    #[serde(default = "default_screen_width")]
    pub width: i32,
    #[serde(default = "default_screen_height")]
    pub height: i32,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            width: default_screen_width(),
            height: default_screen_height(),
        }
    }
}

fn default_screen_width() -> i32 {
    1920
}
fn default_screen_height() -> i32 {
    1080
}

// ============================================================================
// Timing
// ============================================================================

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct TimingConfig {
    /// Pause between press / cursor move / release during a drag (ms)
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
    /// Pause after releasing a drag before the trailing action (ms)
    #[serde(default = "default_release_settle_ms")]
    pub release_settle_ms: u64,
    /// Pause after an overlay is confirmed gone, before synthesizing input (ms)
    #[serde(default = "default_post_dismiss_ms")]
    pub post_dismiss_ms: u64,
    /// Window-state poll interval (ms)
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// How long to wait for an overlay to appear (ms)
    #[serde(default = "default_show_timeout_ms")]
    pub show_timeout_ms: u64,
    /// How long to wait for an overlay to go away (ms)
    #[serde(default = "default_dismiss_timeout_ms")]
    pub dismiss_timeout_ms: u64,
}

impl TimingConfig {
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
    pub fn release_settle(&self) -> Duration {
        Duration::from_millis(self.release_settle_ms)
    }
    pub fn post_dismiss(&self) -> Duration {
        Duration::from_millis(self.post_dismiss_ms)
    }
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
    pub fn show_timeout(&self) -> Duration {
        Duration::from_millis(self.show_timeout_ms)
    }
    pub fn dismiss_timeout(&self) -> Duration {
        Duration::from_millis(self.dismiss_timeout_ms)
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            settle_ms: default_settle_ms(),
            release_settle_ms: default_release_settle_ms(),
            post_dismiss_ms: default_post_dismiss_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            show_timeout_ms: default_show_timeout_ms(),
            dismiss_timeout_ms: default_dismiss_timeout_ms(),
        }
    }
}

fn default_settle_ms() -> u64 {
    100
}
fn default_release_settle_ms() -> u64 {
    300
}
fn default_post_dismiss_ms() -> u64 {
    100
}
fn default_poll_interval_ms() -> u64 {
    50
}
fn default_show_timeout_ms() -> u64 {
    5000
}
fn default_dismiss_timeout_ms() -> u64 {
    5000
}

// ============================================================================
// Grids
// ============================================================================

/// Row/column counts and overlay launch command for one grid family
#[derive(Debug, Deserialize, Clone)]
pub struct GridLayout {
    pub rows: u32,
    pub columns: u32,
    /// Command line that launches the overlay helper for this grid
    #[serde(default)]
    pub command: Vec<String>,
}

impl GridLayout {
    fn new(rows: u32, columns: u32, kind: &str) -> Self {
        Self {
            rows,
            columns,
            command: vec!["gridpilot-overlay".to_string(), kind.to_string()],
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct GridsConfig {
    #[serde(default = "default_douglas")]
    pub douglas: GridLayout,
    #[serde(default = "default_rainbow")]
    pub rainbow: GridLayout,
    #[serde(default = "default_sudoku")]
    pub sudoku: GridLayout,
    #[serde(default = "default_legion")]
    pub legion: GridLayout,
}

impl Default for GridsConfig {
    fn default() -> Self {
        Self {
            douglas: default_douglas(),
            rainbow: default_rainbow(),
            sudoku: default_sudoku(),
            legion: default_legion(),
        }
    }
}

fn default_douglas() -> GridLayout {
    GridLayout::new(8, 12, "douglas")
}
fn default_rainbow() -> GridLayout {
    GridLayout::new(13, 26, "rainbow")
}
fn default_sudoku() -> GridLayout {
    GridLayout::new(9, 9, "sudoku")
}
fn default_legion() -> GridLayout {
    GridLayout::new(10, 10, "legion")
}

// ============================================================================
// Element helper
// ============================================================================

#[derive(Debug, Deserialize, Clone)]
pub struct ElementConfig {
    #[serde(default = "default_element_host")]
    pub host: String,
    #[serde(default = "default_element_port")]
    pub port: u16,
    /// Command line that launches the element helper process
    #[serde(default = "default_element_command")]
    pub command: Vec<String>,
    /// Where clipboard slots are persisted
    #[serde(default = "default_clipboard_path")]
    pub clipboard_path: String,
    /// Request timeout (ms)
    #[serde(default = "default_element_timeout_ms")]
    pub timeout_ms: u64,
}

impl ElementConfig {
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for ElementConfig {
    fn default() -> Self {
        Self {
            host: default_element_host(),
            port: default_element_port(),
            command: default_element_command(),
            clipboard_path: default_clipboard_path(),
            timeout_ms: default_element_timeout_ms(),
        }
    }
}

fn default_element_host() -> String {
    "127.0.0.1".into()
}
fn default_element_port() -> u16 {
    1337
}
fn default_element_command() -> Vec<String> {
    vec!["gridpilot-element".into()]
}
fn default_clipboard_path() -> String {
    "clipboard.json".into()
}
fn default_element_timeout_ms() -> u64 {
    2000
}

impl Config {
    /// Load from the given path, falling back to `config.toml`, falling
    /// back to defaults. A malformed file is reported and ignored rather
    /// than aborting startup.
    pub fn load(path: Option<&Path>) -> Self {
        let path = path.unwrap_or_else(|| Path::new("config.toml"));
        if !path.exists() {
            return Config::default();
        }
        match fs::read_to_string(path) {
            Ok(text) => match toml::from_str(&text) {
                Ok(config) => config,
                Err(e) => {
                    log::warn!("ignoring malformed {}: {}", path.display(), e);
                    Config::default()
                }
            },
            Err(e) => {
                log::warn!("could not read {}: {}", path.display(), e);
                Config::default()
            }
        }
    }
}
