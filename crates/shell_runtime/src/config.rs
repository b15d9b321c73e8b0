//! Tunable shell constants, loadable from TOML.

use serde::{Deserialize, Serialize};

use crate::model::{Size, SpawnSize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
/// Shell configuration. Missing sections and keys fall back to their defaults.
pub struct ShellConfig {
    /// Window geometry defaults.
    pub windows: WindowConfig,
    /// Grid sizing and resize observation.
    pub grids: GridConfig,
    /// Launcher pointer handling.
    pub launchers: LauncherConfig,
    /// System lifecycle timings.
    pub system: SystemConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Global minimum for spawn clamping when a program declares none.
    pub min_size: Size,
    /// Spawn size for programs without a spawn spec.
    pub default_spawn: SpawnSize,
    /// Drag keeps at least this many pixels of title bar above the home grid's bottom edge.
    pub title_bar_height: i32,
    /// Mobile windows start below the status bar.
    pub mobile_top_offset: i32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            min_size: Size::new(400, 300),
            default_spawn: SpawnSize::percent(0.5, 0.5),
            title_bar_height: 20,
            mobile_top_offset: 28,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub desktop_icon_size: u32,
    pub panel_icon_size: u32,
    pub mobile_icon_size: u32,
    /// Added to the icon size to get the cell pitch.
    pub icon_margin: u32,
    pub resize_debounce_ms: u64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            desktop_icon_size: 40,
            panel_icon_size: 42,
            mobile_icon_size: 48,
            icon_margin: 40,
            resize_debounce_ms: 250,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherConfig {
    /// Two pointer-downs on the same home icon within this window open it.
    pub double_click_ms: u64,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            double_click_ms: 400,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    pub reboot_delay_ms: u64,
    /// Used until the host reports a measured viewport.
    pub default_viewport: Size,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            reboot_delay_ms: 2_500,
            default_viewport: Size::new(1920, 1080),
        }
    }
}

impl ShellConfig {
    /// Parses a TOML document, defaulting anything it omits.
    ///
    /// # Errors
    ///
    /// Returns an error string when the document is not valid TOML or a key has the wrong type.
    pub fn from_toml_str(raw: &str) -> Result<Self, String> {
        toml::from_str(raw).map_err(|err| err.to_string())
    }
}
