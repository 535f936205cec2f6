//! Settings persistence for MBMP
//!
//! Settings live in a single TOML file split into the groups the player
//! has always used: `Preferences`, `Notifications`, `StartOptions`,
//! `State` and `Playlist`. Window geometry is stored in `State` as
//! `{name}_vis`, `{name}_size` and `{name}_pos` triplets.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::utils::error::{IntoPlayerError, MbmpError, Result};

/// Largest volume the engine accepts on its linear scale
pub const MAX_VOLUME: f64 = 10.0;

/// Log levels accepted in the settings file
const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Main settings document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// General preferences
    #[serde(rename = "Preferences")]
    pub preferences: Preferences,

    /// Desktop notification settings
    #[serde(rename = "Notifications")]
    pub notifications: Notifications,

    /// Options applied when the player starts
    #[serde(rename = "StartOptions")]
    pub start_options: StartOptions,

    /// Saved window state, flat `{name}_{field}` keys
    #[serde(rename = "State")]
    pub state: BTreeMap<String, StateValue>,

    /// Saved playlist
    #[serde(rename = "Playlist")]
    pub playlist: PlaylistState,
}

/// General preferences
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// Apply the start options at startup
    pub use_startoptions: bool,

    /// Remember window geometry between runs
    pub retain_state: bool,

    /// Remember the playlist between runs
    pub retain_playlist: bool,

    /// Hide tooltips
    pub disable_tooltips: bool,

    /// Suspend the X screensaver while playing
    pub disable_xscreensaver: bool,
}

/// Desktop notification settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Notifications {
    /// Forward player notifications to the notification daemon
    pub use_notifications: bool,
}

/// Options applied when the player starts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StartOptions {
    /// Start in fullscreen mode
    pub start_fullscreen: bool,

    /// Start with the full interface shown
    pub start_gui: bool,

    /// Use a named icon theme
    pub use_icon_theme: bool,

    /// Icon theme name
    pub icon_theme_name: String,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Enable the audio visualizer
    pub start_visualizer: bool,

    /// Enable subtitle rendering
    pub start_subtitles: bool,

    /// Enable stream buffering
    pub use_stream_buffering: bool,

    /// Enable progressive download buffering
    pub use_download_buffering: bool,

    /// Audio CD device
    pub audio_cd_drive: String,

    /// DVD device
    pub dvd_drive: String,

    /// Connection speed hint in kbps, 0 means unknown
    pub connection_speed: u64,

    /// Initial volume on the engine's linear 0.0 - 10.0 scale
    pub volume: f64,

    /// Elements to promote during autoplugging
    #[serde(rename = "promoted-elements")]
    pub promoted_elements: String,

    /// Elements to keep out of autoplugging
    #[serde(rename = "blacklisted-elements")]
    pub blacklisted_elements: String,
}

/// A single value in the `State` group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StateValue {
    /// `{name}_vis`
    Flag(bool),

    /// `{name}_size` or `{name}_pos`
    Pair([i32; 2]),
}

/// Saved geometry of one window or dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementGeometry {
    /// Whether the element was visible
    pub visible: bool,

    /// Width and height
    pub size: (i32, i32),

    /// Top left corner
    pub pos: (i32, i32),
}

/// Saved playlist
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaylistState {
    /// Ordered playlist entries
    pub entries: Vec<String>,

    /// Index of the current entry
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<usize>,

    /// Scroll position of the playlist view
    pub position: i32,
}

impl Default for StartOptions {
    fn default() -> Self {
        Self {
            start_fullscreen: false,
            start_gui: true,
            use_icon_theme: false,
            icon_theme_name: String::new(),
            log_level: "info".to_string(),
            start_visualizer: false,
            start_subtitles: false,
            use_stream_buffering: false,
            use_download_buffering: false,
            audio_cd_drive: "/dev/cdrom".to_string(),
            dvd_drive: "/dev/dvd".to_string(),
            connection_speed: 0,
            volume: 1.0,
            promoted_elements: String::new(),
            blacklisted_elements: String::new(),
        }
    }
}

impl Settings {
    /// Load settings from the user settings file and the environment
    ///
    /// A missing file is not an error, defaults are used instead.
    pub fn load() -> Result<Self> {
        let mut settings = match Self::user_settings_path() {
            Some(path) if path.exists() => Self::load_from(&path)?,
            _ => Self::default(),
        };

        settings.apply_env_overrides()?;
        settings.validate()?;

        Ok(settings)
    }

    /// Load settings from a specific TOML file
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .config_err("Failed to read settings file")?;

        let settings: Settings = toml::from_str(&contents)
            .config_err("Failed to parse settings file")?;

        debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Save settings to the user settings file
    pub fn save(&self) -> Result<()> {
        let path = Self::user_settings_path()
            .ok_or_else(|| MbmpError::Config("Cannot determine user settings path".to_string()))?;

        self.save_to(&path)
    }

    /// Save settings to a specific TOML file, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .config_err("Failed to create settings directory")?;
        }

        let toml = toml::to_string_pretty(self)
            .config_err("Failed to serialize settings")?;

        std::fs::write(path, toml)
            .config_err("Failed to write settings file")?;

        debug!("Saved settings to {}", path.display());
        Ok(())
    }

    /// Look up a single setting by group and key
    ///
    /// # Arguments
    ///
    /// * `group` - Group name, e.g. "StartOptions"
    /// * `key` - Key inside the group, e.g. "connection_speed"
    pub fn get_setting(&self, group: &str, key: &str) -> Option<toml::Value> {
        let document = match toml::Value::try_from(self) {
            Ok(document) => document,
            Err(e) => {
                warn!("Could not serialize settings for lookup: {}", e);
                return None;
            }
        };

        document.get(group)?.get(key).cloned()
    }

    /// Save the geometry of a window or dialog
    pub fn save_element_geometry(
        &mut self,
        name: &str,
        visible: bool,
        size: (i32, i32),
        pos: (i32, i32),
    ) {
        self.state.insert(format!("{}_vis", name), StateValue::Flag(visible));
        self.state.insert(format!("{}_size", name), StateValue::Pair([size.0, size.1]));
        self.state.insert(format!("{}_pos", name), StateValue::Pair([pos.0, pos.1]));
    }

    /// Restore the geometry of a window or dialog
    ///
    /// Returns `None` unless the element was saved as visible; hidden
    /// elements keep whatever geometry the toolkit gives them.
    pub fn restore_element_geometry(&self, name: &str) -> Option<ElementGeometry> {
        match self.state.get(&format!("{}_vis", name)) {
            Some(StateValue::Flag(true)) => {}
            _ => return None,
        }

        let pair = |field: &str| match self.state.get(&format!("{}_{}", name, field)) {
            Some(StateValue::Pair([a, b])) => (*a, *b),
            _ => (0, 0),
        };

        Some(ElementGeometry {
            visible: true,
            size: pair("size"),
            pos: pair("pos"),
        })
    }

    /// Save the playlist
    pub fn save_playlist(&mut self, entries: Vec<String>, current: Option<usize>, position: i32) {
        self.playlist = PlaylistState { entries, current, position };
    }

    /// Saved playlist entries
    pub fn playlist_entries(&self) -> &[String] {
        &self.playlist.entries
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from a variable lookup (MBMP_* names)
    fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup("MBMP_LOG_LEVEL") {
            self.start_options.log_level = level;
        }

        if let Some(speed) = lookup("MBMP_CONNECTION_SPEED") {
            self.start_options.connection_speed = speed.parse()
                .map_err(|_| MbmpError::Config("Invalid MBMP_CONNECTION_SPEED".to_string()))?;
        }

        if let Some(volume) = lookup("MBMP_VOLUME") {
            self.start_options.volume = volume.parse()
                .map_err(|_| MbmpError::Config("Invalid MBMP_VOLUME".to_string()))?;
        }

        Ok(())
    }

    /// Validate settings values
    fn validate(&self) -> Result<()> {
        if !(0.0..=MAX_VOLUME).contains(&self.start_options.volume) {
            return Err(MbmpError::Config(format!(
                "Volume must be between 0.0 and {}", MAX_VOLUME
            )));
        }

        if !VALID_LOG_LEVELS.contains(&self.start_options.log_level.as_str()) {
            return Err(MbmpError::Config(format!(
                "Invalid log level '{}', must be one of: {:?}",
                self.start_options.log_level,
                VALID_LOG_LEVELS
            )));
        }

        Ok(())
    }

    /// Get user settings file path
    fn user_settings_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("mbmp").join("mbmp.toml"))
    }
}
