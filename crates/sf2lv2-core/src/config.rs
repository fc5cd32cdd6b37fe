//! Plugin and engine configuration.
//!
//! [`PluginConfig`] is the compile-time identity of a generated plugin
//! (URI, display name, bundled resource names). [`EngineSettings`] holds
//! the engine tuning, which a bundle may override through an optional JSON
//! file next to the SoundFont.
//!
//! # Example
//!
//! ```ignore
//! use sf2lv2_core::PluginConfig;
//!
//! pub static CONFIG: PluginConfig =
//!     PluginConfig::new(c"https://github.com/islainstruments/sf2lv2/piano", "Piano")
//!         .with_soundfont_file("piano.sf2");
//! ```

use std::ffi::CStr;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{LoadError, LoadResult};
use crate::render::QUANTUM_FRAMES;

/// Default SoundFont file name inside the bundle.
pub const DEFAULT_SOUNDFONT_FILE: &str = "soundfont.sf2";

/// Default engine settings file name inside the bundle.
pub const DEFAULT_SETTINGS_FILE: &str = "engine.json";

/// Environment variable that enables verbose diagnostics.
pub const DEBUG_ENV_VAR: &str = "DEBUG";

/// Static plugin identity.
#[derive(Debug, Clone)]
pub struct PluginConfig {
    /// Unique plugin URI exposed through the LV2 descriptor.
    pub uri: &'static CStr,

    /// Name used in diagnostics.
    pub name: &'static str,

    /// SoundFont file name, relative to the bundle directory.
    pub soundfont_file: &'static str,

    /// Optional engine settings file name, relative to the bundle directory.
    pub settings_file: &'static str,
}

impl PluginConfig {
    /// Create a configuration with the default resource names.
    pub const fn new(uri: &'static CStr, name: &'static str) -> Self {
        Self {
            uri,
            name,
            soundfont_file: DEFAULT_SOUNDFONT_FILE,
            settings_file: DEFAULT_SETTINGS_FILE,
        }
    }

    /// Set the SoundFont file name.
    pub const fn with_soundfont_file(mut self, file: &'static str) -> Self {
        self.soundfont_file = file;
        self
    }

    /// Set the engine settings file name.
    pub const fn with_settings_file(mut self, file: &'static str) -> Self {
        self.settings_file = file;
        self
    }

    /// Absolute path of the bundled SoundFont.
    pub fn soundfont_path(&self, bundle_path: &str) -> PathBuf {
        resource_path(bundle_path, self.soundfont_file)
    }

    /// Absolute path of the optional settings file.
    pub fn settings_path(&self, bundle_path: &str) -> PathBuf {
        resource_path(bundle_path, self.settings_file)
    }
}

/// Join a bundle directory and a file name with exactly one separator.
///
/// Hosts disagree on whether the bundle path ends with `/`, so trailing
/// separators are stripped before joining.
pub fn resource_path(bundle_path: &str, file: &str) -> PathBuf {
    let trimmed = bundle_path.trim_end_matches('/');
    PathBuf::from(format!("{trimmed}/{file}"))
}

/// Whether verbose diagnostics were requested (`DEBUG=1` or `DEBUG=true`).
pub fn diagnostics_requested() -> bool {
    std::env::var(DEBUG_ENV_VAR)
        .map(|value| is_truthy(&value))
        .unwrap_or(false)
}

fn is_truthy(value: &str) -> bool {
    value == "1" || value == "true"
}

// =========================================================================
// EngineSettings
// =========================================================================

/// Engine tuning applied when the SoundFont is loaded.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineSettings {
    /// Maximum number of simultaneously sounding voices.
    pub voice_count: usize,

    /// Internal block size of the engine, in frames.
    pub render_block_size: usize,

    /// Enable the engine's built-in reverb and chorus.
    pub effects: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            voice_count: 16,
            render_block_size: QUANTUM_FRAMES,
            effects: false,
        }
    }
}

impl EngineSettings {
    /// Load settings from `path`, falling back to defaults when it is absent.
    pub fn load(path: &Path) -> LoadResult<Self> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No engine settings at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(err) => {
                return Err(LoadError::Settings {
                    path: path.to_path_buf(),
                    reason: err.to_string(),
                })
            }
        };

        let settings = Self::from_json(&text).map_err(|reason| LoadError::Settings {
            path: path.to_path_buf(),
            reason,
        })?;
        log::debug!("Loaded engine settings from {}: {settings:?}", path.display());
        Ok(settings)
    }

    /// Parse and validate a JSON settings document.
    pub fn from_json(text: &str) -> Result<Self, String> {
        let settings: Self = serde_json::from_str(text).map_err(|err| err.to_string())?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check the settings against the ranges the engine accepts.
    pub fn validate(&self) -> Result<(), String> {
        if !(8..=256).contains(&self.voice_count) {
            return Err(format!(
                "voice_count must be between 8 and 256, got {}",
                self.voice_count
            ));
        }
        if !(8..=1024).contains(&self.render_block_size) {
            return Err(format!(
                "render_block_size must be between 8 and 1024, got {}",
                self.render_block_size
            ));
        }
        Ok(())
    }
}
