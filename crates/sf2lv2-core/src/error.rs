//! Error types for plugin loading and engine commands.
//!
//! Only [`LoadError`] is fatal. Everything raised on the audio path is
//! reported through the diagnostics log and then dropped: engine commands
//! are fire-and-forget.

use std::path::PathBuf;

/// Errors that abort instantiation.
///
/// Every variant causes the host-facing `instantiate` call to return a null
/// handle after releasing whatever was already acquired.
#[derive(Debug)]
pub enum LoadError {
    /// A host feature the plugin cannot run without was not offered.
    MissingFeature(&'static str),
    /// The SoundFont file does not exist or cannot be opened.
    ResourceNotFound {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The SoundFont file exists but could not be parsed.
    CorruptResource { path: PathBuf, reason: String },
    /// The bundle's settings file is unreadable or malformed.
    Settings { path: PathBuf, reason: String },
    /// The engine rejected its configuration.
    EngineSetup(String),
    /// The SoundFont contains no addressable preset.
    NoPresets,
    /// A scratch buffer could not be reserved.
    Allocation(std::collections::TryReserveError),
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingFeature(uri) => write!(f, "missing required feature {uri}"),
            Self::ResourceNotFound { path, .. } => {
                write!(f, "failed to open SoundFont: {}", path.display())
            }
            Self::CorruptResource { path, reason } => {
                write!(f, "failed to load SoundFont {}: {reason}", path.display())
            }
            Self::Settings { path, reason } => {
                write!(f, "invalid engine settings in {}: {reason}", path.display())
            }
            Self::EngineSetup(msg) => write!(f, "engine setup failed: {msg}"),
            Self::NoPresets => write!(f, "no presets found in SoundFont"),
            Self::Allocation(_) => write!(f, "failed to allocate render buffers"),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ResourceNotFound { source, .. } => Some(source),
            Self::Allocation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::collections::TryReserveError> for LoadError {
    fn from(err: std::collections::TryReserveError) -> Self {
        Self::Allocation(err)
    }
}

/// Non-fatal failures reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineError {
    /// The selected (bank, program) has no preset in the loaded SoundFont.
    PresetNotFound { bank: u16, program: u8 },
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PresetNotFound { bank, program } => {
                write!(f, "failed to change program: bank={bank} prog={program}")
            }
        }
    }
}

impl std::error::Error for EngineError {}

/// Rejected program selections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramError {
    /// The requested catalog index is outside `0..catalog_size`.
    InvalidIndex { index: usize, catalog_size: usize },
}

impl std::fmt::Display for ProgramError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidIndex {
                index,
                catalog_size,
            } => write!(
                f,
                "invalid program number: {index} (max: {})",
                catalog_size.saturating_sub(1)
            ),
        }
    }
}

impl std::error::Error for ProgramError {}

/// Result type for plugin loading.
pub type LoadResult<T> = std::result::Result<T, LoadError>;
