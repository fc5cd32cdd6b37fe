//! # sf2lv2-core
//!
//! Format-agnostic runtime for SoundFont instrument plugins.
//!
//! This crate holds everything a plugin instance does between the host and
//! the synthesis engine, without any knowledge of the plugin ABI:
//!
//! - [`PresetCatalog`]: ordered list of the presets in the loaded SoundFont
//! - [`ControlState`]: change-detected forwarding of host controls as CCs
//! - [`ProgramController`]: preset switching through the program port
//! - [`midi`]: incoming event decoding and routing
//! - [`RenderQuantum`]: fixed-size block rendering
//! - [`Instrument`]: the per-cycle orchestration of all of the above
//!
//! ## Architecture
//!
//! ```text
//! Host ABI glue (sf2lv2-lv2)
//!        ↓
//! Instrument<E> (per-cycle orchestration)
//!        ↓
//! SynthEngine (SoundFontEngine, or a test double)
//! ```

pub mod catalog;
pub mod config;
pub mod controls;
pub mod engine;
pub mod error;
pub mod instrument;
pub mod midi;
pub mod program;
pub mod render;

pub use catalog::{PresetCatalog, PresetEntry};
pub use config::{EngineSettings, PluginConfig};
pub use controls::{Control, ControlState, ControlValues, CONTROL_COUNT};
pub use engine::{ChannelTarget, SynthEngine, PLAYBACK_CHANNEL};
pub use error::{EngineError, LoadError, LoadResult, ProgramError};
pub use instrument::{CycleInputs, Instrument};
pub use midi::{MidiMessage, TimedEvent};
pub use program::{ProgramController, ProgramState};
pub use render::{RenderQuantum, QUANTUM_FRAMES};

#[cfg(feature = "rustysynth")]
pub use engine::SoundFontEngine;
