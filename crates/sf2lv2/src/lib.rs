//! # sf2lv2
//!
//! SoundFont instrument plugins for LV2 hosts.
//!
//! A plugin is a bundle holding a SoundFont file, a Turtle description and
//! a shared library built from a crate like this one:
//!
//! ```rust,ignore
//! use sf2lv2::prelude::*;
//!
//! static CONFIG: PluginConfig =
//!     PluginConfig::new(c"https://github.com/islainstruments/sf2lv2/piano", "Piano")
//!         .with_soundfont_file("piano.sf2");
//!
//! export_lv2!(CONFIG);
//! ```
//!
//! Every preset of the SoundFont becomes selectable through the program
//! port, and incoming MIDI plays the selected preset.

// Re-export sub-crates
pub use sf2lv2_core as core;

#[cfg(feature = "lv2")]
pub use sf2lv2_lv2 as lv2;

#[cfg(feature = "lv2")]
pub use sf2lv2_lv2::export_lv2;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use sf2lv2::prelude::*;
/// ```
pub mod prelude {
    pub use sf2lv2_core::{
        ChannelTarget, Control, ControlState, CycleInputs, EngineError, EngineSettings, Instrument,
        LoadError, LoadResult, PluginConfig, PresetCatalog, PresetEntry, ProgramController,
        ProgramError, ProgramState, SynthEngine, PLAYBACK_CHANNEL,
    };

    #[cfg(feature = "rustysynth")]
    pub use sf2lv2_core::SoundFontEngine;

    #[cfg(feature = "lv2")]
    pub use sf2lv2_lv2::{export_lv2, Lv2Plugin, SoundFontInstance};
}
