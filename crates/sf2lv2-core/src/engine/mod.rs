//! Synthesis engine boundary.
//!
//! The runtime never synthesizes sound itself. Everything it does ends up as
//! a call on [`SynthEngine`], which is implemented by the SoundFont backend
//! ([`SoundFontEngine`]) and by the recording double used in tests.
//!
//! # Commands
//!
//! | Method | Origin |
//! |--------|--------|
//! | `all_notes_off` / `all_sounds_off` | program change, activate, deactivate |
//! | `control_change` | parameter dispatch, CC reset, incoming MIDI |
//! | `bank_select` / `program_change` | program change |
//! | `note_on` / `note_off` / `pitch_bend` | incoming MIDI |
//! | `set_gain` | level port |
//! | `render_block` | audio render loop |

#[cfg(feature = "rustysynth")]
mod soundfont;
#[cfg(feature = "rustysynth")]
mod voicing;

#[cfg(feature = "rustysynth")]
pub use soundfont::SoundFontEngine;

use crate::error::EngineError;

/// Highest bank number scanned (bank 128 holds percussion kits).
pub const MAX_BANK: u16 = 128;

/// Highest program number within a bank.
pub const MAX_PROGRAM: u8 = 127;

/// Channel that receives every command the runtime issues.
///
/// Incoming MIDI is collapsed onto this channel so that notes always sound
/// with the preset selected through the program port.
pub const PLAYBACK_CHANNEL: u8 = 0;

/// Channel scope for the global silencing commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelTarget {
    /// Every channel (the engine's channel wildcard).
    All,
    /// A single MIDI channel (channel mode messages).
    Channel(u8),
}

/// Operations consumed from the synthesis engine.
///
/// All methods are called from the host's audio thread and must not block.
/// Commands are fire-and-forget; only `program_change` reports failure.
pub trait SynthEngine {
    /// Whether the loaded SoundFont has a preset at `(bank, program)`.
    fn has_preset(&self, bank: u16, program: u8) -> bool;

    /// Display name of the preset at `(bank, program)`, if present.
    fn preset_name(&self, bank: u16, program: u8) -> Option<&str>;

    /// Select the bank used by the next program change on `channel`.
    fn bank_select(&mut self, channel: u8, bank: u16);

    /// Switch `channel` to `program` within the selected bank.
    fn program_change(&mut self, channel: u8, program: u8) -> Result<(), EngineError>;

    /// Bank select followed by program change, in that order.
    fn select_bank_program(
        &mut self,
        channel: u8,
        bank: u16,
        program: u8,
    ) -> Result<(), EngineError> {
        self.bank_select(channel, bank);
        self.program_change(channel, program)
    }

    fn note_on(&mut self, channel: u8, key: u8, velocity: u8);

    fn note_off(&mut self, channel: u8, key: u8);

    fn control_change(&mut self, channel: u8, controller: u8, value: u8);

    /// Set the pitch wheel; `value` is 14-bit with 8192 as center.
    fn pitch_bend(&mut self, channel: u8, value: u16);

    /// Set the master output gain (linear).
    fn set_gain(&mut self, level: f32);

    /// Release every sounding note (voices still ring out).
    fn all_notes_off(&mut self, target: ChannelTarget);

    /// Cut every voice immediately.
    fn all_sounds_off(&mut self, target: ChannelTarget);

    /// Render `left.len()` frames into the two buffers.
    ///
    /// Both slices have the same length, which never exceeds the render
    /// quantum.
    fn render_block(&mut self, left: &mut [f32], right: &mut [f32]);
}
