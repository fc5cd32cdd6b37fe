//! Host control dispatch.
//!
//! Six continuous host controls are forwarded to the engine as MIDI CCs on
//! the playback channel. A CC is only sent when the port value changed since
//! the last one sent for that control. The comparison is bit-exact, so a
//! one-ULP change from automation is enough to re-send.

use crate::engine::{SynthEngine, PLAYBACK_CHANNEL};

/// Number of dispatched controls.
pub const CONTROL_COUNT: usize = 6;

/// A host control mapped to a MIDI controller number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    Cutoff,
    Resonance,
    Attack,
    Decay,
    Sustain,
    Release,
}

impl Control {
    /// All controls in port order.
    pub const ALL: [Control; CONTROL_COUNT] = [
        Control::Cutoff,
        Control::Resonance,
        Control::Attack,
        Control::Decay,
        Control::Sustain,
        Control::Release,
    ];

    /// MIDI controller number (sound controller assignments).
    pub const fn controller(self) -> u8 {
        match self {
            Control::Cutoff => 74,
            Control::Resonance => 71,
            Control::Attack => 73,
            Control::Decay => 75,
            Control::Sustain => 70,
            Control::Release => 72,
        }
    }

    /// Control mapped to MIDI controller number `controller`.
    pub fn from_controller(controller: u8) -> Option<Control> {
        Control::ALL
            .into_iter()
            .find(|control| control.controller() == controller)
    }

    /// CC value written to the engine when a program change resets it.
    ///
    /// Cutoff opens fully; every other control goes to zero.
    pub const fn reset_value(self) -> u8 {
        match self {
            Control::Cutoff => 127,
            _ => 0,
        }
    }

    /// Shadow value the instance starts with.
    pub const fn initial_value(self) -> f32 {
        match self {
            Control::Cutoff => 1.0,
            _ => 0.0,
        }
    }

    /// Port symbol.
    pub const fn name(self) -> &'static str {
        match self {
            Control::Cutoff => "cutoff",
            Control::Resonance => "resonance",
            Control::Attack => "attack",
            Control::Decay => "decay",
            Control::Sustain => "sustain",
            Control::Release => "release",
        }
    }

    /// Human-readable port name.
    pub const fn label(self) -> &'static str {
        match self {
            Control::Cutoff => "Cutoff",
            Control::Resonance => "Resonance",
            Control::Attack => "Attack",
            Control::Decay => "Decay",
            Control::Sustain => "Sustain",
            Control::Release => "Release",
        }
    }

    /// General MIDI name of the mapped controller.
    pub const fn controller_name(self) -> &'static str {
        match self {
            Control::Cutoff => "Brightness",
            Control::Resonance => "Resonance",
            Control::Attack => "Attack Time",
            Control::Decay => "Decay Time",
            Control::Sustain => "Sound Variation",
            Control::Release => "Release Time",
        }
    }

    pub(crate) const fn slot(self) -> usize {
        self as usize
    }
}

/// Scale a normalized control value to a 7-bit CC value.
///
/// Rounds to nearest and clamps to 0-127. NaN maps to 0.
pub fn cc_value(value: f32) -> u8 {
    let scaled = (value * 127.0).round();
    if scaled.is_nan() {
        return 0;
    }
    scaled.clamp(0.0, 127.0) as u8
}

/// A control change ready to be sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlCommand {
    pub controller: u8,
    pub value: u8,
}

/// Current values of the six control ports, `None` when unconnected.
pub type ControlValues = [Option<f32>; CONTROL_COUNT];

/// Last value sent to the engine for each control.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlState {
    sent: [f32; CONTROL_COUNT],
}

impl Default for ControlState {
    fn default() -> Self {
        Self {
            sent: Control::ALL.map(Control::initial_value),
        }
    }
}

impl ControlState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last value sent for `control`.
    pub fn last_sent(&self, control: Control) -> f32 {
        self.sent[control.slot()]
    }

    /// The command `new_value` requires, if it differs from the shadow.
    ///
    /// Does not touch the shadow; call [`ControlState::commit`] once the
    /// command has been issued.
    pub fn update(&self, control: Control, new_value: Option<f32>) -> Option<ControlCommand> {
        let value = new_value?;
        if value.to_bits() == self.sent[control.slot()].to_bits() {
            return None;
        }
        Some(ControlCommand {
            controller: control.controller(),
            value: cc_value(value),
        })
    }

    /// Record `value` as sent for `control`.
    pub fn commit(&mut self, control: Control, value: f32) {
        self.sent[control.slot()] = value;
    }

    /// Send a CC for every changed control and update the shadows.
    ///
    /// Returns the number of commands issued.
    pub fn dispatch<E: SynthEngine + ?Sized>(
        &mut self,
        engine: &mut E,
        values: &ControlValues,
    ) -> usize {
        let mut sent = 0;
        for (control, value) in Control::ALL.into_iter().zip(values.iter().copied()) {
            let (Some(value), Some(command)) = (value, self.update(control, value)) else {
                continue;
            };
            engine.control_change(PLAYBACK_CHANNEL, command.controller, command.value);
            self.commit(control, value);
            sent += 1;
        }
        sent
    }
}

/// Write the program-change baseline CCs to the engine.
///
/// Only the engine's controller state is reset. The host-visible shadows in
/// [`ControlState`] keep their values.
pub fn reset_engine_controls<E: SynthEngine + ?Sized>(engine: &mut E) {
    for control in Control::ALL {
        engine.control_change(
            PLAYBACK_CHANNEL,
            control.controller(),
            control.reset_value(),
        );
    }
}
