//! Incoming performance events.
//!
//! The host delivers a time-ordered buffer of raw MIDI messages per cycle.
//! Each recognized message becomes exactly one engine command, issued in
//! buffer order. Everything else (system messages, aftertouch, program
//! change bytes) is ignored.

use crate::engine::{SynthEngine, PLAYBACK_CHANNEL};

const STATUS_NOTE_OFF: u8 = 0x80;
const STATUS_NOTE_ON: u8 = 0x90;
const STATUS_CONTROL_CHANGE: u8 = 0xB0;
const STATUS_PITCH_BEND: u8 = 0xE0;

/// A decoded channel voice message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiMessage {
    NoteOn { channel: u8, key: u8, velocity: u8 },
    NoteOff { channel: u8, key: u8 },
    ControlChange {
        channel: u8,
        controller: u8,
        value: u8,
    },
    /// 14-bit bend value, 8192 is center.
    PitchBend { channel: u8, value: u16 },
}

impl MidiMessage {
    /// Decode a raw message.
    ///
    /// Note-on with velocity zero decodes as note-off. Returns `None` for
    /// unrecognized or truncated messages.
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        let &[status, data1, data2, ..] = bytes else {
            return None;
        };
        let channel = status & 0x0F;
        let data1 = data1 & 0x7F;
        let data2 = data2 & 0x7F;

        match status & 0xF0 {
            STATUS_NOTE_ON if data2 > 0 => Some(Self::NoteOn {
                channel,
                key: data1,
                velocity: data2,
            }),
            STATUS_NOTE_ON | STATUS_NOTE_OFF => Some(Self::NoteOff {
                channel,
                key: data1,
            }),
            STATUS_CONTROL_CHANGE => Some(Self::ControlChange {
                channel,
                controller: data1,
                value: data2,
            }),
            STATUS_PITCH_BEND => Some(Self::PitchBend {
                channel,
                value: u16::from(data2) * 128 + u16::from(data1),
            }),
            _ => None,
        }
    }

    /// Issue the matching engine command on `channel`.
    pub fn send_to<E: SynthEngine + ?Sized>(self, engine: &mut E, channel: u8) {
        match self {
            Self::NoteOn { key, velocity, .. } => engine.note_on(channel, key, velocity),
            Self::NoteOff { key, .. } => engine.note_off(channel, key),
            Self::ControlChange {
                controller, value, ..
            } => engine.control_change(channel, controller, value),
            Self::PitchBend { value, .. } => engine.pitch_bend(channel, value),
        }
    }
}

/// One event from the host's input buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedEvent<'a> {
    /// Frame offset within the cycle.
    pub frame: i64,
    /// Raw MIDI bytes.
    pub data: &'a [u8],
}

/// Send every recognized message in `events` to the engine, in order.
///
/// Messages are routed to [`PLAYBACK_CHANNEL`] regardless of their own
/// channel nibble. Returns the number of commands issued.
pub fn dispatch_events<'a, E, I>(engine: &mut E, events: I) -> usize
where
    E: SynthEngine + ?Sized,
    I: IntoIterator<Item = TimedEvent<'a>>,
{
    let mut issued = 0;
    for event in events {
        if let Some(message) = MidiMessage::parse(event.data) {
            message.send_to(engine, PLAYBACK_CHANNEL);
            issued += 1;
        }
    }
    issued
}
