//! Sound controller rendering for [`SoundFontEngine`](super::SoundFontEngine).
//!
//! rustysynth ignores the sound controllers (CC 70-75) and reads no
//! SoundFont modulators, so the engine applies them itself:
//!
//! | Controller | Effect |
//! |------------|--------|
//! | Brightness (74) | low-pass cutoff on the mix, 127 bypasses the filter |
//! | Resonance (71) | Q of that low-pass |
//! | Attack Time (73) | fade-in of each new note |
//! | Decay Time (75) | fall from full level to the sustain level, 0 skips it |
//! | Sound Variation (70) | level held after the decay |
//! | Release Time (72) | fade-out after note off, 0 keeps the SoundFont's own release |
//!
//! The note envelopes reach the engine through the expression controller.
//! Every sounding note gets an engine channel of its own
//! ([`NOTE_CHANNELS`]) so its expression can move independently.
//!
//! At their reset values (brightness 127, the rest 0) the SoundFont plays
//! unchanged.

use std::f64::consts::{FRAC_1_SQRT_2, PI};

use crate::controls::{Control, CONTROL_COUNT};

/// Attack, decay and release time at CC value 127, in seconds.
pub const MAX_ENVELOPE_SECONDS: f32 = 4.0;

const MIN_CUTOFF_HZ: f64 = 20.0;

/// Decades spanned by the cutoff above [`MIN_CUTOFF_HZ`] (20 Hz - 20 kHz).
const CUTOFF_DECADES: f64 = 3.0;

/// Decades the resonance control raises Q above Butterworth.
const RESONANCE_DECADES: f64 = 1.2;

/// Engine channels that notes are spread over.
///
/// Channel 9 is left out: rustysynth shifts bank selects on it into the
/// percussion range, which would break bank 128 selection.
pub const NOTE_CHANNELS: [u8; 15] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 10, 11, 12, 13, 14, 15];

// =========================================================================
// Controller values
// =========================================================================

/// Current values of the six sound controllers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoundControls {
    values: [u8; CONTROL_COUNT],
}

impl Default for SoundControls {
    fn default() -> Self {
        Self {
            values: Control::ALL.map(Control::reset_value),
        }
    }
}

impl SoundControls {
    pub fn set(&mut self, control: Control, value: u8) {
        self.values[control.slot()] = value.min(127);
    }

    pub fn get(&self, control: Control) -> u8 {
        self.values[control.slot()]
    }

    fn fraction(&self, control: Control) -> f32 {
        f32::from(self.get(control)) / 127.0
    }

    /// Quadratic curve so the low end of the range gets the finer steps.
    fn seconds(&self, control: Control) -> f32 {
        let fraction = self.fraction(control);
        MAX_ENVELOPE_SECONDS * fraction * fraction
    }

    pub fn attack_seconds(&self) -> f32 {
        self.seconds(Control::Attack)
    }

    pub fn decay_seconds(&self) -> f32 {
        self.seconds(Control::Decay)
    }

    pub fn release_seconds(&self) -> f32 {
        self.seconds(Control::Release)
    }

    /// Level held once the attack (and decay, if any) is over.
    ///
    /// Without a decay stage notes hold at full level.
    pub fn sustain_level(&self) -> f32 {
        if self.get(Control::Decay) == 0 {
            1.0
        } else {
            self.fraction(Control::Sustain)
        }
    }

    /// Low-pass cutoff, `None` when the filter is fully open.
    pub fn cutoff_hz(&self) -> Option<f64> {
        let value = self.get(Control::Cutoff);
        if value >= 127 {
            return None;
        }
        let decades = CUTOFF_DECADES * f64::from(value) / 127.0;
        Some(MIN_CUTOFF_HZ * 10f64.powf(decades))
    }

    pub fn resonance_q(&self) -> f64 {
        let decades = RESONANCE_DECADES * f64::from(self.get(Control::Resonance)) / 127.0;
        FRAC_1_SQRT_2 * 10f64.powf(decades)
    }
}

// =========================================================================
// Note envelope
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Attack,
    Decay,
    Sustain,
    Release,
    Finished,
}

/// Linear ADSR gain of one note, advanced once per rendered block.
///
/// Stage times are read from [`SoundControls`] on every advance, so
/// controller changes also reshape notes that are already sounding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteEnvelope {
    stage: Stage,
    level: f32,
    release_from: f32,
}

impl NoteEnvelope {
    /// Envelope of a note starting now.
    pub fn start(controls: &SoundControls) -> Self {
        let mut envelope = Self {
            stage: Stage::Attack,
            level: 0.0,
            release_from: 0.0,
        };
        envelope.advance(0.0, controls);
        envelope
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn is_releasing(&self) -> bool {
        matches!(self.stage, Stage::Release | Stage::Finished)
    }

    pub fn is_finished(&self) -> bool {
        self.stage == Stage::Finished
    }

    /// Enter the release stage from the current level.
    pub fn release(&mut self) {
        if !self.is_releasing() {
            self.release_from = self.level;
            self.stage = Stage::Release;
        }
    }

    pub fn advance(&mut self, seconds: f32, controls: &SoundControls) {
        let mut remaining = seconds;
        loop {
            match self.stage {
                Stage::Attack => {
                    let attack = controls.attack_seconds();
                    let needed = (1.0 - self.level) * attack;
                    if attack > 0.0 && remaining < needed {
                        self.level += remaining / attack;
                        return;
                    }
                    remaining -= needed;
                    self.level = 1.0;
                    self.stage = Stage::Decay;
                }
                Stage::Decay => {
                    let target = controls.sustain_level();
                    let decay = controls.decay_seconds();
                    if self.level <= target || decay <= 0.0 {
                        self.stage = Stage::Sustain;
                        continue;
                    }
                    let rate = (1.0 - target) / decay;
                    let needed = (self.level - target) / rate;
                    if remaining < needed {
                        self.level -= remaining * rate;
                        return;
                    }
                    remaining -= needed;
                    self.stage = Stage::Sustain;
                }
                Stage::Sustain => {
                    self.level = controls.sustain_level();
                    return;
                }
                Stage::Release => {
                    let release = controls.release_seconds();
                    if release > 0.0 && self.release_from > 0.0 {
                        self.level -= remaining * self.release_from / release;
                    } else {
                        self.level = 0.0;
                    }
                    if self.level <= 0.0 {
                        self.level = 0.0;
                        self.stage = Stage::Finished;
                    }
                    return;
                }
                Stage::Finished => return,
            }
        }
    }
}

// =========================================================================
// Note slots
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotState {
    Free,
    /// Under envelope control: held, sustained by the pedal, or fading out.
    Playing,
    /// Note off sent; the SoundFont's release rings out.
    Ringing,
}

/// One engine channel and the note playing on it.
#[derive(Debug, Clone, Copy)]
pub struct NoteSlot {
    /// Engine channel the note plays on.
    pub channel: u8,
    /// Channel the note was received on.
    pub part: u8,
    pub key: u8,
    /// Key still held; cleared by note off even while the pedal sustains.
    pub key_down: bool,
    pub envelope: NoteEnvelope,
    state: SlotState,
    age: u64,
}

impl NoteSlot {
    fn free(channel: u8) -> Self {
        Self {
            channel,
            part: 0,
            key: 0,
            key_down: false,
            envelope: NoteEnvelope {
                stage: Stage::Finished,
                level: 0.0,
                release_from: 0.0,
            },
            state: SlotState::Free,
            age: 0,
        }
    }

    pub fn is_free(&self) -> bool {
        self.state == SlotState::Free
    }

    pub fn is_playing(&self) -> bool {
        self.state == SlotState::Playing
    }

    /// Hand the note to the engine's own release.
    pub fn ring_out(&mut self) {
        if self.state == SlotState::Playing {
            self.state = SlotState::Ringing;
        }
    }

    pub fn clear(&mut self) {
        *self = Self::free(self.channel);
    }
}

/// A slot taken by [`NoteSlots::claim`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Claim {
    pub index: usize,
    pub channel: u8,
    /// Key that was still under envelope control on the slot and needs a
    /// note off before the new note starts.
    pub stolen_key: Option<u8>,
    /// The slot's previous note had faded out and its voice can be cut.
    pub silenced: bool,
}

/// Fixed pool of note slots, one per entry of [`NOTE_CHANNELS`].
#[derive(Debug, Clone)]
pub struct NoteSlots {
    slots: [NoteSlot; NOTE_CHANNELS.len()],
    next_age: u64,
}

impl Default for NoteSlots {
    fn default() -> Self {
        Self {
            slots: NOTE_CHANNELS.map(NoteSlot::free),
            next_age: 0,
        }
    }
}

impl NoteSlots {
    pub fn get(&self, index: usize) -> &NoteSlot {
        &self.slots[index]
    }

    pub fn get_mut(&mut self, index: usize) -> &mut NoteSlot {
        &mut self.slots[index]
    }

    #[cfg(test)]
    pub fn iter(&self) -> impl Iterator<Item = &NoteSlot> {
        self.slots.iter()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Slot of the note `(part, key)` still under envelope control.
    pub fn playing(&self, part: u8, key: u8) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| slot.is_playing() && slot.part == part && slot.key == key)
    }

    /// Slot of the held key `(part, key)`.
    pub fn held(&self, part: u8, key: u8) -> Option<usize> {
        self.slots.iter().position(|slot| {
            slot.is_playing() && slot.key_down && slot.part == part && slot.key == key
        })
    }

    /// Take a slot for a new note.
    ///
    /// Prefers a free slot, then the oldest ringing one, then the oldest
    /// playing one.
    pub fn claim(&mut self, part: u8, key: u8, envelope: NoteEnvelope) -> Claim {
        let rank = |slot: &NoteSlot| match slot.state {
            SlotState::Free => 0,
            SlotState::Ringing => 1,
            SlotState::Playing => 2,
        };
        let index = (0..self.slots.len())
            .min_by_key(|&i| (rank(&self.slots[i]), self.slots[i].age))
            .unwrap_or(0);

        let slot = &mut self.slots[index];
        let stolen_key = slot.is_playing().then_some(slot.key);
        let silenced = slot.state == SlotState::Ringing && slot.envelope.is_finished();
        self.next_age += 1;
        *slot = NoteSlot {
            channel: slot.channel,
            part,
            key,
            key_down: true,
            envelope,
            state: SlotState::Playing,
            age: self.next_age,
        };

        Claim {
            index,
            channel: slot.channel,
            stolen_key,
            silenced,
        }
    }

    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            slot.clear();
        }
    }
}

// =========================================================================
// Tone filter
// =========================================================================

/// Normalized biquad coefficients (a0 = 1).
#[derive(Debug, Clone, Copy, PartialEq)]
struct BiquadCoeffs {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
}

impl BiquadCoeffs {
    /// Resonant low-pass from the bilinear transform of the analog
    /// prototype. Frequency is kept below Nyquist.
    fn low_pass(freq: f64, q: f64, sample_rate: f64) -> Self {
        let freq = freq.min(sample_rate * 0.49);
        let q = q.max(0.01);

        let w0 = 2.0 * PI * freq / sample_rate;
        let cos_w0 = w0.cos();
        let alpha = w0.sin() / (2.0 * q);
        let a0 = 1.0 + alpha;

        Self {
            b0: (1.0 - cos_w0) / 2.0 / a0,
            b1: (1.0 - cos_w0) / a0,
            b2: (1.0 - cos_w0) / 2.0 / a0,
            a1: (-2.0 * cos_w0) / a0,
            a2: (1.0 - alpha) / a0,
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct BiquadState {
    z1: f64,
    z2: f64,
}

impl BiquadState {
    /// Direct Form II Transposed.
    #[inline]
    fn process(&mut self, input: f64, coeffs: &BiquadCoeffs) -> f64 {
        let output = coeffs.b0 * input + self.z1;
        self.z1 = coeffs.b1 * input - coeffs.a1 * output + self.z2;
        self.z2 = coeffs.b2 * input - coeffs.a2 * output;
        output
    }
}

/// Stereo low-pass driven by the brightness and resonance controllers.
#[derive(Debug, Clone)]
pub struct ToneFilter {
    sample_rate: f64,
    coeffs: Option<BiquadCoeffs>,
    left: BiquadState,
    right: BiquadState,
}

impl ToneFilter {
    /// A bypassed filter.
    pub fn new(sample_rate: f64) -> Self {
        Self {
            sample_rate,
            coeffs: None,
            left: BiquadState::default(),
            right: BiquadState::default(),
        }
    }

    /// Recompute coefficients after a controller change.
    pub fn configure(&mut self, controls: &SoundControls) {
        match controls.cutoff_hz() {
            Some(freq) => {
                self.coeffs = Some(BiquadCoeffs::low_pass(
                    freq,
                    controls.resonance_q(),
                    self.sample_rate,
                ));
            }
            None => {
                self.coeffs = None;
                self.left = BiquadState::default();
                self.right = BiquadState::default();
            }
        }
    }

    pub fn process(&mut self, left: &mut [f32], right: &mut [f32]) {
        let Some(coeffs) = self.coeffs else {
            return;
        };
        for sample in left.iter_mut() {
            *sample = self.left.process(f64::from(*sample), &coeffs) as f32;
        }
        for sample in right.iter_mut() {
            *sample = self.right.process(f64::from(*sample), &coeffs) as f32;
        }
    }
}
