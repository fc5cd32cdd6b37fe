//! SoundFont engine backed by `rustysynth`.
//!
//! rustysynth plays the SoundFont; the sound controllers it does not
//! implement are rendered around it by [`voicing`](super::voicing).

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use rustysynth::{SoundFont, Synthesizer, SynthesizerSettings};

use super::voicing::{NoteEnvelope, NoteSlots, SoundControls, ToneFilter, NOTE_CHANNELS};
use super::{ChannelTarget, SynthEngine, MAX_BANK, MAX_PROGRAM};
use crate::config::EngineSettings;
use crate::controls::Control;
use crate::error::{EngineError, LoadError, LoadResult};

// MIDI status bytes understood by `Synthesizer::process_midi_message`.
const STATUS_CONTROL_CHANGE: i32 = 0xB0;
const STATUS_PROGRAM_CHANGE: i32 = 0xC0;
const STATUS_PITCH_BEND: i32 = 0xE0;

const CC_BANK_SELECT: u8 = 0x00;
const CC_EXPRESSION: u8 = 0x0B;
const CC_EXPRESSION_FINE: u8 = 0x2B;
const CC_HOLD: u8 = 0x40;
const CC_ALL_SOUND_OFF: u8 = 0x78;
const CC_RESET_CONTROLLERS: u8 = 0x79;
const CC_ALL_NOTES_OFF: u8 = 0x7B;

const MIDI_CHANNELS: usize = 16;

/// 14-bit expression a channel starts with and returns to on reset.
const DEFAULT_EXPRESSION: u16 = 127 << 7;
const MAX_EXPRESSION: u16 = 0x3FFF;

/// State of a MIDI channel as received.
#[derive(Debug, Clone, Copy)]
struct Part {
    /// Bank last selected, used to validate program changes.
    bank: u16,
    expression: u16,
    hold: bool,
}

impl Default for Part {
    fn default() -> Self {
        Self {
            bank: 0,
            expression: DEFAULT_EXPRESSION,
            hold: false,
        }
    }
}

/// Engine wrapping a `rustysynth` synthesizer and its SoundFont.
///
/// Each note plays on an engine channel of its own. Those channels all
/// share the preset, bank and channel controllers of the received channels.
pub struct SoundFontEngine {
    synth: Synthesizer,
    sample_rate: f32,
    /// Preset names keyed by (bank, program).
    presets: HashMap<(u16, u8), String>,
    parts: [Part; MIDI_CHANNELS],
    controls: SoundControls,
    slots: NoteSlots,
    filter: ToneFilter,
}

impl SoundFontEngine {
    /// Configure the engine and load the SoundFont at `path`.
    pub fn load(path: &Path, sample_rate: f64, settings: &EngineSettings) -> LoadResult<Self> {
        settings.validate().map_err(LoadError::EngineSetup)?;

        let file = File::open(path).map_err(|source| LoadError::ResourceNotFound {
            path: path.to_path_buf(),
            source,
        })?;
        let mut reader = BufReader::new(file);
        let sound_font = SoundFont::new(&mut reader).map_err(|err| LoadError::CorruptResource {
            path: path.to_path_buf(),
            reason: format!("{err:?}"),
        })?;
        let sound_font = Arc::new(sound_font);

        let mut synth_settings = SynthesizerSettings::new(sample_rate.round() as i32);
        synth_settings.block_size = settings.render_block_size;
        synth_settings.maximum_polyphony = settings.voice_count;
        synth_settings.enable_reverb_and_chorus = settings.effects;

        let synth = Synthesizer::new(&sound_font, &synth_settings)
            .map_err(|err| LoadError::EngineSetup(format!("{err:?}")))?;

        let mut presets = HashMap::new();
        for preset in sound_font.get_presets() {
            let bank = preset.get_bank_number();
            let program = preset.get_patch_number();
            if !(0..=i32::from(MAX_BANK)).contains(&bank)
                || !(0..=i32::from(MAX_PROGRAM)).contains(&program)
            {
                log::debug!(
                    "Skipping unaddressable preset {:?} (bank {bank}, prog {program})",
                    preset.get_name()
                );
                continue;
            }
            presets
                .entry((bank as u16, program as u8))
                .or_insert_with(|| preset.get_name().to_string());
        }

        log::debug!(
            "Loaded SoundFont {} ({} presets, {} Hz, {} voices)",
            path.display(),
            presets.len(),
            synth_settings.sample_rate,
            settings.voice_count
        );

        Ok(Self {
            synth,
            sample_rate: synth_settings.sample_rate as f32,
            presets,
            parts: [Part::default(); MIDI_CHANNELS],
            controls: SoundControls::default(),
            slots: NoteSlots::default(),
            filter: ToneFilter::new(f64::from(synth_settings.sample_rate)),
        })
    }

    fn part(&self, channel: u8) -> Part {
        self.parts
            .get(usize::from(channel))
            .copied()
            .unwrap_or_default()
    }

    fn synth_note_off(&mut self, channel: u8, key: u8) {
        self.synth.note_off(i32::from(channel), i32::from(key));
    }

    fn send_control(&mut self, channel: u8, controller: u8, value: u8) {
        self.synth.process_midi_message(
            i32::from(channel),
            STATUS_CONTROL_CHANGE,
            i32::from(controller),
            i32::from(value),
        );
    }

    fn broadcast_control(&mut self, controller: u8, value: u8) {
        for channel in NOTE_CHANNELS {
            self.send_control(channel, controller, value);
        }
    }

    /// Write the slot's envelope level, scaled by its part's expression.
    ///
    /// The engine squares expression, so the square root keeps the
    /// envelope linear in amplitude.
    fn send_expression(&mut self, index: usize) {
        let slot = *self.slots.get(index);
        let part = self.part(slot.part);
        let value = (slot.envelope.level().sqrt() * f32::from(part.expression))
            .round()
            .clamp(0.0, f32::from(MAX_EXPRESSION)) as u16;
        self.send_control(slot.channel, CC_EXPRESSION, (value >> 7) as u8);
        self.send_control(slot.channel, CC_EXPRESSION_FINE, (value & 0x7F) as u8);
    }

    /// Let go of a playing note: fade it with the release envelope, or hand
    /// it to the SoundFont's release when the release time is zero.
    fn release_slot(&mut self, index: usize) {
        let slot = self.slots.get_mut(index);
        slot.key_down = false;
        if self.controls.release_seconds() > 0.0 {
            slot.envelope.release();
        } else {
            let (channel, key) = (slot.channel, slot.key);
            slot.ring_out();
            self.synth_note_off(channel, key);
        }
    }

    fn release_where(&mut self, wanted: impl Fn(u8, bool) -> bool) {
        for index in 0..self.slots.len() {
            let slot = self.slots.get(index);
            if slot.is_playing()
                && !slot.envelope.is_releasing()
                && wanted(slot.part, slot.key_down)
            {
                self.release_slot(index);
            }
        }
    }

    fn set_hold(&mut self, channel: u8, down: bool) {
        if let Some(part) = self.parts.get_mut(usize::from(channel)) {
            part.hold = down;
        }
        if !down {
            self.release_where(|part, key_down| part == channel && !key_down);
        }
    }

    fn set_expression(&mut self, channel: u8, controller: u8, value: u8) {
        let Some(part) = self.parts.get_mut(usize::from(channel)) else {
            return;
        };
        let value = u16::from(value & 0x7F);
        part.expression = if controller == CC_EXPRESSION {
            (part.expression & 0x7F) | (value << 7)
        } else {
            (part.expression & !0x7F) | value
        };
    }

    fn set_sound_control(&mut self, control: Control, value: u8) {
        self.controls.set(control, value);
        if matches!(control, Control::Cutoff | Control::Resonance) {
            self.filter.configure(&self.controls);
        }
    }
}

impl SynthEngine for SoundFontEngine {
    fn has_preset(&self, bank: u16, program: u8) -> bool {
        self.presets.contains_key(&(bank, program))
    }

    fn preset_name(&self, bank: u16, program: u8) -> Option<&str> {
        self.presets.get(&(bank, program)).map(String::as_str)
    }

    fn bank_select(&mut self, channel: u8, bank: u16) {
        if let Some(part) = self.parts.get_mut(usize::from(channel)) {
            part.bank = bank;
        }
        for note_channel in NOTE_CHANNELS {
            self.synth.process_midi_message(
                i32::from(note_channel),
                STATUS_CONTROL_CHANGE,
                i32::from(CC_BANK_SELECT),
                i32::from(bank),
            );
        }
    }

    fn program_change(&mut self, channel: u8, program: u8) -> Result<(), EngineError> {
        let bank = self.part(channel).bank;
        if !self.has_preset(bank, program) {
            return Err(EngineError::PresetNotFound { bank, program });
        }
        for note_channel in NOTE_CHANNELS {
            self.synth.process_midi_message(
                i32::from(note_channel),
                STATUS_PROGRAM_CHANGE,
                i32::from(program),
                0,
            );
        }
        Ok(())
    }

    fn note_on(&mut self, channel: u8, key: u8, velocity: u8) {
        if velocity == 0 {
            self.note_off(channel, key);
            return;
        }

        // Retrigger: the earlier note of the same key rings out.
        if let Some(index) = self.slots.playing(channel, key) {
            let slot = self.slots.get_mut(index);
            slot.ring_out();
            let note_channel = slot.channel;
            self.synth_note_off(note_channel, key);
        }

        let envelope = NoteEnvelope::start(&self.controls);
        let claim = self.slots.claim(channel, key, envelope);
        if let Some(stolen) = claim.stolen_key {
            self.synth_note_off(claim.channel, stolen);
        }
        if claim.silenced {
            self.synth
                .note_off_all_channel(i32::from(claim.channel), true);
        }
        self.send_expression(claim.index);
        self.synth.note_on(
            i32::from(claim.channel),
            i32::from(key),
            i32::from(velocity),
        );
    }

    fn note_off(&mut self, channel: u8, key: u8) {
        let Some(index) = self.slots.held(channel, key) else {
            return;
        };
        if self.part(channel).hold {
            self.slots.get_mut(index).key_down = false;
        } else {
            self.release_slot(index);
        }
    }

    fn control_change(&mut self, channel: u8, controller: u8, value: u8) {
        if let Some(control) = Control::from_controller(controller) {
            self.set_sound_control(control, value);
            return;
        }
        match controller {
            CC_BANK_SELECT => self.bank_select(channel, u16::from(value)),
            CC_EXPRESSION | CC_EXPRESSION_FINE => self.set_expression(channel, controller, value),
            CC_HOLD => self.set_hold(channel, value >= 64),
            CC_ALL_SOUND_OFF => self.all_sounds_off(ChannelTarget::Channel(channel)),
            CC_ALL_NOTES_OFF => self.all_notes_off(ChannelTarget::Channel(channel)),
            CC_RESET_CONTROLLERS => {
                if let Some(part) = self.parts.get_mut(usize::from(channel)) {
                    part.expression = DEFAULT_EXPRESSION;
                }
                self.set_hold(channel, false);
                self.broadcast_control(controller, value);
            }
            _ => self.broadcast_control(controller, value),
        }
    }

    fn pitch_bend(&mut self, _channel: u8, value: u16) {
        let lsb = i32::from(value & 0x7F);
        let msb = i32::from((value >> 7) & 0x7F);
        for note_channel in NOTE_CHANNELS {
            self.synth
                .process_midi_message(i32::from(note_channel), STATUS_PITCH_BEND, lsb, msb);
        }
    }

    fn set_gain(&mut self, level: f32) {
        self.synth.set_master_volume(level);
    }

    fn all_notes_off(&mut self, target: ChannelTarget) {
        match target {
            ChannelTarget::All => self.release_where(|_, _| true),
            ChannelTarget::Channel(channel) => self.release_where(|part, _| part == channel),
        }
    }

    fn all_sounds_off(&mut self, target: ChannelTarget) {
        match target {
            ChannelTarget::All => {
                self.synth.note_off_all(true);
                self.slots.clear();
            }
            ChannelTarget::Channel(channel) => {
                for index in 0..self.slots.len() {
                    let slot = self.slots.get_mut(index);
                    if slot.is_free() || slot.part != channel {
                        continue;
                    }
                    let note_channel = slot.channel;
                    slot.clear();
                    self.synth
                        .note_off_all_channel(i32::from(note_channel), true);
                }
            }
        }
    }

    fn render_block(&mut self, left: &mut [f32], right: &mut [f32]) {
        let seconds = left.len() as f32 / self.sample_rate;
        for index in 0..self.slots.len() {
            let slot = self.slots.get_mut(index);
            if slot.is_free() {
                continue;
            }
            if slot.is_playing() {
                slot.envelope.advance(seconds, &self.controls);
                if slot.envelope.is_finished() {
                    let (channel, key) = (slot.channel, slot.key);
                    slot.ring_out();
                    self.synth_note_off(channel, key);
                }
            }
            self.send_expression(index);
        }

        self.synth.render(left, right);
        self.filter.process(left, right);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::PresetCatalog;

    const SAMPLE_RATE: f64 = 44_100.0;
    const BLOCK: usize = 64;
    const KEY: u8 = 69;

    // =====================================================================
    // In-memory SoundFont
    // =====================================================================

    // Generator numbers from the SoundFont 2 format.
    const GEN_INSTRUMENT: u16 = 41;
    const GEN_SAMPLE_ID: u16 = 53;
    const GEN_SAMPLE_MODES: u16 = 54;

    fn chunk(id: &[u8; 4], body: &[u8]) -> Vec<u8> {
        let mut out = id.to_vec();
        out.extend_from_slice(&(body.len() as u32).to_le_bytes());
        out.extend_from_slice(body);
        out
    }

    fn list(kind: &[u8; 4], chunks: &[Vec<u8>]) -> Vec<u8> {
        let mut body = kind.to_vec();
        for c in chunks {
            body.extend_from_slice(c);
        }
        chunk(b"LIST", &body)
    }

    fn name(text: &str) -> [u8; 20] {
        let mut out = [0; 20];
        out[..text.len()].copy_from_slice(text.as_bytes());
        out
    }

    fn u16s(values: &[u16]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    /// Zone list with one zone per generator start index, plus terminal.
    fn bags(generator_starts: &[u16]) -> Vec<u8> {
        let values: Vec<u16> = generator_starts.iter().flat_map(|&g| [g, 0]).collect();
        u16s(&values)
    }

    /// Generator list plus terminal.
    fn generators(pairs: &[(u16, u16)]) -> Vec<u8> {
        let values: Vec<u16> = pairs
            .iter()
            .chain([&(0, 0)])
            .flat_map(|&(kind, amount)| [kind, amount])
            .collect();
        u16s(&values)
    }

    fn preset_header(label: &str, program: u16, bank: u16, zone: u16) -> Vec<u8> {
        let mut out = name(label).to_vec();
        out.extend(u16s(&[program, bank, zone]));
        out.extend_from_slice(&[0; 12]);
        out
    }

    fn instrument_header(label: &str, zone: u16) -> Vec<u8> {
        let mut out = name(label).to_vec();
        out.extend(u16s(&[zone]));
        out
    }

    fn sample_header(label: &str, end: i32, loop_range: (i32, i32), rate: i32) -> Vec<u8> {
        let mut out = name(label).to_vec();
        for value in [0, end, loop_range.0, loop_range.1, rate] {
            out.extend_from_slice(&value.to_le_bytes());
        }
        // original pitch, correction, link, type (mono)
        out.extend_from_slice(&[KEY, 0]);
        out.extend(u16s(&[0, 1]));
        out
    }

    /// A looped 441 Hz tone, offered as "Tone" at (0, 0) and "Kit" at
    /// (128, 0), plus two presets outside the addressable range.
    fn test_soundfont_bytes() -> Vec<u8> {
        // 100-sample period at 44.1 kHz, looped over whole periods.
        let step = 2.0 * std::f64::consts::PI / 100.0;
        let mut wave: Vec<i16> = (0..2000)
            .map(|n| (16_000.0 * (step * n as f64).sin()) as i16)
            .collect();
        wave.extend([0; 46]);
        let smpl: Vec<u8> = wave.iter().flat_map(|s| s.to_le_bytes()).collect();

        let phdr = [
            preset_header("Tone", 0, 0, 0),
            preset_header("Kit", 0, 128, 1),
            preset_header("Bank 129", 0, 129, 2),
            preset_header("Program 200", 200, 0, 3),
            preset_header("EOP", 0, 0, 4),
        ]
        .concat();
        let pbag = bags(&[0, 1, 2, 3, 4]);
        let pgen = generators(&[
            (GEN_INSTRUMENT, 0),
            (GEN_INSTRUMENT, 1),
            (GEN_INSTRUMENT, 0),
            (GEN_INSTRUMENT, 1),
        ]);
        let inst = [
            instrument_header("Tone", 0),
            instrument_header("Kit", 1),
            instrument_header("EOI", 2),
        ]
        .concat();
        let ibag = bags(&[0, 2, 4]);
        // Continuous loop over sample 0
        let zone = [(GEN_SAMPLE_MODES, 1), (GEN_SAMPLE_ID, 0)];
        let igen = generators(&[zone, zone].concat());
        let shdr = [
            sample_header("Sine", 2000, (100, 1900), 44_100),
            sample_header("EOS", 0, (0, 0), 0),
        ]
        .concat();

        let info = [
            chunk(b"ifil", &u16s(&[2, 1])),
            chunk(b"INAM", b"Test\0\0"),
        ];
        let pdta = [
            chunk(b"phdr", &phdr),
            chunk(b"pbag", &pbag),
            chunk(b"pgen", &pgen),
            chunk(b"inst", &inst),
            chunk(b"ibag", &ibag),
            chunk(b"igen", &igen),
            chunk(b"shdr", &shdr),
        ];

        let mut body = b"sfbk".to_vec();
        body.extend(list(b"INFO", &info));
        body.extend(list(b"sdta", &[chunk(b"smpl", &smpl)]));
        body.extend(list(b"pdta", &pdta));
        chunk(b"RIFF", &body)
    }

    fn load_test_engine(tag: &str) -> SoundFontEngine {
        let file = format!("sf2lv2-core-{tag}-{}.sf2", std::process::id());
        let path = std::env::temp_dir().join(file);
        std::fs::write(&path, test_soundfont_bytes()).unwrap();
        let result = SoundFontEngine::load(&path, SAMPLE_RATE, &EngineSettings::default());
        let _ = std::fs::remove_file(&path);
        result.unwrap()
    }

    /// Render `frames` frames in quantum-sized blocks; returns the left channel.
    fn render(engine: &mut SoundFontEngine, frames: usize) -> Vec<f32> {
        let mut out = Vec::with_capacity(frames);
        let mut left = [0.0; BLOCK];
        let mut right = [0.0; BLOCK];
        while out.len() < frames {
            engine.render_block(&mut left, &mut right);
            out.extend_from_slice(&left);
        }
        out.truncate(frames);
        out
    }

    fn energy(samples: &[f32]) -> f32 {
        samples.iter().map(|s| s * s).sum()
    }

    fn seconds(value: f64) -> usize {
        (value * SAMPLE_RATE) as usize
    }

    /// Energy of a held note between `from` and `to` seconds after note on.
    fn held_note_energy(controls: &[(u8, u8)], from: f64, to: f64) -> f32 {
        let mut engine = load_test_engine("held");
        for &(controller, value) in controls {
            engine.control_change(0, controller, value);
        }
        engine.note_on(0, KEY, 100);
        let out = render(&mut engine, seconds(to));
        energy(&out[seconds(from)..])
    }

    // =====================================================================
    // Loading
    // =====================================================================

    #[test]
    fn test_missing_soundfont() {
        let path = std::env::temp_dir().join("sf2lv2-core-missing.sf2");
        let result = SoundFontEngine::load(&path, 48_000.0, &EngineSettings::default());
        assert!(matches!(result, Err(LoadError::ResourceNotFound { .. })));
    }

    #[test]
    fn test_corrupt_soundfont() {
        let path = std::env::temp_dir().join(format!(
            "sf2lv2-core-corrupt-{}.sf2",
            std::process::id()
        ));
        std::fs::write(&path, b"RIFF\0\0\0\0not a soundfont").unwrap();
        let result = SoundFontEngine::load(&path, 48_000.0, &EngineSettings::default());
        let _ = std::fs::remove_file(&path);
        assert!(matches!(result, Err(LoadError::CorruptResource { .. })));
    }

    #[test]
    fn test_invalid_settings_rejected_before_loading() {
        let settings = EngineSettings {
            voice_count: 0,
            ..EngineSettings::default()
        };
        let path = std::env::temp_dir().join("sf2lv2-core-missing.sf2");
        let result = SoundFontEngine::load(&path, 48_000.0, &settings);
        assert!(matches!(result, Err(LoadError::EngineSetup(_))));
    }

    #[test]
    fn test_catalog_skips_unaddressable_presets() {
        let engine = load_test_engine("catalog");

        let catalog = PresetCatalog::build(&engine).unwrap();
        let addresses: Vec<_> = catalog
            .entries()
            .iter()
            .map(|e| (e.bank, e.program, e.name.as_str()))
            .collect();
        assert_eq!(addresses, vec![(0, 0, "Tone"), (128, 0, "Kit")]);
        assert!(!engine.has_preset(129, 0));
    }

    #[test]
    fn test_select_bank_program() {
        let mut engine = load_test_engine("select");

        assert!(engine.select_bank_program(0, 128, 0).is_ok());
        assert!(engine.select_bank_program(0, 0, 0).is_ok());
        assert_eq!(
            engine.select_bank_program(0, 1, 0),
            Err(EngineError::PresetNotFound {
                bank: 1,
                program: 0
            })
        );
    }

    #[test]
    fn test_render_produces_finite_audio() {
        let mut engine = load_test_engine("render");
        assert!(render(&mut engine, BLOCK * 4).iter().all(|s| *s == 0.0));

        engine.note_on(0, KEY, 100);
        let out = render(&mut engine, seconds(0.1));
        assert!(out.iter().all(|s| s.is_finite()));
        assert!(energy(&out) > 1.0);
    }

    // =====================================================================
    // Sound controllers
    // =====================================================================

    #[test]
    fn test_brightness_darkens_output() {
        let open = held_note_energy(&[], 0.05, 0.2);
        let closed = held_note_energy(&[(74, 0)], 0.05, 0.2);
        assert!(closed * 10.0 < open, "closed {closed} vs open {open}");
    }

    #[test]
    fn test_resonance_boosts_tone_at_cutoff() {
        // Cutoff 57 sits at about 444 Hz.
        let flat = held_note_energy(&[(74, 57), (71, 0)], 0.1, 0.2);
        let resonant = held_note_energy(&[(74, 57), (71, 127)], 0.1, 0.2);
        assert!(resonant > flat * 4.0, "resonant {resonant} vs flat {flat}");
    }

    #[test]
    fn test_attack_fades_in() {
        let immediate = held_note_energy(&[], 0.0, 0.1);
        let slow = held_note_energy(&[(73, 127)], 0.0, 0.1);
        assert!(slow * 100.0 < immediate, "slow {slow} vs immediate {immediate}");
    }

    #[test]
    fn test_decay_falls_to_sustain() {
        // Decay 20 is about 0.1 s; sustain 0 ends in silence.
        let held = held_note_energy(&[], 0.15, 0.25);
        let decayed = held_note_energy(&[(75, 20), (70, 0)], 0.15, 0.25);
        assert!(decayed * 1000.0 < held, "decayed {decayed} vs held {held}");

        let sustained = held_note_energy(&[(75, 20), (70, 64)], 0.15, 0.25);
        assert!(sustained > held * 0.1 && sustained < held * 0.5);
    }

    fn energy_after_release(release: u8) -> f32 {
        let mut engine = load_test_engine("release");
        engine.control_change(0, 72, release);
        engine.note_on(0, KEY, 100);
        render(&mut engine, seconds(0.1));
        engine.note_off(0, KEY);
        let out = render(&mut engine, seconds(0.3));
        energy(&out[seconds(0.1)..])
    }

    #[test]
    fn test_release_extends_note() {
        let short = energy_after_release(0);
        let long = energy_after_release(127);
        assert!(short < 1e-3, "short release left {short}");
        assert!(long > 1.0, "long release left {long}");
    }

    #[test]
    fn test_hold_pedal_defers_release() {
        let mut engine = load_test_engine("hold");
        engine.note_on(0, KEY, 100);
        engine.control_change(0, 64, 127);
        engine.note_off(0, KEY);
        let held = render(&mut engine, seconds(0.1));
        assert!(energy(&held[seconds(0.05)..]) > 1.0);

        engine.control_change(0, 64, 0);
        let released = render(&mut engine, seconds(0.2));
        assert!(energy(&released[seconds(0.1)..]) < 1e-3);
    }

    #[test]
    fn test_all_sounds_off_silences_channel() {
        let mut engine = load_test_engine("silence");
        engine.control_change(0, 72, 127);
        engine.note_on(0, KEY, 100);
        render(&mut engine, seconds(0.05));

        engine.control_change(0, 120, 0);
        assert!(engine.slots.iter().all(|slot| slot.is_free()));
        let out = render(&mut engine, seconds(0.05));
        assert!(energy(&out) < 1e-6);
    }

    #[test]
    fn test_notes_spread_over_note_channels() {
        let mut engine = load_test_engine("spread");
        for key in 60..63 {
            engine.note_on(0, key, 100);
        }
        let channels: Vec<u8> = engine
            .slots
            .iter()
            .filter(|slot| slot.is_playing())
            .map(|slot| slot.channel)
            .collect();
        assert_eq!(channels, vec![0, 1, 2]);

        engine.all_notes_off(ChannelTarget::All);
        assert!(engine.slots.iter().all(|slot| !slot.is_playing()));
    }
}
