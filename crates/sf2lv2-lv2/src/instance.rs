//! SoundFont instrument instance.

use std::ffi::c_void;

use sf2lv2_core::{
    EngineSettings, Instrument, LoadResult, PluginConfig, SoundFontEngine, SynthEngine,
};

use crate::atom::AtomEvents;
use crate::features::Features;
use crate::plugin::Lv2Plugin;
use crate::ports::PortConnections;
use crate::sys::Urid;

/// One plugin instance: the instrument plus its host connections.
pub struct SoundFontInstance<E: SynthEngine = SoundFontEngine> {
    instrument: Instrument<E>,
    ports: PortConnections,
    midi_event: Urid,
}

impl<E: SynthEngine> SoundFontInstance<E> {
    /// Wrap a loaded instrument. `midi_event` is the mapped MIDI event type.
    pub fn new(instrument: Instrument<E>, midi_event: Urid) -> Self {
        Self {
            instrument,
            ports: PortConnections::new(),
            midi_event,
        }
    }

    pub fn instrument(&self) -> &Instrument<E> {
        &self.instrument
    }

    fn connect(&mut self, port: u32, data: *mut c_void) {
        if !self.ports.connect(port, data) {
            log::debug!("Ignoring connection to unknown port {port}");
        }
    }

    /// # Safety
    ///
    /// See [`Lv2Plugin::run`].
    unsafe fn process(&mut self, sample_count: u32) {
        let frames = sample_count as usize;

        // SAFETY: port buffers are valid for this call per the caller.
        let (inputs, events, (left, right)) = unsafe {
            (
                self.ports.inputs(),
                AtomEvents::from_sequence(self.ports.events(), self.midi_event),
                self.ports.outputs(frames),
            )
        };

        self.instrument.run(&inputs, events, frames, left, right);
    }
}

impl Lv2Plugin for SoundFontInstance<SoundFontEngine> {
    fn instantiate(
        config: &'static PluginConfig,
        sample_rate: f64,
        bundle_path: &str,
        features: &Features<'_>,
    ) -> LoadResult<Self> {
        let midi_event = features.midi_event_urid()?;

        let settings = EngineSettings::load(&config.settings_path(bundle_path))?;
        let soundfont_path = config.soundfont_path(bundle_path);
        log::debug!("Loading SoundFont: {}", soundfont_path.display());

        let engine = SoundFontEngine::load(&soundfont_path, sample_rate, &settings)?;
        let instrument = Instrument::new(engine)?;
        log::debug!(
            "{}: {} presets at {sample_rate} Hz",
            config.name,
            instrument.catalog().len()
        );

        Ok(Self::new(instrument, midi_event))
    }

    fn connect_port(&mut self, port: u32, data: *mut c_void) {
        self.connect(port, data);
    }

    fn activate(&mut self) {
        self.instrument.activate();
    }

    unsafe fn run(&mut self, sample_count: u32) {
        // SAFETY: same contract as this method.
        unsafe { self.process(sample_count) }
    }

    fn deactivate(&mut self) {
        self.instrument.deactivate();
    }
}
