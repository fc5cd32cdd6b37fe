//! Per-instance runtime state and the processing cycle.
//!
//! [`Instrument`] owns the engine and everything derived from it. The host
//! glue reads the port values for a cycle into [`CycleInputs`] and calls
//! [`Instrument::run`], which performs, in order:
//!
//! 1. program check (a switch skips step 2)
//! 2. control dispatch
//! 3. master level
//! 4. incoming events
//! 5. rendering
//!
//! The instance is single-threaded: the host serializes every call.

use crate::catalog::PresetCatalog;
use crate::controls::{ControlState, ControlValues, CONTROL_COUNT};
use crate::engine::{ChannelTarget, SynthEngine};
use crate::error::LoadResult;
use crate::midi::{dispatch_events, TimedEvent};
use crate::program::ProgramController;
use crate::render::RenderQuantum;

/// Control port values sampled at the start of a cycle.
///
/// `None` marks an unconnected port.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CycleInputs {
    pub level: Option<f32>,
    pub program: Option<f32>,
    pub controls: ControlValues,
}

impl CycleInputs {
    /// Inputs with every port unconnected.
    pub const fn unconnected() -> Self {
        Self {
            level: None,
            program: None,
            controls: [None; CONTROL_COUNT],
        }
    }
}

/// A loaded instrument: engine, preset catalog and runtime state.
pub struct Instrument<E: SynthEngine> {
    engine: E,
    catalog: PresetCatalog,
    controls: ControlState,
    program: ProgramController,
    quantum: RenderQuantum,
}

impl<E: SynthEngine> Instrument<E> {
    /// Build the preset catalog and scratch buffers for a loaded engine.
    pub fn new(engine: E) -> LoadResult<Self> {
        let catalog = PresetCatalog::build(&engine)?;
        let quantum = RenderQuantum::allocate()?;

        Ok(Self {
            engine,
            catalog,
            controls: ControlState::new(),
            program: ProgramController::new(),
            quantum,
        })
    }

    pub fn catalog(&self) -> &PresetCatalog {
        &self.catalog
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn controls(&self) -> &ControlState {
        &self.controls
    }

    /// Currently selected catalog index.
    pub fn program(&self) -> Option<usize> {
        self.program.selection()
    }

    /// Prepare for processing: silence anything left over.
    pub fn activate(&mut self) {
        self.silence();
    }

    /// Stop processing: silence every voice.
    pub fn deactivate(&mut self) {
        self.silence();
    }

    fn silence(&mut self) {
        self.engine.all_notes_off(ChannelTarget::All);
        self.engine.all_sounds_off(ChannelTarget::All);
    }

    /// Process one cycle of `frames` frames.
    pub fn run<'a, I>(
        &mut self,
        inputs: &CycleInputs,
        events: I,
        frames: usize,
        left: Option<&mut [f32]>,
        right: Option<&mut [f32]>,
    ) where
        I: IntoIterator<Item = TimedEvent<'a>>,
    {
        let switched = self
            .program
            .poll(&mut self.engine, &self.catalog, inputs.program);

        if !switched {
            self.controls.dispatch(&mut self.engine, &inputs.controls);
        }

        if let Some(level) = inputs.level {
            self.engine.set_gain(level);
        }

        dispatch_events(&mut self.engine, events);

        self.quantum.render(&mut self.engine, frames, left, right);

        self.program.finish_cycle();
    }
}
