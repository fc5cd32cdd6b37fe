//! Program change state machine.
//!
//! The host selects presets through an integer "program" port holding a
//! catalog index. When the rounded port value names a different preset than
//! the current selection, the controller runs the switch sequence within the
//! same cycle:
//!
//! ```text
//! Idle --[port differs, index valid]--> Switching
//!   1. all notes off, all sounds off (every channel)
//!   2. engine CCs back to baseline (cutoff open, the rest zero)
//!   3. bank select, then program change
//!   4. selection = index
//! Switching --[end of cycle]--> Idle
//! ```
//!
//! A switch suppresses parameter dispatch for the rest of the cycle, since
//! step 2 already set the engine's controller baseline.

use crate::catalog::PresetCatalog;
use crate::controls::reset_engine_controls;
use crate::engine::{ChannelTarget, SynthEngine, PLAYBACK_CHANNEL};
use crate::error::ProgramError;

/// Per-cycle state of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramState {
    /// No switch happened this cycle.
    Idle,
    /// A switch to `index` happened this cycle.
    Switching { index: usize },
}

/// Owns the authoritative program selection of an instance.
#[derive(Debug)]
pub struct ProgramController {
    selection: Option<usize>,
    state: ProgramState,
    /// Last out-of-range request, so it is only reported once.
    last_rejected: Option<usize>,
}

impl Default for ProgramController {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgramController {
    /// Create a controller with no selection.
    pub fn new() -> Self {
        Self {
            selection: None,
            state: ProgramState::Idle,
            last_rejected: None,
        }
    }

    /// Current catalog index, `None` before the first valid selection.
    pub fn selection(&self) -> Option<usize> {
        self.selection
    }

    pub fn state(&self) -> ProgramState {
        self.state
    }

    /// Catalog index requested by a program port value.
    ///
    /// Returns `None` when the port is unconnected, not finite, rounds to a
    /// negative number, or already names the current selection.
    pub fn requested_index(&self, port_value: Option<f32>) -> Option<usize> {
        let rounded = port_value?.round();
        if !rounded.is_finite() || rounded < 0.0 {
            return None;
        }
        let index = rounded as usize;
        (self.selection != Some(index)).then_some(index)
    }

    /// Check the program port and switch if it requests a new preset.
    ///
    /// Returns `true` when a switch was performed.
    pub fn poll<E: SynthEngine + ?Sized>(
        &mut self,
        engine: &mut E,
        catalog: &PresetCatalog,
        port_value: Option<f32>,
    ) -> bool {
        let Some(index) = self.requested_index(port_value) else {
            return false;
        };

        match self.select(engine, catalog, index) {
            Ok(()) => true,
            Err(err) => {
                if self.last_rejected != Some(index) {
                    log::debug!("{err}");
                    self.last_rejected = Some(index);
                }
                false
            }
        }
    }

    /// Run the switch sequence for `index`.
    ///
    /// Every call resets the engine, even when `index` is already selected.
    /// An out-of-range index is rejected before any engine command.
    pub fn select<E: SynthEngine + ?Sized>(
        &mut self,
        engine: &mut E,
        catalog: &PresetCatalog,
        index: usize,
    ) -> Result<(), ProgramError> {
        let entry = catalog.get(index).ok_or(ProgramError::InvalidIndex {
            index,
            catalog_size: catalog.len(),
        })?;

        engine.all_notes_off(ChannelTarget::All);
        engine.all_sounds_off(ChannelTarget::All);

        log::debug!(
            "Changing to program {index} (bank:{} prog:{})",
            entry.bank,
            entry.program
        );

        reset_engine_controls(engine);

        if let Err(err) = engine.select_bank_program(PLAYBACK_CHANNEL, entry.bank, entry.program) {
            log::debug!("{err}");
        }

        self.selection = Some(index);
        self.state = ProgramState::Switching { index };
        self.last_rejected = None;
        Ok(())
    }

    /// Return to `Idle`; called unconditionally at the end of every cycle.
    pub fn finish_cycle(&mut self) {
        self.state = ProgramState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::recording::{Command, RecordingEngine};

    fn setup() -> (RecordingEngine, PresetCatalog) {
        let engine =
            RecordingEngine::with_presets(&[(0, 0, "Piano"), (0, 1, "Bass"), (128, 0, "Kit")]);
        let catalog = PresetCatalog::build(&engine).unwrap();
        (engine, catalog)
    }

    fn switch_sequence(bank: u16, program: u8) -> Vec<Command> {
        let mut commands = vec![
            Command::AllNotesOff(ChannelTarget::All),
            Command::AllSoundsOff(ChannelTarget::All),
        ];
        for (controller, value) in [(74, 127), (71, 0), (73, 0), (75, 0), (70, 0), (72, 0)] {
            commands.push(Command::ControlChange {
                channel: 0,
                controller,
                value,
            });
        }
        commands.push(Command::BankSelect { channel: 0, bank });
        commands.push(Command::ProgramChange {
            channel: 0,
            program,
        });
        commands
    }

    #[test]
    fn test_initial_state() {
        let controller = ProgramController::new();
        assert_eq!(controller.selection(), None);
        assert_eq!(controller.state(), ProgramState::Idle);
    }

    #[test]
    fn test_select_percussion_kit() {
        let (mut engine, catalog) = setup();
        let mut controller = ProgramController::new();

        assert!(controller.poll(&mut engine, &catalog, Some(2.0)));

        assert_eq!(engine.commands, switch_sequence(128, 0));
        assert_eq!(controller.selection(), Some(2));
        assert_eq!(controller.state(), ProgramState::Switching { index: 2 });

        controller.finish_cycle();
        assert_eq!(controller.state(), ProgramState::Idle);
    }

    #[test]
    fn test_unchanged_port_does_nothing() {
        let (mut engine, catalog) = setup();
        let mut controller = ProgramController::new();

        assert!(controller.poll(&mut engine, &catalog, Some(1.0)));
        controller.finish_cycle();
        engine.clear();

        assert!(!controller.poll(&mut engine, &catalog, Some(1.0)));
        assert!(!controller.poll(&mut engine, &catalog, Some(1.3)));
        assert!(engine.commands.is_empty());
        assert_eq!(controller.state(), ProgramState::Idle);
    }

    #[test]
    fn test_port_value_rounds_to_nearest() {
        let (mut engine, catalog) = setup();
        let mut controller = ProgramController::new();

        assert!(controller.poll(&mut engine, &catalog, Some(0.6)));
        assert_eq!(controller.selection(), Some(1));
    }

    #[test]
    fn test_negative_and_unconnected_are_ignored() {
        let (mut engine, catalog) = setup();
        let mut controller = ProgramController::new();

        assert!(!controller.poll(&mut engine, &catalog, Some(-1.0)));
        assert!(!controller.poll(&mut engine, &catalog, None));
        assert!(!controller.poll(&mut engine, &catalog, Some(f32::NAN)));
        assert!(engine.commands.is_empty());
        assert_eq!(controller.selection(), None);
    }

    #[test]
    fn test_out_of_range_index_rejected() {
        let (mut engine, catalog) = setup();
        let mut controller = ProgramController::new();
        controller.poll(&mut engine, &catalog, Some(0.0));
        controller.finish_cycle();
        engine.clear();

        assert!(!controller.poll(&mut engine, &catalog, Some(3.0)));
        assert!(engine.commands.is_empty());
        assert_eq!(controller.selection(), Some(0));
        assert_eq!(controller.state(), ProgramState::Idle);

        assert_eq!(
            controller.select(&mut engine, &catalog, 7),
            Err(ProgramError::InvalidIndex {
                index: 7,
                catalog_size: 3
            })
        );
    }

    #[test]
    fn test_repeated_select_resets_each_time() {
        let (mut engine, catalog) = setup();
        let mut controller = ProgramController::new();

        controller.select(&mut engine, &catalog, 1).unwrap();
        controller.select(&mut engine, &catalog, 1).unwrap();

        let mut expected = switch_sequence(0, 1);
        expected.extend(switch_sequence(0, 1));
        assert_eq!(engine.commands, expected);
        assert_eq!(controller.selection(), Some(1));
    }

    #[test]
    fn test_engine_failure_still_updates_selection() {
        let (mut engine, catalog) = setup();
        engine.reject_programs = true;
        let mut controller = ProgramController::new();

        assert!(controller.poll(&mut engine, &catalog, Some(1.0)));
        assert_eq!(controller.selection(), Some(1));
        controller.finish_cycle();
        engine.clear();

        // No retry on the next cycle
        assert!(!controller.poll(&mut engine, &catalog, Some(1.0)));
        assert!(engine.commands.is_empty());
    }
}
