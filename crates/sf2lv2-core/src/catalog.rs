//! Preset catalog.
//!
//! The host sees the SoundFont's presets as a single integer "program"
//! control. The catalog maps that flat index to a (bank, program) address.
//! It is built once at instantiation by scanning every address, bank by
//! bank, and is read-only afterwards.

use crate::engine::{SynthEngine, MAX_BANK, MAX_PROGRAM};
use crate::error::{LoadError, LoadResult};

/// A selectable preset, addressed by bank and program number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresetEntry {
    /// MIDI bank (0-128, 128 is percussion).
    pub bank: u16,
    /// MIDI program (0-127).
    pub program: u8,
    /// Display name reported by the engine.
    pub name: String,
}

/// Dense, order-stable index of the presets in the loaded SoundFont.
///
/// Entries are sorted by (bank, program). The catalog is never empty.
#[derive(Debug, Clone)]
pub struct PresetCatalog {
    entries: Vec<PresetEntry>,
}

impl PresetCatalog {
    /// Scan the whole bank/program address space of `engine`.
    ///
    /// Returns [`LoadError::NoPresets`] when nothing is found.
    pub fn build<E: SynthEngine + ?Sized>(engine: &E) -> LoadResult<Self> {
        let mut entries = Vec::new();

        for bank in 0..=MAX_BANK {
            for program in 0..=MAX_PROGRAM {
                if !engine.has_preset(bank, program) {
                    continue;
                }
                let name = engine.preset_name(bank, program).unwrap_or_default();
                log::debug!(
                    "Stored program {}: bank={bank} prog={program} name={name}",
                    entries.len()
                );
                entries.push(PresetEntry {
                    bank,
                    program,
                    name: name.to_string(),
                });
            }
        }

        if entries.is_empty() {
            return Err(LoadError::NoPresets);
        }

        log::debug!("Found {} total presets in soundfont", entries.len());
        Ok(Self { entries })
    }

    /// Catalog from known entries, sorted into (bank, program) order.
    ///
    /// Duplicate addresses keep the first entry.
    pub fn from_entries(mut entries: Vec<PresetEntry>) -> LoadResult<Self> {
        entries.sort_by_key(|entry| (entry.bank, entry.program));
        entries.dedup_by_key(|entry| (entry.bank, entry.program));

        if entries.is_empty() {
            return Err(LoadError::NoPresets);
        }
        Ok(Self { entries })
    }

    /// Number of presets. Always at least one.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always `false`; present for API symmetry with slices.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry at catalog index `index`.
    pub fn get(&self, index: usize) -> Option<&PresetEntry> {
        self.entries.get(index)
    }

    /// All entries in catalog order.
    pub fn entries(&self) -> &[PresetEntry] {
        &self.entries
    }

    /// `(index, name)` pairs for the program port's scale points.
    pub fn scale_points(&self) -> impl Iterator<Item = (usize, &str)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .map(|(index, entry)| (index, entry.name.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::recording::RecordingEngine;

    #[test]
    fn test_build_orders_by_bank_then_program() {
        let engine = RecordingEngine::with_presets(&[
            (128, 0, "Kit"),
            (0, 1, "Bass"),
            (0, 0, "Piano"),
        ]);

        let catalog = PresetCatalog::build(&engine).unwrap();
        let addresses: Vec<_> = catalog
            .entries()
            .iter()
            .map(|e| (e.bank, e.program))
            .collect();

        assert_eq!(addresses, vec![(0, 0), (0, 1), (128, 0)]);
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.get(2).unwrap().name, "Kit");
    }

    #[test]
    fn test_build_counts_every_present_address() {
        let presets: Vec<(u16, u8, &str)> = (0..=128u16)
            .step_by(8)
            .flat_map(|bank| [(bank, 0, "a"), (bank, 64, "b"), (bank, 127, "c")])
            .collect();
        let engine = RecordingEngine::with_presets(&presets);

        let catalog = PresetCatalog::build(&engine).unwrap();
        assert_eq!(catalog.len(), presets.len());

        let strictly_increasing = catalog
            .entries()
            .windows(2)
            .all(|w| (w[0].bank, w[0].program) < (w[1].bank, w[1].program));
        assert!(strictly_increasing);
    }

    #[test]
    fn test_build_empty_is_error() {
        let engine = RecordingEngine::default();
        assert!(matches!(
            PresetCatalog::build(&engine),
            Err(LoadError::NoPresets)
        ));
    }

    #[test]
    fn test_scale_points_are_index_aligned() {
        let engine = RecordingEngine::with_presets(&[(0, 0, "Piano"), (128, 0, "Kit")]);
        let catalog = PresetCatalog::build(&engine).unwrap();

        let points: Vec<_> = catalog.scale_points().collect();
        assert_eq!(points, vec![(0, "Piano"), (1, "Kit")]);
    }

    #[test]
    fn test_from_entries_sorts_and_dedups() {
        let entry = |bank, program, name: &str| PresetEntry {
            bank,
            program,
            name: name.to_string(),
        };
        let catalog = PresetCatalog::from_entries(vec![
            entry(128, 0, "Kit"),
            entry(0, 5, "Organ"),
            entry(0, 5, "Organ 2"),
        ])
        .unwrap();

        let names: Vec<_> = catalog.scale_points().map(|(_, name)| name).collect();
        assert_eq!(names, vec!["Organ", "Kit"]);
        assert!(matches!(
            PresetCatalog::from_entries(Vec::new()),
            Err(LoadError::NoPresets)
        ));
    }
}
