//! Atom sequence reading.
//!
//! The event input port carries an `LV2_Atom_Sequence`: a 16-byte header
//! followed by events, each a 16-byte `LV2_Atom_Event` header plus payload,
//! padded to a multiple of 8 bytes. [`AtomEvents`] walks the event region and
//! yields the MIDI payloads as [`TimedEvent`]s. Parsing works on bytes, so
//! a truncated or malformed buffer ends iteration instead of reading past it.

use std::mem::size_of;

use sf2lv2_core::TimedEvent;

use crate::sys::{AtomEvent, AtomSequence, AtomSequenceBody, Urid};

const EVENT_HEADER: usize = size_of::<AtomEvent>();

/// Round `size` up to the atom alignment of 8 bytes.
const fn pad_size(size: usize) -> usize {
    (size + 7) & !7
}

/// Iterator over the MIDI events of an atom sequence.
pub struct AtomEvents<'a> {
    data: &'a [u8],
    offset: usize,
    midi_type: Urid,
}

impl<'a> AtomEvents<'a> {
    /// Iterate the event region of a sequence (the bytes after the sequence
    /// header), keeping events whose atom type is `midi_type`.
    pub fn new(data: &'a [u8], midi_type: Urid) -> Self {
        Self {
            data,
            offset: 0,
            midi_type,
        }
    }

    /// An iterator that yields nothing.
    pub fn empty() -> Self {
        Self::new(&[], 0)
    }

    /// Iterate a sequence in host memory.
    ///
    /// A null pointer yields no events.
    ///
    /// # Safety
    ///
    /// `sequence` must be null or point to a valid atom sequence whose body
    /// is `atom.size` bytes long and stays valid and unmodified for `'a`.
    pub unsafe fn from_sequence(sequence: *const AtomSequence, midi_type: Urid) -> Self {
        if sequence.is_null() {
            return Self::empty();
        }

        // SAFETY: the header is valid per the caller's contract.
        let body_size = unsafe { (*sequence).atom.size } as usize;
        let Some(events_size) = body_size.checked_sub(size_of::<AtomSequenceBody>()) else {
            return Self::empty();
        };

        // SAFETY: the event region directly follows the header and spans the
        // rest of the body.
        let data = unsafe {
            std::slice::from_raw_parts(
                sequence.cast::<u8>().add(size_of::<AtomSequence>()),
                events_size,
            )
        };
        Self::new(data, midi_type)
    }

    fn read_u32(&self, at: usize) -> Option<u32> {
        let bytes = self.data.get(at..at + 4)?;
        Some(u32::from_ne_bytes(bytes.try_into().ok()?))
    }

    fn read_i64(&self, at: usize) -> Option<i64> {
        let bytes = self.data.get(at..at + 8)?;
        Some(i64::from_ne_bytes(bytes.try_into().ok()?))
    }
}

impl<'a> Iterator for AtomEvents<'a> {
    type Item = TimedEvent<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let bytes: &'a [u8] = self.data;
        loop {
            let start = self.offset;
            let frame = self.read_i64(start)?;
            let size = self.read_u32(start + 8)? as usize;
            let kind = self.read_u32(start + 12)?;

            let payload_start = start + EVENT_HEADER;
            let data = bytes.get(payload_start..payload_start.checked_add(size)?)?;

            self.offset = start + pad_size(EVENT_HEADER + size);

            if kind == self.midi_type {
                return Some(TimedEvent { frame, data });
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{event_region, sequence};
    use super::*;
    use crate::features::testing::{MIDI_URID, OTHER_URID};
    use std::ptr;

    fn collect(events: AtomEvents<'_>) -> Vec<(i64, Vec<u8>)> {
        events.map(|e| (e.frame, e.data.to_vec())).collect()
    }

    #[test]
    fn test_pad_size() {
        assert_eq!(pad_size(0), 0);
        assert_eq!(pad_size(3), 8);
        assert_eq!(pad_size(16), 16);
        assert_eq!(pad_size(19), 24);
    }

    #[test]
    fn test_yields_midi_events_in_order() {
        let region = event_region(&[
            (0, MIDI_URID, &[0x90, 60, 100]),
            (12, MIDI_URID, &[0x80, 60, 0]),
        ]);
        let events = collect(AtomEvents::new(&region, MIDI_URID));

        assert_eq!(
            events,
            vec![(0, vec![0x90, 60, 100]), (12, vec![0x80, 60, 0])]
        );
    }

    #[test]
    fn test_skips_other_atom_types() {
        let region = event_region(&[
            (0, OTHER_URID, &[1, 2, 3, 4, 5, 6, 7, 8, 9]),
            (4, MIDI_URID, &[0xB0, 74, 10]),
        ]);
        let events = collect(AtomEvents::new(&region, MIDI_URID));
        assert_eq!(events, vec![(4, vec![0xB0, 74, 10])]);
    }

    #[test]
    fn test_truncated_event_stops_iteration() {
        let mut region = event_region(&[
            (0, MIDI_URID, &[0x90, 60, 100]),
            (1, MIDI_URID, &[0x90, 62, 100]),
        ]);
        region.truncate(region.len() - 6);

        let events = collect(AtomEvents::new(&region, MIDI_URID));
        assert_eq!(events, vec![(0, vec![0x90, 60, 100])]);
    }

    #[test]
    fn test_from_sequence() {
        let buffer = sequence(&[(5, MIDI_URID, &[0xE0, 0, 64])]);
        let events =
            collect(unsafe { AtomEvents::from_sequence(buffer.as_ptr().cast(), MIDI_URID) });
        assert_eq!(events, vec![(5, vec![0xE0, 0, 64])]);
    }

    #[test]
    fn test_null_and_empty_sequences() {
        assert_eq!(
            unsafe { AtomEvents::from_sequence(ptr::null(), MIDI_URID) }.count(),
            0
        );

        let buffer = sequence(&[]);
        assert_eq!(
            unsafe { AtomEvents::from_sequence(buffer.as_ptr().cast(), MIDI_URID) }.count(),
            0
        );
    }
}
