//! Port connection table.
//!
//! The host hands out raw buffer pointers through `connect_port` and may
//! reconnect any port between cycles. [`PortConnections`] only stores the
//! pointers. It never owns or frees host memory, and buffers are reborrowed
//! as references for the duration of a single `run` call.
//!
//! | Index | Port |
//! |-------|------|
//! | 0 | events in (atom sequence) |
//! | 1, 2 | audio out left, right |
//! | 3 | level |
//! | 4 | program |
//! | 5..=10 | cutoff, resonance, attack, decay, sustain, release |

use std::ffi::c_void;
use std::ptr;

use sf2lv2_core::{Control, CycleInputs, CONTROL_COUNT};

use crate::sys::AtomSequence;

/// Total number of ports.
pub const PORT_COUNT: u32 = 5 + CONTROL_COUNT as u32;

/// A port of the instrument, by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Port {
    Events,
    AudioLeft,
    AudioRight,
    Level,
    Program,
    Control(Control),
}

impl Port {
    /// Port for a host port index, `None` when out of range.
    pub fn from_index(index: u32) -> Option<Self> {
        let port = match index {
            0 => Port::Events,
            1 => Port::AudioLeft,
            2 => Port::AudioRight,
            3 => Port::Level,
            4 => Port::Program,
            _ => {
                let slot = usize::try_from(index.checked_sub(5)?).ok()?;
                Port::Control(*Control::ALL.get(slot)?)
            }
        };
        Some(port)
    }
}

/// Host buffers currently connected to an instance.
pub struct PortConnections {
    events: *const AtomSequence,
    left: *mut f32,
    right: *mut f32,
    level: *const f32,
    program: *const f32,
    controls: [*const f32; CONTROL_COUNT],
}

impl Default for PortConnections {
    fn default() -> Self {
        Self::new()
    }
}

impl PortConnections {
    /// A table with every port unconnected.
    pub fn new() -> Self {
        Self {
            events: ptr::null(),
            left: ptr::null_mut(),
            right: ptr::null_mut(),
            level: ptr::null(),
            program: ptr::null(),
            controls: [ptr::null(); CONTROL_COUNT],
        }
    }

    /// Record the buffer for `index`. Unknown indices are ignored.
    ///
    /// Returns whether the index named a port.
    pub fn connect(&mut self, index: u32, data: *mut c_void) -> bool {
        let Some(port) = Port::from_index(index) else {
            return false;
        };

        match port {
            Port::Events => self.events = data.cast_const().cast(),
            Port::AudioLeft => self.left = data.cast(),
            Port::AudioRight => self.right = data.cast(),
            Port::Level => self.level = data.cast_const().cast(),
            Port::Program => self.program = data.cast_const().cast(),
            Port::Control(control) => {
                self.controls[control as usize] = data.cast_const().cast();
            }
        }
        true
    }

    /// Event input buffer, possibly null.
    pub fn events(&self) -> *const AtomSequence {
        self.events
    }

    /// Sample the control ports for this cycle.
    ///
    /// # Safety
    ///
    /// Every connected control pointer must point to a readable `f32`.
    pub unsafe fn inputs(&self) -> CycleInputs {
        // SAFETY: forwarded from the caller.
        unsafe {
            CycleInputs {
                level: read_control(self.level),
                program: read_control(self.program),
                controls: self.controls.map(|ptr| read_control(ptr)),
            }
        }
    }

    /// Reborrow the audio outputs as slices of `frames` samples.
    ///
    /// When both outputs share one buffer only the left slice is returned,
    /// so the two never alias.
    ///
    /// # Safety
    ///
    /// Every connected output must be valid for `frames` writes and must not
    /// be accessed elsewhere while the returned slices live.
    pub unsafe fn outputs<'a>(
        &self,
        frames: usize,
    ) -> (Option<&'a mut [f32]>, Option<&'a mut [f32]>) {
        // SAFETY: forwarded from the caller.
        unsafe {
            let left = output_slice(self.left, frames);
            let right = if self.right == self.left {
                None
            } else {
                output_slice(self.right, frames)
            };
            (left, right)
        }
    }
}

unsafe fn read_control(ptr: *const f32) -> Option<f32> {
    // SAFETY: non-null control pointers are readable per the caller.
    (!ptr.is_null()).then(|| unsafe { ptr.read() })
}

unsafe fn output_slice<'a>(ptr: *mut f32, frames: usize) -> Option<&'a mut [f32]> {
    if ptr.is_null() {
        return None;
    }
    // SAFETY: non-null outputs hold `frames` samples per the caller.
    Some(unsafe { std::slice::from_raw_parts_mut(ptr, frames) })
}
