//! Raw LV2 C ABI types.
//!
//! Only the subset used by an instrument with an atom event input is
//! declared here. Layouts must match `lv2/core/lv2.h`, `lv2/urid/urid.h`
//! and `lv2/atom/atom.h`.

use std::ffi::{c_char, c_void, CStr};

/// Opaque instance handle returned by `instantiate`.
pub type Lv2Handle = *mut c_void;

/// Mapped URI.
pub type Urid = u32;

pub const URID_MAP_URI: &CStr = c"http://lv2plug.in/ns/ext/urid#map";
pub const MIDI_EVENT_URI: &CStr = c"http://lv2plug.in/ns/ext/midi#MidiEvent";

/// `LV2_Feature`.
#[repr(C)]
pub struct Lv2Feature {
    pub uri: *const c_char,
    pub data: *mut c_void,
}

/// `LV2_Descriptor`.
#[repr(C)]
pub struct Lv2Descriptor {
    pub uri: *const c_char,
    pub instantiate: Option<
        unsafe extern "C" fn(
            descriptor: *const Lv2Descriptor,
            sample_rate: f64,
            bundle_path: *const c_char,
            features: *const *const Lv2Feature,
        ) -> Lv2Handle,
    >,
    pub connect_port:
        Option<unsafe extern "C" fn(instance: Lv2Handle, port: u32, data: *mut c_void)>,
    pub activate: Option<unsafe extern "C" fn(instance: Lv2Handle)>,
    pub run: Option<unsafe extern "C" fn(instance: Lv2Handle, sample_count: u32)>,
    pub deactivate: Option<unsafe extern "C" fn(instance: Lv2Handle)>,
    pub cleanup: Option<unsafe extern "C" fn(instance: Lv2Handle)>,
    pub extension_data: Option<unsafe extern "C" fn(uri: *const c_char) -> *const c_void>,
}

/// `LV2_URID_Map`.
#[repr(C)]
pub struct UridMap {
    pub handle: *mut c_void,
    pub map: Option<unsafe extern "C" fn(handle: *mut c_void, uri: *const c_char) -> Urid>,
}

/// `LV2_Atom` header.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct Atom {
    /// Size of the body in bytes, excluding this header.
    pub size: u32,
    pub kind: Urid,
}

/// `LV2_Atom_Sequence_Body` header.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct AtomSequenceBody {
    pub unit: Urid,
    pub pad: u32,
}

/// `LV2_Atom_Sequence`. Events follow the header, each padded to 8 bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct AtomSequence {
    pub atom: Atom,
    pub body: AtomSequenceBody,
}

/// `LV2_Atom_Event` header. The payload follows immediately.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct AtomEvent {
    /// Time stamp in audio frames.
    pub frames: i64,
    pub body: Atom,
}

const _: () = assert!(std::mem::size_of::<AtomSequence>() == 16);
const _: () = assert!(std::mem::size_of::<AtomEvent>() == 16);
