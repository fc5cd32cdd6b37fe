//! The lifecycle trait behind the exported descriptor.

use std::ffi::c_void;

use sf2lv2_core::{LoadResult, PluginConfig};

use crate::features::Features;

/// An LV2 plugin instance.
///
/// [`Descriptor`](crate::Descriptor) generates the C dispatch table from
/// this trait, so each method corresponds to one descriptor entry. The host
/// never calls two methods of the same instance concurrently.
pub trait Lv2Plugin: Sized + 'static {
    /// Build an instance. Runs off the audio thread and may allocate.
    fn instantiate(
        config: &'static PluginConfig,
        sample_rate: f64,
        bundle_path: &str,
        features: &Features<'_>,
    ) -> LoadResult<Self>;

    /// Record the buffer for `port`. Only stores the pointer.
    fn connect_port(&mut self, port: u32, data: *mut c_void);

    fn activate(&mut self) {}

    /// Process one block.
    ///
    /// # Safety
    ///
    /// Every connected port buffer must be valid for `sample_count` frames
    /// (one value for control ports) for the duration of the call.
    unsafe fn run(&mut self, sample_count: u32);

    fn deactivate(&mut self) {}
}
