//! C dispatch table generated from [`Lv2Plugin`].
//!
//! # Safety
//!
//! Every entry point catches panics so none crosses the FFI boundary, and
//! checks handles for null before dereferencing. The instance handle is a
//! `Box<P>` turned into a raw pointer by `instantiate` and reclaimed by
//! `cleanup`.

use std::ffi::{c_char, c_void, CStr};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::ptr;

use sf2lv2_core::PluginConfig;

use crate::features::Features;
use crate::logging;
use crate::plugin::Lv2Plugin;
use crate::sys::{Lv2Descriptor, Lv2Feature, Lv2Handle};

/// Run `$body` with the instance behind `$handle`, ignoring null handles and
/// swallowing panics.
macro_rules! with_instance_void {
    ($handle:expr, $plugin:ty, |$instance:ident| $body:expr) => {{
        if $handle.is_null() {
            return;
        }
        let _ = catch_unwind(AssertUnwindSafe(|| {
            // SAFETY: non-null handles come from `instantiate` and the host
            // never uses them concurrently or after `cleanup`.
            let $instance = unsafe { &mut *$handle.cast::<$plugin>() };
            $body
        }));
    }};
}

/// The exported descriptor.
///
/// `raw` comes first, so the `*const Lv2Descriptor` handed to the host is
/// also a pointer to this struct, which is how `instantiate` finds the
/// plugin configuration again.
#[repr(C)]
pub struct Descriptor {
    raw: Lv2Descriptor,
    config: &'static PluginConfig,
}

// SAFETY: the raw pointers reference the `'static` config URI and
// functions, which are immutable.
unsafe impl Send for Descriptor {}
// SAFETY: see above.
unsafe impl Sync for Descriptor {}

impl Descriptor {
    /// Build the dispatch table for plugin type `P`.
    pub fn new<P: Lv2Plugin>(config: &'static PluginConfig) -> Self {
        Self {
            raw: Lv2Descriptor {
                uri: config.uri.as_ptr(),
                instantiate: Some(instantiate::<P>),
                connect_port: Some(connect_port::<P>),
                activate: Some(activate::<P>),
                run: Some(run::<P>),
                deactivate: Some(deactivate::<P>),
                cleanup: Some(cleanup::<P>),
                extension_data: Some(extension_data),
            },
            config,
        }
    }

    pub fn config(&self) -> &'static PluginConfig {
        self.config
    }

    /// Pointer for `lv2_descriptor`.
    pub fn as_ptr(&self) -> *const Lv2Descriptor {
        &self.raw
    }
}

unsafe extern "C" fn instantiate<P: Lv2Plugin>(
    descriptor: *const Lv2Descriptor,
    sample_rate: f64,
    bundle_path: *const c_char,
    features: *const *const Lv2Feature,
) -> Lv2Handle {
    logging::init();

    if descriptor.is_null() || bundle_path.is_null() {
        log::error!("instantiate called without descriptor or bundle path");
        return ptr::null_mut();
    }

    catch_unwind(AssertUnwindSafe(|| {
        // SAFETY: the host passes back the pointer from `Descriptor::as_ptr`,
        // which points to a live `Descriptor`.
        let config = unsafe { (*descriptor.cast::<Descriptor>()).config };

        // SAFETY: the host passes a null-terminated bundle path.
        let Ok(bundle) = unsafe { CStr::from_ptr(bundle_path) }.to_str() else {
            log::error!("{}: bundle path is not valid UTF-8", config.name);
            return ptr::null_mut();
        };

        // SAFETY: the feature array is null-terminated and outlives this call.
        let features = unsafe { Features::from_raw(features) };

        match P::instantiate(config, sample_rate, bundle, &features) {
            Ok(plugin) => Box::into_raw(Box::new(plugin)).cast(),
            Err(err) => {
                log::error!("{}: failed to instantiate: {err}", config.name);
                ptr::null_mut()
            }
        }
    }))
    .unwrap_or(ptr::null_mut())
}

unsafe extern "C" fn connect_port<P: Lv2Plugin>(instance: Lv2Handle, port: u32, data: *mut c_void) {
    with_instance_void!(instance, P, |plugin| plugin.connect_port(port, data));
}

unsafe extern "C" fn activate<P: Lv2Plugin>(instance: Lv2Handle) {
    with_instance_void!(instance, P, |plugin| plugin.activate());
}

unsafe extern "C" fn run<P: Lv2Plugin>(instance: Lv2Handle, sample_count: u32) {
    // SAFETY: the host keeps connected buffers valid for the whole run call.
    with_instance_void!(instance, P, |plugin| unsafe { plugin.run(sample_count) });
}

unsafe extern "C" fn deactivate<P: Lv2Plugin>(instance: Lv2Handle) {
    with_instance_void!(instance, P, |plugin| plugin.deactivate());
}

unsafe extern "C" fn cleanup<P: Lv2Plugin>(instance: Lv2Handle) {
    if instance.is_null() {
        return;
    }
    let _ = catch_unwind(AssertUnwindSafe(|| {
        // SAFETY: the handle was created by `Box::into_raw` in `instantiate`
        // and the host calls cleanup exactly once.
        drop(unsafe { Box::from_raw(instance.cast::<P>()) });
    }));
}

unsafe extern "C" fn extension_data(_uri: *const c_char) -> *const c_void {
    ptr::null()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::testing::FakeHost;
    use sf2lv2_core::LoadResult;
    use std::cell::Cell;

    static CONFIG: PluginConfig = PluginConfig::new(c"urn:sf2lv2:tracker", "Tracker");

    thread_local! {
        static DROPS: Cell<usize> = const { Cell::new(0) };
    }

    /// Plugin that records its lifecycle calls.
    struct Tracker {
        ports: Vec<u32>,
        active: bool,
        frames: u32,
    }

    impl Drop for Tracker {
        fn drop(&mut self) {
            DROPS.with(|d| d.set(d.get() + 1));
        }
    }

    impl Lv2Plugin for Tracker {
        fn instantiate(
            _config: &'static PluginConfig,
            _sample_rate: f64,
            bundle_path: &str,
            features: &Features<'_>,
        ) -> LoadResult<Self> {
            features.midi_event_urid()?;
            if bundle_path.ends_with("panic/") {
                panic!("instantiate panicked");
            }
            Ok(Self {
                ports: Vec::new(),
                active: false,
                frames: 0,
            })
        }

        fn connect_port(&mut self, port: u32, _data: *mut c_void) {
            self.ports.push(port);
        }

        fn activate(&mut self) {
            self.active = true;
        }

        unsafe fn run(&mut self, sample_count: u32) {
            if sample_count == 13 {
                panic!("run panicked");
            }
            self.frames += sample_count;
        }

        fn deactivate(&mut self) {
            self.active = false;
        }
    }

    fn tracker<'a>(handle: Lv2Handle) -> &'a Tracker {
        unsafe { &*handle.cast::<Tracker>() }
    }

    #[test]
    fn test_descriptor_fields() {
        let descriptor = Descriptor::new::<Tracker>(&CONFIG);
        let raw = unsafe { &*descriptor.as_ptr() };

        assert_eq!(unsafe { CStr::from_ptr(raw.uri) }, c"urn:sf2lv2:tracker");
        assert!(raw.instantiate.is_some());
        assert!(raw.cleanup.is_some());
        assert_eq!(descriptor.config().name, "Tracker");

        let extension = raw.extension_data.unwrap();
        assert!(unsafe { extension(c"urn:anything".as_ptr()) }.is_null());
    }

    #[test]
    fn test_lifecycle() {
        let descriptor = Descriptor::new::<Tracker>(&CONFIG);
        let raw = unsafe { &*descriptor.as_ptr() };
        let host = FakeHost::new();

        let handle = unsafe {
            (raw.instantiate.unwrap())(
                descriptor.as_ptr(),
                44100.0,
                c"/tmp/bundle/".as_ptr(),
                host.features(),
            )
        };
        assert!(!handle.is_null());

        unsafe {
            (raw.connect_port.unwrap())(handle, 3, ptr::null_mut());
            (raw.activate.unwrap())(handle);
            (raw.run.unwrap())(handle, 64);
            (raw.run.unwrap())(handle, 13);
            (raw.run.unwrap())(handle, 32);
        }
        assert_eq!(tracker(handle).ports, vec![3]);
        assert!(tracker(handle).active);
        assert_eq!(tracker(handle).frames, 96);

        unsafe { (raw.deactivate.unwrap())(handle) };
        assert!(!tracker(handle).active);

        let before = DROPS.with(Cell::get);
        unsafe { (raw.cleanup.unwrap())(handle) };
        assert_eq!(DROPS.with(Cell::get), before + 1);
    }

    #[test]
    fn test_instantiate_failures_return_null() {
        let descriptor = Descriptor::new::<Tracker>(&CONFIG);
        let raw = unsafe { &*descriptor.as_ptr() };
        let instantiate = raw.instantiate.unwrap();
        let host = FakeHost::new();

        // Missing urid:map
        let handle = unsafe {
            instantiate(descriptor.as_ptr(), 44100.0, c"/tmp/bundle".as_ptr(), ptr::null())
        };
        assert!(handle.is_null());

        // Panic inside instantiate
        let handle = unsafe {
            instantiate(descriptor.as_ptr(), 44100.0, c"/tmp/panic/".as_ptr(), host.features())
        };
        assert!(handle.is_null());

        // No bundle path
        let handle =
            unsafe { instantiate(descriptor.as_ptr(), 44100.0, ptr::null(), host.features()) };
        assert!(handle.is_null());
    }

    #[test]
    fn test_null_handles_are_ignored() {
        let descriptor = Descriptor::new::<Tracker>(&CONFIG);
        let raw = unsafe { &*descriptor.as_ptr() };
        unsafe {
            (raw.connect_port.unwrap())(ptr::null_mut(), 0, ptr::null_mut());
            (raw.activate.unwrap())(ptr::null_mut());
            (raw.run.unwrap())(ptr::null_mut(), 64);
            (raw.deactivate.unwrap())(ptr::null_mut());
            (raw.cleanup.unwrap())(ptr::null_mut());
        }
    }
}
