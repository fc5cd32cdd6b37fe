//! LV2 export macro.

/// Generate the `lv2_descriptor` entry point for a plugin.
///
/// The descriptor is built on first use and lives for the rest of the
/// process. Index 0 returns it; every other index returns null.
///
/// # Arguments
///
/// * `$config` - A `static` [`PluginConfig`](sf2lv2_core::PluginConfig)
/// * `$plugin` - (Optional) The type implementing [`Lv2Plugin`](crate::Lv2Plugin).
///   If omitted, [`SoundFontInstance`](crate::SoundFontInstance) is used.
///
/// # Example
///
/// ```rust,ignore
/// use sf2lv2::prelude::*;
///
/// static CONFIG: PluginConfig =
///     PluginConfig::new(c"https://example.com/plugins/piano", "Piano");
///
/// export_lv2!(CONFIG);
/// ```
#[macro_export]
macro_rules! export_lv2 {
    ($config:expr, $plugin:ty) => {
        #[no_mangle]
        pub extern "C" fn lv2_descriptor(index: u32) -> *const $crate::sys::Lv2Descriptor {
            static DESCRIPTOR: ::std::sync::OnceLock<$crate::Descriptor> =
                ::std::sync::OnceLock::new();

            if index != 0 {
                return ::std::ptr::null();
            }

            DESCRIPTOR
                .get_or_init(|| $crate::Descriptor::new::<$plugin>(&$config))
                .as_ptr()
        }
    };

    ($config:expr) => {
        $crate::export_lv2!($config, $crate::SoundFontInstance);
    };
}

#[cfg(test)]
mod tests {
    use std::ffi::CStr;

    use sf2lv2_core::PluginConfig;

    static CONFIG: PluginConfig = PluginConfig::new(c"urn:sf2lv2:export", "Export");

    mod exported {
        crate::export_lv2!(super::CONFIG);
    }

    #[test]
    fn test_only_index_zero_is_exported() {
        let first = exported::lv2_descriptor(0);
        assert!(!first.is_null());
        assert_eq!(first, exported::lv2_descriptor(0));
        assert!(exported::lv2_descriptor(1).is_null());
        assert!(exported::lv2_descriptor(u32::MAX).is_null());

        let uri = unsafe { CStr::from_ptr((*first).uri) };
        assert_eq!(uri, c"urn:sf2lv2:export");
    }
}
