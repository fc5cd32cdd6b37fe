//! Host feature lookup and URID mapping.

use std::ffi::{c_void, CStr};

use sf2lv2_core::{LoadError, LoadResult};

use crate::sys::{Lv2Feature, Urid, UridMap, MIDI_EVENT_URI, URID_MAP_URI};

/// Features passed by the host to `instantiate`.
pub struct Features<'a> {
    entries: Vec<(&'a CStr, *mut c_void)>,
}

impl<'a> Features<'a> {
    /// Collect a null-terminated feature array.
    ///
    /// Null entries and entries without a URI are skipped.
    ///
    /// # Safety
    ///
    /// `features` must be null or point to a null-terminated array of
    /// feature pointers that stay valid for `'a`.
    pub unsafe fn from_raw(features: *const *const Lv2Feature) -> Self {
        let mut entries = Vec::new();
        if features.is_null() {
            return Self { entries };
        }

        let mut cursor = features;
        // SAFETY: the array is null-terminated per the caller's contract.
        unsafe {
            while !(*cursor).is_null() {
                let feature = &**cursor;
                if !feature.uri.is_null() {
                    entries.push((CStr::from_ptr(feature.uri), feature.data));
                }
                cursor = cursor.add(1);
            }
        }

        Self { entries }
    }

    /// Data pointer of the feature with `uri`.
    pub fn get(&self, uri: &CStr) -> Option<*mut c_void> {
        self.entries
            .iter()
            .find(|(feature, _)| *feature == uri)
            .map(|&(_, data)| data)
    }

    /// The host's `urid:map` feature, if provided.
    pub fn urid_map(&self) -> Option<UridMapper<'a>> {
        let data = self.get(URID_MAP_URI)?;
        if data.is_null() {
            return None;
        }
        // SAFETY: the urid:map feature data is an LV2_URID_Map owned by the
        // host for the lifetime of the instance.
        let map = unsafe { &*(data as *const UridMap) };
        map.map.is_some().then_some(UridMapper { map })
    }

    /// Map the MIDI event type, failing when `urid:map` is missing.
    pub fn midi_event_urid(&self) -> LoadResult<Urid> {
        let missing = || LoadError::MissingFeature("urid:map");
        let mapper = self.urid_map().ok_or_else(missing)?;
        mapper.map(MIDI_EVENT_URI).ok_or_else(missing)
    }
}

/// Safe wrapper around the host's URI mapper.
#[derive(Clone, Copy)]
pub struct UridMapper<'a> {
    map: &'a UridMap,
}

impl UridMapper<'_> {
    /// Map `uri` to its URID. `None` when the host returns 0 (failure).
    pub fn map(&self, uri: &CStr) -> Option<Urid> {
        let map_fn = self.map.map?;
        // SAFETY: the host's map callback accepts its own handle and any
        // null-terminated URI.
        let urid = unsafe { map_fn(self.map.handle, uri.as_ptr()) };
        (urid != 0).then_some(urid)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{FakeHost, MIDI_URID};
    use super::*;
    use std::ptr;

    #[test]
    fn test_null_feature_list() {
        let features = unsafe { Features::from_raw(ptr::null()) };
        assert!(features.urid_map().is_none());
        assert!(matches!(
            features.midi_event_urid(),
            Err(LoadError::MissingFeature("urid:map"))
        ));
    }

    #[test]
    fn test_maps_midi_event() {
        let host = FakeHost::new();
        let features = unsafe { Features::from_raw(host.features()) };

        assert!(features.get(URID_MAP_URI).is_some());
        assert_eq!(features.midi_event_urid().unwrap(), MIDI_URID);
    }

    #[test]
    fn test_other_features_are_not_urid_map() {
        let options = Lv2Feature {
            uri: c"http://lv2plug.in/ns/ext/options#options".as_ptr(),
            data: ptr::null_mut(),
        };
        let list = [&options as *const Lv2Feature, ptr::null()];
        let features = unsafe { Features::from_raw(list.as_ptr()) };

        assert!(features.get(c"http://lv2plug.in/ns/ext/options#options").is_some());
        assert!(features.midi_event_urid().is_err());
    }
}
