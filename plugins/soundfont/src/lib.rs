//! Generic SoundFont instrument.
//!
//! Plays the `soundfont.sf2` in its bundle directory. Engine settings can be
//! overridden by an `engine.json` next to it. Bundles are produced with
//! `cargo xtask bundle <file.sf2>`.

use std::ffi::CStr;

use sf2lv2::prelude::*;

const PLUGIN_NAME: &str = env!("SF2LV2_PLUGIN_NAME");

const PLUGIN_URI: &CStr = match CStr::from_bytes_with_nul(
    concat!(
        "https://github.com/islainstruments/sf2lv2/",
        env!("SF2LV2_PLUGIN_NAME"),
        "\0"
    )
    .as_bytes(),
) {
    Ok(uri) => uri,
    Err(_) => panic!("plugin name must not contain NUL bytes"),
};

static CONFIG: PluginConfig = PluginConfig::new(PLUGIN_URI, PLUGIN_NAME);

export_lv2!(CONFIG);
