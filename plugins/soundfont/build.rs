//! Bake the plugin name into the binary.
//!
//! The bundler sets `SF2LV2_PLUGIN_NAME` so that every generated bundle gets
//! its own plugin URI. Plain `cargo build` falls back to "soundfont".

const NAME_VAR: &str = "SF2LV2_PLUGIN_NAME";

fn main() {
    println!("cargo:rerun-if-env-changed={NAME_VAR}");

    let name = std::env::var(NAME_VAR)
        .ok()
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "soundfont".to_string());
    println!("cargo:rustc-env={NAME_VAR}={name}");
}
