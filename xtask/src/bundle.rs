//! LV2 bundle generation.
//!
//! A bundle is a directory `<name>.lv2` containing:
//!
//! ```text
//! manifest.ttl       plugin URI, binary and description pointers
//! <name>.ttl         ports, with one program scale point per preset
//! <name>.so          the soundfont plugin built for this name
//! soundfont.sf2      the SoundFont itself
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use sf2lv2_core::config::DEFAULT_SOUNDFONT_FILE;
use sf2lv2_core::{EngineSettings, PresetCatalog, SoundFontEngine};
use sf2lv2_lv2::ttl::{manifest_ttl, plugin_ttl, BundleInfo};

use crate::util::{
    get_lv2_version, install_bundle, library_extension, library_file_name, sanitize_name,
    shorten_path,
};

/// Cargo package of the plugin binary.
const PLUGIN_PACKAGE: &str = "sf2lv2-soundfont";

/// Environment variable read by the plugin's build script.
const PLUGIN_NAME_VAR: &str = "SF2LV2_PLUGIN_NAME";

const URI_BASE: &str = "https://github.com/islainstruments/sf2lv2/";

/// Sample rate used only to load the SoundFont for preset scanning.
const SCAN_SAMPLE_RATE: f64 = 44100.0;

/// Parsed `bundle` command line.
#[derive(Debug, PartialEq)]
pub struct BundleOptions {
    pub soundfont: PathBuf,
    pub name: String,
    pub release: bool,
    pub install: bool,
    pub verbose: bool,
}

impl BundleOptions {
    /// Parse the arguments after `bundle`.
    pub fn parse(args: &[String]) -> Result<Self, String> {
        let mut soundfont = None;
        let mut name = None;
        let mut release = false;
        let mut install = false;
        let mut verbose = false;

        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--release" => release = true,
                "--install" => install = true,
                "--verbose" | "-v" => verbose = true,
                "--name" => {
                    let value = iter.next().ok_or("--name requires a value")?;
                    name = Some(value.clone());
                }
                flag if flag.starts_with('-') => return Err(format!("Unknown option: {}", flag)),
                path if soundfont.is_none() => soundfont = Some(PathBuf::from(path)),
                extra => return Err(format!("Unexpected argument: {}", extra)),
            }
        }

        let soundfont: PathBuf = soundfont.ok_or("Missing SoundFont path")?;
        let raw_name = match name {
            Some(name) => name,
            None => soundfont
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .ok_or("Cannot derive a plugin name from the SoundFont path")?,
        };
        let name = sanitize_name(&raw_name);
        if name.is_empty() {
            return Err("Plugin name is empty".to_string());
        }

        Ok(Self {
            soundfont,
            name,
            release,
            install,
            verbose,
        })
    }
}

/// Build the plugin and assemble its bundle.
pub fn bundle(options: &BundleOptions, workspace_root: &Path) -> Result<PathBuf, String> {
    if !options.soundfont.is_file() {
        return Err(format!(
            "SoundFont not found: {}",
            options.soundfont.display()
        ));
    }

    let library = build_plugin(options, workspace_root)?;

    let bundle_name = format!("{}.lv2", options.name);
    let bundle_dir = workspace_root.join("target").join("lv2").join(&bundle_name);
    if bundle_dir.exists() {
        fs::remove_dir_all(&bundle_dir)
            .map_err(|e| format!("Failed to remove old bundle: {}", e))?;
    }
    fs::create_dir_all(&bundle_dir)
        .map_err(|e| format!("Failed to create bundle directory: {}", e))?;

    let binary = format!("{}.{}", options.name, library_extension());
    fs::copy(&library, bundle_dir.join(&binary))
        .map_err(|e| format!("Failed to copy plugin binary: {}", e))?;

    let soundfont_path = bundle_dir.join(DEFAULT_SOUNDFONT_FILE);
    crate::verbose!(
        options.verbose,
        "  Copying {} to {}",
        options.soundfont.display(),
        soundfont_path.display()
    );
    fs::copy(&options.soundfont, &soundfont_path)
        .map_err(|e| format!("Failed to copy SoundFont: {}", e))?;

    let catalog = scan_presets(&soundfont_path)?;
    print_presets(&catalog);

    let (minor_version, micro_version) = get_lv2_version(workspace_root)?;
    let uri = format!("{}{}", URI_BASE, options.name);
    let description = format!("{}.ttl", options.name);
    let soundfont_name = options
        .soundfont
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| options.name.clone());
    let info = BundleInfo {
        uri: &uri,
        name: &options.name,
        soundfont_name: &soundfont_name,
        binary: &binary,
        description: &description,
        minor_version,
        micro_version,
    };

    fs::write(bundle_dir.join(&description), plugin_ttl(&info, &catalog))
        .map_err(|e| format!("Failed to write {}: {}", description, e))?;
    fs::write(bundle_dir.join("manifest.ttl"), manifest_ttl(&info))
        .map_err(|e| format!("Failed to write manifest.ttl: {}", e))?;

    crate::status!("Bundle created: {}", shorten_path(&bundle_dir));

    if options.install {
        let dest = install_bundle(&bundle_dir, &bundle_name, options.verbose)?;
        crate::status!("Installed: {}", shorten_path(&dest));
    }

    Ok(bundle_dir)
}

/// Build the plugin library with the plugin name baked in.
fn build_plugin(options: &BundleOptions, workspace_root: &Path) -> Result<PathBuf, String> {
    crate::status!("Building {} as {}...", PLUGIN_PACKAGE, options.name);

    let mut cmd = Command::new("cargo");
    cmd.arg("build")
        .arg("-p")
        .arg(PLUGIN_PACKAGE)
        .env(PLUGIN_NAME_VAR, &options.name)
        .current_dir(workspace_root);

    if options.release {
        cmd.arg("--release");
    }

    let status = cmd
        .status()
        .map_err(|e| format!("Failed to run cargo: {}", e))?;
    if !status.success() {
        return Err("Build failed".to_string());
    }

    let profile = if options.release { "release" } else { "debug" };
    let library = workspace_root
        .join("target")
        .join(profile)
        .join(library_file_name(PLUGIN_PACKAGE));

    if !library.exists() {
        return Err(format!("Built library not found at {}", library.display()));
    }
    Ok(library)
}

/// Load the SoundFont the same way the plugin will and list its presets.
fn scan_presets(soundfont_path: &Path) -> Result<PresetCatalog, String> {
    let engine =
        SoundFontEngine::load(soundfont_path, SCAN_SAMPLE_RATE, &EngineSettings::default())
            .map_err(|e| e.to_string())?;
    PresetCatalog::build(&engine).map_err(|e| e.to_string())
}

fn print_presets(catalog: &PresetCatalog) {
    crate::status!("Found {} presets:", catalog.len());
    for (index, entry) in catalog.entries().iter().enumerate() {
        crate::status!(
            "  {:3}: [{:3},{:3}] {}",
            index,
            entry.bank,
            entry.program,
            entry.name
        );
    }
}
