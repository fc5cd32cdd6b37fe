//! Shared utilities for xtask.

use std::fs;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

/// Print an error message, with red color if stderr is a terminal.
pub fn print_error(msg: &str) {
    if std::io::stderr().is_terminal() {
        eprintln!("\x1b[1;31mError:\x1b[0m {}", msg);
    } else {
        eprintln!("Error: {}", msg);
    }
}

/// Print status message (always shown)
#[macro_export]
macro_rules! status {
    ($($arg:tt)*) => {
        println!($($arg)*)
    };
}

/// Print verbose message (only in verbose mode)
#[macro_export]
macro_rules! verbose {
    ($verbose:expr, $($arg:tt)*) => {
        if $verbose {
            println!($($arg)*)
        }
    };
}

/// Shorten home directory in path for display
#[must_use]
pub fn shorten_path(path: &Path) -> String {
    if let Some(home) = std::env::var_os("HOME") {
        let home_path = PathBuf::from(home);
        if let Ok(stripped) = path.strip_prefix(&home_path) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}

/// Turn a SoundFont file stem into a plugin name usable in URIs and file
/// names.
/// "Fluid R3 GM.v2" -> "Fluid_R3_GM_v2"
#[must_use]
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// File name of the plugin library produced by cargo for `package`.
#[must_use]
pub fn library_file_name(package: &str) -> String {
    let lib_name = package.replace('-', "_");
    if cfg!(target_os = "windows") {
        format!("{}.dll", lib_name)
    } else if cfg!(target_os = "macos") {
        format!("lib{}.dylib", lib_name)
    } else {
        format!("lib{}.so", lib_name)
    }
}

/// Extension of shared libraries on the host platform.
#[must_use]
pub fn library_extension() -> &'static str {
    if cfg!(target_os = "windows") {
        "dll"
    } else if cfg!(target_os = "macos") {
        "dylib"
    } else {
        "so"
    }
}

/// Read version from workspace Cargo.toml as (minor, micro) for LV2.
///
/// LV2 has no major version; `0.2.0` becomes minor 2, micro 0.
pub fn get_lv2_version(workspace_root: &Path) -> Result<(u32, u32), String> {
    let cargo_toml_path = workspace_root.join("Cargo.toml");
    let cargo_toml = fs::read_to_string(&cargo_toml_path)
        .map_err(|e| format!("Failed to read Cargo.toml: {}", e))?;

    // Parse version from workspace.package.version
    let version = cargo_toml
        .lines()
        .skip_while(|line| !line.contains("[workspace.package]"))
        .skip(1)
        .find(|line| line.trim().starts_with("version"))
        .and_then(|line| line.split('=').nth(1))
        .map(|v| v.trim().trim_matches('"').to_string())
        .ok_or("Could not find version in Cargo.toml")?;

    let parts: Vec<&str> = version.split('.').collect();
    if parts.len() < 3 {
        return Err(format!("Invalid version format: {}", version));
    }

    let minor: u32 = parts[1].parse().map_err(|_| "Invalid minor version")?;
    let micro: u32 = parts[2].parse().map_err(|_| "Invalid patch version")?;

    Ok((minor, micro))
}

/// Per-user LV2 directory that hosts scan, relative to `home`.
#[must_use]
pub fn lv2_user_dir(home: &Path) -> PathBuf {
    if cfg!(target_os = "macos") {
        home.join("Library/Audio/Plug-Ins/LV2")
    } else if cfg!(target_os = "windows") {
        home.join("AppData").join("Roaming").join("LV2")
    } else {
        home.join(".lv2")
    }
}

/// Install an LV2 bundle into the per-user LV2 directory.
///
/// Any existing installation of the same bundle is replaced. Returns the
/// destination path.
pub fn install_bundle(
    bundle_dir: &Path,
    bundle_name: &str,
    verbose: bool,
) -> Result<PathBuf, String> {
    let home = std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .ok_or("HOME not set")?;
    let dest = lv2_user_dir(Path::new(&home)).join(bundle_name);

    if dest.exists() {
        fs::remove_dir_all(&dest)
            .map_err(|e| format!("Failed to remove old installation: {}", e))?;
    }

    let copied = copy_bundle_files(bundle_dir, &dest)?;
    crate::verbose!(
        verbose,
        "    Installed {} files to: {}",
        copied,
        dest.display()
    );

    Ok(dest)
}

/// Copy the files of a bundle directory into `dst`, creating it.
///
/// Bundles are flat; subdirectories are rejected. Returns the number of
/// files copied.
pub fn copy_bundle_files(src: &Path, dst: &Path) -> Result<usize, String> {
    fs::create_dir_all(dst)
        .map_err(|e| format!("Failed to create install directory: {}", e))?;

    let mut copied = 0;
    for entry in fs::read_dir(src).map_err(|e| format!("Failed to read bundle: {}", e))? {
        let entry = entry.map_err(|e| format!("Failed to read entry: {}", e))?;
        let path = entry.path();
        if !path.is_file() {
            return Err(format!("Unexpected entry in bundle: {}", path.display()));
        }
        fs::copy(&path, dst.join(entry.file_name()))
            .map_err(|e| format!("Failed to copy {}: {}", path.display(), e))?;
        copied += 1;
    }

    Ok(copied)
}
