//! Build tooling for sf2lv2 plugins.
//!
//! Usage: cargo xtask bundle <soundfont.sf2> [--name <name>] [--release] [--install] [--verbose]

mod bundle;
mod util;

use std::path::{Path, PathBuf};

use bundle::BundleOptions;
use util::print_error;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 3 || args[1] != "bundle" {
        print_usage();
        std::process::exit(1);
    }

    let options = match BundleOptions::parse(&args[2..]) {
        Ok(options) => options,
        Err(e) => {
            print_error(&e);
            print_usage();
            std::process::exit(1);
        }
    };

    if let Err(e) = bundle::bundle(&options, &workspace_root()) {
        print_error(&e);
        std::process::exit(1);
    }
}

/// The workspace root (parent of the xtask crate).
fn workspace_root() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| manifest_dir.to_path_buf())
}

fn print_usage() {
    eprintln!("Usage: cargo xtask bundle <soundfont.sf2> [--name <name>] [--release] [--install]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  bundle    Build an LV2 instrument bundle for a SoundFont");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --name <name>   Plugin name (default: SoundFont file name)");
    eprintln!("  --release       Build in release mode");
    eprintln!("  --install       Install to ~/.lv2");
    eprintln!("  --verbose, -v   Print every step");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  cargo xtask bundle FluidR3_GM.sf2 --release --install");
    eprintln!("  cargo xtask bundle piano.sf2 --name Piano");
}
