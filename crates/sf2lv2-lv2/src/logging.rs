//! Diagnostic logger setup.

use log::LevelFilter;

/// Install the stderr logger.
///
/// Debug output is enabled when the `DEBUG` environment variable is `1` or
/// `true`; otherwise only warnings and errors are written. Safe to call from
/// every instantiation: only the first call in a process has any effect, and
/// a logger installed by the host process is left alone.
pub fn init() {
    let level = if sf2lv2_core::config::diagnostics_requested() {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    let _ = env_logger::Builder::new()
        .filter_level(level)
        .target(env_logger::Target::Stderr)
        .format_timestamp_millis()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init();
        init();
        log::debug!("logger initialized twice");
    }
}
