pub mod sweep;

use log::LevelFilter;

/// Exit code for configuration rejected before the sweep starts.
pub const EXIT_CONFIG: i32 = 2;
/// Exit code when the sweep ran but its report could not be written.
pub const EXIT_REPORT: i32 = 1;

/// Install the process-wide logger. `RUST_LOG` takes precedence over `--debug`.
pub fn init_logging(debug: bool) {
    env_logger::Builder::new()
        .filter_level(level_for(debug))
        .parse_default_env()
        .format_timestamp_secs()
        .init();
}

fn level_for(debug: bool) -> LevelFilter {
    if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}
