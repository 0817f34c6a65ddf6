//! `tsdb-sweep`: validate the configuration, run the sweep, write the report.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{error, info, warn};
use tsdb_sweep_core::{SweepConfig, Sweeper, SystemRunner};

use super::{EXIT_CONFIG, EXIT_REPORT};

/// Run a sweep and return the process exit code.
///
/// Failed metrics do not change the exit code; only a rejected configuration
/// or an unwritable report does.
pub fn run(config: &SweepConfig, report_path: Option<&Path>) -> i32 {
    if let Err(e) = config.validate() {
        error!("invalid configuration: {e}");
        return EXIT_CONFIG;
    }

    // First Ctrl+C finishes the in-flight chunk and stops; the second one
    // exits immediately.
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        if r.swap(false, Ordering::SeqCst) {
            warn!("interrupt received; stopping after the current chunk (Ctrl+C again to abort)");
        } else {
            std::process::exit(130);
        }
    }) {
        warn!("could not install Ctrl+C handler: {e}");
    }

    let report = Sweeper::new(config, &SystemRunner)
        .with_stop_flag(running)
        .run();

    if let Some(path) = report_path {
        if let Err(e) = report.write_to(path) {
            error!("{e} ({})", path.display());
            return EXIT_REPORT;
        }
        info!("report written to {}", path.display());
    }

    0
}
