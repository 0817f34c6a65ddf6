//! CLI for tsdb-sweep: chunked, resumable fsck over every metric.

mod commands;

use std::path::PathBuf;

use clap::Parser;
use tsdb_sweep_core::SweepConfig;
use tsdb_sweep_core::config::{
    DEFAULT_AGGREGATOR, DEFAULT_CFG_PATH, DEFAULT_STORE_PATH, DEFAULT_SUDO_USER, DEFAULT_TSD_PATH,
};

#[derive(Parser, Debug)]
#[command(name = "tsdb-sweep")]
#[command(about = "tsdb-sweep — run `tsdb fsck --fix-all` over every metric, one time chunk at a time")]
#[command(version = tsdb_sweep_core::VERSION)]
struct Cli {
    /// Verbose logging (RUST_LOG still overrides)
    #[arg(long)]
    debug: bool,

    /// Hours of history to sweep, counted back from now
    #[arg(long, default_value = "48")]
    time_range: u32,

    /// Minutes per repair chunk; must evenly divide 60
    #[arg(long, default_value = "15")]
    time_chunk: u32,

    /// Extra attempts per chunk after a timeout
    #[arg(long, default_value = "1")]
    retries: u32,

    /// Path to the tsdb launcher
    #[arg(long, default_value = DEFAULT_TSD_PATH)]
    tsd_path: PathBuf,

    /// Path to the TSD configuration file
    #[arg(long, default_value = DEFAULT_CFG_PATH)]
    cfg_path: PathBuf,

    /// Progress file listing metrics already repaired
    #[arg(long, default_value = DEFAULT_STORE_PATH)]
    store_path: PathBuf,

    /// Run every tsdb command through `sudo -u <sudo-user>`
    #[arg(long)]
    use_sudo: bool,

    /// User to switch to with --use-sudo
    #[arg(long, default_value = DEFAULT_SUDO_USER)]
    sudo_user: String,

    /// Aggregator keyword passed to fsck
    #[arg(long, default_value = DEFAULT_AGGREGATOR)]
    aggregator: String,

    /// Write the sweep summary as JSON to this path
    #[arg(long)]
    report: Option<PathBuf>,
}

impl Cli {
    fn sweep_config(&self) -> SweepConfig {
        SweepConfig {
            time_range_hours: self.time_range,
            chunk_minutes: self.time_chunk,
            retries: self.retries,
            tsd_path: self.tsd_path.clone(),
            cfg_path: self.cfg_path.clone(),
            store_path: self.store_path.clone(),
            use_sudo: self.use_sudo,
            sudo_user: self.sudo_user.clone(),
            aggregator: self.aggregator.clone(),
            attempt_timeout: None,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    commands::init_logging(cli.debug);

    let config = cli.sweep_config();
    let code = commands::sweep::run(&config, cli.report.as_deref());
    std::process::exit(code);
}
