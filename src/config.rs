//! Runtime settings resolved from flags and environment.

use std::path::PathBuf;

use crate::cli::Cli;
use crate::store::Latency;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Data file read at start and written after changes. `None` keeps everything in memory.
    pub data: Option<PathBuf>,
    pub latency: Latency,
    pub log_dir: Option<PathBuf>,
}

impl From<&Cli> for Config {
    fn from(cli: &Cli) -> Self {
        Config {
            data: cli.data.clone(),
            latency: if cli.latency { Latency::SIMULATED } else { Latency::NONE },
            log_dir: cli.log_dir.clone(),
        }
    }
}
