use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// Tasks, projects and clients from the terminal.
/// Without --data every run starts from the built-in sample data.
#[derive(Parser)]
#[command(name = "taskflow", version, about = "Task, project and client manager")]
pub struct Cli {
    /// JSON data file. Created on the first change; a missing file starts from the sample data.
    #[arg(long, global = true, env = "TASKFLOW_DATA")]
    pub data: Option<PathBuf>,

    /// Simulate backend round trips (200 ms reads, 300 ms writes).
    #[arg(long, global = true, env = "TASKFLOW_LATENCY")]
    pub latency: bool,

    /// Write JSON logs to a daily file in this directory instead of stderr.
    #[arg(long, global = true, env = "TASKFLOW_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}
