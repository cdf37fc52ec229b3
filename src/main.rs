use std::path::Path;
use std::sync::OnceLock;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use taskflow::backend::MemoryBackend;
use taskflow::cli::Cli;
use taskflow::cmd::{self, Commands};
use taskflow::config::Config;
use taskflow::fixtures::Fixtures;
use taskflow::notice::{NoticeLevel, Notices};

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Park the file writer's guard for the life of the process. A second guard
/// would be dropped on the spot and stop its writer, so it is an error.
fn keep_guard(slot: &OnceLock<WorkerGuard>, guard: WorkerGuard) -> Result<()> {
    slot.set(guard)
        .map_err(|_| anyhow::anyhow!("log file writer is already initialised"))
}

fn init_tracing(log_dir: Option<&Path>) -> Result<()> {
    let installed = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating log directory {}", dir.display()))?;
            let file_appender = tracing_appender::rolling::daily(dir, "taskflow.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            keep_guard(&LOG_GUARD, guard)?;
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .json()
                .with_writer(non_blocking)
                .try_init()
        }
        None => tracing_subscriber::fmt()
            .with_env_filter(env_filter())
            .with_writer(std::io::stderr)
            .try_init(),
    };
    installed.map_err(|e| anyhow::anyhow!("installing log subscriber: {e}"))
}

/// Print pending notices. Returns whether any of them was an error.
fn flush_notices(notices: &Notices) -> bool {
    let mut failed = false;
    for notice in notices.drain() {
        match notice.level {
            NoticeLevel::Success => println!("{notice}"),
            NoticeLevel::Error => {
                failed = true;
                eprintln!("{notice}");
            }
        }
    }
    failed
}

async fn run(cli: Cli) -> Result<bool> {
    let config = Config::from(&cli);
    init_tracing(config.log_dir.as_deref())?;

    if let Commands::Completions { shell } = cli.command {
        cmd::cmd_completions(shell);
        return Ok(true);
    }

    let fixtures = match &config.data {
        Some(path) => Fixtures::load(path)?,
        None => Fixtures::builtin()?,
    };
    let backend = MemoryBackend::from_fixtures(fixtures, config.latency);
    let services = backend.services(Notices::default());

    let mutates = cli.command.mutates();
    let outcome = cmd::run(cli.command, &services).await;
    let failed = flush_notices(&services.notices);
    outcome?;

    if let (true, Some(path)) = (mutates, &config.data) {
        backend.snapshot().await.save(path)?;
    }
    Ok(!failed)
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "command failed");
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_log_guard_is_refused() {
        let slot = OnceLock::new();
        let (_writer, first) = tracing_appender::non_blocking(std::io::sink());
        keep_guard(&slot, first).unwrap();
        let (_writer, second) = tracing_appender::non_blocking(std::io::sink());
        let err = keep_guard(&slot, second).unwrap_err();
        assert_eq!(err.to_string(), "log file writer is already initialised");
        assert!(slot.get().is_some());
    }

    #[test]
    fn error_notices_fail_the_run() {
        let notices = Notices::default();
        notices.success("Task created!");
        assert!(!flush_notices(&notices));
        notices.error("Failed to load task");
        assert!(flush_notices(&notices));
        assert!(notices.is_empty());
    }
}
