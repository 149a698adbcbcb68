//! compose-autoupdate entry point.

use std::io;

use clap::Parser;
use log::{info, warn};

mod cleanup;
mod cli;
mod compose;
mod config;
mod digest;
mod error;
mod orchestrator;
mod process;
mod runtime;
mod types;

use cli::Cli;
use compose::ComposeUpdater;
use config::Config;
use orchestrator::Orchestrator;
use process::SystemCommandRunner;
use runtime::DockerRuntime;
use types::UpdateResult;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut cfg = Config::load(cli.config.as_deref())?;
    cli.apply_overrides(&mut cfg);

    // Initialize logging
    let level = cfg.log_level.as_deref().unwrap_or("info");
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_target(false)
        .init();
    info!("Starting with config: {:?}", cfg);

    if cli.needs_confirmation() {
        let prompt = "Warning: --force without --update will update ALL Docker Compose \
                      containers regardless of label. Continue?";
        if !cli::confirm(prompt, &mut io::stdin().lock(), &mut io::stdout())? {
            println!("Operation cancelled");
            return Ok(());
        }
    }

    // Container Runtime (Docker)
    let runtime = DockerRuntime::connect(cfg.docker_host.as_deref())?;
    let compose = ComposeUpdater::new(SystemCommandRunner, cfg.docker_bin.clone());
    let orchestrator = Orchestrator::new(runtime, compose);

    let updated = orchestrator
        .run(&cfg.label, cli.update.as_deref(), cli.force)
        .await;

    if cli.cleanup {
        let report =
            cleanup::after_pass(orchestrator.runtime(), cli.update.as_deref(), &updated).await;
        if let Some(report) = report.filter(|r| !r.errors.is_empty()) {
            warn!(
                "Cleanup: {} removed, {} already gone, {} failed",
                report.removed.len(),
                report.already_gone.len(),
                report.errors.len()
            );
        }
    }

    print_summary(&updated);
    Ok(())
}

fn print_summary(updated: &[UpdateResult]) {
    println!("\n{}", "=".repeat(50));
    if updated.is_empty() {
        println!("No containers updated");
        return;
    }
    println!("Summary: {} containers updated successfully", updated.len());
    for result in updated {
        println!("  ✓ {}", result.container_name);
    }
}
