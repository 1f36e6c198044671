//! patrond - donation attribution worker
//!
//! Reads donation events, crawls the donating organization's manifests and
//! splits the donation across its dependency graph in the ledger.

mod cli;
mod display;
mod error;
mod logging;
mod resolver;
mod setup;

use crate::cli::{Cli, Commands};
use crate::display::{CommandOutput, OutputRenderer};
use crate::error::CliError;
use crate::logging::log_event_with_tracing;
use crate::setup::SystemSetup;
use clap::Parser;
use patron_config::Config;
use patron_events::EventReceiver;
use patron_ops::{process_batch, QueueBatch};
use patron_state::DistributedLock;
use std::future::Future;
use std::path::Path;
use std::process;
use tokio::io::AsyncReadExt;
use tokio::select;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json_mode = cli.global.json;

    init_tracing(json_mode, cli.global.debug);

    if let Err(e) = run(cli).await {
        error!("Application error: {}", e);
        if !json_mode {
            eprintln!("Error: {e}");
        }
        process::exit(1);
    }
}

/// Main application logic
async fn run(cli: Cli) -> Result<(), CliError> {
    info!("Starting patrond v{}", env!("CARGO_PKG_VERSION"));

    // defaults < file < environment < flags
    let mut config = Config::load_or_default(cli.global.config.as_deref()).await?;
    config.merge_env()?;
    if let Some(database) = &cli.global.database {
        config.general.database_path = Some(database.clone());
    }
    config.validate()?;

    let setup = SystemSetup::initialize(config).await?;
    let renderer = OutputRenderer::new(cli.global.json);

    let (output, failed) = execute_command(cli.command, &setup).await?;
    renderer.render(&output)?;

    if let Some((failed, total)) = failed {
        return Err(CliError::BatchFailed { failed, total });
    }

    info!("Command completed successfully");
    Ok(())
}

/// Execute the specified command. The second element carries
/// `(failed, total)` when a batch had failing records.
async fn execute_command(
    command: Commands,
    setup: &SystemSetup,
) -> Result<(CommandOutput, Option<(usize, usize)>), CliError> {
    match command {
        Commands::Process { file } => {
            let batch: QueueBatch = serde_json::from_str(&read_input(&file).await?)
                .map_err(|e| CliError::InvalidArguments(format!("invalid batch file: {e}")))?;

            let (tx, rx) = patron_events::channel();
            let processor = setup.processor(tx)?;
            let report = with_events(rx, process_batch(&processor, &batch.records)).await;

            let failed = report.failures().count();
            let summary = (failed > 0).then_some((failed, report.results.len()));
            Ok((CommandOutput::Batch(report), summary))
        }
        Commands::Donate { file } => {
            let body = read_input(&file).await?;

            let (tx, rx) = patron_events::channel();
            let processor = setup.processor(tx)?;
            let outcome = with_events(rx, processor.process(&body)).await?;
            Ok((CommandOutput::Donation(outcome), None))
        }
        Commands::Migrate => Ok((
            CommandOutput::Message("Database is up to date".to_string()),
            None,
        )),
        Commands::Unlock { organization_id } => {
            setup.lock().release(&organization_id).await?;
            Ok((
                CommandOutput::Message(format!("Released lock for {organization_id}")),
                None,
            ))
        }
        Commands::Ledger { organization_id } => {
            let entries = setup.store().ledger_for_org(&organization_id).await?;
            Ok((CommandOutput::Ledger(entries), None))
        }
    }
}

/// Drive `operation` while forwarding its events to tracing
async fn with_events<T>(mut events: EventReceiver, operation: impl Future<Output = T>) -> T {
    let mut operation = Box::pin(operation);

    loop {
        select! {
            result = &mut operation => {
                while let Ok(event) = events.try_recv() {
                    log_event_with_tracing(&event);
                }
                return result;
            }

            event = events.recv() => {
                match event {
                    Some(event) => log_event_with_tracing(&event),
                    None => { /* Channel closed: keep waiting for the operation */ }
                }
            }
        }
    }
}

/// Read a file, or stdin for `-`
async fn read_input(path: &Path) -> Result<String, CliError> {
    if path == Path::new("-") {
        let mut buffer = String::new();
        tokio::io::stdin().read_to_string(&mut buffer).await?;
        Ok(buffer)
    } else {
        Ok(tokio::fs::read_to_string(path).await?)
    }
}

fn init_tracing(json_mode: bool, debug_enabled_flag: bool) {
    let default_filter = if debug_enabled_flag {
        "info,patrond=debug,patron_ops=debug"
    } else {
        "info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    // logs go to stderr so stdout stays clean for rendered output
    if json_mode {
        tracing_subscriber::fmt()
            .json()
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }
}
