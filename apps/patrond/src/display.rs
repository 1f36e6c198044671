//! Output rendering

use patron_ops::{BatchReport, ProcessOutcome};
use patron_state::LedgerEntry;
use serde::Serialize;
use std::io::{self, Write};

/// Result of a command, ready to render
#[derive(Debug, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum CommandOutput {
    Batch(BatchReport),
    Donation(ProcessOutcome),
    Ledger(Vec<LedgerEntry>),
    Message(String),
}

/// Renders command output as text or JSON
pub struct OutputRenderer {
    json: bool,
}

impl OutputRenderer {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    pub fn render(&self, output: &CommandOutput) -> io::Result<()> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        if self.json {
            serde_json::to_writer_pretty(&mut out, output)?;
            return writeln!(out);
        }

        match output {
            CommandOutput::Batch(report) => {
                for result in &report.results {
                    if result.success {
                        writeln!(out, "{}: ok", result.message_id)?;
                    } else {
                        writeln!(
                            out,
                            "{}: failed ({}){}",
                            result.message_id,
                            result.error.as_deref().unwrap_or("unknown error"),
                            if result.retryable { " [retryable]" } else { "" }
                        )?;
                    }
                }
            }
            CommandOutput::Donation(outcome) => {
                writeln!(
                    out,
                    "organization {}: {} of {} millicents distributed",
                    outcome.organization_id,
                    outcome.report.distributed(),
                    outcome.donation
                )?;
                for group in &outcome.report.groups {
                    match &group.skipped {
                        None if group.withheld > 0.0 => writeln!(
                            out,
                            "  {}/{}: {} millicents across {} packages ({:.0} below epsilon)",
                            group.language,
                            group.registry,
                            group.allocated,
                            group.packages,
                            group.withheld
                        )?,
                        None => writeln!(
                            out,
                            "  {}/{}: {} millicents across {} packages",
                            group.language, group.registry, group.allocated, group.packages
                        )?,
                        Some(reason) => writeln!(
                            out,
                            "  {}/{}: skipped ({reason})",
                            group.language, group.registry
                        )?,
                    }
                }
            }
            CommandOutput::Ledger(entries) => {
                if entries.is_empty() {
                    writeln!(out, "No ledger entries")?;
                }
                for entry in entries {
                    writeln!(
                        out,
                        "{}\t{}/{}\t{}\t{:.3}",
                        entry.timestamp,
                        entry.language.as_deref().unwrap_or("-"),
                        entry.registry.as_deref().unwrap_or("-"),
                        entry.package_name.as_deref().unwrap_or(&entry.package_id),
                        entry.amount
                    )?;
                }
            }
            CommandOutput::Message(message) => writeln!(out, "{message}")?,
        }
        Ok(())
    }
}
