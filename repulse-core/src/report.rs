//! Report generation hand-off
//!
//! After a run the configured program (by default
//! `python3 analytics/generate_graphs.py`) is spawned with inherited stdio.
//! It reads the database file directly; nothing is passed to it.

use crate::config::ReportConfig;
use crate::error::{Error, Result};
use std::process::Command;

/// Run the configured report program and wait for it to exit
pub fn generate(config: &ReportConfig) -> Result<()> {
    if !config.enabled {
        tracing::debug!("Report generation disabled");
        return Ok(());
    }

    tracing::info!(program = %config.program, args = ?config.args, "Generating report");

    let status = Command::new(&config.program)
        .args(&config.args)
        .status()
        .map_err(|e| Error::Report(format!("failed to run {}: {}", config.program, e)))?;

    if !status.success() {
        let code = status
            .code()
            .map(|c| c.to_string())
            .unwrap_or_else(|| "signal".to_string());
        return Err(Error::Report(format!(
            "{} exited with status {}",
            config.program, code
        )));
    }

    tracing::info!(program = %config.program, "Report generated");
    Ok(())
}
