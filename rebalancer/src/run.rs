//! Run orchestrator: load → validate → summarize → rebalance → render.
//!
//! This is the main workflow that ties together all components. Every
//! command writes its report to the given writer, so the binary passes
//! stdout and tests pass a buffer.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use log::{info, warn};
use nanofolio::{Portfolio, Rebalance};

use crate::audit::{self, AuditLog};
use crate::config::{Config, OutputFormat};
use crate::error::{Error, Result};
use crate::report::{self, CheckReport, RebalanceTable, SummaryTable};

/// What a run should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Load and validate both inputs
    Check,
    /// Print holdings joined with targets
    Summary,
    /// Compute and render a rebalance, to `output` when given
    Rebalance { output: Option<PathBuf> },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Check => "check",
            Command::Summary => "summary",
            Command::Rebalance { .. } => "rebalance",
        }
    }
}

/// Execute one command, recording it in the audit trail.
///
/// A failing command is logged as `run_failed` before the error is returned.
/// If that audit write fails too, the command's own error still wins.
pub fn execute<W: Write>(config: &Config, command: &Command, out: &mut W) -> Result<()> {
    let mut audit = AuditLog::from_config(config)?;
    audit::log_run_started(&mut audit, command.name(), config)?;
    run_audited(config, command, &mut audit, out)
}

fn run_audited<W: Write>(
    config: &Config,
    command: &Command,
    audit: &mut AuditLog,
    out: &mut W,
) -> Result<()> {
    let result = dispatch(config, command, audit, out);
    if let Err(e) = &result {
        if let Err(audit_err) = audit::log_run_failed(audit, command.name(), e) {
            warn!("failed to record run_failed in the audit trail: {audit_err}");
        }
    }
    result
}

fn dispatch<W: Write>(
    config: &Config,
    command: &Command,
    audit: &mut AuditLog,
    out: &mut W,
) -> Result<()> {
    let portfolio = load_portfolio(config, audit)?;
    match command {
        Command::Check => check(&portfolio, out),
        Command::Summary => summary(&portfolio, out),
        Command::Rebalance { output } => {
            let rebalance = compute(config, &portfolio, audit)?;
            match output {
                Some(path) => {
                    let file = File::create(path).map_err(|e| Error::Output {
                        path: path.clone(),
                        source: e,
                    })?;
                    let mut writer = BufWriter::new(file);
                    render(config, &rebalance, portfolio.currency(), &mut writer)?;
                    writer.flush().map_err(|e| Error::Output {
                        path: path.clone(),
                        source: e,
                    })?;
                    info!("rebalance written to {}", path.display());
                    Ok(())
                }
                None => render(config, &rebalance, portfolio.currency(), out),
            }
        }
    }
}

/// Load both inputs with the configured adapter and delimiter.
pub fn load_portfolio(config: &Config, audit: &mut AuditLog) -> Result<Portfolio> {
    let portfolio = Portfolio::load(
        config.input.adapter.adapter(),
        &config.loader()?,
        &config.input.assets,
        &config.input.allocation,
        config.currency(),
    )?;
    audit::log_portfolio_loaded(audit, &portfolio)?;
    Ok(portfolio)
}

fn check<W: Write>(portfolio: &Portfolio, out: &mut W) -> Result<()> {
    let total_value = portfolio.total_value()?;
    if total_value == 0.0 {
        warn!("portfolio has no value; summary and rebalance will fail");
    }
    write!(
        out,
        "{}",
        CheckReport {
            portfolio,
            total_value,
        }
    )?;
    Ok(())
}

fn summary<W: Write>(portfolio: &Portfolio, out: &mut W) -> Result<()> {
    let summary = portfolio.summary()?;
    write!(
        out,
        "{}",
        SummaryTable {
            summary: &summary,
            currency: portfolio.currency(),
        }
    )?;
    Ok(())
}

fn compute(config: &Config, portfolio: &Portfolio, audit: &mut AuditLog) -> Result<Rebalance> {
    let rebalance = portfolio.rebalance(config.output.strategy)?;
    audit::log_rebalance_computed(audit, &rebalance)?;
    Ok(rebalance)
}

fn render<W: Write>(config: &Config, rebalance: &Rebalance, currency: &str, out: &mut W) -> Result<()> {
    match config.output.format {
        OutputFormat::Table => {
            write!(out, "{}", RebalanceTable { rebalance, currency })?;
            Ok(())
        }
        OutputFormat::Csv => report::write_csv(rebalance, out),
        OutputFormat::Json => report::write_json(rebalance, currency, out),
    }
}
