//! # Zabbix History Export CLI
//!
//! Exports numeric item history for one period into per-host CSV tables and
//! archives the run directory.
//!
//! Exit status is non-zero only for run-fatal errors (configuration, host
//! listing, output directory, archive). Individual host and metric failures
//! are logged and do not change it.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

use zabbix_export::client::ZabbixClientFactory;
use zabbix_export::config::ExporterConfig;
use zabbix_export::logging::init_logging;
use zabbix_export::runner::{ExportRunner, RunRequest};
use zabbix_export::window::PeriodKind;

#[derive(Parser, Debug)]
#[command(name = "zabbix-history-export")]
#[command(about = "Export Zabbix numeric history to per-host CSV tables")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Host to export (display name); all hosts when omitted
    #[arg(short = 'H', long)]
    host: Option<String>,

    /// Period: td (today), ld (yesterday), tm (this month), lm (last month)
    #[arg(short = 't', long, default_value = "td")]
    period: PeriodKind,

    /// Item to export (display name); all numeric items when omitted
    #[arg(short, long)]
    item: Option<String>,

    /// Configuration file path (default: ./zabbix-export.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Leave the run directory in place instead of zipping it
    #[arg(long)]
    no_archive: bool,
}

fn load_config(cli: &Cli) -> anyhow::Result<ExporterConfig> {
    let mut config = ExporterConfig::load_from(cli.config.as_deref()).with_context(|| {
        match &cli.config {
            Some(path) => format!("loading configuration from {}", path.display()),
            None => "loading configuration".to_string(),
        }
    })?;
    if cli.no_archive {
        config.archive.enabled = false;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("zabbix-history-export: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(&config.logging) {
        eprintln!("zabbix-history-export: {e}");
        return ExitCode::FAILURE;
    }

    info!(
        endpoint = %config.server.endpoint(),
        period = %cli.period,
        workers = config.export.worker_count,
        "Program started"
    );

    let factory = ZabbixClientFactory::new(config.server.clone());
    let runner = match ExportRunner::new(config, factory) {
        Ok(runner) => runner,
        Err(e) => {
            error!(error_code = e.code(), error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    let request = RunRequest {
        period: cli.period,
        host: cli.host,
        item: cli.item,
    };

    match runner.run(&request).await {
        Ok(report) => {
            info!(
                run_id = %report.run_id,
                window = %report.window.label(),
                succeeded = report.summary.succeeded(),
                failed = report.summary.failed(),
                archive = ?report.archive,
                "Program finished"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error_code = e.code(), error = %e, "Export run aborted");
            ExitCode::FAILURE
        }
    }
}
