// src/main.rs
//! Blockchain health check entry point.
//!
//! Exit status: 0 healthy, 1 check failed, 2 setup failed.
use anyhow::Result;
use chain_healthcheck::blockchain::EthereumLedger;
use chain_healthcheck::cli::Cli;
use chain_healthcheck::core::config::HealthCheckConfig;
use chain_healthcheck::core::errors::{HealthCheckError, EXIT_SETUP_FAILED};
use chain_healthcheck::ops::health::{exit_code, HealthCheckWorkflow, HealthReport, Target};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse_args();

    // stdout is reserved for the deployed address
    if let Err(e) = init_logging() {
        eprintln!("Failed to initialise logging: {}", e);
        return ExitCode::from(EXIT_SETUP_FAILED);
    }

    let config = match cli.resolve() {
        Ok(config) => config,
        Err(e) => return report_failure(&e),
    };

    let result = run(config).await;
    match &result {
        Ok(report) => info!(
            address = ?report.address,
            deployed = report.deployed,
            baseline = %report.baseline,
            current = %report.current,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Health check passed"
        ),
        Err(e) => {
            report_failure(e);
        }
    }
    ExitCode::from(exit_code(&result))
}

async fn run(config: HealthCheckConfig) -> Result<HealthReport, HealthCheckError> {
    let ledger = EthereumLedger::connect(&config.url, &config.private_key).await?;

    let target = Target::from_checker(config.checker.as_deref());
    let workflow = HealthCheckWorkflow::new(Arc::new(ledger), config.wait);
    let mut stdout = std::io::stdout();
    workflow.run(&target, &mut stdout).await
}

fn report_failure(e: &HealthCheckError) -> ExitCode {
    eprintln!("{}", e);
    ExitCode::from(e.exit_code())
}

fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
