//! src/ops/health.rs
//!
//! End-to-end network health check.
//!
//! A run resolves the HealthCheck contract (deploying one when no address is
//! configured), reads its counter, sends a `tick()`, waits for the receipt and
//! reads the counter again. The network is healthy iff the counter advanced.

use ethers::types::{Address, U256};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::blockchain::contract::{COUNTER_METHOD, HEALTHCHECK, TICK_METHOD};
use crate::blockchain::traits::{LedgerClient, PendingAction};
use crate::core::errors::{HealthCheckError, EXIT_HEALTHY};
use crate::ops::confirmation::{ConfirmationPoller, ConfirmationResult, PollSettings};

/// Which contract a run exercises.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Deploy a fresh HealthCheck contract.
    Deploy,
    /// Bind to an already deployed contract at this address.
    Existing(String),
}

impl Target {
    /// An absent or blank checker address means "deploy".
    pub fn from_checker(checker: Option<&str>) -> Self {
        match checker.map(str::trim) {
            Some(address) if !address.is_empty() => Target::Existing(address.to_string()),
            _ => Target::Deploy,
        }
    }
}

/// Summary of a healthy run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthReport {
    pub address: Address,
    pub deployed: bool,
    pub baseline: U256,
    pub current: U256,
    pub elapsed: Duration,
}

pub struct HealthCheckWorkflow<L: ?Sized> {
    ledger: Arc<L>,
    poller: ConfirmationPoller<L>,
    wait: Duration,
}

impl<L> HealthCheckWorkflow<L>
where
    L: LedgerClient + ?Sized + 'static,
{
    /// `wait` bounds each confirmation (deployment and tick) separately.
    pub fn new(ledger: Arc<L>, wait: Duration) -> Self {
        let poller = ConfirmationPoller::new(Arc::clone(&ledger));
        Self { ledger, poller, wait }
    }

    pub fn with_poll_settings(mut self, settings: PollSettings) -> Self {
        self.poller = self.poller.with_settings(settings);
        self
    }

    /// Run the check once. When a contract gets deployed its address is
    /// written to `out` as soon as the deployment is submitted.
    pub async fn run<W: Write>(
        &self,
        target: &Target,
        out: &mut W,
    ) -> Result<HealthReport, HealthCheckError> {
        let started = Instant::now();
        let (address, deployed) = self.resolve_target(target, out).await?;
        let shown = checksum(&address);

        // From here on the network and the contract are known to be reachable.
        let baseline = self
            .ledger
            .read(address, COUNTER_METHOD)
            .await
            .map_err(|source| HealthCheckError::BaselineRead { address: shown.clone(), source })?;
        info!(address = %shown, %baseline, "Read beginning tick counter");

        let tick = self
            .ledger
            .call(address, TICK_METHOD)
            .await
            .map_err(|source| HealthCheckError::Submit { address: shown.clone(), source })?;
        info!(address = %shown, tx_hash = %tick, "Tick submitted");

        match self.confirm(tick).await? {
            ConfirmationResult::Confirmed => {}
            ConfirmationResult::TimedOut => {
                return Err(HealthCheckError::ConfirmTimeout { address: shown })
            }
            ConfirmationResult::Failed => {
                return Err(HealthCheckError::ConfirmReverted { address: shown })
            }
        }

        let current = self
            .ledger
            .read(address, COUNTER_METHOD)
            .await
            .map_err(|source| HealthCheckError::PostRead { address: shown.clone(), source })?;

        if current > baseline {
            let report = HealthReport { address, deployed, baseline, current, elapsed: started.elapsed() };
            info!(address = %shown, %baseline, %current, elapsed = ?report.elapsed, "Network healthy");
            Ok(report)
        } else {
            warn!(address = %shown, %baseline, %current, "Tick counter did not advance");
            Err(HealthCheckError::NotAdvanced { address: shown })
        }
    }

    async fn resolve_target<W: Write>(
        &self,
        target: &Target,
        out: &mut W,
    ) -> Result<(Address, bool), HealthCheckError> {
        match target {
            Target::Deploy => {
                let (address, deployment) =
                    self.ledger.deploy(&HEALTHCHECK).await.map_err(HealthCheckError::Deploy)?;
                let shown = checksum(&address);
                if let Err(e) = writeln!(out, "{}", shown).and_then(|_| out.flush()) {
                    warn!(error = %e, "Failed to write deployed address");
                }

                // the background wait is still part of setup
                let confirmed = self.confirm(deployment).await.map_err(|e| match e {
                    HealthCheckError::Task(reason) => {
                        HealthCheckError::DeployTask { address: shown.clone(), reason }
                    }
                    other => other,
                })?;
                match confirmed {
                    ConfirmationResult::Confirmed => {
                        info!(address = %shown, "HealthCheck contract deployed");
                        Ok((address, true))
                    }
                    ConfirmationResult::TimedOut => {
                        Err(HealthCheckError::DeployTimeout { address: shown })
                    }
                    ConfirmationResult::Failed => {
                        Err(HealthCheckError::DeployReverted { address: shown })
                    }
                }
            }
            Target::Existing(raw) => {
                let address = parse_address(raw).map_err(|reason| HealthCheckError::Bind {
                    address: raw.clone(),
                    reason,
                })?;
                // Touch the contract so a wrong address fails as a setup error.
                self.ledger.read(address, COUNTER_METHOD).await.map_err(|source| {
                    HealthCheckError::Touch { address: checksum(&address), source }
                })?;
                Ok((address, false))
            }
        }
    }

    /// Poll on a background task and join on it.
    async fn confirm(&self, action: PendingAction) -> Result<ConfirmationResult, HealthCheckError> {
        self.poller.spawn(action, self.wait).wait().await
    }
}

/// Exit code of a finished run.
pub fn exit_code(result: &Result<HealthReport, HealthCheckError>) -> u8 {
    match result {
        Ok(_) => EXIT_HEALTHY,
        Err(e) => e.exit_code(),
    }
}

/// Parse a 20-byte hex address, with or without the `0x` prefix.
pub fn parse_address(raw: &str) -> Result<Address, String> {
    let trimmed = raw.trim();
    let hex_part =
        trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")).unwrap_or(trimmed);
    if hex_part.len() != 40 {
        return Err(format!("expected 40 hex characters, got {}", hex_part.len()));
    }
    let bytes = hex::decode(hex_part).map_err(|e| format!("invalid hex: {}", e))?;
    Ok(Address::from_slice(&bytes))
}

fn checksum(address: &Address) -> String {
    ethers::utils::to_checksum(address, None)
}
