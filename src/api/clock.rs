//! Host clock control for the test-harness time server.

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ClockError {
    #[error("failed to run {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} exited with {status}")]
    Failed { command: String, status: String },
}

/// Something able to change the system clock.
#[async_trait]
pub trait ClockSetter: Send + Sync {
    /// Stop automatic time synchronisation so a manually set time sticks.
    async fn disable_ntp(&self) -> Result<(), ClockError>;

    /// Set wall-clock time. `timestamp` is `YYYY-MM-DD HH:MM:SS` in local time.
    async fn set_time(&self, timestamp: &str) -> Result<(), ClockError>;
}

/// [`ClockSetter`] backed by systemd's `timedatectl`.
#[derive(Debug, Clone, Default)]
pub struct Timedatectl;

impl Timedatectl {
    async fn run(&self, args: &[&str]) -> Result<(), ClockError> {
        let command = format!("timedatectl {}", args.join(" "));
        debug!(%command, "Running clock command");
        let status = Command::new("timedatectl")
            .args(args)
            .status()
            .await
            .map_err(|source| ClockError::Spawn { command: command.clone(), source })?;
        if status.success() {
            Ok(())
        } else {
            warn!(%command, %status, "Clock command failed");
            Err(ClockError::Failed { command, status: status.to_string() })
        }
    }
}

#[async_trait]
impl ClockSetter for Timedatectl {
    async fn disable_ntp(&self) -> Result<(), ClockError> {
        self.run(&["set-ntp", "false"]).await
    }

    async fn set_time(&self, timestamp: &str) -> Result<(), ClockError> {
        self.run(&["set-time", timestamp]).await
    }
}
