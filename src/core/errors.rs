//! Error taxonomy for a health-check run.
//!
//! Every fatal condition of the workflow has its own variant so the message
//! printed on stderr says exactly which step broke. Variants are grouped into
//! two kinds: setup failures (the environment is broken, exit code 2) and
//! check failures (the check ran but the network did not behave, exit code 1).
use thiserror::Error;

/// Exit code for a run where every step passed.
pub const EXIT_HEALTHY: u8 = 0;
/// Exit code for failures after the target contract was resolved.
pub const EXIT_CHECK_FAILED: u8 = 1;
/// Exit code for failures while connecting, loading credentials or resolving the contract.
pub const EXIT_SETUP_FAILED: u8 = 2;

/// Which phase of the run produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Setup,
    Check,
}

/// Errors surfaced by the ledger seam.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Contract error: {0}")]
    Contract(String),

    #[error("Signer error: {0}")]
    Signer(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Ledger unavailable: {0}")]
    Unavailable(String),
}

/// A fatal condition of a health-check run.
#[derive(Debug, Error)]
pub enum HealthCheckError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unable to connect to network {url}: {reason}")]
    Connection { url: String, reason: String },

    #[error("Unable to get public key from private key: {0}")]
    Credential(String),

    #[error("Unable to deploy HealthCheck contract: {0}")]
    Deploy(#[source] LedgerError),

    #[error("Timeout waiting to deploy HealthCheck contract at address {address}")]
    DeployTimeout { address: String },

    #[error("Deployment of HealthCheck contract at address {address} was reverted")]
    DeployReverted { address: String },

    #[error("Awaiting deployment of HealthCheck contract at address {address} failed: {reason}")]
    DeployTask { address: String, reason: String },

    #[error("Unable to bind to HealthCheck contract at address {address}: {reason}")]
    Bind { address: String, reason: String },

    #[error("Error touching HealthCheck at address {address}: {source}")]
    Touch {
        address: String,
        #[source]
        source: LedgerError,
    },

    #[error(
        "Error getting HealthCheck beginning tick counter for contract at address {address}: {source}"
    )]
    BaselineRead {
        address: String,
        #[source]
        source: LedgerError,
    },

    #[error("Error creating HealthCheck tick transaction at contract address {address}: {source}")]
    Submit {
        address: String,
        #[source]
        source: LedgerError,
    },

    #[error("Time expired awaiting HealthCheck tick at contract address: {address}")]
    ConfirmTimeout { address: String },

    #[error("HealthCheck tick transaction was reverted at contract address: {address}")]
    ConfirmReverted { address: String },

    #[error(
        "Error getting HealthCheck ending tick counter for contract at address {address}: {source}"
    )]
    PostRead {
        address: String,
        #[source]
        source: LedgerError,
    },

    #[error("HealthCheck tick counter did not advance for contract at address: {address}")]
    NotAdvanced { address: String },

    #[error("Background task failed: {0}")]
    Task(String),
}

impl HealthCheckError {
    /// Phase this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            HealthCheckError::Config(_)
            | HealthCheckError::Connection { .. }
            | HealthCheckError::Credential(_)
            | HealthCheckError::Deploy(_)
            | HealthCheckError::DeployTimeout { .. }
            | HealthCheckError::DeployReverted { .. }
            | HealthCheckError::DeployTask { .. }
            | HealthCheckError::Bind { .. }
            | HealthCheckError::Touch { .. } => ErrorKind::Setup,
            HealthCheckError::BaselineRead { .. }
            | HealthCheckError::Submit { .. }
            | HealthCheckError::ConfirmTimeout { .. }
            | HealthCheckError::ConfirmReverted { .. }
            | HealthCheckError::PostRead { .. }
            | HealthCheckError::NotAdvanced { .. }
            | HealthCheckError::Task(_) => ErrorKind::Check,
        }
    }

    /// True when the confirmation deadline expired without a terminal receipt.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            HealthCheckError::DeployTimeout { .. } | HealthCheckError::ConfirmTimeout { .. }
        )
    }

    /// The process exit code for this error. This is the only place the
    /// taxonomy is mapped to exit codes.
    pub fn exit_code(&self) -> u8 {
        match self.kind() {
            ErrorKind::Setup => EXIT_SETUP_FAILED,
            ErrorKind::Check => EXIT_CHECK_FAILED,
        }
    }
}
