pub mod config;
pub mod errors;

pub use config::{HealthCheckConfig, PartialConfig};
pub use errors::{ErrorKind, HealthCheckError, LedgerError};
