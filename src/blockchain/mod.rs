pub mod contract;
pub mod ethereum;
pub mod mock;
pub mod traits;

pub use contract::{ContractArtifact, HEALTHCHECK};
pub use ethereum::EthereumLedger;
pub use mock::InMemoryLedger;
pub use traits::{InclusionStatus, LedgerClient, PendingAction, StatusSource};
