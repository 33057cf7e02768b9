use async_trait::async_trait;
use ethers::types::{Address, TxHash, U256};
use std::fmt;

use crate::blockchain::contract::ContractArtifact;
use crate::core::errors::LedgerError;

/// Handle to a submitted state-changing transaction that may not be mined yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PendingAction {
    tx_hash: TxHash,
}

impl PendingAction {
    pub fn new(tx_hash: TxHash) -> Self {
        Self { tx_hash }
    }

    pub fn tx_hash(&self) -> TxHash {
        self.tx_hash
    }
}

impl fmt::Display for PendingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.tx_hash.as_bytes()))
    }
}

/// What the ledger currently knows about a pending action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InclusionStatus {
    /// Not mined yet (or not visible to this node).
    Unknown,
    /// Mined in a block; `success` is false when the transaction reverted.
    Included { success: bool },
}

/// Read-only view of transaction inclusion. Calling it any number of times
/// has no effect on the ledger.
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Look up whether a pending action made it into a block.
    async fn status(&self, action: &PendingAction) -> Result<InclusionStatus, LedgerError>;
}

/// The ledger operations a health check needs.
///
/// Any backend with this shape works: the ethers-backed [`EthereumLedger`]
/// for real networks, or the scriptable [`InMemoryLedger`] in tests.
///
/// [`EthereumLedger`]: crate::blockchain::ethereum::EthereumLedger
/// [`InMemoryLedger`]: crate::blockchain::mock::InMemoryLedger
#[async_trait]
pub trait LedgerClient: StatusSource {
    /// Submit a contract-creation transaction. Returns the address the
    /// contract will live at together with the creation transaction.
    async fn deploy(
        &self,
        artifact: &ContractArtifact,
    ) -> Result<(Address, PendingAction), LedgerError>;

    /// Submit a transaction invoking a nullary, state-changing method.
    async fn call(&self, address: Address, method: &str) -> Result<PendingAction, LedgerError>;

    /// Read a nullary view method returning a uint256.
    async fn read(&self, address: Address, method: &str) -> Result<U256, LedgerError>;
}
