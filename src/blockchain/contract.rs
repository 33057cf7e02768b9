// Binding and build artifact for the HealthCheck counter contract.
//
// pragma solidity 0.8.1;
// contract HealthCheck {
//     uint256 public counter;
//     function tick() external { counter += 1; }
// }

use ethers::contract::abigen;
use ethers::types::Bytes;

use crate::core::errors::LedgerError;

abigen!(
    HealthCheck,
    r#"[
        function counter() external view returns (uint256)
        function tick() external
    ]"#
);

/// View method returning the current tick count.
pub const COUNTER_METHOD: &str = "counter";
/// Mutating method incrementing the tick count by one.
pub const TICK_METHOD: &str = "tick";

const HEALTHCHECK_BYTECODE: &str = "0x608060405234801561001057600080fd5b5060d88061001f6000396000f3fe6080604052348015600f57600080fd5b506004361060325760003560e01c80633eaf5d9f14603757806361bc221a14603f575b600080fd5b603d6059565b005b60456070565b604051605091906076565b60405180910390f35b600160008082825460699190607f565b9091555050565b60005481565b90815260200190565b60008219821115609d57634e487b7160e01b81526011600452602481fd5b50019056fea2646970667358221220f2ed07d7279679de063673be01cd2caf33a4ba87c8578fbf07de8d21f85c89b964736f6c63430008010033";

/// Everything needed to create a contract on chain.
#[derive(Debug, Clone, Copy)]
pub struct ContractArtifact {
    pub name: &'static str,
    bytecode_hex: &'static str,
}

impl ContractArtifact {
    /// Creation bytecode. The HealthCheck constructor takes no arguments, so
    /// this is the complete calldata of the deployment transaction.
    pub fn bytecode(&self) -> Result<Bytes, LedgerError> {
        let raw = self.bytecode_hex.strip_prefix("0x").unwrap_or(self.bytecode_hex);
        hex::decode(raw).map(Bytes::from).map_err(|e| {
            LedgerError::Contract(format!("invalid bytecode for {}: {}", self.name, e))
        })
    }
}

/// The counter contract every health check deploys or binds to.
pub const HEALTHCHECK: ContractArtifact = ContractArtifact {
    name: "HealthCheck",
    bytecode_hex: HEALTHCHECK_BYTECODE,
};
