// filepath: src/blockchain/mock.rs
//! Scriptable in-memory ledger.
//!
//! Behaves like a single-contract chain: deployments create counters, `tick`
//! bumps them, `counter` reads them. Status answers and failures are scripted
//! per test, and every call is recorded so tests can assert on what the
//! workflow did and did not attempt.
use async_trait::async_trait;
use ethers::types::{Address, TxHash, U256};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};

use crate::blockchain::contract::{ContractArtifact, COUNTER_METHOD, TICK_METHOD};
use crate::blockchain::traits::{InclusionStatus, LedgerClient, PendingAction, StatusSource};
use crate::core::errors::LedgerError;

/// One scripted answer of `status()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptedStatus {
    Unknown,
    Included(bool),
    /// The query itself fails (node unreachable, rate limited, ...).
    Error,
}

/// A call observed by the ledger, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerCall {
    Deploy(String),
    Call(Address, String),
    Read(Address, String),
    Status(PendingAction),
}

#[derive(Debug)]
struct State {
    counters: HashMap<Address, U256>,
    deployed: u64,
    sent: u64,
    status_script: VecDeque<ScriptedStatus>,
    default_status: ScriptedStatus,
    advance_on_tick: bool,
    failing_reads: HashSet<usize>,
    reads: usize,
    fail_deploy: bool,
    fail_call: bool,
    calls: Vec<LedgerCall>,
}

#[derive(Debug)]
pub struct InMemoryLedger {
    state: Mutex<State>,
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryLedger {
    /// An empty chain where every transaction is mined successfully on the first query.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                counters: HashMap::new(),
                deployed: 0,
                sent: 0,
                status_script: VecDeque::new(),
                default_status: ScriptedStatus::Included(true),
                advance_on_tick: true,
                failing_reads: HashSet::new(),
                reads: 0,
                fail_deploy: false,
                fail_call: false,
                calls: Vec::new(),
            }),
        }
    }

    /// Pre-existing contract at `address` holding `counter`.
    pub fn with_contract(self, address: Address, counter: U256) -> Self {
        self.state.lock().counters.insert(address, counter);
        self
    }

    /// Answers returned by `status()` in order, before falling back to the default.
    pub fn with_status_script(self, script: impl IntoIterator<Item = ScriptedStatus>) -> Self {
        self.state.lock().status_script.extend(script);
        self
    }

    pub fn with_default_status(self, status: ScriptedStatus) -> Self {
        self.state.lock().default_status = status;
        self
    }

    /// `tick` is accepted but the counter never moves.
    pub fn with_frozen_counter(self) -> Self {
        self.state.lock().advance_on_tick = false;
        self
    }

    /// Make the `index`-th `read()` (zero based) fail.
    pub fn with_read_failure(self, index: usize) -> Self {
        self.state.lock().failing_reads.insert(index);
        self
    }

    pub fn with_deploy_failure(self) -> Self {
        self.state.lock().fail_deploy = true;
        self
    }

    pub fn with_call_failure(self) -> Self {
        self.state.lock().fail_call = true;
        self
    }

    pub fn calls(&self) -> Vec<LedgerCall> {
        self.state.lock().calls.clone()
    }

    pub fn status_queries(&self) -> usize {
        self.state.lock().calls.iter().filter(|c| matches!(c, LedgerCall::Status(_))).count()
    }

    pub fn reads(&self) -> usize {
        self.state.lock().reads
    }

    pub fn counter(&self, address: Address) -> Option<U256> {
        self.state.lock().counters.get(&address).copied()
    }
}

impl State {
    fn next_action(&mut self) -> PendingAction {
        self.sent += 1;
        PendingAction::new(TxHash::from_low_u64_be(self.sent))
    }
}

#[async_trait]
impl LedgerClient for InMemoryLedger {
    async fn deploy(
        &self,
        artifact: &ContractArtifact,
    ) -> Result<(Address, PendingAction), LedgerError> {
        let mut state = self.state.lock();
        state.calls.push(LedgerCall::Deploy(artifact.name.to_string()));
        if state.fail_deploy {
            return Err(LedgerError::Rpc("insufficient funds for gas".to_string()));
        }
        state.deployed += 1;
        let address = Address::from_low_u64_be(0xC0FFEE + state.deployed);
        state.counters.insert(address, U256::zero());
        Ok((address, state.next_action()))
    }

    async fn call(&self, address: Address, method: &str) -> Result<PendingAction, LedgerError> {
        let mut state = self.state.lock();
        state.calls.push(LedgerCall::Call(address, method.to_string()));
        if state.fail_call {
            return Err(LedgerError::Rpc("nonce too low".to_string()));
        }
        if method != TICK_METHOD {
            return Err(LedgerError::InvalidInput(format!("unknown mutating method {}", method)));
        }
        let advance = state.advance_on_tick;
        let counter = state
            .counters
            .get_mut(&address)
            .ok_or_else(|| LedgerError::Contract(format!("no contract at {:?}", address)))?;
        if advance {
            *counter += U256::one();
        }
        Ok(state.next_action())
    }

    async fn read(&self, address: Address, method: &str) -> Result<U256, LedgerError> {
        let mut state = self.state.lock();
        state.calls.push(LedgerCall::Read(address, method.to_string()));
        let index = state.reads;
        state.reads += 1;
        if state.failing_reads.contains(&index) {
            return Err(LedgerError::Rpc("execution reverted".to_string()));
        }
        if method != COUNTER_METHOD {
            return Err(LedgerError::InvalidInput(format!("unknown view method {}", method)));
        }
        state
            .counters
            .get(&address)
            .copied()
            .ok_or_else(|| LedgerError::Contract(format!("no contract code at {:?}", address)))
    }
}

#[async_trait]
impl StatusSource for InMemoryLedger {
    async fn status(&self, action: &PendingAction) -> Result<InclusionStatus, LedgerError> {
        let mut state = self.state.lock();
        state.calls.push(LedgerCall::Status(*action));
        let next = state.status_script.pop_front().unwrap_or(state.default_status);
        match next {
            ScriptedStatus::Unknown => Ok(InclusionStatus::Unknown),
            ScriptedStatus::Included(success) => Ok(InclusionStatus::Included { success }),
            ScriptedStatus::Error => Err(LedgerError::Unavailable("connection refused".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::contract::HEALTHCHECK;

    #[tokio::test]
    async fn deploy_then_tick_advances_counter() {
        let ledger = InMemoryLedger::new();
        let (address, _) = ledger.deploy(&HEALTHCHECK).await.unwrap();
        assert_eq!(ledger.read(address, COUNTER_METHOD).await.unwrap(), U256::zero());
        ledger.call(address, TICK_METHOD).await.unwrap();
        assert_eq!(ledger.counter(address), Some(U256::one()));
    }

    #[tokio::test]
    async fn status_script_is_consumed_in_order() {
        let ledger = InMemoryLedger::new()
            .with_status_script([ScriptedStatus::Unknown, ScriptedStatus::Error])
            .with_default_status(ScriptedStatus::Included(false));
        let action = PendingAction::new(TxHash::zero());
        assert_eq!(ledger.status(&action).await.unwrap(), InclusionStatus::Unknown);
        assert!(ledger.status(&action).await.is_err());
        assert_eq!(
            ledger.status(&action).await.unwrap(),
            InclusionStatus::Included { success: false }
        );
        assert_eq!(ledger.status_queries(), 3);
    }

    #[tokio::test]
    async fn reading_an_unknown_address_fails() {
        let ledger = InMemoryLedger::new();
        assert!(ledger.read(Address::repeat_byte(1), COUNTER_METHOD).await.is_err());
    }
}
