use async_trait::async_trait;
use ethers::{
    middleware::SignerMiddleware,
    providers::{Http, JsonRpcClient, Middleware, Provider},
    signers::{LocalWallet, Signer},
    types::{transaction::eip2718::TypedTransaction, Address, TransactionRequest, U256, U64},
    utils::get_contract_address,
};
use secrecy::{ExposeSecret, SecretString};
use std::{sync::Arc, time::Duration};
use tracing::{debug, info};

use super::contract::{ContractArtifact, HealthCheck, COUNTER_METHOD, TICK_METHOD};
use super::traits::{InclusionStatus, LedgerClient, PendingAction, StatusSource};
use crate::core::errors::{HealthCheckError, LedgerError};

/// Per-request timeout of the JSON-RPC transport.
pub const RPC_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub type SignerClient<P> = SignerMiddleware<Provider<P>, LocalWallet>;

/// [`LedgerClient`] over an EVM JSON-RPC endpoint, signing with a local key.
#[derive(Clone)]
pub struct EthereumLedger<P: JsonRpcClient = Http> {
    client: Arc<SignerClient<P>>,
    network_name: String,
    chain_id: u64,
}

impl EthereumLedger<Http> {
    /// Connect to `rpc_url` and prepare a signer for `private_key`.
    ///
    /// The chain id is fetched up front so transactions are signed for the
    /// right network; a node that cannot answer that call is treated as
    /// unreachable.
    pub async fn connect(
        rpc_url: &str,
        private_key: &SecretString,
    ) -> Result<Self, HealthCheckError> {
        let wallet = parse_private_key(private_key.expose_secret())?;

        let rpc_url_clean = rpc_url.trim();
        let connection_error = |reason: String| HealthCheckError::Connection {
            url: rpc_url_clean.to_string(),
            reason,
        };
        let parsed_url = reqwest::Url::parse(rpc_url_clean)
            .map_err(|e| connection_error(format!("invalid URL: {}", e)))?;

        info!("Connecting to network: {}", parsed_url);
        let mut builder = reqwest::Client::builder().timeout(RPC_REQUEST_TIMEOUT);
        if let Ok(proxy) = std::env::var("HTTPS_PROXY").or_else(|_| std::env::var("HTTP_PROXY")) {
            if let Ok(p) = reqwest::Proxy::all(proxy) {
                builder = builder.proxy(p);
            }
        }
        let http = builder
            .build()
            .map_err(|e| connection_error(format!("failed to build HTTP client: {}", e)))?;

        let provider = Provider::new(Http::new_with_client(parsed_url, http));
        let chain_id = provider
            .get_chainid()
            .await
            .map_err(|e| connection_error(format!("failed to get chain ID: {}", e)))?
            .as_u64();

        let ledger = Self::with_provider(provider, wallet.with_chain_id(chain_id));
        info!(
            network = %ledger.network_name,
            chain_id,
            sender = %ethers::utils::to_checksum(&ledger.sender(), None),
            "Connected"
        );
        Ok(ledger)
    }
}

impl<P> EthereumLedger<P>
where
    P: JsonRpcClient + 'static,
{
    /// Wrap an existing provider. The wallet's chain id is used as-is, which
    /// lets tests run against a `MockProvider` without any network round trip.
    pub fn with_provider(provider: Provider<P>, wallet: LocalWallet) -> Self {
        let chain_id = wallet.chain_id();
        Self {
            client: Arc::new(SignerMiddleware::new(provider, wallet)),
            network_name: network_name(chain_id),
            chain_id,
        }
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn network_name(&self) -> &str {
        &self.network_name
    }

    /// Address paying for the health-check transactions.
    pub fn sender(&self) -> Address {
        self.client.address()
    }
}

/// Parse a hex-encoded secp256k1 key, with or without a `0x` prefix.
pub fn parse_private_key(hex_key: &str) -> Result<LocalWallet, HealthCheckError> {
    hex_key
        .trim()
        .parse::<LocalWallet>()
        .map_err(|e| HealthCheckError::Credential(e.to_string()))
}

fn network_name(chain_id: u64) -> String {
    match chain_id {
        1 => "ethereum".to_string(),
        14 => "flare".to_string(),
        16 => "coston".to_string(),
        19 => "songbird".to_string(),
        114 => "coston2".to_string(),
        43114 => "avalanche".to_string(),
        _ => format!("evm-{}", chain_id),
    }
}

#[async_trait]
impl<P> LedgerClient for EthereumLedger<P>
where
    P: JsonRpcClient + 'static,
{
    async fn deploy(
        &self,
        artifact: &ContractArtifact,
    ) -> Result<(Address, PendingAction), LedgerError> {
        let sender = self.sender();
        let mut tx: TypedTransaction =
            TransactionRequest::new().from(sender).data(artifact.bytecode()?).into();

        // Fill first so the nonce is known: the contract address is derived
        // from sender and nonce and can be reported before the tx is mined.
        self.client
            .fill_transaction(&mut tx, None)
            .await
            .map_err(|e| LedgerError::Rpc(format!("failed to prepare deployment: {}", e)))?;
        let nonce = tx
            .nonce()
            .copied()
            .ok_or_else(|| LedgerError::Rpc("node did not provide a nonce".to_string()))?;
        let address = get_contract_address(sender, nonce);

        let pending = self
            .client
            .send_transaction(tx, None)
            .await
            .map_err(|e| LedgerError::Rpc(format!("failed to send deployment: {}", e)))?;
        let action = PendingAction::new(pending.tx_hash());

        info!(contract = artifact.name, tx_hash = %action, "Deployment transaction sent");
        Ok((address, action))
    }

    async fn call(&self, address: Address, method: &str) -> Result<PendingAction, LedgerError> {
        match method {
            TICK_METHOD => {
                let contract = HealthCheck::new(address, self.client.clone());
                let call = contract.tick();
                let pending = call
                    .send()
                    .await
                    .map_err(|e| LedgerError::Contract(format!("{}() failed: {}", method, e)))?;
                let action = PendingAction::new(pending.tx_hash());
                debug!(tx_hash = %action, method, "Transaction sent");
                Ok(action)
            }
            other => Err(LedgerError::InvalidInput(format!("unknown mutating method {}", other))),
        }
    }

    async fn read(&self, address: Address, method: &str) -> Result<U256, LedgerError> {
        match method {
            COUNTER_METHOD => {
                let contract = HealthCheck::new(address, self.client.clone());
                let value = contract
                    .counter()
                    .call()
                    .await
                    .map_err(|e| LedgerError::Contract(format!("{}() failed: {}", method, e)))?;
                debug!(%value, method, "Read contract state");
                Ok(value)
            }
            other => Err(LedgerError::InvalidInput(format!("unknown view method {}", other))),
        }
    }
}

#[async_trait]
impl<P> StatusSource for EthereumLedger<P>
where
    P: JsonRpcClient + 'static,
{
    async fn status(&self, action: &PendingAction) -> Result<InclusionStatus, LedgerError> {
        match self.client.get_transaction_receipt(action.tx_hash()).await {
            Ok(Some(receipt)) if receipt.block_number.is_some() => {
                let success = receipt.status == Some(U64::from(1));
                debug!(tx_hash = %action, success, block = ?receipt.block_number, "Receipt found");
                Ok(InclusionStatus::Included { success })
            }
            Ok(_) => Ok(InclusionStatus::Unknown),
            Err(e) => {
                debug!("Failed to get transaction receipt for {}: {}", action, e);
                Err(LedgerError::Rpc(format!("failed to get transaction receipt: {}", e)))
            }
        }
    }
}
