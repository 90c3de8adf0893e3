use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use alloy::network::ReceiptResponse;
use alloy::primitives::{Address, U256};
use alloy::providers::Provider;
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use tracing::instrument;

use super::error::RepositoryError;
use crate::model::TxReceipt;
use crate::repository::contract::IERC20;
use crate::repository::{ChainRepository, RepoResult};

/// Receipt wait used when none is configured.
const DEFAULT_RECEIPT_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone)]
pub struct TokenMetadata {
    pub decimals: u8,
    pub symbol: String,
}

/// Parses a hex private key into a local signer.
pub fn signer_from_key(private_key: &str) -> Result<PrivateKeySigner, RepositoryError> {
    PrivateKeySigner::from_str(private_key.trim())
        .map_err(|e| RepositoryError::ParseError(format!("Invalid private key: {e}")))
}

/// Chain access over an alloy provider.
///
/// Transactions are only signed if the provider was built with a wallet filler
/// (`ProviderBuilder::new().wallet(..)`); `signer` must be that wallet's address.
pub struct AlloyChainRepository<P> {
    provider: Arc<P>,
    signer: Option<Address>,
    receipt_timeout: Duration,
}

impl<P: Provider + Clone + 'static> AlloyChainRepository<P> {
    pub fn new(provider: Arc<P>) -> Self {
        Self {
            provider,
            signer: None,
            receipt_timeout: DEFAULT_RECEIPT_TIMEOUT,
        }
    }

    pub fn new_with_signer(provider: Arc<P>, signer: Address) -> Self {
        Self {
            provider,
            signer: Some(signer),
            receipt_timeout: DEFAULT_RECEIPT_TIMEOUT,
        }
    }

    pub fn with_receipt_timeout(mut self, timeout: Duration) -> Self {
        self.receipt_timeout = timeout;
        self
    }
}

#[async_trait]
impl<P: Provider + Clone + Send + Sync + 'static> ChainRepository for AlloyChainRepository<P> {
    #[instrument(skip(self), err)]
    async fn balance_of(&self, token: Address, owner: Address) -> RepoResult<U256> {
        let contract = IERC20::new(token, self.provider.clone());

        contract
            .balanceOf(owner)
            .call()
            .await
            .map_err(|e| RepositoryError::ContractError(e.to_string()))
    }

    #[instrument(skip(self), err)]
    async fn get_token_metadata(&self, token: Address) -> RepoResult<TokenMetadata> {
        let contract = IERC20::new(token, self.provider.clone());

        let decimals = contract
            .decimals()
            .call()
            .await
            .map_err(|e| RepositoryError::ContractError(e.to_string()))?;

        let symbol = contract
            .symbol()
            .call()
            .await
            .map_err(|e| RepositoryError::ContractError(e.to_string()))?;

        Ok(TokenMetadata { decimals, symbol })
    }

    #[instrument(skip(self, tx), err)]
    async fn send_transaction(&self, tx: TransactionRequest) -> RepoResult<TxReceipt> {
        if self.signer.is_none() {
            return Err(RepositoryError::Other(
                "No wallet configured; cannot send transactions".to_string(),
            ));
        }

        let pending = self.provider.send_transaction(tx).await.map_err(|e| {
            if e.to_string().contains("429") {
                tracing::warn!("Rate limited while submitting transaction");
            }
            RepositoryError::RpcError(e.to_string())
        })?;

        let tx_hash = *pending.tx_hash();
        tracing::info!("Submitted transaction {tx_hash}");

        let receipt = pending
            .with_timeout(Some(self.receipt_timeout))
            .get_receipt()
            .await
            .map_err(|e| {
                RepositoryError::RpcError(format!("Failed to get receipt for {tx_hash}: {e}"))
            })?;

        let status = u64::from(receipt.status());
        tracing::debug!("Transaction {tx_hash} mined with status {status}");

        Ok(TxReceipt {
            tx_hash: receipt.transaction_hash,
            status,
        })
    }

    fn wallet_address(&self) -> Option<Address> {
        self.signer
    }
}
