use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, U256};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::instrument;

use super::error::RepositoryError;
use crate::config::AggregatorConfig;
use crate::model::{AggregatorToken, SwapRequest, TxReceipt};
use crate::repository::{ChainRepository, RepoResult, SwapClient};

const SWAP_STATUS_SUCCESS: &str = "Success";

#[derive(Debug, Deserialize)]
struct AllowanceResponse {
    allowance: String,
}

#[derive(Debug, Deserialize)]
struct ApproveResponse {
    tx: RouterTx,
}

#[derive(Debug, Deserialize)]
struct SwapResponse {
    status: String,
    #[serde(default)]
    tx: Option<RouterTx>,
}

/// Unsigned transaction returned by the aggregator.
#[derive(Debug, Deserialize)]
struct RouterTx {
    to: String,
    data: String,
    #[serde(default)]
    value: Option<serde_json::Value>,
}

impl RouterTx {
    fn into_request(self, from: Address) -> RepoResult<TransactionRequest> {
        let to = Address::from_str(&self.to).map_err(|e| {
            RepositoryError::ParseError(format!("Invalid router address {}: {e}", self.to))
        })?;
        let data = Bytes::from_str(&self.data)
            .map_err(|e| RepositoryError::ParseError(format!("Invalid calldata: {e}")))?;
        let value = match self.value {
            None | Some(serde_json::Value::Null) => U256::ZERO,
            Some(serde_json::Value::String(value)) => parse_u256(&value)?,
            Some(serde_json::Value::Number(value)) => parse_u256(&value.to_string())?,
            Some(other) => {
                return Err(RepositoryError::ParseError(format!(
                    "Invalid transaction value: {other}"
                )));
            }
        };

        Ok(TransactionRequest::default()
            .with_from(from)
            .with_to(to)
            .with_input(data)
            .with_value(value))
    }
}

fn parse_u256(value: &str) -> RepoResult<U256> {
    U256::from_str(value.trim())
        .map_err(|e| RepositoryError::ParseError(format!("Invalid integer {value:?}: {e}")))
}

/// Ooga Booga aggregator client.
///
/// Quotes and calldata come from the HTTP API; transactions are signed and
/// submitted through the chain repository.
pub struct OogaBoogaClient {
    client: Client,
    base_url: String,
    api_key: String,
    max_retries: u32,
    request_delay: Duration,
    chain: Arc<dyn ChainRepository>,
}

impl OogaBoogaClient {
    pub fn new(config: &AggregatorConfig, chain: Arc<dyn ChainRepository>) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            max_retries: config.max_retries,
            request_delay: config.request_delay(),
            chain,
        }
    }

    fn sender(&self) -> RepoResult<Address> {
        self.chain.wallet_address().ok_or_else(|| {
            RepositoryError::Other("No wallet configured; cannot sign transactions".to_string())
        })
    }

    /// GETs `path` and decodes the JSON body, retrying transport errors,
    /// rate limiting and server errors.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> RepoResult<T> {
        let url = format!("{}{}", self.base_url, path);
        let mut attempt = 0;

        loop {
            let result = self
                .client
                .get(&url)
                .bearer_auth(&self.api_key)
                .query(query)
                .send()
                .await;

            let error = match result {
                Ok(response) if response.status().is_success() => {
                    return response.json::<T>().await.map_err(RepositoryError::from);
                }
                Ok(response) => {
                    let status = response.status();
                    let message = response.text().await.unwrap_or_default();
                    let error = RepositoryError::ApiError {
                        status: status.as_u16(),
                        message,
                    };
                    if !is_retryable(status) {
                        return Err(error);
                    }
                    error
                }
                Err(e) => RepositoryError::from(e),
            };

            if attempt >= self.max_retries {
                return Err(error);
            }
            attempt += 1;
            tracing::warn!(
                "Request to {path} failed ({error}), retrying {attempt}/{}",
                self.max_retries
            );
            tokio::time::sleep(self.request_delay).await;
        }
    }
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

#[async_trait]
impl SwapClient for OogaBoogaClient {
    #[instrument(skip(self), err)]
    async fn get_token_list(&self) -> RepoResult<Vec<AggregatorToken>> {
        self.get_json("/v1/tokens", &[]).await
    }

    #[instrument(skip(self), err)]
    async fn get_allowance(&self, owner: Address, token: Address) -> RepoResult<U256> {
        let response: AllowanceResponse = self
            .get_json(
                "/v1/approve/allowance",
                &[("token", token.to_string()), ("from", owner.to_string())],
            )
            .await?;

        parse_u256(&response.allowance)
    }

    #[instrument(skip(self), err)]
    async fn approve(&self, token: Address, amount: U256) -> RepoResult<TxReceipt> {
        let from = self.sender()?;
        let response: ApproveResponse = self
            .get_json(
                "/v1/approve",
                &[("token", token.to_string()), ("amount", amount.to_string())],
            )
            .await?;

        let tx = response.tx.into_request(from)?;
        self.chain.send_transaction(tx).await
    }

    #[instrument(skip(self), err)]
    async fn swap(&self, request: &SwapRequest) -> RepoResult<TxReceipt> {
        let from = self.sender()?;
        let response: SwapResponse = self
            .get_json(
                "/v1/swap",
                &[
                    ("tokenIn", request.token_in.to_string()),
                    ("amount", request.amount.to_string()),
                    ("tokenOut", request.token_out.to_string()),
                    ("to", request.recipient.to_string()),
                    ("slippage", request.slippage.to_string()),
                ],
            )
            .await?;

        if response.status != SWAP_STATUS_SUCCESS {
            return Err(RepositoryError::Other(format!(
                "No swap route for {} -> {}: {}",
                request.token_in, request.token_out, response.status
            )));
        }

        let tx = response
            .tx
            .ok_or_else(|| RepositoryError::ParseError("Swap response has no tx".to_string()))?
            .into_request(from)?;

        self.chain.send_transaction(tx).await
    }
}
