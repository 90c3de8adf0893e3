use std::str::FromStr;

use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::instrument;

use super::error::RepositoryError;
use crate::config::BalanceSourceConfig;
use crate::model::HeldToken;
use crate::repository::{BalanceSource, RepoResult};

/// One entry of DeBank's `/user/token_list` response.
///
/// Only the fields the sweeper relies on are declared; every one of them is required.
#[derive(Debug, Clone, Deserialize)]
pub struct DebankToken {
    pub id: String,
    pub symbol: String,
    pub decimals: u8,
    pub raw_amount: serde_json::Number,
    #[serde(default)]
    pub raw_amount_hex_str: Option<String>,
}

impl TryFrom<DebankToken> for HeldToken {
    type Error = RepositoryError;

    fn try_from(token: DebankToken) -> Result<Self, Self::Error> {
        let raw_amount = parse_raw_amount(&token)?;

        Ok(HeldToken {
            address: token.id,
            symbol: token.symbol,
            decimals: token.decimals,
            raw_amount,
        })
    }
}

/// Prefers the exact hex amount; `raw_amount` is a JSON number that loses
/// precision once it no longer fits in a u64.
fn parse_raw_amount(token: &DebankToken) -> RepoResult<U256> {
    if let Some(hex) = token.raw_amount_hex_str.as_deref() {
        let digits = hex.trim().trim_start_matches("0x");
        return U256::from_str_radix(digits, 16).map_err(|e| {
            RepositoryError::ParseError(format!(
                "Invalid raw_amount_hex_str {hex:?} for token {}: {e}",
                token.id
            ))
        });
    }

    if let Some(amount) = token.raw_amount.as_u64() {
        return Ok(U256::from(amount));
    }

    if let Ok(amount) = U256::from_str(&token.raw_amount.to_string()) {
        return Ok(amount);
    }

    match token.raw_amount.as_f64() {
        // `as u128` saturates, so anything at or above 2^128 is rejected instead.
        Some(amount) if amount.is_finite() && amount >= 0.0 && amount < u128::MAX as f64 => {
            Ok(U256::from(amount as u128))
        }
        _ => Err(RepositoryError::ParseError(format!(
            "Invalid raw_amount {} for token {}",
            token.raw_amount, token.id
        ))),
    }
}

/// DeBank Pro OpenAPI wallet token list.
pub struct DebankBalanceSource {
    client: Client,
    base_url: String,
    api_key: String,
    chain_id: String,
}

impl DebankBalanceSource {
    pub fn new(config: &BalanceSourceConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            chain_id: config.chain_id.clone(),
        }
    }
}

#[async_trait]
impl BalanceSource for DebankBalanceSource {
    #[instrument(skip(self), err)]
    async fn get_wallet_tokens(&self, wallet: Address) -> RepoResult<Vec<HeldToken>> {
        let url = format!("{}/user/token_list", self.base_url);
        let wallet = wallet.to_string();

        let response = self
            .client
            .get(&url)
            .header("accept", "application/json")
            .header("AccessKey", &self.api_key)
            .query(&[
                ("id", wallet.as_str()),
                ("chain_id", self.chain_id.as_str()),
                ("is_all", "false"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(RepositoryError::ApiError {
                status: status.as_u16(),
                message: format!("Failed to fetch tokens: {message}"),
            });
        }

        let tokens: Vec<DebankToken> = response.json().await?;
        tracing::debug!("Balance source returned {} tokens", tokens.len());

        tokens.into_iter().map(HeldToken::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_tokens(json: &str) -> RepoResult<Vec<HeldToken>> {
        let tokens: Vec<DebankToken> =
            serde_json::from_str(json).map_err(|e| RepositoryError::ParseError(e.to_string()))?;
        tokens.into_iter().map(HeldToken::try_from).collect()
    }

    #[test]
    fn test_parse_token_list_should_work() {
        let json = r#"[
            {
                "id": "bera",
                "chain": "bera",
                "name": "BERA",
                "symbol": "BERA",
                "decimals": 18,
                "amount": 1.25,
                "raw_amount": 1250000000000000000,
                "raw_amount_hex_str": "0x1158e460913d0000"
            },
            {
                "id": "0x549943e04f40284185054145c6e4e9568c1d3241",
                "chain": "bera",
                "symbol": "USDC.e",
                "decimals": 6,
                "raw_amount": 1000000
            }
        ]"#;

        let tokens = parse_tokens(json).unwrap();

        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].address, "bera");
        assert_eq!(
            tokens[0].raw_amount,
            U256::from(1_250_000_000_000_000_000u64)
        );
        assert_eq!(tokens[1].symbol, "USDC.e");
        assert_eq!(tokens[1].decimals, 6);
        assert_eq!(tokens[1].raw_amount, U256::from(1_000_000u64));
    }

    #[test]
    fn test_hex_amount_takes_precedence_over_float() {
        let json = r#"[{
            "id": "0x549943e04f40284185054145c6e4e9568c1d3241",
            "symbol": "BIG",
            "decimals": 18,
            "raw_amount": 1.2345678901234567e+24,
            "raw_amount_hex_str": "0x1056e0f36a6443de2df79"
        }]"#;

        let tokens = parse_tokens(json).unwrap();
        assert_eq!(
            tokens[0].raw_amount,
            U256::from_str("1234567890123456789012345").unwrap()
        );
    }

    #[test]
    fn test_missing_required_field_should_fail() {
        let json = r#"[{ "id": "0x549943e04f40284185054145c6e4e9568c1d3241", "symbol": "X", "raw_amount": 1 }]"#;

        let result = parse_tokens(json);
        assert!(matches!(result, Err(RepositoryError::ParseError(_))));
    }

    #[test]
    fn test_negative_amount_should_fail() {
        let json = r#"[{ "id": "0x549943e04f40284185054145c6e4e9568c1d3241", "symbol": "X", "decimals": 18, "raw_amount": -5 }]"#;

        let result = parse_tokens(json);
        assert!(matches!(result, Err(RepositoryError::ParseError(_))));
    }

    #[test]
    fn test_float_amount_beyond_u128_should_fail() {
        let json = r#"[{ "id": "0x549943e04f40284185054145c6e4e9568c1d3241", "symbol": "X", "decimals": 18, "raw_amount": 1e39 }]"#;

        let result = parse_tokens(json);
        assert!(matches!(result, Err(RepositoryError::ParseError(_))));
    }

    #[test]
    fn test_float_amount_within_u128_is_accepted() {
        let json = r#"[{ "id": "0x549943e04f40284185054145c6e4e9568c1d3241", "symbol": "X", "decimals": 18, "raw_amount": 1e30 }]"#;

        let tokens = parse_tokens(json).unwrap();
        assert_eq!(tokens[0].raw_amount, U256::from(1e30_f64 as u128));
    }
}
