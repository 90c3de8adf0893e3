use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use alloy::primitives::Address;
use anyhow::{Context, bail};
use dotenv::dotenv;
use envsubst::substitute;
use rust_decimal::Decimal;
use serde::Deserialize;

/// Environment variables the YAML file is allowed to reference.
const ENV_PREFIXES: &[&str] = &["BERA_", "DEBANK_", "OOGA_BOOGA_", "PRIVATE_KEY", "SWEEP_"];

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub rpc: RpcConfig,
    pub wallet: WalletConfig,
    pub balance_source: BalanceSourceConfig,
    pub aggregator: AggregatorConfig,
    pub sweep: SweepConfig,
}

impl Config {
    pub async fn from_yaml(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        dotenv().ok();

        let path = path.as_ref();
        let file_content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read config file from path: {}", path.display()))?;

        let env_vars: HashMap<String, String> = std::env::vars()
            .filter(|(key, _)| ENV_PREFIXES.iter().any(|prefix| key.starts_with(prefix)))
            .collect();

        let interpolated = substitute(&file_content, &env_vars)
            .context("failed to substitute environment variables in YAML")?;

        let config: Config =
            serde_yaml::from_str(&interpolated).context("failed to parse YAML configuration")?;

        Ok(config)
    }

    /// Checks that every credential needed for a live run is present.
    pub fn validate(&self) -> anyhow::Result<()> {
        let required = [
            ("rpc.url", &self.rpc.url),
            ("wallet.private_key", &self.wallet.private_key),
            ("balance_source.api_key", &self.balance_source.api_key),
            ("aggregator.api_key", &self.aggregator.api_key),
        ];

        for (name, value) in required {
            if is_unset(value) {
                bail!("missing required configuration value: {name}");
            }
        }

        Ok(())
    }

    pub fn sweep_settings(&self) -> anyhow::Result<SweepSettings> {
        SweepSettings::try_from_config(&self.sweep, &self.balance_source.chain_id)
    }
}

fn is_unset(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value.starts_with("${")
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WalletConfig {
    pub private_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BalanceSourceConfig {
    pub base_url: String,
    pub api_key: String,
    pub chain_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AggregatorConfig {
    pub base_url: String,
    pub api_key: String,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
    #[serde(default = "default_receipt_timeout_secs")]
    pub receipt_timeout_secs: u64,
}

impl AggregatorConfig {
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn receipt_timeout(&self) -> Duration {
        Duration::from_secs(self.receipt_timeout_secs)
    }
}

fn default_max_retries() -> u32 {
    3
}

fn default_request_delay_ms() -> u64 {
    1000
}

fn default_receipt_timeout_secs() -> u64 {
    120
}

#[derive(Debug, Clone, Deserialize)]
pub struct SweepConfig {
    pub target_token: String,
    pub slippage: Decimal,
    #[serde(default)]
    pub excluded_tokens: Vec<String>,
    #[serde(default = "default_history_dir")]
    pub history_dir: PathBuf,
}

fn default_history_dir() -> PathBuf {
    PathBuf::from("swap_history")
}

/// Run-wide sweep parameters, parsed once at startup and immutable afterwards.
#[derive(Debug, Clone)]
pub struct SweepSettings {
    pub target_token: Address,
    pub slippage: Decimal,
    pub excluded_tokens: HashSet<Address>,
    /// Identifier the balance source uses for the chain's native gas token.
    pub native_token_id: String,
    pub history_dir: PathBuf,
}

impl SweepSettings {
    fn try_from_config(sweep: &SweepConfig, native_token_id: &str) -> anyhow::Result<Self> {
        let target_token = Address::from_str(sweep.target_token.trim())
            .with_context(|| format!("invalid target token address: {}", sweep.target_token))?;

        if sweep.slippage.is_sign_negative() || sweep.slippage >= Decimal::ONE {
            bail!(
                "slippage must be a fraction in [0, 1), got {}",
                sweep.slippage
            );
        }

        let excluded_tokens = sweep
            .excluded_tokens
            .iter()
            .map(|token| {
                Address::from_str(token.trim())
                    .with_context(|| format!("invalid excluded token address: {token}"))
            })
            .collect::<anyhow::Result<HashSet<_>>>()?;

        Ok(Self {
            target_token,
            slippage: sweep.slippage,
            excluded_tokens,
            native_token_id: native_token_id.to_string(),
            history_dir: sweep.history_dir.clone(),
        })
    }
}
