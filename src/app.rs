use std::sync::Arc;

use alloy::network::EthereumWallet;
use alloy::primitives::Address;
use alloy::providers::ProviderBuilder;
use anyhow::Context;

use crate::config::Config;
use crate::repository::{
    AlloyChainRepository, ChainRepository, DebankBalanceSource, OogaBoogaClient, signer_from_key,
};
use crate::service::TokenSwapper;

/// Wires the live clients into a [`TokenSwapper`] and returns it with the wallet it sweeps.
pub fn build_swapper(config: &Config) -> anyhow::Result<(TokenSwapper, Address)> {
    let settings = config
        .sweep_settings()
        .context("invalid sweep configuration")?;

    let signer = signer_from_key(&config.wallet.private_key)?;
    let wallet = signer.address();

    let rpc_url = config
        .rpc
        .url
        .parse::<reqwest::Url>()
        .with_context(|| format!("invalid RPC URL: {}", config.rpc.url))?;

    let provider = ProviderBuilder::new()
        .wallet(EthereumWallet::from(signer))
        .connect_http(rpc_url);

    let chain: Arc<dyn ChainRepository> = Arc::new(
        AlloyChainRepository::new_with_signer(Arc::new(provider), wallet)
            .with_receipt_timeout(config.aggregator.receipt_timeout()),
    );

    let swap_client = Arc::new(OogaBoogaClient::new(&config.aggregator, chain.clone()));
    let balance_source = Arc::new(DebankBalanceSource::new(&config.balance_source));

    tracing::info!(
        "Sweeping wallet {wallet} into {} with {} slippage",
        settings.target_token,
        settings.slippage
    );

    let swapper = TokenSwapper::new(balance_source, swap_client, chain, &settings);

    Ok((swapper, wallet))
}
