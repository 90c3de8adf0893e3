use std::sync::Arc;

use alloy::primitives::Address;
use tracing::instrument;

use crate::config::SweepSettings;
use crate::model::{EligibleToken, SwapOutcome, SwapRecord, SwapRequest};
use crate::repository::{BalanceSource, ChainRepository, JsonHistoryStore, SwapClient};
use crate::service::eligibility::EligibilityFilter;
use crate::service::token_registry::TokenRegistry;
use crate::service::types::{BatchSummary, TokenOutcome, TokenReport, TokenState};
use crate::service::utils::{format_units, realized_output, to_human_amount};
use crate::service::{ServiceError, ServiceResult};

/// Token every eligible balance is swapped into.
#[derive(Debug, Clone)]
struct TargetToken {
    address: Address,
    symbol: String,
    decimals: u8,
}

/// Sweeps a wallet: swaps every eligible token into the target token, one at a time.
pub struct TokenSwapper {
    balance_source: Arc<dyn BalanceSource>,
    swap_client: Arc<dyn SwapClient>,
    chain: Arc<dyn ChainRepository>,
    history: JsonHistoryStore,
    settings: SweepSettings,
}

impl TokenSwapper {
    pub fn new(
        balance_source: Arc<dyn BalanceSource>,
        swap_client: Arc<dyn SwapClient>,
        chain: Arc<dyn ChainRepository>,
        settings: &SweepSettings,
    ) -> Self {
        Self {
            balance_source,
            swap_client,
            chain,
            history: JsonHistoryStore::new(settings.history_dir.clone()),
            settings: settings.clone(),
        }
    }

    pub fn history(&self) -> &JsonHistoryStore {
        &self.history
    }

    /// Runs one batch over everything `wallet` holds.
    ///
    /// Only the batch setup can fail: the wallet token list, the aggregator's
    /// supported tokens, and the target token's metadata. Once tokens are being
    /// processed, every token ends up in the summary as done, skipped, or failed.
    #[instrument(skip(self), err)]
    pub async fn sweep(&self, wallet: Address) -> ServiceResult<BatchSummary> {
        let held = self.balance_source.get_wallet_tokens(wallet).await?;

        let aggregator_tokens = self.swap_client.get_token_list().await?;
        let supported = TokenRegistry::from_aggregator_tokens(&aggregator_tokens);

        let target = self.load_target().await?;

        tracing::info!(
            "Sweeping {} held tokens of {wallet} into {} ({}); {} tokens routable",
            held.len(),
            target.symbol,
            target.address,
            supported.len()
        );

        let filter = EligibilityFilter::new(&self.settings, &supported);
        let mut summary = BatchSummary::default();

        for (token, verdict) in filter.classify(&held) {
            tracing::debug!(token = %token.address, state = %TokenState::Pending, "state transition");

            let outcome = match verdict {
                Err(reason) => TokenOutcome::Skipped(reason),
                Ok(eligible) => match self.swap_token(wallet, &eligible, &target).await {
                    Ok(outcome) => TokenOutcome::Done(outcome),
                    Err(e) => {
                        tracing::error!("Failed to swap {}: {e}", eligible.address);
                        TokenOutcome::Failed(e)
                    }
                },
            };

            tracing::debug!(token = %token.address, state = %outcome.state(), "token finished");

            summary.push(TokenReport {
                token: token.address.clone(),
                symbol: token.symbol.clone(),
                outcome,
            });
        }

        tracing::info!(
            "Sweep finished: {} swapped, {} skipped, {} failed",
            summary.done(),
            summary.skipped(),
            summary.failed()
        );

        Ok(summary)
    }

    async fn load_target(&self) -> ServiceResult<TargetToken> {
        let address = self.settings.target_token;
        let metadata = self.chain.get_token_metadata(address).await?;

        Ok(TargetToken {
            address,
            symbol: metadata.symbol,
            decimals: metadata.decimals,
        })
    }

    /// Allowance check, optional approval, swap, and history record for one token.
    #[instrument(skip(self, token, target), fields(token = %token.address), err)]
    async fn swap_token(
        &self,
        wallet: Address,
        token: &EligibleToken,
        target: &TargetToken,
    ) -> ServiceResult<SwapOutcome> {
        transition(token, TokenState::CheckingAllowance);
        let allowance = self
            .swap_client
            .get_allowance(wallet, token.address)
            .await?;

        // Approves the exact amount even when a smaller non-zero allowance exists.
        if allowance < token.raw_amount {
            transition(token, TokenState::Approving);
            let receipt = self
                .swap_client
                .approve(token.address, token.raw_amount)
                .await?;

            if !receipt.is_success() {
                return Err(ServiceError::ApprovalReverted {
                    token: token.address.to_string(),
                    tx_hash: format!("{:#x}", receipt.tx_hash),
                });
            }
            tracing::info!("Approved {}", token.address);
        }

        transition(token, TokenState::Swapping);
        let request =
            SwapRequest::sell_all(token, target.address, wallet, self.settings.slippage);

        let balance_before = self.chain.balance_of(target.address, wallet).await?;

        let receipt = self.swap_client.swap(&request).await?;
        if !receipt.is_success() {
            return Err(ServiceError::SwapReverted {
                tx_hash: format!("{:#x}", receipt.tx_hash),
            });
        }

        transition(token, TokenState::Recording);
        let balance_after = self.chain.balance_of(target.address, wallet).await?;

        // The swap is mined at this point; amounts that do not fit a Decimal are
        // recorded as unknown rather than failing the token.
        let amount_in = to_human_amount(token.raw_amount, token.decimals)
            .inspect_err(|e| {
                tracing::warn!("Input amount of {} is not recordable: {e}", token.symbol)
            })
            .ok();
        let amount_out = realized_output(balance_before, balance_after, target.decimals)
            .inspect_err(|e| {
                tracing::warn!("Output amount of {} is not recordable: {e}", target.symbol)
            })
            .ok();

        tracing::info!(
            "Swapped {} {} to {} {}",
            format_units(token.raw_amount, token.decimals),
            token.symbol,
            amount_out.map_or_else(|| "an unknown amount of".to_string(), |d| d.to_string()),
            target.symbol
        );

        let outcome = SwapOutcome {
            timestamp: chrono::Local::now().naive_local(),
            tx_hash: receipt.tx_hash,
            token_in_symbol: token.symbol.clone(),
            token_in_address: token.address,
            token_in_amount: amount_in,
            token_out_symbol: target.symbol.clone(),
            token_out_address: target.address,
            token_out_amount: amount_out,
        };

        self.history
            .append(wallet, &SwapRecord::from(&outcome))
            .await?;
        tracing::info!("Saved swap record to history");

        Ok(outcome)
    }
}

fn transition(token: &EligibleToken, state: TokenState) {
    tracing::debug!(token = %token.address, %state, "state transition");
}
