use std::collections::HashSet;
use std::str::FromStr;

use alloy::primitives::Address;

use crate::config::SweepSettings;
use crate::model::{EligibleToken, HeldToken};
use crate::service::token_registry::TokenRegistry;
use crate::service::types::SkipReason;

/// Decides which held tokens get swapped into the target.
///
/// Rules run in a fixed order and stop at the first failure, so logs always
/// name the first rule a token broke.
#[derive(Debug, Clone)]
pub struct EligibilityFilter<'a> {
    settings: &'a SweepSettings,
    supported: &'a TokenRegistry,
}

impl<'a> EligibilityFilter<'a> {
    pub fn new(settings: &'a SweepSettings, supported: &'a TokenRegistry) -> Self {
        Self {
            settings,
            supported,
        }
    }

    /// Checks a single held token.
    pub fn evaluate(&self, token: &HeldToken) -> Result<EligibleToken, SkipReason> {
        let id = token.address.trim();
        if id.eq_ignore_ascii_case(&self.settings.native_token_id) {
            return Err(SkipReason::NativeToken);
        }

        let address =
            Address::from_str(id).map_err(|e| SkipReason::InvalidAddress(e.to_string()))?;

        if self.settings.excluded_tokens.contains(&address) {
            return Err(SkipReason::Excluded);
        }

        if address == self.settings.target_token {
            return Err(SkipReason::TargetToken);
        }

        if !self.supported.contains(&address) {
            return Err(SkipReason::Unsupported);
        }

        if token.raw_amount.is_zero() {
            return Err(SkipReason::ZeroBalance);
        }

        Ok(EligibleToken {
            address,
            symbol: token.symbol.clone(),
            decimals: token.decimals,
            raw_amount: token.raw_amount,
        })
    }

    /// Verdict for every held token, in input order.
    ///
    /// A token whose address already passed earlier in the list is skipped as a duplicate.
    pub fn classify<'t>(
        &self,
        held: &'t [HeldToken],
    ) -> Vec<(&'t HeldToken, Result<EligibleToken, SkipReason>)> {
        let mut seen = HashSet::new();

        held.iter()
            .map(|token| {
                let verdict = self.evaluate(token).and_then(|eligible| {
                    if seen.insert(eligible.address) {
                        Ok(eligible)
                    } else {
                        Err(SkipReason::Duplicate)
                    }
                });

                if let Err(reason) = &verdict {
                    tracing::info!("Token {} is skipped: {reason}", token.address);
                }

                (token, verdict)
            })
            .collect()
    }

    /// Eligible tokens in input order, each address at most once.
    pub fn filter(&self, held: &[HeldToken]) -> Vec<EligibleToken> {
        self.classify(held)
            .into_iter()
            .filter_map(|(_, verdict)| verdict.ok())
            .collect()
    }
}
