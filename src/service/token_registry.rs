use std::collections::HashSet;
use std::str::FromStr;

use alloy::primitives::Address;

use crate::model::AggregatorToken;

/// Tokens the aggregator can route, keyed by parsed address.
#[derive(Debug, Clone, Default)]
pub struct TokenRegistry {
    registry: HashSet<Address>,
}

impl TokenRegistry {
    /// Build the registry from the aggregator's token list.
    ///
    /// Entries whose address does not parse (including the native-token
    /// placeholder some lists carry) are dropped with a warning.
    pub fn from_aggregator_tokens(tokens: &[AggregatorToken]) -> Self {
        let registry = tokens
            .iter()
            .filter_map(|token| match Address::from_str(token.address.trim()) {
                Ok(address) => Some(address),
                Err(e) => {
                    tracing::warn!(
                        "Ignoring aggregator token with invalid address {}: {e}",
                        token.address
                    );
                    None
                }
            })
            .collect();

        Self { registry }
    }

    /// Check if an address can be routed
    pub fn contains(&self, address: &Address) -> bool {
        self.registry.contains(address)
    }

    /// Get the number of registered tokens
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }
}

impl FromIterator<Address> for TokenRegistry {
    fn from_iter<I: IntoIterator<Item = Address>>(iter: I) -> Self {
        Self {
            registry: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HONEY_ADDRESS: &str = "0xfcbd14dc51f0a4d49d5e53c2e0950e0bc26d0dce";
    const USDC_ADDRESS: &str = "0x549943e04f40284185054145c6E4e9568C1D3241";

    fn token(address: &str) -> AggregatorToken {
        AggregatorToken {
            address: address.to_string(),
            symbol: None,
            decimals: None,
        }
    }

    #[test]
    fn test_contains_is_case_insensitive() {
        let registry =
            TokenRegistry::from_aggregator_tokens(&[token(HONEY_ADDRESS), token(USDC_ADDRESS)]);

        let honey_upper = Address::from_str(&HONEY_ADDRESS.to_uppercase().replace("0X", "0x"))
            .unwrap();
        let usdc_lower = Address::from_str(&USDC_ADDRESS.to_lowercase()).unwrap();

        assert!(registry.contains(&honey_upper));
        assert!(registry.contains(&usdc_lower));
        assert!(!registry.contains(&Address::ZERO));
    }

    #[test]
    fn test_invalid_entries_are_dropped() {
        let registry = TokenRegistry::from_aggregator_tokens(&[
            token(HONEY_ADDRESS),
            token("bera"),
            token(""),
        ]);

        assert_eq!(registry.len(), 1);
        assert!(!registry.is_empty());
    }

    #[test]
    fn test_parse_aggregator_token_list() {
        let json = r#"[
            {
                "address": "0xFCBD14DC51f0A4d49d5E53C2E0950e0bC26d0Dce",
                "name": "Honey",
                "symbol": "HONEY",
                "decimals": 18,
                "tokenURI": "https://example.invalid/honey.png"
            },
            { "address": "0x549943e04f40284185054145c6E4e9568C1D3241" }
        ]"#;
        let tokens: Vec<AggregatorToken> = serde_json::from_str(json).unwrap();

        assert_eq!(tokens[0].symbol.as_deref(), Some("HONEY"));
        assert_eq!(tokens[1].decimals, None);
        assert_eq!(TokenRegistry::from_aggregator_tokens(&tokens).len(), 2);
    }

    #[test]
    fn test_empty_registry() {
        let registry = TokenRegistry::default();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }
}
