//! Data shared between the repository and service layers.

use alloy::primitives::{Address, B256, U256};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Timestamp layout used in swap history records.
pub const HISTORY_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A token balance as reported by the balance source at batch start.
///
/// `address` is kept exactly as reported: it may be the native-token sentinel
/// or an address in any letter case. Normalization happens during eligibility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeldToken {
    pub address: String,
    pub symbol: String,
    pub decimals: u8,
    pub raw_amount: U256,
}

/// A held token that passed every eligibility rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EligibleToken {
    pub address: Address,
    pub symbol: String,
    pub decimals: u8,
    pub raw_amount: U256,
}

/// A token the aggregator can route.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AggregatorToken {
    pub address: String,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub decimals: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapRequest {
    pub token_in: Address,
    pub amount: U256,
    pub token_out: Address,
    pub recipient: Address,
    /// Fraction, e.g. 0.02 for 2%.
    pub slippage: Decimal,
}

impl SwapRequest {
    /// Sells the whole held balance of `token` for `token_out`.
    pub fn sell_all(
        token: &EligibleToken,
        token_out: Address,
        recipient: Address,
        slippage: Decimal,
    ) -> Self {
        Self {
            token_in: token.address,
            amount: token.raw_amount,
            token_out,
            recipient,
            slippage,
        }
    }
}

/// Mined transaction as seen by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxReceipt {
    pub tx_hash: B256,
    /// 1 on success, 0 on revert.
    pub status: u64,
}

impl TxReceipt {
    pub fn is_success(&self) -> bool {
        self.status == 1
    }
}

/// A mined swap. Human amounts are `None` when they fall outside `Decimal`'s range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapOutcome {
    pub timestamp: NaiveDateTime,
    pub tx_hash: B256,
    pub token_in_symbol: String,
    pub token_in_address: Address,
    pub token_in_amount: Option<Decimal>,
    pub token_out_symbol: String,
    pub token_out_address: Address,
    pub token_out_amount: Option<Decimal>,
}

/// On-disk shape of one history entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapRecord {
    pub timestamp: String,
    pub tx_hash: String,
    pub token_input: String,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub token_input_amount: Option<Decimal>,
    pub token_input_address: String,
    pub token_output: String,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub token_output_amount: Option<Decimal>,
    pub token_output_address: String,
}

impl From<&SwapOutcome> for SwapRecord {
    fn from(outcome: &SwapOutcome) -> Self {
        Self {
            timestamp: outcome
                .timestamp
                .format(HISTORY_TIMESTAMP_FORMAT)
                .to_string(),
            tx_hash: format!("{:#x}", outcome.tx_hash),
            token_input: outcome.token_in_symbol.clone(),
            token_input_amount: outcome.token_in_amount,
            token_input_address: outcome.token_in_address.to_checksum(None),
            token_output: outcome.token_out_symbol.clone(),
            token_output_amount: outcome.token_out_amount,
            token_output_address: outcome.token_out_address.to_checksum(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn test_swap_record_from_outcome() {
        let outcome = SwapOutcome {
            timestamp: NaiveDate::from_ymd_opt(2025, 1, 2)
                .unwrap()
                .and_hms_opt(3, 4, 5)
                .unwrap(),
            tx_hash: B256::repeat_byte(0xab),
            token_in_symbol: "iBGT".to_string(),
            token_in_address: Address::from_str("0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266")
                .unwrap(),
            token_in_amount: Some(Decimal::from_str("1.5").unwrap()),
            token_out_symbol: "HONEY".to_string(),
            token_out_address: Address::from_str("0xfcbd14dc51f0a4d49d5e53c2e0950e0bc26d0dce")
                .unwrap(),
            token_out_amount: Some(Decimal::from_str("0.25").unwrap()),
        };

        let record = SwapRecord::from(&outcome);

        assert_eq!(record.timestamp, "2025-01-02 03:04:05");
        assert_eq!(record.tx_hash, format!("0x{}", "ab".repeat(32)));
        assert_eq!(
            record.token_input_address,
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
        );
        assert_eq!(
            record.token_output_address,
            "0xFCBD14DC51f0A4d49d5E53C2E0950e0bC26d0Dce"
        );

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["token_input_amount"], serde_json::json!(1.5));
        assert_eq!(json["token_output_amount"], serde_json::json!(0.25));
    }

    #[test]
    fn test_unrepresentable_amount_is_written_as_null() {
        let record = SwapRecord {
            timestamp: "2025-01-02 03:04:05".to_string(),
            tx_hash: "0x01".to_string(),
            token_input: "HUGE".to_string(),
            token_input_amount: None,
            token_input_address: "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".to_string(),
            token_output: "HONEY".to_string(),
            token_output_amount: Some(Decimal::ONE),
            token_output_address: "0xFCBD14DC51f0A4d49d5E53C2E0950e0bC26d0Dce".to_string(),
        };

        let json = serde_json::to_value(&record).unwrap();
        assert!(json["token_input_amount"].is_null());

        let decoded: SwapRecord = serde_json::from_value(json).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn test_receipt_status() {
        let ok = TxReceipt {
            tx_hash: B256::ZERO,
            status: 1,
        };
        let reverted = TxReceipt { status: 0, ..ok };

        assert!(ok.is_success());
        assert!(!reverted.is_success());
    }
}
