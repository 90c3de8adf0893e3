//! Conversions between raw token amounts (U256) and human-readable Decimals.
//!
//! Raw amounts stay integers end to end; Decimals are only produced for logs and history.

use alloy::primitives::U256;
use rust_decimal::Decimal;
use std::str::FromStr;

use super::ServiceResult;
use super::error::ServiceError;

/// Decimal places kept in human-readable amounts.
pub const HUMAN_DECIMAL_PLACES: u32 = 4;

/// Format a raw amount with `decimals` implied decimal places, trailing zeros removed
///
/// # Examples
/// - 1500000000000000000 with 18 decimals -> "1.5"
/// - 100500000 with 6 decimals -> "100.5"
pub fn format_units(raw: U256, decimals: u8) -> String {
    let digits = raw.to_string();
    let decimals = decimals as usize;
    if decimals == 0 {
        return digits;
    }

    let padded = format!("{digits:0>width$}", width = decimals + 1);
    let (whole, fraction) = padded.split_at(padded.len() - decimals);
    let fraction = fraction.trim_end_matches('0');

    if fraction.is_empty() {
        whole.to_string()
    } else {
        format!("{whole}.{fraction}")
    }
}

/// Convert a raw amount to a Decimal, rounded to [`HUMAN_DECIMAL_PLACES`]
///
/// # Returns
/// `amount / 10^decimals`, rounded half-to-even
pub fn to_human_amount(raw: U256, decimals: u8) -> ServiceResult<Decimal> {
    let formatted = format_units(raw, decimals);

    let value = Decimal::from_str(&formatted).map_err(|e| {
        ServiceError::InvalidAmount(format!("{formatted} does not fit in a Decimal: {e}"))
    })?;

    Ok(value.round_dp(HUMAN_DECIMAL_PLACES).normalize())
}

/// Amount received by a swap, measured as the change in the wallet's balance
///
/// # Returns
/// `round(after - before, 4)` in human units; negative if the balance dropped
pub fn realized_output(before: U256, after: U256, decimals: u8) -> ServiceResult<Decimal> {
    let delta = if after >= before {
        to_human_amount(after - before, decimals)?
    } else {
        -to_human_amount(before - after, decimals)?
    };

    Ok(delta)
}
