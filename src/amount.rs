// src/amount.rs

use crate::config::BASIS_POINTS_DENOMINATOR;
use crate::curve::{mul_u256, narrow_u256, U256};
use crate::error::CurveError;

/// Smallest acceptable output for `expected` under a slippage tolerance.
///
/// floor(expected * (10000 - bps) / 10000). A tolerance above 100% accepts anything.
pub fn min_amount_out(expected: u128, slippage_tolerance_bps: u128) -> u128 {
    let keep = BASIS_POINTS_DENOMINATOR.saturating_sub(slippage_tolerance_bps);
    // expected * keep always fits in 256 bits and the quotient never exceeds expected.
    mul_u256(U256::from(expected), U256::from(keep))
        .and_then(|n| narrow_u256(n / U256::from(BASIS_POINTS_DENOMINATOR)))
        .unwrap_or(0)
}

/// Relative shortfall of `actual` against `expected`, in percent.
///
/// Same sign for buys and sells: positive when the trader received less
/// than quoted, negative when they received more.
pub fn slippage_percent(expected: u128, actual: u128) -> f64 {
    if expected == 0 {
        return 0.0;
    }
    (expected as f64 - actual as f64) / expected as f64 * 100.0
}

fn scale_for(decimals: u32) -> Result<u128, CurveError> {
    10u128.checked_pow(decimals).ok_or(CurveError::Overflow)
}

/// Parse a human decimal string ("1.5") into smallest units.
///
/// Extra fractional digits beyond `decimals` are truncated.
pub fn parse_amount(input: &str, decimals: u32) -> Result<u128, CurveError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(CurveError::InvalidFormat("amount cannot be empty".into()));
    }

    let mut parts = trimmed.split('.');
    let whole = parts.next().unwrap_or_default();
    let fraction = parts.next().unwrap_or_default();
    if parts.next().is_some() {
        return Err(CurveError::InvalidFormat(format!(
            "more than one decimal point in {:?}",
            trimmed
        )));
    }
    if whole.is_empty() && fraction.is_empty() {
        return Err(CurveError::InvalidFormat("no digits".into()));
    }
    let digits_only = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if !digits_only(whole) || !digits_only(fraction) {
        return Err(CurveError::InvalidFormat(format!(
            "not a number: {:?}",
            trimmed
        )));
    }

    let scale = scale_for(decimals)?;
    let whole_value = if whole.is_empty() {
        0
    } else {
        // only digits remain, so a parse failure means the value is too large
        whole.parse::<u128>().map_err(|_| CurveError::Overflow)?
    };

    let kept = &fraction[..fraction.len().min(decimals as usize)];
    let fraction_value = if kept.is_empty() {
        0
    } else {
        let pad = scale_for(decimals - kept.len() as u32)?;
        kept.parse::<u128>()
            .map_err(|_| CurveError::Overflow)?
            .checked_mul(pad)
            .ok_or(CurveError::Overflow)?
    };

    whole_value
        .checked_mul(scale)
        .and_then(|v| v.checked_add(fraction_value))
        .ok_or(CurveError::Overflow)
}

/// Render smallest units as a decimal string, trimming trailing zeros.
pub fn format_amount(amount: u128, decimals: u32) -> String {
    let (whole, remainder) = match 10u128.checked_pow(decimals) {
        Some(scale) => (amount / scale, amount % scale),
        // 10^decimals is above u128::MAX, so everything is fractional
        None => (0, amount),
    };

    if remainder == 0 {
        return whole.to_string();
    }

    let padded = format!("{:0>width$}", remainder, width = decimals as usize);
    format!("{}.{}", whole, padded.trim_end_matches('0'))
}

/// Serde adapter writing `u128` amounts as decimal strings, so JSON readers
/// limited to 53-bit numbers keep every digit.
pub mod decimal_string {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse::<u128>().map_err(D::Error::custom)
    }
}

/// [`decimal_string`] for optional amounts; `null` stays `None`.
pub mod optional_decimal_string {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<u128>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => serializer.collect_str(v),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<u128>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|s| s.parse::<u128>().map_err(D::Error::custom))
            .transpose()
    }
}
