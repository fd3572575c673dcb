// src/config.rs

use serde::{Deserialize, Serialize};

use crate::error::CurveError;

/// Fee charged on every trade, in basis points (1%).
pub const FEE_BASIS_POINTS: u128 = 100;
pub const BASIS_POINTS_DENOMINATOR: u128 = 10_000;

/// Real currency reserves at which the curve is complete (85 units at 9 decimals).
pub const GRADUATION_THRESHOLD: u128 = 85_000_000_000;

/// Total token supply: 1B tokens at 6 decimals.
pub const MAX_SUPPLY: u128 = 1_000_000_000_000_000;

pub const TOKEN_DECIMALS: u32 = 6;
pub const CURRENCY_DECIMALS: u32 = 9;

pub const INITIAL_VIRTUAL_CURRENCY_RESERVES: u128 = 30_000_000_000;
pub const INITIAL_VIRTUAL_TOKEN_RESERVES: u128 = 1_073_000_000_000_000;

/// Small buy (0.01 units) used to show where the price drifts next.
pub const REFERENCE_BUY: u128 = 10_000_000;

/// Per-trade bounds on the gross currency of a buy. The defaults leave buys unbounded.
pub const MIN_BUY: u128 = 1;
pub const MAX_BUY: u128 = u128::MAX;

/// Upper bound on the decimals a `u128` can scale by.
pub const MAX_DECIMALS: u32 = 38;

/// Deployment configuration for a curve.
///
/// Fixed per deployment: callers never pass these at trade time. `Default`
/// yields the production constants above; other deployments load theirs
/// from JSON with [`CurveConfig::from_json`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurveConfig {
    pub fee_bps: u128,
    pub graduation_threshold: u128,
    pub max_supply: u128,
    pub token_decimals: u32,
    pub currency_decimals: u32,
    pub initial_virtual_currency_reserves: u128,
    pub initial_virtual_token_reserves: u128,
    pub reference_buy: u128,
    pub min_buy: u128,
    pub max_buy: u128,
}

impl Default for CurveConfig {
    fn default() -> Self {
        Self {
            fee_bps: FEE_BASIS_POINTS,
            graduation_threshold: GRADUATION_THRESHOLD,
            max_supply: MAX_SUPPLY,
            token_decimals: TOKEN_DECIMALS,
            currency_decimals: CURRENCY_DECIMALS,
            initial_virtual_currency_reserves: INITIAL_VIRTUAL_CURRENCY_RESERVES,
            initial_virtual_token_reserves: INITIAL_VIRTUAL_TOKEN_RESERVES,
            reference_buy: REFERENCE_BUY,
            min_buy: MIN_BUY,
            max_buy: MAX_BUY,
        }
    }
}

impl CurveConfig {
    /// Parse a config from JSON. Missing fields take their default value.
    pub fn from_json(json: &str) -> Result<Self, CurveError> {
        let cfg: CurveConfig = serde_json::from_str(json)
            .map_err(|e| CurveError::InvalidConfig(e.to_string()))?;
        cfg.check()?;
        Ok(cfg)
    }

    /// Reject configurations that cannot produce a valid initial state.
    pub fn check(&self) -> Result<(), CurveError> {
        if self.initial_virtual_currency_reserves == 0 || self.initial_virtual_token_reserves == 0 {
            return Err(CurveError::InvalidConfig(
                "initial virtual reserves must be positive".into(),
            ));
        }
        if self.max_supply == 0 || self.max_supply >= self.initial_virtual_token_reserves {
            return Err(CurveError::InvalidConfig(
                "max supply must be below the initial virtual token reserves".into(),
            ));
        }
        if self.fee_bps >= BASIS_POINTS_DENOMINATOR {
            return Err(CurveError::InvalidConfig(format!(
                "fee of {} bps leaves nothing to trade",
                self.fee_bps
            )));
        }
        if self.graduation_threshold == 0 {
            return Err(CurveError::InvalidConfig(
                "graduation threshold must be positive".into(),
            ));
        }
        if self.token_decimals > MAX_DECIMALS || self.currency_decimals > MAX_DECIMALS {
            return Err(CurveError::InvalidConfig(format!(
                "decimals above {} do not fit in u128",
                MAX_DECIMALS
            )));
        }
        if self.reference_buy == 0 {
            return Err(CurveError::InvalidConfig(
                "reference buy must be positive".into(),
            ));
        }
        if self.min_buy == 0 || self.min_buy > self.max_buy {
            return Err(CurveError::InvalidConfig(format!(
                "buy bounds [{}, {}] are empty",
                self.min_buy, self.max_buy
            )));
        }
        Ok(())
    }

    /// Fee in smallest units for a gross amount, rounded down.
    #[inline]
    pub fn fee_on(&self, amount: u128) -> Result<u128, CurveError> {
        amount
            .checked_mul(self.fee_bps)
            .map(|v| v / BASIS_POINTS_DENOMINATOR)
            .ok_or(CurveError::Overflow)
    }
}
