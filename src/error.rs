// src/error.rs

use thiserror::Error;

/// Failures returned by the curve engine. None of them are retried internally.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CurveError {
    #[error("amount must be greater than zero")]
    InvalidAmount,

    #[error("insufficient liquidity: trade produces no output")]
    InsufficientLiquidity,

    #[error("insufficient reserves on the curve")]
    InsufficientReserves,

    #[error("invalid amount format: {0}")]
    InvalidFormat(String),

    #[error("target price is on the wrong side of the current price")]
    InvalidTarget,

    #[error("curve has graduated; trade on the liquidity pool instead")]
    CurveGraduated,

    #[error("buy of {actual} is below the minimum of {minimum}")]
    BelowMinimumBuy { minimum: u128, actual: u128 },

    #[error("buy of {actual} is above the maximum of {maximum}")]
    AboveMaximumBuy { maximum: u128, actual: u128 },

    #[error("slippage exceeded: expected at least {expected_min}, got {actual}")]
    SlippageExceeded { expected_min: u128, actual: u128 },

    #[error("invalid curve config: {0}")]
    InvalidConfig(String),

    #[error("arithmetic overflow")]
    Overflow,
}

/// Failures of a full load, quote, commit, record cycle.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeskError {
    #[error(transparent)]
    Curve(#[from] CurveError),

    #[error("stored curve state violates curve invariants")]
    CorruptState,

    #[error("no curve stored for token {0}")]
    UnknownToken(String),

    #[error("token {0} already has a curve")]
    AlreadyLaunched(String),

    #[error("storage error: {0}")]
    Store(String),
}
