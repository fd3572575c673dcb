// src/lib.rs

//! Constant-product bonding curve engine for token launches.
//!
//! Pure integer math over an explicit [`BondingCurveState`]: quotes buys and
//! sells, charges the trading fee, tracks virtual and real reserves, and
//! reports when a curve graduates to a liquidity pool. The same code runs
//! natively and, through [`WasmCurve`], in the browser for trade previews.

pub mod amount;
pub mod config;
mod curve;
pub mod desk;
mod error;
pub mod events;
mod search;
mod wasm;

pub use crate::amount::{format_amount, min_amount_out, parse_amount, slippage_percent};
pub use crate::config::CurveConfig;
pub use crate::curve::{
    BondingCurve, BondingCurveState, CurveSnapshot, PriceInfo, TradeDirection, TradeIntent,
    TradeQuote, U256,
};
pub use crate::desk::{
    CurveStore, InMemoryCurveStore, InMemoryTradeLog, TradeDesk, TradeRecorder, TraderStats,
};
pub use crate::error::{CurveError, DeskError};
pub use crate::events::{TokenId, TradeEvent, TraderId};
pub use crate::search::{MAX_SEARCH_ITERATIONS, PRICE_TOLERANCE};
pub use crate::wasm::WasmCurve;
