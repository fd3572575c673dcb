// src/events.rs

use serde::{Deserialize, Serialize};

use crate::amount::decimal_string;
use crate::curve::{TradeDirection, TradeQuote};

pub type TokenId = [u8; 32];
pub type TraderId = [u8; 32];

/// Record of a committed trade, emitted once the new state is stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeEvent {
    /// Position in the recorder's log.
    pub sequence: u64,
    pub token_id: TokenId,
    pub trader: TraderId,
    pub direction: TradeDirection,
    /// Currency paid (buy, gross) or received (sell, after fee).
    #[serde(with = "decimal_string")]
    pub currency_amount: u128,
    /// Tokens received (buy) or given up (sell).
    #[serde(with = "decimal_string")]
    pub token_amount: u128,
    #[serde(with = "decimal_string")]
    pub fee: u128,
    #[serde(with = "decimal_string")]
    pub virtual_currency_reserves: u128,
    #[serde(with = "decimal_string")]
    pub virtual_token_reserves: u128,
    #[serde(with = "decimal_string")]
    pub real_currency_reserves: u128,
    #[serde(with = "decimal_string")]
    pub real_token_reserves: u128,
    pub price_impact: f64,
    pub completes_curve: bool,
}

impl TradeEvent {
    pub fn from_quote(sequence: u64, token_id: TokenId, trader: TraderId, quote: &TradeQuote) -> Self {
        let (currency_amount, token_amount) = match quote.direction {
            TradeDirection::Buy => (quote.amount_in, quote.amount_out),
            TradeDirection::Sell => (quote.amount_out, quote.amount_in),
        };
        let s = &quote.new_state;

        Self {
            sequence,
            token_id,
            trader,
            direction: quote.direction,
            currency_amount,
            token_amount,
            fee: quote.fee,
            virtual_currency_reserves: s.virtual_currency_reserves,
            virtual_token_reserves: s.virtual_token_reserves,
            real_currency_reserves: s.real_currency_reserves,
            real_token_reserves: s.real_token_reserves,
            price_impact: quote.price_impact,
            completes_curve: quote.completes_curve,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self.direction {
            TradeDirection::Buy => "buy",
            TradeDirection::Sell => "sell",
        }
    }
}
