// src/search.rs

use tracing::debug;

use crate::curve::{BondingCurve, BondingCurveState, TradeDirection, TradeQuote};
use crate::error::CurveError;

/// Iteration cap for the target-price search.
pub const MAX_SEARCH_ITERATIONS: usize = 100;

/// Relative distance to the target price that counts as reached (0.1%).
pub const PRICE_TOLERANCE: f64 = 0.001;

impl BondingCurve {
    /// Trade size that moves the spot price to within 0.1% of `target_price`.
    ///
    /// Buys need a target strictly above the current price, sells one strictly
    /// below. Returns `None` when no amount in range gets close enough within
    /// the iteration cap. Approximate: display and planning only.
    pub fn amount_to_reach_price(
        &self,
        target_price: f64,
        state: &BondingCurveState,
        direction: TradeDirection,
    ) -> Result<Option<u128>, CurveError> {
        if self.is_graduated(state) {
            return Err(CurveError::CurveGraduated);
        }
        if !target_price.is_finite() || target_price <= 0.0 {
            return Err(CurveError::InvalidTarget);
        }

        let current = self.current_price(state);
        let wrong_side = match direction {
            TradeDirection::Buy => target_price <= current,
            TradeDirection::Sell => target_price >= current,
        };
        if wrong_side {
            return Err(CurveError::InvalidTarget);
        }

        let mut lo = match direction {
            TradeDirection::Buy => self.config().min_buy,
            TradeDirection::Sell => 1,
        };
        let mut hi = match direction {
            TradeDirection::Buy => self.max_buy_input(state)?,
            TradeDirection::Sell => state.real_token_reserves,
        };

        for _ in 0..MAX_SEARCH_ITERATIONS {
            if lo > hi {
                break;
            }
            let mid = lo + (hi - lo) / 2;

            match self.oracle(direction, mid, state) {
                Ok(quote) => {
                    let price = self.current_price(&quote.new_state);
                    if (price - target_price).abs() / target_price < PRICE_TOLERANCE {
                        debug!("price {} reached with {} {}", target_price, direction, mid);
                        return Ok(Some(mid));
                    }
                    let short = match direction {
                        TradeDirection::Buy => price < target_price,
                        TradeDirection::Sell => price > target_price,
                    };
                    if short {
                        lo = mid + 1;
                    } else {
                        hi = mid - 1;
                    }
                }
                // too small to move the curve
                Err(CurveError::InsufficientLiquidity) => lo = mid + 1,
                // too large for what the curve holds
                Err(CurveError::InsufficientReserves) => hi = mid - 1,
                Err(e) => return Err(e),
            }
        }

        Ok(None)
    }

    /// Smallest gross currency input whose buy yields at least `tokens_out`.
    pub fn currency_in_for_tokens(
        &self,
        tokens_out: u128,
        state: &BondingCurveState,
    ) -> Result<u128, CurveError> {
        if self.is_graduated(state) {
            return Err(CurveError::CurveGraduated);
        }
        if tokens_out == 0 {
            return Err(CurveError::InvalidAmount);
        }
        if tokens_out > state.real_token_reserves {
            return Err(CurveError::InsufficientReserves);
        }

        let min_quote = self.config().min_buy;
        let max_quote = self.max_buy_input(state)?;
        if max_quote < min_quote {
            return Err(CurveError::InsufficientReserves);
        }

        // tokens out is non-decreasing in the gross input
        let mut lo = min_quote;
        let mut hi = max_quote;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            match self.quote_buy(mid, state) {
                Ok(q) if q.amount_out >= tokens_out => hi = mid,
                Ok(_) | Err(CurveError::InsufficientLiquidity) => lo = mid + 1,
                Err(e) => return Err(e),
            }
        }

        if self.quote_buy(lo, state)?.amount_out < tokens_out {
            return Err(CurveError::InsufficientReserves);
        }
        Ok(lo)
    }

    fn oracle(
        &self,
        direction: TradeDirection,
        amount: u128,
        state: &BondingCurveState,
    ) -> Result<TradeQuote, CurveError> {
        match direction {
            TradeDirection::Buy => self.quote_buy(amount, state),
            TradeDirection::Sell => self.quote_sell(amount, state),
        }
    }
}
