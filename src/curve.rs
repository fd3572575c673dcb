// src/curve.rs

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uint::construct_uint;

use crate::amount::{decimal_string, min_amount_out, optional_decimal_string};
use crate::config::CurveConfig;
use crate::error::CurveError;

construct_uint! {
    /// Minimal fixed-width 256-bit integer used for precise intermediate math.
    pub struct U256(4);
}

pub(crate) fn mul_u256(a: U256, b: U256) -> Result<U256, CurveError> {
    let (res, overflow) = a.overflowing_mul(b);
    if overflow {
        Err(CurveError::Overflow)
    } else {
        Ok(res)
    }
}

pub(crate) fn narrow_u256(value: U256) -> Result<u128, CurveError> {
    if value.bits() > 128 {
        Err(CurveError::Overflow)
    } else {
        Ok(value.low_u128())
    }
}

/// Reserve snapshot of one token's curve. All amounts are in smallest units.
///
/// Virtual reserves shape the price; real reserves are what actually backs
/// the curve. The engine never mutates a state, it returns the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BondingCurveState {
    #[serde(with = "decimal_string")]
    pub virtual_currency_reserves: u128,
    #[serde(with = "decimal_string")]
    pub virtual_token_reserves: u128,
    #[serde(with = "decimal_string")]
    pub real_currency_reserves: u128,
    #[serde(with = "decimal_string")]
    pub real_token_reserves: u128,
    #[serde(with = "decimal_string")]
    pub initial_virtual_currency_reserves: u128,
    #[serde(with = "decimal_string")]
    pub initial_virtual_token_reserves: u128,
}

impl BondingCurveState {
    /// Constant product `k = X * Y` of the virtual reserves.
    #[inline]
    pub fn k(&self) -> U256 {
        U256::from(self.virtual_currency_reserves) * U256::from(self.virtual_token_reserves)
    }

    /// Tokens that have left the curve, `None` if real reserves exceed `max_supply`.
    #[inline]
    pub fn circulating_supply(&self, max_supply: u128) -> Option<u128> {
        max_supply.checked_sub(self.real_token_reserves)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeDirection {
    Buy,
    Sell,
}

impl std::fmt::Display for TradeDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeDirection::Buy => write!(f, "buy"),
            TradeDirection::Sell => write!(f, "sell"),
        }
    }
}

/// What a trader asks for.
///
/// `amount` is currency for a buy and tokens for a sell. When `expected_out`
/// is set, the quote is rejected if it pays less than
/// `min_amount_out(expected_out, slippage_tolerance_bps)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeIntent {
    pub direction: TradeDirection,
    #[serde(with = "decimal_string")]
    pub amount: u128,
    pub slippage_tolerance_bps: u32,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "optional_decimal_string"
    )]
    pub expected_out: Option<u128>,
}

impl TradeIntent {
    pub fn buy(currency_in: u128) -> Self {
        Self {
            direction: TradeDirection::Buy,
            amount: currency_in,
            slippage_tolerance_bps: 0,
            expected_out: None,
        }
    }

    pub fn sell(tokens_in: u128) -> Self {
        Self {
            direction: TradeDirection::Sell,
            amount: tokens_in,
            slippage_tolerance_bps: 0,
            expected_out: None,
        }
    }

    pub fn with_slippage(mut self, expected_out: u128, tolerance_bps: u32) -> Self {
        self.expected_out = Some(expected_out);
        self.slippage_tolerance_bps = tolerance_bps;
        self
    }
}

/// Result of pricing one trade against a state. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradeQuote {
    pub direction: TradeDirection,
    /// Gross amount paid in: currency for buys, tokens for sells.
    #[serde(with = "decimal_string")]
    pub amount_in: u128,
    /// Net amount the trader receives: tokens for buys, currency after fee for sells.
    #[serde(with = "decimal_string")]
    pub amount_out: u128,
    /// Fee in currency smallest units.
    #[serde(with = "decimal_string")]
    pub fee: u128,
    pub new_state: BondingCurveState,
    /// Percent change of the spot price caused by the trade.
    pub price_impact: f64,
    /// The new state meets the graduation threshold.
    pub completes_curve: bool,
}

/// Display figures for a curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceInfo {
    pub current_price: f64,
    pub market_cap: f64,
    pub progress: f64,
    pub next_price: f64,
}

/// A point on the curve after `tokens_sold` tokens left it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveSnapshot {
    #[serde(with = "decimal_string")]
    pub tokens_sold: u128,
    #[serde(with = "decimal_string")]
    pub virtual_currency_reserves: u128,
    #[serde(with = "decimal_string")]
    pub virtual_token_reserves: u128,
    pub price: f64,
    pub market_cap: f64,
}

/// Constant-product bonding curve with virtual reserves.
///
/// Invariant: X * Y = k, up to one unit of rounding per trade
/// Where:
///   - X is the virtual currency reserve
///   - Y is the virtual token reserve
///
/// Buys add the net currency to X and take `Y - floor(k / X')` tokens out.
/// Sells add tokens to Y and pay `X - floor(k / Y')` minus the fee.
///
/// Every trade moves X and the real currency reserve by the same amount,
/// and Y and the real token reserve by the same amount, so
/// `X - real_currency` and `Y - real_tokens` are fixed at launch.
#[derive(Debug, Clone, Default)]
pub struct BondingCurve {
    config: CurveConfig,
}

impl BondingCurve {
    /// Construct from a deployment config.
    pub fn new(config: CurveConfig) -> Result<Self, CurveError> {
        config.check()?;
        Ok(Self { config })
    }

    #[inline]
    pub fn config(&self) -> &CurveConfig {
        &self.config
    }

    /// Fresh state for a newly launched token.
    pub fn initial_state(&self) -> BondingCurveState {
        BondingCurveState {
            virtual_currency_reserves: self.config.initial_virtual_currency_reserves,
            virtual_token_reserves: self.config.initial_virtual_token_reserves,
            real_currency_reserves: 0,
            real_token_reserves: self.config.max_supply,
            initial_virtual_currency_reserves: self.config.initial_virtual_currency_reserves,
            initial_virtual_token_reserves: self.config.initial_virtual_token_reserves,
        }
    }

    /// Buy tokens with `currency_in` (gross, fee included).
    pub fn quote_buy(
        &self,
        currency_in: u128,
        state: &BondingCurveState,
    ) -> Result<TradeQuote, CurveError> {
        if self.is_graduated(state) {
            return Err(CurveError::CurveGraduated);
        }
        if currency_in == 0 {
            return Err(CurveError::InvalidAmount);
        }
        if currency_in < self.config.min_buy {
            return Err(CurveError::BelowMinimumBuy {
                minimum: self.config.min_buy,
                actual: currency_in,
            });
        }
        if currency_in > self.config.max_buy {
            return Err(CurveError::AboveMaximumBuy {
                maximum: self.config.max_buy,
                actual: currency_in,
            });
        }

        let fee = self.config.fee_on(currency_in)?;
        let net_in = currency_in
            .checked_sub(fee)
            .ok_or(CurveError::Overflow)?;

        // X' = X + net, Y' = floor(k / X')
        let k = state.k();
        let new_currency = state
            .virtual_currency_reserves
            .checked_add(net_in)
            .ok_or(CurveError::Overflow)?;
        let new_tokens = narrow_u256(k / U256::from(new_currency))?;

        let tokens_out = state.virtual_token_reserves.saturating_sub(new_tokens);
        if tokens_out == 0 {
            return Err(CurveError::InsufficientLiquidity);
        }
        if tokens_out > state.real_token_reserves {
            return Err(CurveError::InsufficientReserves);
        }

        let new_state = BondingCurveState {
            virtual_currency_reserves: new_currency,
            virtual_token_reserves: new_tokens,
            real_currency_reserves: state
                .real_currency_reserves
                .checked_add(net_in)
                .ok_or(CurveError::Overflow)?,
            real_token_reserves: state.real_token_reserves - tokens_out,
            ..*state
        };

        let quote = TradeQuote {
            direction: TradeDirection::Buy,
            amount_in: currency_in,
            amount_out: tokens_out,
            fee,
            new_state,
            price_impact: self.price_impact(state, &new_state),
            completes_curve: self.is_graduated(&new_state),
        };
        debug!(
            "buy quote: {} in, {} tokens out, fee {}, impact {:.4}%",
            currency_in, tokens_out, fee, quote.price_impact
        );
        Ok(quote)
    }

    /// Sell `tokens_in` back to the curve. The fee comes out of the payout.
    pub fn quote_sell(
        &self,
        tokens_in: u128,
        state: &BondingCurveState,
    ) -> Result<TradeQuote, CurveError> {
        if self.is_graduated(state) {
            return Err(CurveError::CurveGraduated);
        }
        if tokens_in == 0 {
            return Err(CurveError::InvalidAmount);
        }
        if tokens_in > state.real_token_reserves {
            return Err(CurveError::InsufficientReserves);
        }

        // Y' = Y + tokens, X' = floor(k / Y')
        let k = state.k();
        let new_tokens = state
            .virtual_token_reserves
            .checked_add(tokens_in)
            .ok_or(CurveError::Overflow)?;
        let new_currency = narrow_u256(k / U256::from(new_tokens))?;

        let currency_out = state.virtual_currency_reserves.saturating_sub(new_currency);
        if currency_out == 0 {
            return Err(CurveError::InsufficientLiquidity);
        }
        if currency_out > state.real_currency_reserves {
            return Err(CurveError::InsufficientReserves);
        }

        let fee = self.config.fee_on(currency_out)?;
        let net_out = currency_out - fee;

        let new_state = BondingCurveState {
            virtual_currency_reserves: new_currency,
            virtual_token_reserves: new_tokens,
            real_currency_reserves: state.real_currency_reserves - currency_out,
            real_token_reserves: state
                .real_token_reserves
                .checked_add(tokens_in)
                .ok_or(CurveError::Overflow)?,
            ..*state
        };

        let quote = TradeQuote {
            direction: TradeDirection::Sell,
            amount_in: tokens_in,
            amount_out: net_out,
            fee,
            new_state,
            price_impact: self.price_impact(state, &new_state),
            completes_curve: self.is_graduated(&new_state),
        };
        debug!(
            "sell quote: {} tokens in, {} out, fee {}, impact {:.4}%",
            tokens_in, net_out, fee, quote.price_impact
        );
        Ok(quote)
    }

    /// Price an intent and enforce its slippage floor.
    pub fn quote(
        &self,
        intent: &TradeIntent,
        state: &BondingCurveState,
    ) -> Result<TradeQuote, CurveError> {
        let quote = match intent.direction {
            TradeDirection::Buy => self.quote_buy(intent.amount, state)?,
            TradeDirection::Sell => self.quote_sell(intent.amount, state)?,
        };

        if let Some(expected) = intent.expected_out {
            let floor = min_amount_out(expected, u128::from(intent.slippage_tolerance_bps));
            if quote.amount_out < floor {
                return Err(CurveError::SlippageExceeded {
                    expected_min: floor,
                    actual: quote.amount_out,
                });
            }
        }
        Ok(quote)
    }

    /// Apply intents one after another, each on the state the previous one produced.
    pub fn simulate(
        &self,
        intents: &[TradeIntent],
        state: &BondingCurveState,
    ) -> Result<Vec<TradeQuote>, CurveError> {
        let mut current = *state;
        let mut results = Vec::with_capacity(intents.len());

        for intent in intents {
            let quote = self.quote(intent, &current)?;
            current = quote.new_state;
            results.push(quote);
        }

        Ok(results)
    }

    /// Spot price in major currency units per whole token.
    pub fn current_price(&self, state: &BondingCurveState) -> f64 {
        let currency =
            state.virtual_currency_reserves as f64 / 10f64.powi(self.config.currency_decimals as i32);
        let tokens =
            state.virtual_token_reserves as f64 / 10f64.powi(self.config.token_decimals as i32);

        if tokens == 0.0 {
            return 0.0;
        }
        currency / tokens
    }

    fn price_impact(&self, before: &BondingCurveState, after: &BondingCurveState) -> f64 {
        let old_price = self.current_price(before);
        if old_price == 0.0 {
            return 0.0;
        }
        let new_price = self.current_price(after);
        (new_price - old_price) / old_price * 100.0
    }

    pub fn price_info(&self, state: &BondingCurveState) -> PriceInfo {
        let current_price = self.current_price(state);
        let circulating = state
            .circulating_supply(self.config.max_supply)
            .unwrap_or(0);
        let market_cap =
            current_price * (circulating as f64 / 10f64.powi(self.config.token_decimals as i32));

        let progress = (state.real_currency_reserves as f64
            / self.config.graduation_threshold as f64
            * 100.0)
            .min(100.0);

        // Display only: a failed reference buy just means there is no upward drift to show.
        let next_price = match self.quote_buy(self.config.reference_buy, state) {
            Ok(quote) => self.current_price(&quote.new_state),
            Err(_) => current_price,
        };

        PriceInfo {
            current_price,
            market_cap,
            progress,
            next_price,
        }
    }

    /// Real currency reserves reached the graduation threshold.
    #[inline]
    pub fn is_graduated(&self, state: &BondingCurveState) -> bool {
        state.real_currency_reserves >= self.config.graduation_threshold
    }

    /// Fully diluted value in smallest currency units: floor(X * max_supply / Y).
    pub fn fully_diluted_value(&self, state: &BondingCurveState) -> Result<u128, CurveError> {
        if state.virtual_token_reserves == 0 {
            return Err(CurveError::InsufficientLiquidity);
        }

        let num = mul_u256(
            U256::from(state.virtual_currency_reserves),
            U256::from(self.config.max_supply),
        )?;
        narrow_u256(num / U256::from(state.virtual_token_reserves))
    }

    /// Largest gross buy the curve can fill without running out of real tokens,
    /// capped at the configured maximum buy.
    pub fn max_buy_input(&self, state: &BondingCurveState) -> Result<u128, CurveError> {
        // Y never drops below the virtual-only part Y - real.
        let floor_tokens = state
            .virtual_token_reserves
            .saturating_sub(state.real_token_reserves);
        if floor_tokens == 0 {
            return Err(CurveError::InsufficientReserves);
        }

        // Largest X' with floor(k / X') >= floor_tokens.
        let max_currency = narrow_u256(state.k() / U256::from(floor_tokens))?;
        let max_net = max_currency.saturating_sub(state.virtual_currency_reserves);
        if max_net == 0 {
            return Ok(0);
        }

        let net_of = |gross: u128| -> Result<u128, CurveError> {
            Ok(gross - self.config.fee_on(gross)?)
        };

        // gross ~= net * 10000 / (10000 - fee), then settle the rounding.
        let keep = crate::config::BASIS_POINTS_DENOMINATOR - self.config.fee_bps;
        let mut gross = narrow_u256(
            mul_u256(
                U256::from(max_net),
                U256::from(crate::config::BASIS_POINTS_DENOMINATOR),
            )? / U256::from(keep),
        )?;
        while gross > 0 && net_of(gross)? > max_net {
            gross -= 1;
        }
        while let Some(next) = gross.checked_add(1) {
            if net_of(next)? > max_net {
                break;
            }
            gross = next;
        }
        Ok(gross.min(self.config.max_buy))
    }

    /// Curve point after `tokens_sold` tokens left the initial curve.
    pub fn snapshot_at(
        &self,
        tokens_sold: u128,
        initial: &BondingCurveState,
    ) -> Result<CurveSnapshot, CurveError> {
        if tokens_sold > self.config.max_supply {
            return Err(CurveError::InsufficientReserves);
        }

        let y = initial
            .initial_virtual_token_reserves
            .checked_sub(tokens_sold)
            .ok_or(CurveError::InsufficientReserves)?;
        if y == 0 {
            return Err(CurveError::InsufficientReserves);
        }

        let k0 = mul_u256(
            U256::from(initial.initial_virtual_currency_reserves),
            U256::from(initial.initial_virtual_token_reserves),
        )?;
        let x = narrow_u256(k0 / U256::from(y))?;

        let point = BondingCurveState {
            virtual_currency_reserves: x,
            virtual_token_reserves: y,
            real_currency_reserves: 0,
            real_token_reserves: self.config.max_supply - tokens_sold,
            ..*initial
        };
        let price = self.current_price(&point);

        Ok(CurveSnapshot {
            tokens_sold,
            virtual_currency_reserves: x,
            virtual_token_reserves: y,
            price,
            market_cap: price * (tokens_sold as f64 / 10f64.powi(self.config.token_decimals as i32)),
        })
    }

    /// `steps + 1` evenly spaced points from zero to the full supply sold.
    pub fn sample_curve(&self, steps: u32) -> Result<Vec<CurveSnapshot>, CurveError> {
        if steps == 0 {
            return Err(CurveError::InvalidAmount);
        }

        let initial = self.initial_state();
        let mut points = Vec::with_capacity(steps as usize + 1);
        for i in 0..=steps {
            let sold = narrow_u256(
                mul_u256(U256::from(self.config.max_supply), U256::from(i))? / U256::from(steps),
            )?;
            match self.snapshot_at(sold, &initial) {
                Ok(point) => points.push(point),
                Err(CurveError::InsufficientReserves) => break,
                Err(e) => return Err(e),
            }
        }
        Ok(points)
    }

    /// Check the state invariants. Never errors; logs the first failed check.
    ///
    /// Stricter than the bare reserve bounds: the virtual-only parts
    /// `X - real_currency` and `Y - real_tokens` must still equal the ones this
    /// curve launched with, so a state that is self-consistent but was never
    /// reachable from `initial_state` by trading is rejected too.
    pub fn validate(&self, state: &BondingCurveState) -> bool {
        if state.virtual_currency_reserves == 0 || state.virtual_token_reserves == 0 {
            warn!("curve state rejected: virtual reserves must be positive");
            return false;
        }
        if state.initial_virtual_currency_reserves == 0 || state.initial_virtual_token_reserves == 0 {
            warn!("curve state rejected: initial virtual reserves must be positive");
            return false;
        }
        if state.real_currency_reserves > state.virtual_currency_reserves {
            warn!(
                "curve state rejected: real currency {} exceeds virtual {}",
                state.real_currency_reserves, state.virtual_currency_reserves
            );
            return false;
        }
        if state.real_token_reserves > state.virtual_token_reserves {
            warn!(
                "curve state rejected: real tokens {} exceed virtual {}",
                state.real_token_reserves, state.virtual_token_reserves
            );
            return false;
        }

        // The virtual-only parts of both reserves never change after launch.
        let currency_base = state.virtual_currency_reserves - state.real_currency_reserves;
        let token_base = state.virtual_token_reserves - state.real_token_reserves;
        let launch_token_base = state
            .initial_virtual_token_reserves
            .checked_sub(self.config.max_supply);
        if currency_base != state.initial_virtual_currency_reserves
            || Some(token_base) != launch_token_base
        {
            warn!(
                "curve state rejected: reserves drifted from the launch curve ({} / {})",
                currency_base, token_base
            );
            return false;
        }

        if state.circulating_supply(self.config.max_supply).is_none() {
            warn!(
                "curve state rejected: real tokens {} exceed max supply {}",
                state.real_token_reserves, self.config.max_supply
            );
            return false;
        }

        true
    }

    /// Log the moment a committed state crosses the threshold.
    pub(crate) fn note_graduation(&self, quote: &TradeQuote) {
        if quote.completes_curve {
            info!(
                "curve complete: real currency reserves {} reached threshold {}",
                quote.new_state.real_currency_reserves, self.config.graduation_threshold
            );
        }
    }
}
