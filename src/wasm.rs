// src/wasm.rs

// Browser bindings for trade previews. Amounts cross as decimal strings and
// structured values as JSON, so nothing is squeezed through a JS number.

use wasm_bindgen::prelude::*;

use crate::amount;
use crate::config::CurveConfig;
use crate::curve::{BondingCurve, BondingCurveState};

fn parse_units(value: &str) -> Result<u128, JsError> {
    Ok(value.trim().parse::<u128>()?)
}

#[wasm_bindgen]
pub struct WasmCurve {
    inner: BondingCurve,
}

impl Default for WasmCurve {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl WasmCurve {
    /// Curve with the production constants.
    #[wasm_bindgen(constructor)]
    pub fn new() -> WasmCurve {
        WasmCurve {
            inner: BondingCurve::default(),
        }
    }

    #[wasm_bindgen(js_name = fromConfigJson)]
    pub fn from_config_json(json: &str) -> Result<WasmCurve, JsError> {
        let inner = BondingCurve::new(CurveConfig::from_json(json)?)?;
        Ok(WasmCurve { inner })
    }

    #[wasm_bindgen(js_name = initialState)]
    pub fn initial_state(&self) -> Result<String, JsError> {
        Ok(serde_json::to_string(&self.inner.initial_state())?)
    }

    /// Buy quote as JSON. `currency_in` is in smallest units.
    #[wasm_bindgen(js_name = quoteBuy)]
    pub fn quote_buy(&self, currency_in: &str, state_json: &str) -> Result<String, JsError> {
        let state: BondingCurveState = serde_json::from_str(state_json)?;
        let quote = self.inner.quote_buy(parse_units(currency_in)?, &state)?;
        Ok(serde_json::to_string(&quote)?)
    }

    /// Sell quote as JSON. `tokens_in` is in smallest units.
    #[wasm_bindgen(js_name = quoteSell)]
    pub fn quote_sell(&self, tokens_in: &str, state_json: &str) -> Result<String, JsError> {
        let state: BondingCurveState = serde_json::from_str(state_json)?;
        let quote = self.inner.quote_sell(parse_units(tokens_in)?, &state)?;
        Ok(serde_json::to_string(&quote)?)
    }

    #[wasm_bindgen(js_name = priceInfo)]
    pub fn price_info(&self, state_json: &str) -> Result<String, JsError> {
        let state: BondingCurveState = serde_json::from_str(state_json)?;
        Ok(serde_json::to_string(&self.inner.price_info(&state))?)
    }

    #[wasm_bindgen(js_name = isGraduated)]
    pub fn is_graduated(&self, state_json: &str) -> Result<bool, JsError> {
        let state: BondingCurveState = serde_json::from_str(state_json)?;
        Ok(self.inner.is_graduated(&state))
    }

    /// False for anything that does not parse or breaks the curve invariants.
    pub fn validate(&self, state_json: &str) -> bool {
        serde_json::from_str::<BondingCurveState>(state_json)
            .map(|state| self.inner.validate(&state))
            .unwrap_or(false)
    }

    /// Points for the price chart, as a JSON array.
    #[wasm_bindgen(js_name = sampleCurve)]
    pub fn sample_curve(&self, steps: u32) -> Result<String, JsError> {
        Ok(serde_json::to_string(&self.inner.sample_curve(steps)?)?)
    }
}

#[wasm_bindgen(js_name = parseAmount)]
pub fn parse_amount(value: &str, decimals: u32) -> Result<String, JsError> {
    Ok(amount::parse_amount(value, decimals)?.to_string())
}

#[wasm_bindgen(js_name = formatAmount)]
pub fn format_amount(value: &str, decimals: u32) -> Result<String, JsError> {
    Ok(amount::format_amount(parse_units(value)?, decimals))
}

#[wasm_bindgen(js_name = minAmountOut)]
pub fn min_amount_out(expected: &str, slippage_tolerance_bps: u32) -> Result<String, JsError> {
    Ok(amount::min_amount_out(parse_units(expected)?, slippage_tolerance_bps as u128).to_string())
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use crate::curve::TradeQuote;

    // Only success paths: building a JsError needs a JS host.

    #[test]
    fn quote_buy_through_json() {
        let curve = WasmCurve::new();
        let state = curve.initial_state().unwrap();
        let json = curve.quote_buy("10000000", &state).unwrap();
        let quote: TradeQuote = serde_json::from_str(&json).unwrap();
        assert_eq!(quote.amount_out, 353_973_188_848);
        assert!(curve.validate(&serde_json::to_string(&quote.new_state).unwrap()));
        assert!(!curve.is_graduated(&state).unwrap());
    }

    #[test]
    fn validate_rejects_garbage() {
        assert!(!WasmCurve::new().validate("{}"));
        assert!(!WasmCurve::new().validate("nope"));
    }

    #[test]
    fn amount_helpers() {
        assert_eq!(parse_amount("1.5", 6).unwrap(), "1500000");
        assert_eq!(format_amount("1500000", 6).unwrap(), "1.5");
        assert_eq!(min_amount_out("1000000", 100).unwrap(), "990000");
    }
}
