// Property-Based Testing with Proptest
// Run with: cargo test --test curve_properties

use launchcurve::*;
use proptest::prelude::*;

const PREFIX_MAX: u64 = 80_000_000_000; // stays below the graduation threshold

fn curve() -> BondingCurve {
    BondingCurve::default()
}

/// Tokens a holder can sell: what left the curve, capped by what it still holds.
fn sellable(s: &BondingCurveState) -> u128 {
    (s.initial_virtual_token_reserves - s.virtual_token_reserves).min(s.real_token_reserves)
}

/// A state some buys into the curve.
fn state_after(prefix: u64) -> BondingCurveState {
    let c = curve();
    let s = c.initial_state();
    if prefix == 0 {
        return s;
    }
    c.quote_buy(prefix as u128, &s).unwrap().new_state
}

// ============================================================
// CONSERVATION
// ============================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Property: a buy shrinks k by less than one unit of X'
    #[test]
    fn prop_buy_conserves_k(prefix in 0u64..PREFIX_MAX, amount in 1u64..10_000_000_000) {
        let c = curve();
        let s = state_after(prefix);
        let q = c.quote_buy(amount as u128, &s).unwrap();

        let k = s.k();
        let k2 = q.new_state.k();
        prop_assert!(k2 <= k);
        prop_assert!(k - k2 < U256::from(q.new_state.virtual_currency_reserves));
    }

    /// Property: a sell shrinks k by less than one unit of Y'
    #[test]
    fn prop_sell_conserves_k(prefix in 1_000_000u64..PREFIX_MAX, share in 1u64..1_000) {
        let c = curve();
        let s = state_after(prefix);
        let tokens = (sellable(&s) * share as u128 / 1_000).max(1);
        let q = c.quote_sell(tokens, &s).unwrap();

        let k = s.k();
        let k2 = q.new_state.k();
        prop_assert!(k2 <= k);
        prop_assert!(k - k2 < U256::from(q.new_state.virtual_token_reserves));
    }
}

// ============================================================
// ROUND TRIP
// ============================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Property: buying then selling everything back never returns more,
    /// as long as the fee takes at least one unit
    #[test]
    fn prop_round_trip_never_profits(prefix in 1u64..PREFIX_MAX, amount in 100u64..5_000_000_000) {
        let c = curve();
        let s = state_after(prefix);
        let bought = c.quote_buy(amount as u128, &s).unwrap();
        let sold = c.quote_sell(bought.amount_out, &bought.new_state).unwrap();

        prop_assert!(sold.amount_out <= amount as u128);
        prop_assert_eq!(sold.new_state.virtual_token_reserves, s.virtual_token_reserves);
        // floor on the sell can pay back one unit more than the buy put in
        prop_assert!(sold.new_state.real_currency_reserves + 1 >= s.real_currency_reserves);
    }
}

// ============================================================
// MONOTONICITY
// ============================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Property: a larger buy moves the price further up
    #[test]
    fn prop_buy_impact_increases(
        prefix in 0u64..PREFIX_MAX,
        a in 1u64..2_000_000_000,
        extra in 100u64..2_000_000_000
    ) {
        let c = curve();
        let s = state_after(prefix);
        let small = c.quote_buy(a as u128, &s).unwrap();
        let large = c.quote_buy(a as u128 + extra as u128, &s).unwrap();

        prop_assert!(small.price_impact > 0.0);
        prop_assert!(large.price_impact > small.price_impact);
        prop_assert!(large.amount_out >= small.amount_out);
    }

    /// Property: a larger sell moves the price further down
    #[test]
    fn prop_sell_price_decreases(
        prefix in 1_000_000_000u64..PREFIX_MAX,
        a in 1u64..500,
        extra in 1u64..500
    ) {
        let c = curve();
        let s = state_after(prefix);
        let held = sellable(&s);
        let small_amt = held * a as u128 / 1_000;
        let large_amt = held * (a + extra) as u128 / 1_000;

        let small = c.quote_sell(small_amt, &s).unwrap();
        let large = c.quote_sell(large_amt, &s).unwrap();
        prop_assert!(small.price_impact < 0.0);
        prop_assert!(large.price_impact < small.price_impact);
        prop_assert!(c.current_price(&large.new_state) < c.current_price(&small.new_state));
    }
}

// ============================================================
// INVARIANTS
// ============================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property: every state reached through quotes validates
    #[test]
    fn prop_trades_preserve_invariants(
        steps in prop::collection::vec((any::<bool>(), 1u64..5_000_000_000), 1..30)
    ) {
        let c = curve();
        let mut s = c.initial_state();
        prop_assert!(c.validate(&s));

        for (is_buy, amount) in steps {
            let result = if is_buy {
                c.quote_buy(amount as u128, &s)
            } else {
                c.quote_sell((amount as u128).min(sellable(&s)).max(1), &s)
            };
            match result {
                Ok(q) => {
                    prop_assert!(c.validate(&q.new_state));
                    s = q.new_state;
                }
                Err(CurveError::CurveGraduated) => break,
                // dust sells pay nothing; sells on an empty curve have no currency
                Err(CurveError::InsufficientLiquidity) | Err(CurveError::InsufficientReserves) => {}
                Err(e) => prop_assert!(false, "unexpected error {:?}", e),
            }
        }
    }
}

// ============================================================
// AMOUNTS
// ============================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    /// Property: parse(format(n)) = n
    #[test]
    fn prop_format_round_trip(n in any::<u128>(), decimals in 0u32..=18) {
        prop_assert_eq!(parse_amount(&format_amount(n, decimals), decimals).unwrap(), n);
    }

    /// Property: a trade passes the slippage check iff it pays at least min_amount_out
    #[test]
    fn prop_slippage_floor(
        amount in 1u64..10_000_000_000,
        expected in 0u64..2_000_000_000_000_000,
        bps in 0u32..=10_000
    ) {
        let c = curve();
        let s = c.initial_state();
        let actual = c.quote_buy(amount as u128, &s).unwrap().amount_out;
        let floor = min_amount_out(expected as u128, bps as u128);

        let intent = TradeIntent::buy(amount as u128).with_slippage(expected as u128, bps);
        let result = c.quote(&intent, &s);
        prop_assert_eq!(result.is_ok(), actual >= floor);
        prop_assert!(floor <= expected as u128);
    }
}
