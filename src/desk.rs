// src/desk.rs
//
// Boundary between the pure engine and whatever holds curve state.
//
// Trades on one token must run load -> quote -> commit as one exclusive
// step. `TradeDesk::execute` takes `&mut self`, so a desk shared between
// threads has to sit behind a lock, which gives exactly that.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::curve::{BondingCurve, BondingCurveState, TradeDirection, TradeIntent, TradeQuote};
use crate::error::DeskError;
use crate::events::{TokenId, TradeEvent, TraderId};

/// Storage or chain accessor for curve state.
pub trait CurveStore {
    /// `DeskError::UnknownToken` when nothing is stored for the token; any
    /// other error means the store could not answer.
    fn load_curve_state(&self, token_id: &TokenId) -> Result<BondingCurveState, DeskError>;

    fn commit_curve_state(
        &mut self,
        token_id: &TokenId,
        state: BondingCurveState,
    ) -> Result<(), DeskError>;
}

/// Sink for committed trades. Called only after the commit succeeded.
pub trait TradeRecorder {
    fn record_trade(&mut self, token_id: &TokenId, quote: &TradeQuote, trader: &TraderId);
}

pub(crate) fn short_id(id: &[u8; 32]) -> String {
    id.iter().take(4).map(|b| format!("{:02x}", b)).collect()
}

/// Runs trades against stored curves.
pub struct TradeDesk<S, R> {
    curve: BondingCurve,
    store: S,
    recorder: R,
}

impl<S: CurveStore, R: TradeRecorder> TradeDesk<S, R> {
    pub fn new(curve: BondingCurve, store: S, recorder: R) -> Self {
        Self {
            curve,
            store,
            recorder,
        }
    }

    pub fn curve(&self) -> &BondingCurve {
        &self.curve
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn recorder(&self) -> &R {
        &self.recorder
    }

    /// Store the initial curve for a new token.
    pub fn launch(&mut self, token_id: &TokenId) -> Result<BondingCurveState, DeskError> {
        match self.store.load_curve_state(token_id) {
            Ok(_) => return Err(DeskError::AlreadyLaunched(short_id(token_id))),
            Err(DeskError::UnknownToken(_)) => {}
            Err(e) => {
                warn!("not launching {}: {}", short_id(token_id), e);
                return Err(e);
            }
        }
        let state = self.curve.initial_state();
        self.store.commit_curve_state(token_id, state)?;
        info!("launched curve for token {}", short_id(token_id));
        Ok(state)
    }

    /// Quote against the stored state without committing anything.
    pub fn preview(&self, token_id: &TokenId, intent: &TradeIntent) -> Result<TradeQuote, DeskError> {
        let state = self.load_checked(token_id)?;
        Ok(self.curve.quote(intent, &state)?)
    }

    /// Load, quote, commit and record one trade.
    ///
    /// Nothing is committed or recorded unless every earlier step succeeded.
    pub fn execute(
        &mut self,
        token_id: &TokenId,
        trader: &TraderId,
        intent: &TradeIntent,
    ) -> Result<TradeQuote, DeskError> {
        let state = self.load_checked(token_id)?;
        let quote = self.curve.quote(intent, &state)?;

        self.store.commit_curve_state(token_id, quote.new_state)?;
        self.recorder.record_trade(token_id, &quote, trader);

        info!(
            "{} on {}: {} in, {} out, fee {}",
            quote.direction,
            short_id(token_id),
            quote.amount_in,
            quote.amount_out,
            quote.fee
        );
        self.curve.note_graduation(&quote);
        Ok(quote)
    }

    fn load_checked(&self, token_id: &TokenId) -> Result<BondingCurveState, DeskError> {
        let state = self.store.load_curve_state(token_id)?;
        if !self.curve.validate(&state) {
            warn!("refusing corrupt curve state for token {}", short_id(token_id));
            return Err(DeskError::CorruptState);
        }
        Ok(state)
    }
}

/// Curve states kept in a map.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCurveStore {
    states: HashMap<TokenId, BondingCurveState>,
}

impl InMemoryCurveStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite a state without any checks.
    pub fn insert(&mut self, token_id: TokenId, state: BondingCurveState) {
        self.states.insert(token_id, state);
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

impl CurveStore for InMemoryCurveStore {
    fn load_curve_state(&self, token_id: &TokenId) -> Result<BondingCurveState, DeskError> {
        self.states
            .get(token_id)
            .copied()
            .ok_or_else(|| DeskError::UnknownToken(short_id(token_id)))
    }

    fn commit_curve_state(
        &mut self,
        token_id: &TokenId,
        state: BondingCurveState,
    ) -> Result<(), DeskError> {
        self.states.insert(*token_id, state);
        Ok(())
    }
}

/// Running totals for one trader.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraderStats {
    pub trade_count: u64,
    pub tokens_bought: u128,
    pub tokens_sold: u128,
    pub currency_spent: u128,
    pub currency_received: u128,
    pub fees_paid: u128,
    pub volume: u128,
}

impl TraderStats {
    pub fn apply(&mut self, quote: &TradeQuote) {
        self.trade_count = self.trade_count.saturating_add(1);
        self.fees_paid = self.fees_paid.saturating_add(quote.fee);

        match quote.direction {
            TradeDirection::Buy => {
                self.tokens_bought = self.tokens_bought.saturating_add(quote.amount_out);
                self.currency_spent = self.currency_spent.saturating_add(quote.amount_in);
                self.volume = self.volume.saturating_add(quote.amount_in);
            }
            TradeDirection::Sell => {
                self.tokens_sold = self.tokens_sold.saturating_add(quote.amount_in);
                self.currency_received = self.currency_received.saturating_add(quote.amount_out);
                self.volume = self.volume.saturating_add(quote.amount_out);
            }
        }
    }
}

/// Trade log kept in memory, with per-trader totals.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTradeLog {
    events: Vec<TradeEvent>,
    stats: HashMap<TraderId, TraderStats>,
}

impl InMemoryTradeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[TradeEvent] {
        &self.events
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    pub fn events_for(&self, token_id: &TokenId) -> Vec<&TradeEvent> {
        self.events
            .iter()
            .filter(|e| &e.token_id == token_id)
            .collect()
    }

    pub fn latest_for(&self, token_id: &TokenId) -> Option<&TradeEvent> {
        self.events.iter().rev().find(|e| &e.token_id == token_id)
    }

    pub fn stats_for(&self, trader: &TraderId) -> Option<&TraderStats> {
        self.stats.get(trader)
    }
}

impl TradeRecorder for InMemoryTradeLog {
    fn record_trade(&mut self, token_id: &TokenId, quote: &TradeQuote, trader: &TraderId) {
        let sequence = self.events.len() as u64;
        self.events
            .push(TradeEvent::from_quote(sequence, *token_id, *trader, quote));
        self.stats.entry(*trader).or_default().apply(quote);
        debug!("recorded trade #{} for {}", sequence, short_id(token_id));
    }
}
