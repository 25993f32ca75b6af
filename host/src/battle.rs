use battle_core::{validate_selection, Asset, BattleSession, MatchError, PriceSample};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::market::{fallback_assets, synthetic_series, FetchError, MarketData, SpotQuote};
use crate::retry::{RetryOutcome, RetryPolicy};
use crate::scheduler::{FrameClock, FrameLoop, LoopExit, VirtualClock};

/// Frame rate for headless matches
pub const HEADLESS_FPS: u32 = 60;

#[derive(Error, Debug)]
pub enum BattleError {
    #[error(transparent)]
    Match(#[from] MatchError),

    #[error("price history unavailable for '{asset}': {source}")]
    DataUnavailable {
        asset: String,
        #[source]
        source: FetchError,
    },
}

impl BattleError {
    pub fn is_precondition(&self) -> bool {
        match self {
            BattleError::Match(e) => e.is_precondition(),
            BattleError::DataUnavailable { .. } => false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistorySource {
    Fetched,
    Fallback,
}

#[derive(Clone, Debug)]
pub struct History {
    pub samples: Vec<PriceSample>,
    pub source: HistorySource,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartReport {
    pub source_a: HistorySource,
    pub source_b: HistorySource,
}

/// Connects a session to its market data: fetches both histories through
/// the retry policy, then starts the match.
pub struct BattleHost<M> {
    market: M,
    policy: RetryPolicy,
    allow_fallback: bool,
}

impl<M: MarketData> BattleHost<M> {
    pub fn new(market: M, policy: RetryPolicy) -> Self {
        Self { market, policy, allow_fallback: true }
    }

    /// Fail the start instead of substituting synthetic history.
    pub fn without_fallback(mut self) -> Self {
        self.allow_fallback = false;
        self
    }

    pub fn market(&self) -> &M {
        &self.market
    }

    /// Selectable competitors; the fallback list if the source is down.
    pub fn assets(&self) -> Vec<Asset> {
        self.policy
            .run("asset list", |_| self.market.list_assets())
            .or_fallback(fallback_assets)
            .into_result()
            .unwrap_or_else(|_| fallback_assets())
    }

    pub fn quote(&self, asset: &Asset) -> Option<SpotQuote> {
        self.policy
            .run(&format!("spot price for {}", asset.id), |_| self.market.spot_price(&asset.id))
            .into_result()
            .ok()
    }

    pub fn history(&self, asset: &Asset, days: u32, now_ms: i64) -> Result<History, BattleError> {
        let what = format!("price history for {}", asset.id);
        let mut outcome = self
            .policy
            .run(&what, |_| self.market.historical_series(&asset.id, days));
        if self.allow_fallback {
            outcome = outcome.or_fallback(|| synthetic_series(days, now_ms, &mut rand::thread_rng()));
        }

        match outcome {
            RetryOutcome::Fetched(samples) => Ok(History { samples, source: HistorySource::Fetched }),
            RetryOutcome::Fallback { value, cause } => {
                warn!("using synthetic history for {}: {}", asset.id, cause);
                Ok(History { samples: value, source: HistorySource::Fallback })
            }
            RetryOutcome::Failed(source) => Err(BattleError::DataUnavailable {
                asset: asset.id.clone(),
                source,
            }),
        }
    }

    /// `idle -> battling`. The selection is checked before anything is
    /// fetched; the session is untouched on any failure. The match clock
    /// starts from `clock` as read once both histories are in hand.
    pub fn start_match<R: Rng, C: FrameClock>(
        &self,
        session: &mut BattleSession<R>,
        asset_a: Option<&Asset>,
        asset_b: Option<&Asset>,
        clock: &C,
    ) -> Result<StartReport, BattleError> {
        validate_selection(asset_a, asset_b)?;
        let (Some(a), Some(b)) = (asset_a, asset_b) else {
            return Err(MatchError::InvalidSelection.into());
        };

        let days = session.config().history_days;
        let hist_a = self.history(a, days, clock.now_ms())?;
        let hist_b = self.history(b, days, clock.now_ms())?;

        let start_ms = clock.now_ms();
        session.start_match(a.clone(), b.clone(), &hist_a.samples, &hist_b.samples, start_ms)?;
        info!(
            a = %a.symbol,
            b = %b.symbol,
            points_a = hist_a.samples.len(),
            points_b = hist_b.samples.len(),
            start_ms,
            "histories loaded"
        );
        Ok(StartReport { source_a: hist_a.source, source_b: hist_b.source })
    }

    /// Start and play a whole match under simulated time.
    pub fn play_headless<R: Rng>(
        &self,
        session: &mut BattleSession<R>,
        asset_a: &Asset,
        asset_b: &Asset,
        start_ms: i64,
    ) -> Result<(StartReport, LoopExit), BattleError> {
        let mut clock = VirtualClock::new(start_ms, HEADLESS_FPS);
        let report = self.start_match(session, Some(asset_a), Some(asset_b), &clock)?;
        let exit = FrameLoop::new(session.config()).run(session, &mut clock);
        Ok((report, exit))
    }
}
