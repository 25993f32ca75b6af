use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::clock::MatchClock;
use crate::config::BattleConfig;
use crate::controller;
use crate::error::MatchError;
use crate::performance::{apply_momentum, momentum_factor, SideMetrics};
use crate::physics;
use crate::result::{decide_winner, MatchResult, Winner};
use crate::sampler::SampledPair;
use crate::types::{Asset, Ball, MatchState, Phase, PriceSample, Side, SideState};

/// Shared stop flag for a frame loop. Cancelling is permanent; each match
/// gets a fresh token.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Receives the end-of-match notification.
pub trait MatchObserver {
    fn on_match_ended(&mut self, result: &MatchResult);
}

/// Read-only view of a session for rendering.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchSnapshot {
    pub phase: Phase,
    pub balls: Vec<Ball>,
    pub side_a: SideState,
    pub side_b: SideState,
    pub sample_index: usize,
    pub remaining_secs: u64,
    pub winner: Option<Winner>,
}

/// Reject a selection before anything is fetched or mutated.
pub fn validate_selection(a: Option<&Asset>, b: Option<&Asset>) -> Result<(), MatchError> {
    let (Some(a), Some(b)) = (a, b) else {
        return Err(MatchError::InvalidSelection);
    };
    if a.id.trim().is_empty() || b.id.trim().is_empty() {
        return Err(MatchError::InvalidSelection);
    }
    if a.id == b.id {
        return Err(MatchError::SameAsset(a.id.clone()));
    }
    Ok(())
}

struct LiveMatch {
    asset_a: Asset,
    asset_b: Asset,
    series: SampledPair,
    clock: MatchClock,
    state: MatchState,
    /// When the result is due once time has run out
    end_due_ms: i64,
}

/// Match orchestrator: owns the simulation state and walks it through
/// `idle -> battling -> ended -> idle`.
pub struct BattleSession<R> {
    config: BattleConfig,
    rng: R,
    phase: Phase,
    live: Option<LiveMatch>,
    remaining_secs: u64,
    result: Option<MatchResult>,
    cancel: CancelToken,
    observers: Vec<Box<dyn MatchObserver>>,
}

impl<R: Rng> BattleSession<R> {
    pub fn new(config: BattleConfig, rng: R) -> Result<Self, MatchError> {
        config.validate()?;
        let remaining_secs = (config.duration_ms / 1000) as u64;
        Ok(Self {
            config,
            rng,
            phase: Phase::Idle,
            live: None,
            remaining_secs,
            result: None,
            cancel: CancelToken::new(),
            observers: Vec::new(),
        })
    }

    pub fn subscribe(&mut self, observer: Box<dyn MatchObserver>) {
        self.observers.push(observer);
    }

    pub fn config(&self) -> &BattleConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn result(&self) -> Option<&MatchResult> {
        self.result.as_ref()
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    /// Token for the loop driving the current match.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn state(&self) -> Option<&MatchState> {
        self.live.as_ref().map(|m| &m.state)
    }

    /// `idle -> battling`. Series must be the raw histories, already fetched
    /// (or substituted) by the data source.
    pub fn start_match(
        &mut self,
        asset_a: Asset,
        asset_b: Asset,
        raw_a: &[PriceSample],
        raw_b: &[PriceSample],
        now_ms: i64,
    ) -> Result<(), MatchError> {
        if self.phase != Phase::Idle {
            return Err(MatchError::NotIdle(self.phase.as_str()));
        }
        validate_selection(Some(&asset_a), Some(&asset_b))?;
        if raw_a.is_empty() {
            return Err(MatchError::EmptySeries(Side::A));
        }
        if raw_b.is_empty() {
            return Err(MatchError::EmptySeries(Side::B));
        }

        let series = SampledPair::new(raw_a, raw_b, self.config.sample_count);
        let clock = MatchClock::new(now_ms, self.config.duration_ms, series.len());
        let state = MatchState::new(&self.config, now_ms, &mut self.rng);

        info!(
            a = %asset_a.symbol,
            b = %asset_b.symbol,
            samples = series.len(),
            duration_ms = self.config.duration_ms,
            "match started"
        );

        self.live = Some(LiveMatch { asset_a, asset_b, series, clock, state, end_due_ms: now_ms });
        self.remaining_secs = (self.config.duration_ms / 1000) as u64;
        self.result = None;
        self.cancel = CancelToken::new();
        self.phase = Phase::Battling;
        Ok(())
    }

    /// One animation frame. Returns false when there is no match to advance.
    pub fn frame(&mut self, now_ms: i64) -> bool {
        if self.phase != Phase::Battling {
            return false;
        }
        let Some(live) = self.live.as_mut() else {
            return false;
        };
        let cfg = &self.config;

        if let Some(idx) = live.clock.advance(now_ms) {
            live.state.sample_index = idx;
            let a = SideMetrics::at(&live.series.a, idx, cfg);
            let b = SideMetrics::at(&live.series.b, idx, cfg);
            a.apply(&mut live.state.side_a);
            b.apply(&mut live.state.side_b);
            let momentum = momentum_factor(a.instant_change_percent, b.instant_change_percent, cfg);
            apply_momentum(&mut live.state.balls, momentum, cfg);
            debug!(
                index = idx,
                change_a = a.cumulative_change_percent,
                change_b = b.cumulative_change_percent,
                momentum,
                "sample tick"
            );
        }

        physics::step(&mut live.state, cfg, &mut self.rng);
        controller::update_paddles(&mut live.state, cfg);
        true
    }

    /// Countdown refresh. The first time the remaining time reads zero the
    /// match is end-triggered: paddles go inert while the ball keeps moving
    /// for `end_grace_ms`, after which `battling -> ended` fires once and the
    /// result is returned.
    pub fn countdown(&mut self, now_ms: i64) -> Option<MatchResult> {
        if self.phase != Phase::Battling {
            return None;
        }
        let live = self.live.as_mut()?;
        if !live.state.end_triggered {
            self.remaining_secs = live.clock.remaining_secs(now_ms);
            if self.remaining_secs > 0 {
                return None;
            }
            live.state.end_triggered = true;
            live.end_due_ms = now_ms + self.config.end_grace_ms;
            debug!(due = live.end_due_ms, "time up");
        }
        if now_ms < live.end_due_ms {
            return None;
        }
        self.finish(now_ms)
    }

    fn finish(&mut self, now_ms: i64) -> Option<MatchResult> {
        let live = self.live.as_mut()?;
        let winner = decide_winner(
            live.state.side_a.cumulative_change_percent,
            live.state.side_b.cumulative_change_percent,
            self.config.tie_threshold,
        );
        if let Some(side) = winner.side() {
            live.state.side_mut(side).match_points += 1;
        }
        let result = MatchResult::from_state(&live.asset_a, &live.asset_b, winner, &live.state, now_ms);

        info!(
            winner = result.winner_symbol(),
            score_a = result.final_score_a,
            score_b = result.final_score_b,
            margin = result.margin_percent,
            "match ended"
        );

        self.phase = Phase::Ended;
        self.cancel.cancel();
        for observer in self.observers.iter_mut() {
            observer.on_match_ended(&result);
        }
        self.result = Some(result.clone());
        Some(result)
    }

    /// Back to idle from any phase. Stops the current loop.
    pub fn reset(&mut self) {
        self.cancel.cancel();
        self.cancel = CancelToken::new();
        self.live = None;
        self.result = None;
        self.remaining_secs = (self.config.duration_ms / 1000) as u64;
        self.phase = Phase::Idle;
    }

    pub fn snapshot(&self) -> Option<MatchSnapshot> {
        let live = self.live.as_ref()?;
        Some(MatchSnapshot {
            phase: self.phase,
            balls: live.state.balls.clone(),
            side_a: live.state.side_a.clone(),
            side_b: live.state.side_b.clone(),
            sample_index: live.state.sample_index,
            remaining_secs: self.remaining_secs,
            winner: self.result.as_ref().map(|r| r.winner),
        })
    }
}
