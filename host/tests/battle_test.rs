use std::cell::Cell;
use std::rc::Rc;

use battle_core::{Asset, BattleConfig, BattleSession, MatchError, Phase, PriceSample, Winner};
use host::market::FetchError;
use host::{
    BattleError, BattleHost, FrameClock, HistorySource, LoopExit, MarketData, RetryPolicy,
    SpotQuote, StaticMarket, VirtualClock,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

const NOW_MS: i64 = 1_700_000_000_000;

fn btc() -> Asset {
    Asset::new("bitcoin", "BTC", "Bitcoin")
}

fn eth() -> Asset {
    Asset::new("ethereum", "ETH", "Ethereum")
}

fn ramp(from: f64, to: f64) -> Vec<PriceSample> {
    (0..50)
        .map(|i| PriceSample::new(NOW_MS + i * 60_000, from + (to - from) * i as f64 / 49.0))
        .collect()
}

fn session(duration_ms: i64) -> BattleSession<StdRng> {
    let cfg = BattleConfig { duration_ms, ..BattleConfig::default() };
    BattleSession::new(cfg, StdRng::seed_from_u64(17)).unwrap()
}

fn clock() -> VirtualClock {
    VirtualClock::new(NOW_MS, 60)
}

/// Fails every call and counts them.
#[derive(Default)]
struct DownMarket {
    calls: Cell<u32>,
}

impl MarketData for DownMarket {
    fn list_assets(&self) -> Result<Vec<Asset>, FetchError> {
        self.calls.set(self.calls.get() + 1);
        Err(FetchError::NotFound("asset list".into()))
    }

    fn historical_series(&self, asset_id: &str, _days: u32) -> Result<Vec<PriceSample>, FetchError> {
        self.calls.set(self.calls.get() + 1);
        Err(FetchError::NotFound(asset_id.into()))
    }

    fn spot_price(&self, asset_id: &str) -> Result<SpotQuote, FetchError> {
        self.calls.set(self.calls.get() + 1);
        Err(FetchError::NotFound(asset_id.into()))
    }
}

#[test]
fn test_headless_match_with_fetched_history() {
    let market = StaticMarket::new()
        .with_series(btc(), ramp(100.0, 100.0))
        .with_series(eth(), ramp(100.0, 150.0));
    let host = BattleHost::new(market, RetryPolicy::immediate(3));
    let mut s = session(40_000);

    let (report, exit) = host.play_headless(&mut s, &btc(), &eth(), NOW_MS).unwrap();

    assert_eq!(report.source_a, HistorySource::Fetched);
    assert_eq!(report.source_b, HistorySource::Fetched);
    let LoopExit::Finished(result) = exit else {
        panic!("match did not finish: {:?}", exit);
    };
    assert_eq!(result.winner, Winner::B);
    assert!((result.margin_percent - 50.0).abs() < 1.5);
}

#[test]
fn test_identical_histories_tie() {
    let market = StaticMarket::new()
        .with_series(btc(), ramp(200.0, 180.0))
        .with_series(eth(), ramp(200.0, 180.0));
    let host = BattleHost::new(market, RetryPolicy::immediate(1));
    let mut s = session(10_000);

    let (_, exit) = host.play_headless(&mut s, &btc(), &eth(), NOW_MS).unwrap();

    let LoopExit::Finished(result) = exit else {
        panic!("match did not finish: {:?}", exit);
    };
    assert_eq!(result.winner, Winner::Tie);
    assert_eq!(result.margin_percent, 0.0);
}

#[test]
fn test_missing_history_falls_back() {
    let market = StaticMarket::new().with_series(btc(), ramp(100.0, 101.0));
    let host = BattleHost::new(market, RetryPolicy::immediate(3));
    let mut s = session(20_000);

    let report = host.start_match(&mut s, Some(&btc()), Some(&eth()), &clock()).unwrap();

    assert_eq!(report.source_a, HistorySource::Fetched);
    assert_eq!(report.source_b, HistorySource::Fallback);
    assert_eq!(s.phase(), Phase::Battling);
}

/// Shared wall time that fetches move forward.
#[derive(Clone)]
struct SlowTime(Rc<Cell<i64>>);

impl FrameClock for SlowTime {
    fn now_ms(&self) -> i64 {
        self.0.get()
    }

    fn wait_next_frame(&mut self) {
        self.0.set(self.0.get() + 16);
    }
}

/// Serves a flat history, taking `lag_ms` of shared time per call.
struct LaggyMarket {
    time: SlowTime,
    lag_ms: i64,
}

impl MarketData for LaggyMarket {
    fn list_assets(&self) -> Result<Vec<Asset>, FetchError> {
        Ok(vec![btc(), eth()])
    }

    fn historical_series(&self, _asset_id: &str, _days: u32) -> Result<Vec<PriceSample>, FetchError> {
        self.time.0.set(self.time.0.get() + self.lag_ms);
        Ok(ramp(100.0, 100.0))
    }

    fn spot_price(&self, asset_id: &str) -> Result<SpotQuote, FetchError> {
        Err(FetchError::NotFound(asset_id.into()))
    }
}

#[test]
fn test_match_clock_starts_after_histories_arrive() {
    let time = SlowTime(Rc::new(Cell::new(NOW_MS)));
    let market = LaggyMarket { time: time.clone(), lag_ms: 3_000 };
    let host = BattleHost::new(market, RetryPolicy::immediate(1));
    let mut s = session(20_000);

    host.start_match(&mut s, Some(&btc()), Some(&eth()), &time).unwrap();

    assert_eq!(time.now_ms(), NOW_MS + 6_000);
    assert_eq!(s.state().unwrap().match_start_ms, NOW_MS + 6_000);
    s.countdown(time.now_ms());
    assert_eq!(s.remaining_secs(), 20, "no match time spent on fetching");
    assert!(s.frame(time.now_ms() + 16));
    assert_eq!(s.state().unwrap().sample_index, 0);
}

#[test]
fn test_retries_before_fallback() {
    let host = BattleHost::new(DownMarket::default(), RetryPolicy::immediate(3));

    let history = host.history(&btc(), 1, NOW_MS).unwrap();

    assert_eq!(history.source, HistorySource::Fallback);
    assert_eq!(history.samples.len(), 24);
    assert_eq!(host.market().calls.get(), 3);
}

#[test]
fn test_unavailable_history_aborts_start() {
    let host = BattleHost::new(DownMarket::default(), RetryPolicy::immediate(2)).without_fallback();
    let mut s = session(20_000);

    let err = host.start_match(&mut s, Some(&btc()), Some(&eth()), &clock()).unwrap_err();

    assert!(matches!(err, BattleError::DataUnavailable { ref asset, .. } if asset == "bitcoin"));
    assert!(!err.is_precondition());
    assert_eq!(s.phase(), Phase::Idle);
    assert!(s.snapshot().is_none());
}

#[test]
fn test_bad_selection_rejected_before_fetch() {
    let host = BattleHost::new(DownMarket::default(), RetryPolicy::immediate(3));
    let mut s = session(20_000);

    let err = host.start_match(&mut s, Some(&btc()), None, &clock()).unwrap_err();
    assert!(matches!(err, BattleError::Match(MatchError::InvalidSelection)));
    assert!(err.is_precondition());

    let err = host.start_match(&mut s, Some(&btc()), Some(&btc()), &clock()).unwrap_err();
    assert!(matches!(err, BattleError::Match(MatchError::SameAsset(_))));

    assert_eq!(host.market().calls.get(), 0, "nothing fetched for a bad selection");
    assert_eq!(s.phase(), Phase::Idle);
}

#[test]
fn test_asset_list_falls_back() {
    let host = BattleHost::new(DownMarket::default(), RetryPolicy::immediate(3));
    let assets = host.assets();
    assert_eq!(assets.len(), 2);
    assert_eq!(assets[0].symbol, "BTC");
    assert!(host.quote(&btc()).is_none());
}
