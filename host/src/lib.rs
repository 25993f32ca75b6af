//! Collaborators around the battle engine: market data with retry and
//! fallback, the frame loop, and the battle ledger.

pub mod battle;
pub mod ledger;
pub mod market;
pub mod retry;
pub mod scheduler;

pub use battle::{BattleError, BattleHost, HistorySource, StartReport};
pub use ledger::{
    spawn_ledger_worker, AssetStats, BattleRecord, Ledger, LedgerObserver, MemoryLedger, UserStats,
};
pub use market::{FileMarket, MarketData, SpotQuote, StaticMarket};
pub use retry::{RetryOutcome, RetryPolicy};
pub use scheduler::{FrameClock, FrameLoop, LoopExit, SystemClock, VirtualClock};
