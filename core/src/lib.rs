//! Price-driven Pong simulation.
//!
//! Two autonomous paddles, one per crypto asset, play for a fixed match
//! duration while each asset's replayed price history reshapes its paddle and
//! the ball's momentum. The asset with the larger cumulative change wins.

pub mod clock;
pub mod config;
pub mod constants;
pub mod controller;
pub mod error;
pub mod performance;
pub mod physics;
pub mod result;
pub mod sampler;
pub mod session;
pub mod types;

pub use config::BattleConfig;
pub use error::{ConfigError, MatchError};
pub use result::{compute_submission_hash, BattleSubmission, MatchResult, Winner};
pub use session::{validate_selection, BattleSession, CancelToken, MatchObserver, MatchSnapshot};
pub use types::{Asset, Ball, MatchState, Phase, PriceSample, Side, SideState};
