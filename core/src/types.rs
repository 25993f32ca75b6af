use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::BattleConfig;

/// One point of a price history.
///
/// Serialized as a `[timestamp_ms, price_usd]` pair, the shape market chart
/// endpoints return.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "(i64, f64)", into = "(i64, f64)")]
pub struct PriceSample {
    pub timestamp_ms: i64,
    pub price_usd: f64,
}

impl PriceSample {
    pub fn new(timestamp_ms: i64, price_usd: f64) -> Self {
        Self { timestamp_ms, price_usd }
    }
}

impl From<(i64, f64)> for PriceSample {
    fn from((timestamp_ms, price_usd): (i64, f64)) -> Self {
        Self { timestamp_ms, price_usd }
    }
}

impl From<PriceSample> for (i64, f64) {
    fn from(s: PriceSample) -> Self {
        (s.timestamp_ms, s.price_usd)
    }
}

/// A selectable competitor.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Asset {
    pub id: String,
    pub symbol: String,
    pub name: String,
}

impl Asset {
    pub fn new(id: &str, symbol: &str, name: &str) -> Self {
        Self {
            id: id.into(),
            symbol: symbol.to_uppercase(),
            name: name.into(),
        }
    }
}

/// Competitor slot: A defends the left goal, B the right.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn opponent(self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }

    /// Horizontal direction of travel that carries a ball toward this side's goal.
    pub fn goal_direction(self) -> f64 {
        match self {
            Side::A => -1.0,
            Side::B => 1.0,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::A => write!(f, "A"),
            Side::B => write!(f, "B"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    pub x: f64,
    pub y: f64,
    pub vel_x: f64,
    pub vel_y: f64,
}

impl Ball {
    /// Ball at the arena center with both velocity signs drawn at random.
    pub fn serve<R: Rng + ?Sized>(cfg: &BattleConfig, rng: &mut R) -> Self {
        Self {
            x: cfg.canvas_width / 2.0,
            y: cfg.canvas_height / 2.0,
            vel_x: cfg.base_speed * random_sign(rng),
            vel_y: cfg.base_speed * random_sign(rng),
        }
    }

    /// Re-serve from the center toward `side`, vertical sign at random.
    pub fn serve_toward<R: Rng + ?Sized>(side: Side, cfg: &BattleConfig, rng: &mut R) -> Self {
        Self {
            x: cfg.canvas_width / 2.0,
            y: cfg.canvas_height / 2.0,
            vel_x: cfg.base_speed * side.goal_direction(),
            vel_y: cfg.base_speed * random_sign(rng),
        }
    }
}

pub(crate) fn random_sign<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    if rng.gen_bool(0.5) {
        1.0
    } else {
        -1.0
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SideState {
    /// Top edge of the paddle
    pub paddle_y: f64,
    pub paddle_height: f64,
    pub paddle_speed_factor: f64,
    pub instant_change_percent: f64,
    pub cumulative_change_percent: f64,
    /// Balls that crossed the opponent's goal line
    pub rally_points: u32,
    /// 1 for the match winner once the match ends, otherwise 0
    pub match_points: u32,
}

impl SideState {
    pub fn centered(cfg: &BattleConfig) -> Self {
        Self {
            paddle_y: (cfg.canvas_height - cfg.base_paddle_height) / 2.0,
            paddle_height: cfg.base_paddle_height,
            paddle_speed_factor: 1.0,
            instant_change_percent: 0.0,
            cumulative_change_percent: 0.0,
            rally_points: 0,
            match_points: 0,
        }
    }

    /// Displayed score: rally points plus the match-win point.
    pub fn score(&self) -> u32 {
        self.rally_points + self.match_points
    }
}

/// Mutable simulation state, written once per frame by the session that owns it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchState {
    pub balls: Vec<Ball>,
    pub side_a: SideState,
    pub side_b: SideState,
    pub sample_index: usize,
    pub match_start_ms: i64,
    pub duration_ms: i64,
    pub end_triggered: bool,
}

impl MatchState {
    pub fn new<R: Rng + ?Sized>(cfg: &BattleConfig, now_ms: i64, rng: &mut R) -> Self {
        Self {
            balls: vec![Ball::serve(cfg, rng)],
            side_a: SideState::centered(cfg),
            side_b: SideState::centered(cfg),
            sample_index: 0,
            match_start_ms: now_ms,
            duration_ms: cfg.duration_ms,
            end_triggered: false,
        }
    }

    pub fn side(&self, side: Side) -> &SideState {
        match side {
            Side::A => &self.side_a,
            Side::B => &self.side_b,
        }
    }

    pub fn side_mut(&mut self, side: Side) -> &mut SideState {
        match side {
            Side::A => &mut self.side_a,
            Side::B => &mut self.side_b,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Battling,
    Ended,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Battling => "battling",
            Phase::Ended => "ended",
        }
    }
}
