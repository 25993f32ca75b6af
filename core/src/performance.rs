use crate::config::BattleConfig;
use crate::types::{Ball, PriceSample, SideState};

/// Percent change from `from` to `to`; 0 when `from` is zero or the result
/// would not be finite.
pub fn percent_change(from: f64, to: f64) -> f64 {
    if from == 0.0 {
        return 0.0;
    }
    let pct = (to - from) / from * 100.0;
    if pct.is_finite() {
        pct
    } else {
        0.0
    }
}

/// Derived parameters for one side at one sample tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SideMetrics {
    pub instant_change_percent: f64,
    pub cumulative_change_percent: f64,
    pub paddle_height: f64,
    pub paddle_speed_factor: f64,
}

impl SideMetrics {
    pub fn at(series: &[PriceSample], index: usize, cfg: &BattleConfig) -> Self {
        if series.is_empty() {
            return Self::from_changes(0.0, 0.0, cfg);
        }
        let index = index.min(series.len() - 1);
        let price = series[index].price_usd;
        let prev = series[index.saturating_sub(1)].price_usd;
        let base = series[0].price_usd;
        Self::from_changes(percent_change(prev, price), percent_change(base, price), cfg)
    }

    pub fn from_changes(instant: f64, cumulative: f64, cfg: &BattleConfig) -> Self {
        Self {
            instant_change_percent: instant,
            cumulative_change_percent: cumulative,
            paddle_height: paddle_height(cumulative, cfg),
            paddle_speed_factor: 1.0 + instant.abs() / cfg.speed_divisor,
        }
    }

    pub fn apply(&self, side: &mut SideState) {
        side.instant_change_percent = self.instant_change_percent;
        side.cumulative_change_percent = self.cumulative_change_percent;
        side.paddle_height = self.paddle_height;
        side.paddle_speed_factor = self.paddle_speed_factor;
    }
}

pub fn paddle_height(cumulative: f64, cfg: &BattleConfig) -> f64 {
    (cfg.base_paddle_height + cumulative * cfg.height_sensitivity)
        .clamp(cfg.min_paddle_height, cfg.max_paddle_height)
}

/// Ball speed multiplier from both sides' instant volatility.
pub fn momentum_factor(instant_a: f64, instant_b: f64, cfg: &BattleConfig) -> f64 {
    let total = instant_a.abs() + instant_b.abs();
    1.0 + total / cfg.volatility_divisor
}

/// Rescale horizontal speed to `base_speed * factor`, keeping direction.
pub fn apply_momentum(balls: &mut [Ball], factor: f64, cfg: &BattleConfig) {
    for ball in balls.iter_mut() {
        let direction = if ball.vel_x > 0.0 { 1.0 } else { -1.0 };
        ball.vel_x = direction * cfg.base_speed * factor;
    }
}
