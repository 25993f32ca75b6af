use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::ConfigError;

/// Tunable match parameters. Missing fields deserialize to the defaults in
/// [`crate::constants`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleConfig {
    pub canvas_width: f64,
    pub canvas_height: f64,
    pub paddle_width: f64,
    pub base_paddle_height: f64,
    pub min_paddle_height: f64,
    pub max_paddle_height: f64,
    pub height_sensitivity: f64,
    pub speed_divisor: f64,
    pub volatility_divisor: f64,
    pub ball_size: f64,
    pub base_speed: f64,
    pub duration_ms: i64,
    pub sample_count: usize,
    pub tracking_gain: f64,
    pub urgency_floor: f64,
    pub tie_threshold: f64,
    pub countdown_interval_ms: i64,
    /// Delay between time-up and the result, with paddles inert
    pub end_grace_ms: i64,
    pub history_days: u32,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            canvas_width: CANVAS_WIDTH,
            canvas_height: CANVAS_HEIGHT,
            paddle_width: PADDLE_WIDTH,
            base_paddle_height: BASE_PADDLE_HEIGHT,
            min_paddle_height: MIN_PADDLE_HEIGHT,
            max_paddle_height: MAX_PADDLE_HEIGHT,
            height_sensitivity: HEIGHT_SENSITIVITY,
            speed_divisor: SPEED_DIVISOR,
            volatility_divisor: VOLATILITY_DIVISOR,
            ball_size: BALL_SIZE,
            base_speed: BASE_SPEED,
            duration_ms: MATCH_DURATION_MS,
            sample_count: SAMPLE_COUNT,
            tracking_gain: TRACKING_GAIN,
            urgency_floor: URGENCY_FLOOR,
            tie_threshold: TIE_THRESHOLD,
            countdown_interval_ms: COUNTDOWN_INTERVAL_MS,
            end_grace_ms: END_GRACE_MS,
            history_days: HISTORY_DAYS,
        }
    }
}

impl BattleConfig {
    pub fn ball_radius(&self) -> f64 {
        self.ball_size / 2.0
    }

    pub fn half_width(&self) -> f64 {
        self.canvas_width / 2.0
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let real = [
            ("canvas_width", self.canvas_width),
            ("canvas_height", self.canvas_height),
            ("paddle_width", self.paddle_width),
            ("base_paddle_height", self.base_paddle_height),
            ("min_paddle_height", self.min_paddle_height),
            ("max_paddle_height", self.max_paddle_height),
            ("height_sensitivity", self.height_sensitivity),
            ("speed_divisor", self.speed_divisor),
            ("volatility_divisor", self.volatility_divisor),
            ("ball_size", self.ball_size),
            ("base_speed", self.base_speed),
            ("tracking_gain", self.tracking_gain),
            ("urgency_floor", self.urgency_floor),
            ("tie_threshold", self.tie_threshold),
        ];
        for (field, value) in real {
            if !value.is_finite() {
                return Err(ConfigError::NotFinite { field, value });
            }
        }

        let positive = [
            ("canvas_width", self.canvas_width),
            ("canvas_height", self.canvas_height),
            ("paddle_width", self.paddle_width),
            ("min_paddle_height", self.min_paddle_height),
            ("speed_divisor", self.speed_divisor),
            ("volatility_divisor", self.volatility_divisor),
            ("ball_size", self.ball_size),
            ("base_speed", self.base_speed),
            ("duration_ms", self.duration_ms as f64),
            ("tracking_gain", self.tracking_gain),
            ("urgency_floor", self.urgency_floor),
            ("countdown_interval_ms", self.countdown_interval_ms as f64),
        ];
        for (field, value) in positive {
            if value <= 0.0 {
                return Err(ConfigError::NotPositive { field, value });
            }
        }

        if self.sample_count == 0 {
            return Err(ConfigError::NoSamples);
        }
        let limits = [
            ("sample_count", self.sample_count as u64, MAX_SAMPLE_COUNT as u64),
            ("duration_ms", self.duration_ms as u64, MAX_DURATION_MS as u64),
            ("history_days", self.history_days as u64, MAX_HISTORY_DAYS as u64),
        ];
        for (field, value, max) in limits {
            if value > max {
                return Err(ConfigError::TooLarge { field, value, max });
            }
        }
        if self.countdown_interval_ms > self.duration_ms {
            return Err(ConfigError::CountdownSlowerThanMatch {
                interval: self.countdown_interval_ms,
                duration: self.duration_ms,
            });
        }
        if self.end_grace_ms < 0 || self.end_grace_ms > self.duration_ms {
            return Err(ConfigError::GraceOutOfRange {
                grace: self.end_grace_ms,
                duration: self.duration_ms,
            });
        }

        if self.min_paddle_height > self.max_paddle_height {
            return Err(ConfigError::InvertedHeightBounds {
                min: self.min_paddle_height,
                max: self.max_paddle_height,
            });
        }
        if self.base_paddle_height < self.min_paddle_height
            || self.base_paddle_height > self.max_paddle_height
        {
            return Err(ConfigError::BaseHeightOutOfBounds {
                base: self.base_paddle_height,
                min: self.min_paddle_height,
                max: self.max_paddle_height,
            });
        }
        if self.max_paddle_height > self.canvas_height {
            return Err(ConfigError::PaddleTallerThanArena {
                max: self.max_paddle_height,
                canvas: self.canvas_height,
            });
        }
        Ok(())
    }
}
