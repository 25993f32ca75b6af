// Battle configuration defaults.
// `BattleConfig::default()` is built from these; every value can be overridden at runtime.

/// Arena width (pixels)
pub const CANVAS_WIDTH: f64 = 600.0;

/// Arena height (pixels)
pub const CANVAS_HEIGHT: f64 = 400.0;

/// Paddle width (pixels)
pub const PADDLE_WIDTH: f64 = 15.0;

/// Paddle height before any price movement (pixels)
pub const BASE_PADDLE_HEIGHT: f64 = 100.0;

/// Smallest paddle a collapsing asset can shrink to (pixels)
pub const MIN_PADDLE_HEIGHT: f64 = 60.0;

/// Largest paddle a rallying asset can grow to (pixels)
pub const MAX_PADDLE_HEIGHT: f64 = 160.0;

/// Pixels of paddle height gained per percent of cumulative change
pub const HEIGHT_SENSITIVITY: f64 = 5.0;

/// Instant change (percent) that adds one unit to the paddle speed factor
pub const SPEED_DIVISOR: f64 = 5.0;

/// Combined volatility (percent) that adds one unit to the ball momentum factor
pub const VOLATILITY_DIVISOR: f64 = 30.0;

/// Ball diameter (pixels)
pub const BALL_SIZE: f64 = 12.0;

/// Ball speed along each axis at serve (pixels/frame)
pub const BASE_SPEED: f64 = 6.0;

/// Match length (milliseconds)
pub const MATCH_DURATION_MS: i64 = 20_000;

/// Number of price samples a match is played over
pub const SAMPLE_COUNT: usize = 50;

/// Fraction of the paddle-to-target gap closed per frame at full urgency
pub const TRACKING_GAIN: f64 = 0.15;

/// Lowest urgency a paddle tracks with, however far away the ball is
pub const URGENCY_FLOOR: f64 = 0.05;

/// Cumulative change gap (percentage points) below which a match is a tie
pub const TIE_THRESHOLD: f64 = 0.5;

/// Countdown refresh cadence (milliseconds)
pub const COUNTDOWN_INTERVAL_MS: i64 = 100;

/// Days of price history a match replays
pub const HISTORY_DAYS: u32 = 1;

/// Time the arena keeps animating, paddles inert, after time runs out (milliseconds)
pub const END_GRACE_MS: i64 = 100;

/// Upper bounds accepted by config validation
pub const MAX_SAMPLE_COUNT: usize = 10_000;
pub const MAX_DURATION_MS: i64 = 600_000;
pub const MAX_HISTORY_DAYS: u32 = 365;
