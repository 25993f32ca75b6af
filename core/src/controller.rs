use crate::config::BattleConfig;
use crate::types::{Ball, MatchState, Side, SideState};

/// x of the plane a side's paddle defends.
pub fn paddle_plane_x(side: Side, cfg: &BattleConfig) -> f64 {
    match side {
        Side::A => cfg.paddle_width,
        Side::B => cfg.canvas_width - cfg.paddle_width,
    }
}

/// The approaching ball nearest `side`'s goal line: in that side's half and
/// moving toward it.
pub fn select_ball<'a>(balls: &'a [Ball], side: Side, cfg: &BattleConfig) -> Option<&'a Ball> {
    let half = cfg.half_width();
    match side {
        Side::A => balls
            .iter()
            .filter(|b| b.x < half && b.vel_x < 0.0)
            .min_by(|a, b| a.x.total_cmp(&b.x)),
        Side::B => balls
            .iter()
            .filter(|b| b.x > half && b.vel_x > 0.0)
            .max_by(|a, b| a.x.total_cmp(&b.x)),
    }
}

/// 0..1 responsiveness that grows as the ball nears the paddle plane.
pub fn urgency(distance: f64, cfg: &BattleConfig) -> f64 {
    (1.0 - distance / cfg.half_width()).max(cfg.urgency_floor)
}

/// Move one paddle toward its intercept with the selected ball.
pub fn track(paddle: &mut SideState, side: Side, balls: &[Ball], cfg: &BattleConfig) {
    let Some(ball) = select_ball(balls, side, cfg) else {
        return;
    };
    let target = ball.y - paddle.paddle_height / 2.0;
    let distance = (ball.x - paddle_plane_x(side, cfg)).abs();
    let urgency = urgency(distance, cfg);
    paddle.paddle_y +=
        (target - paddle.paddle_y) * cfg.tracking_gain * paddle.paddle_speed_factor * urgency;
}

pub fn clamp_paddle(paddle: &mut SideState, cfg: &BattleConfig) {
    let max_y = (cfg.canvas_height - paddle.paddle_height).max(0.0);
    paddle.paddle_y = paddle.paddle_y.clamp(0.0, max_y);
}

/// Per-frame controller pass. Tracking stops once the match end has been
/// triggered; the clamp runs every frame regardless.
pub fn update_paddles(state: &mut MatchState, cfg: &BattleConfig) {
    if !state.end_triggered {
        track(&mut state.side_a, Side::A, &state.balls, cfg);
        track(&mut state.side_b, Side::B, &state.balls, cfg);
    }
    clamp_paddle(&mut state.side_a, cfg);
    clamp_paddle(&mut state.side_b, cfg);
}
