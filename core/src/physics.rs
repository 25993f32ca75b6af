use rand::Rng;
use tracing::debug;

use crate::config::BattleConfig;
use crate::types::{Ball, MatchState, Side, SideState};

/// Vertical velocity after a paddle hit, from where on the paddle the ball
/// struck. Center returns flat, the edges return at `±base_speed`.
#[inline]
pub fn bounce_vel_y(hit_y: f64, paddle_height: f64, base_speed: f64) -> f64 {
    let hit_pos = hit_y / paddle_height - 0.5;
    hit_pos * base_speed * 2.0
}

/// Reflect off the top and bottom walls. The ball is pushed back inside
/// and its vertical velocity forced away from the wall it touched.
pub fn reflect_walls(ball: &mut Ball, cfg: &BattleConfig) {
    let r = cfg.ball_radius();
    if ball.y <= r {
        ball.y = r;
        ball.vel_y = ball.vel_y.abs();
    } else if ball.y >= cfg.canvas_height - r {
        ball.y = cfg.canvas_height - r;
        ball.vel_y = -ball.vel_y.abs();
    }
}

fn within_paddle(ball: &Ball, paddle: &SideState) -> bool {
    ball.y >= paddle.paddle_y && ball.y <= paddle.paddle_y + paddle.paddle_height
}

/// Paddle response for both sides. Velocity sign is forced rather than
/// flipped, so a ball still overlapping the paddle next frame keeps going out.
pub fn collide_paddles(ball: &mut Ball, left: &SideState, right: &SideState, cfg: &BattleConfig) {
    let r = cfg.ball_radius();

    if ball.x - r <= cfg.paddle_width && within_paddle(ball, left) {
        ball.vel_x = ball.vel_x.abs();
        ball.vel_y = bounce_vel_y(ball.y - left.paddle_y, left.paddle_height, cfg.base_speed);
    }

    if ball.x + r >= cfg.canvas_width - cfg.paddle_width && within_paddle(ball, right) {
        ball.vel_x = -ball.vel_x.abs();
        ball.vel_y = bounce_vel_y(ball.y - right.paddle_y, right.paddle_height, cfg.base_speed);
    }
}

/// Side that scores if the ball has left the arena horizontally.
pub fn scoring_side(ball: &Ball, cfg: &BattleConfig) -> Option<Side> {
    if ball.x <= 0.0 {
        Some(Side::B)
    } else if ball.x >= cfg.canvas_width {
        Some(Side::A)
    } else {
        None
    }
}

/// Advance one ball by one frame. Returns the side that scored, if any; the
/// ball has then already been re-served toward the scorer.
pub fn step_ball<R: Rng + ?Sized>(
    ball: &mut Ball,
    left: &SideState,
    right: &SideState,
    end_triggered: bool,
    cfg: &BattleConfig,
    rng: &mut R,
) -> Option<Side> {
    ball.x += ball.vel_x;
    ball.y += ball.vel_y;

    reflect_walls(ball, cfg);

    if !end_triggered {
        collide_paddles(ball, left, right, cfg);
    }

    let scorer = scoring_side(ball, cfg)?;
    *ball = Ball::serve_toward(scorer, cfg, rng);
    Some(scorer)
}

/// Advance every ball and credit rally points.
pub fn step<R: Rng + ?Sized>(state: &mut MatchState, cfg: &BattleConfig, rng: &mut R) -> Vec<Side> {
    let mut scored = Vec::new();
    for ball in state.balls.iter_mut() {
        if let Some(side) = step_ball(ball, &state.side_a, &state.side_b, state.end_triggered, cfg, rng) {
            scored.push(side);
        }
    }
    for side in &scored {
        let s = state.side_mut(*side);
        s.rally_points += 1;
        debug!(side = %side, points = s.rally_points, "rally point");
    }
    scored
}
