use battle_core::physics::{bounce_vel_y, collide_paddles, reflect_walls, step, step_ball};
use battle_core::{controller, Ball, BattleConfig, MatchState, Side, SideState};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn paddle_at(y: f64, height: f64) -> SideState {
    let mut s = SideState::centered(&BattleConfig::default());
    s.paddle_y = y;
    s.paddle_height = height;
    s
}

#[test]
fn test_ball_integrates_velocity() {
    let cfg = BattleConfig::default();
    let mut rng = StdRng::seed_from_u64(1);
    let far = paddle_at(0.0, 60.0);
    let mut ball = Ball { x: 300.0, y: 200.0, vel_x: 6.0, vel_y: -6.0 };

    let scored = step_ball(&mut ball, &far, &far, false, &cfg, &mut rng);

    assert!(scored.is_none());
    assert_eq!((ball.x, ball.y), (306.0, 194.0));
}

#[test]
fn test_wall_reflection_forces_direction() {
    let cfg = BattleConfig::default();

    let mut top = Ball { x: 300.0, y: 2.0, vel_x: 6.0, vel_y: -6.0 };
    reflect_walls(&mut top, &cfg);
    assert_eq!(top.y, cfg.ball_radius());
    assert!(top.vel_y > 0.0);

    // already heading away: must not flip back into the wall
    let mut leaving = Ball { x: 300.0, y: 3.0, vel_x: 6.0, vel_y: 4.0 };
    reflect_walls(&mut leaving, &cfg);
    assert_eq!(leaving.vel_y, 4.0);

    let mut bottom = Ball { x: 300.0, y: 399.0, vel_x: 6.0, vel_y: 6.0 };
    reflect_walls(&mut bottom, &cfg);
    assert_eq!(bottom.y, cfg.canvas_height - cfg.ball_radius());
    assert!(bottom.vel_y < 0.0);
}

#[test]
fn test_paddle_center_hit_returns_flat() {
    let cfg = BattleConfig::default();
    let left = paddle_at(150.0, 100.0);
    let right = paddle_at(0.0, 60.0);
    let mut ball = Ball { x: 10.0, y: 200.0, vel_x: -6.0, vel_y: 5.0 };

    collide_paddles(&mut ball, &left, &right, &cfg);

    assert!(ball.vel_x > 0.0, "ball must leave the left paddle");
    assert!(ball.vel_y.abs() < 1e-9, "center hit should return flat, got {}", ball.vel_y);
}

#[test]
fn test_paddle_edge_hit_returns_steep() {
    let cfg = BattleConfig::default();
    let left = paddle_at(0.0, 60.0);
    let right = paddle_at(150.0, 100.0);
    let mut ball = Ball { x: 590.0, y: 249.9, vel_x: 6.0, vel_y: 0.0 };

    collide_paddles(&mut ball, &left, &right, &cfg);

    assert!(ball.vel_x < 0.0, "ball must leave the right paddle");
    assert!((ball.vel_y - cfg.base_speed).abs() < 0.05, "got {}", ball.vel_y);
    assert!((bounce_vel_y(0.0, 100.0, 6.0) + 6.0).abs() < 1e-9);
}

#[test]
fn test_repeated_collision_does_not_oscillate() {
    let cfg = BattleConfig::default();
    let left = paddle_at(150.0, 100.0);
    let right = paddle_at(0.0, 60.0);
    let mut ball = Ball { x: 10.0, y: 200.0, vel_x: -6.0, vel_y: 0.0 };

    collide_paddles(&mut ball, &left, &right, &cfg);
    collide_paddles(&mut ball, &left, &right, &cfg);

    assert!(ball.vel_x > 0.0);
}

#[test]
fn test_no_paddle_response_after_end_triggered() {
    let cfg = BattleConfig::default();
    let mut rng = StdRng::seed_from_u64(3);
    let left = paddle_at(150.0, 100.0);
    let right = paddle_at(150.0, 100.0);
    let mut ball = Ball { x: 16.0, y: 200.0, vel_x: -6.0, vel_y: 0.0 };

    step_ball(&mut ball, &left, &right, true, &cfg, &mut rng);

    assert!(ball.vel_x < 0.0, "paddles are inert once the match is ending");
}

#[test]
fn test_right_goal_scores_for_left_side() {
    let cfg = BattleConfig::default();
    let mut rng = StdRng::seed_from_u64(7);
    let mut state = MatchState::new(&cfg, 0, &mut rng);
    state.balls[0] = Ball { x: cfg.canvas_width - 1.0, y: 20.0, vel_x: 5.0, vel_y: 0.0 };

    let scored = step(&mut state, &cfg, &mut rng);

    assert_eq!(scored, vec![Side::A]);
    assert_eq!(state.side_a.rally_points, 1);
    assert_eq!(state.side_b.rally_points, 0);
    let ball = state.balls[0];
    assert_eq!((ball.x, ball.y), (cfg.canvas_width / 2.0, cfg.canvas_height / 2.0));
    assert_eq!(ball.vel_x, -cfg.base_speed);
    assert_eq!(ball.vel_y.abs(), cfg.base_speed);
}

#[test]
fn test_left_goal_scores_for_right_side() {
    let cfg = BattleConfig::default();
    let mut rng = StdRng::seed_from_u64(8);
    let mut state = MatchState::new(&cfg, 0, &mut rng);
    state.balls[0] = Ball { x: 1.0, y: 380.0, vel_x: -5.0, vel_y: 0.0 };

    step(&mut state, &cfg, &mut rng);

    assert_eq!(state.side_b.rally_points, 1);
    assert_eq!(state.side_a.rally_points, 0);
    assert_eq!(state.balls[0].vel_x, cfg.base_speed);
}

#[test]
fn test_every_ball_is_advanced() {
    let cfg = BattleConfig::default();
    let mut rng = StdRng::seed_from_u64(9);
    let mut state = MatchState::new(&cfg, 0, &mut rng);
    state.balls = vec![
        Ball { x: cfg.canvas_width - 1.0, y: 20.0, vel_x: 5.0, vel_y: 0.0 },
        Ball { x: 1.0, y: 380.0, vel_x: -5.0, vel_y: 0.0 },
        Ball { x: 300.0, y: 200.0, vel_x: 5.0, vel_y: 1.0 },
    ];

    let scored = step(&mut state, &cfg, &mut rng);

    assert_eq!(scored, vec![Side::A, Side::B]);
    assert_eq!(state.balls[2].x, 305.0);
}

proptest! {
    #[test]
    fn prop_ball_stays_between_walls(seed in any::<u64>(), frames in 1usize..3000) {
        let cfg = BattleConfig::default();
        let mut rng = StdRng::seed_from_u64(seed);
        let mut state = MatchState::new(&cfg, 0, &mut rng);

        for _ in 0..frames {
            step(&mut state, &cfg, &mut rng);
            controller::update_paddles(&mut state, &cfg);
            for ball in &state.balls {
                prop_assert!(ball.y >= 0.0 && ball.y <= cfg.canvas_height, "ball y {}", ball.y);
            }
        }
    }
}
