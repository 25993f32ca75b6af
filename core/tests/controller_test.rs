use battle_core::controller::{clamp_paddle, select_ball, track, update_paddles, urgency};
use battle_core::{Ball, BattleConfig, MatchState, Side, SideState};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

#[test]
fn test_selects_nearest_approaching_ball() {
    let cfg = BattleConfig::default();
    let balls = vec![
        Ball { x: 200.0, y: 50.0, vel_x: -6.0, vel_y: 0.0 },
        Ball { x: 80.0, y: 300.0, vel_x: -6.0, vel_y: 0.0 },
        // closest, but moving away
        Ball { x: 20.0, y: 100.0, vel_x: 6.0, vel_y: 0.0 },
        // right half
        Ball { x: 500.0, y: 100.0, vel_x: -6.0, vel_y: 0.0 },
    ];

    let picked = select_ball(&balls, Side::A, &cfg).expect("a ball approaches A");
    assert_eq!(picked.x, 80.0);
    assert!(select_ball(&balls, Side::B, &cfg).is_none());
}

#[test]
fn test_selected_ball_borrows_from_the_balls() {
    let balls = vec![
        Ball { x: 450.0, y: 120.0, vel_x: 6.0, vel_y: 0.0 },
        Ball { x: 560.0, y: 220.0, vel_x: 6.0, vel_y: 0.0 },
    ];

    // a per-frame config can go out of scope while the pick is still in use
    let picked = {
        let cfg = BattleConfig::default();
        select_ball(&balls, Side::B, &cfg)
    };

    assert_eq!(picked.map(|b| (b.x, b.y)), Some((560.0, 220.0)));
}

#[test]
fn test_urgency_rises_with_proximity() {
    let cfg = BattleConfig::default();
    assert_eq!(urgency(0.0, &cfg), 1.0);
    assert!((urgency(150.0, &cfg) - 0.5).abs() < 1e-9);
    assert_eq!(urgency(300.0, &cfg), cfg.urgency_floor);
    assert_eq!(urgency(10_000.0, &cfg), cfg.urgency_floor);
}

#[test]
fn test_track_moves_toward_ball() {
    let cfg = BattleConfig::default();
    let mut paddle = SideState::centered(&cfg);
    let start = paddle.paddle_y;
    // distance 150 from the plane at x=15 gives urgency 0.5
    let balls = vec![Ball { x: 165.0, y: 300.0, vel_x: -6.0, vel_y: 0.0 }];

    track(&mut paddle, Side::A, &balls, &cfg);

    let target = 300.0 - paddle.paddle_height / 2.0;
    let expected = start + (target - start) * 0.15 * 1.0 * 0.5;
    assert!((paddle.paddle_y - expected).abs() < 1e-9);
}

#[test]
fn test_speed_factor_scales_tracking() {
    let cfg = BattleConfig::default();
    let balls = vec![Ball { x: 500.0, y: 50.0, vel_x: 6.0, vel_y: 0.0 }];

    let mut calm = SideState::centered(&cfg);
    let mut volatile = SideState::centered(&cfg);
    volatile.paddle_speed_factor = 2.0;
    track(&mut calm, Side::B, &balls, &cfg);
    track(&mut volatile, Side::B, &balls, &cfg);

    let start = SideState::centered(&cfg).paddle_y;
    assert!(((start - volatile.paddle_y) - 2.0 * (start - calm.paddle_y)).abs() < 1e-9);
}

#[test]
fn test_idle_without_approaching_ball() {
    let cfg = BattleConfig::default();
    let mut paddle = SideState::centered(&cfg);
    let before = paddle.paddle_y;
    track(&mut paddle, Side::A, &[Ball { x: 100.0, y: 10.0, vel_x: 6.0, vel_y: 0.0 }], &cfg);
    assert_eq!(paddle.paddle_y, before);
}

#[test]
fn test_clamp_after_end_triggered() {
    let cfg = BattleConfig::default();
    let mut rng = StdRng::seed_from_u64(11);
    let mut state = MatchState::new(&cfg, 0, &mut rng);
    state.end_triggered = true;
    state.side_a.paddle_y = -40.0;
    state.side_b.paddle_height = 160.0;
    state.side_b.paddle_y = 390.0;
    state.balls = vec![Ball { x: 30.0, y: 10.0, vel_x: -6.0, vel_y: 0.0 }];

    update_paddles(&mut state, &cfg);

    assert_eq!(state.side_a.paddle_y, 0.0, "no tracking, but still clamped");
    assert_eq!(state.side_b.paddle_y, cfg.canvas_height - 160.0);
}

proptest! {
    #[test]
    fn prop_paddle_within_arena_after_update(
        y in -1000.0f64..1000.0,
        height in 60.0f64..160.0,
        speed in 1.0f64..50.0,
        ball_x in 0.0f64..600.0,
        ball_y in 0.0f64..400.0,
        vel_x in -20.0f64..20.0,
    ) {
        let cfg = BattleConfig::default();
        let mut rng = StdRng::seed_from_u64(0);
        let mut state = MatchState::new(&cfg, 0, &mut rng);
        for side in [Side::A, Side::B] {
            let s = state.side_mut(side);
            s.paddle_y = y;
            s.paddle_height = height;
            s.paddle_speed_factor = speed;
        }
        state.balls = vec![Ball { x: ball_x, y: ball_y, vel_x, vel_y: 0.0 }];

        update_paddles(&mut state, &cfg);

        for side in [Side::A, Side::B] {
            let s = state.side(side);
            prop_assert!(s.paddle_y >= 0.0);
            prop_assert!(s.paddle_y <= cfg.canvas_height - s.paddle_height);
        }
    }

    #[test]
    fn prop_clamp_is_idempotent(y in -1000.0f64..1000.0) {
        let cfg = BattleConfig::default();
        let mut s = SideState::centered(&cfg);
        s.paddle_y = y;
        clamp_paddle(&mut s, &cfg);
        let once = s.paddle_y;
        clamp_paddle(&mut s, &cfg);
        prop_assert_eq!(once, s.paddle_y);
    }
}
