use std::thread;
use std::time::{Duration, Instant};

use battle_core::{BattleConfig, BattleSession, MatchResult};
use rand::Rng;
use tracing::debug;

/// Milliseconds since the Unix epoch.
pub fn wall_clock_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Time source and frame pacing for the loop.
pub trait FrameClock {
    fn now_ms(&self) -> i64;

    /// Block (or not) until the next frame is due.
    fn wait_next_frame(&mut self);
}

/// Simulated time: every frame advances exactly `1000 / fps` ms, no sleeping.
#[derive(Clone, Debug)]
pub struct VirtualClock {
    start_ms: i64,
    fps: u32,
    frame: i64,
}

impl VirtualClock {
    pub fn new(start_ms: i64, fps: u32) -> Self {
        Self { start_ms, fps: fps.max(1), frame: 0 }
    }

    pub fn frames(&self) -> i64 {
        self.frame
    }
}

impl FrameClock for VirtualClock {
    fn now_ms(&self) -> i64 {
        self.start_ms + self.frame * 1000 / self.fps as i64
    }

    fn wait_next_frame(&mut self) {
        self.frame += 1;
    }
}

/// Wall-clock time paced to a fixed frame interval.
#[derive(Clone, Debug)]
pub struct SystemClock {
    frame_interval: Duration,
    last_frame: Instant,
}

impl SystemClock {
    pub fn new(fps: u32) -> Self {
        Self {
            frame_interval: Duration::from_secs(1) / fps.max(1),
            last_frame: Instant::now(),
        }
    }
}

impl FrameClock for SystemClock {
    fn now_ms(&self) -> i64 {
        wall_clock_ms()
    }

    fn wait_next_frame(&mut self) {
        let due = self.last_frame + self.frame_interval;
        let now = Instant::now();
        if due > now {
            thread::sleep(due - now);
        }
        self.last_frame = Instant::now();
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum LoopExit {
    Finished(MatchResult),
    /// The cancel token was tripped by someone other than the match end.
    Cancelled,
    /// The session had no running match, or the frame cap was hit.
    Stopped,
}

/// Drives a session: one frame per tick, the countdown on its own coarser
/// cadence, and a cancel check before every tick.
#[derive(Clone, Copy, Debug)]
pub struct FrameLoop {
    countdown_interval_ms: i64,
    max_frames: Option<u64>,
}

impl FrameLoop {
    pub fn new(cfg: &BattleConfig) -> Self {
        Self { countdown_interval_ms: cfg.countdown_interval_ms.max(1), max_frames: None }
    }

    pub fn with_max_frames(mut self, max_frames: u64) -> Self {
        self.max_frames = Some(max_frames);
        self
    }

    pub fn run<R: Rng, C: FrameClock>(&self, session: &mut BattleSession<R>, clock: &mut C) -> LoopExit {
        let token = session.cancel_token();
        let mut next_countdown = clock.now_ms();
        let mut frames: u64 = 0;

        loop {
            if token.is_cancelled() {
                return match session.result() {
                    Some(r) => LoopExit::Finished(r.clone()),
                    None => LoopExit::Cancelled,
                };
            }
            if self.max_frames.is_some_and(|max| frames >= max) {
                debug!(frames, "frame cap reached");
                return LoopExit::Stopped;
            }

            let now = clock.now_ms();
            if !session.frame(now) {
                return LoopExit::Stopped;
            }
            frames += 1;

            while now >= next_countdown {
                if let Some(result) = session.countdown(now) {
                    debug!(frames, "loop finished");
                    return LoopExit::Finished(result);
                }
                next_countdown += self.countdown_interval_ms;
            }

            clock.wait_next_frame();
        }
    }
}
