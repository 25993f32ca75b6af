/// Maps elapsed wall time onto match progress and a sample index.
#[derive(Clone, Debug, PartialEq)]
pub struct MatchClock {
    start_ms: i64,
    duration_ms: i64,
    sample_len: usize,
    sample_index: usize,
}

impl MatchClock {
    pub fn new(start_ms: i64, duration_ms: i64, sample_len: usize) -> Self {
        Self {
            start_ms,
            duration_ms,
            sample_len,
            sample_index: 0,
        }
    }

    pub fn start_ms(&self) -> i64 {
        self.start_ms
    }

    pub fn sample_index(&self) -> usize {
        self.sample_index
    }

    pub fn elapsed_ms(&self, now_ms: i64) -> i64 {
        now_ms - self.start_ms
    }

    /// Unclamped: values above 1 mean the match has run out.
    pub fn progress(&self, now_ms: i64) -> f64 {
        self.elapsed_ms(now_ms) as f64 / self.duration_ms as f64
    }

    /// Index the clock would report at `now_ms`, before range checks.
    pub fn index_at(&self, now_ms: i64) -> i64 {
        let span = self.sample_len.saturating_sub(1) as f64;
        (self.progress(now_ms) * span).floor() as i64
    }

    /// Move to the index for `now_ms` and report it if it is a new, in-range
    /// index. The stored index never decreases.
    pub fn advance(&mut self, now_ms: i64) -> Option<usize> {
        let idx = self.index_at(now_ms);
        if idx < 0 || idx as usize >= self.sample_len {
            return None;
        }
        let idx = idx as usize;
        if idx <= self.sample_index {
            return None;
        }
        self.sample_index = idx;
        Some(idx)
    }

    /// Whole seconds left, rounded up and floored at zero.
    pub fn remaining_secs(&self, now_ms: i64) -> u64 {
        let left = self.duration_ms - self.elapsed_ms(now_ms);
        if left <= 0 {
            return 0;
        }
        ((left + 999) / 1000) as u64
    }

    pub fn is_over(&self, now_ms: i64) -> bool {
        self.remaining_secs(now_ms) == 0
    }
}
