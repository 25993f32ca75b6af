use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::types::{Asset, MatchState, Side};

/// Longest symbol the ledger accepts
pub const MAX_SYMBOL_LEN: usize = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Winner {
    A,
    B,
    #[serde(rename = "TIE")]
    Tie,
}

impl Winner {
    pub fn side(self) -> Option<Side> {
        match self {
            Winner::A => Some(Side::A),
            Winner::B => Some(Side::B),
            Winner::Tie => None,
        }
    }
}

/// Strictly-less-than tie test on the cumulative change gap.
pub fn decide_winner(change_a: f64, change_b: f64, tie_threshold: f64) -> Winner {
    if (change_a - change_b).abs() < tie_threshold {
        Winner::Tie
    } else if change_a > change_b {
        Winner::A
    } else {
        Winner::B
    }
}

/// Payload of the match-ended notification.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub asset_a: Asset,
    pub asset_b: Asset,
    pub winner: Winner,
    /// Rally points plus the match-win point
    pub final_score_a: u32,
    pub final_score_b: u32,
    pub rally_score_a: u32,
    pub rally_score_b: u32,
    pub cumulative_change_a: f64,
    pub cumulative_change_b: f64,
    /// |cumulative_change_a - cumulative_change_b| in percentage points
    pub margin_percent: f64,
    pub ended_at_ms: i64,
}

impl MatchResult {
    /// Build the result from final state. `state` must already carry the
    /// match-win point.
    pub fn from_state(
        asset_a: &Asset,
        asset_b: &Asset,
        winner: Winner,
        state: &MatchState,
        ended_at_ms: i64,
    ) -> Self {
        let a = &state.side_a;
        let b = &state.side_b;
        Self {
            asset_a: asset_a.clone(),
            asset_b: asset_b.clone(),
            winner,
            final_score_a: a.score(),
            final_score_b: b.score(),
            rally_score_a: a.rally_points,
            rally_score_b: b.rally_points,
            cumulative_change_a: a.cumulative_change_percent,
            cumulative_change_b: b.cumulative_change_percent,
            margin_percent: (a.cumulative_change_percent - b.cumulative_change_percent).abs(),
            ended_at_ms,
        }
    }

    pub fn winner_symbol(&self) -> &str {
        match self.winner {
            Winner::A => &self.asset_a.symbol,
            Winner::B => &self.asset_b.symbol,
            Winner::Tie => "TIE",
        }
    }
}

/// What the ledger records for one battle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleSubmission {
    pub coin_a: String,
    pub coin_b: String,
    pub winner: String,
    /// Margin in hundredths of a percentage point, truncated
    pub performance_delta: u64,
    pub score_a: u32,
    pub score_b: u32,
}

fn ledger_symbol(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii())
        .take(MAX_SYMBOL_LEN)
        .collect()
}

impl From<&MatchResult> for BattleSubmission {
    fn from(r: &MatchResult) -> Self {
        Self {
            coin_a: ledger_symbol(&r.asset_a.symbol),
            coin_b: ledger_symbol(&r.asset_b.symbol),
            winner: ledger_symbol(r.winner_symbol()),
            performance_delta: (r.margin_percent.abs() * 100.0).floor() as u64,
            score_a: r.final_score_a,
            score_b: r.final_score_b,
        }
    }
}

/// SHA-256 over a canonical encoding of the submission.
/// Strings are length-prefixed (u32 LE), integers little-endian.
pub fn compute_submission_hash(s: &BattleSubmission) -> [u8; 32] {
    let mut buf = Vec::with_capacity(12 + 3 * (4 + MAX_SYMBOL_LEN) + 16);
    buf.extend_from_slice(b"PONGBATTLEv1");
    for field in [&s.coin_a, &s.coin_b, &s.winner] {
        buf.extend_from_slice(&(field.len() as u32).to_le_bytes());
        buf.extend_from_slice(field.as_bytes());
    }
    buf.extend_from_slice(&s.performance_delta.to_le_bytes());
    buf.extend_from_slice(&s.score_a.to_le_bytes());
    buf.extend_from_slice(&s.score_b.to_le_bytes());

    let out = Sha256::digest(&buf);
    let mut arr = [0u8; 32];
    arr.copy_from_slice(&out);
    arr
}
