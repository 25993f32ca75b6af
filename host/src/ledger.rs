use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use battle_core::result::MAX_SYMBOL_LEN;
use battle_core::{compute_submission_hash, BattleSubmission, MatchObserver, MatchResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

/// Player recorded when a submitter does not name one
pub const DEFAULT_PLAYER: &str = "anonymous";

/// Longest accepted player name
pub const MAX_PLAYER_LEN: usize = 64;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("ledger rejected submission: {0}")]
    Rejected(String),
}

/// A submitted battle as the ledger stores it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BattleRecord {
    /// 1-based, in submission order
    pub id: u64,
    pub player: String,
    pub submission: BattleSubmission,
    /// Hex SHA-256 of the submission
    pub hash: String,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetStats {
    pub battles: u32,
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
}

/// What one player has submitted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    pub battles: u32,
    pub decided: u32,
    pub ties: u32,
    /// Largest `performance_delta` among the player's battles
    pub best_delta: u64,
    pub last_battle_id: Option<u64>,
}

/// Where finished battles are recorded.
pub trait Ledger {
    fn submit(&mut self, player: &str, submission: BattleSubmission) -> Result<BattleRecord, LedgerError>;

    fn battle_by_id(&self, id: u64) -> Option<BattleRecord>;

    fn battle_count(&self) -> u64;

    /// Newest first.
    fn recent_battles(&self, limit: usize) -> Vec<BattleRecord> {
        let count = self.battle_count();
        (1..=count)
            .rev()
            .take(limit)
            .filter_map(|id| self.battle_by_id(id))
            .collect()
    }

    fn asset_stats(&self, symbol: &str) -> AssetStats;

    fn user_stats(&self, player: &str) -> UserStats;
}

#[derive(Debug, Default)]
pub struct MemoryLedger {
    records: Vec<BattleRecord>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn check_ascii(field: &str, s: &str, max: usize) -> Result<(), LedgerError> {
    if s.is_empty() || s.len() > max || !s.is_ascii() {
        return Err(LedgerError::Rejected(format!(
            "{} must be 1-{} ASCII characters, got '{}'",
            field, max, s
        )));
    }
    Ok(())
}

impl Ledger for MemoryLedger {
    fn submit(&mut self, player: &str, submission: BattleSubmission) -> Result<BattleRecord, LedgerError> {
        check_ascii("player", player, MAX_PLAYER_LEN)?;
        check_ascii("coin_a", &submission.coin_a, MAX_SYMBOL_LEN)?;
        check_ascii("coin_b", &submission.coin_b, MAX_SYMBOL_LEN)?;
        check_ascii("winner", &submission.winner, MAX_SYMBOL_LEN)?;

        let record = BattleRecord {
            id: self.records.len() as u64 + 1,
            player: player.to_string(),
            hash: hex::encode(compute_submission_hash(&submission)),
            submission,
            submitted_at: Utc::now(),
        };
        self.records.push(record.clone());
        Ok(record)
    }

    fn battle_by_id(&self, id: u64) -> Option<BattleRecord> {
        let idx = usize::try_from(id.checked_sub(1)?).ok()?;
        self.records.get(idx).cloned()
    }

    fn battle_count(&self) -> u64 {
        self.records.len() as u64
    }

    fn asset_stats(&self, symbol: &str) -> AssetStats {
        let symbol = symbol.to_uppercase();
        let mut stats = AssetStats::default();
        for r in &self.records {
            let s = &r.submission;
            if s.coin_a != symbol && s.coin_b != symbol {
                continue;
            }
            stats.battles += 1;
            if s.winner == "TIE" {
                stats.ties += 1;
            } else if s.winner == symbol {
                stats.wins += 1;
            } else {
                stats.losses += 1;
            }
        }
        stats
    }

    fn user_stats(&self, player: &str) -> UserStats {
        let mut stats = UserStats::default();
        for r in self.records.iter().filter(|r| r.player == player) {
            stats.battles += 1;
            if r.submission.winner == "TIE" {
                stats.ties += 1;
            } else {
                stats.decided += 1;
            }
            stats.best_delta = stats.best_delta.max(r.submission.performance_delta);
            stats.last_battle_id = Some(r.id);
        }
        stats
    }
}

/// Forwards match results to the ledger worker without waiting on it.
#[derive(Clone)]
pub struct LedgerObserver {
    tx: Sender<(String, BattleSubmission)>,
    player: String,
}

impl LedgerObserver {
    /// Same worker, submitting on behalf of `player`.
    pub fn with_player(mut self, player: impl Into<String>) -> Self {
        self.player = player.into();
        self
    }

    pub fn player(&self) -> &str {
        &self.player
    }
}

impl MatchObserver for LedgerObserver {
    fn on_match_ended(&mut self, result: &MatchResult) {
        let submission = BattleSubmission::from(result);
        if self.tx.send((self.player.clone(), submission)).is_err() {
            warn!("ledger worker has stopped; battle not submitted");
        }
    }
}

/// Start a background submitter. The worker exits once every observer it
/// handed out is dropped, returning the number of accepted submissions.
pub fn spawn_ledger_worker<L>(ledger: Arc<Mutex<L>>) -> (LedgerObserver, JoinHandle<usize>)
where
    L: Ledger + Send + 'static,
{
    let (tx, rx) = mpsc::channel::<(String, BattleSubmission)>();
    let handle = thread::spawn(move || {
        let mut accepted = 0;
        for (player, submission) in rx {
            let Ok(mut guard) = ledger.lock() else {
                warn!("ledger lock poisoned; dropping pending submissions");
                break;
            };
            match guard.submit(&player, submission) {
                Ok(record) => {
                    accepted += 1;
                    info!(id = record.id, player = %record.player, hash = %record.hash, "battle submitted");
                }
                Err(e) => warn!("battle submission failed: {}", e),
            }
        }
        accepted
    });
    (LedgerObserver { tx, player: DEFAULT_PLAYER.to_string() }, handle)
}
