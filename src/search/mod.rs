//! Iterative-deepening alpha-beta search over a pool of workers.

pub mod constants;
mod orderer;
mod pool;
mod stack;
mod worker;

use std::sync::Arc;
use std::time::Instant;

use crate::board::Move;

pub use pool::{SearchPool, DEFAULT_TT_MB};
pub use stack::{HistoryTables, SearchStack};

use constants::{MATE_BOUND, MATE_SCORE};

/// Limits for one `go`: any combination of depth, node and time bounds.
#[derive(Clone, Copy, Debug, Default)]
pub struct SearchLimits {
    pub max_depth: Option<u32>,
    pub node_limit: Option<u64>,
    /// Finish the current iteration, then stop
    pub soft_deadline: Option<Instant>,
    /// Stop mid-iteration
    pub hard_deadline: Option<Instant>,
}

impl SearchLimits {
    #[must_use]
    pub fn depth(max_depth: u32) -> Self {
        SearchLimits {
            max_depth: Some(max_depth),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn nodes(node_limit: u64) -> Self {
        SearchLimits {
            node_limit: Some(node_limit),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn movetime(start: Instant, ms: u64) -> Self {
        let deadline = start + std::time::Duration::from_millis(ms);
        SearchLimits {
            soft_deadline: Some(deadline),
            hard_deadline: Some(deadline),
            ..Default::default()
        }
    }
}

/// One completed iteration, reported by the main worker.
#[derive(Clone, Debug)]
pub struct SearchInfo {
    pub depth: u32,
    pub seldepth: u32,
    pub score: i32,
    /// Full moves to mate, signed, when the score is a mate score
    pub mate_in: Option<i32>,
    pub nodes: u64,
    pub nps: u64,
    pub time_ms: u64,
    pub hashfull: u32,
    pub pv: Vec<Move>,
}

/// Per-iteration reporting hook, shared with the main worker.
pub type InfoCallback = Arc<dyn Fn(&SearchInfo) + Send + Sync>;

/// Final outcome of a `go`.
#[derive(Clone, Debug)]
pub struct SearchReport {
    pub best_move: Option<Move>,
    pub score: i32,
    pub depth: u32,
    pub nodes: u64,
    pub pv: Vec<Move>,
}

/// Signed full-move mate distance of a mate score.
#[must_use]
pub fn mate_in(score: i32) -> Option<i32> {
    if score >= MATE_BOUND {
        Some((MATE_SCORE - score + 1) / 2)
    } else if score <= -MATE_BOUND {
        Some(-(MATE_SCORE + score + 1) / 2)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mate_in_full_moves() {
        assert_eq!(mate_in(MATE_SCORE - 1), Some(1));
        assert_eq!(mate_in(MATE_SCORE - 3), Some(2));
        assert_eq!(mate_in(-(MATE_SCORE - 2)), Some(-1));
        assert_eq!(mate_in(150), None);
    }
}
