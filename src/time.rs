//! Time budgeting for clock-driven searches.
//!
//! Turns the UCI clock fields into a soft budget (finish the current
//! iteration, then stop) and a hard budget (stop mid-iteration), with
//! an overhead reserve and a panic mode for low clocks.

use std::time::{Duration, Instant};

use crate::search::SearchLimits;

/// Default moves-to-go estimate when the GUI does not send one
const DEFAULT_MOVES_TO_GO: u64 = 30;

/// Time reserved per move for I/O latency
const MOVE_OVERHEAD_MS: u64 = 25;

/// Below this remaining clock, spend almost nothing per move
const PANIC_THRESHOLD_MS: u64 = 2000;

/// Soft budget as a fraction of the per-move allocation
const SOFT_NUMERATOR: u64 = 6;
const SOFT_DENOMINATOR: u64 = 10;

/// Hard budget cap as a fraction of the remaining clock
const HARD_CLOCK_FRACTION: u64 = 4;

/// How the clock constrains one search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeControl {
    /// No time limit at all
    #[default]
    Infinite,
    /// Exactly this long, no discretion
    MoveTime { ms: u64 },
    /// Remaining clock plus increment, optionally with a known number
    /// of moves to the next control
    Clock {
        remaining_ms: u64,
        increment_ms: u64,
        moves_to_go: Option<u64>,
    },
}

impl TimeControl {
    /// Compute `(soft_ms, hard_ms)` budgets, or `None` for unlimited.
    #[must_use]
    pub fn budget(&self) -> Option<(u64, u64)> {
        match *self {
            TimeControl::Infinite => None,
            TimeControl::MoveTime { ms } => {
                let ms = ms.max(1);
                Some((ms, ms))
            }
            TimeControl::Clock {
                remaining_ms,
                increment_ms,
                moves_to_go,
            } => Some(clock_budget(remaining_ms, increment_ms, moves_to_go)),
        }
    }

    /// Attach this control's deadlines to a set of search limits.
    #[must_use]
    pub fn apply(&self, mut limits: SearchLimits, start: Instant) -> SearchLimits {
        if let Some((soft_ms, hard_ms)) = self.budget() {
            limits.soft_deadline = Some(start + Duration::from_millis(soft_ms));
            limits.hard_deadline = Some(start + Duration::from_millis(hard_ms));
        }
        limits
    }
}

fn clock_budget(remaining_ms: u64, increment_ms: u64, moves_to_go: Option<u64>) -> (u64, u64) {
    let safe_ms = remaining_ms.saturating_sub(MOVE_OVERHEAD_MS);

    // Nearly flagged: answer instantly with whatever is left
    if safe_ms == 0 {
        let fallback = (remaining_ms / 2).max(1);
        return (fallback, fallback);
    }

    // Panic mode: tiny fixed fraction per move
    if safe_ms < PANIC_THRESHOLD_MS {
        let soft = (safe_ms / 40 + increment_ms / 2).max(1);
        let hard = (safe_ms / 10).max(soft);
        return (soft, hard);
    }

    let moves_to_go = moves_to_go.unwrap_or(DEFAULT_MOVES_TO_GO).max(2);
    let per_move = safe_ms / moves_to_go + increment_ms;

    let soft = (per_move * SOFT_NUMERATOR / SOFT_DENOMINATOR).max(1);
    let hard = (per_move * 2)
        .min(safe_ms / HARD_CLOCK_FRACTION)
        .max(soft);
    (soft, hard)
}
