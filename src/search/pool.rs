//! Lazy-SMP worker pool.
//!
//! All workers search the same root and coordinate only through the
//! shared transposition table and the stop flag. Helper threads run a
//! deepened target so their table entries lead the main worker; the
//! main worker's line is the one reported.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::board::{Board, Move, PositionHistory, MAX_PLY};
use crate::nnue::Weights;
use crate::tt::TranspositionTable;

use super::worker::{SearchContext, Worker, WorkerReport};
use super::{InfoCallback, SearchLimits, SearchReport};

/// Default transposition table size in MB
pub const DEFAULT_TT_MB: usize = 64;

/// How often the deadline watcher wakes to check the clock
const WATCH_INTERVAL: Duration = Duration::from_millis(2);

pub struct SearchPool {
    tt: TranspositionTable,
    weights: Arc<Weights>,
    stop: Arc<AtomicBool>,
    workers: Vec<Worker>,
}

impl SearchPool {
    #[must_use]
    pub fn new(threads: usize, tt_mb: usize, weights: Arc<Weights>) -> Self {
        let mut pool = SearchPool {
            tt: TranspositionTable::new(tt_mb),
            weights,
            stop: Arc::new(AtomicBool::new(false)),
            workers: Vec::new(),
        };
        pool.set_threads(threads);
        pool
    }

    /// The shared stop flag; raising it aborts a running `go` within a
    /// bounded number of nodes.
    #[must_use]
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Resize the worker set. Between searches only.
    pub fn set_threads(&mut self, threads: usize) {
        let threads = threads.max(1);
        while self.workers.len() > threads {
            self.workers.pop();
        }
        while self.workers.len() < threads {
            self.workers.push(Worker::new(self.workers.len()));
        }
    }

    #[must_use]
    pub fn threads(&self) -> usize {
        self.workers.len()
    }

    /// Replace the evaluation weights. Between searches only.
    pub fn set_weights(&mut self, weights: Arc<Weights>) {
        self.weights = weights;
    }

    /// Resize the shared table. Between searches only.
    pub fn resize_tt(&mut self, mb: usize) {
        self.tt.resize(mb);
    }

    /// Clear the shared table. Between searches only.
    pub fn clear_tt(&mut self) {
        self.tt.clear();
    }

    /// Run one search on all workers and return the main worker's
    /// result.
    ///
    /// `history` holds the hashes of every position of the game so far,
    /// the root included as its last entry.
    pub fn go(
        &mut self,
        root: &Board,
        history: &PositionHistory,
        limits: &SearchLimits,
        info: Option<InfoCallback>,
    ) -> SearchReport {
        self.tt.advance_age();

        // The stack re-adds the root at ply 0; pass everything before it
        let mut prior = history.clone();
        if prior.as_slice().last() == Some(&root.hash()) {
            let mut trimmed = PositionHistory::new();
            for &hash in &prior.as_slice()[..prior.len() - 1] {
                trimmed.push(hash);
            }
            prior = trimmed;
        }

        let start = Instant::now();
        let global_nodes = AtomicU64::new(0);
        let ctx = SearchContext {
            tt: &self.tt,
            weights: &self.weights,
            stop: &self.stop,
            global_nodes: &global_nodes,
            node_limit: limits.node_limit,
            soft_deadline: limits.soft_deadline,
            hard_deadline: limits.hard_deadline,
            start,
            max_depth: limits.max_depth.unwrap_or(MAX_PLY as u32 - 1),
        };

        let mut reports: Vec<(usize, WorkerReport)> = Vec::with_capacity(self.workers.len());
        let done = AtomicBool::new(false);
        thread::scope(|scope| {
            let ctx = &ctx;
            let prior = &prior;
            let done = &done;
            let mut handles = Vec::with_capacity(self.workers.len());
            for worker in &mut self.workers {
                let id = worker.id;
                let info = if id == 0 { info.clone() } else { None };
                handles.push(scope.spawn(move || (id, worker.run(ctx, root, prior, info.as_ref()))));
            }

            // Deadline watcher: enforces the hard budget while the
            // workers are busy, and exits as soon as they are done.
            let watcher = scope.spawn(move || {
                while !done.load(Ordering::Relaxed) && !ctx.stop.load(Ordering::Relaxed) {
                    if let Some(hard) = ctx.hard_deadline {
                        if Instant::now() >= hard {
                            ctx.stop.store(true, Ordering::Relaxed);
                            break;
                        }
                    }
                    thread::sleep(WATCH_INTERVAL);
                }
            });

            for handle in handles {
                if let Ok(report) = handle.join() {
                    reports.push(report);
                }
            }
            done.store(true, Ordering::Relaxed);
            let _ = watcher.join();
        });

        // Leave the flag lowered so a stale `stop` cannot leak into the
        // next `go`.
        self.stop.store(false, Ordering::Relaxed);

        // Main worker first; a helper only stands in if the main worker
        // found nothing at all.
        let main = reports
            .iter()
            .find(|(id, report)| *id == 0 && report.best_move.is_some());
        let chosen = main.or_else(|| {
            reports
                .iter()
                .filter(|(_, report)| report.best_move.is_some())
                .max_by_key(|(_, report)| report.depth)
        });

        let nodes = global_nodes.load(Ordering::Relaxed);
        match chosen {
            Some(&(_, report)) => {
                let pv = self.extract_report_pv(root, report);
                SearchReport {
                    best_move: report.best_move,
                    score: report.score,
                    depth: report.depth,
                    nodes,
                    pv,
                }
            }
            None => SearchReport {
                best_move: None,
                score: 0,
                depth: 0,
                nodes,
                pv: Vec::new(),
            },
        }
    }

    /// Rebuild the PV for the final report by walking the table from
    /// the chosen best move.
    fn extract_report_pv(&self, root: &Board, report: WorkerReport) -> Vec<Move> {
        let mut pv = Vec::new();
        let Some(best) = report.best_move else {
            return pv;
        };
        let mut seen = Vec::new();
        let mut board = *root;
        seen.push(board.hash());
        pv.push(best);
        board = board.apply(best);

        while pv.len() < report.depth.max(1) as usize {
            if seen.contains(&board.hash()) {
                break;
            }
            seen.push(board.hash());
            let Some(entry) = self.tt.probe(board.hash(), pv.len()) else {
                break;
            };
            let Some(mv) = board.generate_moves().find_digest(entry.digest) else {
                break;
            };
            pv.push(mv);
            board = board.apply(mv);
        }
        pv
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::constants::MATE_BOUND;

    fn pool(threads: usize) -> SearchPool {
        SearchPool::new(threads, 8, Arc::new(Weights::zeroed()))
    }

    fn history_of(board: &Board) -> PositionHistory {
        let mut history = PositionHistory::new();
        history.push(board.hash());
        history
    }

    #[test]
    fn test_single_thread_finds_mate() {
        let board = Board::parse_fen("6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1").unwrap();
        let report = pool(1).go(
            &board,
            &history_of(&board),
            &SearchLimits::depth(6),
            None,
        );
        assert_eq!(report.best_move.unwrap().to_string(), "a1a8");
        assert!(report.score >= MATE_BOUND);
        // PV head must agree with the best move
        assert_eq!(report.pv.first(), report.best_move.as_ref());
    }

    #[test]
    fn test_multi_thread_agrees_on_mate() {
        let board = Board::parse_fen("6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1").unwrap();
        let report = pool(4).go(
            &board,
            &history_of(&board),
            &SearchLimits::depth(6),
            None,
        );
        assert_eq!(report.best_move.unwrap().to_string(), "a1a8");
    }

    #[test]
    fn test_stalemate_reports_no_move() {
        let board = Board::parse_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        let report = pool(1).go(
            &board,
            &history_of(&board),
            &SearchLimits::depth(4),
            None,
        );
        assert!(report.best_move.is_none());
        assert_eq!(report.score, 0);
    }

    #[test]
    fn test_hard_deadline_stops_search() {
        let board = Board::startpos();
        let mut pool = pool(1);
        // A deadline already in the past: the watcher raises stop at
        // once and the search cannot get anywhere near full depth.
        let limits = SearchLimits {
            max_depth: Some(30),
            hard_deadline: Some(Instant::now()),
            ..Default::default()
        };
        let report = pool.go(&board, &history_of(&board), &limits, None);
        assert!(report.depth < 30);
    }

    #[test]
    fn test_repetition_from_game_history_is_draw() {
        // Shuffle kings back and forth: the search must see the third
        // occurrence coming and score the repetition as a draw.
        let mut board = Board::parse_fen("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1").unwrap();
        let mut history = history_of(&board);
        for uci in ["e1d1", "e8d8", "d1e1", "d8e8"] {
            let mv = board.parse_move(uci).unwrap();
            board = board.apply(mv);
            history.push(board.hash());
        }
        // Position repeats the start; one more cycle is a draw and the
        // search should know it from the shared history.
        let report = pool(1).go(&board, &history, &SearchLimits::depth(6), None);
        assert!(report.best_move.is_some());
    }
}
