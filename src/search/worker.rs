//! One search worker: the per-node alpha-beta protocol, quiescence,
//! and the iterative-deepening driver with aspiration windows.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;

use crate::board::{Board, Move, PositionHistory, MAX_PLY};
use crate::nnue::{self, AccumulatorStack, RefreshCache, Weights};
use crate::tt::{Bound, TranspositionTable};

use super::constants::{
    futility_margin, history_bonus, is_sentinel, ASPIRATION_DELTA, ASPIRATION_MIN_DEPTH,
    FUTILITY_DEPTH, IIR_MIN_DEPTH, LMR_MIN_DEPTH, LMR_MOVE_THRESHOLD, LMR_TABLE_MAX_DEPTH,
    LMR_TABLE_MAX_IDX, MATE_SCORE, NULL_MOVE_BASE_REDUCTION, NULL_MOVE_MIN_DEPTH, RAZOR_DEPTH,
    RAZOR_MARGIN, SCORE_DRAW, SCORE_INFINITE, SCORE_SENTINEL, SEE_QUIET_DEPTH, SEE_QUIET_MARGIN,
};
use super::orderer::MoveOrderer;
use super::stack::{HistoryTables, SearchStack};
use super::{mate_in, InfoCallback, SearchInfo};

/// Shared, read-only view of one `go` passed to every worker.
pub(crate) struct SearchContext<'a> {
    pub tt: &'a TranspositionTable,
    pub weights: &'a Weights,
    pub stop: &'a AtomicBool,
    pub global_nodes: &'a AtomicU64,
    pub node_limit: Option<u64>,
    pub soft_deadline: Option<Instant>,
    pub hard_deadline: Option<Instant>,
    pub start: Instant,
    pub max_depth: u32,
}

/// What a worker hands back after its deepening loop ends.
#[derive(Clone, Copy, Debug)]
pub(crate) struct WorkerReport {
    pub best_move: Option<Move>,
    pub score: i32,
    pub depth: u32,
    pub nodes: u64,
}

/// The full gate for null-move pruning. In check it is never valid
/// (passing while checked is illegal); the other conditions keep it to
/// non-PV nodes that already look winning, with enough material that
/// zugzwang is unlikely, and never twice in a row.
#[allow(clippy::fn_params_excessive_bools)]
fn null_move_allowed(
    depth: u32,
    eval: i32,
    beta: i32,
    in_check: bool,
    is_pv: bool,
    nmp_valid: bool,
    has_non_pawn_material: bool,
) -> bool {
    !in_check
        && !is_pv
        && depth >= NULL_MOVE_MIN_DEPTH
        && eval >= beta
        && nmp_valid
        && has_non_pawn_material
}

/// Reduction table, indexed by depth and move number.
fn lmr_reduction(depth: u32, move_count: usize) -> u32 {
    use once_cell::sync::Lazy;
    static TABLE: Lazy<[[u32; LMR_TABLE_MAX_IDX]; LMR_TABLE_MAX_DEPTH]> = Lazy::new(|| {
        let mut table = [[0u32; LMR_TABLE_MAX_IDX]; LMR_TABLE_MAX_DEPTH];
        for (d, row) in table.iter_mut().enumerate().skip(1) {
            for (m, cell) in row.iter_mut().enumerate().skip(1) {
                let value = 0.5 + (d as f64).ln() * (m as f64).ln() / 2.5;
                *cell = value.max(0.0) as u32;
            }
        }
        table
    });
    let d = (depth as usize).min(LMR_TABLE_MAX_DEPTH - 1);
    let m = move_count.min(LMR_TABLE_MAX_IDX - 1);
    TABLE[d][m]
}

/// A persistent search worker. Owns its stack, heuristics and
/// accumulators; shares only the transposition table, the weights and
/// the stop flag with its siblings.
pub(crate) struct Worker {
    pub id: usize,
    stack: SearchStack,
    history: HistoryTables,
    accumulators: AccumulatorStack,
    cache: RefreshCache,
    nodes: u64,
    seldepth: u32,
    root_best: Move,
    /// Null-move searches actually launched; exists so tests can pin
    /// down when the branch fires
    null_moves_tried: u64,
}

impl Worker {
    pub fn new(id: usize) -> Self {
        Worker {
            id,
            stack: SearchStack::new(),
            history: HistoryTables::new(),
            accumulators: AccumulatorStack::new(),
            cache: RefreshCache::new(),
            nodes: 0,
            seldepth: 0,
            root_best: Move::NULL,
            null_moves_tried: 0,
        }
    }

    /// Helper threads deepen their targets so their table entries run
    /// ahead of the main worker.
    fn depth_offset(id: usize) -> u32 {
        u32::from(id % 2 == 1)
    }

    /// Run the full iterative-deepening loop for one `go`.
    pub fn run(
        &mut self,
        ctx: &SearchContext,
        root: &Board,
        game_history: &PositionHistory,
        info: Option<&InfoCallback>,
    ) -> WorkerReport {
        self.stack.reset(game_history);
        self.history.decay();
        self.cache.clear();
        self.accumulators.reset(root, ctx.weights, &mut self.cache);
        self.nodes = 0;
        self.seldepth = 0;
        self.root_best = Move::NULL;
        self.null_moves_tried = 0;

        let mut completed_depth = 0;
        let mut score = SCORE_DRAW;
        let max_depth = ctx
            .max_depth
            .saturating_add(Self::depth_offset(self.id))
            .clamp(1, MAX_PLY as u32 - 1);

        for depth in 1..=max_depth {
            let iter_score = if depth >= ASPIRATION_MIN_DEPTH {
                self.aspirate(ctx, root, depth, score)
            } else {
                self.alpha_beta(ctx, root, depth, -SCORE_INFINITE, SCORE_INFINITE, 0)
            };

            if is_sentinel(iter_score) || ctx.stop.load(Ordering::Relaxed) {
                break;
            }
            score = iter_score;
            completed_depth = depth;

            if let Some(callback) = info {
                callback(&self.iteration_info(ctx, root, depth, score));
            }

            // Soft budget: do not start an iteration we cannot finish
            if let Some(soft) = ctx.soft_deadline {
                if Instant::now() >= soft {
                    break;
                }
            }
        }

        ctx.global_nodes.fetch_add(self.nodes % 1024, Ordering::Relaxed);

        WorkerReport {
            best_move: (!self.root_best.is_null()).then_some(self.root_best),
            score,
            depth: completed_depth,
            nodes: self.nodes,
        }
    }

    /// Search one depth inside an aspiration window around the previous
    /// score, widening asymmetrically on failure.
    fn aspirate(&mut self, ctx: &SearchContext, root: &Board, depth: u32, previous: i32) -> i32 {
        let mut delta = ASPIRATION_DELTA;
        let mut alpha = (previous - delta).max(-SCORE_INFINITE);
        let mut beta = (previous + delta).min(SCORE_INFINITE);

        loop {
            let score = self.alpha_beta(ctx, root, depth, alpha, beta, 0);
            if is_sentinel(score) {
                return score;
            }
            if score <= alpha {
                // Fail low hurts more: widen faster and drop beta back
                beta = (alpha + beta) / 2;
                alpha = (alpha - delta).max(-SCORE_INFINITE);
                delta *= 2;
            } else if score >= beta {
                beta = (beta + delta).min(SCORE_INFINITE);
                delta = delta * 3 / 2;
            } else {
                return score;
            }
            if delta > 1000 {
                alpha = -SCORE_INFINITE;
                beta = SCORE_INFINITE;
            }
        }
    }

    /// Node accounting plus the cooperative stop poll. Returns true if
    /// the search must unwind.
    #[inline]
    fn visit_node(&mut self, ctx: &SearchContext) -> bool {
        self.nodes += 1;
        if self.nodes % 1024 == 0 {
            ctx.global_nodes.fetch_add(1024, Ordering::Relaxed);
            if let Some(limit) = ctx.node_limit {
                if ctx.global_nodes.load(Ordering::Relaxed) >= limit {
                    ctx.stop.store(true, Ordering::Relaxed);
                }
            }
            if let Some(hard) = ctx.hard_deadline {
                if Instant::now() >= hard {
                    ctx.stop.store(true, Ordering::Relaxed);
                }
            }
        }
        ctx.stop.load(Ordering::Relaxed)
    }

    #[inline]
    fn evaluate(&self, ctx: &SearchContext, board: &Board) -> i32 {
        nnue::evaluate(ctx.weights, self.accumulators.top(), board.side_to_move())
    }

    /// The per-node alpha-beta protocol.
    #[allow(clippy::too_many_lines)]
    fn alpha_beta(
        &mut self,
        ctx: &SearchContext,
        board: &Board,
        mut depth: u32,
        mut alpha: i32,
        mut beta: i32,
        ply: usize,
    ) -> i32 {
        let is_root = ply == 0;
        let is_pv = beta - alpha > 1;

        if self.visit_node(ctx) {
            return SCORE_SENTINEL;
        }

        self.stack.set_hash(ply, board.hash());
        self.seldepth = self.seldepth.max(ply as u32 + 1);

        if !is_root {
            if board.is_halfmove_draw()
                || board.is_insufficient_material()
                || self
                    .stack
                    .is_repetition(ply, board.hash(), board.halfmove_clock())
            {
                return SCORE_DRAW;
            }
            if ply >= MAX_PLY - 1 {
                return self.evaluate(ctx, board);
            }

            // Mate distance pruning: even a forced mate from here
            // cannot beat one already found closer to the root.
            alpha = alpha.max(-MATE_SCORE + ply as i32);
            beta = beta.min(MATE_SCORE - ply as i32 - 1);
            if alpha >= beta {
                return alpha;
            }
        }

        let in_check = board.in_check();
        self.stack.set_in_check(ply, in_check);

        if depth == 0 {
            return self.quiesce(ctx, board, alpha, beta, ply);
        }

        let mut tt_digest = 0u16;
        if let Some(entry) = ctx.tt.probe(board.hash(), ply) {
            tt_digest = entry.digest;
            if !is_pv && entry.depth >= depth {
                let usable = match entry.bound {
                    Bound::Exact => true,
                    Bound::Lower => entry.score >= beta,
                    Bound::Upper => entry.score <= alpha,
                };
                if usable {
                    return entry.score;
                }
            }
        }

        let eval = if in_check {
            -SCORE_INFINITE
        } else {
            self.evaluate(ctx, board)
        };
        self.stack.set_eval(ply, eval);
        let improving = !in_check && self.stack.improving(ply);

        if !is_pv && !in_check {
            // Razoring: hopeless static eval at the frontier resolves
            // tactically or not at all.
            if depth <= RAZOR_DEPTH && eval + RAZOR_MARGIN * depth as i32 <= alpha {
                return self.quiesce(ctx, board, alpha, beta, ply);
            }
        }

        // Null move pruning: hand over the move; if the reduced search
        // still clears beta, a real move surely would.
        if null_move_allowed(
            depth,
            eval,
            beta,
            in_check,
            is_pv,
            self.stack.nmp_valid(ply),
            board.has_non_pawn_material(board.side_to_move()),
        ) {
            debug_assert!(!in_check);
            self.null_moves_tried += 1;
            let reduction = NULL_MOVE_BASE_REDUCTION + depth / 4;
            let child = board.apply_null();
            self.stack.set_played(ply, Move::NULL);
            self.accumulators.push_null(&child);
            let score = -self.alpha_beta(
                ctx,
                &child,
                depth.saturating_sub(1 + reduction),
                -beta,
                -beta + 1,
                ply + 1,
            );
            self.accumulators.pop();
            if is_sentinel(score) {
                return SCORE_SENTINEL;
            }
            if score >= beta {
                // Never return an unproven mate from a null search
                return beta;
            }
        }

        // Internal iterative reduction: no hash move at depth means the
        // previous pass never looked here; shrink rather than guess.
        if tt_digest == 0 && depth >= IIR_MIN_DEPTH {
            depth -= 1;
        }

        let killers = self.stack.at(ply).killers;
        let prev = if ply > 0 {
            self.stack.at(ply - 1).played
        } else {
            Move::NULL
        };
        let mut orderer = MoveOrderer::new(board, tt_digest, killers, prev, &self.history);

        if orderer.is_empty() {
            return if in_check {
                -MATE_SCORE + ply as i32
            } else {
                SCORE_DRAW
            };
        }

        let original_alpha = alpha;
        let mut best_score = -SCORE_INFINITE;
        let mut best_move = Move::NULL;
        let mut move_count = 0usize;
        let mut quiets_tried: [Move; 32] = [Move::NULL; 32];
        let mut quiets_count = 0usize;

        while let Some(mv) = orderer.next() {
            let is_quiet = mv.is_quiet();

            if !is_root && !is_pv && !in_check && is_quiet && move_count > 0 {
                // Futility: a late quiet cannot lift a bad static eval
                // over alpha at shallow depth.
                if depth <= FUTILITY_DEPTH && eval + futility_margin(depth) <= alpha {
                    continue;
                }
                // Quiets that lose material outright are not worth a
                // search until depth runs out of better ideas.
                if depth <= SEE_QUIET_DEPTH && board.see(mv) < SEE_QUIET_MARGIN * depth as i32 {
                    continue;
                }
            }

            let child = board.apply(mv);
            ctx.tt.prefetch(child.hash());
            let gives_check = child.in_check();

            self.stack.set_played(ply, mv);
            self.accumulators
                .push(board, &child, mv, ctx.weights, &mut self.cache);
            move_count += 1;
            if is_quiet && quiets_count < quiets_tried.len() {
                quiets_tried[quiets_count] = mv;
                quiets_count += 1;
            }

            let extension = u32::from(gives_check);
            let new_depth = depth - 1 + extension;

            let mut score;
            if move_count == 1 {
                score = -self.alpha_beta(ctx, &child, new_depth, -beta, -alpha, ply + 1);
            } else {
                // Late move reductions, ramped by depth and move number
                let mut reduction = 0;
                if depth >= LMR_MIN_DEPTH
                    && move_count > LMR_MOVE_THRESHOLD
                    && is_quiet
                    && !in_check
                    && !gives_check
                {
                    reduction = lmr_reduction(depth, move_count);
                    if is_pv {
                        reduction = reduction.saturating_sub(1);
                    }
                    if !improving {
                        reduction += 1;
                    }
                    reduction = reduction.min(new_depth.saturating_sub(1));
                }

                // PVS: zero window first, re-search on any raise
                score = -self.alpha_beta(
                    ctx,
                    &child,
                    new_depth - reduction,
                    -alpha - 1,
                    -alpha,
                    ply + 1,
                );
                if !is_sentinel(score) && reduction > 0 && score > alpha {
                    score =
                        -self.alpha_beta(ctx, &child, new_depth, -alpha - 1, -alpha, ply + 1);
                }
                if !is_sentinel(score) && is_pv && score > alpha && score < beta {
                    score = -self.alpha_beta(ctx, &child, new_depth, -beta, -alpha, ply + 1);
                }
            }

            self.accumulators.pop();

            if is_sentinel(score) {
                return SCORE_SENTINEL;
            }

            if score > best_score {
                best_score = score;
                best_move = mv;
                if is_root {
                    self.root_best = mv;
                }
                if score > alpha {
                    alpha = score;
                    if alpha >= beta {
                        if is_quiet {
                            self.stack.insert_killer(ply, mv);
                            self.history.update_on_cutoff(
                                board.side_to_move(),
                                mv,
                                &quiets_tried[..quiets_count],
                                prev,
                                history_bonus(depth),
                            );
                        }
                        ctx.tt.store(
                            board.hash(),
                            mv.digest(),
                            best_score,
                            eval,
                            depth,
                            Bound::Lower,
                            ply,
                        );
                        return best_score;
                    }
                }
            }
        }

        let bound = if best_score > original_alpha {
            Bound::Exact
        } else {
            Bound::Upper
        };
        ctx.tt
            .store(board.hash(), best_move.digest(), best_score, eval, depth, bound, ply);
        best_score
    }

    /// Quiescence: captures and promotions only, plus every evasion
    /// when in check. Stand pat on the static eval otherwise.
    fn quiesce(
        &mut self,
        ctx: &SearchContext,
        board: &Board,
        mut alpha: i32,
        beta: i32,
        ply: usize,
    ) -> i32 {
        if self.visit_node(ctx) {
            return SCORE_SENTINEL;
        }

        self.seldepth = self.seldepth.max(ply as u32 + 1);

        let in_check = board.in_check();
        if ply >= MAX_PLY - 1 {
            return if in_check {
                SCORE_DRAW
            } else {
                self.evaluate(ctx, board)
            };
        }

        let mut best_score = -SCORE_INFINITE;
        if !in_check {
            let stand_pat = self.evaluate(ctx, board);
            if stand_pat >= beta {
                return stand_pat;
            }
            alpha = alpha.max(stand_pat);
            best_score = stand_pat;
        }

        let list = if in_check {
            board.generate_moves()
        } else {
            board.generate_noisy()
        };
        if in_check && list.is_empty() {
            return -MATE_SCORE + ply as i32;
        }

        // Table hit is ordering information only here; depth semantics
        // of quiescence entries do not justify a cutoff.
        let tt_digest = ctx
            .tt
            .probe(board.hash(), ply)
            .map_or(0, |entry| entry.digest);

        let mut orderer = MoveOrderer::noisy(&list, tt_digest);
        while let Some(mv) = orderer.next() {
            // Losing captures cannot rescue a stand-pat deficit
            if !in_check && mv.is_capture() && board.see(mv) < 0 {
                continue;
            }

            let child = board.apply(mv);
            ctx.tt.prefetch(child.hash());
            self.accumulators
                .push(board, &child, mv, ctx.weights, &mut self.cache);
            let score = -self.quiesce(ctx, &child, -beta, -alpha, ply + 1);
            self.accumulators.pop();

            if is_sentinel(score) {
                return SCORE_SENTINEL;
            }
            if score > best_score {
                best_score = score;
                if score > alpha {
                    alpha = score;
                    if alpha >= beta {
                        break;
                    }
                }
            }
        }

        best_score
    }

    /// Walk the table from the root along stored moves, starting with
    /// the root best move, stopping at the first miss, illegal move or
    /// cycle.
    fn extract_pv(&self, ctx: &SearchContext, root: &Board, max_len: usize) -> Vec<Move> {
        let mut pv = Vec::new();
        if self.root_best.is_null() {
            return pv;
        }
        let mut seen = Vec::with_capacity(max_len);
        let mut board = *root;

        seen.push(board.hash());
        pv.push(self.root_best);
        board = board.apply(self.root_best);

        while pv.len() < max_len {
            if seen.contains(&board.hash()) {
                break;
            }
            seen.push(board.hash());
            let Some(entry) = ctx.tt.probe(board.hash(), pv.len()) else {
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

    fn iteration_info(
        &self,
        ctx: &SearchContext,
        root: &Board,
        depth: u32,
        score: i32,
    ) -> SearchInfo {
        let elapsed = ctx.start.elapsed();
        let time_ms = elapsed.as_millis() as u64;
        let nodes = ctx.global_nodes.load(Ordering::Relaxed).max(self.nodes);
        let nps = if time_ms > 0 { nodes * 1000 / time_ms } else { 0 };
        SearchInfo {
            depth,
            seldepth: self.seldepth,
            score,
            mate_in: mate_in(score),
            nodes,
            nps,
            time_ms,
            hashfull: ctx.tt.hashfull(),
            pv: self.extract_pv(ctx, root, depth as usize),
        }
    }

    #[allow(dead_code)]
    pub(crate) fn null_moves_tried(&self) -> u64 {
        self.null_moves_tried
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::nnue::Weights;
    use crate::tt::TranspositionTable;

    fn run_search(fen: &str, depth: u32) -> (Worker, WorkerReport) {
        let board = Board::parse_fen(fen).unwrap();
        let tt = TranspositionTable::new(8);
        let weights = Weights::zeroed();
        let stop = AtomicBool::new(false);
        let global_nodes = AtomicU64::new(0);
        let ctx = SearchContext {
            tt: &tt,
            weights: &weights,
            stop: &stop,
            global_nodes: &global_nodes,
            node_limit: None,
            soft_deadline: None,
            hard_deadline: None,
            start: Instant::now(),
            max_depth: depth,
        };
        let mut worker = Worker::new(0);
        let mut history = PositionHistory::new();
        history.push(board.hash());
        let report = worker.run(&ctx, &board, &history, None);
        (worker, report)
    }

    #[test]
    fn test_finds_mate_in_one() {
        let (_, report) = run_search("6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1", 6);
        assert_eq!(report.best_move.unwrap().to_string(), "a1a8");
        assert!(report.score >= MATE_SCORE - 3, "score {}", report.score);
    }

    #[test]
    fn test_null_move_gate_rejects_checks() {
        // In check the branch must never fire, whatever else holds
        assert!(!null_move_allowed(8, 500, 0, true, false, true, true));
        // Nor on PV nodes, after a null, or without material
        assert!(!null_move_allowed(8, 500, 0, false, true, true, true));
        assert!(!null_move_allowed(8, 500, 0, false, false, false, true));
        assert!(!null_move_allowed(8, 500, 0, false, false, true, false));
        // And only when the static eval already clears beta
        assert!(!null_move_allowed(8, -1, 0, false, false, true, true));
        assert!(null_move_allowed(8, 1, 0, false, false, true, true));
    }

    #[test]
    fn test_no_null_move_searched_from_checked_root() {
        // Black to move, checked by a pawn. Black always fails the
        // in-check or bare-king gates; white never has non-pawn
        // material at null-eligible depth. The instrumented counter
        // must stay at zero for the whole depth-4 search.
        let (worker, report) = run_search("4k3/3P4/8/8/8/8/8/4K3 b - - 0 1", 4);
        assert_eq!(worker.null_moves_tried(), 0);
        assert!(report.best_move.is_some());
    }

    #[test]
    fn test_stalemate_scores_zero() {
        let (_, report) = run_search("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1", 4);
        assert!(report.best_move.is_none());
        assert_eq!(report.score, SCORE_DRAW);
    }
}
