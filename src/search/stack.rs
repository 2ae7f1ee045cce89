//! Per-thread search stack and ordering heuristics.
//!
//! The stack holds one frame per ply (static eval, hash, the move that
//! reached the node, killers) on top of the game's position history, so
//! repetition detection sees the whole line from the game root. The
//! heuristic tables (main, follow-up and continuation history, counter
//! moves) live beside it, persist across searches and decay between
//! them.

use crate::board::{Color, Move, Piece, PositionHistory, MAX_PLY};

use super::constants::HISTORY_MAX;

#[derive(Clone, Copy)]
pub struct Frame {
    pub hash: u64,
    pub eval: i32,
    pub played: Move,
    pub killers: [Move; 2],
    pub in_check: bool,
}

impl Default for Frame {
    fn default() -> Self {
        Frame {
            hash: 0,
            eval: 0,
            played: Move::NULL,
            killers: [Move::NULL; 2],
            in_check: false,
        }
    }
}

/// Frames indexed by ply, prefixed by the game history for repetition
/// scans.
pub struct SearchStack {
    game_history: PositionHistory,
    frames: Vec<Frame>,
}

impl SearchStack {
    #[must_use]
    pub fn new() -> Self {
        SearchStack {
            game_history: PositionHistory::new(),
            frames: vec![Frame::default(); MAX_PLY + 2],
        }
    }

    /// Start a new search from a root reached via `game_history`.
    /// Killers are kept; they decay into irrelevance on their own.
    pub fn reset(&mut self, game_history: &PositionHistory) {
        self.game_history = game_history.clone();
        for frame in &mut self.frames {
            frame.hash = 0;
            frame.eval = 0;
            frame.played = Move::NULL;
            frame.in_check = false;
        }
    }

    #[inline]
    #[must_use]
    pub fn at(&self, ply: usize) -> &Frame {
        &self.frames[ply]
    }

    #[inline]
    pub fn set_hash(&mut self, ply: usize, hash: u64) {
        self.frames[ply].hash = hash;
    }

    #[inline]
    pub fn set_eval(&mut self, ply: usize, eval: i32) {
        self.frames[ply].eval = eval;
    }

    #[inline]
    pub fn set_played(&mut self, ply: usize, mv: Move) {
        self.frames[ply].played = mv;
    }

    #[inline]
    pub fn set_in_check(&mut self, ply: usize, in_check: bool) {
        self.frames[ply].in_check = in_check;
    }

    /// Record a quiet cutoff move, shifting the old primary killer down
    /// unless the move is already there.
    pub fn insert_killer(&mut self, ply: usize, mv: Move) {
        let killers = &mut self.frames[ply].killers;
        if killers[0] != mv {
            killers[1] = killers[0];
            killers[0] = mv;
        }
    }

    /// Eval trend: better than two plies ago. Optimistic when the
    /// comparison point does not exist or was a check.
    #[must_use]
    pub fn improving(&self, ply: usize) -> bool {
        if ply < 2 {
            return true;
        }
        let prev = &self.frames[ply - 2];
        if prev.in_check {
            return true;
        }
        self.frames[ply].eval > prev.eval
    }

    /// Null-move pruning is invalid directly after a null move: two
    /// passes in a row prove nothing.
    #[must_use]
    pub fn nmp_valid(&self, ply: usize) -> bool {
        ply == 0 || !self.frames[ply - 1].played.is_null()
    }

    /// Twofold repetition across the search path and the game history,
    /// within the reversible window. The frame at `ply` must already
    /// carry the current hash.
    #[must_use]
    pub fn is_repetition(&self, ply: usize, hash: u64, halfmove_clock: u32) -> bool {
        let mut window = halfmove_clock as usize;
        let mut count = 0;

        // Walk the search path backwards from the current node
        let mut p = ply;
        loop {
            if self.frames[p].hash == hash {
                count += 1;
                if count >= 2 {
                    return true;
                }
            }
            if p == 0 || window == 0 {
                break;
            }
            p -= 1;
            window -= 1;
        }

        if window == 0 {
            return false;
        }
        count + self.game_history.count_in_window(hash, window) >= 2
    }
}

impl Default for SearchStack {
    fn default() -> Self {
        SearchStack::new()
    }
}

const HISTORY_SQUARES: usize = 64 * 64;

/// Per-thread move ordering heuristics.
///
/// All history values saturate at `HISTORY_MAX` through the gravity
/// update `v += bonus - v * |bonus| / MAX`, which pulls entries toward
/// the bonus sign without ever overshooting the bound.
pub struct HistoryTables {
    /// Main butterfly history: (side, from, to)
    main: Box<[i16]>,
    /// Follow-up history: (piece, to)
    follow_up: [i16; 6 * 64],
    /// Continuation history: (previous piece, previous to, piece, to)
    continuation: Box<[i16]>,
    /// Counter move per (previous from, previous to)
    counters: Box<[Move]>,
}

impl HistoryTables {
    #[must_use]
    pub fn new() -> Self {
        HistoryTables {
            main: vec![0; 2 * HISTORY_SQUARES].into_boxed_slice(),
            follow_up: [0; 6 * 64],
            continuation: vec![0; 6 * 64 * 6 * 64].into_boxed_slice(),
            counters: vec![Move::NULL; HISTORY_SQUARES].into_boxed_slice(),
        }
    }

    #[inline]
    fn main_index(side: Color, mv: Move) -> usize {
        side.index() * HISTORY_SQUARES + mv.from().index() * 64 + mv.to().index()
    }

    #[inline]
    fn follow_up_index(mv: Move) -> usize {
        mv.piece().index() * 64 + mv.to().index()
    }

    #[inline]
    fn continuation_index(prev_piece: Piece, prev_to: usize, mv: Move) -> usize {
        ((prev_piece.index() * 64 + prev_to) * 6 + mv.piece().index()) * 64 + mv.to().index()
    }

    /// Combined ordering score for a quiet move.
    #[must_use]
    pub fn quiet_score(&self, side: Color, mv: Move, prev: Move) -> i32 {
        let mut score = i32::from(self.main[Self::main_index(side, mv)])
            + i32::from(self.follow_up[Self::follow_up_index(mv)]);
        if !prev.is_null() {
            score += i32::from(
                self.continuation[Self::continuation_index(prev.piece(), prev.to().index(), mv)],
            );
        }
        score
    }

    /// Reward the cutoff move and punish the quiets tried before it.
    pub fn update_on_cutoff(
        &mut self,
        side: Color,
        cutoff: Move,
        tried_quiets: &[Move],
        prev: Move,
        bonus: i32,
    ) {
        self.bump(side, cutoff, prev, bonus);
        for &mv in tried_quiets {
            if mv != cutoff {
                self.bump(side, mv, prev, -bonus);
            }
        }
        if !prev.is_null() {
            self.counters[prev.from().index() * 64 + prev.to().index()] = cutoff;
        }
    }

    fn bump(&mut self, side: Color, mv: Move, prev: Move, bonus: i32) {
        gravity(&mut self.main[Self::main_index(side, mv)], bonus);
        gravity(&mut self.follow_up[Self::follow_up_index(mv)], bonus);
        if !prev.is_null() {
            gravity(
                &mut self.continuation[Self::continuation_index(prev.piece(), prev.to().index(), mv)],
                bonus,
            );
        }
    }

    /// The quiet that last refuted `prev`, if any.
    #[must_use]
    pub fn counter_of(&self, prev: Move) -> Move {
        if prev.is_null() {
            Move::NULL
        } else {
            self.counters[prev.from().index() * 64 + prev.to().index()]
        }
    }

    /// Halve everything between searches: old knowledge stays useful
    /// as a prior but cannot dominate fresh observations.
    pub fn decay(&mut self) {
        for v in self.main.iter_mut() {
            *v /= 2;
        }
        for v in &mut self.follow_up {
            *v /= 2;
        }
        for v in self.continuation.iter_mut() {
            *v /= 2;
        }
    }
}

impl Default for HistoryTables {
    fn default() -> Self {
        HistoryTables::new()
    }
}

#[inline]
fn gravity(value: &mut i16, bonus: i32) {
    let bonus = bonus.clamp(-HISTORY_MAX, HISTORY_MAX);
    let v = i32::from(*value);
    *value = (v + bonus - v * bonus.abs() / HISTORY_MAX) as i16;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Board, Square};

    fn quiet(from: &str, to: &str) -> Move {
        let from: Square = from.parse().unwrap();
        let to: Square = to.parse().unwrap();
        Move::quiet(from, to, Piece::Knight)
    }

    #[test]
    fn test_improving_compares_two_plies_back() {
        let mut stack = SearchStack::new();
        stack.set_eval(0, 10);
        stack.set_eval(1, -20);
        stack.set_eval(2, 30);
        assert!(stack.improving(2));
        stack.set_eval(2, 5);
        assert!(!stack.improving(2));
        assert!(stack.improving(1)); // no frame two plies back
    }

    #[test]
    fn test_nmp_valid_blocks_consecutive_nulls() {
        let mut stack = SearchStack::new();
        stack.set_played(0, quiet("g1", "f3"));
        assert!(stack.nmp_valid(1));
        stack.set_played(1, Move::NULL);
        assert!(!stack.nmp_valid(2));
    }

    #[test]
    fn test_killer_slots_shift() {
        let mut stack = SearchStack::new();
        let a = quiet("g1", "f3");
        let b = quiet("b1", "c3");
        stack.insert_killer(3, a);
        stack.insert_killer(3, b);
        assert_eq!(stack.at(3).killers, [b, a]);
        // Reinserting the primary does not duplicate it
        stack.insert_killer(3, b);
        assert_eq!(stack.at(3).killers, [b, a]);
    }

    #[test]
    fn test_repetition_spans_game_history_and_stack() {
        let board = Board::startpos();
        let mut game = PositionHistory::new();
        game.push(board.hash());
        game.push(0xAAAA);
        let mut stack = SearchStack::new();
        stack.reset(&game);

        stack.set_hash(0, 0xBBBB);
        stack.set_hash(1, board.hash());
        assert!(stack.is_repetition(1, board.hash(), 50));
        // Outside the reversible window there is no repetition
        assert!(!stack.is_repetition(1, board.hash(), 1));
        assert!(!stack.is_repetition(0, 0xBBBB, 50));
    }

    #[test]
    fn test_gravity_saturates() {
        let mut v = 0i16;
        for _ in 0..1000 {
            gravity(&mut v, 1600);
        }
        assert!(i32::from(v) <= HISTORY_MAX);
        let high = v;
        gravity(&mut v, 1600);
        assert!(v >= high - 1); // saturated, not oscillating
        for _ in 0..1000 {
            gravity(&mut v, -1600);
        }
        assert!(i32::from(v) >= -HISTORY_MAX);
    }

    #[test]
    fn test_cutoff_update_rewards_and_punishes() {
        let mut tables = HistoryTables::new();
        let cutoff = quiet("g1", "f3");
        let loser = quiet("b1", "c3");
        tables.update_on_cutoff(Color::White, cutoff, &[loser], Move::NULL, 200);
        assert!(tables.quiet_score(Color::White, cutoff, Move::NULL) > 0);
        assert!(tables.quiet_score(Color::White, loser, Move::NULL) < 0);
        // Main history is per side; the white entry outranks black's
        assert!(
            tables.quiet_score(Color::White, cutoff, Move::NULL)
                > tables.quiet_score(Color::Black, cutoff, Move::NULL)
        );
    }

    #[test]
    fn test_counter_move_recorded() {
        let mut tables = HistoryTables::new();
        let prev = quiet("e7", "e5");
        let cutoff = quiet("g1", "f3");
        tables.update_on_cutoff(Color::White, cutoff, &[], prev, 100);
        assert_eq!(tables.counter_of(prev), cutoff);
        assert_eq!(tables.counter_of(Move::NULL), Move::NULL);
    }
}
