//! Move ordering.
//!
//! Every generated move is scored into a band, then yielded best-first
//! by incremental selection (only as far as the search actually looks
//! before a cutoff). Band order: hash move, winning captures, killers,
//! counter move, quiets by history, losing captures.

use crate::board::{Board, Move, MoveList};

use super::stack::HistoryTables;

/// Band bases. Quiet history scores live around zero, bounded well
/// inside the gap between `COUNTER_SCORE` and `BAD_CAPTURE_SCORE`.
const HASH_SCORE: i32 = 1 << 21;
const GOOD_CAPTURE_SCORE: i32 = 400_000;
const KILLER1_SCORE: i32 = 350_000;
const KILLER2_SCORE: i32 = 340_000;
const COUNTER_SCORE: i32 = 330_000;
const BAD_CAPTURE_SCORE: i32 = -400_000;

/// Most-valuable-victim, least-valuable-attacker. Victims dominate;
/// the attacker only breaks ties.
fn mvv_lva(mv: Move) -> i32 {
    let victim = mv.captured().map_or(0, |p| p.value());
    let promo = mv.promoted().map_or(0, |p| p.value());
    victim * 8 + promo - mv.piece().value() / 10
}

#[derive(Clone, Copy)]
struct ScoredMove {
    mv: Move,
    score: i32,
}

/// Yields one position's moves in search order.
pub struct MoveOrderer {
    moves: Vec<ScoredMove>,
    index: usize,
}

impl MoveOrderer {
    /// Order the full legal move list for a main-search node.
    #[must_use]
    pub fn new(
        board: &Board,
        tt_digest: u16,
        killers: [Move; 2],
        prev: Move,
        history: &HistoryTables,
    ) -> Self {
        let list = board.generate_moves();
        let counter = history.counter_of(prev);
        let side = board.side_to_move();

        let mut moves = Vec::with_capacity(list.len());
        for &mv in &list {
            let score = if mv.matches_digest(tt_digest) {
                HASH_SCORE
            } else if mv.is_noisy() {
                if board.see(mv) >= 0 {
                    GOOD_CAPTURE_SCORE + mvv_lva(mv)
                } else {
                    BAD_CAPTURE_SCORE + mvv_lva(mv)
                }
            } else if mv == killers[0] {
                KILLER1_SCORE
            } else if mv == killers[1] {
                KILLER2_SCORE
            } else if mv == counter {
                COUNTER_SCORE
            } else {
                history.quiet_score(side, mv, prev)
            };
            moves.push(ScoredMove { mv, score });
        }

        MoveOrderer { moves, index: 0 }
    }

    /// Order noisy moves for quiescence, hash move first then MVV/LVA.
    #[must_use]
    pub fn noisy(list: &MoveList, tt_digest: u16) -> Self {
        let mut moves = Vec::with_capacity(list.len());
        for &mv in list {
            let score = if mv.matches_digest(tt_digest) {
                HASH_SCORE
            } else {
                mvv_lva(mv)
            };
            moves.push(ScoredMove { mv, score });
        }
        MoveOrderer { moves, index: 0 }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Select the best remaining move and advance. Selection sort, one
    /// step per call: positions that cut off early never pay for a full
    /// sort.
    pub fn next(&mut self) -> Option<Move> {
        if self.index >= self.moves.len() {
            return None;
        }
        let mut best = self.index;
        for i in (self.index + 1)..self.moves.len() {
            if self.moves[i].score > self.moves[best].score {
                best = i;
            }
        }
        self.moves.swap(self.index, best);
        let mv = self.moves[self.index].mv;
        self.index += 1;
        Some(mv)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Piece;

    fn drain(mut orderer: MoveOrderer) -> Vec<Move> {
        let mut out = Vec::new();
        while let Some(mv) = orderer.next() {
            out.push(mv);
        }
        out
    }

    #[test]
    fn test_hash_move_comes_first() {
        let board = Board::startpos();
        let tt_move = board.parse_move("d2d4").unwrap();
        let orderer = MoveOrderer::new(
            &board,
            tt_move.digest(),
            [Move::NULL; 2],
            Move::NULL,
            &HistoryTables::new(),
        );
        let ordered = drain(orderer);
        assert_eq!(ordered[0], tt_move);
        assert_eq!(ordered.len(), 20);
    }

    #[test]
    fn test_winning_capture_before_killer_before_quiet() {
        // White can win a pawn with exd5; g1f3 is the killer
        let board =
            Board::parse_fen("rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2")
                .unwrap();
        let capture = board.parse_move("e4d5").unwrap();
        let killer = board.parse_move("g1f3").unwrap();
        let orderer = MoveOrderer::new(
            &board,
            0,
            [killer, Move::NULL],
            Move::NULL,
            &HistoryTables::new(),
        );
        let ordered = drain(orderer);
        let pos_of = |mv: Move| ordered.iter().position(|&m| m == mv).unwrap();
        assert_eq!(pos_of(capture), 0);
        assert_eq!(pos_of(killer), 1);
    }

    #[test]
    fn test_losing_capture_ordered_last() {
        // Qxd5 loses the queen to exd5; quiets must come first
        let board =
            Board::parse_fen("4k3/8/4p3/3p4/8/8/3Q4/4K3 w - - 0 1").unwrap();
        let losing = board.parse_move("d2d5").unwrap();
        let orderer = MoveOrderer::new(
            &board,
            0,
            [Move::NULL; 2],
            Move::NULL,
            &HistoryTables::new(),
        );
        let ordered = drain(orderer);
        assert_eq!(*ordered.last().unwrap(), losing);
    }

    #[test]
    fn test_history_orders_quiets() {
        let board = Board::startpos();
        let liked = board.parse_move("b1c3").unwrap();
        let mut history = HistoryTables::new();
        history.update_on_cutoff(board.side_to_move(), liked, &[], Move::NULL, 800);
        let orderer = MoveOrderer::new(&board, 0, [Move::NULL; 2], Move::NULL, &history);
        let ordered = drain(orderer);
        assert_eq!(ordered[0], liked);
    }

    #[test]
    fn test_noisy_ordering_by_victim() {
        // Two captures available: pawn takes queen must beat pawn takes pawn
        let board =
            Board::parse_fen("4k3/8/8/3q1p2/4P3/8/8/4K3 w - - 0 1").unwrap();
        let noisy = board.generate_noisy();
        let ordered = drain(MoveOrderer::noisy(&noisy, 0));
        assert_eq!(ordered[0].captured(), Some(Piece::Queen));
    }
}
