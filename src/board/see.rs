//! Static Exchange Evaluation (SEE).
//!
//! Plays out the capture sequence on one square, always recapturing
//! with the least valuable attacker, and minimaxes the material swing.
//! X-ray attackers revealed by each capture join the exchange.

use super::attack_tables::{bishop_attacks, rook_attacks};
use super::state::Board;
use super::types::{Color, Move, Piece, Square, SquareSet, ALL_PIECES};

/// Longest possible exchange sequence on one square.
const MAX_EXCHANGES: usize = 32;

impl Board {
    /// Net material outcome of `mv` in centipawns, from the mover's
    /// perspective. Positive means the exchange wins material; zero an
    /// even trade. Quiet moves evaluate the cost of standing on a
    /// defended square (at best zero).
    #[must_use]
    pub fn see(&self, mv: Move) -> i32 {
        let to = mv.to();
        let mut gain = [0i32; MAX_EXCHANGES];
        let mut depth = 0;

        let mut occupancy = self.all_occupied;
        if mv.is_en_passant() {
            occupancy.remove(Square::new(mv.from().rank(), to.file()));
        }

        gain[0] = mv.captured().map_or(0, Piece::value);

        let mut attackers = self.attackers_of(to, occupancy);
        let mut current_piece = mv.piece();
        let mut from_set = SquareSet::of(mv.from());
        let mut side = self.stm;

        loop {
            // Remove the piece that just captured and expose x-rays
            // behind it.
            occupancy ^= from_set;
            attackers &= !from_set;

            if matches!(current_piece, Piece::Pawn | Piece::Bishop | Piece::Queen) {
                attackers |= bishop_attacks(to, occupancy) & self.diagonal_sliders() & occupancy;
            }
            if matches!(current_piece, Piece::Rook | Piece::Queen) {
                attackers |= rook_attacks(to, occupancy) & self.straight_sliders() & occupancy;
            }

            side = side.them();
            let side_attackers = attackers & self.occupied_by(side);
            if side_attackers.is_empty() {
                break;
            }

            let (lva_piece, lva_sq) = least_valuable(self, side_attackers, side);

            // The king may only recapture if no defender remains
            if lva_piece == Piece::King
                && (attackers & self.occupied_by(side.them()) & occupancy).any()
            {
                break;
            }

            if depth + 1 >= MAX_EXCHANGES {
                break;
            }
            depth += 1;

            // What this recapture wins: the piece that was standing on
            // the square, minus everything already at stake.
            gain[depth] = current_piece.value() - gain[depth - 1];

            // Neither side benefits from continuing
            if (-gain[depth - 1]).max(gain[depth]) < 0 {
                break;
            }

            current_piece = lva_piece;
            from_set = SquareSet::of(lva_sq);
        }

        while depth > 0 {
            depth -= 1;
            gain[depth] = -(-gain[depth]).max(gain[depth + 1]);
        }
        gain[0]
    }
}

fn least_valuable(board: &Board, attackers: SquareSet, side: Color) -> (Piece, Square) {
    for piece in ALL_PIECES {
        let candidates = attackers & board.pieces_of(side, piece);
        if let Some(sq) = candidates.first() {
            return (piece, sq);
        }
    }
    unreachable!("least_valuable called with no attackers")
}
