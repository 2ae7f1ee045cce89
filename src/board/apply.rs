//! Move application.
//!
//! Boards are values: `apply` copies the receiver and returns the
//! successor. Both cached hashes are maintained incrementally; the
//! caller never sees a half-updated position.

use super::state::Board;
use super::types::{castle_rights_mask, Color, Move, Piece, Square};
use super::zobrist::ZOBRIST;

impl Board {
    /// Apply a move from this position's legal move list, returning the
    /// successor position.
    ///
    /// The move carries its own captured piece and flags, so nothing is
    /// looked up and nothing is lost; the parent board plus the move
    /// fully determine the child and vice versa.
    #[must_use]
    pub fn apply(&self, mv: Move) -> Board {
        debug_assert!(!mv.is_null(), "apply called with the null move");
        let mut next = *self;
        let us = self.stm;
        let them = us.them();

        if let Some(ep) = next.en_passant.take() {
            next.hash ^= ZOBRIST.en_passant_keys[ep.file()];
        }

        if mv.is_en_passant() {
            // The captured pawn sits beside the destination, on the
            // mover's own rank.
            let cap_sq = Square::new(mv.from().rank(), mv.to().file());
            next.remove_piece(cap_sq, them, Piece::Pawn);
        } else if let Some(captured) = mv.captured() {
            next.remove_piece(mv.to(), them, captured);
        }

        next.remove_piece(mv.from(), us, mv.piece());
        next.set_piece(mv.to(), us, mv.promoted().unwrap_or(mv.piece()));

        if mv.is_castle() {
            let rank = mv.from().rank();
            let (rook_from, rook_to) = if mv.to().file() == 6 { (7, 5) } else { (0, 3) };
            next.remove_piece(Square::new(rank, rook_from), us, Piece::Rook);
            next.set_piece(Square::new(rank, rook_to), us, Piece::Rook);
        }

        if mv.is_double_push() {
            let ep = Square::new(usize::midpoint(mv.from().rank(), mv.to().rank()), mv.from().file());
            next.en_passant = Some(ep);
            next.hash ^= ZOBRIST.en_passant_keys[ep.file()];
        }

        let new_rights =
            next.castling & castle_rights_mask(mv.from().index()) & castle_rights_mask(mv.to().index());
        if new_rights != next.castling {
            next.hash ^= ZOBRIST.castling_hash(next.castling ^ new_rights);
            next.castling = new_rights;
        }

        if mv.piece() == Piece::Pawn || mv.is_capture() {
            next.halfmove_clock = 0;
        } else {
            next.halfmove_clock += 1;
        }
        if us == Color::Black {
            next.fullmove += 1;
        }

        next.stm = them;
        next.hash ^= ZOBRIST.side_key;
        next
    }

    /// Pass the move without moving: flip the side to move and drop any
    /// en passant right. Used by null-move pruning.
    #[must_use]
    pub fn apply_null(&self) -> Board {
        let mut next = *self;
        if let Some(ep) = next.en_passant.take() {
            next.hash ^= ZOBRIST.en_passant_keys[ep.file()];
        }
        next.halfmove_clock += 1;
        next.stm = next.stm.them();
        next.hash ^= ZOBRIST.side_key;
        next
    }
}
