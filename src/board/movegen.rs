//! Legal move generation.
//!
//! Pseudo-legal moves are generated per piece type from the attack
//! tables, then filtered by applying each move and rejecting those that
//! leave the mover's own king attacked. Castling legality (empty and
//! unattacked transit squares) is checked during generation.

use super::attack_tables::{
    bishop_attacks, king_attacks, knight_attacks, pawn_attacks, queen_attacks, rook_attacks,
};
use super::state::Board;
use super::types::{castle_bit, Color, Move, MoveList, Piece, Square, SquareSet, PROMOTION_PIECES};

/// Which subset of moves to generate.
#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) enum GenKind {
    /// Every legal move
    All,
    /// Captures and promotions: the quiescence move set
    Noisy,
    /// Everything that is neither a capture nor a promotion
    Quiet,
}

impl GenKind {
    #[inline]
    fn wants_noisy(self) -> bool {
        matches!(self, GenKind::All | GenKind::Noisy)
    }

    #[inline]
    fn wants_quiet(self) -> bool {
        matches!(self, GenKind::All | GenKind::Quiet)
    }
}

impl Board {
    /// Generate all legal moves.
    #[must_use]
    pub fn generate_moves(&self) -> MoveList {
        self.generate(GenKind::All)
    }

    /// Generate legal captures and promotions.
    #[must_use]
    pub fn generate_noisy(&self) -> MoveList {
        self.generate(GenKind::Noisy)
    }

    /// Generate legal quiet moves (including castling).
    #[must_use]
    pub fn generate_quiet(&self) -> MoveList {
        self.generate(GenKind::Quiet)
    }

    pub(crate) fn generate(&self, kind: GenKind) -> MoveList {
        let mut pseudo = MoveList::new();
        self.pawn_moves(kind, &mut pseudo);
        self.knight_moves(kind, &mut pseudo);
        self.slider_moves(kind, &mut pseudo);
        self.king_moves(kind, &mut pseudo);
        if kind.wants_quiet() {
            self.castle_moves(&mut pseudo);
        }

        let mut legal = MoveList::new();
        for &mv in &pseudo {
            if self.is_legal(mv) {
                legal.push(mv);
            }
        }
        legal
    }

    /// A pseudo-legal move is legal iff the resulting position does not
    /// leave the mover's king attacked. Castling transit safety is
    /// handled at generation time; this catches pins, en passant
    /// discoveries and king steps into attacks.
    #[inline]
    pub(crate) fn is_legal(&self, mv: Move) -> bool {
        let child = self.apply(mv);
        !child.is_attacked(child.king_square(self.stm), child.side_to_move())
    }

    fn pawn_moves(&self, kind: GenKind, out: &mut MoveList) {
        let us = self.stm;
        let them = us.them();
        let enemy = self.occupied_by(them);
        let (push_dir, start_rank, promo_rank) = match us {
            Color::White => (8isize, 1usize, 7usize),
            Color::Black => (-8isize, 6usize, 0usize),
        };

        for from in self.pieces_of(us, Piece::Pawn) {
            let push_idx = from.index() as isize + push_dir;
            let push_sq = Square::from_index(push_idx as usize);
            let can_push = !self.all_occupied.contains(push_sq);

            // Pushes. Promotions count as noisy even without a capture.
            if can_push {
                if push_sq.rank() == promo_rank {
                    if kind.wants_noisy() {
                        for promo in PROMOTION_PIECES {
                            out.push(Move::promotion(from, push_sq, promo));
                        }
                    }
                } else if kind.wants_quiet() {
                    out.push(Move::quiet(from, push_sq, Piece::Pawn));
                    if from.rank() == start_rank {
                        let double_sq = Square::from_index((push_idx + push_dir) as usize);
                        if !self.all_occupied.contains(double_sq) {
                            out.push(Move::double_push(from, double_sq));
                        }
                    }
                }
            }

            if !kind.wants_noisy() {
                continue;
            }

            // Captures, including capture-promotions
            for to in pawn_attacks(us, from) & enemy {
                let captured = self
                    .piece_on(to)
                    .expect("capture target without a piece");
                if to.rank() == promo_rank {
                    for promo in PROMOTION_PIECES {
                        out.push(Move::promotion_capture(from, to, captured, promo));
                    }
                } else {
                    out.push(Move::capture(from, to, Piece::Pawn, captured));
                }
            }

            // En passant
            if let Some(ep) = self.en_passant {
                if pawn_attacks(us, from).contains(ep) {
                    out.push(Move::en_passant(from, ep));
                }
            }
        }
    }

    fn knight_moves(&self, kind: GenKind, out: &mut MoveList) {
        for from in self.pieces_of(self.stm, Piece::Knight) {
            self.push_targets(kind, from, Piece::Knight, knight_attacks(from), out);
        }
    }

    fn slider_moves(&self, kind: GenKind, out: &mut MoveList) {
        let occ = self.all_occupied;
        for from in self.pieces_of(self.stm, Piece::Bishop) {
            self.push_targets(kind, from, Piece::Bishop, bishop_attacks(from, occ), out);
        }
        for from in self.pieces_of(self.stm, Piece::Rook) {
            self.push_targets(kind, from, Piece::Rook, rook_attacks(from, occ), out);
        }
        for from in self.pieces_of(self.stm, Piece::Queen) {
            self.push_targets(kind, from, Piece::Queen, queen_attacks(from, occ), out);
        }
    }

    fn king_moves(&self, kind: GenKind, out: &mut MoveList) {
        let from = self.king_square(self.stm);
        self.push_targets(kind, from, Piece::King, king_attacks(from), out);
    }

    fn push_targets(
        &self,
        kind: GenKind,
        from: Square,
        piece: Piece,
        targets: SquareSet,
        out: &mut MoveList,
    ) {
        let targets = targets & !self.occupied_by(self.stm);
        if kind.wants_noisy() {
            for to in targets & self.occupied_by(self.stm.them()) {
                let captured = self
                    .piece_on(to)
                    .expect("capture target without a piece");
                out.push(Move::capture(from, to, piece, captured));
            }
        }
        if kind.wants_quiet() {
            for to in targets & !self.all_occupied {
                out.push(Move::quiet(from, to, piece));
            }
        }
    }

    fn castle_moves(&self, out: &mut MoveList) {
        let us = self.stm;
        let them = us.them();
        let rank = match us {
            Color::White => 0,
            Color::Black => 7,
        };
        let king_from = Square::new(rank, 4);
        if self.king_square(us) != king_from || self.is_attacked(king_from, them) {
            return;
        }

        // Kingside: f and g files empty, king path unattacked
        if self.castling & castle_bit(us, true) != 0 {
            let f = Square::new(rank, 5);
            let g = Square::new(rank, 6);
            if !self.all_occupied.contains(f)
                && !self.all_occupied.contains(g)
                && !self.is_attacked(f, them)
                && !self.is_attacked(g, them)
            {
                out.push(Move::castle(king_from, g));
            }
        }

        // Queenside: b, c and d files empty, king passes d and c
        if self.castling & castle_bit(us, false) != 0 {
            let b = Square::new(rank, 1);
            let c = Square::new(rank, 2);
            let d = Square::new(rank, 3);
            if !self.all_occupied.contains(b)
                && !self.all_occupied.contains(c)
                && !self.all_occupied.contains(d)
                && !self.is_attacked(c, them)
                && !self.is_attacked(d, them)
            {
                out.push(Move::castle(king_from, c));
            }
        }
    }
}
