//! Perspective accumulators and their incremental maintenance.

use crate::board::{Board, Color, Move, Piece, Square, MAX_PLY};

use super::cache::RefreshCache;
use super::vector::{add_row, sub_row};
use super::weights::{Weights, HIDDEN_SIZE};

/// Feature index of one piece from one perspective.
///
/// Squares and piece colors are relative to the perspective: Black sees
/// the board mirrored and its own pieces as "ours". Kings are the
/// bucket, not a feature, so `piece` is never `Piece::King`.
#[inline]
#[must_use]
pub fn feature_index(
    perspective: Color,
    king_sq: Square,
    piece_color: Color,
    piece: Piece,
    sq: Square,
) -> usize {
    debug_assert!(piece != Piece::King);
    let (king_sq, sq) = match perspective {
        Color::White => (king_sq, sq),
        Color::Black => (king_sq.mirrored(), sq.mirrored()),
    };
    let relative_color = usize::from(piece_color != perspective);
    king_sq.index() * 640 + (piece.index() * 2 + relative_color) * 64 + sq.index()
}

/// Both perspectives' hidden-layer sums for one position.
#[derive(Clone)]
pub struct Accumulator {
    values: [[i16; HIDDEN_SIZE]; 2],
}

impl Default for Accumulator {
    fn default() -> Self {
        Accumulator {
            values: [[0; HIDDEN_SIZE]; 2],
        }
    }
}

impl Accumulator {
    #[inline]
    #[must_use]
    pub fn perspective(&self, color: Color) -> &[i16; HIDDEN_SIZE] {
        &self.values[color.index()]
    }

    /// Rebuild one perspective from scratch, bootstrapping the pawn
    /// contribution from the refresh cache.
    pub fn refresh(
        &mut self,
        perspective: Color,
        board: &Board,
        weights: &Weights,
        cache: &mut RefreshCache,
    ) {
        self.values[perspective.index()] = *cache.pawn_contribution(perspective, board, weights);

        let king_sq = board.king_square(perspective);
        let values = &mut self.values[perspective.index()];
        for color in [Color::White, Color::Black] {
            for piece in [Piece::Knight, Piece::Bishop, Piece::Rook, Piece::Queen] {
                for sq in board.pieces_of(color, piece) {
                    let feature = feature_index(perspective, king_sq, color, piece, sq);
                    add_row(values, &weights.feature_weights[feature]);
                }
            }
        }
    }

    #[inline]
    fn add(&mut self, perspective: Color, feature: usize, weights: &Weights) {
        add_row(
            &mut self.values[perspective.index()],
            &weights.feature_weights[feature],
        );
    }

    #[inline]
    fn sub(&mut self, perspective: Color, feature: usize, weights: &Weights) {
        sub_row(
            &mut self.values[perspective.index()],
            &weights.feature_weights[feature],
        );
    }

    /// Advance this accumulator from `parent` to `child = parent.apply(mv)`.
    ///
    /// King moves rebuild the mover's perspective (the king square is
    /// the feature bucket); everything else is a handful of row
    /// adds/subs per perspective.
    pub fn update(
        &mut self,
        parent: &Board,
        child: &Board,
        mv: Move,
        weights: &Weights,
        cache: &mut RefreshCache,
    ) {
        let us = parent.side_to_move();
        let them = us.them();

        for perspective in [Color::White, Color::Black] {
            if mv.piece() == Piece::King && perspective == us {
                self.refresh(perspective, child, weights, cache);
                continue;
            }

            let king_sq = child.king_square(perspective);

            if mv.piece() != Piece::King {
                let moved = feature_index(perspective, king_sq, us, mv.piece(), mv.from());
                self.sub(perspective, moved, weights);
                let placed = mv.promoted().unwrap_or(mv.piece());
                let landed = feature_index(perspective, king_sq, us, placed, mv.to());
                self.add(perspective, landed, weights);
            }
            // The mover's king itself is never a feature from either
            // perspective, but its capture victim and castling rook are.

            if mv.is_en_passant() {
                let cap_sq = Square::new(mv.from().rank(), mv.to().file());
                let victim = feature_index(perspective, king_sq, them, Piece::Pawn, cap_sq);
                self.sub(perspective, victim, weights);
            } else if let Some(captured) = mv.captured() {
                let victim = feature_index(perspective, king_sq, them, captured, mv.to());
                self.sub(perspective, victim, weights);
            }

            if mv.is_castle() {
                let rank = mv.from().rank();
                let (rook_from, rook_to) = if mv.to().file() == 6 { (7, 5) } else { (0, 3) };
                let lifted =
                    feature_index(perspective, king_sq, us, Piece::Rook, Square::new(rank, rook_from));
                self.sub(perspective, lifted, weights);
                let dropped =
                    feature_index(perspective, king_sq, us, Piece::Rook, Square::new(rank, rook_to));
                self.add(perspective, dropped, weights);
            }
        }
    }
}

#[derive(Clone)]
struct StackEntry {
    hash: u64,
    acc: Accumulator,
}

/// One accumulator per search ply, tagged with the position hash.
///
/// Entries above the live top are kept stale rather than cleared; when
/// the search revisits a position whose hash still matches (the common
/// case along re-searched lines), the push is free.
pub struct AccumulatorStack {
    entries: Vec<StackEntry>,
    len: usize,
}

impl AccumulatorStack {
    #[must_use]
    pub fn new() -> Self {
        AccumulatorStack {
            entries: vec![
                StackEntry {
                    hash: 0,
                    acc: Accumulator::default(),
                };
                MAX_PLY + 2
            ],
            len: 0,
        }
    }

    /// Initialize ply 0 from the root position. Stale entries from the
    /// previous search are dropped; they may have been built with
    /// different weights.
    pub fn reset(&mut self, root: &Board, weights: &Weights, cache: &mut RefreshCache) {
        for entry in &mut self.entries {
            entry.hash = 0;
        }
        let entry = &mut self.entries[0];
        entry.acc.refresh(Color::White, root, weights, cache);
        entry.acc.refresh(Color::Black, root, weights, cache);
        entry.hash = root.hash();
        self.len = 1;
    }

    /// Push the accumulator for `child = parent.apply(mv)`, reusing a
    /// still-valid stale entry when the hash matches.
    pub fn push(
        &mut self,
        parent: &Board,
        child: &Board,
        mv: Move,
        weights: &Weights,
        cache: &mut RefreshCache,
    ) {
        debug_assert!(self.len > 0, "push before reset");
        if self.entries[self.len].hash == child.hash() {
            self.len += 1;
            return;
        }

        let (below, above) = self.entries.split_at_mut(self.len);
        let target = &mut above[0];
        target.acc = below[self.len - 1].acc.clone();
        target.acc.update(parent, child, mv, weights, cache);
        target.hash = child.hash();
        self.len += 1;
    }

    /// A null move leaves the piece configuration untouched: reuse the
    /// parent accumulator for the child ply.
    pub fn push_null(&mut self, child: &Board) {
        debug_assert!(self.len > 0, "push before reset");
        let parent_acc = self.entries[self.len - 1].acc.clone();
        let target = &mut self.entries[self.len];
        target.acc = parent_acc;
        target.hash = child.hash();
        self.len += 1;
    }

    pub fn pop(&mut self) {
        debug_assert!(self.len > 1, "pop past the root");
        self.len -= 1;
    }

    #[must_use]
    pub fn top(&self) -> &Accumulator {
        &self.entries[self.len - 1].acc
    }
}

impl Default for AccumulatorStack {
    fn default() -> Self {
        AccumulatorStack::new()
    }
}
