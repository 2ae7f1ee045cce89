//! King-bucketed refresh cache.
//!
//! Rebuilding an accumulator perspective from scratch touches every
//! piece, but the pawn contribution dominates and changes rarely. The
//! cache keeps one prebuilt pawn contribution per (perspective, king
//! square), validated by the pawn/king sub-hash, so a king move usually
//! reduces to "copy cached pawns, add a handful of pieces".

use crate::board::{Board, Color, Piece};

use super::accumulator::feature_index;
use super::vector::add_row;
use super::weights::{Weights, HIDDEN_SIZE};

#[derive(Clone)]
struct CacheEntry {
    key: u64,
    values: [i16; HIDDEN_SIZE],
}

impl Default for CacheEntry {
    fn default() -> Self {
        CacheEntry {
            key: 0,
            values: [0; HIDDEN_SIZE],
        }
    }
}

/// Per-worker direct-mapped cache: one slot per perspective and king
/// square.
pub struct RefreshCache {
    entries: Vec<CacheEntry>,
}

impl RefreshCache {
    #[must_use]
    pub fn new() -> Self {
        RefreshCache {
            entries: vec![CacheEntry::default(); 2 * 64],
        }
    }

    pub fn clear(&mut self) {
        for entry in &mut self.entries {
            entry.key = 0;
        }
    }

    /// Bias plus the pawn feature rows for this perspective and king
    /// square, rebuilt on a key miss.
    pub(crate) fn pawn_contribution(
        &mut self,
        perspective: Color,
        board: &Board,
        weights: &Weights,
    ) -> &[i16; HIDDEN_SIZE] {
        let king_sq = board.king_square(perspective);
        let slot = perspective.index() * 64 + king_sq.index();
        let entry = &mut self.entries[slot];

        if entry.key != board.pawn_king_hash() {
            entry.values = weights.feature_bias;
            for color in [Color::White, Color::Black] {
                for sq in board.pieces_of(color, Piece::Pawn) {
                    let feature = feature_index(perspective, king_sq, color, Piece::Pawn, sq);
                    add_row(&mut entry.values, &weights.feature_weights[feature]);
                }
            }
            entry.key = board.pawn_king_hash();
        }

        &self.entries[slot].values
    }
}

impl Default for RefreshCache {
    fn default() -> Self {
        RefreshCache::new()
    }
}
