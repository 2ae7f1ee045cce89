//! Zobrist hashing for chess positions.
//!
//! Provides the incrementally-updatable 64-bit position hash used by the
//! transposition table, plus the pawn/king sub-hash that keys the
//! evaluator's refresh cache.

use once_cell::sync::Lazy;
use rand::prelude::*;

pub(crate) struct ZobristKeys {
    // piece_keys[color][piece_type][square_index]
    pub(crate) piece_keys: [[[u64; 64]; 6]; 2],
    pub(crate) side_key: u64,
    // castling_keys[bit] for each of the four rights
    pub(crate) castling_keys: [u64; 4],
    // en_passant_keys[file] (only the file of the target matters)
    pub(crate) en_passant_keys: [u64; 8],
}

impl ZobristKeys {
    fn new() -> Self {
        // Fixed seed keeps hashes reproducible across runs and platforms.
        let mut rng = StdRng::seed_from_u64(0x5EE2_B0A2D_u64);
        let mut piece_keys = [[[0u64; 64]; 6]; 2];
        let mut castling_keys = [0u64; 4];
        let mut en_passant_keys = [0u64; 8];

        for color in &mut piece_keys {
            for piece in color.iter_mut() {
                for key in piece.iter_mut() {
                    *key = rng.gen();
                }
            }
        }

        let side_key = rng.gen();

        for key in &mut castling_keys {
            *key = rng.gen();
        }

        for key in &mut en_passant_keys {
            *key = rng.gen();
        }

        ZobristKeys {
            piece_keys,
            side_key,
            castling_keys,
            en_passant_keys,
        }
    }

    /// XOR of the castling keys for every right set in the mask.
    pub(crate) fn castling_hash(&self, rights: u8) -> u64 {
        let mut hash = 0u64;
        for bit in 0..4 {
            if rights & (1 << bit) != 0 {
                hash ^= self.castling_keys[bit];
            }
        }
        hash
    }
}

pub(crate) static ZOBRIST: Lazy<ZobristKeys> = Lazy::new(ZobristKeys::new);
