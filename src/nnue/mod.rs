//! NNUE (efficiently updatable neural network) evaluation.
//!
//! A HalfKP feature transformer feeds two perspective accumulators that
//! are maintained incrementally as moves are applied, followed by a
//! small quantized dense network producing a centipawn score.
//!
//! Architecture: (40960 -> 128) x 2 perspectives -> 16 -> 16 -> 1

mod accumulator;
mod cache;
mod vector;
mod weights;

pub use accumulator::{feature_index, Accumulator, AccumulatorStack};
pub use cache::RefreshCache;
pub use weights::{Weights, WeightsError, HIDDEN_SIZE, INPUT_FEATURES, L1_SIZE};

use crate::board::{Board, Color};

/// Activation quantization factor: accumulator lanes are clamped to
/// `[0, QA]` before every layer.
pub const QA: i32 = 255;

/// Dense layer weight quantization factor.
pub const QB: i32 = 64;

/// Centipawn scale of the raw network output.
pub const SCALE: i32 = 400;

#[inline]
fn clamped(x: i32) -> i32 {
    x.clamp(0, QA)
}

/// Run the forward pass for the given side to move.
///
/// The side to move's perspective forms the first half of the input,
/// the opponent's the second, so the network always sees the position
/// "from the mover's seat".
#[must_use]
pub fn evaluate(weights: &Weights, acc: &Accumulator, stm: Color) -> i32 {
    let mut l1 = [0i32; L1_SIZE];
    for (half, perspective) in [stm, stm.them()].into_iter().enumerate() {
        let values = acc.perspective(perspective);
        let offset = half * HIDDEN_SIZE;
        for (i, &v) in values.iter().enumerate() {
            let x = clamped(i32::from(v));
            if x == 0 {
                continue;
            }
            let row = &weights.l1_weights[offset + i];
            for (sum, &w) in l1.iter_mut().zip(row.iter()) {
                *sum += x * i32::from(w);
            }
        }
    }

    let mut l1_out = [0i32; L1_SIZE];
    for (out, (&sum, &bias)) in l1_out
        .iter_mut()
        .zip(l1.iter().zip(weights.l1_bias.iter()))
    {
        *out = clamped(sum / QB + i32::from(bias));
    }

    let mut l2_out = [0i32; L1_SIZE];
    for (j, out) in l2_out.iter_mut().enumerate() {
        let mut sum = 0i32;
        for (i, &x) in l1_out.iter().enumerate() {
            sum += x * i32::from(weights.l2_weights[i][j]);
        }
        *out = clamped(sum / QB + i32::from(weights.l2_bias[j]));
    }

    let mut out = 0i32;
    for (&x, &w) in l2_out.iter().zip(weights.output_weights.iter()) {
        out += x * i32::from(w);
    }
    (i32::from(weights.output_bias) + out / QB) * SCALE / QA
}

/// Evaluate a board from scratch: build a fresh accumulator and run the
/// forward pass. The search keeps accumulators incrementally instead;
/// this is the reference path and the entry point for tools and tests.
#[must_use]
pub fn evaluate_board(weights: &Weights, board: &Board) -> i32 {
    let mut cache = RefreshCache::new();
    let mut acc = Accumulator::default();
    acc.refresh(Color::White, board, weights, &mut cache);
    acc.refresh(Color::Black, board, weights, &mut cache);
    evaluate(weights, &acc, board.side_to_move())
}
