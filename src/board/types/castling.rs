//! Castling rights bitmask.

use super::piece::Color;

pub(crate) const CASTLE_WHITE_K: u8 = 0b0001;
pub(crate) const CASTLE_WHITE_Q: u8 = 0b0010;
pub(crate) const CASTLE_BLACK_K: u8 = 0b0100;
pub(crate) const CASTLE_BLACK_Q: u8 = 0b1000;

/// Bit for one side's kingside or queenside right.
#[inline]
pub(crate) const fn castle_bit(color: Color, kingside: bool) -> u8 {
    match (color, kingside) {
        (Color::White, true) => CASTLE_WHITE_K,
        (Color::White, false) => CASTLE_WHITE_Q,
        (Color::Black, true) => CASTLE_BLACK_K,
        (Color::Black, false) => CASTLE_BLACK_Q,
    }
}

/// Rights cleared when a piece moves from or is captured on a square.
///
/// Only the four rook home squares and the two king home squares carry
/// any rights; every other square maps to "clear nothing".
pub(crate) const fn castle_rights_mask(square_index: usize) -> u8 {
    match square_index {
        0 => !CASTLE_WHITE_Q,  // a1
        4 => !(CASTLE_WHITE_K | CASTLE_WHITE_Q), // e1
        7 => !CASTLE_WHITE_K,  // h1
        56 => !CASTLE_BLACK_Q, // a8
        60 => !(CASTLE_BLACK_K | CASTLE_BLACK_Q), // e8
        63 => !CASTLE_BLACK_K, // h8
        _ => 0xFF,
    }
}
