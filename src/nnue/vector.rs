//! Accumulator lane arithmetic.
//!
//! Plain fixed-width loops over the 128 i16 lanes; the shapes are
//! static so the optimizer vectorizes them on every target we build
//! for.

use super::weights::HIDDEN_SIZE;

#[inline]
pub(crate) fn add_row(acc: &mut [i16; HIDDEN_SIZE], row: &[i16; HIDDEN_SIZE]) {
    for (a, &w) in acc.iter_mut().zip(row.iter()) {
        *a = a.wrapping_add(w);
    }
}

#[inline]
pub(crate) fn sub_row(acc: &mut [i16; HIDDEN_SIZE], row: &[i16; HIDDEN_SIZE]) {
    for (a, &w) in acc.iter_mut().zip(row.iter()) {
        *a = a.wrapping_sub(w);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_then_sub_is_identity() {
        let mut acc = [5i16; HIDDEN_SIZE];
        let mut row = [0i16; HIDDEN_SIZE];
        for (i, w) in row.iter_mut().enumerate() {
            *w = (i as i16) - 64;
        }
        let original = acc;
        add_row(&mut acc, &row);
        sub_row(&mut acc, &row);
        assert_eq!(acc, original);
    }
}
