//! Property-based board invariants over random game walks.

use proptest::prelude::*;

use crate::board::Board;

/// Walk a pseudo-random line from the starting position, checking at
/// every step that the incrementally maintained state agrees with a
/// from-scratch reconstruction.
fn walk_and_check(choices: &[u8]) {
    let mut board = Board::startpos();
    for &choice in choices {
        let moves = board.generate_moves();
        if moves.is_empty() || board.is_halfmove_draw() {
            break;
        }
        let mv = moves[choice as usize % moves.len()];
        board = board.apply(mv);

        let mut fresh = board;
        fresh.recompute_hashes();
        assert_eq!(board.hash(), fresh.hash(), "hash drifted after {mv}");
        assert_eq!(
            board.pawn_king_hash(),
            fresh.pawn_king_hash(),
            "pawn/king hash drifted after {mv}"
        );

        let round = Board::parse_fen(&board.fen()).unwrap();
        assert_eq!(round, board, "FEN round trip diverged after {mv}");

        assert_eq!(board.mirrored().mirrored(), board);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn random_walks_preserve_invariants(choices in proptest::collection::vec(any::<u8>(), 0..120)) {
        walk_and_check(&choices);
    }
}
