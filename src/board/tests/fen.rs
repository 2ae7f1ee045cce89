//! FEN parsing and emission.

use crate::board::{Board, FenError};

#[test]
fn test_startpos_round_trip() {
    let board = Board::startpos();
    assert_eq!(
        board.fen(),
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
    );
    assert_eq!(Board::parse_fen(&board.fen()).unwrap(), board);
}

#[test]
fn test_round_trip_preserves_all_fields() {
    let fens = [
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        "rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3",
        "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 b - - 12 34",
        "4k3/8/8/3p4/4P3/8/8/4K3 w - - 0 1",
    ];
    for fen in fens {
        let board = Board::parse_fen(fen).unwrap();
        assert_eq!(board.fen(), *fen);
        assert_eq!(Board::parse_fen(&board.fen()).unwrap(), board);
    }
}

#[test]
fn test_rejects_malformed_fens() {
    assert!(matches!(
        Board::parse_fen("8/8/8/8"),
        Err(FenError::TooFewParts { .. })
    ));
    assert!(matches!(
        Board::parse_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR x KQkq - 0 1"),
        Err(FenError::InvalidSideToMove { .. })
    ));
    assert!(matches!(
        Board::parse_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w XQkq - 0 1"),
        Err(FenError::InvalidCastling { .. })
    ));
    assert!(matches!(
        Board::parse_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq e9 0 1"),
        Err(FenError::InvalidEnPassant { .. })
    ));
    assert!(matches!(
        Board::parse_fen("rnbqkbnr/ppppjppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"),
        Err(FenError::InvalidPiece { .. })
    ));
    // No kings at all
    assert!(matches!(
        Board::parse_fen("8/8/8/8/8/8/8/8 w - - 0 1"),
        Err(FenError::BadKingCount { .. })
    ));
}

#[test]
fn test_parse_move_against_position() {
    let board = Board::startpos();
    assert!(board.parse_move("e2e4").is_ok());
    assert!(board.parse_move("e2e5").is_err());
    assert!(board.parse_move("e2").is_err());
    assert!(board.parse_move("z2e4").is_err());
}
