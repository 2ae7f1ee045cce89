//! Static exchange evaluation cases.

use crate::board::{Board, Piece};

fn see_of(fen: &str, uci: &str) -> i32 {
    let board = Board::parse_fen(fen).unwrap();
    let mv = board.parse_move(uci).unwrap();
    board.see(mv)
}

#[test]
fn test_undefended_pawn_capture_wins_pawn() {
    assert_eq!(
        see_of("4k3/8/8/3p4/4P3/8/8/4K3 w - - 0 1", "e4d5"),
        Piece::Pawn.value()
    );
}

#[test]
fn test_defended_pawn_capture_is_even() {
    // exd5 exd5: pawn for pawn
    assert_eq!(
        see_of("4k3/8/4p3/3p4/4P3/8/8/4K3 w - - 0 1", "e4d5"),
        0
    );
}

#[test]
fn test_queen_takes_defended_pawn_loses() {
    // Qxd5 exd5 loses the queen for a pawn
    assert_eq!(
        see_of("4k3/8/4p3/3p4/8/8/3Q4/4K3 w - - 0 1", "d2d5"),
        Piece::Pawn.value() - Piece::Queen.value()
    );
}

#[test]
fn test_rook_takes_knight_with_xray_backup() {
    // Rxd5 with a second rook behind on d1: rook takes knight, if the
    // defending pawn recaptures the second rook takes back.
    assert_eq!(
        see_of("4k3/8/4p3/3n4/8/8/3R4/3RK3 w - - 0 1", "d2d5"),
        Piece::Knight.value() - Piece::Rook.value() + Piece::Pawn.value()
    );
}

#[test]
fn test_quiet_move_to_attacked_square_is_negative() {
    // Rook steps onto a square covered by a pawn
    let board = Board::parse_fen("4k3/8/2p5/8/3R4/8/8/4K3 w - - 0 1").unwrap();
    let mv = board.parse_move("d4d5").unwrap();
    assert_eq!(board.see(mv), -Piece::Rook.value());
}

#[test]
fn test_en_passant_exchange() {
    let board =
        Board::parse_fen("rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3").unwrap();
    let mv = board.parse_move("e5f6").unwrap();
    // gxf6 recaptures: pawn for pawn
    assert_eq!(board.see(mv), 0);
}
