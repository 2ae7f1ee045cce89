//! End-to-end search scenarios over the public API.

use std::sync::Arc;

use seer::board::{Board, PositionHistory};
use seer::nnue::Weights;
use seer::search::{SearchLimits, SearchPool, SearchReport};

fn run(fen: &str, threads: usize, depth: u32) -> SearchReport {
    let board = Board::parse_fen(fen).unwrap();
    let mut history = PositionHistory::new();
    history.push(board.hash());
    let mut pool = SearchPool::new(threads, 16, Arc::new(Weights::zeroed()));
    pool.go(&board, &history, &SearchLimits::depth(depth), None)
}

#[test]
fn mate_in_one_is_found_and_scored() {
    let report = run("6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1", 1, 8);
    assert_eq!(report.best_move.unwrap().to_string(), "a1a8");
    // At least a mate-in-2 score
    assert!(seer::search::mate_in(report.score).is_some());
    assert!(seer::search::mate_in(report.score).unwrap() <= 2);
}

#[test]
fn stalemate_has_no_moves_and_scores_zero() {
    let board = Board::parse_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
    assert!(board.generate_moves().is_empty());
    assert!(!board.in_check());

    let report = run("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1", 1, 6);
    assert!(report.best_move.is_none());
    assert_eq!(report.score, 0);
}

#[test]
fn pv_head_matches_best_move() {
    for fen in [
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
    ] {
        let report = run(fen, 1, 6);
        let best = report.best_move.expect("a move must be found");
        assert_eq!(report.pv.first().copied(), Some(best), "{fen}");
    }
}

#[test]
fn single_and_multi_thread_agree_on_tactics() {
    // Clear-cut tactical positions where any reasonable search
    // converges on one move regardless of thread count.
    let suite = [
        // Mate in one
        ("6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1", "a1a8"),
        // Back-rank mate in one
        ("6k1/5ppp/8/8/8/8/8/K2R4 w - - 0 1", "d1d8"),
        // Hanging queen
        ("4k3/8/8/3q4/4P3/8/5PPP/4K3 w - - 0 1", "e4d5"),
    ];
    for (fen, expected) in suite {
        let single = run(fen, 1, 7);
        let multi = run(fen, 4, 7);
        assert_eq!(single.best_move.unwrap().to_string(), expected, "{fen} (1 thread)");
        assert_eq!(multi.best_move.unwrap().to_string(), expected, "{fen} (4 threads)");
    }
}

#[test]
fn checked_root_produces_a_legal_evasion() {
    let fen = "4k3/8/8/8/7b/8/8/4K3 w - - 0 1";
    let board = Board::parse_fen(fen).unwrap();
    assert!(board.in_check());

    let report = run(fen, 1, 6);
    let best = report.best_move.unwrap();
    assert!(board.generate_moves().contains(best));
}

#[test]
fn node_limit_bounds_the_search() {
    let board = Board::startpos();
    let mut history = PositionHistory::new();
    history.push(board.hash());
    let mut pool = SearchPool::new(1, 16, Arc::new(Weights::zeroed()));
    let report = pool.go(&board, &history, &SearchLimits::nodes(20_000), None);
    assert!(report.best_move.is_some());
    // Batched accounting may overshoot slightly, never by much
    assert!(report.nodes < 200_000, "nodes {}", report.nodes);
}

#[test]
fn repeated_searches_reuse_the_pool() {
    let mut pool = SearchPool::new(2, 16, Arc::new(Weights::zeroed()));
    let mut board = Board::startpos();
    let mut history = PositionHistory::new();
    history.push(board.hash());

    for _ in 0..3 {
        let report = pool.go(&board, &history, &SearchLimits::depth(5), None);
        let best = report.best_move.expect("game is far from over");
        board = board.apply(best);
        history.push(board.hash());
    }
}
