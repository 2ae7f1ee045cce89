use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use seer::board::{Board, PositionHistory};
use seer::nnue::{evaluate_board, Weights};
use seer::search::{SearchLimits, SearchPool};

fn perft_benchmark(c: &mut Criterion) {
    let startpos = Board::startpos();
    let kiwipete =
        Board::parse_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1")
            .unwrap();

    c.bench_function("perft_startpos_4", |b| {
        b.iter(|| black_box(startpos.perft(4)));
    });
    c.bench_function("perft_kiwipete_3", |b| {
        b.iter(|| black_box(kiwipete.perft(3)));
    });
}

fn eval_benchmark(c: &mut Criterion) {
    let weights = Weights::zeroed();
    let board =
        Board::parse_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1")
            .unwrap();

    c.bench_function("eval_from_scratch", |b| {
        b.iter(|| black_box(evaluate_board(&weights, &board)));
    });
}

fn search_benchmark(c: &mut Criterion) {
    c.bench_function("search_startpos_depth_6", |b| {
        b.iter(|| {
            let board = Board::startpos();
            let mut history = PositionHistory::new();
            history.push(board.hash());
            let mut pool = SearchPool::new(1, 16, Arc::new(Weights::zeroed()));
            black_box(pool.go(&board, &history, &SearchLimits::depth(6), None))
        });
    });
}

criterion_group!(benches, perft_benchmark, eval_benchmark, search_benchmark);
criterion_main!(benches);
