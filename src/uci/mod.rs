//! UCI front end.
//!
//! A line loop over stdin that owns the engine state. Searches run on a
//! background thread so `stop` stays responsive; the pool itself sits
//! behind a mutex that the search thread holds for the duration of one
//! `go`, while the stop flag is reachable without it.

mod options;
mod protocol;

use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

use log::{error, warn};
use parking_lot::Mutex;

use crate::board::{Board, Color, PositionHistory};
use crate::nnue::Weights;
use crate::search::{InfoCallback, SearchLimits, SearchPool};
use crate::time::TimeControl;

pub use options::EngineOptions;
pub use protocol::{parse_command, GoParams, UciCommand};

use options::OptionAction;
use protocol::{format_bestmove, format_info};

const ENGINE_NAME: &str = concat!("Seer ", env!("CARGO_PKG_VERSION"));
const ENGINE_AUTHOR: &str = "the Seer authors";

/// The UCI session state.
pub struct Uci {
    pool: Arc<Mutex<SearchPool>>,
    stop: Arc<AtomicBool>,
    options: EngineOptions,
    board: Board,
    history: PositionHistory,
    search_thread: Option<JoinHandle<()>>,
}

impl Uci {
    #[must_use]
    pub fn new(options: EngineOptions, weights: Arc<Weights>) -> Self {
        let pool = SearchPool::new(options.threads, options.hash_mb, weights);
        let stop = pool.stop_handle();
        let board = Board::startpos();
        let mut history = PositionHistory::new();
        history.push(board.hash());
        Uci {
            pool: Arc::new(Mutex::new(pool)),
            stop,
            options,
            board,
            history,
            search_thread: None,
        }
    }

    /// Drive the protocol until `quit` or end of input. Returns the
    /// process exit code.
    pub fn run(&mut self, input: impl BufRead) -> i32 {
        for line in input.lines() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    error!("stdin read failed: {err}");
                    return 1;
                }
            };

            let command = match parse_command(&line) {
                Ok(Some(command)) => command,
                Ok(None) => continue,
                Err(unknown) => {
                    warn!("{unknown}");
                    continue;
                }
            };

            if self.handle(command) {
                return 0;
            }
        }
        self.shutdown();
        0
    }

    /// Handle one command; true means quit.
    fn handle(&mut self, command: UciCommand) -> bool {
        match command {
            UciCommand::Uci => {
                println!("id name {ENGINE_NAME}");
                println!("id author {ENGINE_AUTHOR}");
                for declaration in self.options.declarations() {
                    println!("{declaration}");
                }
                println!("uciok");
            }
            UciCommand::IsReady => {
                println!("readyok");
            }
            UciCommand::UciNewGame => {
                self.finish_search();
                self.set_startpos();
                self.pool.lock().clear_tt();
            }
            UciCommand::Position { fen, moves } => {
                self.finish_search();
                self.set_position(fen.as_deref(), &moves);
            }
            UciCommand::Go(params) => {
                self.finish_search();
                self.go(params);
            }
            UciCommand::SetOption { name, value } => {
                self.finish_search();
                self.set_option(&name, value.as_deref());
            }
            UciCommand::Stop => {
                self.stop.store(true, Ordering::Relaxed);
                self.finish_search();
            }
            UciCommand::Quit => {
                self.shutdown();
                return true;
            }
        }
        false
    }

    fn set_startpos(&mut self) {
        self.board = Board::startpos();
        self.history.clear();
        self.history.push(self.board.hash());
    }

    fn set_position(&mut self, fen: Option<&str>, moves: &[String]) {
        let board = match fen {
            None => Board::startpos(),
            Some(fen) => match Board::parse_fen(fen) {
                Ok(board) => board,
                Err(err) => {
                    // Position stays as it was
                    warn!("ignoring position command: {err}");
                    return;
                }
            },
        };

        self.board = board;
        self.history.clear();
        self.history.push(self.board.hash());

        for uci in moves {
            match self.board.parse_move(uci) {
                Ok(mv) => {
                    self.board = self.board.apply(mv);
                    self.history.push(self.board.hash());
                }
                Err(err) => {
                    // Stop applying the rest of the list
                    warn!("illegal move in position history: {err}");
                    break;
                }
            }
        }
    }

    fn set_option(&mut self, name: &str, value: Option<&str>) {
        match self.options.apply(name, value) {
            OptionAction::ResizeHash(mb) => self.pool.lock().resize_tt(mb),
            OptionAction::SetThreads(threads) => self.pool.lock().set_threads(threads),
            OptionAction::ClearHash => self.pool.lock().clear_tt(),
            OptionAction::LoadWeights(path) => match Weights::load(&path) {
                Ok(weights) => self.pool.lock().set_weights(Arc::new(weights)),
                Err(err) => {
                    // A bad weights file leaves no usable evaluator
                    error!("{err}");
                    std::process::exit(1);
                }
            },
            OptionAction::Unknown => warn!("unknown option '{name}'"),
        }
    }

    fn go(&mut self, params: GoParams) {
        let start = Instant::now();
        let limits = self.limits_for(params, start);
        let board = self.board;
        let history = self.history.clone();
        let pool = Arc::clone(&self.pool);

        // Lower the flag here, before the search thread exists, so a
        // `stop` arriving from now on is never erased by the search's
        // own startup.
        self.stop.store(false, Ordering::Relaxed);

        let info: InfoCallback = Arc::new(|info| {
            println!("{}", format_info(info));
        });

        self.search_thread = Some(std::thread::spawn(move || {
            let report = pool.lock().go(&board, &history, &limits, Some(info));
            println!("{}", format_bestmove(report.best_move));
        }));
    }

    fn limits_for(&self, params: GoParams, start: Instant) -> SearchLimits {
        let limits = SearchLimits {
            max_depth: params.depth,
            node_limit: params.nodes,
            soft_deadline: None,
            hard_deadline: None,
        };

        let control = if params.infinite {
            TimeControl::Infinite
        } else if let Some(ms) = params.movetime {
            TimeControl::MoveTime { ms }
        } else {
            let (remaining, increment) = match self.board.side_to_move() {
                Color::White => (params.wtime, params.winc),
                Color::Black => (params.btime, params.binc),
            };
            match remaining {
                Some(remaining_ms) => TimeControl::Clock {
                    remaining_ms,
                    increment_ms: increment.unwrap_or(0),
                    moves_to_go: params.movestogo,
                },
                None => TimeControl::Infinite,
            }
        };

        control.apply(limits, start)
    }

    /// Abort and join the previous search thread, if any. Harmless when
    /// the search already ended on its own.
    fn finish_search(&mut self) {
        if let Some(handle) = self.search_thread.take() {
            self.stop.store(true, Ordering::Relaxed);
            let _ = handle.join();
        }
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        self.finish_search();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> Uci {
        Uci::new(EngineOptions::default(), Arc::new(Weights::zeroed()))
    }

    #[test]
    fn test_position_startpos_with_moves() {
        let mut uci = engine();
        uci.set_position(None, &["e2e4".to_string(), "e7e5".to_string()]);
        assert_eq!(
            uci.board.fen(),
            "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq e6 0 2"
        );
        assert_eq!(uci.history.len(), 3);
    }

    #[test]
    fn test_malformed_fen_keeps_position() {
        let mut uci = engine();
        uci.set_position(None, &["e2e4".to_string()]);
        let before = uci.board;
        uci.set_position(Some("not a fen"), &[]);
        assert_eq!(uci.board, before);
    }

    #[test]
    fn test_illegal_move_stops_list() {
        let mut uci = engine();
        uci.set_position(
            None,
            &["e2e4".to_string(), "e2e4".to_string(), "e7e5".to_string()],
        );
        // Only the first move applies; the rest of the list is dropped
        assert_eq!(
            uci.board.fen(),
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1"
        );
        assert_eq!(uci.history.len(), 2);
    }

    #[test]
    fn test_quit_via_run_loop() {
        let mut uci = engine();
        let input = b"uci\nisready\nquit\n" as &[u8];
        assert_eq!(uci.run(input), 0);
    }

    #[test]
    fn test_go_depth_then_stop_joins() {
        let mut uci = engine();
        uci.handle(UciCommand::Go(GoParams {
            depth: Some(3),
            ..Default::default()
        }));
        assert!(!uci.handle(UciCommand::Stop));
        assert!(uci.search_thread.is_none());
    }
}
