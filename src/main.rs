use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use log::{error, Level, LevelFilter, Metadata, Record};

use seer::nnue::Weights;
use seer::uci::{EngineOptions, Uci};

/// Protocol output owns stdout; diagnostics go to stderr.
struct StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Info
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("{}: {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn main() -> ExitCode {
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(LevelFilter::Info);

    let mut options = EngineOptions::default();
    if let Some(path) = std::env::args().nth(1) {
        options.weights_path = Some(path);
    }

    // A configured weights file that fails to load is fatal; with no
    // file configured the engine runs on zeroed weights.
    let weights = match &options.weights_path {
        Some(path) => match Weights::load(path) {
            Ok(weights) => weights,
            Err(err) => {
                error!("{err}");
                return ExitCode::FAILURE;
            }
        },
        None => Weights::zeroed(),
    };

    let mut uci = Uci::new(options, Arc::new(weights));
    let code = uci.run(io::stdin().lock());
    if code == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
