//! UCI command parsing and response formatting.

use std::fmt;

use crate::board::Move;
use crate::search::SearchInfo;

/// Everything `go` can carry. Times are milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GoParams {
    pub depth: Option<u32>,
    pub nodes: Option<u64>,
    pub movetime: Option<u64>,
    pub wtime: Option<u64>,
    pub btime: Option<u64>,
    pub winc: Option<u64>,
    pub binc: Option<u64>,
    pub movestogo: Option<u64>,
    pub infinite: bool,
}

/// Commands this engine recognizes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UciCommand {
    Uci,
    IsReady,
    UciNewGame,
    Position {
        fen: Option<String>,
        moves: Vec<String>,
    },
    Go(GoParams),
    SetOption {
        name: String,
        value: Option<String>,
    },
    Stop,
    Quit,
}

/// A line that is not a recognized command. Logged and ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCommand {
    pub line: String,
}

impl fmt::Display for UnknownCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown command '{}'", self.line)
    }
}

impl std::error::Error for UnknownCommand {}

/// Parse one line of input. Empty lines parse to nothing rather than
/// an error.
pub fn parse_command(line: &str) -> Result<Option<UciCommand>, UnknownCommand> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let Some(&head) = parts.first() else {
        return Ok(None);
    };

    let command = match head {
        "uci" => UciCommand::Uci,
        "isready" => UciCommand::IsReady,
        "ucinewgame" => UciCommand::UciNewGame,
        "stop" => UciCommand::Stop,
        "quit" => UciCommand::Quit,
        "position" => parse_position(&parts).ok_or_else(|| UnknownCommand {
            line: line.to_string(),
        })?,
        "go" => UciCommand::Go(parse_go(&parts)),
        "setoption" => parse_setoption(&parts).ok_or_else(|| UnknownCommand {
            line: line.to_string(),
        })?,
        _ => {
            return Err(UnknownCommand {
                line: line.to_string(),
            })
        }
    };
    Ok(Some(command))
}

fn parse_position(parts: &[&str]) -> Option<UciCommand> {
    let mut i = 1;
    let fen = match parts.get(i)? {
        &"startpos" => {
            i += 1;
            None
        }
        &"fen" => {
            // A FEN is the next tokens up to "moves" (normally six)
            let start = i + 1;
            let end = parts[start..]
                .iter()
                .position(|&t| t == "moves")
                .map_or(parts.len(), |offset| start + offset);
            if end == start {
                return None;
            }
            i = end;
            Some(parts[start..end].join(" "))
        }
        _ => return None,
    };

    let mut moves = Vec::new();
    if parts.get(i) == Some(&"moves") {
        for &token in &parts[i + 1..] {
            moves.push(token.to_string());
        }
    }
    Some(UciCommand::Position { fen, moves })
}

fn number(parts: &[&str], i: usize) -> Option<u64> {
    parts.get(i).and_then(|s| s.parse::<u64>().ok())
}

fn parse_go(parts: &[&str]) -> GoParams {
    let mut params = GoParams::default();
    let mut i = 1;
    while i < parts.len() {
        match parts[i] {
            "depth" => {
                params.depth = number(parts, i + 1).map(|v| v as u32);
                i += 2;
            }
            "nodes" => {
                params.nodes = number(parts, i + 1);
                i += 2;
            }
            "movetime" => {
                params.movetime = number(parts, i + 1);
                i += 2;
            }
            "wtime" => {
                params.wtime = number(parts, i + 1);
                i += 2;
            }
            "btime" => {
                params.btime = number(parts, i + 1);
                i += 2;
            }
            "winc" => {
                params.winc = number(parts, i + 1);
                i += 2;
            }
            "binc" => {
                params.binc = number(parts, i + 1);
                i += 2;
            }
            "movestogo" => {
                params.movestogo = number(parts, i + 1);
                i += 2;
            }
            "infinite" => {
                params.infinite = true;
                i += 1;
            }
            _ => i += 1,
        }
    }
    params
}

fn parse_setoption(parts: &[&str]) -> Option<UciCommand> {
    // setoption name <tokens...> [value <tokens...>]
    if parts.get(1) != Some(&"name") {
        return None;
    }
    let value_at = parts.iter().position(|&t| t == "value");
    let name_end = value_at.unwrap_or(parts.len());
    if name_end <= 2 {
        return None;
    }
    let name = parts[2..name_end].join(" ");
    let value = value_at.map(|at| parts[at + 1..].join(" "));
    Some(UciCommand::SetOption { name, value })
}

/// Format one iteration as a UCI `info` line.
#[must_use]
pub fn format_info(info: &SearchInfo) -> String {
    let score = match info.mate_in {
        Some(mate) => format!("mate {mate}"),
        None => format!("cp {}", info.score),
    };
    let mut line = format!(
        "info depth {} seldepth {} score {} nodes {} nps {} time {} hashfull {}",
        info.depth, info.seldepth, score, info.nodes, info.nps, info.time_ms, info.hashfull
    );
    if !info.pv.is_empty() {
        line.push_str(" pv");
        for mv in &info.pv {
            line.push(' ');
            line.push_str(&mv.to_string());
        }
    }
    line
}

/// Format the final `bestmove` line.
#[must_use]
pub fn format_bestmove(best: Option<Move>) -> String {
    match best {
        Some(mv) => format!("bestmove {mv}"),
        None => "bestmove 0000".to_string(),
    }
}
