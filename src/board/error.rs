//! Error types for board construction and move parsing.

use std::error::Error;
use std::fmt;

/// Errors from parsing a FEN string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FenError {
    /// FEN must have at least the placement, side, castling and en passant fields
    TooFewParts { found: usize },
    /// More than 8 ranks in the placement field
    InvalidRank { rank: usize },
    /// A rank describes more than 8 files
    TooManyFiles { rank: usize, files: usize },
    /// Unknown piece character
    InvalidPiece { ch: char },
    /// Side-to-move field was not "w" or "b"
    InvalidSideToMove { found: String },
    /// Unknown castling character
    InvalidCastling { ch: char },
    /// En passant field was neither "-" nor a square
    InvalidEnPassant { found: String },
    /// A side has no king, or more than one
    BadKingCount { color: &'static str, count: u32 },
}

impl fmt::Display for FenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FenError::TooFewParts { found } => {
                write!(f, "FEN has {found} fields, expected at least 4")
            }
            FenError::InvalidRank { rank } => write!(f, "FEN has more than 8 ranks ({rank})"),
            FenError::TooManyFiles { rank, files } => {
                write!(f, "rank {rank} of FEN describes {files} files")
            }
            FenError::InvalidPiece { ch } => write!(f, "invalid piece character '{ch}'"),
            FenError::InvalidSideToMove { found } => {
                write!(f, "invalid side to move '{found}'")
            }
            FenError::InvalidCastling { ch } => write!(f, "invalid castling character '{ch}'"),
            FenError::InvalidEnPassant { found } => {
                write!(f, "invalid en passant target '{found}'")
            }
            FenError::BadKingCount { color, count } => {
                write!(f, "{color} has {count} kings")
            }
        }
    }
}

impl Error for FenError {}

/// Errors from parsing square notation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SquareError {
    InvalidNotation { notation: String },
}

impl fmt::Display for SquareError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SquareError::InvalidNotation { notation } => {
                write!(f, "invalid square notation '{notation}'")
            }
        }
    }
}

impl Error for SquareError {}

/// Errors from parsing a UCI move string against a position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveParseError {
    /// UCI moves are 4 or 5 characters
    InvalidLength { len: usize },
    /// Square characters out of range
    InvalidSquare { notation: String },
    /// Promotion character was not one of q, r, b, n
    InvalidPromotion { ch: char },
    /// The move parsed but is not legal in the position
    IllegalMove { notation: String },
}

impl fmt::Display for MoveParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveParseError::InvalidLength { len } => {
                write!(f, "UCI move has invalid length {len}")
            }
            MoveParseError::InvalidSquare { notation } => {
                write!(f, "invalid square in move '{notation}'")
            }
            MoveParseError::InvalidPromotion { ch } => {
                write!(f, "invalid promotion piece '{ch}'")
            }
            MoveParseError::IllegalMove { notation } => {
                write!(f, "move '{notation}' is not legal in this position")
            }
        }
    }
}

impl Error for MoveParseError {}
