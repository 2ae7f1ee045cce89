//! Network weights and the on-disk format.
//!
//! The weights file is one contiguous little-endian blob of i16 values
//! in network order: feature weights, feature bias, L1, L2, output.
//! Loading is a single sequential read with a strict size check.

use std::error::Error;
use std::fmt;
use std::fs;
use std::path::Path;

/// Input features per perspective: 64 king squares x 5 piece types x
/// 2 colors x 64 squares.
pub const INPUT_FEATURES: usize = 40960;

/// Feature transformer output width per perspective.
pub const HIDDEN_SIZE: usize = 128;

/// Width of the two dense layers after the transformer.
pub const L1_SIZE: usize = 16;

/// Errors from loading a weights blob.
#[derive(Debug)]
pub enum WeightsError {
    /// The blob is not exactly the expected number of bytes
    Size { expected: usize, found: usize },
    Io(std::io::Error),
}

impl fmt::Display for WeightsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeightsError::Size { expected, found } => {
                write!(f, "weights blob is {found} bytes, expected {expected}")
            }
            WeightsError::Io(err) => write!(f, "failed to read weights: {err}"),
        }
    }
}

impl Error for WeightsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            WeightsError::Io(err) => Some(err),
            WeightsError::Size { .. } => None,
        }
    }
}

impl From<std::io::Error> for WeightsError {
    fn from(err: std::io::Error) -> Self {
        WeightsError::Io(err)
    }
}

/// Immutable network weights, shared by pointer between all workers.
#[derive(Debug)]
pub struct Weights {
    /// Feature transformer rows, one per input feature
    pub feature_weights: Box<[[i16; HIDDEN_SIZE]]>,
    pub feature_bias: [i16; HIDDEN_SIZE],
    /// First dense layer, one row per concatenated accumulator lane
    pub l1_weights: Box<[[i16; L1_SIZE]]>,
    pub l1_bias: [i16; L1_SIZE],
    pub l2_weights: [[i16; L1_SIZE]; L1_SIZE],
    pub l2_bias: [i16; L1_SIZE],
    pub output_weights: [i16; L1_SIZE],
    pub output_bias: i16,
}

impl Weights {
    /// Total i16 count of the blob.
    const VALUE_COUNT: usize = INPUT_FEATURES * HIDDEN_SIZE
        + HIDDEN_SIZE
        + 2 * HIDDEN_SIZE * L1_SIZE
        + L1_SIZE
        + L1_SIZE * L1_SIZE
        + L1_SIZE
        + L1_SIZE
        + 1;

    /// Expected blob size in bytes.
    #[must_use]
    pub const fn expected_bytes() -> usize {
        Self::VALUE_COUNT * 2
    }

    /// All-zero weights. The engine still plays (search and material
    /// exchange logic carry it); used when no weights file is supplied
    /// and throughout the tests.
    #[must_use]
    pub fn zeroed() -> Self {
        Weights {
            feature_weights: vec![[0i16; HIDDEN_SIZE]; INPUT_FEATURES].into_boxed_slice(),
            feature_bias: [0; HIDDEN_SIZE],
            l1_weights: vec![[0i16; L1_SIZE]; 2 * HIDDEN_SIZE].into_boxed_slice(),
            l1_bias: [0; L1_SIZE],
            l2_weights: [[0; L1_SIZE]; L1_SIZE],
            l2_bias: [0; L1_SIZE],
            output_weights: [0; L1_SIZE],
            output_bias: 0,
        }
    }

    /// Parse a weights blob, verifying its exact size.
    pub fn from_bytes(data: &[u8]) -> Result<Self, WeightsError> {
        if data.len() != Self::expected_bytes() {
            return Err(WeightsError::Size {
                expected: Self::expected_bytes(),
                found: data.len(),
            });
        }

        let mut values = data
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]));
        let mut next = move || values.next().expect("length checked above");

        let mut weights = Weights::zeroed();
        for row in weights.feature_weights.iter_mut() {
            for w in row.iter_mut() {
                *w = next();
            }
        }
        for w in &mut weights.feature_bias {
            *w = next();
        }
        for row in weights.l1_weights.iter_mut() {
            for w in row.iter_mut() {
                *w = next();
            }
        }
        for w in &mut weights.l1_bias {
            *w = next();
        }
        for row in &mut weights.l2_weights {
            for w in row.iter_mut() {
                *w = next();
            }
        }
        for w in &mut weights.l2_bias {
            *w = next();
        }
        for w in &mut weights.output_weights {
            *w = next();
        }
        weights.output_bias = next();

        Ok(weights)
    }

    /// Load a weights blob from disk.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, WeightsError> {
        let data = fs::read(path)?;
        Self::from_bytes(&data)
    }
}
