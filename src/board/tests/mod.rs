//! Board test suites.

mod fen;
mod perft;
mod proptest;
mod see;
