//! Observed character data.
//!
//! A [DataMatrix] holds one row of state codes per taxon, read through an
//! [Alphabet]; [DataMatrix::compress] merges identical columns into the
//! [PatternMatrix] a likelihood engine works on.

pub mod alphabet;
pub mod matrix;

pub use alphabet::{Alphabet, Symbol, MAX_STATES};
pub use matrix::{DataMatrix, PatternMatrix, GAP_CODE};
