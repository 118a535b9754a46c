//! Low-level parsing infrastructure for Newick tree descriptions.
//!
//! Provides the byte cursor [byte_parser::ByteParser] and the positional
//! [ParsingError] used by [crate::newick].

pub mod byte_parser;
pub mod parsing_error;

pub use parsing_error::{ParsingError, ParsingErrorType};
