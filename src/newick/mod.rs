//! Newick format parser and writer for phylogenetic trees.
//!
//! This module provides [`NewickParser`] to read Newick strings into
//! [`Tree`]s of arbitrary out-degree and [`to_newick`] to write them back.
//!
//! # Quick API
//! * [`parse_str`] - parses a single string with default settings
//! * [`to_newick`] - writes a tree in a given [`NewickStyle`]
//!
//! # Format
//! The Newick format has the following simple grammar:
//! * `tree ::= internal_vertex [';']`
//! * `vertex ::= leaf | internal_vertex`
//! * `internal_vertex ::= '(' vertex (',' vertex)+ ')' [label] [branch_length]`
//! * `leaf ::= label [branch_length]`
//! * `branch_length ::= ':' number`
//!
//! Furthermore:
//! * Whitespace can occur between elements,
//!   just not within an unquoted label or a branch_length
//! * Labels may be single-quoted; `''` inside quotes stands for one quote
//! * Comments are square brackets and can occur anywhere whitespace can

mod parser;
pub mod writer;

pub use self::parser::NewickParser;
pub use self::writer::{escape_label, to_newick, NewickStyle};

use crate::model::Tree;
use crate::parser::ParsingError;

// ============================================================================
// QUICK PARSING API (pub)
// ============================================================================
/// Parses a single Newick string to obtain a [`Tree`] rooted at its first tip.
///
/// # Example
/// ```
/// use prunewick::newick::parse_str;
///
/// let tree = parse_str("(Fratercula_cirrhata,(Fratercula_arctica,Fratercula_corniculata));").unwrap();
/// assert_eq!(tree.num_tips(), 3);
/// ```
pub fn parse_str<S: AsRef<str>>(newick: S) -> Result<Tree, ParsingError> {
    NewickParser::new().parse_str(newick.as_ref())
}
