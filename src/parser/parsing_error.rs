//! Error type for the Newick reader, name/number rectification and sequence rows.
//!
//! This module provides [ParsingError] and [ParsingErrorType] for reporting
//! malformed tree descriptions together with where in the input they occurred.

use crate::parser::byte_parser::ByteParser;
use std::error::Error;
use std::fmt;

/// Default length of context provided by error from parser
const DEFAULT_CONTEXT_LENGTH: usize = 50;


// =#========================================================================#=
// PARSING ERROR TYPE
// =#========================================================================#=
/// Kinds of format errors.
#[derive(PartialEq, Debug, Clone)]
pub enum ParsingErrorType {
    UnexpectedEOF,
    UnclosedComment,
    UnclosedQuote,
    InvalidNewickString(String),
    InvalidEdgeLength(String),
    PartialEdgeLengths,
    InvalidTipNumbering(String),
    NameListMismatch(String),
    InvalidSequence(String),
}


// =#========================================================================#=
// PARSING ERROR
// =#========================================================================#=
/// Format error with contextual information (position and following bytes).
#[derive(Debug, Clone)]
pub struct ParsingError {
    kind: ParsingErrorType,
    position: usize,
    context: String,
}

impl ParsingError {
    /// Create a ParsingError from an error type and parser state
    pub fn from_parser(kind: ParsingErrorType, parser: &ByteParser) -> Self {
        Self {
            kind,
            position: parser.position(),
            context: parser.get_context_as_string(DEFAULT_CONTEXT_LENGTH),
        }
    }

    /// Convenience constructor for UnexpectedEOF
    pub fn unexpected_eof(parser: &ByteParser) -> Self {
        Self::from_parser(ParsingErrorType::UnexpectedEOF, parser)
    }

    /// Convenience constructor for UnclosedComment
    pub fn unclosed_comment(parser: &ByteParser) -> Self {
        Self::from_parser(ParsingErrorType::UnclosedComment, parser)
    }

    /// Convenience constructor for UnclosedQuote
    pub fn unclosed_quote(parser: &ByteParser) -> Self {
        Self::from_parser(ParsingErrorType::UnclosedQuote, parser)
    }

    /// Convenience constructor for InvalidNewickString
    pub fn invalid_newick_string(parser: &ByteParser, msg: String) -> Self {
        Self::from_parser(ParsingErrorType::InvalidNewickString(msg), parser)
    }

    /// Convenience constructor for InvalidEdgeLength
    pub fn invalid_edge_length(parser: &ByteParser, msg: String) -> Self {
        Self::from_parser(ParsingErrorType::InvalidEdgeLength(msg), parser)
    }

    /// Convenience constructor for PartialEdgeLengths
    pub fn partial_edge_lengths(parser: &ByteParser) -> Self {
        Self::from_parser(ParsingErrorType::PartialEdgeLengths, parser)
    }

    /// Convenience constructor for InvalidTipNumbering
    pub fn invalid_tip_numbering(parser: &ByteParser, msg: String) -> Self {
        Self::from_parser(ParsingErrorType::InvalidTipNumbering(msg), parser)
    }

    /// Create a ParsingError without parser context (for checks on a built tree)
    pub fn without_context(kind: ParsingErrorType) -> Self {
        Self { kind, position: 0, context: String::new() }
    }

    /// Get the error kind
    pub fn kind(&self) -> &ParsingErrorType {
        &self.kind
    }

    /// Get the position where the error occurred
    pub fn position(&self) -> usize {
        self.position
    }
}

impl fmt::Display for ParsingError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.kind {
            ParsingErrorType::UnexpectedEOF => write!(f, "Unexpected end of tree description")?,
            ParsingErrorType::UnclosedComment => write!(f, "Unclosed comment")?,
            ParsingErrorType::UnclosedQuote => write!(f, "Expecting single quote to mark the end of node name")?,
            ParsingErrorType::InvalidNewickString(msg) => write!(f, "Invalid newick string: {msg}")?,
            ParsingErrorType::InvalidEdgeLength(msg) => write!(f, "Invalid edge length: {msg}")?,
            ParsingErrorType::PartialEdgeLengths => write!(f, "Some but not all edge lengths were specified")?,
            ParsingErrorType::InvalidTipNumbering(msg) => write!(f, "Invalid tip numbering - {msg}")?,
            ParsingErrorType::NameListMismatch(msg) => write!(f, "Name list does not match tree - {msg}")?,
            ParsingErrorType::InvalidSequence(msg) => write!(f, "Invalid sequence data - {msg}")?,
        }

        // Checks on a built tree or on sequence rows have no byte position
        if !matches!(self.kind, ParsingErrorType::NameListMismatch(_) | ParsingErrorType::InvalidSequence(_)) {
            write!(f, " at position {}", self.position)?;
        }

        if !self.context.is_empty() {
            write!(f, "\n  Context (next {} bytes): {}", self.context.len(), self.context)?;
        }

        Ok(())
    }
}

impl Error for ParsingError {}
