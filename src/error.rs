//! Error taxonomy of the crate.
//!
//! Every fallible public operation returns [PruneError]. Parse failures keep
//! their positional [ParsingError] so callers can still point at the offending
//! byte of a Newick string.

use crate::parser::ParsingError;
use thiserror::Error;

/// Errors surfaced by tree construction, tree edits and likelihood evaluation.
#[derive(Debug, Error)]
pub enum PruneError {
    /// Malformed Newick text, inconsistent tip numbering, or a name list that
    /// does not match the tips of a tree.
    #[error(transparent)]
    Format(#[from] ParsingError),

    /// An illegal tree edit, e.g. detaching a node without parent or choosing a
    /// tip as likelihood root.
    #[error("structural error: {0}")]
    Structural(String),

    /// Tree, data and model disagree on the number of tips, patterns, states or
    /// rate categories.
    #[error("dimension mismatch: {0}")]
    Dimension(String),
}

impl PruneError {
    /// Convenience constructor for [PruneError::Structural].
    pub fn structural<S: Into<String>>(msg: S) -> Self {
        PruneError::Structural(msg.into())
    }

    /// Convenience constructor for [PruneError::Dimension].
    pub fn dimension<S: Into<String>>(msg: S) -> Self {
        PruneError::Dimension(msg.into())
    }

    /// Returns `true` for [PruneError::Format].
    pub fn is_format(&self) -> bool {
        matches!(self, PruneError::Format(_))
    }

    /// Returns `true` for [PruneError::Structural].
    pub fn is_structural(&self) -> bool {
        matches!(self, PruneError::Structural(_))
    }

    /// Returns `true` for [PruneError::Dimension].
    pub fn is_dimension(&self) -> bool {
        matches!(self, PruneError::Dimension(_))
    }
}
