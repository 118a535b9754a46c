//! Prunewick computes phylogenetic likelihoods by Felsenstein pruning on
//! Newick trees, caching partial results so that small changes are cheap to
//! evaluate and cheap to undo.
//!
//! Core functionality provided:
//! - Newick: Parse a tree from a Newick string (tip-rooted, arbitrary
//!   out-degree) and write it back.
//! - Tree model: [Tree](crate::model::Tree) is an arena of nodes with stable
//!   handles, a preorder thread and structural edits (reroot, detach/insert
//!   subtrees, ladderize).
//! - Data: [DataMatrix](crate::data::DataMatrix) of discrete characters with
//!   gaps, missing data and ambiguity codes, compressed into site patterns.
//! - Likelihood: [TreeLikelihood](crate::likelihood::TreeLikelihood) with
//!   directed conditional likelihood arrays (CLAs), a
//!   propose / accept / revert protocol and per-pattern underflow protection.
//!
//! Limitations:
//! - Substitution models are supplied through the
//!   [SubstitutionModel](crate::substitution::SubstitutionModel) trait; only
//!   the symmetric N-state model ships with the crate
//! - No partitioned data; one model for all patterns
//!
//! # Usage patterns
//! 1. Parse a tree with [parse_newick_str] or
//!    [NewickParser](crate::newick::NewickParser) for full control.
//! 2. Build a [DataMatrix](crate::data::DataMatrix) and compress it.
//! 3. Hand tree, model and patterns to a
//!    [TreeLikelihood](crate::likelihood::TreeLikelihood).
//!
//! ## Example
//! ```
//! use prunewick::data::{Alphabet, DataMatrix};
//! use prunewick::likelihood::TreeLikelihood;
//! use prunewick::parse_newick_str;
//! use prunewick::substitution::JukesCantor;
//!
//! let tree = parse_newick_str("((A:0.1,B:0.2):0.05,C:0.3,D:0.4);").unwrap();
//! let data = DataMatrix::from_sequences(&Alphabet::dna(), &[
//!     ("A", "ACGT-N"), ("B", "ACGTAA"), ("C", "ACCTAR"), ("D", "GCCTAA"),
//! ]).unwrap().compress();
//!
//! let mut engine = TreeLikelihood::new(tree, JukesCantor::new(4), data).unwrap();
//! let ln_l = engine.compute_log_likelihood(None).unwrap();
//! assert!(ln_l < 0.0);
//! assert!(ln_l > engine.log_likelihood_at_saturation());
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod likelihood;
pub mod model;
pub mod newick;
pub mod parser;
pub mod substitution;

pub use crate::error::PruneError;

use crate::model::Tree;

// ============================================================================
// Quick Newick API
// ============================================================================
/// Parse a Newick string using default settings, returning a [Tree] rooted
/// at its first tip.
///
/// See [`newick::parse_str`] for full documentation of this convenience function.
pub fn parse_newick_str<S: AsRef<str>>(newick: S) -> Result<Tree, PruneError> {
    Ok(newick::parse_str(newick)?)
}
