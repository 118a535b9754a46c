//! Felsenstein pruning with cached conditional likelihood arrays.
//!
//! - [TreeLikelihood]: the engine; evaluates a [Tree](crate::model::Tree)
//!   against a [PatternMatrix](crate::data::PatternMatrix) under a
//!   [SubstitutionModel](crate::substitution::SubstitutionModel)
//! - [ClaPool]: recycles CLA buffers
//! - [ClaSlot], [Workspace]: the per-node state the engine attaches to a tree
//! - [UnderflowGuard]: per-pattern rescaling against numerical underflow
//!
//! # Caching
//! Each edge holds up to two directed CLAs, one per side. Evaluating at a
//! different likelihood root reuses all of them; a local change invalidates
//! only those CLAs whose side contains the change. The previous values are
//! kept until the change is accepted or reverted.

pub mod cla;
pub mod engine;
pub(crate) mod kernel;
pub mod underflow;
pub mod workspace;

pub use cla::{Cla, ClaPool};
pub use engine::TreeLikelihood;
pub use underflow::{PatternProtection, UnderflowGuard};
pub use workspace::{ClaSlot, InternalWorkspace, SlotState, TipWorkspace, Workspace};
