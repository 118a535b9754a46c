//! Node module for phylogenetic tree representation.

use crate::likelihood::workspace::Workspace;
use std::ops::Deref;

/// Stable handle of a node in a [Tree](crate::model::tree::Tree) arena.
pub type NodeId = usize;

// =#========================================================================#=
// NODE
// =#========================================================================#=
/// Whether a node stands for an observed taxon or a hypothesized ancestor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Observed taxon; owns a row of the data matrix. A tip serving as root has
    /// exactly one child.
    Tip,
    /// Hypothesized ancestor.
    Internal,
}

/// A node of an arena [Tree](crate::model::tree::Tree).
///
/// Connectivity is expressed through first-child / next-sibling / parent
/// handles; `next_preorder` and `prev_preorder` form the preorder thread,
/// which is only meaningful while the owning tree's thread is clean.
///
/// # Invariants
/// - `edge_length` is non-negative and finite (enforced by [BranchLength])
/// - a node on the tree's free list has no links and no workspace
#[derive(Debug)]
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) kind: NodeKind,
    /// Tip number (data-matrix row) for tips, sequential number for internals
    pub(crate) number: usize,
    pub(crate) name: Option<String>,
    pub(crate) edge_length: BranchLength,
    pub(crate) parent: Option<NodeId>,
    pub(crate) left_child: Option<NodeId>,
    pub(crate) right_sibling: Option<NodeId>,
    pub(crate) next_preorder: Option<NodeId>,
    pub(crate) prev_preorder: Option<NodeId>,
    pub(crate) in_use: bool,
    pub(crate) workspace: Option<Workspace>,
}

impl Node {
    pub(crate) fn new(id: NodeId, kind: NodeKind, edge_length: BranchLength) -> Self {
        Node {
            id,
            kind,
            number: 0,
            name: None,
            edge_length,
            parent: None,
            left_child: None,
            right_sibling: None,
            next_preorder: None,
            prev_preorder: None,
            in_use: true,
            workspace: None,
        }
    }

    /// Clears links, name and workspace so the node can sit on the free list.
    pub(crate) fn reset(&mut self) -> Option<Workspace> {
        self.name = None;
        self.number = 0;
        self.parent = None;
        self.left_child = None;
        self.right_sibling = None;
        self.next_preorder = None;
        self.prev_preorder = None;
        self.in_use = false;
        self.workspace.take()
    }

    /// Returns the handle of this node.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Returns whether this node is a tip or internal.
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Returns `true` if this node is a tip (observed taxon).
    pub fn is_tip(&self) -> bool {
        self.kind == NodeKind::Tip
    }

    /// Returns `true` if this node is internal.
    pub fn is_internal(&self) -> bool {
        self.kind == NodeKind::Internal
    }

    /// Returns the tip number (data-matrix row) of a tip, or the internal number.
    pub fn number(&self) -> usize {
        self.number
    }

    /// Returns the name of this node, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the length of the edge to the parent.
    ///
    /// For the subroot of a tip-rooted tree this is the length of the edge to
    /// the tip root; for the root itself it is unused.
    pub fn edge_length(&self) -> f64 {
        *self.edge_length
    }

    /// Returns the parent, or `None` for the root.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Returns the leftmost child.
    pub fn left_child(&self) -> Option<NodeId> {
        self.left_child
    }

    /// Returns the sibling immediately to the right.
    pub fn right_sibling(&self) -> Option<NodeId> {
        self.right_sibling
    }

    /// Returns the next node of the preorder thread.
    pub fn next_preorder(&self) -> Option<NodeId> {
        self.next_preorder
    }

    /// Returns the previous node of the preorder thread.
    pub fn prev_preorder(&self) -> Option<NodeId> {
        self.prev_preorder
    }

    /// Returns `true` if this node has a parent.
    pub fn has_parent(&self) -> bool {
        self.parent.is_some()
    }

    /// Returns `true` unless this node sits on the free list.
    pub fn is_in_use(&self) -> bool {
        self.in_use
    }

    /// Returns the likelihood workspace, once the tree has been prepared by an engine.
    pub fn workspace(&self) -> Option<&Workspace> {
        self.workspace.as_ref()
    }

    pub(crate) fn workspace_mut(&mut self) -> Option<&mut Workspace> {
        self.workspace.as_mut()
    }
}


// =#========================================================================#=
// BRANCH LENGTH
// =#========================================================================#=
/// Branch length in a phylogenetic tree, enforced non-negative and finite.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct BranchLength(f64);

impl BranchLength {
    /// Creates a new branch length.
    ///
    /// # Panics
    /// Panics if `length` is negative or not finite.
    pub fn new(length: f64) -> Self {
        assert!(length >= 0.0, "Branch length must be non-negative, got {}", length);
        assert!(length.is_finite(), "Branch length must be finite, got {}", length);
        BranchLength(length)
    }

    /// Returns a branch length if `length` is non-negative and finite.
    pub fn try_new(length: f64) -> Option<Self> {
        (length >= 0.0 && length.is_finite()).then_some(BranchLength(length))
    }
}

impl Deref for BranchLength {
    type Target = f64;
    fn deref(&self) -> &f64 {
        &self.0
    }
}
