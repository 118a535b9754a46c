//! Tree module for phylogenetic tree representation.
//!
//! This module provides [Tree], an arena of [Node]s linked through
//! first-child / next-sibling / parent handles, with a lazily rebuilt preorder
//! thread and the structural edits needed by likelihood computations:
//! rerooting, detaching and inserting subtrees, and ladderizing.
//!
//! Trees read from Newick are rooted at their first tip, so the root is a tip
//! with exactly one child, the *subroot*, and every internal node has a parent.

use crate::config::DEFAULT_EDGE_LENGTH;
use crate::error::PruneError;
use crate::likelihood::workspace::Workspace;
use crate::model::node::{BranchLength, Node, NodeId, NodeKind};
use crate::parser::{ParsingError, ParsingErrorType};
use log::trace;
use std::collections::HashMap;


// =#========================================================================#=
// TREE
// =#========================================================================#=
/// A rooted phylogenetic tree of arbitrary out-degree using the arena pattern.
///
/// # Structure
/// - Nodes live in a contiguous vector and are referenced by [NodeId]
/// - Nodes removed from the tree are recycled through a free list, so handles
///   of live nodes are stable across edits
/// - Children are kept in left-to-right order as a sibling chain
/// - The preorder thread (`next_preorder` / `prev_preorder`) is rebuilt on
///   demand after structural edits mark it dirty
///
/// # Example
/// ```
/// use prunewick::model::Tree;
///
/// let mut tree = Tree::from_newick("(A:0.1,B:0.2,(C:0.3,D:0.4):0.5);").unwrap();
/// assert_eq!(tree.num_tips(), 4);
/// assert_eq!(tree.num_internals(), 2);
///
/// // Rooted at the first tip
/// let root = tree.root().unwrap();
/// assert_eq!(tree[root].name(), Some("A"));
/// let order: Vec<_> = tree.preorder().map(|node| node.number()).collect();
/// assert_eq!(order.len(), 6);
/// ```
#[derive(Debug, Default)]
pub struct Tree {
    /// Arena of nodes, including recycled ones
    nodes: Vec<Node>,
    /// Handles of recycled nodes
    free_list: Vec<NodeId>,
    root: Option<NodeId>,
    first_preorder: Option<NodeId>,
    last_preorder: Option<NodeId>,
    preorder_dirty: bool,
    has_edge_lengths: bool,
    numbers_from_names: bool,
}

/// Where [Tree::insert_subtree] places the inserted subtree among the
/// children of its new parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// As new leftmost child
    Leftmost,
    /// As new rightmost child
    Rightmost,
    /// Immediately left of the given child
    LeftOf(NodeId),
    /// Immediately right of the given child
    RightOf(NodeId),
}

// ============================================================================
// New, Getters / Accessors, etc. (pub)
// ============================================================================
impl Tree {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Tree::default()
    }

    /// Creates an empty tree with room for `num_nodes` nodes.
    pub fn with_capacity(num_nodes: usize) -> Self {
        Tree { nodes: Vec::with_capacity(num_nodes), ..Tree::default() }
    }

    /// Parses a Newick string with default settings.
    ///
    /// See [NewickParser](crate::newick::NewickParser) for configuration.
    pub fn from_newick(newick: &str) -> Result<Tree, PruneError> {
        Ok(crate::newick::NewickParser::new().parse_str(newick)?)
    }

    /// Returns the root, or `None` for an empty tree.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Returns the only child of a tip root, or `None` if the root is internal.
    pub fn subroot(&self) -> Option<NodeId> {
        let root = self.root?;
        if self.nodes[root].is_tip() {
            self.nodes[root].left_child
        } else {
            None
        }
    }

    /// Returns a reference to the node with the given handle.
    ///
    /// # Panics
    /// Panics if `id` is out of bounds.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id]
    }

    /// Returns the parent of `id`.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].parent
    }

    /// Returns an iterator over the children of `id`, left to right.
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children { tree: self, next: self.nodes[id].left_child }
    }

    /// Returns the number of children of `id`.
    pub fn num_children(&self, id: NodeId) -> usize {
        self.children(id).count()
    }

    /// Returns `true` if `id` is a live node of this tree.
    pub fn contains(&self, id: NodeId) -> bool {
        id < self.nodes.len() && self.nodes[id].in_use
    }

    /// Returns `true` if `id` is live and connected to the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        if !self.contains(id) {
            return false;
        }
        let mut top = id;
        while let Some(parent) = self.nodes[top].parent {
            top = parent;
        }
        self.root == Some(top)
    }

    /// Returns the number of live nodes (tips and internals).
    pub fn num_nodes(&self) -> usize {
        self.nodes.len() - self.free_list.len()
    }

    /// Returns the number of live tips.
    pub fn num_tips(&self) -> usize {
        self.live_nodes().filter(|node| node.is_tip()).count()
    }

    /// Returns the number of live internal nodes.
    pub fn num_internals(&self) -> usize {
        self.live_nodes().filter(|node| node.is_internal()).count()
    }

    /// Returns the handles of all live internal nodes in arena order.
    pub fn internal_nodes(&self) -> Vec<NodeId> {
        self.live_nodes().filter(|node| node.is_internal()).map(|node| node.id).collect()
    }

    /// Returns the handles of all live tips in arena order.
    pub fn tip_nodes(&self) -> Vec<NodeId> {
        self.live_nodes().filter(|node| node.is_tip()).map(|node| node.id).collect()
    }

    /// Returns an iterator over all live nodes in arena order.
    pub fn live_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|node| node.in_use)
    }

    /// Returns whether the tree description carried edge lengths.
    pub fn has_edge_lengths(&self) -> bool {
        self.has_edge_lengths
    }

    /// Returns whether tip numbers were taken from integer tip names.
    pub fn tip_numbers_from_names(&self) -> bool {
        self.numbers_from_names
    }

    /// Returns whether the preorder thread needs a refresh.
    pub fn is_preorder_dirty(&self) -> bool {
        self.preorder_dirty
    }

    /// Returns the tip with the given tip number.
    pub fn find_tip(&self, number: usize) -> Option<NodeId> {
        self.live_nodes()
            .find(|node| node.is_tip() && node.number == number)
            .map(|node| node.id)
    }

    /// Returns the tip with the given name.
    pub fn find_tip_by_name(&self, name: &str) -> Option<NodeId> {
        self.live_nodes()
            .find(|node| node.is_tip() && node.name() == Some(name))
            .map(|node| node.id)
    }

    /// Returns the sum of the lengths of all edges.
    pub fn total_edge_length(&self) -> f64 {
        self.live_nodes()
            .filter(|node| node.parent.is_some())
            .map(|node| *node.edge_length)
            .sum()
    }

    /// Sets the length of the edge between `id` and its parent.
    ///
    /// # Errors
    /// [PruneError::Structural] if `id` is not live or `length` is negative or
    /// not finite.
    pub fn set_edge_length(&mut self, id: NodeId, length: f64) -> Result<(), PruneError> {
        self.check_live(id)?;
        let length = BranchLength::try_new(length)
            .ok_or_else(|| PruneError::structural(format!("invalid edge length {length}")))?;
        self.nodes[id].edge_length = length;
        Ok(())
    }

    /// Sets every edge to the given length and marks the tree as having lengths.
    ///
    /// # Panics
    /// Panics if `length` is negative or not finite.
    pub fn set_all_edge_lengths(&mut self, length: f64) {
        let length = BranchLength::new(length);
        for node in self.nodes.iter_mut().filter(|node| node.in_use) {
            node.edge_length = length;
        }
        self.has_edge_lengths = true;
    }

    /// Sets the name of a node.
    pub fn set_name(&mut self, id: NodeId, name: Option<String>) -> Result<(), PruneError> {
        self.check_live(id)?;
        self.nodes[id].name = name;
        Ok(())
    }

    /// Returns an iterator over the preorder thread, refreshing it first if needed.
    pub fn preorder(&mut self) -> PreOrderIter<'_> {
        self.refresh_preorder_thread();
        PreOrderIter { tree: self, next: self.first_preorder }
    }

    /// Returns an iterator walking the preorder thread backwards, which visits
    /// every node after all of its descendants.
    pub fn postorder(&mut self) -> PostOrderIter<'_> {
        self.refresh_preorder_thread();
        PostOrderIter { tree: self, next: self.last_preorder }
    }

    /// Returns the handles of the preorder thread.
    pub fn preorder_ids(&mut self) -> Vec<NodeId> {
        self.preorder().map(|node| node.id).collect()
    }

    /// Returns the handles in postorder (reversed preorder thread).
    pub fn postorder_ids(&mut self) -> Vec<NodeId> {
        self.postorder().map(|node| node.id).collect()
    }

    /// Validates the links of all attached nodes.
    ///
    /// Checks:
    /// - the root exists, is live and has no parent
    /// - every child points back to its parent and is live
    /// - every node reachable from the root is reached exactly once
    /// - internal nodes have at least one child
    /// - if the thread is clean, it visits exactly the reachable nodes in preorder
    ///
    /// # Returns
    /// `true` if tree is valid, `false` otherwise
    pub fn is_valid(&self) -> bool {
        let Some(root) = self.root else {
            return false;
        };
        if !self.contains(root) || self.nodes[root].parent.is_some() {
            return false;
        }

        let mut seen = vec![false; self.nodes.len()];
        let mut expected_preorder = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if seen[id] {
                return false;
            }
            seen[id] = true;
            expected_preorder.push(id);

            let node = &self.nodes[id];
            if node.is_internal() && node.left_child.is_none() {
                return false;
            }

            let first = stack.len();
            for child in self.children(id) {
                if !self.contains(child) || self.nodes[child].parent != Some(id) {
                    return false;
                }
                stack.push(child);
            }
            stack[first..].reverse();
        }

        if !self.preorder_dirty {
            let mut threaded = Vec::with_capacity(expected_preorder.len());
            let mut prev = None;
            let mut next = self.first_preorder;
            while let Some(id) = next {
                if self.nodes[id].prev_preorder != prev || threaded.len() > expected_preorder.len() {
                    return false;
                }
                threaded.push(id);
                prev = Some(id);
                next = self.nodes[id].next_preorder;
            }
            if threaded != expected_preorder || self.last_preorder != prev {
                return false;
            }
        }

        true
    }
}

impl std::ops::Index<NodeId> for Tree {
    type Output = Node;

    fn index(&self, index: NodeId) -> &Self::Output {
        &self.nodes[index]
    }
}

// ============================================================================
// Construction (crate)
// ============================================================================
impl Tree {
    /// Returns a fresh, unlinked node, reusing a recycled one if available.
    pub(crate) fn new_node(&mut self, kind: NodeKind) -> NodeId {
        let edge_length = BranchLength::new(DEFAULT_EDGE_LENGTH);
        match self.free_list.pop() {
            Some(id) => {
                let node = &mut self.nodes[id];
                node.kind = kind;
                node.edge_length = edge_length;
                node.in_use = true;
                trace!("reusing recycled node {id}");
                id
            }
            None => {
                let id = self.nodes.len();
                self.nodes.push(Node::new(id, kind, edge_length));
                id
            }
        }
    }

    /// Appends an unlinked `child` as rightmost child of `parent`.
    pub(crate) fn append_child(&mut self, parent: NodeId, child: NodeId) {
        debug_assert!(self.nodes[child].parent.is_none());
        self.nodes[child].parent = Some(parent);
        self.nodes[child].right_sibling = None;
        match self.rightmost_child(parent) {
            None => self.nodes[parent].left_child = Some(child),
            Some(last) => self.nodes[last].right_sibling = Some(child),
        }
        self.preorder_dirty = true;
    }

    pub(crate) fn set_root(&mut self, root: NodeId) {
        self.root = Some(root);
        self.first_preorder = Some(root);
        self.preorder_dirty = true;
    }

    pub(crate) fn set_has_edge_lengths(&mut self, has_edge_lengths: bool) {
        self.has_edge_lengths = has_edge_lengths;
    }

    pub(crate) fn set_numbers_from_names(&mut self, from_names: bool) {
        self.numbers_from_names = from_names;
    }

    pub(crate) fn set_number(&mut self, id: NodeId, number: usize) {
        self.nodes[id].number = number;
    }

    /// Takes the likelihood workspaces out of all live nodes.
    pub(crate) fn take_workspaces(&mut self) -> Vec<Workspace> {
        self.nodes.iter_mut().filter_map(|node| node.workspace.take()).collect()
    }
}

// ============================================================================
// Preorder thread, rerooting (pub)
// ============================================================================
impl Tree {
    /// Recomputes the preorder thread from the child/sibling/parent links.
    ///
    /// O(n); a no-op if the thread is not dirty.
    pub fn refresh_preorder_thread(&mut self) {
        if !self.preorder_dirty {
            return;
        }

        let mut prev: Option<NodeId> = None;
        let mut stack: Vec<NodeId> = self.root.into_iter().collect();
        while let Some(id) = stack.pop() {
            self.nodes[id].prev_preorder = prev;
            match prev {
                Some(p) => self.nodes[p].next_preorder = Some(id),
                None => self.first_preorder = Some(id),
            }
            prev = Some(id);

            // Push children right to left, so the leftmost is visited next
            let first = stack.len();
            let mut child = self.nodes[id].left_child;
            while let Some(c) = child {
                stack.push(c);
                child = self.nodes[c].right_sibling;
            }
            stack[first..].reverse();
        }

        if let Some(last) = prev {
            self.nodes[last].next_preorder = None;
        }
        self.last_preorder = prev;
        self.preorder_dirty = false;
    }

    /// Reroots the tree at `node` (tip or internal).
    ///
    /// Walks from `node` towards the old root; at each step the "mover" (the
    /// current parent of `node`) becomes the rightmost child of the "target"
    /// (the previous mover, initially `node`), and the edge lengths of `node`
    /// and mover are swapped so every edge keeps its length.
    ///
    /// # Errors
    /// [PruneError::Structural] if `node` is not live or not connected to the root.
    pub fn reroot_at(&mut self, node: NodeId) -> Result<(), PruneError> {
        self.check_attached(node)?;

        let mut target = node;
        while let Some(mover) = self.nodes[node].parent {
            let mover_length = self.nodes[mover].edge_length;
            self.nodes[mover].edge_length = self.nodes[node].edge_length;
            self.nodes[node].edge_length = mover_length;

            self.promote(node, mover, target);
            target = mover;
        }

        self.root = Some(node);
        self.first_preorder = Some(node);
        self.nodes[node].prev_preorder = None;
        self.preorder_dirty = true;
        Ok(())
    }

    /// Puts `node`, a child of `mover`, in the place of `mover`, then makes
    /// `mover` the rightmost child of `target`.
    fn promote(&mut self, node: NodeId, mover: NodeId, target: NodeId) {
        let mover_parent = self.nodes[mover].parent;
        let mover_left_sibling = self.left_sibling(mover);
        let mover_right_sibling = self.nodes[mover].right_sibling;
        let node_left_sibling = self.left_sibling(node);
        let node_right_sibling = self.nodes[node].right_sibling;

        // Unlink node from the children of mover
        match node_left_sibling {
            None => self.nodes[mover].left_child = node_right_sibling,
            Some(left) => self.nodes[left].right_sibling = node_right_sibling,
        }

        // Node takes the place of mover
        self.nodes[node].parent = mover_parent;
        self.nodes[node].right_sibling = mover_right_sibling;
        if let Some(parent) = mover_parent {
            match mover_left_sibling {
                None => self.nodes[parent].left_child = Some(node),
                Some(left) => self.nodes[left].right_sibling = Some(node),
            }
        }

        self.nodes[mover].parent = None;
        self.nodes[mover].right_sibling = None;
        self.append_child(target, mover);
    }
}

// ============================================================================
// Subtree edits (pub)
// ============================================================================
impl Tree {
    /// Detaches the subtree rooted at `s`, keeping the subtree itself intact.
    ///
    /// The nodes of the subtree stay live (and keep their workspaces) so the
    /// subtree can be re-inserted with [Tree::insert_subtree].
    ///
    /// # Errors
    /// [PruneError::Structural] if `s` has no parent, is not attached to the
    /// root, or is the only child of a tip root.
    pub fn detach_subtree(&mut self, s: NodeId) -> Result<(), PruneError> {
        self.check_attached(s)?;
        let Some(parent) = self.nodes[s].parent else {
            return Err(PruneError::structural(format!("node {s} has no parent to detach from")));
        };
        if self.nodes[parent].is_tip() {
            return Err(PruneError::structural(format!("node {s} is the only child of the tip root")));
        }

        self.refresh_preorder_thread();

        // Links
        let left_sibling = self.left_sibling(s);
        let right_sibling = self.nodes[s].right_sibling;
        match left_sibling {
            None => self.nodes[parent].left_child = right_sibling,
            Some(left) => self.nodes[left].right_sibling = right_sibling,
        }
        self.nodes[s].parent = None;
        self.nodes[s].right_sibling = None;

        // Thread: cut out s .. last of clade
        let last = self.last_preorder_in_clade(s);
        let before = self.nodes[s].prev_preorder;
        let after = self.nodes[last].next_preorder;
        match before {
            Some(b) => self.nodes[b].next_preorder = after,
            None => self.first_preorder = after,
        }
        match after {
            Some(a) => self.nodes[a].prev_preorder = before,
            None => self.last_preorder = before,
        }
        self.nodes[s].prev_preorder = None;
        self.nodes[last].next_preorder = None;

        Ok(())
    }

    /// Inserts the detached subtree rooted at `s` as a child of `target`.
    ///
    /// # Errors
    /// [PruneError::Structural] if `s` is attached or is the root, if `target`
    /// is not attached, is a tip, or lies inside the subtree of `s`, or if the
    /// sibling named by `side` is not a child of `target`.
    pub fn insert_subtree(&mut self, s: NodeId, target: NodeId, side: Side) -> Result<(), PruneError> {
        self.check_live(s)?;
        if self.nodes[s].parent.is_some() || self.root == Some(s) {
            return Err(PruneError::structural(format!("node {s} is not a detached subtree")));
        }
        self.check_attached(target)?;
        if self.nodes[target].is_tip() {
            return Err(PruneError::structural(format!("cannot attach a subtree to tip {target}")));
        }
        if let Side::LeftOf(sibling) | Side::RightOf(sibling) = side {
            if !self.contains(sibling) || self.nodes[sibling].parent != Some(target) {
                return Err(PruneError::structural(format!("node {sibling} is not a child of {target}")));
            }
        }
        // target is attached and s is not, so target cannot lie inside s

        self.refresh_preorder_thread();

        // Links; remember the node that will precede s in preorder
        let predecessor = match side {
            Side::Leftmost => {
                self.nodes[s].right_sibling = self.nodes[target].left_child;
                self.nodes[target].left_child = Some(s);
                target
            }
            Side::Rightmost => {
                let predecessor = match self.rightmost_child(target) {
                    None => {
                        self.nodes[target].left_child = Some(s);
                        target
                    }
                    Some(last) => {
                        self.nodes[last].right_sibling = Some(s);
                        self.last_preorder_in_clade(last)
                    }
                };
                self.nodes[s].right_sibling = None;
                predecessor
            }
            Side::LeftOf(sibling) => {
                self.nodes[s].right_sibling = Some(sibling);
                match self.left_sibling(sibling) {
                    None => {
                        self.nodes[target].left_child = Some(s);
                        target
                    }
                    Some(left) => {
                        self.nodes[left].right_sibling = Some(s);
                        self.last_preorder_in_clade(left)
                    }
                }
            }
            Side::RightOf(sibling) => {
                self.nodes[s].right_sibling = self.nodes[sibling].right_sibling;
                self.nodes[sibling].right_sibling = Some(s);
                self.last_preorder_in_clade(sibling)
            }
        };
        self.nodes[s].parent = Some(target);

        // Thread: rebuild the clade of s, then splice it in after predecessor
        let last = self.thread_clade(s);
        let successor = self.nodes[predecessor].next_preorder;
        self.nodes[predecessor].next_preorder = Some(s);
        self.nodes[s].prev_preorder = Some(predecessor);
        self.nodes[last].next_preorder = successor;
        match successor {
            Some(next) => self.nodes[next].prev_preorder = Some(last),
            None => self.last_preorder = Some(last),
        }

        Ok(())
    }

    /// Detaches the subtree rooted at `s` (if attached) and recycles all of its
    /// nodes onto the free list.
    ///
    /// # Returns
    /// The likelihood workspaces the recycled nodes owned, so their buffers can
    /// be handed back to a pool.
    ///
    /// # Errors
    /// [PruneError::Structural] if `s` is the root, or detaching fails.
    pub fn remove_subtree(&mut self, s: NodeId) -> Result<Vec<Workspace>, PruneError> {
        self.check_live(s)?;
        if self.root == Some(s) {
            return Err(PruneError::structural("cannot remove the root"));
        }
        if self.nodes[s].parent.is_some() {
            self.detach_subtree(s)?;
        }

        let mut workspaces = Vec::new();
        let mut stack = vec![s];
        while let Some(id) = stack.pop() {
            stack.extend(self.children(id));
            if let Some(workspace) = self.nodes[id].reset() {
                workspaces.push(workspace);
            }
            self.free_list.push(id);
        }
        trace!("recycled subtree at {s}; {} nodes on free list", self.free_list.len());
        Ok(workspaces)
    }

    /// Sorts the children of every internal node by number of descendant tips.
    ///
    /// Ties keep their original left-to-right order.
    ///
    /// # Arguments
    /// * `largest_on_right` - if `true`, largest clades end up rightmost
    pub fn ladderize(&mut self, largest_on_right: bool) {
        let order = self.postorder_ids();
        let mut clade_size = vec![0usize; self.nodes.len()];

        for id in order {
            let own = usize::from(self.nodes[id].is_tip());
            let mut children: Vec<NodeId> = self.children(id).collect();
            clade_size[id] = own + children.iter().map(|&c| clade_size[c]).sum::<usize>();

            if children.len() > 1 {
                if largest_on_right {
                    children.sort_by_key(|&c| clade_size[c]);
                } else {
                    children.sort_by_key(|&c| std::cmp::Reverse(clade_size[c]));
                }
                self.relink_children(id, &children);
            }
        }
        self.preorder_dirty = true;
    }
}

// ============================================================================
// Name / number rectification (pub)
// ============================================================================
impl Tree {
    /// Sets each tip's number to the position of its name in `names`.
    ///
    /// # Errors
    /// [PruneError::Format] if the number of names differs from the number of
    /// tips, a tip is unnamed, a name is missing from `names`, or two tips
    /// share a name. The tree is unchanged on error.
    pub fn rectify_numbers<S: AsRef<str>>(&mut self, names: &[S]) -> Result<(), PruneError> {
        let tips = self.tip_nodes();
        check_name_count(names.len(), tips.len())?;

        let position: HashMap<&str, usize> = names.iter()
            .enumerate()
            .map(|(i, name)| (name.as_ref(), i))
            .collect();

        let mut assigned = vec![false; names.len()];
        let mut numbers = Vec::with_capacity(tips.len());
        for &tip in &tips {
            let name = self.nodes[tip].name().unwrap_or("");
            let Some(&number) = position.get(name) else {
                return Err(name_list_mismatch(format!("node name ({name}) not found in supplied list of names")));
            };
            if assigned[number] {
                return Err(name_list_mismatch(format!("node name ({name}) used for more than one tip")));
            }
            assigned[number] = true;
            numbers.push(number);
        }

        for (tip, number) in tips.into_iter().zip(numbers) {
            self.nodes[tip].number = number;
        }
        Ok(())
    }

    /// Sets each tip's name to `names[number]`.
    ///
    /// # Errors
    /// [PruneError::Format] if the number of names differs from the number of
    /// tips or a tip number is out of range. The tree is unchanged on error.
    pub fn rectify_names<S: AsRef<str>>(&mut self, names: &[S]) -> Result<(), PruneError> {
        let tips = self.tip_nodes();
        check_name_count(names.len(), tips.len())?;

        if let Some(&tip) = tips.iter().find(|&&tip| self.nodes[tip].number >= names.len()) {
            return Err(name_list_mismatch(format!("node number ({}) out of range", self.nodes[tip].number)));
        }
        for tip in tips {
            let number = self.nodes[tip].number;
            self.nodes[tip].name = Some(names[number].as_ref().to_string());
        }
        Ok(())
    }
}

fn check_name_count(num_names: usize, num_tips: usize) -> Result<(), PruneError> {
    if num_names != num_tips {
        return Err(name_list_mismatch(format!(
            "number of names ({num_names}) not equal to the number of tips ({num_tips})"
        )));
    }
    Ok(())
}

fn name_list_mismatch(msg: String) -> PruneError {
    ParsingError::without_context(ParsingErrorType::NameListMismatch(msg)).into()
}

// ============================================================================
// Helpers (private)
// ============================================================================
impl Tree {
    fn check_live(&self, id: NodeId) -> Result<(), PruneError> {
        if self.contains(id) {
            Ok(())
        } else {
            Err(PruneError::structural(format!("node {id} is not part of this tree")))
        }
    }

    /// Checks that `id` is live and connected to the root.
    fn check_attached(&self, id: NodeId) -> Result<(), PruneError> {
        self.check_live(id)?;
        if self.is_attached(id) {
            Ok(())
        } else {
            Err(PruneError::structural(format!("node {id} is not attached to the root")))
        }
    }

    fn rightmost_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).last()
    }

    fn left_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.nodes[id].parent?;
        self.children(parent).take_while(|&c| c != id).last()
    }

    /// Last node of the clade of `id` in preorder: follow rightmost children.
    fn last_preorder_in_clade(&self, id: NodeId) -> NodeId {
        let mut last = id;
        while let Some(child) = self.rightmost_child(last) {
            last = child;
        }
        last
    }

    /// Threads the clade of `id` in preorder, leaving both ends open, and
    /// returns its last node.
    fn thread_clade(&mut self, id: NodeId) -> NodeId {
        let mut prev: Option<NodeId> = None;
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            self.nodes[current].prev_preorder = prev;
            if let Some(p) = prev {
                self.nodes[p].next_preorder = Some(current);
            }
            prev = Some(current);

            let first = stack.len();
            stack.extend(self.children(current));
            stack[first..].reverse();
        }
        let last = prev.unwrap_or(id);
        self.nodes[last].next_preorder = None;
        last
    }

    fn relink_children(&mut self, parent: NodeId, children: &[NodeId]) {
        self.nodes[parent].left_child = children.first().copied();
        for pair in children.windows(2) {
            self.nodes[pair[0]].right_sibling = Some(pair[1]);
        }
        if let Some(&last) = children.last() {
            self.nodes[last].right_sibling = None;
        }
    }
}


// =#========================================================================#=
// ITERATORS
// =#========================================================================#=
/// Iterator over the children of a node, left to right.
pub struct Children<'a> {
    tree: &'a Tree,
    next: Option<NodeId>,
}

impl<'a> Iterator for Children<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.tree.nodes[current].right_sibling;
        Some(current)
    }
}

/// Iterator following the preorder thread (parents before children).
pub struct PreOrderIter<'a> {
    tree: &'a Tree,
    next: Option<NodeId>,
}

impl<'a> Iterator for PreOrderIter<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = &self.tree.nodes[self.next?];
        self.next = node.next_preorder;
        Some(node)
    }
}

/// Iterator following the preorder thread backwards (children before parents).
pub struct PostOrderIter<'a> {
    tree: &'a Tree,
    next: Option<NodeId>,
}

impl<'a> Iterator for PostOrderIter<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = &self.tree.nodes[self.next?];
        self.next = node.prev_preorder;
        Some(node)
    }
}
