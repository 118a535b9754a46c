//! The likelihood engine and its invalidate / accept / revert protocol.

use crate::config::EngineConfig;
use crate::data::PatternMatrix;
use crate::error::PruneError;
use crate::likelihood::cla::ClaPool;
use crate::likelihood::kernel::{self, KernelOutcome, Neighbour};
use crate::likelihood::underflow::UnderflowGuard;
use crate::likelihood::workspace::{ClaSlot, InternalWorkspace, TipWorkspace, Workspace};
use crate::model::node::NodeId;
use crate::model::tree::Tree;
use crate::substitution::SubstitutionModel;
use log::{debug, trace, warn};

/// A change proposed but neither accepted nor reverted yet.
#[derive(Debug, Clone, Copy)]
struct PendingChange {
    node: NodeId,
    /// Edge length to restore on revert, if the change came from
    /// [TreeLikelihood::set_edge_length]
    previous_edge_length: Option<f64>,
}

// =#========================================================================#=
// TREE LIKELIHOOD
// =#========================================================================#=
/// Felsenstein pruning on a [Tree] with cached, directed conditional
/// likelihood arrays.
///
/// Every edge `u–v` carries up to two CLAs, one summarising each side. After
/// a change around a node, [propose_change_around](Self::propose_change_around)
/// invalidates exactly the CLAs whose side contains that node, keeping the old
/// ones so that [revert](Self::revert) restores the previous state without
/// recomputation; [accept](Self::accept) drops them.
///
/// Structural edits made through [tree_mut](Self::tree_mut) (rerooting,
/// moving subtrees) change which slot holds which CLA, so the next evaluation
/// after such access starts from scratch.
///
/// # Example
/// ```
/// use prunewick::data::{Alphabet, DataMatrix};
/// use prunewick::likelihood::TreeLikelihood;
/// use prunewick::model::Tree;
/// use prunewick::substitution::JukesCantor;
///
/// let tree = Tree::from_newick("(a:0.1,b:0.2,(c:0.1,d:0.3):0.05);").unwrap();
/// let data = DataMatrix::from_sequences(&Alphabet::dna(), &[
///     ("a", "ACGTTA"), ("b", "ACGTTG"), ("c", "ACCTTA"), ("d", "ATCTTA"),
/// ]).unwrap().compress();
///
/// let mut engine = TreeLikelihood::new(tree, JukesCantor::new(4), data).unwrap();
/// let before = engine.compute_log_likelihood(None).unwrap();
///
/// let b = engine.tree().find_tip_by_name("b").unwrap();
/// engine.set_edge_length(b, 0.5).unwrap();
/// let proposed = engine.compute_log_likelihood(None).unwrap();
/// assert_ne!(proposed, before);
///
/// engine.revert();
/// assert_eq!(engine.compute_log_likelihood(None).unwrap(), before);
/// ```
#[derive(Debug)]
pub struct TreeLikelihood<M: SubstitutionModel> {
    tree: Tree,
    model: M,
    data: Option<PatternMatrix>,
    config: EngineConfig,
    pool: ClaPool,
    guard: UnderflowGuard,
    pending: Option<PendingChange>,
    /// Set when the tree was handed out mutably
    tree_edited: bool,
    site_log_likelihoods: Vec<f64>,
    num_evaluations: u64,
    scratch: Vec<f64>,
}

// ============================================================================
// Construction, accessors (pub)
// ============================================================================
impl<M: SubstitutionModel> TreeLikelihood<M> {
    /// Creates an engine with the default [EngineConfig].
    ///
    /// # Errors
    /// [PruneError::Dimension] if tree, data and model disagree on the number
    /// of tips or states, or tip numbers do not index the data rows.
    pub fn new(tree: Tree, model: M, data: PatternMatrix) -> Result<Self, PruneError> {
        Self::with_config(tree, model, data, EngineConfig::default())
    }

    /// Creates an engine with the given configuration.
    pub fn with_config(tree: Tree, model: M, data: PatternMatrix, config: EngineConfig) -> Result<Self, PruneError> {
        config.validate()?;
        check_dimensions(&tree, &model, &data)?;

        let num_patterns = data.num_patterns();
        let mut engine = TreeLikelihood {
            tree,
            model,
            data: Some(data),
            guard: UnderflowGuard::new(num_patterns, config.underflow_threshold),
            config,
            pool: ClaPool::new(),
            pending: None,
            tree_edited: false,
            site_log_likelihoods: Vec::with_capacity(num_patterns),
            num_evaluations: 0,
            scratch: Vec::new(),
        };
        engine.prepare_workspaces();
        debug!(
            "likelihood engine ready: {} tips, {} patterns, {} states, {} rate categories",
            engine.tree.num_tips(),
            num_patterns,
            engine.model.num_states(),
            engine.model.rate_categories().len()
        );
        Ok(engine)
    }

    /// Creates an engine without data; every evaluation returns 0.
    pub fn without_data(tree: Tree, model: M) -> Self {
        let config = EngineConfig::default();
        TreeLikelihood {
            tree,
            model,
            data: None,
            guard: UnderflowGuard::new(0, config.underflow_threshold),
            config,
            pool: ClaPool::new(),
            pending: None,
            tree_edited: false,
            site_log_likelihoods: Vec::new(),
            num_evaluations: 0,
            scratch: Vec::new(),
        }
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// Returns the tree for editing. All cached CLAs and any pending change
    /// are dropped; nodes added meanwhile get workspaces at the next
    /// evaluation.
    pub fn tree_mut(&mut self) -> &mut Tree {
        self.invalidate_everything();
        self.tree_edited = true;
        &mut self.tree
    }

    /// Consumes the engine and returns its tree.
    pub fn into_tree(mut self) -> Tree {
        self.tree.take_workspaces();
        self.tree
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Replaces the substitution model and drops every cached CLA.
    ///
    /// # Errors
    /// [PruneError::Dimension] if the new model does not match the data.
    pub fn set_model(&mut self, model: M) -> Result<(), PruneError> {
        if let Some(data) = &self.data {
            check_dimensions(&self.tree, &model, data)?;
        }
        self.model = model;
        self.invalidate_everything();
        let old = self.tree.take_workspaces();
        self.release_workspaces(old);
        self.prepare_workspaces();
        Ok(())
    }

    pub fn data(&self) -> Option<&PatternMatrix> {
        self.data.as_ref()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn pool(&self) -> &ClaPool {
        &self.pool
    }

    pub fn underflow_guard(&self) -> &UnderflowGuard {
        &self.guard
    }

    /// Forgets which patterns needed underflow protection.
    pub fn reset_underflow_protection(&mut self) {
        self.guard.reset();
    }

    pub fn num_nodes(&self) -> usize {
        self.tree.num_nodes()
    }

    pub fn num_tips(&self) -> usize {
        self.tree.num_tips()
    }

    pub fn num_patterns(&self) -> usize {
        self.data.as_ref().map_or(0, PatternMatrix::num_patterns)
    }

    /// Number of calls to [compute_log_likelihood](Self::compute_log_likelihood).
    pub fn num_evaluations(&self) -> u64 {
        self.num_evaluations
    }

    /// Returns the log-likelihood of each pattern from the last evaluation,
    /// or `None` if storing them is disabled.
    pub fn site_log_likelihoods(&self) -> Option<&[f64]> {
        self.config.store_site_likelihoods.then_some(self.site_log_likelihoods.as_slice())
    }

    /// Returns the log-likelihood of each original character from the last
    /// evaluation; excluded characters yield `None`.
    pub fn character_log_likelihoods(&self) -> Option<Vec<Option<f64>>> {
        let sites = self.site_log_likelihoods()?;
        let data = self.data.as_ref()?;
        Some(data.char_to_pattern().iter().map(|p| p.and_then(|p| sites.get(p).copied())).collect())
    }

    /// Log-likelihood of the data if every edge were infinitely long, so that
    /// tips are independent draws from the state frequencies.
    pub fn log_likelihood_at_saturation(&self) -> f64 {
        let Some(data) = &self.data else {
            return 0.0;
        };
        let frequencies = self.model.state_frequencies();
        (0..data.num_patterns())
            .map(|p| {
                let per_tip: f64 = (0..data.num_taxa())
                    .map(|t| {
                        let states = data.compatible_states(data.code(t, p));
                        states.iter().map(|&i| frequencies[i]).sum::<f64>().ln()
                    })
                    .sum();
                data.counts()[p] * per_tip
            })
            .sum()
    }

    /// Hands the CLAs of detached workspaces (e.g. returned by
    /// [Tree::remove_subtree]) back to the pool.
    pub fn release_workspaces(&mut self, workspaces: Vec<Workspace>) {
        for mut workspace in workspaces {
            workspace.clear(&mut self.pool);
        }
    }
}

// ============================================================================
// Protocol (pub)
// ============================================================================
impl<M: SubstitutionModel> TreeLikelihood<M> {
    /// Computes the log-likelihood with `root` (default: the subroot) as
    /// likelihood root, filling only the CLAs that are missing.
    ///
    /// # Errors
    /// [PruneError::Structural] if `root` is a tip or not attached to the tree.
    pub fn compute_log_likelihood(&mut self, root: Option<NodeId>) -> Result<f64, PruneError> {
        self.num_evaluations += 1;
        if self.data.is_none() {
            return Ok(0.0);
        }
        if self.tree_edited {
            debug!("tree was edited directly; preparing workspaces of new nodes");
            self.prepare_workspaces();
            self.tree_edited = false;
        }

        let focal = self.likelihood_root(root)?;
        let neighbour = focal_neighbour(&self.tree, focal)
            .ok_or_else(|| PruneError::structural(format!("likelihood root {focal} has no neighbour")))?;

        self.guard.begin_pass();
        if let KernelOutcome::RetryWithProtection(patterns) = self.fill_focal_edge(focal, neighbour)? {
            warn!("{} pattern(s) underflowed; recomputing with underflow protection", patterns.len());
            self.guard.protect(&patterns);
            self.guard.set_engaged(true);
            self.guard.begin_pass();
            let outcome = self.fill_focal_edge(focal, neighbour);
            self.guard.set_engaged(false);
            // An engaged guard rescales new underflows in place
            debug_assert!(!matches!(outcome, Ok(KernelOutcome::RetryWithProtection(_))));
            outcome?;
        }

        let ln_likelihood = self.harvest(focal, neighbour)?;
        trace!("evaluation {}: lnL = {ln_likelihood}", self.num_evaluations);
        Ok(ln_likelihood)
    }

    /// Invalidates every CLA whose side contains `node`, keeping the old ones
    /// for [revert](Self::revert).
    ///
    /// A change already pending is accepted first.
    ///
    /// # Errors
    /// [PruneError::Structural] if `node` is not part of the tree.
    pub fn propose_change_around(&mut self, node: NodeId) -> Result<(), PruneError> {
        self.begin_proposal(node, None)
    }

    /// Keeps the CLAs computed since the last proposal.
    pub fn accept(&mut self) {
        let Some(pending) = self.pending.take() else {
            debug!("accept without pending change");
            return;
        };
        let visited = self.sweep(pending.node, |slot, pool| {
            if !slot.has_cached() {
                return false;
            }
            slot.discard_cache(pool);
            true
        });
        debug!("accepted change around {}: {visited} slot(s) visited", pending.node);
    }

    /// Restores the CLAs from before the last proposal and drops those
    /// computed since. An edge length set through
    /// [set_edge_length](Self::set_edge_length) is restored as well.
    pub fn revert(&mut self) {
        let Some(pending) = self.pending.take() else {
            debug!("revert without pending change");
            return;
        };
        if let Some(length) = pending.previous_edge_length {
            if let Err(e) = self.tree.set_edge_length(pending.node, length) {
                warn!("could not restore edge length of node {}: {e}", pending.node);
            }
        }
        let visited = self.sweep(pending.node, |slot, pool| {
            if slot.is_empty() {
                return false;
            }
            slot.revert(pool);
            true
        });
        debug!("reverted change around {}: {visited} slot(s) visited", pending.node);
    }

    /// Drops every cached CLA and any pending change.
    pub fn invalidate_everything(&mut self) {
        let ids: Vec<NodeId> = self.tree.live_nodes().map(|node| node.id()).collect();
        for id in ids {
            if let Some(workspace) = self.tree.node_mut(id).workspace_mut() {
                workspace.clear(&mut self.pool);
            }
        }
        self.pending = None;
    }

    /// Sets the length of the edge above `node` and proposes the change.
    ///
    /// # Errors
    /// [PruneError::Structural] if `node` is not part of the tree or the
    /// length is negative or not finite.
    pub fn set_edge_length(&mut self, node: NodeId, length: f64) -> Result<(), PruneError> {
        if !self.tree.contains(node) {
            return Err(PruneError::structural(format!("node {node} is not part of this tree")));
        }
        let previous = self.tree[node].edge_length();
        self.tree.set_edge_length(node, length)?;
        self.begin_proposal(node, Some(previous))
    }

    /// Returns the node of the pending change, if any.
    pub fn pending_change(&self) -> Option<NodeId> {
        self.pending.map(|pending| pending.node)
    }
}

// ============================================================================
// Helpers (private)
// ============================================================================
impl<M: SubstitutionModel> TreeLikelihood<M> {
    fn begin_proposal(&mut self, node: NodeId, previous_edge_length: Option<f64>) -> Result<(), PruneError> {
        if !self.tree.contains(node) {
            return Err(PruneError::structural(format!("node {node} is not part of this tree")));
        }
        if let Some(pending) = self.pending {
            debug!("accepting pending change around {} before proposing around {node}", pending.node);
            self.accept();
        }
        let visited = self.sweep(node, |slot, pool| {
            if !slot.is_valid() {
                return false;
            }
            slot.invalidate(pool);
            true
        });
        debug!("proposed change around {node}: {visited} slot(s) invalidated");
        self.pending = Some(PendingChange { node, previous_edge_length });
        Ok(())
    }

    /// Gives every live node without workspace a fresh one.
    fn prepare_workspaces(&mut self) {
        let Some(data) = &self.data else {
            return;
        };
        let num_states = self.model.num_states();
        let num_rates = self.model.rate_categories().len();
        let missing: Vec<NodeId> = self.tree.live_nodes()
            .filter(|node| node.workspace().is_none())
            .map(|node| node.id())
            .collect();

        for id in missing {
            let workspace = if self.tree[id].is_tip() {
                let row = data.row(self.tree[id].number());
                Workspace::Tip(TipWorkspace::new(row, num_states, num_rates, |code| data.state_list(code)))
            } else {
                Workspace::Internal(InternalWorkspace::new(num_states, num_rates))
            };
            self.tree.node_mut(id).workspace = Some(workspace);
        }
    }

    fn likelihood_root(&self, root: Option<NodeId>) -> Result<NodeId, PruneError> {
        let focal = match root {
            Some(id) => id,
            None => self.tree.subroot()
                .or(self.tree.root())
                .ok_or_else(|| PruneError::structural("tree is empty"))?,
        };
        if !self.tree.contains(focal) || !self.tree.is_attached(focal) {
            return Err(PruneError::structural(format!("likelihood root {focal} is not part of the tree")));
        }
        if self.tree[focal].is_tip() {
            return Err(PruneError::structural(format!("likelihood root {focal} is a tip")));
        }
        Ok(focal)
    }

    /// Makes both CLAs of the focal edge valid.
    fn fill_focal_edge(&mut self, focal: NodeId, neighbour: NodeId) -> Result<KernelOutcome, PruneError> {
        match self.ensure_valid(focal, neighbour)? {
            KernelOutcome::Filled => self.ensure_valid(neighbour, focal),
            retry => Ok(retry),
        }
    }

    /// Fills the CLA at `u` toward `v` and every missing CLA it depends on,
    /// children before parents.
    fn ensure_valid(&mut self, u: NodeId, v: NodeId) -> Result<KernelOutcome, PruneError> {
        let mut stack = vec![(u, v, false)];
        while let Some((a, b, expanded)) = stack.pop() {
            if self.tree[a].is_tip() || slot_is_valid(&self.tree, a, b) {
                continue;
            }
            if expanded {
                if let KernelOutcome::RetryWithProtection(patterns) = self.compute_directed(a, b)? {
                    return Ok(KernelOutcome::RetryWithProtection(patterns));
                }
                continue;
            }
            stack.push((a, b, true));
            for w in neighbours(&self.tree, a) {
                if w != b && !self.tree[w].is_tip() && !slot_is_valid(&self.tree, w, a) {
                    stack.push((w, a, false));
                }
            }
        }
        Ok(KernelOutcome::Filled)
    }

    /// Computes the CLA at `u` toward `v` from the CLAs of the other neighbours.
    fn compute_directed(&mut self, u: NodeId, v: NodeId) -> Result<KernelOutcome, PruneError> {
        let others: Vec<NodeId> = neighbours(&self.tree, u).into_iter().filter(|&w| w != v).collect();
        if others.is_empty() {
            return Err(PruneError::structural(format!("node {u} has no neighbour besides {v}")));
        }

        for &w in &others {
            let length = edge_length_between(&self.tree, u, w).max(self.config.min_edge_length);
            let holder = matrix_holder(&self.tree, u, w);
            refresh_matrices(&mut self.tree, &self.model, &mut self.scratch, holder, length);
        }

        let (num_rates, num_patterns, num_states) = self.dimensions();
        let mut out = self.pool.acquire(num_rates, num_patterns, num_states);
        let outcome = {
            let views: Option<Vec<Neighbour<'_>>> = others.iter()
                .map(|&w| neighbour_view(&self.tree, w, u))
                .collect();
            match views {
                Some(views) => kernel::fill_cla(&mut out, &views, &mut self.guard, &mut self.scratch),
                None => {
                    self.pool.release(out);
                    return Err(PruneError::structural(format!("inputs of the CLA at {u} toward {v} are missing")));
                }
            }
        };

        match outcome {
            KernelOutcome::Filled => match slot_mut(&mut self.tree, u, v) {
                Some(slot) => slot.fill(out, &mut self.pool),
                None => self.pool.release(out),
            },
            KernelOutcome::RetryWithProtection(_) => self.pool.release(out),
        }
        Ok(outcome)
    }

    fn harvest(&mut self, focal: NodeId, neighbour: NodeId) -> Result<f64, PruneError> {
        let length = edge_length_between(&self.tree, focal, neighbour).max(self.config.min_edge_length);
        let holder = matrix_holder(&self.tree, focal, neighbour);
        refresh_matrices(&mut self.tree, &self.model, &mut self.scratch, holder, length);

        let missing = || PruneError::structural(format!("CLAs of the edge {focal}-{neighbour} are missing"));
        let focal_cla = slot_ref(&self.tree, focal, neighbour)
            .and_then(ClaSlot::working)
            .ok_or_else(missing)?;
        let view = neighbour_view(&self.tree, neighbour, focal).ok_or_else(missing)?;
        let data = self.data.as_ref().ok_or_else(|| PruneError::dimension("no data"))?;

        Ok(kernel::harvest(
            focal_cla,
            &view,
            self.model.state_frequencies(),
            self.model.rate_categories().weights(),
            data.counts(),
            self.guard.ln_threshold(),
            &mut self.site_log_likelihoods,
            &mut self.scratch,
        ))
    }

    fn dimensions(&self) -> (usize, usize, usize) {
        (self.model.rate_categories().len(), self.num_patterns(), self.model.num_states())
    }

    /// Visits the slots of all directed edges pointing away from `start`,
    /// breadth of each branch limited by `visit` returning `false`. Edges
    /// without slot (out of a tip) are walked through.
    fn sweep<F>(&mut self, start: NodeId, mut visit: F) -> usize
    where
        F: FnMut(&mut ClaSlot, &mut ClaPool) -> bool,
    {
        let mut visited = 0;
        let mut stack: Vec<(NodeId, NodeId)> = neighbours(&self.tree, start).into_iter().map(|n| (start, n)).collect();
        while let Some((closer, farther)) = stack.pop() {
            let proceed = match slot_mut(&mut self.tree, closer, farther) {
                Some(slot) => {
                    visited += 1;
                    visit(slot, &mut self.pool)
                }
                None => true,
            };
            if proceed {
                stack.extend(
                    neighbours(&self.tree, farther)
                        .into_iter()
                        .filter(|&n| n != closer)
                        .map(|n| (farther, n)),
                );
            }
        }
        visited
    }
}

// ============================================================================
// Directed addressing (private)
// ============================================================================
fn check_dimensions<M: SubstitutionModel>(tree: &Tree, model: &M, data: &PatternMatrix) -> Result<(), PruneError> {
    let num_states = model.num_states();
    if data.num_states() != num_states {
        return Err(PruneError::dimension(format!(
            "model has {num_states} states but data has {}",
            data.num_states()
        )));
    }
    if model.state_frequencies().len() != num_states {
        return Err(PruneError::dimension(format!(
            "{} state frequencies for {num_states} states",
            model.state_frequencies().len()
        )));
    }
    let num_tips = tree.num_tips();
    if num_tips != data.num_taxa() {
        return Err(PruneError::dimension(format!(
            "tree has {num_tips} tips but data has {} taxa",
            data.num_taxa()
        )));
    }
    let mut seen = vec![false; num_tips];
    for node in tree.live_nodes().filter(|node| node.is_tip()) {
        let number = node.number();
        if number >= num_tips || seen[number] {
            return Err(PruneError::dimension(format!("tip number {number} does not index a unique data row")));
        }
        seen[number] = true;
    }
    Ok(())
}

/// Parent and children of `u`.
fn neighbours(tree: &Tree, u: NodeId) -> Vec<NodeId> {
    tree.parent(u).into_iter().chain(tree.children(u)).collect()
}

/// The other end of the focal edge: the parent, or the first child of a root.
fn focal_neighbour(tree: &Tree, focal: NodeId) -> Option<NodeId> {
    tree.parent(focal).or_else(|| tree[focal].left_child())
}

/// Length of the edge between adjacent nodes `u` and `w`.
fn edge_length_between(tree: &Tree, u: NodeId, w: NodeId) -> f64 {
    if tree.parent(w) == Some(u) {
        tree[w].edge_length()
    } else {
        tree[u].edge_length()
    }
}

/// The slot of the CLA at `u` toward `v`; `None` if `u` is a tip.
fn slot_ref(tree: &Tree, u: NodeId, v: NodeId) -> Option<&ClaSlot> {
    if tree[u].is_tip() {
        return None;
    }
    if tree.parent(u) == Some(v) {
        tree[u].workspace()?.filial()
    } else {
        Some(tree[v].workspace()?.parental())
    }
}

fn slot_mut(tree: &mut Tree, u: NodeId, v: NodeId) -> Option<&mut ClaSlot> {
    if tree[u].is_tip() {
        return None;
    }
    if tree.parent(u) == Some(v) {
        tree.node_mut(u).workspace_mut()?.filial_mut()
    } else {
        Some(tree.node_mut(v).workspace_mut()?.parental_mut())
    }
}

fn slot_is_valid(tree: &Tree, u: NodeId, v: NodeId) -> bool {
    slot_ref(tree, u, v).is_some_and(ClaSlot::is_valid)
}

/// The node storing the matrices of the edge between `u` and its neighbour
/// `w`: a tip keeps the augmented rows of its only edge, otherwise the lower
/// end of the edge keeps the matrices of the edge to its parent.
fn matrix_holder(tree: &Tree, u: NodeId, w: NodeId) -> NodeId {
    if tree[w].is_tip() || tree.parent(w) == Some(u) { w } else { u }
}

/// What `w` contributes to its neighbour `u`: tip rows or its CLA toward `u`.
fn neighbour_view(tree: &Tree, w: NodeId, u: NodeId) -> Option<Neighbour<'_>> {
    match tree[w].workspace()? {
        Workspace::Tip(tip) => Some(Neighbour::Tip { codes: &tip.local_codes, rows: &tip.tip_matrices }),
        Workspace::Internal(_) => {
            let cla = slot_ref(tree, w, u)?.working()?;
            let Workspace::Internal(lower) = tree[matrix_holder(tree, u, w)].workspace()? else {
                return None;
            };
            Some(Neighbour::Internal { cla, transition: &lower.transition })
        }
    }
}

/// Recomputes the matrices stored at `holder` unless they already belong to
/// an edge of the given length.
fn refresh_matrices<M: SubstitutionModel>(tree: &mut Tree, model: &M, scratch: &mut Vec<f64>, holder: NodeId, length: f64) {
    match tree.node_mut(holder).workspace_mut() {
        Some(Workspace::Tip(tip)) if tip.matrix_length != Some(length) => {
            kernel::refresh_tip_matrices(tip, model, length, scratch);
            tip.matrix_length = Some(length);
        }
        Some(Workspace::Internal(internal)) if internal.matrix_length != Some(length) => {
            kernel::refresh_transition(&mut internal.transition, model, length);
            internal.matrix_length = Some(length);
        }
        _ => {}
    }
}
