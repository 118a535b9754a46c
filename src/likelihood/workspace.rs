//! Per-node likelihood state: CLA slots, transition matrices and tip codes.

use crate::likelihood::cla::{Cla, ClaPool};

// =#========================================================================#=
// CLA SLOT
// =#========================================================================#=
/// Observable state of a [ClaSlot].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// Nothing stored; must be computed before use
    Empty,
    /// Holds a valid CLA (possibly with a previous one kept for revert)
    Working,
    /// Only the CLA from before the pending change is kept, for revert
    Cached,
}

/// Holder of one directed CLA with room for its previous value.
///
/// Every operation that frees a buffer hands it to the given pool.
#[derive(Debug, Default)]
pub struct ClaSlot {
    working: Option<Cla>,
    cached: Option<Cla>,
}

impl ClaSlot {
    pub fn new() -> Self {
        ClaSlot::default()
    }

    pub fn state(&self) -> SlotState {
        match (&self.working, &self.cached) {
            (Some(_), _) => SlotState::Working,
            (None, Some(_)) => SlotState::Cached,
            (None, None) => SlotState::Empty,
        }
    }

    /// Returns `true` if the slot holds a usable CLA.
    pub fn is_valid(&self) -> bool {
        self.working.is_some()
    }

    pub fn has_cached(&self) -> bool {
        self.cached.is_some()
    }

    /// Returns `true` if the slot holds neither a working nor a cached CLA.
    pub fn is_empty(&self) -> bool {
        self.working.is_none() && self.cached.is_none()
    }

    pub fn working(&self) -> Option<&Cla> {
        self.working.as_ref()
    }

    /// Stores a freshly computed CLA as the working one.
    pub(crate) fn fill(&mut self, cla: Cla, pool: &mut ClaPool) {
        if let Some(old) = self.working.replace(cla) {
            pool.release(old);
        }
    }

    /// Moves the working CLA into the cache (dropping an older cached one);
    /// no-op if there is no working CLA.
    pub fn invalidate(&mut self, pool: &mut ClaPool) {
        if let Some(working) = self.working.take() {
            if let Some(cached) = self.cached.replace(working) {
                pool.release(cached);
            }
        }
    }

    /// Drops the working CLA and restores the cached one.
    pub fn revert(&mut self, pool: &mut ClaPool) {
        if let Some(working) = self.working.take() {
            pool.release(working);
        }
        self.working = self.cached.take();
    }

    /// Drops the cached CLA.
    pub fn discard_cache(&mut self, pool: &mut ClaPool) {
        if let Some(cached) = self.cached.take() {
            pool.release(cached);
        }
    }

    /// Drops both CLAs.
    pub fn clear(&mut self, pool: &mut ClaPool) {
        self.discard_cache(pool);
        if let Some(working) = self.working.take() {
            pool.release(working);
        }
    }
}


// =#========================================================================#=
// WORKSPACES
// =#========================================================================#=
/// Likelihood state of a tip.
#[derive(Debug)]
pub struct TipWorkspace {
    pub(crate) num_states: usize,
    /// Per pattern, the row of the augmented tip matrix to use
    pub(crate) local_codes: Vec<usize>,
    /// State lists of the partial ambiguities seen at this tip, in local order
    pub(crate) ambiguities: Vec<Vec<usize>>,
    /// Per rate, `rows × states`: row `a`, column `i` holds the probability of
    /// observing `a` at the tip given state `i` across the edge
    pub(crate) tip_matrices: Vec<Vec<f64>>,
    /// Edge length `tip_matrices` were computed for
    pub(crate) matrix_length: Option<f64>,
    /// CLA at the parent toward this tip
    pub(crate) parental: ClaSlot,
}

impl TipWorkspace {
    /// Builds the local code table of a tip from its codes (one per pattern).
    ///
    /// Primary states keep their code, gaps and missing data use row `S`, and
    /// each distinct partial ambiguity gets its own row after that.
    pub(crate) fn new<'a, F>(codes: &[i8], num_states: usize, num_rates: usize, state_list: F) -> Self
    where
        F: Fn(i8) -> Option<&'a [usize]>,
    {
        let mut ambiguities: Vec<Vec<usize>> = Vec::new();
        let local_codes = codes.iter()
            .map(|&code| {
                if code >= 0 && (code as usize) < num_states {
                    return code as usize;
                }
                match state_list(code) {
                    None => num_states,
                    Some(states) => {
                        let k = match ambiguities.iter().position(|list| list == states) {
                            Some(k) => k,
                            None => {
                                ambiguities.push(states.to_vec());
                                ambiguities.len() - 1
                            }
                        };
                        num_states + 1 + k
                    }
                }
            })
            .collect();

        let num_rows = num_states + 1 + ambiguities.len();
        TipWorkspace {
            num_states,
            local_codes,
            ambiguities,
            tip_matrices: vec![vec![0.0; num_rows * num_states]; num_rates],
            matrix_length: None,
            parental: ClaSlot::new(),
        }
    }

    /// Returns the number of rows of the augmented tip matrix.
    pub fn num_rows(&self) -> usize {
        self.num_states + 1 + self.ambiguities.len()
    }

    /// Returns the local code (augmented matrix row) of every pattern.
    pub fn local_codes(&self) -> &[usize] {
        &self.local_codes
    }

    /// Returns the partial ambiguities present at this tip.
    pub fn ambiguities(&self) -> &[Vec<usize>] {
        &self.ambiguities
    }
}

/// Likelihood state of an internal node.
#[derive(Debug)]
pub struct InternalWorkspace {
    /// Per rate, `states × states` transition matrix of the edge to the parent
    pub(crate) transition: Vec<Vec<f64>>,
    /// Edge length `transition` was computed for
    pub(crate) matrix_length: Option<f64>,
    /// CLA at this node toward its parent
    pub(crate) filial: ClaSlot,
    /// CLA at the parent toward this node
    pub(crate) parental: ClaSlot,
}

impl InternalWorkspace {
    pub(crate) fn new(num_states: usize, num_rates: usize) -> Self {
        InternalWorkspace {
            transition: vec![vec![0.0; num_states * num_states]; num_rates],
            matrix_length: None,
            filial: ClaSlot::new(),
            parental: ClaSlot::new(),
        }
    }
}

/// Likelihood state attached to a tree node.
#[derive(Debug)]
pub enum Workspace {
    Tip(TipWorkspace),
    Internal(InternalWorkspace),
}

impl Workspace {
    /// Returns the slot holding the CLA at the parent toward this node.
    pub fn parental(&self) -> &ClaSlot {
        match self {
            Workspace::Tip(tip) => &tip.parental,
            Workspace::Internal(internal) => &internal.parental,
        }
    }

    /// Returns the slot holding the CLA at this node toward its parent; tips
    /// have none.
    pub fn filial(&self) -> Option<&ClaSlot> {
        match self {
            Workspace::Tip(_) => None,
            Workspace::Internal(internal) => Some(&internal.filial),
        }
    }

    pub(crate) fn parental_mut(&mut self) -> &mut ClaSlot {
        match self {
            Workspace::Tip(tip) => &mut tip.parental,
            Workspace::Internal(internal) => &mut internal.parental,
        }
    }

    pub(crate) fn filial_mut(&mut self) -> Option<&mut ClaSlot> {
        match self {
            Workspace::Tip(_) => None,
            Workspace::Internal(internal) => Some(&mut internal.filial),
        }
    }

    /// Hands every CLA back to the pool.
    pub(crate) fn clear(&mut self, pool: &mut ClaPool) {
        self.parental_mut().clear(pool);
        if let Some(filial) = self.filial_mut() {
            filial.clear(pool);
        }
    }
}
