//! The pruning kernel: transition matrices, CLA updates and the harvest of
//! site log-likelihoods across a focal edge.
//!
//! A CLA at node `u` toward neighbour `v` is the product, over all other
//! neighbours `w` of `u`, of `Σ_j P_uw[i][j] · L_w[j]`, where `L_w` is the CLA
//! at `w` toward `u` (or the tip row of `w`). The first neighbour assigns, the
//! rest multiply, so polytomies and degree-two nodes need no special case.

use crate::likelihood::cla::Cla;
use crate::likelihood::underflow::{RescaleOutcome, UnderflowGuard};
use crate::likelihood::workspace::TipWorkspace;
use crate::substitution::SubstitutionModel;

/// One input to a CLA update, seen from the node being computed.
pub(crate) enum Neighbour<'a> {
    /// A tip: rows of its augmented tip matrix, selected by its local codes
    Tip { codes: &'a [usize], rows: &'a [Vec<f64>] },
    /// An internal node: its CLA toward us and the transition matrices of the
    /// edge between us
    Internal { cla: &'a Cla, transition: &'a [Vec<f64>] },
}

/// Result of filling a CLA.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum KernelOutcome {
    Filled,
    /// These patterns underflowed without protection; the CLA is unusable
    RetryWithProtection(Vec<usize>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combine {
    Assign,
    Multiply,
}

// ============================================================================
// Transition matrices
// ============================================================================
/// Fills the per-rate transition matrices for an edge of length `edge_length`.
pub(crate) fn refresh_transition<M: SubstitutionModel + ?Sized>(
    transition: &mut [Vec<f64>],
    model: &M,
    edge_length: f64,
) {
    for (r, matrix) in transition.iter_mut().enumerate() {
        model.transition_matrix(edge_length, r, matrix);
    }
}

/// Fills the augmented tip matrices of a tip for an edge of length `edge_length`.
///
/// For rate `r`, row `a` and parent state `i`, the entry is the probability of
/// observing `a` at the tip: `P[i][a]` for a primary state, 1 for missing data,
/// and the sum over the listed states for a partial ambiguity.
pub(crate) fn refresh_tip_matrices<M: SubstitutionModel + ?Sized>(
    tip: &mut TipWorkspace,
    model: &M,
    edge_length: f64,
    scratch: &mut Vec<f64>,
) {
    let n = tip.num_states;
    scratch.resize(n * n, 0.0);
    for r in 0..tip.tip_matrices.len() {
        model.transition_matrix(edge_length, r, scratch);
        let rows = &mut tip.tip_matrices[r];

        // Primary states: transpose
        for a in 0..n {
            for i in 0..n {
                rows[a * n + i] = scratch[i * n + a];
            }
        }
        // Missing data and gaps
        rows[n * n..(n + 1) * n].fill(1.0);
        // Partial ambiguities
        for (k, states) in tip.ambiguities.iter().enumerate() {
            let a = n + 1 + k;
            for i in 0..n {
                rows[a * n + i] = states.iter().map(|&j| scratch[i * n + j]).sum();
            }
        }
    }
}

// ============================================================================
// CLA updates
// ============================================================================
/// Computes `out` from the given neighbours, then lets the guard rescale it.
/// `scratch` is working memory of any size.
///
/// Scaling counts of `out` are the sum of those of its internal neighbours
/// plus its own rescalings.
pub(crate) fn fill_cla(
    out: &mut Cla,
    neighbours: &[Neighbour<'_>],
    guard: &mut UnderflowGuard,
    scratch: &mut Vec<f64>,
) -> KernelOutcome {
    debug_assert!(!neighbours.is_empty(), "a CLA needs at least one neighbour");
    out.scalings_mut().fill(0);

    for (k, neighbour) in neighbours.iter().enumerate() {
        let combine = if k == 0 { Combine::Assign } else { Combine::Multiply };
        match neighbour {
            Neighbour::Tip { codes, rows } => apply_tip(out, codes, rows, combine),
            Neighbour::Internal { cla, transition } => {
                apply_internal(out, cla, transition, combine, scratch);
                for (total, &s) in out.scalings_mut().iter_mut().zip(cla.scalings()) {
                    *total += s;
                }
            }
        }
    }

    match guard.rescale(out) {
        RescaleOutcome::Clear => KernelOutcome::Filled,
        RescaleOutcome::Unprotected(patterns) => KernelOutcome::RetryWithProtection(patterns),
    }
}

fn apply_tip(out: &mut Cla, codes: &[usize], rows: &[Vec<f64>], combine: Combine) {
    let n = out.num_states();
    for (r, matrix) in rows.iter().enumerate() {
        for (p, &code) in codes.iter().enumerate() {
            let row = &matrix[code * n..(code + 1) * n];
            let block = out.block_mut(r, p);
            match combine {
                Combine::Assign => block.copy_from_slice(row),
                Combine::Multiply => block.iter_mut().zip(row).for_each(|(v, x)| *v *= x),
            }
        }
    }
}

fn apply_internal(out: &mut Cla, child: &Cla, transition: &[Vec<f64>], combine: Combine, sums: &mut Vec<f64>) {
    if out.num_states() == 4 {
        apply_internal_4(out, child, transition, combine);
        return;
    }

    let n = out.num_states();
    sums.clear();
    sums.resize(n, 0.0);
    for (r, p_matrix) in transition.iter().enumerate() {
        for p in 0..out.num_patterns() {
            let start = child.block_start(r, p);
            let below = &child.values()[start..start + n];
            for (i, sum) in sums.iter_mut().enumerate() {
                let p_row = &p_matrix[i * n..(i + 1) * n];
                *sum = p_row.iter().zip(below).map(|(a, b)| a * b).sum();
            }
            let block = out.block_mut(r, p);
            match combine {
                Combine::Assign => block.copy_from_slice(sums),
                Combine::Multiply => block.iter_mut().zip(sums.iter()).for_each(|(v, s)| *v *= s),
            }
        }
    }
}

/// Unrolled update for nucleotide data.
fn apply_internal_4(out: &mut Cla, child: &Cla, transition: &[Vec<f64>], combine: Combine) {
    for (r, m) in transition.iter().enumerate() {
        for p in 0..out.num_patterns() {
            let start = child.block_start(r, p);
            let c = &child.values()[start..start + 4];
            let s = [
                m[0] * c[0] + m[1] * c[1] + m[2] * c[2] + m[3] * c[3],
                m[4] * c[0] + m[5] * c[1] + m[6] * c[2] + m[7] * c[3],
                m[8] * c[0] + m[9] * c[1] + m[10] * c[2] + m[11] * c[3],
                m[12] * c[0] + m[13] * c[1] + m[14] * c[2] + m[15] * c[3],
            ];
            let block = out.block_mut(r, p);
            match combine {
                Combine::Assign => block.copy_from_slice(&s),
                Combine::Multiply => {
                    block[0] *= s[0];
                    block[1] *= s[1];
                    block[2] *= s[2];
                    block[3] *= s[3];
                }
            }
        }
    }
}

// ============================================================================
// Harvest
// ============================================================================
/// Combines the two CLAs of the focal edge into site log-likelihoods.
///
/// `focal` is the CLA at the likelihood root toward its focal neighbour; the
/// neighbour contributes either its tip rows or `Σ_j P[i][j] · L[j]`. Writes
/// one value per pattern into `sites` and returns the count-weighted sum.
#[allow(clippy::too_many_arguments)]
pub(crate) fn harvest(
    focal: &Cla,
    neighbour: &Neighbour<'_>,
    frequencies: &[f64],
    rate_weights: &[f64],
    counts: &[f64],
    ln_threshold: f64,
    sites: &mut Vec<f64>,
    term: &mut Vec<f64>,
) -> f64 {
    let n = focal.num_states();
    sites.clear();
    term.clear();
    term.resize(n, 0.0);
    let mut total = 0.0;

    for (p, &count) in counts.iter().enumerate() {
        let mut site = 0.0;
        let mut scalings = focal.scalings()[p];
        for (r, &weight) in rate_weights.iter().enumerate() {
            match neighbour {
                Neighbour::Tip { codes, rows } => {
                    let code = codes[p];
                    term.copy_from_slice(&rows[r][code * n..(code + 1) * n]);
                }
                Neighbour::Internal { cla, transition } => {
                    let start = cla.block_start(r, p);
                    let below = &cla.values()[start..start + n];
                    for (i, t) in term.iter_mut().enumerate() {
                        let p_row = &transition[r][i * n..(i + 1) * n];
                        *t = p_row.iter().zip(below).map(|(a, b)| a * b).sum();
                    }
                }
            }
            let start = focal.block_start(r, p);
            let above = &focal.values()[start..start + n];
            let rate_sum: f64 = (0..n).map(|i| frequencies[i] * above[i] * term[i]).sum();
            site += weight * rate_sum;
        }
        if let Neighbour::Internal { cla, .. } = neighbour {
            scalings += cla.scalings()[p];
        }

        let ln_site = site.ln() + f64::from(scalings) * ln_threshold;
        sites.push(ln_site);
        total += count * ln_site;
    }
    total
}
