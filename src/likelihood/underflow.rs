//! Per-pattern underflow protection.
//!
//! Deep trees drive partial likelihoods below the smallest representable
//! double. A pattern is protected once it has been seen to fall below the
//! threshold `C`: from then on every CLA block of that pattern whose largest
//! entry is below `C` is multiplied by `1/C` until it clears, and the number of
//! multiplications is recorded in the CLA so that `scalings × ln C` can be
//! added back exactly when the likelihood is harvested.

use crate::likelihood::cla::Cla;
use log::trace;

/// Protection state of one pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternProtection {
    /// Never observed to underflow
    Unset,
    /// Rescaled when needed; the count is the number of rescalings in the
    /// current evaluation pass
    Protected(u32),
}

/// Outcome of checking a freshly written CLA.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum RescaleOutcome {
    /// All blocks are fine (after rescaling protected patterns)
    Clear,
    /// These unprotected patterns dropped below the threshold
    Unprotected(Vec<usize>),
}

/// Bookkeeping of which patterns are protected and how often they were
/// rescaled during the current pass.
///
/// # Example
/// ```
/// use prunewick::likelihood::{PatternProtection, UnderflowGuard};
///
/// let mut guard = UnderflowGuard::new(3, 1e-100);
/// guard.protect(&[1]);
/// assert!(guard.is_protected(1));
/// assert_eq!(guard.protection(0), PatternProtection::Unset);
/// guard.begin_pass();
/// assert_eq!(guard.bounce_count(1), 0);
/// ```
#[derive(Debug, Clone)]
pub struct UnderflowGuard {
    threshold: f64,
    ln_threshold: f64,
    patterns: Vec<PatternProtection>,
    /// While engaged, patterns found below the threshold are protected on the spot
    engaged: bool,
}

impl UnderflowGuard {
    /// Creates a guard with all patterns unset.
    ///
    /// # Panics
    /// Panics if `threshold` is not strictly between 0 and 1.
    pub fn new(num_patterns: usize, threshold: f64) -> Self {
        assert!(threshold > 0.0 && threshold < 1.0, "Underflow threshold must lie in (0, 1), got {threshold}");
        UnderflowGuard {
            threshold,
            ln_threshold: threshold.ln(),
            patterns: vec![PatternProtection::Unset; num_patterns],
            engaged: false,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Returns `ln C`, the log-likelihood worth of one rescaling.
    pub fn ln_threshold(&self) -> f64 {
        self.ln_threshold
    }

    pub fn num_patterns(&self) -> usize {
        self.patterns.len()
    }

    pub fn protection(&self, pattern: usize) -> PatternProtection {
        self.patterns[pattern]
    }

    pub fn is_protected(&self, pattern: usize) -> bool {
        matches!(self.patterns[pattern], PatternProtection::Protected(_))
    }

    /// Returns the number of protected patterns.
    pub fn num_protected(&self) -> usize {
        (0..self.patterns.len()).filter(|&p| self.is_protected(p)).count()
    }

    /// Returns how often `pattern` was rescaled in the current pass.
    pub fn bounce_count(&self, pattern: usize) -> u32 {
        match self.patterns[pattern] {
            PatternProtection::Unset => 0,
            PatternProtection::Protected(count) => count,
        }
    }

    /// Protects the given patterns; already protected ones keep their count.
    pub fn protect(&mut self, patterns: &[usize]) {
        for &p in patterns {
            if self.patterns[p] == PatternProtection::Unset {
                self.patterns[p] = PatternProtection::Protected(0);
            }
        }
    }

    /// Resets the rescaling counts of protected patterns for a new pass.
    pub fn begin_pass(&mut self) {
        for state in self.patterns.iter_mut() {
            if let PatternProtection::Protected(count) = state {
                *count = 0;
            }
        }
    }

    /// Forgets all protection.
    pub fn reset(&mut self) {
        self.patterns.fill(PatternProtection::Unset);
        self.engaged = false;
    }

    pub fn is_engaged(&self) -> bool {
        self.engaged
    }

    pub(crate) fn set_engaged(&mut self, engaged: bool) {
        self.engaged = engaged;
    }

    /// Rescales the blocks of protected patterns of a freshly written CLA.
    ///
    /// The trigger for pattern `p` is the largest entry over all rates and
    /// states; all-zero blocks are left alone.
    pub(crate) fn rescale(&mut self, cla: &mut Cla) -> RescaleOutcome {
        let inverse = 1.0 / self.threshold;
        let mut unprotected = Vec::new();

        for p in 0..cla.num_patterns() {
            let mut largest = pattern_max(cla, p);
            if largest == 0.0 || largest >= self.threshold {
                continue;
            }
            if !self.is_protected(p) {
                if !self.engaged {
                    unprotected.push(p);
                    continue;
                }
                trace!("protecting pattern {p} during engaged pass");
                self.patterns[p] = PatternProtection::Protected(0);
            }

            while largest < self.threshold {
                for r in 0..cla.num_rates() {
                    cla.block_mut(r, p).iter_mut().for_each(|v| *v *= inverse);
                }
                cla.scalings_mut()[p] += 1;
                if let PatternProtection::Protected(count) = &mut self.patterns[p] {
                    *count += 1;
                }
                largest *= inverse;
            }
        }

        if unprotected.is_empty() {
            RescaleOutcome::Clear
        } else {
            RescaleOutcome::Unprotected(unprotected)
        }
    }
}

fn pattern_max(cla: &Cla, p: usize) -> f64 {
    (0..cla.num_rates())
        .flat_map(|r| {
            let start = cla.block_start(r, p);
            cla.values()[start..start + cla.num_states()].iter().copied()
        })
        .fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::likelihood::cla::ClaPool;

    fn tiny_cla(pool: &mut ClaPool) -> Cla {
        let mut cla = pool.acquire(2, 2, 2);
        cla.values_mut().copy_from_slice(&[
            1e-150, 2e-150, // r0 p0
            0.5, 0.25,      // r0 p1
            3e-160, 0.0,    // r1 p0
            0.5, 0.25,      // r1 p1
        ]);
        cla.scalings_mut().fill(0);
        cla
    }

    #[test]
    fn unprotected_pattern_is_reported() {
        let mut pool = ClaPool::new();
        let mut cla = tiny_cla(&mut pool);
        let mut guard = UnderflowGuard::new(2, 1e-100);
        assert_eq!(guard.rescale(&mut cla), RescaleOutcome::Unprotected(vec![0]));
        assert_eq!(cla.scalings(), &[0, 0]);
    }

    #[test]
    fn protected_pattern_is_rescaled() {
        let mut pool = ClaPool::new();
        let mut cla = tiny_cla(&mut pool);
        let mut guard = UnderflowGuard::new(2, 1e-100);
        guard.protect(&[0]);
        assert_eq!(guard.rescale(&mut cla), RescaleOutcome::Clear);
        // 2e-150 * 1e100 = 2e-50 clears after one rescaling
        assert_eq!(cla.scalings(), &[1, 0]);
        assert_eq!(guard.bounce_count(0), 1);
        assert!(cla.get(0, 0, 1) >= 1e-100);
        // untouched pattern
        assert_eq!(cla.get(1, 1, 0), 0.5);
    }

    #[test]
    fn engaged_guard_protects_in_line() {
        let mut pool = ClaPool::new();
        let mut cla = tiny_cla(&mut pool);
        let mut guard = UnderflowGuard::new(2, 1e-100);
        guard.set_engaged(true);
        assert_eq!(guard.rescale(&mut cla), RescaleOutcome::Clear);
        assert!(guard.is_protected(0));
        assert!(!guard.is_protected(1));
    }

    #[test]
    fn all_zero_block_is_left_alone() {
        let mut pool = ClaPool::new();
        let mut cla = pool.acquire(1, 1, 2);
        cla.values_mut().fill(0.0);
        cla.scalings_mut().fill(0);
        let mut guard = UnderflowGuard::new(1, 1e-100);
        assert_eq!(guard.rescale(&mut cla), RescaleOutcome::Clear);
        assert_eq!(cla.scalings(), &[0]);
    }

    #[test]
    fn begin_pass_resets_counts_but_keeps_protection() {
        let mut pool = ClaPool::new();
        let mut cla = tiny_cla(&mut pool);
        let mut guard = UnderflowGuard::new(2, 1e-100);
        guard.protect(&[0]);
        guard.rescale(&mut cla);
        guard.begin_pass();
        assert_eq!(guard.protection(0), PatternProtection::Protected(0));
        guard.reset();
        assert!(!guard.is_protected(0));
    }
}
