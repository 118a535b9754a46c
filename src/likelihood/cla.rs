//! Conditional likelihood arrays and the pool recycling them.

use log::trace;

/// A conditional likelihood array: `rates × patterns × states` partial
/// likelihoods of the data on one side of an edge, plus per-pattern counts of
/// underflow rescalings accumulated over that side.
///
/// Value `(r, p, i)` lives at `(r * patterns + p) * states + i`.
#[derive(Debug)]
pub struct Cla {
    num_rates: usize,
    num_patterns: usize,
    num_states: usize,
    values: Vec<f64>,
    scalings: Vec<u32>,
}

impl Cla {
    fn with_shape(num_rates: usize, num_patterns: usize, num_states: usize) -> Self {
        Cla {
            num_rates,
            num_patterns,
            num_states,
            values: vec![0.0; num_rates * num_patterns * num_states],
            scalings: vec![0; num_patterns],
        }
    }

    fn reshape(&mut self, num_rates: usize, num_patterns: usize, num_states: usize) {
        self.num_rates = num_rates;
        self.num_patterns = num_patterns;
        self.num_states = num_states;
        self.values.resize(num_rates * num_patterns * num_states, 0.0);
        self.scalings.resize(num_patterns, 0);
    }

    pub fn num_rates(&self) -> usize {
        self.num_rates
    }

    pub fn num_patterns(&self) -> usize {
        self.num_patterns
    }

    pub fn num_states(&self) -> usize {
        self.num_states
    }

    /// Returns the offset of the state block of rate `r` and pattern `p`.
    #[inline(always)]
    pub fn block_start(&self, r: usize, p: usize) -> usize {
        (r * self.num_patterns + p) * self.num_states
    }

    /// Returns the value for rate `r`, pattern `p` and state `i`.
    #[inline]
    pub fn get(&self, r: usize, p: usize, i: usize) -> f64 {
        self.values[self.block_start(r, p) + i]
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    #[cfg(test)]
    pub(crate) fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }

    /// Returns how often each pattern was rescaled on this side of the edge.
    pub fn scalings(&self) -> &[u32] {
        &self.scalings
    }

    pub(crate) fn scalings_mut(&mut self) -> &mut [u32] {
        &mut self.scalings
    }

    /// Returns the state block of rate `r` and pattern `p` mutably.
    #[inline(always)]
    pub(crate) fn block_mut(&mut self, r: usize, p: usize) -> &mut [f64] {
        let start = self.block_start(r, p);
        &mut self.values[start..start + self.num_states]
    }
}

/// Recycles [Cla] buffers so that steady-state evaluation allocates no new
/// CLAs.
///
/// # Example
/// ```
/// use prunewick::likelihood::ClaPool;
///
/// let mut pool = ClaPool::new();
/// let cla = pool.acquire(1, 10, 4);
/// assert_eq!(cla.values().len(), 40);
/// pool.release(cla);
/// let again = pool.acquire(2, 5, 4);
/// assert_eq!(pool.num_created(), 1);
/// assert_eq!(again.num_rates(), 2);
/// ```
#[derive(Debug, Default)]
pub struct ClaPool {
    available: Vec<Cla>,
    num_created: usize,
}

impl ClaPool {
    pub fn new() -> Self {
        ClaPool::default()
    }

    /// Returns a buffer of the requested shape; contents are unspecified.
    pub fn acquire(&mut self, num_rates: usize, num_patterns: usize, num_states: usize) -> Cla {
        match self.available.pop() {
            Some(mut cla) => {
                if cla.num_rates != num_rates || cla.num_patterns != num_patterns || cla.num_states != num_states {
                    cla.reshape(num_rates, num_patterns, num_states);
                }
                cla
            }
            None => {
                self.num_created += 1;
                trace!("allocating CLA #{} ({num_rates}x{num_patterns}x{num_states})", self.num_created);
                Cla::with_shape(num_rates, num_patterns, num_states)
            }
        }
    }

    /// Returns a buffer for reuse.
    pub fn release(&mut self, cla: Cla) {
        self.available.push(cla);
    }

    /// Number of buffers ever allocated by this pool.
    pub fn num_created(&self) -> usize {
        self.num_created
    }

    /// Number of buffers waiting for reuse.
    pub fn num_available(&self) -> usize {
        self.available.len()
    }

    /// Number of buffers currently held outside the pool.
    pub fn num_in_use(&self) -> usize {
        self.num_created - self.available.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn released_buffers_are_reused() {
        let mut pool = ClaPool::new();
        let a = pool.acquire(1, 3, 2);
        let b = pool.acquire(1, 3, 2);
        assert_eq!(pool.num_in_use(), 2);
        pool.release(a);
        pool.release(b);
        let _c = pool.acquire(1, 3, 2);
        assert_eq!(pool.num_created(), 2);
        assert_eq!(pool.num_available(), 1);
    }

    #[test]
    fn layout_is_rate_major_then_pattern() {
        let mut pool = ClaPool::new();
        let mut cla = pool.acquire(2, 3, 4);
        cla.block_mut(1, 2)[3] = 7.0;
        assert_eq!(cla.values()[(1 * 3 + 2) * 4 + 3], 7.0);
        assert_eq!(cla.get(1, 2, 3), 7.0);
    }
}
