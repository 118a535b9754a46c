//! Substitution models supplying transition probabilities to the pruning kernel.

/// Discrete rate categories with their probabilities.
///
/// # Example
/// ```
/// use prunewick::substitution::RateCategories;
///
/// let rates = RateCategories::new(vec![0.5, 1.5], vec![0.5, 0.5]);
/// assert_eq!(rates.len(), 2);
/// assert_eq!(RateCategories::uniform().rates(), &[1.0]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RateCategories {
    rates: Vec<f64>,
    weights: Vec<f64>,
}

impl RateCategories {
    /// Creates rate categories.
    ///
    /// # Panics
    /// Panics if there is no category, the lengths differ, or a rate or weight
    /// is negative or not finite.
    pub fn new(rates: Vec<f64>, weights: Vec<f64>) -> Self {
        assert!(!rates.is_empty(), "At least one rate category is required");
        assert_eq!(rates.len(), weights.len(), "Need one weight per rate category");
        assert!(
            rates.iter().chain(&weights).all(|x| x.is_finite() && *x >= 0.0),
            "Rates and weights must be non-negative and finite"
        );
        RateCategories { rates, weights }
    }

    /// A single category with rate 1.
    pub fn uniform() -> Self {
        RateCategories::new(vec![1.0], vec![1.0])
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    pub fn rates(&self) -> &[f64] {
        &self.rates
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }
}

/// A continuous-time Markov model of character change.
pub trait SubstitutionModel {
    /// Number of states `S`.
    fn num_states(&self) -> usize;

    /// Equilibrium state frequencies, length `S`.
    fn state_frequencies(&self) -> &[f64];

    /// Among-site rate categories.
    fn rate_categories(&self) -> &RateCategories;

    /// Writes the `S × S` row-major transition matrix for an edge of the given
    /// length in rate category `rate_index`: `out[i * S + j]` = P(j at the end
    /// of the edge | i at its start).
    fn transition_matrix(&self, edge_length: f64, rate_index: usize, out: &mut [f64]);
}

/// The N-state symmetric (Jukes-Cantor / Mk) model.
///
/// With `n` states and `x = exp(-n/(n-1) · t · r)`:
/// - P(same) = 1/n + (n-1)/n · x
/// - P(different) = 1/n - 1/n · x
#[derive(Debug, Clone)]
pub struct JukesCantor {
    frequencies: Vec<f64>,
    rates: RateCategories,
}

impl JukesCantor {
    /// Creates the model with `num_states` states and a single rate.
    ///
    /// # Panics
    /// Panics if `num_states < 2`.
    pub fn new(num_states: usize) -> Self {
        assert!(num_states >= 2, "Jukes-Cantor needs at least 2 states, got {num_states}");
        JukesCantor {
            frequencies: vec![1.0 / num_states as f64; num_states],
            rates: RateCategories::uniform(),
        }
    }

    /// Replaces the rate categories.
    pub fn with_rate_categories(mut self, rates: RateCategories) -> Self {
        self.rates = rates;
        self
    }
}

impl SubstitutionModel for JukesCantor {
    fn num_states(&self) -> usize {
        self.frequencies.len()
    }

    fn state_frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    fn rate_categories(&self) -> &RateCategories {
        &self.rates
    }

    fn transition_matrix(&self, edge_length: f64, rate_index: usize, out: &mut [f64]) {
        let n = self.frequencies.len();
        let nf = n as f64;
        let x = (-nf / (nf - 1.0) * edge_length * self.rates.rates[rate_index]).exp();
        let p_same = 1.0 / nf + (nf - 1.0) / nf * x;
        let p_diff = 1.0 / nf - x / nf;

        for i in 0..n {
            for j in 0..n {
                out[i * n + j] = if i == j { p_same } else { p_diff };
            }
        }
    }
}

/// The HKY85 nucleotide model: unequal base frequencies and a
/// transition/transversion rate ratio `kappa`. States are A, C, G, T.
///
/// The rate matrix is scaled to one expected substitution per unit of edge
/// length, so `kappa = 1` with equal frequencies is [JukesCantor] on 4 states.
///
/// # Example
/// ```
/// use prunewick::substitution::{Hky, SubstitutionModel};
///
/// let model = Hky::new([0.1, 0.2, 0.3, 0.4], 2.0);
/// let mut p = [0.0; 16];
/// model.transition_matrix(0.5, 0, &mut p);
/// assert!((p[0..4].iter().sum::<f64>() - 1.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct Hky {
    frequencies: Vec<f64>,
    kappa: f64,
    rates: RateCategories,
}

impl Hky {
    /// Creates the model with base frequencies (A, C, G, T) and a single rate.
    ///
    /// # Panics
    /// Panics if a frequency is not positive, the frequencies do not sum to 1,
    /// or `kappa` is not positive and finite.
    pub fn new(frequencies: [f64; 4], kappa: f64) -> Self {
        assert!(
            frequencies.iter().all(|&pi| pi.is_finite() && pi > 0.0),
            "HKY base frequencies must be positive, got {frequencies:?}"
        );
        assert!(
            (frequencies.iter().sum::<f64>() - 1.0).abs() < 1e-9,
            "HKY base frequencies must sum to 1, got {frequencies:?}"
        );
        assert!(kappa.is_finite() && kappa > 0.0, "kappa must be positive and finite, got {kappa}");
        Hky {
            frequencies: frequencies.to_vec(),
            kappa,
            rates: RateCategories::uniform(),
        }
    }

    /// Replaces the rate categories.
    pub fn with_rate_categories(mut self, rates: RateCategories) -> Self {
        self.rates = rates;
        self
    }

    pub fn kappa(&self) -> f64 {
        self.kappa
    }
}

/// Whether two nucleotides are both purines (A, G) or both pyrimidines (C, T).
fn same_group(i: usize, j: usize) -> bool {
    i % 2 == j % 2
}

impl SubstitutionModel for Hky {
    fn num_states(&self) -> usize {
        4
    }

    fn state_frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    fn rate_categories(&self) -> &RateCategories {
        &self.rates
    }

    fn transition_matrix(&self, edge_length: f64, rate_index: usize, out: &mut [f64]) {
        let pi = &self.frequencies;
        let kappa = self.kappa;
        let purines = pi[0] + pi[2];
        let pyrimidines = pi[1] + pi[3];
        let beta = 0.5 / (purines * pyrimidines + kappa * (pi[0] * pi[2] + pi[1] * pi[3]));
        let t = edge_length * self.rates.rates[rate_index];
        let x = (-beta * t).exp();

        // Column by column: probabilities of ending in state j
        for j in 0..4 {
            let group = if j % 2 == 0 { purines } else { pyrimidines };
            let y = (-beta * (1.0 + group * (kappa - 1.0)) * t).exp();
            let within = pi[j] * (1.0 / group - 1.0) * x;
            for i in 0..4 {
                out[i * 4 + j] = if i == j {
                    pi[j] + within + y * (group - pi[j]) / group
                } else if same_group(i, j) {
                    pi[j] + within - y * pi[j] / group
                } else {
                    pi[j] * (1.0 - x)
                };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_sum_to_one() {
        let model = JukesCantor::new(4);
        let mut p = vec![0.0; 16];
        model.transition_matrix(0.3, 0, &mut p);
        for row in p.chunks(4) {
            assert!((row.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn zero_length_is_identity_and_long_edges_saturate() {
        let model = JukesCantor::new(2);
        let mut p = vec![0.0; 4];
        model.transition_matrix(0.0, 0, &mut p);
        assert_eq!(p, vec![1.0, 0.0, 0.0, 1.0]);

        model.transition_matrix(1e3, 0, &mut p);
        assert!(p.iter().all(|x| (x - 0.5).abs() < 1e-12));
    }

    #[test]
    fn rate_scales_edge_length() {
        let model = JukesCantor::new(4).with_rate_categories(RateCategories::new(vec![2.0], vec![1.0]));
        let reference = JukesCantor::new(4);
        let (mut a, mut b) = (vec![0.0; 16], vec![0.0; 16]);
        model.transition_matrix(0.1, 0, &mut a);
        reference.transition_matrix(0.2, 0, &mut b);
        for (x, y) in a.iter().zip(&b) {
            assert!((x - y).abs() < 1e-15);
        }
    }

    #[test]
    fn hky_reduces_to_jukes_cantor() {
        let hky = Hky::new([0.25; 4], 1.0);
        let jc = JukesCantor::new(4);
        let (mut a, mut b) = (vec![0.0; 16], vec![0.0; 16]);
        hky.transition_matrix(0.37, 0, &mut a);
        jc.transition_matrix(0.37, 0, &mut b);
        for (x, y) in a.iter().zip(&b) {
            assert!((x - y).abs() < 1e-14);
        }
    }

    #[test]
    fn hky_is_reversible_with_unequal_frequencies() {
        let model = Hky::new([0.1, 0.2, 0.3, 0.4], 3.0);
        let pi = model.state_frequencies().to_vec();
        let mut p = vec![0.0; 16];
        model.transition_matrix(0.25, 0, &mut p);
        for i in 0..4 {
            assert!((p[i * 4..i * 4 + 4].iter().sum::<f64>() - 1.0).abs() < 1e-12);
            for j in 0..4 {
                assert!((pi[i] * p[i * 4 + j] - pi[j] * p[j * 4 + i]).abs() < 1e-14, "{i} {j}");
            }
        }
        // transitions outpace transversions
        assert!(p[2] > p[3] * 0.3 / 0.4);
    }

    #[test]
    fn hky_limits() {
        let model = Hky::new([0.1, 0.2, 0.3, 0.4], 2.0);
        let mut p = vec![0.0; 16];
        model.transition_matrix(0.0, 0, &mut p);
        for i in 0..4 {
            for j in 0..4 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!((p[i * 4 + j] - expected).abs() < 1e-14);
            }
        }

        model.transition_matrix(1e3, 0, &mut p);
        for row in p.chunks(4) {
            for (x, pi) in row.iter().zip(model.state_frequencies()) {
                assert!((x - pi).abs() < 1e-12);
            }
        }
    }

    #[test]
    #[should_panic(expected = "sum to 1")]
    fn hky_rejects_unnormalised_frequencies() {
        Hky::new([0.3, 0.3, 0.3, 0.3], 2.0);
    }

    #[test]
    #[should_panic(expected = "one weight per rate")]
    fn mismatched_rate_weights_panic() {
        RateCategories::new(vec![1.0, 2.0], vec![1.0]);
    }
}
