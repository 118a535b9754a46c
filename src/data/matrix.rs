//! Character matrices and their compression into site patterns.

use crate::data::alphabet::{Alphabet, Symbol};
use crate::error::PruneError;
use crate::parser::{ParsingError, ParsingErrorType};
use log::debug;
use std::collections::BTreeMap;

/// State code of a gap.
pub const GAP_CODE: i8 = -1;

// =#========================================================================#=
// DATA MATRIX
// =#========================================================================#=
/// Taxa × characters matrix of state codes.
///
/// # Codes
/// For an alphabet with `S` states:
/// - `0..S` - primary states
/// - `-1` ([GAP_CODE]) - gap
/// - `S` - missing data
/// - `S+1+k` - the partial ambiguity `state_lists[k]`
#[derive(Debug, Clone, PartialEq)]
pub struct DataMatrix {
    num_states: usize,
    taxon_names: Vec<String>,
    rows: Vec<Vec<i8>>,
    weights: Option<Vec<f64>>,
    state_lists: Vec<Vec<usize>>,
}

impl DataMatrix {
    /// Builds a matrix from coded rows.
    ///
    /// # Errors
    /// [PruneError::Dimension] if rows differ in length, names and rows differ in
    /// number, or a code lies outside `-1..=S+state_lists.len()`.
    pub fn new(
        num_states: usize,
        taxon_names: Vec<String>,
        rows: Vec<Vec<i8>>,
        state_lists: Vec<Vec<usize>>,
    ) -> Result<Self, PruneError> {
        if taxon_names.len() != rows.len() {
            return Err(PruneError::dimension(format!(
                "{} taxon names for {} rows",
                taxon_names.len(),
                rows.len()
            )));
        }
        let num_chars = rows.first().map_or(0, Vec::len);
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != num_chars) {
            return Err(PruneError::dimension(format!(
                "row of taxon {} has {} characters, expected {num_chars}",
                taxon_names[i],
                row.len()
            )));
        }
        let max_code = (num_states + state_lists.len()) as i64;
        if let Some(&code) = rows.iter().flatten().find(|&&code| code < GAP_CODE || code as i64 > max_code) {
            return Err(PruneError::dimension(format!("state code {code} out of range for {num_states} states")));
        }
        if let Some(list) = state_lists.iter().find(|list| list.iter().any(|&s| s >= num_states)) {
            return Err(PruneError::dimension(format!("ambiguity {list:?} refers to a state beyond {num_states}")));
        }

        Ok(DataMatrix { num_states, taxon_names, rows, weights: None, state_lists })
    }

    /// Builds a matrix from named symbol strings.
    ///
    /// Each distinct partial ambiguity gets its own code, in order of first
    /// appearance.
    ///
    /// # Example
    /// ```
    /// use prunewick::data::{Alphabet, DataMatrix};
    ///
    /// let matrix = DataMatrix::from_sequences(&Alphabet::dna(), &[
    ///     ("kiwi", "ACGR"),
    ///     ("moa", "AC-N"),
    /// ]).unwrap();
    /// assert_eq!(matrix.row(0), &[0, 1, 2, 5]);
    /// assert_eq!(matrix.row(1), &[0, 1, -1, 4]);
    /// assert_eq!(matrix.state_list(5), Some(&[0, 2][..]));
    /// ```
    ///
    /// # Errors
    /// [PruneError::Format] for a symbol outside the alphabet,
    /// [PruneError::Dimension] for rows of different length.
    pub fn from_sequences<N: AsRef<str>, S: AsRef<str>>(
        alphabet: &Alphabet,
        sequences: &[(N, S)],
    ) -> Result<Self, PruneError> {
        let num_states = alphabet.num_states();
        let mut state_lists: Vec<Vec<usize>> = Vec::new();
        let mut names = Vec::with_capacity(sequences.len());
        let mut rows = Vec::with_capacity(sequences.len());

        for (name, sequence) in sequences {
            let name = name.as_ref();
            let mut row = Vec::with_capacity(sequence.as_ref().len());
            for (column, c) in sequence.as_ref().chars().filter(|c| !c.is_whitespace()).enumerate() {
                let code = match alphabet.classify(c) {
                    Some(Symbol::State(state)) => state as i8,
                    Some(Symbol::Gap) => GAP_CODE,
                    Some(Symbol::Missing) => num_states as i8,
                    Some(Symbol::Ambiguous(states)) => {
                        let k = match state_lists.iter().position(|list| list == states) {
                            Some(k) => k,
                            None => {
                                state_lists.push(states.to_vec());
                                state_lists.len() - 1
                            }
                        };
                        (num_states + 1 + k) as i8
                    }
                    None => {
                        return Err(ParsingError::without_context(ParsingErrorType::InvalidSequence(format!(
                            "symbol {c:?} at character {} of taxon {name} is not in the alphabet",
                            column + 1
                        ))).into());
                    }
                };
                row.push(code);
            }
            names.push(name.to_string());
            rows.push(row);
        }

        DataMatrix::new(num_states, names, rows, state_lists)
    }

    /// Sets per-character weights; a weight of zero excludes the character.
    ///
    /// # Errors
    /// [PruneError::Dimension] if the number of weights differs from the number
    /// of characters or a weight is negative or not finite.
    pub fn with_weights(mut self, weights: Vec<f64>) -> Result<Self, PruneError> {
        if weights.len() != self.num_chars() {
            return Err(PruneError::dimension(format!(
                "{} weights for {} characters",
                weights.len(),
                self.num_chars()
            )));
        }
        if let Some(w) = weights.iter().find(|w| !(w.is_finite() && **w >= 0.0)) {
            return Err(PruneError::dimension(format!("invalid character weight {w}")));
        }
        self.weights = Some(weights);
        Ok(self)
    }

    pub fn num_taxa(&self) -> usize {
        self.rows.len()
    }

    pub fn num_chars(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    pub fn num_states(&self) -> usize {
        self.num_states
    }

    pub fn taxon_names(&self) -> &[String] {
        &self.taxon_names
    }

    /// Returns the codes of taxon `taxon`.
    ///
    /// # Panics
    /// Panics if `taxon` is out of bounds.
    pub fn row(&self, taxon: usize) -> &[i8] {
        &self.rows[taxon]
    }

    /// Returns the states of a partial ambiguity code.
    pub fn state_list(&self, code: i8) -> Option<&[usize]> {
        state_list(&self.state_lists, self.num_states, code)
    }

    /// Compresses the characters into unique site patterns.
    ///
    /// Patterns are ordered lexicographically by their column of codes.
    /// Characters with zero weight and characters that are missing or gaps for
    /// every taxon map to no pattern.
    pub fn compress(&self) -> PatternMatrix {
        let missing = self.num_states as i8;
        let mut counts: BTreeMap<Vec<i8>, f64> = BTreeMap::new();
        let mut columns: Vec<Option<Vec<i8>>> = Vec::with_capacity(self.num_chars());

        for c in 0..self.num_chars() {
            let weight = self.weights.as_ref().map_or(1.0, |w| w[c]);
            let column: Vec<i8> = self.rows.iter().map(|row| row[c]).collect();
            let uninformative = column.iter().all(|&code| code == missing || code == GAP_CODE);
            if weight == 0.0 || uninformative {
                columns.push(None);
                continue;
            }
            *counts.entry(column.clone()).or_insert(0.0) += weight;
            columns.push(Some(column));
        }

        let index: BTreeMap<&Vec<i8>, usize> = counts.keys().enumerate().map(|(i, col)| (col, i)).collect();
        let char_to_pattern = columns.iter()
            .map(|column| column.as_ref().and_then(|col| index.get(col).copied()))
            .collect();

        let num_patterns = counts.len();
        let mut codes = vec![0i8; self.num_taxa() * num_patterns];
        for (p, column) in counts.keys().enumerate() {
            for (taxon, &code) in column.iter().enumerate() {
                codes[taxon * num_patterns + p] = code;
            }
        }

        debug!("compressed {} characters into {num_patterns} patterns", self.num_chars());
        PatternMatrix {
            num_states: self.num_states,
            num_taxa: self.num_taxa(),
            taxon_names: self.taxon_names.clone(),
            codes,
            counts: counts.into_values().collect(),
            char_to_pattern,
            state_lists: self.state_lists.clone(),
        }
    }
}

fn state_list(state_lists: &[Vec<usize>], num_states: usize, code: i8) -> Option<&[usize]> {
    let k = (code as i64) - (num_states as i64) - 1;
    usize::try_from(k).ok().and_then(|k| state_lists.get(k)).map(Vec::as_slice)
}


// =#========================================================================#=
// PATTERN MATRIX
// =#========================================================================#=
/// Taxa × unique site patterns with per-pattern multiplicities.
///
/// Row `t` holds the codes of the tip numbered `t`; codes follow the same
/// convention as [DataMatrix].
#[derive(Debug, Clone, PartialEq)]
pub struct PatternMatrix {
    num_states: usize,
    num_taxa: usize,
    taxon_names: Vec<String>,
    /// `codes[taxon * num_patterns + pattern]`
    codes: Vec<i8>,
    counts: Vec<f64>,
    char_to_pattern: Vec<Option<usize>>,
    state_lists: Vec<Vec<usize>>,
}

impl PatternMatrix {
    /// Builds a pattern matrix directly from coded rows (`rows[taxon][pattern]`)
    /// and pattern counts, without ambiguities.
    ///
    /// Each pattern stands for one character of the same index.
    ///
    /// # Errors
    /// [PruneError::Dimension] if rows and counts disagree in length or a code
    /// is outside `-1..=num_states`.
    pub fn from_patterns(num_states: usize, rows: Vec<Vec<i8>>, counts: Vec<f64>) -> Result<Self, PruneError> {
        let names = (1..=rows.len()).map(|i| i.to_string()).collect();
        let matrix = DataMatrix::new(num_states, names, rows, Vec::new())?;
        if matrix.num_chars() != counts.len() {
            return Err(PruneError::dimension(format!(
                "{} counts for {} patterns",
                counts.len(),
                matrix.num_chars()
            )));
        }

        let num_patterns = counts.len();
        let mut codes = Vec::with_capacity(matrix.num_taxa() * num_patterns);
        for row in &matrix.rows {
            codes.extend_from_slice(row);
        }
        Ok(PatternMatrix {
            num_states,
            num_taxa: matrix.num_taxa(),
            taxon_names: matrix.taxon_names,
            codes,
            counts,
            char_to_pattern: (0..num_patterns).map(Some).collect(),
            state_lists: Vec::new(),
        })
    }

    pub fn num_taxa(&self) -> usize {
        self.num_taxa
    }

    pub fn num_patterns(&self) -> usize {
        self.counts.len()
    }

    pub fn num_states(&self) -> usize {
        self.num_states
    }

    pub fn taxon_names(&self) -> &[String] {
        &self.taxon_names
    }

    /// Returns the code of taxon `taxon` in pattern `pattern`.
    ///
    /// # Panics
    /// Panics if either index is out of bounds.
    pub fn code(&self, taxon: usize, pattern: usize) -> i8 {
        assert!(pattern < self.num_patterns(), "Pattern {pattern} out of bounds");
        self.codes[taxon * self.num_patterns() + pattern]
    }

    /// Returns all codes of taxon `taxon`, one per pattern.
    pub fn row(&self, taxon: usize) -> &[i8] {
        let n = self.num_patterns();
        &self.codes[taxon * n..(taxon + 1) * n]
    }

    /// Returns the multiplicity of every pattern.
    pub fn counts(&self) -> &[f64] {
        &self.counts
    }

    /// Returns the sum of all pattern counts.
    pub fn total_count(&self) -> f64 {
        self.counts.iter().sum()
    }

    /// Returns, per original character, the pattern it was merged into.
    pub fn char_to_pattern(&self) -> &[Option<usize>] {
        &self.char_to_pattern
    }

    /// Returns the states of a partial ambiguity code.
    pub fn state_list(&self, code: i8) -> Option<&[usize]> {
        state_list(&self.state_lists, self.num_states, code)
    }

    /// Returns the states compatible with `code`: one state, all states for
    /// missing data and gaps, or the ambiguity's list.
    pub fn compatible_states(&self, code: i8) -> Vec<usize> {
        let s = self.num_states as i8;
        match code {
            GAP_CODE => (0..self.num_states).collect(),
            c if c == s => (0..self.num_states).collect(),
            c if (0..s).contains(&c) => vec![c as usize],
            c => self.state_list(c).map(<[usize]>::to_vec).unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kiwis() -> DataMatrix {
        DataMatrix::from_sequences(&Alphabet::dna(), &[
            ("haastii", "AACG-T"),
            ("owenii", "AACGNT"),
            ("mantelli", "CCAG-Y"),
        ]).unwrap()
    }

    #[test]
    fn compress_merges_identical_columns() {
        let patterns = kiwis().compress();
        // columns 0 and 1 are identical, column 4 is gap/missing everywhere
        assert_eq!(patterns.num_patterns(), 4);
        assert_eq!(patterns.total_count(), 5.0);
        let map = patterns.char_to_pattern();
        assert_eq!(map[0], map[1]);
        assert_eq!(map[4], None);
        assert_eq!(patterns.counts()[map[0].unwrap()], 2.0);
    }

    #[test]
    fn patterns_are_sorted_lexicographically() {
        let patterns = kiwis().compress();
        let columns: Vec<Vec<i8>> = (0..patterns.num_patterns())
            .map(|p| (0..patterns.num_taxa()).map(|t| patterns.code(t, p)).collect())
            .collect();
        let mut sorted = columns.clone();
        sorted.sort();
        assert_eq!(columns, sorted);
    }

    #[test]
    fn zero_weight_excludes_character() {
        let patterns = kiwis().with_weights(vec![1.0, 0.0, 1.0, 2.5, 1.0, 1.0]).unwrap().compress();
        assert_eq!(patterns.char_to_pattern()[1], None);
        assert_eq!(patterns.total_count(), 5.5);
    }

    #[test]
    fn ambiguity_codes_resolve_to_states() {
        let patterns = kiwis().compress();
        let last = patterns.char_to_pattern()[5].unwrap();
        let y = patterns.code(2, last);
        assert_eq!(y, 5);
        assert_eq!(patterns.compatible_states(y), vec![1, 3]);
        assert_eq!(patterns.compatible_states(GAP_CODE), vec![0, 1, 2, 3]);
    }

    #[test]
    fn unknown_symbol_is_format_error() {
        let err = DataMatrix::from_sequences(&Alphabet::binary(), &[("a", "01"), ("b", "0x")]).unwrap_err();
        assert!(err.is_format());
    }

    #[test]
    fn ragged_rows_are_dimension_errors() {
        let err = DataMatrix::from_sequences(&Alphabet::binary(), &[("a", "01"), ("b", "0")]).unwrap_err();
        assert!(err.is_dimension());
        assert!(PatternMatrix::from_patterns(2, vec![vec![0, 1]], vec![1.0]).unwrap_err().is_dimension());
    }
}
