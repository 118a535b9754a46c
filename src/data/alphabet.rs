//! Character alphabets: which symbols stand for which states.

/// Largest number of primary states; codes are stored as `i8` and need room
/// for the missing code and the partial ambiguities after them.
pub const MAX_STATES: usize = 32;

/// What a single sequence symbol means under an [Alphabet].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol<'a> {
    /// A primary state
    State(usize),
    /// A gap (inapplicable); treated like missing data
    Gap,
    /// Missing data, compatible with every state
    Missing,
    /// A partial ambiguity: one of the listed states
    Ambiguous(&'a [usize]),
}

/// Maps sequence symbols to states.
///
/// # Example
/// ```
/// use prunewick::data::{Alphabet, Symbol};
///
/// let dna = Alphabet::dna();
/// assert_eq!(dna.num_states(), 4);
/// assert_eq!(dna.classify('g'), Some(Symbol::State(2)));
/// assert_eq!(dna.classify('R'), Some(Symbol::Ambiguous(&[0, 2])));
/// assert_eq!(dna.classify('N'), Some(Symbol::Missing));
/// assert_eq!(dna.classify('-'), Some(Symbol::Gap));
/// assert_eq!(dna.classify('J'), None);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Alphabet {
    symbols: Vec<char>,
    ambiguities: Vec<(char, Vec<usize>)>,
    missing: Vec<char>,
    gap: char,
    case_sensitive: bool,
}

impl Alphabet {
    /// Creates an alphabet whose primary states are the given symbols, in order.
    ///
    /// `?` stands for missing data and `-` for a gap. Symbols are case sensitive.
    ///
    /// # Panics
    /// Panics if there are fewer than 2 or more than [MAX_STATES] symbols, or a
    /// symbol repeats or collides with `?` or `-`.
    pub fn new(symbols: &str) -> Self {
        let symbols: Vec<char> = symbols.chars().collect();
        assert!(
            (2..=MAX_STATES).contains(&symbols.len()),
            "Alphabet needs between 2 and {MAX_STATES} states, got {}",
            symbols.len()
        );
        for (i, s) in symbols.iter().enumerate() {
            assert!(!symbols[..i].contains(s), "Symbol {s:?} listed twice");
            assert!(*s != '?' && *s != '-', "Symbol {s:?} is reserved");
        }
        Alphabet { symbols, ambiguities: Vec::new(), missing: vec!['?'], gap: '-', case_sensitive: true }
    }

    /// Nucleotides `ACGT` with the IUPAC ambiguity codes (`U` reads as `T`).
    pub fn dna() -> Self {
        let mut alphabet = Alphabet::new("ACGT");
        alphabet.case_sensitive = false;
        alphabet.missing.push('N');
        for (symbol, states) in [
            ('U', "T"), ('R', "AG"), ('Y', "CT"), ('M', "AC"), ('K', "GT"), ('S', "CG"),
            ('W', "AT"), ('H', "ACT"), ('B', "CGT"), ('V', "ACG"), ('D', "AGT"),
        ] {
            alphabet = alphabet.with_ambiguity(symbol, states);
        }
        alphabet
    }

    /// Binary states `0` and `1`.
    pub fn binary() -> Self {
        Alphabet::new("01")
    }

    /// Adds a symbol standing for the given set of primary state symbols.
    ///
    /// A set covering all states is treated as missing data; a single state is
    /// an alias for that state.
    ///
    /// # Panics
    /// Panics if `states` names a symbol that is not a primary state.
    pub fn with_ambiguity(mut self, symbol: char, states: &str) -> Self {
        let mut list: Vec<usize> = states.chars()
            .map(|c| {
                self.symbols.iter()
                    .position(|&s| s == c)
                    .unwrap_or_else(|| panic!("Ambiguity {symbol:?} refers to unknown state {c:?}"))
            })
            .collect();
        list.sort_unstable();
        list.dedup();

        if list.len() == self.symbols.len() {
            self.missing.push(symbol);
        } else {
            self.ambiguities.push((symbol, list));
        }
        self
    }

    /// Returns the number of primary states.
    pub fn num_states(&self) -> usize {
        self.symbols.len()
    }

    /// Returns the primary state symbols.
    pub fn symbols(&self) -> &[char] {
        &self.symbols
    }

    /// Returns the meaning of `c`, or `None` for a symbol outside the alphabet.
    pub fn classify(&self, c: char) -> Option<Symbol<'_>> {
        let c = if self.case_sensitive { c } else { c.to_ascii_uppercase() };
        if let Some(state) = self.symbols.iter().position(|&s| s == c) {
            return Some(Symbol::State(state));
        }
        if c == self.gap {
            return Some(Symbol::Gap);
        }
        if self.missing.contains(&c) {
            return Some(Symbol::Missing);
        }
        self.ambiguities.iter()
            .find(|(symbol, _)| *symbol == c)
            .map(|(_, states)| match states.as_slice() {
                [single] => Symbol::State(*single),
                list => Symbol::Ambiguous(list),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_has_no_ambiguities() {
        let binary = Alphabet::binary();
        assert_eq!(binary.classify('1'), Some(Symbol::State(1)));
        assert_eq!(binary.classify('?'), Some(Symbol::Missing));
        assert_eq!(binary.classify('2'), None);
    }

    #[test]
    fn full_set_ambiguity_is_missing() {
        let alphabet = Alphabet::new("abc").with_ambiguity('x', "abc").with_ambiguity('y', "ca");
        assert_eq!(alphabet.classify('x'), Some(Symbol::Missing));
        assert_eq!(alphabet.classify('y'), Some(Symbol::Ambiguous(&[0, 2])));
        assert_eq!(alphabet.classify('A'), None);
    }

    #[test]
    fn dna_is_case_insensitive_and_reads_u_as_t() {
        let dna = Alphabet::dna();
        assert_eq!(dna.classify('u'), Some(Symbol::State(3)));
        assert_eq!(dna.classify('n'), Some(Symbol::Missing));
    }

    #[test]
    #[should_panic(expected = "listed twice")]
    fn repeated_symbol_panics() {
        Alphabet::new("AA");
    }
}
