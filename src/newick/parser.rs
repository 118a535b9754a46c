//! Recursive-descent reader turning a Newick string into a [Tree].

use crate::config::{EngineConfig, DEFAULT_EDGE_LENGTH};
use crate::model::node::{BranchLength, NodeId, NodeKind};
use crate::model::tree::Tree;
use crate::parser::byte_parser::ByteParser;
use crate::parser::parsing_error::ParsingError;
use log::debug;
use std::collections::HashSet;

/// Bytes that end an unquoted node name (whitespace always does)
const NEWICK_LABEL_DELIMITERS: &[u8] = b"(),:;[";

/// Parser (configuration) for Newick tree descriptions of arbitrary out-degree.
///
/// # Configuration
/// * `with_zero_based_tips(bool)` - whether integer tip names start at 0
///   (default: they start at 1, as in Nexus files)
/// * `with_default_edge_length(f64)` - length given to edges when the
///   description has none (default 0.1)
///
/// # Tip numbers
/// The first tip decides how tips are numbered:
/// * If its name is an integer, all tip names must be distinct integers and are
///   used as tip numbers (shifted down by one unless zero-based); they must
///   cover `0..n` exactly.
/// * Otherwise tips are numbered in the order they are encountered.
///
/// Internal nodes are numbered `n, n+1, ...` in the order their closing
/// parenthesis is read, so the outermost internal node gets the last number.
///
/// # Edge lengths
/// Either every edge or no edge must carry a length. The length of the
/// outermost clade is ignored. Negative lengths are rejected.
///
/// # Rooting
/// The parsed tree is rerooted at its first tip, so the root is a tip whose
/// only child is the subroot.
///
/// # Example
/// ```
/// use prunewick::newick::NewickParser;
///
/// let tree = NewickParser::new()
///     .with_zero_based_tips(true)
///     .parse_str("(0:0.1,1:0.2,(2:0.3,3:0.4):0.5);")
///     .unwrap();
/// assert!(tree.tip_numbers_from_names());
/// assert_eq!(tree.find_tip(3).map(|id| tree[id].edge_length()), Some(0.4));
/// ```
#[derive(Debug, Clone)]
pub struct NewickParser {
    zero_based_tips: bool,
    default_edge_length: f64,
}

/// Bookkeeping while reading one tree.
#[derive(Default)]
struct BuildState {
    tree: Tree,
    /// Tips in encounter order
    tips: Vec<NodeId>,
    /// Internal nodes in closing order
    internals: Vec<NodeId>,
    /// Set once the first tip has been read
    integer_names: Option<bool>,
    tip_numbers: Vec<usize>,
    seen_numbers: HashSet<usize>,
    /// Number of non-root edges with explicit length
    num_edge_lengths: usize,
}

impl Default for NewickParser {
    fn default() -> Self {
        Self::new()
    }
}

impl NewickParser {
    /// Creates a new `NewickParser` with default settings.
    pub fn new() -> Self {
        Self { zero_based_tips: false, default_edge_length: DEFAULT_EDGE_LENGTH }
    }

    /// Creates a parser matching the reader settings of an [EngineConfig].
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new()
            .with_zero_based_tips(config.zero_based_tips)
            .with_default_edge_length(config.default_edge_length)
    }

    /// Sets whether integer tip names start at 0.
    pub fn with_zero_based_tips(mut self, zero_based: bool) -> Self {
        self.zero_based_tips = zero_based;
        self
    }

    /// Sets the length given to edges the description leaves out.
    ///
    /// # Panics
    /// Panics if `length` is negative or not finite.
    pub fn with_default_edge_length(mut self, length: f64) -> Self {
        self.default_edge_length = *BranchLength::new(length);
        self
    }

    /// Parses a single Newick string.
    pub fn parse_str(&self, newick: &str) -> Result<Tree, ParsingError> {
        let mut parser = ByteParser::from_str(newick);
        self.parse(&mut parser)
    }

    /// Parses a single Newick tree from the given [ByteParser].
    ///
    /// The terminating `;` is optional at the end of input. Anything other than
    /// whitespace and comments after the tree is an error.
    ///
    /// # Returns
    /// * `Ok(Tree)` - the tree, rooted at its first tip
    /// * `Err(ParsingError)` - if the description is malformed
    pub fn parse(&self, parser: &mut ByteParser) -> Result<Tree, ParsingError> {
        let mut state = BuildState::default();

        parser.skip_comment_and_whitespace()?;
        if parser.is_eof() {
            return Err(ParsingError::unexpected_eof(parser));
        }
        if !parser.peek_is(b'(') {
            return Err(ParsingError::invalid_newick_string(
                parser,
                "expecting '(' at start of tree description".to_string(),
            ));
        }
        let outermost = self.parse_internal(parser, &mut state, true)?;

        parser.skip_comment_and_whitespace()?;
        parser.consume_if(b';');
        parser.skip_comment_and_whitespace()?;
        match parser.peek() {
            None => {}
            Some(b')') => return Err(invalid(parser, "too many right parentheses")),
            Some(b) => {
                return Err(invalid(parser, &format!("unexpected character {:?} after end of tree", b as char)));
            }
        }

        self.finish(parser, state, outermost)
    }

    /// Parses a node: dispatches to `parse_internal` on `(`, otherwise `parse_leaf`.
    fn parse_vertex(&self, parser: &mut ByteParser, state: &mut BuildState) -> Result<NodeId, ParsingError> {
        parser.skip_comment_and_whitespace()?;
        match parser.peek() {
            None => Err(invalid(parser, "too many left parentheses")),
            Some(b'(') => self.parse_internal(parser, state, false),
            Some(b',') | Some(b')') | Some(b':') | Some(b';') => Err(invalid(parser, "missing node name")),
            Some(_) => self.parse_leaf(parser, state),
        }
    }

    /// Parses `'(' vertex (',' vertex)* ')' [name] [':' length]`.
    fn parse_internal(&self, parser: &mut ByteParser, state: &mut BuildState, outermost: bool) -> Result<NodeId, ParsingError> {
        parser.consume_if(b'(');
        let node = state.tree.new_node(NodeKind::Internal);
        self.reset_edge_length(state, node);

        loop {
            let child = self.parse_vertex(parser, state)?;
            state.tree.append_child(node, child);

            parser.skip_comment_and_whitespace()?;
            match parser.next() {
                Some(b',') => continue,
                Some(b')') => break,
                None => return Err(invalid(parser, "too many left parentheses")),
                Some(b'(') => return Err(invalid(parser, "unexpected left parenthesis")),
                Some(_) => return Err(invalid(parser, "unexpected node name")),
            }
        }

        if state.tree.num_children(node) < 2 {
            return Err(invalid(parser, "internal node has only one child"));
        }
        state.internals.push(node);

        parser.skip_comment_and_whitespace()?;
        if let Some(b) = parser.peek() {
            if !NEWICK_LABEL_DELIMITERS.contains(&b) {
                let name = parser.parse_label(NEWICK_LABEL_DELIMITERS)?;
                state.tree.set_name(node, Some(name)).map_err(|e| invalid(parser, &e.to_string()))?;
            }
        }

        self.parse_branch_length(parser, state, node, outermost)?;
        Ok(node)
    }

    /// Parses `name [':' length]` and assigns the tip its number.
    fn parse_leaf(&self, parser: &mut ByteParser, state: &mut BuildState) -> Result<NodeId, ParsingError> {
        let name = parser.parse_label(NEWICK_LABEL_DELIMITERS)?;
        if name.is_empty() {
            return Err(invalid(parser, "missing node name"));
        }

        let number = self.tip_number(parser, state, &name)?;
        let node = state.tree.new_node(NodeKind::Tip);
        self.reset_edge_length(state, node);
        state.tree.set_number(node, number);
        state.tree.set_name(node, Some(name)).map_err(|e| invalid(parser, &e.to_string()))?;
        state.tips.push(node);
        state.tip_numbers.push(number);

        self.parse_branch_length(parser, state, node, false)?;
        Ok(node)
    }

    /// Returns the (unshifted) number of the next tip.
    fn tip_number(&self, parser: &ByteParser, state: &mut BuildState, name: &str) -> Result<usize, ParsingError> {
        let parsed = name.parse::<usize>().ok();
        let integer_names = *state.integer_names.get_or_insert(parsed.is_some());

        if !integer_names {
            return Ok(state.tips.len());
        }
        let Some(number) = parsed else {
            return Err(ParsingError::invalid_tip_numbering(
                parser,
                format!("tip name '{name}' is not a number but earlier tip names were"),
            ));
        };
        if !state.seen_numbers.insert(number) {
            return Err(ParsingError::invalid_tip_numbering(parser, format!("tip number {number} used more than once")));
        }
        Ok(number)
    }

    /// Parses optional `':' number`; the length of the outermost clade is ignored.
    fn parse_branch_length(&self, parser: &mut ByteParser, state: &mut BuildState, node: NodeId, outermost: bool) -> Result<(), ParsingError> {
        parser.skip_comment_and_whitespace()?;
        if !parser.consume_if(b':') {
            return Ok(());
        }
        parser.skip_comment_and_whitespace()?;

        let token = parser.parse_number_token();
        if token.is_empty() {
            let found = parser.peek().map(|b| b as char);
            return Err(ParsingError::invalid_edge_length(
                parser,
                format!("invalid branch length character {found:?}"),
            ));
        }
        let value: f64 = token.parse()
            .map_err(|_| ParsingError::invalid_edge_length(parser, format!("invalid branch length '{token}'")))?;
        let Some(length) = BranchLength::try_new(value) else {
            return Err(ParsingError::invalid_edge_length(parser, format!("branch length {value} is negative or not finite")));
        };

        if !outermost {
            state.tree.node_mut(node).edge_length = length;
            state.num_edge_lengths += 1;
        }
        Ok(())
    }

    fn reset_edge_length(&self, state: &mut BuildState, node: NodeId) {
        state.tree.node_mut(node).edge_length = BranchLength::new(self.default_edge_length);
    }

    /// Checks edge lengths and tip numbers, numbers internals and reroots at the first tip.
    fn finish(&self, parser: &ByteParser, mut state: BuildState, outermost: NodeId) -> Result<Tree, ParsingError> {
        let num_tips = state.tips.len();
        let num_edges = num_tips + state.internals.len() - 1;
        if state.num_edge_lengths != 0 && state.num_edge_lengths != num_edges {
            return Err(ParsingError::partial_edge_lengths(parser));
        }

        let integer_names = state.integer_names.unwrap_or(false);
        if integer_names {
            if !self.zero_based_tips {
                if state.seen_numbers.contains(&0) {
                    return Err(ParsingError::invalid_tip_numbering(
                        parser,
                        "tip number 0 is not allowed when tips are numbered from 1".to_string(),
                    ));
                }
                for (tip, number) in state.tips.iter().zip(state.tip_numbers.iter_mut()) {
                    *number -= 1;
                    state.tree.set_number(*tip, *number);
                }
            }
            if let Some(&number) = state.tip_numbers.iter().find(|&&number| number >= num_tips) {
                let shown = if self.zero_based_tips { number } else { number + 1 };
                return Err(ParsingError::invalid_tip_numbering(
                    parser,
                    format!("tip number {shown} is out of range for a tree with {num_tips} tips"),
                ));
            }
        }

        for (i, &internal) in state.internals.iter().enumerate() {
            state.tree.set_number(internal, num_tips + i);
        }

        let mut tree = state.tree;
        tree.set_root(outermost);
        tree.set_has_edge_lengths(state.num_edge_lengths > 0);
        tree.set_numbers_from_names(integer_names);
        if let Some(&first_tip) = state.tips.first() {
            tree.reroot_at(first_tip).map_err(|e| invalid(parser, &e.to_string()))?;
        }
        tree.refresh_preorder_thread();

        debug!(
            "parsed tree with {num_tips} tips and {} internal nodes (edge lengths: {})",
            tree.num_internals(),
            tree.has_edge_lengths()
        );
        Ok(tree)
    }
}

fn invalid(parser: &ByteParser, msg: &str) -> ParsingError {
    ParsingError::invalid_newick_string(parser, msg.to_string())
}
