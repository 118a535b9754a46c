//! Newick serialization of [Tree]s.

use crate::model::node::NodeId;
use crate::model::tree::Tree;

/// Extra buffer in Newick string length/capacity estimate
const BUFFER_CHARS: usize = 10;

/// Characters that force a label to be quoted
const QUOTE_TRIGGERS: &[char] = &['(', ')', '[', ']', '\'', ':', ';', ',', ' ', '\t', '\n', '\r'];

/// Style for serializing a tree to Newick format,
/// controlling how tips are represented in the output string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NewickStyle {
    /// Use names if reading the string back with a default [NewickParser]
    /// assigns every tip its current number, otherwise behave like
    /// [OneBasedNumbers](Self::OneBasedNumbers)
    ///
    /// [NewickParser]: crate::newick::NewickParser
    #[default]
    KeepNumbering,
    /// Use node names; unnamed tips fall back to their 1-based number.
    /// Reading the string back numbers tips in the order they appear, so
    /// after edits that reorder tips, call
    /// [Tree::rectify_numbers] on the result to restore the numbering
    Names,
    /// Use 1-based tip numbers (1, 2, 3, ...), as in Nexus files; internal
    /// names are omitted
    OneBasedNumbers,
}

/// Returns the Newick representation of a tree with closing semicolon.
///
/// A tip root is written as the first element of the outermost clade, joined
/// to the subroot's children by the subroot's edge, so reading the string back
/// yields the same rooting. Edge lengths are written with five decimals if the
/// tree has edge lengths.
///
/// With [NewickStyle::KeepNumbering], reading the result back reproduces
/// the tip numbers of `tree`, even after rerooting or ladderizing changed the
/// order in which tips are written.
///
/// # Example
/// ```
/// use prunewick::model::Tree;
/// use prunewick::newick::{to_newick, NewickStyle};
///
/// let tree = Tree::from_newick("(A:0.1,B:0.2,(C:0.3,D:0.4):0.5);").unwrap();
/// assert_eq!(
///     to_newick(&tree, NewickStyle::Names),
///     "(A:0.10000,B:0.20000,(C:0.30000,D:0.40000):0.50000);"
/// );
/// assert_eq!(to_newick(&tree, NewickStyle::OneBasedNumbers), "(1:0.10000,2:0.20000,(3:0.30000,4:0.40000):0.50000);");
/// assert_eq!(to_newick(&tree, NewickStyle::default()), to_newick(&tree, NewickStyle::Names));
/// ```
pub fn to_newick(tree: &Tree, style: NewickStyle) -> String {
    let style = match style {
        NewickStyle::KeepNumbering if names_keep_numbering(tree) => NewickStyle::Names,
        NewickStyle::KeepNumbering => NewickStyle::OneBasedNumbers,
        other => other,
    };

    let mut newick = String::with_capacity(estimate_newick_len(tree));
    let Some(root) = tree.root() else {
        newick.push(';');
        return newick;
    };

    match tree.subroot() {
        Some(subroot) => {
            // Tip root and the subroot's children form the outermost clade
            newick.push('(');
            push_tip_label(tree, root, style, &mut newick);
            push_edge_length(tree, subroot, &mut newick);
            for child in tree.children(subroot) {
                newick.push(',');
                build_newick(tree, child, style, &mut newick);
            }
            newick.push(')');
            push_internal_name(tree, subroot, style, &mut newick);
        }
        None if tree[root].is_tip() => push_tip_label(tree, root, style, &mut newick),
        None => {
            push_children(tree, root, style, &mut newick);
            push_internal_name(tree, root, style, &mut newick);
        }
    }

    newick.push(';');
    newick
}

/// Quotes a label if it contains Newick punctuation or whitespace, doubling
/// any single quotes; returns it unchanged otherwise.
pub fn escape_label(label: &str) -> String {
    if !label.is_empty() && !label.contains(QUOTE_TRIGGERS) {
        return label.to_string();
    }
    format!("'{}'", label.replace('\'', "''"))
}

/// Whether tips written by name get their current numbers back from a
/// default reader: integer names must spell `number + 1`, other names must
/// appear in number order.
fn names_keep_numbering(tree: &Tree) -> bool {
    let tips = tips_in_writing_order(tree);
    let Some(names) = tips.iter().map(|&id| tree[id].name()).collect::<Option<Vec<&str>>>() else {
        return false;
    };
    if names.iter().any(|name| name.parse::<usize>().is_ok()) {
        tips.iter().zip(&names).all(|(&id, name)| *name == (tree[id].number() + 1).to_string())
    } else {
        tips.iter().enumerate().all(|(i, &id)| tree[id].number() == i)
    }
}

/// Tips in the order [to_newick] writes them (preorder from the root).
fn tips_in_writing_order(tree: &Tree) -> Vec<NodeId> {
    let mut tips = Vec::with_capacity(tree.num_tips());
    let mut stack: Vec<NodeId> = tree.root().into_iter().collect();
    while let Some(id) = stack.pop() {
        if tree[id].is_tip() {
            tips.push(id);
        }
        let first_stack_pos = stack.len();
        stack.extend(tree.children(id));
        stack[first_stack_pos..].reverse();
    }
    tips
}

// Recursive helper for building the Newick string
fn build_newick(tree: &Tree, id: NodeId, style: NewickStyle, newick: &mut String) {
    if tree[id].is_tip() {
        push_tip_label(tree, id, style, newick);
    } else {
        push_children(tree, id, style, newick);
        push_internal_name(tree, id, style, newick);
    }
    push_edge_length(tree, id, newick);
}

fn push_children(tree: &Tree, id: NodeId, style: NewickStyle, newick: &mut String) {
    newick.push('(');
    for (i, child) in tree.children(id).enumerate() {
        if i > 0 {
            newick.push(',');
        }
        build_newick(tree, child, style, newick);
    }
    newick.push(')');
}

fn push_tip_label(tree: &Tree, id: NodeId, style: NewickStyle, newick: &mut String) {
    let node = &tree[id];
    match (style, node.name()) {
        (NewickStyle::Names, Some(name)) => newick.push_str(&escape_label(name)),
        _ => newick.push_str(&(node.number() + 1).to_string()),
    }
}

fn push_internal_name(tree: &Tree, id: NodeId, style: NewickStyle, newick: &mut String) {
    if style == NewickStyle::Names {
        if let Some(name) = tree[id].name() {
            newick.push_str(&escape_label(name));
        }
    }
}

fn push_edge_length(tree: &Tree, id: NodeId, newick: &mut String) {
    if tree.has_edge_lengths() {
        newick.push_str(&format!(":{:.5}", tree[id].edge_length()));
    }
}

/// Estimates the length of the Newick string, to pre-allocate its capacity.
fn estimate_newick_len(tree: &Tree) -> usize {
    // "(,)" ~= 3 chars per internal node, ":0.12345" = 8 chars per edge
    const INTERNAL_NODE_CHARS: usize = 3;
    const EDGE_LENGTH_CHARS: usize = 8;

    let labels: usize = tree.live_nodes()
        .map(|node| node.name().map_or(0, str::len))
        .sum();
    let edges = if tree.has_edge_lengths() { tree.num_nodes() * EDGE_LENGTH_CHARS } else { 0 };
    tree.num_internals() * INTERNAL_NODE_CHARS + labels + edges + BUFFER_CHARS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_label_quotes_only_when_needed() {
        assert_eq!(escape_label("Apteryx_haastii"), "Apteryx_haastii");
        assert_eq!(escape_label("Little spotted"), "'Little spotted'");
        assert_eq!(escape_label("Wilson's"), "'Wilson''s'");
        assert_eq!(escape_label(""), "''");
    }

    #[test]
    fn lengths_omitted_when_tree_has_none() {
        let tree = Tree::from_newick("(A,B,(C,D)x);").unwrap();
        assert_eq!(to_newick(&tree, NewickStyle::Names), "(A,B,(C,D)x);");
        assert_eq!(to_newick(&tree, NewickStyle::OneBasedNumbers), "(1,2,(3,4));");
    }

    #[test]
    fn default_style_switches_to_numbers_when_tips_are_reordered() {
        let mut tree = Tree::from_newick("(A,B,(C,D));").unwrap();
        assert_eq!(to_newick(&tree, NewickStyle::default()), "(A,B,(C,D));");

        tree.ladderize(false);
        assert_eq!(to_newick(&tree, NewickStyle::Names), "(A,(C,D),B);");
        assert_eq!(to_newick(&tree, NewickStyle::default()), "(1,(3,4),2);");
    }

    #[test]
    fn default_style_keeps_integer_names_that_match() {
        let tree = Tree::from_newick("(3,1,(2,4));").unwrap();
        assert_eq!(to_newick(&tree, NewickStyle::default()), "(3,1,(2,4));");

        let mut renumbered = Tree::from_newick("(3,1,(2,4));").unwrap();
        renumbered.rectify_numbers(&["3", "1", "2", "4"]).unwrap();
        assert_eq!(to_newick(&renumbered, NewickStyle::default()), "(1,2,(3,4));");
    }

    #[test]
    fn internal_root_written_without_root_length() {
        let mut tree = Tree::from_newick("(A:1,B:2,(C:3,D:4):5);").unwrap();
        let cd = tree.parent(tree.find_tip_by_name("C").unwrap()).unwrap();
        tree.reroot_at(cd).unwrap();
        assert_eq!(
            to_newick(&tree, NewickStyle::Names),
            "(C:3.00000,D:4.00000,(B:2.00000,A:1.00000):5.00000);"
        );
    }
}
