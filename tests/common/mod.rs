//! Shared helpers for the integration tests.
#![allow(dead_code)]

use prunewick::model::Tree;
use proptest::prelude::*;
use proptest::sample::Index;
use std::collections::BTreeSet;

/// Newick string of a random tree with `num_tips` tips `t0, t1, ...`: clades
/// are merged pairwise until three remain, which form the outermost clade.
/// Lengths are multiples of 0.001.
pub fn random_newick(num_tips: usize, merges: &[(Index, Index, u32)], tip_lengths: &[u32]) -> String {
    let mut clades: Vec<String> = (0..num_tips)
        .map(|i| format!("t{i}:{}", thousandths(tip_lengths[i])))
        .collect();
    for (a, b, length) in merges {
        let first = clades.swap_remove(a.index(clades.len()));
        let second = clades.swap_remove(b.index(clades.len()));
        clades.push(format!("({first},{second}):{}", thousandths(*length)));
    }
    format!("({});", clades.join(","))
}

fn thousandths(k: u32) -> String {
    format!("{:.3}", f64::from(k) / 1000.0)
}

/// Strategy for [random_newick] with 4 to `max_tips` tips.
pub fn arb_newick(max_tips: usize) -> impl Strategy<Value = String> {
    (4..=max_tips).prop_flat_map(|n| {
        (
            prop::collection::vec((any::<Index>(), any::<Index>(), 1u32..1000), n - 3),
            prop::collection::vec(1u32..1000, n),
        )
            .prop_map(move |(merges, lengths)| random_newick(n, &merges, &lengths))
    })
}

/// Undirected edges as (smaller number, larger number, length bits).
pub fn edge_set(tree: &Tree) -> BTreeSet<(usize, usize, u64)> {
    tree.live_nodes()
        .filter_map(|node| {
            let parent = node.parent()?;
            let (a, b) = (node.number(), tree[parent].number());
            Some((a.min(b), a.max(b), node.edge_length().to_bits()))
        })
        .collect()
}

/// Edges as (sorted tip names below the edge, length bits); comparable across
/// trees with the same root tip.
pub fn clade_set(tree: &Tree) -> BTreeSet<(Vec<String>, u64)> {
    let mut clades = BTreeSet::new();
    if let Some(root) = tree.root() {
        collect_clades(tree, root, &mut clades);
    }
    clades
}

fn collect_clades(tree: &Tree, id: usize, clades: &mut BTreeSet<(Vec<String>, u64)>) -> Vec<String> {
    let mut names: Vec<String> = tree[id].name()
        .filter(|_| tree[id].is_tip())
        .map(str::to_string)
        .into_iter()
        .collect();
    for child in tree.children(id) {
        names.extend(collect_clades(tree, child, clades));
    }
    names.sort();
    if tree.parent(id).is_some() {
        clades.insert((names.clone(), tree[id].edge_length().to_bits()));
    }
    names
}

/// Edges as (sorted tip numbers on the side without tip 0, length bits);
/// comparable across trees rooted anywhere.
pub fn split_set(tree: &Tree) -> BTreeSet<(Vec<usize>, u64)> {
    let mut splits = BTreeSet::new();
    if let Some(root) = tree.root() {
        collect_splits(tree, root, tree.num_tips(), &mut splits);
    }
    splits
}

fn collect_splits(tree: &Tree, id: usize, num_tips: usize, splits: &mut BTreeSet<(Vec<usize>, u64)>) -> Vec<usize> {
    let mut below: Vec<usize> = if tree[id].is_tip() { vec![tree[id].number()] } else { Vec::new() };
    for child in tree.children(id) {
        below.extend(collect_splits(tree, child, num_tips, splits));
    }
    if tree.parent(id).is_some() {
        let side: Vec<usize> = if below.contains(&0) {
            (0..num_tips).filter(|n| !below.contains(n)).collect()
        } else {
            let mut side = below.clone();
            side.sort_unstable();
            side
        };
        splits.insert((side, tree[id].edge_length().to_bits()));
    }
    below
}
