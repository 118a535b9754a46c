mod common;

use common::{arb_newick, edge_set};
use prunewick::model::{Side, Tree};
use prunewick::newick::{to_newick, NewickStyle};
use proptest::prelude::*;

fn kiwi_tree() -> Tree {
    Tree::from_newick("(A:1,B:2,(C:3,D:4):5);").unwrap()
}

fn clade_of(tree: &Tree, tip_name: &str) -> usize {
    tree.parent(tree.find_tip_by_name(tip_name).unwrap()).unwrap()
}

#[test]
fn test_counts_and_root() {
    let tree = kiwi_tree();
    assert_eq!(tree.num_tips(), 4);
    assert_eq!(tree.num_internals(), 2);
    assert_eq!(tree.num_nodes(), 6);

    let root = tree.root().unwrap();
    assert!(tree[root].is_tip());
    assert!(!tree[root].has_parent());
    let subroot = tree.subroot().unwrap();
    assert_eq!(tree.parent(subroot), Some(root));
    assert_eq!(tree.num_children(subroot), 2);
    assert!((tree.total_edge_length() - 15.0).abs() < 1e-12);
}

#[test]
#[should_panic]
fn test_index_out_of_bounds() {
    let tree = Tree::new();
    let _ = &tree[55];
}

#[test]
fn test_empty_tree_is_not_valid() {
    assert!(!Tree::new().is_valid());
    assert_eq!(Tree::new().root(), None);
}

#[test]
fn test_postorder_reverses_preorder() {
    let mut tree = kiwi_tree();
    let mut pre = tree.preorder_ids();
    let post = tree.postorder_ids();
    pre.reverse();
    assert_eq!(pre, post);
    assert_eq!(post.len(), 6);
}

// --- REROOTING ---
#[test]
fn test_reroot_at_internal() {
    let mut tree = kiwi_tree();
    let before = edge_set(&tree);
    let cd = clade_of(&tree, "C");

    tree.reroot_at(cd).unwrap();
    assert_eq!(tree.root(), Some(cd));
    assert_eq!(tree.subroot(), None);
    assert!(tree.is_valid());
    assert_eq!(edge_set(&tree), before);
    assert_eq!(tree.num_children(cd), 3);
}

#[test]
fn test_reroot_at_tip_and_back() {
    let mut tree = kiwi_tree();
    let before = edge_set(&tree);
    let a = tree.root().unwrap();
    let d = tree.find_tip_by_name("D").unwrap();

    tree.reroot_at(d).unwrap();
    assert_eq!(tree.subroot(), tree[d].left_child());
    assert_eq!(tree.num_children(d), 1);
    tree.reroot_at(a).unwrap();
    assert_eq!(tree.root(), Some(a));
    assert!(tree.is_valid());
    assert_eq!(edge_set(&tree), before);
}

#[test]
fn test_reroot_at_detached_node_fails() {
    let mut tree = kiwi_tree();
    let cd = clade_of(&tree, "C");
    tree.detach_subtree(cd).unwrap();
    let c = tree.find_tip_by_name("C").unwrap();
    assert!(tree.reroot_at(c).unwrap_err().is_structural());
    assert!(!tree.is_attached(c));
}

// --- DETACH / INSERT / REMOVE ---
#[test]
fn test_detach_and_insert_keep_thread() {
    let mut tree = kiwi_tree();
    tree.refresh_preorder_thread();
    let cd = clade_of(&tree, "C");
    let subroot = tree.subroot().unwrap();
    let b = tree.find_tip_by_name("B").unwrap();

    tree.detach_subtree(cd).unwrap();
    assert!(tree.is_valid());
    assert!(!tree.is_preorder_dirty());
    assert_eq!(tree.preorder_ids().len(), 3);

    tree.insert_subtree(cd, subroot, Side::LeftOf(b)).unwrap();
    assert!(!tree.is_preorder_dirty());
    assert!(tree.is_valid());
    assert_eq!(
        to_newick(&tree, NewickStyle::Names),
        "(A:1.00000,(C:3.00000,D:4.00000):5.00000,B:2.00000);"
    );
}

#[test]
fn test_insert_on_every_side() {
    for (side, expected) in [
        (Side::Leftmost, "(A,(C,D),B);"),
        (Side::Rightmost, "(A,B,(C,D));"),
    ] {
        let mut tree = Tree::from_newick("(A,B,(C,D));").unwrap();
        let cd = clade_of(&tree, "C");
        let subroot = tree.subroot().unwrap();
        tree.detach_subtree(cd).unwrap();
        tree.insert_subtree(cd, subroot, side).unwrap();
        assert!(tree.is_valid());
        assert_eq!(to_newick(&tree, NewickStyle::Names), expected);
    }

    let mut tree = Tree::from_newick("(A,B,(C,D));").unwrap();
    let c = tree.find_tip_by_name("C").unwrap();
    let d = tree.find_tip_by_name("D").unwrap();
    let cd = tree.parent(c).unwrap();
    tree.detach_subtree(c).unwrap();
    tree.insert_subtree(c, cd, Side::RightOf(d)).unwrap();
    assert!(tree.is_valid());
    assert_eq!(to_newick(&tree, NewickStyle::Names), "(A,B,(D,C));");
}

#[test]
fn test_illegal_edits() {
    let mut tree = kiwi_tree();
    let root = tree.root().unwrap();
    let subroot = tree.subroot().unwrap();
    let cd = clade_of(&tree, "C");
    let b = tree.find_tip_by_name("B").unwrap();

    assert!(tree.detach_subtree(root).unwrap_err().is_structural());
    assert!(tree.detach_subtree(subroot).unwrap_err().is_structural());
    // still attached
    assert!(tree.insert_subtree(cd, subroot, Side::Leftmost).unwrap_err().is_structural());

    tree.detach_subtree(cd).unwrap();
    assert!(tree.insert_subtree(cd, b, Side::Leftmost).unwrap_err().is_structural());
    let c = tree.find_tip_by_name("C").unwrap();
    let d = tree.find_tip_by_name("D").unwrap();
    // d still hangs below cd
    assert!(tree.insert_subtree(d, subroot, Side::Leftmost).unwrap_err().is_structural());
    // target inside the detached subtree
    assert!(tree.insert_subtree(cd, c, Side::Leftmost).unwrap_err().is_structural());
    // sibling must be a child of the target
    assert!(tree.insert_subtree(cd, subroot, Side::LeftOf(c)).unwrap_err().is_structural());
    assert!(tree.remove_subtree(root).unwrap_err().is_structural());
}

#[test]
fn test_remove_subtree_recycles_nodes() {
    let mut tree = kiwi_tree();
    let cd = clade_of(&tree, "C");
    let c = tree.find_tip_by_name("C").unwrap();

    let workspaces = tree.remove_subtree(cd).unwrap();
    assert!(workspaces.is_empty());
    assert_eq!(tree.num_nodes(), 3);
    assert!(!tree.contains(c));
    assert!(!tree.contains(cd));
    assert!(tree.is_valid());
    assert!(tree.set_edge_length(c, 1.0).unwrap_err().is_structural());
}

// --- LADDERIZE ---
#[test]
fn test_ladderize() {
    let mut tree = Tree::from_newick("(A,(B,(C,D)),E);").unwrap();
    let subroot = tree.subroot().unwrap();

    tree.ladderize(true);
    assert!(tree.is_valid());
    assert_eq!(to_newick(&tree, NewickStyle::Names), "(A,E,(B,(C,D)));");

    tree.ladderize(false);
    assert_eq!(to_newick(&tree, NewickStyle::Names), "(A,((C,D),B),E);");
    assert_eq!(tree.subroot(), Some(subroot));
}

// --- RECTIFY ---
#[test]
fn test_rectify_numbers() {
    let mut tree = Tree::from_newick("(A,B,(C,D));").unwrap();
    tree.rectify_numbers(&["D", "C", "B", "A"]).unwrap();
    assert_eq!(tree[tree.find_tip(0).unwrap()].name(), Some("D"));
    assert_eq!(tree[tree.find_tip(3).unwrap()].name(), Some("A"));
}

#[test]
fn test_rectify_numbers_leaves_tree_unchanged_on_error() {
    let mut tree = Tree::from_newick("(A,B,(C,D));").unwrap();
    assert!(tree.rectify_numbers(&["A", "B", "C"]).unwrap_err().is_format());
    assert!(tree.rectify_numbers(&["A", "B", "C", "Z"]).unwrap_err().is_format());
    assert_eq!(tree[tree.find_tip(0).unwrap()].name(), Some("A"));
    assert_eq!(tree[tree.find_tip(3).unwrap()].name(), Some("D"));
}

#[test]
fn test_rectify_names() {
    let mut tree = Tree::from_newick("(2,1,(3,4));").unwrap();
    tree.rectify_names(&["Haast", "Okarito", "Rowi", "Tokoeka"]).unwrap();
    assert_eq!(tree[tree.root().unwrap()].name(), Some("Okarito"));
    assert_eq!(tree[tree.find_tip(3).unwrap()].name(), Some("Tokoeka"));
    assert!(tree.rectify_names(&["x"]).unwrap_err().is_format());
}

#[test]
fn test_set_edge_length_rejects_negative() {
    let mut tree = kiwi_tree();
    let b = tree.find_tip_by_name("B").unwrap();
    assert!(tree.set_edge_length(b, -0.5).unwrap_err().is_structural());
    assert!(tree.set_edge_length(b, f64::NAN).unwrap_err().is_structural());
    tree.set_edge_length(b, 0.0).unwrap();
    assert_eq!(tree[b].edge_length(), 0.0);
}

proptest! {
    #[test]
    fn prop_reroot_keeps_edges(newick in arb_newick(12), picks in prop::collection::vec(any::<prop::sample::Index>(), 1..5)) {
        let mut tree = Tree::from_newick(&newick).unwrap();
        let before = edge_set(&tree);
        let total = tree.total_edge_length();
        let ids: Vec<usize> = tree.live_nodes().map(|node| node.id()).collect();

        for pick in picks {
            let target = *pick.get(&ids);
            tree.reroot_at(target).unwrap();
            prop_assert_eq!(tree.root(), Some(target));
            prop_assert!(tree.is_valid());
        }
        prop_assert_eq!(edge_set(&tree), before);
        prop_assert!((tree.total_edge_length() - total).abs() < 1e-9);
    }

    #[test]
    fn prop_ladderize_keeps_edges(newick in arb_newick(12)) {
        let mut tree = Tree::from_newick(&newick).unwrap();
        let before = edge_set(&tree);
        tree.ladderize(true);
        prop_assert!(tree.is_valid());
        prop_assert_eq!(edge_set(&tree), before);
    }
}
