mod common;

use common::{arb_newick, clade_set, split_set};
use prunewick::config::EngineConfig;
use prunewick::model::Tree;
use prunewick::newick::{to_newick, NewickParser, NewickStyle};
use prunewick::parser::byte_parser::ByteParser;
use prunewick::parser::ParsingErrorType;
use prunewick::parse_newick_str;
use proptest::prelude::*;
use proptest::sample::Index;

// --- TESTS NEWICK STRING PARSING ---
#[test]
fn test_basic_tree() {
    let tree = parse_newick_str("((A:1.0,B:2.0):3.0,C:4.0,D:0.5);").unwrap();

    assert_eq!(tree.num_tips(), 4);
    assert_eq!(tree.num_internals(), 2);
    assert!(tree.has_edge_lengths());
    assert!(!tree.tip_numbers_from_names());

    // Rooted at A, whose only child is the (A,B) clade
    let a = tree.root().unwrap();
    let ab = tree.subroot().unwrap();
    assert_eq!(tree[a].name(), Some("A"));
    assert_eq!(tree[a].number(), 0);
    assert_eq!(tree[ab].edge_length(), 1.0);

    // (A,B) now holds B and the old outermost clade
    let children: Vec<_> = tree.children(ab).collect();
    assert_eq!(children.len(), 2);
    let b = children[0];
    let outer = children[1];
    assert_eq!(tree[b].name(), Some("B"));
    assert_eq!(tree[outer].edge_length(), 3.0);
    assert_eq!(tree.num_children(outer), 2);
    assert_eq!(tree[tree.find_tip_by_name("D").unwrap()].number(), 3);
}

#[test]
fn test_comments_quotes_and_whitespace() {
    let newick = " [&R] ( 'Little spotted':1 , [hidden] B:2 ,\n ('Wilson''s' : 3, D:4)clade:5 ) ; ";
    let tree = parse_newick_str(newick).unwrap();

    assert_eq!(tree[tree.root().unwrap()].name(), Some("Little spotted"));
    let wilson = tree.find_tip_by_name("Wilson's").unwrap();
    assert_eq!(tree[wilson].edge_length(), 3.0);
    let clade = tree.parent(wilson).unwrap();
    assert_eq!(tree[clade].name(), Some("clade"));
}

#[test]
fn test_semicolon_is_optional() {
    let tree = parse_newick_str("(A,B,C)").unwrap();
    assert_eq!(tree.num_tips(), 3);
    assert!(!tree.has_edge_lengths());
}

#[test]
fn test_parser_from_config() {
    let config = EngineConfig::default().with_zero_based_tips(true);
    let tree = NewickParser::from_config(&config).parse_str("(0,2,1);").unwrap();
    assert_eq!(tree[tree.root().unwrap()].number(), 0);
    assert_eq!(tree.find_tip(2).map(|id| tree[id].name()), Some(Some("2")));
}

#[test]
fn test_parse_from_byte_parser() {
    let mut parser = ByteParser::from_str("(A:1,B:1,C:1); [trailing comment]");
    let tree = NewickParser::new().parse(&mut parser).unwrap();
    assert!(tree.is_valid());
    assert!(parser.is_eof());
}

// --- ERRORS ---
#[test]
fn test_error_kinds() {
    let cases: [(&str, fn(&ParsingErrorType) -> bool); 6] = [
        ("", |k| *k == ParsingErrorType::UnexpectedEOF),
        ("(A,B)[oops", |k| *k == ParsingErrorType::UnclosedComment),
        ("('A,B);", |k| *k == ParsingErrorType::UnclosedQuote),
        ("A,B;", |k| matches!(k, ParsingErrorType::InvalidNewickString(_))),
        ("(A:1,B:1e,C:1);", |k| matches!(k, ParsingErrorType::InvalidEdgeLength(_))),
        ("(A:1,B,C);", |k| *k == ParsingErrorType::PartialEdgeLengths),
    ];
    for (newick, is_expected) in cases {
        let err = NewickParser::new().parse_str(newick).unwrap_err();
        assert!(is_expected(err.kind()), "{newick:?} gave {:?}", err.kind());
    }
}

#[test]
fn test_error_reports_position() {
    let err = NewickParser::new().parse_str("((A,B),C));").unwrap_err();
    assert_eq!(err.position(), 9);
    let message = err.to_string();
    assert!(message.starts_with("Invalid newick string: too many right parentheses at position 9"));
}

#[test]
fn test_unbalanced_and_partial_lengths_fail() {
    for newick in ["(A,B,(C,D)", "(A:0.1,B)"] {
        let err = Tree::from_newick(newick).unwrap_err();
        assert!(err.is_format(), "{newick:?} gave {err}");
    }
}

#[test]
fn test_format_errors_convert() {
    let err = Tree::from_newick("((A,B),C").unwrap_err();
    assert!(err.is_format());
    assert!(!err.is_structural());
}

// --- WRITING ---
#[test]
fn test_write_round_trip() {
    let newick = "(A:0.10000,B:0.20000,(C:0.30000,'D d':0.40000)x:0.50000);";
    let tree = parse_newick_str(newick).unwrap();
    assert_eq!(to_newick(&tree, NewickStyle::Names), newick);
}

#[test]
fn test_write_numbers() {
    let tree = parse_newick_str("(3:1,1:1,2:1);").unwrap();
    assert!(tree.tip_numbers_from_names());
    assert_eq!(to_newick(&tree, NewickStyle::OneBasedNumbers), "(3:1.00000,1:1.00000,2:1.00000);");
}

/// Length of the edge at the tip numbered `number`.
fn tip_edge_length(tree: &Tree, number: usize) -> f64 {
    let tip = tree.find_tip(number).unwrap();
    match tree.parent(tip) {
        Some(_) => tree[tip].edge_length(),
        None => tree[tree[tip].left_child().unwrap()].edge_length(),
    }
}

#[test]
fn test_default_style_keeps_numbering_after_edits() {
    let mut tree = parse_newick_str("(A:0.1,B:0.2,(C:0.3,(D:0.4,E:0.6):0.7):0.5);").unwrap();
    let c_clade = tree.parent(tree.find_tip_by_name("C").unwrap()).unwrap();
    tree.reroot_at(c_clade).unwrap();
    tree.ladderize(false);

    let reread = parse_newick_str(to_newick(&tree, NewickStyle::default())).unwrap();
    for number in 0..5 {
        assert_eq!(tip_edge_length(&reread, number), tip_edge_length(&tree, number), "tip {number}");
    }
    assert_eq!(split_set(&reread), split_set(&tree));
}

#[test]
fn test_names_style_needs_rectify_after_edits() {
    let mut tree = parse_newick_str("(A:0.1,B:0.2,(C:0.3,D:0.4):0.5);").unwrap();
    tree.ladderize(false);
    let names = ["A", "B", "C", "D"];

    let mut reread = parse_newick_str(to_newick(&tree, NewickStyle::Names)).unwrap();
    assert_ne!(split_set(&reread), split_set(&tree));
    reread.rectify_numbers(&names).unwrap();
    assert_eq!(split_set(&reread), split_set(&tree));
}

proptest! {
    #[test]
    fn prop_default_style_keeps_tip_numbers(newick in arb_newick(16), pick in any::<Index>(), largest_on_right in any::<bool>()) {
        let mut tree = parse_newick_str(&newick).unwrap();
        let ids: Vec<usize> = tree.live_nodes().map(|node| node.id()).collect();
        tree.reroot_at(*pick.get(&ids)).unwrap();
        tree.ladderize(largest_on_right);

        let reread = parse_newick_str(to_newick(&tree, NewickStyle::default())).unwrap();
        prop_assert_eq!(reread.num_tips(), tree.num_tips());
        for number in 0..tree.num_tips() {
            prop_assert_eq!(tip_edge_length(&reread, number).to_bits(), tip_edge_length(&tree, number).to_bits());
        }
        prop_assert_eq!(split_set(&reread), split_set(&tree));
    }

    #[test]
    fn prop_written_tree_reads_back(newick in arb_newick(16)) {
        let tree = parse_newick_str(&newick).unwrap();
        let written = to_newick(&tree, NewickStyle::Names);
        let reread = parse_newick_str(&written).unwrap();

        prop_assert!(reread.is_valid());
        prop_assert_eq!(reread.num_tips(), tree.num_tips());
        prop_assert_eq!(clade_set(&reread), clade_set(&tree));
        prop_assert_eq!(to_newick(&reread, NewickStyle::Names), written);
    }
}
