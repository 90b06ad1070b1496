//! Trees and the shared table from several threads

use kdl_sitter::parser::{SyntaxError, kdl_table};
use kdl_sitter::{Edit, TextSize, Tree, parse, reparse};
use rayon::prelude::*;

use crate::helpers::kdl_fixtures::*;

#[test]
fn test_public_types_are_thread_safe() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Tree>();
    assert_send_sync::<SyntaxError>();
    assert_send_sync::<Edit>();
    assert_send_sync::<kdl_sitter::parser::ParseTable>();
}

#[test]
fn test_parallel_parses_share_one_table() {
    let documents: Vec<String> = (0..64).map(|i| many_nodes(i % 8 + 1)).collect();
    let table = kdl_table() as *const _ as usize;

    let results: Vec<_> = documents
        .par_iter()
        .map(|text| {
            let tree = parse(text);
            (tree.has_error(), tree.root().child_count(), kdl_table() as *const _ as usize)
        })
        .collect();

    for (i, (has_error, nodes, seen)) in results.into_iter().enumerate() {
        assert!(!has_error);
        assert_eq!(nodes, i % 8 + 1);
        assert_eq!(seen, table);
    }
}

#[test]
fn test_one_tree_reparsed_on_many_threads() {
    let old = many_nodes(50);
    let tree = parse(&old);

    let outcomes: Vec<bool> = (0..50u32)
        .into_par_iter()
        .map(|i| {
            // Insert a node between existing ones
            let at = old
                .match_indices('\n')
                .nth(i as usize)
                .map(|(at, _)| at as u32 + 1)
                .unwrap_or(0);
            let mut new = old.clone();
            new.insert_str(at as usize, "inserted\n");
            let edit = Edit::insert(TextSize::new(at), "inserted\n");
            let reparsed = reparse(&tree, &[edit], &new).unwrap();
            reparsed.same_shape(&parse(&new)) && reparsed.stats().reused_nodes >= 48
        })
        .collect();

    assert!(outcomes.into_iter().all(|ok| ok));
    assert_eq!(tree.text(), old);
}

#[test]
fn test_broken_inputs_in_parallel_match_sequential() {
    let sequential: Vec<String> = BROKEN.iter().map(|text| parse(text).debug_dump()).collect();
    let parallel: Vec<String> = BROKEN.par_iter().map(|text| parse(text).debug_dump()).collect();
    assert_eq!(sequential, parallel);
}
