use markdesk::tree::integrity::validate;
use markdesk::tree::{TreeState, ROOT_ID};
use proptest::prelude::*;
use proptest::test_runner::Config;

#[derive(Debug, Clone)]
enum Op {
    CreateFile(usize),
    CreateFolder(usize),
    Move(usize, usize),
    Delete(usize),
    Rename(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0_usize..64).prop_map(Op::CreateFile),
        (0_usize..64).prop_map(Op::CreateFolder),
        (0_usize..64, 0_usize..64).prop_map(|(a, b)| Op::Move(a, b)),
        (0_usize..64).prop_map(Op::Delete),
        (0_usize..64).prop_map(Op::Rename),
    ]
}

/// Pick an existing id by index, wrapping around the current node count.
fn pick(tree: &TreeState, index: usize) -> String {
    let ids: Vec<&String> = tree.nodes.keys().collect();
    ids[index % ids.len()].clone()
}

fn apply(tree: &TreeState, op: &Op, now: i64) -> TreeState {
    let result = match op {
        Op::CreateFile(i) => {
            let parent = tree.resolve_parent_folder_id(Some(&pick(tree, *i)));
            tree.create_file(&parent, "f.md", now).map(|(t, _)| t)
        }
        Op::CreateFolder(i) => {
            let parent = tree.resolve_parent_folder_id(Some(&pick(tree, *i)));
            tree.create_folder(&parent, "d", now).map(|(t, _)| t)
        }
        Op::Move(a, b) => tree.move_node(&pick(tree, *a), &pick(tree, *b), now),
        Op::Delete(i) => tree.delete_node(&pick(tree, *i), now).map(|(t, _)| t),
        Op::Rename(i) => tree.rename_node(&pick(tree, *i), "renamed", now),
    };
    // Rejected operations must leave the input usable as-is.
    result.unwrap_or_else(|_| tree.clone())
}

proptest! {
    #![proptest_config(Config::with_cases(128))]
    #[test]
    fn random_edits_keep_tree_acyclic_and_linked(ops in prop::collection::vec(op(), 1..60)) {
        let mut tree = TreeState::with_root("Notes", 0);
        for (step, op) in ops.iter().enumerate() {
            tree = apply(&tree, op, step as i64 + 1);
            let issues = validate(&tree);
            prop_assert!(issues.is_empty(), "after {:?}: {:?}", op, issues);
            prop_assert!(tree.get(ROOT_ID).is_some());
        }
    }

    #[test]
    fn delete_removes_exactly_the_subtree(ops in prop::collection::vec(op(), 1..40), victim in 0_usize..64) {
        let mut tree = TreeState::with_root("Notes", 0);
        for (step, op) in ops.iter().enumerate() {
            tree = apply(&tree, op, step as i64 + 1);
        }
        let id = pick(&tree, victim);
        prop_assume!(id != ROOT_ID);

        let files_before = tree.file_ids().len();
        let subtree_files = tree.collect_subtree_file_ids(&id).unwrap();
        let (next, removed) = tree.delete_node(&id, 1_000).unwrap();

        prop_assert_eq!(next.len(), tree.len() - removed.len());
        prop_assert_eq!(next.file_ids().len(), files_before - subtree_files.len());
        for gone in &removed {
            prop_assert!(next.get(gone).is_none());
        }
        prop_assert!(validate(&next).is_empty());
    }
}
