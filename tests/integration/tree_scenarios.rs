use markdesk::error::TreeError;
use markdesk::tree::integrity::{self, validate};
use markdesk::tree::traversal::{find_by_path, first_file_id};
use markdesk::tree::{TreeState, ROOT_ID};

fn names(tree: &TreeState, folder: &str) -> Vec<String> {
    tree.list_children(folder)
        .unwrap()
        .into_iter()
        .map(|n| n.name.clone())
        .collect()
}

#[test]
fn create_move_rename_delete_keeps_tree_consistent() {
    let tree = TreeState::with_root("Notes", 1);
    let (tree, work) = tree.create_folder(ROOT_ID, "work", 2).unwrap();
    let (tree, home) = tree.create_folder(ROOT_ID, "home", 3).unwrap();
    let (tree, plan) = tree.create_file(&work, "plan.md", 4).unwrap();
    let (tree, _todo) = tree.create_file(&work, "todo.md", 5).unwrap();

    let tree = tree.move_node(&plan, &home, 6).unwrap();
    assert_eq!(names(&tree, &work), vec!["todo.md"]);
    assert_eq!(names(&tree, &home), vec!["plan.md"]);
    assert_eq!(tree.node(&plan).unwrap().parent_id.as_deref(), Some(home.as_str()));

    let tree = tree.rename_node(&home, "personal", 7).unwrap();
    assert!(find_by_path(&tree, "personal/plan.md").is_some());

    let (tree, removed) = tree.delete_node(&work, 8).unwrap();
    assert_eq!(removed.len(), 2);
    assert_eq!(removed[0], work);
    assert!(validate(&tree).is_empty());
    assert_eq!(first_file_id(&tree), Some(plan));
}

#[test]
fn children_list_folders_first_then_by_name() {
    let tree = TreeState::with_root("Notes", 1);
    let (tree, _) = tree.create_file(ROOT_ID, "b.md", 2).unwrap();
    let (tree, _) = tree.create_folder(ROOT_ID, "z", 3).unwrap();
    let (tree, _) = tree.create_file(ROOT_ID, "a.md", 4).unwrap();
    let (tree, _) = tree.create_folder(ROOT_ID, "m", 5).unwrap();
    assert_eq!(names(&tree, ROOT_ID), vec!["m", "z", "a.md", "b.md"]);
}

#[test]
fn failed_mutations_leave_tree_untouched() {
    let tree = TreeState::with_root("Notes", 1);
    let (tree, outer) = tree.create_folder(ROOT_ID, "outer", 2).unwrap();
    let (tree, inner) = tree.create_folder(&outer, "inner", 3).unwrap();
    let (tree, file) = tree.create_file(&inner, "x.md", 4).unwrap();
    let before = tree.clone();

    assert!(matches!(
        tree.move_node(&outer, &outer, 5),
        Err(TreeError::CyclicMove { .. })
    ));
    assert_eq!(tree, before);
    assert!(matches!(
        tree.move_node(&outer, &inner, 5),
        Err(TreeError::CyclicMove { .. })
    ));
    assert!(matches!(
        tree.move_node(&outer, &file, 5),
        Err(TreeError::InvalidDestination(_))
    ));
    assert!(matches!(
        tree.create_file(&file, "y.md", 5),
        Err(TreeError::InvalidParent(_))
    ));
    assert_eq!(tree.delete_node(ROOT_ID, 5), Err(TreeError::CannotDeleteRoot));
    assert_eq!(tree.move_node(ROOT_ID, &outer, 5), Err(TreeError::CannotMoveRoot));
    assert!(matches!(
        tree.rename_node("missing", "x", 5),
        Err(TreeError::NotFound(_))
    ));
    assert_eq!(tree, before);
}

#[test]
fn move_within_same_folder_keeps_single_child_entry() {
    let tree = TreeState::with_root("Notes", 1);
    let (tree, folder) = tree.create_folder(ROOT_ID, "f", 2).unwrap();
    let (tree, file) = tree.create_file(&folder, "a.md", 3).unwrap();

    let tree = tree.move_node(&file, &folder, 4).unwrap();
    let folder_node = tree.node(&folder).unwrap();
    assert_eq!(folder_node.children_ids, vec![file]);
    assert!(integrity::is_consistent(&tree));
}

#[test]
fn first_file_prefers_shallow_files() {
    let tree = TreeState::with_root("Notes", 1);
    let (tree, deep) = tree.create_folder(ROOT_ID, "a", 2).unwrap();
    let (tree, _) = tree.create_file(&deep, "nested.md", 3).unwrap();
    let (tree, top) = tree.create_file(ROOT_ID, "top.md", 4).unwrap();
    assert_eq!(first_file_id(&tree), Some(top));
}

#[test]
fn selection_resolves_to_containing_folder() {
    let tree = TreeState::with_root("Notes", 1);
    let (tree, folder) = tree.create_folder(ROOT_ID, "f", 2).unwrap();
    let (tree, file) = tree.create_file(&folder, "a.md", 3).unwrap();

    assert_eq!(tree.resolve_parent_folder_id(Some(&file)), folder);
    assert_eq!(tree.resolve_parent_folder_id(Some(&folder)), folder);
    assert_eq!(tree.resolve_parent_folder_id(Some("gone")), ROOT_ID);
    assert_eq!(tree.resolve_parent_folder_id(None), ROOT_ID);
}
