//! Structural comparison of two tree identifiers, producing a path-keyed
//! change list. Distinct from a line-level diff: this walks the object
//! graph, not file contents.

use std::fmt::Display;

use crate::{
    errors::GitError,
    hash::ObjectHash,
    internal::{
        object::{ObjectKind, ObjectTrait, Tree, tree::is_tree_mode},
        store::ObjectStore,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Removed,
    Modified,
    TypeChanged,
}

impl Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let s = match self {
            ChangeKind::Added => "added",
            ChangeKind::Removed => "removed",
            ChangeKind::Modified => "modified",
            ChangeKind::TypeChanged => "type-changed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeChange {
    pub path: String,
    pub kind: ChangeKind,
}

fn load_tree(store: &dyn ObjectStore, id: &ObjectHash) -> Result<Tree, GitError> {
    match store.get(id)? {
        Some((ObjectKind::Tree, payload)) => Tree::from_bytes(&payload),
        Some(_) => Err(GitError::NotFound(format!("`{id}` is not a tree"))),
        None => Err(GitError::NotFound(id.to_string())),
    }
}

/// Diffs two trees, recursing into matching subtrees. `160000` gitlink
/// entries are never treated as tree links.
pub fn diff_trees(store: &dyn ObjectStore, left: &ObjectHash, right: &ObjectHash) -> Result<Vec<TreeChange>, GitError> {
    let mut changes = Vec::new();
    diff_into(store, left, right, "", &mut changes)?;
    changes.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(changes)
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}/{name}")
    }
}

fn diff_into(store: &dyn ObjectStore, left: &ObjectHash, right: &ObjectHash, prefix: &str, out: &mut Vec<TreeChange>) -> Result<(), GitError> {
    if left == right {
        return Ok(());
    }
    let left_tree = load_tree(store, left)?;
    let right_tree = load_tree(store, right)?;

    let mut names: Vec<&str> = left_tree
        .entries
        .iter()
        .chain(right_tree.entries.iter())
        .map(|e| e.name.as_str())
        .collect();
    names.sort();
    names.dedup();

    for name in names {
        let l = left_tree.entries.iter().find(|e| e.name == name);
        let r = right_tree.entries.iter().find(|e| e.name == name);
        let path = join(prefix, name);

        match (l, r) {
            (Some(l), Some(r)) => {
                if l.id == r.id && l.mode == r.mode {
                    continue;
                }
                let l_is_tree = is_tree_mode(&l.mode);
                let r_is_tree = is_tree_mode(&r.mode);
                if l_is_tree && r_is_tree {
                    diff_into(store, &l.id, &r.id, &path, out)?;
                } else if l_is_tree != r_is_tree {
                    out.push(TreeChange {
                        path,
                        kind: ChangeKind::TypeChanged,
                    });
                } else {
                    out.push(TreeChange {
                        path,
                        kind: ChangeKind::Modified,
                    });
                }
            }
            (Some(_), None) => out.push(TreeChange {
                path,
                kind: ChangeKind::Removed,
            }),
            (None, Some(_)) => out.push(TreeChange {
                path,
                kind: ChangeKind::Added,
            }),
            (None, None) => unreachable!(),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::internal::{
        object::TreeEntry,
        store::{MemoryObjectStore, ObjectStore},
    };

    fn put_blob(store: &MemoryObjectStore, content: &[u8]) -> ObjectHash {
        store.put(ObjectKind::Blob, content).unwrap()
    }

    fn put_tree(store: &MemoryObjectStore, entries: Vec<TreeEntry>) -> ObjectHash {
        let tree = Tree::new(entries).unwrap();
        store.put(ObjectKind::Tree, &tree.to_data().unwrap()).unwrap()
    }

    #[test]
    fn detects_added_removed_and_modified_at_top_level() {
        let store = MemoryObjectStore::new();
        let a1 = put_blob(&store, b"a1");
        let a2 = put_blob(&store, b"a2");
        let b1 = put_blob(&store, b"b1");
        let c1 = put_blob(&store, b"c1");

        let left = put_tree(
            &store,
            vec![
                TreeEntry::new("100644", "a", a1).unwrap(),
                TreeEntry::new("100644", "b", b1).unwrap(),
            ],
        );
        let right = put_tree(
            &store,
            vec![
                TreeEntry::new("100644", "a", a2).unwrap(),
                TreeEntry::new("100644", "c", c1).unwrap(),
            ],
        );

        let mut changes = diff_trees(&store, &left, &right).unwrap();
        changes.sort_by(|x, y| x.path.cmp(&y.path));
        assert_eq!(
            changes,
            vec![
                TreeChange { path: "a".to_string(), kind: ChangeKind::Modified },
                TreeChange { path: "b".to_string(), kind: ChangeKind::Removed },
                TreeChange { path: "c".to_string(), kind: ChangeKind::Added },
            ]
        );
    }

    #[test]
    fn recurses_into_matching_subtrees() {
        let store = MemoryObjectStore::new();
        let blob1 = put_blob(&store, b"x1");
        let blob2 = put_blob(&store, b"x2");
        let sub_left = put_tree(&store, vec![TreeEntry::new("100644", "file", blob1).unwrap()]);
        let sub_right = put_tree(&store, vec![TreeEntry::new("100644", "file", blob2).unwrap()]);
        let left = put_tree(&store, vec![TreeEntry::new("040000", "dir", sub_left).unwrap()]);
        let right = put_tree(&store, vec![TreeEntry::new("040000", "dir", sub_right).unwrap()]);

        let changes = diff_trees(&store, &left, &right).unwrap();
        assert_eq!(
            changes,
            vec![TreeChange { path: "dir/file".to_string(), kind: ChangeKind::Modified }]
        );
    }

    #[test]
    fn type_change_when_a_path_switches_between_blob_and_tree() {
        let store = MemoryObjectStore::new();
        let blob = put_blob(&store, b"x");
        let sub = put_tree(&store, vec![]);
        let left = put_tree(&store, vec![TreeEntry::new("100644", "a", blob).unwrap()]);
        let right = put_tree(&store, vec![TreeEntry::new("040000", "a", sub).unwrap()]);

        let changes = diff_trees(&store, &left, &right).unwrap();
        assert_eq!(
            changes,
            vec![TreeChange { path: "a".to_string(), kind: ChangeKind::TypeChanged }]
        );
    }

    #[test]
    fn identical_trees_produce_no_changes() {
        let store = MemoryObjectStore::new();
        let blob = put_blob(&store, b"x");
        let tree = put_tree(&store, vec![TreeEntry::new("100644", "a", blob).unwrap()]);
        assert_eq!(diff_trees(&store, &tree, &tree).unwrap(), Vec::new());
    }
}
