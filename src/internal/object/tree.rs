//! The tree object: an ordered sequence of `(mode, name, child-id)` entries.

use std::fmt::Display;

use bstr::ByteSlice;

use super::{ObjectKind, ObjectTrait};
use crate::{errors::GitError, hash::ObjectHash, validate};

/// Closed set of valid tree entry modes.
pub const VALID_MODES: [&str; 5] = ["100644", "100755", "040000", "120000", "160000"];

pub fn is_valid_mode(mode: &str) -> bool {
    VALID_MODES.contains(&mode)
}

/// `160000` (gitlink/submodule): valid at parse time, never treated as a
/// tree link for walks or diffs.
pub fn is_tree_mode(mode: &str) -> bool {
    mode == "040000"
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub mode: String,
    pub name: String,
    pub id: ObjectHash,
}

impl TreeEntry {
    pub fn new(mode: impl Into<String>, name: impl Into<String>, id: ObjectHash) -> Result<Self, GitError> {
        let mode = mode.into();
        let name = name.into();
        if !is_valid_mode(&mode) {
            return Err(GitError::InvalidMode(mode));
        }
        validate::validate_entry_name(&name)?;
        Ok(TreeEntry { mode, name, id })
    }

    /// Sort key: directory entries (`040000`) sort as if their name had a
    /// trailing `/`.
    fn sort_key(&self) -> String {
        if is_tree_mode(&self.mode) {
            format!("{}/", self.name)
        } else {
            self.name.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Tree {
    pub entries: Vec<TreeEntry>,
}

impl Tree {
    /// Builds a tree from entries, applying the canonical sort and
    /// rejecting duplicate names.
    pub fn new(mut entries: Vec<TreeEntry>) -> Result<Self, GitError> {
        entries.sort_by_key(|a| a.sort_key());
        for pair in entries.windows(2) {
            if pair[0].name == pair[1].name {
                return Err(GitError::BadModeOrName(format!(
                    "duplicate tree entry name `{}`",
                    pair[0].name
                )));
            }
        }
        Ok(Tree { entries })
    }
}

impl Display for Tree {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "tree ({} entries)", self.entries.len())
    }
}

impl ObjectTrait for Tree {
    fn from_bytes(data: &[u8]) -> Result<Self, GitError> {
        let mut entries = Vec::new();
        let mut rest = data;
        while !rest.is_empty() {
            let space = rest.find_byte(b' ').ok_or_else(|| {
                GitError::BadModeOrName("missing mode/name separator".to_string())
            })?;
            let mode = rest[..space]
                .to_str()
                .map_err(|e| GitError::BadModeOrName(e.to_string()))?
                .to_string();

            let nul = rest.find_byte(b'\0').ok_or_else(|| {
                GitError::TruncatedPayload("tree entry missing NUL after name".to_string())
            })?;
            let name = rest[space + 1..nul]
                .to_str()
                .map_err(|e| GitError::BadModeOrName(e.to_string()))?
                .to_string();

            if rest.len() < nul + 1 + 20 {
                return Err(GitError::TruncatedPayload(
                    "tree entry missing 20-byte id".to_string(),
                ));
            }
            let id = ObjectHash::from_bytes(&rest[nul + 1..nul + 1 + 20])
                .map_err(GitError::InvalidIdentifier)?;

            entries.push(TreeEntry::new(mode, name, id)?);
            rest = &rest[nul + 1 + 20..];
        }
        Tree::new(entries)
    }

    fn kind(&self) -> ObjectKind {
        ObjectKind::Tree
    }

    fn to_data(&self) -> Result<Vec<u8>, GitError> {
        let sorted = Tree::new(self.entries.clone())?;
        let mut out = Vec::new();
        for entry in &sorted.entries {
            out.extend_from_slice(entry.mode.as_bytes());
            out.push(b' ');
            out.extend_from_slice(entry.name.as_bytes());
            out.push(0);
            out.extend_from_slice(entry.id.as_ref());
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u8) -> ObjectHash {
        ObjectHash::from_bytes(&[n; 20]).unwrap()
    }

    #[test]
    fn canonical_sort_places_directories_after_plain_names_alphabetically() {
        let tree = Tree::new(vec![
            TreeEntry::new("100644", "b", id(1)).unwrap(),
            TreeEntry::new("100644", "a", id(2)).unwrap(),
            TreeEntry::new("040000", "sub", id(3)).unwrap(),
        ])
        .unwrap();
        let names: Vec<_> = tree.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["a", "b", "sub"]);
    }

    #[test]
    fn round_trips_through_wire_bytes() {
        let tree = Tree::new(vec![
            TreeEntry::new("100644", "a", id(2)).unwrap(),
            TreeEntry::new("040000", "sub", id(3)).unwrap(),
        ])
        .unwrap();
        let data = tree.to_data().unwrap();
        let parsed = Tree::from_bytes(&data).unwrap();
        assert_eq!(parsed, tree);
    }

    #[test]
    fn rejects_duplicate_names() {
        let err = Tree::new(vec![
            TreeEntry::new("100644", "a", id(1)).unwrap(),
            TreeEntry::new("100644", "a", id(2)).unwrap(),
        ]);
        assert!(err.is_err());
    }

    #[test]
    fn rejects_invalid_mode() {
        assert!(TreeEntry::new("999999", "a", id(1)).is_err());
    }

    #[test]
    fn empty_tree_round_trips() {
        let tree = Tree::new(vec![]).unwrap();
        assert_eq!(tree.to_data().unwrap(), Vec::<u8>::new());
        assert_eq!(Tree::from_bytes(b"").unwrap(), tree);
    }

    #[test]
    fn gitlink_mode_is_valid_but_not_a_tree_mode() {
        assert!(is_valid_mode("160000"));
        assert!(!is_tree_mode("160000"));
    }
}
