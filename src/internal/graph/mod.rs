//! Read-only queries over the DAG formed by commits and their parent
//! pointers: ancestor enumeration, merge-base, and fork-point.

use std::collections::{HashSet, VecDeque};

use crate::{
    errors::GitError,
    hash::ObjectHash,
    internal::{
        object::{ObjectKind, ObjectTrait},
        store::ObjectStore,
    },
};

fn parents_of(store: &dyn ObjectStore, id: &ObjectHash) -> Result<Option<Vec<ObjectHash>>, GitError> {
    match store.get(id)? {
        Some((ObjectKind::Commit, payload)) => {
            let commit = crate::internal::object::Commit::from_bytes(&payload)?;
            Ok(Some(commit.parent_ids))
        }
        Some(_) => Err(GitError::NotFound(format!(
            "`{id}` exists but is not a commit"
        ))),
        None => Ok(None),
    }
}

/// Breadth-first from `start`, returning every reachable commit
/// (including `start`). Commits missing from the store end the walk at
/// that frontier without error.
pub fn ancestors(store: &dyn ObjectStore, start: &ObjectHash) -> Result<HashSet<ObjectHash>, GitError> {
    let mut seen = HashSet::new();
    let mut queue = VecDeque::new();
    seen.insert(*start);
    queue.push_back(*start);

    while let Some(id) = queue.pop_front() {
        if let Some(parents) = parents_of(store, &id)? {
            for parent in parents {
                if seen.insert(parent) {
                    queue.push_back(parent);
                }
            }
        }
    }
    Ok(seen)
}

/// True iff `a == b` or `a` is reachable from `b` through parent edges.
pub fn is_ancestor(store: &dyn ObjectStore, a: &ObjectHash, b: &ObjectHash) -> Result<bool, GitError> {
    if a == b {
        return Ok(true);
    }
    Ok(ancestors(store, b)?.contains(a))
}

/// Shortest path length from `b` to `a` through parent edges; `0` if
/// equal, `-1` if `a` is not an ancestor of `b`.
pub fn ancestor_distance(store: &dyn ObjectStore, a: &ObjectHash, b: &ObjectHash) -> Result<i64, GitError> {
    if a == b {
        return Ok(0);
    }
    let mut seen = HashSet::new();
    let mut queue = VecDeque::new();
    seen.insert(*b);
    queue.push_back((*b, 0i64));

    while let Some((id, dist)) = queue.pop_front() {
        if let Some(parents) = parents_of(store, &id)? {
            for parent in parents {
                if parent == *a {
                    return Ok(dist + 1);
                }
                if seen.insert(parent) {
                    queue.push_back((parent, dist + 1));
                }
            }
        }
    }
    Ok(-1)
}

/// Returns the subset of `commits` that are not an ancestor of any other
/// input.
pub fn independent(store: &dyn ObjectStore, commits: &[ObjectHash]) -> Result<Vec<ObjectHash>, GitError> {
    let mut out = Vec::new();
    for (i, candidate) in commits.iter().enumerate() {
        let mut dominated = false;
        for (j, other) in commits.iter().enumerate() {
            if i != j && is_ancestor(store, candidate, other)? {
                dominated = true;
                break;
            }
        }
        if !dominated {
            out.push(*candidate);
        }
    }
    Ok(out)
}

/// Maximal common ancestors of two commits: `ancestors(a) ∩ ancestors(b)`,
/// filtered to elements not an ancestor of any other common ancestor.
pub fn merge_base_two(store: &dyn ObjectStore, a: &ObjectHash, b: &ObjectHash) -> Result<Vec<ObjectHash>, GitError> {
    let ancestors_a = ancestors(store, a)?;
    let ancestors_b = ancestors(store, b)?;
    let common: Vec<ObjectHash> = ancestors_a.intersection(&ancestors_b).copied().collect();
    independent(store, &common)
}

#[derive(Default)]
pub struct MergeBaseOptions {
    pub all: bool,
    pub recursive: bool,
}

/// Computes merge bases across two or more commits.
///
/// Two inputs: the maximal common-ancestor set, reduced per `options`.
/// More than two: folds pairwise (octopus) — merge bases of the first two,
/// then for each further input, unions the merge bases between each
/// current base and the new input. An empty result at any step means no
/// common history.
pub fn merge_base(store: &dyn ObjectStore, commits: &[ObjectHash], options: &MergeBaseOptions) -> Result<Vec<ObjectHash>, GitError> {
    if commits.len() < 2 {
        return Ok(commits.to_vec());
    }

    let mut bases = merge_base_two(store, &commits[0], &commits[1])?;
    for next in &commits[2..] {
        let mut unioned = HashSet::new();
        for base in &bases {
            for b in merge_base_two(store, base, next)? {
                unioned.insert(b);
            }
        }
        bases = unioned.into_iter().collect();
        if bases.is_empty() {
            return Ok(Vec::new());
        }
    }

    if options.recursive && bases.len() > 1 {
        bases = recursive_reduce(store, bases)?;
    }

    finalize_bases(bases, options.all)
}

fn recursive_reduce(store: &dyn ObjectStore, mut bases: Vec<ObjectHash>) -> Result<Vec<ObjectHash>, GitError> {
    bases.sort();
    while bases.len() > 1 {
        let a = bases.remove(0);
        let b = bases.remove(0);
        let reduced = merge_base_two(store, &a, &b)?;
        if reduced.is_empty() {
            bases.push(a);
            continue;
        }
        bases.extend(reduced);
        bases.sort();
        bases.dedup();
    }
    Ok(bases)
}

fn finalize_bases(mut bases: Vec<ObjectHash>, all: bool) -> Result<Vec<ObjectHash>, GitError> {
    bases.sort();
    if all || bases.len() <= 1 {
        Ok(bases)
    } else {
        Ok(vec![bases[0]])
    }
}

/// The merge base of `reference` and `base`, plus the length of the
/// first-parent path on `reference` back to it.
pub fn fork_point(store: &dyn ObjectStore, reference: &ObjectHash, base: &ObjectHash) -> Result<Option<(ObjectHash, i64)>, GitError> {
    let bases = merge_base_two(store, reference, base)?;
    let Some(&point) = bases.first() else {
        return Ok(None);
    };
    let mut distance = 0i64;
    let mut current = *reference;
    loop {
        if current == point {
            return Ok(Some((point, distance)));
        }
        match parents_of(store, &current)? {
            Some(parents) if !parents.is_empty() => {
                current = parents[0];
                distance += 1;
            }
            _ => return Ok(Some((point, ancestor_distance(store, &point, reference)?))),
        }
    }
}

/// True iff every pair in `commits` shares at least one common ancestor.
pub fn has_common_history(store: &dyn ObjectStore, commits: &[ObjectHash]) -> Result<bool, GitError> {
    for i in 0..commits.len() {
        for j in (i + 1)..commits.len() {
            if merge_base_two(store, &commits[i], &commits[j])?.is_empty() {
                return Ok(false);
            }
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::internal::{
        object::{Commit, ObjectKind, Signature},
        store::{MemoryObjectStore, ObjectStore},
    };

    fn commit(store: &MemoryObjectStore, parents: Vec<ObjectHash>, seed: &str) -> ObjectHash {
        let sig = Signature::new("A", "a@x", 1700000000, "+0000");
        let tree = ObjectHash::from_bytes(&[0u8; 20]).unwrap();
        let c = Commit::new(tree, parents, sig.clone(), sig, seed);
        let data = c.to_data().unwrap();
        store.put(ObjectKind::Commit, &data).unwrap()
    }

    #[test]
    fn is_ancestor_true_for_self_and_linear_history() {
        let store = MemoryObjectStore::new();
        let a = commit(&store, vec![], "a");
        let b = commit(&store, vec![a], "b");
        assert!(is_ancestor(&store, &a, &a).unwrap());
        assert!(is_ancestor(&store, &a, &b).unwrap());
        assert!(!is_ancestor(&store, &b, &a).unwrap());
    }

    #[test]
    fn ancestor_distance_counts_hops_and_minus_one_when_unrelated() {
        let store = MemoryObjectStore::new();
        let a = commit(&store, vec![], "a");
        let b = commit(&store, vec![a], "b");
        let c = commit(&store, vec![b], "c");
        assert_eq!(ancestor_distance(&store, &a, &c).unwrap(), 2);
        assert_eq!(ancestor_distance(&store, &c, &a).unwrap(), -1);
    }

    #[test]
    fn criss_cross_merge_base_returns_both_maximal_bases() {
        let store = MemoryObjectStore::new();
        let a = commit(&store, vec![], "a");
        let b = commit(&store, vec![a], "b");
        let c = commit(&store, vec![a], "c");
        let d = commit(&store, vec![b, c], "d");
        let e = commit(&store, vec![c, b], "e");

        let all = merge_base(
            &store,
            &[d, e],
            &MergeBaseOptions {
                all: true,
                recursive: false,
            },
        )
        .unwrap();
        let mut sorted = all.clone();
        sorted.sort();
        let mut expected = vec![b, c];
        expected.sort();
        assert_eq!(sorted, expected);

        let single = merge_base(&store, &[d, e], &MergeBaseOptions::default()).unwrap();
        assert_eq!(single.len(), 1);

        let recursive = merge_base(
            &store,
            &[d, e],
            &MergeBaseOptions {
                all: false,
                recursive: true,
            },
        )
        .unwrap();
        assert_eq!(recursive.len(), 1);
    }

    #[test]
    fn independent_filters_ancestors_out() {
        let store = MemoryObjectStore::new();
        let a = commit(&store, vec![], "a");
        let b = commit(&store, vec![a], "b");
        assert_eq!(independent(&store, &[a, b]).unwrap(), vec![b]);
    }

    #[test]
    fn has_common_history_detects_disjoint_roots() {
        let store = MemoryObjectStore::new();
        let a = commit(&store, vec![], "a");
        let b = commit(&store, vec![], "b");
        assert!(!has_common_history(&store, &[a, b]).unwrap());
    }

    quickcheck::quickcheck! {
        fn ancestor_distance_matches_chain_length(chain_len: u8) -> bool {
            let chain_len = (chain_len % 12) as usize;
            let store = MemoryObjectStore::new();
            let mut tip = commit(&store, vec![], "root");
            for i in 0..chain_len {
                tip = commit(&store, vec![tip], &format!("c{i}"));
            }
            let root = commit(&store, vec![], "root");
            ancestor_distance(&store, &root, &tip).unwrap() == chain_len as i64
        }
    }
}
