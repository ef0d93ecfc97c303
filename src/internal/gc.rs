//! Mark-and-sweep garbage collection: reclaim objects unreferenced by any
//! ref, after a grace period protecting recently created ones.

use std::{
    collections::HashSet,
    fmt::Display,
    time::Instant,
};

use tracing::{debug, info, warn};

use crate::{
    config::GcConfig,
    errors::GitError,
    hash::ObjectHash,
    internal::{
        object::{Commit, ObjectKind, ObjectTrait, Tag, Tree},
        refs::RefStore,
        store::{Clock, ObjectStore},
    },
};

/// Statistics reported by a single `gc` run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GcStats {
    pub deleted: usize,
    pub bytes_freed: u64,
    pub unreferenced: usize,
    pub skipped_grace: usize,
    pub skipped_cap: usize,
    pub total_scanned: usize,
    pub reachable: usize,
    pub duration_ms: u64,
}

impl Display for GcStats {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "gc: scanned {}, reachable {}, deleted {} ({} bytes), skipped {} (grace) {} (cap), took {}ms",
            self.total_scanned,
            self.reachable,
            self.deleted,
            self.bytes_freed,
            self.skipped_grace,
            self.skipped_cap,
            self.duration_ms
        )
    }
}

fn walk(store: &dyn ObjectStore, start: ObjectHash, reachable: &mut HashSet<ObjectHash>) -> Result<(), GitError> {
    let mut stack = vec![start];
    while let Some(id) = stack.pop() {
        if !reachable.insert(id) {
            continue;
        }
        match store.get(&id)? {
            Some((ObjectKind::Commit, payload)) => {
                let commit = Commit::from_bytes(&payload)?;
                stack.push(commit.tree_id);
                stack.extend(commit.parent_ids);
            }
            Some((ObjectKind::Tree, payload)) => {
                let tree = Tree::from_bytes(&payload)?;
                stack.extend(tree.entries.iter().map(|e| e.id));
            }
            Some((ObjectKind::Tag, payload)) => {
                let tag = Tag::from_bytes(&payload)?;
                stack.push(tag.object);
            }
            Some((ObjectKind::Blob, _)) => {}
            None => {}
        }
    }
    Ok(())
}

/// Enumerates all refs, resolves symbolic ones, and walks each target
/// (commit -> tree -> blob, tree -> sub-tree -> blob, tag -> target,
/// commit -> parents) to build the reachable set. Cycle-safe via the
/// `reachable` visited set itself.
pub fn mark(store: &dyn ObjectStore, refs: &RefStore) -> Result<HashSet<ObjectHash>, GitError> {
    let mut reachable = HashSet::new();
    for r in refs.list(None, true, true)? {
        match refs.resolve_default(&r.name) {
            Ok((id, _chain)) => walk(store, id, &mut reachable)?,
            Err(e) => debug!(ref_name = %r.name, error = %e, "skipping unresolvable ref during gc mark"),
        }
    }
    Ok(reachable)
}

/// Runs mark-and-sweep: lists all objects, deletes those outside the
/// reachable set whose creation time is at least `grace_period_ms` old,
/// bounded by an optional deletion cap. Individual delete failures are
/// logged and skipped; the run continues.
pub fn run(store: &dyn ObjectStore, refs: &RefStore, config: &GcConfig, clock: &dyn Clock) -> Result<GcStats, GitError> {
    let start = Instant::now();
    let reachable = mark(store, refs)?;
    let now = clock.now_ms();

    let mut stats = GcStats {
        reachable: reachable.len(),
        ..Default::default()
    };

    for meta in store.list()? {
        stats.total_scanned += 1;
        if reachable.contains(&meta.id) {
            continue;
        }
        stats.unreferenced += 1;

        let age_ms = now.saturating_sub(meta.created_ms);
        if age_ms < config.grace_period_ms {
            stats.skipped_grace += 1;
            continue;
        }
        if let Some(cap) = config.deletion_cap
            && stats.deleted >= cap
        {
            stats.skipped_cap += 1;
            continue;
        }
        if config.dry_run {
            continue;
        }
        match store.delete(&meta.id) {
            Ok(()) => {
                stats.deleted += 1;
                stats.bytes_freed += meta.size as u64;
            }
            Err(e) => warn!(id = %meta.id, error = %e, "gc: failed to delete object, skipping"),
        }
    }

    stats.duration_ms = start.elapsed().as_millis() as u64;
    info!(%stats, "gc run complete");
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::internal::{
        object::{Signature, TreeEntry},
        refs::{Expected, UpdateOptions},
        store::{MemoryObjectStore, test_support::ManualClock},
    };
    use tracing_subscriber::util::SubscriberInitExt;

    fn init_logger() {
        let _ = tracing_subscriber::fmt::Subscriber::builder()
            .with_target(false)
            .without_time()
            .with_level(true)
            .with_max_level(tracing::Level::DEBUG)
            .finish()
            .try_init();
    }

    #[test]
    fn grace_period_protects_then_releases_an_unreferenced_blob() {
        init_logger();
        let clock = ManualClock::new();
        let store = MemoryObjectStore::with_clock(clock.clone());
        let refs = RefStore::new();

        let blob_id = store.put(ObjectKind::Blob, b"orphan").unwrap();

        let config = GcConfig {
            grace_period_ms: 3_600_000,
            deletion_cap: None,
            dry_run: true,
        };
        let stats = run(&store, &refs, &config, &*clock).unwrap();
        assert_eq!(stats.unreferenced, 1);
        assert_eq!(stats.skipped_grace, 1);
        assert_eq!(stats.deleted, 0);
        assert!(store.exists(&blob_id).unwrap());

        clock.advance_ms(3_600_000);
        let config = GcConfig {
            grace_period_ms: 3_600_000,
            deletion_cap: None,
            dry_run: false,
        };
        let stats = run(&store, &refs, &config, &*clock).unwrap();
        assert_eq!(stats.deleted, 1);
        assert_eq!(stats.bytes_freed, "orphan".len() as u64);
        assert!(!store.exists(&blob_id).unwrap());
    }

    #[test]
    fn reachable_objects_are_never_deleted() {
        let store = MemoryObjectStore::new();
        let refs = RefStore::new();
        let clock = ManualClock::new();

        let sig = Signature::new("A", "a@x", 1700000000, "+0000");
        let blob = store.put(ObjectKind::Blob, b"kept").unwrap();
        let tree = Tree::new(vec![TreeEntry::new("100644", "f", blob).unwrap()]).unwrap();
        let tree_id = store.put(ObjectKind::Tree, &tree.to_data().unwrap()).unwrap();
        let commit = Commit::new(tree_id, vec![], sig.clone(), sig, "init");
        let commit_id = store.put(ObjectKind::Commit, &commit.to_data().unwrap()).unwrap();

        refs.update(
            "refs/heads/main",
            commit_id,
            UpdateOptions {
                expected: Expected::Absent,
                create: true,
                ..Default::default()
            },
        )
        .unwrap();

        clock.advance_ms(10_000_000);
        let config = GcConfig {
            grace_period_ms: 0,
            deletion_cap: None,
            dry_run: false,
        };
        let stats = run(&store, &refs, &config, &*clock).unwrap();
        assert_eq!(stats.deleted, 0);
        assert!(store.exists(&blob).unwrap());
        assert!(store.exists(&tree_id).unwrap());
        assert!(store.exists(&commit_id).unwrap());
    }

    #[test]
    fn deletion_cap_bounds_work_per_run() {
        let store = MemoryObjectStore::new();
        let refs = RefStore::new();
        let clock = ManualClock::new();
        store.put(ObjectKind::Blob, b"one").unwrap();
        store.put(ObjectKind::Blob, b"two").unwrap();
        clock.advance_ms(10_000);

        let config = GcConfig {
            grace_period_ms: 0,
            deletion_cap: Some(1),
            dry_run: false,
        };
        let stats = run(&store, &refs, &config, &*clock).unwrap();
        assert_eq!(stats.deleted, 1);
        assert_eq!(stats.skipped_cap, 1);
    }
}
