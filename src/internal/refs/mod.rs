//! The ref store: named references with atomic compare-and-swap updates,
//! symbolic resolution, per-ref locking, and reflog history.

pub mod lock;
pub mod packed;
pub mod reflog;
pub mod refline;

use std::{
    collections::HashSet,
    sync::Mutex,
    time::Duration,
};

use dashmap::DashMap;
use tracing::{info, warn};

pub use lock::{LockTable, RefLock};
pub use reflog::{Reflog, ReflogEntry, RefUpdateReason};

use crate::{
    config::RefLockConfig,
    errors::GitError,
    hash::ObjectHash,
    validate::validate_ref_name,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    Direct,
    Symbolic,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ref {
    pub name: String,
    /// A 40-hex identifier for `Direct`, another ref name for `Symbolic`.
    pub target: String,
    pub kind: RefKind,
}

/// The compare-and-swap condition a caller asserts about a ref's current
/// value before `update`/`delete` is allowed to proceed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expected {
    /// No check; must not be used to create unless `create` is set.
    None,
    /// Ref must not exist.
    Absent,
    /// Ref must currently be a direct ref equal to this id.
    Id(ObjectHash),
}

#[derive(Debug, Clone)]
pub struct UpdateOptions {
    pub expected: Expected,
    pub create: bool,
    pub who: String,
    pub reason: RefUpdateReason,
}

impl Default for UpdateOptions {
    fn default() -> Self {
        UpdateOptions {
            expected: Expected::None,
            create: true,
            who: "unknown".to_string(),
            reason: RefUpdateReason::Update,
        }
    }
}

pub struct RefStore {
    refs: DashMap<String, Ref>,
    reflogs: DashMap<String, Reflog>,
    locks: LockTable,
    config: RefLockConfig,
    packed: Mutex<String>,
    clock: std::sync::Arc<dyn crate::internal::store::Clock>,
}

impl RefStore {
    pub fn new() -> Self {
        Self::with_config(RefLockConfig::default())
    }

    pub fn with_config(config: RefLockConfig) -> Self {
        let store = RefStore {
            refs: DashMap::new(),
            reflogs: DashMap::new(),
            locks: LockTable::new(),
            config,
            packed: Mutex::new(String::new()),
            clock: crate::internal::store::default_clock(),
        };
        store.refs.insert(
            "HEAD".to_string(),
            Ref {
                name: "HEAD".to_string(),
                target: "refs/heads/main".to_string(),
                kind: RefKind::Symbolic,
            },
        );
        store
    }

    fn acquire(&self, name: &str, timeout: Option<Duration>) -> Result<RefLock, GitError> {
        let timeout =
            timeout.or_else(|| Some(Duration::from_millis(self.config.acquire_timeout_ms)));
        self.locks.acquire(name, timeout).inspect_err(|_| {
            warn!(ref_name = name, "ref lock contended past timeout");
        })
    }

    pub fn get(&self, name: &str) -> Result<Option<Ref>, GitError> {
        Ok(self.refs.get(name).map(|r| r.clone()))
    }

    /// Resolves using the configured `max_symbolic_depth`. The default
    /// path every internal caller should use; `resolve` remains available
    /// for callers that need to override the depth explicitly.
    pub fn resolve_default(&self, name: &str) -> Result<(ObjectHash, Vec<String>), GitError> {
        self.resolve(name, self.config.max_symbolic_depth)
    }

    /// Follows symbolic targets to a terminal identifier, returning the
    /// ordered chain of ref names traversed.
    pub fn resolve(&self, name: &str, max_depth: usize) -> Result<(ObjectHash, Vec<String>), GitError> {
        let mut chain = Vec::new();
        let mut visited = HashSet::new();
        let mut current = name.to_string();

        loop {
            if chain.len() > max_depth {
                return Err(GitError::MaxDepthExceeded(name.to_string()));
            }
            if !visited.insert(current.clone()) {
                return Err(GitError::CircularRef(current));
            }
            chain.push(current.clone());

            let r = self
                .refs
                .get(&current)
                .ok_or_else(|| GitError::NotFound(current.clone()))?;
            match r.kind {
                RefKind::Direct => {
                    let id = r
                        .target
                        .parse::<ObjectHash>()
                        .map_err(GitError::InvalidIdentifier)?;
                    return Ok((id, chain));
                }
                RefKind::Symbolic => {
                    current = r.target.clone();
                }
            }
        }
    }

    fn check_cas(&self, name: &str, expected: &Expected, create: bool) -> Result<(), GitError> {
        let current = self.refs.get(name).map(|r| r.clone());
        match expected {
            Expected::None => {
                if current.is_none() && !create {
                    return Err(GitError::NotFound(name.to_string()));
                }
            }
            Expected::Absent => {
                if current.is_some() {
                    return Err(GitError::AlreadyExists(name.to_string()));
                }
            }
            Expected::Id(expected_id) => match current {
                Some(r) if r.kind == RefKind::Direct && r.target == expected_id.to_string() => {}
                _ => return Err(GitError::Conflict(name.to_string())),
            },
        }
        Ok(())
    }

    fn append_reflog(&self, name: &str, old: Option<ObjectHash>, new: Option<ObjectHash>, who: &str, reason: RefUpdateReason) {
        self.reflogs.entry(name.to_string()).or_default().append(ReflogEntry {
            old_id: old,
            new_id: new,
            who: who.to_string(),
            when_ms: self.clock.now_ms(),
            reason,
        });
    }

    /// Applies the CAS rule, writes the direct ref, and appends a reflog
    /// entry. Assumes the caller already holds `name`'s lock.
    fn update_inner(&self, name: &str, target: ObjectHash, options: &UpdateOptions) -> Result<Ref, GitError> {
        self.check_cas(name, &options.expected, options.create)?;
        let old_id = self
            .refs
            .get(name)
            .filter(|r| r.kind == RefKind::Direct)
            .and_then(|r| r.target.parse::<ObjectHash>().ok());
        let new_ref = Ref {
            name: name.to_string(),
            target: target.to_string(),
            kind: RefKind::Direct,
        };
        self.refs.insert(name.to_string(), new_ref.clone());
        self.append_reflog(name, old_id, Some(target), &options.who, options.reason);
        info!(ref_name = name, new_id = %target, "ref updated");
        Ok(new_ref)
    }

    /// Validates inputs, acquires the per-ref lock, applies the CAS rule,
    /// writes the direct ref, and appends a reflog entry.
    pub fn update(&self, name: &str, target: ObjectHash, options: UpdateOptions) -> Result<Ref, GitError> {
        validate_ref_name(name)?;
        let lock = self.acquire(name, None)?;
        let result = self.update_inner(name, target, &options);
        lock.release();
        result
    }

    /// Same as `update`, but composes with a lock the caller already holds
    /// (e.g. from `acquire_lock`) instead of acquiring and releasing its
    /// own — lets a caller bundle several operations on the same ref
    /// under one held lock.
    pub fn update_locked(&self, lock: &RefLock, name: &str, target: ObjectHash, options: UpdateOptions) -> Result<Ref, GitError> {
        if lock.name() != name {
            return Err(GitError::InvalidName(name.to_string()));
        }
        validate_ref_name(name)?;
        self.update_inner(name, target, &options)
    }

    fn delete_inner(&self, name: &str, options: &UpdateOptions) -> Result<bool, GitError> {
        self.check_cas(name, &options.expected, false)?;
        let old_id = self
            .refs
            .get(name)
            .filter(|r| r.kind == RefKind::Direct)
            .and_then(|r| r.target.parse::<ObjectHash>().ok());
        let removed = self.refs.remove(name).is_some();
        if removed {
            self.append_reflog(name, old_id, None, &options.who, RefUpdateReason::Delete);
            info!(ref_name = name, "ref deleted");
        }
        Ok(removed)
    }

    /// Same locking and CAS rules as `update`; cannot delete `HEAD`.
    pub fn delete(&self, name: &str, options: UpdateOptions) -> Result<bool, GitError> {
        if name == "HEAD" {
            return Err(GitError::InvalidName(name.to_string()));
        }
        validate_ref_name(name)?;
        let lock = self.acquire(name, None)?;
        let result = self.delete_inner(name, &options);
        lock.release();
        result
    }

    /// `delete`'s counterpart to `update_locked`: composes with a
    /// caller-held lock instead of acquiring its own.
    pub fn delete_locked(&self, lock: &RefLock, name: &str, options: UpdateOptions) -> Result<bool, GitError> {
        if name == "HEAD" {
            return Err(GitError::InvalidName(name.to_string()));
        }
        if lock.name() != name {
            return Err(GitError::InvalidName(name.to_string()));
        }
        validate_ref_name(name)?;
        self.delete_inner(name, &options)
    }

    /// Supports glob-prefix filtering (a trailing `*`); by default excludes
    /// `HEAD` and symbolic refs.
    pub fn list(&self, pattern: Option<&str>, include_head: bool, include_symbolic: bool) -> Result<Vec<Ref>, GitError> {
        let prefix = pattern.map(|p| p.trim_end_matches('*'));
        let mut out: Vec<Ref> = self
            .refs
            .iter()
            .map(|r| r.clone())
            .filter(|r| include_head || r.name != "HEAD")
            .filter(|r| include_symbolic || r.kind == RefKind::Direct)
            .filter(|r| prefix.is_none_or(|p| r.name.starts_with(p)))
            .collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }

    /// Creates or replaces a symbolic ref; rejects a self-loop at creation.
    pub fn set_symbolic(&self, name: &str, target_name: &str) -> Result<Ref, GitError> {
        validate_ref_name(name)?;
        validate_ref_name(target_name)?;
        if name == target_name {
            return Err(GitError::InvalidName(name.to_string()));
        }
        let lock = self.acquire(name, None)?;
        let new_ref = Ref {
            name: name.to_string(),
            target: target_name.to_string(),
            kind: RefKind::Symbolic,
        };
        self.refs.insert(name.to_string(), new_ref.clone());
        self.append_reflog(name, None, None, "unknown", RefUpdateReason::Update);
        lock.release();
        Ok(new_ref)
    }

    /// Switches `HEAD` between "on branch" (symbolic) and "detached" (direct).
    pub fn update_head(&self, target: &str, symbolic: bool) -> Result<Ref, GitError> {
        if symbolic {
            self.set_symbolic("HEAD", target)
        } else {
            let id = target
                .parse::<ObjectHash>()
                .map_err(GitError::InvalidIdentifier)?;
            self.update(
                "HEAD",
                id,
                UpdateOptions {
                    expected: Expected::None,
                    create: true,
                    who: "unknown".to_string(),
                    reason: RefUpdateReason::Update,
                },
            )
        }
    }

    pub fn acquire_lock(&self, name: &str, timeout: Option<Duration>) -> Result<RefLock, GitError> {
        validate_ref_name(name)?;
        self.acquire(name, timeout)
    }

    /// Snapshot-then-write of all direct, non-`HEAD` refs into a single
    /// packed set. Locks are held on every ref being packed.
    pub fn pack_refs(&self) -> Result<(), GitError> {
        let mut names: Vec<String> = self
            .refs
            .iter()
            .filter(|r| r.kind == RefKind::Direct && r.name != "HEAD")
            .map(|r| r.name.clone())
            .collect();
        names.sort();

        let locks: Vec<RefLock> = names
            .iter()
            .map(|n| self.acquire(n, None))
            .collect::<Result<_, _>>()?;

        let entries: Vec<(ObjectHash, String)> = names
            .iter()
            .filter_map(|n| self.refs.get(n).map(|r| (n.clone(), r.target.clone())))
            .filter_map(|(n, t)| t.parse::<ObjectHash>().ok().map(|id| (id, n)))
            .collect();
        *self.packed.lock().expect("packed-refs mutex poisoned") = packed::serialize(entries);

        for lock in locks {
            lock.release();
        }
        Ok(())
    }

    /// The current packed-refs snapshot text, for inspection/tests.
    pub fn packed_snapshot(&self) -> String {
        self.packed.lock().expect("packed-refs mutex poisoned").clone()
    }

    pub fn reflog(&self, name: &str) -> Vec<ReflogEntry> {
        self.reflogs
            .get(name)
            .map(|log| log.entries().to_vec())
            .unwrap_or_default()
    }
}

impl Default for RefStore {
    fn default() -> Self {
        Self::new()
    }
}
