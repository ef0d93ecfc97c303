//! Per-ref exclusive locking. One lock per ref name; writers hold the
//! lock for the entire read-modify-write; readers never acquire locks.
//! Implemented as a map from ref name to an exclusive cell, per the
//! "per-ref locking as message passing" design note: held locks do not
//! block unrelated refs.

use std::{
    sync::{Arc, Condvar, Mutex},
    time::{Duration, Instant},
};

use dashmap::DashMap;

use crate::errors::GitError;

#[derive(Default)]
struct Cell {
    locked: Mutex<bool>,
    available: Condvar,
}

#[derive(Default)]
pub struct LockTable {
    cells: DashMap<String, Arc<Cell>>,
}

impl LockTable {
    pub fn new() -> Self {
        LockTable::default()
    }

    fn cell_for(&self, name: &str) -> Arc<Cell> {
        self.cells
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Cell::default()))
            .clone()
    }

    /// Blocks (up to `timeout`, if given) until the named ref's lock is
    /// free, then marks it held. Fails `Locked` on timeout.
    pub fn acquire(&self, name: &str, timeout: Option<Duration>) -> Result<RefLock, GitError> {
        let cell = self.cell_for(name);
        let deadline = timeout.map(|t| Instant::now() + t);

        let mut locked = cell.locked.lock().expect("ref lock mutex poisoned");
        loop {
            if !*locked {
                *locked = true;
                return Ok(RefLock {
                    name: name.to_string(),
                    cell: cell.clone(),
                    released: false,
                });
            }
            locked = match deadline {
                None => cell
                    .available
                    .wait(locked)
                    .expect("ref lock condvar poisoned"),
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        return Err(GitError::Locked(name.to_string()));
                    }
                    let (guard, result) = cell
                        .available
                        .wait_timeout(locked, remaining)
                        .expect("ref lock condvar poisoned");
                    if result.timed_out() && *guard {
                        return Err(GitError::Locked(name.to_string()));
                    }
                    guard
                }
            };
        }
    }
}

/// An exclusive handle on a single ref's lock. Released on `release()` or
/// on drop, whichever comes first, so every exit path releases it.
pub struct RefLock {
    name: String,
    cell: Arc<Cell>,
    released: bool,
}

impl RefLock {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn release(mut self) {
        self.release_inner();
    }

    fn release_inner(&mut self) {
        if self.released {
            return;
        }
        let mut locked = self.cell.locked.lock().expect("ref lock mutex poisoned");
        *locked = false;
        self.released = true;
        self.cell.available.notify_all();
    }
}

impl Drop for RefLock {
    fn drop(&mut self) {
        self.release_inner();
    }
}
