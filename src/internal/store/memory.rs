//! Reference in-memory `ObjectStore`, backed by a concurrent map. Tests
//! inject this implementation per the trait-object design in the teacher
//! crate's pack-cache layer.

use dashmap::DashMap;

use super::{Clock, ObjectMeta, ObjectStore, default_clock};
use crate::{errors::GitError, hash::ObjectHash, internal::object::ObjectKind};
use std::sync::Arc;

pub struct MemoryObjectStore {
    objects: DashMap<ObjectHash, (ObjectKind, Vec<u8>, u64)>,
    clock: Arc<dyn Clock>,
}

impl Default for MemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        MemoryObjectStore {
            objects: DashMap::new(),
            clock: default_clock(),
        }
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        MemoryObjectStore {
            objects: DashMap::new(),
            clock,
        }
    }
}

impl ObjectStore for MemoryObjectStore {
    fn put(&self, kind: ObjectKind, payload: &[u8]) -> Result<ObjectHash, GitError> {
        let id = ObjectHash::from_kind_and_data(kind, payload);
        self.objects
            .entry(id)
            .or_insert_with(|| (kind, payload.to_vec(), self.clock.now_ms()));
        Ok(id)
    }

    fn get(&self, id: &ObjectHash) -> Result<Option<(ObjectKind, Vec<u8>)>, GitError> {
        Ok(self
            .objects
            .get(id)
            .map(|entry| (entry.0, entry.1.clone())))
    }

    fn exists(&self, id: &ObjectHash) -> Result<bool, GitError> {
        Ok(self.objects.contains_key(id))
    }

    fn list(&self) -> Result<Vec<ObjectMeta>, GitError> {
        Ok(self
            .objects
            .iter()
            .map(|entry| ObjectMeta {
                id: *entry.key(),
                kind: entry.value().0,
                size: entry.value().1.len(),
                created_ms: entry.value().2,
            })
            .collect())
    }

    fn delete(&self, id: &ObjectHash) -> Result<(), GitError> {
        self.objects.remove(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_is_idempotent_for_identical_content() {
        let store = MemoryObjectStore::new();
        let a = store.put(ObjectKind::Blob, b"hello\n").unwrap();
        let b = store.put(ObjectKind::Blob, b"hello\n").unwrap();
        assert_eq!(a, b);
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn get_returns_none_for_unknown_id() {
        let store = MemoryObjectStore::new();
        let id = ObjectHash::new(b"nope");
        assert_eq!(store.get(&id).unwrap(), None);
    }

    #[test]
    fn delete_is_a_no_op_for_unknown_id() {
        let store = MemoryObjectStore::new();
        let id = ObjectHash::new(b"nope");
        assert!(store.delete(&id).is_ok());
    }

    #[test]
    fn get_returns_exactly_what_was_put() {
        let store = MemoryObjectStore::new();
        let id = store.put(ObjectKind::Blob, b"hello\n").unwrap();
        let (kind, payload) = store.get(&id).unwrap().unwrap();
        assert_eq!(kind, ObjectKind::Blob);
        assert_eq!(payload, b"hello\n");
    }
}
