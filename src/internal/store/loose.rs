//! Persistent, file-backed `ObjectStore`. Each object is stored as a
//! zlib-deflated envelope under a two-level directory split on its
//! identifier, matching real Git's loose-object on-disk layout.

use std::{
    fs,
    io::{Read, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

use dashmap::DashMap;
use flate2::{Compression, read::ZlibDecoder, write::ZlibEncoder};
use tracing::{debug, warn};

use super::{Clock, ObjectMeta, ObjectStore, default_clock};
use crate::{
    errors::GitError,
    hash::ObjectHash,
    internal::object::{ObjectKind, build_envelope, split_envelope},
};

pub struct LooseObjectStore {
    base: PathBuf,
    created: DashMap<ObjectHash, u64>,
    clock: Arc<dyn Clock>,
}

impl LooseObjectStore {
    pub fn new(base: impl Into<PathBuf>) -> Result<Self, GitError> {
        let base = base.into();
        fs::create_dir_all(&base)?;
        Ok(LooseObjectStore {
            base,
            created: DashMap::new(),
            clock: default_clock(),
        })
    }

    pub fn with_clock(base: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Result<Self, GitError> {
        let mut store = Self::new(base)?;
        store.clock = clock;
        Ok(store)
    }

    fn path_for(&self, id: &ObjectHash) -> PathBuf {
        let hex = id.to_string();
        self.base.join(&hex[..2]).join(&hex[2..])
    }

    /// The file's on-disk modification time, in milliseconds since the
    /// Unix epoch — the true insertion time for objects discovered after
    /// a process restart, when no in-memory timestamp survives.
    fn mtime_ms(path: &Path) -> Result<u64, GitError> {
        let modified = fs::metadata(path)?.modified()?;
        Ok(modified
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64)
    }

    fn write_envelope(path: &Path, kind: ObjectKind, payload: &[u8]) -> Result<(), GitError> {
        let envelope = build_envelope(kind, payload);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("tmp");
        {
            let file = fs::File::create(&tmp)?;
            let mut encoder = ZlibEncoder::new(file, Compression::default());
            encoder.write_all(&envelope)?;
            encoder.finish()?;
        }
        fs::rename(&tmp, path)?;
        Ok(())
    }

    fn read_envelope(path: &Path) -> Result<(ObjectKind, Vec<u8>), GitError> {
        let file = fs::File::open(path)?;
        let mut decoder = ZlibDecoder::new(file);
        let mut envelope = Vec::new();
        decoder.read_to_end(&mut envelope)?;
        split_envelope(&envelope)
    }
}

impl ObjectStore for LooseObjectStore {
    fn put(&self, kind: ObjectKind, payload: &[u8]) -> Result<ObjectHash, GitError> {
        let id = ObjectHash::from_kind_and_data(kind, payload);
        let path = self.path_for(&id);
        if !path.exists() {
            Self::write_envelope(&path, kind, payload)?;
            debug!(id = %id, kind = %kind, bytes = payload.len(), "wrote loose object");
        }
        self.created.entry(id).or_insert_with(|| self.clock.now_ms());
        Ok(id)
    }

    fn get(&self, id: &ObjectHash) -> Result<Option<(ObjectKind, Vec<u8>)>, GitError> {
        let path = self.path_for(id);
        if !path.exists() {
            return Ok(None);
        }
        let (kind, payload) = Self::read_envelope(&path)?;
        let actual = ObjectHash::from_kind_and_data(kind, &payload);
        if actual != *id {
            warn!(id = %id, actual = %actual, "loose object content does not hash back to its key");
            return Err(GitError::CorruptObject(id.to_string()));
        }
        Ok(Some((kind, payload)))
    }

    fn exists(&self, id: &ObjectHash) -> Result<bool, GitError> {
        Ok(self.path_for(id).exists())
    }

    fn list(&self) -> Result<Vec<ObjectMeta>, GitError> {
        let mut out = Vec::new();
        if !self.base.exists() {
            return Ok(out);
        }
        for prefix_entry in fs::read_dir(&self.base)? {
            let prefix_entry = prefix_entry?;
            if !prefix_entry.file_type()?.is_dir() {
                continue;
            }
            let prefix = prefix_entry.file_name().to_string_lossy().to_string();
            for file_entry in fs::read_dir(prefix_entry.path())? {
                let file_entry = file_entry?;
                let suffix = file_entry.file_name().to_string_lossy().to_string();
                if suffix.ends_with(".tmp") {
                    continue;
                }
                let hex = format!("{prefix}{suffix}");
                let Ok(id) = hex.parse::<ObjectHash>() else {
                    continue;
                };
                let (kind, payload) = Self::read_envelope(&file_entry.path())?;
                let created_ms = if let Some(existing) = self.created.get(&id) {
                    *existing
                } else {
                    let ms = Self::mtime_ms(&file_entry.path())?;
                    self.created.insert(id, ms);
                    ms
                };
                out.push(ObjectMeta {
                    id,
                    kind,
                    size: payload.len(),
                    created_ms,
                });
            }
        }
        Ok(out)
    }

    fn delete(&self, id: &ObjectHash) -> Result<(), GitError> {
        let path = self.path_for(id);
        match fs::remove_file(&path) {
            Ok(()) => {
                self.created.remove(id);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
