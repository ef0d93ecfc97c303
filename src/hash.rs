//! Content-addressed object identifiers.
//!
//! An [`ObjectHash`] is the SHA-1 of an object's canonical wire bytes: a
//! 40-character lowercase hex string, 20 bytes on the wire. Input hex is
//! accepted case-insensitively; output is always lowercase.

use std::{fmt::Display, io, str::FromStr};

use sha1::{Digest, Sha1};
use tracing::trace;

use crate::{internal::object::ObjectKind, validate};

pub const HASH_SIZE: usize = 20;
pub const HEX_LEN: usize = 40;

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
/// A 20-byte SHA-1 object identifier.
pub struct ObjectHash([u8; HASH_SIZE]);

impl Default for ObjectHash {
    fn default() -> Self {
        ObjectHash([0u8; HASH_SIZE])
    }
}

impl Display for ObjectHash {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl std::fmt::Debug for ObjectHash {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "ObjectHash({self})")
    }
}

impl AsRef<[u8]> for ObjectHash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Parses a 40-character hex string into an [`ObjectHash`]. Case-insensitive.
impl FromStr for ObjectHash {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        validate::validate_identifier_str(s).map_err(|e| e.to_string())?;
        let bytes = hex::decode(s).map_err(|e| e.to_string())?;
        let mut h = [0u8; HASH_SIZE];
        h.copy_from_slice(&bytes);
        Ok(ObjectHash(h))
    }
}

impl ObjectHash {
    /// The all-zero identifier, used as a CAS sentinel for "ref does not yet exist".
    pub const ZERO: ObjectHash = ObjectHash([0u8; HASH_SIZE]);

    /// Hashes `data` directly (no object envelope prepended).
    pub fn new(data: &[u8]) -> ObjectHash {
        let digest = Sha1::digest(data);
        let mut bytes = [0u8; HASH_SIZE];
        bytes.copy_from_slice(digest.as_ref());
        ObjectHash(bytes)
    }

    /// Builds the `"<kind> <len>\0<data>"` envelope and hashes it — the
    /// identifier of an object is always the hash of its full wire bytes.
    pub fn from_kind_and_data(kind: ObjectKind, data: &[u8]) -> ObjectHash {
        let envelope = crate::internal::object::build_envelope(kind, data);
        let hash = ObjectHash::new(&envelope);
        trace!(kind = %kind, bytes = data.len(), id = %hash, "computed object hash");
        hash
    }

    /// Builds an `ObjectHash` from exactly 20 raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<ObjectHash, String> {
        if bytes.len() != HASH_SIZE {
            return Err(format!(
                "invalid byte length: got {}, expected {HASH_SIZE}",
                bytes.len()
            ));
        }
        let mut h = [0u8; HASH_SIZE];
        h.copy_from_slice(bytes);
        Ok(ObjectHash(h))
    }

    /// Reads 20 raw bytes from a stream (as found in a tree entry).
    pub fn from_stream(data: &mut impl io::Read) -> io::Result<ObjectHash> {
        let mut h = [0u8; HASH_SIZE];
        data.read_exact(&mut h)?;
        Ok(ObjectHash(h))
    }

    /// Raw 20-byte value.
    pub fn to_data(self) -> Vec<u8> {
        self.0.to_vec()
    }

    /// First 7 hex characters, for diagnostics (`git log --abbrev`-style).
    pub fn short(&self) -> String {
        self.to_string()[..7].to_string()
    }
}
