//! The four Git object kinds, their wire codec, and the trait that lets
//! the object store work with them polymorphically.

pub mod blob;
pub mod commit;
pub mod signature;
pub mod tag;
pub mod tree;

use std::fmt::Display;

use bstr::ByteSlice;

use crate::{errors::GitError, hash::ObjectHash};

pub use blob::Blob;
pub use commit::Commit;
pub use signature::Signature;
pub use tag::Tag;
pub use tree::{Tree, TreeEntry};

/// The closed set of Git object kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Commit,
    Tree,
    Blob,
    Tag,
}

impl ObjectKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Commit => "commit",
            ObjectKind::Tree => "tree",
            ObjectKind::Blob => "blob",
            ObjectKind::Tag => "tag",
        }
    }

    pub fn parse(s: &str) -> Result<Self, GitError> {
        match s {
            "commit" => Ok(ObjectKind::Commit),
            "tree" => Ok(ObjectKind::Tree),
            "blob" => Ok(ObjectKind::Blob),
            "tag" => Ok(ObjectKind::Tag),
            other => Err(GitError::MalformedHeader(format!(
                "`{other}` is not a valid object kind"
            ))),
        }
    }
}

impl Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builds the `"<kind> <len>\0<payload>"` wire envelope. The sole place
/// that assembles this format; the codec, the hasher, and every object
/// store build on top of it instead of re-deriving it.
pub fn build_envelope(kind: ObjectKind, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 16);
    out.extend_from_slice(kind.as_str().as_bytes());
    out.push(b' ');
    out.extend_from_slice(payload.len().to_string().as_bytes());
    out.push(b'\0');
    out.extend_from_slice(payload);
    out
}

/// Splits full wire bytes into `(kind, payload)`, validating the declared
/// size against the actual payload length.
pub fn split_envelope(bytes: &[u8]) -> Result<(ObjectKind, Vec<u8>), GitError> {
    let header_end = bytes
        .find_byte(b'\0')
        .ok_or_else(|| GitError::MalformedHeader("missing NUL terminator".to_string()))?;
    let header = &bytes[..header_end];
    let space = header
        .find_byte(b' ')
        .ok_or_else(|| GitError::MalformedHeader("missing kind/size separator".to_string()))?;
    let kind = ObjectKind::parse(
        header[..space]
            .to_str()
            .map_err(|e| GitError::MalformedHeader(e.to_string()))?,
    )?;
    let size: usize = header[space + 1..]
        .to_str()
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| GitError::MalformedHeader("non-numeric size".to_string()))?;

    let payload = &bytes[header_end + 1..];
    if payload.len() != size {
        return Err(GitError::TruncatedPayload(format!(
            "header declared {size} bytes, found {}",
            payload.len()
        )));
    }
    Ok((kind, payload.to_vec()))
}

/// Common interface for the four object kinds: parse from a decoded
/// payload, serialize back to it, and report the kind for hashing.
pub trait ObjectTrait: Send + Sync + Display {
    /// Parses an object from its payload (the bytes after the `\0` header).
    fn from_bytes(data: &[u8]) -> Result<Self, GitError>
    where
        Self: Sized;

    fn kind(&self) -> ObjectKind;

    /// Serializes the payload (without the envelope header).
    fn to_data(&self) -> Result<Vec<u8>, GitError>;

    /// Hash of the full wire bytes (`"<kind> <len>\0<payload>"`).
    fn object_hash(&self) -> Result<ObjectHash, GitError> {
        let data = self.to_data()?;
        Ok(ObjectHash::from_kind_and_data(self.kind(), &data))
    }
}

/// A fully in-memory, tagged-variant object value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Object {
    Blob(Blob),
    Tree(Tree),
    Commit(Commit),
    Tag(Tag),
}

impl Object {
    pub fn kind(&self) -> ObjectKind {
        match self {
            Object::Blob(_) => ObjectKind::Blob,
            Object::Tree(_) => ObjectKind::Tree,
            Object::Commit(_) => ObjectKind::Commit,
            Object::Tag(_) => ObjectKind::Tag,
        }
    }

    fn payload(&self) -> Result<Vec<u8>, GitError> {
        match self {
            Object::Blob(b) => b.to_data(),
            Object::Tree(t) => t.to_data(),
            Object::Commit(c) => c.to_data(),
            Object::Tag(t) => t.to_data(),
        }
    }

    /// Produces the full wire bytes: `"<kind> <len>\0<payload>"`.
    pub fn serialize(&self) -> Result<Vec<u8>, GitError> {
        Ok(build_envelope(self.kind(), &self.payload()?))
    }

    /// Parses full wire bytes (header included) back into a value.
    pub fn parse(bytes: &[u8]) -> Result<Object, GitError> {
        let (kind, payload) = split_envelope(bytes)?;
        Ok(match kind {
            ObjectKind::Blob => Object::Blob(Blob::from_bytes(&payload)?),
            ObjectKind::Tree => Object::Tree(Tree::from_bytes(&payload)?),
            ObjectKind::Commit => Object::Commit(Commit::from_bytes(&payload)?),
            ObjectKind::Tag => Object::Tag(Tag::from_bytes(&payload)?),
        })
    }

    /// SHA-1 of the full wire bytes, lowercase hex.
    pub fn identify(bytes: &[u8]) -> ObjectHash {
        ObjectHash::new(bytes)
    }

    pub fn hash(&self) -> Result<ObjectHash, GitError> {
        Ok(ObjectHash::new(&self.serialize()?))
    }
}
