//! The annotated tag object: `(object-id, object-kind, name, tagger?, message)`.

use std::fmt::Display;

use bstr::ByteSlice;

use super::{ObjectKind, ObjectTrait, Signature};
use crate::{errors::GitError, hash::ObjectHash};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub object: ObjectHash,
    pub object_kind: ObjectKind,
    pub name: String,
    pub tagger: Option<Signature>,
    pub message: String,
}

impl Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "tag {} -> {}", self.name, self.object)
    }
}

impl ObjectTrait for Tag {
    fn from_bytes(data: &[u8]) -> Result<Self, GitError> {
        let bad_header = || GitError::MalformedHeader("malformed tag header".to_string());

        let blank = data
            .find(b"\n\n")
            .ok_or_else(|| GitError::MalformedHeader("tag missing blank line".to_string()))?;
        let header = &data[..blank];
        let message = data[blank + 2..].to_str_lossy().to_string();

        let mut object = None;
        let mut object_kind = None;
        let mut name = None;
        let mut tagger = None;

        for line in header.split_str(b"\n") {
            if let Some(rest) = line.strip_prefix(b"object ") {
                object = Some(
                    rest.to_str()
                        .map_err(|_| bad_header())?
                        .parse::<ObjectHash>()
                        .map_err(GitError::InvalidIdentifier)?,
                );
            } else if let Some(rest) = line.strip_prefix(b"type ") {
                object_kind =
                    Some(ObjectKind::parse(rest.to_str().map_err(|_| bad_header())?)?);
            } else if let Some(rest) = line.strip_prefix(b"tag ") {
                name = Some(rest.to_str().map_err(|_| bad_header())?.to_string());
            } else if let Some(rest) = line.strip_prefix(b"tagger ") {
                tagger = Some(Signature::parse(rest)?);
            } else if !line.is_empty() {
                return Err(bad_header());
            }
        }

        Ok(Tag {
            object: object.ok_or_else(bad_header)?,
            object_kind: object_kind.ok_or_else(bad_header)?,
            name: name.ok_or_else(bad_header)?,
            tagger,
            message,
        })
    }

    fn kind(&self) -> ObjectKind {
        ObjectKind::Tag
    }

    fn to_data(&self) -> Result<Vec<u8>, GitError> {
        let mut out = Vec::new();
        out.extend_from_slice(format!("object {}\n", self.object).as_bytes());
        out.extend_from_slice(format!("type {}\n", self.object_kind).as_bytes());
        out.extend_from_slice(format!("tag {}\n", self.name).as_bytes());
        if let Some(tagger) = &self.tagger {
            out.extend_from_slice(b"tagger ");
            out.extend_from_slice(&tagger.to_line());
            out.push(b'\n');
        }
        out.push(b'\n');
        out.extend_from_slice(self.message.as_bytes());
        Ok(out)
    }
}
