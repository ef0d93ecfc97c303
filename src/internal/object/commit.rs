//! The commit object: `(tree-id, parents[], author, committer, message)`.

use std::fmt::Display;

use bstr::ByteSlice;

use super::{ObjectKind, ObjectTrait, Signature};
use crate::{errors::GitError, hash::ObjectHash};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub tree_id: ObjectHash,
    pub parent_ids: Vec<ObjectHash>,
    pub author: Signature,
    pub committer: Signature,
    pub message: String,
}

impl Commit {
    pub fn new(
        tree_id: ObjectHash,
        parent_ids: Vec<ObjectHash>,
        author: Signature,
        committer: Signature,
        message: impl Into<String>,
    ) -> Self {
        Commit {
            tree_id,
            parent_ids,
            author,
            committer,
            message: message.into(),
        }
    }

    /// First line of the message, stopping at any embedded PGP signature block.
    pub fn summary(&self) -> &str {
        self.message
            .split("-----BEGIN PGP SIGNATURE-----")
            .next()
            .unwrap_or(&self.message)
            .lines()
            .next()
            .unwrap_or("")
    }
}

impl Display for Commit {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        writeln!(f, "tree {}", self.tree_id)?;
        for parent in &self.parent_ids {
            writeln!(f, "parent {parent}")?;
        }
        writeln!(f, "author {}", self.author)?;
        write!(f, "committer {}", self.committer)
    }
}

impl ObjectTrait for Commit {
    fn from_bytes(data: &[u8]) -> Result<Self, GitError> {
        let bad_header = || GitError::MalformedHeader("malformed commit header".to_string());

        let blank = data
            .find(b"\n\n")
            .ok_or_else(|| GitError::MalformedHeader("commit missing blank line".to_string()))?;
        let header = &data[..blank];
        let message = data[blank + 2..].to_str_lossy().to_string();

        let mut tree_id = None;
        let mut parent_ids = Vec::new();
        let mut author = None;
        let mut committer = None;

        for line in header.split_str(b"\n") {
            if let Some(rest) = line.strip_prefix(b"tree ") {
                tree_id = Some(
                    rest.to_str()
                        .map_err(|_| bad_header())?
                        .parse::<ObjectHash>()
                        .map_err(GitError::InvalidIdentifier)?,
                );
            } else if let Some(rest) = line.strip_prefix(b"parent ") {
                parent_ids.push(
                    rest.to_str()
                        .map_err(|_| bad_header())?
                        .parse::<ObjectHash>()
                        .map_err(GitError::InvalidIdentifier)?,
                );
            } else if let Some(rest) = line.strip_prefix(b"author ") {
                author = Some(Signature::parse(rest)?);
            } else if let Some(rest) = line.strip_prefix(b"committer ") {
                committer = Some(Signature::parse(rest)?);
            } else {
                return Err(bad_header());
            }
        }

        Ok(Commit {
            tree_id: tree_id.ok_or_else(bad_header)?,
            parent_ids,
            author: author.ok_or_else(bad_header)?,
            committer: committer.ok_or_else(bad_header)?,
            message,
        })
    }

    fn kind(&self) -> ObjectKind {
        ObjectKind::Commit
    }

    fn to_data(&self) -> Result<Vec<u8>, GitError> {
        let mut out = Vec::new();
        out.extend_from_slice(format!("tree {}\n", self.tree_id).as_bytes());
        for parent in &self.parent_ids {
            out.extend_from_slice(format!("parent {parent}\n").as_bytes());
        }
        out.extend_from_slice(b"author ");
        out.extend_from_slice(&self.author.to_line());
        out.push(b'\n');
        out.extend_from_slice(b"committer ");
        out.extend_from_slice(&self.committer.to_line());
        out.push(b'\n');
        out.push(b'\n');
        out.extend_from_slice(self.message.as_bytes());
        Ok(out)
    }
}
