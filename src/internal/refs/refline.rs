//! The loose per-ref file format: one ref's value on its own line,
//! independent of the packed-refs snapshot.

use crate::{errors::GitError, hash::ObjectHash};

use super::{Ref, RefKind};

const SYMBOLIC_PREFIX: &str = "ref: ";

/// Serializes a single ref to its file contents: `<hex-id>\n` for a
/// direct ref, `ref: <target-name>\n` for a symbolic one.
pub fn serialize(r: &Ref) -> String {
    match r.kind {
        RefKind::Direct => format!("{}\n", r.target),
        RefKind::Symbolic => format!("{SYMBOLIC_PREFIX}{}\n", r.target),
    }
}

/// Parses a ref file's contents back into a `(target, kind)` pair for
/// the ref named `name`.
pub fn parse(name: &str, contents: &str) -> Result<Ref, GitError> {
    let line = contents.trim_end_matches('\n');
    if let Some(target) = line.strip_prefix(SYMBOLIC_PREFIX) {
        return Ok(Ref {
            name: name.to_string(),
            target: target.to_string(),
            kind: RefKind::Symbolic,
        });
    }
    let id: ObjectHash = line.parse().map_err(GitError::InvalidIdentifier)?;
    Ok(Ref {
        name: name.to_string(),
        target: id.to_string(),
        kind: RefKind::Direct,
    })
}
