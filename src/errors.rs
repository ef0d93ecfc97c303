//! Error types for the Git object engine.
//!
//! This module defines a unified error enumeration used across object
//! parsing, the object store, the ref store, commit-graph traversal, and
//! garbage collection. It integrates with `thiserror` to provide rich
//! `Display` implementations and error source chaining where applicable.
//!
//! Notes:
//! - Each variant carries contextual details via its message payload.
//! - Variants are grouped by the taxonomy: input validation, wire-format
//!   parsing, integrity, state, concurrency, and I/O.

use thiserror::Error;

#[derive(Error, Debug)]
/// Unified error enumeration for the Git object engine.
///
/// - Used across object codec, object store, ref store, commit graph, and GC.
/// - Implements `std::error::Error` via `thiserror`.
pub enum GitError {
    // --- InputValidation ---
    /// Ref name fails the naming rules (control chars, `..`, trailing `.lock`, etc).
    #[error("`{0}` is not a valid ref name")]
    InvalidName(String),

    /// Identifier is not 40 hex characters.
    #[error("`{0}` is not a valid object identifier")]
    InvalidIdentifier(String),

    /// Tree entry mode is outside the closed mode whitelist.
    #[error("`{0}` is not a valid tree entry mode")]
    InvalidMode(String),

    /// Identity timezone does not match `[+-]dddd`.
    #[error("`{0}` is not a valid timezone offset")]
    InvalidTimezone(String),

    // --- Format ---
    /// Object envelope header is malformed (missing space, missing NUL, non-numeric size).
    #[error("malformed object header: {0}")]
    MalformedHeader(String),

    /// Payload ended before the header-declared size was reached.
    #[error("truncated object payload: {0}")]
    TruncatedPayload(String),

    /// A tree entry's mode or name field could not be parsed.
    #[error("bad tree entry mode or name: {0}")]
    BadModeOrName(String),

    /// An `author`/`committer`/`tagger` line could not be parsed.
    #[error("bad identity line: {0}")]
    BadIdentityLine(String),

    // --- Integrity ---
    /// Bytes retrieved from storage do not hash to the key they were stored under.
    #[error("object `{0}` is corrupt: stored bytes do not hash to its identifier")]
    CorruptObject(String),

    // --- State ---
    /// A ref, object, or commit does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A create-only operation targeted an existing ref.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// A compare-and-swap update's `expected` value did not match the current ref.
    #[error("conflict updating `{0}`: current value did not match expectation")]
    Conflict(String),

    /// A symbolic-ref chain revisited a name it had already traversed.
    #[error("circular symbolic ref detected at `{0}`")]
    CircularRef(String),

    /// A symbolic-ref chain exceeded the maximum resolution depth.
    #[error("symbolic ref resolution of `{0}` exceeded max depth")]
    MaxDepthExceeded(String),

    // --- Concurrency ---
    /// Lock acquisition timed out.
    #[error("lock on `{0}` timed out")]
    Locked(String),

    /// The operation was cancelled before it committed.
    #[error("operation cancelled: {0}")]
    Cancelled(String),

    // --- IO ---
    /// Underlying storage I/O failed.
    #[error("IO error: {0}")]
    IoFailed(#[from] std::io::Error),
}

impl GitError {
    /// True for errors a caller may retry after backing off (lock contention).
    pub fn is_retryable(&self) -> bool {
        matches!(self, GitError::Locked(_))
    }
}
