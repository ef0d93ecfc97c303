//! A content-addressed Git object engine: object codec, object store, ref
//! manager, commit-graph traversal, tree diff, and garbage collector.

pub mod config;
pub mod errors;
pub mod hash;
pub mod internal;
pub mod validate;
