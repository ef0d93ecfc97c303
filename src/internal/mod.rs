//! Internal building blocks: the object model, object store, ref store,
//! commit graph, tree diff, and garbage collector.

pub mod gc;
pub mod graph;
pub mod object;
pub mod refs;
pub mod store;
pub mod treediff;
