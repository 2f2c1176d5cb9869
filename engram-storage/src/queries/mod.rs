//! Query modules, one per concern. All of them take a borrowed
//! connection so they compose under the engine's writer/reader routing.

pub mod backfill_ops;
pub mod candidates;
pub mod centroid_ops;
pub mod maintenance;
pub mod memory_crud;
pub mod supersession;
pub mod vector_codec;
