//! Persistence layer: snapshot storage contracts and the serialized writer.
//!
//! # Responsibility
//! - Define the key-value snapshot contract used by the task list service.
//! - Isolate SQL and JSON codec details from service orchestration.
//! - Apply asynchronous saves strictly in issue order.
//!
//! # Invariants
//! - A save replaces the entire stored value; there are no partial writes.
//! - Corrupt stored data surfaces as a semantic error (`CorruptSnapshot`),
//!   never as a silently empty collection.

pub mod snapshot_repo;
pub mod writer;
