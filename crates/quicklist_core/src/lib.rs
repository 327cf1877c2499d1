//! Core domain logic for QuickList.
//! This crate is the single source of truth for task-list invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::task::{TaskId, TaskRecord, TaskValidationError};
pub use repo::snapshot_repo::{
    decode_snapshot, encode_snapshot, MemorySnapshotRepository, RepoError, RepoResult,
    SnapshotRepository, SqliteSnapshotRepository, StoredTask, SNAPSHOT_KEY,
};
pub use repo::writer::SnapshotWriter;
pub use service::task_list::{
    ControllerError, ControllerResult, ListState, NullObserver, Phase, StateObserver,
    TaskListController,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
