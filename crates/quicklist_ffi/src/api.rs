//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose the task-list controller to Dart via FRB.
//! - Keep error semantics simple for UI integration.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Every mutation returns the full post-mutation state; that envelope is
//!   the synchronous state-changed notification at this boundary.

use quicklist_core::db::open_db;
use quicklist_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    NullObserver, SqliteSnapshotRepository, TaskListController,
};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, OnceLock};

const LIST_DB_FILE_NAME: &str = "quicklist_tasks.sqlite3";
static LIST_DB_PATH: OnceLock<PathBuf> = OnceLock::new();
static LIST: OnceLock<Mutex<Option<TaskListController<SqliteSnapshotRepository>>>> =
    OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Sync call; may perform small file-system setup work.
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on
///   failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// One task row as rendered by the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskItem {
    /// Session-stable id used for delete calls.
    pub id: u64,
    /// Task text.
    pub text: String,
}

/// Full list state envelope returned by every list operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListStateResponse {
    /// Whether the operation was applied (no-ops still report `true`).
    pub ok: bool,
    /// Current collection in display order.
    pub tasks: Vec<TaskItem>,
    /// Not-yet-submitted input field value.
    pub draft_text: String,
    /// Whether the startup snapshot has been resolved.
    pub ready: bool,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl ListStateResponse {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            tasks: Vec::new(),
            draft_text: String::new(),
            ready: false,
            message: message.into(),
        }
    }

    fn from_list(
        list: &TaskListController<SqliteSnapshotRepository>,
        message: impl Into<String>,
    ) -> Self {
        let state = list.state();
        Self {
            ok: true,
            tasks: state
                .tasks
                .into_iter()
                .map(|task| TaskItem {
                    id: task.id,
                    text: task.text,
                })
                .collect(),
            draft_text: state.draft_text,
            ready: state.ready,
            message: message.into(),
        }
    }
}

/// Opens the task list: loads the persisted snapshot and becomes ready.
///
/// `seed_text` populates a placeholder task on the very first launch (no
/// stored snapshot yet); pass `None` to start empty.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Idempotent: reopening returns the current state.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn list_open(seed_text: Option<String>) -> ListStateResponse {
    let cell = list_cell();
    let mut guard = match cell.lock() {
        Ok(guard) => guard,
        Err(_) => return ListStateResponse::failure("task list state poisoned"),
    };

    if let Some(list) = guard.as_ref() {
        return ListStateResponse::from_list(list, "Task list already open.");
    }

    let conn = match open_db(resolve_list_db_path()) {
        Ok(conn) => conn,
        Err(err) => return ListStateResponse::failure(format!("list_open failed: {err}")),
    };
    let repo = Arc::new(SqliteSnapshotRepository::new(conn));
    let mut list = TaskListController::new(repo, Box::new(NullObserver));
    if let Some(seed) = seed_text {
        list = list.with_seed_text(seed);
    }
    if let Err(err) = list.start() {
        return ListStateResponse::failure(format!("list_open failed: {err}"));
    }

    let response = ListStateResponse::from_list(&list, "Task list opened.");
    *guard = Some(list);
    response
}

/// Appends a task; empty or whitespace-only text is a no-op.
///
/// # FFI contract
/// - Sync call; persistence happens asynchronously after return.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn list_add_task(text: String) -> ListStateResponse {
    with_list(|list| match list.add_task(&text) {
        Ok(Some(id)) => ListStateResponse::from_list(list, format!("Task {id} added.")),
        Ok(None) => ListStateResponse::from_list(list, "Empty task text ignored."),
        Err(err) => ListStateResponse::failure(format!("list_add_task failed: {err}")),
    })
}

/// Submits the current draft as a new task and clears the input value.
///
/// # FFI contract
/// - Sync call; persistence happens asynchronously after return.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn list_submit_draft() -> ListStateResponse {
    with_list(|list| match list.submit_draft() {
        Ok(Some(id)) => ListStateResponse::from_list(list, format!("Task {id} added.")),
        Ok(None) => ListStateResponse::from_list(list, "Empty draft ignored."),
        Err(err) => ListStateResponse::failure(format!("list_submit_draft failed: {err}")),
    })
}

/// Deletes the task with `id`; unknown ids are a no-op.
///
/// # FFI contract
/// - Sync call; persistence happens asynchronously after return.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn list_delete_task(id: u64) -> ListStateResponse {
    with_list(|list| match list.delete_task(id) {
        Ok(true) => ListStateResponse::from_list(list, format!("Task {id} deleted.")),
        Ok(false) => ListStateResponse::from_list(list, format!("No task with id {id}.")),
        Err(err) => ListStateResponse::failure(format!("list_delete_task failed: {err}")),
    })
}

/// Updates the not-yet-submitted input field value.
///
/// # FFI contract
/// - Sync call, pure state update, no persistence.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn list_update_draft(text: String) -> ListStateResponse {
    with_list(|list| {
        list.update_draft_text(text);
        ListStateResponse::from_list(list, "Draft updated.")
    })
}

/// Returns the current list state without mutating anything.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn list_state() -> ListStateResponse {
    with_list(|list| ListStateResponse::from_list(list, "State read."))
}

/// Blocks until all scheduled snapshot writes have completed.
///
/// # FFI contract
/// - Sync call; blocks the caller while the write queue drains.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn list_flush() -> ListStateResponse {
    with_list(|list| match list.flush() {
        Ok(()) => ListStateResponse::from_list(list, "All writes flushed."),
        Err(err) => ListStateResponse::failure(format!("list_flush failed: {err}")),
    })
}

fn list_cell() -> &'static Mutex<Option<TaskListController<SqliteSnapshotRepository>>> {
    LIST.get_or_init(|| Mutex::new(None))
}

fn with_list<F>(f: F) -> ListStateResponse
where
    F: FnOnce(&mut TaskListController<SqliteSnapshotRepository>) -> ListStateResponse,
{
    let cell = list_cell();
    let mut guard = match cell.lock() {
        Ok(guard) => guard,
        Err(_) => return ListStateResponse::failure("task list state poisoned"),
    };
    match guard.as_mut() {
        Some(list) => f(list),
        None => ListStateResponse::failure("task list not opened; call list_open first"),
    }
}

fn resolve_list_db_path() -> PathBuf {
    LIST_DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var("QUICKLIST_DB_PATH") {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(LIST_DB_FILE_NAME)
        })
        .clone()
}
