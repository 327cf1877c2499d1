//! Task list controller.
//!
//! # Responsibility
//! - Own the live task collection, the draft text and the session phase.
//! - Notify the UI observer synchronously, persist asynchronously.
//!
//! # Invariants
//! - Mutations are only applied in `Ready`.
//! - Every applied mutation enqueues exactly one full-snapshot save, in
//!   mutation order.
//! - The observer sees states in the order they were produced.

use crate::model::task::{TaskId, TaskRecord};
use crate::repo::snapshot_repo::{RepoError, RepoResult, SnapshotRepository, StoredTask};
use crate::repo::writer::SnapshotWriter;
use log::{debug, error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Session phase of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Initial state; the persisted snapshot has not been resolved yet.
    Loading,
    /// Snapshot resolved; mutations are accepted. Terminal for the session.
    Ready,
}

/// Read-only state handed to the UI collaborator on every change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListState {
    /// Current collection, insertion order = display order.
    pub tasks: Vec<TaskRecord>,
    /// Not-yet-submitted input field value.
    pub draft_text: String,
    /// Whether the controller has left `Loading`.
    pub ready: bool,
}

/// Receives synchronous state-change notifications.
///
/// Implementations must not call back into the controller; they receive a
/// clone of the state and re-render from it.
pub trait StateObserver: Send {
    fn state_changed(&mut self, state: &ListState);
}

/// Observer that ignores all notifications.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl StateObserver for NullObserver {
    fn state_changed(&mut self, _state: &ListState) {}
}

pub type ControllerResult<T> = Result<T, ControllerError>;

/// Errors surfaced to the calling layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerError {
    /// A mutation was attempted before `start()` resolved the snapshot.
    NotReady,
    /// The background writer is unreachable; a flush cannot be honored.
    WriterGone,
}

impl Display for ControllerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotReady => write!(f, "task list has not finished loading"),
            Self::WriterGone => write!(f, "snapshot writer is no longer running"),
        }
    }
}

impl Error for ControllerError {}

/// Task list controller backed by an injected snapshot repository.
///
/// The repository is shared with the background writer, so implementations
/// must be `Send + Sync` (the SQLite one guards its connection internally).
pub struct TaskListController<R>
where
    R: SnapshotRepository + Send + Sync + 'static,
{
    repo: Arc<R>,
    writer: SnapshotWriter,
    observer: Box<dyn StateObserver>,
    phase: Phase,
    tasks: Vec<TaskRecord>,
    draft_text: String,
    next_id: TaskId,
    seed_text: Option<String>,
}

impl<R> TaskListController<R>
where
    R: SnapshotRepository + Send + Sync + 'static,
{
    /// Creates a controller in `Loading` and spawns its writer.
    ///
    /// No storage access happens until [`start`](Self::start).
    pub fn new(repo: Arc<R>, observer: Box<dyn StateObserver>) -> Self {
        let writer = SnapshotWriter::spawn(Arc::clone(&repo));
        Self {
            repo,
            writer,
            observer,
            phase: Phase::Loading,
            tasks: Vec::new(),
            draft_text: String::new(),
            next_id: 1,
            seed_text: None,
        }
    }

    /// Configures a placeholder task used when no snapshot exists yet.
    ///
    /// Applied only when `start()` finds the key absent; a loaded snapshot
    /// and the corrupt-data fallback both suppress the seed.
    pub fn with_seed_text(mut self, text: impl Into<String>) -> Self {
        self.seed_text = Some(text.into());
        self
    }

    /// Resolves the persisted snapshot and transitions to `Ready`.
    ///
    /// A corrupt stored value is logged and replaced by an empty collection;
    /// transport-level load errors propagate unchanged. Calling `start` on a
    /// `Ready` controller is a logged no-op.
    pub fn start(&mut self) -> RepoResult<()> {
        if self.phase == Phase::Ready {
            debug!("event=list_start module=service status=noop reason=already_ready");
            return Ok(());
        }

        let loaded = match self.repo.load() {
            Ok(stored) => stored,
            Err(RepoError::CorruptSnapshot(detail)) => {
                warn!(
                    "event=list_start module=service status=recovered error_code=corrupt_snapshot detail={detail}"
                );
                // Recover with an explicitly empty collection; the absent-key
                // seed path must not fire on top of lost data.
                Some(Vec::new())
            }
            Err(err) => {
                error!("event=list_start module=service status=error error={err}");
                return Err(err);
            }
        };

        match loaded {
            Some(stored) => {
                for entry in stored {
                    let id = self.allocate_id();
                    match TaskRecord::new(id, entry.text) {
                        Ok(record) => self.tasks.push(record),
                        Err(err) => warn!(
                            "event=list_start module=service status=skipped_entry reason={err}"
                        ),
                    }
                }
                info!(
                    "event=list_start module=service status=ok source=snapshot tasks={}",
                    self.tasks.len()
                );
            }
            None => {
                if let Some(seed) = self.seed_text.take() {
                    let id = self.allocate_id();
                    match TaskRecord::new(id, seed) {
                        Ok(record) => self.tasks.push(record),
                        Err(err) => {
                            debug!("event=list_start module=service status=skipped_seed reason={err}")
                        }
                    }
                }
                info!(
                    "event=list_start module=service status=ok source=empty tasks={}",
                    self.tasks.len()
                );
            }
        }

        self.phase = Phase::Ready;
        self.notify();
        Ok(())
    }

    /// Appends a task built from `text` and schedules a snapshot write.
    ///
    /// Trimmed-empty input is rejected without error, notification or
    /// write; `Ok(None)` reports the rejection. On success the draft is
    /// cleared and the new record's id is returned.
    pub fn add_task(&mut self, text: &str) -> ControllerResult<Option<TaskId>> {
        self.ensure_ready()?;

        let record = match TaskRecord::new(self.next_id, text.trim()) {
            Ok(record) => record,
            Err(err) => {
                debug!("event=list_add module=service status=rejected reason={err}");
                return Ok(None);
            }
        };
        let id = record.id;
        self.next_id += 1;

        self.tasks.push(record);
        self.draft_text.clear();
        self.notify();
        self.schedule_save();
        debug!(
            "event=list_add module=service status=ok id={id} tasks={}",
            self.tasks.len()
        );
        Ok(Some(id))
    }

    /// Adds a task from the current draft (the input field's submit action).
    pub fn submit_draft(&mut self) -> ControllerResult<Option<TaskId>> {
        let draft = self.draft_text.clone();
        self.add_task(&draft)
    }

    /// Removes the record with `id` and schedules a snapshot write.
    ///
    /// Unknown ids are a defensive no-op reported as `Ok(false)`; remaining
    /// records keep their ids and relative order.
    pub fn delete_task(&mut self, id: TaskId) -> ControllerResult<bool> {
        self.ensure_ready()?;

        let Some(position) = self.tasks.iter().position(|task| task.id == id) else {
            debug!("event=list_delete module=service status=noop reason=unknown_id id={id}");
            return Ok(false);
        };

        self.tasks.remove(position);
        self.notify();
        self.schedule_save();
        debug!(
            "event=list_delete module=service status=ok id={id} tasks={}",
            self.tasks.len()
        );
        Ok(true)
    }

    /// Stores the not-yet-submitted input value.
    ///
    /// Allowed in any phase; pure state update, no persistence.
    pub fn update_draft_text(&mut self, text: impl Into<String>) {
        self.draft_text = text.into();
        self.notify();
    }

    /// Returns a read-only snapshot of the current state.
    pub fn state(&self) -> ListState {
        ListState {
            tasks: self.tasks.clone(),
            draft_text: self.draft_text.clone(),
            ready: self.phase == Phase::Ready,
        }
    }

    /// Current session phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Blocks until every scheduled save has completed.
    pub fn flush(&self) -> ControllerResult<()> {
        if self.writer.flush() {
            Ok(())
        } else {
            Err(ControllerError::WriterGone)
        }
    }

    fn ensure_ready(&self) -> ControllerResult<()> {
        if self.phase == Phase::Ready {
            Ok(())
        } else {
            Err(ControllerError::NotReady)
        }
    }

    fn allocate_id(&mut self) -> TaskId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn notify(&mut self) {
        let state = self.state();
        self.observer.state_changed(&state);
    }

    /// Fire-and-forget: write failures stay inside the writer, and an
    /// unreachable writer is logged here, never propagated to the caller.
    fn schedule_save(&self) {
        let snapshot: Vec<StoredTask> = self
            .tasks
            .iter()
            .map(|task| StoredTask {
                text: task.text.clone(),
            })
            .collect();
        if !self.writer.persist(snapshot) {
            error!("event=snapshot_enqueue module=service status=error reason=writer_gone");
        }
    }
}
