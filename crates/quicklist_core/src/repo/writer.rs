//! Background snapshot writer.
//!
//! # Responsibility
//! - Apply snapshot saves off the caller thread, strictly in issue order.
//! - Absorb write failures so the session stays interactive.
//!
//! # Invariants
//! - Saves complete in the order they were enqueued; a completed newer
//!   write is never overwritten by an older one.
//! - `flush` returns only after every save enqueued before it has been
//!   applied or given up on.
//! - A failed save is retried exactly once, then dropped with an error
//!   event; the next enqueued snapshot carries the full state anyway.

use crate::repo::snapshot_repo::{SnapshotRepository, StoredTask};
use log::{debug, error, info};
use std::sync::mpsc::{self, Receiver, Sender, SyncSender};
use std::sync::Arc;
use std::thread::JoinHandle;

enum WriterCommand {
    Persist(Vec<StoredTask>),
    Flush(SyncSender<()>),
}

/// Handle to the background writer thread.
///
/// Dropping the handle closes the queue; the worker drains the remaining
/// saves and exits before the drop returns.
pub struct SnapshotWriter {
    tx: Option<Sender<WriterCommand>>,
    worker: Option<JoinHandle<()>>,
}

impl SnapshotWriter {
    /// Spawns the writer over a shared repository.
    pub fn spawn<R>(repo: Arc<R>) -> Self
    where
        R: SnapshotRepository + Send + Sync + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let worker = std::thread::spawn(move || run_writer(repo, rx));
        Self {
            tx: Some(tx),
            worker: Some(worker),
        }
    }

    /// Enqueues a full-snapshot save.
    ///
    /// Returns `false` when the writer is no longer accepting work.
    pub fn persist(&self, tasks: Vec<StoredTask>) -> bool {
        match &self.tx {
            Some(tx) => tx.send(WriterCommand::Persist(tasks)).is_ok(),
            None => false,
        }
    }

    /// Blocks until every save enqueued before this call has completed.
    ///
    /// Returns `false` when the writer is gone.
    pub fn flush(&self) -> bool {
        let Some(tx) = &self.tx else {
            return false;
        };
        let (ack_tx, ack_rx) = mpsc::sync_channel(1);
        if tx.send(WriterCommand::Flush(ack_tx)).is_err() {
            return false;
        }
        ack_rx.recv().is_ok()
    }
}

impl Drop for SnapshotWriter {
    fn drop(&mut self) {
        // Closing the sender ends the worker's recv loop after the queue
        // drains, so pending saves still land before shutdown.
        self.tx.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("event=writer_stop module=repo status=error reason=worker_panicked");
            }
        }
    }
}

fn run_writer<R>(repo: Arc<R>, rx: Receiver<WriterCommand>)
where
    R: SnapshotRepository,
{
    debug!("event=writer_start module=repo status=ok");
    while let Ok(command) = rx.recv() {
        match command {
            WriterCommand::Persist(tasks) => persist_with_retry(repo.as_ref(), &tasks),
            WriterCommand::Flush(ack) => {
                // The flusher may have stopped waiting; a closed ack is fine.
                let _ = ack.send(());
            }
        }
    }
    debug!("event=writer_stop module=repo status=ok");
}

fn persist_with_retry<R>(repo: &R, tasks: &[StoredTask])
where
    R: SnapshotRepository + ?Sized,
{
    match repo.save(tasks) {
        Ok(()) => debug!(
            "event=snapshot_save module=repo status=ok tasks={}",
            tasks.len()
        ),
        Err(first) => {
            error!(
                "event=snapshot_save module=repo status=error attempt=1 tasks={} error={first}",
                tasks.len()
            );
            match repo.save(tasks) {
                Ok(()) => info!(
                    "event=snapshot_save module=repo status=ok attempt=2 tasks={}",
                    tasks.len()
                ),
                Err(second) => error!(
                    "event=snapshot_save module=repo status=dropped attempt=2 tasks={} error={second}",
                    tasks.len()
                ),
            }
        }
    }
}
