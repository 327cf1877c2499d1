//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `quicklist_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

use quicklist_core::{MemorySnapshotRepository, NullObserver, TaskListController};
use std::sync::Arc;

fn main() {
    println!("quicklist_core ping={}", quicklist_core::ping());
    println!("quicklist_core version={}", quicklist_core::core_version());

    // In-memory round trip proving the controller/writer wiring links.
    let repo = Arc::new(MemorySnapshotRepository::new());
    let mut list = TaskListController::new(repo, Box::new(NullObserver));
    if let Err(err) = list.start() {
        eprintln!("start failed: {err}");
        return;
    }
    let _ = list.add_task("probe the controller");
    let _ = list.add_task("flush the writer");
    if let Err(err) = list.flush() {
        eprintln!("flush failed: {err}");
        return;
    }
    for task in list.state().tasks {
        println!("task id={} text={}", task.id, task.text);
    }
}
