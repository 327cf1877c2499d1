use quicklist_core::{
    ControllerError, ListState, MemorySnapshotRepository, StateObserver, TaskListController,
};
use std::sync::{Arc, Mutex};

struct RecordingObserver {
    states: Arc<Mutex<Vec<ListState>>>,
}

impl StateObserver for RecordingObserver {
    fn state_changed(&mut self, state: &ListState) {
        self.states.lock().unwrap().push(state.clone());
    }
}

type Controller = TaskListController<MemorySnapshotRepository>;

fn controller() -> (
    Controller,
    Arc<MemorySnapshotRepository>,
    Arc<Mutex<Vec<ListState>>>,
) {
    let repo = Arc::new(MemorySnapshotRepository::new());
    let states = Arc::new(Mutex::new(Vec::new()));
    let observer = RecordingObserver {
        states: Arc::clone(&states),
    };
    let list = TaskListController::new(Arc::clone(&repo), Box::new(observer));
    (list, repo, states)
}

fn texts(list: &Controller) -> Vec<String> {
    list.state()
        .tasks
        .into_iter()
        .map(|task| task.text)
        .collect()
}

#[test]
fn mutations_are_rejected_while_loading() {
    let (mut list, _repo, _states) = controller();

    assert_eq!(list.add_task("too early"), Err(ControllerError::NotReady));
    assert_eq!(list.delete_task(1), Err(ControllerError::NotReady));
    assert!(!list.state().ready);
}

#[test]
fn draft_updates_are_allowed_while_loading() {
    let (mut list, _repo, states) = controller();

    list.update_draft_text("half-ty");

    let state = list.state();
    assert_eq!(state.draft_text, "half-ty");
    assert!(!state.ready);

    let recorded = states.lock().unwrap();
    assert_eq!(recorded.len(), 1);
    assert!(!recorded[0].ready);
}

#[test]
fn start_with_empty_store_becomes_ready_and_notifies() {
    let (mut list, _repo, states) = controller();

    list.start().unwrap();

    let state = list.state();
    assert!(state.ready);
    assert!(state.tasks.is_empty());

    let recorded = states.lock().unwrap();
    assert_eq!(recorded.len(), 1);
    assert!(recorded[0].ready);
}

#[test]
fn start_rebuilds_the_collection_in_stored_order() {
    let (mut list, repo, _states) = controller();
    repo.set_stored_value(Some(r#"[{"text":"A"},{"text":"B"},{"text":"C"}]"#.to_string()));

    list.start().unwrap();

    assert_eq!(texts(&list), ["A", "B", "C"]);
    let ids: Vec<u64> = list.state().tasks.iter().map(|task| task.id).collect();
    assert_eq!(ids, [1, 2, 3]);
}

#[test]
fn start_recovers_from_corrupt_snapshot_with_empty_list() {
    let (mut list, repo, _states) = controller();
    repo.set_stored_value(Some("definitely not json".to_string()));

    list.start().unwrap();

    let state = list.state();
    assert!(state.ready);
    assert!(state.tasks.is_empty());
}

#[test]
fn start_is_idempotent_once_ready() {
    let (mut list, _repo, states) = controller();

    list.start().unwrap();
    list.start().unwrap();

    assert_eq!(states.lock().unwrap().len(), 1);
}

#[test]
fn seed_appears_only_on_first_empty_start() {
    let repo = Arc::new(MemorySnapshotRepository::new());
    let mut list = TaskListController::new(Arc::clone(&repo), Box::new(quicklist_core::NullObserver))
        .with_seed_text("Start by adding a task!");
    list.start().unwrap();
    assert_eq!(texts(&list), ["Start by adding a task!"]);

    let stored_repo = Arc::new(MemorySnapshotRepository::new());
    stored_repo.set_stored_value(Some(r#"[{"text":"existing"}]"#.to_string()));
    let mut stored_list =
        TaskListController::new(Arc::clone(&stored_repo), Box::new(quicklist_core::NullObserver))
            .with_seed_text("Start by adding a task!");
    stored_list.start().unwrap();
    assert_eq!(texts(&stored_list), ["existing"]);
}

#[test]
fn seed_is_suppressed_on_corrupt_fallback() {
    let repo = Arc::new(MemorySnapshotRepository::new());
    repo.set_stored_value(Some("garbage".to_string()));
    let mut list = TaskListController::new(Arc::clone(&repo), Box::new(quicklist_core::NullObserver))
        .with_seed_text("Start by adding a task!");

    list.start().unwrap();

    assert!(list.state().tasks.is_empty());
}

#[test]
fn length_tracks_successful_adds_minus_deletes() {
    let (mut list, _repo, _states) = controller();
    list.start().unwrap();

    let a = list.add_task("A").unwrap().unwrap();
    let _b = list.add_task("B").unwrap().unwrap();
    assert!(list.add_task("   ").unwrap().is_none());
    let c = list.add_task("C").unwrap().unwrap();
    assert_eq!(list.state().tasks.len(), 3);

    assert!(list.delete_task(a).unwrap());
    assert!(!list.delete_task(999).unwrap());
    assert!(list.delete_task(c).unwrap());
    assert_eq!(list.state().tasks.len(), 1);

    // Deleting the last record never drives the length negative.
    let remaining = list.state().tasks[0].id;
    assert!(list.delete_task(remaining).unwrap());
    assert!(!list.delete_task(remaining).unwrap());
    assert!(list.state().tasks.is_empty());
}

#[test]
fn empty_and_whitespace_adds_change_nothing() {
    let (mut list, _repo, states) = controller();
    list.start().unwrap();
    let notifications_after_start = states.lock().unwrap().len();

    assert!(list.add_task("").unwrap().is_none());
    assert!(list.add_task("   ").unwrap().is_none());

    assert!(list.state().tasks.is_empty());
    // Rejected input produces no notification and no write.
    assert_eq!(states.lock().unwrap().len(), notifications_after_start);
}

#[test]
fn add_stores_trimmed_text_and_clears_the_draft() {
    let (mut list, _repo, _states) = controller();
    list.start().unwrap();

    list.update_draft_text("  Buy milk  ");
    let id = list.submit_draft().unwrap().unwrap();

    let state = list.state();
    assert_eq!(state.tasks.len(), 1);
    assert_eq!(state.tasks[0].id, id);
    assert_eq!(state.tasks[0].text, "Buy milk");
    assert_eq!(state.draft_text, "");
}

#[test]
fn submitting_an_empty_draft_is_a_noop() {
    let (mut list, _repo, _states) = controller();
    list.start().unwrap();

    list.update_draft_text("   ");
    assert!(list.submit_draft().unwrap().is_none());
    assert!(list.state().tasks.is_empty());
}

#[test]
fn deleting_the_middle_record_preserves_order_and_ids() {
    let (mut list, _repo, _states) = controller();
    list.start().unwrap();

    let a = list.add_task("A").unwrap().unwrap();
    let b = list.add_task("B").unwrap().unwrap();
    let c = list.add_task("C").unwrap().unwrap();

    assert!(list.delete_task(b).unwrap());

    assert_eq!(texts(&list), ["A", "C"]);
    let ids: Vec<u64> = list.state().tasks.iter().map(|task| task.id).collect();
    assert_eq!(ids, [a, c]);
}

#[test]
fn deleting_an_unknown_id_is_a_silent_noop() {
    let (mut list, _repo, states) = controller();
    list.start().unwrap();
    list.add_task("A").unwrap();
    list.add_task("B").unwrap();
    list.add_task("C").unwrap();
    let before = states.lock().unwrap().len();

    assert!(!list.delete_task(42).unwrap());

    assert_eq!(texts(&list), ["A", "B", "C"]);
    assert_eq!(states.lock().unwrap().len(), before);
}

#[test]
fn ids_are_never_reused_after_deletion() {
    let (mut list, _repo, _states) = controller();
    list.start().unwrap();

    let a = list.add_task("A").unwrap().unwrap();
    list.delete_task(a).unwrap();
    let b = list.add_task("B").unwrap().unwrap();

    assert!(b > a);
}

#[test]
fn observer_sees_states_in_mutation_order() {
    let (mut list, _repo, states) = controller();
    list.start().unwrap();

    let a = list.add_task("A").unwrap().unwrap();
    list.add_task("B").unwrap();
    list.delete_task(a).unwrap();

    let counts: Vec<usize> = states
        .lock()
        .unwrap()
        .iter()
        .map(|state| state.tasks.len())
        .collect();
    assert_eq!(counts, [0, 1, 2, 1]);
}

#[test]
fn mutations_reach_the_store_after_flush() {
    let (mut list, repo, _states) = controller();
    list.start().unwrap();

    list.add_task("Buy milk").unwrap();
    list.add_task("Walk the dog").unwrap();
    list.flush().unwrap();

    assert_eq!(
        repo.stored_value().as_deref(),
        Some(r#"[{"text":"Buy milk"},{"text":"Walk the dog"}]"#)
    );
}

#[test]
fn failed_save_is_retried_once() {
    let (mut list, repo, _states) = controller();
    list.start().unwrap();

    repo.fail_next_saves(1);
    list.add_task("survives one failure").unwrap();
    list.flush().unwrap();

    assert_eq!(
        repo.stored_value().as_deref(),
        Some(r#"[{"text":"survives one failure"}]"#)
    );
}

#[test]
fn dropped_write_heals_on_the_next_mutation() {
    let (mut list, repo, _states) = controller();
    list.start().unwrap();

    repo.fail_next_saves(2);
    list.add_task("A").unwrap();
    list.flush().unwrap();
    // Both attempts failed; the store still holds nothing.
    assert!(repo.stored_value().is_none());

    list.add_task("B").unwrap();
    list.flush().unwrap();

    // The next snapshot carries the full state, so nothing stays lost.
    assert_eq!(
        repo.stored_value().as_deref(),
        Some(r#"[{"text":"A"},{"text":"B"}]"#)
    );
}
