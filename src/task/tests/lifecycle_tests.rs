//! Tests for task state transitions and detail edits.

use super::{agent, seeded_store, task_ref};
use crate::task::{
    adapters::memory::InMemoryTaskGraphStore,
    domain::{TaskState, Zone},
    ports::TaskGraphError,
    services::{AssignmentStore, OperationStore, TaskLifecycle},
};
use rstest::{fixture, rstest};
use std::sync::Arc;

#[fixture]
fn store() -> Arc<InMemoryTaskGraphStore> {
    seeded_store()
}

#[rstest]
fn task_moves_through_full_lifecycle(store: Arc<InMemoryTaskGraphStore>) {
    let lifecycle = TaskLifecycle::new(Arc::clone(&store));
    let assignments = AssignmentStore::new(store);
    let t1 = task_ref("op1", "t1");

    assignments
        .claim(&t1, &agent("alice"))
        .expect("claim should succeed");
    let acknowledged = lifecycle.acknowledge(&t1).expect("acknowledge should succeed");
    let completed = lifecycle.complete(&t1).expect("complete should succeed");
    let reopened = lifecycle.incomplete(&t1).expect("incomplete should succeed");

    assert_eq!(acknowledged.state(), TaskState::Acknowledged);
    assert_eq!(completed.state(), TaskState::Completed);
    assert_eq!(reopened.state(), TaskState::Assigned);
}

#[rstest]
fn transitions_do_not_touch_assignments(store: Arc<InMemoryTaskGraphStore>) {
    let lifecycle = TaskLifecycle::new(Arc::clone(&store));
    let assignments = AssignmentStore::new(store);
    let t1 = task_ref("op1", "t1");
    assignments
        .replace_assignments(&t1, &[agent("alice")])
        .expect("replace should succeed");

    lifecycle.complete(&t1).expect("complete should succeed");

    assert_eq!(
        assignments
            .list_assignments(&t1)
            .expect("list should succeed"),
        vec![agent("alice")]
    );
}

#[rstest]
fn reject_returns_completed_task_to_pending(store: Arc<InMemoryTaskGraphStore>) {
    let lifecycle = TaskLifecycle::new(Arc::clone(&store));
    let assignments = AssignmentStore::new(Arc::clone(&store));
    let t1 = task_ref("op1", "t1");
    assignments
        .claim(&t1, &agent("alice"))
        .expect("claim should succeed");
    lifecycle.complete(&t1).expect("complete should succeed");

    assignments
        .reject(&t1, &agent("alice"))
        .expect("reject should succeed");

    let view = OperationStore::new(store)
        .get_task(&t1)
        .expect("task should load");
    assert_eq!(view.task().state(), TaskState::Pending);
    assert!(view.assignments().is_empty());
}

#[rstest]
fn detail_edits_persist(store: Arc<InMemoryTaskGraphStore>) {
    let lifecycle = TaskLifecycle::new(store);
    let t2 = task_ref("op1", "t2");

    lifecycle
        .set_comment(&t2, "bring a key")
        .expect("comment should succeed");
    lifecycle
        .set_zone(&t2, Zone::new(3))
        .expect("zone should succeed");
    lifecycle
        .set_order(&t2, 9)
        .expect("order should succeed");
    let edited = lifecycle
        .set_delta_minutes(&t2, 15)
        .expect("delta should succeed");

    assert_eq!(edited.comment(), Some("bring a key"));
    assert_eq!(edited.zone(), Zone::new(3));
    assert_eq!(edited.order(), 9);
    assert_eq!(edited.delta_minutes(), 15);
    assert_eq!(edited.state(), TaskState::Pending);
}

#[rstest]
fn blank_comment_clears_existing_comment(store: Arc<InMemoryTaskGraphStore>) {
    let lifecycle = TaskLifecycle::new(store);
    let t2 = task_ref("op1", "t2");
    lifecycle
        .set_comment(&t2, "bring a key")
        .expect("comment should succeed");

    let cleared = lifecycle
        .set_comment(&t2, "  ")
        .expect("clear should succeed");

    assert_eq!(cleared.comment(), None);
}

#[rstest]
fn transition_on_missing_task_is_not_found(store: Arc<InMemoryTaskGraphStore>) {
    let lifecycle = TaskLifecycle::new(store);

    let result = lifecycle.complete(&task_ref("op1", "ghost"));

    assert!(matches!(result, Err(TaskGraphError::TaskNotFound(_))));
}
