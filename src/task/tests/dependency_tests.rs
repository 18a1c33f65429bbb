//! Tests for the dependency store.

use super::{op, seeded_store, task_id, task_ref};
use crate::task::{
    adapters::memory::InMemoryTaskGraphStore,
    domain::{TaskDomainError, TaskId},
    ports::TaskGraphError,
    services::DependencyStore,
};
use rstest::{fixture, rstest};
use std::sync::Arc;

struct Fixture {
    store: Arc<InMemoryTaskGraphStore>,
    dependencies: DependencyStore<InMemoryTaskGraphStore>,
}

#[fixture]
fn fixture() -> Fixture {
    let store = seeded_store();
    Fixture {
        dependencies: DependencyStore::new(Arc::clone(&store)),
        store,
    }
}

fn ids(values: &[&str]) -> Vec<TaskId> {
    values.iter().map(|value| task_id(value)).collect()
}

#[rstest]
#[case(&[], &["t1"])]
#[case(&["t1"], &["t3"])]
#[case(&["t1", "t3"], &[])]
#[case(&["t3"], &["t3", "t1"])]
fn set_dependencies_replaces_prior_set(
    fixture: Fixture,
    #[case] prior: &[&str],
    #[case] next: &[&str],
) {
    let t2 = task_ref("op1", "t2");
    fixture
        .dependencies
        .set_dependencies(&t2, &ids(prior))
        .expect("prior write should succeed");

    fixture
        .dependencies
        .set_dependencies(&t2, &ids(next))
        .expect("replacement should succeed");

    assert_eq!(
        fixture
            .dependencies
            .list_dependencies(&t2)
            .expect("list should succeed"),
        ids(next)
    );
}

#[rstest]
fn dependencies_can_be_cleared(fixture: Fixture) {
    let t2 = task_ref("op1", "t2");
    fixture
        .dependencies
        .set_dependencies(&t2, &ids(&["t1"]))
        .expect("write should succeed");
    assert_eq!(
        fixture
            .dependencies
            .list_dependencies(&t2)
            .expect("list should succeed"),
        ids(&["t1"])
    );

    fixture
        .dependencies
        .set_dependencies(&t2, &[])
        .expect("clear should succeed");

    assert!(fixture
        .dependencies
        .list_dependencies(&t2)
        .expect("list should succeed")
        .is_empty());
}

#[rstest]
fn cycle_is_rejected_without_side_effects(fixture: Fixture) {
    fixture
        .dependencies
        .set_dependencies(&task_ref("op1", "t2"), &ids(&["t1"]))
        .expect("t2 -> t1 should succeed");
    fixture
        .dependencies
        .set_dependencies(&task_ref("op1", "t1"), &ids(&["t3"]))
        .expect("t1 -> t3 should succeed");

    let result = fixture
        .dependencies
        .set_dependencies(&task_ref("op1", "t3"), &ids(&["t2"]));

    assert!(matches!(
        result,
        Err(TaskGraphError::Domain(TaskDomainError::DependencyCycle { .. }))
    ));
    assert!(fixture
        .dependencies
        .list_dependencies(&task_ref("op1", "t3"))
        .expect("list should succeed")
        .is_empty());
}

#[rstest]
fn dependency_on_other_operation_is_rejected(fixture: Fixture) {
    let result = fixture
        .dependencies
        .set_dependencies(&task_ref("op1", "t1"), &ids(&["m9"]));

    assert!(matches!(
        result,
        Err(TaskGraphError::Domain(TaskDomainError::UnknownDependency { .. }))
    ));
}

#[rstest]
fn failed_write_keeps_previous_set(fixture: Fixture) {
    let t2 = task_ref("op1", "t2");
    fixture
        .dependencies
        .set_dependencies(&t2, &ids(&["t1"]))
        .expect("write should succeed");
    fixture
        .store
        .fail_next_transaction_after_writes(1)
        .expect("injection should succeed");

    let result = fixture.dependencies.set_dependencies(&t2, &ids(&["t3"]));

    assert!(matches!(result, Err(TaskGraphError::Persistence(_))));
    assert_eq!(
        fixture
            .dependencies
            .list_dependencies(&t2)
            .expect("list should succeed"),
        ids(&["t1"])
    );
}

#[rstest]
fn single_edge_edits_keep_other_edges(fixture: Fixture) {
    let t3 = task_ref("op1", "t3");
    fixture
        .dependencies
        .add_dependency(&t3, &task_id("t1"))
        .expect("add should succeed");
    fixture
        .dependencies
        .add_dependency(&t3, &task_id("t2"))
        .expect("add should succeed");
    fixture
        .dependencies
        .add_dependency(&t3, &task_id("t2"))
        .expect("repeated add should succeed");

    let removed = fixture
        .dependencies
        .remove_dependency(&t3, &task_id("t1"))
        .expect("remove should succeed");
    let removed_again = fixture
        .dependencies
        .remove_dependency(&t3, &task_id("t1"))
        .expect("remove should succeed");

    assert!(removed);
    assert!(!removed_again);
    assert_eq!(
        fixture
            .dependencies
            .list_dependencies(&t3)
            .expect("list should succeed"),
        ids(&["t2"])
    );
}

#[rstest]
fn add_dependency_rejects_cycle(fixture: Fixture) {
    fixture
        .dependencies
        .add_dependency(&task_ref("op1", "t2"), &task_id("t1"))
        .expect("add should succeed");

    let result = fixture
        .dependencies
        .add_dependency(&task_ref("op1", "t1"), &task_id("t2"));

    assert!(matches!(
        result,
        Err(TaskGraphError::Domain(TaskDomainError::DependencyCycle { .. }))
    ));
}

#[rstest]
fn opposite_edges_written_concurrently_never_form_a_cycle(fixture: Fixture) {
    let results = std::thread::scope(|scope| {
        let forward = scope.spawn(|| {
            fixture
                .dependencies
                .add_dependency(&task_ref("op1", "t1"), &task_id("t2"))
        });
        let backward = scope.spawn(|| {
            fixture
                .dependencies
                .add_dependency(&task_ref("op1", "t2"), &task_id("t1"))
        });
        [
            forward.join().expect("writer thread should not panic"),
            backward.join().expect("writer thread should not panic"),
        ]
    });

    assert_eq!(results.iter().filter(|result| result.is_ok()).count(), 1);
    assert!(results.iter().any(|result| matches!(
        result,
        Err(TaskGraphError::Domain(TaskDomainError::DependencyCycle { .. }))
    )));
    let cache = fixture
        .dependencies
        .precache_dependencies(&op("op1"))
        .expect("precache should succeed");
    assert_eq!(cache.values().map(Vec::len).sum::<usize>(), 1);
}

#[rstest]
fn precache_groups_edges_by_task(fixture: Fixture) {
    fixture
        .dependencies
        .set_dependencies(&task_ref("op1", "t3"), &ids(&["t1", "t2"]))
        .expect("write should succeed");

    let cache = fixture
        .dependencies
        .precache_dependencies(&op("op1"))
        .expect("precache should succeed");

    assert_eq!(cache.get(&task_id("t3")), Some(&ids(&["t1", "t2"])));
    assert_eq!(cache.get(&task_id("t1")), None);
}

#[rstest]
fn listing_missing_task_is_not_found(fixture: Fixture) {
    let result = fixture
        .dependencies
        .list_dependencies(&task_ref("op1", "ghost"));

    assert!(matches!(result, Err(TaskGraphError::TaskNotFound(_))));
}
