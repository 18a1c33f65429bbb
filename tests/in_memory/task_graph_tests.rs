//! End-to-end task graph flows observed through the push transport.

use super::helpers::{World, agent, field, op, push_channel, task, token, topic, world};
use fieldops::identity::ports::IdentityDirectory;
use fieldops::notification::domain::data_keys;
use fieldops::task::{
    domain::{TaskDomainError, TaskId, TaskState},
    ports::TaskGraphError,
};
use rstest::rstest;

async fn state_of(world: &World, id: &str) -> TaskState {
    world
        .service
        .get_task(&task(id))
        .await
        .expect("task lookup should succeed")
        .task()
        .state()
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn import_announces_the_operation_to_its_team() {
    let world = world().await;

    let sent = world.transport.sent();
    assert_eq!(sent.len(), 1);
    let announcement = sent.first().expect("one announcement");
    assert_eq!(announcement.destination, topic("T9"));
    assert_eq!(field(announcement, data_keys::CMD), "map_change");
    assert_eq!(field(announcement, data_keys::OPERATION), "op1");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn claim_notifies_the_assignee_then_the_team() {
    let world = world().await;
    let mark = world.transport.sent().len();

    world
        .service
        .claim(&task("m1"), &agent("alice"))
        .await
        .expect("claim should succeed");

    let sent = world.sent_after(mark);
    assert_eq!(sent.len(), 2);
    let direct = sent.first().expect("direct message");
    assert_eq!(direct.destination, token("tok-alice"));
    assert_eq!(field(direct, data_keys::CMD), "marker_assignment_change");
    assert_eq!(field(direct, data_keys::MARKER), "m1");
    assert_eq!(field(direct, data_keys::MSG), "assigned");
    let status = sent.get(1).expect("status broadcast");
    assert_eq!(status.destination, topic("T9"));
    assert_eq!(field(status, data_keys::CMD), "marker_status_change");
    assert_eq!(field(status, data_keys::MSG), "assigned");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn lifecycle_broadcasts_each_state_change() {
    let world = world().await;
    world
        .service
        .claim(&task("m1"), &agent("alice"))
        .await
        .expect("claim should succeed");
    let mark = world.transport.sent().len();

    world
        .service
        .acknowledge(&task("m1"))
        .await
        .expect("acknowledge should succeed");
    world
        .service
        .complete(&task("m1"))
        .await
        .expect("complete should succeed");

    let messages: Vec<String> = world
        .sent_after(mark)
        .iter()
        .map(|message| field(message, data_keys::MSG).to_owned())
        .collect();
    assert_eq!(messages, vec!["acknowledged", "completed"]);
    assert_eq!(state_of(&world, "m1").await, TaskState::Completed);
    let view = world
        .service
        .get_task(&task("m1"))
        .await
        .expect("task lookup should succeed");
    assert_eq!(view.assignments(), [agent("alice")]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn reject_by_the_last_assignee_returns_the_task_to_pending() {
    let world = world().await;
    world
        .service
        .claim(&task("m1"), &agent("bob"))
        .await
        .expect("claim should succeed");

    world
        .service
        .reject(&task("m1"), &agent("bob"))
        .await
        .expect("reject should succeed");

    assert_eq!(state_of(&world, "m1").await, TaskState::Pending);
    assert!(
        !world
            .service
            .is_assigned_to(&task("m1"), &agent("bob"))
            .await
            .expect("lookup should succeed")
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn dependency_cycle_is_rejected_and_the_graph_is_unchanged() {
    let world = world().await;

    let result = world
        .service
        .set_dependencies(&task("m1"), vec![TaskId::new("l1").expect("valid task id")])
        .await;

    assert!(matches!(
        result,
        Err(TaskGraphError::Domain(TaskDomainError::DependencyCycle { .. }))
    ));
    let deps = world
        .service
        .list_dependencies(&task("m1"))
        .await
        .expect("lookup should succeed");
    assert!(deps.is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn update_task_graph_assigns_a_link_and_tells_the_assignee() {
    let world = world().await;
    let mark = world.transport.sent().len();

    let (assigned, depends_on) = world
        .service
        .update_task_graph(&task("l1"), vec![agent("bob")], Vec::new())
        .await
        .expect("update should succeed");

    assert_eq!(assigned, vec![agent("bob")]);
    assert!(depends_on.is_empty());
    assert_eq!(state_of(&world, "l1").await, TaskState::Assigned);
    let sent = world.sent_after(mark);
    let direct = sent.first().expect("direct message");
    assert_eq!(direct.destination, token("tok-bob"));
    assert_eq!(field(direct, data_keys::CMD), "link_assignment_change");
    assert_eq!(field(direct, data_keys::LINK), "l1");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unregistered_token_is_pruned_after_a_claim() {
    let world = world().await;
    world.transport.mark_unregistered("tok-bob");

    world
        .service
        .claim(&task("l1"), &agent("bob"))
        .await
        .expect("claim should succeed despite the dead token");

    let remaining = world
        .directory
        .tokens(&agent("bob"), &push_channel())
        .await
        .expect("token lookup should succeed");
    assert!(remaining.is_empty());
    assert_eq!(state_of(&world, "l1").await, TaskState::Assigned);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deleting_the_operation_announces_and_removes_it() {
    let world = world().await;
    let mark = world.transport.sent().len();

    let removed = world
        .service
        .delete_operation(&op())
        .await
        .expect("delete should succeed");

    assert!(removed);
    let sent = world.sent_after(mark);
    assert_eq!(sent.len(), 1);
    assert!(matches!(
        world.service.get_task(&task("m1")).await,
        Err(TaskGraphError::OperationNotFound(_))
    ));
}
