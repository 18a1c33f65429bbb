//! Tests for the async task graph service and its post-commit
//! notifications.

use super::{agent, marker, op, task_id, task_ref};
use crate::identity::{
    adapters::memory::InMemoryIdentityDirectory,
    domain::{ChannelName, TeamId},
    ports::IdentityDirectory,
};
use crate::notification::{
    adapters::memory::{RecordedCall, RecordingChannel},
    domain::CommandCode,
    ports::ChannelError,
    services::{Dispatcher, NotificationBus},
};
use crate::task::{
    adapters::memory::InMemoryTaskGraphStore,
    domain::{OperationRecord, TaskDomainError, TaskState, Zone},
    ports::TaskGraphError,
    services::TaskGraphService,
};
use mockable::DefaultClock;
use rstest::rstest;
use std::sync::Arc;

struct Harness {
    store: Arc<InMemoryTaskGraphStore>,
    push: RecordingChannel,
    service: TaskGraphService<InMemoryTaskGraphStore>,
}

impl Harness {
    fn calls_after(&self, mark: usize) -> Vec<RecordedCall> {
        self.push.calls().into_iter().skip(mark).collect()
    }
}

fn push_name() -> ChannelName {
    ChannelName::new("push").expect("valid channel name")
}

async fn harness() -> Harness {
    let directory = Arc::new(InMemoryIdentityDirectory::new());
    directory
        .add_token(&agent("alice"), &push_name(), "tok-a")
        .await
        .expect("token registration should succeed");
    let push = RecordingChannel::new(push_name(), directory.clone());
    let bus = Arc::new(NotificationBus::new());
    bus.register(push_name(), Arc::new(push.clone()));
    let dispatcher = Dispatcher::new(bus, directory, Arc::new(DefaultClock));

    let store = Arc::new(InMemoryTaskGraphStore::new());
    let service =
        TaskGraphService::new(Arc::clone(&store)).with_dispatcher(Arc::new(dispatcher));
    service
        .create_operation(
            OperationRecord::new(op("op1"), "Fountain sweep")
                .with_teams([TeamId::new("T9").expect("valid team id")]),
            vec![marker("t1", 1), marker("t2", 2)],
        )
        .await
        .expect("import should succeed");

    Harness {
        store,
        push,
        service,
    }
}

fn codes(calls: &[RecordedCall]) -> Vec<CommandCode> {
    calls
        .iter()
        .filter_map(|call| match call {
            RecordedCall::Direct { command, .. } | RecordedCall::Topic { command, .. } => {
                Some(*command)
            }
            _ => None,
        })
        .collect()
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn import_announces_map_change_to_operation_teams() {
    let fixture = harness().await;

    assert_eq!(codes(&fixture.push.calls()), vec![CommandCode::MapChange]);
    assert_eq!(fixture.push.topic_sends(), vec!["T9".to_owned()]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn claim_notifies_assignee_then_team() {
    let fixture = harness().await;
    let mark = fixture.push.calls().len();

    fixture
        .service
        .claim(&task_ref("op1", "t1"), &agent("alice"))
        .await
        .expect("claim should succeed");

    let calls = fixture.calls_after(mark);
    assert_eq!(
        codes(&calls),
        vec![
            CommandCode::MarkerAssignmentChange,
            CommandCode::MarkerStatusChange
        ]
    );
    assert!(matches!(
        calls.first(),
        Some(RecordedCall::Direct { token, .. }) if token == "tok-a"
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn claims_by_two_agents_keep_both() {
    let fixture = harness().await;
    let t1 = task_ref("op1", "t1");

    fixture
        .service
        .claim(&t1, &agent("agent-A"))
        .await
        .expect("first claim should succeed");
    fixture
        .service
        .claim(&t1, &agent("agent-B"))
        .await
        .expect("second claim should succeed");

    let view = fixture.service.get_task(&t1).await.expect("task should load");
    assert_eq!(view.task().state(), TaskState::Assigned);
    assert_eq!(view.assignments(), &[agent("agent-A"), agent("agent-B")]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_claims_by_two_agents_keep_both() {
    let fixture = harness().await;
    let t1 = task_ref("op1", "t1");

    let claims: Vec<_> = ["agent-A", "agent-B"]
        .into_iter()
        .map(|name| {
            let service = fixture.service.clone();
            let task = t1.clone();
            tokio::spawn(async move { service.claim(&task, &agent(name)).await })
        })
        .collect();
    for claim in claims {
        claim
            .await
            .expect("claim task should not panic")
            .expect("claim should succeed");
    }

    let view = fixture.service.get_task(&t1).await.expect("task should load");
    let mut assignees = view.assignments().to_vec();
    assignees.sort();
    assert_eq!(assignees, vec![agent("agent-A"), agent("agent-B")]);
    assert_eq!(view.task().state(), TaskState::Assigned);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn channel_failure_does_not_fail_the_mutation() {
    let fixture = harness().await;
    fixture
        .push
        .fail_topic_sends(ChannelError::Transport("gateway down".to_owned()));

    let completed = fixture
        .service
        .complete(&task_ref("op1", "t2"))
        .await
        .expect("complete should succeed despite channel failure");

    assert_eq!(completed.state(), TaskState::Completed);
    assert_eq!(
        fixture
            .service
            .get_task(&task_ref("op1", "t2"))
            .await
            .expect("task should load")
            .task()
            .state(),
        TaskState::Completed
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn detail_edit_announces_map_change() {
    let fixture = harness().await;
    let mark = fixture.push.calls().len();

    let edited = fixture
        .service
        .set_zone(&task_ref("op1", "t2"), Zone::new(4))
        .await
        .expect("zone edit should succeed");

    assert_eq!(edited.zone(), Zone::new(4));
    assert_eq!(codes(&fixture.calls_after(mark)), vec![CommandCode::MapChange]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_mutation_sends_nothing() {
    let fixture = harness().await;
    let mark = fixture.push.calls().len();

    let result = fixture
        .service
        .reject(&task_ref("op1", "t1"), &agent("alice"))
        .await;

    assert!(matches!(result, Err(TaskGraphError::NotAssigned { .. })));
    assert!(fixture.calls_after(mark).is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn update_task_graph_writes_both_sets() {
    let fixture = harness().await;
    let t2 = task_ref("op1", "t2");

    let (assigned, depends_on) = fixture
        .service
        .update_task_graph(&t2, vec![agent("alice")], vec![task_id("t1")])
        .await
        .expect("update should succeed");

    assert_eq!(assigned, vec![agent("alice")]);
    assert_eq!(depends_on, vec![task_id("t1")]);
    let view = fixture.service.get_task(&t2).await.expect("task should load");
    assert_eq!(view.task().state(), TaskState::Assigned);
    assert_eq!(view.depends_on(), &[task_id("t1")]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn update_task_graph_rolls_back_both_sets_on_failure() {
    let fixture = harness().await;
    let t2 = task_ref("op1", "t2");
    fixture
        .store
        .fail_next_transaction_after_writes(3)
        .expect("injection should succeed");

    let result = fixture
        .service
        .update_task_graph(&t2, vec![agent("alice")], vec![task_id("t1")])
        .await;

    assert!(matches!(result, Err(TaskGraphError::Persistence(_))));
    let view = fixture.service.get_task(&t2).await.expect("task should load");
    assert!(view.depends_on().is_empty());
    assert!(view.assignments().is_empty());
    assert_eq!(view.task().state(), TaskState::Pending);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn update_task_graph_rejects_cycle_before_any_write() {
    let fixture = harness().await;
    fixture
        .service
        .set_dependencies(&task_ref("op1", "t1"), vec![task_id("t2")])
        .await
        .expect("edge should be written");

    let result = fixture
        .service
        .update_task_graph(
            &task_ref("op1", "t2"),
            vec![agent("alice")],
            vec![task_id("t1")],
        )
        .await;

    assert!(matches!(
        result,
        Err(TaskGraphError::Domain(TaskDomainError::DependencyCycle { .. }))
    ));
    assert!(fixture
        .service
        .list_assignments(&task_ref("op1", "t2"))
        .await
        .expect("list should succeed")
        .is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn service_without_dispatcher_still_mutates() {
    let store = Arc::new(InMemoryTaskGraphStore::new());
    let service = TaskGraphService::new(store);
    service
        .create_operation(OperationRecord::new(op("op1"), "Quiet"), vec![marker("t1", 1)])
        .await
        .expect("import should succeed");

    service
        .replace_assignments(&task_ref("op1", "t1"), vec![agent("alice")])
        .await
        .expect("replace should succeed");
    service
        .clear_assignments(&task_ref("op1", "t1"))
        .await
        .expect("clear should succeed");

    let view = service
        .get_task_by_order(&op("op1"), 1)
        .await
        .expect("order 1 exists");
    assert_eq!(view.task().state(), TaskState::Pending);
    assert!(!service
        .is_assigned_to(&task_ref("op1", "t1"), &agent("alice"))
        .await
        .expect("check should succeed"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deleting_operation_announces_and_removes_it() {
    let fixture = harness().await;
    let mark = fixture.push.calls().len();

    let removed = fixture
        .service
        .delete_operation(&op("op1"))
        .await
        .expect("delete should succeed");

    assert!(removed);
    assert_eq!(codes(&fixture.calls_after(mark)), vec![CommandCode::MapChange]);
    assert!(matches!(
        fixture.service.load_operation(&op("op1")).await,
        Err(TaskGraphError::OperationNotFound(_))
    ));
}
