//! Shared fixtures for in-memory integration tests.

use fieldops::config::FieldOpsConfig;
use fieldops::identity::{
    adapters::memory::InMemoryIdentityDirectory,
    domain::{AgentId, ChannelName, TeamId},
    ports::IdentityDirectory,
};
use fieldops::notification::{
    adapters::push::{InMemoryPushTransport, PushChannel, PushDestination, PushMessage},
    services::{Dispatcher, NotificationBus},
};
use fieldops::task::{
    adapters::memory::InMemoryTaskGraphStore,
    domain::{OperationId, OperationRecord, Task, TaskId, TaskKind, TaskRef, TaskView},
    services::TaskGraphService,
};
use mockable::DefaultClock;
use std::sync::Arc;

/// A fully wired in-memory deployment.
///
/// Team `T9` is owned by `alice` and has `bob` as a member. Both agents
/// hold one push token. Operation `op1` is shared with `T9` and holds
/// marker `m1` and link `l1`, which depends on `m1`.
pub struct World {
    pub directory: Arc<InMemoryIdentityDirectory>,
    pub transport: InMemoryPushTransport,
    pub bus: Arc<NotificationBus>,
    pub dispatcher: Arc<Dispatcher>,
    pub service: TaskGraphService<InMemoryTaskGraphStore>,
}

impl World {
    /// Messages delivered after the first `mark` messages.
    pub fn sent_after(&self, mark: usize) -> Vec<PushMessage> {
        self.transport.sent().into_iter().skip(mark).collect()
    }
}

pub fn agent(value: &str) -> AgentId {
    AgentId::new(value).expect("valid agent id")
}

pub fn team() -> TeamId {
    TeamId::new("T9").expect("valid team id")
}

pub fn push_channel() -> ChannelName {
    ChannelName::new("push").expect("valid channel name")
}

pub fn op() -> OperationId {
    OperationId::new("op1").expect("valid operation id")
}

pub fn task(id: &str) -> TaskRef {
    TaskRef::from_parts("op1", id).expect("valid task reference")
}

pub fn token(value: &str) -> PushDestination {
    PushDestination::Token(value.to_owned())
}

pub fn topic(value: &str) -> PushDestination {
    PushDestination::Topic(value.to_owned())
}

/// Reads a data field, or an empty string when absent.
pub fn field<'a>(message: &'a PushMessage, key: &str) -> &'a str {
    message.data.get(key).map_or("", String::as_str)
}

pub async fn world() -> World {
    let directory = Arc::new(InMemoryIdentityDirectory::new());
    directory
        .create_team(team(), agent("alice"))
        .expect("team creation should succeed");
    directory
        .add_member(&team(), agent("bob"))
        .expect("member registration should succeed");
    for (owner, raw) in [("alice", "tok-alice"), ("bob", "tok-bob")] {
        directory
            .add_token(&agent(owner), &push_channel(), raw)
            .await
            .expect("token registration should succeed");
    }

    let config = FieldOpsConfig::default();
    let transport = InMemoryPushTransport::new();
    let push = PushChannel::from_config(
        &config,
        Arc::new(transport.clone()),
        directory.clone(),
    )
    .expect("default configuration is valid");
    let bus = Arc::new(NotificationBus::new());
    bus.register(push.channel().clone(), Arc::new(push));
    let dispatcher = Arc::new(Dispatcher::from_config(
        &config.notification,
        Arc::clone(&bus),
        directory.clone(),
        Arc::new(DefaultClock),
    ));

    let service = TaskGraphService::new(Arc::new(InMemoryTaskGraphStore::new()))
        .with_dispatcher(Arc::clone(&dispatcher));
    let marker = Task::new(
        op(),
        TaskId::new("m1").expect("valid task id"),
        TaskKind::Marker,
    )
    .with_order(1);
    let link = Task::new(
        op(),
        TaskId::new("l1").expect("valid task id"),
        TaskKind::Link,
    )
    .with_order(2);
    service
        .create_operation(
            OperationRecord::new(op(), "Fountain sweep").with_teams([team()]),
            vec![
                TaskView::new(marker, Vec::new(), Vec::new()),
                TaskView::new(
                    link,
                    Vec::new(),
                    vec![TaskId::new("m1").expect("valid task id")],
                ),
            ],
        )
        .await
        .expect("import should succeed");

    World {
        directory,
        transport,
        bus,
        dispatcher,
        service,
    }
}
