mod dependency_tests;
mod lifecycle_tests;
mod service_tests;

use crate::identity::domain::AgentId;
use crate::task::{
    adapters::memory::InMemoryTaskGraphStore,
    domain::{OperationId, OperationRecord, Task, TaskId, TaskKind, TaskRef, TaskView},
    services::OperationStore,
};
use std::sync::Arc;

fn op(value: &str) -> OperationId {
    OperationId::new(value).expect("valid operation id")
}

fn task_id(value: &str) -> TaskId {
    TaskId::new(value).expect("valid task id")
}

fn task_ref(operation: &str, task: &str) -> TaskRef {
    TaskRef::from_parts(operation, task).expect("valid task reference")
}

fn agent(value: &str) -> AgentId {
    AgentId::new(value).expect("valid agent id")
}

fn marker(id: &str, order: i16) -> TaskView {
    TaskView::new(
        Task::new(op("op1"), task_id(id), TaskKind::Marker).with_order(order),
        Vec::new(),
        Vec::new(),
    )
}

/// Store seeded with operation `op1` holding markers `t1`, `t2` and `t3`.
fn seeded_store() -> Arc<InMemoryTaskGraphStore> {
    let store = Arc::new(InMemoryTaskGraphStore::new());
    OperationStore::new(Arc::clone(&store))
        .create_operation(
            OperationRecord::new(op("op1"), "Fountain sweep"),
            vec![marker("t1", 1), marker("t2", 2), marker("t3", 3)],
        )
        .expect("seed import should succeed");
    store
}
