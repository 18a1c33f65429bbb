mod domain_tests;

use crate::identity::{
    adapters::memory::InMemoryIdentityDirectory,
    domain::{AgentId, ChannelName, TeamId},
};
use crate::notification::domain::{Command, Envelope};
use crate::task::domain::TaskRef;
use mockable::DefaultClock;

fn agent(value: &str) -> AgentId {
    AgentId::new(value).expect("valid agent id")
}

fn team(value: &str) -> TeamId {
    TeamId::new(value).expect("valid team id")
}

fn channel(value: &str) -> ChannelName {
    ChannelName::new(value).expect("valid channel name")
}

fn marker(operation: &str, task: &str) -> TaskRef {
    TaskRef::from_parts(operation, task).expect("valid task reference")
}

fn envelope(command: Command) -> Envelope {
    Envelope::new(command, &DefaultClock)
}

fn marker_status(team_id: &str) -> Envelope {
    envelope(Command::MarkerStatusChange {
        team: team(team_id),
        marker: marker("op1", "m1"),
        message: "done".to_owned(),
    })
}

async fn directory_with_tokens(
    owner: &str,
    channel_name: &str,
    tokens: &[&str],
) -> InMemoryIdentityDirectory {
    use crate::identity::ports::IdentityDirectory;

    let directory = InMemoryIdentityDirectory::new();
    for token in tokens {
        directory
            .add_token(&agent(owner), &channel(channel_name), token)
            .await
            .expect("token registration should succeed");
    }
    directory
}
