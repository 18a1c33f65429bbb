//! Unit tests for the in-memory identity directory.

use crate::identity::{
    adapters::memory::InMemoryIdentityDirectory,
    domain::{AgentId, ChannelName, TeamId},
    ports::{IdentityDirectory, IdentityError},
};
use rstest::{fixture, rstest};

fn agent(value: &str) -> AgentId {
    AgentId::new(value).expect("valid agent id")
}

fn push() -> ChannelName {
    ChannelName::new("push").expect("valid channel name")
}

#[fixture]
fn directory() -> InMemoryIdentityDirectory {
    InMemoryIdentityDirectory::new()
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn add_token_is_idempotent(directory: InMemoryIdentityDirectory) {
    let alice = agent("alice");
    directory
        .add_token(&alice, &push(), "tok-1")
        .await
        .expect("add should succeed");
    directory
        .add_token(&alice, &push(), "tok-1")
        .await
        .expect("add should succeed");

    let tokens = directory
        .tokens(&alice, &push())
        .await
        .expect("lookup should succeed");

    assert_eq!(tokens, vec!["tok-1".to_owned()]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn tokens_are_scoped_per_channel(directory: InMemoryIdentityDirectory) {
    let alice = agent("alice");
    let telegram = ChannelName::new("telegram").expect("valid channel name");
    directory
        .add_token(&alice, &push(), "push-tok")
        .await
        .expect("add should succeed");

    let tokens = directory
        .tokens(&alice, &telegram)
        .await
        .expect("lookup should succeed");

    assert!(tokens.is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn remove_token_reports_whether_anything_changed(directory: InMemoryIdentityDirectory) {
    let alice = agent("alice");
    directory
        .add_token(&alice, &push(), "tok-1")
        .await
        .expect("add should succeed");

    let removed = directory
        .remove_token(&alice, &push(), "tok-1")
        .await
        .expect("remove should succeed");
    let removed_again = directory
        .remove_token(&alice, &push(), "tok-1")
        .await
        .expect("remove should succeed");

    assert!(removed);
    assert!(!removed_again);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn only_team_owners_can_message_members(directory: InMemoryIdentityDirectory) {
    let team = TeamId::new("T1").expect("valid team id");
    directory
        .create_team(team.clone(), agent("owner"))
        .expect("team creation should succeed");
    directory
        .add_member(&team, agent("member"))
        .expect("member add should succeed");

    let owner_to_member = directory
        .can_send_to(&agent("owner"), &agent("member"))
        .await
        .expect("check should succeed");
    let member_to_owner = directory
        .can_send_to(&agent("member"), &agent("owner"))
        .await
        .expect("check should succeed");
    let self_message = directory
        .can_send_to(&agent("member"), &agent("member"))
        .await
        .expect("check should succeed");

    assert!(owner_to_member);
    assert!(!member_to_owner);
    assert!(self_message);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn team_members_of_unknown_team_is_an_error(directory: InMemoryIdentityDirectory) {
    let team = TeamId::new("missing").expect("valid team id");

    let result = directory.team_members(&team).await;

    assert!(matches!(result, Err(IdentityError::UnknownTeam(id)) if id == team));
}
