//! Team topics, direct messages and multi-channel fan-out over the push
//! transport.

use super::helpers::{agent, field, op, team, token, world};
use fieldops::identity::domain::ChannelName;
use fieldops::notification::{
    adapters::memory::RecordingChannel,
    domain::data_keys,
    ports::ChannelError,
    services::{DispatchError, DispatchReport},
};
use rstest::rstest;
use std::sync::Arc;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn resubscribing_a_team_adds_every_member_token_to_its_topic() {
    let world = world().await;

    let reports = world
        .dispatcher
        .resubscribe_team(&team())
        .await
        .expect("team lookup should succeed");

    assert_eq!(reports.len(), 2);
    assert!(reports.iter().all(DispatchReport::is_clean));
    assert_eq!(
        world.transport.topic_members("T9"),
        vec!["tok-alice".to_owned(), "tok-bob".to_owned()]
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unsubscribing_removes_only_that_agent() {
    let world = world().await;
    world
        .dispatcher
        .resubscribe_team(&team())
        .await
        .expect("team lookup should succeed");

    let report = world.dispatcher.unsubscribe(&agent("bob"), &team()).await;

    assert!(report.is_clean());
    assert_eq!(
        world.transport.topic_members("T9"),
        vec!["tok-alice".to_owned()]
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn owner_can_message_a_member_directly() {
    let world = world().await;
    let mark = world.transport.sent().len();

    world
        .dispatcher
        .send_message(&agent("alice"), &agent("bob"), "regroup at the fountain")
        .await
        .expect("owner may message a member");

    let sent = world.sent_after(mark);
    let message = sent.first().expect("one message");
    assert_eq!(message.destination, token("tok-bob"));
    assert_eq!(field(message, data_keys::CMD), "generic_message");
    assert_eq!(field(message, data_keys::MSG), "regroup at the fountain");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn member_cannot_message_the_owner() {
    let world = world().await;
    let mark = world.transport.sent().len();

    let result = world
        .dispatcher
        .send_message(&agent("bob"), &agent("alice"), "hello")
        .await;

    assert!(matches!(result, Err(DispatchError::Forbidden { .. })));
    assert_eq!(world.transport.sent().len(), mark);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failing_push_topic_does_not_block_other_channels() {
    let world = world().await;
    let bot_name = ChannelName::new("bot").expect("valid channel name");
    let bot = RecordingChannel::new(bot_name.clone(), world.directory.clone());
    world.bus.register(bot_name.clone(), Arc::new(bot.clone()));
    world.transport.fail_destination("T9");

    let reports = world
        .dispatcher
        .map_changed(&op(), &[team()], "portal moved")
        .await;

    let report = reports.first().expect("one report per team");
    let push = report
        .outcome(&ChannelName::new("push").expect("valid channel name"))
        .expect("push outcome");
    assert!(matches!(push.error(), Some(ChannelError::Transport(_))));
    let bot_outcome = report.outcome(&bot_name).expect("bot outcome");
    assert!(bot_outcome.is_clean());
    assert_eq!(bot.topic_sends(), vec!["T9".to_owned()]);
}
