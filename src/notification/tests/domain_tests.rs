//! Unit tests for commands, envelopes and the wire encoding.

use super::{agent, envelope, marker, marker_status, team};
use crate::notification::domain::{
    Addressing, Command, CommandCode, MembershipAction, NotificationDomainError, WireEnvelope,
};
use chrono::Utc;
use rstest::rstest;
use std::collections::BTreeMap;

#[rstest]
#[case(CommandCode::GenericMessage, "generic_message")]
#[case(CommandCode::AgentLocationChange, "agent_location_change")]
#[case(CommandCode::MarkerAssignmentChange, "marker_assignment_change")]
#[case(CommandCode::MapChange, "map_change")]
#[case(CommandCode::UnsubscribeFromTeam, "unsubscribe_from_team")]
fn command_codes_use_stable_wire_values(#[case] code: CommandCode, #[case] wire: &str) {
    assert_eq!(code.as_str(), wire);
    assert_eq!(CommandCode::try_from(wire), Ok(code));
}

#[rstest]
fn unknown_command_code_is_rejected() {
    let result = CommandCode::try_from("teleport");

    assert!(result.is_err());
}

#[rstest]
fn personal_commands_address_the_agent() {
    let command = Command::LinkAssignmentChange {
        agent: agent("alice"),
        link: marker("op1", "l1"),
        message: "assigned".to_owned(),
    };

    assert_eq!(command.addressing(), Addressing::Direct(&agent("alice")));
    assert_eq!(command.recipient(), Some(&agent("alice")));
}

#[rstest]
fn collective_commands_address_the_team() {
    let command = Command::AgentLogin {
        team: team("T9"),
        agent: agent("alice"),
        message: String::new(),
    };

    assert_eq!(command.addressing(), Addressing::Topic(&team("T9")));
    assert_eq!(command.recipient(), None);
}

#[rstest]
fn membership_commands_carry_agent_and_team() {
    let command = Command::UnsubscribeFromTeam {
        agent: agent("alice"),
        team: team("T9"),
    };

    assert_eq!(
        command.addressing(),
        Addressing::Membership {
            agent: &agent("alice"),
            team: &team("T9"),
            action: MembershipAction::Unsubscribe,
        }
    );
}

#[rstest]
fn marker_status_change_encodes_its_fields() {
    let data = marker_status("T9").command().data();

    let expected: BTreeMap<String, String> = [
        ("cmd", "marker_status_change"),
        ("markerID", "m1"),
        ("msg", "done"),
        ("opID", "op1"),
    ]
    .into_iter()
    .map(|(key, value)| (key.to_owned(), value.to_owned()))
    .collect();
    assert_eq!(data, expected);
}

#[rstest]
fn agent_broadcasts_forward_the_agent_note() {
    let moved = Command::AgentLocationChange {
        team: team("T9"),
        agent: agent("alice"),
        message: "at the fountain".to_owned(),
    };
    let login = Command::AgentLogin {
        team: team("T9"),
        agent: agent("bob"),
        message: "back online".to_owned(),
    };

    let moved_data = moved.data();
    assert_eq!(moved_data.get("msg").map(String::as_str), Some("at the fountain"));
    assert_eq!(moved_data.get("gid").map(String::as_str), Some("alice"));
    assert_eq!(
        login.data().get("msg").map(String::as_str),
        Some("back online")
    );
    assert_eq!(
        login.to_wire().into_command().expect("decode should succeed"),
        login
    );
}

#[rstest]
fn envelope_is_stamped_with_fresh_id_and_time() {
    let before = Utc::now();
    let first = marker_status("T9");
    let second = marker_status("T9");
    let after = Utc::now();

    assert_ne!(first.id(), second.id());
    assert!(first.issued_at() >= before && first.issued_at() <= after);
    assert_eq!(first.code(), CommandCode::MarkerStatusChange);
}

#[rstest]
fn wire_envelope_decodes_collective_command() {
    let original = Command::MapChange {
        team: team("T9"),
        operation: crate::task::domain::OperationId::new("op1").expect("valid operation id"),
        message: "zones updated".to_owned(),
    };

    let decoded = original.to_wire().into_command().expect("decode should succeed");

    assert_eq!(decoded, original);
}

#[rstest]
fn wire_envelope_decodes_membership_command() {
    let wire = WireEnvelope {
        agent: Some("alice".to_owned()),
        team: Some("T9".to_owned()),
        data: [("cmd".to_owned(), "subscribe_to_team".to_owned())]
            .into_iter()
            .collect(),
    };

    let decoded = wire.into_command().expect("decode should succeed");

    assert_eq!(
        decoded,
        Command::SubscribeToTeam {
            agent: agent("alice"),
            team: team("T9"),
        }
    );
}

fn wire(agent_target: Option<&str>, team_target: Option<&str>, data: &[(&str, &str)]) -> WireEnvelope {
    WireEnvelope {
        agent: agent_target.map(str::to_owned),
        team: team_target.map(str::to_owned),
        data: data
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect(),
    }
}

#[rstest]
fn collective_command_without_team_is_rejected() {
    let result = wire(None, None, &[("cmd", "marker_status_change"), ("opID", "op1"), ("markerID", "m1")])
        .into_command();

    assert_eq!(
        result,
        Err(NotificationDomainError::MissingTarget {
            command: CommandCode::MarkerStatusChange,
            target: "team",
        })
    );
}

#[rstest]
fn personal_command_with_team_target_is_rejected() {
    let result = wire(Some("alice"), Some("T9"), &[("cmd", "generic_message"), ("msg", "hi")])
        .into_command();

    assert_eq!(
        result,
        Err(NotificationDomainError::UnexpectedTarget {
            command: CommandCode::GenericMessage,
            target: "team",
        })
    );
}

#[rstest]
fn missing_object_id_is_rejected() {
    let result = wire(Some("alice"), None, &[("cmd", "link_assignment_change"), ("opID", "op1")])
        .into_command();

    assert_eq!(
        result,
        Err(NotificationDomainError::MissingField {
            command: CommandCode::LinkAssignmentChange,
            field: "linkID",
        })
    );
}

#[rstest]
fn unknown_wire_command_is_rejected() {
    let result = wire(Some("alice"), None, &[("cmd", "teleport")]).into_command();

    assert_eq!(
        result,
        Err(NotificationDomainError::UnknownCommand("teleport".to_owned()))
    );
}

#[rstest]
fn generic_message_round_trips_through_wire() {
    let original = envelope(Command::GenericMessage {
        agent: agent("alice"),
        message: "regroup at the fountain".to_owned(),
    });

    let decoded = original
        .command()
        .to_wire()
        .into_command()
        .expect("decode should succeed");

    assert_eq!(&decoded, original.command());
}
