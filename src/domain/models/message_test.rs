use super::Message;
use super::MessageStatus;
use super::MessageType;
use crate::domain::models::Role;

#[test]
fn it_executes_new() {
    let msg = Message::new(Role::Assistant, "Hi there!");
    assert_eq!(msg.role, Role::Assistant);
    assert_eq!(msg.role.label(), "MQ Assistant");
    assert_eq!(msg.text, "Hi there!".to_string());
    assert_eq!(msg.mtype, MessageType::Normal);
    assert_eq!(msg.status, None);
    assert!(!msg.retryable);
}

#[test]
fn it_assigns_unique_ids() {
    let first = Message::new(Role::User, "One");
    let second = Message::new(Role::User, "One");
    assert_ne!(first.id, second.id);
}

#[test]
fn it_executes_pending() {
    let msg = Message::pending("What cameras do you have?");
    assert_eq!(msg.role, Role::User);
    assert_eq!(msg.status, Some(MessageStatus::Pending));
    assert!(msg.is_history());
}

#[test]
fn it_executes_failure() {
    let msg = Message::failure("It broke!", true);
    assert_eq!(msg.role, Role::Assistant);
    assert_eq!(msg.message_type(), MessageType::Error);
    assert!(msg.retryable);
    assert!(!msg.is_history());
}

#[test]
fn it_executes_notice() {
    let msg = Message::notice("Please wait 2 seconds.");
    assert_eq!(msg.message_type(), MessageType::Notice);
    assert!(!msg.retryable);
    assert!(!msg.is_history());
}

#[test]
fn it_converts_to_history_entry() {
    let entry = Message::new(Role::Assistant, "Hello").to_history_entry();
    assert_eq!(entry.role, Role::Assistant);
    assert_eq!(entry.content, "Hello");
}

#[test]
fn it_parses_roles() {
    assert_eq!(Role::parse("assistant"), Role::Assistant);
    assert_eq!(Role::parse("user"), Role::User);
    assert_eq!(Role::parse("system"), Role::User);
    assert_eq!(Role::Assistant.to_string(), "assistant");
}

#[test]
fn it_wraps_lines() {
    let msg = Message::new(
        Role::Assistant,
        "I can help with cameras, lenses and lighting\n\nWhat do you need?",
    );
    let lines = msg.as_string_lines(20);

    assert_eq!(
        lines,
        vec![
            "I can help with",
            "cameras, lenses and",
            "lighting",
            "",
            "What do you need?",
        ]
    );
}

#[test]
fn it_keeps_long_words_on_their_own_line() {
    let msg = Message::new(Role::User, "a supercalifragilistic b");
    let lines = msg.as_string_lines(5);
    assert_eq!(lines, vec!["a", "supercalifragilistic", "b"]);
}
