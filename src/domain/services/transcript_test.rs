use super::Transcript;
use crate::domain::models::Message;
use crate::domain::models::MessageStatus;
use crate::domain::models::Role;

#[test]
fn it_shares_messages_between_clones() {
    let transcript = Transcript::default();
    let other = transcript.clone();
    other.push(Message::new(Role::User, "Hi"));

    assert_eq!(transcript.len(), 1);
    assert!(!transcript.is_empty());
}

#[test]
fn it_skips_notices_and_errors_in_history() {
    let transcript = Transcript::default();
    transcript.push(Message::new(Role::Assistant, "Hi! What do you need?"));
    transcript.push(Message::pending("Cameras"));
    transcript.push(Message::failure("Request timed out.", true));
    transcript.push(Message::notice("Please wait 2 seconds."));
    transcript.push(Message::new(Role::Assistant, "ARRI and Sony."));

    let history = transcript.history();
    let res = history
        .iter()
        .map(|entry| return format!("{}: {}", entry.role, entry.content))
        .collect::<Vec<String>>()
        .join("\n");

    insta::assert_snapshot!(res, @r###"
    assistant: Hi! What do you need?
    user: Cameras
    assistant: ARRI and Sony.
    "###);
}

#[test]
fn it_only_marks_pending_messages_sent() {
    let transcript = Transcript::default();
    let pending = Message::pending("Cameras");
    let failed = Message::pending("Lights");
    let pending_id = pending.id.to_string();
    let failed_id = failed.id.to_string();
    transcript.push(pending);
    transcript.push(failed);

    transcript.set_status(&failed_id, MessageStatus::Failed);
    transcript.mark_sent(&pending_id);
    transcript.mark_sent(&failed_id);

    assert_eq!(
        transcript.get(&pending_id).unwrap().status,
        Some(MessageStatus::Sent)
    );
    assert_eq!(
        transcript.get(&failed_id).unwrap().status,
        Some(MessageStatus::Failed)
    );
}

#[test]
fn it_removes_messages() {
    let transcript = Transcript::default();
    let msg = Message::new(Role::User, "Hi");
    let id = msg.id.to_string();
    transcript.push(msg);

    assert_eq!(transcript.remove(&id).unwrap().text, "Hi");
    assert!(transcript.remove(&id).is_none());
    assert!(transcript.is_empty());
}
