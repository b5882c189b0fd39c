#[cfg(test)]
#[path = "message_test.rs"]
mod tests;

use chrono::DateTime;
use chrono::Local;
use serde_derive::Deserialize;
use serde_derive::Serialize;
use uuid::Uuid;

use super::HistoryEntry;
use super::Role;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageType {
    Normal,
    Error,
    Notice,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageStatus {
    Pending,
    Sent,
    Failed,
}

#[derive(Clone, Debug)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Local>,
    pub status: Option<MessageStatus>,
    pub retryable: bool,
    mtype: MessageType,
}

impl Message {
    pub fn new(role: Role, text: &str) -> Message {
        return Message::new_with_type(role, MessageType::Normal, text);
    }

    pub fn new_with_type(role: Role, mtype: MessageType, text: &str) -> Message {
        return Message {
            id: Uuid::new_v4().to_string(),
            role,
            text: text.to_string(),
            timestamp: Local::now(),
            status: None,
            retryable: false,
            mtype,
        };
    }

    /// Outbound user message that hasn't left the client yet.
    pub fn pending(text: &str) -> Message {
        let mut msg = Message::new(Role::User, text);
        msg.status = Some(MessageStatus::Pending);
        return msg;
    }

    pub fn failure(text: &str, retryable: bool) -> Message {
        let mut msg = Message::new_with_type(Role::Assistant, MessageType::Error, text);
        msg.retryable = retryable;
        return msg;
    }

    /// Local-only message. Never sent to the gateway, never part of history.
    pub fn notice(text: &str) -> Message {
        return Message::new_with_type(Role::Assistant, MessageType::Notice, text);
    }

    pub fn message_type(&self) -> MessageType {
        return self.mtype;
    }

    pub fn is_history(&self) -> bool {
        return self.mtype == MessageType::Normal;
    }

    pub fn to_history_entry(&self) -> HistoryEntry {
        return HistoryEntry {
            role: self.role,
            content: self.text.to_string(),
        };
    }

    pub fn as_string_lines(&self, line_max_width: usize) -> Vec<String> {
        let mut lines: Vec<String> = Vec::new();

        for full_line in self.text.split('\n') {
            if full_line.trim().is_empty() {
                lines.push("".to_string());
                continue;
            }

            let mut char_count = 0;
            let mut current_lines: Vec<&str> = vec![];

            for word in full_line.split(' ') {
                let word_len = word.chars().count();
                if !current_lines.is_empty() && word_len + char_count + 1 > line_max_width {
                    lines.push(current_lines.join(" ").trim_end().to_string());
                    current_lines = vec![word];
                    char_count = word_len + 1;
                } else {
                    current_lines.push(word);
                    char_count += word_len + 1;
                }
            }
            if !current_lines.is_empty() {
                lines.push(current_lines.join(" ").trim_end().to_string());
            }
        }

        return lines;
    }
}
