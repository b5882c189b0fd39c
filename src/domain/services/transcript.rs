#[cfg(test)]
#[path = "transcript_test.rs"]
mod tests;

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use crate::domain::models::HistoryEntry;
use crate::domain::models::Message;
use crate::domain::models::MessageStatus;

/// The visible conversation. Cloning shares the underlying list, which lets
/// the pending-status timer update a message after `submit` has moved on.
#[derive(Clone, Default)]
pub struct Transcript {
    messages: Arc<Mutex<Vec<Message>>>,
}

pub fn history_of(messages: &[Message]) -> Vec<HistoryEntry> {
    return messages
        .iter()
        .filter(|message| return message.is_history())
        .map(|message| return message.to_history_entry())
        .collect();
}

impl Transcript {
    fn lock(&self) -> MutexGuard<'_, Vec<Message>> {
        return self
            .messages
            .lock()
            .unwrap_or_else(|poisoned| return poisoned.into_inner());
    }

    pub fn push(&self, message: Message) {
        self.lock().push(message);
    }

    pub fn messages(&self) -> Vec<Message> {
        return self.lock().clone();
    }

    pub fn len(&self) -> usize {
        return self.lock().len();
    }

    pub fn is_empty(&self) -> bool {
        return self.lock().is_empty();
    }

    pub fn last(&self) -> Option<Message> {
        return self.lock().last().cloned();
    }

    pub fn get(&self, id: &str) -> Option<Message> {
        return self.lock().iter().find(|msg| return msg.id == id).cloned();
    }

    pub fn remove(&self, id: &str) -> Option<Message> {
        let mut messages = self.lock();
        let idx = messages.iter().position(|msg| return msg.id == id)?;
        return Some(messages.remove(idx));
    }

    pub fn set_status(&self, id: &str, status: MessageStatus) {
        if let Some(message) = self.lock().iter_mut().find(|msg| return msg.id == id) {
            message.status = Some(status);
        }
    }

    /// Only promotes `Pending`, so a turn that already failed stays failed.
    pub fn mark_sent(&self, id: &str) {
        if let Some(message) = self.lock().iter_mut().find(|msg| return msg.id == id) {
            if message.status == Some(MessageStatus::Pending) {
                message.status = Some(MessageStatus::Sent);
            }
        }
    }

    /// Role-tagged entries replayed to the gateway as context.
    pub fn history(&self) -> Vec<HistoryEntry> {
        return history_of(&self.lock());
    }
}
