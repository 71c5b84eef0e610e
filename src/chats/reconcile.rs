//! Client-side view of a chat feed: confirmed history plus optimistic
//! echoes of just-sent messages. Delivery from the realtime feed is
//! at-least-once and unordered relative to the local echo, so the feed
//! de-duplicates by message id and replaces pending entries by their
//! correlation key rather than ever merging the two.

use crate::db::MessageRecord;

use super::ChatEvent;

#[derive(Debug, Clone)]
pub struct PendingMessage {
    /// Locally generated correlation key, sent with the message and echoed
    /// back in the realtime event.
    pub client_key: String,
    pub content: String,
    pub sender_id: String,
}

#[derive(Debug, Default)]
pub struct MessageFeed {
    confirmed: Vec<MessageRecord>,
    pending: Vec<PendingMessage>,
}

impl MessageFeed {
    pub fn from_history(mut history: Vec<MessageRecord>) -> Self {
        history.sort_by(|a, b| (&a.created_at, &a.id).cmp(&(&b.created_at, &b.id)));
        Self {
            confirmed: history,
            pending: Vec::new(),
        }
    }

    /// Stage an optimistic echo before the server confirms it.
    pub fn stage(&mut self, pending: PendingMessage) {
        self.pending.push(pending);
    }

    /// Drop a staged echo whose send failed, restoring the pre-send view.
    pub fn drop_pending(&mut self, client_key: &str) {
        self.pending.retain(|p| p.client_key != client_key);
    }

    /// Apply one realtime event. Duplicates (at-least-once delivery) are
    /// ignored by id; an event carrying our correlation key replaces the
    /// staged echo instead of appearing alongside it.
    pub fn apply(&mut self, event: &ChatEvent) {
        if self.confirmed.iter().any(|m| m.id == event.message.id) {
            return;
        }

        if let Some(key) = &event.client_key {
            self.pending.retain(|p| &p.client_key != key);
        } else {
            // echo arrived without a key; fall back to sender+content
            if let Some(at) = self.pending.iter().position(|p| {
                p.sender_id == event.message.sender_id && p.content == event.message.content
            }) {
                self.pending.remove(at);
            }
        }

        let key = (event.message.created_at.as_str(), event.message.id.as_str());
        let at = self
            .confirmed
            .partition_point(|m| (m.created_at.as_str(), m.id.as_str()) <= key);
        self.confirmed.insert(at, event.message.clone());
    }

    /// Confirmed messages in display order, then still-pending echoes.
    pub fn render(&self) -> (&[MessageRecord], &[PendingMessage]) {
        (&self.confirmed, &self.pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, created_at: &str, sender: &str, content: &str) -> MessageRecord {
        MessageRecord {
            id: id.to_owned(),
            chat_id: "chat".to_owned(),
            sender_id: sender.to_owned(),
            content: content.to_owned(),
            created_at: created_at.to_owned(),
            is_read: false,
        }
    }

    fn event(message: MessageRecord, client_key: Option<&str>) -> ChatEvent {
        ChatEvent {
            chat_id: message.chat_id.clone(),
            client_key: client_key.map(str::to_owned),
            message,
        }
    }

    #[test]
    fn sent_message_appears_exactly_once() {
        let mut feed = MessageFeed::from_history(vec![]);
        feed.stage(PendingMessage {
            client_key: "k1".to_owned(),
            content: "hello".to_owned(),
            sender_id: "alice".to_owned(),
        });

        let echo = event(record("m1", "2026-01-01T00:00:01Z", "alice", "hello"), Some("k1"));
        feed.apply(&echo);
        // at-least-once: same event delivered again
        feed.apply(&echo);

        let (confirmed, pending) = feed.render();
        assert_eq!(confirmed.len(), 1);
        assert!(pending.is_empty());
    }

    #[test]
    fn keyless_echo_falls_back_to_sender_and_content() {
        let mut feed = MessageFeed::from_history(vec![]);
        feed.stage(PendingMessage {
            client_key: "k1".to_owned(),
            content: "hey".to_owned(),
            sender_id: "alice".to_owned(),
        });

        feed.apply(&event(
            record("m1", "2026-01-01T00:00:01Z", "alice", "hey"),
            None,
        ));

        let (confirmed, pending) = feed.render();
        assert_eq!(confirmed.len(), 1);
        assert!(pending.is_empty());
    }

    #[test]
    fn failed_send_restores_previous_view() {
        let mut feed = MessageFeed::from_history(vec![]);
        feed.stage(PendingMessage {
            client_key: "k1".to_owned(),
            content: "lost".to_owned(),
            sender_id: "alice".to_owned(),
        });
        feed.drop_pending("k1");

        let (confirmed, pending) = feed.render();
        assert!(confirmed.is_empty());
        assert!(pending.is_empty());
    }

    #[test]
    fn events_sort_by_timestamp_then_id() {
        let mut feed = MessageFeed::from_history(vec![record(
            "b",
            "2026-01-01T00:00:00Z",
            "bob",
            "tie-late",
        )]);

        // arrives later but ties on timestamp with a smaller id
        feed.apply(&event(record("a", "2026-01-01T00:00:00Z", "bob", "tie-early"), None));
        feed.apply(&event(record("c", "2025-12-31T23:59:59Z", "bob", "older"), None));

        let (confirmed, _) = feed.render();
        let ids: Vec<_> = confirmed.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["c", "a", "b"]);
    }

    #[test]
    fn foreign_messages_leave_pending_untouched() {
        let mut feed = MessageFeed::from_history(vec![]);
        feed.stage(PendingMessage {
            client_key: "k1".to_owned(),
            content: "mine".to_owned(),
            sender_id: "alice".to_owned(),
        });

        feed.apply(&event(
            record("m9", "2026-01-01T00:00:02Z", "bob", "theirs"),
            None,
        ));

        let (confirmed, pending) = feed.render();
        assert_eq!(confirmed.len(), 1);
        assert_eq!(pending.len(), 1);
    }
}
