use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type MessageId = Uuid;

/// Who produced a transcript message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    User,
    Agent,
    System,
}

/// One entry of a run transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptMessage {
    pub id: MessageId,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    /// Block that produced an agent message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block: Option<String>,
    #[serde(default)]
    pub completed: bool,
    pub timestamp: DateTime<Utc>,
}

impl TranscriptMessage {
    fn new(kind: MessageKind, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            content: content.into(),
            agent: None,
            block: None,
            completed: false,
            timestamp: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageKind::User, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageKind::System, content)
    }

    pub fn agent(block: &str, agent: &str, content: impl Into<String>) -> Self {
        let mut msg = Self::new(MessageKind::Agent, content);
        msg.agent = Some(agent.to_string());
        msg.block = Some(block.to_string());
        msg
    }

    /// True if this is an agent message keyed by `(agent, block)`
    pub fn is_from(&self, block: &str, agent: &str) -> bool {
        self.kind == MessageKind::Agent
            && self.agent.as_deref() == Some(agent)
            && self.block.as_deref() == Some(block)
    }
}

/// What a transcript mutation did, so callers can publish it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "change", content = "message", rename_all = "lowercase")]
pub enum TranscriptChange {
    Appended(TranscriptMessage),
    Updated(TranscriptMessage),
}

/// Append-only message log of one run.
///
/// Messages are never removed or reordered. The only in-place mutations are
/// extending the tail agent message with a consecutive chunk and flagging an
/// agent message as completed.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<TranscriptMessage>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: TranscriptMessage) -> TranscriptChange {
        self.messages.push(message.clone());
        TranscriptChange::Appended(message)
    }

    /// Fold a streamed chunk into the log.
    ///
    /// Extends the last message only when it carries the same `(agent, block)`
    /// key; any other tail starts a fresh agent message.
    pub fn append_chunk(&mut self, block: &str, agent: &str, data: &str) -> TranscriptChange {
        if let Some(last) = self.messages.last_mut() {
            if last.is_from(block, agent) {
                last.content.push_str(data);
                return TranscriptChange::Updated(last.clone());
            }
        }
        self.push(TranscriptMessage::agent(block, agent, data))
    }

    /// Flag the most recent message of `(agent, block)` as completed.
    ///
    /// Returns `None` when the agent has not produced a message yet.
    pub fn mark_completed(&mut self, block: &str, agent: &str) -> Option<TranscriptChange> {
        let msg = self
            .messages
            .iter_mut()
            .rev()
            .find(|m| m.is_from(block, agent))?;
        msg.completed = true;
        Some(TranscriptChange::Updated(msg.clone()))
    }

    /// Content of the most recent agent message produced by `block`
    pub fn last_agent_output(&self, block: &str) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.kind == MessageKind::Agent && m.block.as_deref() == Some(block))
            .map(|m| m.content.as_str())
    }

    pub fn messages(&self) -> &[TranscriptMessage] {
        &self.messages
    }

    pub fn snapshot(&self) -> Vec<TranscriptMessage> {
        self.messages.clone()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consecutive_chunks_merge() {
        let mut transcript = Transcript::new();
        transcript.append_chunk("b1", "A", "foo");
        transcript.append_chunk("b1", "A", "bar");
        transcript.append_chunk("b1", "B", "baz");

        let msgs = transcript.messages();
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0].agent.as_deref(), Some("A"));
        assert_eq!(msgs[0].content, "foobar");
        assert_eq!(msgs[1].agent.as_deref(), Some("B"));
        assert_eq!(msgs[1].content, "baz");
    }

    #[test]
    fn test_interleaved_chunks_start_new_messages() {
        let mut transcript = Transcript::new();
        transcript.append_chunk("b1", "A", "1");
        transcript.append_chunk("b1", "B", "2");
        transcript.append_chunk("b1", "A", "3");

        let contents: Vec<_> = transcript.messages().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_same_agent_in_another_block_does_not_merge() {
        let mut transcript = Transcript::new();
        transcript.append_chunk("b1", "A", "first");
        transcript.append_chunk("b2", "A", "second");

        assert_eq!(transcript.len(), 2);
    }

    #[test]
    fn test_system_message_breaks_merge() {
        let mut transcript = Transcript::new();
        transcript.append_chunk("b1", "A", "x");
        transcript.push(TranscriptMessage::system("note"));
        transcript.append_chunk("b1", "A", "y");

        assert_eq!(transcript.len(), 3);
    }

    #[test]
    fn test_mark_completed_updates_in_place() {
        let mut transcript = Transcript::new();
        transcript.append_chunk("b1", "A", "x");
        let change = transcript.mark_completed("b1", "A");

        assert!(matches!(change, Some(TranscriptChange::Updated(_))));
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript.messages()[0].content, "x");
        assert!(transcript.messages()[0].completed);
    }

    #[test]
    fn test_mark_completed_targets_latest_message() {
        let mut transcript = Transcript::new();
        transcript.append_chunk("b1", "A", "old");
        transcript.append_chunk("b1", "B", "other");
        transcript.append_chunk("b1", "A", "new");
        transcript.mark_completed("b1", "A");

        let msgs = transcript.messages();
        assert!(!msgs[0].completed);
        assert!(!msgs[1].completed);
        assert!(msgs[2].completed);
    }

    #[test]
    fn test_mark_completed_unknown_agent() {
        let mut transcript = Transcript::new();
        assert!(transcript.mark_completed("b1", "ghost").is_none());
        assert!(transcript.is_empty());
    }

    #[test]
    fn test_last_agent_output() {
        let mut transcript = Transcript::new();
        transcript.append_chunk("b1", "A", "one");
        transcript.append_chunk("b1", "B", "two");
        transcript.push(TranscriptMessage::system("done"));

        assert_eq!(transcript.last_agent_output("b1"), Some("two"));
        assert_eq!(transcript.last_agent_output("b2"), None);
    }
}
