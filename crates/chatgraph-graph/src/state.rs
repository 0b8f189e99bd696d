use chatgraph_core::Message;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// State threaded through a graph.
///
/// States are serializable so they can be checkpointed. `merge` folds an
/// update into the current value; it is used for `Command` updates, for
/// `update_state`, and when new input is appended to a checkpointed thread.
pub trait State: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    fn merge(&mut self, other: Self);
}

/// Conversation state: an append-only message history plus the optional
/// structured answer extracted at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageState {
    pub messages: Vec<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured_response: Option<Value>,
}

impl MessageState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_messages(messages: Vec<Message>) -> Self {
        Self {
            messages,
            structured_response: None,
        }
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Assistant messages produced since the most recent user message.
    pub fn turns_since_last_human(&self) -> usize {
        self.messages
            .iter()
            .rev()
            .take_while(|m| !m.is_human())
            .filter(|m| m.is_ai())
            .count()
    }
}

impl State for MessageState {
    fn merge(&mut self, other: Self) {
        self.messages.extend(other.messages);
        if other.structured_response.is_some() {
            self.structured_response = other.structured_response;
        }
    }
}

impl From<Vec<Message>> for MessageState {
    fn from(messages: Vec<Message>) -> Self {
        Self::with_messages(messages)
    }
}
