use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use chatgraph_core::{ChatGraphError, ChatModel, ChatRequest, ChatResponse};
use tokio::sync::Mutex;

/// A chat model that replays a fixed list of responses in order.
///
/// Every request is recorded so tests can assert on what the graph sent.
/// Once the script runs out, `chat` fails with a `Model` error.
#[derive(Clone)]
pub struct ScriptedChatModel {
    responses: Arc<Mutex<VecDeque<ChatResponse>>>,
    requests: Arc<Mutex<Vec<ChatRequest>>>,
}

impl ScriptedChatModel {
    pub fn new(responses: Vec<ChatResponse>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses.into())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub async fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().await.clone()
    }

    pub async fn remaining(&self) -> usize {
        self.responses.lock().await.len()
    }
}

#[async_trait]
impl ChatModel for ScriptedChatModel {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, ChatGraphError> {
        self.requests.lock().await.push(request);
        self.responses
            .lock()
            .await
            .pop_front()
            .ok_or_else(|| ChatGraphError::Model("ScriptedChatModel exhausted".to_string()))
    }
}
