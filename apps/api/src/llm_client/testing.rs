//! In-memory `ModelService` for tests. Replies are served in script order;
//! every request is recorded for later inspection.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use super::{LlmError, ModelRequest, ModelService};

#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    Fail { status: u16, message: String },
    /// Waits for the gate to be notified before answering with the text.
    Gated(Arc<Notify>, String),
}

#[derive(Default)]
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<ModelRequest>>,
}

impl ScriptedModel {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn replying(text: impl Into<String>) -> Arc<Self> {
        Self::new([Reply::Text(text.into())])
    }

    pub fn failing(status: u16, message: impl Into<String>) -> Arc<Self> {
        Self::new([Reply::Fail {
            status,
            message: message.into(),
        }])
    }

    pub fn push(&self, reply: Reply) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ModelService for ScriptedModel {
    async fn generate(&self, request: ModelRequest) -> Result<String, LlmError> {
        self.requests.lock().unwrap().push(request);
        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            Some(Reply::Text(text)) => Ok(text),
            Some(Reply::Fail { status, message }) => Err(LlmError::Api { status, message }),
            Some(Reply::Gated(gate, text)) => {
                gate.notified().await;
                Ok(text)
            }
            None => Err(LlmError::Api {
                status: 500,
                message: "script exhausted".to_string(),
            }),
        }
    }
}
