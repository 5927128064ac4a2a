//! Scripted text generator for tests and dry runs.
//!
//! Returns queued responses in order and records every request it receives,
//! so callers can assert on prompts without a network call.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::error::LlmError;
use crate::llm::{GenerationRequest, TextGenerator};

#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Status(u16),
}

#[derive(Default, Clone)]
pub struct ScriptedGenerator {
    replies: Arc<Mutex<VecDeque<Reply>>>,
    /// Status returned once the queue is drained; `None` yields an empty response error.
    exhausted_status: Option<u16>,
    calls: Arc<Mutex<Vec<GenerationRequest>>>,
}

impl ScriptedGenerator {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let replies = responses
            .into_iter()
            .map(|r| Reply::Text(r.into()))
            .collect();
        Self {
            replies: Arc::new(Mutex::new(replies)),
            ..Default::default()
        }
    }

    /// A generator whose every call fails with the given API status.
    pub fn failing(status: u16) -> Self {
        Self {
            exhausted_status: Some(status),
            ..Default::default()
        }
    }

    /// Queue a text response.
    pub fn then_text(self, text: impl Into<String>) -> Self {
        self.replies.lock().unwrap().push_back(Reply::Text(text.into()));
        self
    }

    /// Queue an API failure.
    pub fn then_status(self, status: u16) -> Self {
        self.replies.lock().unwrap().push_back(Reply::Status(status));
        self
    }

    /// Requests received so far, oldest first.
    pub fn calls(&self) -> Vec<GenerationRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, LlmError> {
        self.calls.lock().unwrap().push(request.clone());

        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            Some(Reply::Text(text)) => Ok(text),
            Some(Reply::Status(status)) => Err(api_error(status)),
            None => match self.exhausted_status {
                Some(status) => Err(api_error(status)),
                None => Err(LlmError::EmptyResponse),
            },
        }
    }
}

fn api_error(status: u16) -> LlmError {
    LlmError::Api {
        status,
        body: "scripted failure".to_string(),
    }
}
