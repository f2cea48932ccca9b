//! Scripted stand-in for the Messages API.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::claude::{ContentBlock, MessageRequest, MessageResponse, MessagesApi};

/// Replays queued results in order and records every request it sees.
/// Once the queue is empty every call answers with `fallback`.
pub struct ScriptedApi {
    script: Mutex<VecDeque<Result<MessageResponse>>>,
    fallback: Option<String>,
    requests: Mutex<Vec<MessageRequest>>,
}

impl ScriptedApi {
    pub fn new(script: Vec<Result<MessageResponse>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answer every call with the same text
    pub fn always(text: &str) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Some(text.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<MessageRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl MessagesApi for ScriptedApi {
    async fn create_message(&self, request: &MessageRequest) -> Result<MessageResponse> {
        self.requests.lock().unwrap().push(request.clone());

        if let Some(next) = self.script.lock().unwrap().pop_front() {
            return next;
        }

        match &self.fallback {
            Some(text) => Ok(text_response(text)),
            None => anyhow::bail!("script exhausted"),
        }
    }
}

pub fn text_response(text: &str) -> MessageResponse {
    MessageResponse {
        content: vec![ContentBlock {
            kind: "text".to_string(),
            text: Some(text.to_string()),
        }],
        stop_reason: Some("end_turn".to_string()),
    }
}

pub fn ok(text: &str) -> Result<MessageResponse> {
    Ok(text_response(text))
}

pub fn transient() -> Result<MessageResponse> {
    Err(anyhow::anyhow!("Claude API error (529 Overloaded): overloaded_error"))
}
