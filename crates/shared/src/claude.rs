use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;

const MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

pub const DEFAULT_MODEL: &str = "claude-haiku-4-5-20251001";
pub const DEFAULT_MAX_TOKENS: u32 = 8000;

#[derive(Debug, Clone, Serialize)]
pub struct MessageRequest {
    pub model: String,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Tool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Server-side tool declaration
#[derive(Debug, Clone, Serialize)]
pub struct Tool {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_uses: Option<u32>,
}

impl Tool {
    pub fn web_search(max_uses: Option<u32>) -> Self {
        Self {
            kind: "web_search_20250305".to_string(),
            name: "web_search".to_string(),
            max_uses,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub stop_reason: Option<String>,
}

/// One content block. Search calls and results come back as blocks
/// without text and are skipped.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
}

impl MessageResponse {
    /// All text blocks, concatenated in order
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| block.text.as_deref())
            .collect()
    }
}

/// The generative-text capability the fetcher depends on
#[async_trait]
pub trait MessagesApi: Send + Sync {
    async fn create_message(&self, request: &MessageRequest) -> Result<MessageResponse>;
}

pub struct ClaudeClient {
    client: Client,
    api_key: String,
}

impl ClaudeClient {
    pub fn new(api_key: String) -> Result<Self> {
        // Web search turns can take a while before the final text arrives
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, api_key })
    }
}

impl fmt::Debug for ClaudeClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClaudeClient")
            .field("api_key", &"<redacted>")
            .finish()
    }
}

#[async_trait]
impl MessagesApi for ClaudeClient {
    async fn create_message(&self, request: &MessageRequest) -> Result<MessageResponse> {
        let response = self
            .client
            .post(MESSAGES_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(request)
            .send()
            .await
            .context("Failed to send request to Claude API")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("unknown error"));
            anyhow::bail!("Claude API error ({}): {}", status, error_text);
        }

        response
            .json::<MessageResponse>()
            .await
            .context("Failed to parse Claude API response")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_response_text_skips_tool_blocks() {
        let body = json!({
            "content": [
                {"type": "text", "text": "Searching. "},
                {"type": "server_tool_use", "id": "x", "name": "web_search", "input": {}},
                {"type": "web_search_tool_result", "content": []},
                {"type": "text", "text": "[{\"headline\": \"A\"}]"}
            ],
            "stop_reason": "end_turn"
        });
        let response: MessageResponse = serde_json::from_value(body).unwrap();

        assert_eq!(response.text(), "Searching. [{\"headline\": \"A\"}]");
        assert_eq!(response.stop_reason.as_deref(), Some("end_turn"));
    }

    #[test]
    fn test_request_omits_empty_tools_and_system() {
        let request = MessageRequest {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 100,
            system: None,
            messages: vec![Message::user("hi"), Message::assistant("[")],
            tools: Vec::new(),
        };
        let value = serde_json::to_value(&request).unwrap();

        assert!(value.get("tools").is_none());
        assert!(value.get("system").is_none());
        assert_eq!(value["messages"][1], json!({"role": "assistant", "content": "["}));
    }

    #[test]
    fn test_web_search_tool_shape() {
        let value = serde_json::to_value(Tool::web_search(Some(5))).unwrap();
        assert_eq!(
            value,
            json!({"type": "web_search_20250305", "name": "web_search", "max_uses": 5})
        );
    }
}
