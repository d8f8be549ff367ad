//! Chat-completions client used for grounded answering.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::{OpenAiConfig, DEFAULT_CHAT_MODEL, OPENAI_API_URL};
use crate::{Error, Result};

/// Model output plus the provider's token accounting, when reported.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    pub prompt_tokens: Option<u64>,
    pub completion_tokens: Option<u64>,
}

impl Completion {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            prompt_tokens: None,
            completion_tokens: None,
        }
    }
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(&self, system: &str, user: &str) -> Result<Completion>;

    fn model(&self) -> &str;
}

/// OpenAI chat-completions client.
#[derive(Debug, Clone)]
pub struct OpenAiChat {
    http: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiChat {
    pub fn new<S: Into<String>>(api_key: S) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(Error::Config("OPENAI_API_KEY not set".to_string()));
        }

        let http = Client::builder()
            .user_agent(concat!("hybrid_rag/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Llm(format!("HTTP client error: {}", e)))?;

        Ok(Self {
            http,
            api_key,
            base_url: OPENAI_API_URL.to_string(),
            model: DEFAULT_CHAT_MODEL.to_string(),
            temperature: 0.2,
            max_tokens: 800,
        })
    }

    pub fn from_config(config: &OpenAiConfig) -> Result<Self> {
        let mut chat = Self::new(config.api_key.clone())?;
        chat.base_url = config.base_url.trim_end_matches('/').to_string();
        chat.model = config.model.clone();
        chat.temperature = config.temperature;
        chat.max_tokens = config.max_tokens;
        Ok(chat)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub async fn chat_completion(&self, messages: Vec<ChatMessage>) -> Result<Completion> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Llm(format!("OpenAI request failed: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::Llm(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(Error::Llm(format!("OpenAI error {}: {}", status, text)));
        }

        let chat_response: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| Error::Llm(format!("Invalid response: {}", e)))?;

        let content = chat_response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or_else(|| Error::Llm("Empty response from OpenAI".to_string()))?;

        Ok(Completion {
            text: content,
            prompt_tokens: chat_response.usage.as_ref().map(|u| u.prompt_tokens),
            completion_tokens: chat_response.usage.as_ref().map(|u| u.completion_tokens),
        })
    }
}

#[async_trait]
impl LanguageModel for OpenAiChat {
    async fn generate(&self, system: &str, user: &str) -> Result<Completion> {
        self.chat_completion(vec![ChatMessage::system(system), ChatMessage::user(user)])
            .await
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl ChatMessage {
    pub fn system(content: &str) -> Self {
        Self {
            role: "system".to_string(),
            content: Some(content.to_string()),
        }
    }

    pub fn user(content: &str) -> Self {
        Self {
            role: "user".to_string(),
            content: Some(content.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    #[test]
    fn test_new_rejects_empty_key() {
        let err = OpenAiChat::new("   ").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    fn client(server: &MockServer) -> OpenAiChat {
        let mut client = OpenAiChat::new("test_key").expect("client");
        client.base_url = server.base_url();
        client
    }

    #[tokio::test]
    async fn generate_returns_first_choice_with_usage() {
        let server = MockServer::start_async().await;

        let completion_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .header("Authorization", "Bearer test_key")
                .is_true(|req| {
                    let body = String::from_utf8_lossy(req.body().as_ref());
                    body.contains("\"role\":\"system\"") && body.contains("Who owns billing?")
                });
            then.status(200).json_body(json!({
                "choices": [
                    { "message": { "role": "assistant", "content": "The Finance Team." } }
                ],
                "usage": { "prompt_tokens": 42, "completion_tokens": 5, "total_tokens": 47 }
            }));
        });

        let completion = client(&server)
            .generate("Use ONLY the provided context", "Who owns billing?")
            .await
            .unwrap();

        assert_eq!(completion.text, "The Finance Team.");
        assert_eq!(completion.prompt_tokens, Some(42));
        assert_eq!(completion.completion_tokens, Some(5));
        completion_mock.assert_calls(1);
    }

    #[tokio::test]
    async fn generate_without_usage_leaves_counts_empty() {
        let server = MockServer::start_async().await;

        server.mock(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200).json_body(json!({
                "choices": [ { "message": { "role": "assistant", "content": "Ok" } } ]
            }));
        });

        let completion = client(&server).generate("s", "u").await.unwrap();
        assert_eq!(completion, Completion::text("Ok"));
    }

    #[tokio::test]
    async fn generate_returns_error_on_non_success_status() {
        let server = MockServer::start_async().await;

        let completion_mock = server.mock(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(429).body("rate limited");
        });

        let err = client(&server).generate("s", "u").await.unwrap_err();

        assert!(matches!(err, Error::Llm(_)));
        let msg = err.to_string();
        assert!(msg.contains("OpenAI error 429"));
        assert!(msg.contains("rate limited"));
        completion_mock.assert_calls(1);
    }

    #[tokio::test]
    async fn generate_returns_error_on_invalid_json() {
        let server = MockServer::start_async().await;

        server.mock(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200).body("not json");
        });

        let err = client(&server).generate("s", "u").await.unwrap_err();
        assert!(err.to_string().contains("Invalid response"));
    }

    #[tokio::test]
    async fn generate_returns_error_on_empty_choices() {
        let server = MockServer::start_async().await;

        server.mock(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200).json_body(json!({ "choices": [] }));
        });

        let err = client(&server).generate("s", "u").await.unwrap_err();
        assert!(err.to_string().contains("Empty response from OpenAI"));
    }

    #[tokio::test]
    async fn request_carries_configured_model() {
        let server = MockServer::start_async().await;

        let completion_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .is_true(|req| {
                    let body: serde_json::Value =
                        serde_json::from_slice(req.body().as_ref()).unwrap_or_default();
                    body["model"] == "gpt-4o" && body["max_tokens"] == 800
                });
            then.status(200).json_body(json!({
                "choices": [ { "message": { "role": "assistant", "content": "Ok" } } ]
            }));
        });

        let chat = client(&server).with_model("gpt-4o");
        assert_eq!(chat.model(), "gpt-4o");
        chat.generate("s", "u").await.unwrap();
        completion_mock.assert_calls(1);
    }
}
