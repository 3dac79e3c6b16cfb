//! OpenAI-compatible chat-completion client.
//!
//! Works against any backend that speaks `POST {base}/chat/completions`:
//! OpenAI itself (default base URL), DeepSeek, Qwen's compatible mode, or a
//! local proxy. One request per call; there is no retry and no timeout.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ChatError;
use crate::prompt;
use crate::provider::ResolvedProvider;

/// Sampling temperature for every request.
pub const TEMPERATURE: f32 = 0.2;

/// Something that turns a prompt into a text completion.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Sends `prompt` as a single user message and returns the trimmed reply.
    async fn chat(&self, prompt: &str) -> Result<String, ChatError>;
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_owned(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_owned(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
}

/// HTTP client for one resolved provider.
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiCompatibleClient {
    /// Builds a client from resolved settings.
    ///
    /// # Errors
    ///
    /// [`ChatError::MissingApiKey`] for a blank key, [`ChatError::ClientBuild`]
    /// if the TLS backend cannot be initialised.
    pub fn new(provider: &ResolvedProvider) -> Result<Self, ChatError> {
        let api_key = provider.api_key.trim();
        if api_key.is_empty() {
            return Err(ChatError::MissingApiKey);
        }
        let http = reqwest::Client::builder()
            .user_agent(concat!("stagerev/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ChatError::ClientBuild)?;

        Ok(Self {
            http,
            base_url: provider.endpoint().trim_end_matches('/').to_owned(),
            api_key: api_key.to_owned(),
            model: provider.model.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Review-specific call: reviewer instructions as the system message and
    /// the fenced diff as the user message.
    pub async fn review_diff(&self, diff: &str) -> Result<String, ChatError> {
        if diff.trim().is_empty() {
            return Err(ChatError::EmptyDiff);
        }
        let (system, user) = prompt::review_messages(diff);
        self.complete(vec![ChatMessage::system(system), ChatMessage::user(user)])
            .await
    }

    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, ChatError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatCompletionRequest {
            model: &self.model,
            temperature: TEMPERATURE,
            messages,
        };
        debug!(%url, model = %self.model, "sending chat completion");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(ChatError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatCompletionResponse = response.json().await.map_err(ChatError::Decode)?;
        extract_content(parsed)
    }
}

#[async_trait]
impl ChatProvider for OpenAiCompatibleClient {
    async fn chat(&self, prompt: &str) -> Result<String, ChatError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(ChatError::EmptyPrompt);
        }
        self.complete(vec![ChatMessage::user(prompt)]).await
    }
}

fn extract_content(response: ChatCompletionResponse) -> Result<String, ChatError> {
    let first = response.choices.into_iter().next().ok_or(ChatError::NoChoices)?;
    let content = first.message.content.unwrap_or_default();
    let content = content.trim();
    if content.is_empty() {
        return Err(ChatError::BlankContent);
    }
    Ok(content.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> OpenAiCompatibleClient {
        OpenAiCompatibleClient::new(&ResolvedProvider {
            name: "custom".to_owned(),
            api_key: "sk-test".to_owned(),
            base_url: Some(format!("{}/", server.uri())),
            model: "test-model".to_owned(),
        })
        .unwrap()
    }

    fn completion(content: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": content },
                "finish_reason": "stop"
            }]
        }))
    }

    #[tokio::test]
    async fn chat_sends_single_user_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "test-model",
                "messages": [{ "role": "user", "content": "hello" }]
            })))
            .respond_with(completion("  ## Looks good\n"))
            .expect(1)
            .mount(&server)
            .await;

        let reply = client_for(&server).chat("  hello ").await.unwrap();
        assert_eq!(reply, "## Looks good");
    }

    #[tokio::test]
    async fn review_diff_sends_system_and_user() {
        let server = MockServer::start().await;
        let (system, user) = prompt::review_messages("+fn main() {}");
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(json!({
                "messages": [
                    { "role": "system", "content": system },
                    { "role": "user", "content": user }
                ]
            })))
            .respond_with(completion("review"))
            .expect(1)
            .mount(&server)
            .await;

        let reply = client_for(&server).review_diff("+fn main() {}").await.unwrap();
        assert_eq!(reply, "review");
    }

    #[tokio::test]
    async fn blank_prompt_is_rejected_without_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(completion("unused"))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert!(matches!(client.chat("   ").await, Err(ChatError::EmptyPrompt)));
        assert!(matches!(client.review_diff("\n").await, Err(ChatError::EmptyDiff)));
    }

    #[tokio::test]
    async fn server_error_reports_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&server)
            .await;

        let err = client_for(&server).chat("hi").await.unwrap_err();
        match err {
            ChatError::Status { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "invalid api key");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_choices_fail() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .mount(&server)
            .await;

        let err = client_for(&server).chat("hi").await.unwrap_err();
        assert!(matches!(err, ChatError::NoChoices));
    }

    #[tokio::test]
    async fn blank_content_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(completion("   \n"))
            .mount(&server)
            .await;

        let err = client_for(&server).chat("hi").await.unwrap_err();
        assert!(matches!(err, ChatError::BlankContent));
    }

    #[test]
    fn new_rejects_blank_key_and_trims_base_url() {
        let mut provider = ResolvedProvider {
            name: String::new(),
            api_key: " ".to_owned(),
            base_url: None,
            model: "m".to_owned(),
        };
        assert!(matches!(
            OpenAiCompatibleClient::new(&provider),
            Err(ChatError::MissingApiKey)
        ));

        provider.api_key = "sk".to_owned();
        let client = OpenAiCompatibleClient::new(&provider).unwrap();
        assert_eq!(client.base_url(), "https://api.openai.com/v1");
        assert_eq!(client.model(), "m");
    }
}
