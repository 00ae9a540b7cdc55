use super::{GenerationParams, Prompt, Provider};
use anyhow::{anyhow, Context};
use futures_core::future::BoxFuture;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Url;
use serde::{Deserialize, Serialize};

pub const DEFAULT_API_BASE: &str = "https://api.deepseek.com/";
pub const DEFAULT_MODEL: &str = "deepseek-chat";

/// DeepSeek adapter. Speaks the OpenAI-compatible `chat/completions` schema,
/// where the system instruction is just the first `{role, content}` entry.
#[derive(Debug, Clone)]
pub struct DeepSeekProvider {
    http: reqwest::Client,
    api_key: String,
    api_base: Url,
    model: String,
    params: GenerationParams,
}

impl DeepSeekProvider {
    pub fn new(
        http: reqwest::Client,
        api_key: String,
        api_base: &str,
        model: String,
        params: GenerationParams,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            http,
            api_key,
            api_base: super::base_url(api_base)
                .with_context(|| format!("invalid DeepSeek API base URL: {api_base}"))?,
            model,
            params,
        })
    }

    fn headers(&self) -> anyhow::Result<HeaderMap> {
        let mut h = HeaderMap::new();
        h.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let v = HeaderValue::from_str(&format!("Bearer {}", self.api_key)).map_err(|e| anyhow!(e))?;
        h.insert(AUTHORIZATION, v);
        Ok(h)
    }

    fn build_body(&self, prompt: &Prompt) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: prompt
                .entries()
                .map(|(role, content)| Message {
                    role: role.as_str().to_string(),
                    content: content.to_string(),
                })
                .collect(),
            max_tokens: self.params.max_tokens,
            temperature: self.params.temperature,
        }
    }
}

impl Provider for DeepSeekProvider {
    fn name(&self) -> &'static str {
        "deepseek"
    }

    fn complete(&self, prompt: Prompt) -> BoxFuture<'static, anyhow::Result<String>> {
        let this = self.clone();

        Box::pin(async move {
            let url = this.api_base.join("chat/completions")?;
            let headers = this.headers()?;
            let body = this.build_body(&prompt);

            let resp = this
                .http
                .post(url)
                .headers(headers)
                .json(&body)
                .send()
                .await
                .context("failed to send DeepSeek request")?;

            let status = resp.status();
            if !status.is_success() {
                let text = resp.text().await.unwrap_or_default();
                return Err(anyhow!("DeepSeek API error: HTTP {status}: {text}"));
            }

            let chat: ChatCompletionResponse = resp
                .json()
                .await
                .context("failed to parse DeepSeek response JSON")?;

            chat.choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .ok_or_else(|| anyhow!("DeepSeek response contained no choices"))
        })
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::Turn;
    use httpmock::prelude::*;
    use serde_json::json;

    fn provider(base: &str) -> DeepSeekProvider {
        DeepSeekProvider::new(
            reqwest::Client::new(),
            "sk-test".to_string(),
            base,
            "deepseek-chat".to_string(),
            GenerationParams {
                max_tokens: 512,
                temperature: 0.5,
            },
        )
        .unwrap()
    }

    fn prompt() -> Prompt {
        Prompt::assemble(
            "sys",
            vec![Turn::user("Hi"), Turn::assistant("Hello!")],
            "How do I sign up?",
        )
    }

    #[tokio::test]
    async fn sends_flat_messages_with_bearer_auth() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/chat/completions")
                    .header("authorization", "Bearer sk-test")
                    .json_body(json!({
                        "model": "deepseek-chat",
                        "messages": [
                            { "role": "system", "content": "sys" },
                            { "role": "user", "content": "Hi" },
                            { "role": "assistant", "content": "Hello!" },
                            { "role": "user", "content": "How do I sign up?" }
                        ],
                        "max_tokens": 512,
                        "temperature": 0.5
                    }));
                then.status(200).json_body(json!({
                    "choices": [{ "message": { "role": "assistant", "content": "Visit our signup page." } }]
                }));
            })
            .await;

        let reply = provider(&server.base_url()).complete(prompt()).await.unwrap();
        assert_eq!(reply, "Visit our signup page.");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn error_status_keeps_upstream_detail() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(401).body(r#"{"error":"invalid api key"}"#);
            })
            .await;

        let err = provider(&server.base_url()).complete(prompt()).await.unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("401"), "{msg}");
        assert!(msg.contains("invalid api key"), "{msg}");
    }

    #[tokio::test]
    async fn malformed_envelope_is_an_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(200).body("not json");
            })
            .await;

        let err = provider(&server.base_url()).complete(prompt()).await.unwrap_err();
        assert!(format!("{err:#}").contains("failed to parse"));
    }

    #[tokio::test]
    async fn empty_choices_is_an_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(200).json_body(json!({ "choices": [] }));
            })
            .await;

        assert!(provider(&server.base_url()).complete(prompt()).await.is_err());
    }

    #[tokio::test]
    async fn unreachable_upstream_is_an_error() {
        // Port 9 (discard) is not expected to have an HTTP server listening.
        let err = provider("http://127.0.0.1:9/").complete(prompt()).await.unwrap_err();
        assert!(format!("{err:#}").contains("failed to send DeepSeek request"));
    }

    #[tokio::test]
    async fn base_with_path_keeps_its_prefix() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/chat/completions");
                then.status(200).json_body(json!({
                    "choices": [{ "message": { "role": "assistant", "content": "ok" } }]
                }));
            })
            .await;

        let base = format!("{}/v1", server.base_url());
        assert_eq!(provider(&base).complete(prompt()).await.unwrap(), "ok");
        mock.assert_async().await;
    }

    #[test]
    fn history_system_turns_are_forwarded_in_place() {
        use crate::provider::Role;

        let p = Prompt::assemble(
            "sys",
            vec![Turn::user("Hi"), Turn::new(Role::System, "be brief")],
            "q",
        );
        let body = serde_json::to_value(provider("http://localhost/").build_body(&p)).unwrap();
        assert_eq!(
            body["messages"],
            json!([
                { "role": "system", "content": "sys" },
                { "role": "user", "content": "Hi" },
                { "role": "system", "content": "be brief" },
                { "role": "user", "content": "q" }
            ])
        );
    }
}
