use super::{GenerationParams, Prompt, Provider, Role, Turn};
use anyhow::{anyhow, Context};
use futures_core::future::BoxFuture;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Url;
use serde::{Deserialize, Serialize};

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Gemini adapter: the system instruction travels in its own field and every
/// turn becomes `{role, parts:[{text}]}`.
#[derive(Debug, Clone)]
pub struct GoogleProvider {
    http: reqwest::Client,
    api_key: String,
    api_base: Url,
    model: String,
    params: GenerationParams,
}

impl GoogleProvider {
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
                .with_context(|| format!("invalid Gemini API base URL: {api_base}"))?,
            model,
            params,
        })
    }

    fn build_url(&self) -> anyhow::Result<Url> {
        // Docs: https://ai.google.dev/api/generate-content
        let mut url = self
            .api_base
            .join(&format!("v1beta/models/{}:generateContent", self.model))?;
        url.query_pairs_mut().append_pair("key", &self.api_key);
        Ok(url)
    }

    fn headers() -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        h
    }

    fn build_body(&self, prompt: Prompt) -> GenerateContentRequest {
        let (system_instruction, contents) = to_nested(prompt);
        GenerateContentRequest {
            system_instruction,
            contents,
            generation_config: GenerationConfig {
                max_output_tokens: self.params.max_tokens,
                temperature: self.params.temperature,
            },
        }
    }
}

impl Provider for GoogleProvider {
    fn name(&self) -> &'static str {
        "google"
    }

    fn complete(&self, prompt: Prompt) -> BoxFuture<'static, anyhow::Result<String>> {
        let this = self.clone();

        Box::pin(async move {
            let url = this.build_url()?;
            let body = this.build_body(prompt);

            let resp = this
                .http
                .post(url)
                .headers(Self::headers())
                .json(&body)
                .send()
                .await
                .context("failed to send Gemini request")?;

            let status = resp.status();
            if !status.is_success() {
                let text = resp.text().await.unwrap_or_default();
                return Err(anyhow!("Gemini API error: HTTP {status}: {text}"));
            }

            let parsed: GenerateContentResponse = resp
                .json()
                .await
                .context("failed to parse Gemini response JSON")?;

            extract_text(&parsed).ok_or_else(|| anyhow!("Gemini response contained no candidate text"))
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    #[serde(default)]
    pub text: Option<String>,
}

fn text_content(role: Option<&str>, text: String) -> Content {
    Content {
        role: role.map(str::to_string),
        parts: vec![Part { text: Some(text) }],
    }
}

/// Split a prompt into Gemini's `systemInstruction` and `contents`.
///
/// Gemini only knows "user" and "model" inside `contents`, so system turns
/// from the history become extra parts of `systemInstruction`, after the
/// fixed instruction and in their original order.
pub fn to_nested(prompt: Prompt) -> (Content, Vec<Content>) {
    let mut system = text_content(None, prompt.system);
    let mut contents = Vec::with_capacity(prompt.turns.len());
    for turn in prompt.turns {
        match turn.role {
            Role::System => system.parts.push(Part { text: Some(turn.content) }),
            Role::User => contents.push(text_content(Some("user"), turn.content)),
            Role::Assistant => contents.push(text_content(Some("model"), turn.content)),
        }
    }
    (system, contents)
}

/// Read the nested shape back into a prompt. System turns come back ahead of
/// the conversation; user and assistant turns keep their order.
#[cfg(test)]
pub fn from_nested(system: &Content, contents: &[Content]) -> anyhow::Result<Prompt> {
    let mut parts = system.parts.iter().map(|p| p.text.clone().unwrap_or_default());
    let instruction = parts.next().ok_or_else(|| anyhow!("systemInstruction has no parts"))?;
    let mut turns: Vec<Turn> = parts.map(|t| Turn::new(Role::System, t)).collect();

    for c in contents {
        let role = match c.role.as_deref() {
            Some("user") => Role::User,
            Some("model") => Role::Assistant,
            other => return Err(anyhow!("unexpected Gemini role: {other:?}")),
        };
        turns.push(Turn::new(role, join_parts(&c.parts)));
    }
    Ok(Prompt {
        system: instruction,
        turns,
    })
}

fn join_parts(parts: &[Part]) -> String {
    parts.iter().filter_map(|p| p.text.as_deref()).collect()
}

fn extract_text(r: &GenerateContentResponse) -> Option<String> {
    // Concatenate all text parts of the first candidate.
    let content = r.candidates.first()?.content.as_ref()?;
    let out = join_parts(&content.parts);
    if out.is_empty() { None } else { Some(out) }
}
