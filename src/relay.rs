use crate::error::{RelayError, MESSAGE_REQUIRED};
use crate::provider::{Prompt, Provider, Turn};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a friendly and helpful assistant for a volunteering application. \
Your goal is to answer user questions about volunteering opportunities, how to sign up, event details, \
and encourage participation. Be concise and encouraging.";

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatRequest {
    pub history: Vec<Turn>,
    pub message: String,
}

impl ChatRequest {
    /// Decode a raw JSON body. `message` is checked before anything else is
    /// looked at, so a body without a usable message always yields
    /// "Message is required".
    pub fn from_json(body: Value) -> Result<Self, RelayError> {
        let message = match body.get("message") {
            Some(Value::String(m)) if !m.is_empty() => m.clone(),
            _ => return Err(RelayError::Validation(MESSAGE_REQUIRED.to_string())),
        };

        // History the provider cannot be given counts as a failed upstream
        // call, not as a new kind of client error.
        let history = match body.get("history") {
            None | Some(Value::Null) => Vec::new(),
            Some(v) => Vec::<Turn>::deserialize(v)
                .context("history is not a list of role/content turns")
                .map_err(RelayError::Upstream)?,
        };

        Ok(Self { history, message })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
}

/// Prepends the system instruction to the caller's conversation and asks the
/// configured provider for the next assistant turn.
#[derive(Clone)]
pub struct Relay {
    provider: Arc<dyn Provider>,
    system_prompt: String,
}

impl Relay {
    pub fn new(provider: Arc<dyn Provider>, system_prompt: impl Into<String>) -> Self {
        Self {
            provider,
            system_prompt: system_prompt.into(),
        }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    pub async fn handle_chat(&self, request: ChatRequest) -> Result<ChatReply, RelayError> {
        let prompt = self.build_prompt(request)?;
        tracing::debug!(
            provider = self.provider.name(),
            history_len = prompt.turns.len() - 1,
            "forwarding chat"
        );

        let reply = self
            .provider
            .complete(prompt)
            .await
            .map_err(RelayError::Upstream)?;
        Ok(ChatReply { reply })
    }

    /// Validate the request and assemble the prompt. Never touches the network.
    pub fn build_prompt(&self, request: ChatRequest) -> Result<Prompt, RelayError> {
        if request.message.is_empty() {
            return Err(RelayError::Validation(MESSAGE_REQUIRED.to_string()));
        }
        Ok(Prompt::assemble(
            self.system_prompt.clone(),
            request.history,
            request.message,
        ))
    }
}
