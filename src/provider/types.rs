use futures_core::future::BoxFuture;
use serde::{Deserialize, Serialize};

/// Speaker of a single turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    #[cfg(test)]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Everything a provider needs to produce one reply.
///
/// `turns` is the caller's history followed by the new user message; the
/// system instruction is kept apart so each adapter can place it where its
/// upstream schema wants it.
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub system: String,
    pub turns: Vec<Turn>,
}

impl Prompt {
    pub fn assemble(system: impl Into<String>, history: Vec<Turn>, message: impl Into<String>) -> Self {
        let mut turns = history;
        turns.push(Turn::user(message));
        Self {
            system: system.into(),
            turns,
        }
    }

    /// Logical entry sequence: the system instruction, then every turn in order.
    pub fn entries(&self) -> impl Iterator<Item = (Role, &str)> + '_ {
        std::iter::once((Role::System, self.system.as_str()))
            .chain(self.turns.iter().map(|t| (t.role, t.content.as_str())))
    }
}

/// Sampling limits applied to every upstream call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_tokens: 1024,
            temperature: 0.7,
        }
    }
}

/// Provider interface.
pub trait Provider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Generate a single reply for the prompt.
    fn complete(&self, prompt: Prompt) -> BoxFuture<'static, anyhow::Result<String>>;
}
