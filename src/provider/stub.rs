use super::{Prompt, Provider};
use futures_core::future::BoxFuture;

/// Offline provider for local runs: echoes the last turn without any network call.
#[derive(Debug, Default, Clone)]
pub struct StubProvider;

impl StubProvider {
    pub fn new() -> Self {
        Self
    }
}

impl Provider for StubProvider {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn complete(&self, prompt: Prompt) -> BoxFuture<'static, anyhow::Result<String>> {
        Box::pin(async move {
            let entries = prompt.entries().count();
            let last = prompt.turns.last().map(|t| t.content.as_str()).unwrap_or_default();
            Ok(format!("[stub provider] {entries} entries. You said: {last}"))
        })
    }
}
