//! The Advisor collaborator: turns a prompt into a JSON reply.

use crate::{AiError, providers::LlmProvider};

/// System prompt sent with every advisor request.
pub const SYSTEM_PROMPT: &str = "You are a safety analysis expert. \
Respond with a single JSON object and nothing else.";

/// Produces a raw structured reply for an insight prompt.
///
/// The reply is untrusted text; callers validate its shape.
#[async_trait::async_trait]
pub trait Advisor: Send + Sync {
    /// Generates a reply for `prompt`.
    ///
    /// # Errors
    ///
    /// Returns [`AiError`] if the underlying model cannot be reached or
    /// refuses the request.
    async fn generate(&self, prompt: &str) -> Result<String, AiError>;
}

/// [`Advisor`] backed by an [`LlmProvider`].
pub struct LlmAdvisor {
    provider: Box<dyn LlmProvider>,
}

impl LlmAdvisor {
    /// Wraps a provider.
    #[must_use]
    pub fn new(provider: Box<dyn LlmProvider>) -> Self {
        Self { provider }
    }

    /// Builds an advisor from the `AI_*` and provider key environment
    /// variables.
    ///
    /// # Errors
    ///
    /// Returns [`AiError::Config`] if no provider is configured.
    pub fn from_env() -> Result<Self, AiError> {
        let provider = crate::providers::create_provider_from_env()?;
        log::info!("Using {} for safety insights", provider.name());
        Ok(Self::new(provider))
    }
}

#[async_trait::async_trait]
impl Advisor for LlmAdvisor {
    async fn generate(&self, prompt: &str) -> Result<String, AiError> {
        log::debug!("Requesting insight from {}", self.provider.name());
        self.provider.complete(SYSTEM_PROMPT, prompt).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    struct RecordingProvider {
        seen: Arc<Mutex<Vec<(String, String)>>>,
    }

    #[async_trait::async_trait]
    impl LlmProvider for RecordingProvider {
        async fn complete(&self, system_prompt: &str, prompt: &str) -> Result<String, AiError> {
            self.seen
                .lock()
                .unwrap()
                .push((system_prompt.to_string(), prompt.to_string()));
            Ok("{}".to_string())
        }

        fn name(&self) -> &'static str {
            "recording"
        }
    }

    #[tokio::test]
    async fn forwards_prompt_with_system_prompt() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let advisor = LlmAdvisor::new(Box::new(RecordingProvider { seen: seen.clone() }));

        let reply = advisor.generate("how safe is it?").await.unwrap();

        assert_eq!(reply, "{}");
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, SYSTEM_PROMPT);
        assert_eq!(seen[0].1, "how safe is it?");
    }
}
