//! LLM provider abstraction and implementations.
//!
//! Supports Anthropic Claude, `OpenAI` (and compatible servers), and Google
//! Gemini via a common trait.

pub mod anthropic;
pub mod gemini;
pub mod openai;

use crate::AiError;

/// Upper bound on generated tokens for a single completion.
pub const MAX_TOKENS: u32 = 1024;

/// Trait for LLM providers.
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Sends a single-turn completion request and returns the text reply.
    ///
    /// Providers that support a JSON response mode enable it.
    ///
    /// # Errors
    ///
    /// Returns [`AiError`] if the request fails.
    async fn complete(&self, system_prompt: &str, prompt: &str) -> Result<String, AiError>;

    /// Short provider label for logs.
    fn name(&self) -> &'static str;
}

/// Creates an LLM provider based on environment variables.
///
/// If `AI_PROVIDER` is explicitly set, uses that provider. Otherwise
/// auto-detects from available credentials:
///
/// 1. `ANTHROPIC_API_KEY` set -> Anthropic Claude
/// 2. `OPENAI_API_KEY` or `AI_BASE_URL` set -> `OpenAI` (or compatible)
/// 3. `GEMINI_API_KEY` set -> Google Gemini
///
/// `AI_MODEL` overrides the provider's default model.
///
/// # Errors
///
/// Returns [`AiError::Config`] if no credentials are found or the
/// explicitly requested provider is not configured.
pub fn create_provider_from_env() -> Result<Box<dyn LlmProvider>, AiError> {
    let provider = match non_empty_env("AI_PROVIDER") {
        Some(provider) => provider,
        None => detect_provider()
            .ok_or_else(|| AiError::Config {
                message: "No AI credentials detected. Set one of ANTHROPIC_API_KEY, \
                          OPENAI_API_KEY, AI_BASE_URL or GEMINI_API_KEY."
                    .to_string(),
            })?
            .to_string(),
    };
    let model = non_empty_env("AI_MODEL");

    match provider.to_lowercase().as_str() {
        "anthropic" | "claude" => {
            let api_key = required_env("ANTHROPIC_API_KEY")?;
            let model = model.unwrap_or_else(|| anthropic::DEFAULT_MODEL.to_string());
            Ok(Box::new(anthropic::AnthropicProvider::new(api_key, model)))
        }
        "openai" | "gpt" => {
            let base_url = non_empty_env("AI_BASE_URL");
            // Local OpenAI-compatible servers usually don't need a key.
            let api_key = match &base_url {
                Some(_) => non_empty_env("OPENAI_API_KEY"),
                None => Some(required_env("OPENAI_API_KEY")?),
            };
            let model = model.unwrap_or_else(|| openai::DEFAULT_MODEL.to_string());
            let base_url = base_url.unwrap_or_else(|| openai::DEFAULT_BASE_URL.to_string());
            Ok(Box::new(openai::OpenAiProvider::new(api_key, model, base_url)))
        }
        "gemini" | "google" => {
            let api_key = required_env("GEMINI_API_KEY")?;
            let model = model.unwrap_or_else(|| gemini::DEFAULT_MODEL.to_string());
            Ok(Box::new(gemini::GeminiProvider::new(api_key, model)))
        }
        other => Err(AiError::Config {
            message: format!(
                "Unknown AI provider: {other}. Use 'anthropic', 'openai', or 'gemini'."
            ),
        }),
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn required_env(name: &str) -> Result<String, AiError> {
    non_empty_env(name).ok_or_else(|| AiError::Config {
        message: format!("{name} environment variable not set"),
    })
}

/// Auto-detects which provider to use based on available credentials.
///
/// Returns a provider name that matches the arms in
/// [`create_provider_from_env`].
fn detect_provider() -> Option<&'static str> {
    if non_empty_env("ANTHROPIC_API_KEY").is_some() {
        log::info!("Auto-detected AI provider: Anthropic (ANTHROPIC_API_KEY found)");
        return Some("anthropic");
    }

    if non_empty_env("OPENAI_API_KEY").is_some() || non_empty_env("AI_BASE_URL").is_some() {
        log::info!("Auto-detected AI provider: OpenAI-compatible");
        return Some("openai");
    }

    if non_empty_env("GEMINI_API_KEY").is_some() {
        log::info!("Auto-detected AI provider: Gemini (GEMINI_API_KEY found)");
        return Some("gemini");
    }

    None
}
