use anyhow::Result;
use tracing::debug;

use super::client::{LlmClient, MockLlmClient};
use super::client_impl::{AnthropicClient, OllamaClient, OpenAIClient};
use crate::config::{LlmConfig, Provider};

/// Create an LLM client from configuration
pub fn create_client(config: &LlmConfig, dry_run: bool) -> Result<Box<dyn LlmClient>> {
    if dry_run {
        return Ok(Box::new(MockLlmClient::new()));
    }

    let api_key = config.get_api_key()?;
    let base_url = config.get_base_url();
    debug!(
        "Creating {} client for model {} at {}",
        config.provider, config.model, base_url
    );

    match config.provider {
        Provider::Ollama => Ok(Box::new(OllamaClient::new(
            config.model.clone(),
            base_url,
            config.temperature,
            config.num_ctx,
            config.timeout_secs,
        )?
        .with_num_predict(config.get_max_tokens()))),

        Provider::OpenAI | Provider::OpenAICompatible => Ok(Box::new(OpenAIClient::with_base_url(
            api_key,
            config.model.clone(),
            base_url,
            config.get_max_tokens(),
            config.temperature,
            config.timeout_secs,
        )?)),

        Provider::Anthropic => Ok(Box::new(AnthropicClient::new(
            api_key,
            config.model.clone(),
            base_url,
            config.get_max_tokens().unwrap_or(1024),
            config.temperature,
            config.timeout_secs,
        )?)),
    }
}
