use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::constants;
use crate::llm_interaction::{CompletionService, OllamaChatClient, OpenAiChatClient};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Provider {
    /// Any OpenAI-compatible /chat/completions endpoint.
    Openai,
    /// A local Ollama server.
    Ollama,
}

/// Everything the gateway needs to reach its completion service.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub provider: Provider,
    /// Overrides the provider's default base URL.
    pub base_url: Option<String>,
    pub api_key: String,
    pub model: String,
    pub system_prompt: String,
    pub request_timeout: Option<Duration>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            provider: Provider::Openai,
            base_url: None,
            api_key: constants::OPENAI_API_KEY.clone(),
            model: constants::CHAT_MODEL.clone(),
            system_prompt: constants::SYSTEM_PROMPT.clone(),
            request_timeout: None,
        }
    }
}

impl GatewayConfig {
    pub fn base_url(&self) -> String {
        match (&self.base_url, self.provider) {
            (Some(url), _) => url.clone(),
            (None, Provider::Openai) => constants::OPENAI_BASE_URL.clone(),
            (None, Provider::Ollama) => constants::OLLAMA_URL.clone(),
        }
    }

    pub fn build_completion_service(&self) -> Result<Arc<dyn CompletionService>> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("Failed to build HTTP client")?;
        let base_url = self.base_url();

        info!(provider = ?self.provider, %base_url, model = %self.model, "Configuring completion service");

        let service: Arc<dyn CompletionService> = match self.provider {
            Provider::Openai => {
                if self.api_key.is_empty() {
                    warn!("OPENAI_API_KEY is not set; requests will be sent without authorization");
                }
                Arc::new(OpenAiChatClient::new(
                    client,
                    &base_url,
                    &self.api_key,
                    &self.model,
                ))
            }
            Provider::Ollama => Arc::new(OllamaChatClient::new(client, &base_url, &self.model)),
        };
        Ok(service)
    }
}
