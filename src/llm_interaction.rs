use anyhow::{anyhow, Context, Result};
use futures::future::BoxFuture;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use crate::model::Turn;

/// Something that turns an ordered list of turns into one completion text.
pub trait CompletionService: Send + Sync {
    /// Short provider name for logs and the health endpoint.
    fn name(&self) -> &str;

    fn model(&self) -> &str;

    /// Single call, no retries.
    fn complete<'a>(&'a self, turns: &'a [Turn]) -> BoxFuture<'a, Result<String>>;
}

// Structures matching the OpenAI /chat/completions endpoint
#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: &'a [Turn],
}

#[derive(Deserialize, Debug)]
struct OpenAiResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize, Debug)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Deserialize, Debug)]
struct OpenAiMessage {
    content: Option<String>,
}

pub struct OpenAiChatClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiChatClient {
    pub fn new(client: Client, base_url: &str, api_key: &str, model: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }

    #[instrument(skip(self, turns), fields(model = %self.model, turns = turns.len()))]
    async fn chat_completion(&self, turns: &[Turn]) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let payload = OpenAiRequest {
            model: &self.model,
            messages: turns,
        };

        let mut request = self.client.post(&url).json(&payload);
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key);
        }

        let response = request
            .send()
            .await
            .context(format!("Failed to send request to completion API at {}", url))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            let message = serde_json::from_str::<serde_json::Value>(&error_body)
                .ok()
                .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
                .unwrap_or(error_body);
            error!(%status, %message, "Completion API request failed");
            return Err(anyhow!(
                "Completion API request failed with status {}: {}",
                status,
                message
            ));
        }

        let completion = response
            .json::<OpenAiResponse>()
            .await
            .context("Failed to parse JSON response from completion API")?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| anyhow!("Completion API returned no message content"))?;

        debug!(response = ?content, "Received completion");
        Ok(content)
    }
}

impl CompletionService for OpenAiChatClient {
    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn complete<'a>(&'a self, turns: &'a [Turn]) -> BoxFuture<'a, Result<String>> {
        Box::pin(self.chat_completion(turns))
    }
}

// Structures matching Ollama's /api/chat endpoint
#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    messages: &'a [Turn],
    stream: bool, // We want the full response, not a stream
}

#[derive(Deserialize, Debug)]
struct OllamaResponse {
    message: Option<OllamaMessage>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize, Debug)]
struct OllamaMessage {
    content: String,
}

pub struct OllamaChatClient {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaChatClient {
    pub fn new(client: Client, base_url: &str, model: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }

    #[instrument(skip(self, turns), fields(model = %self.model, turns = turns.len()))]
    async fn chat(&self, turns: &[Turn]) -> Result<String> {
        let url = format!("{}/api/chat", self.base_url);
        let payload = OllamaRequest {
            model: &self.model,
            messages: turns,
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .context(format!("Failed to send request to Ollama API at {}", url))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            error!(%status, %error_body, "Ollama API request failed");
            return Err(anyhow!(
                "Ollama API request failed with status {}: {}",
                status,
                error_body
            ));
        }

        let ollama_response = response
            .json::<OllamaResponse>()
            .await
            .context("Failed to parse JSON response from Ollama API")?;

        if let Some(err) = ollama_response.error {
            return Err(anyhow!("Ollama API error: {}", err));
        }

        let content = ollama_response
            .message
            .map(|m| m.content)
            .ok_or_else(|| anyhow!("Ollama API returned no message"))?;

        debug!(response = ?content, "Received Ollama response");
        Ok(content)
    }
}

impl CompletionService for OllamaChatClient {
    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn complete<'a>(&'a self, turns: &'a [Turn]) -> BoxFuture<'a, Result<String>> {
        Box::pin(self.chat(turns))
    }
}
