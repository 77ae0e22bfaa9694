use anyhow::{anyhow, Context, Result};
use reqwest::{Client, StatusCode};
use tracing::{debug, instrument, warn};

use crate::model::{ChatRequest, ChatResponse, ErrorBody, Turn};

/// HTTP client for a running gateway's `POST /api/chat`.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    client: Client,
    base_url: String,
}

impl GatewayClient {
    pub fn new(base_url: &str) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[instrument(skip(self, turns), fields(turns = turns.len()))]
    pub async fn submit(&self, turns: &[Turn]) -> Result<ChatResponse> {
        let url = format!("{}/api/chat", self.base_url);
        let request = ChatRequest {
            messages: turns.to_vec(),
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .context(format!("Failed to send request to gateway at {}", url))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read gateway response")?;

        if status == StatusCode::BAD_REQUEST {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            return Err(anyhow!("Gateway rejected the request: {}", message));
        }

        // Failed generations still carry a renderable body.
        match serde_json::from_str::<ChatResponse>(&body) {
            Ok(chat_response) => {
                if !status.is_success() {
                    warn!(%status, "Gateway reported a failed generation");
                }
                debug!(intent = ?chat_response.intent, "Received gateway response");
                Ok(chat_response)
            }
            Err(e) if status.is_success() => {
                Err(e).context("Failed to parse JSON response from gateway")
            }
            Err(_) => Err(anyhow!(
                "Gateway request failed with status {}: {}",
                status,
                body
            )),
        }
    }
}
