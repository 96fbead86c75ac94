#[cfg(test)]
#[path = "ollama_test.rs"]
mod tests;

use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use serde_derive::Deserialize;
use serde_derive::Serialize;

use crate::domain::models::Backend;
use crate::domain::models::BackendPrompt;
use crate::domain::models::Message;
use crate::domain::models::ProviderName;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    stream: bool,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ChatMessageResponse {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    message: Option<ChatMessageResponse>,
    #[serde(default)]
    response: Option<String>,
}

impl ChatResponse {
    /// Prefers the chat shaped reply, falls back to the generate shaped one.
    fn into_text(self) -> String {
        if let Some(content) = self.message.and_then(|msg| return msg.content) {
            if !content.is_empty() {
                return content;
            }
        }

        return self.response.unwrap_or_default();
    }
}

/// Talks to a running Ollama daemon over its HTTP chat API.
pub struct Ollama {
    url: String,
    model: String,
    timeout: Duration,
    health_check_timeout: String,
}

impl Ollama {
    pub fn new(url: String, model: String, health_check_timeout: String) -> Ollama {
        return Ollama {
            url,
            model,
            timeout: Duration::from_secs(120),
            health_check_timeout,
        };
    }
}

#[async_trait]
impl Backend for Ollama {
    fn name(&self) -> ProviderName {
        return ProviderName::Ollama;
    }

    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> Result<()> {
        let res = reqwest::Client::new()
            .get(&self.url)
            .timeout(Duration::from_millis(
                self.health_check_timeout.parse::<u64>()?,
            ))
            .send()
            .await;

        let res = match res {
            Ok(res) => res,
            Err(err) => {
                tracing::error!(error = ?err, "Ollama is not running");
                bail!("Ollama is not running");
            }
        };

        if res.status() != 200 {
            tracing::error!(status = res.status().as_u16(), "Ollama health check failed");
            bail!("Ollama health check failed");
        }

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn get_completion(&self, prompt: BackendPrompt) -> Result<String> {
        let req = ChatRequest {
            model: self.model.to_string(),
            messages: prompt.messages,
            stream: false,
        };

        let res = reqwest::Client::new()
            .post(format!("{url}/api/chat", url = self.url))
            .timeout(self.timeout)
            .json(&req)
            .send()
            .await?;

        if !res.status().is_success() {
            tracing::error!(
                status = res.status().as_u16(),
                "Failed to make completion request to Ollama"
            );
            bail!(format!(
                "Failed to make completion request to Ollama: {}",
                res.status()
            ));
        }

        let body = res.text().await?;
        tracing::debug!(body = body, "Completion response");

        let ores: ChatResponse = serde_json::from_str(&body).unwrap_or_default();
        return Ok(ores.into_text());
    }
}
