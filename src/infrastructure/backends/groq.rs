#[cfg(test)]
#[path = "groq_test.rs"]
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

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CompletionMessageResponse {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CompletionChoiceResponse {
    #[serde(default)]
    message: Option<CompletionMessageResponse>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoiceResponse>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ErrorDetail {
    message: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

/// Groq's OpenAI compatible chat completions API.
pub struct Groq {
    url: String,
    token: String,
    model: String,
    temperature: Option<f64>,
    timeout: Option<Duration>,
}

impl Groq {
    pub fn new(url: String, token: String, model: String) -> Groq {
        return Groq {
            url,
            token,
            model,
            temperature: None,
            timeout: None,
        };
    }

    /// Settings used by the HTTP session service: fixed sampling temperature
    /// and a bounded request time.
    pub fn for_service(mut self) -> Groq {
        self.temperature = Some(0.6);
        self.timeout = Some(Duration::from_secs(120));
        return self;
    }
}

#[async_trait]
impl Backend for Groq {
    fn name(&self) -> ProviderName {
        return ProviderName::Groq;
    }

    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> Result<()> {
        if self.url.is_empty() {
            bail!("Groq URL is not defined");
        }
        if self.token.is_empty() {
            bail!("Groq API token is not configured");
        }

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn get_completion(&self, prompt: BackendPrompt) -> Result<String> {
        if self.token.is_empty() {
            bail!("Groq API token is not configured");
        }

        let req = CompletionRequest {
            model: self.model.to_string(),
            messages: prompt.messages,
            temperature: self.temperature,
        };

        let mut builder = reqwest::Client::new()
            .post(format!("{url}/v1/chat/completions", url = self.url))
            .header("Authorization", format!("Bearer {}", self.token))
            .json(&req);

        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        let res = builder.send().await?;
        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = status.as_u16(),
                body = body,
                "Failed to make completion request to Groq"
            );

            if let Ok(err_res) = serde_json::from_str::<ErrorResponse>(&body) {
                bail!(err_res.error.message);
            }
            bail!(format!("Request failed with status {status}"));
        }

        tracing::debug!(body = body, "Completion response");
        let ores: CompletionResponse = serde_json::from_str(&body)?;

        let text = ores
            .choices
            .into_iter()
            .next()
            .and_then(|choice| return choice.message)
            .and_then(|msg| return msg.content)
            .unwrap_or_default();

        return Ok(text.trim().to_string());
    }
}
