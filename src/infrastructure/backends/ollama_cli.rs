#[cfg(test)]
#[path = "ollama_cli_test.rs"]
mod tests;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use tokio::process::Command;

use crate::domain::models::Backend;
use crate::domain::models::BackendPrompt;
use crate::domain::models::ProviderName;

/// Runs prompts through the local `ollama` binary. The prompt is handed over
/// as its own argument after `--`, so it never passes through a shell and is
/// never read as a flag.
pub struct OllamaCli {
    binary: String,
    model: String,
}

impl OllamaCli {
    pub fn new(binary: String, model: String) -> OllamaCli {
        return OllamaCli { binary, model };
    }
}

#[async_trait]
impl Backend for OllamaCli {
    fn name(&self) -> ProviderName {
        return ProviderName::Ollama;
    }

    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> Result<()> {
        let output = Command::new(&self.binary).arg("--version").output().await;

        match output {
            Ok(output) if output.status.success() => return Ok(()),
            Ok(output) => {
                tracing::error!(status = ?output.status, "Ollama CLI health check failed");
                bail!("Ollama CLI health check failed");
            }
            Err(err) => {
                tracing::error!(error = ?err, binary = self.binary, "Ollama CLI is not installed");
                bail!(format!("Unable to run {}: {err}", self.binary));
            }
        }
    }

    #[allow(clippy::implicit_return)]
    async fn get_completion(&self, prompt: BackendPrompt) -> Result<String> {
        let text = prompt.last_user_text();
        tracing::debug!(model = self.model, prompt = text, "Running Ollama CLI");

        let output = Command::new(&self.binary)
            .arg("run")
            .arg(&self.model)
            .arg("--")
            .arg(text)
            .output()
            .await;

        let output = match output {
            Ok(output) => output,
            Err(err) => bail!(format!("Unable to run {}: {err}", self.binary)),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::error!(status = ?output.status, stderr = stderr, "Ollama CLI failed");
            bail!(format!("Command failed ({}): {stderr}", output.status));
        }

        return Ok(String::from_utf8_lossy(&output.stdout).trim().to_string());
    }
}
