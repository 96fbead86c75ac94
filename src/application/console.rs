#[cfg(test)]
#[path = "console_test.rs"]
mod tests;

use anyhow::Result;
use tokio::io::AsyncBufRead;
use tokio::io::AsyncBufReadExt;
use tokio::io::AsyncWrite;
use tokio::io::AsyncWriteExt;
use tokio::io::BufReader;

use crate::configuration::Config;
use crate::domain::models::BackendBox;
use crate::domain::models::BackendPrompt;
use crate::domain::models::ProviderName;
use crate::infrastructure::backends::BackendManager;

fn banner(provider: ProviderName) -> &'static str {
    match provider {
        ProviderName::Groq => return "☁️ Using Groq AI (Cloud)...",
        ProviderName::Ollama => return "💻 Using Ollama (Local)...",
    }
}

/// Sends a single line to the backend. Failures come back as the reply text
/// so the chat loop keeps running.
pub async fn ask(backend: &BackendBox, text: &str) -> String {
    match backend.get_completion(BackendPrompt::from_text(text)).await {
        Ok(reply) => return reply,
        Err(err) => {
            tracing::error!(error = ?err, provider = %backend.name(), "Console completion failed");
            return format!("❌ {} Error: {err}", backend.name().error_label());
        }
    }
}

/// Reads prompts line by line until `exit` or end of input, printing each
/// reply.
pub async fn run<R, W>(backend: &BackendBox, reader: R, writer: &mut W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    writer
        .write_all(format!("{}\n", banner(backend.name())).as_bytes())
        .await?;

    let mut lines = reader.lines();
    loop {
        writer.write_all(b"\nYou: ").await?;
        writer.flush().await?;

        let line = match lines.next_line().await? {
            Some(line) => line,
            None => break,
        };

        if line.to_lowercase() == "exit" {
            break;
        }

        let reply = ask(backend, &line).await;
        writer
            .write_all(format!("\nAI: {reply}\n").as_bytes())
            .await?;
    }

    writer.write_all("👋 Goodbye!\n".as_bytes()).await?;
    writer.flush().await?;

    return Ok(());
}

pub async fn start() -> Result<()> {
    let provider = Config::default_provider();
    let backend = BackendManager::from_config().console(provider);

    if let Err(err) = backend.health_check().await {
        tracing::warn!(error = ?err, provider = %provider, "Backend health check failed");
    }

    let mut stdout = tokio::io::stdout();
    return run(&backend, BufReader::new(tokio::io::stdin()), &mut stdout).await;
}
