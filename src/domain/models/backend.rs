#[cfg(test)]
#[path = "backend_test.rs"]
mod tests;

use anyhow::Result;
use async_trait::async_trait;

use super::Message;
use super::ProviderName;
use super::Role;

#[derive(Clone, Debug)]
pub struct BackendPrompt {
    pub messages: Vec<Message>,
}

impl BackendPrompt {
    pub fn new(messages: Vec<Message>) -> BackendPrompt {
        return BackendPrompt { messages };
    }

    /// A single user turn without any prior history.
    pub fn from_text(text: &str) -> BackendPrompt {
        return BackendPrompt {
            messages: vec![Message::new(Role::User, text)],
        };
    }

    /// The most recent user message, used by backends that can't take a
    /// history.
    pub fn last_user_text(&self) -> &str {
        return self
            .messages
            .iter()
            .rev()
            .find(|msg| return msg.role == Role::User)
            .map(|msg| return msg.content.as_str())
            .unwrap_or("");
    }
}

#[async_trait]
pub trait Backend {
    fn name(&self) -> ProviderName;

    /// Used at startup to verify the backend is reachable and configured.
    /// Failures are reported but never fatal.
    async fn health_check(&self) -> Result<()>;

    /// Requests a completion for the prompt's full message history and
    /// returns the reply text.
    async fn get_completion(&self, prompt: BackendPrompt) -> Result<String>;
}

pub type BackendBox = Box<dyn Backend + Send + Sync>;
