#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;

pub mod groq;
pub mod ollama;
pub mod ollama_cli;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::BackendBox;
use crate::domain::models::ProviderName;

/// Connection settings for every backend, resolved once and handed to
/// whichever entry point needs to build backends.
#[derive(Clone, Debug, Default)]
pub struct BackendManager {
    pub ollama_url: String,
    pub ollama_model: String,
    pub groq_url: String,
    pub groq_token: String,
    pub groq_model: String,
    pub health_check_timeout: String,
}

impl BackendManager {
    pub fn from_config() -> BackendManager {
        return BackendManager {
            ollama_url: Config::get(ConfigKey::OllamaURL),
            ollama_model: Config::get(ConfigKey::OllamaModel),
            groq_url: Config::get(ConfigKey::GroqURL),
            groq_token: Config::get(ConfigKey::GroqToken),
            groq_model: Config::get(ConfigKey::GroqModel),
            health_check_timeout: Config::get(ConfigKey::BackendHealthCheckTimeout),
        };
    }

    fn groq(&self) -> groq::Groq {
        return groq::Groq::new(
            self.groq_url.to_string(),
            self.groq_token.to_string(),
            self.groq_model.to_string(),
        );
    }

    /// Backends for the HTTP session service, which always send the full
    /// history over HTTP with a bounded timeout.
    pub fn service(&self, name: ProviderName) -> BackendBox {
        match name {
            ProviderName::Groq => return Box::new(self.groq().for_service()),
            ProviderName::Ollama => {
                return Box::new(ollama::Ollama::new(
                    self.ollama_url.to_string(),
                    self.ollama_model.to_string(),
                    self.health_check_timeout.to_string(),
                ))
            }
        }
    }

    /// Backends for the console chat loop. Locally this drives the `ollama`
    /// CLI rather than the daemon's HTTP API.
    pub fn console(&self, name: ProviderName) -> BackendBox {
        match name {
            ProviderName::Groq => return Box::new(self.groq()),
            ProviderName::Ollama => {
                return Box::new(ollama_cli::OllamaCli::new(
                    "ollama".to_string(),
                    self.ollama_model.to_string(),
                ))
            }
        }
    }
}
