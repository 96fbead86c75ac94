#[cfg(test)]
#[path = "provider_test.rs"]
mod tests;

use serde_derive::Deserialize;
use serde_derive::Serialize;
use strum::EnumIter;
use strum::EnumVariantNames;
use strum::IntoEnumIterator;

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    EnumVariantNames,
    strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ProviderName {
    Groq,
    Ollama,
}

impl ProviderName {
    pub fn parse(text: &str) -> Option<ProviderName> {
        return ProviderName::iter().find(|e| return e.to_string() == text);
    }

    /// Resolves the process wide default. An explicit `use-groq` flag wins,
    /// otherwise Groq is picked whenever a token is available.
    pub fn default_for(use_groq: &str, groq_token: &str) -> ProviderName {
        let use_groq = match use_groq.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" => Some(true),
            "false" | "0" | "no" => Some(false),
            _ => None,
        };

        let groq = use_groq.unwrap_or_else(|| return !groq_token.trim().is_empty());
        if groq {
            return ProviderName::Groq;
        }

        return ProviderName::Ollama;
    }

    /// Label used when reporting backend failures inline.
    pub fn error_label(&self) -> &'static str {
        match self {
            ProviderName::Groq => return "Groq API",
            ProviderName::Ollama => return "Ollama",
        }
    }
}
