use super::BackendManager;
use crate::domain::models::ProviderName;

fn manager() -> BackendManager {
    return BackendManager {
        ollama_url: "http://localhost:11434".to_string(),
        ollama_model: "llama3".to_string(),
        groq_url: "https://api.groq.com/openai".to_string(),
        groq_token: "abc".to_string(),
        groq_model: "llama3-70b-8192".to_string(),
        health_check_timeout: "200".to_string(),
    };
}

#[test]
fn it_builds_service_backends_by_name() {
    let manager = manager();
    assert_eq!(
        manager.service(ProviderName::Groq).name(),
        ProviderName::Groq
    );
    assert_eq!(
        manager.service(ProviderName::Ollama).name(),
        ProviderName::Ollama
    );
}

#[test]
fn it_builds_console_backends_by_name() {
    let manager = manager();
    assert_eq!(
        manager.console(ProviderName::Groq).name(),
        ProviderName::Groq
    );
    assert_eq!(
        manager.console(ProviderName::Ollama).name(),
        ProviderName::Ollama
    );
}
