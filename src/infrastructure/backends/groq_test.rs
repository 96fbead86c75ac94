use anyhow::Result;
use test_utils::mock_groq_completion;

use super::Groq;
use crate::domain::models::Backend;
use crate::domain::models::BackendPrompt;
use crate::domain::models::Message;
use crate::domain::models::Role;

impl Groq {
    fn with_url(url: String) -> Groq {
        return Groq::new(url, "abc".to_string(), "llama3-70b-8192".to_string());
    }
}

#[tokio::test]
async fn it_successfully_health_checks() {
    let backend = Groq::with_url("http://localhost".to_string());
    assert!(backend.health_check().await.is_ok());
}

#[tokio::test]
async fn it_fails_health_checks_without_a_token() {
    let backend = Groq::new(
        "http://localhost".to_string(),
        "".to_string(),
        "llama3-70b-8192".to_string(),
    );
    let res = backend.health_check().await;

    assert!(res.is_err());
    insta::assert_snapshot!(res.unwrap_err().to_string(), @"Groq API token is not configured");
}

#[tokio::test]
async fn it_gets_completions() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = mock_groq_completion(&mut server, "  Hello World\n").await;

    let backend = Groq::with_url(server.url());
    let res = backend
        .get_completion(BackendPrompt::from_text("Say hi to the world"))
        .await?;

    mock.assert_async().await;
    assert_eq!(res, "Hello World");

    return Ok(());
}

#[tokio::test]
async fn it_sends_a_single_message_without_temperature() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .match_header("Authorization", "Bearer abc")
        .match_body(mockito::Matcher::Json(serde_json::json!({
            "model": "llama3-70b-8192",
            "messages": [{"role": "user", "content": "hi"}],
        })))
        .with_status(200)
        .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"hello"}}]}"#)
        .create_async()
        .await;

    let backend = Groq::with_url(server.url());
    let res = backend
        .get_completion(BackendPrompt::from_text("hi"))
        .await?;

    mock.assert_async().await;
    assert_eq!(res, "hello");

    return Ok(());
}

#[tokio::test]
async fn it_sends_history_and_temperature_for_the_service() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .match_header("Authorization", "Bearer abc")
        .match_body(mockito::Matcher::Json(serde_json::json!({
            "model": "llama3-70b-8192",
            "messages": [
                {"role": "user", "content": "first"},
                {"role": "assistant", "content": "reply"},
                {"role": "user", "content": "second"},
            ],
            "temperature": 0.6,
        })))
        .with_status(200)
        .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"ok"}}]}"#)
        .create_async()
        .await;

    let prompt = BackendPrompt::new(vec![
        Message::new(Role::User, "first"),
        Message::new(Role::Assistant, "reply"),
        Message::new(Role::User, "second"),
    ]);

    let backend = Groq::with_url(server.url()).for_service();
    let res = backend.get_completion(prompt).await?;

    mock.assert_async().await;
    assert_eq!(res, "ok");

    return Ok(());
}

#[tokio::test]
async fn it_returns_empty_text_without_choices() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_body(r#"{"choices":[]}"#)
        .create_async()
        .await;

    let backend = Groq::with_url(server.url());
    let res = backend
        .get_completion(BackendPrompt::from_text("hi"))
        .await?;

    mock.assert_async().await;
    assert_eq!(res, "");

    return Ok(());
}

#[tokio::test]
async fn it_surfaces_api_error_messages() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(401)
        .with_body(r#"{"error":{"message":"Invalid API Key","type":"invalid_request_error"}}"#)
        .create_async()
        .await;

    let backend = Groq::with_url(server.url());
    let res = backend.get_completion(BackendPrompt::from_text("hi")).await;

    mock.assert_async().await;
    insta::assert_snapshot!(res.unwrap_err().to_string(), @"Invalid API Key");
}

#[tokio::test]
async fn it_falls_back_to_the_status_on_unknown_errors() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(503)
        .with_body("upstream unavailable")
        .create_async()
        .await;

    let backend = Groq::with_url(server.url());
    let res = backend.get_completion(BackendPrompt::from_text("hi")).await;

    mock.assert_async().await;
    insta::assert_snapshot!(res.unwrap_err().to_string(), @"Request failed with status 503 Service Unavailable");
}

#[tokio::test]
async fn it_fails_completions_without_a_token() {
    let backend = Groq::new(
        "http://localhost".to_string(),
        "".to_string(),
        "llama3-70b-8192".to_string(),
    );
    let res = backend.get_completion(BackendPrompt::from_text("hi")).await;

    assert!(res.is_err());
}
