use anyhow::Result;
use test_utils::mock_groq_completion;

use super::ask;
use super::run;
use crate::domain::models::ProviderName;
use crate::infrastructure::backends::BackendManager;

fn groq_manager(url: &str) -> BackendManager {
    return BackendManager {
        groq_url: url.to_string(),
        groq_token: "abc".to_string(),
        groq_model: "llama3-70b-8192".to_string(),
        ..Default::default()
    };
}

#[tokio::test]
async fn it_chats_until_exit() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = mock_groq_completion(&mut server, "hello").await;
    let backend = groq_manager(&server.url()).console(ProviderName::Groq);

    let input: &[u8] = b"hi\nEXIT\nnever sent\n";
    let mut output: Vec<u8> = vec![];
    run(&backend, input, &mut output).await?;

    mock.assert_async().await;
    assert_eq!(
        String::from_utf8(output)?,
        "☁️ Using Groq AI (Cloud)...\n\nYou: \nAI: hello\n\nYou: 👋 Goodbye!\n"
    );

    return Ok(());
}

#[tokio::test]
async fn it_stops_at_end_of_input() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let _mock = mock_groq_completion(&mut server, "hello").await;
    let backend = groq_manager(&server.url()).console(ProviderName::Groq);

    let input: &[u8] = b"one\ntwo";
    let mut output: Vec<u8> = vec![];
    run(&backend, input, &mut output).await?;

    let output = String::from_utf8(output)?;
    assert_eq!(output.matches("AI: hello").count(), 2);
    assert!(output.ends_with("👋 Goodbye!\n"));

    return Ok(());
}

#[tokio::test]
async fn it_reports_backend_errors_inline() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(401)
        .with_body(r#"{"error":{"message":"Invalid API Key"}}"#)
        .create_async()
        .await;
    let backend = groq_manager(&server.url()).console(ProviderName::Groq);

    let reply = ask(&backend, "hi").await;

    mock.assert_async().await;
    insta::assert_snapshot!(reply, @"❌ Groq API Error: Invalid API Key");

    return Ok(());
}

#[tokio::test]
async fn it_keeps_looping_after_backend_errors() -> Result<()> {
    let backend = BackendManager::default().console(ProviderName::Groq);

    let input: &[u8] = b"hi\nexit\n";
    let mut output: Vec<u8> = vec![];
    run(&backend, input, &mut output).await?;

    let output = String::from_utf8(output)?;
    assert!(output.contains("AI: ❌ Groq API Error: Groq API token is not configured"));
    assert!(output.ends_with("👋 Goodbye!\n"));

    return Ok(());
}
