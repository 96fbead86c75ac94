use mockito::Mock;
use mockito::ServerGuard;

/// Stubs an Ollama daemon's chat endpoint to answer every request with
/// `reply`.
pub async fn mock_ollama_chat(server: &mut ServerGuard, reply: &str) -> Mock {
    let body = serde_json::json!({
        "model": "llama3",
        "message": {
            "role": "assistant",
            "content": reply,
        },
        "done": true,
    });

    return server
        .mock("POST", "/api/chat")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
        .create_async()
        .await;
}

/// Stubs Groq's chat completions endpoint to answer every request with
/// `reply`. The bearer token is expected to be `abc`.
pub async fn mock_groq_completion(server: &mut ServerGuard, reply: &str) -> Mock {
    let body = serde_json::json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {
                "role": "assistant",
                "content": reply,
            },
            "finish_reason": "stop",
        }],
    });

    return server
        .mock("POST", "/v1/chat/completions")
        .match_header("Authorization", "Bearer abc")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
        .create_async()
        .await;
}

/// Stubs an Ollama daemon that fails every chat request.
pub async fn mock_ollama_failure(server: &mut ServerGuard) -> Mock {
    return server
        .mock("POST", "/api/chat")
        .with_status(500)
        .with_body("model runner crashed")
        .create_async()
        .await;
}
