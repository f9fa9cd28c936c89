// HTTP-level tests for the LLM clients against a local mock server
use serde_json::json;
use serial_test::serial;
use skyvet::config::{LlmConfig, Provider};
use skyvet::llm::factory;

fn config_for(provider: Provider, base_url: String) -> LlmConfig {
    LlmConfig {
        provider,
        base_url: Some(base_url),
        timeout_secs: 5,
        ..LlmConfig::default()
    }
}

#[tokio::test]
async fn test_ollama_chat_round_trip() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/chat")
        .match_body(mockito::Matcher::PartialJson(json!({
            "model": "mistral:7b-instruct",
            "stream": false,
            "options": {"num_ctx": 4096},
            "messages": [
                {"role": "system", "content": "sys"},
                {"role": "user", "content": "Is ZTF1 a supernova?"}
            ]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"model":"mistral:7b-instruct","message":{"role":"assistant","content":"Probably."},"done":true}"#,
        )
        .create_async()
        .await;

    let client = factory::create_client(&config_for(Provider::Ollama, server.url()), false).unwrap();
    let reply = client.complete("sys", "Is ZTF1 a supernova?").await.unwrap();

    assert_eq!(reply, "Probably.");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_ollama_error_status_is_reported() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/chat")
        .with_status(404)
        .with_body(r#"{"error":"model 'mistral:7b-instruct' not found"}"#)
        .create_async()
        .await;

    let client = factory::create_client(&config_for(Provider::Ollama, server.url()), false).unwrap();
    let err = client.complete("sys", "hi").await.unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("Ollama API error 404"), "{}", msg);
    assert!(msg.contains("not found"));
}

#[tokio::test]
async fn test_openai_compatible_without_key_sends_no_auth() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .match_header("authorization", mockito::Matcher::Missing)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"Follow up."}}]}"#)
        .create_async()
        .await;

    let config = config_for(Provider::OpenAICompatible, format!("{}/v1", server.url()));
    let client = factory::create_client(&config, false).unwrap();
    let reply = client.complete("sys", "prompt").await.unwrap();

    assert_eq!(reply, "Follow up.");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_openai_empty_choices_is_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"choices":[]}"#)
        .create_async()
        .await;

    let client = factory::create_client(
        &config_for(Provider::OpenAICompatible, server.url()),
        false,
    )
    .unwrap();
    let err = client.complete("sys", "prompt").await.unwrap_err();
    assert!(err.to_string().contains("No choices"));
}

fn anthropic_config(base_url: String) -> LlmConfig {
    std::env::set_var("SKYVET_TEST_ANTHROPIC_KEY", "sk-ant-test");
    LlmConfig {
        api_key_env: Some("SKYVET_TEST_ANTHROPIC_KEY".to_string()),
        model: "claude-sonnet-4-5".to_string(),
        ..config_for(Provider::Anthropic, base_url)
    }
}

#[tokio::test]
#[serial]
async fn test_anthropic_messages_round_trip() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/messages")
        .match_header("x-api-key", "sk-ant-test")
        .match_header("anthropic-version", "2023-06-01")
        .match_body(mockito::Matcher::PartialJson(json!({
            "model": "claude-sonnet-4-5",
            "max_tokens": 1024,
            "system": "sys",
            "messages": [{"role": "user", "content": "Vet ZTF1"}]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"content":[{"type":"thinking","thinking":"..."},{"type":"text","text":"Request a spectrum."}]}"#,
        )
        .create_async()
        .await;

    let client = factory::create_client(&anthropic_config(server.url()), false).unwrap();
    let reply = client.complete("sys", "Vet ZTF1").await.unwrap();

    assert_eq!(reply, "Request a spectrum.");
    mock.assert_async().await;
}

#[tokio::test]
#[serial]
async fn test_anthropic_without_text_block_is_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/v1/messages")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"content":[{"type":"tool_use","id":"t1","name":"lookup","input":{}}]}"#)
        .create_async()
        .await;

    let client = factory::create_client(&anthropic_config(server.url()), false).unwrap();
    let err = client.complete("sys", "Vet ZTF1").await.unwrap_err();
    assert!(err.to_string().contains("No text content"), "{}", err);
}
