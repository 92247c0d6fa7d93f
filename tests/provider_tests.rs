// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

use persona_chat::chat::PersonaId;
use persona_chat::config::GeminiConfig;
use persona_chat::llm::providers::{AnthropicProvider, GeminiProvider};
use persona_chat::llm::{CompletionProvider, FailureReason};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_anthropic_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "test-key"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(json!({
            "model": "claude-3-sonnet-20240229",
            "max_tokens": 1024,
            "messages": [{"role": "user", "content": "You are Estrella.\n\nUser: hi"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "msg_01",
            "type": "message",
            "role": "assistant",
            "content": [{"type": "text", "text": "Hello! Let's get organized."}],
            "model": "claude-3-sonnet-20240229",
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 12, "output_tokens": 7}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = AnthropicProvider::with_base_url(
        Some("test-key".to_string()),
        format!("{}/v1/messages", server.uri()),
    );
    let outcome = provider
        .complete(PersonaId::Estrella, "You are Estrella.\n\nUser: hi")
        .await;

    assert!(outcome.is_success());
    assert_eq!(outcome.text, "Hello! Let's get organized.");
}

#[tokio::test]
async fn test_anthropic_invalid_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "type": "error",
            "error": {"type": "authentication_error", "message": "invalid x-api-key"}
        })))
        .mount(&server)
        .await;

    let provider = AnthropicProvider::with_base_url(Some("bad".to_string()), server.uri());
    let outcome = provider.complete(PersonaId::Stellar, "hi").await;

    assert!(outcome.failure.as_ref().unwrap().is_credential_problem());
    assert!(outcome.text.contains("(401)"));
    assert!(outcome.text.contains("invalid x-api-key"));
}

#[tokio::test]
async fn test_anthropic_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "type": "error",
            "error": {"type": "api_error", "message": "Internal server error"}
        })))
        .mount(&server)
        .await;

    let provider = AnthropicProvider::with_base_url(Some("key".to_string()), server.uri());
    let outcome = provider.complete(PersonaId::Estrella, "hi").await;

    assert_eq!(
        outcome.failure,
        Some(FailureReason::Http {
            status: 500,
            message: "Internal server error".to_string()
        })
    );
}

#[tokio::test]
async fn test_anthropic_unreachable_is_transport() {
    let provider =
        AnthropicProvider::with_base_url(Some("key".to_string()), "http://127.0.0.1:1/v1/messages");
    let outcome = provider.complete(PersonaId::Estrella, "hi").await;
    assert!(outcome.failure.unwrap().is_transport());
}

#[tokio::test]
async fn test_gemini_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-pro:generateContent"))
        .and(query_param("key", "g-key"))
        .and(body_partial_json(json!({
            "contents": [{"role": "user", "parts": [{"text": "You are Stellar.\n\nUser: hi"}]}],
            "generationConfig": {"topK": 40, "maxOutputTokens": 1024}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "Happy to help with your clients!"}]},
                "finishReason": "STOP"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = GeminiConfig {
        base_url: Some(server.uri()),
        ..Default::default()
    };
    let provider = GeminiProvider::from_config(Some("g-key".to_string()), &config);
    let outcome = provider
        .complete(PersonaId::Stellar, "You are Stellar.\n\nUser: hi")
        .await;

    assert!(outcome.is_success());
    assert_eq!(outcome.text, "Happy to help with your clients!");
}

#[tokio::test]
async fn test_gemini_invalid_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {
                "code": 400,
                "message": "API key not valid. Please pass a valid API key.",
                "status": "INVALID_ARGUMENT"
            }
        })))
        .mount(&server)
        .await;

    let config = GeminiConfig {
        base_url: Some(server.uri()),
        ..Default::default()
    };
    let provider = GeminiProvider::from_config(Some("nope".to_string()), &config);
    let outcome = provider.complete(PersonaId::Stellar, "hi").await;

    assert!(matches!(
        outcome.failure,
        Some(FailureReason::InvalidCredentials(_))
    ));
}
