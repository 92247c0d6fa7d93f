// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Google Gemini API provider implementation
//!
//! Implements the CompletionProvider trait over `generateContent`.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::chat::persona::PersonaId;
use crate::config::GeminiConfig;
use crate::llm::provider::{
    CompletionOutcome, CompletionProvider, FailureReason, EMPTY_REPLY,
};

use super::common::transport_failure;

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com";

const MISSING_KEY_REPLY: &str =
    "Sorry, I'm unable to respond right now due to a configuration issue.";
const ERROR_REPLY: &str = "Sorry, I encountered an error while processing your request.";

const SAFETY_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];
const SAFETY_THRESHOLD: &str = "BLOCK_MEDIUM_AND_ABOVE";

/// Google Gemini provider
pub struct GeminiProvider {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    config: GeminiConfig,
}

impl GeminiProvider {
    /// Create from settings. Without a key every call reports missing
    /// credentials.
    pub fn from_config(api_key: Option<String>, config: &GeminiConfig) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| GEMINI_API_URL.to_string()),
            config: config.clone(),
        }
    }

    pub fn new(api_key: Option<String>) -> Self {
        Self::from_config(api_key, &GeminiConfig::default())
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    /// Build the request body
    fn build_request(&self, prompt: &str) -> GeminiRequest {
        GeminiRequest {
            contents: vec![GeminiContent {
                role: "user".to_string(),
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
                top_k: self.config.top_k,
                top_p: self.config.top_p,
                max_output_tokens: self.config.max_output_tokens,
            },
            safety_settings: SAFETY_CATEGORIES
                .iter()
                .map(|category| SafetySetting {
                    category: category.to_string(),
                    threshold: SAFETY_THRESHOLD.to_string(),
                })
                .collect(),
        }
    }

    fn error_reason(status: u16, error: &GeminiErrorDetail) -> FailureReason {
        let unauthenticated = matches!(
            error.status.as_deref(),
            Some("UNAUTHENTICATED") | Some("PERMISSION_DENIED")
        );
        if unauthenticated || status == 401 {
            return FailureReason::InvalidCredentials(error.message.clone());
        }
        match FailureReason::classify(&error.message) {
            reason if reason.is_credential_problem() => reason,
            _ if status >= 400 => FailureReason::Http {
                status,
                message: error.message.clone(),
            },
            reason => reason,
        }
    }

    /// Interpret a response body, whatever its status
    fn parse_response(status: u16, body: &str) -> CompletionOutcome {
        let response: GeminiResponse = match serde_json::from_str(body) {
            Ok(response) => response,
            Err(e) if status >= 400 => {
                return CompletionOutcome::failed(
                    ERROR_REPLY,
                    FailureReason::Http {
                        status,
                        message: e.to_string(),
                    },
                )
            }
            Err(e) => {
                return CompletionOutcome::failed(
                    ERROR_REPLY,
                    FailureReason::MalformedPayload(e.to_string()),
                )
            }
        };

        if let Some(error) = response.error {
            let status = error.code.unwrap_or(status);
            return CompletionOutcome::failed(ERROR_REPLY, Self::error_reason(status, &error));
        }

        if status >= 400 {
            return CompletionOutcome::failed(
                ERROR_REPLY,
                FailureReason::Http {
                    status,
                    message: format!("HTTP error {}", status),
                },
            );
        }

        let text = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|content| content.parts.into_iter().find_map(|p| p.text))
            .filter(|t| !t.trim().is_empty());

        match text {
            Some(text) => CompletionOutcome::success(text),
            None => CompletionOutcome::failed(
                EMPTY_REPLY,
                FailureReason::MalformedPayload("no candidate text in response".to_string()),
            ),
        }
    }
}

#[async_trait]
impl CompletionProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn complete(&self, persona: PersonaId, prompt: &str) -> CompletionOutcome {
        let Some(api_key) = self.api_key.as_deref() else {
            tracing::warn!(%persona, "Missing Gemini API key");
            return CompletionOutcome::failed(MISSING_KEY_REPLY, FailureReason::MissingCredentials);
        };

        let body = self.build_request(prompt);

        let response = match self
            .client
            .post(self.endpoint())
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(%persona, error = %e, "Gemini request failed");
                return transport_failure(&e);
            }
        };

        let status = response.status().as_u16();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => return transport_failure(&e),
        };

        let outcome = Self::parse_response(status, &text);
        if let Some(reason) = &outcome.failure {
            tracing::warn!(%persona, status, %reason, "Gemini API error");
        }
        outcome
    }
}

// Gemini API types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GenerationConfig,
    safety_settings: Vec<SafetySetting>,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_k: u32,
    top_p: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Serialize)]
struct SafetySetting {
    category: String,
    threshold: String,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    error: Option<GeminiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiCandidateContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiCandidatePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    #[serde(default)]
    code: Option<u16>,
    message: String,
    #[serde(default)]
    status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_request_shape() {
        let provider = GeminiProvider::new(Some("key".into()));
        let json = serde_json::to_value(provider.build_request("hello")).unwrap();
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(json["generationConfig"]["topK"], 40);
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 1024);
        assert_eq!(json["safetySettings"].as_array().unwrap().len(), 4);
        assert_eq!(json["safetySettings"][0]["threshold"], "BLOCK_MEDIUM_AND_ABOVE");
    }

    #[test]
    fn test_endpoint() {
        let config = GeminiConfig {
            base_url: Some("http://localhost:8080/".into()),
            ..Default::default()
        };
        let provider = GeminiProvider::from_config(None, &config);
        assert_eq!(
            provider.endpoint(),
            "http://localhost:8080/v1beta/models/gemini-pro:generateContent"
        );
    }

    #[test]
    fn test_parse_candidate_text() {
        let body = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Let's talk clients."}]}}]}"#;
        assert_eq!(
            GeminiProvider::parse_response(200, body),
            CompletionOutcome::success("Let's talk clients.")
        );
    }

    #[test]
    fn test_parse_invalid_key() {
        let body = r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT"}}"#;
        let outcome = GeminiProvider::parse_response(400, body);
        assert!(matches!(outcome.failure, Some(FailureReason::InvalidCredentials(_))));
        assert_eq!(outcome.text, ERROR_REPLY);
    }

    #[test]
    fn test_parse_server_error() {
        let body = r#"{"error":{"code":503,"message":"The model is overloaded.","status":"UNAVAILABLE"}}"#;
        let outcome = GeminiProvider::parse_response(503, body);
        assert_eq!(
            outcome.failure,
            Some(FailureReason::Http {
                status: 503,
                message: "The model is overloaded.".into()
            })
        );
    }

    #[test]
    fn test_parse_blocked_prompt_has_no_candidates() {
        let body = r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#;
        let outcome = GeminiProvider::parse_response(200, body);
        assert_eq!(outcome.text, EMPTY_REPLY);
        assert!(!outcome.is_success());
    }

    #[tokio::test]
    async fn test_missing_key_short_circuits() {
        let provider = GeminiProvider::new(None);
        let outcome = provider.complete(PersonaId::Stellar, "hi").await;
        assert_eq!(outcome.failure, Some(FailureReason::MissingCredentials));
        assert_eq!(outcome.text, MISSING_KEY_REPLY);
    }
}
