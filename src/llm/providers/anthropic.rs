// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Anthropic Claude API provider implementation
//!
//! Implements the CompletionProvider trait over the Messages API.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::chat::persona::PersonaId;
use crate::config::AnthropicConfig;
use crate::llm::provider::{
    CompletionOutcome, CompletionProvider, FailureReason, EMPTY_REPLY, GENERIC_FAILURE_REPLY,
};

use super::common::transport_failure;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MODEL: &str = "claude-3-sonnet-20240229";
const DEFAULT_MAX_TOKENS: u32 = 1024;

const MISSING_KEY_REPLY: &str = "I'm unable to respond right now because the API key hasn't been configured. Please check your environment variables and make sure ANTHROPIC_API_KEY is set correctly.";
const BODY_ERROR_REPLY: &str = "Sorry, I encountered an error while processing your request. Please check your API configuration.";

/// Anthropic Claude provider
pub struct AnthropicProvider {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
    max_tokens: u32,
}

impl AnthropicProvider {
    /// Create a new Anthropic provider. Without a key every call reports
    /// missing credentials.
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: ANTHROPIC_API_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    /// Create with a custom base URL
    pub fn with_base_url(api_key: Option<String>, base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::new(api_key)
        }
    }

    /// Create from settings
    pub fn from_config(api_key: Option<String>, config: &AnthropicConfig) -> Self {
        let mut provider = match &config.base_url {
            Some(base_url) => Self::with_base_url(api_key, base_url),
            None => Self::new(api_key),
        };
        provider.model = config.model.clone();
        provider.max_tokens = config.max_tokens;
        provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Build the request body
    fn build_request(&self, prompt: &str) -> AnthropicRequest {
        AnthropicRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            messages: vec![AnthropicMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        }
    }

    /// Turn a non-success response into an outcome
    fn parse_error(status: u16, body: &str) -> CompletionOutcome {
        let parsed = serde_json::from_str::<AnthropicError>(body).ok();
        let message = parsed
            .as_ref()
            .map(|e| e.error.message.clone())
            .unwrap_or_else(|| "Unknown error".to_string());

        let text = format!(
            "I encountered an error ({}): {}. Please check your API configuration.",
            status, message
        );

        let is_auth = parsed.as_ref().is_some_and(|e| {
            matches!(
                e.error.error_type.as_str(),
                "authentication_error" | "permission_error"
            )
        }) || status == 401;

        let reason = if is_auth {
            FailureReason::InvalidCredentials(message)
        } else {
            FailureReason::Http { status, message }
        };

        CompletionOutcome::failed(text, reason)
    }

    /// Interpret a success-status body
    fn parse_body(body: &str) -> CompletionOutcome {
        let response: AnthropicResponse = match serde_json::from_str(body) {
            Ok(response) => response,
            Err(e) => {
                return CompletionOutcome::failed(
                    GENERIC_FAILURE_REPLY,
                    FailureReason::MalformedPayload(e.to_string()),
                )
            }
        };

        if let Some(error) = response.error {
            return CompletionOutcome::failed(
                BODY_ERROR_REPLY,
                FailureReason::classify(&error.message),
            );
        }

        let text = response.content.into_iter().find_map(|block| match block {
            AnthropicContentBlock::Text { text } if !text.trim().is_empty() => Some(text),
            _ => None,
        });

        match text {
            Some(text) => CompletionOutcome::success(text),
            None => CompletionOutcome::failed(
                EMPTY_REPLY,
                FailureReason::MalformedPayload("no text content in response".to_string()),
            ),
        }
    }
}

#[async_trait]
impl CompletionProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn complete(&self, persona: PersonaId, prompt: &str) -> CompletionOutcome {
        let Some(api_key) = self.api_key.as_deref() else {
            tracing::warn!(%persona, "Missing Anthropic API key");
            return CompletionOutcome::failed(MISSING_KEY_REPLY, FailureReason::MissingCredentials);
        };

        let body = self.build_request(prompt);

        let response = match self
            .client
            .post(&self.base_url)
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(%persona, error = %e, "Anthropic request failed");
                return transport_failure(&e);
            }
        };

        let status = response.status();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => return transport_failure(&e),
        };

        if !status.is_success() {
            tracing::warn!(%persona, status = status.as_u16(), "Anthropic API error");
            return Self::parse_error(status.as_u16(), &text);
        }

        Self::parse_body(&text)
    }
}

// Anthropic API types

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<AnthropicMessage>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<AnthropicContentBlock>,
    #[serde(default)]
    error: Option<AnthropicErrorDetail>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicContentBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorDetail,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorDetail {
    #[serde(rename = "type", default)]
    error_type: String,
    message: String,
}
