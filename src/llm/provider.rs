// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Completion provider trait and related types
//!
//! A provider turns a fully assembled prompt into reply text. Adapters never
//! return `Err`: every failure is normalized into a [`CompletionOutcome`]
//! carrying a fallback reply and a [`FailureReason`].

use async_trait::async_trait;
use thiserror::Error;

use crate::chat::persona::PersonaId;

/// Reply used when a request fails and the adapter has nothing better to say.
pub const GENERIC_FAILURE_REPLY: &str = "Sorry, I encountered an error while processing your request. Please check your network connection and API configuration.";

/// Reply used when a request exceeds the configured timeout.
pub const TIMEOUT_REPLY: &str =
    "Sorry, the AI service took too long to respond. Please try again in a moment.";

/// Reply used when the provider returned a success status with no usable text.
pub const EMPTY_REPLY: &str =
    "I couldn't generate a response. Please check the API configuration.";

/// Main trait for completion backends
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Get the provider name (e.g., "anthropic", "gemini")
    fn name(&self) -> &str;

    /// Generate a reply for `prompt` on behalf of `persona`.
    ///
    /// The prompt already contains the persona system prompt and the recent
    /// conversation transcript.
    async fn complete(&self, persona: PersonaId, prompt: &str) -> CompletionOutcome;
}

/// Why a completion did not produce a genuine reply
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// No API key was available
    #[error("Missing API key")]
    MissingCredentials,

    /// The API rejected the key
    #[error("Invalid API key: {0}")]
    InvalidCredentials(String),

    /// Non-success HTTP status
    #[error("HTTP error {status}: {message}")]
    Http { status: u16, message: String },

    /// Connection-level failure
    #[error("Network error: {0}")]
    Transport(String),

    /// No response within the configured timeout
    #[error("Request timed out")]
    Timeout,

    /// Response body could not be interpreted
    #[error("Malformed response: {0}")]
    MalformedPayload(String),
}

impl FailureReason {
    /// True when the failure means the provider cannot work until credentials change.
    pub fn is_credential_problem(&self) -> bool {
        matches!(
            self,
            FailureReason::MissingCredentials | FailureReason::InvalidCredentials(_)
        )
    }

    /// True for failures caused by the connection rather than the API.
    pub fn is_transport(&self) -> bool {
        matches!(self, FailureReason::Transport(_) | FailureReason::Timeout)
    }

    /// Categorize a free-form reason string reported by a provider.
    pub fn classify(reason: &str) -> Self {
        let lower = reason.to_lowercase();

        let mentions_key = lower.contains("api key")
            || lower.contains("api_key")
            || lower.contains("x-api-key")
            || lower.contains("credential");

        if mentions_key
            && (lower.contains("missing")
                || lower.contains("not set")
                || lower.contains("not configured"))
        {
            return FailureReason::MissingCredentials;
        }

        if (mentions_key && (lower.contains("invalid") || lower.contains("not valid")))
            || lower.contains("authentication")
            || lower.contains("unauthorized")
            || lower.contains("permission_denied")
        {
            return FailureReason::InvalidCredentials(reason.to_string());
        }

        if let Some(status) = parse_status(&lower) {
            return FailureReason::Http {
                status,
                message: reason.to_string(),
            };
        }

        if lower.contains("timed out") || lower.contains("timeout") {
            return FailureReason::Timeout;
        }

        FailureReason::Transport(reason.to_string())
    }

    /// Reply text to show when the adapter did not supply one.
    pub fn fallback_text(&self) -> &'static str {
        match self {
            FailureReason::Timeout => TIMEOUT_REPLY,
            _ => GENERIC_FAILURE_REPLY,
        }
    }
}

/// Extract the status from text like "HTTP error 503".
fn parse_status(lower: &str) -> Option<u16> {
    let rest = &lower[lower.find("http error")? + "http error".len()..];
    let digits: String = rest
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok().filter(|s| (100..600).contains(s))
}

/// Normalized result of a completion call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionOutcome {
    /// Reply text, or a human-readable fallback when `failure` is set
    pub text: String,

    /// Set when the call did not produce a genuine completion
    pub failure: Option<FailureReason>,
}

impl CompletionOutcome {
    /// A genuine completion
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            failure: None,
        }
    }

    /// A failed completion with the reply to show in its place
    pub fn failed(text: impl Into<String>, reason: FailureReason) -> Self {
        Self {
            text: text.into(),
            failure: Some(reason),
        }
    }

    /// A failed completion using the reason's default reply
    pub fn from_failure(reason: FailureReason) -> Self {
        Self::failed(reason.fallback_text(), reason)
    }

    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}
