// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Error types for persona-chat
//!
//! Submission rejections are detected before any state is touched; only
//! `CompletionFailure` can happen after a user message has been stored.

use thiserror::Error;

use crate::llm::provider::FailureReason;

/// Main error type for chat operations
#[derive(Error, Debug)]
pub enum ChatError {
    /// Persona id outside the fixed catalog
    #[error("Unknown persona: {0}")]
    UnknownPersona(String),

    /// A request for this persona is already in flight
    #[error("A reply from {0} is still on its way")]
    AlreadyPending(String),

    /// Network is not reachable
    #[error("No network connection")]
    Offline,

    /// Completion provider credentials are missing or rejected
    #[error("Completion provider is not configured")]
    ProviderUnconfigured,

    /// Nothing to send after trimming
    #[error("Message is empty")]
    EmptyInput,

    /// The provider call itself failed after the submission was accepted
    #[error("Completion failed: {0}")]
    CompletionFailure(FailureReason),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors outside a completion, e.g. building the
    /// reachability client
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl ChatError {
    /// Whether this error was raised before any state mutation.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            ChatError::UnknownPersona(_)
                | ChatError::AlreadyPending(_)
                | ChatError::Offline
                | ChatError::ProviderUnconfigured
                | ChatError::EmptyInput
        )
    }
}

/// Result type alias for chat operations
pub type Result<T> = std::result::Result<T, ChatError>;
