// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! User-facing notices (toasts and banners)

use serde::Serialize;

use crate::error::ChatError;

const CONNECTION_ISSUE: &str =
    "There was an issue connecting to the AI service. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// A short message for the UI to surface outside the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub title: String,
    pub description: String,
    pub severity: Severity,
    /// Blocking notices stay up (as a banner) until availability changes
    pub blocking: bool,
}

impl Notice {
    fn new(title: &str, description: impl Into<String>, severity: Severity, blocking: bool) -> Self {
        Self {
            title: title.to_string(),
            description: description.into(),
            severity,
            blocking,
        }
    }

    /// Transient notice shown alongside an inline error reply
    pub fn completion_failed() -> Self {
        Self::new("Error", CONNECTION_ISSUE, Severity::Error, false)
    }

    /// Notice describing why a submission was not accepted
    pub fn from_error(err: &ChatError) -> Self {
        match err {
            ChatError::Offline => Self::new(
                "You're offline",
                "Check your internet connection. Chat will resume once you're back online.",
                Severity::Error,
                true,
            ),
            ChatError::ProviderUnconfigured => Self::new(
                "AI service unavailable",
                "The AI service isn't configured. Please check the API key settings.",
                Severity::Error,
                true,
            ),
            ChatError::AlreadyPending(name) => Self::new(
                "Please wait",
                format!("{} is still working on a reply.", name),
                Severity::Info,
                false,
            ),
            ChatError::EmptyInput => Self::new(
                "Nothing to send",
                "Type a message first.",
                Severity::Info,
                false,
            ),
            ChatError::CompletionFailure(_) => Self::completion_failed(),
            other => Self::new("Error", other.to_string(), Severity::Error, false),
        }
    }
}
