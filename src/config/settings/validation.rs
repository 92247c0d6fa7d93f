// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

use crate::error::{ChatError, Result};

use super::{ProviderBackend, Settings};

impl Settings {
    /// Get the API key for Anthropic, checking env var first.
    pub fn get_anthropic_api_key(&self) -> Option<String> {
        // Priority: env var > config file.
        non_empty_env(&self.providers.anthropic.api_key_env)
            .or_else(|| self.providers.anthropic.api_key.clone())
    }

    /// Get the API key for Gemini, checking env var first.
    pub fn get_gemini_api_key(&self) -> Option<String> {
        non_empty_env(&self.providers.gemini.api_key_env)
            .or_else(|| self.providers.gemini.api_key.clone())
    }

    /// Check if the active backend has an API key.
    pub fn is_provider_configured(&self) -> bool {
        match self.providers.backend {
            ProviderBackend::Anthropic => self.get_anthropic_api_key().is_some(),
            ProviderBackend::Gemini => self.get_gemini_api_key().is_some(),
        }
    }

    /// Reject values that would make the session unusable.
    pub fn validate(&self) -> Result<()> {
        if self.chat.context_window == 0 {
            return Err(ChatError::Config(
                "chat.context_window must be at least 1".to_string(),
            ));
        }
        if self.chat.request_timeout_secs == 0 {
            return Err(ChatError::Config(
                "chat.request_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.chat.probe_timeout_secs == 0 {
            return Err(ChatError::Config(
                "chat.probe_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.connectivity.poll_interval_secs == 0 {
            return Err(ChatError::Config(
                "connectivity.poll_interval_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
