// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Settings management for persona-chat
//!
//! Handles loading settings from ~/.persona-chat/settings.json

use serde::{Deserialize, Serialize};
use std::time::Duration;

mod io;
mod validation;

/// Main settings structure, stored in ~/.persona-chat/settings.json
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Completion provider configurations
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Conversation and request settings
    #[serde(default)]
    pub chat: ChatConfig,

    /// Reachability polling settings
    #[serde(default)]
    pub connectivity: ConnectivityConfig,
}

/// Which adapter answers completions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderBackend {
    #[default]
    Anthropic,
    Gemini,
}

/// Configuration for completion providers
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProvidersConfig {
    /// Active backend
    #[serde(default)]
    pub backend: ProviderBackend,

    /// Anthropic Claude configuration
    #[serde(default)]
    pub anthropic: AnthropicConfig,

    /// Google Gemini configuration
    #[serde(default)]
    pub gemini: GeminiConfig,
}

/// Anthropic-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicConfig {
    /// API key (if stored directly, not recommended)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Environment variable name for API key
    #[serde(default = "default_anthropic_api_key_env")]
    pub api_key_env: String,

    /// Model to use
    #[serde(default = "default_anthropic_model")]
    pub model: String,

    /// Base URL for API (for custom endpoints)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Maximum tokens per reply
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_key_env: default_anthropic_api_key_env(),
            model: default_anthropic_model(),
            base_url: None,
            max_tokens: default_max_tokens(),
        }
    }
}

/// Gemini-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_gemini_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_gemini_model")]
    pub model: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_top_k")]
    pub top_k: u32,

    #[serde(default = "default_top_p")]
    pub top_p: f32,

    #[serde(default = "default_max_tokens")]
    pub max_output_tokens: u32,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_key_env: default_gemini_api_key_env(),
            model: default_gemini_model(),
            base_url: None,
            temperature: default_temperature(),
            top_k: default_top_k(),
            top_p: default_top_p(),
            max_output_tokens: default_max_tokens(),
        }
    }
}

/// Conversation and request settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Transcript lines sent with each completion, including the new message
    #[serde(default = "default_context_window")]
    pub context_window: usize,

    /// Seconds before an in-flight completion is abandoned
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Seconds before a configuration probe is abandoned
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,

    /// Start each conversation with the persona's greeting
    #[serde(default)]
    pub seed_greetings: bool,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            context_window: default_context_window(),
            request_timeout_secs: default_request_timeout_secs(),
            probe_timeout_secs: default_probe_timeout_secs(),
            seed_greetings: false,
        }
    }
}

impl ChatConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}

/// Reachability polling settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectivityConfig {
    /// Endpoint polled to decide whether the network is up
    #[serde(default = "default_probe_url")]
    pub probe_url: String,

    /// Seconds between polls
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self {
            probe_url: default_probe_url(),
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

impl ConnectivityConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

// Default value functions
fn default_anthropic_api_key_env() -> String {
    "ANTHROPIC_API_KEY".to_string()
}

fn default_anthropic_model() -> String {
    "claude-3-sonnet-20240229".to_string()
}

fn default_gemini_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

fn default_gemini_model() -> String {
    "gemini-pro".to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_temperature() -> f32 {
    0.7
}

fn default_top_k() -> u32 {
    40
}

fn default_top_p() -> f32 {
    0.95
}

fn default_context_window() -> usize {
    crate::chat::store::DEFAULT_CONTEXT_WINDOW
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_probe_timeout_secs() -> u64 {
    10
}

fn default_probe_url() -> String {
    "https://www.gstatic.com/generate_204".to_string()
}

fn default_poll_interval_secs() -> u64 {
    15
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.providers.backend, ProviderBackend::Anthropic);
        assert_eq!(settings.providers.anthropic.model, "claude-3-sonnet-20240229");
        assert_eq!(settings.providers.anthropic.max_tokens, 1024);
        assert_eq!(settings.providers.gemini.top_k, 40);
        assert_eq!(settings.chat.context_window, 5);
        assert_eq!(settings.chat.request_timeout(), Duration::from_secs(30));
        assert!(!settings.chat.seed_greetings);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let settings: Settings = serde_json::from_str(
            r#"{"providers": {"backend": "gemini"}, "chat": {"context_window": 8}}"#,
        )
        .unwrap();
        assert_eq!(settings.providers.backend, ProviderBackend::Gemini);
        assert_eq!(settings.chat.context_window, 8);
        assert_eq!(settings.chat.request_timeout_secs, 30);
        assert_eq!(settings.providers.gemini.model, "gemini-pro");
    }

    #[test]
    fn test_api_key_not_serialized_when_absent() {
        let json = serde_json::to_string(&Settings::default()).unwrap();
        assert!(!json.contains("\"api_key\""));
        assert!(json.contains("api_key_env"));
    }
}
