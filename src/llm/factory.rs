// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Provider factory for creating completion providers

use std::sync::Arc;

use crate::config::{ProviderBackend, Settings};
use crate::llm::provider::CompletionProvider;
use crate::llm::providers::{AnthropicProvider, GeminiProvider};

/// Factory for creating completion providers
pub struct ProviderFactory;

impl ProviderFactory {
    /// Create the provider selected by `settings.providers.backend`.
    ///
    /// A missing API key is not an error here: the provider reports it on
    /// every call, which is how the availability probe learns about it.
    pub fn create(settings: &Settings) -> Arc<dyn CompletionProvider> {
        match settings.providers.backend {
            ProviderBackend::Anthropic => Self::create_anthropic(settings),
            ProviderBackend::Gemini => Self::create_gemini(settings),
        }
    }

    /// Create an Anthropic provider
    pub fn create_anthropic(settings: &Settings) -> Arc<dyn CompletionProvider> {
        let api_key = settings.get_anthropic_api_key();
        if api_key.is_none() {
            tracing::warn!(
                env = %settings.providers.anthropic.api_key_env,
                "No Anthropic API key configured"
            );
        }
        Arc::new(AnthropicProvider::from_config(
            api_key,
            &settings.providers.anthropic,
        ))
    }

    /// Create a Gemini provider
    pub fn create_gemini(settings: &Settings) -> Arc<dyn CompletionProvider> {
        let api_key = settings.get_gemini_api_key();
        if api_key.is_none() {
            tracing::warn!(
                env = %settings.providers.gemini.api_key_env,
                "No Gemini API key configured"
            );
        }
        Arc::new(GeminiProvider::from_config(api_key, &settings.providers.gemini))
    }
}
