// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

use std::io::Write;

use persona_chat::config::{ProviderBackend, Settings};
use persona_chat::ChatError;
use tempfile::NamedTempFile;

#[test]
fn test_load_missing_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings::load_from(&dir.path().join("settings.json")).unwrap();
    assert_eq!(settings.chat.context_window, 5);
    assert_eq!(settings.providers.backend, ProviderBackend::Anthropic);
}

#[test]
fn test_load_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "providers": {{
                "backend": "gemini",
                "gemini": {{"model": "gemini-1.5-flash", "api_key": "from-file"}}
            }},
            "chat": {{"context_window": 7, "seed_greetings": true}}
        }}"#
    )
    .unwrap();

    let settings = Settings::load_from(file.path()).unwrap();
    assert_eq!(settings.providers.backend, ProviderBackend::Gemini);
    assert_eq!(settings.providers.gemini.model, "gemini-1.5-flash");
    assert_eq!(settings.chat.context_window, 7);
    assert!(settings.chat.seed_greetings);
    assert_eq!(settings.chat.request_timeout_secs, 30);
}

#[test]
fn test_load_rejects_invalid_values() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, r#"{{"chat": {{"request_timeout_secs": 0}}}}"#).unwrap();

    let err = Settings::load_from(file.path()).unwrap_err();
    assert!(matches!(err, ChatError::Config(_)));
}

#[test]
fn test_load_rejects_malformed_json() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{{ not json").unwrap();

    let err = Settings::load_from(file.path()).unwrap_err();
    assert!(matches!(err, ChatError::Json(_)));
}

#[test]
fn test_api_key_priority() {
    // Use a custom env var name to avoid test pollution
    let mut settings = Settings::default();
    settings.providers.anthropic.api_key_env = "PERSONA_CHAT_TEST_KEY_31415".to_string();
    settings.providers.anthropic.api_key = Some("config-key".to_string());

    std::env::remove_var("PERSONA_CHAT_TEST_KEY_31415");
    assert_eq!(
        settings.get_anthropic_api_key(),
        Some("config-key".to_string())
    );
    assert!(settings.is_provider_configured());

    std::env::set_var("PERSONA_CHAT_TEST_KEY_31415", "env-key");
    assert_eq!(settings.get_anthropic_api_key(), Some("env-key".to_string()));

    // Clean up
    std::env::remove_var("PERSONA_CHAT_TEST_KEY_31415");
}

#[test]
fn test_gemini_unconfigured_without_key() {
    let mut settings = Settings::default();
    settings.providers.backend = ProviderBackend::Gemini;
    settings.providers.gemini.api_key_env = "PERSONA_CHAT_TEST_GEMINI_27182".to_string();
    std::env::remove_var("PERSONA_CHAT_TEST_GEMINI_27182");
    assert!(!settings.is_provider_configured());
}
