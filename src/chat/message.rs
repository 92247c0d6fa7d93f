// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Conversation message types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::persona::PersonaId;

/// Who wrote a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

/// A single immutable entry in a persona's conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub text: String,
    pub sender: Sender,
    /// Conversation this message belongs to
    pub persona: PersonaId,
    pub timestamp: DateTime<Utc>,
    /// Set when the text explains a failure rather than being a real completion
    #[serde(default)]
    pub is_error: bool,
}

impl Message {
    fn new(persona: PersonaId, sender: Sender, text: impl Into<String>, is_error: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            sender,
            persona,
            timestamp: Utc::now(),
            is_error,
        }
    }

    /// Create a user message
    pub fn user(persona: PersonaId, text: impl Into<String>) -> Self {
        Self::new(persona, Sender::User, text, false)
    }

    /// Create a genuine assistant reply
    pub fn assistant(persona: PersonaId, text: impl Into<String>) -> Self {
        Self::new(persona, Sender::Assistant, text, false)
    }

    /// Create an assistant message standing in for a failed completion
    pub fn assistant_error(persona: PersonaId, text: impl Into<String>) -> Self {
        Self::new(persona, Sender::Assistant, text, true)
    }

    pub fn is_user(&self) -> bool {
        self.sender == Sender::User
    }
}
