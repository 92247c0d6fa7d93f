// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Per-persona conversation logs
//!
//! Each persona owns an append-only message log and an in-flight flag.
//! Logs never share entries and are never truncated; only the prompt
//! context is windowed.

use serde::Serialize;

use super::message::{Message, Sender};
use super::persona::{PersonaId, PersonaRegistry};
use crate::error::{ChatError, Result};

/// Messages sent with each completion unless configured otherwise
pub const DEFAULT_CONTEXT_WINDOW: usize = 5;

/// Read-only view of one persona's conversation
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConversationState {
    pub messages: Vec<Message>,
    /// True while a completion request for this persona is in flight
    pub pending: bool,
}

impl ConversationState {
    pub fn user_message_count(&self) -> usize {
        self.messages.iter().filter(|m| m.is_user()).count()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }
}

/// Conversation logs for every persona
#[derive(Debug, Clone)]
pub struct ConversationStore {
    registry: PersonaRegistry,
    conversations: [ConversationState; 2],
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new(PersonaRegistry::new())
    }
}

impl ConversationStore {
    pub fn new(registry: PersonaRegistry) -> Self {
        Self {
            registry,
            conversations: Default::default(),
        }
    }

    /// Append each persona's greeting to its log.
    pub fn seed_greetings(&mut self) {
        for persona in self.registry.list() {
            let greeting = Message::assistant(persona.id, persona.greeting);
            self.conversations[persona.id.index()].messages.push(greeting);
        }
    }

    /// Add a message to the end of `persona`'s log.
    ///
    /// # Panics
    /// If `message` belongs to a different persona.
    pub fn append(&mut self, persona: PersonaId, message: Message) {
        assert_eq!(
            message.persona, persona,
            "message for {} appended to {}'s conversation",
            message.persona, persona
        );
        tracing::debug!(
            persona = %persona,
            sender = ?message.sender,
            is_error = message.is_error,
            "Appending message"
        );
        self.conversations[persona.index()].messages.push(message);
    }

    /// Transcript lines for the next prompt, oldest first.
    ///
    /// At most `window` lines are returned. A `pending` utterance that has not
    /// been stored yet takes the final slot, so building the context before
    /// persisting the triggering message never counts it twice. Failure
    /// replies are not part of the transcript.
    pub fn context_lines(
        &self,
        persona: PersonaId,
        window: usize,
        pending: Option<&str>,
    ) -> Vec<String> {
        if window == 0 {
            return Vec::new();
        }

        let display_name = self.registry.persona(persona).display_name;
        let history_slots = if pending.is_some() { window - 1 } else { window };

        let mut lines: Vec<String> = self.conversations[persona.index()]
            .messages
            .iter()
            .rev()
            .filter(|m| !m.is_error)
            .take(history_slots)
            .map(|m| match m.sender {
                Sender::User => format!("User: {}", m.text),
                Sender::Assistant => format!("{}: {}", display_name, m.text),
            })
            .collect();
        lines.reverse();

        if let Some(text) = pending {
            lines.push(format!("User: {}", text));
        }

        lines
    }

    /// [`context_lines`](Self::context_lines) joined into one transcript.
    ///
    /// Failure replies are skipped and do not use up window slots, so the
    /// window covers the last `window` genuine turns rather than the last
    /// `window` stored messages.
    pub fn recent_context(&self, persona: PersonaId, window: usize, pending: Option<&str>) -> String {
        self.context_lines(persona, window, pending).join("\n")
    }

    /// Toggle the in-flight flag.
    ///
    /// Raising the flag while it is already raised fails with `AlreadyPending`.
    pub fn set_pending(&mut self, persona: PersonaId, pending: bool) -> Result<()> {
        let state = &mut self.conversations[persona.index()];
        if pending && state.pending {
            return Err(ChatError::AlreadyPending(
                self.registry.persona(persona).display_name.to_string(),
            ));
        }
        state.pending = pending;
        Ok(())
    }

    pub fn is_pending(&self, persona: PersonaId) -> bool {
        self.conversations[persona.index()].pending
    }

    pub fn len(&self, persona: PersonaId) -> usize {
        self.conversations[persona.index()].messages.len()
    }

    pub fn is_empty(&self, persona: PersonaId) -> bool {
        self.len(persona) == 0
    }

    pub fn snapshot(&self, persona: PersonaId) -> ConversationState {
        self.conversations[persona.index()].clone()
    }
}
