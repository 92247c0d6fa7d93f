// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Persona catalog
//!
//! The set of personas is closed and fixed at compile time. The registry is
//! built once and only ever read.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ChatError, Result};

/// Identifier of a persona
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum PersonaId {
    /// Strategic planning assistant
    #[default]
    Estrella,
    /// Client relations expert
    Stellar,
}

impl PersonaId {
    /// Every persona, in display order
    pub const ALL: [PersonaId; 2] = [PersonaId::Estrella, PersonaId::Stellar];

    pub fn as_str(&self) -> &'static str {
        match self {
            PersonaId::Estrella => "estrella",
            PersonaId::Stellar => "stellar",
        }
    }

    /// Position in [`PersonaId::ALL`]
    pub(crate) fn index(self) -> usize {
        match self {
            PersonaId::Estrella => 0,
            PersonaId::Stellar => 1,
        }
    }
}

impl fmt::Display for PersonaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PersonaId {
    type Err = ChatError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "estrella" => Ok(PersonaId::Estrella),
            "stellar" => Ok(PersonaId::Stellar),
            _ => Err(ChatError::UnknownPersona(s.to_string())),
        }
    }
}

/// A named behavioral profile the provider is asked to adopt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Persona {
    pub id: PersonaId,
    pub display_name: &'static str,
    pub role: &'static str,
    pub system_prompt: &'static str,
    /// Welcome line shown before the user says anything
    pub greeting: &'static str,
}

const PERSONAS: [Persona; 2] = [
    Persona {
        id: PersonaId::Estrella,
        display_name: "Estrella",
        role: "Strategic Planning Assistant",
        system_prompt: "You are Estrella, a strategic planning assistant specializing in project organization, content management, and helping clients execute plans with precision. Your tone is professional yet approachable. You focus on efficiency, organization, and practical solutions.",
        greeting: "Hello! I'm Estrella, your strategic planning assistant. How can I help you organize your projects today?",
    },
    Persona {
        id: PersonaId::Stellar,
        display_name: "Stellar",
        role: "Client Relations Expert",
        system_prompt: "You are Stellar, a client relations expert specializing in client needs analysis, relationship nurturing, and providing real-time performance insights. Your tone is warm and personable. You focus on understanding client needs, building relationships, and delivering insights that improve client satisfaction.",
        greeting: "Hi there! I'm Stellar, your client relations expert. I can help you understand client needs and build stronger relationships. Just switch to my tab to chat with me!",
    },
];

/// Read-only catalog of personas
#[derive(Debug, Clone, Copy)]
pub struct PersonaRegistry {
    personas: &'static [Persona; 2],
}

impl Default for PersonaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PersonaRegistry {
    pub fn new() -> Self {
        Self {
            personas: &PERSONAS,
        }
    }

    /// Look up a persona by its string id
    pub fn get(&self, id: &str) -> Result<&Persona> {
        let id: PersonaId = id.parse()?;
        Ok(self.persona(id))
    }

    /// Typed lookup; every `PersonaId` has an entry
    pub fn persona(&self, id: PersonaId) -> &Persona {
        &self.personas[id.index()]
    }

    /// All personas in stable order
    pub fn list(&self) -> &[Persona] {
        self.personas
    }
}
