// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! persona-chat - session manager for a dual-persona website chat widget.
//!
//! Two personas, Estrella and Stellar, each keep an independent conversation.
//! User text is forwarded to a completion provider together with the
//! persona's system prompt and a short window of recent history.
//!
//! Architecture highlights:
//! - `chat`: persona catalog, conversation store, availability tracking and
//!   the `ChatSession` orchestrator
//! - `llm`: completion provider abstraction and the Anthropic/Gemini adapters
//! - `config`: JSON settings with env-var API key overrides
//! - `logging`: tracing subscriber setup

pub mod chat;
pub mod config;
pub mod error;
pub mod llm;
pub mod logging;
mod sync;

pub use error::{ChatError, Result};
