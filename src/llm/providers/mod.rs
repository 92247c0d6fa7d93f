// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Completion provider implementations

pub mod anthropic;
mod common;
pub mod gemini;

pub use anthropic::AnthropicProvider;
pub use gemini::GeminiProvider;
