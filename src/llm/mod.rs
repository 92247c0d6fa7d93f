// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! LLM module for persona-chat
//!
//! Provides abstraction over different completion providers.

pub mod factory;
pub mod mock_provider;
pub mod provider;
pub mod providers;

pub use provider::*;
