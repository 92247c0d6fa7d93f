// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Chat session management
//!
//! This module provides the persona catalog, per-persona conversation
//! storage, availability tracking and the session that ties them together.

pub mod availability;
pub mod connectivity;
pub mod message;
pub mod notice;
pub mod persona;
mod session;
pub mod store;

pub use availability::{Availability, AvailabilityMonitor, NetworkStatus, ProviderStatus};
pub use connectivity::{ConnectivityHub, ConnectivityListener, ReachabilityPoller};
pub use message::{Message, Sender};
pub use notice::{Notice, Severity};
pub use persona::{Persona, PersonaId, PersonaRegistry};
pub use session::{ChatSession, ChatSessionBuilder, Reply, SessionEvent, SessionSnapshot};
pub use store::{ConversationState, ConversationStore, DEFAULT_CONTEXT_WINDOW};
