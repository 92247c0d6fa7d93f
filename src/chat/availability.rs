// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Network and provider availability tracking
//!
//! Two independent axes: whether the network is reachable, and whether the
//! completion provider appears to be configured. The submission gate built
//! from them is advisory; a request that passes it can still fail.

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use super::persona::Persona;
use crate::error::{ChatError, Result};
use crate::llm::provider::{CompletionOutcome, CompletionProvider};

/// Probe message sent after the persona system prompt
const PROBE_UTTERANCE: &str = "Hello";

/// Network reachability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkStatus {
    Checking,
    Online,
    Offline,
}

/// Completion provider configuration health
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderStatus {
    Unknown,
    Configured,
    Unconfigured,
}

/// Combined availability snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Availability {
    pub network: NetworkStatus,
    pub provider: ProviderStatus,
}

impl Default for Availability {
    fn default() -> Self {
        Self {
            network: NetworkStatus::Checking,
            provider: ProviderStatus::Unknown,
        }
    }
}

impl Availability {
    pub fn can_submit(&self) -> bool {
        self.network == NetworkStatus::Online && self.provider != ProviderStatus::Unconfigured
    }

    /// The rejection a submission would get right now, if any.
    pub fn gate(&self) -> Result<()> {
        if self.network != NetworkStatus::Online {
            return Err(ChatError::Offline);
        }
        if self.provider == ProviderStatus::Unconfigured {
            return Err(ChatError::ProviderUnconfigured);
        }
        Ok(())
    }
}

/// Tracks availability and publishes every change to subscribers
pub struct AvailabilityMonitor {
    state: watch::Sender<Availability>,
}

impl Default for AvailabilityMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl AvailabilityMonitor {
    pub fn new() -> Self {
        let (state, _) = watch::channel(Availability::default());
        Self { state }
    }

    pub fn current(&self) -> Availability {
        *self.state.borrow()
    }

    pub fn can_submit(&self) -> bool {
        self.current().can_submit()
    }

    pub fn gate(&self) -> Result<()> {
        self.current().gate()
    }

    /// Receive every availability change, e.g. to drive a banner.
    pub fn subscribe(&self) -> watch::Receiver<Availability> {
        self.state.subscribe()
    }

    /// Apply a connectivity transition.
    ///
    /// Returns true if the network status changed. Once the first result is
    /// known the monitor never goes back to `Checking`.
    pub fn set_network(&self, status: NetworkStatus) -> bool {
        self.state.send_if_modified(|availability| {
            if status == NetworkStatus::Checking && availability.network != NetworkStatus::Checking
            {
                tracing::debug!(from = ?availability.network, "Ignoring transition back to checking");
                return false;
            }
            if availability.network == status {
                return false;
            }
            tracing::debug!(from = ?availability.network, to = ?status, "Network status changed");
            availability.network = status;
            true
        })
    }

    pub fn set_provider(&self, status: ProviderStatus) -> bool {
        self.state.send_if_modified(|availability| {
            if availability.provider == status {
                return false;
            }
            tracing::debug!(from = ?availability.provider, to = ?status, "Provider status changed");
            availability.provider = status;
            true
        })
    }

    /// Interpret the outcome of a health probe.
    ///
    /// Anything other than a credential problem counts as configured.
    pub fn record_probe(&self, outcome: &CompletionOutcome) -> ProviderStatus {
        let status = match &outcome.failure {
            Some(reason) if reason.is_credential_problem() => ProviderStatus::Unconfigured,
            _ => ProviderStatus::Configured,
        };
        self.set_provider(status);
        status
    }

    /// Interpret the outcome of a real completion.
    ///
    /// Success proves the provider works; credential failures prove it does
    /// not; other failures say nothing about configuration.
    pub fn record_completion(&self, outcome: &CompletionOutcome) {
        match &outcome.failure {
            None => {
                self.set_provider(ProviderStatus::Configured);
            }
            Some(reason) if reason.is_credential_problem() => {
                self.set_provider(ProviderStatus::Unconfigured);
            }
            Some(_) => {}
        }
    }

    /// Issue a one-shot probe completion and record what it says about
    /// provider configuration. A probe that panics or times out marks the
    /// provider unconfigured.
    pub async fn probe(
        &self,
        provider: Arc<dyn CompletionProvider>,
        persona: &Persona,
        timeout: Duration,
    ) -> ProviderStatus {
        let persona_id = persona.id;
        let prompt = format!("{}\n\nUser: {}", persona.system_prompt, PROBE_UTTERANCE);

        tracing::debug!(provider = provider.name(), persona = %persona_id, "Probing provider");

        let mut handle =
            tokio::spawn(async move { provider.complete(persona_id, &prompt).await });

        match tokio::time::timeout(timeout, &mut handle).await {
            Ok(Ok(outcome)) => {
                if let Some(reason) = &outcome.failure {
                    tracing::warn!(%reason, "Provider probe failed");
                }
                self.record_probe(&outcome)
            }
            Ok(Err(join_err)) => {
                tracing::warn!(error = %join_err, "Provider probe aborted");
                self.set_provider(ProviderStatus::Unconfigured);
                ProviderStatus::Unconfigured
            }
            Err(_) => {
                handle.abort();
                tracing::warn!(?timeout, "Provider probe timed out");
                self.set_provider(ProviderStatus::Unconfigured);
                ProviderStatus::Unconfigured
            }
        }
    }
}
