// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Connectivity notifications
//!
//! A [`ConnectivityHub`] fans network transitions out to registered
//! listeners. Registration hands back a [`ConnectivityListener`]; dropping it
//! deregisters, so a listener can never outlive its session.

use reqwest::Client;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock, Weak};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::availability::NetworkStatus;
use crate::config::ConnectivityConfig;
use crate::error::Result;
use crate::sync::lock;

/// Upper bound on a single reachability request
const MAX_CHECK_TIMEOUT: Duration = Duration::from_secs(10);

/// Listeners and the last published status share one lock, so a listener
/// registering during a publish either sees the new status replayed or
/// receives it from the publish.
#[derive(Default)]
struct Registry {
    listeners: HashMap<u64, mpsc::UnboundedSender<NetworkStatus>>,
    last: Option<NetworkStatus>,
    next_id: u64,
}

#[derive(Default)]
struct HubInner {
    registry: Mutex<Registry>,
}

/// Registry of connectivity listeners
#[derive(Clone, Default)]
pub struct ConnectivityHub {
    inner: Arc<HubInner>,
}

impl ConnectivityHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide hub
    pub fn global() -> &'static ConnectivityHub {
        static HUB: OnceLock<ConnectivityHub> = OnceLock::new();
        HUB.get_or_init(ConnectivityHub::new)
    }

    /// Register a listener. If a status has already been published the
    /// listener receives it first.
    pub fn register(&self) -> ConnectivityListener {
        let (tx, rx) = mpsc::unbounded_channel();

        let id = {
            let mut registry = lock(&self.inner.registry);
            if let Some(status) = registry.last {
                let _ = tx.send(status);
            }
            let id = registry.next_id;
            registry.next_id += 1;
            registry.listeners.insert(id, tx);
            id
        };
        tracing::debug!(listener = id, "Connectivity listener registered");

        ConnectivityListener {
            id,
            rx,
            hub: Arc::downgrade(&self.inner),
        }
    }

    /// Broadcast a status to every listener.
    pub fn publish(&self, status: NetworkStatus) {
        let mut registry = lock(&self.inner.registry);
        registry.last = Some(status);
        registry.listeners.retain(|_, tx| tx.send(status).is_ok());
    }

    pub fn last_status(&self) -> Option<NetworkStatus> {
        lock(&self.inner.registry).last
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.inner.registry).listeners.len()
    }
}

/// Receiving end of a hub registration
pub struct ConnectivityListener {
    id: u64,
    rx: mpsc::UnboundedReceiver<NetworkStatus>,
    hub: Weak<HubInner>,
}

impl ConnectivityListener {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Next published status; `None` once the hub is gone.
    pub async fn recv(&mut self) -> Option<NetworkStatus> {
        self.rx.recv().await
    }

    /// Next status if one is already queued.
    pub fn try_recv(&mut self) -> Option<NetworkStatus> {
        self.rx.try_recv().ok()
    }
}

impl Drop for ConnectivityListener {
    fn drop(&mut self) {
        if let Some(hub) = self.hub.upgrade() {
            lock(&hub.registry).listeners.remove(&self.id);
            tracing::debug!(listener = self.id, "Connectivity listener deregistered");
        }
    }
}

/// Periodically checks that an endpoint answers and publishes the result
pub struct ReachabilityPoller {
    client: Client,
    url: String,
    interval: Duration,
    hub: ConnectivityHub,
}

impl ReachabilityPoller {
    pub fn new(url: impl Into<String>, interval: Duration, hub: ConnectivityHub) -> Result<Self> {
        let client = Client::builder()
            .timeout(interval.min(MAX_CHECK_TIMEOUT))
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
            interval,
            hub,
        })
    }

    /// Create from settings
    pub fn from_config(config: &ConnectivityConfig, hub: ConnectivityHub) -> Result<Self> {
        Self::new(config.probe_url.clone(), config.poll_interval(), hub)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Any HTTP answer, whatever its status, means the network is up.
    pub async fn check(&self) -> NetworkStatus {
        match self.client.get(&self.url).send().await {
            Ok(_) => NetworkStatus::Online,
            Err(e) => {
                tracing::debug!(url = %self.url, error = %e, "Reachability check failed");
                NetworkStatus::Offline
            }
        }
    }

    /// Check once and publish the result.
    pub async fn poll_once(&self) -> NetworkStatus {
        let status = self.check().await;
        self.hub.publish(status);
        status
    }

    /// Poll forever on a background task. The first check runs immediately.
    pub fn spawn(self) -> JoinHandle<()> {
        tracing::debug!(url = %self.url, interval = ?self.interval, "Reachability polling started");
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                self.poll_once().await;
            }
        })
    }
}
