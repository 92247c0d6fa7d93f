// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Mock completion provider for testing
//!
//! Provides a scriptable implementation of the CompletionProvider trait
//! that can be used in unit tests without making real API calls.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{watch, Semaphore};

use crate::chat::persona::PersonaId;
use crate::llm::provider::{CompletionOutcome, CompletionProvider, FailureReason};
use crate::sync::lock;

/// What the mock does for one call
#[derive(Clone, Debug)]
pub enum MockBehavior {
    /// Return a genuine completion
    Reply(String),
    /// Return a normalized failure
    Fail(FailureReason),
    /// Panic inside the provider
    Panic,
}

impl Default for MockBehavior {
    fn default() -> Self {
        MockBehavior::Reply("This is a mock response.".to_string())
    }
}

/// A recorded call
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MockCall {
    pub persona: PersonaId,
    pub prompt: String,
}

/// A mock completion provider for testing
#[derive(Clone)]
pub struct MockProvider {
    /// Provider name
    name: String,
    /// Configured behaviors, consumed in order; the last one repeats
    script: Arc<Mutex<Vec<MockBehavior>>>,
    /// Recorded calls
    calls: Arc<Mutex<Vec<MockCall>>>,
    /// Number of calls started, observable by tests
    started: Arc<watch::Sender<usize>>,
    /// When set, each call waits for a permit before answering
    gate: Option<Arc<Semaphore>>,
    /// Artificial latency
    delay: Option<Duration>,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProvider {
    /// Create a new mock provider
    pub fn new() -> Self {
        let (started, _) = watch::channel(0);
        Self {
            name: "mock".to_string(),
            script: Arc::new(Mutex::new(vec![MockBehavior::default()])),
            calls: Arc::new(Mutex::new(vec![])),
            started: Arc::new(started),
            gate: None,
            delay: None,
        }
    }

    /// Replace the script
    pub fn with_script(self, behaviors: Vec<MockBehavior>) -> Self {
        *lock(&self.script) = behaviors;
        self
    }

    /// Always answer with `text`
    pub fn with_response(self, text: impl Into<String>) -> Self {
        self.with_script(vec![MockBehavior::Reply(text.into())])
    }

    /// Answer with each text in order, then repeat the last one
    pub fn with_responses(self, texts: Vec<String>) -> Self {
        self.with_script(texts.into_iter().map(MockBehavior::Reply).collect())
    }

    /// Always fail with `reason`
    pub fn with_failure(self, reason: FailureReason) -> Self {
        self.with_script(vec![MockBehavior::Fail(reason)])
    }

    /// Always panic
    pub fn with_panic(self) -> Self {
        self.with_script(vec![MockBehavior::Panic])
    }

    /// Sleep before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Hold every call in flight until [`release`](Self::release) is called
    pub fn with_gate(mut self) -> Self {
        self.gate = Some(Arc::new(Semaphore::new(0)));
        self
    }

    /// Let `n` held calls finish
    pub fn release(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    /// Get the number of times complete() was called
    pub fn call_count(&self) -> usize {
        *self.started.borrow()
    }

    /// Wait until at least `n` calls have started
    pub async fn wait_for_calls(&self, n: usize) {
        let mut rx = self.started.subscribe();
        let _ = rx.wait_for(|count| *count >= n).await;
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<MockCall> {
        lock(&self.calls).clone()
    }

    /// Get the last call made
    pub fn last_call(&self) -> Option<MockCall> {
        lock(&self.calls).last().cloned()
    }

    fn next_behavior(&self, index: usize) -> MockBehavior {
        let script = lock(&self.script);
        if script.is_empty() {
            MockBehavior::default()
        } else {
            script[index.min(script.len() - 1)].clone()
        }
    }
}

#[async_trait]
impl CompletionProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, persona: PersonaId, prompt: &str) -> CompletionOutcome {
        let index = {
            lock(&self.calls).push(MockCall {
                persona,
                prompt: prompt.to_string(),
            });
            let mut index = 0;
            self.started.send_modify(|count| {
                index = *count;
                *count += 1;
            });
            index
        };

        if let Some(gate) = &self.gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match self.next_behavior(index) {
            MockBehavior::Reply(text) => CompletionOutcome::success(text),
            MockBehavior::Fail(reason) => CompletionOutcome::from_failure(reason),
            MockBehavior::Panic => panic!("mock provider panicked"),
        }
    }
}
