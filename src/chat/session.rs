// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Chat session management
//!
//! Encapsulates all state needed for a dual-persona chat widget: the
//! conversation store, the active persona and input buffer, availability
//! tracking, and the completion provider.
//!
//! Every precondition check and the matching state change happen inside one
//! critical section before anything is awaited, so a persona can never have
//! two requests in flight. The completion itself runs on a spawned task and
//! always applies its result, even if the caller stops waiting.

use serde::Serialize;
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use super::availability::{Availability, AvailabilityMonitor, NetworkStatus, ProviderStatus};
use super::connectivity::{ConnectivityHub, ReachabilityPoller};
use super::message::Message;
use super::notice::Notice;
use super::persona::{PersonaId, PersonaRegistry};
use super::store::{ConversationState, ConversationStore};
use crate::config::{ChatConfig, Settings};
use crate::error::{ChatError, Result};
use crate::llm::factory::ProviderFactory;
use crate::llm::provider::{CompletionOutcome, CompletionProvider, FailureReason};
use crate::sync::lock;

const EVENT_CAPACITY: usize = 64;

/// Something the UI may want to re-render for
#[derive(Debug, Clone)]
pub enum SessionEvent {
    MessageAppended { persona: PersonaId, message: Message },
    PendingChanged { persona: PersonaId, pending: bool },
    PersonaSelected(PersonaId),
    Notice(Notice),
}

/// Result of an accepted submission
#[derive(Debug, Clone)]
pub struct Reply {
    pub persona: PersonaId,
    /// The assistant message appended to the conversation
    pub message: Message,
    /// Why the completion failed, when it did
    pub failure: Option<FailureReason>,
    /// Transient notice to show alongside a failed reply
    pub notice: Option<Notice>,
}

impl Reply {
    pub fn is_error(&self) -> bool {
        self.failure.is_some()
    }
}

/// Read-only view of the whole session
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub active_persona: PersonaId,
    pub availability: Availability,
    pub input: String,
    pub conversations: Vec<ConversationState>,
}

struct SessionState {
    store: ConversationStore,
    active: PersonaId,
    input: String,
}

struct SessionShared {
    registry: PersonaRegistry,
    provider: Arc<dyn CompletionProvider>,
    monitor: AvailabilityMonitor,
    config: ChatConfig,
    state: Mutex<SessionState>,
    events: broadcast::Sender<SessionEvent>,
}

/// Orchestrates submissions for every persona
pub struct ChatSession {
    shared: Arc<SessionShared>,
    watcher: Mutex<Option<JoinHandle<()>>>,
    poller: Mutex<Option<JoinHandle<()>>>,
}

/// Builder for creating ChatSession instances
pub struct ChatSessionBuilder {
    provider: Arc<dyn CompletionProvider>,
    registry: PersonaRegistry,
    config: ChatConfig,
    active: PersonaId,
}

impl ChatSessionBuilder {
    /// Create a new builder around a provider
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        Self {
            provider,
            registry: PersonaRegistry::new(),
            config: ChatConfig::default(),
            active: PersonaId::default(),
        }
    }

    /// Set the chat configuration
    pub fn with_config(mut self, config: ChatConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the persona shown first
    pub fn with_active_persona(mut self, persona: PersonaId) -> Self {
        self.active = persona;
        self
    }

    /// Build the ChatSession
    pub fn build(self) -> ChatSession {
        let mut store = ConversationStore::new(self.registry);
        if self.config.seed_greetings {
            store.seed_greetings();
        }

        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        tracing::info!(
            provider = self.provider.name(),
            active = %self.active,
            "Chat session created"
        );

        ChatSession {
            shared: Arc::new(SessionShared {
                registry: self.registry,
                provider: self.provider,
                monitor: AvailabilityMonitor::new(),
                config: self.config,
                state: Mutex::new(SessionState {
                    store,
                    active: self.active,
                    input: String::new(),
                }),
                events,
            }),
            watcher: Mutex::new(None),
            poller: Mutex::new(None),
        }
    }
}

impl SessionShared {
    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn reject(&self, err: ChatError) -> ChatError {
        tracing::debug!(error = %err, "Submission rejected");
        self.emit(SessionEvent::Notice(Notice::from_error(&err)));
        err
    }

    /// Validate and accept a submission. On success the user message is
    /// stored, the persona is pending, and the prompt is returned.
    fn accept(&self, target: Option<PersonaId>, text: &str) -> Result<(PersonaId, String)> {
        let mut state = lock(&self.state);
        let persona = target.unwrap_or(state.active);

        let text = text.trim();
        if text.is_empty() {
            return Err(self.reject(ChatError::EmptyInput));
        }
        self.monitor.gate().map_err(|e| self.reject(e))?;

        // Built before the user message is stored so it is counted once.
        let context =
            state
                .store
                .recent_context(persona, self.config.context_window, Some(text));
        let prompt = format!(
            "{}\n\n{}",
            self.registry.persona(persona).system_prompt,
            context
        );

        state
            .store
            .set_pending(persona, true)
            .map_err(|e| self.reject(e))?;

        let message = Message::user(persona, text);
        state.store.append(persona, message.clone());
        if target.is_none() {
            state.input.clear();
        }
        drop(state);

        tracing::debug!(%persona, "Submission accepted");
        self.emit(SessionEvent::MessageAppended { persona, message });
        self.emit(SessionEvent::PendingChanged {
            persona,
            pending: true,
        });

        Ok((persona, prompt))
    }

    /// Issue the completion and apply whatever comes back.
    async fn run_completion(self: Arc<Self>, persona: PersonaId, prompt: String) -> Reply {
        let provider = Arc::clone(&self.provider);
        let timeout = self.config.request_timeout();

        let mut call = tokio::spawn(async move { provider.complete(persona, &prompt).await });

        let outcome = match tokio::time::timeout(timeout, &mut call).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(join_err)) => {
                tracing::warn!(%persona, error = %join_err, "Completion task failed");
                CompletionOutcome::from_failure(FailureReason::Transport(join_err.to_string()))
            }
            Err(_) => {
                call.abort();
                tracing::warn!(%persona, ?timeout, "Completion timed out");
                CompletionOutcome::from_failure(FailureReason::Timeout)
            }
        };

        self.monitor.record_completion(&outcome);
        self.finish(persona, outcome)
    }

    /// Append the reply and clear the pending flag.
    fn finish(&self, persona: PersonaId, outcome: CompletionOutcome) -> Reply {
        let message = match &outcome.failure {
            None => Message::assistant(persona, outcome.text),
            Some(reason) => {
                tracing::warn!(%persona, %reason, "Completion failed");
                Message::assistant_error(persona, outcome.text)
            }
        };
        let notice = outcome.failure.as_ref().map(|_| Notice::completion_failed());

        {
            let mut state = lock(&self.state);
            state.store.append(persona, message.clone());
            // Lowering the flag never fails.
            let _ = state.store.set_pending(persona, false);
        }

        self.emit(SessionEvent::MessageAppended {
            persona,
            message: message.clone(),
        });
        self.emit(SessionEvent::PendingChanged {
            persona,
            pending: false,
        });
        if let Some(notice) = &notice {
            self.emit(SessionEvent::Notice(notice.clone()));
        }

        Reply {
            persona,
            message,
            failure: outcome.failure,
            notice,
        }
    }

    async fn network_changed(&self, status: NetworkStatus) -> bool {
        let changed = self.monitor.set_network(status);
        if changed && status == NetworkStatus::Online {
            let persona = self.registry.persona(lock(&self.state).active).clone();
            let provider_status = self
                .monitor
                .probe(
                    Arc::clone(&self.provider),
                    &persona,
                    self.config.probe_timeout(),
                )
                .await;
            if provider_status == ProviderStatus::Unconfigured {
                self.emit(SessionEvent::Notice(Notice::from_error(
                    &ChatError::ProviderUnconfigured,
                )));
            }
        } else if changed && status == NetworkStatus::Offline {
            self.emit(SessionEvent::Notice(Notice::from_error(&ChatError::Offline)));
        }
        changed
    }
}

impl ChatSession {
    /// Start building a session around `provider`
    pub fn builder(provider: Arc<dyn CompletionProvider>) -> ChatSessionBuilder {
        ChatSessionBuilder::new(provider)
    }

    /// Build a session with the provider and chat settings from `settings`
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        settings.validate()?;
        Ok(ChatSessionBuilder::new(ProviderFactory::create(settings))
            .with_config(settings.chat.clone())
            .build())
    }

    /// Build a session from `settings`, follow the process-wide
    /// [`ConnectivityHub`] and start polling `settings.connectivity`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(settings: &Settings) -> Result<Self> {
        Self::start_with_hub(settings, ConnectivityHub::global())
    }

    /// Like [`start`](Self::start) but publishing into `hub`.
    pub fn start_with_hub(settings: &Settings, hub: &ConnectivityHub) -> Result<Self> {
        let session = Self::from_settings(settings)?;
        let poller = ReachabilityPoller::from_config(&settings.connectivity, hub.clone())?;
        session.attach(hub);
        session.run_poller(poller);
        Ok(session)
    }

    /// Run `poller` until [`shutdown`](Self::shutdown), replacing any
    /// previous one.
    pub fn run_poller(&self, poller: ReachabilityPoller) {
        let handle = poller.spawn();
        if let Some(previous) = lock(&self.poller).replace(handle) {
            previous.abort();
        }
    }

    /// Submit `text` to `persona`.
    ///
    /// Rejections (`EmptyInput`, `Offline`, `ProviderUnconfigured`,
    /// `AlreadyPending`) change nothing. Once accepted, the call always ends
    /// with an assistant message in the persona's conversation; a failed
    /// completion is reported through [`Reply::failure`], not as `Err`.
    pub async fn submit(&self, persona: PersonaId, text: &str) -> Result<Reply> {
        let (persona, prompt) = self.shared.accept(Some(persona), text)?;
        self.dispatch(persona, prompt).await
    }

    /// Submit `text` to the active persona and clear the input buffer.
    pub async fn submit_active(&self, text: &str) -> Result<Reply> {
        let (persona, prompt) = self.shared.accept(None, text)?;
        self.dispatch(persona, prompt).await
    }

    /// Submit the current input buffer to the active persona.
    pub async fn submit_input(&self) -> Result<Reply> {
        let text = self.input();
        self.submit_active(&text).await
    }

    async fn dispatch(&self, persona: PersonaId, prompt: String) -> Result<Reply> {
        let shared = Arc::clone(&self.shared);
        let task = tokio::spawn(shared.run_completion(persona, prompt));

        match task.await {
            Ok(reply) => Ok(reply),
            Err(join_err) => {
                tracing::warn!(%persona, error = %join_err, "Completion handler failed");
                let still_pending = lock(&self.shared.state).store.is_pending(persona);
                let outcome = CompletionOutcome::from_failure(FailureReason::Transport(
                    join_err.to_string(),
                ));
                if still_pending {
                    Ok(self.shared.finish(persona, outcome))
                } else {
                    Err(ChatError::CompletionFailure(FailureReason::Transport(
                        join_err.to_string(),
                    )))
                }
            }
        }
    }

    /// Switch the persona targeted by input.
    ///
    /// In-flight requests are unaffected and still resolve into their own
    /// persona's conversation. The input buffer is cleared.
    pub fn select_persona(&self, persona: PersonaId) {
        {
            let mut state = lock(&self.shared.state);
            state.active = persona;
            state.input.clear();
        }
        tracing::debug!(%persona, "Persona selected");
        self.shared.emit(SessionEvent::PersonaSelected(persona));
    }

    pub fn active_persona(&self) -> PersonaId {
        lock(&self.shared.state).active
    }

    /// Replace the transient input buffer
    pub fn set_input(&self, text: impl Into<String>) {
        lock(&self.shared.state).input = text.into();
    }

    pub fn input(&self) -> String {
        lock(&self.shared.state).input.clone()
    }

    pub fn registry(&self) -> &PersonaRegistry {
        &self.shared.registry
    }

    pub fn monitor(&self) -> &AvailabilityMonitor {
        &self.shared.monitor
    }

    pub fn availability(&self) -> Availability {
        self.shared.monitor.current()
    }

    pub fn can_submit(&self) -> bool {
        self.shared.monitor.can_submit()
    }

    pub fn subscribe_availability(&self) -> watch::Receiver<Availability> {
        self.shared.monitor.subscribe()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.shared.events.subscribe()
    }

    /// Snapshot of one persona's conversation
    pub fn conversation(&self, persona: PersonaId) -> ConversationState {
        lock(&self.shared.state).store.snapshot(persona)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = lock(&self.shared.state);
        SessionSnapshot {
            active_persona: state.active,
            availability: self.shared.monitor.current(),
            input: state.input.clone(),
            conversations: PersonaId::ALL
                .iter()
                .map(|id| state.store.snapshot(*id))
                .collect(),
        }
    }

    /// Apply a connectivity transition. Coming online triggers a provider
    /// probe. Returns true if the network status changed.
    pub async fn network_changed(&self, status: NetworkStatus) -> bool {
        self.shared.network_changed(status).await
    }

    /// Follow `hub` for connectivity transitions until [`shutdown`](Self::shutdown).
    ///
    /// Replaces any previous subscription.
    pub fn attach(&self, hub: &ConnectivityHub) {
        let mut listener = hub.register();
        let shared = Arc::clone(&self.shared);
        let handle = tokio::spawn(async move {
            while let Some(status) = listener.recv().await {
                shared.network_changed(status).await;
            }
        });

        if let Some(previous) = lock(&self.watcher).replace(handle) {
            previous.abort();
        }
        tracing::info!("Chat session following connectivity changes");
    }

    /// Stop polling and following connectivity; the hub registration is
    /// released before this returns.
    pub async fn shutdown(&self) {
        let handles = [lock(&self.poller).take(), lock(&self.watcher).take()];
        for handle in handles.into_iter().flatten() {
            handle.abort();
            let _ = handle.await;
        }
        tracing::info!("Chat session shut down");
    }
}

impl Drop for ChatSession {
    fn drop(&mut self) {
        for task in [&self.poller, &self.watcher] {
            if let Some(handle) = lock(task).take() {
                handle.abort();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::message::Sender;
    use crate::llm::mock_provider::MockProvider;
    use std::time::Duration;

    fn online_session(provider: MockProvider) -> ChatSession {
        let session = ChatSession::builder(Arc::new(provider)).build();
        session.monitor().set_network(NetworkStatus::Online);
        session
    }

    #[tokio::test]
    async fn test_prompt_contains_system_prompt_and_transcript() {
        let provider = MockProvider::new();
        let session = online_session(provider.clone());

        session.submit(PersonaId::Estrella, "Plan my week").await.unwrap();

        let prompt = provider.last_call().unwrap().prompt;
        assert!(prompt.starts_with("You are Estrella"));
        assert!(prompt.ends_with("\n\nUser: Plan my week"));
    }

    #[tokio::test]
    async fn test_user_text_is_trimmed() {
        let session = online_session(MockProvider::new());
        session.submit(PersonaId::Stellar, "  hi  ").await.unwrap();
        assert_eq!(session.conversation(PersonaId::Stellar).messages[0].text, "hi");
    }

    #[tokio::test]
    async fn test_blank_input_rejected() {
        let provider = MockProvider::new();
        let session = online_session(provider.clone());
        let err = session.submit(PersonaId::Estrella, "   ").await.unwrap_err();
        assert!(matches!(err, ChatError::EmptyInput));
        assert!(session.conversation(PersonaId::Estrella).messages.is_empty());
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_second_turn_includes_history() {
        let provider = MockProvider::new().with_responses(vec!["First".into(), "Second".into()]);
        let session = online_session(provider.clone());

        session.submit(PersonaId::Stellar, "Hello").await.unwrap();
        session.submit(PersonaId::Stellar, "Again").await.unwrap();

        let prompt = provider.last_call().unwrap().prompt;
        assert!(prompt.ends_with("User: Hello\nStellar: First\nUser: Again"));
    }

    #[tokio::test]
    async fn test_timeout_appends_error_reply() {
        let provider = MockProvider::new().with_delay(Duration::from_secs(30));
        let session = ChatSession::builder(Arc::new(provider))
            .with_config(ChatConfig {
                request_timeout_secs: 1,
                ..Default::default()
            })
            .build();
        session.monitor().set_network(NetworkStatus::Online);

        let reply = session.submit(PersonaId::Estrella, "hello").await.unwrap();

        assert_eq!(reply.failure, Some(FailureReason::Timeout));
        assert!(reply.message.is_error);
        assert!(!session.conversation(PersonaId::Estrella).pending);
    }

    #[tokio::test]
    async fn test_provider_panic_still_replies() {
        let session = online_session(MockProvider::new().with_panic());
        let reply = session.submit(PersonaId::Stellar, "hello").await.unwrap();
        assert!(matches!(reply.failure, Some(FailureReason::Transport(_))));
        let conversation = session.conversation(PersonaId::Stellar);
        assert_eq!(conversation.messages.len(), 2);
        assert_eq!(conversation.messages[1].sender, Sender::Assistant);
        assert!(!conversation.pending);
    }

    #[tokio::test]
    async fn test_submit_active_clears_input() {
        let session = online_session(MockProvider::new());
        session.select_persona(PersonaId::Stellar);
        session.set_input("Who are my top clients?");

        let reply = session.submit_input().await.unwrap();

        assert_eq!(reply.persona, PersonaId::Stellar);
        assert!(session.input().is_empty());
        assert_eq!(session.conversation(PersonaId::Stellar).messages.len(), 2);
    }

    #[tokio::test]
    async fn test_rejected_submit_keeps_input() {
        let session = ChatSession::builder(Arc::new(MockProvider::new())).build();
        session.set_input("draft");
        assert!(session.submit_input().await.is_err());
        assert_eq!(session.input(), "draft");
    }

    #[tokio::test]
    async fn test_select_persona_clears_input() {
        let session = online_session(MockProvider::new());
        session.set_input("half typed");
        session.select_persona(PersonaId::Stellar);
        assert_eq!(session.active_persona(), PersonaId::Stellar);
        assert!(session.input().is_empty());
    }

    #[tokio::test]
    async fn test_credential_failure_marks_unconfigured() {
        let provider = MockProvider::new()
            .with_failure(FailureReason::InvalidCredentials("bad key".into()));
        let session = online_session(provider);

        let reply = session.submit(PersonaId::Estrella, "hi").await.unwrap();
        assert!(reply.is_error());
        assert_eq!(session.availability().provider, ProviderStatus::Unconfigured);

        let err = session.submit(PersonaId::Estrella, "again").await.unwrap_err();
        assert!(matches!(err, ChatError::ProviderUnconfigured));
    }

    #[tokio::test]
    async fn test_events_for_accepted_submit() {
        let session = online_session(MockProvider::new());
        let mut events = session.subscribe();

        session.submit(PersonaId::Estrella, "hi").await.unwrap();

        let mut kinds = Vec::new();
        while let Ok(event) = events.try_recv() {
            kinds.push(match event {
                SessionEvent::MessageAppended { message, .. } => format!("msg:{:?}", message.sender),
                SessionEvent::PendingChanged { pending, .. } => format!("pending:{}", pending),
                SessionEvent::PersonaSelected(_) => "select".to_string(),
                SessionEvent::Notice(_) => "notice".to_string(),
            });
        }
        assert_eq!(
            kinds,
            vec!["msg:User", "pending:true", "msg:Assistant", "pending:false"]
        );
    }

    #[tokio::test]
    async fn test_rejection_emits_notice() {
        let session = ChatSession::builder(Arc::new(MockProvider::new())).build();
        let mut events = session.subscribe();

        let _ = session.submit(PersonaId::Estrella, "hi").await;

        match events.try_recv() {
            Ok(SessionEvent::Notice(notice)) => assert!(notice.blocking),
            other => panic!("Expected notice, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_seed_greetings() {
        let session = ChatSession::builder(Arc::new(MockProvider::new()))
            .with_config(ChatConfig {
                seed_greetings: true,
                ..Default::default()
            })
            .build();
        let snapshot = session.snapshot();
        assert_eq!(snapshot.conversations.len(), 2);
        for conversation in &snapshot.conversations {
            assert_eq!(conversation.messages.len(), 1);
        }
    }

    #[tokio::test]
    async fn test_network_changed_probes_once_per_transition() {
        let provider = MockProvider::new();
        let session = ChatSession::builder(Arc::new(provider.clone())).build();

        assert!(session.network_changed(NetworkStatus::Online).await);
        assert!(!session.network_changed(NetworkStatus::Online).await);

        assert_eq!(provider.call_count(), 1);
        assert_eq!(session.availability().provider, ProviderStatus::Configured);
    }

    #[test]
    fn test_from_settings_rejects_invalid() {
        let mut settings = Settings::default();
        settings.chat.context_window = 0;
        assert!(matches!(
            ChatSession::from_settings(&settings),
            Err(ChatError::Config(_))
        ));
    }
}
