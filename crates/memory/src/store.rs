//! The memory store — owner of all conversation-memory state.
//!
//! Callers mutate prompts, retrieved content and history, then call
//! [`MemoryStore::refresh`] to recompute the bounded message list that a
//! completion client sends. The store never refreshes on its own, so several
//! mutations in a row cost a single recomputation.
//!
//! [`SharedMemoryStore`] wraps the store behind one async mutex. Every
//! operation holds the lock for its whole duration, which serializes
//! mutations and refreshes and gives readers a consistent snapshot.

use crate::budget::token::FunctionCostCache;
use crate::budget::{AllocationInput, AssemblyMetadata, BudgetAllocator};
use crate::observer::{HistoryCallback, HistoryChanged, HistoryObserver};
use chatwindow_config::MemoryConfig;
use chatwindow_core::{FunctionCatalog, Message, StaticFunctionCatalog, TokenEncoder};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Stateful orchestrator of prompt assembly.
pub struct MemoryStore {
    config: MemoryConfig,
    encoder: Arc<dyn TokenEncoder>,
    functions: Arc<dyn FunctionCatalog>,
    // Mandatory content is kept as messages so their memoized costs survive
    // across refreshes.
    system_message: Message,
    context_message: Message,
    function_costs: FunctionCostCache,
    retrieved_content: Vec<String>,
    history: Vec<Message>,
    observer: HistoryObserver,

    // Derived on every refresh, never patched in place.
    last_sent: Vec<Message>,
    last_remaining_tokens: Option<i64>,
    last_metadata: AssemblyMetadata,
}

impl MemoryStore {
    /// Create an empty store with no functions.
    pub fn new(config: MemoryConfig, encoder: Arc<dyn TokenEncoder>) -> Self {
        Self {
            config,
            encoder,
            functions: Arc::new(StaticFunctionCatalog::default()),
            system_message: Message::system(""),
            context_message: Message::system(""),
            function_costs: FunctionCostCache::default(),
            retrieved_content: Vec::new(),
            history: Vec::new(),
            observer: HistoryObserver::default(),
            last_sent: Vec::new(),
            last_remaining_tokens: None,
            last_metadata: AssemblyMetadata::default(),
        }
    }

    pub fn with_function_catalog(mut self, functions: Arc<dyn FunctionCatalog>) -> Self {
        self.functions = functions;
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.set_system_prompt(prompt);
        self
    }

    // ── Mutation ───────────────────────────────────────────────────────

    /// Apply `update` to the history, then notify the history listener.
    pub fn mutate_history<F>(&mut self, update: F)
    where
        F: FnOnce(&mut Vec<Message>),
    {
        update(&mut self.history);
        tracing::debug!(history_len = self.history.len(), "History mutated");
        self.observer.notify(HistoryChanged::now(self.history.len()));
    }

    /// Append one message to the history.
    pub fn append_message(&mut self, message: Message) {
        self.mutate_history(|history| history.push(message));
    }

    pub fn set_system_prompt(&mut self, prompt: impl Into<String>) {
        self.system_message = Message::system(prompt);
    }

    pub fn set_context_prompt(&mut self, prompt: impl Into<String>) {
        self.context_message = Message::system(prompt);
    }

    pub fn set_retrieved_content(&mut self, content: Vec<String>) {
        self.retrieved_content = content;
    }

    pub fn set_function_catalog(&mut self, functions: Arc<dyn FunctionCatalog>) {
        self.functions = functions;
    }

    pub fn set_config(&mut self, config: MemoryConfig) {
        self.config = config;
    }

    /// Register the history listener. Replaces any previous one.
    pub fn observe_history_change<F>(&mut self, callback: F)
    where
        F: Fn(HistoryChanged) + Send + Sync + 'static,
    {
        let callback: HistoryCallback = Arc::new(callback);
        self.observer.set(callback);
    }

    // ── Refresh ────────────────────────────────────────────────────────

    /// Recompute the message list with the configured history message cap.
    pub fn refresh(&mut self) {
        self.refresh_with_max_messages(self.config.max_history_messages);
    }

    /// Recompute the message list with a per-call history message cap
    /// (`0` = unlimited).
    pub fn refresh_with_max_messages(&mut self, max_history_messages: usize) {
        let functions = self.functions.declarations();
        let function_tokens = self.function_costs.tokens(self.encoder.as_ref(), &functions);
        let allocator = BudgetAllocator::from_config(&self.config)
            .with_max_history_messages(max_history_messages);
        let input = AllocationInput {
            system: &self.system_message,
            context: &self.context_message,
            retrieved: &self.retrieved_content,
            functions: &functions,
            function_tokens: Some(function_tokens),
            history: &self.history,
        };

        let assembled = allocator.allocate(&input, self.encoder.as_ref());
        tracing::debug!(
            encoder = self.encoder.name(),
            messages = assembled.messages.len(),
            total_tokens = assembled.metadata.total_tokens,
            "Memory refreshed"
        );

        self.last_sent = assembled.messages;
        self.last_metadata = assembled.metadata;
        // The allocation already guarantees a fit; no separate estimate is published.
        self.last_remaining_tokens = None;
    }

    // ── Reads ──────────────────────────────────────────────────────────

    /// Messages assembled by the last refresh.
    pub fn messages(&self) -> &[Message] {
        &self.last_sent
    }

    /// Always `None`: the budget math guarantees the fit.
    pub fn remaining_tokens(&self) -> Option<i64> {
        self.last_remaining_tokens
    }

    pub fn last_metadata(&self) -> &AssemblyMetadata {
        &self.last_metadata
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn system_prompt(&self) -> &str {
        self.system_message.content().unwrap_or_default()
    }

    pub fn context_prompt(&self) -> &str {
        self.context_message.content().unwrap_or_default()
    }

    pub fn retrieved_content(&self) -> &[String] {
        &self.retrieved_content
    }

    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    pub fn encoder(&self) -> &dyn TokenEncoder {
        self.encoder.as_ref()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("config", &self.config)
            .field("encoder", &self.encoder.name())
            .field("history_len", &self.history.len())
            .field("retrieved_len", &self.retrieved_content.len())
            .field("last_sent_len", &self.last_sent.len())
            .field("observer", &self.observer)
            .finish()
    }
}

// ── Shared handle ─────────────────────────────────────────────────────────

/// Cloneable handle that serializes all access to one [`MemoryStore`].
#[derive(Clone)]
pub struct SharedMemoryStore {
    inner: Arc<Mutex<MemoryStore>>,
}

impl SharedMemoryStore {
    pub fn new(store: MemoryStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    /// Run `f` with exclusive access to the store.
    pub async fn with<R>(&self, f: impl FnOnce(&mut MemoryStore) -> R) -> R {
        let mut store = self.inner.lock().await;
        f(&mut store)
    }

    pub async fn mutate_history<F>(&self, update: F)
    where
        F: FnOnce(&mut Vec<Message>),
    {
        self.inner.lock().await.mutate_history(update);
    }

    pub async fn append_message(&self, message: Message) {
        self.inner.lock().await.append_message(message);
    }

    pub async fn set_system_prompt(&self, prompt: impl Into<String>) {
        self.inner.lock().await.set_system_prompt(prompt);
    }

    pub async fn set_context_prompt(&self, prompt: impl Into<String>) {
        self.inner.lock().await.set_context_prompt(prompt);
    }

    pub async fn set_retrieved_content(&self, content: Vec<String>) {
        self.inner.lock().await.set_retrieved_content(content);
    }

    pub async fn observe_history_change<F>(&self, callback: F)
    where
        F: Fn(HistoryChanged) + Send + Sync + 'static,
    {
        self.inner.lock().await.observe_history_change(callback);
    }

    /// Refresh and return the freshly assembled messages.
    pub async fn refresh(&self) -> Vec<Message> {
        let mut store = self.inner.lock().await;
        store.refresh();
        store.messages().to_vec()
    }

    /// Snapshot of the messages assembled by the last refresh.
    pub async fn messages(&self) -> Vec<Message> {
        self.inner.lock().await.messages().to_vec()
    }

    pub async fn remaining_tokens(&self) -> Option<i64> {
        self.inner.lock().await.remaining_tokens()
    }

    pub async fn history(&self) -> Vec<Message> {
        self.inner.lock().await.history().to_vec()
    }
}
