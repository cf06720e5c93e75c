//! Incremental suggestion streaming.
//!
//! A [`DynamicSuggestions`] controller hands out one [`SuggestionContext`]
//! per distinct metadata string (for instance a serialized schema
//! description). A context keeps an ordered queue of not-yet-consumed
//! suggestions and a set of consumed ones, refilling the queue through a
//! completion service as consumers advance. Each refill excludes
//! everything already seen; a refill that brings nothing new marks the
//! context exhausted.
//!
//! Queues survive restarts: the freshest suggestions are persisted under
//! the metadata digest and hydrated back on first access.

mod prompt;

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexSet;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::storage::{KeyValueStorage, ScopedStorage};
use crate::suggest::prompt::{dynamic_suggestions_prompt, parse_suggestions};
use crate::telemetry;
use crate::traits::CompletionService;
use crate::types::Message;

/// Default cap on suggestions persisted per metadata digest.
pub const MAX_STORED_SUGGESTIONS: usize = 10;

const STORAGE_PREFIX: &str = "muninn.suggestions";

/// Lifecycle of a [`SuggestionContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestionState {
    /// More suggestions may be fetched.
    Idle,
    /// A fetch round is in flight.
    Loading,
    /// A fetch round brought nothing new; the source is exhausted.
    Ended,
}

/// Tuning for suggestion fetch rounds.
#[derive(Debug, Clone)]
pub struct SuggestionConfig {
    fetch_delay: Duration,
    max_stored: usize,
}

impl SuggestionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay inserted before every completion request.
    pub fn fetch_delay(mut self, delay: Duration) -> Self {
        self.fetch_delay = delay;
        self
    }

    /// Cap on suggestions persisted per metadata digest.
    pub fn max_stored(mut self, max_stored: usize) -> Self {
        self.max_stored = max_stored;
        self
    }
}

impl Default for SuggestionConfig {
    fn default() -> Self {
        Self {
            fetch_delay: Duration::from_secs(1),
            max_stored: MAX_STORED_SUGGESTIONS,
        }
    }
}

fn digest(metadata: &str) -> String {
    hex::encode(Sha256::digest(metadata.as_bytes()))
}

/// Hands out memoized [`SuggestionContext`]s, one per metadata value.
pub struct DynamicSuggestions {
    completion: Arc<dyn CompletionService>,
    storage: ScopedStorage,
    config: SuggestionConfig,
    contexts: Mutex<HashMap<String, Arc<SuggestionContext>>>,
}

impl DynamicSuggestions {
    pub fn new(
        completion: Arc<dyn CompletionService>,
        storage: Arc<dyn KeyValueStorage>,
        config: SuggestionConfig,
    ) -> Self {
        Self {
            completion,
            storage: ScopedStorage::new(storage, STORAGE_PREFIX),
            config,
            contexts: Mutex::new(HashMap::new()),
        }
    }

    /// Fetch or lazily create the context for one metadata value.
    ///
    /// A new context first hydrates its queue from storage; with a
    /// non-empty snapshot it reports ready at once, otherwise an initial
    /// background fetch marks it ready on completion. Later calls with
    /// the same metadata return the same context.
    ///
    /// # Panics
    ///
    /// Requires a tokio runtime context.
    pub fn context_for(&self, metadata: &str) -> Arc<SuggestionContext> {
        let mut contexts = self.contexts.lock();
        if let Some(existing) = contexts.get(metadata) {
            return Arc::clone(existing);
        }
        let context = Arc::new(SuggestionContext::new(
            Arc::clone(&self.completion),
            self.storage.clone(),
            metadata.to_owned(),
            self.config.clone(),
        ));
        let hydrated = match self.storage.load::<Vec<String>>(&context.key) {
            Some(stored) if !stored.is_empty() => {
                let mut inner = context.inner.lock();
                inner.pending = stored.into();
                inner.ready = true;
                true
            }
            _ => false,
        };
        contexts.insert(metadata.to_owned(), Arc::clone(&context));
        drop(contexts);

        if !hydrated {
            let background = Arc::clone(&context);
            tokio::spawn(async move {
                background.fetch().await;
                background.inner.lock().ready = true;
            });
        }
        context
    }
}

struct ContextInner {
    pending: VecDeque<String>,
    consumed: IndexSet<String>,
    state: SuggestionState,
    ready: bool,
}

/// Suggestion queue for one metadata value.
///
/// Consumers either [`consume`](Self::consume) the head and let the
/// queue refill in the background, or step through with
/// [`next`](Self::next), which refills before the queue runs dry.
pub struct SuggestionContext {
    completion: Arc<dyn CompletionService>,
    storage: ScopedStorage,
    key: String,
    metadata: String,
    config: SuggestionConfig,
    inner: Mutex<ContextInner>,
}

impl SuggestionContext {
    fn new(
        completion: Arc<dyn CompletionService>,
        storage: ScopedStorage,
        metadata: String,
        config: SuggestionConfig,
    ) -> Self {
        Self {
            completion,
            storage,
            key: digest(&metadata),
            metadata,
            config,
            inner: Mutex::new(ContextInner {
                pending: VecDeque::new(),
                consumed: IndexSet::new(),
                state: SuggestionState::Idle,
                ready: false,
            }),
        }
    }

    /// Storage digest of the metadata.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn metadata(&self) -> &str {
        &self.metadata
    }

    /// Head of the pending queue.
    pub fn current(&self) -> Option<String> {
        self.inner.lock().pending.front().cloned()
    }

    /// Pop the current head into the consumed set. Draining the queue
    /// spawns a background refill; an already empty queue is left alone.
    ///
    /// # Panics
    ///
    /// Requires a tokio runtime context.
    pub fn consume(self: &Arc<Self>) {
        let mut inner = self.inner.lock();
        let Some(head) = inner.pending.pop_front() else {
            return;
        };
        inner.consumed.insert(head);
        let drained = inner.pending.is_empty();
        drop(inner);

        if drained {
            let context = Arc::clone(self);
            tokio::spawn(async move {
                context.fetch().await;
            });
        }
    }

    /// Run one fetch round and return the suggestions it added.
    ///
    /// Exhausted contexts return an empty batch without a request. A
    /// round asks the completion service for suggestions beyond
    /// everything consumed or still pending, drops duplicates from the
    /// response, and appends the remainder. A round that adds nothing
    /// marks the context [`SuggestionState::Ended`]. Request and decode
    /// failures count as empty responses.
    pub async fn fetch(&self) -> Vec<String> {
        let (command, prompt) = {
            let mut inner = self.inner.lock();
            if inner.state == SuggestionState::Ended {
                return Vec::new();
            }
            let exclusion: Vec<String> = inner
                .consumed
                .iter()
                .chain(inner.pending.iter())
                .cloned()
                .collect::<IndexSet<_>>()
                .into_iter()
                .collect();
            inner.state = SuggestionState::Loading;
            dynamic_suggestions_prompt(&self.metadata, &exclusion)
        };
        debug!(key = %self.key, "fetching suggestions");

        let messages = [Message::system(command), Message::user(prompt)];
        tokio::time::sleep(self.config.fetch_delay).await;
        let batch = match self.completion.complete(&messages).await {
            Ok(response) => parse_suggestions(&response),
            Err(error) => {
                debug!(key = %self.key, %error, "suggestion completion failed");
                Vec::new()
            }
        };

        let mut inner = self.inner.lock();
        let mut added = Vec::new();
        for suggestion in batch {
            if inner.consumed.contains(&suggestion)
                || inner.pending.contains(&suggestion)
                || added.contains(&suggestion)
            {
                continue;
            }
            added.push(suggestion);
        }
        inner.pending.extend(added.iter().cloned());
        inner.state = if added.is_empty() {
            SuggestionState::Ended
        } else {
            SuggestionState::Idle
        };

        let snapshot: Vec<String> = inner
            .pending
            .iter()
            .chain(inner.consumed.iter())
            .cloned()
            .collect::<IndexSet<_>>()
            .into_iter()
            .take(self.config.max_stored)
            .collect();
        if !snapshot.is_empty() {
            self.storage.save(&self.key, &snapshot);
        }
        drop(inner);

        let outcome = if added.is_empty() { "ended" } else { "added" };
        metrics::counter!(telemetry::SUGGESTION_FETCHES_TOTAL, "outcome" => outcome).increment(1);
        debug!(key = %self.key, added = added.len(), "suggestion batch merged");
        added
    }

    /// Advance to the next suggestion, refilling before the queue runs
    /// dry.
    ///
    /// The current head counts as consumed. When exactly one suggestion
    /// remains, a fetch round runs first so the queue is already
    /// replenished when the head is popped; otherwise marking the head
    /// consumed and popping it happen in one critical section. Returns
    /// the new head, or `None` once the context is exhausted.
    pub async fn next(&self) -> Option<String> {
        {
            let mut inner = self.inner.lock();
            if inner.state == SuggestionState::Ended {
                return None;
            }
            if inner.pending.len() != 1 {
                if let Some(head) = inner.pending.pop_front() {
                    inner.consumed.insert(head);
                }
                return inner.pending.front().cloned();
            }
            let head = inner.pending[0].clone();
            inner.consumed.insert(head);
        }
        self.fetch().await;

        let mut inner = self.inner.lock();
        inner.pending.pop_front();
        inner.pending.front().cloned()
    }

    pub fn state(&self) -> SuggestionState {
        self.inner.lock().state
    }

    /// Whether hydration or the initial fetch has completed.
    pub fn is_ready(&self) -> bool {
        self.inner.lock().ready
    }

    /// Pending queue, head first.
    pub fn pending(&self) -> Vec<String> {
        self.inner.lock().pending.iter().cloned().collect()
    }

    /// Consumed suggestions in consumption order.
    pub fn consumed(&self) -> Vec<String> {
        self.inner.lock().consumed.iter().cloned().collect()
    }
}
