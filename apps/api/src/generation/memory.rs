//! Client Memory Store — per-client interaction history and last selections.
//!
//! Process-local and never persisted. Each client key owns its own async
//! mutex; the orchestrator holds it for a whole generation so concurrent
//! requests for one client are serialized while unrelated clients proceed
//! in parallel.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Maximum interactions retained per client (oldest evicted first).
pub const HISTORY_CAP: usize = 20;
/// Interactions the prompt assembler reads back.
pub const PROMPT_HISTORY_WINDOW: usize = 5;
/// Key used when a request carries no client identifier.
pub const DEFAULT_CLIENT_KEY: &str = "default";

const EXCERPT_CHARS: usize = 280;

/// One completed generation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Interaction {
    pub timestamp: DateTime<Utc>,
    pub query: String,
    pub topic: String,
    pub hook: Option<String>,
    pub framework: Option<String>,
    pub cta: Option<String>,
    pub response: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientState {
    history: VecDeque<Interaction>,
    pub last_hook: Option<String>,
    pub last_framework: Option<String>,
    pub last_cta: Option<String>,
    pub last_topic: Option<String>,
}

impl ClientState {
    /// Appends an interaction, evicting beyond `HISTORY_CAP`, and makes its
    /// topic and selections the client's "last used" values. Categories that
    /// were disabled for this interaction keep their previous value.
    pub fn record(&mut self, interaction: Interaction) {
        self.last_topic = Some(interaction.topic.clone());
        if interaction.hook.is_some() {
            self.last_hook = interaction.hook.clone();
        }
        if interaction.framework.is_some() {
            self.last_framework = interaction.framework.clone();
        }
        if interaction.cta.is_some() {
            self.last_cta = interaction.cta.clone();
        }

        self.history.push_back(interaction);
        while self.history.len() > HISTORY_CAP {
            self.history.pop_front();
        }
    }

    /// Full retained history, oldest first.
    pub fn history(&self) -> &VecDeque<Interaction> {
        &self.history
    }

    /// The `n` most recent interactions, oldest first.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &Interaction> {
        self.history.iter().skip(self.history.len().saturating_sub(n))
    }

    /// Renders the last `PROMPT_HISTORY_WINDOW` interactions for the prompt.
    /// Empty when the client has no history.
    pub fn history_text(&self) -> String {
        self.recent(PROMPT_HISTORY_WINDOW)
            .enumerate()
            .map(|(i, item)| {
                let mut block = format!(
                    "{}. Request: {}\n   Topic: {}",
                    i + 1,
                    item.query.trim(),
                    item.topic
                );
                for (label, value) in [
                    ("Hook", &item.hook),
                    ("Framework", &item.framework),
                    ("CTA", &item.cta),
                ] {
                    if let Some(value) = value {
                        block.push_str(&format!("\n   {label}: {value}"));
                    }
                }
                block.push_str(&format!("\n   Post: {}", excerpt(&item.response)));
                block
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Maps an absent or blank client identifier to `DEFAULT_CLIENT_KEY`.
pub fn normalize_client_id(client_id: Option<&str>) -> String {
    client_id
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .unwrap_or(DEFAULT_CLIENT_KEY)
        .to_string()
}

fn excerpt(text: &str) -> String {
    let text = text.trim();
    if text.chars().count() <= EXCERPT_CHARS {
        return text.to_string();
    }
    let cut: String = text.chars().take(EXCERPT_CHARS).collect();
    format!("{}...", cut.trim_end())
}

struct ClientEntry {
    state: Arc<Mutex<ClientState>>,
    last_seen: Instant,
}

/// Process-wide map from client key to that client's state.
#[derive(Default)]
pub struct ClientMemory {
    clients: DashMap<String, ClientEntry>,
}

impl ClientMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires exclusive access to one client's state, creating it empty on
    /// first use. The guard is the unit of per-client serialization.
    pub async fn lock(&self, client_key: &str) -> OwnedMutexGuard<ClientState> {
        let state = {
            let mut entry = self
                .clients
                .entry(client_key.to_string())
                .or_insert_with(|| ClientEntry {
                    state: Arc::new(Mutex::new(ClientState::default())),
                    last_seen: Instant::now(),
                });
            entry.last_seen = Instant::now();
            Arc::clone(&entry.state)
        };
        state.lock_owned().await
    }

    /// Cloned view of a client's state, if the client has been seen.
    #[cfg(test)]
    pub async fn snapshot(&self, client_key: &str) -> Option<ClientState> {
        let state = self.clients.get(client_key).map(|e| Arc::clone(&e.state))?;
        let guard = state.lock().await;
        Some(guard.clone())
    }

    /// Drops clients untouched for longer than `ttl`. Clients whose state is
    /// currently held by a request are kept. Returns the number evicted.
    pub fn evict_idle(&self, ttl: Duration) -> usize {
        let mut evicted = 0;
        self.clients.retain(|_, entry| {
            let in_use = Arc::strong_count(&entry.state) > 1;
            let keep = in_use || entry.last_seen.elapsed() < ttl;
            if !keep {
                evicted += 1;
            }
            keep
        });
        evicted
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }
}
