//! Post Generation — the orchestrator behind every generated post.
//!
//! Flow: classify intent → resolve topic → select hook/framework/CTA →
//!       retrieve similar posts → assemble prompt → call model → update memory.
//!
//! `generate` never fails. Any error becomes `APOLOGY_MESSAGE`, and client
//! memory is only written after a successful model call. The client's lock is
//! held for the whole flow, so variants generated back to back for one client
//! see each other's selections and diverge.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::generation::intent::{classify, ChangeIntent};
use crate::generation::memory::{normalize_client_id, ClientMemory, ClientState, Interaction};
use crate::generation::phrase_bank::PhraseBanks;
use crate::generation::prompts::{assemble_prompt, PromptInputs};
use crate::generation::retrieval::{format_examples, retrieve_similar, SimilarPost, SimilarityIndex};
use crate::generation::topic::resolve_topic;
use crate::generation::variation::{select_all, Selections};
use crate::llm_client::{CompletionModel, LlmError, SamplingParams};

/// Returned to the caller whenever generation fails.
pub const APOLOGY_MESSAGE: &str =
    "Sorry, we couldn't generate your post right now. Please try again in a moment.";

// ────────────────────────────────────────────────────────────────────────────
// Stages and failures
// ────────────────────────────────────────────────────────────────────────────

/// Orchestrator stages, entered strictly in order. `Failed` is terminal and
/// reachable from any stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Resolving,
    Selecting,
    Retrieving,
    Assembling,
    CallingModel,
    UpdatingMemory,
    Done,
    Failed,
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("model call failed: {0}")]
    ModelCall(#[from] LlmError),

    #[error("model returned no content")]
    EmptyCompletion,
}

impl GenerationError {
    /// The stage that was running when the failure happened.
    pub fn stage(&self) -> Stage {
        match self {
            GenerationError::ModelCall(_) | GenerationError::EmptyCompletion => Stage::CallingModel,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

/// What one `generate_detailed` call produced.
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    /// The post, or `APOLOGY_MESSAGE` on failure.
    pub text: String,
    pub succeeded: bool,
    pub topic: Option<String>,
    pub examples: Vec<SimilarPost>,
}

impl GenerationOutcome {
    fn failed() -> Self {
        Self {
            text: APOLOGY_MESSAGE.to_string(),
            succeeded: false,
            topic: None,
            examples: Vec::new(),
        }
    }
}

/// Successful run, not yet committed to memory.
struct Draft {
    topic: String,
    selections: Selections,
    examples: Vec<SimilarPost>,
    text: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Orchestrator
// ────────────────────────────────────────────────────────────────────────────

pub struct PostGenerator {
    model: Arc<dyn CompletionModel>,
    index: Arc<dyn SimilarityIndex>,
    banks: PhraseBanks,
    memory: Arc<ClientMemory>,
    rng: Mutex<StdRng>,
    similar_k: usize,
    sampling: SamplingParams,
}

impl PostGenerator {
    pub fn new(
        model: Arc<dyn CompletionModel>,
        index: Arc<dyn SimilarityIndex>,
        banks: PhraseBanks,
        memory: Arc<ClientMemory>,
        similar_k: usize,
    ) -> Self {
        Self {
            model,
            index,
            banks,
            memory,
            rng: Mutex::new(StdRng::from_entropy()),
            similar_k,
            sampling: SamplingParams::default(),
        }
    }

    /// Replaces the random source, e.g. with a seeded one for tests.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = Mutex::new(rng);
        self
    }

    pub fn memory(&self) -> &Arc<ClientMemory> {
        &self.memory
    }

    /// Generates one post variant. Never fails: errors yield `APOLOGY_MESSAGE`.
    pub async fn generate(&self, query: &str, client_id: &str, elevated: bool) -> String {
        self.generate_detailed(query, client_id, elevated).await.text
    }

    /// Like `generate`, also reporting the resolved topic and retrieved examples.
    pub async fn generate_detailed(
        &self,
        query: &str,
        client_id: &str,
        elevated: bool,
    ) -> GenerationOutcome {
        let client_key = normalize_client_id(Some(client_id));
        let mut state = self.memory.lock(&client_key).await;

        // Work on a copy so a failed run leaves the stored state untouched.
        let mut working = state.clone();
        let draft = match self.run(query, elevated, &mut working, &client_key).await {
            Ok(draft) => draft,
            Err(e) => {
                error!(
                    client_id = %client_key,
                    stage = ?Stage::Failed,
                    failed_during = ?e.stage(),
                    "Post generation failed: {e}"
                );
                return GenerationOutcome::failed();
            }
        };

        enter(Stage::UpdatingMemory, &client_key);
        working.record(Interaction {
            timestamp: Utc::now(),
            query: query.to_string(),
            topic: draft.topic.clone(),
            hook: draft.selections.hook.chosen.clone(),
            framework: draft.selections.framework.chosen.clone(),
            cta: draft.selections.cta.chosen.clone(),
            response: draft.text.clone(),
        });
        *state = working;
        enter(Stage::Done, &client_key);

        info!(
            client_id = %client_key,
            topic = %draft.topic,
            history_len = state.history().len(),
            "Generated post"
        );

        GenerationOutcome {
            text: draft.text,
            succeeded: true,
            topic: Some(draft.topic),
            examples: draft.examples,
        }
    }

    async fn run(
        &self,
        query: &str,
        elevated: bool,
        state: &mut ClientState,
        client_key: &str,
    ) -> Result<Draft, GenerationError> {
        enter(Stage::Resolving, client_key);
        let intent: ChangeIntent = classify(query);
        let topic = resolve_topic(query, state.last_topic.as_deref(), intent.any());

        enter(Stage::Selecting, client_key);
        let selections = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            select_all(&self.banks, state, intent, &mut *rng)
        };

        enter(Stage::Retrieving, client_key);
        let examples = retrieve_similar(self.index.as_ref(), &topic, self.similar_k).await;

        enter(Stage::Assembling, client_key);
        let history = state.history_text();
        let examples_text = format_examples(&examples);
        let messages = assemble_prompt(&PromptInputs {
            topic: &topic,
            selections: &selections,
            intent,
            elevated,
            history: &history,
            examples: &examples_text,
        });

        enter(Stage::CallingModel, client_key);
        let text = self
            .model
            .complete(&messages, &self.sampling)
            .await?
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(GenerationError::EmptyCompletion)?;

        Ok(Draft {
            topic,
            selections,
            examples,
            text,
        })
    }
}

fn enter(stage: Stage, client_key: &str) {
    debug!(client_id = %client_key, stage = ?stage, "Generation stage");
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
