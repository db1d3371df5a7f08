//! Axum route handler for post generation.
//!
//! Tiering lives here, not in the orchestrator: pro users get several
//! variants per request, each a separate `generate` call against the same
//! client memory.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::generation::generator::{GenerationOutcome, PostGenerator, APOLOGY_MESSAGE};
use crate::models::user::UserType;
use crate::posts::store::{get_or_create_user, save_posts, NewPosts};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct GeneratePostRequest {
    pub user_id: String,
    pub query: String,
    pub client_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneratedPost {
    pub post_id: String,
    pub content: String,
    pub score: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneratePostResponse {
    pub posts: Vec<GeneratedPost>,
    pub user_type: UserType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similar_posts: Option<Vec<String>>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /generate_post
///
/// Generates one post (three for pro users) and stores the successful
/// variants together. When every variant fails, a single unsaved apology
/// post is returned.
pub async fn handle_generate_post(
    State(state): State<AppState>,
    Json(request): Json<GeneratePostRequest>,
) -> Result<Json<GeneratePostResponse>, AppError> {
    if request.user_id.trim().is_empty() {
        return Err(AppError::Validation("user_id cannot be empty".to_string()));
    }
    if request.query.trim().is_empty() {
        return Err(AppError::Validation("query cannot be empty".to_string()));
    }

    let user = get_or_create_user(&state.db, &request.user_id).await?;
    let tier = user.tier();
    let client_id = request.client_id.as_deref().unwrap_or_default();

    let (outcomes, similar_posts) =
        generate_variants(&state.generator, &request.query, client_id, tier).await;

    let posts = if outcomes.is_empty() {
        vec![apology_post()]
    } else {
        let post_ids = save_posts(
            &state.db,
            NewPosts {
                user_id: &request.user_id,
                client_id: request.client_id.as_deref(),
                query: &request.query,
                contents: outcomes.iter().map(|o| o.text.as_str()).collect(),
            },
        )
        .await?;

        post_ids
            .into_iter()
            .zip(outcomes)
            .map(|(post_id, outcome)| GeneratedPost {
                post_id,
                content: outcome.text,
                score: None,
            })
            .collect()
    };

    info!(
        "Returning {} post(s) to {} user {}",
        posts.len(),
        tier.as_str(),
        request.user_id
    );

    Ok(Json(GeneratePostResponse {
        posts,
        user_type: tier,
        similar_posts,
    }))
}

/// Runs one generation per variant the tier allows, against the same client
/// memory. Only successful outcomes are returned. The second value holds the
/// excerpts retrieved for the first successful variant, for elevated tiers only.
pub async fn generate_variants(
    generator: &PostGenerator,
    query: &str,
    client_id: &str,
    tier: UserType,
) -> (Vec<GenerationOutcome>, Option<Vec<String>>) {
    let total = tier.variant_count();
    let mut outcomes = Vec::with_capacity(total);
    let mut similar_posts = None;

    for variant in 1..=total {
        let outcome = generator
            .generate_detailed(query, client_id, tier.is_elevated())
            .await;

        if !outcome.succeeded {
            warn!("Variant {variant}/{total} failed for client {client_id:?}");
            continue;
        }

        debug!("Variant {variant}/{total} resolved topic {:?}", outcome.topic);

        if tier.is_elevated() && similar_posts.is_none() {
            similar_posts = Some(outcome.examples.iter().map(|p| p.text.clone()).collect());
        }
        outcomes.push(outcome);
    }

    (outcomes, similar_posts)
}

/// Stand-in returned when no variant could be generated. Never persisted.
fn apology_post() -> GeneratedPost {
    GeneratedPost {
        post_id: Uuid::new_v4().to_string(),
        content: APOLOGY_MESSAGE.to_string(),
        score: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_request_client_id_optional() {
        let json = serde_json::json!({
            "user_id": "u1",
            "query": "Write about remote work"
        });
        let request: GeneratePostRequest = serde_json::from_value(json).unwrap();
        assert!(request.client_id.is_none());
    }

    #[test]
    fn test_response_omits_similar_posts_when_absent() {
        let response = GeneratePostResponse {
            posts: vec![GeneratedPost {
                post_id: "p1".to_string(),
                content: "Hello".to_string(),
                score: None,
            }],
            user_type: UserType::Beginner,
            similar_posts: None,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["user_type"], "beginner");
        assert!(json.get("similar_posts").is_none());
        assert!(json["posts"][0]["score"].is_null());
    }

    // ── Variant generation ──────────────────────────────────────────────────

    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use crate::generation::memory::ClientMemory;
    use crate::generation::phrase_bank::{PhraseBank, PhraseBanks, PhraseCategory};
    use crate::generation::retrieval::{RetrievalError, SimilarPost, SimilarityIndex};
    use crate::llm_client::{ChatMessage, CompletionModel, LlmError, SamplingParams};

    /// Answers from a script, one entry per call. `None` is a failed call.
    /// Once the script runs out every call succeeds.
    struct ScriptedModel {
        replies: Mutex<VecDeque<Option<&'static str>>>,
        calls: Mutex<usize>,
    }

    impl ScriptedModel {
        fn new(replies: Vec<Option<&'static str>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                calls: Mutex::new(0),
            })
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl CompletionModel for ScriptedModel {
        async fn complete(
            &self,
            _messages: &[ChatMessage],
            _params: &SamplingParams,
        ) -> Result<Option<String>, LlmError> {
            *self.calls.lock().unwrap() += 1;
            match self.replies.lock().unwrap().pop_front() {
                Some(None) => Err(LlmError::Api {
                    status: 429,
                    message: "rate limited".to_string(),
                }),
                Some(Some(text)) => Ok(Some(text.to_string())),
                None => Ok(Some("A fresh post".to_string())),
            }
        }
    }

    struct OnePostIndex;

    #[async_trait]
    impl SimilarityIndex for OnePostIndex {
        async fn search(&self, topic: &str, _k: usize) -> Result<Vec<SimilarPost>, RetrievalError> {
            Ok(vec![SimilarPost {
                text: format!("Past post on {topic}"),
                author: None,
                date: None,
                source_url: None,
            }])
        }
    }

    fn generator(model: Arc<ScriptedModel>) -> PostGenerator {
        let banks = PhraseBanks {
            hooks: PhraseBank::new(PhraseCategory::Hook, ["Hook A", "Hook B", "Hook C"]),
            frameworks: PhraseBank::new(PhraseCategory::Framework, ["PAS", "AIDA"]),
            ctas: PhraseBank::new(PhraseCategory::Cta, ["Thoughts?", "Share this"]),
        };
        PostGenerator::new(
            model,
            Arc::new(OnePostIndex),
            banks,
            Arc::new(ClientMemory::new()),
            3,
        )
        .with_rng(StdRng::seed_from_u64(5))
    }

    #[tokio::test]
    async fn test_pro_gets_three_variants_and_similar_posts() {
        let model = ScriptedModel::new(vec![Some("One"), Some("Two"), Some("Three")]);
        let generator = generator(model.clone());

        let (outcomes, similar) =
            generate_variants(&generator, "Hiring juniors", "c1", UserType::Pro).await;

        let texts: Vec<_> = outcomes.iter().map(|o| o.text.as_str()).collect();
        assert_eq!(texts, ["One", "Two", "Three"]);
        assert_eq!(model.calls(), 3);
        assert_eq!(similar, Some(vec!["Past post on Hiring juniors".to_string()]));
    }

    #[tokio::test]
    async fn test_other_tiers_get_one_variant_without_similar_posts() {
        for tier in [UserType::Beginner, UserType::Normal, UserType::Copywriter] {
            let model = ScriptedModel::new(Vec::new());
            let generator = generator(model.clone());

            let (outcomes, similar) =
                generate_variants(&generator, "Hiring juniors", "c1", tier).await;

            assert_eq!(outcomes.len(), 1, "tier: {tier:?}");
            assert_eq!(model.calls(), 1, "tier: {tier:?}");
            assert!(similar.is_none(), "tier: {tier:?}");
        }
    }

    #[tokio::test]
    async fn test_failed_variants_are_skipped() {
        let model = ScriptedModel::new(vec![None, Some("Second try"), None]);
        let generator = generator(model.clone());

        let (outcomes, similar) =
            generate_variants(&generator, "Hiring juniors", "c1", UserType::Pro).await;

        assert_eq!(model.calls(), 3);
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].text, "Second try");
        assert!(outcomes.iter().all(|o| o.succeeded));
        assert!(similar.is_some());
    }

    #[tokio::test]
    async fn test_all_variants_failing_yields_nothing_to_store() {
        let model = ScriptedModel::new(vec![None, None, None]);
        let generator = generator(model);

        let (outcomes, similar) =
            generate_variants(&generator, "Hiring juniors", "c1", UserType::Pro).await;

        assert!(outcomes.is_empty());
        assert!(similar.is_none());

        let apology = apology_post();
        assert_eq!(apology.content, APOLOGY_MESSAGE);
        assert!(Uuid::parse_str(&apology.post_id).is_ok());
    }
}
