//! Similar-Post Retriever — example posts from the external similarity index.
//!
//! Retrieval is best-effort: any failure is logged and treated as "no
//! examples", never surfaced to the orchestrator.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

const REQUEST_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Similarity search error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One historical post returned by the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarPost {
    #[serde(alias = "content", alias = "page_content")]
    pub text: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default, alias = "url")]
    pub source_url: Option<String>,
}

/// Query contract of the similarity index. An uninitialized or empty index
/// must answer with an empty list, not an error.
#[async_trait]
pub trait SimilarityIndex: Send + Sync {
    async fn search(&self, topic: &str, k: usize) -> Result<Vec<SimilarPost>, RetrievalError>;
}

/// Index used when no search backend is configured.
pub struct EmptyIndex;

#[async_trait]
impl SimilarityIndex for EmptyIndex {
    async fn search(&self, _topic: &str, _k: usize) -> Result<Vec<SimilarPost>, RetrievalError> {
        Ok(Vec::new())
    }
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    k: usize,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SimilarPost>,
}

/// Similarity index reached over HTTP: POST `{query, k}`, expects `{results: [...]}`.
#[derive(Clone)]
pub struct HttpSimilarityIndex {
    client: Client,
    url: String,
}

impl HttpSimilarityIndex {
    pub fn new(url: String) -> Result<Self, RetrievalError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl SimilarityIndex for HttpSimilarityIndex {
    async fn search(&self, topic: &str, k: usize) -> Result<Vec<SimilarPost>, RetrievalError> {
        let response = self
            .client
            .post(&self.url)
            .json(&SearchRequest { query: topic, k })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(RetrievalError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let parsed: SearchResponse = serde_json::from_str(&body)?;
        debug!("Similarity search returned {} posts", parsed.results.len());
        Ok(parsed.results)
    }
}

/// Queries the index, swallowing failures. Blank posts are dropped and the
/// result is capped at `k`.
pub async fn retrieve_similar(index: &dyn SimilarityIndex, topic: &str, k: usize) -> Vec<SimilarPost> {
    if k == 0 {
        return Vec::new();
    }
    match index.search(topic, k).await {
        Ok(posts) => posts
            .into_iter()
            .filter(|p| !p.text.trim().is_empty())
            .take(k)
            .collect(),
        Err(e) => {
            warn!("Similar-post retrieval failed for topic {topic:?}: {e}");
            Vec::new()
        }
    }
}

/// Numbered example block for the prompt; empty when there are no posts.
pub fn format_examples(posts: &[SimilarPost]) -> String {
    posts
        .iter()
        .enumerate()
        .map(|(i, post)| {
            let mut block = format!("Example {}:\n{}", i + 1, post.text.trim());
            let fields = [
                ("Author", &post.author),
                ("Date", &post.date),
                ("Source", &post.source_url),
            ];
            for (label, value) in fields {
                if let Some(value) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                    block.push_str(&format!("\n{label}: {value}"));
                }
            }
            block
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingIndex;

    #[async_trait]
    impl SimilarityIndex for FailingIndex {
        async fn search(&self, _topic: &str, _k: usize) -> Result<Vec<SimilarPost>, RetrievalError> {
            Err(RetrievalError::Api {
                status: 503,
                message: "index warming up".to_string(),
            })
        }
    }

    struct FixedIndex(Vec<SimilarPost>);

    #[async_trait]
    impl SimilarityIndex for FixedIndex {
        async fn search(&self, _topic: &str, _k: usize) -> Result<Vec<SimilarPost>, RetrievalError> {
            Ok(self.0.clone())
        }
    }

    fn post(text: &str) -> SimilarPost {
        SimilarPost {
            text: text.to_string(),
            author: None,
            date: None,
            source_url: None,
        }
    }

    #[tokio::test]
    async fn test_failure_yields_no_examples() {
        let posts = retrieve_similar(&FailingIndex, "remote work", 3).await;
        assert!(posts.is_empty());
        assert_eq!(format_examples(&posts), "");
    }

    #[tokio::test]
    async fn test_empty_index_yields_no_examples() {
        assert!(retrieve_similar(&EmptyIndex, "remote work", 3).await.is_empty());
    }

    #[tokio::test]
    async fn test_results_capped_and_blank_posts_dropped() {
        let index = FixedIndex(vec![post("one"), post("  "), post("two"), post("three")]);
        let posts = retrieve_similar(&index, "t", 2).await;
        let texts: Vec<_> = posts.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, ["one", "two"]);
    }

    #[test]
    fn test_format_numbers_from_one_with_optional_metadata() {
        let posts = vec![
            SimilarPost {
                text: "Remote work changed how we hire.".to_string(),
                author: Some("Ada".to_string()),
                date: Some("2024-03-01".to_string()),
                source_url: Some("https://example.com/p/1".to_string()),
            },
            post("Async first, meetings last."),
        ];
        let text = format_examples(&posts);
        assert!(text.starts_with("Example 1:\nRemote work changed how we hire."));
        assert!(text.contains("Author: Ada"));
        assert!(text.contains("Date: 2024-03-01"));
        assert!(text.contains("Source: https://example.com/p/1"));
        assert!(text.contains("Example 2:\nAsync first, meetings last."));
        assert_eq!(text.matches("Author:").count(), 1);
    }

    #[test]
    fn test_search_response_accepts_field_aliases() {
        let json = r#"{"results": [
            {"page_content": "A", "url": "https://x"},
            {"content": "B", "author": "Bo"}
        ]}"#;
        let parsed: SearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.results[0].text, "A");
        assert_eq!(parsed.results[0].source_url.as_deref(), Some("https://x"));
        assert_eq!(parsed.results[1].author.as_deref(), Some("Bo"));
    }
}
