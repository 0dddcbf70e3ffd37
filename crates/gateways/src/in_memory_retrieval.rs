//! In-memory retrieval index — useful for testing, demos, and offline
//! sessions where no search service is running.
//!
//! Scoring is keyword overlap (query terms found in the document,
//! normalized by document length), a stand-in for the vector similarity a
//! real search engine provides. Results come back in descending score
//! order, at most k of them.

use async_trait::async_trait;
use std::sync::Arc;
use tether_core::error::RetrievalError;
use tether_core::retrieval::{RetrievalGateway, RetrievedDocument};
use tokio::sync::RwLock;

struct StoredDocument {
    text: String,
    source: Option<String>,
}

/// An in-process document index.
pub struct InMemoryRetrieval {
    documents: Arc<RwLock<Vec<StoredDocument>>>,
}

impl InMemoryRetrieval {
    pub fn new() -> Self {
        Self {
            documents: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Add a document to the index.
    pub async fn add(&self, text: impl Into<String>, source: Option<String>) {
        self.documents.write().await.push(StoredDocument {
            text: text.into(),
            source,
        });
    }

    /// Number of indexed documents.
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }

    fn score(query_terms: &[String], text: &str) -> f32 {
        let haystack = text.to_lowercase();
        let hits: usize = query_terms
            .iter()
            .map(|term| haystack.matches(term.as_str()).count())
            .sum();
        hits as f32 / (text.len() as f32 / 100.0).max(1.0)
    }
}

impl Default for InMemoryRetrieval {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RetrievalGateway for InMemoryRetrieval {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn search(
        &self,
        query: &str,
        k: usize,
    ) -> std::result::Result<Vec<RetrievedDocument>, RetrievalError> {
        let documents = self.documents.read().await;
        if documents.is_empty() {
            return Err(RetrievalError::EmptyIndex);
        }

        let query_terms: Vec<String> = query
            .to_lowercase()
            .split_whitespace()
            .filter(|t| t.len() >= 2)
            .map(String::from)
            .collect();

        let mut scored: Vec<(f32, RetrievedDocument)> = documents
            .iter()
            .filter_map(|d| {
                let score = Self::score(&query_terms, &d.text);
                if score > 0.0 {
                    Some((
                        score,
                        RetrievedDocument {
                            text: d.text.clone(),
                            source: d.source.clone(),
                        },
                    ))
                } else {
                    None
                }
            })
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);

        Ok(scored.into_iter().map(|(_, d)| d).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded() -> InMemoryRetrieval {
        let index = InMemoryRetrieval::new();
        index
            .add(
                "Tenants must give thirty days of notice before moving out.",
                Some("lease.md".into()),
            )
            .await;
        index
            .add(
                "Security deposits are returned within two weeks of move-out.",
                Some("lease.md".into()),
            )
            .await;
        index
            .add("Office plants are watered on Fridays.", None)
            .await;
        index
    }

    #[tokio::test]
    async fn search_ranks_by_overlap() {
        let index = seeded().await;
        let results = index.search("notice before moving", 4).await.unwrap();
        assert!(!results.is_empty());
        assert!(results[0].text.contains("notice"));
    }

    #[tokio::test]
    async fn search_respects_k() {
        let index = seeded().await;
        let results = index.search("the", 1).await.unwrap();
        assert!(results.len() <= 1);
    }

    #[tokio::test]
    async fn empty_index_is_an_error() {
        let index = InMemoryRetrieval::new();
        let err = index.search("anything", 4).await.unwrap_err();
        assert!(matches!(err, RetrievalError::EmptyIndex));
    }

    #[tokio::test]
    async fn no_match_returns_empty_not_error() {
        let index = seeded().await;
        let results = index.search("quantum chromodynamics", 4).await.unwrap();
        assert!(results.is_empty());
    }
}
