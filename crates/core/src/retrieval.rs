//! RetrievalGateway trait — the abstraction over the document search engine.
//!
//! Given a text query the engine returns the k most semantically similar
//! stored documents, in relevance order. Embedding, indexing, and ranking
//! are entirely the engine's concern; the orchestrator consumes the ordered
//! result as-is.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RetrievalError;

/// One item of a retrieval response. Relevance rank is implicit in the
/// position within the returned sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedDocument {
    /// Raw text content
    pub text: String,

    /// Optional source label (file name, document id) for display
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl RetrievedDocument {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: None,
        }
    }

    pub fn with_source(text: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: Some(source.into()),
        }
    }
}

/// The retrieval gateway trait.
///
/// Returns at most `k` documents ordered by descending relevance; fewer if
/// the index holds fewer matches. Implementations must be shareable across
/// sessions (`Send + Sync`).
#[async_trait]
pub trait RetrievalGateway: Send + Sync {
    /// A human-readable name for this gateway (e.g., "http", "in_memory").
    fn name(&self) -> &str;

    /// Search the document store.
    async fn search(
        &self,
        query: &str,
        k: usize,
    ) -> std::result::Result<Vec<RetrievedDocument>, RetrievalError>;
}
