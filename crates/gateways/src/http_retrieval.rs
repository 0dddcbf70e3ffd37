//! HTTP retrieval gateway.
//!
//! Talks to a JSON top-k search endpoint: POST `{query, k}`, response
//! `{"documents": [{"text": "...", "source": "..."}]}`. Embedding and
//! ranking are the endpoint's concern; the returned order is relevance
//! order and is passed through untouched.

use async_trait::async_trait;
use serde::Deserialize;
use tether_core::error::RetrievalError;
use tether_core::retrieval::{RetrievalGateway, RetrievedDocument};
use tracing::{debug, warn};

/// A retrieval gateway backed by an HTTP search endpoint.
pub struct HttpRetrievalGateway {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpRetrievalGateway {
    /// Create a gateway against a search endpoint URL.
    pub fn new(endpoint: impl Into<String>) -> Result<Self, RetrievalError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| RetrievalError::Network(format!("HTTP client: {e}")))?;

        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }
}

#[async_trait]
impl RetrievalGateway for HttpRetrievalGateway {
    fn name(&self) -> &str {
        "http"
    }

    async fn search(
        &self,
        query: &str,
        k: usize,
    ) -> std::result::Result<Vec<RetrievedDocument>, RetrievalError> {
        debug!(endpoint = %self.endpoint, k, "Sending search request");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&serde_json::json!({ "query": query, "k": k }))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RetrievalError::Timeout(e.to_string())
                } else {
                    RetrievalError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Search endpoint returned error");
            return Err(RetrievalError::Api {
                status_code: status,
                message: error_body,
            });
        }

        let api_response: SearchApiResponse =
            response.json().await.map_err(|e| RetrievalError::Api {
                status_code: 200,
                message: format!("Failed to parse search response: {e}"),
            })?;

        let mut documents: Vec<RetrievedDocument> = api_response
            .documents
            .into_iter()
            .map(|d| RetrievedDocument {
                text: d.text,
                source: d.source,
            })
            .collect();
        documents.truncate(k);

        Ok(documents)
    }
}

#[derive(Debug, Deserialize)]
struct SearchApiResponse {
    documents: Vec<ApiDocument>,
}

#[derive(Debug, Deserialize)]
struct ApiDocument {
    text: String,
    #[serde(default)]
    source: Option<String>,
}
