//! The turn orchestration cycle implementation.

use std::sync::Arc;
use tether_core::completion::{
    CompletionGateway, CompletionRequest, CompletionResponse, GenerationParams, ModelOutput,
    WireTurn,
};
use tether_core::error::Error;
use tether_core::retrieval::{RetrievalGateway, RetrievedDocument};
use tether_core::tool::{RETRIEVAL_TOOL_NAME, ToolDescriptor, ToolInvocationResult};
use tracing::{debug, info, warn};

/// How many documents each retrieval dispatch asks for.
pub const RETRIEVAL_TOP_K: usize = 4;

/// Concatenate retrieved document text with a blank-line separator.
///
/// Gateway order is preserved verbatim — no re-sorting, no deduplication.
pub fn fold_documents(documents: &[RetrievedDocument]) -> String {
    documents
        .iter()
        .map(|d| d.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Runs the model-decides / tool-executes / model-finalizes cycle exactly
/// once per user turn.
///
/// At most two completion calls per turn and at most one retrieval call per
/// invocation request present in the first response. If the second response
/// requests a tool again, its raw text is returned as-is — the depth bound
/// is deliberate.
pub struct TurnOrchestrator {
    /// The completion endpoint
    completion: Arc<dyn CompletionGateway>,

    /// The document search engine
    retrieval: Arc<dyn RetrievalGateway>,

    /// The model to use
    model: String,

    /// Generation parameters for both completion calls
    params: GenerationParams,

    /// Documents requested per retrieval dispatch
    top_k: usize,
}

impl TurnOrchestrator {
    /// Create a new orchestrator.
    pub fn new(
        completion: Arc<dyn CompletionGateway>,
        retrieval: Arc<dyn RetrievalGateway>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            completion,
            retrieval,
            model: model.into(),
            params: GenerationParams::default(),
            top_k: RETRIEVAL_TOP_K,
        }
    }

    /// Set the generation parameters.
    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    /// Set the per-dispatch document count.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    fn request(&self, turns: Vec<WireTurn>, tools: &[ToolDescriptor]) -> CompletionRequest {
        CompletionRequest {
            model: self.model.clone(),
            turns,
            params: self.params.clone(),
            tools: tools.to_vec(),
        }
    }

    /// Run one full cycle: first completion call, then `resolve`.
    pub async fn run_turn(
        &self,
        turns: Vec<WireTurn>,
        tools: &[ToolDescriptor],
    ) -> Result<String, Error> {
        debug!(model = %self.model, turns = turns.len(), "Starting orchestration cycle");
        let response = self
            .completion
            .complete(self.request(turns.clone(), tools))
            .await?;
        self.resolve(response, turns, tools).await
    }

    /// Resolve a model response into the final answer.
    ///
    /// Zero invocation requests: the response's own text is the answer, no
    /// further calls. Otherwise every request is dispatched sequentially in
    /// response order, the results are folded into the wire conversation,
    /// and one more completion call produces the answer.
    pub async fn resolve(
        &self,
        response: CompletionResponse,
        mut turns: Vec<WireTurn>,
        tools: &[ToolDescriptor],
    ) -> Result<String, Error> {
        let (text, requests) = match response.output {
            ModelOutput::FinalText(text) => return Ok(text),
            ModelOutput::ToolRequests { text, requests } => (text, requests),
        };

        info!(requests = requests.len(), "Model requested tool invocations");

        let mut results = Vec::with_capacity(requests.len());
        for request in &requests {
            if request.name != RETRIEVAL_TOOL_NAME {
                warn!(tool = %request.name, "Unknown tool requested, answering unavailable");
                results.push(ToolInvocationResult {
                    invocation_id: request.id.clone(),
                    payload: format!("Tool '{}' is not available.", request.name),
                });
                continue;
            }

            let query = request.query().ok_or_else(|| Error::InvalidToolArguments {
                tool_name: request.name.clone(),
                reason: "missing or empty required argument 'query'".into(),
            })?;

            debug!(query, k = self.top_k, "Dispatching retrieval");
            let documents = self.retrieval.search(query, self.top_k).await?;
            debug!(documents = documents.len(), "Retrieval returned");

            results.push(ToolInvocationResult {
                invocation_id: request.id.clone(),
                payload: fold_documents(&documents),
            });
        }

        turns.push(WireTurn::tool_requests(text, requests));
        for result in results {
            turns.push(WireTurn::tool_result(&result.invocation_id, &result.payload));
        }

        let second = self.completion.complete(self.request(turns, tools)).await?;

        match second.output {
            ModelOutput::FinalText(text) => Ok(text),
            ModelOutput::ToolRequests { text, requests } => {
                // One extra round only: a repeat request is not serviced.
                warn!(
                    requests = requests.len(),
                    "Second response requested tools again, returning raw content"
                );
                Ok(text)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use tether_core::error::RetrievalError;
    use tether_core::tool::retrieval_tool;
    use tether_core::turn::Role;

    fn tools() -> Vec<ToolDescriptor> {
        vec![retrieval_tool()]
    }

    fn user_turns(text: &str) -> Vec<WireTurn> {
        vec![WireTurn::user(text)]
    }

    #[tokio::test]
    async fn no_tool_request_returns_text_verbatim() {
        let completion = Arc::new(ScriptedCompletion::single_text("Paris is the capital."));
        let retrieval = Arc::new(ScriptedRetrieval::with_documents(vec![]));
        let orchestrator =
            TurnOrchestrator::new(completion.clone(), retrieval.clone(), "mock-model");

        let answer = orchestrator
            .run_turn(user_turns("What is the capital of France?"), &tools())
            .await
            .unwrap();

        assert_eq!(answer, "Paris is the capital.");
        assert_eq!(completion.call_count(), 1);
        assert_eq!(retrieval.call_count(), 0);
    }

    #[tokio::test]
    async fn tool_request_dispatches_once_then_finalizes() {
        let completion = Arc::new(ScriptedCompletion::tool_then_answer(
            vec![make_invocation("inv_1", RETRIEVAL_TOOL_NAME, serde_json::json!({"query": "notice period"}))],
            "Let me check.",
            "Thirty days of notice are required.",
        ));
        let retrieval = Arc::new(ScriptedRetrieval::with_documents(vec![
            RetrievedDocument::new("Notice must be given thirty days ahead."),
        ]));
        let orchestrator =
            TurnOrchestrator::new(completion.clone(), retrieval.clone(), "mock-model");

        let answer = orchestrator
            .run_turn(user_turns("How much notice?"), &tools())
            .await
            .unwrap();

        assert_eq!(answer, "Thirty days of notice are required.");
        assert_eq!(completion.call_count(), 2);
        assert_eq!(retrieval.call_count(), 1);
        assert_eq!(
            retrieval.calls()[0],
            ("notice period".to_string(), RETRIEVAL_TOP_K)
        );
    }

    #[tokio::test]
    async fn folded_result_correlates_invocation_id() {
        let completion = Arc::new(ScriptedCompletion::tool_then_answer(
            vec![make_invocation("inv_42", RETRIEVAL_TOOL_NAME, serde_json::json!({"query": "warranty"}))],
            "",
            "Two years.",
        ));
        let retrieval = Arc::new(ScriptedRetrieval::with_documents(vec![
            RetrievedDocument::new("Warranty lasts two years."),
        ]));
        let orchestrator =
            TurnOrchestrator::new(completion.clone(), retrieval.clone(), "mock-model");

        orchestrator
            .run_turn(user_turns("Warranty?"), &tools())
            .await
            .unwrap();

        let second_request = completion.recorded_requests()[1].clone();
        let tool_turn = second_request
            .turns
            .iter()
            .find(|t| t.role == Role::Tool)
            .expect("second call carries a tool turn");
        assert_eq!(tool_turn.invocation_id.as_deref(), Some("inv_42"));
        assert_eq!(tool_turn.content, "Warranty lasts two years.");

        // The assistant tool-request turn precedes the result.
        let assistant_turn = second_request
            .turns
            .iter()
            .find(|t| !t.tool_requests.is_empty())
            .expect("second call carries the tool-request turn");
        assert_eq!(assistant_turn.tool_requests[0].id, "inv_42");
    }

    #[tokio::test]
    async fn concatenation_preserves_gateway_order() {
        let documents = vec![
            RetrievedDocument::new("A"),
            RetrievedDocument::new("B"),
            RetrievedDocument::new("C"),
        ];
        assert_eq!(fold_documents(&documents), "A\n\nB\n\nC");
    }

    #[tokio::test]
    async fn missing_query_is_invalid_arguments() {
        let completion = Arc::new(ScriptedCompletion::tool_then_answer(
            vec![make_invocation("inv_1", RETRIEVAL_TOOL_NAME, serde_json::json!({}))],
            "",
            "never reached",
        ));
        let retrieval = Arc::new(ScriptedRetrieval::with_documents(vec![]));
        let orchestrator =
            TurnOrchestrator::new(completion.clone(), retrieval.clone(), "mock-model");

        let err = orchestrator
            .run_turn(user_turns("Hello"), &tools())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InvalidToolArguments { .. }));
        assert_eq!(retrieval.call_count(), 0);
        assert_eq!(completion.call_count(), 1);
    }

    #[tokio::test]
    async fn empty_query_is_invalid_arguments() {
        let completion = Arc::new(ScriptedCompletion::tool_then_answer(
            vec![make_invocation("inv_1", RETRIEVAL_TOOL_NAME, serde_json::json!({"query": ""}))],
            "",
            "never reached",
        ));
        let retrieval = Arc::new(ScriptedRetrieval::with_documents(vec![]));
        let orchestrator = TurnOrchestrator::new(completion, retrieval.clone(), "mock-model");

        let err = orchestrator
            .run_turn(user_turns("Hello"), &tools())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InvalidToolArguments { .. }));
        assert_eq!(retrieval.call_count(), 0);
    }

    #[tokio::test]
    async fn retrieval_failure_skips_second_call() {
        let completion = Arc::new(ScriptedCompletion::tool_then_answer(
            vec![make_invocation("inv_1", RETRIEVAL_TOOL_NAME, serde_json::json!({"query": "anything"}))],
            "",
            "never reached",
        ));
        let retrieval = Arc::new(ScriptedRetrieval::failing(RetrievalError::Network(
            "connection refused".into(),
        )));
        let orchestrator =
            TurnOrchestrator::new(completion.clone(), retrieval, "mock-model");

        let err = orchestrator
            .run_turn(user_turns("Hello"), &tools())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::RetrievalUnavailable(_)));
        assert_eq!(completion.call_count(), 1);
    }

    #[tokio::test]
    async fn second_tool_request_returns_raw_content() {
        let completion = Arc::new(ScriptedCompletion::new(vec![
            make_tool_request_response(
                vec![make_invocation("inv_1", RETRIEVAL_TOOL_NAME, serde_json::json!({"query": "first"}))],
                "",
            ),
            make_tool_request_response(
                vec![make_invocation("inv_2", RETRIEVAL_TOOL_NAME, serde_json::json!({"query": "second"}))],
                "I still want to look something up.",
            ),
        ]));
        let retrieval = Arc::new(ScriptedRetrieval::with_documents(vec![
            RetrievedDocument::new("doc"),
        ]));
        let orchestrator =
            TurnOrchestrator::new(completion.clone(), retrieval.clone(), "mock-model");

        let answer = orchestrator
            .run_turn(user_turns("Hello"), &tools())
            .await
            .unwrap();

        assert_eq!(answer, "I still want to look something up.");
        // The repeat request was not serviced.
        assert_eq!(retrieval.call_count(), 1);
        assert_eq!(completion.call_count(), 2);
    }

    #[tokio::test]
    async fn multiple_requests_dispatch_in_order() {
        let completion = Arc::new(ScriptedCompletion::tool_then_answer(
            vec![
                make_invocation("inv_a", RETRIEVAL_TOOL_NAME, serde_json::json!({"query": "alpha"})),
                make_invocation("inv_b", RETRIEVAL_TOOL_NAME, serde_json::json!({"query": "beta"})),
            ],
            "",
            "done",
        ));
        let retrieval = Arc::new(ScriptedRetrieval::with_documents(vec![
            RetrievedDocument::new("doc"),
        ]));
        let orchestrator =
            TurnOrchestrator::new(completion.clone(), retrieval.clone(), "mock-model");

        orchestrator
            .run_turn(user_turns("Hello"), &tools())
            .await
            .unwrap();

        let calls = retrieval.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].0, "alpha");
        assert_eq!(calls[1].0, "beta");

        // Both results folded, in order, each with its own invocation id.
        let second_request = completion.recorded_requests()[1].clone();
        let tool_turns: Vec<_> = second_request
            .turns
            .iter()
            .filter(|t| t.role == Role::Tool)
            .collect();
        assert_eq!(tool_turns.len(), 2);
        assert_eq!(tool_turns[0].invocation_id.as_deref(), Some("inv_a"));
        assert_eq!(tool_turns[1].invocation_id.as_deref(), Some("inv_b"));
    }

    #[tokio::test]
    async fn unknown_tool_is_answered_not_dispatched() {
        let completion = Arc::new(ScriptedCompletion::tool_then_answer(
            vec![make_invocation("inv_1", "weather_lookup", serde_json::json!({"city": "Oslo"}))],
            "",
            "I can only search documents.",
        ));
        let retrieval = Arc::new(ScriptedRetrieval::with_documents(vec![
            RetrievedDocument::new("doc"),
        ]));
        let orchestrator =
            TurnOrchestrator::new(completion.clone(), retrieval.clone(), "mock-model");

        let answer = orchestrator
            .run_turn(user_turns("Weather?"), &tools())
            .await
            .unwrap();

        assert_eq!(answer, "I can only search documents.");
        assert_eq!(retrieval.call_count(), 0);

        // The invocation id is still answered so the endpoint can correlate.
        let second_request = completion.recorded_requests()[1].clone();
        let tool_turn = second_request
            .turns
            .iter()
            .find(|t| t.role == Role::Tool)
            .unwrap();
        assert_eq!(tool_turn.invocation_id.as_deref(), Some("inv_1"));
        assert!(tool_turn.content.contains("not available"));
    }

    #[tokio::test]
    async fn empty_retrieval_result_still_finalizes() {
        // Fewer than k matches (here zero) is a valid response, not a failure.
        let completion = Arc::new(ScriptedCompletion::tool_then_answer(
            vec![make_invocation("inv_1", RETRIEVAL_TOOL_NAME, serde_json::json!({"query": "nothing"}))],
            "",
            "I found no relevant passages.",
        ));
        let retrieval = Arc::new(ScriptedRetrieval::with_documents(vec![]));
        let orchestrator =
            TurnOrchestrator::new(completion.clone(), retrieval.clone(), "mock-model");

        let answer = orchestrator
            .run_turn(user_turns("Hello"), &tools())
            .await
            .unwrap();

        assert_eq!(answer, "I found no relevant passages.");
        assert_eq!(retrieval.call_count(), 1);
        assert_eq!(completion.call_count(), 2);
    }
}
