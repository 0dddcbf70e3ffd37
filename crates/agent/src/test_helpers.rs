//! Shared test helpers: scripted gateway mocks.

use std::sync::Mutex;
use tether_core::completion::{
    CompletionGateway, CompletionRequest, CompletionResponse, ModelOutput, Usage,
};
use tether_core::error::{CompletionError, RetrievalError};
use tether_core::retrieval::{RetrievalGateway, RetrievedDocument};
use tether_core::tool::ToolInvocationRequest;

/// A mock completion gateway that returns a sequence of scripted responses
/// and records every request it receives.
///
/// Panics if more calls are made than responses provided.
pub struct ScriptedCompletion {
    responses: Mutex<Vec<CompletionResponse>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedCompletion {
    pub fn new(responses: Vec<CompletionResponse>) -> Self {
        Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A gateway that returns a single text response (no tool requests).
    pub fn single_text(text: &str) -> Self {
        Self::new(vec![make_text_response(text)])
    }

    /// A gateway that first requests tools, then returns a final answer.
    pub fn tool_then_answer(
        requests: Vec<ToolInvocationRequest>,
        thought: &str,
        answer: &str,
    ) -> Self {
        Self::new(vec![
            make_tool_request_response(requests, thought),
            make_text_response(answer),
        ])
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Every request received so far, in order.
    pub fn recorded_requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl CompletionGateway for ScriptedCompletion {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, CompletionError> {
        let mut requests = self.requests.lock().unwrap();
        let responses = self.responses.lock().unwrap();

        if requests.len() >= responses.len() {
            panic!(
                "ScriptedCompletion: no more responses (call #{}, have {})",
                requests.len() + 1,
                responses.len()
            );
        }

        let response = responses[requests.len()].clone();
        requests.push(request);
        Ok(response)
    }
}

/// A mock completion gateway that always fails.
pub struct FailingCompletion {
    error: CompletionError,
}

impl FailingCompletion {
    pub fn new(error: CompletionError) -> Self {
        Self { error }
    }
}

#[async_trait::async_trait]
impl CompletionGateway for FailingCompletion {
    fn name(&self) -> &str {
        "failing"
    }

    async fn complete(
        &self,
        _request: CompletionRequest,
    ) -> Result<CompletionResponse, CompletionError> {
        Err(self.error.clone())
    }
}

/// A mock retrieval gateway that returns fixed documents (or a fixed
/// error) and records every query it receives.
pub struct ScriptedRetrieval {
    documents: Vec<RetrievedDocument>,
    error: Option<RetrievalError>,
    calls: Mutex<Vec<(String, usize)>>,
}

impl ScriptedRetrieval {
    pub fn with_documents(documents: Vec<RetrievedDocument>) -> Self {
        Self {
            documents,
            error: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: RetrievalError) -> Self {
        Self {
            documents: Vec::new(),
            error: Some(error),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Every (query, k) pair received so far, in order.
    pub fn calls(&self) -> Vec<(String, usize)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl RetrievalGateway for ScriptedRetrieval {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn search(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<RetrievedDocument>, RetrievalError> {
        self.calls.lock().unwrap().push((query.to_string(), k));
        match &self.error {
            Some(error) => Err(error.clone()),
            None => Ok(self.documents.clone()),
        }
    }
}

/// Create a simple text response (no tool requests).
pub fn make_text_response(text: &str) -> CompletionResponse {
    CompletionResponse {
        output: ModelOutput::FinalText(text.into()),
        model: "mock-model".into(),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
    }
}

/// Create a response carrying tool invocation requests.
pub fn make_tool_request_response(
    requests: Vec<ToolInvocationRequest>,
    thought: &str,
) -> CompletionResponse {
    CompletionResponse {
        output: ModelOutput::ToolRequests {
            text: thought.into(),
            requests,
        },
        model: "mock-model".into(),
        usage: None,
    }
}

/// Create a tool invocation request.
pub fn make_invocation(
    id: &str,
    name: &str,
    arguments: serde_json::Value,
) -> ToolInvocationRequest {
    ToolInvocationRequest {
        id: id.into(),
        name: name.into(),
        arguments,
    }
}
