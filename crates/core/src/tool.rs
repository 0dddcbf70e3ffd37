//! Tool descriptor and invocation types.
//!
//! Exactly one capability is exposed to the model: the retrieval query
//! tool. Descriptors are static and read-only; invocation requests and
//! results are ephemeral, consumed within one orchestration cycle.

use serde::{Deserialize, Serialize};

/// Name of the single retrieval capability exposed to the model.
pub const RETRIEVAL_TOOL_NAME: &str = "retrieve_domain_information";

/// A static definition of one invocable capability, sent to the model so it
/// can decide when to invoke it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Unique tool name
    pub name: String,

    /// Description of what the tool does (steers the model's decision)
    pub description: String,

    /// JSON Schema describing the tool's parameters
    pub parameters: serde_json::Value,
}

/// The process-wide retrieval tool descriptor.
pub fn retrieval_tool() -> ToolDescriptor {
    ToolDescriptor {
        name: RETRIEVAL_TOOL_NAME.into(),
        description: "Search the document store for passages relevant to the \
                      user's question. Invoke this before answering whenever \
                      the answer depends on stored domain knowledge rather \
                      than general knowledge."
            .into(),
        parameters: serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query to find relevant passages"
                }
            },
            "required": ["query"]
        }),
    }
}

/// A model-produced request to invoke a tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInvocationRequest {
    /// Unique invocation ID (matches the endpoint's tool_call id)
    pub id: String,

    /// Name of the descriptor being invoked
    pub name: String,

    /// Argument values chosen by the model
    pub arguments: serde_json::Value,
}

impl ToolInvocationRequest {
    /// The required `query` argument, if present and non-empty.
    pub fn query(&self) -> Option<&str> {
        self.arguments
            .get("query")
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// The payload produced by dispatching one invocation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInvocationResult {
    /// The invocation this result answers
    pub invocation_id: String,

    /// Concatenated retrieved document text
    pub payload: String,
}
