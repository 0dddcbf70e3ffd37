//! CompletionGateway trait — the abstraction over the language-model endpoint.
//!
//! A gateway knows how to send a wire conversation (plus the tool descriptor
//! set and generation parameters) to a model endpoint and hand back either
//! final text or one-or-more tool invocation requests.
//!
//! Implementations: OpenAI-compatible HTTP endpoints, scripted test mocks.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CompletionError;
use crate::tool::{ToolDescriptor, ToolInvocationRequest};
use crate::turn::{Role, Turn};

/// One entry of the wire conversation sent to the completion gateway.
///
/// Durable turns translate 1:1; within an orchestration cycle the
/// orchestrator also folds in an assistant turn carrying the model's tool
/// requests and a tool turn carrying each result, correlated by invocation
/// id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireTurn {
    /// Who authored this entry
    pub role: Role,

    /// The text content
    pub content: String,

    /// Tool invocations the model requested (assistant entries only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_requests: Vec<ToolInvocationRequest>,

    /// Which invocation this entry answers (tool entries only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invocation_id: Option<String>,
}

impl WireTurn {
    /// Translate a durable turn.
    pub fn from_turn(turn: &Turn) -> Self {
        Self {
            role: turn.role,
            content: turn.text.clone(),
            tool_requests: Vec::new(),
            invocation_id: turn.invocation_id.clone(),
        }
    }

    /// A system (persona preamble) entry.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
            tool_requests: Vec::new(),
            invocation_id: None,
        }
    }

    /// A user entry.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            tool_requests: Vec::new(),
            invocation_id: None,
        }
    }

    /// An assistant entry carrying the model's tool invocation requests.
    pub fn tool_requests(
        content: impl Into<String>,
        requests: Vec<ToolInvocationRequest>,
    ) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_requests: requests,
            invocation_id: None,
        }
    }

    /// A tool entry answering one invocation.
    pub fn tool_result(invocation_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            tool_requests: Vec::new(),
            invocation_id: Some(invocation_id.into()),
        }
    }
}

/// Generation parameters for a completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature (0.0 = deterministic)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Nucleus sampling threshold
    #[serde(default = "default_top_p")]
    pub top_p: f32,

    /// Stop sequences
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stop: Vec<String>,
}

fn default_max_tokens() -> u32 {
    2000
}
fn default_temperature() -> f32 {
    0.0
}
fn default_top_p() -> f32 {
    0.9
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            stop: Vec::new(),
        }
    }
}

/// A completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// The model to use (e.g., "anthropic/claude-sonnet-4")
    pub model: String,

    /// The ordered wire conversation
    pub turns: Vec<WireTurn>,

    /// Generation parameters
    #[serde(default)]
    pub params: GenerationParams,

    /// Tool descriptors the model may invoke
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDescriptor>,
}

/// What the model produced: final text, or a request to invoke tools.
///
/// A tagged variant rather than duck-typed inspection of response shape —
/// the orchestrator matches on this to decide whether a tool round runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ModelOutput {
    /// The response's own text is the final answer.
    FinalText(String),
    /// The model wants tool invocations before answering. `text` carries
    /// any accompanying content (thinking-aloud, partial answer).
    ToolRequests {
        text: String,
        requests: Vec<ToolInvocationRequest>,
    },
}

impl ModelOutput {
    /// The text content of either variant.
    pub fn text(&self) -> &str {
        match self {
            ModelOutput::FinalText(text) => text,
            ModelOutput::ToolRequests { text, .. } => text,
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(self, ModelOutput::FinalText(_))
    }
}

/// A complete response from the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// What the model produced
    pub output: ModelOutput,

    /// Which model actually responded (may differ from requested)
    pub model: String,

    /// Token usage statistics
    pub usage: Option<Usage>,
}

/// Token usage information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// The completion gateway trait.
///
/// The orchestrator calls `complete()` without knowing which endpoint is
/// behind it. Implementations must be shareable across sessions
/// (`Send + Sync`); all mutable conversation state lives in the caller.
#[async_trait]
pub trait CompletionGateway: Send + Sync {
    /// A human-readable name for this gateway (e.g., "openrouter").
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> std::result::Result<CompletionResponse, CompletionError>;

    /// Health check — can we reach the endpoint?
    async fn health_check(&self) -> std::result::Result<bool, CompletionError> {
        Ok(true)
    }
}
