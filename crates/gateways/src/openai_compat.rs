//! OpenAI-compatible completion gateway.
//!
//! Works with: OpenAI, OpenRouter, Ollama, vLLM, Together AI, and any other
//! endpoint exposing an OpenAI-compatible `/v1/chat/completions` API.
//!
//! Supports chat completions with tool use; the response is translated into
//! the tagged `ModelOutput` variant the orchestrator matches on.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tether_core::completion::{
    CompletionGateway, CompletionRequest, CompletionResponse, ModelOutput, Usage, WireTurn,
};
use tether_core::error::CompletionError;
use tether_core::tool::{ToolDescriptor, ToolInvocationRequest};
use tether_core::turn::Role;
use tracing::{debug, warn};

/// An OpenAI-compatible completion gateway.
pub struct OpenAiCompatGateway {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiCompatGateway {
    /// Create a new gateway against an OpenAI-compatible endpoint.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, CompletionError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .map_err(|e| CompletionError::NotConfigured(format!("HTTP client: {e}")))?;

        Ok(Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        })
    }

    /// Create an OpenRouter gateway (convenience constructor).
    pub fn openrouter(api_key: impl Into<String>) -> Result<Self, CompletionError> {
        Self::new("openrouter", "https://openrouter.ai/api/v1", api_key)
    }

    /// Create an OpenAI gateway (convenience constructor).
    pub fn openai(api_key: impl Into<String>) -> Result<Self, CompletionError> {
        Self::new("openai", "https://api.openai.com/v1", api_key)
    }

    /// Convert wire turns to OpenAI API format.
    fn to_wire_messages(turns: &[WireTurn]) -> Vec<ChatMessage> {
        turns
            .iter()
            .map(|t| ChatMessage {
                role: match t.role {
                    Role::User => "user".into(),
                    Role::Assistant => "assistant".into(),
                    Role::System => "system".into(),
                    Role::Tool => "tool".into(),
                },
                content: Some(t.content.clone()),
                tool_calls: if t.tool_requests.is_empty() {
                    None
                } else {
                    Some(
                        t.tool_requests
                            .iter()
                            .map(|req| ChatToolCall {
                                id: req.id.clone(),
                                r#type: "function".into(),
                                function: ChatFunctionCall {
                                    name: req.name.clone(),
                                    arguments: req.arguments.to_string(),
                                },
                            })
                            .collect(),
                    )
                },
                tool_call_id: t.invocation_id.clone(),
            })
            .collect()
    }

    /// Convert tool descriptors to OpenAI API format.
    fn to_wire_tools(tools: &[ToolDescriptor]) -> Vec<ChatToolDef> {
        tools
            .iter()
            .map(|t| ChatToolDef {
                r#type: "function".into(),
                function: ChatToolSpec {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: t.parameters.clone(),
                },
            })
            .collect()
    }
}

#[async_trait]
impl CompletionGateway for OpenAiCompatGateway {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> std::result::Result<CompletionResponse, CompletionError> {
        let url = format!("{}/chat/completions", self.base_url);

        let mut body = serde_json::json!({
            "model": request.model,
            "messages": Self::to_wire_messages(&request.turns),
            "temperature": request.params.temperature,
            "top_p": request.params.top_p,
            "max_tokens": request.params.max_tokens,
            "stream": false,
        });

        if !request.tools.is_empty() {
            body["tools"] = serde_json::json!(Self::to_wire_tools(&request.tools));
        }

        if !request.params.stop.is_empty() {
            body["stop"] = serde_json::json!(request.params.stop);
        }

        debug!(gateway = %self.name, model = %request.model, "Sending completion request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CompletionError::Timeout(e.to_string())
                } else {
                    CompletionError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();

        if status == 429 {
            return Err(CompletionError::RateLimited {
                retry_after_secs: 5,
            });
        }

        if status == 401 || status == 403 {
            return Err(CompletionError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }

        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Endpoint returned error");
            return Err(CompletionError::Api {
                status_code: status,
                message: error_body,
            });
        }

        let chat_response: ChatResponse =
            response.json().await.map_err(|e| CompletionError::Api {
                status_code: 200,
                message: format!("Failed to parse response: {e}"),
            })?;

        let choice = chat_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| CompletionError::Api {
                status_code: 200,
                message: "No choices in response".into(),
            })?;

        let text = choice.message.content.unwrap_or_default();
        let requests: Vec<ToolInvocationRequest> = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| ToolInvocationRequest {
                id: tc.id,
                name: tc.function.name,
                // Malformed argument JSON surfaces downstream as a missing
                // required argument, not as a transport failure.
                arguments: serde_json::from_str(&tc.function.arguments)
                    .unwrap_or(serde_json::Value::Null),
            })
            .collect();

        let output = if requests.is_empty() {
            ModelOutput::FinalText(text)
        } else {
            ModelOutput::ToolRequests { text, requests }
        };

        let usage = chat_response.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(CompletionResponse {
            output,
            model: chat_response.model,
            usage,
        })
    }

    async fn health_check(&self) -> std::result::Result<bool, CompletionError> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|e| CompletionError::Network(e.to_string()))?;

        Ok(response.status().is_success())
    }
}

// --- OpenAI API types (internal) ---

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ChatToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatToolCall {
    id: String,
    r#type: String,
    function: ChatFunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatFunctionCall {
    name: String,
    arguments: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatToolDef {
    r#type: String,
    function: ChatToolSpec,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatToolSpec {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    model: String,
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}
