//! Session management — one transcript per session, no shared state.

use std::sync::Arc;
use tether_core::completion::{CompletionGateway, GenerationParams, WireTurn};
use tether_core::error::Error;
use tether_core::retrieval::RetrievalGateway;
use tether_core::tool::{ToolDescriptor, retrieval_tool};
use tether_core::turn::{DEFAULT_MAX_TURNS, Transcript, Turn};
use tracing::info;

use crate::orchestrator::TurnOrchestrator;

/// A chat session: owns exactly one transcript and drives the
/// append → prune → orchestrate → append cycle for each user turn.
///
/// Sessions are independent values. Gateways are shared immutably behind
/// `Arc`; concurrent sessions share no mutable state.
pub struct ChatSession {
    transcript: Transcript,
    orchestrator: TurnOrchestrator,
    tools: Vec<ToolDescriptor>,
    system_prompt: Option<String>,
    max_turns: usize,
}

impl ChatSession {
    /// Create a new session with a fresh transcript.
    pub fn new(
        completion: Arc<dyn CompletionGateway>,
        retrieval: Arc<dyn RetrievalGateway>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            transcript: Transcript::new(),
            orchestrator: TurnOrchestrator::new(completion, retrieval, model),
            tools: vec![retrieval_tool()],
            system_prompt: None,
            max_turns: DEFAULT_MAX_TURNS,
        }
    }

    /// Set the persona preamble sent as the wire system turn.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Set the maximum retained user/assistant turns.
    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns;
        self
    }

    /// Set the generation parameters.
    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.orchestrator = self.orchestrator.with_params(params);
        self
    }

    /// Set the per-dispatch retrieval document count.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.orchestrator = self.orchestrator.with_top_k(top_k);
        self
    }

    /// Process one user turn and return the final answer.
    ///
    /// On failure the user turn stays appended and no assistant turn is
    /// added — the transcript is never corrupted by a failed cycle. Only
    /// user and assistant turns are durable; the tool round's intermediate
    /// turns live in the wire conversation and are discarded.
    pub async fn send(&mut self, user_text: impl Into<String>) -> Result<String, Error> {
        self.transcript.append(Turn::user(user_text));
        self.transcript.prune(self.max_turns);

        info!(
            transcript_id = %self.transcript.id,
            turns = self.transcript.turns.len(),
            "Processing user turn"
        );

        let mut turns = Vec::with_capacity(self.transcript.turns.len() + 1);
        if let Some(prompt) = &self.system_prompt {
            turns.push(WireTurn::system(prompt));
        }
        turns.extend(self.transcript.wire_format());

        let answer = self.orchestrator.run_turn(turns, &self.tools).await?;

        self.transcript.append(Turn::assistant(&answer));
        Ok(answer)
    }

    /// The session's transcript.
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }
}
