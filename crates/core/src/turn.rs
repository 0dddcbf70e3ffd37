//! Turn and Transcript domain types.
//!
//! These are the value objects the orchestration loop works over:
//! the user speaks → a Turn is appended → the transcript is pruned →
//! the wire conversation goes to the completion gateway → the final
//! assistant Turn is appended.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default retained transcript size: 20 turns, i.e. 10 exchanged pairs.
pub const DEFAULT_MAX_TURNS: usize = 20;

/// The role of a turn's author.
///
/// `User` and `Assistant` are the durable conversation roles. `System`
/// carries the persona preamble on the wire, and `Tool` carries synthetic
/// tool-result turns within one orchestration cycle; neither is retained
/// in a session's durable transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user
    User,
    /// The assistant
    Assistant,
    /// Wire-level persona preamble
    System,
    /// Tool invocation result
    Tool,
}

/// A single turn in a conversation. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// Unique turn ID
    pub id: String,

    /// Who authored this turn
    pub role: Role,

    /// The text content
    pub text: String,

    /// If this is a tool result, which invocation it answers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invocation_id: Option<String>,

    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    /// Create a new user turn.
    pub fn user(text: impl Into<String>) -> Self {
        Self::with_role(Role::User, text)
    }

    /// Create a new assistant turn.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::with_role(Role::Assistant, text)
    }

    /// Create a system turn.
    pub fn system(text: impl Into<String>) -> Self {
        Self::with_role(Role::System, text)
    }

    /// Create a tool-result turn bound to an invocation id.
    pub fn tool_result(invocation_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: Role::Tool,
            text: text.into(),
            invocation_id: Some(invocation_id.into()),
            timestamp: Utc::now(),
        }
    }

    fn with_role(role: Role, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            text: text.into(),
            invocation_id: None,
            timestamp: Utc::now(),
        }
    }
}

/// An ordered sequence of turns, owned exclusively by one session.
///
/// Insertion order is the temporal and semantic order and is preserved.
/// After each append-and-prune cycle the retained user/assistant turn
/// count is bounded by the configured maximum; pruning removes from the
/// oldest end only, by conversational exchange boundaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    /// Unique transcript ID (used for log correlation)
    pub id: String,

    /// Ordered turns
    pub turns: Vec<Turn>,

    /// When this transcript was created
    pub created_at: DateTime<Utc>,

    /// When the last turn was appended
    pub updated_at: DateTime<Utc>,
}

impl Transcript {
    /// Create a new empty transcript.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            turns: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Append a turn at the end.
    pub fn append(&mut self, turn: Turn) {
        self.updated_at = Utc::now();
        self.turns.push(turn);
    }

    /// Number of logical (user/assistant) turns held.
    pub fn logical_len(&self) -> usize {
        self.turns
            .iter()
            .filter(|t| matches!(t.role, Role::User | Role::Assistant))
            .count()
    }

    /// Drop the oldest turns until at most `max_turns` logical turns remain.
    ///
    /// Removal walks conversational exchange boundaries: an exchange starts
    /// at a user turn and runs to the next user turn. An orphaned non-user
    /// prefix is dropped first, then whole oldest exchanges. The head is
    /// therefore always a user turn after any removal, regardless of
    /// interleaved tool or system turns. Idempotent: a compliant transcript
    /// is untouched. The in-flight tail is never removed — if the oldest
    /// exchange is the entire transcript, pruning stops.
    pub fn prune(&mut self, max_turns: usize) {
        while self.logical_len() > max_turns {
            let Some(first_user) = self.turns.iter().position(|t| t.role == Role::User) else {
                break;
            };
            if first_user > 0 {
                self.turns.drain(..first_user);
                continue;
            }
            let next_user = self.turns[1..]
                .iter()
                .position(|t| t.role == Role::User)
                .map(|i| i + 1);
            let Some(next_user) = next_user else {
                break;
            };
            self.turns.drain(..next_user);
        }
    }

    /// Translate to the ordered wire turns the completion gateway expects.
    ///
    /// Pure; no side effects.
    pub fn wire_format(&self) -> Vec<crate::completion::WireTurn> {
        self.turns
            .iter()
            .map(crate::completion::WireTurn::from_turn)
            .collect()
    }

    /// Rough token count estimate (4 chars ≈ 1 token).
    pub fn estimated_tokens(&self) -> usize {
        self.turns.iter().map(|t| t.text.len() / 4).sum()
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}
