//! Agent-to-agent message envelope.
//!
//! Other agents call Kratos with a `REQUEST` envelope whose `content.query`
//! holds the question; the reply is an `INFORM` envelope carrying the answer.

use serde::{Deserialize, Serialize};

/// Speech act carried by an envelope.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Performative {
    Request,
    Inform,
    Propose,
    Failure,
    NotUnderstood,
}

/// An envelope exchanged between agents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentMessage {
    pub sender: String,
    pub receiver: String,
    pub performative: Performative,
    pub content: serde_json::Value,
    #[serde(alias = "conversationId")]
    pub conversation_id: String,
}

impl AgentMessage {
    /// The `content.query` string, if the envelope carries one.
    pub fn query(&self) -> Option<&str> {
        self.content
            .get("query")
            .and_then(|q| q.as_str())
            .map(str::trim)
            .filter(|q| !q.is_empty())
    }

    /// Build a reply addressed back to the sender of `self`.
    pub fn reply(&self, sender: &str, performative: Performative, content: serde_json::Value) -> Self {
        Self {
            sender: sender.to_string(),
            receiver: self.sender.clone(),
            performative,
            content,
            conversation_id: self.conversation_id.clone(),
        }
    }
}

/// Capability manifest advertised to other agents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Manifest {
    pub agent_id: String,
    pub capabilities: Vec<String>,
    pub protocol: String,
}
