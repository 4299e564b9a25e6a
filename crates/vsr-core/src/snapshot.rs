#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Action, ActionError, ActionOutcome, AgentId, Body, BodyId, Point};

/// A point-to-point near-field message.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NfcMessage {
    pub emitter: BodyId,
    pub source: Point,
    pub direction: f64,
    pub channel: u16,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ActionFailure {
    pub agent: Option<AgentId>,
    pub action: Action,
    pub error: ActionError,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AgentSummary {
    pub id: AgentId,
    pub body_parts: Vec<BodyId>,
}

/// Everything observable about the world after one tick.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Snapshot {
    pub t: f64,
    pub bodies: Vec<Body>,
    pub agents: Vec<AgentSummary>,
    /// Every performed action, nested ones included, in completion order.
    pub outcomes: Vec<ActionOutcome>,
    pub failures: Vec<ActionFailure>,
    pub nfc_messages: Vec<NfcMessage>,
}

impl Snapshot {
    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.iter().find(|b| b.id == id)
    }

    /// The part of this snapshot concerning a single agent: its outcomes and
    /// its bodies. Messages are kept whole.
    pub fn for_agent(&self, agent: AgentId) -> Option<Snapshot> {
        let summary = self.agents.iter().find(|a| a.id == agent)?;
        Some(Snapshot {
            t: self.t,
            bodies: self
                .bodies
                .iter()
                .filter(|b| summary.body_parts.contains(&b.id))
                .cloned()
                .collect(),
            agents: vec![summary.clone()],
            outcomes: self
                .outcomes
                .iter()
                .filter(|o| o.agent == Some(agent))
                .cloned()
                .collect(),
            failures: self
                .failures
                .iter()
                .filter(|f| f.agent == Some(agent))
                .cloned()
                .collect(),
            nfc_messages: self.nfc_messages.clone(),
        })
    }
}
