use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Action, ActionError, ActionOutcome, ActionPerformer, BodyId};

/// Stable identifier for an agent, assigned in registration order.
///
/// Agents are polled in ascending id order, so the id doubles as the
/// deterministic polling key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AgentId(pub u32);

impl AgentId {
    pub fn stable_id(self) -> u64 {
        self.0 as u64
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "agent#{}", self.0)
    }
}

pub trait Agent: 'static {
    /// Actions for the tick at time `t`.
    ///
    /// `previous` holds one outcome per action returned by the previous call,
    /// in the same order. Failed actions appear with an empty value.
    fn act(&mut self, t: f64, previous: &[ActionOutcome]) -> Vec<Action>;

    /// Bodies owned by this agent. Disembodied agents own none.
    fn body_parts(&self) -> Vec<BodyId> {
        Vec::new()
    }
}

/// An agent made of bodies it creates itself through the kernel.
pub trait EmbodiedAgent: Agent {
    fn assemble(&mut self, performer: &mut dyn ActionPerformer) -> Result<(), ActionError>;
}
