#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{ActionKind, AnchorId, BodyId};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ActionError {
    #[error("no solver registered for {kind:?} or any of its parents")]
    Unresolvable { kind: ActionKind },

    #[error("cannot perform {kind:?}: {cause}")]
    Undoable { kind: ActionKind, cause: String },

    #[error("illegal {kind:?} on {body} body: {reason}")]
    Illegal {
        kind: ActionKind,
        body: String,
        reason: String,
    },

    #[error("{kind:?} references {body}, which is not in the registry")]
    UnknownBody { kind: ActionKind, body: BodyId },

    #[error("{kind:?} references {anchor}, which does not exist")]
    UnknownAnchor { kind: ActionKind, anchor: AnchorId },

    #[error("{kind:?} exceeds the maximum dispatch depth of {depth}")]
    DepthExceeded { kind: ActionKind, depth: usize },
}

impl ActionError {
    pub fn kind(&self) -> ActionKind {
        match self {
            ActionError::Unresolvable { kind }
            | ActionError::Undoable { kind, .. }
            | ActionError::Illegal { kind, .. }
            | ActionError::UnknownBody { kind, .. }
            | ActionError::UnknownAnchor { kind, .. }
            | ActionError::DepthExceeded { kind, .. } => *kind,
        }
    }

    pub(crate) fn undoable(kind: ActionKind, cause: impl Into<String>) -> Self {
        ActionError::Undoable {
            kind,
            cause: cause.into(),
        }
    }

    pub(crate) fn illegal(kind: ActionKind, body: &str, reason: impl Into<String>) -> Self {
        ActionError::Illegal {
            kind,
            body: body.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TickError {
    #[error("tick at t={t} aborted")]
    Aborted {
        t: f64,
        #[source]
        source: ActionError,
    },

    #[error("agent assembly failed")]
    Assembly(#[source] ActionError),
}
