#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{AgentId, AnchorId, BodyId, DoubleRange, Link, LinkType, Material, Motor, Point, Poly};

/// Stable discriminant of an [`Action`], used as the solver-table key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ActionKind {
    CreateRigidBody,
    CreateUnmovableBody,
    CreateVoxel,
    CreateRotationalJoint,
    TranslateBody,
    AttachAnchor,
    LinkAnchors,
    DetachAnchor,
    DetachAnchorFromAnchorable,
    AttractAnchor,
    ActuateVoxel,
    ActuateRotationalJoint,
    RemoveBody,
    EmitNfcMessage,
    Sense,
    SenseVelocity,
    SenseAreaRatio,
    SenseAngle,
    SenseNfc,
    SenseJointAngle,
    CreateAndTranslateRigidBody,
    CreateAndTranslateVoxel,
    TranslateBodies,
    AttractAndLinkAnchor,
    AttractAndLinkAnchorable,
    DetachAnchorsFromAnchorable,
    DetachAllAnchors,
}

impl ActionKind {
    /// The more generic kind whose solver handles this one when no exact
    /// solver is registered.
    pub fn parent(self) -> Option<ActionKind> {
        match self {
            ActionKind::SenseVelocity
            | ActionKind::SenseAreaRatio
            | ActionKind::SenseAngle
            | ActionKind::SenseNfc
            | ActionKind::SenseJointAngle => Some(ActionKind::Sense),
            _ => None,
        }
    }

    pub fn is_composite(self) -> bool {
        matches!(
            self,
            ActionKind::CreateAndTranslateRigidBody
                | ActionKind::CreateAndTranslateVoxel
                | ActionKind::TranslateBodies
                | ActionKind::AttractAndLinkAnchor
                | ActionKind::AttractAndLinkAnchorable
                | ActionKind::DetachAnchorsFromAnchorable
                | ActionKind::DetachAllAnchors
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SenseKind {
    /// Velocity projected on the unit vector at `direction`.
    Velocity { direction: f64 },
    AreaRatio,
    Angle,
    Nfc {
        displacement: Point,
        direction: f64,
        channel: u16,
    },
    /// Current angle of a rotational joint.
    JointAngle,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SenseAction {
    pub body: BodyId,
    pub kind: SenseKind,
}

impl SenseAction {
    pub fn new(body: BodyId, kind: SenseKind) -> Self {
        Self { body, kind }
    }

    /// Declared range of the reading. Readings may fall outside it.
    pub fn range(&self) -> DoubleRange {
        match self.kind {
            SenseKind::Velocity { .. } => DoubleRange::new(-10.0, 10.0),
            SenseKind::AreaRatio => DoubleRange::new(0.5, 1.5),
            SenseKind::Angle | SenseKind::JointAngle => {
                DoubleRange::new(-core::f64::consts::PI, core::f64::consts::PI)
            }
            SenseKind::Nfc { .. } => DoubleRange::SYMMETRIC_UNIT,
        }
    }

    pub fn action_kind(&self) -> ActionKind {
        match self.kind {
            SenseKind::Velocity { .. } => ActionKind::SenseVelocity,
            SenseKind::AreaRatio => ActionKind::SenseAreaRatio,
            SenseKind::Angle => ActionKind::SenseAngle,
            SenseKind::Nfc { .. } => ActionKind::SenseNfc,
            SenseKind::JointAngle => ActionKind::SenseJointAngle,
        }
    }
}

/// An immutable description of an intended effect.
///
/// Primitive variants are resolved by a solver registered for their
/// [`ActionKind`]. Composite variants resolve themselves by performing other
/// actions through the kernel and never touch the substrate.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Action {
    CreateRigidBody {
        poly: Poly,
        mass: f64,
    },
    CreateUnmovableBody {
        poly: Poly,
    },
    CreateVoxel {
        side_length: f64,
        mass: f64,
        material: Material,
    },
    /// Create a straight rotational joint with its minimum corner at the origin.
    CreateRotationalJoint {
        length: f64,
        width: f64,
        mass: f64,
        motor: Motor,
        active_angle_range: DoubleRange,
    },
    /// Move a body by a relative displacement.
    TranslateBody {
        body: BodyId,
        translation: Point,
    },
    /// Link `anchor` to the nearest eligible anchor of `anchorable`.
    AttachAnchor {
        anchor: AnchorId,
        anchorable: BodyId,
        link_type: LinkType,
    },
    LinkAnchors {
        source: AnchorId,
        destination: AnchorId,
        link_type: LinkType,
    },
    DetachAnchor {
        source: AnchorId,
        destination: AnchorId,
    },
    DetachAnchorFromAnchorable {
        anchor: AnchorId,
        anchorable: BodyId,
    },
    /// Pull two anchors together for the current tick only.
    AttractAnchor {
        source: AnchorId,
        destination: AnchorId,
        magnitude: f64,
    },
    ActuateVoxel {
        voxel: BodyId,
        value: f64,
    },
    /// Set a joint's target angle; `value` in `[-1, 1]` spans its active range.
    ActuateRotationalJoint {
        joint: BodyId,
        value: f64,
    },
    RemoveBody {
        body: BodyId,
    },
    EmitNfcMessage {
        body: BodyId,
        displacement: Point,
        direction: f64,
        channel: u16,
        value: f64,
    },
    Sense(SenseAction),
    /// Create a rigid body with its bounding-box minimum at `position`.
    CreateAndTranslateRigidBody {
        poly: Poly,
        mass: f64,
        position: Point,
    },
    /// Create a voxel with its bounding-box minimum at `position`.
    CreateAndTranslateVoxel {
        side_length: f64,
        mass: f64,
        material: Material,
        position: Point,
    },
    /// Move `bodies` rigidly so that their enclosing box minimum lands at `position`.
    TranslateBodies {
        bodies: Vec<BodyId>,
        position: Point,
    },
    AttractAndLinkAnchor {
        source: AnchorId,
        destination: AnchorId,
        magnitude: f64,
        link_type: LinkType,
    },
    AttractAndLinkAnchorable {
        anchors: Vec<AnchorId>,
        anchorable: BodyId,
        magnitude: f64,
        link_type: LinkType,
    },
    DetachAnchorsFromAnchorable {
        source: BodyId,
        target: BodyId,
    },
    DetachAllAnchors {
        anchorable: BodyId,
    },
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::CreateRigidBody { .. } => ActionKind::CreateRigidBody,
            Action::CreateUnmovableBody { .. } => ActionKind::CreateUnmovableBody,
            Action::CreateVoxel { .. } => ActionKind::CreateVoxel,
            Action::CreateRotationalJoint { .. } => ActionKind::CreateRotationalJoint,
            Action::TranslateBody { .. } => ActionKind::TranslateBody,
            Action::AttachAnchor { .. } => ActionKind::AttachAnchor,
            Action::LinkAnchors { .. } => ActionKind::LinkAnchors,
            Action::DetachAnchor { .. } => ActionKind::DetachAnchor,
            Action::DetachAnchorFromAnchorable { .. } => ActionKind::DetachAnchorFromAnchorable,
            Action::AttractAnchor { .. } => ActionKind::AttractAnchor,
            Action::ActuateVoxel { .. } => ActionKind::ActuateVoxel,
            Action::ActuateRotationalJoint { .. } => ActionKind::ActuateRotationalJoint,
            Action::RemoveBody { .. } => ActionKind::RemoveBody,
            Action::EmitNfcMessage { .. } => ActionKind::EmitNfcMessage,
            Action::Sense(sense) => sense.action_kind(),
            Action::CreateAndTranslateRigidBody { .. } => ActionKind::CreateAndTranslateRigidBody,
            Action::CreateAndTranslateVoxel { .. } => ActionKind::CreateAndTranslateVoxel,
            Action::TranslateBodies { .. } => ActionKind::TranslateBodies,
            Action::AttractAndLinkAnchor { .. } => ActionKind::AttractAndLinkAnchor,
            Action::AttractAndLinkAnchorable { .. } => ActionKind::AttractAndLinkAnchorable,
            Action::DetachAnchorsFromAnchorable { .. } => ActionKind::DetachAnchorsFromAnchorable,
            Action::DetachAllAnchors { .. } => ActionKind::DetachAllAnchors,
        }
    }

    pub fn is_composite(&self) -> bool {
        self.kind().is_composite()
    }

    pub fn sense(&self) -> Option<&SenseAction> {
        match self {
            Action::Sense(sense) => Some(sense),
            _ => None,
        }
    }

    pub fn sense_velocity(body: BodyId, direction: f64) -> Self {
        Action::Sense(SenseAction::new(body, SenseKind::Velocity { direction }))
    }

    pub fn sense_area_ratio(body: BodyId) -> Self {
        Action::Sense(SenseAction::new(body, SenseKind::AreaRatio))
    }

    pub fn sense_angle(body: BodyId) -> Self {
        Action::Sense(SenseAction::new(body, SenseKind::Angle))
    }

    pub fn sense_joint_angle(joint: BodyId) -> Self {
        Action::Sense(SenseAction::new(joint, SenseKind::JointAngle))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LinkOutcome {
    pub source: AnchorId,
    pub destination: AnchorId,
    /// Separation at the moment of attraction.
    pub distance: f64,
    /// The link created by this action, if any.
    pub link: Option<Link>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ActionValue {
    Body(BodyId),
    Bodies(Vec<BodyId>),
    Anchor(AnchorId),
    Link(Link),
    Links(Vec<Link>),
    Scalar(f64),
    LinkOutcome(LinkOutcome),
    LinkOutcomes(Vec<LinkOutcome>),
    Unit,
}

/// An action paired with the value it produced.
///
/// `value == None` is an accepted-but-empty result, not a failure.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ActionOutcome {
    pub agent: Option<AgentId>,
    pub action: Action,
    pub value: Option<ActionValue>,
}

impl ActionOutcome {
    pub fn new(agent: Option<AgentId>, action: Action, value: Option<ActionValue>) -> Self {
        Self {
            agent,
            action,
            value,
        }
    }

    pub fn kind(&self) -> ActionKind {
        self.action.kind()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_none()
    }

    pub fn scalar(&self) -> Option<f64> {
        match self.value {
            Some(ActionValue::Scalar(v)) => Some(v),
            _ => None,
        }
    }

    pub fn body(&self) -> Option<BodyId> {
        match self.value {
            Some(ActionValue::Body(id)) => Some(id),
            _ => None,
        }
    }

    pub fn link(&self) -> Option<Link> {
        match self.value {
            Some(ActionValue::Link(link)) => Some(link),
            _ => None,
        }
    }

    pub fn links(&self) -> &[Link] {
        match &self.value {
            Some(ActionValue::Links(links)) => links,
            _ => &[],
        }
    }

    pub fn link_outcomes(&self) -> &[LinkOutcome] {
        match &self.value {
            Some(ActionValue::LinkOutcomes(outcomes)) => outcomes,
            _ => &[],
        }
    }
}
