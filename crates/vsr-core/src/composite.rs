//! Resolution of composite actions.
//!
//! Composites only ever act through an [`ActionPerformer`]: every step they
//! take is itself a dispatched action with its own outcome. A failed
//! prerequisite fails the composite, and earlier steps stay applied.

use crate::{
    Action, ActionError, ActionKind, ActionPerformer, ActionValue, AgentId, AnchorId, BodyId,
    BoundingBox, LinkOutcome, LinkType, Point,
};

type Resolved = Result<Option<ActionValue>, ActionError>;

pub(crate) fn resolve(action: &Action, performer: &mut dyn ActionPerformer, agent: Option<AgentId>) -> Resolved {
    let kind = action.kind();
    match action {
        Action::CreateAndTranslateRigidBody { poly, mass, position } => {
            let create = Action::CreateRigidBody {
                poly: poly.clone(),
                mass: *mass,
            };
            create_and_translate(performer, kind, create, *position, agent)
        }
        Action::CreateAndTranslateVoxel {
            side_length,
            mass,
            material,
            position,
        } => {
            let create = Action::CreateVoxel {
                side_length: *side_length,
                mass: *mass,
                material: *material,
            };
            create_and_translate(performer, kind, create, *position, agent)
        }
        Action::TranslateBodies { bodies, position } => translate_bodies(performer, kind, bodies, *position, agent),
        Action::AttractAndLinkAnchor {
            source,
            destination,
            magnitude,
            link_type,
        } => {
            let outcome = attract_and_link(performer, *source, *destination, *magnitude, *link_type, agent)?;
            Ok(Some(ActionValue::LinkOutcome(outcome)))
        }
        Action::AttractAndLinkAnchorable {
            anchors,
            anchorable,
            magnitude,
            link_type,
        } => attract_and_link_anchorable(performer, kind, anchors, *anchorable, *magnitude, *link_type, agent),
        Action::DetachAnchorsFromAnchorable { source, target } => {
            let sources = anchors_of(performer, kind, *source)?;
            if !performer.bodies().contains(*target) {
                return Err(ActionError::UnknownBody { kind, body: *target });
            }
            let pairs = sources.into_iter().map(|anchor| (anchor, *target)).collect();
            detach_pairs(performer, pairs, agent)
        }
        Action::DetachAllAnchors { anchorable } => {
            let sources = anchors_of(performer, kind, *anchorable)?;
            let pairs = sources
                .into_iter()
                .flat_map(|anchor| {
                    performer
                        .bodies()
                        .attached_bodies(anchor)
                        .into_iter()
                        .map(move |body| (anchor, body))
                })
                .collect();
            detach_pairs(performer, pairs, agent)
        }
        _ => Err(ActionError::undoable(kind, "not a composite action")),
    }
}

fn anchors_of(performer: &dyn ActionPerformer, kind: ActionKind, body: BodyId) -> Result<Vec<AnchorId>, ActionError> {
    if !performer.bodies().contains(body) {
        return Err(ActionError::UnknownBody { kind, body });
    }
    Ok(performer.bodies().anchor_ids(body))
}

fn create_and_translate(
    performer: &mut dyn ActionPerformer,
    kind: ActionKind,
    create: Action,
    position: Point,
    agent: Option<AgentId>,
) -> Resolved {
    let body = performer
        .perform(create, agent)?
        .body()
        .ok_or_else(|| ActionError::undoable(kind, "body creation produced no body"))?;
    let min = performer
        .bodies()
        .get(body)
        .map(|b| b.bounding_box().min)
        .ok_or(ActionError::UnknownBody { kind, body })?;
    performer.perform(
        Action::TranslateBody {
            body,
            translation: position - min,
        },
        agent,
    )?;
    Ok(Some(ActionValue::Body(body)))
}

fn translate_bodies(
    performer: &mut dyn ActionPerformer,
    kind: ActionKind,
    bodies: &[BodyId],
    position: Point,
    agent: Option<AgentId>,
) -> Resolved {
    let mut boxes = Vec::with_capacity(bodies.len());
    for &body in bodies {
        let b = performer
            .bodies()
            .get(body)
            .ok_or(ActionError::UnknownBody { kind, body })?;
        boxes.push(b.bounding_box());
    }
    let Some(enclosing) = BoundingBox::enclosing(boxes) else {
        return Ok(None);
    };
    let translation = position - enclosing.min;
    for &body in bodies {
        performer.perform(Action::TranslateBody { body, translation }, agent)?;
    }
    Ok(Some(ActionValue::Bodies(bodies.to_vec())))
}

fn attract_and_link(
    performer: &mut dyn ActionPerformer,
    source: AnchorId,
    destination: AnchorId,
    magnitude: f64,
    link_type: LinkType,
    agent: Option<AgentId>,
) -> Result<LinkOutcome, ActionError> {
    let distance = performer
        .perform(
            Action::AttractAnchor {
                source,
                destination,
                magnitude,
            },
            agent,
        )?
        .scalar()
        .unwrap_or(0.0);
    let link = if performer.bodies().is_anchored_to(source, destination) {
        None
    } else {
        performer
            .perform(
                Action::LinkAnchors {
                    source,
                    destination,
                    link_type,
                },
                agent,
            )?
            .link()
    };
    Ok(LinkOutcome {
        source,
        destination,
        distance,
        link,
    })
}

fn attract_and_link_anchorable(
    performer: &mut dyn ActionPerformer,
    kind: ActionKind,
    anchors: &[AnchorId],
    anchorable: BodyId,
    magnitude: f64,
    link_type: LinkType,
    agent: Option<AgentId>,
) -> Resolved {
    if !performer.bodies().contains(anchorable) {
        return Err(ActionError::UnknownBody { kind, body: anchorable });
    }
    let free: Vec<AnchorId> = anchors
        .iter()
        .copied()
        .filter(|a| !performer.bodies().is_anchored_to_body(*a, anchorable))
        .collect();
    let pairs = performer.bodies().match_nearest(&free, anchorable);
    let mut outcomes = Vec::with_capacity(pairs.len());
    for (source, destination) in pairs {
        let outcome = performer
            .perform(
                Action::AttractAndLinkAnchor {
                    source,
                    destination,
                    magnitude,
                    link_type,
                },
                agent,
            )?
            .value;
        if let Some(ActionValue::LinkOutcome(outcome)) = outcome {
            outcomes.push(outcome);
        }
    }
    Ok(Some(ActionValue::LinkOutcomes(outcomes)))
}

fn detach_pairs(
    performer: &mut dyn ActionPerformer,
    pairs: Vec<(AnchorId, BodyId)>,
    agent: Option<AgentId>,
) -> Resolved {
    let mut removed = Vec::new();
    for (anchor, anchorable) in pairs {
        let outcome = performer.perform(Action::DetachAnchorFromAnchorable { anchor, anchorable }, agent)?;
        removed.extend_from_slice(outcome.links());
    }
    Ok(Some(ActionValue::Links(removed)))
}
