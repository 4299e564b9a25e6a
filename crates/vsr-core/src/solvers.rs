//! Default solvers for every primitive action.
//!
//! Each solver validates its handles against the registry, delegates the
//! physical part to the [`Substrate`] and reports the produced value.

use tracing::debug;

use crate::{
    sense, Action, ActionError, ActionKind, ActionPerformer, ActionValue, AgentId, AnchorId, Body,
    BodyId, BodyKind, DoubleRange, Engine, NfcMessage, Point, Poly, SolverRegistry, Substrate,
};

type Solved = Result<Option<ActionValue>, ActionError>;

pub fn register_defaults<S: Substrate>(registry: &mut SolverRegistry<S>) {
    registry.register(ActionKind::CreateRigidBody, create_rigid_body::<S>);
    registry.register(ActionKind::CreateUnmovableBody, create_unmovable_body::<S>);
    registry.register(ActionKind::CreateVoxel, create_voxel::<S>);
    registry.register(ActionKind::CreateRotationalJoint, create_rotational_joint::<S>);
    registry.register(ActionKind::TranslateBody, translate_body::<S>);
    registry.register(ActionKind::AttachAnchor, attach_anchor::<S>);
    registry.register(ActionKind::LinkAnchors, link_anchors::<S>);
    registry.register(ActionKind::DetachAnchor, detach_anchor::<S>);
    registry.register(ActionKind::DetachAnchorFromAnchorable, detach_anchor_from_anchorable::<S>);
    registry.register(ActionKind::AttractAnchor, attract_anchor::<S>);
    registry.register(ActionKind::ActuateVoxel, actuate_voxel::<S>);
    registry.register(ActionKind::ActuateRotationalJoint, actuate_rotational_joint::<S>);
    registry.register(ActionKind::RemoveBody, remove_body::<S>);
    registry.register(ActionKind::EmitNfcMessage, emit_nfc_message::<S>);
    registry.register(ActionKind::Sense, read_sensor::<S>);
}

fn mismatch(action: &Action) -> ActionError {
    ActionError::undoable(action.kind(), "solver received an action of another kind")
}

fn require_body<S: Substrate>(engine: &Engine<S>, kind: ActionKind, body: BodyId) -> Result<(), ActionError> {
    if engine.bodies.contains(body) {
        Ok(())
    } else {
        Err(ActionError::UnknownBody { kind, body })
    }
}

fn require_anchor<S: Substrate>(
    engine: &Engine<S>,
    kind: ActionKind,
    anchor: AnchorId,
) -> Result<Point, ActionError> {
    engine
        .bodies
        .anchor_point(anchor)
        .ok_or(ActionError::UnknownAnchor { kind, anchor })
}

/// Every vertex carries an anchor, so the vertex count is bounded by the
/// anchor index type.
fn require_addressable(kind: ActionKind, body: &str, poly: &Poly) -> Result<(), ActionError> {
    if poly.len() > Body::MAX_ANCHORS {
        return Err(ActionError::illegal(
            kind,
            body,
            format!("{} vertices exceed the {} addressable anchors", poly.len(), Body::MAX_ANCHORS),
        ));
    }
    Ok(())
}

fn create_rigid_body<S: Substrate>(engine: &mut Engine<S>, action: &Action, _: Option<AgentId>) -> Solved {
    let Action::CreateRigidBody { poly, mass } = action else {
        return Err(mismatch(action));
    };
    require_addressable(action.kind(), "rigid", poly)?;
    let (substrate, bodies) = engine.parts_mut();
    Ok(substrate
        .create_rigid_body(bodies, poly.clone(), *mass)
        .map(ActionValue::Body))
}

fn create_unmovable_body<S: Substrate>(engine: &mut Engine<S>, action: &Action, _: Option<AgentId>) -> Solved {
    let Action::CreateUnmovableBody { poly } = action else {
        return Err(mismatch(action));
    };
    require_addressable(action.kind(), "unmovable", poly)?;
    let (substrate, bodies) = engine.parts_mut();
    Ok(substrate
        .create_unmovable_body(bodies, poly.clone())
        .map(ActionValue::Body))
}

fn create_voxel<S: Substrate>(engine: &mut Engine<S>, action: &Action, _: Option<AgentId>) -> Solved {
    let Action::CreateVoxel {
        side_length,
        mass,
        material,
    } = action
    else {
        return Err(mismatch(action));
    };
    let (substrate, bodies) = engine.parts_mut();
    Ok(substrate
        .create_voxel(bodies, *side_length, *mass, *material)
        .map(ActionValue::Body))
}

fn create_rotational_joint<S: Substrate>(engine: &mut Engine<S>, action: &Action, _: Option<AgentId>) -> Solved {
    let Action::CreateRotationalJoint {
        length,
        width,
        mass,
        motor,
        active_angle_range,
    } = action
    else {
        return Err(mismatch(action));
    };
    let (substrate, bodies) = engine.parts_mut();
    Ok(substrate
        .create_rotational_joint(bodies, *length, *width, *mass, *motor, *active_angle_range)
        .map(ActionValue::Body))
}

fn translate_body<S: Substrate>(engine: &mut Engine<S>, action: &Action, _: Option<AgentId>) -> Solved {
    let Action::TranslateBody { body, translation } = action else {
        return Err(mismatch(action));
    };
    let kind = action.kind();
    let target = engine
        .bodies
        .get(*body)
        .ok_or(ActionError::UnknownBody { kind, body: *body })?;
    if !target.is_movable() {
        return Err(ActionError::illegal(kind, target.kind.name(), "body cannot be translated"));
    }
    let (substrate, bodies) = engine.parts_mut();
    substrate.translate(bodies, *body, *translation);
    Ok(Some(ActionValue::Body(*body)))
}

fn attach_anchor<S: Substrate>(engine: &mut Engine<S>, action: &Action, _: Option<AgentId>) -> Solved {
    let Action::AttachAnchor {
        anchor,
        anchorable,
        link_type,
    } = action
    else {
        return Err(mismatch(action));
    };
    let kind = action.kind();
    require_anchor(engine, kind, *anchor)?;
    require_body(engine, kind, *anchorable)?;
    let Some(destination) = engine.bodies.nearest_eligible_anchor(*anchor, *anchorable) else {
        return Ok(None);
    };
    let Some(link) = engine.bodies.link(*anchor, destination, *link_type) else {
        return Ok(None);
    };
    engine.substrate.attach_anchor(&engine.bodies, link);
    Ok(Some(ActionValue::Link(link)))
}

fn link_anchors<S: Substrate>(engine: &mut Engine<S>, action: &Action, _: Option<AgentId>) -> Solved {
    let Action::LinkAnchors {
        source,
        destination,
        link_type,
    } = action
    else {
        return Err(mismatch(action));
    };
    let kind = action.kind();
    require_anchor(engine, kind, *source)?;
    require_anchor(engine, kind, *destination)?;
    let Some(link) = engine.bodies.link(*source, *destination, *link_type) else {
        return Ok(None);
    };
    engine.substrate.attach_anchor(&engine.bodies, link);
    Ok(Some(ActionValue::Link(link)))
}

fn detach_anchor<S: Substrate>(engine: &mut Engine<S>, action: &Action, _: Option<AgentId>) -> Solved {
    let Action::DetachAnchor { source, destination } = action else {
        return Err(mismatch(action));
    };
    require_anchor(engine, action.kind(), *source)?;
    let Some(link) = engine.bodies.unlink(*source, *destination) else {
        return Ok(None);
    };
    engine.substrate.detach_anchor(&engine.bodies, link);
    Ok(Some(ActionValue::Link(link)))
}

fn detach_anchor_from_anchorable<S: Substrate>(
    engine: &mut Engine<S>,
    action: &Action,
    _: Option<AgentId>,
) -> Solved {
    let Action::DetachAnchorFromAnchorable { anchor, anchorable } = action else {
        return Err(mismatch(action));
    };
    let kind = action.kind();
    require_anchor(engine, kind, *anchor)?;
    require_body(engine, kind, *anchorable)?;
    let mut removed = Vec::new();
    for destination in engine.bodies.anchor_ids(*anchorable) {
        if let Some(link) = engine.bodies.unlink(*anchor, destination) {
            engine.substrate.detach_anchor(&engine.bodies, link);
            removed.push(link);
        }
    }
    Ok((!removed.is_empty()).then_some(ActionValue::Links(removed)))
}

fn attract_anchor<S: Substrate>(engine: &mut Engine<S>, action: &Action, _: Option<AgentId>) -> Solved {
    let Action::AttractAnchor {
        source,
        destination,
        magnitude,
    } = action
    else {
        return Err(mismatch(action));
    };
    let kind = action.kind();
    let from = require_anchor(engine, kind, *source)?;
    let to = require_anchor(engine, kind, *destination)?;
    let separation = to - from;
    let distance = separation.magnitude();
    if distance > 0.0 {
        let force = separation / distance * (*magnitude * distance);
        engine.substrate.apply_force(&engine.bodies, source.body, force);
        engine.substrate.apply_force(&engine.bodies, destination.body, -force);
    }
    Ok(Some(ActionValue::Scalar(distance)))
}

fn actuate_voxel<S: Substrate>(engine: &mut Engine<S>, action: &Action, _: Option<AgentId>) -> Solved {
    let Action::ActuateVoxel { voxel, value } = action else {
        return Err(mismatch(action));
    };
    let kind = action.kind();
    let body = engine
        .bodies
        .get(*voxel)
        .ok_or(ActionError::UnknownBody { kind, body: *voxel })?;
    if !matches!(body.kind, BodyKind::Voxel(_)) {
        return Err(ActionError::illegal(kind, body.kind.name(), "only voxels can be actuated"));
    }
    let value = DoubleRange::SYMMETRIC_UNIT.clip(*value);
    let (substrate, bodies) = engine.parts_mut();
    substrate.actuate_voxel(bodies, *voxel, value);
    Ok(Some(ActionValue::Scalar(value)))
}

fn actuate_rotational_joint<S: Substrate>(engine: &mut Engine<S>, action: &Action, _: Option<AgentId>) -> Solved {
    let Action::ActuateRotationalJoint { joint, value } = action else {
        return Err(mismatch(action));
    };
    let kind = action.kind();
    let body = engine
        .bodies
        .get(*joint)
        .ok_or(ActionError::UnknownBody { kind, body: *joint })?;
    let Some(state) = body.joint_state() else {
        return Err(ActionError::illegal(kind, body.kind.name(), "only rotational joints can be rotated"));
    };
    let value = DoubleRange::SYMMETRIC_UNIT.clip(*value);
    let target = state.active_angle_range.denormalize((value + 1.0) / 2.0);
    let (substrate, bodies) = engine.parts_mut();
    substrate.actuate_rotational_joint(bodies, *joint, target);
    Ok(Some(ActionValue::Scalar(target)))
}

fn remove_body<S: Substrate>(engine: &mut Engine<S>, action: &Action, agent: Option<AgentId>) -> Solved {
    let Action::RemoveBody { body } = action else {
        return Err(mismatch(action));
    };
    require_body(engine, action.kind(), *body)?;
    engine.perform(Action::DetachAllAnchors { anchorable: *body }, agent)?;
    let (substrate, bodies) = engine.parts_mut();
    match substrate.remove_body(bodies, *body) {
        Some(removed) => {
            debug!(body = %removed.id, kind = removed.kind.name(), "body removed");
            Ok(Some(ActionValue::Body(removed.id)))
        }
        None => Ok(None),
    }
}

fn emit_nfc_message<S: Substrate>(engine: &mut Engine<S>, action: &Action, _: Option<AgentId>) -> Solved {
    let Action::EmitNfcMessage {
        body,
        displacement,
        direction,
        channel,
        value,
    } = action
    else {
        return Err(mismatch(action));
    };
    let kind = action.kind();
    let source = engine
        .bodies
        .get(*body)
        .ok_or(ActionError::UnknownBody { kind, body: *body })?
        .center()
        + *displacement;
    engine.nfc_messages.push(NfcMessage {
        emitter: *body,
        source,
        direction: *direction,
        channel: *channel,
        value: *value,
    });
    Ok(Some(ActionValue::Unit))
}

fn read_sensor<S: Substrate>(engine: &mut Engine<S>, action: &Action, _: Option<AgentId>) -> Solved {
    let Some(request) = action.sense() else {
        return Err(mismatch(action));
    };
    let nfc_range = engine.config().nfc_range;
    Ok(sense::read(&engine.bodies, &engine.last_nfc_messages, nfc_range, request).map(ActionValue::Scalar))
}
