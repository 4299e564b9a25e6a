use core::f64::consts::PI;

use crate::{BodyRegistry, NfcMessage, Point, SenseAction, SenseKind};

/// Raw reading of `sense`, or `None` if its body is gone or cannot be read
/// that way.
///
/// `messages` are the near-field messages of the previous tick.
pub fn read(
    bodies: &BodyRegistry,
    messages: &[NfcMessage],
    nfc_range: f64,
    sense: &SenseAction,
) -> Option<f64> {
    let body = bodies.get(sense.body)?;
    let value = match sense.kind {
        SenseKind::Velocity { direction } => body.velocity.dot(Point::from_direction(direction)),
        SenseKind::AreaRatio => body.area_ratio(),
        SenseKind::JointAngle => body.joint_state()?.angle,
        SenseKind::Angle => match (body.poly.vertices.first(), body.poly.vertices.get(1)) {
            (Some(a), Some(b)) => (*b - *a).direction(),
            _ => 0.0,
        },
        SenseKind::Nfc {
            displacement,
            direction,
            channel,
        } => {
            let point = body.center() + displacement;
            messages
                .iter()
                .filter(|m| m.channel == channel && m.emitter != sense.body)
                .filter(|m| m.source.distance(point) <= nfc_range)
                .map(|m| m.value * (m.direction - (direction + PI)).cos().max(0.0))
                .sum()
        }
    };
    Some(value)
}
