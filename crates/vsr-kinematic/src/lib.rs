//! Point-mass reference substrate: every body is a rigid polygon driven by a
//! single velocity, links are springs between anchors, voxels breathe towards
//! their actuation target, rotational joints follow a PID loop towards their
//! target angle, and an optional ground plane stops the fall.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::trace;
use vsr_core::{Body, BodyId, BodyKind, BodyRegistry, Link, LinkType, Point, Substrate};

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct KinematicConfig {
    /// Vertical acceleration (units per second squared, negative is down).
    pub gravity: f64,
    /// Fraction of velocity lost per second.
    pub linear_damping: f64,
    /// Spring constant of `Rigid` links.
    pub rigid_stiffness: f64,
    /// Spring constant of `Soft` links.
    pub soft_stiffness: f64,
    /// How fast a voxel side relaxes towards its actuation target, per second,
    /// before scaling by the material softness.
    pub actuation_rate: f64,
    /// Height of the ground plane, if any.
    pub ground_level: Option<f64>,
}

impl Default for KinematicConfig {
    fn default() -> Self {
        Self {
            gravity: -9.81,
            linear_damping: 0.5,
            rigid_stiffness: 200.0,
            soft_stiffness: 40.0,
            actuation_rate: 8.0,
            ground_level: Some(0.0),
        }
    }
}

impl KinematicConfig {
    pub fn stiffness(&self, link_type: LinkType) -> f64 {
        match link_type {
            LinkType::Rigid => self.rigid_stiffness,
            LinkType::Soft => self.soft_stiffness,
        }
    }
}

/// Explicit-Euler substrate.
///
/// Forces queued by attraction actions live for exactly one step.
pub struct KinematicSubstrate {
    config: KinematicConfig,
    pending: BTreeMap<BodyId, Point>,
    scratch_forces: BTreeMap<BodyId, Point>,
}

impl KinematicSubstrate {
    pub fn new(config: KinematicConfig) -> Self {
        Self {
            config,
            pending: BTreeMap::new(),
            scratch_forces: BTreeMap::new(),
        }
    }

    pub fn config(&self) -> KinematicConfig {
        self.config
    }

    pub fn set_config(&mut self, config: KinematicConfig) {
        self.config = config;
    }

    /// Forces queued for the next step.
    pub fn pending_force(&self, body: BodyId) -> Point {
        self.pending.get(&body).copied().unwrap_or(Point::ZERO)
    }

    fn accumulate_springs(&mut self, bodies: &BodyRegistry) {
        for link in bodies.links() {
            if link.source.body == link.destination.body {
                continue;
            }
            let (Some(a), Some(b)) = (
                bodies.anchor_point(link.source),
                bodies.anchor_point(link.destination),
            ) else {
                continue;
            };
            let force = (b - a) * self.config.stiffness(link.link_type);
            add_force(&mut self.scratch_forces, link.source.body, force);
            add_force(&mut self.scratch_forces, link.destination.body, -force);
        }
    }

    fn integrate(&self, body: &mut Body, dt: f64) {
        let mass = body.mass();
        if !mass.is_finite() || mass <= 0.0 {
            return;
        }
        let force = self.scratch_forces.get(&body.id).copied().unwrap_or(Point::ZERO)
            + Point::new(0.0, self.config.gravity * mass);
        body.velocity = body.velocity + force / mass * dt;
        body.velocity = body.velocity * (1.0 - self.config.linear_damping * dt).max(0.0);
        body.poly.translate(body.velocity * dt);
    }

    fn relax_voxel(&self, body: &mut Body, dt: f64) {
        let BodyKind::Voxel(state) = body.kind else {
            return;
        };
        let area = body.poly.area();
        if area <= 0.0 {
            return;
        }
        let side = area.sqrt();
        let range = state.material.area_ratio_active_range;
        let target_ratio = range.denormalize((state.actuation + 1.0) / 2.0);
        let target = state.side_length * target_ratio.max(0.0).sqrt();
        let rate = (self.config.actuation_rate * state.material.softness * dt).clamp(0.0, 1.0);
        let next = side + (target - side) * rate;
        let center = body.poly.center();
        body.poly.scale_about(center, next / side);
    }

    /// Motor torque is not modelled: the joint angle moves at the clamped
    /// controller speed. The proportional and derivative terms act on the
    /// post-step error.
    fn drive_joint(&self, body: &mut Body, dt: f64) {
        let Some(state) = body.joint_state_mut() else {
            return;
        };
        let motor = state.motor;
        let error = state.target_angle - state.angle;
        let speed = if error.abs() <= motor.angle_tolerance {
            0.0
        } else {
            state.integral += error * dt;
            let derivative = (error - state.previous_error) / dt;
            let drive = motor.control_p * error + motor.control_i * state.integral + motor.control_d * derivative;
            (drive / (1.0 + motor.control_p * dt + motor.control_d)).clamp(-motor.max_speed, motor.max_speed)
        };
        state.previous_error = error;
        state.angle = state.active_angle_range.clip(state.angle + speed * dt);
        body.bend_joint();
    }

    fn rest_on_ground(&self, body: &mut Body, dt: f64) {
        let Some(level) = self.config.ground_level else {
            return;
        };
        let min_y = body.bounding_box().min.y;
        if min_y >= level {
            return;
        }
        body.poly.translate(Point::new(0.0, level - min_y));
        if body.velocity.y < 0.0 {
            body.velocity.y = 0.0;
        }
        let friction = match body.kind {
            BodyKind::Voxel(state) => state.material.friction,
            _ => 1.0,
        };
        body.velocity.x *= (1.0 - friction * dt).max(0.0);
    }
}

impl Default for KinematicSubstrate {
    fn default() -> Self {
        Self::new(KinematicConfig::default())
    }
}

fn add_force(forces: &mut BTreeMap<BodyId, Point>, body: BodyId, force: Point) {
    let entry = forces.entry(body).or_insert(Point::ZERO);
    *entry = *entry + force;
}

impl Substrate for KinematicSubstrate {
    fn attach_anchor(&mut self, _bodies: &BodyRegistry, link: Link) {
        trace!(source = %link.source, destination = %link.destination, "spring attached");
    }

    fn detach_anchor(&mut self, _bodies: &BodyRegistry, link: Link) {
        trace!(source = %link.source, destination = %link.destination, "spring detached");
    }

    fn apply_force(&mut self, _bodies: &BodyRegistry, body: BodyId, force: Point) {
        add_force(&mut self.pending, body, force);
    }

    fn remove_body(&mut self, bodies: &mut BodyRegistry, body: BodyId) -> Option<Body> {
        self.pending.remove(&body);
        bodies.remove(body)
    }

    fn step(&mut self, bodies: &mut BodyRegistry, dt: f64) {
        if dt <= 0.0 {
            self.pending.clear();
            return;
        }
        self.scratch_forces.clear();
        std::mem::swap(&mut self.scratch_forces, &mut self.pending);
        self.accumulate_springs(bodies);

        for body in bodies.iter_mut() {
            if !body.is_movable() {
                continue;
            }
            self.integrate(body, dt);
            self.relax_voxel(body, dt);
            self.drive_joint(body, dt);
            self.rest_on_ground(body, dt);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vsr_core::DoubleRange;

    #[test]
    fn stiffness_follows_link_type() {
        let config = KinematicConfig::default();
        assert!(config.stiffness(LinkType::Rigid) > config.stiffness(LinkType::Soft));
    }

    #[test]
    fn actuation_bounds_map_to_area_range() {
        let range = DoubleRange::new(0.8, 1.2);
        assert_eq!(range.denormalize((1.0 + 1.0) / 2.0), 1.2);
        assert_eq!(range.denormalize((-1.0 + 1.0) / 2.0), 0.8);
    }
}
