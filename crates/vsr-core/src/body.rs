use core::f64::consts::PI;
use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{BoundingBox, DoubleRange, Link, Point, Poly};

/// Generation-checked handle into the [`BodyRegistry`].
///
/// A slot freed by a removal is reused with a bumped generation, so a handle
/// to a removed body never resolves to its successor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BodyId {
    pub index: u32,
    pub generation: u32,
}

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "body#{}v{}", self.index, self.generation)
    }
}

/// An attachment point: the `index`-th vertex of `body`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AnchorId {
    pub body: BodyId,
    pub index: u16,
}

impl AnchorId {
    pub fn new(body: BodyId, index: u16) -> Self {
        Self { body, index }
    }
}

impl fmt::Display for AnchorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/anchor#{}", self.body, self.index)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Anchor {
    pub links: Vec<Link>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Material {
    pub friction: f64,
    /// In `[0, 1]`: how quickly the voxel follows its actuation target.
    pub softness: f64,
    /// Admissible ratio between current and rest area.
    pub area_ratio_active_range: DoubleRange,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            friction: 1.0,
            softness: 0.75,
            area_ratio_active_range: DoubleRange::new(0.8, 1.2),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VoxelState {
    pub side_length: f64,
    pub mass: f64,
    pub material: Material,
    pub rest_area: f64,
    /// Last actuation value, in `[-1, 1]`.
    pub actuation: f64,
}

/// Position controller driving a rotational joint towards its target angle.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Motor {
    /// Angular speed limit, in radians per second.
    pub max_speed: f64,
    /// Torque limit. The kinematic substrate has no angular dynamics and
    /// ignores it.
    pub max_torque: f64,
    pub control_p: f64,
    pub control_i: f64,
    pub control_d: f64,
    /// Errors at or below this are treated as on target.
    pub angle_tolerance: f64,
}

impl Motor {
    pub const MAX_SPEED: f64 = 20.0;
    pub const MAX_TORQUE: f64 = 1000.0;
    pub const CONTROL_P: f64 = 10.0;
    pub const CONTROL_I: f64 = 2.0;
    pub const CONTROL_D: f64 = 2.0;
    pub const ANGLE_TOLERANCE: f64 = 0.0;
}

impl Default for Motor {
    fn default() -> Self {
        Self {
            max_speed: Self::MAX_SPEED,
            max_torque: Self::MAX_TORQUE,
            control_p: Self::CONTROL_P,
            control_i: Self::CONTROL_I,
            control_d: Self::CONTROL_D,
            angle_tolerance: Self::ANGLE_TOLERANCE,
        }
    }
}

/// A `length × width` bar hinged at its middle.
///
/// The first half (anchors 0 and 3) carries the body's frame; the second half
/// (anchors 1 and 2) is rotated by `angle` about the joint point.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct JointState {
    pub length: f64,
    pub width: f64,
    pub mass: f64,
    pub motor: Motor,
    /// Angles the motor may reach.
    pub active_angle_range: DoubleRange,
    pub angle: f64,
    pub target_angle: f64,
    /// Controller memory.
    pub integral: f64,
    pub previous_error: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BodyKind {
    Rigid { mass: f64 },
    Unmovable,
    Voxel(VoxelState),
    RotationalJoint(JointState),
}

impl BodyKind {
    pub fn name(&self) -> &'static str {
        match self {
            BodyKind::Rigid { .. } => "rigid",
            BodyKind::Unmovable => "unmovable",
            BodyKind::Voxel(_) => "voxel",
            BodyKind::RotationalJoint(_) => "rotational_joint",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Body {
    pub id: BodyId,
    pub kind: BodyKind,
    pub poly: Poly,
    pub velocity: Point,
    pub anchors: Vec<Anchor>,
}

impl Body {
    /// Anchor indices are `u16`; polygons with more vertices are rejected.
    pub const MAX_ANCHORS: usize = u16::MAX as usize + 1;

    fn with_kind(kind: BodyKind, poly: Poly) -> Self {
        let anchors = vec![Anchor::default(); poly.len()];
        Self {
            id: BodyId {
                index: u32::MAX,
                generation: 0,
            },
            kind,
            poly,
            velocity: Point::ZERO,
            anchors,
        }
    }

    pub fn rigid(poly: Poly, mass: f64) -> Self {
        Self::with_kind(BodyKind::Rigid { mass }, poly)
    }

    pub fn unmovable(poly: Poly) -> Self {
        Self::with_kind(BodyKind::Unmovable, poly)
    }

    /// A square voxel with its minimum corner at the origin; anchors are its
    /// corners (bottom-left, bottom-right, top-right, top-left).
    pub fn voxel(side_length: f64, mass: f64, material: Material) -> Self {
        let poly = Poly::square(side_length);
        let rest_area = poly.area();
        Self::with_kind(
            BodyKind::Voxel(VoxelState {
                side_length,
                mass,
                material,
                rest_area,
                actuation: 0.0,
            }),
            poly,
        )
    }

    /// A straight joint along x with its minimum corner at the origin.
    pub fn rotational_joint(
        length: f64,
        width: f64,
        mass: f64,
        motor: Motor,
        active_angle_range: DoubleRange,
    ) -> Self {
        let angle = active_angle_range.clip(0.0);
        let mut body = Self::with_kind(
            BodyKind::RotationalJoint(JointState {
                length,
                width,
                mass,
                motor,
                active_angle_range,
                angle,
                target_angle: angle,
                integral: 0.0,
                previous_error: 0.0,
            }),
            Poly::rect(length, width),
        );
        body.bend_joint();
        body
    }

    pub fn is_movable(&self) -> bool {
        !matches!(self.kind, BodyKind::Unmovable)
    }

    pub fn mass(&self) -> f64 {
        match self.kind {
            BodyKind::Rigid { mass } => mass,
            BodyKind::Unmovable => f64::INFINITY,
            BodyKind::Voxel(state) => state.mass,
            BodyKind::RotationalJoint(state) => state.mass,
        }
    }

    pub fn voxel_state(&self) -> Option<&VoxelState> {
        match &self.kind {
            BodyKind::Voxel(state) => Some(state),
            _ => None,
        }
    }

    pub fn voxel_state_mut(&mut self) -> Option<&mut VoxelState> {
        match &mut self.kind {
            BodyKind::Voxel(state) => Some(state),
            _ => None,
        }
    }

    pub fn joint_state(&self) -> Option<&JointState> {
        match &self.kind {
            BodyKind::RotationalJoint(state) => Some(state),
            _ => None,
        }
    }

    pub fn joint_state_mut(&mut self) -> Option<&mut JointState> {
        match &mut self.kind {
            BodyKind::RotationalJoint(state) => Some(state),
            _ => None,
        }
    }

    /// Hinge point of a rotational joint: half a length along the first
    /// half's axis from the middle of its end edge.
    pub fn joint_point(&self) -> Option<Point> {
        let state = self.joint_state()?;
        let (start, axis) = self.joint_frame()?;
        Some(start + Point::from_direction(axis) * (state.length / 2.0))
    }

    fn joint_frame(&self) -> Option<(Point, f64)> {
        let [bl, _, _, tl] = self.poly.vertices.as_slice() else {
            return None;
        };
        Some(((*bl + *tl) / 2.0, (*tl - *bl).direction() - PI / 2.0))
    }

    /// Rebuild the second half of a rotational joint from the first half and
    /// the current angle. No-op for other bodies.
    pub fn bend_joint(&mut self) {
        let (Some(state), Some(joint), Some((_, axis))) =
            (self.joint_state().copied(), self.joint_point(), self.joint_frame())
        else {
            return;
        };
        let bent = axis + state.angle;
        let end = joint + Point::from_direction(bent) * (state.length / 2.0);
        let normal = Point::from_direction(bent + PI / 2.0) * (state.width / 2.0);
        self.poly.vertices[1] = end - normal;
        self.poly.vertices[2] = end + normal;
    }

    pub fn bounding_box(&self) -> BoundingBox {
        self.poly.bounding_box()
    }

    pub fn center(&self) -> Point {
        self.poly.center()
    }

    /// Current area over rest area; 1 for non-voxel bodies.
    pub fn area_ratio(&self) -> f64 {
        match self.voxel_state() {
            Some(state) if state.rest_area > 0.0 => self.poly.area() / state.rest_area,
            _ => 1.0,
        }
    }

    pub fn anchor_ids(&self) -> impl Iterator<Item = AnchorId> + '_ {
        (0..self.anchors.len()).map_while(move |i| u16::try_from(i).ok().map(|i| AnchorId::new(self.id, i)))
    }
}

#[derive(Debug, Clone, Default)]
struct Slot {
    generation: u32,
    body: Option<Body>,
}

/// Arena of every body in the world, addressed by [`BodyId`].
///
/// Iteration follows slot order, which keeps every sweep over the registry
/// deterministic.
#[derive(Debug, Clone, Default)]
pub struct BodyRegistry {
    slots: Vec<Slot>,
    free: Vec<u32>,
    len: usize,
}

impl BodyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn insert(&mut self, mut body: Body) -> BodyId {
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                self.slots.push(Slot::default());
                (self.slots.len() - 1) as u32
            }
        };
        let slot = &mut self.slots[index as usize];
        let id = BodyId {
            index,
            generation: slot.generation,
        };
        body.id = id;
        slot.body = Some(body);
        self.len += 1;
        id
    }

    /// Remove a body. Links pointing at it are left to the caller, which is
    /// expected to detach them first.
    pub fn remove(&mut self, id: BodyId) -> Option<Body> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation || slot.body.is_none() {
            return None;
        }
        let body = slot.body.take();
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.len -= 1;
        body
    }

    pub fn contains(&self, id: BodyId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: BodyId) -> Option<&Body> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.body.as_ref()
    }

    pub fn get_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.body.as_mut()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Body> {
        self.slots.iter().filter_map(|s| s.body.as_ref())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Body> {
        self.slots.iter_mut().filter_map(|s| s.body.as_mut())
    }

    pub fn ids(&self) -> Vec<BodyId> {
        self.iter().map(|b| b.id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_handles_do_not_resolve() {
        let mut registry = BodyRegistry::new();
        let a = registry.insert(Body::rigid(Poly::square(1.0), 1.0));
        assert!(registry.remove(a).is_some());
        let b = registry.insert(Body::rigid(Poly::square(1.0), 1.0));
        assert_eq!(a.index, b.index);
        assert_ne!(a, b);
        assert!(registry.get(a).is_none());
        assert!(registry.get(b).is_some());
        assert!(registry.remove(a).is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn joint_bends_its_second_half() {
        let mut body = Body::rotational_joint(2.0, 0.5, 1.0, Motor::default(), DoubleRange::new(-PI, PI));
        assert!(body.poly.vertices[1].distance(Point::new(2.0, 0.0)) < 1e-9);
        assert_eq!(body.joint_point(), Some(Point::new(1.0, 0.25)));

        if let Some(state) = body.joint_state_mut() {
            state.angle = PI / 2.0;
        }
        body.bend_joint();
        let v = &body.poly.vertices;
        assert!(v[1].distance(Point::new(1.25, 1.25)) < 1e-9);
        assert!(v[2].distance(Point::new(0.75, 1.25)) < 1e-9);
        assert_eq!(v[0], Point::ZERO);
        assert_eq!(body.anchors.len(), 4);
    }

    #[test]
    fn joint_starts_inside_its_active_range() {
        let body = Body::rotational_joint(1.0, 0.2, 1.0, Motor::default(), DoubleRange::new(0.5, 1.0));
        let state = body.joint_state().copied().unwrap_or_else(|| panic!("joint"));
        assert_eq!(state.angle, 0.5);
        assert_eq!(state.target_angle, 0.5);
    }

    #[test]
    fn voxel_has_four_corner_anchors() {
        let mut registry = BodyRegistry::new();
        let id = registry.insert(Body::voxel(2.0, 1.0, Material::default()));
        let body = registry.get(id).expect("voxel");
        assert_eq!(body.anchors.len(), 4);
        assert_eq!(body.area_ratio(), 1.0);
        assert_eq!(body.poly.vertices[2], Point::new(2.0, 2.0));
    }
}
