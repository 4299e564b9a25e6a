use crate::{solvers, Body, BodyId, BodyRegistry, DoubleRange, Link, Material, Motor, Point, Poly, SolverRegistry};

/// The physics backend underneath the kernel.
///
/// The kernel owns the [`BodyRegistry`] and the link graph; the substrate is
/// handed the registry whenever it needs to create, move or integrate bodies.
/// Default methods cover plain bookkeeping, so a substrate only has to
/// provide [`Substrate::step`].
pub trait Substrate: Sized + 'static {
    fn create_rigid_body(&mut self, bodies: &mut BodyRegistry, poly: Poly, mass: f64) -> Option<BodyId> {
        Some(bodies.insert(Body::rigid(poly, mass)))
    }

    fn create_unmovable_body(&mut self, bodies: &mut BodyRegistry, poly: Poly) -> Option<BodyId> {
        Some(bodies.insert(Body::unmovable(poly)))
    }

    fn create_voxel(
        &mut self,
        bodies: &mut BodyRegistry,
        side_length: f64,
        mass: f64,
        material: Material,
    ) -> Option<BodyId> {
        Some(bodies.insert(Body::voxel(side_length, mass, material)))
    }

    fn create_rotational_joint(
        &mut self,
        bodies: &mut BodyRegistry,
        length: f64,
        width: f64,
        mass: f64,
        motor: Motor,
        active_angle_range: DoubleRange,
    ) -> Option<BodyId> {
        Some(bodies.insert(Body::rotational_joint(length, width, mass, motor, active_angle_range)))
    }

    /// Displace a movable body. The caller has already checked it exists
    /// and is movable.
    fn translate(&mut self, bodies: &mut BodyRegistry, body: BodyId, translation: Point) {
        if let Some(b) = bodies.get_mut(body) {
            b.poly.translate(translation);
        }
    }

    /// Called after `link` has been recorded on both anchors.
    fn attach_anchor(&mut self, _bodies: &BodyRegistry, _link: Link) {}

    /// Called after `link` has been removed from both anchors.
    fn detach_anchor(&mut self, _bodies: &BodyRegistry, _link: Link) {}

    /// Apply `force` to `body` for the current tick only.
    fn apply_force(&mut self, _bodies: &BodyRegistry, _body: BodyId, _force: Point) {}

    /// Record a voxel's actuation value, already clipped into `[-1, 1]`.
    fn actuate_voxel(&mut self, bodies: &mut BodyRegistry, voxel: BodyId, value: f64) {
        if let Some(state) = bodies.get_mut(voxel).and_then(Body::voxel_state_mut) {
            state.actuation = value;
        }
    }

    /// Record a joint's target angle, already inside its active range.
    fn actuate_rotational_joint(&mut self, bodies: &mut BodyRegistry, joint: BodyId, target_angle: f64) {
        if let Some(state) = bodies.get_mut(joint).and_then(Body::joint_state_mut) {
            state.target_angle = target_angle;
        }
    }

    /// Drop a body whose anchors have already been detached.
    fn remove_body(&mut self, bodies: &mut BodyRegistry, body: BodyId) -> Option<Body> {
        bodies.remove(body)
    }

    /// Advance the world by `dt` seconds.
    fn step(&mut self, bodies: &mut BodyRegistry, dt: f64);

    /// Populate the solver table. Override to add or replace solvers; the
    /// defaults route every primitive through the methods above.
    fn register_solvers(registry: &mut SolverRegistry<Self>) {
        solvers::register_defaults(registry);
    }
}
