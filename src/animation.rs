//! Per-frame rotation updates.
//!
//! The angle math is pure — elapsed time and per-body constants in, rotation
//! angles out — and kept apart from the side-effecting apply step so it can be
//! tested without a graphics context. Rotation values are handed straight to
//! the quaternion representation, which handles periodicity internally; no
//! wraparound handling is needed.

use crate::{
    bodies::{BodyConfig, SUN_SPIN_AXIS, SUN_SPIN_VELOCITY},
    scene::{GroupId, Scene, orientation},
};

/// Rotation angle after `time` seconds at a fixed angular velocity.
pub fn angle_at(time: f32, angular_velocity: f32) -> f32 {
    time * angular_velocity
}

/// Handles tying one table entry to its scene-graph nodes.
#[derive(Debug)]
pub struct BodyHandle {
    pub config: &'static BodyConfig,
    pub group: GroupId,
}

#[derive(Debug, PartialEq, Eq)]
enum DriverState {
    Running,
    /// Terminal: resources released, no further updates accepted.
    Unloaded,
}

/// The animation driver of the rich sketch.
///
/// Owns the handles produced at scene construction and maps elapsed time to
/// group (orbit) and mesh (spin) rotations. `unload` moves the driver to its
/// terminal state exactly once; there is no transition back.
#[derive(Debug)]
pub struct Orrery {
    /// Index of the sun's free mesh on the scene.
    sun: usize,
    bodies: Vec<BodyHandle>,
    state: DriverState,
}

impl Orrery {
    pub fn new(sun: usize, bodies: Vec<BodyHandle>) -> Self {
        Self {
            sun,
            bodies,
            state: DriverState::Running,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state == DriverState::Running
    }

    pub fn bodies(&self) -> &[BodyHandle] {
        &self.bodies
    }

    /// Set every group's orbit rotation and every mesh's spin rotation from
    /// the elapsed time `time` (seconds, supplied by the harness).
    ///
    /// A no-op once unloaded.
    pub fn advance(&self, scene: &mut Scene, time: f32) {
        if !self.is_running() {
            return;
        }

        scene.meshes[self.sun].transform.rotation =
            orientation(SUN_SPIN_AXIS, angle_at(time, SUN_SPIN_VELOCITY));

        for handle in &self.bodies {
            let config = handle.config;
            let group = scene.group_mut(handle.group);
            group.rotation = orientation(
                config.orbit_axis,
                angle_at(time, config.orbit_velocity),
            );
            let spin = orientation(config.spin_axis, angle_at(time, config.spin_velocity));
            for mesh in &mut group.meshes {
                mesh.transform.rotation = spin;
            }
        }
    }

    /// Transition to the terminal state. Safe to call more than once.
    pub fn unload(&mut self) {
        self.state = DriverState::Unloaded;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bodies::PLANETS;
    use crate::scene::{Axis, MeshNode};
    use cgmath::{InnerSpace, One, Quaternion, Rad, Rotation3, Vector3};

    fn rigged_scene() -> (Scene, Orrery) {
        let mut scene = Scene::new(wgpu::Color::BLACK);
        let sun = scene.add_mesh(MeshNode::new(0, 0));
        let bodies = PLANETS
            .iter()
            .map(|config| {
                let group = scene.create_group();
                scene.create_body(
                    MeshNode::new(0, 0),
                    group,
                    config.radial_distance,
                    config.scale,
                );
                BodyHandle { config, group }
            })
            .collect();
        (scene, Orrery::new(sun, bodies))
    }

    #[test]
    fn all_angles_are_zero_at_time_zero() {
        let (mut scene, orrery) = rigged_scene();
        orrery.advance(&mut scene, 0.0);

        let identity: Quaternion<f32> = Quaternion::one();
        for (_, group) in scene.attached_groups() {
            assert_eq!(group.rotation, identity);
            assert_eq!(group.meshes[0].transform.rotation, identity);
        }
        assert_eq!(scene.meshes[0].transform.rotation, identity);
    }

    #[test]
    fn orbit_angle_is_time_times_velocity() {
        assert_eq!(angle_at(10.0, 1.5), 15.0);
        assert_eq!(angle_at(0.0, 1.5), 0.0);

        let (mut scene, orrery) = rigged_scene();
        orrery.advance(&mut scene, 10.0);

        // mercury: orbit z at 1.5 rad/s
        let mercury = orrery.bodies()[0].group;
        let expected = Quaternion::from_axis_angle(Axis::Z.unit(), Rad(15.0_f32));
        let actual = scene.group(mercury).rotation;
        assert!((actual.s - expected.s).abs() < 1e-5);
        assert!((actual.v - expected.v).magnitude() < 1e-5);
    }

    #[test]
    fn advance_is_a_no_op_after_unload() {
        let (mut scene, mut orrery) = rigged_scene();
        orrery.advance(&mut scene, 3.0);
        let before = scene.group(orrery.bodies()[0].group).rotation;

        orrery.unload();
        assert!(!orrery.is_running());
        orrery.advance(&mut scene, 100.0);
        assert_eq!(scene.group(orrery.bodies()[0].group).rotation, before);
    }

    #[test]
    fn unload_twice_is_harmless() {
        let (_, mut orrery) = rigged_scene();
        orrery.unload();
        orrery.unload();
        assert!(!orrery.is_running());
    }

    #[test]
    fn spin_and_orbit_are_independent() {
        let (mut scene, orrery) = rigged_scene();
        orrery.advance(&mut scene, 1.0);

        let mercury = scene.group(orrery.bodies()[0].group);
        // orbit 1.5 rad vs spin 0.2 rad about the same axis
        assert_ne!(mercury.rotation, mercury.meshes[0].transform.rotation);
        // position and scale stay write-once
        assert_eq!(
            mercury.meshes[0].transform.position,
            Vector3::new(25.0, 0.0, 0.0)
        );
    }
}
