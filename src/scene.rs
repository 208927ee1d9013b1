//! CPU-side scene model.
//!
//! The scene graph here is deliberately plain data: groups, meshes and lights
//! with no GPU handles attached, so scene construction and the per-frame
//! rotation updates can be exercised without a graphics context. The GPU side
//! ([`crate::render::SceneRenderer`]) walks this structure to upload and draw.
//!
//! Structure invariants:
//! - every mesh belongs to exactly one group (or is a free mesh on the scene),
//! - a group is attached to the scene at most once,
//! - position and scale are set once at construction; only rotation is
//!   mutated per frame.

use cgmath::{One, Quaternion, Rad, Rotation3, Vector3};

/// A fixed rotation axis. Each body orbits and spins about one of these.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn unit(&self) -> Vector3<f32> {
        match self {
            Axis::X => Vector3::unit_x(),
            Axis::Y => Vector3::unit_y(),
            Axis::Z => Vector3::unit_z(),
        }
    }
}

/// Local transform: position, rotation (as quaternion), and scale.
#[derive(Clone, Debug)]
pub struct Transform {
    pub position: Vector3<f32>,
    pub rotation: Quaternion<f32>,
    pub scale: Vector3<f32>,
}

impl Transform {
    pub fn new() -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 0.0),
            // `Quaternion::one()` is the identity quaternion (no rotation)
            rotation: Quaternion::one(),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }

    /// Compose a parent transform with a child transform (`parent * child`).
    pub fn compose(&self, child: &Transform) -> Transform {
        let scaled_child_pos = Vector3::new(
            self.scale.x * child.position.x,
            self.scale.y * child.position.y,
            self.scale.z * child.position.z,
        );
        Transform {
            position: self.position + (self.rotation * scaled_child_pos),
            rotation: self.rotation * child.rotation,
            scale: Vector3::new(
                self.scale.x * child.scale.x,
                self.scale.y * child.scale.y,
                self.scale.z * child.scale.z,
            ),
        }
    }

    pub fn to_matrix(&self) -> cgmath::Matrix4<f32> {
        cgmath::Matrix4::from_translation(self.position)
            * cgmath::Matrix4::from(self.rotation)
            * cgmath::Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

/// Index into the geometry table built alongside the scene.
pub type GeometryId = usize;
/// Index into the material table built alongside the scene.
pub type MaterialId = usize;

/// A drawable node: one geometry paired with one material.
///
/// Geometry is shared between meshes of the same visual family; the transform
/// is owned per mesh. Position and scale are write-once, rotation is the only
/// field touched after construction.
#[derive(Clone, Debug)]
pub struct MeshNode {
    pub geometry: GeometryId,
    pub material: MaterialId,
    pub transform: Transform,
}

impl MeshNode {
    pub fn new(geometry: GeometryId, material: MaterialId) -> Self {
        Self {
            geometry,
            material,
            transform: Transform::new(),
        }
    }
}

/// An intermediate transform node representing orbital revolution.
///
/// Group rotation (orbit) and mesh rotation (axial spin) are driven
/// independently with different angular velocities. In the solar sketch every
/// group owns exactly one mesh, though the structure supports many.
#[derive(Debug)]
pub struct Group {
    pub rotation: Quaternion<f32>,
    pub meshes: Vec<MeshNode>,
}

impl Group {
    fn new() -> Self {
        Self {
            rotation: Quaternion::one(),
            meshes: Vec::new(),
        }
    }

    /// Transform applied on top of each child mesh's local transform.
    pub fn transform(&self) -> Transform {
        Transform {
            rotation: self.rotation,
            ..Transform::new()
        }
    }
}

/// Handle to a group inside a [`Scene`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GroupId(pub(crate) usize);

/// A scene light, immutable after creation.
#[derive(Clone, Debug)]
pub enum Light {
    Point {
        position: Vector3<f32>,
        color: [f32; 3],
        intensity: f32,
    },
    /// Spotlight aimed at the origin.
    Spot {
        position: Vector3<f32>,
        color: [f32; 3],
        intensity: f32,
        distance: f32,
        angle: Rad<f32>,
    },
}

// Six-point rig around the origin, shared by all spotlights.
pub const SPOTLIGHT_COUNT: usize = 6;
pub const SPOTLIGHT_OFFSET: f32 = 25.0;
pub const SPOTLIGHT_INTENSITY: f32 = 5.0;
pub const SPOTLIGHT_DISTANCE: f32 = 25.0;
pub const SPOTLIGHT_ANGLE: Rad<f32> = Rad(std::f32::consts::PI / 7.0);

/// Root container of all drawable and light nodes.
///
/// Created once at setup, owned exclusively by the sketch session, and
/// dropped at teardown.
#[derive(Debug)]
pub struct Scene {
    groups: Vec<Group>,
    attached: Vec<bool>,
    /// Meshes parented directly to the scene (the sun, the single terra body).
    pub meshes: Vec<MeshNode>,
    pub lights: Vec<Light>,
    pub clear_colour: wgpu::Color,
}

impl Scene {
    pub fn new(clear_colour: wgpu::Color) -> Self {
        Self {
            groups: Vec::new(),
            attached: Vec::new(),
            meshes: Vec::new(),
            lights: Vec::new(),
            clear_colour,
        }
    }

    /// Create a new, detached group. It becomes visible once attached.
    pub fn create_group(&mut self) -> GroupId {
        self.groups.push(Group::new());
        self.attached.push(false);
        GroupId(self.groups.len() - 1)
    }

    /// Attach a group to the scene. Attaching an already-attached group is a
    /// no-op.
    pub fn attach(&mut self, group: GroupId) {
        self.attached[group.0] = true;
    }

    pub fn is_attached(&self, group: GroupId) -> bool {
        self.attached[group.0]
    }

    pub fn group(&self, id: GroupId) -> &Group {
        &self.groups[id.0]
    }

    pub fn group_mut(&mut self, id: GroupId) -> &mut Group {
        &mut self.groups[id.0]
    }

    pub fn attached_groups(&self) -> impl Iterator<Item = (GroupId, &Group)> {
        self.groups
            .iter()
            .enumerate()
            .filter(|(i, _)| self.attached[*i])
            .map(|(i, g)| (GroupId(i), g))
    }

    pub fn attached_group_count(&self) -> usize {
        self.attached.iter().filter(|a| **a).count()
    }

    /// Parent a mesh directly to the scene. Returns its index.
    pub fn add_mesh(&mut self, mesh: MeshNode) -> usize {
        self.meshes.push(mesh);
        self.meshes.len() - 1
    }

    pub fn add_light(&mut self, light: Light) {
        self.lights.push(light);
    }

    /// Position a body mesh at `radial_distance` along the x axis with a
    /// uniform scale, parent it under `group`, and attach the group.
    ///
    /// No validation is performed; the caller guarantees sane values. The
    /// attach step is idempotent, so construction order does not matter.
    pub fn create_body(&mut self, mut mesh: MeshNode, group: GroupId, radial_distance: f32, scale: f32) {
        mesh.transform.position = Vector3::new(radial_distance, 0.0, 0.0);
        mesh.transform.scale = Vector3::new(scale, scale, scale);
        self.groups[group.0].meshes.push(mesh);
        self.attach(group);
    }

    /// Place the central white point light plus the six-spotlight rig that
    /// illuminates the central body.
    ///
    /// Spotlight `i` sits on exactly one axis: indices 0-1 on x, 2-3 on y,
    /// 4-5 on z, offset +25 for even indices and -25 for odd ones. Intensity,
    /// falloff distance and cone angle are shared by all six.
    pub fn create_illumination(&mut self) {
        self.add_light(Light::Point {
            position: Vector3::new(0.0, 0.0, 0.0),
            color: [1.0, 1.0, 1.0],
            intensity: 2.0,
        });
        for i in 0..SPOTLIGHT_COUNT {
            let value = if i % 2 == 0 {
                SPOTLIGHT_OFFSET
            } else {
                -SPOTLIGHT_OFFSET
            };
            let position = Vector3::new(
                if i < 2 { value } else { 0.0 },
                if (2..4).contains(&i) { value } else { 0.0 },
                if i >= 4 { value } else { 0.0 },
            );
            self.add_light(Light::Spot {
                position,
                color: [1.0, 1.0, 1.0],
                intensity: SPOTLIGHT_INTENSITY,
                distance: SPOTLIGHT_DISTANCE,
                angle: SPOTLIGHT_ANGLE,
            });
        }
    }

    /// World transforms of every drawable mesh, free meshes first, then the
    /// meshes of each attached group in creation order. The walk order is
    /// stable so GPU buffers can be allocated once and rewritten per frame.
    pub fn world_transforms(&self) -> Vec<Transform> {
        let mut transforms: Vec<Transform> =
            self.meshes.iter().map(|m| m.transform.clone()).collect();
        for (_, group) in self.attached_groups() {
            let parent = group.transform();
            for mesh in &group.meshes {
                transforms.push(parent.compose(&mesh.transform));
            }
        }
        transforms
    }

    /// `(geometry, material)` of every drawable mesh, in [`Self::world_transforms`] order.
    pub fn draw_list(&self) -> Vec<(GeometryId, MaterialId)> {
        let mut list: Vec<(GeometryId, MaterialId)> = self
            .meshes
            .iter()
            .map(|m| (m.geometry, m.material))
            .collect();
        for (_, group) in self.attached_groups() {
            for mesh in &group.meshes {
                list.push((mesh.geometry, mesh.material));
            }
        }
        list
    }
}

/// Rotation about a fixed axis by `angle` radians.
pub fn orientation(axis: Axis, angle: f32) -> Quaternion<f32> {
    Quaternion::from_axis_angle(axis.unit(), Rad(angle))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy_mesh() -> MeshNode {
        MeshNode::new(0, 0)
    }

    fn assert_vec3_eq(actual: Vector3<f32>, expected: Vector3<f32>, epsilon: f32) {
        assert!(
            (actual.x - expected.x).abs() <= epsilon
                && (actual.y - expected.y).abs() <= epsilon
                && (actual.z - expected.z).abs() <= epsilon,
            "expected {expected:?}, got {actual:?}"
        );
    }

    #[test]
    fn create_body_sets_position_and_uniform_scale() {
        let mut scene = Scene::new(wgpu::Color::BLACK);
        let group = scene.create_group();
        scene.create_body(dummy_mesh(), group, 25.0, 0.5);

        let mesh = &scene.group(group).meshes[0];
        assert_vec3_eq(mesh.transform.position, Vector3::new(25.0, 0.0, 0.0), 0.0);
        assert_vec3_eq(mesh.transform.scale, Vector3::new(0.5, 0.5, 0.5), 0.0);
        assert!(scene.is_attached(group));
    }

    #[test]
    fn create_body_twice_attaches_group_once() {
        let mut scene = Scene::new(wgpu::Color::BLACK);
        let group = scene.create_group();
        scene.create_body(dummy_mesh(), group, 10.0, 1.0);
        scene.create_body(dummy_mesh(), group, 10.0, 1.0);

        assert_eq!(scene.attached_group_count(), 1);
        assert_eq!(scene.group(group).meshes.len(), 2);
    }

    #[test]
    fn detached_group_is_not_drawn() {
        let mut scene = Scene::new(wgpu::Color::BLACK);
        let attached = scene.create_group();
        let _detached = scene.create_group();
        scene.create_body(dummy_mesh(), attached, 5.0, 1.0);

        assert_eq!(scene.attached_group_count(), 1);
        assert_eq!(scene.draw_list().len(), 1);
    }

    #[test]
    fn spotlights_occupy_one_axis_each() {
        let mut scene = Scene::new(wgpu::Color::BLACK);
        scene.create_illumination();

        let spots: Vec<_> = scene
            .lights
            .iter()
            .filter_map(|l| match l {
                Light::Spot { position, .. } => Some(*position),
                Light::Point { .. } => None,
            })
            .collect();
        assert_eq!(spots.len(), SPOTLIGHT_COUNT);

        for (i, position) in spots.iter().enumerate() {
            let expected = if i % 2 == 0 { 25.0 } else { -25.0 };
            let (active, rest) = match i {
                0 | 1 => (position.x, [position.y, position.z]),
                2 | 3 => (position.y, [position.x, position.z]),
                _ => (position.z, [position.x, position.y]),
            };
            assert_eq!(active, expected, "spotlight {i}");
            assert_eq!(rest, [0.0, 0.0], "spotlight {i}");
        }
    }

    #[test]
    fn illumination_includes_central_point_light() {
        let mut scene = Scene::new(wgpu::Color::BLACK);
        scene.create_illumination();
        let points = scene
            .lights
            .iter()
            .filter(|l| matches!(l, Light::Point { .. }))
            .count();
        assert_eq!(points, 1);
    }

    #[test]
    fn group_rotation_composes_onto_child_position() {
        let mut scene = Scene::new(wgpu::Color::BLACK);
        let group = scene.create_group();
        scene.create_body(dummy_mesh(), group, 10.0, 1.0);
        scene.group_mut(group).rotation = orientation(Axis::Z, std::f32::consts::FRAC_PI_2);

        let world = scene.world_transforms();
        assert_vec3_eq(world[0].position, Vector3::new(0.0, 10.0, 0.0), 1e-4);
    }
}
