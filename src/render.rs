//! Scene rendering: instance data, GPU geometry and the per-frame draw path.
//!
//! Geometry and materials are uploaded once when the sketch is set up. Per
//! frame, only the instance buffers are rewritten from the scene's current
//! world transforms; meshes sharing a geometry/material pair are drawn with a
//! single instanced call.

use cgmath::Matrix3;
use wgpu::util::DeviceExt;

use crate::{
    geometry::MeshData,
    resources::texture::{Texture, diffuse_layout},
    scene::{GeometryId, MaterialId, Scene, Transform},
};

/// Per-instance vertex data: model matrix plus the normal matrix.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceRaw {
    model: [[f32; 4]; 4],
    normal: [[f32; 3]; 3],
}

impl InstanceRaw {
    pub fn from_transform(transform: &Transform) -> Self {
        Self {
            model: transform.to_matrix().into(),
            // Uniform scaling only, so the rotation doubles as normal matrix.
            normal: Matrix3::from(transform.rotation).into(),
        }
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<InstanceRaw>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                // Model matrix, one vec4 per slot.
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 5,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 4]>() as wgpu::BufferAddress,
                    shader_location: 6,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 8]>() as wgpu::BufferAddress,
                    shader_location: 7,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 12]>() as wgpu::BufferAddress,
                    shader_location: 8,
                    format: wgpu::VertexFormat::Float32x4,
                },
                // Normal matrix, one vec3 per slot.
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 16]>() as wgpu::BufferAddress,
                    shader_location: 9,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 19]>() as wgpu::BufferAddress,
                    shader_location: 10,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 22]>() as wgpu::BufferAddress,
                    shader_location: 11,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// Vertex and index buffers of one tessellated geometry.
pub struct GpuGeometry {
    pub name: String,
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_elements: u32,
}

impl GpuGeometry {
    pub fn new(device: &wgpu::Device, name: &str, data: &MeshData) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{name} Vertex Buffer")),
            contents: bytemuck::cast_slice(&data.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{name} Index Buffer")),
            contents: bytemuck::cast_slice(&data.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            name: name.to_string(),
            vertex_buffer,
            index_buffer,
            num_elements: data.indices.len() as u32,
        }
    }
}

/// A diffuse texture bound and ready for the basic pipeline.
pub struct Material {
    pub name: String,
    pub diffuse_texture: Texture,
    pub bind_group: wgpu::BindGroup,
}

impl Material {
    pub fn new(
        device: &wgpu::Device,
        name: &str,
        diffuse_texture: Texture,
        layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&diffuse_texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&diffuse_texture.sampler),
                },
            ],
            label: Some(name),
        });
        Self {
            name: name.to_string(),
            diffuse_texture,
            bind_group,
        }
    }
}

/// One instanced draw call: every mesh sharing a geometry/material pair.
struct RenderBatch {
    geometry: GeometryId,
    material: MaterialId,
    /// Indices into the scene's draw list, fixed at construction.
    mesh_indices: Vec<usize>,
    instance_buffer: wgpu::Buffer,
}

/// Group the scene's draw list into instanced batches, keyed by
/// geometry/material pair in first-seen order.
fn plan_batches(draw_list: &[(GeometryId, MaterialId)]) -> Vec<(GeometryId, MaterialId, Vec<usize>)> {
    let mut batches: Vec<(GeometryId, MaterialId, Vec<usize>)> = Vec::new();
    for (index, &(geometry, material)) in draw_list.iter().enumerate() {
        match batches
            .iter_mut()
            .find(|(g, m, _)| *g == geometry && *m == material)
        {
            Some((_, _, indices)) => indices.push(index),
            None => batches.push((geometry, material, vec![index])),
        }
    }
    batches
}

/// Uploads a scene's geometry once and redraws it each frame.
///
/// The batch layout is derived from the scene at construction and assumed
/// stable afterwards; animation only rewrites transforms, never the set of
/// meshes.
pub struct SceneRenderer {
    geometries: Vec<GpuGeometry>,
    materials: Vec<Material>,
    batches: Vec<RenderBatch>,
}

impl SceneRenderer {
    pub fn new(
        device: &wgpu::Device,
        scene: &Scene,
        geometries: Vec<GpuGeometry>,
        materials: Vec<Material>,
    ) -> Self {
        let transforms = scene.world_transforms();
        let batches = plan_batches(&scene.draw_list())
            .into_iter()
            .map(|(geometry, material, mesh_indices)| {
                let raws: Vec<InstanceRaw> = mesh_indices
                    .iter()
                    .map(|&index| InstanceRaw::from_transform(&transforms[index]))
                    .collect();
                let instance_buffer =
                    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some("Instance Buffer"),
                        contents: bytemuck::cast_slice(&raws),
                        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                    });
                RenderBatch {
                    geometry,
                    material,
                    mesh_indices,
                    instance_buffer,
                }
            })
            .collect();

        Self {
            geometries,
            materials,
            batches,
        }
    }

    pub fn material_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
        diffuse_layout(device)
    }

    /// Push the scene's current world transforms to the instance buffers.
    pub fn prepare(&self, queue: &wgpu::Queue, scene: &Scene) {
        let transforms = scene.world_transforms();
        for batch in &self.batches {
            let raws: Vec<InstanceRaw> = batch
                .mesh_indices
                .iter()
                .map(|&index| InstanceRaw::from_transform(&transforms[index]))
                .collect();
            queue.write_buffer(&batch.instance_buffer, 0, bytemuck::cast_slice(&raws));
        }
    }

    pub fn draw<'pass>(
        &'pass self,
        render_pass: &mut wgpu::RenderPass<'pass>,
        camera_bind_group: &'pass wgpu::BindGroup,
        lighting_bind_group: &'pass wgpu::BindGroup,
    ) {
        for batch in &self.batches {
            render_pass.set_vertex_buffer(1, batch.instance_buffer.slice(..));
            render_pass.draw_geometry_instanced(
                &self.geometries[batch.geometry],
                &self.materials[batch.material],
                0..batch.mesh_indices.len() as u32,
                camera_bind_group,
                lighting_bind_group,
            );
        }
    }
}

pub trait DrawGeometry<'a> {
    fn draw_geometry_instanced(
        &mut self,
        geometry: &'a GpuGeometry,
        material: &'a Material,
        instances: std::ops::Range<u32>,
        camera_bind_group: &'a wgpu::BindGroup,
        lighting_bind_group: &'a wgpu::BindGroup,
    );
}

impl<'a, 'b> DrawGeometry<'b> for wgpu::RenderPass<'a>
where
    'b: 'a,
{
    fn draw_geometry_instanced(
        &mut self,
        geometry: &'b GpuGeometry,
        material: &'b Material,
        instances: std::ops::Range<u32>,
        camera_bind_group: &'b wgpu::BindGroup,
        lighting_bind_group: &'b wgpu::BindGroup,
    ) {
        self.set_vertex_buffer(0, geometry.vertex_buffer.slice(..));
        self.set_index_buffer(geometry.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.set_bind_group(0, &material.bind_group, &[]);
        self.set_bind_group(1, camera_bind_group, &[]);
        self.set_bind_group(2, lighting_bind_group, &[]);
        self.draw_indexed(0..geometry.num_elements, 0, instances);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::MeshNode;
    use cgmath::{Quaternion, Rotation3, Vector3};

    #[test]
    fn instance_raw_matches_the_shader_stride() {
        assert_eq!(std::mem::size_of::<InstanceRaw>(), 25 * 4);
    }

    #[test]
    fn identity_transform_produces_identity_matrices() {
        let raw = InstanceRaw::from_transform(&Transform::new());
        assert_eq!(raw.model[0][0], 1.0);
        assert_eq!(raw.model[3], [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(raw.normal[1][1], 1.0);
    }

    #[test]
    fn translation_lands_in_the_last_matrix_column() {
        let transform = Transform {
            position: Vector3::new(10.0, 0.0, 0.0),
            rotation: Quaternion::from_angle_y(cgmath::Rad(0.0)),
            scale: Vector3::new(2.0, 2.0, 2.0),
        };
        let raw = InstanceRaw::from_transform(&transform);
        // column-major: row 3 of the raw array holds the translation
        assert_eq!(raw.model[3][0], 10.0);
        assert_eq!(raw.model[0][0], 2.0);
    }

    #[test]
    fn meshes_sharing_geometry_and_material_batch_together() {
        let mut scene = Scene::new(wgpu::Color::BLACK);
        let group_a = scene.create_group();
        let group_b = scene.create_group();
        scene.create_body(MeshNode::new(0, 0), group_a, 25.0, 0.5);
        scene.create_body(MeshNode::new(0, 0), group_b, 34.0, 0.5);
        scene.create_body(MeshNode::new(1, 1), group_b, 42.0, 3.5);

        let batches = plan_batches(&scene.draw_list());
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].2.len(), 2);
        assert_eq!(batches[1].2.len(), 1);
    }

    #[test]
    fn batches_cover_the_draw_list_exactly_once() {
        let mut scene = Scene::new(wgpu::Color::BLACK);
        scene.add_mesh(MeshNode::new(0, 0));
        for i in 0..4 {
            let group = scene.create_group();
            scene.create_body(MeshNode::new(i % 2, i % 3), group, 25.0 + i as f32, 1.0);
        }

        let draw_list = scene.draw_list();
        let batches = plan_batches(&draw_list);
        let mut seen: Vec<usize> = batches.iter().flat_map(|(_, _, v)| v.clone()).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..draw_list.len()).collect::<Vec<_>>());
    }

    #[test]
    fn unused_group_id_does_not_reach_the_draw_list() {
        let mut scene = Scene::new(wgpu::Color::BLACK);
        let detached = scene.create_group();
        scene.group_mut(detached).meshes.push(MeshNode::new(0, 0));
        // never attached, so nothing to draw
        assert!(plan_batches(&scene.draw_list()).is_empty());
    }
}
