//! Procedural geometry.
//!
//! Every shape in the sketches is tessellated once at startup into an
//! immutable [`MeshData`] (positions, texture coordinates, normals, triangle
//! indices) and never re-evaluated per frame. Geometry is shared: several
//! bodies reference the same [`MeshData`] through their `GeometryId`.

use cgmath::{InnerSpace, Vector3};

use std::f32::consts::PI;

pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
    pub normal: [f32; 3],
}

impl Vertex for ModelVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 5]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// Immutable vertex/topology data, shared across meshes of the same family.
#[derive(Clone, Debug)]
pub struct MeshData {
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// UV sphere, the single body of the simple sketch.
pub fn sphere(radius: f32, width_segments: u32, height_segments: u32) -> MeshData {
    let mut vertices = Vec::new();
    let mut indices = Vec::new();
    let row = width_segments + 1;

    for iy in 0..=height_segments {
        let v = iy as f32 / height_segments as f32;
        let theta = v * PI;
        for ix in 0..=width_segments {
            let u = ix as f32 / width_segments as f32;
            let phi = u * 2.0 * PI;
            let position = [
                -radius * phi.cos() * theta.sin(),
                radius * theta.cos(),
                radius * phi.sin() * theta.sin(),
            ];
            let normal = Vector3::from(position).normalize();
            vertices.push(ModelVertex {
                position,
                tex_coords: [u, 1.0 - v],
                normal: normal.into(),
            });
        }
    }

    for iy in 0..height_segments {
        for ix in 0..width_segments {
            let a = iy * row + ix + 1;
            let b = iy * row + ix;
            let c = (iy + 1) * row + ix;
            let d = (iy + 1) * row + ix + 1;
            // skip the degenerate triangles at the poles
            if iy != 0 {
                indices.extend_from_slice(&[a, b, d]);
            }
            if iy != height_segments - 1 {
                indices.extend_from_slice(&[b, c, d]);
            }
        }
    }

    MeshData { vertices, indices }
}

fn knot_centreline(u: f32, radius: f32, p: f32, q: f32) -> Vector3<f32> {
    let cu = u.cos();
    let su = u.sin();
    let qu_over_p = q / p * u;
    let cs = qu_over_p.cos();
    Vector3::new(
        radius * (2.0 + cs) * 0.5 * cu,
        radius * (2.0 + cs) * su * 0.5,
        radius * qu_over_p.sin() * 0.5,
    )
}

/// Torus knot, the sun's shape.
pub fn torus_knot(
    radius: f32,
    tube: f32,
    tubular_segments: u32,
    radial_segments: u32,
    p: u32,
    q: u32,
) -> MeshData {
    let mut vertices = Vec::new();
    let mut indices = Vec::new();
    let (p, q) = (p as f32, q as f32);

    for i in 0..=tubular_segments {
        let u = i as f32 / tubular_segments as f32 * p * 2.0 * PI;

        // Frenet-style frame from two nearby centreline points.
        let p1 = knot_centreline(u, radius, p, q);
        let p2 = knot_centreline(u + 0.01, radius, p, q);
        let t = p2 - p1;
        let n = p2 + p1;
        let b = t.cross(n).normalize();
        let n = b.cross(t).normalize();

        for j in 0..=radial_segments {
            let v = j as f32 / radial_segments as f32 * 2.0 * PI;
            let cx = -tube * v.cos();
            let cy = tube * v.sin();

            let position = p1 + cx * n + cy * b;
            let normal = (position - p1).normalize();
            vertices.push(ModelVertex {
                position: position.into(),
                tex_coords: [
                    i as f32 / tubular_segments as f32,
                    j as f32 / radial_segments as f32,
                ],
                normal: normal.into(),
            });
        }
    }

    let row = radial_segments + 1;
    for j in 1..=tubular_segments {
        for i in 1..=radial_segments {
            let a = row * (j - 1) + (i - 1);
            let b = row * j + (i - 1);
            let c = row * j + i;
            let d = row * (j - 1) + i;
            indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }

    MeshData { vertices, indices }
}

/// Cylinder with independent top/bottom radii and a partial sweep.
///
/// With `theta_length` below a full turn this is an open shell (the "weird
/// bowl" of the rich sketch), so the render pipeline draws both faces.
#[allow(clippy::too_many_arguments)]
pub fn cylinder(
    radius_top: f32,
    radius_bottom: f32,
    height: f32,
    radial_segments: u32,
    height_segments: u32,
    open_ended: bool,
    theta_start: f32,
    theta_length: f32,
) -> MeshData {
    let mut vertices: Vec<ModelVertex> = Vec::new();
    let mut indices = Vec::new();
    let half_height = height / 2.0;
    let row = radial_segments + 1;

    // torso
    let slope = (radius_bottom - radius_top) / height;
    for y in 0..=height_segments {
        let v = y as f32 / height_segments as f32;
        let radius = v * (radius_bottom - radius_top) + radius_top;
        for x in 0..=radial_segments {
            let u = x as f32 / radial_segments as f32;
            let theta = u * theta_length + theta_start;
            let (sin_t, cos_t) = theta.sin_cos();
            vertices.push(ModelVertex {
                position: [radius * sin_t, -v * height + half_height, radius * cos_t],
                tex_coords: [u, 1.0 - v],
                normal: Vector3::new(sin_t, slope, cos_t).normalize().into(),
            });
        }
    }
    for y in 0..height_segments {
        for x in 0..radial_segments {
            let a = row * y + x;
            let b = row * (y + 1) + x;
            let c = row * (y + 1) + x + 1;
            let d = row * y + x + 1;
            indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }

    // caps
    if !open_ended {
        let mut generate_cap = |top: bool| {
            let radius = if top { radius_top } else { radius_bottom };
            if radius <= 0.0 {
                return;
            }
            let sign: f32 = if top { 1.0 } else { -1.0 };

            let centre_start = vertices.len() as u32;
            for _ in 0..radial_segments {
                vertices.push(ModelVertex {
                    position: [0.0, half_height * sign, 0.0],
                    tex_coords: [0.5, 0.5],
                    normal: [0.0, sign, 0.0],
                });
            }
            let ring_start = vertices.len() as u32;
            for x in 0..=radial_segments {
                let u = x as f32 / radial_segments as f32;
                let theta = u * theta_length + theta_start;
                let (sin_t, cos_t) = theta.sin_cos();
                vertices.push(ModelVertex {
                    position: [radius * sin_t, half_height * sign, radius * cos_t],
                    tex_coords: [cos_t * 0.5 + 0.5, sin_t * 0.5 * sign + 0.5],
                    normal: [0.0, sign, 0.0],
                });
            }
            for x in 0..radial_segments {
                let c = centre_start + x;
                let i = ring_start + x;
                if top {
                    indices.extend_from_slice(&[i, i + 1, c]);
                } else {
                    indices.extend_from_slice(&[i + 1, i, c]);
                }
            }
        };
        generate_cap(true);
        generate_cap(false);
    }

    MeshData { vertices, indices }
}

/// Tetrahedron scaled to `radius`, the pyramid family.
pub fn tetrahedron(radius: f32) -> MeshData {
    const CORNERS: [[f32; 3]; 4] = [
        [1.0, 1.0, 1.0],
        [-1.0, -1.0, 1.0],
        [-1.0, 1.0, -1.0],
        [1.0, -1.0, -1.0],
    ];
    const FACES: [[usize; 3]; 4] = [[2, 1, 0], [0, 3, 2], [1, 3, 0], [2, 3, 1]];

    let mut vertices = Vec::with_capacity(12);
    for face in FACES {
        let corners: Vec<Vector3<f32>> = face
            .iter()
            .map(|&corner| Vector3::from(CORNERS[corner]).normalize() * radius)
            .collect();
        // vertices are per-face, so the shared face normal keeps faces flat
        let normal = (corners[1] - corners[0])
            .cross(corners[2] - corners[0])
            .normalize();
        for position in corners {
            // spherical projection for the uvs, same mapping as a polyhedron
            let azimuth = position.z.atan2(-position.x);
            let inclination = (-position.y).atan2((position.x * position.x
                + position.z * position.z)
                .sqrt());
            vertices.push(ModelVertex {
                position: position.into(),
                tex_coords: [
                    azimuth / (2.0 * PI) + 0.5,
                    inclination / PI + 0.5,
                ],
                normal: normal.into(),
            });
        }
    }
    let indices = (0..vertices.len() as u32).collect();

    MeshData { vertices, indices }
}

/// Scale factor applied to every worm-horn surface point.
pub const WORM_HORN_SCALE: f32 = 0.75;

/// The worm-horn surface point for parameters `u, v` in the unit square.
///
/// `u` is rescaled to [0, 2π] (after doubling) and `v` to [0, 2π]. The two
/// trigonometric branches below and above `u = π` do not meet exactly at the
/// seam; the discontinuity is part of the intended look and is kept as-is.
pub fn worm_horn_point(u: f32, v: f32) -> Vector3<f32> {
    let u = u * PI * 2.0;
    let v = v * 2.0 * PI;

    let (x, z) = if u < PI {
        (
            3.0 * u.cos() * (1.0 + u.sin())
                + (2.0 * (1.0 - u.cos() / 2.0)) * u.cos() * v.cos(),
            -8.0 * u.sin() - 2.0 * (1.0 - u.cos() / 2.0) * u.sin() * v.cos(),
        )
    } else {
        (
            3.0 * u.cos() * (1.0 + u.sin()) + (2.0 * (1.0 - u.cos() / 2.0)) * (v + PI).cos(),
            -8.0 * u.sin(),
        )
    };
    let y = -2.0 * (1.0 - u.cos() / 2.0) * v.sin();

    Vector3::new(x, y, z) * WORM_HORN_SCALE
}

/// Tessellate a parametric surface on a fixed `slices` x `stacks` grid.
///
/// Normals are accumulated from face normals and averaged, which tolerates
/// surfaces with seams or degenerate cells.
pub fn parametric(f: impl Fn(f32, f32) -> Vector3<f32>, slices: u32, stacks: u32) -> MeshData {
    let mut vertices = Vec::new();
    let mut indices = Vec::new();
    let row = slices + 1;

    for i in 0..=stacks {
        let v = i as f32 / stacks as f32;
        for j in 0..=slices {
            let u = j as f32 / slices as f32;
            vertices.push(ModelVertex {
                position: f(u, v).into(),
                tex_coords: [u, v],
                normal: [0.0; 3],
            });
        }
    }
    for i in 0..stacks {
        for j in 0..slices {
            let a = row * i + j;
            let b = row * (i + 1) + j;
            let c = row * (i + 1) + j + 1;
            let d = row * i + j + 1;
            indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }

    let mut data = MeshData { vertices, indices };
    average_face_normals(&mut data);
    data
}

/// The reusable worm-horn geometry at the resolution the sketches use.
pub fn worm_horn() -> MeshData {
    parametric(worm_horn_point, 25, 25)
}

fn average_face_normals(data: &mut MeshData) {
    for tri in data.indices.chunks(3) {
        let p0 = Vector3::from(data.vertices[tri[0] as usize].position);
        let p1 = Vector3::from(data.vertices[tri[1] as usize].position);
        let p2 = Vector3::from(data.vertices[tri[2] as usize].position);
        let face = (p1 - p0).cross(p2 - p0);
        for &index in tri {
            let normal = &mut data.vertices[index as usize].normal;
            *normal = (Vector3::from(*normal) + face).into();
        }
    }
    for vertex in &mut data.vertices {
        let accumulated = Vector3::from(vertex.normal);
        if accumulated.magnitude2() > 0.0 {
            vertex.normal = accumulated.normalize().into();
        } else {
            vertex.normal = [0.0, 1.0, 0.0];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worm_horn_point_is_deterministic() {
        for &(u, v) in &[(0.0, 0.0), (0.25, 0.5), (0.49, 0.99), (0.51, 0.01), (1.0, 1.0)] {
            let a = worm_horn_point(u, v);
            let b = worm_horn_point(u, v);
            assert_eq!(a, b, "same inputs must give bit-identical outputs");
        }
    }

    #[test]
    fn worm_horn_point_is_bounded() {
        // amplitude bound: |x| <= 9, |y| <= 3, |z| <= 11, times the 0.75 scale
        let bound = 11.0 * WORM_HORN_SCALE + 1e-3;
        for i in 0..=100 {
            for j in 0..=100 {
                let p = worm_horn_point(i as f32 / 100.0, j as f32 / 100.0);
                assert!(
                    p.x.abs() <= bound && p.y.abs() <= bound && p.z.abs() <= bound,
                    "unbounded point {p:?} at ({i}, {j})"
                );
            }
        }
    }

    #[test]
    fn parametric_grid_has_expected_counts() {
        let data = worm_horn();
        assert_eq!(data.vertices.len(), 26 * 26);
        assert_eq!(data.triangle_count(), 25 * 25 * 2);
    }

    #[test]
    fn parametric_normals_are_unit_length() {
        let data = worm_horn();
        for vertex in &data.vertices {
            let len = Vector3::from(vertex.normal).magnitude();
            assert!((len - 1.0).abs() < 1e-4, "normal length {len}");
        }
    }

    #[test]
    fn sphere_vertices_sit_on_the_radius() {
        let data = sphere(2.0, 32, 16);
        assert_eq!(data.vertices.len(), 33 * 17);
        for vertex in &data.vertices {
            let len = Vector3::from(vertex.position).magnitude();
            assert!((len - 2.0).abs() < 1e-4);
        }
    }

    #[test]
    fn sphere_skips_degenerate_pole_triangles() {
        let data = sphere(1.0, 32, 16);
        assert_eq!(data.indices.len() as u32, 32 * 16 * 6 - 32 * 6);
    }

    #[test]
    fn torus_knot_has_expected_counts() {
        let data = torus_knot(3.5, 1.5, 64, 8, 2, 3);
        assert_eq!(data.vertices.len(), 65 * 9);
        assert_eq!(data.triangle_count(), 64 * 8 * 2);
    }

    #[test]
    fn closed_cylinder_gains_cap_triangles() {
        let open = cylinder(6.4, 1.1, 3.2, 50, 2, true, 0.0, PI * 1.5);
        let closed = cylinder(6.4, 1.1, 3.2, 50, 2, false, 0.0, PI * 1.5);
        assert_eq!(
            closed.triangle_count(),
            open.triangle_count() + 2 * 50,
        );
    }

    #[test]
    fn tetrahedron_is_four_flat_faces() {
        let data = tetrahedron(1.0);
        assert_eq!(data.vertices.len(), 12);
        assert_eq!(data.triangle_count(), 4);
        for vertex in &data.vertices {
            let len = Vector3::from(vertex.position).magnitude();
            assert!((len - 1.0).abs() < 1e-5);
        }
        for face in data.vertices.chunks(3) {
            assert_eq!(face[0].normal, face[1].normal);
            assert_eq!(face[1].normal, face[2].normal);
        }
    }
}
