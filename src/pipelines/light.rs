use cgmath::InnerSpace;
use wgpu::util::DeviceExt;

use crate::scene::{Light, SPOTLIGHT_COUNT};

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointLightRaw {
    /// xyz position, w intensity.
    position: [f32; 4],
    /// rgb colour, w unused.
    color: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SpotLightRaw {
    /// xyz position, w intensity.
    position: [f32; 4],
    /// rgb colour, w cutoff distance.
    color_distance: [f32; 4],
    /// xyz direction towards the origin, w cosine of the cone half-angle.
    direction_angle: [f32; 4],
}

/// Uniform block for the whole lighting rig. The layout matches the
/// `Lighting` struct in `solar.wgsl`; every member is 16-byte aligned.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightingUniform {
    point: PointLightRaw,
    spots: [SpotLightRaw; SPOTLIGHT_COUNT],
}

impl LightingUniform {
    /// Pack the scene's lights. The first point light fills the point slot,
    /// spotlights fill the fixed-size array in order; extras are ignored and
    /// missing entries stay dark (zero intensity).
    pub fn from_lights(lights: &[Light]) -> Self {
        let mut uniform = Self {
            point: PointLightRaw {
                position: [0.0; 4],
                color: [0.0; 4],
            },
            spots: [SpotLightRaw {
                position: [0.0; 4],
                color_distance: [0.0; 4],
                direction_angle: [0.0, 0.0, -1.0, 1.0],
            }; SPOTLIGHT_COUNT],
        };

        let mut spot_slot = 0;
        for light in lights {
            match *light {
                Light::Point {
                    position,
                    color,
                    intensity,
                } => {
                    uniform.point = PointLightRaw {
                        position: [position.x, position.y, position.z, intensity],
                        color: [color[0], color[1], color[2], 0.0],
                    };
                }
                Light::Spot {
                    position,
                    color,
                    intensity,
                    distance,
                    angle,
                } => {
                    if spot_slot >= SPOTLIGHT_COUNT {
                        continue;
                    }
                    // Spotlights aim at the origin.
                    let direction = (-position).normalize();
                    uniform.spots[spot_slot] = SpotLightRaw {
                        position: [position.x, position.y, position.z, intensity],
                        color_distance: [color[0], color[1], color[2], distance],
                        direction_angle: [
                            direction.x,
                            direction.y,
                            direction.z,
                            angle.0.cos(),
                        ],
                    };
                    spot_slot += 1;
                }
            }
        }
        uniform
    }

    #[cfg(test)]
    pub(crate) fn spot_directions(&self) -> Vec<cgmath::Vector3<f32>> {
        self.spots
            .iter()
            .map(|spot| {
                cgmath::Vector3::new(
                    spot.direction_angle[0],
                    spot.direction_angle[1],
                    spot.direction_angle[2],
                )
            })
            .collect()
    }

    #[cfg(test)]
    pub(crate) fn spot_intensities(&self) -> Vec<f32> {
        self.spots.iter().map(|spot| spot.position[3]).collect()
    }
}

/// The lighting rig's GPU resources, uploaded once at scene setup.
pub struct LightingResources {
    pub uniform: LightingUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl LightingResources {
    pub fn new(device: &wgpu::Device, lights: &[Light]) -> Self {
        let uniform = LightingUniform::from_lights(lights);
        let buffer = mk_buffer(device, uniform);
        let bind_group_layout = mk_bind_group_layout(device);
        let bind_group = mk_bind_group(device, &bind_group_layout, &buffer);
        Self {
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    /// Replace the active rig and push it to the GPU.
    pub fn set_lights(&mut self, queue: &wgpu::Queue, lights: &[Light]) {
        self.uniform = LightingUniform::from_lights(lights);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}

pub fn mk_buffer(device: &wgpu::Device, uniform: LightingUniform) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Lighting Buffer"),
        contents: bytemuck::cast_slice(&[uniform]),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}

pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some("lighting_bind_group_layout"),
    })
}

pub fn mk_bind_group(
    device: &wgpu::Device,
    bind_group_layout: &wgpu::BindGroupLayout,
    buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout: bind_group_layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: buffer.as_entire_binding(),
        }],
        label: Some("lighting_bind_group"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Light, SPOTLIGHT_ANGLE, SPOTLIGHT_INTENSITY, Scene};
    use cgmath::InnerSpace;

    #[test]
    fn rig_packs_one_point_and_six_spots() {
        let mut scene = Scene::new(wgpu::Color::BLACK);
        scene.create_illumination();
        let uniform = LightingUniform::from_lights(&scene.lights);

        assert_eq!(uniform.point.position[3], 2.0);
        for intensity in uniform.spot_intensities() {
            assert_eq!(intensity, SPOTLIGHT_INTENSITY);
        }
    }

    #[test]
    fn spots_point_at_the_origin() {
        let mut scene = Scene::new(wgpu::Color::BLACK);
        scene.create_illumination();
        let uniform = LightingUniform::from_lights(&scene.lights);

        for (light, direction) in scene
            .lights
            .iter()
            .filter(|l| matches!(l, Light::Spot { .. }))
            .zip(uniform.spot_directions())
        {
            let Light::Spot { position, .. } = light else {
                unreachable!()
            };
            // direction is the unit vector from the light to the origin
            assert!((direction + position.normalize()).magnitude() < 1e-5);
        }
    }

    #[test]
    fn cone_angle_is_stored_as_cosine() {
        let mut scene = Scene::new(wgpu::Color::BLACK);
        scene.create_illumination();
        let uniform = LightingUniform::from_lights(&scene.lights);
        assert!((uniform.spots[0].direction_angle[3] - SPOTLIGHT_ANGLE.0.cos()).abs() < 1e-6);
    }

    #[test]
    fn missing_lights_stay_dark() {
        let uniform = LightingUniform::from_lights(&[]);
        assert_eq!(uniform.point.position[3], 0.0);
        assert!(uniform.spot_intensities().iter().all(|&i| i == 0.0));
    }
}
