//! Camera, projection and the orbit interaction controller.
//!
//! The camera is positioned once at setup; per-frame movement is owned by the
//! [`OrbitController`], which revolves the camera around a configurable target
//! point in response to mouse input. The controller is updated once per frame
//! before rendering and disposed at teardown.

use cgmath::{InnerSpace, Matrix4, Point3, Rad, Vector3, perspective};
use wgpu::util::DeviceExt;

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

#[derive(Clone, Copy, Debug)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
}

impl Camera {
    pub fn new<P: Into<Point3<f32>>>(position: P) -> Self {
        Self {
            position: position.into(),
            target: Point3::new(0.0, 0.0, 0.0),
        }
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position, self.target, Vector3::unit_y())
    }
}

/// Perspective projection. Aspect follows the viewport on resize; the other
/// parameters are fixed for the whole session.
#[derive(Clone, Copy, Debug)]
pub struct Projection {
    aspect: f32,
    fovy: Rad<f32>,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width as f32 / height as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height as f32;
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::from_scale(1.0f32).into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera, projection: &Projection) {
        self.view_position = camera.position.to_homogeneous().into();
        self.view_proj = (projection.calc_matrix() * camera.calc_matrix()).into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

// Keep the orbit away from the poles so the up vector stays valid.
const PITCH_LIMIT: f32 = std::f32::consts::FRAC_PI_2 - 0.01;
const MIN_RADIUS: f32 = 1.0;
const MAX_RADIUS: f32 = 500.0;

/// Revolves the camera around a target point.
///
/// The spherical offset is derived from the camera position at construction
/// (and again when the target moves), so a sketch can place the camera freely
/// and the controller takes over from there. After `dispose` the controller
/// ignores all input and updates; disposal is idempotent.
#[derive(Clone, Copy, Debug)]
pub struct OrbitController {
    target: Point3<f32>,
    yaw: f32,
    pitch: f32,
    radius: f32,
    rotate_speed: f32,
    zoom_speed: f32,
    disposed: bool,
}

impl OrbitController {
    pub fn new(camera: &Camera, target: Point3<f32>) -> Self {
        let mut controller = Self {
            target,
            yaw: 0.0,
            pitch: 0.0,
            radius: 1.0,
            rotate_speed: 0.005,
            zoom_speed: 2.0,
            disposed: false,
        };
        controller.derive_from(camera);
        controller
    }

    fn derive_from(&mut self, camera: &Camera) {
        let offset = camera.position - self.target;
        self.radius = offset.magnitude().max(MIN_RADIUS);
        self.pitch = (offset.y / self.radius).clamp(-1.0, 1.0).asin();
        self.yaw = offset.z.atan2(offset.x);
    }

    pub fn target(&self) -> Point3<f32> {
        self.target
    }

    /// Move the orbit target, keeping the camera where it is.
    pub fn set_target(&mut self, camera: &Camera, target: Point3<f32>) {
        self.target = target;
        self.derive_from(camera);
    }

    pub fn handle_mouse(&mut self, dx: f64, dy: f64) {
        if self.disposed {
            return;
        }
        self.yaw += dx as f32 * self.rotate_speed;
        self.pitch = (self.pitch + dy as f32 * self.rotate_speed).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    pub fn handle_scroll(&mut self, delta: f32) {
        if self.disposed {
            return;
        }
        self.radius = (self.radius - delta * self.zoom_speed).clamp(MIN_RADIUS, MAX_RADIUS);
    }

    /// Apply the current orbit state to the camera. Called once per frame
    /// before the render call; a no-op once disposed.
    pub fn update(&self, camera: &mut Camera) {
        if self.disposed {
            return;
        }
        let offset = Vector3::new(
            self.pitch.cos() * self.yaw.cos(),
            self.pitch.sin(),
            self.pitch.cos() * self.yaw.sin(),
        ) * self.radius;
        camera.position = self.target + offset;
        camera.target = self.target;
    }

    /// Release the controller. Further input and updates are ignored;
    /// calling this twice is a no-op.
    pub fn dispose(&mut self) {
        self.disposed = true;
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

/// Camera state together with its GPU resources.
#[derive(Debug)]
pub struct CameraResources {
    pub camera: Camera,
    pub controller: OrbitController,
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl CameraResources {
    pub fn new(device: &wgpu::Device, camera: Camera, projection: &Projection) -> Self {
        let controller = OrbitController::new(&camera, Point3::new(0.0, 0.0, 0.0));

        let mut uniform = CameraUniform::new();
        uniform.update_view_proj(&camera, projection);

        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = mk_bind_group_layout(device);
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });

        Self {
            camera,
            controller,
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    /// Advance the controller, refresh the uniform and push it to the GPU.
    pub fn update(&mut self, queue: &wgpu::Queue, projection: &Projection) {
        self.controller.update(&mut self.camera);
        self.uniform.update_view_proj(&self.camera, projection);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
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
        label: Some("camera_bind_group_layout"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Point3<f32>, b: Point3<f32>) -> bool {
        (a - b).magnitude() < 1e-4
    }

    #[test]
    fn controller_preserves_initial_camera_placement() {
        let mut camera = Camera::new((30.0, 5.0, 35.0));
        let mut controller = OrbitController::new(&camera, Point3::new(0.0, 0.0, 0.0));
        controller.set_target(&camera, Point3::new(30.0, 0.0, 0.0));

        let before = camera.position;
        controller.update(&mut camera);
        assert!(close(camera.position, before), "{:?}", camera.position);
        assert!(close(camera.target, Point3::new(30.0, 0.0, 0.0)));
    }

    #[test]
    fn mouse_orbit_keeps_distance_to_target() {
        let mut camera = Camera::new((0.0, 10.0, 30.0));
        let mut controller = OrbitController::new(&camera, Point3::new(0.0, 0.0, 0.0));
        let radius = (camera.position - controller.target()).magnitude();

        controller.handle_mouse(120.0, -45.0);
        controller.update(&mut camera);
        let after = (camera.position - controller.target()).magnitude();
        assert!((after - radius).abs() < 1e-3);
    }

    #[test]
    fn pitch_is_clamped_away_from_the_poles() {
        let mut camera = Camera::new((0.0, 0.0, 10.0));
        let mut controller = OrbitController::new(&camera, Point3::new(0.0, 0.0, 0.0));
        controller.handle_mouse(0.0, 1e6);
        controller.update(&mut camera);
        assert!(camera.position.y < 10.0);
    }

    #[test]
    fn disposed_controller_ignores_input_and_updates() {
        let mut camera = Camera::new((0.0, 10.0, 30.0));
        let mut controller = OrbitController::new(&camera, Point3::new(0.0, 0.0, 0.0));
        controller.dispose();
        controller.dispose(); // second call is a no-op

        let before = camera.position;
        controller.handle_mouse(500.0, 500.0);
        controller.handle_scroll(10.0);
        controller.update(&mut camera);
        assert!(controller.is_disposed());
        assert_eq!(camera.position, before);
    }
}
