use std::sync::Arc;

use anyhow::Result;
use winit::window::Window;

use crate::{
    camera::{Camera, CameraResources, Projection},
    pipelines::{basic::mk_basic_pipeline, light::LightingResources},
    resources::texture::Texture,
    scene::Light,
};

/// Field of view of both sketches. Wide on purpose; the scenes are large.
pub const FOVY: cgmath::Deg<f32> = cgmath::Deg(100.0);
pub const ZNEAR: f32 = 1.0;
pub const ZFAR: f32 = 1000.0;

/// Central GPU and window context. Owns the device, surface, the shared
/// render pipeline and the camera and lighting resources every sketch uses.
pub struct Context {
    pub(crate) window: Arc<Window>,
    pub(crate) depth_texture: Texture,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub camera: CameraResources,
    pub projection: Projection,
    pub lighting: LightingResources,
    pub pipeline: wgpu::RenderPipeline,
    pub clear_colour: wgpu::Color,
}

impl Context {
    pub async fn new(window: Arc<Window>) -> Result<Self> {
        let size = window.inner_size();

        log::info!("WGPU setup");
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            #[cfg(not(target_arch = "wasm32"))]
            backends: wgpu::Backends::PRIMARY,
            #[cfg(target_arch = "wasm32")]
            backends: wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;
        log::info!("device and queue");
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                // WebGL doesn't support all of wgpu's features.
                required_limits: if cfg!(target_arch = "wasm32") {
                    wgpu::Limits::downlevel_webgl2_defaults()
                } else {
                    wgpu::Limits::default()
                },
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;

        log::info!("Surface");
        let surface_caps = surface.get_capabilities(&adapter);
        // The shader assumes an sRGB surface texture; colours come out darker
        // on anything else.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(surface_caps.formats[0]);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let projection = Projection::new(config.width, config.height, FOVY, ZNEAR, ZFAR);
        let camera = CameraResources::new(&device, Camera::new((0.0, 10.0, 30.0)), &projection);

        let depth_texture = Texture::create_depth_texture(&device, &config, "depth_texture");

        // Dark until the sketch installs its rig.
        let lighting = LightingResources::new(&device, &[]);

        let pipeline = mk_basic_pipeline(
            &device,
            &config,
            &camera.bind_group_layout,
            &lighting.bind_group_layout,
        );

        Ok(Self {
            window,
            depth_texture,
            surface,
            device,
            queue,
            config,
            camera,
            projection,
            lighting,
            pipeline,
            clear_colour: wgpu::Color::BLACK,
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_texture =
            Texture::create_depth_texture(&self.device, &self.config, "depth_texture");
        self.projection.resize(width, height);
    }

    /// Install the sketch's lights, replacing whatever rig was active.
    pub fn set_lights(&mut self, lights: &[Light]) {
        self.lighting.set_lights(&self.queue, lights);
    }

    /// Advance the orbit controller and push the camera uniform.
    pub fn update_camera(&mut self) {
        self.camera.update(&self.queue, &self.projection);
    }
}

/// The slice of the context a sketch constructor needs to load assets and
/// build GPU resources before the event loop starts drawing.
pub struct InitContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub material_layout: wgpu::BindGroupLayout,
}

impl From<&Context> for InitContext {
    fn from(ctx: &Context) -> Self {
        Self {
            // Device and Queue are internally reference counted.
            device: ctx.device.clone(),
            queue: ctx.queue.clone(),
            material_layout: crate::resources::texture::diffuse_layout(&ctx.device),
        }
    }
}
