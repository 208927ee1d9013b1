//! Sketch lifecycle and the application event loop.
//!
//! A sketch is one self-contained animation: it builds its scene when the GPU
//! context is ready, advances the animation every frame from the elapsed
//! time, records its draw calls, and releases its state exactly once at
//! shutdown.
//!
//! # Lifecycle
//!
//! 1. The constructor runs asynchronously once the window and device exist
//!    and loads all assets.
//! 2. `setup()` is called once to configure the context (camera, lights,
//!    clear colour).
//! 3. `update()` then `draw()` run every frame until the window closes.
//! 4. `unload()` runs once at shutdown; the orbit controller is disposed in
//!    the same step. Teardown is safe to repeat.

use std::{iter, pin::Pin, sync::Arc};

use instant::Instant;
use winit::{
    application::ApplicationHandler,
    event::{DeviceEvent, DeviceId, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    window::Window,
};

use crate::context::{Context, InitContext};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// A renderable animation driven by the event loop.
pub trait Sketch {
    /// Configure the context once after construction. This is the place to
    /// position the camera, install lights and set the clear colour.
    fn setup(&mut self, ctx: &mut Context);

    /// Advance the animation. `time` is seconds since setup.
    fn update(&mut self, ctx: &mut Context, time: f32);

    /// Record this frame's draw calls. The pipeline is already set.
    fn draw<'pass>(&'pass self, ctx: &'pass Context, render_pass: &mut wgpu::RenderPass<'pass>);

    /// Release per-sketch state. Called once at shutdown and must tolerate
    /// repeated calls.
    fn unload(&mut self, ctx: &mut Context);
}

/// Factory for a sketch. Takes an [`InitContext`] and asynchronously returns
/// the constructed sketch, allowing assets to load off the event loop.
pub type SketchConstructor =
    Box<dyn FnOnce(InitContext) -> Pin<Box<dyn Future<Output = Box<dyn Sketch>>>>>;

/// GPU context plus surface status.
pub struct AppState {
    pub(crate) ctx: Context,
    is_surface_configured: bool,
}

impl AppState {
    async fn new(window: Arc<Window>) -> Self {
        let ctx = match Context::new(window).await {
            Ok(ctx) => ctx,
            Err(e) => panic!(
                "App initialization failed. Cannot create the main context: {}",
                e
            ),
        };
        Self {
            ctx,
            is_surface_configured: false,
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.is_surface_configured = true;
            self.ctx.resize(width, height);
        }
    }

    fn render(&mut self, sketch: &dyn Sketch) -> Result<(), wgpu::SurfaceError> {
        self.ctx.window.request_redraw();

        // Rendering requires the surface to be configured
        if !self.is_surface_configured {
            return Ok(());
        }

        let output = self.ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder =
            self.ctx
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Render Encoder"),
                });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.ctx.clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.ctx.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_pipeline(&self.ctx.pipeline);
            sketch.draw(&self.ctx, &mut render_pass);
        }

        self.ctx.queue.submit(iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

pub(crate) enum SketchEvent {
    /// The message from the wasm `spawn_local` once async init finished.
    Initialized {
        state: AppState,
        sketch: Box<dyn Sketch>,
    },
}

pub struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    #[cfg(target_arch = "wasm32")]
    proxy: winit::event_loop::EventLoopProxy<SketchEvent>,
    state: Option<AppState>,
    sketch: Option<Box<dyn Sketch>>,
    // Holds the constructor until `resumed`; `take()`n after use.
    constructor: Option<SketchConstructor>,
    start_time: Instant,
    mouse_pressed: bool,
    shut_down: bool,
}

impl App {
    fn new(
        event_loop: &EventLoop<SketchEvent>,
        constructor: SketchConstructor,
    ) -> anyhow::Result<Self> {
        #[cfg(target_arch = "wasm32")]
        let proxy = event_loop.create_proxy();
        #[cfg(not(target_arch = "wasm32"))]
        let _ = event_loop;
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime: tokio::runtime::Runtime::new()?,
            #[cfg(target_arch = "wasm32")]
            proxy,
            state: None,
            sketch: None,
            constructor: Some(constructor),
            start_time: Instant::now(),
            mouse_pressed: false,
            shut_down: false,
        })
    }

    /// Tear the sketch down and leave the event loop. The unload path runs at
    /// most once even if the window manager sends several close requests.
    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if !self.shut_down {
            self.shut_down = true;
            if let (Some(state), Some(sketch)) = (&mut self.state, &mut self.sketch) {
                sketch.unload(&mut state.ctx);
                state.ctx.camera.controller.dispose();
            }
        }
        event_loop.exit();
    }
}

impl ApplicationHandler<SketchEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes();

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            const CANVAS_ID: &str = "canvas";

            let window = wgpu::web_sys::window().unwrap_throw();
            let document = window.document().unwrap_throw();
            let canvas = document.get_element_by_id(CANVAS_ID).unwrap_throw();
            let html_canvas_element = canvas.unchecked_into();
            window_attributes = window_attributes.with_canvas(Some(html_canvas_element));
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Could not create a window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let Some(constructor) = self.constructor.take() else {
            return;
        };

        let init_future = async move {
            let app_state = AppState::new(window).await;
            // The clone in into() leverages the internal Arcs of Device and
            // Queue and thus only clones the ref.
            let sketch = constructor((&app_state.ctx).into()).await;
            (app_state, sketch)
        };

        #[cfg(not(target_arch = "wasm32"))]
        {
            let (mut app_state, mut sketch) = self.async_runtime.block_on(init_future);
            sketch.setup(&mut app_state.ctx);
            let size = app_state.ctx.window.inner_size();
            app_state.resize(size.width, size.height);
            self.state = Some(app_state);
            self.sketch = Some(sketch);
            self.start_time = Instant::now();
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let (state, sketch) = init_future.await;
                assert!(
                    proxy
                        .send_event(SketchEvent::Initialized { state, sketch })
                        .is_ok()
                );
            });
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: SketchEvent) {
        match event {
            SketchEvent::Initialized { state, sketch } => {
                self.state = Some(state);
                self.sketch = Some(sketch);

                // Trigger a resize and redraw now that we are initialized.
                let state = match &mut self.state {
                    Some(state) => state,
                    None => return,
                };
                if let Some(sketch) = &mut self.sketch {
                    sketch.setup(&mut state.ctx);
                }
                let size = state.ctx.window.inner_size();
                state.resize(size.width, size.height);
                self.start_time = Instant::now();
                state.ctx.window.request_redraw();
            }
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            if self.mouse_pressed {
                state.ctx.camera.controller.handle_mouse(dx, dy);
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };

        match event {
            WindowEvent::CloseRequested => self.shutdown(event_loop),
            WindowEvent::Resized(size) => state.resize(size.width, size.height),
            WindowEvent::MouseInput {
                state: button_state,
                button: MouseButton::Left,
                ..
            } => {
                self.mouse_pressed = button_state.is_pressed();
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(position) => position.y as f32 * 0.05,
                };
                state.ctx.camera.controller.handle_scroll(scroll);
            }
            WindowEvent::RedrawRequested => {
                if self.shut_down {
                    return;
                }
                let time = self.start_time.elapsed().as_secs_f32();
                if let Some(sketch) = &mut self.sketch {
                    sketch.update(&mut state.ctx, time);
                }
                state.ctx.update_camera();

                let Some(sketch) = &self.sketch else {
                    return;
                };
                match state.render(sketch.as_ref()) {
                    Ok(_) => {}
                    // Reconfigure the surface if it's lost or outdated
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let size = state.ctx.window.inner_size();
                        state.resize(size.width, size.height);
                    }
                    Err(e) => {
                        log::error!("Unable to render {}", e);
                    }
                }
            }
            _ => {}
        }
    }
}

/// Run one sketch until its window closes.
pub fn run(constructor: SketchConstructor) -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        console_log::init_with_level(log::Level::Info).unwrap_throw();
    }

    let event_loop: EventLoop<SketchEvent> = EventLoop::with_user_event().build()?;
    let mut app = App::new(&event_loop, constructor)?;
    event_loop.run_app(&mut app)?;

    Ok(())
}
