//! orrery
//!
//! A pair of animated solar-system sketches on top of a small wgpu renderer,
//! runnable natively or in the browser. The crate keeps scene state on the
//! CPU side (graph, tessellation, animation) strictly apart from the GPU
//! resources that mirror it, so the interesting behaviour is testable without
//! a graphics device.
//!
//! High-level modules
//! - `scene`: the scene graph (groups, meshes, lights) and its invariants
//! - `geometry`: tessellation of the sphere, torus knot, bowl, pyramid and
//!   the parametric worm horn
//! - `bodies`: the data table of the nine orbiting bodies and the sun
//! - `animation`: maps elapsed time to orbit and spin rotations
//! - `camera`: camera, projection and the orbit interaction controller
//! - `context`: central GPU and window context that owns device/queue/pipeline
//! - `pipelines`: render pipeline and the lighting uniform block
//! - `render`: instanced scene rendering
//! - `resources`: texture loading for native and wasm targets
//! - `builder`: puts the two sketch scenes together
//! - `sketch`: sketch lifecycle and the application event loop
//!

pub mod animation;
pub mod bodies;
pub mod builder;
pub mod camera;
pub mod context;
pub mod geometry;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod scene;
pub mod sketch;

pub use builder::{solar, terra};
pub use sketch::run;
