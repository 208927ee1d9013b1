//! Scene construction for the two sketches.
//!
//! Everything here is CPU-side: tessellation parameters, body placement,
//! lights and view settings. [`SceneSketch`] then pairs a built scene with
//! its GPU resources and implements the sketch lifecycle.

use cgmath::{Point3, Vector3};

use crate::{
    animation::{BodyHandle, Orrery},
    bodies::{PLANETS, SUN_SCALE, SUN_TEXTURE, ShapeFamily},
    context::{Context, InitContext},
    geometry::{MeshData, cylinder, sphere, tetrahedron, torus_knot, worm_horn},
    render::{GpuGeometry, SceneRenderer},
    resources::load_material,
    scene::{Light, MeshNode, Scene},
    sketch::{Sketch, SketchConstructor},
};

/// Initial camera placement of a sketch.
#[derive(Clone, Copy, Debug)]
pub struct ViewSettings {
    pub camera_position: Point3<f32>,
    pub orbit_target: Point3<f32>,
}

/// A complete CPU-side scene: graph, tessellated geometry, texture names and
/// the view. Handed to [`SceneSketch::new`] for GPU upload.
pub struct SceneBundle {
    pub scene: Scene,
    /// Geometry per [`crate::scene::GeometryId`], with a debug name.
    pub geometries: Vec<(&'static str, MeshData)>,
    /// Texture file per [`crate::scene::MaterialId`].
    pub textures: Vec<&'static str>,
    pub view: ViewSettings,
}

/// Convert a `0xRRGGBB` hex colour to a linear clear colour.
pub fn clear_colour(hex: u32) -> wgpu::Color {
    fn channel(byte: u32) -> f64 {
        let c = byte as f64 / 255.0;
        if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    }
    wgpu::Color {
        r: channel((hex >> 16) & 0xff),
        g: channel((hex >> 8) & 0xff),
        b: channel(hex & 0xff),
        a: 1.0,
    }
}

fn geometry_index(shape: ShapeFamily) -> usize {
    match shape {
        ShapeFamily::WormHorn => 1,
        ShapeFamily::Pyramid => 2,
        ShapeFamily::Bowl => 3,
    }
}

/// The quiet sketch: a single textured sphere off to the side of a central
/// point light. Nothing animates except the camera.
pub fn build_terra_scene() -> SceneBundle {
    let mut scene = Scene::new(clear_colour(0x121212));

    let mut mesh = MeshNode::new(0, 0);
    mesh.transform.position = Vector3::new(10.0, 0.0, 0.0);
    mesh.transform.scale = Vector3::new(2.0, 2.0, 2.0);
    scene.add_mesh(mesh);

    scene.add_light(Light::Point {
        position: Vector3::new(0.0, 0.0, 0.0),
        color: [1.0, 1.0, 1.0],
        intensity: 1.25,
    });

    SceneBundle {
        scene,
        geometries: vec![("sphere", sphere(1.0, 32, 16))],
        textures: vec!["tierra.jpg"],
        view: ViewSettings {
            camera_position: Point3::new(0.0, 10.0, 30.0),
            orbit_target: Point3::new(0.0, 0.0, 0.0),
        },
    }
}

/// The rich sketch: a spinning torus-knot sun orbited by nine bodies, lit by
/// the point light and the six-spotlight rig.
pub fn build_solar_scene() -> (SceneBundle, Orrery) {
    let mut scene = Scene::new(clear_colour(0x331157));

    let mut sun_mesh = MeshNode::new(0, 0);
    sun_mesh.transform.scale = Vector3::new(SUN_SCALE, SUN_SCALE, SUN_SCALE);
    let sun = scene.add_mesh(sun_mesh);

    let bodies = PLANETS
        .iter()
        .enumerate()
        .map(|(i, config)| {
            let group = scene.create_group();
            scene.create_body(
                MeshNode::new(geometry_index(config.shape), i + 1),
                group,
                config.radial_distance,
                config.scale,
            );
            BodyHandle { config, group }
        })
        .collect();

    scene.create_illumination();

    let mut textures = vec![SUN_TEXTURE];
    textures.extend(PLANETS.iter().map(|config| config.texture));

    let bundle = SceneBundle {
        scene,
        geometries: vec![
            ("torus_knot", torus_knot(3.5, 1.5, 64, 8, 2, 3)),
            ("worm_horn", worm_horn()),
            ("pyramid", tetrahedron(1.0)),
            (
                "bowl",
                cylinder(6.4, 1.1, 3.2, 50, 2, false, 0.0, 1.5 * std::f32::consts::PI),
            ),
        ],
        textures,
        view: ViewSettings {
            camera_position: Point3::new(30.0, 5.0, 35.0),
            orbit_target: Point3::new(30.0, 0.0, 0.0),
        },
    };
    (bundle, Orrery::new(sun, bodies))
}

/// A scene bundle together with its uploaded GPU resources and optional
/// animation driver.
pub struct SceneSketch {
    scene: Scene,
    renderer: SceneRenderer,
    driver: Option<Orrery>,
    view: ViewSettings,
}

impl SceneSketch {
    pub async fn new(init: InitContext, bundle: SceneBundle, driver: Option<Orrery>) -> Self {
        let geometries = bundle
            .geometries
            .iter()
            .map(|(name, data)| GpuGeometry::new(&init.device, name, data))
            .collect();

        let material_futures = bundle
            .textures
            .iter()
            .map(|name| load_material(name, &init.device, &init.queue, &init.material_layout));
        let materials = futures::future::join_all(material_futures).await;

        let renderer = SceneRenderer::new(&init.device, &bundle.scene, geometries, materials);
        Self {
            scene: bundle.scene,
            renderer,
            driver,
            view: bundle.view,
        }
    }
}

impl Sketch for SceneSketch {
    fn setup(&mut self, ctx: &mut Context) {
        ctx.clear_colour = self.scene.clear_colour;
        ctx.set_lights(&self.scene.lights);
        let camera = {
            ctx.camera.camera.position = self.view.camera_position;
            ctx.camera.camera
        };
        ctx.camera
            .controller
            .set_target(&camera, self.view.orbit_target);
    }

    fn update(&mut self, ctx: &mut Context, time: f32) {
        if let Some(driver) = &self.driver {
            driver.advance(&mut self.scene, time);
        }
        self.renderer.prepare(&ctx.queue, &self.scene);
    }

    fn draw<'pass>(&'pass self, ctx: &'pass Context, render_pass: &mut wgpu::RenderPass<'pass>) {
        self.renderer
            .draw(render_pass, &ctx.camera.bind_group, &ctx.lighting.bind_group);
    }

    fn unload(&mut self, ctx: &mut Context) {
        if let Some(driver) = &mut self.driver {
            driver.unload();
        }
        ctx.camera.controller.dispose();
    }
}

/// Constructor for the single-sphere sketch.
pub fn terra() -> SketchConstructor {
    Box::new(|init| {
        Box::pin(async move {
            let bundle = build_terra_scene();
            Box::new(SceneSketch::new(init, bundle, None).await) as Box<dyn Sketch>
        })
    })
}

/// Constructor for the nine-body sketch.
pub fn solar() -> SketchConstructor {
    Box::new(|init| {
        Box::pin(async move {
            let (bundle, orrery) = build_solar_scene();
            Box::new(SceneSketch::new(init, bundle, Some(orrery)).await) as Box<dyn Sketch>
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_colours_convert_to_linear() {
        let colour = clear_colour(0x121212);
        assert!((colour.r - 0.00605).abs() < 1e-4);
        assert_eq!(colour.r, colour.g);
        assert_eq!(colour.g, colour.b);
        assert_eq!(colour.a, 1.0);

        let purple = clear_colour(0x331157);
        assert!(purple.b > purple.r);
        assert!(purple.r > purple.g);
    }

    #[test]
    fn terra_scene_is_one_sphere_and_one_light() {
        let bundle = build_terra_scene();
        assert_eq!(bundle.scene.meshes.len(), 1);
        assert_eq!(bundle.scene.attached_group_count(), 0);
        assert_eq!(bundle.scene.lights.len(), 1);
        assert_eq!(
            bundle.scene.meshes[0].transform.position,
            Vector3::new(10.0, 0.0, 0.0)
        );
        assert_eq!(bundle.geometries.len(), 1);
        assert_eq!(bundle.textures, vec!["tierra.jpg"]);
    }

    #[test]
    fn solar_scene_has_nine_orbit_groups_and_the_rig() {
        let (bundle, orrery) = build_solar_scene();
        assert_eq!(bundle.scene.attached_group_count(), 9);
        assert_eq!(bundle.scene.meshes.len(), 1); // the sun
        assert_eq!(bundle.scene.lights.len(), 7); // point + six spots
        assert_eq!(orrery.bodies().len(), 9);
        assert!(orrery.is_running());
        assert_eq!(bundle.textures.len(), 10);
    }

    #[test]
    fn every_body_uses_its_family_geometry() {
        let (bundle, orrery) = build_solar_scene();
        for handle in orrery.bodies() {
            let group = bundle.scene.group(handle.group);
            assert_eq!(group.meshes.len(), 1);
            assert_eq!(
                group.meshes[0].geometry,
                geometry_index(handle.config.shape)
            );
        }
    }

    #[test]
    fn materials_are_unique_per_body() {
        let (bundle, orrery) = build_solar_scene();
        let mut seen: Vec<usize> = orrery
            .bodies()
            .iter()
            .map(|handle| bundle.scene.group(handle.group).meshes[0].material)
            .collect();
        seen.sort_unstable();
        assert_eq!(seen, (1..=9).collect::<Vec<_>>());
    }
}
