//! End-to-end checks of the nine-body scene, from construction through
//! animation to teardown, all without a GPU device.

use cgmath::{InnerSpace, Rotation, Vector3};

use orrery::animation::angle_at;
use orrery::bodies::{PLANETS, ShapeFamily};
use orrery::builder::build_solar_scene;
use orrery::scene::orientation;

#[test]
fn nine_bodies_orbit_the_sun() {
    let (bundle, orrery) = build_solar_scene();
    let scene = &bundle.scene;

    assert_eq!(scene.attached_group_count(), 9);
    assert_eq!(scene.meshes.len(), 1);

    for (handle, config) in orrery.bodies().iter().zip(PLANETS.iter()) {
        let group = scene.group(handle.group);
        assert_eq!(group.meshes.len(), 1);
        assert_eq!(
            group.meshes[0].transform.position,
            Vector3::new(config.radial_distance, 0.0, 0.0)
        );
        assert_eq!(
            group.meshes[0].transform.scale,
            Vector3::new(config.scale, config.scale, config.scale)
        );
    }
}

#[test]
fn shape_families_follow_the_body_table() {
    let (bundle, orrery) = build_solar_scene();
    // worm horns and pyramids alternate, with the one bowl at earth
    let expected = [
        ShapeFamily::WormHorn,
        ShapeFamily::Pyramid,
        ShapeFamily::Bowl,
        ShapeFamily::WormHorn,
        ShapeFamily::Pyramid,
        ShapeFamily::WormHorn,
        ShapeFamily::Pyramid,
        ShapeFamily::WormHorn,
        ShapeFamily::Pyramid,
    ];
    for (handle, family) in orrery.bodies().iter().zip(expected) {
        assert_eq!(handle.config.shape, family);
        // bodies of one family share a geometry buffer
        let geometry = bundle.scene.group(handle.group).meshes[0].geometry;
        let expected_geometry = orrery
            .bodies()
            .iter()
            .find(|other| other.config.shape == family)
            .map(|other| bundle.scene.group(other.group).meshes[0].geometry);
        assert_eq!(Some(geometry), expected_geometry);
    }
}

#[test]
fn orbit_rotation_moves_bodies_around_their_axis() {
    let (mut bundle, orrery) = build_solar_scene();
    let time = 2.0;
    orrery.advance(&mut bundle.scene, time);

    let transforms = bundle.scene.world_transforms();
    // index 0 is the sun; bodies follow in table order
    for (i, config) in PLANETS.iter().enumerate() {
        let rotation = orientation(config.orbit_axis, angle_at(time, config.orbit_velocity));
        let expected = rotation.rotate_vector(Vector3::new(config.radial_distance, 0.0, 0.0));
        let actual = transforms[i + 1].position;
        assert!(
            (actual - expected).magnitude() < 1e-3,
            "{}: {:?} vs {:?}",
            config.name,
            actual,
            expected
        );
    }
}

#[test]
fn animation_preserves_radial_distances() {
    let (mut bundle, orrery) = build_solar_scene();
    for step in 1..20 {
        orrery.advance(&mut bundle.scene, step as f32 * 0.37);
        let transforms = bundle.scene.world_transforms();
        for (i, config) in PLANETS.iter().enumerate() {
            let radius = transforms[i + 1].position.magnitude();
            assert!((radius - config.radial_distance).abs() < 1e-2);
        }
    }
}

#[test]
fn draw_order_is_stable_under_animation() {
    let (mut bundle, orrery) = build_solar_scene();
    let before = bundle.scene.draw_list();
    orrery.advance(&mut bundle.scene, 5.0);
    orrery.advance(&mut bundle.scene, 11.0);
    assert_eq!(bundle.scene.draw_list(), before);
}

#[test]
fn unload_freezes_the_scene() {
    let (mut bundle, mut orrery) = build_solar_scene();
    orrery.advance(&mut bundle.scene, 1.0);
    let frozen = bundle.scene.world_transforms();

    orrery.unload();
    orrery.advance(&mut bundle.scene, 50.0);
    orrery.unload(); // teardown twice is fine

    let after = bundle.scene.world_transforms();
    for (a, b) in frozen.iter().zip(after.iter()) {
        assert_eq!(a.position, b.position);
        assert_eq!(a.rotation, b.rotation);
    }
}
