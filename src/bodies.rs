//! The body table of the rich sketch.
//!
//! All per-body constants live here as data rather than inline construction
//! calls, so the table can be checked independently of any rendering.

use crate::scene::Axis;

/// The visual family a body's geometry is built from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShapeFamily {
    /// The piecewise parametric surface, tessellated once and shared.
    WormHorn,
    /// A unit tetrahedron.
    Pyramid,
    /// The partial open cylinder.
    Bowl,
}

/// Design-time constants of one celestial body.
#[derive(Clone, Copy, Debug)]
pub struct BodyConfig {
    pub name: &'static str,
    pub shape: ShapeFamily,
    pub texture: &'static str,
    /// Distance from the origin along the x axis.
    pub radial_distance: f32,
    /// Uniform scale factor.
    pub scale: f32,
    pub orbit_axis: Axis,
    /// Orbital angular velocity in radians per second, applied to the group.
    pub orbit_velocity: f32,
    pub spin_axis: Axis,
    /// Axial-spin angular velocity in radians per second, applied to the mesh.
    pub spin_velocity: f32,
}

/// The sun: a torus knot at the origin, scale 2, slow y spin, no orbit group.
pub const SUN_TEXTURE: &str = "splash.jpg";
pub const SUN_SCALE: f32 = 2.0;
pub const SUN_SPIN_AXIS: Axis = Axis::Y;
pub const SUN_SPIN_VELOCITY: f32 = 0.05;

/// The nine planets, ordered outward from the sun.
pub const PLANETS: [BodyConfig; 9] = [
    BodyConfig {
        name: "mercury",
        shape: ShapeFamily::WormHorn,
        texture: "jack.jpg",
        radial_distance: 25.0,
        scale: 0.5,
        orbit_axis: Axis::Z,
        orbit_velocity: 1.5,
        spin_axis: Axis::Z,
        spin_velocity: 0.20,
    },
    BodyConfig {
        name: "venus",
        shape: ShapeFamily::Pyramid,
        texture: "berries.jpg",
        radial_distance: 28.0,
        scale: 0.9,
        orbit_axis: Axis::Y,
        orbit_velocity: 1.35,
        spin_axis: Axis::Y,
        spin_velocity: 0.18,
    },
    BodyConfig {
        name: "earth",
        shape: ShapeFamily::Bowl,
        texture: "lemons.jpg",
        radial_distance: 31.0,
        scale: 0.2,
        orbit_axis: Axis::X,
        orbit_velocity: 1.3,
        spin_axis: Axis::X,
        spin_velocity: 0.15,
    },
    BodyConfig {
        name: "mars",
        shape: ShapeFamily::WormHorn,
        texture: "carrots.jpg",
        radial_distance: 34.0,
        scale: 0.5,
        orbit_axis: Axis::Z,
        orbit_velocity: 1.2,
        spin_axis: Axis::Z,
        spin_velocity: 0.2,
    },
    BodyConfig {
        name: "jupiter",
        shape: ShapeFamily::Pyramid,
        texture: "halfDonut.jpg",
        radial_distance: 42.0,
        scale: 3.5,
        orbit_axis: Axis::Y,
        orbit_velocity: 1.05,
        spin_axis: Axis::Y,
        spin_velocity: 0.05,
    },
    BodyConfig {
        name: "saturn",
        shape: ShapeFamily::WormHorn,
        texture: "figs.jpeg",
        radial_distance: 50.0,
        scale: 0.8,
        orbit_axis: Axis::Z,
        orbit_velocity: 1.03,
        spin_axis: Axis::Z,
        spin_velocity: 0.25,
    },
    BodyConfig {
        name: "uranus",
        shape: ShapeFamily::Pyramid,
        texture: "cabbage.jpg",
        radial_distance: 56.0,
        scale: 1.7,
        orbit_axis: Axis::Y,
        orbit_velocity: 1.02,
        spin_axis: Axis::Y,
        spin_velocity: 0.25,
    },
    BodyConfig {
        name: "neptune",
        shape: ShapeFamily::WormHorn,
        texture: "cookies.jpg",
        radial_distance: 60.0,
        scale: 0.6,
        orbit_axis: Axis::Z,
        orbit_velocity: 1.015,
        spin_axis: Axis::Z,
        spin_velocity: 0.25,
    },
    BodyConfig {
        name: "pluto",
        shape: ShapeFamily::Pyramid,
        texture: "donut.jpg",
        radial_distance: 64.0,
        scale: 0.5,
        orbit_axis: Axis::Y,
        orbit_velocity: 1.005,
        spin_axis: Axis::Y,
        spin_velocity: 0.2,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_lists_nine_distinct_bodies() {
        assert_eq!(PLANETS.len(), 9);
        for (i, a) in PLANETS.iter().enumerate() {
            for b in &PLANETS[i + 1..] {
                assert_ne!(a.name, b.name);
                assert_ne!(a.texture, b.texture);
            }
        }
    }

    #[test]
    fn distances_increase_outward() {
        for pair in PLANETS.windows(2) {
            assert!(pair[0].radial_distance < pair[1].radial_distance);
        }
    }

    #[test]
    fn documented_distance_scale_pairs() {
        let expected = [
            ("mercury", 25.0, 0.5),
            ("venus", 28.0, 0.9),
            ("earth", 31.0, 0.2),
            ("mars", 34.0, 0.5),
            ("jupiter", 42.0, 3.5),
            ("saturn", 50.0, 0.8),
            ("uranus", 56.0, 1.7),
            ("neptune", 60.0, 0.6),
            ("pluto", 64.0, 0.5),
        ];
        for (body, (name, distance, scale)) in PLANETS.iter().zip(expected) {
            assert_eq!(body.name, name);
            assert_eq!(body.radial_distance, distance);
            assert_eq!(body.scale, scale);
        }
    }

    #[test]
    fn outer_bodies_orbit_slower() {
        for pair in PLANETS.windows(2) {
            assert!(pair[0].orbit_velocity > pair[1].orbit_velocity);
        }
    }
}
