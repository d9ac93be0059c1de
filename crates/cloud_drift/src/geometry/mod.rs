//! Projection of particles into renderer-facing shape descriptors.
//!
//! [`project`] is a pure function of a particle's current state. [`ops`] holds stateless
//! transforms over lists of [`CloudShape`]s (filtering, ordering, blending between frames).
use glam::Vec2;

use crate::particle::Particle;
use crate::preset::CloudTypeId;

pub mod ops;

/// Metres of drawn diameter per kilometre of radius.
const DIAMETER_M_PER_RADIUS_KM: f32 = 2000.0;

/// Drawable ellipse for one cloud.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CloudShape {
    /// Centre in domain coordinates (metres).
    pub position: Vec2,
    /// Full width in metres.
    pub width: f32,
    /// Full height in metres.
    pub height: f32,
    /// Rotation in radians. Always zero for now.
    pub rotation: f32,
    /// Opacity in [0, 1].
    pub opacity: f32,
    pub altitude_km: f32,
    pub cloud_type: CloudTypeId,
}

impl CloudShape {
    /// Area of the bounding box, used for draw ordering.
    pub fn area(&self) -> f32 {
        self.width * self.height
    }
}

/// Width and height of a cloud of `radius_km`, stretched by `elongation` and scaled by
/// `growth` in [0, 1].
pub fn shape_extents(radius_km: f32, elongation: (f32, f32), growth: f32) -> (f32, f32) {
    let diameter_m = radius_km * DIAMETER_M_PER_RADIUS_KM;
    (
        diameter_m * elongation.0 * growth,
        diameter_m * elongation.1 * growth,
    )
}

/// Builds the shape descriptor for the particle's current state.
pub fn project(particle: &Particle) -> CloudShape {
    let growth = (particle.age() as f32 / particle.shape_growth_frames() as f32).min(1.0);
    let preset = particle.preset();
    let (width, height) = shape_extents(particle.radius_km(), preset.elongation, growth);

    CloudShape {
        position: particle.position(),
        width,
        height,
        rotation: 0.0,
        opacity: particle.opacity(),
        altitude_km: particle.altitude_km(),
        cloud_type: preset.id.clone(),
    }
}
