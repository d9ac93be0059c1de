//! A single cloud: kinematics, lifecycle state and per-frame advancement.
//!
//! A [`Particle`] drifts at a constant velocity fixed at creation, ages one frame per
//! [`Particle::advance`] call and smooths its radius and opacity toward the targets of its
//! current [`lifecycle::Phase`]. Retirement is not stored; every advance reports it through
//! [`StepOutcome`] and the owner drops the particle.
use std::cell::OnceCell;
use std::sync::Arc;

use glam::Vec2;
use rand::RngCore;

use crate::config::SimConfig;
use crate::geometry::{self, CloudShape};
use crate::preset::CloudTypePreset;
use crate::sampling::{rand01, rand_range};

pub mod boundary;
pub mod lifecycle;
pub mod trail;

use boundary::BoundaryOutcome;
use lifecycle::{LifecycleFrames, LifecycleTargets, Phase};
use trail::Trail;

/// Weight kept from the current value on each smoothing step.
const SMOOTHING_KEEP: f32 = 0.95;
/// Lower bound of the opacity target, so clouds never fade to nothing through the lifecycle alone.
const MIN_TARGET_OPACITY: f32 = 0.7;
/// Per-frame opacity multiplier while a parent fades out after splitting.
const SPLIT_FADE_FACTOR: f32 = 0.95;

/// Why a particle was retired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RetireReason {
    /// The boundary policy reported that the cloud left the domain.
    LeftDomain,
    /// The cloud reached its maximum age.
    Expired,
    /// The cloud shrank below the retirement radius.
    Dissipated,
}

/// Result of advancing a particle by one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Alive,
    Retired(RetireReason),
}

impl StepOutcome {
    pub fn is_retired(&self) -> bool {
        matches!(self, Self::Retired(_))
    }
}

/// Velocity of a new cloud: prevailing heading, jittered speed, converted to metres per frame.
pub fn drift_velocity(
    config: &SimConfig,
    preset: &CloudTypePreset,
    rng: &mut dyn RngCore,
) -> Vec2 {
    let heading = Vec2::from_angle(config.drift_angle_deg.to_radians());
    let jitter = rand_range(rng, 1.0 - config.speed_jitter, 1.0 + config.speed_jitter);
    let speed = config.base_wind_speed * jitter * preset.speed_factor;
    heading * speed * config.distance_per_frame()
}

#[derive(Debug, Clone)]
pub struct Particle {
    position: Vec2,
    previous_position: Vec2,
    velocity: Vec2,
    preset: Arc<CloudTypePreset>,
    radius_km: f32,
    opacity: f32,
    altitude_km: f32,
    age: u32,
    lifecycle: LifecycleFrames,
    max_age: u32,
    split_flag: bool,
    split_fade_countdown: u32,
    shape_growth_frames: u32,
    trail: Trail,
    shape: OnceCell<CloudShape>,
}

impl Particle {
    /// Creates a newborn cloud at `position`, fully opaque and at its visible maximum radius.
    pub fn new(
        position: Vec2,
        velocity: Vec2,
        preset: Arc<CloudTypePreset>,
        config: &SimConfig,
    ) -> Self {
        Self {
            position,
            previous_position: position,
            velocity,
            radius_km: preset.radius_km_max * config.radius_scale,
            opacity: 1.0,
            altitude_km: preset.altitude_km,
            age: 0,
            lifecycle: config.lifecycle,
            max_age: config.lifecycle.max_age(),
            split_flag: false,
            split_fade_countdown: 0,
            shape_growth_frames: config.shape_growth_frames,
            trail: Trail::new(config.trail_length),
            shape: OnceCell::new(),
            preset,
        }
    }

    /// Creates a fragment of this cloud, displaced by `offset`.
    ///
    /// The fragment shares velocity and type, starts at `radius_factor` times the current
    /// radius, and is born at the start of the stable phase.
    pub fn fragment(&self, offset: Vec2, radius_factor: f32) -> Self {
        let position = self.position + offset;
        Self {
            position,
            previous_position: position,
            velocity: self.velocity,
            preset: self.preset.clone(),
            radius_km: self.radius_km * radius_factor,
            opacity: 1.0,
            altitude_km: self.altitude_km,
            age: self.lifecycle.growth,
            lifecycle: self.lifecycle,
            max_age: self.max_age,
            split_flag: false,
            split_fade_countdown: 0,
            shape_growth_frames: self.shape_growth_frames,
            trail: Trail::new(self.trail.capacity()),
            shape: OnceCell::new(),
        }
    }

    /// Overrides the age, e.g. to start a cloud mid-life.
    pub fn with_age(mut self, age: u32) -> Self {
        self.age = age;
        self.shape.take();
        self
    }

    /// Advances the cloud by one frame.
    ///
    /// `rng` is only consulted during the stable phase, for the split roll.
    pub fn advance(&mut self, config: &SimConfig, rng: &mut dyn RngCore) -> StepOutcome {
        self.previous_position = self.position;
        self.trail.push(self.position);

        self.age = self.age.saturating_add(1);
        self.position += self.velocity * config.movement_multiplier;

        let boundary = config.boundary.apply(
            &mut self.position,
            self.previous_position,
            config.domain_size_m,
        );

        let targets = self.lifecycle.targets(self.age);
        if self.lifecycle.phase(self.age) == Phase::Stable {
            let p = config.split.scatter_probability;
            if p > 0.0 && rand01(rng) < p {
                self.split_flag = true;
            }
        }

        let target_radius = self.preset.radius_km_max * config.radius_scale * targets.size_factor;
        let target_opacity =
            (self.preset.max_opacity * targets.opacity_factor).max(MIN_TARGET_OPACITY);
        self.radius_km = smooth(self.radius_km, target_radius);
        self.opacity = smooth(self.opacity, target_opacity).clamp(0.0, 1.0);

        if self.split_fade_countdown > 0 {
            self.split_fade_countdown -= 1;
            self.opacity *= SPLIT_FADE_FACTOR;
        }

        self.shape.take();

        if boundary == BoundaryOutcome::Exited {
            StepOutcome::Retired(RetireReason::LeftDomain)
        } else if self.age >= self.max_age {
            StepOutcome::Retired(RetireReason::Expired)
        } else if self.radius_km < config.retirement_radius_km {
            StepOutcome::Retired(RetireReason::Dissipated)
        } else {
            StepOutcome::Alive
        }
    }

    /// Shape descriptor for the current state, computed once per frame.
    pub fn shape(&self) -> &CloudShape {
        self.shape.get_or_init(|| geometry::project(self))
    }

    /// Clears the split flag and starts the parent fade-out.
    pub(crate) fn finish_split(&mut self, fade_frames: u32) {
        self.split_flag = false;
        self.split_fade_countdown = fade_frames;
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn previous_position(&self) -> Vec2 {
        self.previous_position
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn preset(&self) -> &Arc<CloudTypePreset> {
        &self.preset
    }

    pub fn cloud_type(&self) -> &str {
        &self.preset.id
    }

    pub fn radius_km(&self) -> f32 {
        self.radius_km
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn altitude_km(&self) -> f32 {
        self.altitude_km
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn max_age(&self) -> u32 {
        self.max_age
    }

    pub fn lifecycle(&self) -> LifecycleFrames {
        self.lifecycle
    }

    pub fn phase(&self) -> Phase {
        self.lifecycle.phase(self.age)
    }

    pub fn lifecycle_targets(&self) -> LifecycleTargets {
        self.lifecycle.targets(self.age)
    }

    pub fn is_flagged_for_split(&self) -> bool {
        self.split_flag
    }

    pub fn split_fade_countdown(&self) -> u32 {
        self.split_fade_countdown
    }

    pub(crate) fn shape_growth_frames(&self) -> u32 {
        self.shape_growth_frames
    }

    pub fn trail(&self) -> &Trail {
        &self.trail
    }

    pub fn clear_trail(&mut self) {
        self.trail.clear();
    }
}

#[inline]
fn smooth(current: f32, target: f32) -> f32 {
    current * SMOOTHING_KEEP + target * (1.0 - SMOOTHING_KEEP)
}
