//! Simulation configuration.
//!
//! [`SimConfig`] gathers every tunable of the simulation in one validated struct. All fields have
//! defaults; with the `serde` feature enabled, missing keys in a serialized config fall back to
//! those defaults.
use crate::error::{Error, Result};
use crate::particle::boundary::BoundaryPolicy;
use crate::particle::lifecycle::LifecycleFrames;
use crate::preset::{CloudTypeDef, CloudTypeId};
use crate::sampling::SpawnRegion;

/// Upper bound accepted for [`SimConfig::trail_length`].
pub const MAX_TRAIL_LENGTH: usize = 4096;

/// Spawn policy settings.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct SpawnConfig {
    /// Chance per frame that an eligible spawn actually happens.
    pub probability: f32,
    /// Seconds that must elapse between two spawns.
    pub min_interval_s: f32,
    /// Spawning stops once the population reaches this size.
    pub max_particles: usize,
    /// Only spawn a new cloud once the previous one is gone.
    pub single_cloud_mode: bool,
    /// Spawn at the end of a frame that would otherwise leave the sky empty.
    pub force_initial_cloud: bool,
    /// Where new clouds appear.
    pub region: SpawnRegion,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            probability: 0.2,
            min_interval_s: 10.0,
            max_particles: 6,
            single_cloud_mode: false,
            force_initial_cloud: false,
            region: SpawnRegion::default(),
        }
    }
}

/// Fragmentation settings.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct SplitConfig {
    /// Chance per frame that a stable cloud breaks up.
    ///
    /// Fragments are born stable and a fading parent keeps rolling, so the population grows
    /// geometrically unless this stays small relative to the stable phase length.
    pub scatter_probability: f32,
    /// Inclusive range for the number of fragments.
    pub fragments: (u32, u32),
    /// Fragment radius as a fraction `[min, max)` of the parent radius.
    pub radius_factor: (f32, f32),
    /// Fragments land within `±offset_m / 2` of the parent on each axis.
    pub offset_m: f32,
    /// Frames the parent fades out for after splitting.
    pub fade_frames: u32,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            scatter_probability: 0.0,
            fragments: (2, 3),
            radius_factor: (0.8, 0.9),
            offset_m: 1000.0,
            fade_frames: 60,
        }
    }
}

/// Configuration for a [`crate::weather::WeatherSystem`].
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct SimConfig {
    /// Side length of the square domain in metres.
    pub domain_size_m: f32,
    /// Default frame duration in seconds.
    pub timestep_s: f32,
    /// Heading of the prevailing wind in degrees.
    pub drift_angle_deg: f32,
    /// Wind speed before per-cloud jitter and type factor.
    pub base_wind_speed: f32,
    /// Per-cloud speed jitter as a fraction of the speed.
    pub speed_jitter: f32,
    /// Scales every per-frame displacement.
    pub movement_multiplier: f32,
    /// Growth/stable/decay frame counts.
    pub lifecycle: LifecycleFrames,
    /// Number of past positions kept per cloud.
    pub trail_length: usize,
    /// Visibility scale applied to preset radii.
    pub radius_scale: f32,
    /// Clouds smaller than this are retired.
    pub retirement_radius_km: f32,
    /// Edge handling.
    pub boundary: BoundaryPolicy,
    pub spawn: SpawnConfig,
    pub split: SplitConfig,
    /// Multiplier applied to the raw coverage ratio.
    pub coverage_multiplier: f32,
    /// Clouds at or below this opacity are not rendered.
    pub visibility_epsilon: f32,
    /// Age in frames at which a cloud's drawn shape reaches full size.
    pub shape_growth_frames: u32,
    /// Type of the cloud spawned on construction. `None` draws by weight.
    pub initial_cloud_type: Option<CloudTypeId>,
    /// Available cloud types.
    pub cloud_types: Vec<CloudTypeDef>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            domain_size_m: 50_000.0,
            timestep_s: 1.0 / 60.0,
            drift_angle_deg: 135.0,
            base_wind_speed: 4.0,
            speed_jitter: 0.05,
            movement_multiplier: 1.0,
            lifecycle: LifecycleFrames::default(),
            trail_length: 15,
            radius_scale: 2.0,
            retirement_radius_km: 0.15,
            boundary: BoundaryPolicy::default(),
            spawn: SpawnConfig::default(),
            split: SplitConfig::default(),
            coverage_multiplier: 5.0,
            visibility_epsilon: 0.01,
            shape_growth_frames: 100,
            initial_cloud_type: None,
            cloud_types: CloudTypeDef::builtin(),
        }
    }
}

impl SimConfig {
    pub fn new(domain_size_m: f32) -> Self {
        Self {
            domain_size_m,
            ..Default::default()
        }
    }

    pub fn with_timestep(mut self, timestep_s: f32) -> Self {
        self.timestep_s = timestep_s;
        self
    }

    pub fn with_drift(mut self, angle_deg: f32, base_wind_speed: f32) -> Self {
        self.drift_angle_deg = angle_deg;
        self.base_wind_speed = base_wind_speed;
        self
    }

    pub fn with_speed_jitter(mut self, speed_jitter: f32) -> Self {
        self.speed_jitter = speed_jitter;
        self
    }

    pub fn with_movement_multiplier(mut self, movement_multiplier: f32) -> Self {
        self.movement_multiplier = movement_multiplier;
        self
    }

    pub fn with_lifecycle(mut self, lifecycle: LifecycleFrames) -> Self {
        self.lifecycle = lifecycle;
        self
    }

    pub fn with_trail_length(mut self, trail_length: usize) -> Self {
        self.trail_length = trail_length;
        self
    }

    pub fn with_boundary(mut self, boundary: BoundaryPolicy) -> Self {
        self.boundary = boundary;
        self
    }

    /// Switches between [`BoundaryPolicy::wrap`] and [`BoundaryPolicy::drift`] with default margins.
    pub fn with_wrap_around(self, wrap: bool) -> Self {
        let boundary = if wrap {
            BoundaryPolicy::wrap()
        } else {
            BoundaryPolicy::drift()
        };
        self.with_boundary(boundary)
    }

    pub fn with_spawn(mut self, spawn: SpawnConfig) -> Self {
        self.spawn = spawn;
        self
    }

    pub fn with_split(mut self, split: SplitConfig) -> Self {
        self.split = split;
        self
    }

    pub fn with_scatter_probability(mut self, scatter_probability: f32) -> Self {
        self.split.scatter_probability = scatter_probability;
        self
    }

    pub fn with_initial_cloud_type(mut self, id: impl Into<CloudTypeId>) -> Self {
        self.initial_cloud_type = Some(id.into());
        self
    }

    pub fn with_cloud_types(mut self, cloud_types: Vec<CloudTypeDef>) -> Self {
        self.cloud_types = cloud_types;
        self
    }

    /// Metres a cloud at unit speed covers per frame.
    pub fn distance_per_frame(&self) -> f32 {
        self.timestep_s * (self.domain_size_m / 1000.0)
    }

    /// Domain side length in kilometres.
    pub fn domain_size_km(&self) -> f32 {
        self.domain_size_m / 1000.0
    }

    /// Validates the configuration, returning an error if invalid.
    ///
    /// Cloud type definitions are checked when the registry is built.
    pub fn validate(&self) -> Result<()> {
        fn positive(value: f32) -> bool {
            value.is_finite() && value > 0.0
        }
        fn unit(value: f32) -> bool {
            (0.0..=1.0).contains(&value)
        }

        if !positive(self.domain_size_m) {
            return Err(Error::InvalidConfig("domain_size_m must be > 0".into()));
        }
        if !positive(self.timestep_s) {
            return Err(Error::InvalidConfig("timestep_s must be > 0".into()));
        }
        if !self.drift_angle_deg.is_finite() {
            return Err(Error::InvalidConfig("drift_angle_deg must be finite".into()));
        }
        if !(self.base_wind_speed.is_finite() && self.base_wind_speed >= 0.0) {
            return Err(Error::InvalidConfig("base_wind_speed must be >= 0".into()));
        }
        if !(0.0..1.0).contains(&self.speed_jitter) {
            return Err(Error::InvalidConfig("speed_jitter must be in [0, 1)".into()));
        }
        if !(self.movement_multiplier.is_finite() && self.movement_multiplier >= 0.0) {
            return Err(Error::InvalidConfig(
                "movement_multiplier must be >= 0".into(),
            ));
        }
        self.lifecycle.validate()?;
        if self.trail_length > MAX_TRAIL_LENGTH {
            return Err(Error::InvalidConfig(format!(
                "trail_length must be <= {MAX_TRAIL_LENGTH}"
            )));
        }
        if !positive(self.radius_scale) {
            return Err(Error::InvalidConfig("radius_scale must be > 0".into()));
        }
        if !(self.retirement_radius_km.is_finite() && self.retirement_radius_km >= 0.0) {
            return Err(Error::InvalidConfig(
                "retirement_radius_km must be >= 0".into(),
            ));
        }
        self.boundary.validate()?;

        if !unit(self.spawn.probability) {
            return Err(Error::InvalidConfig(
                "spawn.probability must be in [0, 1]".into(),
            ));
        }
        if !(self.spawn.min_interval_s.is_finite() && self.spawn.min_interval_s >= 0.0) {
            return Err(Error::InvalidConfig(
                "spawn.min_interval_s must be >= 0".into(),
            ));
        }
        if self.spawn.max_particles == 0 {
            return Err(Error::InvalidConfig(
                "spawn.max_particles must be > 0".into(),
            ));
        }
        if !self.spawn.region.is_valid() {
            return Err(Error::InvalidConfig(
                "spawn.region must be ordered fractions within [0, 1]".into(),
            ));
        }

        if !unit(self.split.scatter_probability) {
            return Err(Error::InvalidConfig(
                "split.scatter_probability must be in [0, 1]".into(),
            ));
        }
        let (f_min, f_max) = self.split.fragments;
        if f_min == 0 || f_min > f_max {
            return Err(Error::InvalidConfig(
                "split.fragments must be a non-empty range starting at >= 1".into(),
            ));
        }
        let (r_min, r_max) = self.split.radius_factor;
        if !(positive(r_min) && r_max.is_finite() && r_min <= r_max) {
            return Err(Error::InvalidConfig(
                "split.radius_factor must be an ordered range of positive values".into(),
            ));
        }
        if !(self.split.offset_m.is_finite() && self.split.offset_m >= 0.0) {
            return Err(Error::InvalidConfig("split.offset_m must be >= 0".into()));
        }

        if !(self.coverage_multiplier.is_finite() && self.coverage_multiplier >= 0.0) {
            return Err(Error::InvalidConfig(
                "coverage_multiplier must be >= 0".into(),
            ));
        }
        if !unit(self.visibility_epsilon) {
            return Err(Error::InvalidConfig(
                "visibility_epsilon must be in [0, 1]".into(),
            ));
        }
        if self.shape_growth_frames == 0 {
            return Err(Error::InvalidConfig(
                "shape_growth_frames must be > 0".into(),
            ));
        }

        Ok(())
    }
}
