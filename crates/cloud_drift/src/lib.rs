#![forbid(unsafe_code)]
//! cloud_drift: Drifting cloud populations with lifecycle, splitting and shape projection.
//!
//! Modules:
//! - particle: a single cloud, its lifecycle phases, trail and boundary handling
//! - weather: the population scheduler plus drift and coverage aggregates
//! - geometry: ellipse descriptors for rendering and shape post-processing
//! - preset, config: cloud type catalog and simulation parameters
//! - events: diagnostic event sinks
//!
//! For examples and docs, see README and docs.rs.
pub mod config;
pub mod error;
pub mod events;
pub mod geometry;
pub mod particle;
pub mod preset;
pub mod sampling;
pub mod weather;

/// Convenient re-exports for common types. Import with `use cloud_drift::prelude::*;`.
pub mod prelude {
    pub use crate::config::{SimConfig, SpawnConfig, SplitConfig};
    pub use crate::error::{Error, Result};
    pub use crate::events::{
        EventSink, FnSink, MultiSink, SpawnReason, VecSink, WeatherEvent, WeatherEventKind,
    };
    pub use crate::geometry::ops::{
        filter_visible, interpolate, scatter_shapes_for_type, sort_by_altitude, sort_by_area,
        ShapePass,
    };
    pub use crate::geometry::{project, CloudShape};
    pub use crate::particle::boundary::{BoundaryOutcome, BoundaryPolicy};
    pub use crate::particle::lifecycle::{LifecycleFrames, LifecycleTargets, Phase};
    pub use crate::particle::{drift_velocity, Particle, RetireReason, StepOutcome};
    pub use crate::preset::{CloudTypeDef, CloudTypeId, CloudTypePreset, CloudTypeRegistry};
    pub use crate::sampling::{SpawnRegion, SpawnSampling};
    pub use crate::weather::{DriftEstimate, WeatherStats, WeatherSystem};
}
