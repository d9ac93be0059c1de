use std::time::Duration;

use cloud_drift::prelude::{SimConfig, SpawnConfig, WeatherSystem};
use criterion::{Criterion, Throughput};

pub const SAMPLE_SIZE: usize = 20;
pub const WARM_UP: Duration = Duration::from_secs(1);
pub const MEASUREMENT_TIME: Duration = Duration::from_secs(2);

pub fn default_criterion() -> Criterion {
    Criterion::default()
        .configure_from_args()
        .sample_size(SAMPLE_SIZE)
        .warm_up_time(WARM_UP)
        .measurement_time(MEASUREMENT_TIME)
}

pub fn elements_throughput(elements: usize) -> Throughput {
    Throughput::Elements(elements.max(1) as u64)
}

/// A config that keeps up to `max_particles` clouds in the sky.
#[allow(dead_code)]
pub fn busy_config(max_particles: usize, scatter_probability: f32) -> SimConfig {
    SimConfig::default()
        .with_spawn(SpawnConfig {
            probability: 1.0,
            min_interval_s: 0.0,
            max_particles,
            ..Default::default()
        })
        .with_scatter_probability(scatter_probability)
}

/// Builds a system and steps it until the population settles.
#[allow(dead_code)]
pub fn warmed_system(config: SimConfig, seed: u64, frames: usize) -> WeatherSystem {
    let mut system = WeatherSystem::try_new(config, seed).expect("valid bench config");
    for _ in 0..frames {
        system.step(None, None);
    }
    system
}
