//! Population scheduler driving the whole cloud population frame by frame.
//!
//! [`WeatherSystem::step`] advances every cloud, removes retired ones, breaks up flagged clouds
//! into fragments, and applies the spawn policy. All randomness comes from one seeded generator
//! owned by the system, so two systems built from the same config and seed evolve identically.
use std::sync::Arc;

use glam::Vec2;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use crate::config::SimConfig;
use crate::error::Result;
use crate::events::{EventSink, SpawnReason, WeatherEvent, WeatherEventKind};
use crate::geometry::ops::ShapePass;
use crate::geometry::CloudShape;
use crate::particle::{drift_velocity, Particle, StepOutcome};
use crate::preset::{CloudTypePreset, CloudTypeRegistry};
use crate::sampling::SpawnSampling;

pub mod aggregate;
mod spawn;
mod split;

pub use aggregate::{coverage_pct, estimate_drift, DriftEstimate, SIMULATED_DRIFT_CONFIDENCE};
use aggregate::FrameCache;

/// Running totals since construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WeatherStats {
    pub spawned: u64,
    pub retired: u64,
    pub splits: u64,
}

/// Owns the live cloud population and steps it.
#[derive(Debug, Clone)]
pub struct WeatherSystem {
    config: SimConfig,
    registry: CloudTypeRegistry,
    initial_type: Option<Arc<CloudTypePreset>>,
    particles: Vec<Particle>,
    sim_time: f64,
    time_since_last_spawn: f64,
    rng: StdRng,
    stats: WeatherStats,
    drift_cache: FrameCache<DriftEstimate>,
    coverage_cache: FrameCache<f32>,
}

impl WeatherSystem {
    /// Validates `config`, builds the type registry and spawns the first cloud.
    pub fn try_new(config: SimConfig, seed: u64) -> Result<Self> {
        Self::try_new_with_events(config, seed, &mut ())
    }

    pub fn try_new_with_events(
        config: SimConfig,
        seed: u64,
        sink: &mut dyn EventSink,
    ) -> Result<Self> {
        config.validate()?;
        let registry = CloudTypeRegistry::from_defs(&config.cloud_types)?;
        let initial_type = config
            .initial_cloud_type
            .as_deref()
            .map(|id| registry.resolve(id))
            .transpose()?;

        let mut system = Self {
            config,
            registry,
            initial_type,
            particles: Vec::new(),
            sim_time: 0.0,
            time_since_last_spawn: 0.0,
            rng: StdRng::seed_from_u64(seed),
            stats: WeatherStats::default(),
            drift_cache: FrameCache::new(),
            coverage_cache: FrameCache::new(),
        };
        info!(
            "Weather system initialised: {} cloud types, heading {:.0} deg.",
            system.registry.len(),
            system.config.drift_angle_deg
        );
        system.spawn(SpawnReason::Initial, sink);
        Ok(system)
    }

    /// Advances the simulation by one frame.
    ///
    /// `dt` defaults to the configured timestep and feeds the spawn interval. `sim_time`
    /// overrides the simulation clock; without it the clock advances by one frame.
    pub fn step(&mut self, dt: Option<f32>, sim_time: Option<f64>) {
        self.step_with_events(dt, sim_time, &mut ());
    }

    pub fn step_with_events(
        &mut self,
        dt: Option<f32>,
        sim_time: Option<f64>,
        sink: &mut dyn EventSink,
    ) {
        self.advance_clock(dt, sim_time, sink);

        if self.particles.is_empty() {
            self.spawn(SpawnReason::Refill, sink);
            self.time_since_last_spawn = 0.0;
            self.invalidate_caches();
            self.finish_step(0, sink);
            return;
        }

        let retired = self.advance_particles(sink);

        let splits = split::apply_splits(
            &mut self.particles,
            &self.config.split,
            &mut self.rng,
            sink,
        );
        if splits > 0 {
            self.stats.splits += splits as u64;
            info!(
                "{} cloud(s) split; population now {}.",
                splits,
                self.particles.len()
            );
            if self.particles.len() > self.config.spawn.max_particles {
                self.report_warning(
                    format!(
                        "Population {} exceeds max_particles {} after splitting.",
                        self.particles.len(),
                        self.config.spawn.max_particles
                    ),
                    sink,
                );
            }
        }

        if let Some(reason) = spawn::spawn_decision(
            &self.config.spawn,
            self.particles.len(),
            self.time_since_last_spawn,
            &mut self.rng,
        ) {
            self.spawn(reason, sink);
            self.time_since_last_spawn = 0.0;
        }

        self.invalidate_caches();
        self.finish_step(retired, sink);
    }

    fn advance_clock(&mut self, dt: Option<f32>, sim_time: Option<f64>, sink: &mut dyn EventSink) {
        let next = sim_time.unwrap_or(self.sim_time + 1.0);
        if !next.is_finite() {
            self.report_warning(format!("Ignoring non-finite sim_time {next}."), sink);
        } else if next < self.sim_time {
            self.report_warning(
                format!("Ignoring sim_time {next} earlier than current {}.", self.sim_time),
                sink,
            );
        } else {
            self.sim_time = next;
        }

        let dt = match dt {
            Some(dt) if dt.is_finite() && dt >= 0.0 => dt,
            Some(dt) => {
                self.report_warning(format!("Ignoring invalid dt {dt}; using the timestep."), sink);
                self.config.timestep_s
            }
            None => self.config.timestep_s,
        };
        self.time_since_last_spawn += f64::from(dt);
    }

    fn report_warning(&self, message: String, sink: &mut dyn EventSink) {
        warn!("{}", message);
        if sink.wants(WeatherEventKind::Warning) {
            sink.send(WeatherEvent::Warning {
                context: format!("frame:{}", self.frame()),
                message,
            });
        }
    }

    /// Advances every cloud and drops the retired ones. Returns how many were retired.
    fn advance_particles(&mut self, sink: &mut dyn EventSink) -> usize {
        let config = &self.config;
        let rng = &mut self.rng;
        let mut retired = 0;
        self.particles
            .retain_mut(|particle| match particle.advance(config, &mut *rng) {
                StepOutcome::Alive => true,
                StepOutcome::Retired(reason) => {
                    retired += 1;
                    if sink.wants(WeatherEventKind::Retired) {
                        sink.send(WeatherEvent::Retired {
                            cloud_type: particle.cloud_type().to_owned(),
                            position: particle.position(),
                            age: particle.age(),
                            reason,
                        });
                    }
                    false
                }
            });

        if retired > 0 {
            self.stats.retired += retired as u64;
            info!("Removed {} expired cloud(s).", retired);
        }
        retired
    }

    fn spawn(&mut self, reason: SpawnReason, sink: &mut dyn EventSink) {
        let position = Vec2::from(
            self.config
                .spawn
                .region
                .sample(self.config.domain_size_m, &mut self.rng),
        );
        let preset = match (&self.initial_type, reason) {
            (Some(preset), SpawnReason::Initial) => preset.clone(),
            _ => self.registry.pick_weighted(&mut self.rng),
        };
        let velocity = drift_velocity(&self.config, &preset, &mut self.rng);

        debug!(
            "Spawned {} cloud at ({:.1}, {:.1}) ({:?}), velocity ({:.2}, {:.2}).",
            preset.id, position.x, position.y, reason, velocity.x, velocity.y
        );
        if sink.wants(WeatherEventKind::Spawned) {
            sink.send(WeatherEvent::Spawned {
                cloud_type: preset.id.clone(),
                position,
                reason,
            });
        }

        self.particles
            .push(Particle::new(position, velocity, preset, &self.config));
        self.stats.spawned += 1;
    }

    fn finish_step(&mut self, retired: usize, sink: &mut dyn EventSink) {
        if sink.wants(WeatherEventKind::StepFinished) {
            sink.send(WeatherEvent::StepFinished {
                sim_time: self.sim_time,
                population: self.particles.len(),
                retired,
            });
        }
    }

    fn invalidate_caches(&self) {
        self.drift_cache.invalidate();
        self.coverage_cache.invalidate();
    }

    fn frame(&self) -> i64 {
        self.sim_time.floor() as i64
    }

    /// Mean drift of the current population, cached for the current frame.
    pub fn drift_estimate(&self) -> DriftEstimate {
        self.drift_cache.get_or_compute(self.frame(), || {
            estimate_drift(&self.particles, self.config.distance_per_frame())
        })
    }

    /// Sky coverage in percent, cached for the current frame.
    pub fn coverage_pct(&self) -> f32 {
        self.coverage_cache.get_or_compute(self.frame(), || {
            coverage_pct(
                &self.particles,
                self.config.domain_size_km(),
                self.config.coverage_multiplier,
            )
        })
    }

    /// Shapes of every cloud above the visibility threshold, in population order.
    pub fn visible_shapes(&self) -> Vec<CloudShape> {
        let epsilon = self.config.visibility_epsilon;
        self.particles
            .iter()
            .filter(|p| p.opacity() > epsilon)
            .map(|p| p.shape().clone())
            .collect()
    }

    /// Visible shapes run through `passes` in order, e.g. to sort by altitude for drawing.
    pub fn visible_shapes_with(&self, passes: &[ShapePass]) -> Vec<CloudShape> {
        passes
            .iter()
            .fold(self.visible_shapes(), |shapes, pass| pass.apply(shapes))
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn sim_time(&self) -> f64 {
        self.sim_time
    }

    pub fn time_since_last_spawn(&self) -> f64 {
        self.time_since_last_spawn
    }

    pub fn stats(&self) -> WeatherStats {
        self.stats
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn registry(&self) -> &CloudTypeRegistry {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SpawnConfig;
    use crate::error::Error;
    use crate::events::VecSink;
    use crate::particle::lifecycle::{LifecycleFrames, Phase};
    use crate::preset::CloudTypeDef;

    fn cumulus_only() -> SimConfig {
        SimConfig::new(50_000.0)
            .with_drift(135.0, 4.0)
            .with_lifecycle(LifecycleFrames::new(300, 1800, 300))
            .with_cloud_types(vec![CloudTypeDef::cumulus()])
    }

    fn quiet() -> SimConfig {
        cumulus_only().with_spawn(SpawnConfig {
            probability: 0.0,
            ..Default::default()
        })
    }

    #[test]
    fn construction_spawns_one_cloud_in_launch_corner() {
        let system = WeatherSystem::try_new(SimConfig::default(), 1).unwrap();
        assert_eq!(system.len(), 1);
        let p = system.particles()[0].position();
        assert!(p.x >= 0.85 * 50_000.0 && p.x < 0.95 * 50_000.0);
        assert!(p.y >= 0.05 * 50_000.0 && p.y < 0.15 * 50_000.0);
        assert_eq!(system.stats().spawned, 1);
    }

    #[test]
    fn construction_rejects_invalid_config_and_unknown_initial_type() {
        assert!(matches!(
            WeatherSystem::try_new(SimConfig::new(-1.0), 0),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            WeatherSystem::try_new(SimConfig::default().with_trail_length(usize::MAX), 0),
            Err(Error::InvalidConfig(_))
        ));
        let cfg = SimConfig::default().with_initial_cloud_type("altocumulus");
        assert!(matches!(
            WeatherSystem::try_new(cfg, 0),
            Err(Error::UnknownCloudType { ref id }) if id == "altocumulus"
        ));
    }

    #[test]
    fn initial_cloud_type_is_honoured() {
        let cfg = SimConfig::default().with_initial_cloud_type("cirrus");
        let system = WeatherSystem::try_new(cfg, 3).unwrap();
        assert_eq!(system.particles()[0].cloud_type(), "cirrus");
    }

    #[test]
    fn clock_advances_by_frame_or_explicit_time() {
        let mut system = WeatherSystem::try_new(quiet(), 0).unwrap();
        system.step(None, None);
        assert_eq!(system.sim_time(), 1.0);
        system.step(None, Some(10.5));
        assert_eq!(system.sim_time(), 10.5);

        let mut sink = VecSink::only([WeatherEventKind::Warning]);
        system.step_with_events(None, Some(2.0), &mut sink);
        assert_eq!(system.sim_time(), 10.5);
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn same_seed_replays_identically() {
        let cfg = SimConfig::default().with_spawn(SpawnConfig {
            probability: 0.5,
            min_interval_s: 1.0,
            max_particles: 12,
            ..Default::default()
        });
        let mut a = WeatherSystem::try_new(cfg.clone(), 99).unwrap();
        let mut b = WeatherSystem::try_new(cfg, 99).unwrap();
        for _ in 0..3000 {
            a.step(None, None);
            b.step(None, None);
        }
        assert_eq!(a.len(), b.len());
        assert_eq!(a.visible_shapes(), b.visible_shapes());
        assert_eq!(a.stats(), b.stats());
        assert!(a.stats().spawned > 1);
    }

    #[test]
    fn same_seed_replays_splits_identically() {
        // Fragments are born stable and roll again, so keep the run short.
        let cfg = SimConfig::default().with_scatter_probability(0.01);
        let mut a = WeatherSystem::try_new(cfg.clone(), 99).unwrap();
        let mut b = WeatherSystem::try_new(cfg, 99).unwrap();
        for _ in 0..450 {
            a.step(None, None);
            b.step(None, None);
        }
        assert_eq!(a.visible_shapes(), b.visible_shapes());
        assert_eq!(a.stats(), b.stats());
    }

    #[test]
    fn single_cloud_lives_its_full_lifecycle() {
        let mut system = WeatherSystem::try_new(quiet(), 5).unwrap();
        for _ in 0..300 {
            system.step(None, None);
        }
        assert_eq!(system.len(), 1);
        let cloud = &system.particles()[0];
        assert_eq!(cloud.lifecycle_targets().opacity_factor, 1.0);
        assert_eq!(cloud.age(), 300);

        let mut sink = VecSink::only([WeatherEventKind::Retired]);
        for _ in 300..2400 {
            system.step_with_events(None, None, &mut sink);
        }
        assert_eq!(sink.len(), 1);
        assert!(matches!(
            sink.as_slice()[0],
            WeatherEvent::Retired {
                age: 2400,
                reason: crate::particle::RetireReason::Expired,
                ..
            }
        ));
    }

    #[test]
    fn empty_sky_is_refilled_with_exactly_one_cloud() {
        let cfg = quiet().with_lifecycle(LifecycleFrames::new(1, 0, 1));
        let mut system = WeatherSystem::try_new(cfg, 8).unwrap();
        system.step(None, None);
        system.step(None, None);
        assert!(system.is_empty());
        assert_eq!(system.coverage_pct(), 0.0);
        assert_eq!(system.drift_estimate(), DriftEstimate::UNKNOWN);

        system.step(None, None);
        assert_eq!(system.len(), 1);
        assert_eq!(system.time_since_last_spawn(), 0.0);
        assert!(system.coverage_pct() > 0.0);
        assert!(system.drift_estimate().speed_kmh.is_some());
    }

    #[test]
    fn population_never_exceeds_cap_without_splits() {
        let cfg = cumulus_only().with_spawn(SpawnConfig {
            probability: 1.0,
            min_interval_s: 0.0,
            max_particles: 4,
            ..Default::default()
        });
        let mut system = WeatherSystem::try_new(cfg, 2).unwrap();
        for _ in 0..200 {
            system.step(None, None);
            assert!(system.len() <= 4);
        }
        assert_eq!(system.len(), 4);
    }

    #[test]
    fn split_growth_past_cap_blocks_spawns_that_frame() {
        let cfg = cumulus_only()
            .with_lifecycle(LifecycleFrames::new(1, 1800, 300))
            .with_spawn(SpawnConfig {
                probability: 1.0,
                min_interval_s: 0.0,
                max_particles: 2,
                ..Default::default()
            })
            .with_scatter_probability(1.0);
        let mut system = WeatherSystem::try_new(cfg, 17).unwrap();
        assert_eq!(system.stats().spawned, 1);

        // Without the split this frame would spawn: one cloud, cap two, certain roll.
        let mut sink = VecSink::only([WeatherEventKind::Spawned, WeatherEventKind::Warning]);
        system.step_with_events(None, None, &mut sink);

        assert!(system.len() > 2);
        assert_eq!(system.stats().splits, 1);
        assert_eq!(system.stats().spawned, 1);
        assert!(sink
            .as_slice()
            .iter()
            .all(|e| e.kind() == WeatherEventKind::Warning));
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn non_finite_clock_inputs_are_ignored() {
        let mut system = WeatherSystem::try_new(quiet(), 0).unwrap();
        system.step(None, Some(5.0));

        let mut sink = VecSink::only([WeatherEventKind::Warning]);
        system.step_with_events(Some(f32::NAN), Some(f64::NAN), &mut sink);
        assert_eq!(system.sim_time(), 5.0);
        assert_eq!(sink.len(), 2);

        system.step_with_events(Some(f32::INFINITY), Some(f64::INFINITY), &mut sink);
        system.step_with_events(Some(-1.0), None, &mut sink);
        assert_eq!(system.sim_time(), 6.0);
        assert_eq!(sink.len(), 5);

        let timestep = f64::from(system.config().timestep_s);
        assert!(system.time_since_last_spawn().is_finite());
        assert!((system.time_since_last_spawn() - 4.0 * timestep).abs() < 1e-9);
    }

    #[test]
    fn stable_cloud_with_certain_scatter_splits_on_next_step() {
        let cfg = quiet()
            .with_lifecycle(LifecycleFrames::new(1, 1800, 300))
            .with_scatter_probability(1.0);
        let mut system = WeatherSystem::try_new(cfg, 4).unwrap();
        // Age 1: the cloud enters the stable phase and splits in the same step.
        let mut sink = VecSink::only([WeatherEventKind::Split]);
        system.step_with_events(None, None, &mut sink);

        assert!((3..=4).contains(&system.len()));
        assert_eq!(sink.len(), 1);
        let parent = system.particles().last().unwrap();
        assert!(parent.split_fade_countdown() > 0);
        for fragment in &system.particles()[..system.len() - 1] {
            assert_eq!(fragment.phase(), Phase::Stable);
        }
        assert_eq!(system.stats().splits, 1);
    }

    #[test]
    fn queries_are_cached_per_frame_but_track_population_changes() {
        let mut system = WeatherSystem::try_new(quiet(), 6).unwrap();
        let c1 = system.coverage_pct();
        assert_eq!(c1, system.coverage_pct());
        system.step(None, None);
        let c2 = system.coverage_pct();
        // Smoothing shrinks the newborn toward its growth target, so coverage moves.
        assert_ne!(c1, c2);
        assert_eq!(
            system.drift_estimate(),
            estimate_drift(system.particles(), system.config().distance_per_frame())
        );
    }

    #[test]
    fn drift_estimate_matches_configured_heading() {
        let system = WeatherSystem::try_new(SimConfig::default(), 12).unwrap();
        let est = system.drift_estimate();
        assert!((est.heading_deg.unwrap() - 135.0).abs() < 1e-2);
        assert_eq!(est.confidence, SIMULATED_DRIFT_CONFIDENCE);
    }

    #[test]
    fn visible_shapes_follow_population_and_passes() {
        let mut system = WeatherSystem::try_new(SimConfig::default(), 21).unwrap();
        for _ in 0..50 {
            system.step(None, None);
        }
        let shapes = system.visible_shapes();
        assert_eq!(shapes.len(), system.len());
        let sorted = system.visible_shapes_with(&[ShapePass::SortByAltitude]);
        assert!(sorted
            .windows(2)
            .all(|w| w[0].altitude_km >= w[1].altitude_km));
    }

    #[test]
    fn spawn_events_name_their_reason() {
        let mut sink = VecSink::only([WeatherEventKind::Spawned]);
        let _system =
            WeatherSystem::try_new_with_events(SimConfig::default(), 0, &mut sink).unwrap();
        assert!(matches!(
            sink.as_slice(),
            [WeatherEvent::Spawned {
                reason: SpawnReason::Initial,
                ..
            }]
        ));
    }
}
