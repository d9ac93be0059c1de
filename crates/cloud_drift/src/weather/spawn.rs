//! Spawn policy: decides whether a frame adds a new cloud.
use rand::RngCore;

use crate::config::SpawnConfig;
use crate::events::SpawnReason;
use crate::sampling::rand01;

/// Decides whether to spawn at the end of a frame.
///
/// `population` is the size after retirement and splitting. In single-cloud mode a cloud is only
/// spawned into an empty sky. Otherwise a spawn needs the minimum interval to have elapsed, room
/// under the cap, and a successful roll (an empty sky always passes the roll). If none of that
/// applies and the sky is empty, `force_initial_cloud` still forces one.
pub(crate) fn spawn_decision(
    spawn: &SpawnConfig,
    population: usize,
    time_since_last_spawn: f64,
    rng: &mut dyn RngCore,
) -> Option<SpawnReason> {
    if spawn.single_cloud_mode {
        return (population == 0).then_some(SpawnReason::Scheduled);
    }

    let interval_elapsed = time_since_last_spawn > f64::from(spawn.min_interval_s);
    if interval_elapsed && population < spawn.max_particles {
        let roll = rand01(rng);
        if roll < spawn.probability || population == 0 {
            return Some(SpawnReason::Scheduled);
        }
    }

    (population == 0 && spawn.force_initial_cloud).then_some(SpawnReason::Forced)
}
