//! Fragmentation of clouds flagged during their stable phase.
use glam::Vec2;
use rand::RngCore;
use tracing::debug;

use crate::config::SplitConfig;
use crate::events::{EventSink, WeatherEvent, WeatherEventKind};
use crate::particle::Particle;
use crate::sampling::{rand_inclusive, rand_range};

/// Replaces every flagged cloud by its fragments followed by the (still alive) parent.
///
/// Returns the number of clouds that split.
pub(crate) fn apply_splits(
    particles: &mut Vec<Particle>,
    split: &SplitConfig,
    rng: &mut dyn RngCore,
    sink: &mut dyn EventSink,
) -> usize {
    if !particles.iter().any(Particle::is_flagged_for_split) {
        return 0;
    }

    let mut splits = 0;
    let mut out = Vec::with_capacity(particles.len() + 3);
    for mut parent in particles.drain(..) {
        if parent.is_flagged_for_split() {
            let fragments = rand_inclusive(rng, split.fragments.0, split.fragments.1) as usize;
            debug!(
                "Cloud scattering: {} fragments from ({:.1}, {:.1}).",
                fragments,
                parent.position().x,
                parent.position().y
            );
            for _ in 0..fragments {
                let offset = Vec2::new(rand_range(rng, -0.5, 0.5), rand_range(rng, -0.5, 0.5))
                    * split.offset_m;
                let radius_factor = rand_range(rng, split.radius_factor.0, split.radius_factor.1);
                out.push(parent.fragment(offset, radius_factor));
            }
            parent.finish_split(split.fade_frames);
            splits += 1;

            if sink.wants(WeatherEventKind::Split) {
                sink.send(WeatherEvent::Split {
                    cloud_type: parent.cloud_type().to_owned(),
                    position: parent.position(),
                    fragments,
                });
            }
        }
        out.push(parent);
    }
    *particles = out;
    splits
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::config::SimConfig;
    use crate::events::VecSink;
    use crate::particle::lifecycle::Phase;
    use crate::preset::{CloudTypeDef, CloudTypePreset};

    fn cloud(at: Vec2) -> Particle {
        let cfg = SimConfig::default();
        let preset = Arc::new(CloudTypePreset::from(&CloudTypeDef::cumulus()));
        Particle::new(at, Vec2::new(-1.0, 1.0), preset, &cfg).with_age(500)
    }

    fn flagged(at: Vec2) -> Particle {
        let cfg = SimConfig::default().with_scatter_probability(1.0);
        let mut p = cloud(at);
        p.advance(&cfg, &mut StdRng::seed_from_u64(0));
        assert!(p.is_flagged_for_split());
        p
    }

    #[test]
    fn unflagged_population_is_untouched() {
        let mut particles = vec![cloud(Vec2::ZERO), cloud(Vec2::ONE)];
        let mut rng = StdRng::seed_from_u64(1);
        let n = apply_splits(&mut particles, &SplitConfig::default(), &mut rng, &mut ());
        assert_eq!(n, 0);
        assert_eq!(particles.len(), 2);
    }

    #[test]
    fn flagged_cloud_produces_fragments_before_fading_parent() {
        let parent_pos = Vec2::new(20_000.0, 20_000.0);
        let mut particles = vec![flagged(parent_pos)];
        let parent_radius = particles[0].radius_km();
        let mut rng = StdRng::seed_from_u64(7);
        let mut sink = VecSink::new();
        let split = SplitConfig::default();

        let n = apply_splits(&mut particles, &split, &mut rng, &mut sink);
        assert_eq!(n, 1);
        assert!((3..=4).contains(&particles.len()));

        let (parent, fragments) = particles.split_last().unwrap();
        assert!(!parent.is_flagged_for_split());
        assert_eq!(parent.split_fade_countdown(), 60);
        for f in fragments {
            assert_eq!(f.age(), f.lifecycle().growth);
            assert_eq!(f.phase(), Phase::Stable);
            assert_eq!(f.velocity(), parent.velocity());
            assert_eq!(f.cloud_type(), parent.cloud_type());
            let offset = f.position() - parent.position();
            assert!(offset.x.abs() <= 500.0 && offset.y.abs() <= 500.0);
            let factor = f.radius_km() / parent_radius;
            assert!((0.8 - 1e-5..0.9 + 1e-5).contains(&factor));
        }

        assert_eq!(sink.len(), 1);
        assert!(matches!(
            sink.as_slice()[0],
            WeatherEvent::Split { fragments, .. } if fragments + 1 == particles.len()
        ));
    }
}
