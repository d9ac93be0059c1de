//! Population-wide summaries: average drift and sky coverage.
use std::cell::Cell;
use std::f32::consts::PI;

use glam::Vec2;

use crate::particle::Particle;

/// Confidence reported whenever at least one cloud is tracked.
///
/// The drift estimate stands in for a wind sensor; this is a fixed value, not a statistic.
pub const SIMULATED_DRIFT_CONFIDENCE: f32 = 0.9;

/// Mean drift of the population.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriftEstimate {
    /// Mean speed in km/h, `None` without clouds.
    pub speed_kmh: Option<f32>,
    /// Mean heading in degrees within [0, 360), `None` without clouds.
    pub heading_deg: Option<f32>,
    pub confidence: f32,
}

impl DriftEstimate {
    pub const UNKNOWN: Self = Self {
        speed_kmh: None,
        heading_deg: None,
        confidence: 0.0,
    };
}

/// Averages particle velocities into a speed and heading.
pub fn estimate_drift(particles: &[Particle], distance_per_frame: f32) -> DriftEstimate {
    if particles.is_empty() {
        return DriftEstimate::UNKNOWN;
    }

    let sum: Vec2 = particles.iter().map(Particle::velocity).sum();
    let mean = sum / particles.len() as f32;
    let speed_kmh = mean.length() * 3.6 / distance_per_frame;
    let heading_deg = mean.y.atan2(mean.x).to_degrees().rem_euclid(360.0);

    DriftEstimate {
        speed_kmh: Some(speed_kmh),
        heading_deg: Some(heading_deg),
        confidence: SIMULATED_DRIFT_CONFIDENCE,
    }
}

/// Share of the sky covered by clouds, in percent.
///
/// Sums the disk area of every cloud, divides by the domain area, scales by `multiplier` and
/// clamps to [0, 100].
pub fn coverage_pct(particles: &[Particle], domain_size_km: f32, multiplier: f32) -> f32 {
    if particles.is_empty() {
        return 0.0;
    }

    let total_area: f32 = particles
        .iter()
        .map(|p| PI * p.radius_km() * p.radius_km())
        .sum();
    let domain_area = domain_size_km * domain_size_km;
    (total_area / domain_area * 100.0 * multiplier).clamp(0.0, 100.0)
}

/// One memoized value keyed by frame number.
///
/// Readers go through `&self`; a miss or an invalidated slot simply recomputes.
#[derive(Debug)]
pub(crate) struct FrameCache<T: Copy> {
    slot: Cell<Option<(i64, T)>>,
}

impl<T: Copy> FrameCache<T> {
    pub(crate) fn new() -> Self {
        Self {
            slot: Cell::new(None),
        }
    }

    pub(crate) fn get_or_compute(&self, frame: i64, compute: impl FnOnce() -> T) -> T {
        if let Some((cached_frame, value)) = self.slot.get() {
            if cached_frame == frame {
                return value;
            }
        }
        let value = compute();
        self.slot.set(Some((frame, value)));
        value
    }

    pub(crate) fn invalidate(&self) {
        self.slot.set(None);
    }
}

impl<T: Copy> Clone for FrameCache<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Cell::new(self.slot.get()),
        }
    }
}
