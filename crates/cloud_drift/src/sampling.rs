//! Random draws used by the scheduler, all sourced from a caller-provided [`RngCore`].
//!
//! Every stochastic decision in the simulation (spawn chance, spawn position, cloud type,
//! fragment count and placement, speed jitter, split rolls) goes through these helpers so a
//! single seeded generator fully determines a run.
use mint::Vector2;
use rand::RngCore;

/// Trait for choosing where a new cloud enters the domain.
pub trait SpawnSampling: Send + Sync {
    fn sample(&self, domain_size: f32, rng: &mut dyn RngCore) -> Vector2<f32>;
}

/// Rectangular launch area expressed as fractions of the domain side.
///
/// With the domain origin in the north-west corner, the default area sits just inside the
/// north-east corner so clouds heading 135 degrees cross the whole domain.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct SpawnRegion {
    /// Horizontal extent `(min, max)` as a fraction of the domain size.
    pub x: (f32, f32),
    /// Vertical extent `(min, max)` as a fraction of the domain size.
    pub y: (f32, f32),
}

impl Default for SpawnRegion {
    fn default() -> Self {
        Self {
            x: (0.85, 0.95),
            y: (0.05, 0.15),
        }
    }
}

impl SpawnRegion {
    pub fn new(x: (f32, f32), y: (f32, f32)) -> Self {
        Self { x, y }
    }

    pub(crate) fn is_valid(&self) -> bool {
        let axis_ok =
            |(lo, hi): (f32, f32)| lo.is_finite() && hi.is_finite() && (0.0..=hi).contains(&lo);
        axis_ok(self.x) && axis_ok(self.y) && self.x.1 <= 1.0 && self.y.1 <= 1.0
    }
}

impl SpawnSampling for SpawnRegion {
    fn sample(&self, domain_size: f32, rng: &mut dyn RngCore) -> Vector2<f32> {
        let x = rand_range(rng, self.x.0 * domain_size, self.x.1 * domain_size);
        let y = rand_range(rng, self.y.0 * domain_size, self.y.1 * domain_size);
        Vector2 { x, y }
    }
}

/// Generate a random float in the range [0, 1).
///
/// Uses the top 24 bits so every result is exactly representable and strictly below 1.
#[inline]
pub(crate) fn rand01(rng: &mut dyn RngCore) -> f32 {
    (rng.next_u32() >> 8) as f32 * (1.0 / 16_777_216.0)
}

/// Uniform draw in `[lo, hi)`; returns `lo` for an empty or inverted range.
#[inline]
pub(crate) fn rand_range(rng: &mut dyn RngCore, lo: f32, hi: f32) -> f32 {
    if hi <= lo {
        return lo;
    }
    (lo + rand01(rng) * (hi - lo)).min(next_down(hi))
}

/// Uniform integer draw in `[lo, hi]`.
#[inline]
pub(crate) fn rand_inclusive(rng: &mut dyn RngCore, lo: u32, hi: u32) -> u32 {
    if hi <= lo {
        return lo;
    }
    let span = u64::from(hi - lo) + 1;
    lo + (rng.next_u64() % span) as u32
}

/// Compute the next smaller representable float value.
#[inline]
pub(crate) fn next_down(val: f32) -> f32 {
    if val.is_nan() {
        return f32::NAN;
    }

    if val == f32::NEG_INFINITY {
        return f32::NEG_INFINITY;
    }

    if val == f32::INFINITY {
        return f32::MAX;
    }

    if val == 0.0 {
        return -f32::MIN_POSITIVE;
    }

    let bits = val.to_bits();
    if val > 0.0 {
        f32::from_bits(bits.saturating_sub(1))
    } else {
        f32::from_bits(bits.saturating_add(1))
    }
}
