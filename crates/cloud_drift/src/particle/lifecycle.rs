//! Growth, stable and decay phases of a cloud's life.
use crate::error::{Error, Result};

/// Frame counts of the three lifecycle phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct LifecycleFrames {
    pub growth: u32,
    pub stable: u32,
    pub decay: u32,
}

impl Default for LifecycleFrames {
    fn default() -> Self {
        Self {
            growth: 300,
            stable: 1800,
            decay: 300,
        }
    }
}

impl LifecycleFrames {
    pub fn new(growth: u32, stable: u32, decay: u32) -> Self {
        Self {
            growth,
            stable,
            decay,
        }
    }

    /// Total lifetime in frames.
    pub fn max_age(&self) -> u32 {
        self.growth
            .saturating_add(self.stable)
            .saturating_add(self.decay)
    }

    pub fn phase(&self, age: u32) -> Phase {
        if age < self.growth {
            Phase::Growing
        } else if age < self.growth.saturating_add(self.stable) {
            Phase::Stable
        } else {
            Phase::Decaying
        }
    }

    /// Opacity and size factors for a cloud of the given age.
    pub fn targets(&self, age: u32) -> LifecycleTargets {
        match self.phase(age) {
            Phase::Growing => {
                let progress = age as f32 / self.growth as f32;
                LifecycleTargets {
                    opacity_factor: progress,
                    size_factor: 0.8 + 0.2 * progress,
                }
            }
            Phase::Stable => LifecycleTargets {
                opacity_factor: 1.0,
                size_factor: 1.0,
            },
            Phase::Decaying => {
                let into_decay = age.saturating_sub(self.growth).saturating_sub(self.stable);
                let progress = (into_decay as f32 / self.decay as f32).clamp(0.0, 1.0);
                LifecycleTargets {
                    opacity_factor: 1.0 - progress.min(0.5),
                    size_factor: 1.0 - 0.2 * progress,
                }
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.growth == 0 || self.decay == 0 {
            return Err(Error::InvalidConfig(
                "lifecycle growth and decay frames must be > 0".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Growing,
    Stable,
    Decaying,
}

/// Multipliers a cloud's opacity and radius are smoothed toward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LifecycleTargets {
    pub opacity_factor: f32,
    pub size_factor: f32,
}
