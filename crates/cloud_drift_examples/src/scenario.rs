use std::path::Path;

use anyhow::Context;
use cloud_drift::prelude::SimConfig;
use serde::Deserialize;

/// A simulation run described in a RON file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub seed: u64,
    pub frames: usize,
    /// Write a PNG every this many frames; 0 only writes the final frame.
    pub snapshot_every: usize,
    pub image_size: (u32, u32),
    pub sim: SimConfig,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            seed: 0,
            frames: 3600,
            snapshot_every: 0,
            image_size: (800, 800),
            sim: SimConfig::default(),
        }
    }
}

/// Reads and validates a scenario.
pub fn load_scenario(path: impl AsRef<Path>) -> anyhow::Result<Scenario> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let scenario: Scenario =
        ron::de::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
    scenario.sim.validate()?;
    Ok(scenario)
}
