//! Cloud type presets and the registry resolving type tags to them.
//!
//! A [`CloudTypeDef`] is the configuration-facing description of a cloud type. The
//! [`CloudTypeRegistry`] validates a list of definitions once at startup and turns them into
//! shared, immutable [`CloudTypePreset`]s that every particle of that type points at.
use std::collections::HashMap;
use std::sync::Arc;

use rand::RngCore;

use crate::error::{Error, Result};
use crate::sampling::rand01;

pub type CloudTypeId = String;

/// Configuration entry describing one cloud type.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct CloudTypeDef {
    /// Type tag, e.g. `"cumulus"`.
    pub id: CloudTypeId,
    /// Altitude used for draw ordering.
    pub altitude_km: f32,
    /// Radius range `(min, max)` in kilometres.
    pub radius_km: (f32, f32),
    /// Opacity ceiling in [0, 1].
    pub max_opacity: f32,
    /// Multiplier on the prevailing wind speed.
    pub speed_factor: f32,
    /// Relative weight when drawing the type of a new cloud.
    pub spawn_weight: f32,
    /// Shape stretch `(width, height)` applied on projection.
    pub elongation: (f32, f32),
}

impl Default for CloudTypeDef {
    fn default() -> Self {
        Self::cumulus()
    }
}

impl CloudTypeDef {
    pub fn new(
        id: impl Into<CloudTypeId>,
        altitude_km: f32,
        radius_km: (f32, f32),
        max_opacity: f32,
    ) -> Self {
        Self {
            id: id.into(),
            altitude_km,
            radius_km,
            max_opacity,
            speed_factor: 1.0,
            spawn_weight: 1.0,
            elongation: (1.0, 1.0),
        }
    }

    /// Low, puffy, round clouds. The most common type.
    pub fn cumulus() -> Self {
        Self::new("cumulus", 2.0, (1.0, 3.0), 0.9).with_spawn_weight(0.6)
    }

    /// High, thin, wind-stretched clouds.
    pub fn cirrus() -> Self {
        Self::new("cirrus", 9.0, (2.0, 5.0), 0.5)
            .with_speed_factor(1.3)
            .with_spawn_weight(0.25)
            .with_elongation(2.5, 0.4)
    }

    /// Tall storm towers.
    pub fn cumulonimbus() -> Self {
        Self::new("cumulonimbus", 5.0, (3.0, 6.0), 1.0)
            .with_speed_factor(0.8)
            .with_spawn_weight(0.15)
            .with_elongation(1.2, 1.8)
    }

    /// The built-in type set used by [`crate::config::SimConfig::default`].
    pub fn builtin() -> Vec<Self> {
        vec![Self::cumulus(), Self::cirrus(), Self::cumulonimbus()]
    }

    pub fn with_speed_factor(mut self, speed_factor: f32) -> Self {
        self.speed_factor = speed_factor;
        self
    }

    pub fn with_spawn_weight(mut self, spawn_weight: f32) -> Self {
        self.spawn_weight = spawn_weight;
        self
    }

    pub fn with_elongation(mut self, width: f32, height: f32) -> Self {
        self.elongation = (width, height);
        self
    }

    /// Validates a single definition.
    pub fn validate(&self) -> Result<()> {
        let invalid = |what: &str| {
            Err(Error::InvalidConfig(format!(
                "cloud type '{}': {what}",
                self.id
            )))
        };

        if self.id.is_empty() {
            return Err(Error::InvalidConfig("cloud type id must not be empty".into()));
        }
        if !self.altitude_km.is_finite() {
            return invalid("altitude_km must be finite");
        }
        let (r_min, r_max) = self.radius_km;
        if !(r_min.is_finite() && r_max.is_finite()) || r_min < 0.0 {
            return invalid("radius_km must be finite and >= 0");
        }
        if r_min > r_max {
            return invalid("radius_km min must be <= max");
        }
        if !(0.0..=1.0).contains(&self.max_opacity) {
            return invalid("max_opacity must be in [0, 1]");
        }
        if !(self.speed_factor.is_finite() && self.speed_factor > 0.0) {
            return invalid("speed_factor must be > 0");
        }
        if !(self.spawn_weight.is_finite() && self.spawn_weight >= 0.0) {
            return invalid("spawn_weight must be >= 0");
        }
        let (w, h) = self.elongation;
        if !(w.is_finite() && h.is_finite() && w > 0.0 && h > 0.0) {
            return invalid("elongation factors must be > 0");
        }

        Ok(())
    }
}

/// Immutable, shared parameters of a cloud type.
#[derive(Debug, Clone, PartialEq)]
pub struct CloudTypePreset {
    pub id: CloudTypeId,
    pub altitude_km: f32,
    pub radius_km_min: f32,
    pub radius_km_max: f32,
    pub max_opacity: f32,
    pub speed_factor: f32,
    pub elongation: (f32, f32),
}

impl From<&CloudTypeDef> for CloudTypePreset {
    fn from(def: &CloudTypeDef) -> Self {
        Self {
            id: def.id.clone(),
            altitude_km: def.altitude_km,
            radius_km_min: def.radius_km.0,
            radius_km_max: def.radius_km.1,
            max_opacity: def.max_opacity,
            speed_factor: def.speed_factor,
            elongation: def.elongation,
        }
    }
}

/// Validated set of presets with their spawn weights, in definition order.
#[derive(Debug, Clone)]
pub struct CloudTypeRegistry {
    presets: Vec<Arc<CloudTypePreset>>,
    weights: Vec<f32>,
    index: HashMap<CloudTypeId, usize>,
}

impl CloudTypeRegistry {
    /// Builds the registry, rejecting invalid or duplicate definitions.
    pub fn from_defs(defs: &[CloudTypeDef]) -> Result<Self> {
        if defs.is_empty() {
            return Err(Error::InvalidConfig(
                "at least one cloud type must be configured".into(),
            ));
        }

        let mut presets = Vec::with_capacity(defs.len());
        let mut weights = Vec::with_capacity(defs.len());
        let mut index = HashMap::with_capacity(defs.len());
        for def in defs {
            def.validate()?;
            if index.insert(def.id.clone(), presets.len()).is_some() {
                return Err(Error::DuplicateCloudType { id: def.id.clone() });
            }
            presets.push(Arc::new(CloudTypePreset::from(def)));
            weights.push(def.spawn_weight);
        }

        let total: f32 = weights.iter().sum();
        if total <= 0.0 {
            return Err(Error::InvalidConfig(
                "cloud type spawn weights must sum to > 0".into(),
            ));
        }

        Ok(Self {
            presets,
            weights,
            index,
        })
    }

    pub fn get(&self, id: &str) -> Option<&Arc<CloudTypePreset>> {
        self.index.get(id).map(|&i| &self.presets[i])
    }

    /// Like [`Self::get`], but an unknown tag is an error.
    pub fn resolve(&self, id: &str) -> Result<Arc<CloudTypePreset>> {
        self.get(id)
            .cloned()
            .ok_or_else(|| Error::UnknownCloudType { id: id.to_owned() })
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<CloudTypePreset>> {
        self.presets.iter()
    }

    /// Draws a preset proportionally to its spawn weight.
    pub fn pick_weighted(&self, rng: &mut dyn RngCore) -> Arc<CloudTypePreset> {
        let total: f32 = self.weights.iter().sum();
        let mut roll = rand01(rng) * total;
        for (preset, &weight) in self.presets.iter().zip(&self.weights) {
            if weight <= 0.0 {
                continue;
            }
            roll -= weight;
            if roll <= 0.0 {
                return preset.clone();
            }
        }

        // Float rounding can leave a sliver of `roll`; fall back to the last weighted type.
        self.presets
            .iter()
            .zip(&self.weights)
            .rev()
            .find(|(_, w)| **w > 0.0)
            .map(|(p, _)| p.clone())
            .unwrap_or_else(|| self.presets[0].clone())
    }
}
