//! Tunable constants of a particle field.
//!
//! Every value has a default matching the portfolio background, so a config
//! file only needs to name what it changes.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::color::Rgb;
use crate::error::ConfigError;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    /// Requested particle count. Zero or negative renders no particles.
    pub particle_count: i32,
    /// Pointer distance below which particles are pushed away.
    pub repulsion_radius: f32,
    /// Displacement per frame at zero pointer distance.
    pub repulsion_strength: f32,
    /// Wander phase increment per frame, in radians.
    pub wander_step: f32,
    pub wander_amplitude: f32,
    /// Blur radius of the second, glowing fill of each particle.
    pub glow_blur: f32,
    /// Particle distance below which a link is drawn.
    pub link_threshold: f32,
    /// Link opacity as the distance approaches zero.
    pub link_opacity: f32,
    pub link_color: Rgb,
    pub min_radius: f32,
    pub max_radius: f32,
    /// Each drift velocity component is drawn from `[-max_drift, max_drift)`.
    pub max_drift: f32,
    pub min_alpha: f32,
    pub max_alpha: f32,
    pub saturation: f32,
    pub lightness: f32,
    /// Fixed RNG seed. `None` seeds from the operating system.
    pub seed: Option<u64>,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            particle_count: 100,
            repulsion_radius: 100.0,
            repulsion_strength: 2.0,
            wander_step: 0.01,
            wander_amplitude: 0.1,
            glow_blur: 15.0,
            link_threshold: 100.0,
            link_opacity: 0.1,
            link_color: Rgb::new(108, 99, 255),
            min_radius: 1.0,
            max_radius: 3.0,
            max_drift: 0.25,
            min_alpha: 0.2,
            max_alpha: 0.7,
            saturation: 1.0,
            lightness: 0.7,
            seed: None,
        }
    }
}

impl FieldConfig {
    /// Number of particles to spawn, with non-positive requests mapped to zero.
    pub fn particle_count(&self) -> usize {
        self.particle_count.max(0) as usize
    }

    /// Save the configuration to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load and validate a configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        log::info!("loaded field config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let non_negative = [
            ("repulsion_radius", self.repulsion_radius),
            ("repulsion_strength", self.repulsion_strength),
            ("wander_step", self.wander_step),
            ("wander_amplitude", self.wander_amplitude),
            ("glow_blur", self.glow_blur),
            ("link_threshold", self.link_threshold),
            ("link_opacity", self.link_opacity),
            ("min_radius", self.min_radius),
            ("max_radius", self.max_radius),
            ("max_drift", self.max_drift),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() {
                return Err(ConfigError::Invalid { field, reason: "must be finite" });
            }
            if value < 0.0 {
                return Err(ConfigError::Invalid { field, reason: "must not be negative" });
            }
        }

        let unit = [
            ("min_alpha", self.min_alpha),
            ("max_alpha", self.max_alpha),
            ("saturation", self.saturation),
            ("lightness", self.lightness),
        ];
        for (field, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid { field, reason: "must lie in [0, 1]" });
            }
        }

        if self.min_radius > self.max_radius {
            return Err(ConfigError::Invalid {
                field: "min_radius",
                reason: "must not exceed max_radius",
            });
        }
        if self.min_alpha > self.max_alpha {
            return Err(ConfigError::Invalid {
                field: "min_alpha",
                reason: "must not exceed max_alpha",
            });
        }

        Ok(())
    }
}
