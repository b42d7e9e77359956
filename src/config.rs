use std::{fs, path::Path};

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tunables for every behavior. All angles are in radians.
#[derive(Debug, Clone, PartialEq, Resource, Serialize, Deserialize)]
#[serde(default)]
pub struct SteeringConfig {
    pub arrive: ArriveConfig,
    pub face: FaceConfig,
    #[serde(default = "PredictionConfig::pursuit")]
    pub pursuit: PredictionConfig,
    #[serde(default = "PredictionConfig::evade")]
    pub evade: PredictionConfig,
    pub wander: WanderConfig,
}

impl Default for SteeringConfig {
    fn default() -> Self {
        Self {
            arrive: ArriveConfig::default(),
            face: FaceConfig::default(),
            pursuit: PredictionConfig::pursuit(),
            evade: PredictionConfig::evade(),
            wander: WanderConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArriveConfig {
    /// Distance at which the agent starts slowing down.
    pub slow_radius: f32,
    /// Distance under which the agent is fully stopped.
    pub target_radius: f32,
}

impl Default for ArriveConfig {
    fn default() -> Self {
        Self {
            slow_radius: 300.0,
            target_radius: 50.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaceConfig {
    /// Heading errors smaller than this produce no rotation.
    pub angle_threshold: f32,
}

impl Default for FaceConfig {
    fn default() -> Self {
        Self {
            angle_threshold: 1.0_f32.to_radians(),
        }
    }
}

/// Velocity smoothing and lookahead used by `Pursuit` and `Evade`.
///
/// `max_lookahead` differs between the two behaviors, so a section that is present
/// must name it; the remaining fields fall back to the shared defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionConfig {
    /// Upper bound of the lookahead time, in seconds.
    pub max_lookahead: f32,
    /// Blend rate per second towards the newest velocity sample.
    #[serde(default = "default_smoothing_rate")]
    pub smoothing_rate: f32,
    /// Factor applied to the smoothed velocity when the target looks stationary.
    #[serde(default = "default_decay")]
    pub decay: f32,
    /// Sampled speeds at or below this are treated as noise.
    #[serde(default = "default_noise_threshold")]
    pub noise_threshold: f32,
}

fn default_smoothing_rate() -> f32 {
    10.0
}

fn default_decay() -> f32 {
    0.95
}

fn default_noise_threshold() -> f32 {
    1.0
}

impl PredictionConfig {
    pub fn pursuit() -> Self {
        Self {
            max_lookahead: 3.0,
            smoothing_rate: default_smoothing_rate(),
            decay: default_decay(),
            noise_threshold: default_noise_threshold(),
        }
    }

    pub fn evade() -> Self {
        Self {
            max_lookahead: 2.0,
            ..Self::pursuit()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WanderConfig {
    /// Distance of the wander circle ahead of the agent.
    pub offset_distance: f32,
    pub radius: f32,
    /// Largest change of the wander angle per call.
    pub max_angle_change: f32,
}

impl Default for WanderConfig {
    fn default() -> Self {
        Self {
            offset_distance: 100.0,
            radius: 80.0,
            max_angle_change: 45.0_f32.to_radians(),
        }
    }
}

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not load config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Could not parse JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

impl SteeringConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config = serde_json::from_str::<SteeringConfig>(json)?;
        config.validate()?;

        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!("Loading steering config: {:?}", path);

        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let arrive = &self.arrive;
        if arrive.target_radius < 0.0 || arrive.target_radius >= arrive.slow_radius {
            return Err(ConfigError::Invalid(format!(
                "arrive radii must satisfy 0 <= target_radius < slow_radius, got {} and {}",
                arrive.target_radius, arrive.slow_radius
            )));
        }

        if self.face.angle_threshold < 0.0 {
            return Err(ConfigError::Invalid(
                "face angle_threshold must not be negative".to_string(),
            ));
        }

        for (name, prediction) in [("pursuit", &self.pursuit), ("evade", &self.evade)] {
            if prediction.max_lookahead < 0.0 || prediction.smoothing_rate < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} lookahead and smoothing rate must not be negative"
                )));
            }
            if !(0.0..=1.0).contains(&prediction.decay) {
                return Err(ConfigError::Invalid(format!(
                    "{name} decay must be in [0, 1], got {}",
                    prediction.decay
                )));
            }
        }

        let wander = &self.wander;
        if wander.offset_distance < 0.0 || wander.radius < 0.0 || wander.max_angle_change < 0.0 {
            return Err(ConfigError::Invalid(
                "wander offset, radius and angle change must not be negative".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_shorter_evade_lookahead() {
        let config = SteeringConfig::default();
        assert_eq!(config.pursuit.max_lookahead, 3.0);
        assert_eq!(config.evade.max_lookahead, 2.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let config = SteeringConfig::from_json_str(r#"{ "arrive": { "slow_radius": 400.0 } }"#)
            .expect("valid config");

        assert_eq!(config.arrive.slow_radius, 400.0);
        assert_eq!(config.arrive.target_radius, 50.0);
        assert_eq!(config.wander, WanderConfig::default());
    }

    #[test]
    fn rejects_inverted_arrive_radii() {
        let result = SteeringConfig::from_json_str(
            r#"{ "arrive": { "slow_radius": 10.0, "target_radius": 20.0 } }"#,
        );

        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn rejects_decay_out_of_range() {
        let result = SteeringConfig::from_json_str(r#"{ "evade": { "max_lookahead": 2.0, "decay": 1.5 } }"#);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn partial_prediction_section_keeps_shared_defaults() {
        let config =
            SteeringConfig::from_json_str(r#"{ "evade": { "max_lookahead": 1.5 } }"#).expect("valid");

        assert_eq!(config.evade.max_lookahead, 1.5);
        assert_eq!(config.evade.decay, 0.95);
        assert_eq!(config.pursuit, PredictionConfig::pursuit());
    }

    #[test]
    fn reports_malformed_json() {
        let result = SteeringConfig::from_json_str("{ arrive: ");
        assert!(matches!(result, Err(ConfigError::Json(_))));
    }

    #[test]
    fn reports_missing_file() {
        let result = SteeringConfig::load("does/not/exist.json");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn shipped_config_is_valid() {
        let config = SteeringConfig::from_json_str(include_str!("../configs/steering.json"))
            .expect("shipped config parses");

        assert_eq!(config.evade.max_lookahead, 2.0);
    }
}
