//! Simulation settings
//!
//! Loaded from a JSON file; any field left out falls back to the defaults in
//! [`crate::consts`].

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

/// How a resolved impulse is applied to the two bodies' velocities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ImpulseMode {
    /// Same scalar impulse added to both axes (directional part discarded)
    #[default]
    Scalar,
    /// Impulse applied along the collision normal, per axis
    Vector,
}

/// Which bound the per-axis speed cap enforces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SpeedClamp {
    /// Only `v > max_speed` is clamped; negative bounces stay sharp.
    /// `|v| <= max_speed` does not hold in this mode: negative components
    /// are unbounded and can flip positive on a wall bounce.
    #[default]
    UpperOnly,
    /// Components clamped into `[-max_speed, max_speed]`
    Symmetric,
}

/// How a step is executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Sequential,
    /// Per-body data-parallel passes (needs the `parallel` feature)
    Parallel,
}

impl ImpulseMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImpulseMode::Scalar => "scalar",
            ImpulseMode::Vector => "vector",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "scalar" => Some(ImpulseMode::Scalar),
            "vector" | "vec" => Some(ImpulseMode::Vector),
            _ => None,
        }
    }
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Sequential => "sequential",
            Backend::Parallel => "parallel",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "sequential" | "seq" | "cpu" => Some(Backend::Sequential),
            "parallel" | "par" => Some(Backend::Parallel),
            _ => None,
        }
    }
}

/// Errors raised while loading or validating settings
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed settings JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid setting `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },
}

/// Simulation constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Number of bodies
    pub population: usize,
    /// Arena side length
    pub arena_size: f32,
    /// Shared body radius
    pub radius: f32,
    /// Shared body mass
    pub mass: f32,
    /// Restitution coefficient in [0, 1]
    pub restitution: f32,
    /// Per-axis speed cap
    pub max_speed: f32,
    /// RNG seed for initial placement (None = draw one from the thread RNG)
    pub seed: Option<u64>,
    pub impulse_mode: ImpulseMode,
    pub speed_clamp: SpeedClamp,
    pub backend: Backend,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            population: POPULATION,
            arena_size: ARENA_SIZE,
            radius: BODY_RADIUS,
            mass: BODY_MASS,
            restitution: RESTITUTION,
            max_speed: MAX_SPEED,
            seed: None,
            impulse_mode: ImpulseMode::Scalar,
            speed_clamp: SpeedClamp::UpperOnly,
            backend: Backend::Sequential,
        }
    }
}

impl Settings {
    /// Parse settings from a JSON document and validate them
    pub fn from_json_str(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file on disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)?;
        let settings = Self::from_json_str(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Serialize to pretty JSON (for writing a starter config)
    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check every constant is in the range the physics step assumes
    pub fn validate(&self) -> Result<(), SettingsError> {
        let finite = [
            ("arena_size", self.arena_size),
            ("radius", self.radius),
            ("mass", self.mass),
            ("restitution", self.restitution),
            ("max_speed", self.max_speed),
        ];
        for (field, value) in finite {
            if !value.is_finite() {
                return Err(invalid(field, format!("must be finite, got {value}")));
            }
        }

        if self.population == 0 {
            return Err(invalid("population", "must be at least 1".into()));
        }
        // Bounce insets must land inside [0, arena_size - 1]
        if self.arena_size < 2.0 {
            return Err(invalid(
                "arena_size",
                format!("must be at least 2, got {}", self.arena_size),
            ));
        }
        if self.radius <= 0.0 {
            return Err(invalid("radius", format!("must be positive, got {}", self.radius)));
        }
        if self.mass <= 0.0 {
            return Err(invalid("mass", format!("must be positive, got {}", self.mass)));
        }
        if !(0.0..=1.0).contains(&self.restitution) {
            return Err(invalid(
                "restitution",
                format!("must be within [0, 1], got {}", self.restitution),
            ));
        }
        if self.max_speed <= 0.0 {
            return Err(invalid(
                "max_speed",
                format!("must be positive, got {}", self.max_speed),
            ));
        }
        Ok(())
    }

    /// Inverse mass, used by the resolver
    #[inline]
    pub fn inv_mass(&self) -> f32 {
        1.0 / self.mass
    }
}

fn invalid(field: &'static str, reason: String) -> SettingsError {
    SettingsError::Invalid { field, reason }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.population, 50);
        assert_eq!(settings.impulse_mode, ImpulseMode::Scalar);
        assert_eq!(settings.speed_clamp, SpeedClamp::UpperOnly);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings = Settings::from_json_str(r#"{ "population": 8, "impulse_mode": "vector" }"#)
            .unwrap();
        assert_eq!(settings.population, 8);
        assert_eq!(settings.impulse_mode, ImpulseMode::Vector);
        assert_eq!(settings.arena_size, ARENA_SIZE);
        assert_eq!(settings.backend, Backend::Sequential);
    }

    #[test]
    fn test_speed_clamp_names() {
        let settings = Settings::from_json_str(r#"{ "speed_clamp": "symmetric" }"#).unwrap();
        assert_eq!(settings.speed_clamp, SpeedClamp::Symmetric);
        let settings = Settings::from_json_str(r#"{ "speed_clamp": "upper_only" }"#).unwrap();
        assert_eq!(settings.speed_clamp, SpeedClamp::UpperOnly);
    }

    #[test]
    fn test_rejects_bad_values() {
        let cases = [
            r#"{ "population": 0 }"#,
            r#"{ "arena_size": 1.0 }"#,
            r#"{ "radius": 0.0 }"#,
            r#"{ "mass": -1.0 }"#,
            r#"{ "restitution": 1.5 }"#,
            r#"{ "max_speed": 0.0 }"#,
        ];
        for json in cases {
            let err = Settings::from_json_str(json).unwrap_err();
            assert!(matches!(err, SettingsError::Invalid { .. }), "{json}: {err}");
        }
    }

    #[test]
    fn test_rejects_malformed_json() {
        let err = Settings::from_json_str("{ population: ").unwrap_err();
        assert!(matches!(err, SettingsError::Parse(_)));
    }

    #[test]
    fn test_json_roundtrip() {
        let settings = Settings {
            seed: Some(7),
            backend: Backend::Parallel,
            ..Default::default()
        };
        let json = settings.to_json().unwrap();
        assert_eq!(Settings::from_json_str(&json).unwrap(), settings);
    }

    #[test]
    fn test_bundled_config_parses() {
        let settings = Settings::from_json_str(include_str!("../configs/crowded.json")).unwrap();
        assert_eq!(settings.population, 120);
        assert_eq!(settings.seed, Some(2024));
        assert_eq!(settings.speed_clamp, SpeedClamp::Symmetric);
        assert_eq!(settings.backend, Backend::Parallel);
        // Not set in the file
        assert_eq!(settings.max_speed, MAX_SPEED);
    }

    #[test]
    fn test_load_missing_file() {
        let err = Settings::load("does/not/exist.json").unwrap_err();
        assert!(matches!(err, SettingsError::Io(_)));
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!(ImpulseMode::from_str("Vector"), Some(ImpulseMode::Vector));
        assert_eq!(Backend::from_str("par"), Some(Backend::Parallel));
        assert_eq!(Backend::from_str("gpu"), None);
    }
}
