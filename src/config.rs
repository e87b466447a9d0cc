//! Run configuration.
//!
//! [`LorenzConfig`] serializes to JSON so a run can be described in a file
//! and loaded by the `lorenz-trail` binary. Every field has a default, so a
//! partial file such as `{"capacity": 2000}` is valid.

use std::fs;
use std::path::Path;
use std::time::Duration;

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::buffer::DEFAULT_CAPACITY;
use crate::error::ConfigError;
use crate::lorenz::{LorenzParams, DEFAULT_SEED};

/// Camera behavior while following a segment.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    /// Distance from the followed point.
    pub orbit_radius: f64,
    /// Orbit angle advance per rendered frame, in radians.
    pub orbit_step: f64,
    /// Opacity of segments that are not being followed.
    pub dimmed_opacity: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            orbit_radius: 60.0,
            orbit_step: 0.01,
            dimmed_opacity: 0.3,
        }
    }
}

/// Complete configuration of one trajectory run.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LorenzConfig {
    pub params: LorenzParams,
    /// Initial state.
    pub seed: DVec3,
    /// Maximum number of points kept in the window.
    pub capacity: usize,
    /// Milliseconds between update ticks.
    pub update_interval_ms: u64,
    /// Milliseconds between publish ticks.
    pub publish_interval_ms: u64,
    pub camera: CameraConfig,
}

impl Default for LorenzConfig {
    fn default() -> Self {
        Self {
            params: LorenzParams::classic(),
            seed: DEFAULT_SEED,
            capacity: DEFAULT_CAPACITY,
            update_interval_ms: 100,
            publish_interval_ms: 200,
            camera: CameraConfig::default(),
        }
    }
}

impl LorenzConfig {
    /// Save the configuration to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load a configuration from a JSON file and validate it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Parse and validate a configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn update_interval(&self) -> Duration {
        Duration::from_millis(self.update_interval_ms)
    }

    pub fn publish_interval(&self) -> Duration {
        Duration::from_millis(self.publish_interval_ms)
    }

    /// Check that a run with this configuration can start.
    ///
    /// Parameters that merely make the system diverge are accepted; that case
    /// is caught at run time as a numeric fault.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.params;
        for (name, value) in [("sigma", p.sigma), ("rho", p.rho), ("beta", p.beta)] {
            if !value.is_finite() {
                return Err(invalid(format!("{name} must be finite, got {value}")));
            }
        }
        if !(p.dt.is_finite() && p.dt > 0.0) {
            return Err(invalid(format!("dt must be a positive finite number, got {}", p.dt)));
        }
        if p.steps_per_tick == 0 {
            return Err(invalid("steps_per_tick must be at least 1"));
        }
        if !self.seed.is_finite() {
            return Err(invalid(format!("seed must be finite, got {}", self.seed)));
        }
        if self.capacity == 0 {
            return Err(invalid("capacity must be at least 1"));
        }
        if self.update_interval_ms == 0 || self.publish_interval_ms == 0 {
            return Err(invalid("update and publish intervals must be at least 1ms"));
        }
        let c = &self.camera;
        if !(c.orbit_radius.is_finite() && c.orbit_radius > 0.0) {
            return Err(invalid(format!("orbit_radius must be positive, got {}", c.orbit_radius)));
        }
        if !c.orbit_step.is_finite() {
            return Err(invalid("orbit_step must be finite"));
        }
        if !(0.0..=1.0).contains(&c.dimmed_opacity) {
            return Err(invalid(format!(
                "dimmed_opacity must be within 0.0-1.0, got {}",
                c.dimmed_opacity
            )));
        }
        Ok(())
    }
}

fn invalid(msg: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(msg.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = LorenzConfig::default();
        config.validate().unwrap();
        assert_eq!(config.capacity, 5000);
        assert_eq!(config.update_interval(), Duration::from_millis(100));
        assert_eq!(config.publish_interval(), Duration::from_millis(200));
    }

    #[test]
    fn test_partial_json() {
        let json = r#"{"capacity": 42, "params": {"dt": 0.005}}"#;
        let config = LorenzConfig::from_json(json).unwrap();
        assert_eq!(config.capacity, 42);
        assert_eq!(config.params.dt, 0.005);
        assert_eq!(config.params.sigma, 10.0);
        assert_eq!(config.seed, DEFAULT_SEED);
    }

    #[test]
    fn test_rejects_bad_values() {
        let cases = [
            r#"{"params": {"dt": 0.0}}"#,
            r#"{"params": {"steps_per_tick": 0}}"#,
            r#"{"capacity": 0}"#,
            r#"{"update_interval_ms": 0}"#,
            r#"{"camera": {"orbit_radius": -1.0}}"#,
            r#"{"camera": {"dimmed_opacity": 2.0}}"#,
        ];
        for json in cases {
            let err = LorenzConfig::from_json(json).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)), "{json}: {err}");
        }
    }

    #[test]
    fn test_save_load() {
        let path = std::env::temp_dir()
            .join(format!("lorenz-trail-config-{}.json", std::process::id()));
        let mut config = LorenzConfig::default();
        config.capacity = 1234;
        config.seed = DVec3::new(1.0, 2.0, 3.0);

        config.save(&path).unwrap();
        let loaded = LorenzConfig::load(&path).unwrap();
        let _ = fs::remove_file(&path);

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file() {
        let err = LorenzConfig::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
