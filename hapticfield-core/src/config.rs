//! Configuration loading and validation
//!
//! Every section has working defaults, so an empty TOML document is a valid
//! configuration. Values are checked as a whole by [`HapticConfig::validate`],
//! which reports every problem at once.

use crate::error::{Error, Result};
use crate::point::Point3d;
use crate::polarity::Polarity;
use crate::transform::{SceneTransform, DEFAULT_COORDINATE_SCALE, DEFAULT_VERTICAL_OFFSET};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Which overlapping obstacle decides the contact force
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactPolicy {
    /// The first overlapping obstacle in storage order wins
    #[default]
    FirstFound,
    /// The overlapping obstacle closest to the probe wins
    Nearest,
}

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HapticConfig {
    pub field: FieldConfig,
    pub scene: SceneConfig,
    pub servo: ServoConfig,
    pub display: DisplayConfig,
    pub device: SimulatedDeviceConfig,
}

/// Force field constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    /// Force scale applied to every obstacle contribution
    pub scale: f64,
    /// Collision radius R; obstacles closer than 2R overlap the probe
    pub collision_radius: f64,
    pub contact_policy: ContactPolicy,
    /// Polarity at startup
    pub initial_polarity: Polarity,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            scale: 12.0,
            collision_radius: 15.0,
            contact_policy: ContactPolicy::FirstFound,
            initial_polarity: Polarity::Positive,
        }
    }
}

/// Scene file location and coordinate mapping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub path: PathBuf,
    pub coordinate_scale: f64,
    pub vertical_offset: f64,
    /// Skip records whose prefix is not `v ` instead of parsing them
    pub vertex_records_only: bool,
    /// Treat a scene without obstacles as an error
    pub require_obstacles: bool,
}

impl SceneConfig {
    /// Transform from scene coordinates to device coordinates
    pub fn transform(&self) -> SceneTransform {
        SceneTransform::scene(self.coordinate_scale, self.vertical_offset)
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("models/justcurves2.obj"),
            coordinate_scale: DEFAULT_COORDINATE_SCALE,
            vertical_offset: DEFAULT_VERTICAL_OFFSET,
            vertex_records_only: false,
            require_obstacles: true,
        }
    }
}

/// Servo scheduler settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServoConfig {
    /// Upper bound on how long a synchronous call waits for the servo thread
    pub snapshot_timeout_ms: u64,
    /// Work time per tick above which the tick is counted as an overrun
    pub tick_budget_us: u64,
}

impl ServoConfig {
    pub fn snapshot_timeout(&self) -> Duration {
        Duration::from_millis(self.snapshot_timeout_ms)
    }

    pub fn tick_budget(&self) -> Duration {
        Duration::from_micros(self.tick_budget_us)
    }
}

impl Default for ServoConfig {
    fn default() -> Self {
        Self {
            snapshot_timeout_ms: 250,
            tick_budget_us: 1000,
        }
    }
}

/// Visualization cadence and scaling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub frame_rate_hz: f64,
    /// Multiplier from device force to displayed force vector length
    pub force_gain: f64,
    pub cursor_radius: f64,
    pub obstacle_radius: f64,
}

impl DisplayConfig {
    pub fn frame_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.frame_rate_hz)
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            frame_rate_hz: 60.0,
            force_gain: 40.0,
            cursor_radius: 15.0,
            obstacle_radius: 3.0,
        }
    }
}

/// Probe motion of the simulated device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrajectoryConfig {
    Fixed { position: [f64; 3] },
    Orbit { center: [f64; 3], radius: f64, period_s: f64 },
}

impl Default for TrajectoryConfig {
    fn default() -> Self {
        TrajectoryConfig::Orbit {
            center: [0.0, 0.0, 0.0],
            radius: 60.0,
            period_s: 8.0,
        }
    }
}

/// Settings for the in-process simulated device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatedDeviceConfig {
    pub model: String,
    /// Servo clock rate
    pub rate_hz: f64,
    /// Largest force magnitude the device renders when clamping is enabled
    pub max_force: f64,
    pub workspace_min: [f64; 3],
    pub workspace_max: [f64; 3],
    pub trajectory: TrajectoryConfig,
}

impl SimulatedDeviceConfig {
    pub fn servo_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.rate_hz)
    }

    pub fn workspace_bounds(&self) -> (Point3d, Point3d) {
        (
            Point3d::from(self.workspace_min),
            Point3d::from(self.workspace_max),
        )
    }
}

impl Default for SimulatedDeviceConfig {
    fn default() -> Self {
        Self {
            model: "Simulated 3-DOF".to_string(),
            rate_hz: 1000.0,
            max_force: 3.3,
            workspace_min: [-80.0, -60.0, -35.0],
            workspace_max: [80.0, 60.0, 35.0],
            trajectory: TrajectoryConfig::default(),
        }
    }
}

impl HapticConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: HapticConfig = toml::from_str(text)?;
        Ok(config)
    }

    /// Load and validate a configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges across all sections
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        let mut positive = |field: &str, value: f64| {
            if !(value.is_finite() && value > 0.0) {
                errors.push(format!("{} must be a positive finite number, got {}", field, value));
            }
        };
        positive("field.scale", self.field.scale);
        positive("field.collision_radius", self.field.collision_radius);
        positive("scene.coordinate_scale", self.scene.coordinate_scale);
        positive("display.frame_rate_hz", self.display.frame_rate_hz);
        positive("display.force_gain", self.display.force_gain);
        positive("display.cursor_radius", self.display.cursor_radius);
        positive("display.obstacle_radius", self.display.obstacle_radius);
        positive("device.rate_hz", self.device.rate_hz);
        positive("device.max_force", self.device.max_force);
        if let TrajectoryConfig::Orbit { period_s, .. } = self.device.trajectory {
            positive("device.trajectory.period_s", period_s);
        }

        if !self.scene.vertical_offset.is_finite() {
            errors.push("scene.vertical_offset must be finite".to_string());
        }
        if self.servo.snapshot_timeout_ms == 0 {
            errors.push("servo.snapshot_timeout_ms must be greater than zero".to_string());
        }
        if self.servo.tick_budget_us == 0 {
            errors.push("servo.tick_budget_us must be greater than zero".to_string());
        }
        let (min, max) = self.device.workspace_bounds();
        if (0..3).any(|axis| min[axis] >= max[axis]) {
            errors.push(format!(
                "device workspace is empty: min {:?} is not below max {:?}",
                self.device.workspace_min, self.device.workspace_max
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::Config(format!(
                "Configuration validation failed:\n{}",
                errors.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n")
            )))
        }
    }
}
