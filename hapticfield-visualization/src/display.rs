//! Display model and frame sinks

use crate::viewport::Viewport;
use hapticfield_core::{Bounded, DisplayConfig, ObstacleSet, Point3d, Polarity, ProbeState, Result, Vector3d};
use tracing::{info, warn};

/// Scaling applied when turning probe state into a display frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplaySettings {
    /// Multiplier from device force to drawn vector length
    pub force_gain: f64,
    pub cursor_radius: f64,
    pub obstacle_radius: f64,
}

impl From<&DisplayConfig> for DisplaySettings {
    fn from(config: &DisplayConfig) -> Self {
        Self {
            force_gain: config.force_gain,
            cursor_radius: config.cursor_radius,
            obstacle_radius: config.obstacle_radius,
        }
    }
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self::from(&DisplayConfig::default())
    }
}

/// Everything needed to draw one frame
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayFrame {
    pub frame_index: u64,
    pub probe: Point3d,
    /// Force as reported by the device
    pub force: Vector3d,
    /// Device force times `force_gain`, anchored at the probe
    ///
    /// This is the force after the device clamped it, not the raw field
    /// value at the probe, so strong contact forces draw at the clamp length.
    pub force_vector: Vector3d,
    pub cursor_radius: f64,
    pub obstacle_radius: f64,
    pub polarity: Polarity,
    /// Obstacles currently overlapping the probe
    pub contacts: Vec<usize>,
}

impl DisplayFrame {
    pub fn build(
        frame_index: u64,
        state: &ProbeState,
        polarity: Polarity,
        contacts: Vec<usize>,
        settings: &DisplaySettings,
    ) -> Self {
        Self {
            frame_index,
            probe: state.position,
            force: state.force,
            force_vector: state.force * settings.force_gain,
            cursor_radius: settings.cursor_radius,
            obstacle_radius: settings.obstacle_radius,
            polarity,
            contacts,
        }
    }

    /// End point of the drawn force arrow
    pub fn force_tip(&self) -> Point3d {
        self.probe + self.force_vector
    }

    pub fn in_contact(&self) -> bool {
        !self.contacts.is_empty()
    }
}

/// Destination of rendered frames
pub trait FrameSink {
    /// Called once before the first frame
    fn configure(&mut self, _viewport: &Viewport, _obstacles: &ObstacleSet) -> Result<()> {
        Ok(())
    }

    fn present(&mut self, frame: &DisplayFrame) -> Result<()>;
}

/// Sink that keeps every frame in memory
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub viewport: Option<Viewport>,
    pub obstacle_count: usize,
    pub frames: Vec<DisplayFrame>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FrameSink for RecordingSink {
    fn configure(&mut self, viewport: &Viewport, obstacles: &ObstacleSet) -> Result<()> {
        self.viewport = Some(viewport.clone());
        self.obstacle_count = obstacles.len();
        Ok(())
    }

    fn present(&mut self, frame: &DisplayFrame) -> Result<()> {
        self.frames.push(frame.clone());
        Ok(())
    }
}

/// Sink that reports the probe state through the log
#[derive(Debug)]
pub struct LogSink {
    every: u64,
    was_in_contact: bool,
}

impl LogSink {
    /// Log one frame out of every `every`, plus every contact change
    pub fn new(every: u64) -> Self {
        Self {
            every: every.max(1),
            was_in_contact: false,
        }
    }
}

impl FrameSink for LogSink {
    fn configure(&mut self, viewport: &Viewport, obstacles: &ObstacleSet) -> Result<()> {
        let (min, max) = obstacles.bounding_box();
        info!(
            "Viewing {} obstacles spanning {:?} to {:?} from {:?}",
            obstacles.len(),
            min.coords.as_slice(),
            max.coords.as_slice(),
            viewport.eye.coords.as_slice()
        );
        for corner in [min, max] {
            if !obstacles.is_empty() && !viewport.contains(&corner) {
                warn!("Obstacles extend outside the view: {:?}", corner.coords.as_slice());
            }
        }
        Ok(())
    }

    fn present(&mut self, frame: &DisplayFrame) -> Result<()> {
        let contact_changed = frame.in_contact() != self.was_in_contact;
        self.was_in_contact = frame.in_contact();

        if contact_changed || frame.frame_index % self.every == 0 {
            info!(
                "frame {} probe ({:.1}, {:.1}, {:.1}) force |{:.4}| polarity {} contacts {}",
                frame.frame_index,
                frame.probe.x,
                frame.probe.y,
                frame.probe.z,
                frame.force.norm(),
                frame.polarity,
                frame.contacts.len()
            );
        }
        Ok(())
    }
}
