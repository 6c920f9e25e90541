//! Visualization frame loop
//!
//! Runs on the caller's thread at the display rate, far below the servo rate.
//! The only channel to the servo thread is the snapshot request; the loop
//! never touches the device directly.

use crate::command::{Command, CommandSource};
use crate::display::{DisplayFrame, DisplaySettings, FrameSink};
use crate::viewport::Viewport;
use hapticfield_algorithms::CoulombField;
use hapticfield_core::{DisplayConfig, PolarityCell, Result};
use hapticfield_device::StateSource;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// Why the frame loop returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameLoopExit {
    /// The user asked to quit
    Quit,
    /// The force rendering task is no longer scheduled
    ServoTaskExited,
    /// The configured number of frames was presented
    FrameLimit,
}

/// Samples the servo state once per display frame
pub struct FrameLoop {
    field: CoulombField,
    polarity: Arc<PolarityCell>,
    settings: DisplaySettings,
    frame_period: Duration,
    frame_limit: Option<u64>,
}

impl FrameLoop {
    pub fn new(field: CoulombField, polarity: Arc<PolarityCell>, config: &DisplayConfig) -> Self {
        Self {
            field,
            polarity,
            settings: DisplaySettings::from(config),
            frame_period: config.frame_period(),
            frame_limit: None,
        }
    }

    /// Stop after presenting `limit` frames
    pub fn with_frame_limit(mut self, limit: Option<u64>) -> Self {
        self.frame_limit = limit;
        self
    }

    pub fn settings(&self) -> &DisplaySettings {
        &self.settings
    }

    /// Run until quit, servo task exit or the frame limit
    pub fn run<S>(
        &self,
        source: &S,
        viewport: &Viewport,
        commands: &mut dyn CommandSource,
        sink: &mut dyn FrameSink,
    ) -> Result<FrameLoopExit>
    where
        S: StateSource + ?Sized,
    {
        sink.configure(viewport, self.field.obstacles())?;

        let mut frame_index = 0u64;
        let mut next_frame = Instant::now();
        loop {
            if !source.servo_active() {
                error!("Servo task is no longer scheduled, leaving frame loop");
                return Ok(FrameLoopExit::ServoTaskExited);
            }

            while let Some(command) = commands.poll() {
                match command {
                    Command::TogglePolarity => {
                        let polarity = self.polarity.toggle();
                        info!("Polarity switched to {}", polarity);
                    }
                    Command::Quit => {
                        info!("Quit requested after {} frames", frame_index);
                        return Ok(FrameLoopExit::Quit);
                    }
                }
            }

            let state = match source.snapshot() {
                Ok(state) => state,
                Err(e) if !source.servo_active() => {
                    error!("Snapshot failed after servo task exit: {}", e);
                    return Ok(FrameLoopExit::ServoTaskExited);
                }
                Err(e) => return Err(e.into()),
            };

            let contacts = self.field.contacts(&state.position);
            let frame = DisplayFrame::build(frame_index, &state, self.polarity.load(), contacts, &self.settings);
            debug!("frame {} probe {:?} force {:?}", frame_index, frame.probe, frame.force);
            sink.present(&frame)?;

            frame_index += 1;
            if self.frame_limit.is_some_and(|limit| frame_index >= limit) {
                return Ok(FrameLoopExit::FrameLimit);
            }

            next_frame += self.frame_period;
            let now = Instant::now();
            if next_frame > now {
                std::thread::sleep(next_frame - now);
            } else {
                next_frame = now;
            }
        }
    }
}
