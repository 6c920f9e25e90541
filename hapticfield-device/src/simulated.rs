//! In-process simulated device
//!
//! Moves the probe along a [`Trajectory`] and paces servo ticks with an
//! absolute-deadline clock. Forces above the configured maximum are either
//! clamped or rejected depending on the enabled [`Capabilities`]. Tests and
//! demos reach into a running device through [`SimulatedDeviceControl`].

use crate::device::{Capabilities, DeviceError, ErrorCode, HapticDevice};
use hapticfield_core::{Point3d, SimulatedDeviceConfig, TrajectoryConfig, Vector3d};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Path followed by the simulated probe
#[derive(Debug, Clone, PartialEq)]
pub enum Trajectory {
    /// Probe held at one point
    Fixed(Point3d),
    /// Horizontal circle around `center`
    Orbit {
        center: Point3d,
        radius: f64,
        period: Duration,
    },
    /// One position per frame, repeating from the start
    Scripted(Vec<Point3d>),
}

impl Trajectory {
    /// Probe position for a frame, with frames `servo_period` apart
    pub fn sample(&self, frame: u64, servo_period: Duration) -> Point3d {
        match self {
            Trajectory::Fixed(position) => *position,
            Trajectory::Orbit { center, radius, period } => {
                let t = frame as f64 * servo_period.as_secs_f64();
                let angle = std::f64::consts::TAU * t / period.as_secs_f64();
                center + Vector3d::new(radius * angle.cos(), 0.0, radius * angle.sin())
            }
            Trajectory::Scripted(positions) => {
                if positions.is_empty() {
                    Point3d::origin()
                } else {
                    positions[(frame % positions.len() as u64) as usize]
                }
            }
        }
    }
}

impl From<&TrajectoryConfig> for Trajectory {
    fn from(config: &TrajectoryConfig) -> Self {
        match config {
            TrajectoryConfig::Fixed { position } => Trajectory::Fixed(Point3d::from(*position)),
            TrajectoryConfig::Orbit { center, radius, period_s } => Trajectory::Orbit {
                center: Point3d::from(*center),
                radius: *radius,
                period: Duration::from_secs_f64(*period_s),
            },
        }
    }
}

#[derive(Debug, Default)]
struct SharedState {
    enabled: AtomicBool,
    frames: AtomicU64,
    disables: AtomicU64,
}

/// Handle for observing and disturbing a simulated device from other threads
#[derive(Debug, Clone)]
pub struct SimulatedDeviceControl {
    injector: flume::Sender<DeviceError>,
    shared: Arc<SharedState>,
}

impl SimulatedDeviceControl {
    /// Queue an error; the device reports it on its next `take_error`
    pub fn inject_error(&self, error: DeviceError) {
        // The device may already be gone, in which case there is nobody to report to
        let _ = self.injector.send(error);
    }

    pub fn is_enabled(&self) -> bool {
        self.shared.enabled.load(Ordering::Acquire)
    }

    /// Number of completed frames
    pub fn frames(&self) -> u64 {
        self.shared.frames.load(Ordering::Acquire)
    }

    /// Number of times the device has been disabled
    pub fn disable_count(&self) -> u64 {
        self.shared.disables.load(Ordering::Acquire)
    }
}

/// Simulated three degree of freedom device
pub struct SimulatedDevice {
    model: String,
    servo_period: Duration,
    max_force: f64,
    workspace: (Point3d, Point3d),
    trajectory: Trajectory,
    capabilities: Option<Capabilities>,
    enable_failure: Option<DeviceError>,
    in_frame: bool,
    frame: u64,
    position: Point3d,
    pending_force: Vector3d,
    force: Vector3d,
    errors: VecDeque<DeviceError>,
    injected: flume::Receiver<DeviceError>,
    control: SimulatedDeviceControl,
    next_tick: Option<Instant>,
}

impl SimulatedDevice {
    /// Device with default settings following `trajectory`
    pub fn new(trajectory: Trajectory) -> Self {
        let mut device = Self::from_config(&SimulatedDeviceConfig::default());
        device.position = device.clamp_to_workspace(trajectory.sample(0, device.servo_period));
        device.trajectory = trajectory;
        device
    }

    /// Device described by a validated configuration section
    pub fn from_config(config: &SimulatedDeviceConfig) -> Self {
        let (injector, injected) = flume::unbounded();
        let trajectory = Trajectory::from(&config.trajectory);
        let servo_period = config.servo_period();
        let mut device = Self {
            model: config.model.clone(),
            servo_period,
            max_force: config.max_force,
            workspace: config.workspace_bounds(),
            position: Point3d::origin(),
            trajectory,
            capabilities: None,
            enable_failure: None,
            in_frame: false,
            frame: 0,
            pending_force: Vector3d::zeros(),
            force: Vector3d::zeros(),
            errors: VecDeque::new(),
            injected,
            control: SimulatedDeviceControl {
                injector,
                shared: Arc::new(SharedState::default()),
            },
            next_tick: None,
        };
        device.position = device.clamp_to_workspace(device.trajectory.sample(0, servo_period));
        device
    }

    /// Make the next `enable` call fail with `error`
    pub fn with_enable_failure(mut self, error: DeviceError) -> Self {
        self.enable_failure = Some(error);
        self
    }

    pub fn with_max_force(mut self, max_force: f64) -> Self {
        self.max_force = max_force;
        self
    }

    pub fn with_servo_period(mut self, servo_period: Duration) -> Self {
        self.servo_period = servo_period;
        self
    }

    pub fn control(&self) -> SimulatedDeviceControl {
        self.control.clone()
    }

    pub fn servo_period(&self) -> Duration {
        self.servo_period
    }

    fn clamp_to_workspace(&self, position: Point3d) -> Point3d {
        let (min, max) = &self.workspace;
        position.sup(min).inf(max)
    }

    fn report(&mut self, code: ErrorCode, context: &str) {
        self.errors.push_back(DeviceError::new(code, 0, context));
    }

    fn limit_force(&mut self, force: Vector3d) -> Vector3d {
        let caps = match self.capabilities {
            Some(caps) if caps.force_output => caps,
            _ => return Vector3d::zeros(),
        };

        let magnitude = force.norm();
        if magnitude <= self.max_force {
            force
        } else if caps.max_force_clamping {
            force * (self.max_force / magnitude)
        } else {
            self.report(ErrorCode::ExceededMaxForce, "Commanded force rejected");
            Vector3d::zeros()
        }
    }
}

impl HapticDevice for SimulatedDevice {
    fn model(&self) -> &str {
        &self.model
    }

    fn enable(&mut self, capabilities: Capabilities) -> Result<(), DeviceError> {
        if let Some(error) = self.enable_failure.take() {
            return Err(error);
        }
        self.capabilities = Some(capabilities);
        self.next_tick = None;
        self.control.shared.enabled.store(true, Ordering::Release);
        Ok(())
    }

    fn disable(&mut self) {
        self.capabilities = None;
        self.in_frame = false;
        self.pending_force = Vector3d::zeros();
        self.force = Vector3d::zeros();
        self.control.shared.enabled.store(false, Ordering::Release);
        self.control.shared.disables.fetch_add(1, Ordering::AcqRel);
    }

    fn is_enabled(&self) -> bool {
        self.capabilities.is_some()
    }

    fn begin_frame(&mut self) {
        if self.in_frame {
            self.report(ErrorCode::IllegalFrameCall, "begin_frame inside an open frame");
            return;
        }
        self.frame += 1;
        self.position = self.clamp_to_workspace(self.trajectory.sample(self.frame, self.servo_period));
        self.pending_force = Vector3d::zeros();
        self.in_frame = true;
    }

    fn end_frame(&mut self) {
        if !self.in_frame {
            self.report(ErrorCode::IllegalFrameCall, "end_frame without an open frame");
            return;
        }
        self.force = self.pending_force;
        self.in_frame = false;
        self.control.shared.frames.store(self.frame, Ordering::Release);
    }

    fn read_position(&self) -> Point3d {
        self.position
    }

    fn current_force(&self) -> Vector3d {
        self.force
    }

    fn write_force(&mut self, force: Vector3d) {
        if !self.in_frame {
            self.report(ErrorCode::IllegalFrameCall, "write_force without an open frame");
            return;
        }
        self.pending_force = self.limit_force(force);
    }

    fn take_error(&mut self) -> Option<DeviceError> {
        self.errors.extend(self.injected.try_iter());
        self.errors.pop_front()
    }

    fn wait_for_servo_tick(&mut self) {
        let now = Instant::now();
        let deadline = match self.next_tick {
            Some(deadline) => deadline,
            None => now,
        };
        if deadline > now {
            std::thread::sleep(deadline - now);
            self.next_tick = Some(deadline + self.servo_period);
        } else {
            // Behind schedule; restart the clock instead of bursting to catch up
            self.next_tick = Some(now + self.servo_period);
        }
    }

    fn workspace_bounds(&self) -> (Point3d, Point3d) {
        self.workspace
    }
}
