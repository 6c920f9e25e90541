//! Servo scheduler
//!
//! The scheduler owns the device on a dedicated thread. Every device tick it
//! first services pending synchronous calls, then runs each registered
//! asynchronous task in descending priority order. A task that returns
//! [`CallbackCode::Done`] is removed and its [`TaskHandle`] reports completion.
//!
//! The device is disabled on every exit path of the servo thread, including
//! a panicking task.

use crate::device::{Capabilities, HapticDevice};
use hapticfield_core::ServoConfig;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Number of registration changes that may queue up between two ticks
const CONTROL_QUEUE_DEPTH: usize = 64;

/// Errors raised by scheduler operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("Failed to spawn servo thread: {0}")]
    Spawn(String),

    #[error("Servo scheduler is not running")]
    Stopped,

    #[error("Servo thread did not answer within {0:?}")]
    Timeout(Duration),

    #[error("Servo thread panicked")]
    Panicked,
}

impl From<SchedulerError> for hapticfield_core::Error {
    fn from(e: SchedulerError) -> Self {
        hapticfield_core::Error::Scheduler(e.to_string())
    }
}

/// Whether a task wants to run again on the next tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackCode {
    Continue,
    Done,
}

/// Ordering of tasks within a tick; higher runs first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SchedulerPriority(pub u16);

impl SchedulerPriority {
    pub const MIN: SchedulerPriority = SchedulerPriority(0);
    pub const DEFAULT: SchedulerPriority = SchedulerPriority(u16::MAX / 2);
    pub const MAX: SchedulerPriority = SchedulerPriority(u16::MAX);
}

impl Default for SchedulerPriority {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Work executed on the servo thread once per tick
pub trait ServoTask: Send {
    fn run(&mut self, device: &mut dyn HapticDevice) -> CallbackCode;
}

impl<F> ServoTask for F
where
    F: FnMut(&mut dyn HapticDevice) -> CallbackCode + Send,
{
    fn run(&mut self, device: &mut dyn HapticDevice) -> CallbackCode {
        self(device)
    }
}

/// How [`Scheduler::wait_for_completion`] waits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitMode {
    /// Return immediately with the current status
    CheckStatus,
    /// Block until the task has completed
    Infinite,
}

/// Handle to a scheduled asynchronous task
///
/// The servo thread holds the sending half of `done` for as long as the task
/// is registered; a disconnected channel means the task has completed.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    id: u64,
    done: flume::Receiver<()>,
}

impl TaskHandle {
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// Tick counters published by the servo thread
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServoStats {
    pub ticks: u64,
    /// Ticks whose work took longer than the configured budget
    pub overruns: u64,
    pub active_tasks: u64,
}

#[derive(Debug, Default)]
struct ServoCounters {
    ticks: AtomicU64,
    overruns: AtomicU64,
    active_tasks: AtomicU64,
}

type SyncCall = Box<dyn FnOnce(&mut dyn HapticDevice) + Send>;

enum ControlMessage {
    Register {
        id: u64,
        priority: SchedulerPriority,
        task: Box<dyn ServoTask>,
        done: flume::Sender<()>,
    },
    Unregister {
        id: u64,
    },
}

struct TaskEntry {
    id: u64,
    priority: SchedulerPriority,
    task: Box<dyn ServoTask>,
    // Dropped together with the entry, which signals completion
    _done: flume::Sender<()>,
}

/// Owns the servo thread and the device running on it
pub struct Scheduler {
    control_tx: flume::Sender<ControlMessage>,
    sync_tx: flume::Sender<SyncCall>,
    // Used to discard requests that arrive after the servo thread has exited
    control_rx: flume::Receiver<ControlMessage>,
    sync_rx: flume::Receiver<SyncCall>,
    running: Arc<AtomicBool>,
    counters: Arc<ServoCounters>,
    next_task_id: AtomicU64,
    sync_timeout: Duration,
    servo_thread: Option<JoinHandle<()>>,
}

impl Scheduler {
    /// Spawn the servo thread and hand it the enabled device
    pub fn start<D>(device: D, config: &ServoConfig) -> Result<Self, SchedulerError>
    where
        D: HapticDevice + 'static,
    {
        let (control_tx, control_rx) = flume::bounded(CONTROL_QUEUE_DEPTH);
        let (sync_tx, sync_rx) = flume::bounded(1);
        let running = Arc::new(AtomicBool::new(true));
        let counters = Arc::new(ServoCounters::default());

        let context = ServoContext {
            guard: ServoGuard {
                device: Box::new(device),
                running: Arc::clone(&running),
            },
            control_rx: control_rx.clone(),
            sync_rx: sync_rx.clone(),
            counters: Arc::clone(&counters),
            tick_budget: config.tick_budget(),
            tasks: Vec::new(),
        };

        info!("Starting servo thread for {}", context.guard.device.model());

        // On spawn failure the closure is dropped, and the guard with it disables the device
        let servo_thread = thread::Builder::new()
            .name("hapticfield-servo".to_string())
            .spawn(move || context.run())
            .map_err(|e| SchedulerError::Spawn(e.to_string()))?;

        Ok(Self {
            control_tx,
            sync_tx,
            control_rx,
            sync_rx,
            running,
            counters,
            next_task_id: AtomicU64::new(1),
            sync_timeout: config.snapshot_timeout(),
            servo_thread: Some(servo_thread),
        })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Register a task that runs every tick until it returns `Done`
    pub fn schedule_asynchronous<T>(&self, task: T, priority: SchedulerPriority) -> Result<TaskHandle, SchedulerError>
    where
        T: ServoTask + 'static,
    {
        if !self.is_running() {
            return Err(SchedulerError::Stopped);
        }

        let id = self.next_task_id.fetch_add(1, Ordering::Relaxed);
        let (done_tx, done_rx) = flume::bounded(1);
        self.control_tx
            .send(ControlMessage::Register {
                id,
                priority,
                task: Box::new(task),
                done: done_tx,
            })
            .map_err(|_| SchedulerError::Stopped)?;

        debug!("Scheduled servo task {} at priority {}", id, priority.0);
        Ok(TaskHandle { id, done: done_rx })
    }

    /// Run `call` once on the servo thread between ticks and return its result
    ///
    /// The call never interleaves with a device frame of an asynchronous
    /// task, so everything it reads comes from one completed frame.
    pub fn schedule_synchronous<R, F>(&self, call: F) -> Result<R, SchedulerError>
    where
        R: Send + 'static,
        F: FnOnce(&mut dyn HapticDevice) -> R + Send + 'static,
    {
        if !self.is_running() {
            return Err(SchedulerError::Stopped);
        }

        let deadline = Instant::now() + self.sync_timeout;
        let (reply_tx, reply_rx) = flume::bounded(1);
        let request: SyncCall = Box::new(move |device: &mut dyn HapticDevice| {
            // The caller may have timed out and gone away
            let _ = reply_tx.send(call(device));
        });

        self.sync_tx.send_deadline(request, deadline).map_err(|e| match e {
            flume::SendTimeoutError::Timeout(_) => SchedulerError::Timeout(self.sync_timeout),
            flume::SendTimeoutError::Disconnected(_) => SchedulerError::Stopped,
        })?;

        reply_rx.recv_deadline(deadline).map_err(|e| match e {
            flume::RecvTimeoutError::Timeout => SchedulerError::Timeout(self.sync_timeout),
            flume::RecvTimeoutError::Disconnected => SchedulerError::Stopped,
        })
    }

    /// Report whether the task behind `handle` is still registered
    ///
    /// Returns `true` while the task is active. With [`WaitMode::Infinite`]
    /// this blocks until the task completes and then returns `false`.
    pub fn wait_for_completion(&self, handle: &TaskHandle, mode: WaitMode) -> bool {
        match mode {
            WaitMode::CheckStatus => matches!(handle.done.try_recv(), Err(flume::TryRecvError::Empty)),
            WaitMode::Infinite => {
                let _ = handle.done.recv();
                false
            }
        }
    }

    /// Remove a task; it will not run on any tick after the next one begins
    pub fn unschedule(&self, handle: &TaskHandle) {
        if self.control_tx.send(ControlMessage::Unregister { id: handle.id }).is_err() {
            debug!("Servo thread already gone while unscheduling task {}", handle.id);
        }
    }

    pub fn stats(&self) -> ServoStats {
        ServoStats {
            ticks: self.counters.ticks.load(Ordering::Acquire),
            overruns: self.counters.overruns.load(Ordering::Acquire),
            active_tasks: self.counters.active_tasks.load(Ordering::Acquire),
        }
    }

    /// Stop the servo thread and wait for it to disable the device
    pub fn stop(&mut self) -> Result<(), SchedulerError> {
        let servo_thread = match self.servo_thread.take() {
            Some(handle) => handle,
            None => return Ok(()),
        };

        info!("Stopping servo thread");
        self.running.store(false, Ordering::Release);

        let joined = servo_thread.join();
        let discarded = discard_pending(&self.control_rx, &self.sync_rx);
        if discarded > 0 {
            debug!("Discarded {} requests queued after the servo thread exited", discarded);
        }
        joined.map_err(|_| {
            error!("Servo thread panicked");
            SchedulerError::Panicked
        })?;

        let stats = self.stats();
        info!(
            "Servo thread stopped after {} ticks ({} overruns)",
            stats.ticks, stats.overruns
        );
        Ok(())
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!("Error while stopping servo scheduler: {}", e);
        }
    }
}

/// Disables the device and clears the running flag when the servo thread ends
struct ServoGuard {
    device: Box<dyn HapticDevice>,
    running: Arc<AtomicBool>,
}

impl ServoGuard {
    fn release(&mut self) {
        self.running.store(false, Ordering::Release);
        if self.device.is_enabled() {
            self.device.disable();
            info!("Disabled {}", self.device.model());
        }
    }
}

impl Drop for ServoGuard {
    fn drop(&mut self) {
        self.release();
    }
}

struct ServoContext {
    guard: ServoGuard,
    control_rx: flume::Receiver<ControlMessage>,
    sync_rx: flume::Receiver<SyncCall>,
    counters: Arc<ServoCounters>,
    tick_budget: Duration,
    tasks: Vec<TaskEntry>,
}

impl ServoContext {
    fn run(mut self) {
        while self.guard.running.load(Ordering::Acquire) {
            self.guard.device.wait_for_servo_tick();
            let tick_start = Instant::now();

            self.apply_control_messages();
            self.service_synchronous_calls();
            self.run_tasks();

            let ticks = self.counters.ticks.fetch_add(1, Ordering::AcqRel) + 1;
            let elapsed = tick_start.elapsed();
            if elapsed > self.tick_budget {
                let overruns = self.counters.overruns.fetch_add(1, Ordering::AcqRel) + 1;
                if overruns == 1 || overruns % 1000 == 0 {
                    warn!(
                        "Servo tick {} took {:?}, budget {:?} ({} overruns so far)",
                        ticks, elapsed, self.tick_budget, overruns
                    );
                }
            }
        }
        debug!("Servo loop exiting with {} registered tasks", self.tasks.len());
    }

    fn apply_control_messages(&mut self) {
        for message in self.control_rx.try_iter() {
            match message {
                ControlMessage::Register { id, priority, task, done } => {
                    // Equal priorities keep registration order
                    let position = self.tasks.partition_point(|entry| entry.priority >= priority);
                    self.tasks.insert(
                        position,
                        TaskEntry {
                            id,
                            priority,
                            task,
                            _done: done,
                        },
                    );
                }
                ControlMessage::Unregister { id } => {
                    self.tasks.retain(|entry| entry.id != id);
                }
            }
        }
        self.counters.active_tasks.store(self.tasks.len() as u64, Ordering::Release);
    }

    fn service_synchronous_calls(&mut self) {
        let device: &mut dyn HapticDevice = &mut *self.guard.device;
        for call in self.sync_rx.try_iter() {
            call(device);
        }
    }

    fn run_tasks(&mut self) {
        let device: &mut dyn HapticDevice = &mut *self.guard.device;
        self.tasks.retain_mut(|entry| match entry.task.run(device) {
            CallbackCode::Continue => true,
            CallbackCode::Done => {
                debug!("Servo task {} completed", entry.id);
                false
            }
        });
        self.counters.active_tasks.store(self.tasks.len() as u64, Ordering::Release);
    }
}

impl Drop for ServoContext {
    fn drop(&mut self) {
        // The device goes quiet before any waiting handle is released
        self.guard.release();
        discard_pending(&self.control_rx, &self.sync_rx);
        self.counters.active_tasks.store(0, Ordering::Release);
    }
}

/// Drop every queued request, which disconnects its completion or reply channel
fn discard_pending(control_rx: &flume::Receiver<ControlMessage>, sync_rx: &flume::Receiver<SyncCall>) -> usize {
    control_rx.drain().count() + sync_rx.drain().count()
}

/// Enable `device` and start a scheduler for it
///
/// An error reported by the device right after enabling counts as a startup
/// failure; the device is disabled again before returning.
pub fn start_device<D>(
    mut device: D,
    capabilities: Capabilities,
    config: &ServoConfig,
) -> hapticfield_core::Result<Scheduler>
where
    D: HapticDevice + 'static,
{
    device.enable(capabilities)?;
    if let Some(err) = device.take_error() {
        device.disable();
        return Err(err.into());
    }
    Ok(Scheduler::start(device, config)?)
}
